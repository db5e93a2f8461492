use lettre::{Address, message::Mailbox};

use crate::email::email_error::EmailError;

pub fn parse_address(email: impl AsRef<str>) -> Result<Address, EmailError> {
    let email = email.as_ref().trim();
    email.parse::<Address>().map_err(|err| {
        tracing::trace!("rejected address {:?}: {}", email, err);
        EmailError::InvalidAddress(format!("{}: {}", email, err))
    })
}

/// Parses a single address with an optional personal name.
pub fn parse_mailbox(email: impl AsRef<str>, name: Option<&str>) -> Result<Mailbox, EmailError> {
    let address = parse_address(email)?;
    let name = name.map(str::trim).filter(|name| !name.is_empty()).map(str::to_owned);
    Ok(Mailbox::new(name, address))
}

/// Parses every address or none of them.
///
/// An empty list is treated as an absent list and rejected.
pub fn parse_mailboxes<S: AsRef<str>>(emails: &[S]) -> Result<Vec<Mailbox>, EmailError> {
    if emails.is_empty() {
        return Err(EmailError::InvalidAddress(String::from("address list provided was empty")));
    }

    emails.iter().map(|email| parse_mailbox(email, None)).collect()
}
