use std::{collections::BTreeMap, sync::Arc, time::{Duration, SystemTime}};

use lettre::{Message, message::{Mailbox, header::{ContentType, HeaderName, HeaderValue}}};
use time::OffsetDateTime;

use crate::email::{
    email_address,
    email_clock::{Clock, SystemClock},
    email_content::EmailContent,
    email_error::EmailError,
    email_message::MimeMessage,
    email_session::{self, MailSession},
};

/// Headers the draft writes itself; custom headers may not replace them.
const RESERVED_HEADERS: [&str; 11] = [
    "From",
    "To",
    "Cc",
    "Bcc",
    "Reply-To",
    "Subject",
    "Date",
    "Content-Type",
    "Content-Transfer-Encoding",
    "MIME-Version",
    "Message-ID",
];

/// Mutable email draft.
///
/// Every setter validates its input before touching the draft, so a failed call leaves it unchanged.
/// Once [`build_mime_message`](EmailDraft::build_mime_message) succeeds the draft cannot be built again.
#[derive(Debug, Clone)]
pub struct EmailDraft {
    from: Option<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    reply_to: Vec<Mailbox>,
    headers: BTreeMap<String, String>,
    subject: Option<String>,
    msg: Option<String>,
    content: Option<EmailContent>,
    sent_date: Option<OffsetDateTime>,
    host_name: Option<String>,
    smtp_port: u16,
    session: Option<MailSession>,
    socket_timeout: Duration,
    socket_connection_timeout: Duration,
    bounce_address: Option<String>,
    start_tls_enabled: bool,
    clock: Arc<dyn Clock>,
    message: Option<MimeMessage>,
    built: bool,
}

impl Default for EmailDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailDraft {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a draft reading the current time from `clock` when no sent date is set.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        EmailDraft {
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            headers: BTreeMap::new(),
            subject: None,
            msg: None,
            content: None,
            sent_date: None,
            host_name: None,
            smtp_port: email_session::DEFAULT_SMTP_PORT,
            session: None,
            socket_timeout: email_session::DEFAULT_SOCKET_TIMEOUT,
            socket_connection_timeout: email_session::DEFAULT_SOCKET_TIMEOUT,
            bounce_address: None,
            start_tls_enabled: false,
            clock,
            message: None,
            built: false,
        }
    }

    pub fn set_from(&mut self, email: impl AsRef<str>) -> Result<&mut Self, EmailError> {
        self.from = Some(email_address::parse_mailbox(email, None)?);
        Ok(self)
    }

    pub fn set_from_with_name(&mut self, email: impl AsRef<str>, name: impl AsRef<str>) -> Result<&mut Self, EmailError> {
        self.from = Some(email_address::parse_mailbox(email, Some(name.as_ref()))?);
        Ok(self)
    }

    pub fn from_address(&self) -> Option<&Mailbox> {
        self.from.as_ref()
    }

    /// Appends every address, or none if any of them is invalid.
    pub fn add_to<S: AsRef<str>>(&mut self, emails: &[S]) -> Result<&mut Self, EmailError> {
        self.to.extend(email_address::parse_mailboxes(emails)?);
        Ok(self)
    }

    pub fn add_to_with_name(&mut self, email: impl AsRef<str>, name: impl AsRef<str>) -> Result<&mut Self, EmailError> {
        self.to.push(email_address::parse_mailbox(email, Some(name.as_ref()))?);
        Ok(self)
    }

    /// Replaces all `To` addresses.
    pub fn set_to<S: AsRef<str>>(&mut self, emails: &[S]) -> Result<&mut Self, EmailError> {
        self.to = email_address::parse_mailboxes(emails)?;
        Ok(self)
    }

    pub fn to_addresses(&self) -> &[Mailbox] {
        &self.to
    }

    pub fn add_cc<S: AsRef<str>>(&mut self, emails: &[S]) -> Result<&mut Self, EmailError> {
        self.cc.extend(email_address::parse_mailboxes(emails)?);
        Ok(self)
    }

    pub fn add_cc_with_name(&mut self, email: impl AsRef<str>, name: impl AsRef<str>) -> Result<&mut Self, EmailError> {
        self.cc.push(email_address::parse_mailbox(email, Some(name.as_ref()))?);
        Ok(self)
    }

    pub fn set_cc<S: AsRef<str>>(&mut self, emails: &[S]) -> Result<&mut Self, EmailError> {
        self.cc = email_address::parse_mailboxes(emails)?;
        Ok(self)
    }

    pub fn cc_addresses(&self) -> &[Mailbox] {
        &self.cc
    }

    pub fn add_bcc<S: AsRef<str>>(&mut self, emails: &[S]) -> Result<&mut Self, EmailError> {
        self.bcc.extend(email_address::parse_mailboxes(emails)?);
        Ok(self)
    }

    pub fn add_bcc_with_name(&mut self, email: impl AsRef<str>, name: impl AsRef<str>) -> Result<&mut Self, EmailError> {
        self.bcc.push(email_address::parse_mailbox(email, Some(name.as_ref()))?);
        Ok(self)
    }

    pub fn set_bcc<S: AsRef<str>>(&mut self, emails: &[S]) -> Result<&mut Self, EmailError> {
        self.bcc = email_address::parse_mailboxes(emails)?;
        Ok(self)
    }

    pub fn bcc_addresses(&self) -> &[Mailbox] {
        &self.bcc
    }

    pub fn add_reply_to<S: AsRef<str>>(&mut self, emails: &[S]) -> Result<&mut Self, EmailError> {
        self.reply_to.extend(email_address::parse_mailboxes(emails)?);
        Ok(self)
    }

    pub fn add_reply_to_with_name(&mut self, email: impl AsRef<str>, name: impl AsRef<str>) -> Result<&mut Self, EmailError> {
        self.reply_to.push(email_address::parse_mailbox(email, Some(name.as_ref()))?);
        Ok(self)
    }

    pub fn set_reply_to<S: AsRef<str>>(&mut self, emails: &[S]) -> Result<&mut Self, EmailError> {
        self.reply_to = email_address::parse_mailboxes(emails)?;
        Ok(self)
    }

    pub fn reply_to_addresses(&self) -> &[Mailbox] {
        &self.reply_to
    }

    /// Sets a custom header, replacing any previous value for `name` regardless of case.
    pub fn add_header(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<&mut Self, EmailError> {
        let (name, value) = Self::validate_header(name.as_ref(), value.as_ref())?;
        Self::insert_header(&mut self.headers, name, value);
        Ok(self)
    }

    /// Replaces all custom headers.
    pub fn set_headers<K, V>(&mut self, headers: impl IntoIterator<Item = (K, V)>) -> Result<&mut Self, EmailError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut validated = BTreeMap::new();
        for (name, value) in headers {
            let (name, value) = Self::validate_header(name.as_ref(), value.as_ref())?;
            Self::insert_header(&mut validated, name, value);
        }

        self.headers = validated;
        Ok(self)
    }

    /// Header names compare ignoring ASCII case.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        find_header(&self.headers, name.as_ref())
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn set_subject(&mut self, subject: impl AsRef<str>) -> &mut Self {
        self.subject = Some(subject.as_ref().to_owned());
        self
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Sets a plain text body. Content set with [`set_content`](EmailDraft::set_content) wins over it.
    pub fn set_msg(&mut self, msg: impl AsRef<str>) -> &mut Self {
        self.msg = Some(msg.as_ref().to_owned());
        self
    }

    pub fn set_content(&mut self, content: impl Into<EmailContent>) -> &mut Self {
        self.content = Some(content.into());
        self
    }

    /// Dates before the Unix epoch cannot be written to a `Date` header.
    pub fn set_sent_date(&mut self, date: OffsetDateTime) -> Result<&mut Self, EmailError> {
        Self::validate_sent_date(date)?;
        self.sent_date = Some(date);
        Ok(self)
    }

    /// Returns the sent date, or the current time if none is set.
    pub fn sent_date(&self) -> OffsetDateTime {
        self.sent_date.unwrap_or_else(|| self.clock.now())
    }

    pub fn set_host_name(&mut self, host_name: impl AsRef<str>) -> &mut Self {
        self.host_name = Some(host_name.as_ref().to_owned());
        self
    }

    /// The host of the mail session if one is set, otherwise the explicit host name.
    pub fn host_name(&self) -> Result<&str, EmailError> {
        if let Some(host) = self.session.as_ref().and_then(MailSession::host) {
            return Ok(host);
        }

        self.host_name
            .as_deref()
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| EmailError::ConfigurationMissing(String::from("no host name or mail session host configured")))
    }

    pub fn set_smtp_port(&mut self, port: u16) -> &mut Self {
        self.smtp_port = port;
        self
    }

    pub fn smtp_port(&self) -> u16 {
        self.smtp_port
    }

    pub fn set_mail_session(&mut self, session: MailSession) -> &mut Self {
        self.session = Some(session);
        self
    }

    /// Returns the mail session, creating it from the draft's transport settings on first use.
    pub fn mail_session(&mut self) -> Result<&mut MailSession, EmailError> {
        match self.session {
            Some(ref mut session) => Ok(session),
            None => {
                let host = self.host_name
                    .as_deref()
                    .ok_or_else(|| EmailError::ConfigurationMissing(String::from("cannot find valid hostname for mail session")))?;

                let mut builder = MailSession::builder()
                    .host(host)
                    .port(self.smtp_port)
                    .socket_timeout(self.socket_timeout)
                    .socket_connection_timeout(self.socket_connection_timeout)
                    .start_tls(self.start_tls_enabled);

                if let Some(bounce_address) = &self.bounce_address {
                    builder = builder.bounce_address(bounce_address);
                }

                Ok(self.session.insert(builder.build()?))
            }
        }
    }

    pub fn set_socket_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.socket_timeout = timeout;
        self
    }

    pub fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }

    pub fn set_socket_connection_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.socket_connection_timeout = timeout;
        self
    }

    pub fn socket_connection_timeout(&self) -> Duration {
        self.socket_connection_timeout
    }

    /// Envelope sender that receives bounced messages.
    pub fn set_bounce_address(&mut self, email: impl AsRef<str>) -> Result<&mut Self, EmailError> {
        self.bounce_address = Some(email_address::parse_address(email)?.to_string());
        Ok(self)
    }

    pub fn bounce_address(&self) -> Option<&str> {
        self.bounce_address.as_deref()
    }

    pub fn set_start_tls_enabled(&mut self, enabled: bool) -> &mut Self {
        self.start_tls_enabled = enabled;
        self
    }

    pub fn is_start_tls_enabled(&self) -> bool {
        self.start_tls_enabled
    }

    /// Builds the message from the draft.
    ///
    /// Requires a `From` address, at least one `To`, `Cc` or `Bcc` address, and a body or subject.
    /// Without a body the message carries an empty plain text part.
    pub fn build_mime_message(&mut self) -> Result<&MimeMessage, EmailError> {
        if self.built {
            return Err(EmailError::AlreadyBuilt);
        }

        let from = self.from
            .clone()
            .ok_or_else(|| EmailError::BuildIncomplete(String::from("from address required")))?;

        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(EmailError::BuildIncomplete(String::from("at least one receiver address required")));
        }

        let content = match (&self.content, &self.msg) {
            (Some(content), _) => content.clone(),
            (None, Some(msg)) => EmailContent::TextPlain(msg.clone()),
            (None, None) if self.subject.is_some() => EmailContent::TextPlain(String::new()),
            (None, None) => return Err(EmailError::BuildIncomplete(String::from("message content or subject required"))),
        };

        let sent_date = self.sent_date();
        Self::validate_sent_date(sent_date)?;
        let mut builder = Message::builder().from(from.clone()).date(SystemTime::from(sent_date));

        for mailbox in self.to.iter() {
            builder = builder.to(mailbox.clone());
        }
        for mailbox in self.cc.iter() {
            builder = builder.cc(mailbox.clone());
        }
        for mailbox in self.bcc.iter() {
            builder = builder.bcc(mailbox.clone());
        }
        for mailbox in self.reply_to.iter() {
            builder = builder.reply_to(mailbox.clone());
        }
        if let Some(subject) = &self.subject {
            builder = builder.subject(subject.clone());
        }
        for (name, value) in self.headers.iter() {
            let name = HeaderName::new_from_ascii(name.clone())
                .map_err(|_| EmailError::InvalidArgument(format!("{:?} is not a valid header name", name)))?;
            builder = builder.raw_header(HeaderValue::new(name, value.clone()));
        }

        let message = match &content {
            EmailContent::TextPlain(body) => builder.header(ContentType::TEXT_PLAIN).body(body.clone())?,
            EmailContent::TextHtml(body) => builder.header(ContentType::TEXT_HTML).body(body.clone())?,
            EmailContent::MultiPart(multipart) => builder.multipart(multipart.clone())?,
        };

        self.built = true;
        tracing::debug!("built message from {} to {} recipient(s)", from, message.envelope().to().len());

        Ok(self.message.insert(MimeMessage {
            from,
            to: self.to.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            reply_to: self.reply_to.clone(),
            subject: self.subject.clone(),
            content,
            headers: self.headers.clone(),
            sent_date,
            message,
        }))
    }

    /// The message built by [`build_mime_message`](EmailDraft::build_mime_message), if any.
    pub fn mime_message(&self) -> Option<&MimeMessage> {
        self.message.as_ref()
    }

    /// Hands the built message over to the caller.
    pub fn take_mime_message(&mut self) -> Option<MimeMessage> {
        self.message.take()
    }

    fn validate_header(name: &str, value: &str) -> Result<(String, String), EmailError> {
        if name.is_empty() {
            return Err(EmailError::InvalidArgument(String::from("header name can not be empty")));
        }
        if value.is_empty() {
            return Err(EmailError::InvalidArgument(String::from("header value can not be empty")));
        }
        if !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') || name.len() > 76 {
            return Err(EmailError::InvalidArgument(format!("{:?} is not a valid header name", name)));
        }
        if RESERVED_HEADERS.iter().any(|reserved| reserved.eq_ignore_ascii_case(name)) {
            return Err(EmailError::InvalidArgument(format!("{:?} is set by the draft and can not be a custom header", name)));
        }

        Ok((name.to_owned(), value.to_owned()))
    }

    fn insert_header(headers: &mut BTreeMap<String, String>, name: String, value: String) {
        headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        headers.insert(name, value);
    }

    fn validate_sent_date(date: OffsetDateTime) -> Result<(), EmailError> {
        if date < OffsetDateTime::UNIX_EPOCH {
            return Err(EmailError::InvalidArgument(format!("sent date {:?} is before the Unix epoch", date)));
        }

        Ok(())
    }
}

pub(crate) fn find_header<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
