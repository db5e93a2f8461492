use std::collections::BTreeMap;

use lettre::{Message, address::Envelope, message::Mailbox};
use time::OffsetDateTime;

use crate::email::{email_content::EmailContent, email_draft};

/// Immutable message produced by [`EmailDraft::build_mime_message`](crate::email::email_draft::EmailDraft::build_mime_message).
#[derive(Debug, Clone)]
pub struct MimeMessage {
    pub(crate) from: Mailbox,
    pub(crate) to: Vec<Mailbox>,
    pub(crate) cc: Vec<Mailbox>,
    pub(crate) bcc: Vec<Mailbox>,
    pub(crate) reply_to: Vec<Mailbox>,
    pub(crate) subject: Option<String>,
    pub(crate) content: EmailContent,
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) sent_date: OffsetDateTime,
    pub(crate) message: Message,
}

impl MimeMessage {
    pub fn from(&self) -> &Mailbox {
        &self.from
    }

    pub fn to(&self) -> &[Mailbox] {
        &self.to
    }

    pub fn cc(&self) -> &[Mailbox] {
        &self.cc
    }

    pub fn bcc(&self) -> &[Mailbox] {
        &self.bcc
    }

    pub fn reply_to(&self) -> &[Mailbox] {
        &self.reply_to
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn content(&self) -> &EmailContent {
        &self.content
    }

    /// Custom headers set on the draft, looked up ignoring ASCII case.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        email_draft::find_header(&self.headers, name.as_ref())
    }

    pub fn sent_date(&self) -> OffsetDateTime {
        self.sent_date
    }

    /// SMTP envelope derived from the `From`, `To`, `Cc` and `Bcc` headers.
    pub fn envelope(&self) -> &Envelope {
        self.message.envelope()
    }

    /// The full message formatted for SMTP.
    pub fn formatted(&self) -> Vec<u8> {
        self.message.formatted()
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn into_message(self) -> Message {
        self.message
    }
}
