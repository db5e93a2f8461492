use lettre::message::MultiPart;

/// Body of an email.
#[derive(Debug, Clone)]
pub enum EmailContent {
    TextPlain(String),
    TextHtml(String),
    /// Structured body, e.g. `multipart/alternative` or `multipart/mixed`.
    MultiPart(MultiPart),
}

impl EmailContent {
    pub fn text_plain(body: impl AsRef<str>) -> Self {
        EmailContent::TextPlain(body.as_ref().to_owned())
    }

    pub fn text_html(body: impl AsRef<str>) -> Self {
        EmailContent::TextHtml(body.as_ref().to_owned())
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, EmailContent::MultiPart(_))
    }
}

impl From<MultiPart> for EmailContent {
    fn from(multipart: MultiPart) -> Self {
        EmailContent::MultiPart(multipart)
    }
}

/// Multipart bodies compare by their formatted MIME bytes, boundary included.
impl PartialEq for EmailContent {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EmailContent::TextPlain(a), EmailContent::TextPlain(b)) => a == b,
            (EmailContent::TextHtml(a), EmailContent::TextHtml(b)) => a == b,
            (EmailContent::MultiPart(a), EmailContent::MultiPart(b)) => a.formatted() == b.formatted(),
            _ => false,
        }
    }
}
