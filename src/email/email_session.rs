use std::{collections::BTreeMap, time::Duration};

use crate::{common::utils, email::{email_address, email_error::EmailError}};

pub const MAIL_HOST: &str = "mail.smtp.host";
pub const MAIL_PORT: &str = "mail.smtp.port";
pub const MAIL_SMTP_CONNECTIONTIMEOUT: &str = "mail.smtp.connectiontimeout";
pub const MAIL_SMTP_TIMEOUT: &str = "mail.smtp.timeout";
pub const MAIL_SMTP_FROM: &str = "mail.smtp.from";
pub const MAIL_TRANSPORT_STARTTLS_ENABLE: &str = "mail.smtp.starttls.enable";
pub const MAIL_TRANSPORT_PROTOCOL: &str = "mail.transport.protocol";

pub const SMTP: &str = "smtp";
pub const DEFAULT_SMTP_PORT: u16 = 25;
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Transport configuration keyed by string properties.
///
/// Sending is left to the transport; the session only carries what it needs to connect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailSession {
    properties: BTreeMap<String, String>,
}

impl MailSession {
    /// Creates an empty session without any properties.
    pub fn new() -> Self {
        MailSession {
            properties: BTreeMap::new(),
        }
    }

    pub fn builder() -> MailSessionBuilder {
        MailSessionBuilder {
            host: None,
            port: None,
            socket_timeout: None,
            socket_connection_timeout: None,
            bounce_address: None,
            start_tls: false,
        }
    }

    pub fn property(&self, key: impl AsRef<str>) -> Option<&str> {
        self.properties.get(key.as_ref()).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Option<String> {
        self.properties.insert(key.as_ref().to_owned(), value.as_ref().to_owned())
    }

    pub fn remove_property(&mut self, key: impl AsRef<str>) -> Option<String> {
        self.properties.remove(key.as_ref())
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// The `mail.smtp.host` property, ignoring blank values.
    pub fn host(&self) -> Option<&str> {
        self.property(MAIL_HOST).filter(|host| !host.trim().is_empty())
    }

    pub fn port(&self) -> Option<u16> {
        self.property(MAIL_PORT).and_then(|port| port.parse().ok())
    }

    pub fn connection_timeout(&self) -> Option<Duration> {
        self.millis(MAIL_SMTP_CONNECTIONTIMEOUT)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.millis(MAIL_SMTP_TIMEOUT)
    }

    fn millis(&self, key: &str) -> Option<Duration> {
        self.property(key).and_then(|ms| ms.parse().ok()).map(Duration::from_millis)
    }
}

pub struct MailSessionBuilder {
    host: Option<String>,
    port: Option<u16>,
    socket_timeout: Option<Duration>,
    socket_connection_timeout: Option<Duration>,
    bounce_address: Option<String>,
    start_tls: bool,
}

impl MailSessionBuilder {
    pub fn build(self) -> Result<MailSession, EmailError> {
        let address = self.host
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| EmailError::ConfigurationMissing(String::from("cannot find valid hostname for mail session")))?;

        let (host, port) = utils::parse_host(address.trim(), self.port.unwrap_or(DEFAULT_SMTP_PORT))
            .map_err(|err| EmailError::InvalidArgument(format!("port in {:?}: {}", address, err)))?;

        let mut session = MailSession::new();
        session.set_property(MAIL_TRANSPORT_PROTOCOL, SMTP);
        session.set_property(MAIL_HOST, host);
        session.set_property(MAIL_PORT, port.to_string());
        session.set_property(MAIL_SMTP_TIMEOUT, self.socket_timeout.unwrap_or(DEFAULT_SOCKET_TIMEOUT).as_millis().to_string());
        session.set_property(MAIL_SMTP_CONNECTIONTIMEOUT, self.socket_connection_timeout.unwrap_or(DEFAULT_SOCKET_TIMEOUT).as_millis().to_string());
        session.set_property(MAIL_TRANSPORT_STARTTLS_ENABLE, self.start_tls.to_string());

        if let Some(bounce_address) = self.bounce_address {
            let address = email_address::parse_address(bounce_address)?;
            session.set_property(MAIL_SMTP_FROM, address.to_string());
        }

        tracing::trace!("mail session created for {}:{}", host, port);
        Ok(session)
    }

    /// **Required**
    ///
    /// May carry a port, e.g. `smtp.example.com:587`, which takes precedence over `port`.
    pub fn host(mut self, host: impl AsRef<str>) -> Self {
        self.host = Some(host.as_ref().to_owned());
        self
    }

    /// **Optional**
    ///
    /// Default: `25`
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// **Optional**
    ///
    /// Default: `60000 ms`
    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = Some(timeout);
        self
    }

    /// **Optional**
    ///
    /// Default: `60000 ms`
    pub fn socket_connection_timeout(mut self, timeout: Duration) -> Self {
        self.socket_connection_timeout = Some(timeout);
        self
    }

    /// **Optional**
    ///
    /// Envelope sender that receives bounced messages.
    pub fn bounce_address(mut self, email: impl AsRef<str>) -> Self {
        self.bounce_address = Some(email.as_ref().to_owned());
        self
    }

    /// **Optional**
    ///
    /// Default: `false`
    pub fn start_tls(mut self, enabled: bool) -> Self {
        self.start_tls = enabled;
        self
    }
}
