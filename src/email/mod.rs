#[cfg(feature = "email")]
mod email_address;
#[cfg(feature = "email")]
pub mod email_clock;
#[cfg(feature = "email")]
pub mod email_content;
#[cfg(feature = "email")]
pub mod email_draft;
#[cfg(feature = "email")]
pub mod email_error;
#[cfg(feature = "email")]
pub mod email_message;
#[cfg(feature = "email")]
pub mod email_session;
