pub mod common;

#[cfg(feature = "email")]
pub mod email;
