use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmailError {
    /// Malformed or absent address input.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Absent or malformed argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A host or session is required but none is configured.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// The draft lacks fields required to build a message.
    #[error("Build incomplete: {0}")]
    BuildIncomplete(String),

    #[error("The message is already built")]
    AlreadyBuilt,

    #[error("Message error: {0}")]
    Message(#[from] lettre::error::Error),
}
