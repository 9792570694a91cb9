use thiserror::Error as TError;

#[derive(Debug, TError)]
pub enum Error {
    /// DA parsing error
    #[error("DA parsing error: {0}")]
    DA(#[from] crate::da::err::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// bincode crate error
    #[error("Bincode decode error: {0}")]
    Bincode(#[from] bincode::error::DecodeError),

    /// regex crate error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Any other error
    #[error("{0}")]
    Custom(#[from] Box<dyn std::error::Error>),
}
