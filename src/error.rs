use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Result type used by the parsing, reporting, and command line layers.
pub type IdleSpotResult<T> = Result<T, Box<dyn Error>>;

/// Errors raised by the clustering core.
#[derive(Debug, Clone, PartialEq)]
pub enum IdleSpotError {
    /// A coordinate, radius, or count that the clustering pass cannot work with.
    InvalidInput(String),
}

impl Display for IdleSpotError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        match self {
            IdleSpotError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
        }
    }
}

impl Error for IdleSpotError {}
