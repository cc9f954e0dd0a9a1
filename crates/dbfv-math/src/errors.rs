use thiserror::Error;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum encapsulating all the possible errors from this library.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Indicates an invalid modulus
    #[error("Invalid modulus: modulus {0} should be an odd integer between 3 and (1 << 62) - 1.")]
    InvalidModulus(u64),

    /// Indicates that coefficients or a polynomial do not match the context.
    #[error("Invalid context provided.")]
    InvalidContext,

    /// Indicates a probability outside of the accepted range.
    #[error("Invalid probability: {0}")]
    InvalidProbability(String),

    /// Indicates invalid parameters for a noise distribution.
    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    /// Indicates a default error
    #[error("{0}")]
    Default(String),
}

#[cfg(test)]
mod tests {
    use crate::Error;

    #[test]
    fn error_strings() {
        assert_eq!(
            Error::InvalidModulus(0).to_string(),
            "Invalid modulus: modulus 0 should be an odd integer between 3 and (1 << 62) - 1."
        );
        assert_eq!(Error::InvalidContext.to_string(), "Invalid context provided.");
        assert_eq!(
            Error::InvalidProbability("2".to_string()).to_string(),
            "Invalid probability: 2"
        );
        assert_eq!(Error::Default("test".to_string()).to_string(), "test");
    }
}
