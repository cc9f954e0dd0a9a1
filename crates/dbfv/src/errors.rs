use thiserror::Error;

use crate::rkg::ShareShape;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum encapsulating all the possible errors from this library.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Indicates that an error in the underlying mathematical library was
    /// encountered.
    #[error("{0}")]
    MathError(#[from] dbfv_math::Error),

    /// Indicates that the sampler could not produce an element.
    #[error("Sampling error: {0}")]
    SamplingError(String),

    /// Indicates that a share, a matrix or a key does not have the shape
    /// expected by the protocol engine.
    #[error("Invalid share shape: expected {expected}, found {found}")]
    ShareShape {
        /// The shape of the protocol engine.
        expected: ShareShape,
        /// The shape that was provided.
        found: ShareShape,
    },

    /// Indicates that too few values were provided.
    #[error("Too few values provided: {0} is below limit {1}")]
    TooFewValues(usize, usize),

    /// Indicates that an input is invalid.
    #[error("{0}")]
    ParametersError(#[from] ParametersError),
}

/// Separate enum to indicate parameters-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParametersError {
    /// Indicates that the degree is invalid.
    #[error("Invalid degree: {0} is not a power of 2 larger than 8")]
    InvalidDegree(usize),

    /// Indicates that the moduli sizes are invalid.
    #[error("Invalid modulus size: {0}, expected an integer between {1} and {2}")]
    InvalidModulusSize(usize, usize, usize),

    /// Indicates that there exists not enough primes.
    #[error("Not enough primes of size {0} for polynomials of degree {1}")]
    NotEnoughPrimes(usize, usize),

    /// Indicates that too many parameters were specified.
    #[error("{0}")]
    TooManySpecified(String),

    /// Indicates that too few parameters were specified.
    #[error("{0}")]
    TooFewSpecified(String),

    /// Indicates that the digit size of the decomposition is invalid.
    #[error("Invalid bit decomposition: {0}, expected an integer between 1 and {1}")]
    InvalidBitDecomposition(usize, usize),

    /// Indicates that the standard deviation of the error is invalid.
    #[error("Invalid standard deviation: {0}")]
    InvalidSigma(String),
}

#[cfg(test)]
mod tests {
    use crate::{rkg::ShareShape, Error, ParametersError};

    #[test]
    fn error_strings() {
        assert_eq!(
            Error::MathError(dbfv_math::Error::InvalidContext).to_string(),
            dbfv_math::Error::InvalidContext.to_string()
        );
        assert_eq!(
            Error::SamplingError("no".to_string()).to_string(),
            "Sampling error: no"
        );
        assert_eq!(
            Error::ShareShape {
                expected: ShareShape::new(3, 2),
                found: ShareShape::new(2, 2)
            }
            .to_string(),
            "Invalid share shape: expected 3 moduli x 2 levels, found 2 moduli x 2 levels"
        );
        assert_eq!(
            Error::TooFewValues(0, 1).to_string(),
            "Too few values provided: 0 is below limit 1"
        );
        assert_eq!(
            Error::ParametersError(ParametersError::InvalidDegree(10)).to_string(),
            "Invalid degree: 10 is not a power of 2 larger than 8"
        );
        assert_eq!(
            Error::ParametersError(ParametersError::InvalidModulusSize(1, 2, 3)).to_string(),
            "Invalid modulus size: 1, expected an integer between 2 and 3"
        );
        assert_eq!(
            Error::ParametersError(ParametersError::NotEnoughPrimes(1, 2)).to_string(),
            "Not enough primes of size 1 for polynomials of degree 2"
        );
        assert_eq!(
            Error::ParametersError(ParametersError::InvalidBitDecomposition(0, 60)).to_string(),
            "Invalid bit decomposition: 0, expected an integer between 1 and 60"
        );
    }
}
