pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A CSR structural invariant does not hold.
    #[error("malformed CSR matrix: {0}")]
    MalformedMatrix(String),

    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}
