pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("graph contains an edge with a missing endpoint: {edge_id}")]
    MissingEndpoint { edge_id: String },

    #[error("invalid setting: {name} = {value} (expected {expected})")]
    InvalidSetting {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("operation canceled")]
    Canceled,

    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error(transparent)]
    Linalg(#[from] narwhal_linalg::Error),
}

impl Error {
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }
}
