#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid capacity: {0}, capacity must be greater than 0")]
    InvalidCapacity(usize),

    #[error("Inconsistent sizing: {0}")]
    InconsistentSizing(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn inconsistent(name: &str, msg: String) -> Error {
    tracing::error!(cache = name, "{}", msg);
    Error::InconsistentSizing(msg)
}
