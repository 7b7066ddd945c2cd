use thiserror::Error;
use tokio::sync::AcquireError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Couldn't read the total page count from the bootstrap response: {0}")]
    PageCount(#[source] serde_json::Error),
    #[error("Gave up on the bootstrap request after {attempts} attempts: {last_error}")]
    BootstrapAbandoned { attempts: u32, last_error: String },

    #[error("No client was built for proxy: {0}")]
    UnknownProxy(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),
    #[error("The request limiter was closed while pages were pending.")]
    RuntimeLimiterClosed,

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<AcquireError> for Error {
    fn from(_value: AcquireError) -> Self {
        Error::RuntimeLimiterClosed
    }
}
