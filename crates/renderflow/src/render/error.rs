use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render create failed: {status} {body}")]
    CreateFailed { status: u16, body: String },

    #[error("render create response carried no job id")]
    MissingJobId,

    #[error("render job failed: {0}")]
    ProviderFailed(String),

    #[error("render timed out after {attempts} status checks")]
    Timeout { attempts: u32 },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
