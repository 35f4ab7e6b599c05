use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown delegate: {0} (expected gpu, nnapi, cpu or cpu:<threads>)")]
    UnknownDelegate(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}
