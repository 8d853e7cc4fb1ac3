#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PosterError {
    #[error("Failed to download photo: HTTP {status}")]
    DownloadFailed { status: u16 },

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to read photo '{path}': {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Poster rendering task failed: {0}")]
    RenderTask(#[from] tokio::task::JoinError),
}

impl From<wreq::Error> for PosterError {
    fn from(e: wreq::Error) -> Self {
        PosterError::RequestFailed(Box::new(e))
    }
}
