use std::path::PathBuf;

/// Errors that can occur while rendering or writing an image.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A worker thread could not be started.
    #[error("failed to spawn render thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// A worker thread panicked before finishing its rows.
    #[error("render thread {0} panicked")]
    WorkerPanicked(usize),

    /// The output file could not be created or written.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] png::EncodingError),
}
