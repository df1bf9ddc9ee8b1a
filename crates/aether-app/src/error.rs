use aether_atmosphere::{ModelError, ParamsError};
use aether_config::ConfigError;
use aether_render::RenderError;

/// Anything that stops a render before the image is written.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid planet: {0}")]
    Params(#[from] ParamsError),

    #[error("failed to load network: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// The progress reporter thread could not be started.
    #[error("failed to spawn progress thread: {0}")]
    Spawn(#[source] std::io::Error),
}
