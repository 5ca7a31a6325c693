use std::path::PathBuf;

/// Fatal conditions raised by the geometry pipeline.
///
/// Any of these aborts the current frame. The renderer's buffers may be left
/// partially filled, so call `begin_draw` (or `Renderer::reset`) before reuse.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// More nested `push_matrix` calls than the stack can hold.
    #[error("matrix stack overflow: at most {depth} pushes may be nested")]
    MatrixStackOverflow { depth: usize },

    /// `pop_matrix` without a matching `push_matrix`.
    #[error("matrix stack underflow: pop_matrix called more often than push_matrix")]
    MatrixStackUnderflow,

    /// A light declaration beyond the per-frame limit.
    #[error("too many lights: at most {max} lights may be active")]
    TooManyLights { max: usize },

    /// A NaN screen depth reached the depth sorter.
    #[error("NaN depth in primitive {index} while depth sorting")]
    NanDepth { index: usize },

    #[error("begin_camera called while the camera is already being edited")]
    CameraAlreadyActive,

    #[error("end_camera called without a matching begin_camera")]
    CameraNotActive,

    /// `apply_matrix` was handed a matrix with no inverse.
    #[error("matrix is not invertible")]
    SingularMatrix,
}

/// Errors while reading a scene description.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but describes something the pipeline cannot draw.
    #[error("invalid scene: {0}")]
    Invalid(String),
}

/// Top-level error of the command line front-end.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
