pub mod app;
pub mod core;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod scene;

pub use crate::core::rasterizer::Rasterizer;
pub use crate::error::{AppError, ConfigError, PipelineError};
pub use crate::pipeline::assembler::{CloseMode, ShapeKind};
pub use crate::pipeline::renderer::Renderer;
pub use crate::pipeline::sink::{RasterSink, RawSink, RecordingSink};
pub use crate::scene::context::{Hint, TextureMode};
