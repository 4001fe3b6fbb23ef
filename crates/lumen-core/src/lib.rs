pub mod config;
pub mod error;
pub mod id;
pub mod logging;
pub mod traits;

pub use config::{LightingConfig, RendererConfig};
pub use error::{LumenError, Result, ShaderStage};
pub use id::{IdAllocator, ObjectId};
pub use logging::{init_logging, LoggingConfig};
