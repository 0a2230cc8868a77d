pub mod archive;
pub mod cli;
pub mod config;
pub mod engine;
pub mod http;
pub mod serve;

pub use archive::JsonFileArchive;
pub use config::{ConfigError, LinkchartConfig, ServerConfig};
pub use engine::Engine;
