// Configuration management module
// Handles TOML configuration for the server, the databases, and the OpenAI provider

pub mod settings;

pub use settings::{AuthConfig, Config, ConfigError, OpenAiConfig, ServerConfig};
