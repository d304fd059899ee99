//! Configuration Management
//!
//! Layered settings loaded from defaults, config files, and environment.

pub mod settings;

pub use settings::{
    CorsSettings, DatabaseSettings, JwtSettings, ServerSettings, Settings, SnowflakeSettings,
    WebSocketSettings,
};
