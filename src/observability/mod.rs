//! Observability support

pub mod logging;

pub use logging::{init_default_logging, init_from_config, init_logging, LogFormat};
