//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_config_path, default_log_path, path_has_symlink_ancestor, CONFIG_ENV};
pub use types::{Config, FailurePolicy, LogLevel};
pub use xml::{create_template_config, load_config, load_config_from_xml_path};

/// Engine data directory used when neither XML nor CLI names one.
pub const ENGINE_DIR_DEFAULT: &str = "/var/lib/docker";
