//! Run configuration assembled from the command line, a TOML file, and defaults.

mod builder;
mod defaults;
mod file;

pub use builder::build_config;
