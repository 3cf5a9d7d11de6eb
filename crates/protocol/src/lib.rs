//! Configuration and option types for the Link SDK adapter.
//!
//! These types represent the configuration the caller hands to the session
//! manager and the options forwarded to the vendor session's `open`/`exit`
//! operations. They are designed for serialization to the vendor's JSON
//! configuration shape.

mod config;
mod options;

pub use config::{LinkConfig, LinkConfigBuilder, OnLoad};
pub use options::{ExitOptions, OpenOptions, OpenOptionsBuilder};
