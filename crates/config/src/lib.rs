//! Configuration loading for the lead relay.
//!
//! Settings come from environment variables. They are funnelled through
//! figment as plain strings and then validated into a typed [`Config`], so a
//! bad deployment fails at startup with the name of the offending variable.

pub mod error;
pub mod schema;

pub use error::ConfigError;
pub use schema::{Config, Credentials, ENV_VARS, ProspectConfig};
