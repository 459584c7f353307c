//! # smsrelay
//!
//! Relays Alertmanager webhook notifications as text messages through any
//! HTTP SMS provider.
//!
//! ## Architecture
//!
//! - **Config**: provider connection, parameter mapping, recipient directory
//! - **Provider**: request shaping, body encoding and the HTTP client
//! - **Dispatch**: recipient resolution and bounded background workers
//! - **API**: the webhook endpoint, health and metrics
//!
//! ## Quick Start
//!
//! ```bash
//! # Validate the configuration
//! smsrelay --config config.yaml check-config
//!
//! # Start the relay
//! smsrelay --config config.yaml serve
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod provider;
pub mod relay;

pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::relay::Relay;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::dispatch::{DispatchQueue, Dispatcher};
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::provider::{ProviderClient, SmsSender};
    pub use crate::relay::Relay;
}
