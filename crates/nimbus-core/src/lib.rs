//! # nimbus-core
//!
//! HTTP execution core shared by the Nimbus cloud SDK service crates.
//!
//! ## Modules
//!
//! - [`backoff`] - Exponential backoff with jitter and retry eligibility
//! - [`client`] - Retrying HTTP dispatcher used by every service client
//! - [`waiter`] - Polling until a remote condition holds
//! - [`error`] - Error taxonomy and structured API errors
//! - [`context`] - Cancellation and deadlines carried through a call
//! - [`transport`] - Single round-trip HTTP seam and its reqwest implementation
//! - [`logger`] - Injectable diagnostics sink
//! - [`config`] - Client configuration
//! - [`query`] - Query parameter builder
//! - [`ids`] - Typed resource identifiers
//! - [`status`] - Lifecycle status enums with an `Unknown` catch-all

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backoff;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod logger;
pub mod query;
pub mod status;
pub mod transport;
pub mod waiter;

pub use backoff::BackoffStrategy;
pub use client::{ApiRequest, ServiceClient, ServiceClientBuilder};
pub use config::ClientConfig;
pub use context::RequestContext;
pub use error::{ApiError, Error, ErrorCategory, Result};
pub use waiter::{Waiter, WaiterConfig};
