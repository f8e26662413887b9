//! VPS client and data models for the Nimbus cloud platform.
//!
//! Covers virtual routers and floating IPs, plus helpers that wait for either
//! to reach a given lifecycle status.

#![deny(missing_docs)]

pub mod client;
pub mod models;
pub mod wait;

pub use client::{VpsClient, VpsClientBuilder};
pub use models::{
    CreateFloatingIpRequest, CreateRouterRequest, FloatingIp, FloatingIpListParams,
    FloatingIpStatus, Router, RouterListParams, RouterStatus, UpdateFloatingIpRequest,
    UpdateRouterRequest,
};
pub use wait::{wait_for_floating_ip_status, wait_for_router_status};

/// Convenient result alias that reuses the shared Nimbus error type.
pub type Result<T> = nimbus_core::Result<T>;
