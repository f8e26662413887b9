//! IAM client and data models for the Nimbus cloud platform.
//!
//! Provides typed structures and an asynchronous client for managing users
//! through the Identity and Access Management API.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{IamClient, IamClientBuilder};
pub use models::{CreateUserRequest, UpdateUserRequest, User, UserListParams, UserStatus};

/// Convenient result alias that reuses the shared Nimbus error type.
pub type Result<T> = nimbus_core::Result<T>;
