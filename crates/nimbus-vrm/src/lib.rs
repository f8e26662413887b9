//! VRM (virtual registry) client and data models for the Nimbus cloud platform.
//!
//! Manages container image repositories and their tags, and waits for pushed
//! tags to finish processing.

#![deny(missing_docs)]

pub mod client;
pub mod models;
pub mod wait;

pub use client::{VrmClient, VrmClientBuilder};
pub use models::{
    CreateRepositoryRequest, Repository, RepositoryListParams, Tag, TagListParams, TagStatus,
    Visibility,
};
pub use wait::wait_for_tag_status;

/// Convenient result alias that reuses the shared Nimbus error type.
pub type Result<T> = nimbus_core::Result<T>;
