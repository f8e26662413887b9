//! VRM request and response models.

use chrono::{DateTime, Utc};
use nimbus_core::ids::RepositoryId;
use nimbus_core::query::QueryParams;
use serde::{Deserialize, Serialize};
use validator::Validate;

nimbus_core::status_enum! {
    /// Processing status of an image tag.
    TagStatus {
        /// Pushed, scanned and pullable
        Active => "ACTIVE",
        /// Upload or scan still running
        Processing => "PROCESSING",
        /// Processing failed
        Error => "ERROR",
    }
}

/// Who may pull from a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Anyone
    Public,
    /// Members of the owning project only
    Private,
}

/// A container image repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Repository ID
    pub id: RepositoryId,
    /// Repository name, e.g. `team/service`
    pub name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Pull visibility
    pub visibility: Visibility,
    /// Number of tags
    #[serde(default)]
    pub tag_count: u64,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last push time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating a repository.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepositoryRequest {
    /// Repository name
    #[validate(length(min = 2, max = 255))]
    pub name: String,
    /// Free-form description
    #[validate(length(max = 1024))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Pull visibility
    pub visibility: Visibility,
}

impl CreateRepositoryRequest {
    /// Create a request for a private repository.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            visibility: Visibility::Private,
        }
    }
}

/// Filters for listing repositories.
#[derive(Debug, Default, Clone)]
pub struct RepositoryListParams {
    /// Name prefix
    pub name: Option<String>,
    /// Pull visibility
    pub visibility: Option<Visibility>,
    /// Page size
    pub limit: Option<u32>,
    /// Resume after this repository ID
    pub marker: Option<RepositoryId>,
}

impl RepositoryListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_opt_with("visibility", self.visibility, |v| {
            match v {
                Visibility::Public => "PUBLIC",
                Visibility::Private => "PRIVATE",
            }
            .to_string()
        });
        params.push_opt("limit", self.limit);
        params.push_opt("marker", self.marker.as_ref());

        params.into_pairs()
    }
}

/// An image tag within a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag name, e.g. `v1.2.0`
    pub name: String,
    /// Owning repository
    pub repository_id: RepositoryId,
    /// Manifest digest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Compressed image size in bytes
    #[serde(default)]
    pub size_bytes: u64,
    /// Processing status
    pub status: TagStatus,
    /// Push time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Filters for listing tags.
#[derive(Debug, Default, Clone)]
pub struct TagListParams {
    /// Processing status
    pub status: Option<TagStatus>,
    /// Page size
    pub limit: Option<u32>,
    /// Resume after this tag name
    pub marker: Option<String>,
}

impl TagListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("status", self.status);
        params.push_opt("limit", self.limit);
        params.push_opt("marker", self.marker.as_deref());

        params.into_pairs()
    }
}
