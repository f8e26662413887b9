//! IAM request and response models.

use chrono::{DateTime, Utc};
use nimbus_core::ids::UserId;
use nimbus_core::query::QueryParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Account status of an IAM user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// User can authenticate
    Active,
    /// Login disabled by an administrator
    Disabled,
    /// Invitation not yet accepted
    Pending,
    /// Status not known to this client version
    #[serde(other)]
    Unknown,
}

/// An IAM user as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Login name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Account status
    pub status: UserStatus,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating a user.
#[derive(Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Login name
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Contact email
    #[validate(email)]
    pub email: String,
    /// Initial password
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Free-form description
    #[validate(length(max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateUserRequest {
    /// Create a request with the required fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            description: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("description", &self.description)
            .finish()
    }
}

/// Partial update of a user; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    /// New login name
    #[validate(length(min = 1, max = 64))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New contact email
    #[validate(email)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New description
    #[validate(length(max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Enable or disable login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

/// Filters for listing users.
#[derive(Debug, Default, Clone)]
pub struct UserListParams {
    /// Exact login name
    pub name: Option<String>,
    /// Exact email
    pub email: Option<String>,
    /// Account status
    pub status: Option<UserStatus>,
    /// Page size
    pub limit: Option<u32>,
    /// Resume after this user ID
    pub marker: Option<UserId>,
}

impl UserListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_opt("email", self.email.as_deref());
        params.push_opt_with("status", self.status.as_ref(), status_param);
        params.push_opt("limit", self.limit);
        params.push_opt("marker", self.marker.as_ref());

        params.into_pairs()
    }
}

fn status_param(status: &UserStatus) -> String {
    match status {
        UserStatus::Active => "ACTIVE",
        UserStatus::Disabled => "DISABLED",
        UserStatus::Pending => "PENDING",
        UserStatus::Unknown => "UNKNOWN",
    }
    .to_string()
}
