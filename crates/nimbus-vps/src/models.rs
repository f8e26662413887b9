//! VPS request and response models.

use chrono::{DateTime, Utc};
use nimbus_core::ids::{FloatingIpId, RouterId};
use nimbus_core::query::QueryParams;
use serde::{Deserialize, Serialize};
use validator::Validate;

nimbus_core::status_enum! {
    /// Lifecycle status of a router.
    RouterStatus {
        /// Provisioned and forwarding traffic
        Active => "ACTIVE",
        /// Being provisioned or reconfigured
        Build => "BUILD",
        /// Teardown in progress
        Deleting => "DELETING",
        /// Provisioning failed
        Error => "ERROR",
    }
}

nimbus_core::status_enum! {
    /// Lifecycle status of a floating IP.
    FloatingIpStatus {
        /// Associated and reachable
        Active => "ACTIVE",
        /// Association in progress
        Build => "BUILD",
        /// Allocated but not associated
        Down => "DOWN",
        /// Association failed
        Error => "ERROR",
    }
}

/// A virtual router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Router {
    /// Router ID
    pub id: RouterId,
    /// Display name
    pub name: String,
    /// Lifecycle status
    pub status: RouterStatus,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the router has an external gateway
    #[serde(default)]
    pub external_gateway: bool,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating a router.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouterRequest {
    /// Display name
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Free-form description
    #[validate(length(max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Attach an external gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_gateway: Option<bool>,
}

impl CreateRouterRequest {
    /// Create a request for a router with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            external_gateway: None,
        }
    }
}

/// Partial update of a router.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRouterRequest {
    /// New display name
    #[validate(length(min = 1, max = 64))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description
    #[validate(length(max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Attach or detach the external gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_gateway: Option<bool>,
}

/// Filters for listing routers.
#[derive(Debug, Default, Clone)]
pub struct RouterListParams {
    /// Exact name
    pub name: Option<String>,
    /// Lifecycle status
    pub status: Option<RouterStatus>,
    /// Page size
    pub limit: Option<u32>,
    /// Resume after this router ID
    pub marker: Option<RouterId>,
}

impl RouterListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_opt("status", self.status);
        params.push_opt("limit", self.limit);
        params.push_opt("marker", self.marker.as_ref());

        params.into_pairs()
    }
}

/// A floating (public) IP address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatingIp {
    /// Floating IP ID
    pub id: FloatingIpId,
    /// Public address
    pub address: String,
    /// Lifecycle status
    pub status: FloatingIpStatus,
    /// Router the address is associated with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_id: Option<RouterId>,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for allocating a floating IP.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFloatingIpRequest {
    /// Associate with this router right away
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_id: Option<RouterId>,
    /// Free-form description
    #[validate(length(max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update of a floating IP.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFloatingIpRequest {
    /// Associate with a router
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_id: Option<RouterId>,
    /// New description
    #[validate(length(max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Filters for listing floating IPs.
#[derive(Debug, Default, Clone)]
pub struct FloatingIpListParams {
    /// Associated router
    pub router_id: Option<RouterId>,
    /// Lifecycle status
    pub status: Option<FloatingIpStatus>,
    /// Page size
    pub limit: Option<u32>,
    /// Resume after this floating IP ID
    pub marker: Option<FloatingIpId>,
}

impl FloatingIpListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("routerId", self.router_id.as_ref());
        params.push_opt("status", self.status);
        params.push_opt("limit", self.limit);
        params.push_opt("marker", self.marker.as_ref());

        params.into_pairs()
    }
}
