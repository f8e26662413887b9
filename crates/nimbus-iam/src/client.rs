//! Asynchronous IAM client implementation.

use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserListParams};
use crate::Result;
use nimbus_core::backoff::BackoffStrategy;
use nimbus_core::client::{ApiRequest, ServiceClient, ServiceClientBuilder};
use nimbus_core::config::ClientConfig;
use nimbus_core::context::RequestContext;
use nimbus_core::ids::UserId;
use nimbus_core::logger::Logger;
use nimbus_core::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use validator::Validate;

const USER_AGENT: &str = concat!("nimbus-iam/", env!("CARGO_PKG_VERSION"));
const USERS: &str = "iam/v1/users";

/// Builder for [`IamClient`].
pub struct IamClientBuilder {
    inner: ServiceClientBuilder,
}

impl IamClientBuilder {
    /// Create a builder for the specified base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::from_config(ClientConfig::new(base_url.as_ref())?)
    }

    /// Create a builder from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is out of range or the base URL
    /// is invalid.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let inner = ServiceClientBuilder::from_config(config)?.with_user_agent(USER_AGENT);
        Ok(Self { inner })
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.inner = self.inner.with_token(token);
        self
    }

    /// Override the retry backoff.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.inner = self.inner.with_backoff(backoff);
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }

    /// Route retry diagnostics to a logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.inner = self.inner.with_logger(logger);
        self
    }

    /// Use a custom transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.inner = self.inner.with_transport(transport);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be constructed.
    pub fn build(self) -> Result<IamClient> {
        Ok(IamClient {
            inner: self.inner.build()?,
        })
    }
}

/// Asynchronous IAM client.
#[derive(Debug, Clone)]
pub struct IamClient {
    inner: ServiceClient,
}

impl IamClient {
    /// Construct a client directly from the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the transport cannot be built.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        IamClientBuilder::new(base_url)?.build()
    }

    /// Return the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    /// List users.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn list_users(
        &self,
        ctx: &RequestContext,
        params: &UserListParams,
    ) -> Result<Vec<User>> {
        let request = ApiRequest::get(USERS).with_query(params.to_pairs());
        self.inner.execute(ctx, &request).await
    }

    /// Fetch a user by ID.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn get_user(&self, ctx: &RequestContext, id: UserId) -> Result<User> {
        self.inner
            .execute(ctx, &ApiRequest::get(format!("{USERS}/{id}")))
            .await
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns [`nimbus_core::Error::Validation`] without sending anything if
    /// the request is invalid, otherwise the dispatcher error.
    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        request: &CreateUserRequest,
    ) -> Result<User> {
        request.validate()?;
        self.inner
            .execute(ctx, &ApiRequest::post(USERS).with_body(request))
            .await
    }

    /// Update a user.
    ///
    /// # Errors
    ///
    /// Returns [`nimbus_core::Error::Validation`] without sending anything if
    /// the request is invalid, otherwise the dispatcher error.
    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        id: UserId,
        request: &UpdateUserRequest,
    ) -> Result<User> {
        request.validate()?;
        self.inner
            .execute(
                ctx,
                &ApiRequest::patch(format!("{USERS}/{id}")).with_body(request),
            )
            .await
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn delete_user(&self, ctx: &RequestContext, id: UserId) -> Result<()> {
        self.inner
            .execute_no_content(ctx, &ApiRequest::delete(format!("{USERS}/{id}")))
            .await
    }
}
