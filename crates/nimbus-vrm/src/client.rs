//! Asynchronous VRM client implementation.

use crate::models::{
    CreateRepositoryRequest, Repository, RepositoryListParams, Tag, TagListParams,
};
use crate::Result;
use nimbus_core::backoff::BackoffStrategy;
use nimbus_core::client::{ApiRequest, ServiceClient, ServiceClientBuilder};
use nimbus_core::config::ClientConfig;
use nimbus_core::context::RequestContext;
use nimbus_core::ids::RepositoryId;
use nimbus_core::logger::Logger;
use nimbus_core::transport::Transport;
use nimbus_core::Error;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use validator::Validate;

const USER_AGENT: &str = concat!("nimbus-vrm/", env!("CARGO_PKG_VERSION"));
const REPOSITORIES: &str = "vrm/v1/repositories";
const MAX_TAG_LEN: usize = 128;

/// Builder for [`VrmClient`].
pub struct VrmClientBuilder {
    inner: ServiceClientBuilder,
}

impl VrmClientBuilder {
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
    pub fn build(self) -> Result<VrmClient> {
        Ok(VrmClient {
            inner: self.inner.build()?,
        })
    }
}

/// Asynchronous VRM client.
#[derive(Debug, Clone)]
pub struct VrmClient {
    inner: ServiceClient,
}

impl VrmClient {
    /// Construct a client directly from the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the transport cannot be built.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        VrmClientBuilder::new(base_url)?.build()
    }

    /// Return the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    /// List repositories.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn list_repositories(
        &self,
        ctx: &RequestContext,
        params: &RepositoryListParams,
    ) -> Result<Vec<Repository>> {
        let request = ApiRequest::get(REPOSITORIES).with_query(params.to_pairs());
        self.inner.execute(ctx, &request).await
    }

    /// Fetch a repository by ID.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn get_repository(
        &self,
        ctx: &RequestContext,
        id: RepositoryId,
    ) -> Result<Repository> {
        self.inner
            .execute(ctx, &ApiRequest::get(format!("{REPOSITORIES}/{id}")))
            .await
    }

    /// Create a repository.
    ///
    /// # Errors
    ///
    /// Returns a validation error without sending anything if the request is
    /// invalid, otherwise the dispatcher error.
    pub async fn create_repository(
        &self,
        ctx: &RequestContext,
        request: &CreateRepositoryRequest,
    ) -> Result<Repository> {
        request.validate()?;
        self.inner
            .execute(ctx, &ApiRequest::post(REPOSITORIES).with_body(request))
            .await
    }

    /// Delete a repository and all of its tags.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn delete_repository(&self, ctx: &RequestContext, id: RepositoryId) -> Result<()> {
        self.inner
            .execute_no_content(ctx, &ApiRequest::delete(format!("{REPOSITORIES}/{id}")))
            .await
    }

    /// List the tags of a repository.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn list_tags(
        &self,
        ctx: &RequestContext,
        repository: RepositoryId,
        params: &TagListParams,
    ) -> Result<Vec<Tag>> {
        let request = ApiRequest::get(format!("{REPOSITORIES}/{repository}/tags"))
            .with_query(params.to_pairs());
        self.inner.execute(ctx, &request).await
    }

    /// Fetch a single tag.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed tag name, otherwise the
    /// dispatcher error.
    pub async fn get_tag(
        &self,
        ctx: &RequestContext,
        repository: RepositoryId,
        tag: &str,
    ) -> Result<Tag> {
        let path = tag_path(repository, tag)?;
        self.inner.execute(ctx, &ApiRequest::get(path)).await
    }

    /// Delete a tag.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed tag name, otherwise the
    /// dispatcher error.
    pub async fn delete_tag(
        &self,
        ctx: &RequestContext,
        repository: RepositoryId,
        tag: &str,
    ) -> Result<()> {
        let path = tag_path(repository, tag)?;
        self.inner.execute_no_content(ctx, &ApiRequest::delete(path)).await
    }
}

/// Path of a tag; the name must be a valid image tag so it is safe as a
/// single path segment.
fn tag_path(repository: RepositoryId, tag: &str) -> Result<String> {
    let mut chars = tag.chars();
    let leading_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if !leading_ok || !rest_ok || tag.len() > MAX_TAG_LEN {
        return Err(Error::Validation(format!("invalid tag name `{tag}`")));
    }
    Ok(format!("{REPOSITORIES}/{repository}/tags/{tag}"))
}
