//! Asynchronous VPS client implementation.

use crate::models::{
    CreateFloatingIpRequest, CreateRouterRequest, FloatingIp, FloatingIpListParams, Router,
    RouterListParams, UpdateFloatingIpRequest, UpdateRouterRequest,
};
use crate::Result;
use nimbus_core::backoff::BackoffStrategy;
use nimbus_core::client::{ApiRequest, ServiceClient, ServiceClientBuilder};
use nimbus_core::config::ClientConfig;
use nimbus_core::context::RequestContext;
use nimbus_core::ids::{FloatingIpId, RouterId};
use nimbus_core::logger::Logger;
use nimbus_core::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use validator::Validate;

const USER_AGENT: &str = concat!("nimbus-vps/", env!("CARGO_PKG_VERSION"));
const ROUTERS: &str = "vps/v1/routers";
const FLOATING_IPS: &str = "vps/v1/floating-ips";

/// Builder for [`VpsClient`].
pub struct VpsClientBuilder {
    inner: ServiceClientBuilder,
}

impl VpsClientBuilder {
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
    pub fn build(self) -> Result<VpsClient> {
        Ok(VpsClient {
            inner: self.inner.build()?,
        })
    }
}

/// Asynchronous VPS client.
#[derive(Debug, Clone)]
pub struct VpsClient {
    inner: ServiceClient,
}

impl VpsClient {
    /// Construct a client directly from the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the transport cannot be built.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        VpsClientBuilder::new(base_url)?.build()
    }

    /// Return the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    /// List routers.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn list_routers(
        &self,
        ctx: &RequestContext,
        params: &RouterListParams,
    ) -> Result<Vec<Router>> {
        let request = ApiRequest::get(ROUTERS).with_query(params.to_pairs());
        self.inner.execute(ctx, &request).await
    }

    /// Fetch a router by ID.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn get_router(&self, ctx: &RequestContext, id: RouterId) -> Result<Router> {
        self.inner
            .execute(ctx, &ApiRequest::get(format!("{ROUTERS}/{id}")))
            .await
    }

    /// Create a router. The router starts in `BUILD`.
    ///
    /// # Errors
    ///
    /// Returns a validation error without sending anything if the request is
    /// invalid, otherwise the dispatcher error.
    pub async fn create_router(
        &self,
        ctx: &RequestContext,
        request: &CreateRouterRequest,
    ) -> Result<Router> {
        request.validate()?;
        self.inner
            .execute(ctx, &ApiRequest::post(ROUTERS).with_body(request))
            .await
    }

    /// Update a router.
    ///
    /// # Errors
    ///
    /// Returns a validation error without sending anything if the request is
    /// invalid, otherwise the dispatcher error.
    pub async fn update_router(
        &self,
        ctx: &RequestContext,
        id: RouterId,
        request: &UpdateRouterRequest,
    ) -> Result<Router> {
        request.validate()?;
        self.inner
            .execute(
                ctx,
                &ApiRequest::patch(format!("{ROUTERS}/{id}")).with_body(request),
            )
            .await
    }

    /// Delete a router.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn delete_router(&self, ctx: &RequestContext, id: RouterId) -> Result<()> {
        self.inner
            .execute_no_content(ctx, &ApiRequest::delete(format!("{ROUTERS}/{id}")))
            .await
    }

    /// List floating IPs.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn list_floating_ips(
        &self,
        ctx: &RequestContext,
        params: &FloatingIpListParams,
    ) -> Result<Vec<FloatingIp>> {
        let request = ApiRequest::get(FLOATING_IPS).with_query(params.to_pairs());
        self.inner.execute(ctx, &request).await
    }

    /// Fetch a floating IP by ID.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn get_floating_ip(
        &self,
        ctx: &RequestContext,
        id: FloatingIpId,
    ) -> Result<FloatingIp> {
        self.inner
            .execute(ctx, &ApiRequest::get(format!("{FLOATING_IPS}/{id}")))
            .await
    }

    /// Allocate a floating IP.
    ///
    /// # Errors
    ///
    /// Returns a validation error without sending anything if the request is
    /// invalid, otherwise the dispatcher error.
    pub async fn create_floating_ip(
        &self,
        ctx: &RequestContext,
        request: &CreateFloatingIpRequest,
    ) -> Result<FloatingIp> {
        request.validate()?;
        self.inner
            .execute(ctx, &ApiRequest::post(FLOATING_IPS).with_body(request))
            .await
    }

    /// Update a floating IP, e.g. to associate it with a router.
    ///
    /// # Errors
    ///
    /// Returns a validation error without sending anything if the request is
    /// invalid, otherwise the dispatcher error.
    pub async fn update_floating_ip(
        &self,
        ctx: &RequestContext,
        id: FloatingIpId,
        request: &UpdateFloatingIpRequest,
    ) -> Result<FloatingIp> {
        request.validate()?;
        self.inner
            .execute(
                ctx,
                &ApiRequest::patch(format!("{FLOATING_IPS}/{id}")).with_body(request),
            )
            .await
    }

    /// Release a floating IP.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher error if the request fails.
    pub async fn delete_floating_ip(&self, ctx: &RequestContext, id: FloatingIpId) -> Result<()> {
        self.inner
            .execute_no_content(ctx, &ApiRequest::delete(format!("{FLOATING_IPS}/{id}")))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FloatingIpStatus, RouterStatus};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> VpsClient {
        VpsClient::new(server.uri()).unwrap()
    }

    #[tokio::test]
    async fn list_routers_with_status_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vps/v1/routers"))
            .and(query_param("status", "ERROR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": RouterId::new_v4(),
                "name": "edge",
                "status": "ERROR"
            }])))
            .mount(&server)
            .await;

        let params = RouterListParams {
            status: Some(RouterStatus::Error),
            ..RouterListParams::default()
        };
        let routers = test_client(&server)
            .list_routers(&RequestContext::new(), &params)
            .await
            .unwrap();
        assert_eq!(routers.len(), 1);
        assert_eq!(routers[0].status, RouterStatus::Error);
    }

    #[tokio::test]
    async fn create_router_returns_building_router() {
        let server = MockServer::start().await;
        let id = RouterId::new_v4();
        Mock::given(method("POST"))
            .and(path("/vps/v1/routers"))
            .and(body_json(json!({"name": "edge", "externalGateway": true})))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "id": id,
                "name": "edge",
                "status": "BUILD",
                "externalGateway": true
            })))
            .mount(&server)
            .await;

        let request = CreateRouterRequest {
            external_gateway: Some(true),
            ..CreateRouterRequest::new("edge")
        };
        let router = test_client(&server)
            .create_router(&RequestContext::new(), &request)
            .await
            .unwrap();
        assert_eq!(router.id, id);
        assert_eq!(router.status, RouterStatus::Build);
    }

    #[tokio::test]
    async fn update_router_patches_by_id() {
        let server = MockServer::start().await;
        let id = RouterId::new_v4();
        Mock::given(method("PATCH"))
            .and(path(format!("/vps/v1/routers/{id}").as_str()))
            .and(body_json(json!({"name": "core"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "name": "core",
                "status": "ACTIVE"
            })))
            .mount(&server)
            .await;

        let request = UpdateRouterRequest {
            name: Some("core".into()),
            ..UpdateRouterRequest::default()
        };
        let router = test_client(&server)
            .update_router(&RequestContext::new(), id, &request)
            .await
            .unwrap();
        assert_eq!(router.name, "core");
    }

    #[tokio::test]
    async fn delete_router_conflict_is_structured() {
        let server = MockServer::start().await;
        let id = RouterId::new_v4();
        Mock::given(method("DELETE"))
            .and(path(format!("/vps/v1/routers/{id}").as_str()))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "errorCode": 40901,
                "message": "router has associated floating IPs"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .delete_router(&RequestContext::new(), id)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.api().unwrap().error_code, 40901);
    }

    #[tokio::test]
    async fn floating_ip_lifecycle() {
        let server = MockServer::start().await;
        let id = FloatingIpId::new_v4();
        let router = RouterId::new_v4();

        Mock::given(method("POST"))
            .and(path("/vps/v1/floating-ips"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": id,
                "address": "203.0.113.7",
                "status": "DOWN"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(format!("/vps/v1/floating-ips/{id}").as_str()))
            .and(body_json(json!({"routerId": router})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "address": "203.0.113.7",
                "status": "BUILD",
                "routerId": router
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vps/v1/floating-ips"))
            .and(query_param("routerId", router.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/vps/v1/floating-ips/{id}").as_str()))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let ctx = RequestContext::new();

        let ip = client
            .create_floating_ip(&ctx, &CreateFloatingIpRequest::default())
            .await
            .unwrap();
        assert_eq!(ip.status, FloatingIpStatus::Down);

        let update = UpdateFloatingIpRequest {
            router_id: Some(router),
            ..UpdateFloatingIpRequest::default()
        };
        let ip = client.update_floating_ip(&ctx, id, &update).await.unwrap();
        assert_eq!(ip.router_id, Some(router));

        let params = FloatingIpListParams {
            router_id: Some(router),
            ..FloatingIpListParams::default()
        };
        assert!(client.list_floating_ips(&ctx, &params).await.unwrap().is_empty());

        client.delete_floating_ip(&ctx, id).await.unwrap();
    }

    #[tokio::test]
    async fn delete_router_ignores_response_body() {
        let server = MockServer::start().await;
        let id = RouterId::new_v4();
        Mock::given(method("DELETE"))
            .and(path(format!("/vps/v1/routers/{id}").as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": id, "deleted": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server)
            .delete_router(&RequestContext::new(), id)
            .await
            .unwrap();
    }
}
