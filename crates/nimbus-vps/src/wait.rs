//! Waiting for routers and floating IPs to settle.

use crate::client::VpsClient;
use crate::models::{FloatingIp, FloatingIpStatus, Router, RouterStatus};
use crate::Result;
use nimbus_core::context::RequestContext;
use nimbus_core::ids::{FloatingIpId, RouterId};
use nimbus_core::waiter::{reached_status, Waiter, WaiterConfig};
use tracing::debug;

/// Poll a router until it reports `target`, returning the final snapshot.
///
/// # Errors
///
/// Fails fast with [`nimbus_core::Error::UnexpectedState`] if the router
/// enters `ERROR` while waiting for a different status. Fetch errors, wait
/// timeouts and cancellation are returned as produced by the waiter.
pub async fn wait_for_router_status(
    client: &VpsClient,
    ctx: &RequestContext,
    id: RouterId,
    target: RouterStatus,
    config: &WaiterConfig,
) -> Result<Router> {
    Waiter::new(*config)
        .poll(ctx, move |ctx| async move {
            let router = client.get_router(&ctx, id).await?;
            debug!(router = %id, status = %router.status, target = %target, "polled router");
            let done = reached_status(
                format!("router {id}"),
                &router.status,
                &target,
                router.status.is_failed(),
            )?;
            Ok(done.then_some(router))
        })
        .await
}

/// Poll a floating IP until it reports `target`, returning the final snapshot.
///
/// # Errors
///
/// Fails fast with [`nimbus_core::Error::UnexpectedState`] if the address
/// enters `ERROR` while waiting for a different status. Fetch errors, wait
/// timeouts and cancellation are returned as produced by the waiter.
pub async fn wait_for_floating_ip_status(
    client: &VpsClient,
    ctx: &RequestContext,
    id: FloatingIpId,
    target: FloatingIpStatus,
    config: &WaiterConfig,
) -> Result<FloatingIp> {
    Waiter::new(*config)
        .poll(ctx, move |ctx| async move {
            let ip = client.get_floating_ip(&ctx, id).await?;
            debug!(
                floating_ip = %id,
                status = %ip.status,
                target = %target,
                "polled floating IP"
            );
            let done = reached_status(
                format!("floating IP {id}"),
                &ip.status,
                &target,
                ip.status.is_failed(),
            )?;
            Ok(done.then_some(ip))
        })
        .await
}
