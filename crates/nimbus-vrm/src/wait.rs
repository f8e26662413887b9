//! Waiting for pushed tags to finish processing.

use crate::client::VrmClient;
use crate::models::{Tag, TagStatus};
use crate::Result;
use nimbus_core::context::RequestContext;
use nimbus_core::ids::RepositoryId;
use nimbus_core::waiter::{reached_status, Waiter, WaiterConfig};
use tracing::debug;

/// Poll a tag until it reports `target`, returning the final snapshot.
///
/// # Errors
///
/// Fails fast with [`nimbus_core::Error::UnexpectedState`] if the tag enters
/// `ERROR` while waiting for a different status. Fetch errors (including an
/// invalid tag name), wait timeouts and cancellation are returned as produced
/// by the waiter.
pub async fn wait_for_tag_status(
    client: &VrmClient,
    ctx: &RequestContext,
    repository: RepositoryId,
    tag: &str,
    target: TagStatus,
    config: &WaiterConfig,
) -> Result<Tag> {
    Waiter::new(*config)
        .poll(ctx, move |ctx| async move {
            let current = client.get_tag(&ctx, repository, tag).await?;
            debug!(%repository, tag, status = %current.status, target = %target, "polled tag");
            let done = reached_status(
                format!("tag {repository}:{tag}"),
                &current.status,
                &target,
                current.status.is_failed(),
            )?;
            Ok(done.then_some(current))
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_core::{Error, ErrorCategory};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast() -> WaiterConfig {
        WaiterConfig::new(Duration::from_millis(10), Duration::from_secs(5))
            .with_backoff_multiplier(2.0)
            .with_backoff_cap(Duration::from_millis(40))
    }

    fn tag_body(repo: RepositoryId, status: &str) -> serde_json::Value {
        json!({"name": "v1", "repositoryId": repo, "status": status})
    }

    #[tokio::test]
    async fn tag_becomes_active() {
        let server = MockServer::start().await;
        let repo = RepositoryId::new_v4();
        let route = format!("/vrm/v1/repositories/{repo}/tags/v1");

        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(tag_body(repo, "PROCESSING")))
            .up_to_n_times(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(tag_body(repo, "ACTIVE")))
            .mount(&server)
            .await;

        let client = VrmClient::new(server.uri()).unwrap();
        let tag = wait_for_tag_status(
            &client,
            &RequestContext::new(),
            repo,
            "v1",
            TagStatus::Active,
            &fast(),
        )
        .await
        .unwrap();

        assert_eq!(tag.status, TagStatus::Active);
        assert_eq!(server.received_requests().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn tag_error_fails_fast() {
        let server = MockServer::start().await;
        let repo = RepositoryId::new_v4();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tag_body(repo, "ERROR")))
            .expect(1)
            .mount(&server)
            .await;

        let client = VrmClient::new(server.uri()).unwrap();
        let err = wait_for_tag_status(
            &client,
            &RequestContext::new(),
            repo,
            "v1",
            TagStatus::Active,
            &fast(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::UnexpectedState { ref state, .. } if state == "ERROR"));
        assert!(err.to_string().starts_with(&format!("tag {repo}:v1 ")));
    }

    #[tokio::test]
    async fn cancel_stops_waiting() {
        let server = MockServer::start().await;
        let repo = RepositoryId::new_v4();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tag_body(repo, "PROCESSING")))
            .mount(&server)
            .await;

        let ctx = RequestContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            canceller.cancel();
        });

        let client = VrmClient::new(server.uri()).unwrap();
        let config = WaiterConfig::new(Duration::from_secs(30), Duration::from_secs(60));
        let started = std::time::Instant::now();
        let err = wait_for_tag_status(&client, &ctx, repo, "v1", TagStatus::Active, &config)
            .await
            .unwrap_err();

        assert_eq!(err.category(), Some(ErrorCategory::Canceled));
        assert!(started.elapsed() < Duration::from_secs(30));
    }
}
