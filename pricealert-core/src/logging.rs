//! HTTP request logging.

use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use std::time::Instant;
use task_local_extensions::Extensions;

/// Logs every request against the alert endpoints and what came back.
///
/// Non-2xx responses are passed through untouched: the proxy puts meaningful
/// bodies on error statuses, and the flow decides what they mean.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LoggingMiddleware;

#[async_trait::async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        tracing::info!(
            url = %req.url(),
            method = %req.method(),
            "Running request"
        );
        let started = Instant::now();
        match next.run(req, extensions).await {
            Ok(resp) => {
                let status = resp.status();
                let content_length = resp.content_length();
                let elapsed_ms = started.elapsed().as_millis();
                if status.is_success() {
                    tracing::info!(?status, ?content_length, elapsed_ms, "Got response");
                } else {
                    tracing::warn!(
                        ?status,
                        ?content_length,
                        elapsed_ms,
                        "Got non-success response"
                    );
                }
                Ok(resp)
            }
            Err(e) => {
                tracing::error!(%e, "Request failed before a response arrived");
                Err(e)
            }
        }
    }
}
