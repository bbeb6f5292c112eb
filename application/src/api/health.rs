//! Health check endpoint.

use axum::Json;
use serde::Serialize;

/// Status of a running server.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Health {
    /// Always `"ok"` while the server is able to answer.
    pub status: &'static str,
}

/// Reports that the server is up. Requires no authorization.
pub async fn check() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[cfg(test)]
mod spec {
    #[tokio::test]
    async fn reports_ok() {
        let axum::Json(health) = super::check().await;

        assert_eq!(health.status, "ok");
    }
}
