use axum::{routing::get, Router};

use booking_cell::{appointment_routes, provider_routes, BookingState};

pub fn create_router(state: BookingState) -> Router {
    Router::new()
        .route("/", get(|| async { "Salon booking API is running!" }))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/providers", provider_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use booking_cell::store::MemoryStore;
    use shared_config::AppConfig;

    #[tokio::test]
    async fn root_reports_liveness() {
        let state = BookingState::new(Arc::new(MemoryStore::new()), &AppConfig::default());
        let response = create_router(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Salon booking API is running!");
    }
}
