pub mod handlers;

use crate::{config::Config, domain::models::Dataset};
use anyhow::Context;
use axum::{Router, http::HeaderValue, routing::get};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

pub const OCCURRENCES_PATH: &str = "/api/occurrences";

/// Grants one origin credentialed access with any method and header.
///
/// Methods and headers are mirrored from the preflight request because browsers reject
/// wildcards on credentialed responses.
pub fn cors_layer(allowed_origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin)
        .with_context(|| format!("invalid allowed origin: {}", allowed_origin))?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub fn router(dataset: Arc<Dataset>, cors: CorsLayer) -> Router {
    Router::new()
        .route(OCCURRENCES_PATH, get(handlers::get_occurrences))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(dataset)
}

pub async fn serve(config: &Config, dataset: Arc<Dataset>) -> anyhow::Result<()> {
    let record_count = dataset.len();
    let app = router(dataset, cors_layer(&config.allowed_origin)?);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!(
        "Serving {} occurrence records on http://{}{}",
        record_count,
        listener.local_addr()?,
        OCCURRENCES_PATH
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated with an error")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CellValue, MinimalRecord, Numeric, OccurrenceRecord};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    const ORIGIN: &str = "https://kookmao.github.io";

    fn dataset() -> Arc<Dataset> {
        Arc::new(Dataset::Full(vec![
            OccurrenceRecord {
                species: "Hirundo rustica".to_string(),
                decimal_latitude: Numeric::Number(52.5),
                decimal_longitude: Numeric::Number(13.4),
                event_date: Some("2020-03-15".to_string()),
                individual_count: 2,
                year: Numeric::Number(2020.0),
                state_province: Some("Berlin".to_string()),
            },
            OccurrenceRecord {
                species: "Hirundo rustica".to_string(),
                decimal_latitude: Numeric::Number(f64::NAN),
                decimal_longitude: Numeric::Number(f64::INFINITY),
                event_date: None,
                individual_count: 1,
                year: Numeric::Number(1999.0),
                state_province: None,
            },
        ]))
    }

    fn app() -> Router {
        router(dataset(), cors_layer(ORIGIN).unwrap())
    }

    fn get_request(uri: &str, origin: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn occurrences_are_served_as_json() {
        let response = app()
            .oneshot(get_request(OCCURRENCES_PATH, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = axum::body::to_bytes(response.into_body(), 100_000)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {
                    "species": "Hirundo rustica",
                    "decimalLatitude": 52.5,
                    "decimalLongitude": 13.4,
                    "eventDate": "2020-03-15",
                    "individualCount": 2,
                    "year": 2020.0,
                    "stateProvince": "Berlin"
                },
                {
                    "species": "Hirundo rustica",
                    "decimalLatitude": null,
                    "decimalLongitude": null,
                    "eventDate": null,
                    "individualCount": 1,
                    "year": 1999.0,
                    "stateProvince": null
                }
            ])
        );
    }

    #[tokio::test]
    async fn minimal_records_are_served_with_five_keys() {
        let dataset = Arc::new(Dataset::Minimal(vec![MinimalRecord {
            species: "Grus grus".to_string(),
            decimal_latitude: CellValue::from_text("52.5"),
            decimal_longitude: CellValue::from_text("nan"),
            event_date: "03/15/20".to_string(),
            individual_count: CellValue::from_text("4"),
        }]));
        let response = router(dataset, cors_layer(ORIGIN).unwrap())
            .oneshot(get_request(OCCURRENCES_PATH, None))
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 100_000)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "species": "Grus grus",
                "decimalLatitude": 52.5,
                "decimalLongitude": null,
                "eventDate": "03/15/20",
                "individualCount": 4
            }])
        );
    }

    #[tokio::test]
    async fn allowed_origin_gets_credentialed_access() {
        let response = app()
            .oneshot(get_request(OCCURRENCES_PATH, Some(ORIGIN)))
            .await
            .unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn other_origins_are_not_granted() {
        let response = app()
            .oneshot(get_request(OCCURRENCES_PATH, Some("https://example.org")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[tokio::test]
    async fn preflight_mirrors_methods_and_headers() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri(OCCURRENCES_PATH)
            .header(header::ORIGIN, ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-trace-id")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "DELETE");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-trace-id");
    }

    #[test]
    fn invalid_origin_is_rejected() {
        assert!(cors_layer("https://bad\norigin").is_err());
    }
}
