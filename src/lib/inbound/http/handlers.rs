use crate::domain::models::Dataset;
use axum::{Json, extract::State};
use std::sync::Arc;

/// `GET /api/occurrences`: every cleaned record, scrubbed again before serialization.
pub async fn get_occurrences(State(dataset): State<Arc<Dataset>>) -> Json<Dataset> {
    Json(dataset.scrubbed())
}
