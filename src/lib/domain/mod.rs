pub mod ingest;
pub mod models;
