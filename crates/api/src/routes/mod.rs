//! API Routes

pub mod ingest;
pub mod records;
