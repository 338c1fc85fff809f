pub mod ingest;
pub mod policies;
pub mod recommendations;
pub mod savings;
