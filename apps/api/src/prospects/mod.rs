// Prospect store: CRUD over `prospects`, bulk ingestion and the central
// status transition rules.

pub mod bulk;
pub mod handlers;
pub mod status;
pub mod store;
pub mod validation;

pub use status::ProspectStatus;
