pub mod campaign;
pub mod message;
pub mod prospect;
pub mod user;
