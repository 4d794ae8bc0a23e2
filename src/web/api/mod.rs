pub mod error;
pub mod predict;
