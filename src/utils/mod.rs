// Utility modules
pub mod headers;
pub mod responses;
