pub mod api;
pub mod models;

/// Rows shown per listing page, public and admin alike.
pub const PAGE_SIZE: i64 = 50;
