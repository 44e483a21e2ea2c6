//! HTTP layer for the FordPass API: the low-level client and error taxonomy.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
