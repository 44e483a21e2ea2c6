//! Client library for the FordPass vehicle API.
//!
//! Authenticates a FordPass account through Ford's SSO login flow, keeps the
//! access/refresh token pair alive, queries vehicle status by VIN, and issues
//! remote commands (lock, unlock, engine start/stop) that complete
//! asynchronously via a status poll loop.
//!
//! The entry point is [`Vehicle`]:
//!
//! ```no_run
//! use fordpass_core::Vehicle;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let mut vehicle = Vehicle::new("user@example.com", "hunter2", "WX231231232")?;
//! let status = vehicle.status().await?;
//! println!("doors: {:?}", status.lock_status);
//! vehicle.lock().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod models;
pub mod vehicle;

pub use api::{ApiClient, ApiError};
pub use auth::TokenState;
pub use models::{CommandResponse, CommandStatus, VehicleStatus};
pub use vehicle::Vehicle;
