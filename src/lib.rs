//! sensor hub: accepts readings pushed by a sensor device over http, keeps
//! them in an append-only csv log and serves the newest one back as json.

pub mod config;
pub mod domain;
pub mod error;
pub mod info;
pub mod logging;
pub mod routes;
pub mod store;

pub use config::TelemetryConfig;
pub use domain::SensorRecord;
pub use error::{TelemetryError, TelemetryResult};
pub use routes::{create_app, AppState};
pub use store::AppendStore;
