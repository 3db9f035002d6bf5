//! Relay server for Courier.
//!
//! Hosts the forwarding engine, its background loops and a small HTTP
//! surface: `GET /` and `GET /health` for liveness, `GET /status` for the
//! JSON status snapshot.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod log_only;
mod settings;

pub use api::{ApiState, LIVENESS_TEXT, create_router};
pub use log_only::{LogOnlyClient, TracingSink};
pub use settings::ServerSettings;
