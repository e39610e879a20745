//! HTTP API in front of the quiz pipeline: raw text and document uploads in,
//! numbered questions out.

mod error;
mod handlers;
mod router;
mod server;

pub use error::{ApiError, GatewayError};
pub use server::GatewayServer;
