//! Gateway: HTTP surface for Zoom webhooks and the app's informational pages.
//!
//! Single port. POST /unsplash runs the relay; POST /deauthorize acknowledges and
//! forwards a compliance notice in the background.

mod pages;
mod server;

pub use server::{router, run_gateway, GatewayState};
