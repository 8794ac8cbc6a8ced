//! HTTP gateway server (§4.1, §6).

mod dispatch;
mod guards;
mod router;
mod routes;
mod state;

pub use router::gateway_router;
pub use state::GatewayState;
