//! API layer - Edge endpoints and the proxy fallback

pub mod edge;
pub mod health;
pub mod middleware;
pub mod proxy;
pub mod router;
pub mod state;
pub mod types;

pub use router::{create_router, create_router_with_state, EDGE_PREFIX};
pub use state::AppState;
