//! Session authentication for protected routes.

pub mod context;
pub mod limiter;
pub mod middleware;

pub use context::ActorContext;
pub use limiter::AuthFailureLimiter;
pub use middleware::auth_middleware;
