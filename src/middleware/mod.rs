mod compose;
mod core;
mod layer;
mod mount;
mod not_found;
mod tracing;

pub use compose::{compose, compose_middleware, composer};
pub use core::{handler, Handler, Middleware, Next};
pub use layer::Layer;
pub(crate) use layer::join_paths;
pub use mount::PathPrefix;
pub use not_found::{not_found, NOT_FOUND_BODY};
pub use tracing::TracingMiddleware;
