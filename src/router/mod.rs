//! # Router Module
//!
//! Request routing on a compressed trie with path-scoped middleware.
//!
//! ## Overview
//!
//! - [`Trie`] maps paths to composed handlers. Registration splits nodes as
//!   paths diverge; lookup is one forward walk that captures `:name`
//!   parameters and falls back to the nearest middleware anchor on a miss.
//! - [`Router`] normalises registration paths, keeps the ordered middleware
//!   layers, composes each route with the layers registered before it, and
//!   mounts other routers as independent copies.
//!
//! ## Lifecycle
//!
//! Build a router once at startup (registration takes `&mut self`), then
//! share it behind an `Arc`: lookups and dispatch only read it.
//!
//! ## Example
//!
//! ```rust
//! use radixroute::{reply, Context, Router};
//!
//! # fn main() -> Result<(), radixroute::RouterError> {
//! let mut users = Router::new();
//! users.get("/:id", reply(|ctx: &mut Context| format!("id is {}", ctx.param("id").unwrap_or_default())))?;
//!
//! let mut app = Router::new();
//! app.mount("/user", &users)?;
//!
//! let ctx = futures::executor::block_on(app.dispatch(Context::new(http::Method::GET, "/user/42")));
//! assert_eq!(ctx.body_text(), "id is 42");
//! # Ok(())
//! # }
//! ```

mod core;
mod node;
mod radix;
mod route;

pub use core::{RegistrationTarget, Router};
pub use radix::{NodeExport, RouteEntry, Trie};
pub use route::Route;
