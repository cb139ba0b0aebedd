//! # radixroute
//!
//! **radixroute** is an HTTP request router built on a compressed trie, with
//! Koa-style middleware that can be scoped to a path prefix and routers that
//! can be mounted inside other routers.
//!
//! ## Overview
//!
//! Given a method and a path, the router selects one composed handler: the
//! chain of every middleware registered before the route that applies to it,
//! followed by the route handler itself. Lookups never fail; a miss resolves
//! to the middleware registered closest above the requested path, and finally
//! to a not-found handler.
//!
//! ## Architecture
//!
//! - **[`router`]** - the trie ([`Trie`]) and the [`Router`] façade:
//!   registration, mounting, lookup and dispatch
//! - **[`middleware`]** - the [`Middleware`] trait, the [`Next`] continuation,
//!   layers and the composer that folds them into one handler
//! - **[`context`]** - the per-request [`Context`] handed down the chain
//! - **[`response`]** - [`Response`] values, the [`ResponseRegistry`] of named
//!   responses, and the [`reply`] adapter for value-returning handlers
//! - **[`config`]** - [`RouterOptions`] and YAML route tables
//! - **[`logging`]** - `tracing-subscriber` setup
//!
//! ### Request Flow
//!
//! ```text
//! Router::dispatch(ctx)
//!   └─ Trie::locate(method, path, &mut ctx.params)
//!        ├─ exact match  → route handler (layers + handler)
//!        ├─ miss below a middleware node → that node's anchor chain
//!        └─ anything else → root fallback (global layers + not-found)
//!   └─ handler.handle(ctx, Next::end())
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use radixroute::{handler, reply, Context, Next, Router};
//!
//! # fn main() -> Result<(), radixroute::RouterError> {
//! let mut app = Router::new();
//!
//! app.use_middleware(handler(|mut ctx: Context, next: Next| async move {
//!     ctx.push_body("[");
//!     let mut ctx = next.run(ctx).await;
//!     ctx.push_body("]");
//!     ctx
//! }));
//! app.get("/user/:id", reply(|ctx: &mut Context| {
//!     let id = ctx.param("id").unwrap_or_default().to_owned();
//!     ctx.push_body(&id);
//! }))?;
//!
//! let ctx = futures::executor::block_on(
//!     app.dispatch(Context::new(http::Method::GET, "/user/42")),
//! );
//! assert_eq!(ctx.body_text(), "[42]");
//! # Ok(())
//! # }
//! ```
//!
//! ## Path Syntax
//!
//! - Paths start with `/`. `:name` captures one segment (up to the next `/`).
//! - Middleware may be registered at `*` to run for every request.
//! - Unless the router is case-sensitive, paths are matched ASCII
//!   case-insensitively; captured values keep the request's case.
//! - Unless the router is strict, one trailing `/` is ignored.
//!
//! ## Lookup Semantics
//!
//! Lookup is first-match-wins with no backtracking: a static child always
//! wins over a parameter child at the same position, even when the static
//! branch later fails to match.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod logging;
pub mod method;
pub mod middleware;
pub mod response;
pub mod router;

pub use config::{RouteTable, RouterOptions};
pub use context::{Body, Context, ParamVec};
pub use error::RouterError;
pub use ids::RequestId;
pub use method::MethodFilter;
pub use middleware::{handler, Handler, Layer, Middleware, Next, TracingMiddleware};
pub use response::{reply, Reply, Response, ResponseRegistry};
pub use router::{RegistrationTarget, Route, Router, Trie};
