//! Folding layers and handlers into a single composed handler.
//!
//! Composition order is registration order: the first matching layer runs
//! first and sees the request before everything registered after it.

use futures::future::BoxFuture;
use std::sync::Arc;

use super::{Handler, Layer, Middleware, Next};
use crate::context::Context;
use crate::method::MethodFilter;

/// Several stages run as one. After its last stage the chain resumes the
/// continuation it was called with.
struct Chain {
    stages: Arc<[Handler]>,
}

impl Middleware for Chain {
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture<'static, Context> {
        Next::new(Arc::clone(&self.stages), Some(next)).run(ctx)
    }
}

/// Fold `stages` into one handler.
#[must_use]
pub fn compose(mut stages: Vec<Handler>) -> Handler {
    if stages.len() == 1 {
        if let Some(only) = stages.pop() {
            return only;
        }
    }
    Arc::new(Chain {
        stages: Arc::from(stages),
    })
}

fn matching(method: &MethodFilter, path: &str, layers: &[Layer]) -> Vec<Handler> {
    layers
        .iter()
        .filter(|layer| layer.matches(method, path))
        .map(|layer| Arc::clone(layer.handler()))
        .collect()
}

/// Compose every layer applicable to (`method`, `path`) with `handler` last.
#[must_use]
pub fn composer(method: &MethodFilter, path: &str, handler: Handler, layers: &[Layer]) -> Handler {
    let mut stages = matching(method, path, layers);
    stages.push(handler);
    compose(stages)
}

/// Compose every layer applicable to (`method`, `path`) followed by `extra`,
/// without requiring a terminal handler. Used for fallback chains.
#[must_use]
pub fn compose_middleware(
    method: &MethodFilter,
    path: &str,
    layers: &[Layer],
    extra: &[Handler],
) -> Handler {
    let mut stages = matching(method, path, layers);
    stages.extend(extra.iter().map(Arc::clone));
    compose(stages)
}
