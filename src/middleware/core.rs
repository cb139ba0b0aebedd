use futures::future::{self, BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

use crate::context::Context;

/// A stage of a request chain.
///
/// Each stage receives the context by value together with a [`Next`]
/// continuation. Calling `next.run(ctx).await` executes the remainder of the
/// chain and hands the context back; anything after that call runs on the way
/// out. A stage that returns without calling `next` ends the forward phase.
///
/// Plain async closures are stages:
///
/// ```rust
/// use radixroute::{Context, Next};
///
/// let stage = |mut ctx: Context, next: Next| async move {
///     ctx.push_body("before ");
///     let mut ctx = next.run(ctx).await;
///     ctx.push_body(" after");
///     ctx
/// };
/// # let _ = stage;
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture<'static, Context>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Context> + Send + 'static,
{
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture<'static, Context> {
        self(ctx, next).boxed()
    }
}

/// Shared, type-erased stage. This is what the trie stores per method and per
/// anchor, and what layers hold.
pub type Handler = Arc<dyn Middleware>;

/// Wrap any stage into a [`Handler`].
pub fn handler<M: Middleware>(stage: M) -> Handler {
    Arc::new(stage)
}

/// Continuation handed to each stage.
///
/// A continuation walks a shared slice of stages by index; once the slice is
/// exhausted it resumes the continuation of the enclosing chain (`tail`), so a
/// composed chain used as a single stage of another chain hands control back
/// to its caller.
#[derive(Clone)]
pub struct Next {
    stages: Arc<[Handler]>,
    index: usize,
    tail: Option<Box<Next>>,
}

impl Next {
    /// The empty continuation: running it returns the context unchanged.
    #[must_use]
    pub fn end() -> Self {
        Self {
            stages: Arc::from(Vec::new()),
            index: 0,
            tail: None,
        }
    }

    pub(crate) fn new(stages: Arc<[Handler]>, tail: Option<Next>) -> Self {
        Self {
            stages,
            index: 0,
            tail: tail.map(Box::new),
        }
    }

    /// Run the remainder of the chain.
    pub fn run(self, ctx: Context) -> BoxFuture<'static, Context> {
        match self.stages.get(self.index).map(Arc::clone) {
            Some(stage) => {
                let next = Next {
                    stages: self.stages,
                    index: self.index + 1,
                    tail: self.tail,
                };
                stage.handle(ctx, next)
            }
            None => match self.tail {
                Some(tail) => tail.run(ctx),
                None => future::ready(ctx).boxed(),
            },
        }
    }
}
