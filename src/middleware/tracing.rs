use futures::future::{BoxFuture, FutureExt};
use std::time::Instant;

use tracing::{field, info, info_span, Instrument};

use super::{Middleware, Next};
use crate::context::Context;

/// Opens a `request` span around the rest of the chain and records the final
/// status and latency on it.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture<'static, Context> {
        let span = info_span!(
            "request",
            request_id = %ctx.request_id,
            method = %ctx.method,
            path = %ctx.path,
            status = field::Empty,
            latency_us = field::Empty,
        );
        let start = Instant::now();
        let recorder = span.clone();
        async move {
            let ctx = next.run(ctx).await;
            let latency_us = start.elapsed().as_micros() as u64;
            recorder.record("status", ctx.status());
            recorder.record("latency_us", latency_us);
            info!(status = ctx.status(), latency_us, "request completed");
            ctx
        }
        .instrument(span)
        .boxed()
    }
}
