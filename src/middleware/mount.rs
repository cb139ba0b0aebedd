use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

use super::{handler, Handler, Middleware, Next};
use crate::context::Context;

/// Runs a middleware registered under a path prefix.
///
/// Requests outside the prefix skip the inner middleware entirely. Inside it,
/// the inner middleware observes `ctx.path` with the prefix removed; the full
/// path is put back while the rest of the chain runs and removed again when
/// it returns, so code on either side of `next` sees the same stripped path.
/// The full path is restored once the inner middleware finishes.
///
/// The prefix is matched one segment at a time: a `:name` segment accepts any
/// non-empty segment, and `ctx.mount_path` is set to the concrete text it
/// consumed.
pub struct PathPrefix {
    prefix: String,
    segments: Vec<String>,
    case_sensitive: bool,
    inner: Handler,
}

impl PathPrefix {
    #[must_use]
    pub fn new(prefix: impl Into<String>, case_sensitive: bool, inner: Handler) -> Self {
        let prefix = prefix.into();
        let segments = prefix.split('/').skip(1).map(str::to_owned).collect();
        Self {
            prefix,
            segments,
            case_sensitive,
            inner,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The path as seen under this prefix, or `None` if `path` is outside it.
    #[must_use]
    pub fn strip(&self, path: &str) -> Option<String> {
        let rest = &path[self.matched_len(path)?..];
        Some(if rest.is_empty() {
            "/".to_owned()
        } else {
            rest.to_owned()
        })
    }

    /// Length of the leading part of `path` covered by the prefix.
    fn matched_len(&self, path: &str) -> Option<usize> {
        let bytes = path.as_bytes();
        let last = self.segments.len().saturating_sub(1);
        let mut pos = 0;
        for (i, segment) in self.segments.iter().enumerate() {
            if bytes.get(pos) != Some(&b'/') {
                return None;
            }
            pos += 1;
            // "/some/" also covers the slash after "some"
            if segment.is_empty() && i == last {
                return Some(pos);
            }
            let end = path[pos..].find('/').map_or(path.len(), |offset| pos + offset);
            let given = &path[pos..end];
            let matched = if segment.len() > 1 && segment.starts_with(':') {
                !given.is_empty()
            } else if self.case_sensitive {
                given == segment
            } else {
                given.eq_ignore_ascii_case(segment)
            };
            if !matched {
                return None;
            }
            pos = end;
        }
        Some(pos)
    }
}

/// Puts the full path back for the downstream chain.
struct Restore {
    full: String,
    stripped: String,
}

impl Middleware for Restore {
    fn handle(&self, mut ctx: Context, next: Next) -> BoxFuture<'static, Context> {
        let stripped = self.stripped.clone();
        ctx.path = self.full.clone();
        async move {
            let mut ctx = next.run(ctx).await;
            ctx.path = stripped;
            ctx
        }
        .boxed()
    }
}

impl Middleware for PathPrefix {
    fn handle(&self, mut ctx: Context, next: Next) -> BoxFuture<'static, Context> {
        let Some(pos) = self.matched_len(&ctx.path) else {
            return next.run(ctx);
        };
        let stripped = match &ctx.path[pos..] {
            "" => "/".to_owned(),
            rest => rest.to_owned(),
        };

        ctx.mount_path = Some(ctx.path[..pos].to_owned());
        let full = std::mem::replace(&mut ctx.path, stripped.clone());

        let restore = handler(Restore {
            full: full.clone(),
            stripped,
        });
        let downstream = Next::new(Arc::from(vec![restore]), Some(next));
        let inner = self.inner.handle(ctx, downstream);
        async move {
            let mut ctx = inner.await;
            ctx.path = full;
            ctx
        }
        .boxed()
    }
}
