use super::{handler, Handler, Next};
use crate::context::Context;

pub const NOT_FOUND_BODY: &str = "Not Found";

/// Default handler sitting at the bottom of every router's layer stack.
///
/// Lets the rest of the chain run first; if nothing downstream produced a
/// body or chose a status, the request is answered with 404.
#[must_use]
pub fn not_found() -> Handler {
    handler(|ctx: Context, next: Next| async move {
        let mut ctx = next.run(ctx).await;
        if ctx.body.is_none() && ctx.status.is_none() {
            ctx.set_status(404);
            ctx.set_body(NOT_FOUND_BODY);
        }
        ctx
    })
}
