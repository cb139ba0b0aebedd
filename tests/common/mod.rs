#![allow(dead_code)]

use http::Method;
use radixroute::{handler, reply, Context, Handler, Next, Router};
use tracing_subscriber::fmt::MakeWriter;

/// Run one request through `router` to completion.
pub fn simulate(router: &Router, method: Method, path: &str) -> Context {
    futures::executor::block_on(router.dispatch(Context::new(method, path)))
}

/// Middleware appending `text` to the body before continuing.
pub fn tag(text: &'static str) -> Handler {
    handler(move |mut ctx: Context, next: Next| async move {
        ctx.push_body(text);
        next.run(ctx).await
    })
}

/// Route handler appending `text` to the body.
pub fn append(text: &'static str) -> Handler {
    reply(move |ctx: &mut Context| ctx.push_body(text))
}

/// Route handler answering with a fixed body.
pub fn answer(text: &'static str) -> Handler {
    reply(move |_: &mut Context| text)
}

/// Scoped subscriber writing through the libtest capture.
pub struct TestTracing {
    _guard: tracing::subscriber::DefaultGuard,
}

impl TestTracing {
    pub fn init() -> Self {
        Self::with_writer(tracing_subscriber::fmt::TestWriter::default())
    }

    pub fn with_writer<W>(writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .finish();
        Self {
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }
}
