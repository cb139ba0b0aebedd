//! Response values and the registry of predefined responses.
//!
//! A terminal handler may answer by returning a value instead of writing to
//! the context itself; [`reply`] adapts such a function into a [`Handler`].
//! Named responses live in a [`ResponseRegistry`] owned by the application
//! and passed to whatever resolves them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::context::{Body, Context};
use crate::error::RouterError;
use crate::middleware::{handler, Handler, Next};

/// A status and an optional body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default)]
    pub body: Option<Body>,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Body>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }

    #[must_use]
    pub fn status_only(status: u16) -> Self {
        Self { status, body: None }
    }
}

fn validate_status(status: u16) -> Result<(), RouterError> {
    http::StatusCode::from_u16(status)
        .map(|_| ())
        .map_err(|_| RouterError::InvalidStatus { status })
}

/// Name to response table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseRegistry {
    responses: HashMap<String, Response>,
}

impl ResponseRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) one named response.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        status: u16,
        body: impl Into<Body>,
    ) -> Result<&mut Self, RouterError> {
        validate_status(status)?;
        self.responses
            .insert(name.into(), Response::new(status, body));
        Ok(self)
    }

    /// Replace the whole table. Nothing is replaced if any entry is invalid.
    pub fn define_all<I, K>(&mut self, responses: I) -> Result<&mut Self, RouterError>
    where
        I: IntoIterator<Item = (K, Response)>,
        K: Into<String>,
    {
        let mut table = HashMap::new();
        for (name, response) in responses {
            validate_status(response.status)?;
            table.insert(name.into(), response);
        }
        self.responses = table;
        Ok(self)
    }

    /// A copy of the response defined as `name`.
    pub fn from(&self, name: &str) -> Result<Response, RouterError> {
        self.responses
            .get(name)
            .cloned()
            .ok_or_else(|| RouterError::name_not_found(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.responses.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

/// What a value-returning handler produced.
#[derive(Debug)]
pub enum Reply {
    /// Leave the context as the handler left it
    Empty,
    Body(Body),
    Response(Response),
    /// Answered with status 500 and the error text
    Failed(RouterError),
}

impl Reply {
    /// Write this reply into `ctx`.
    pub fn apply(self, ctx: &mut Context) {
        match self {
            Reply::Empty => {}
            Reply::Body(body) => ctx.body = Some(body),
            Reply::Response(response) => ctx.respond(response),
            Reply::Failed(err) => {
                warn!(request_id = %ctx.request_id, path = %ctx.path, error = %err, "Handler failed");
                ctx.set_status(500);
                ctx.set_body(err.to_string());
            }
        }
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Reply::Empty
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Reply::Body(Body::from(s))
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Reply::Body(Body::Text(s))
    }
}

impl From<Value> for Reply {
    fn from(v: Value) -> Self {
        Reply::Body(Body::Json(v))
    }
}

impl From<Body> for Reply {
    fn from(body: Body) -> Self {
        Reply::Body(body)
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

impl<T: Into<Reply>> From<Result<T, RouterError>> for Reply {
    fn from(result: Result<T, RouterError>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(err) => Reply::Failed(err),
        }
    }
}

/// Terminal handler from a function returning a reply value.
///
/// The function may also mutate the context directly; the returned value is
/// written afterwards. The rest of the chain is not run.
///
/// ```rust
/// use radixroute::{reply, Context};
///
/// let hello = reply(|ctx: &mut Context| format!("Hello {}", ctx.param("name").unwrap_or("you")));
/// # let _ = hello;
/// ```
pub fn reply<F, R>(f: F) -> Handler
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: Into<Reply>,
{
    handler(move |mut ctx: Context, _next: Next| {
        let out = f(&mut ctx).into();
        async move {
            out.apply(&mut ctx);
            ctx
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_define_and_lookup() {
        let mut registry = ResponseRegistry::new();
        registry.define("unauthorized", 401, "Custom Body").unwrap();
        let response = registry.from("unauthorized").unwrap();
        assert_eq!(response, Response::new(401, "Custom Body"));
    }

    #[test]
    fn test_undefined_name() {
        let registry = ResponseRegistry::new();
        match registry.from("ghost") {
            Err(RouterError::NameNotFound { name }) => assert_eq!(name, "ghost"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_define_rejects_bad_status() {
        let mut registry = ResponseRegistry::new();
        assert!(matches!(
            registry.define("x", 42, "nope"),
            Err(RouterError::InvalidStatus { status: 42 })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_define_all_replaces_table() {
        let mut registry = ResponseRegistry::new();
        registry.define("old", 200, "old").unwrap();
        registry
            .define_all([("new", Response::status_only(204))])
            .unwrap();
        assert!(!registry.contains("old"));
        assert_eq!(registry.from("new").unwrap().status, 204);
    }

    #[tokio::test]
    async fn test_reply_error_becomes_500() {
        let h = reply(|_ctx: &mut Context| -> Result<String, RouterError> {
            Err(RouterError::name_not_found("gone"))
        });
        let ctx = h.handle(Context::new(Method::GET, "/"), Next::end()).await;
        assert_eq!(ctx.status(), 500);
        assert!(ctx.body_text().contains("gone"));
    }

    #[tokio::test]
    async fn test_reply_unit_keeps_context_writes() {
        let h = reply(|ctx: &mut Context| ctx.set_body("direct"));
        let ctx = h.handle(Context::new(Method::GET, "/"), Next::end()).await;
        assert_eq!(ctx.body_text(), "direct");
    }
}
