//! Request context threaded through a composed handler chain.
//!
//! The router core reads `method` and `path`, writes captured parameters into
//! `params`, and otherwise leaves the context to the handlers. Transport
//! plumbing (reading a socket, writing a response) lives outside this crate.

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use crate::ids::RequestId;
use crate::response::Response;

/// Maximum number of path parameters before heap allocation.
/// Most routes capture ≤4 segments (e.g. `/users/:id/posts/:post_id`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured path parameters.
///
/// Names are shared with the trie node that declared them (`Arc<str>`), values
/// are copied out of the request path.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Response body produced by handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Text(String),
    Json(Value),
}

impl Body {
    /// Append text, converting a JSON body to its string form first.
    pub fn push_str(&mut self, text: &str) {
        match self {
            Body::Text(s) => s.push_str(text),
            Body::Json(v) => {
                let mut s = v.to_string();
                s.push_str(text);
                *self = Body::Text(s);
            }
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Text(s) => f.write_str(s),
            Body::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_owned())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<Value> for Body {
    fn from(v: Value) -> Self {
        Body::Json(v)
    }
}

/// Per-request state passed by value down the middleware chain and handed
/// back up by every stage.
#[derive(Debug, Clone)]
pub struct Context {
    /// Unique request ID for log correlation
    pub request_id: RequestId,
    pub method: Method,
    /// Request path. Prefix-scoped middleware observe it with their prefix
    /// removed.
    pub path: String,
    /// Parameters captured during lookup
    pub params: ParamVec,
    /// Explicitly assigned status, if any (see [`Context::status`])
    pub status: Option<u16>,
    pub body: Option<Body>,
    /// Prefix of the innermost prefix-scoped middleware currently running
    pub mount_path: Option<String>,
    /// Free-form values shared between middleware and handlers
    pub locals: Map<String, Value>,
}

impl Context {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            params: ParamVec::new(),
            status: None,
            body: None,
            mount_path: None,
            locals: Map::new(),
        }
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics: if the same name was captured at two
    /// depths, the deeper capture is returned.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Effective status: the explicit one, else 200 once a body exists, else 404.
    #[must_use]
    pub fn status(&self) -> u16 {
        match (self.status, &self.body) {
            (Some(status), _) => status,
            (None, Some(_)) => 200,
            (None, None) => 404,
        }
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = Some(body.into());
    }

    /// Append text to the body, starting one if none exists yet.
    pub fn push_body(&mut self, text: &str) {
        match &mut self.body {
            Some(body) => body.push_str(text),
            None => self.body = Some(Body::Text(text.to_owned())),
        }
    }

    /// Body rendered as text, empty when unset
    #[must_use]
    pub fn body_text(&self) -> String {
        self.body.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// Copy a response value's status and body into the context.
    pub fn respond(&mut self, response: Response) {
        self.status = Some(response.status);
        if let Some(body) = response.body {
            self.body = Some(body);
        }
    }
}
