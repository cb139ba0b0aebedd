//! # Configuration
//!
//! Two layers of configuration feed a router:
//!
//! - [`RouterOptions`]: path matching policy (case sensitivity, strict
//!   trailing slashes), set in code, from YAML, or from the environment.
//! - [`RouteTable`]: a YAML document declaring predefined responses and
//!   static routes, turned into a ready [`Router`] plus its
//!   [`ResponseRegistry`].
//!
//! ## Environment Variables
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `RADIXROUTE_CASE_SENSITIVE` | `true`/`false`/`1`/`0` | `false` |
//! | `RADIXROUTE_STRICT` | `true`/`false`/`1`/`0` | `false` |
//!
//! ## Route Table Format
//!
//! ```yaml
//! options:
//!   strict: true
//! responses:
//!   unauthorized: { status: 401, body: "Custom Body" }
//! routes:
//!   - { method: GET, path: /hello, body: "Hi~" }
//!   - { method: "*", path: /admin, response: unauthorized }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use tracing::{debug, info};

use crate::context::Body;
use crate::error::RouterError;
use crate::method::MethodFilter;
use crate::response::{reply, Response, ResponseRegistry};
use crate::router::Router;

/// Path matching policy of a router.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Compare paths byte for byte instead of ASCII case-insensitively
    pub case_sensitive: bool,
    /// Treat `/path/` and `/path` as distinct routes
    pub strict: bool,
}

impl RouterOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn case_sensitive(mut self, on: bool) -> Self {
        self.case_sensitive = on;
        self
    }

    #[must_use]
    pub fn strict(mut self, on: bool) -> Self {
        self.strict = on;
        self
    }

    /// Load options from environment variables, falling back to the defaults
    /// for unset or unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            case_sensitive: env_flag("RADIXROUTE_CASE_SENSITIVE"),
            strict: env_flag("RADIXROUTE_STRICT"),
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).ok().is_some_and(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// One statically answered route in a [`RouteTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// HTTP verb or `*`
    #[serde(default = "any_method")]
    pub method: String,
    pub path: String,
    /// Status of the literal reply (defaults to 200)
    #[serde(default)]
    pub status: Option<u16>,
    /// Body of the literal reply
    #[serde(default)]
    pub body: Option<Body>,
    /// Name of a predefined response to answer with instead of a literal reply
    #[serde(default)]
    pub response: Option<String>,
}

fn any_method() -> String {
    "*".to_owned()
}

/// A declarative router: options, predefined responses and routes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    pub options: RouterOptions,
    pub responses: BTreeMap<String, Response>,
    pub routes: Vec<RouteConfig>,
}

impl RouteTable {
    pub fn from_yaml_str(source: &str) -> Result<Self, RouterError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RouterError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let table = Self::from_yaml_str(&source)?;
        info!(
            path = %path.display(),
            routes = table.routes.len(),
            responses = table.responses.len(),
            "Route table loaded"
        );
        Ok(table)
    }

    /// Build the router and the registry its routes resolve names against.
    ///
    /// Predefined responses are resolved here, so a route naming an undefined
    /// response fails the whole build.
    pub fn build(&self) -> Result<(Router, ResponseRegistry), RouterError> {
        let mut registry = ResponseRegistry::new();
        registry.define_all(self.responses.clone())?;

        let mut router = Router::with_options(self.options);
        for route in &self.routes {
            let method: MethodFilter = route
                .method
                .parse()
                .map_err(|_| RouterError::invalid_method(&route.method))?;

            let response = match &route.response {
                Some(name) => registry.from(name)?,
                None => Response {
                    status: route.status.unwrap_or(200),
                    body: route.body.clone(),
                },
            };
            debug!(method = %method, path = %route.path, status = response.status, "Route table entry");
            router.register(method, &route.path, reply(move |_| response.clone()))?;
        }
        Ok((router, registry))
    }
}
