//! Router façade: path normalisation, middleware layers, mounting and
//! dispatch on top of the [`Trie`].

use futures::future::BoxFuture;
use http::Method;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::radix::{NodeExport, RouteEntry, Trie};
use super::route::Route;
use crate::config::RouterOptions;
use crate::context::{Context, ParamVec};
use crate::error::RouterError;
use crate::method::MethodFilter;
use crate::middleware::{
    compose_middleware, composer, handler, not_found, Handler, Layer, Middleware, Next, PathPrefix,
};

/// Path of a middleware registered for every request.
const EVERY_PATH: &str = "*";

/// Lookups slower than this are logged at `warn`.
const SLOW_LOOKUP: Duration = Duration::from_millis(1);

/// What a registration call attaches at a path.
pub enum RegistrationTarget<'a> {
    Handler(Handler),
    /// Another router, grafted at the path as a copy
    SubRouter(&'a Router),
}

impl From<Handler> for RegistrationTarget<'_> {
    fn from(handler: Handler) -> Self {
        RegistrationTarget::Handler(handler)
    }
}

impl<'a> From<&'a Router> for RegistrationTarget<'a> {
    fn from(router: &'a Router) -> Self {
        RegistrationTarget::SubRouter(router)
    }
}

/// HTTP request router.
///
/// Routes are composed with every middleware layer registered before them
/// that applies to their method and path, so registration order is execution
/// order. Layer 0 is always the not-found handler.
///
/// ```rust
/// use radixroute::{handler, reply, Context, Next, Router};
///
/// # fn main() -> Result<(), radixroute::RouterError> {
/// let mut router = Router::new();
/// router.use_middleware(handler(|mut ctx: Context, next: Next| async move {
///     ctx.push_body("> ");
///     next.run(ctx).await
/// }));
/// router.get("/user/:id", reply(|ctx: &mut Context| {
///     format!("user {}", ctx.param("id").unwrap_or_default())
/// }))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Router {
    trie: Trie,
    layers: Vec<Layer>,
    not_found: Handler,
    options: RouterOptions,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! verb_helpers {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Register a `", stringify!($method), "` route.")]
            pub fn $name(&mut self, path: &str, handler: Handler) -> Result<&mut Self, RouterError> {
                self.register(MethodFilter::Only(Method::$method), path, handler)
            }
        )*
    };
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    #[must_use]
    pub fn with_options(options: RouterOptions) -> Self {
        let not_found = not_found();
        let mut router = Self {
            trie: Trie::new(options),
            layers: vec![Layer::new(MethodFilter::Any, "/", Arc::clone(&not_found))],
            not_found,
            options,
        };
        router.refresh_anchor();
        router
    }

    /// Path matching policy this router was built with
    #[must_use]
    pub fn router_options(&self) -> RouterOptions {
        self.options
    }

    /// Registered middleware layers, in execution order
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    /// Validate and canonicalise a registration path.
    fn normalize(&self, path: &str) -> Result<String, RouterError> {
        if path != EVERY_PATH && !path.starts_with('/') {
            return Err(RouterError::invalid_path(path));
        }
        let mut path = if self.options.case_sensitive {
            path.to_owned()
        } else {
            fold_static(path)
        };
        if !self.options.strict && path.len() > 1 && path.ends_with('/') {
            path.pop();
        }
        Ok(path)
    }

    /// Root fallback: every layer applicable to `/`.
    fn refresh_anchor(&mut self) {
        self.trie
            .set_anchor(compose_middleware(&MethodFilter::Any, "/", &self.layers, &[]));
    }

    /// Register a route handler, or mount a router, at `path`.
    pub fn register<'a>(
        &mut self,
        method: MethodFilter,
        path: &str,
        target: impl Into<RegistrationTarget<'a>>,
    ) -> Result<&mut Self, RouterError> {
        let path = self.normalize(path)?;
        match target.into() {
            RegistrationTarget::SubRouter(child) => self.graft(&path, child),
            RegistrationTarget::Handler(handler) => {
                if path == EVERY_PATH {
                    return Err(RouterError::invalid_path(path));
                }
                debug!(method = %method, path = %path, kind = "route", "Route registered");
                let composed = composer(&method, &path, handler, &self.layers);
                self.trie.add_handler(&method, &path, composed);
            }
        }
        Ok(self)
    }

    /// Register a middleware for requests matching `method` under `path`
    /// (`*` for every path).
    pub fn register_middleware(
        &mut self,
        method: MethodFilter,
        path: &str,
        handler: Handler,
    ) -> Result<&mut Self, RouterError> {
        let path = self.normalize(path)?;
        self.push_layer(method, path, handler);
        Ok(self)
    }

    fn push_layer(&mut self, method: MethodFilter, path: String, stage: Handler) {
        let stage = if path == EVERY_PATH || path == "/" {
            stage
        } else {
            handler(PathPrefix::new(
                path.clone(),
                self.options.case_sensitive,
                stage,
            ))
        };
        let anchor_path = if path == EVERY_PATH { "/" } else { path.as_str() };
        debug!(method = %method, path = %path, kind = "middleware", "Middleware registered");

        let anchor = compose_middleware(&method, &path, &self.layers, &[Arc::clone(&stage)]);
        self.trie.add_middleware(&method, anchor_path, anchor);
        self.layers.push(Layer::new(method, &path, stage));
        self.refresh_anchor();
    }

    verb_helpers! {
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        patch => PATCH,
        head => HEAD,
        options => OPTIONS,
    }

    /// Register a route answering every method without a handler of its own.
    pub fn all(&mut self, path: &str, handler: Handler) -> Result<&mut Self, RouterError> {
        self.register(MethodFilter::Any, path, handler)
    }

    /// Register a middleware for every request.
    pub fn use_middleware(&mut self, handler: Handler) -> &mut Self {
        self.push_layer(MethodFilter::Any, EVERY_PATH.to_owned(), handler);
        self
    }

    /// Register a middleware for every request under `path`, or mount a
    /// router there.
    pub fn use_at<'a>(
        &mut self,
        path: &str,
        target: impl Into<RegistrationTarget<'a>>,
    ) -> Result<&mut Self, RouterError> {
        match target.into() {
            RegistrationTarget::Handler(handler) => {
                self.register_middleware(MethodFilter::Any, path, handler)
            }
            sub @ RegistrationTarget::SubRouter(_) => self.register(MethodFilter::Any, path, sub),
        }
    }

    /// Register several handlers at once: all but the last become middleware
    /// scoped to (`method`, `path`), the last becomes the route handler.
    pub fn register_many(
        &mut self,
        method: MethodFilter,
        path: &str,
        handlers: Vec<Handler>,
    ) -> Result<&mut Self, RouterError> {
        let mut handlers = handlers;
        let Some(last) = handlers.pop() else {
            return Ok(self);
        };
        for stage in handlers {
            self.register_middleware(method.clone(), path, stage)?;
        }
        self.register(method, path, last)
    }

    /// Register several middleware for every request under `path`.
    pub fn use_many(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RouterError> {
        for stage in handlers {
            self.register_middleware(MethodFilter::Any, path, stage)?;
        }
        Ok(self)
    }

    /// Mount a copy of `child` at `path`. Later changes to `child` do not
    /// affect this router.
    pub fn mount(&mut self, path: &str, child: &Router) -> Result<&mut Self, RouterError> {
        self.register(MethodFilter::Any, path, child)
    }

    fn graft(&mut self, path: &str, child: &Router) {
        let mount_path = match path {
            EVERY_PATH => "/",
            p if p.len() > 1 => p.strip_suffix('/').unwrap_or(p),
            p => p,
        };

        let mut grafted = child.trie.clone();
        grafted.rebase(mount_path);
        let layers = &self.layers;
        grafted.map_handlers(|method, leaf, route| {
            compose_middleware(method, leaf, layers, &[route])
        });
        let child_anchor: Vec<Handler> = grafted.anchor().into_iter().map(Arc::clone).collect();
        grafted.set_anchor(compose_middleware(
            &MethodFilter::Any,
            mount_path,
            &self.layers,
            &child_anchor,
        ));

        let leaves = grafted.routes().len();
        self.trie.merge(mount_path, grafted);
        self.layers
            .extend(child.layers.iter().map(|layer| layer.rebased(mount_path)));

        info!(
            mount_path,
            leaves,
            inherited_layers = child.layers.len(),
            "Router mounted"
        );
    }

    /// Single-path registration builder.
    pub fn route(&mut self, path: &str) -> Route<'_> {
        Route::new(self, path)
    }

    /// Replace the handler at the bottom of the layer stack. Routes
    /// registered afterwards, and the root fallback, use the new handler.
    pub fn set_not_found_handler(&mut self, handler: Handler) -> &mut Self {
        self.not_found = Arc::clone(&handler);
        if let Some(first) = self.layers.first_mut() {
            first.set_handler(handler);
        }
        self.refresh_anchor();
        self
    }

    /// Handler for a request, with parameters captured into `params`. Never
    /// fails: a miss resolves to the nearest fallback chain.
    pub fn locate(&self, method: &Method, path: &str, params: &mut ParamVec) -> Handler {
        self.trie
            .locate(method, path, params)
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::clone(&self.not_found))
    }

    /// Route a request and run its handler chain to completion.
    pub async fn dispatch(&self, ctx: Context) -> Context {
        self.handle(ctx, Next::end()).await
    }

    #[must_use]
    pub fn export(&self) -> NodeExport {
        self.trie.export()
    }

    #[must_use]
    pub fn routes(&self) -> Vec<RouteEntry> {
        self.trie.routes()
    }

    /// Log every registered path.
    pub fn dump_routes(&self) {
        let routes = self.routes();
        info!(
            routes_count = routes.len(),
            layers_count = self.layers.len(),
            "Routing table"
        );
        for route in routes {
            info!(
                path = %route.path,
                methods = ?route.methods,
                anchor = route.anchor,
                "Route"
            );
        }
    }
}

/// Lowercase the static text of a registration path, leaving `:name`
/// parameter identifiers as written.
fn fold_static(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut in_param = false;
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '/' => {
                in_param = false;
                out.push(c);
            }
            ':' if !in_param && chars.peek().is_some_and(|&n| n != '/') => {
                in_param = true;
                out.push(c);
            }
            c if in_param => out.push(c),
            c => out.push(c.to_ascii_lowercase()),
        }
    }
    out
}

/// A router is itself a stage: it locates a handler for the request and runs
/// it, continuing with the caller's chain.
impl Middleware for Router {
    fn handle(&self, mut ctx: Context, next: Next) -> BoxFuture<'static, Context> {
        let start = Instant::now();
        let found = self.locate(&ctx.method, &ctx.path, &mut ctx.params);
        let elapsed = start.elapsed();

        if elapsed > SLOW_LOOKUP {
            warn!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.path,
                duration_us = elapsed.as_micros() as u64,
                "Slow route lookup"
            );
        } else {
            debug!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.path,
                params = ctx.params.len(),
                duration_us = elapsed.as_micros() as u64,
                "Route lookup"
            );
        }
        found.handle(ctx, next)
    }
}
