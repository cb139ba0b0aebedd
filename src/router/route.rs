use http::Method;

use super::core::{RegistrationTarget, Router};
use crate::error::RouterError;
use crate::method::MethodFilter;
use crate::middleware::Handler;

/// Registration builder bound to one path, so the path is spelled once.
///
/// ```rust
/// use radixroute::{handler, reply, Context, Next, Router};
///
/// # fn main() -> Result<(), radixroute::RouterError> {
/// let mut router = Router::new();
/// router
///     .route("/hello")
///     .use_middleware(handler(|mut ctx: Context, next: Next| async move {
///         ctx.set_body("Mid ");
///         next.run(ctx).await
///     }))?
///     .get(reply(|ctx: &mut Context| ctx.push_body("Hi~")))?;
/// # Ok(())
/// # }
/// ```
pub struct Route<'r> {
    router: &'r mut Router,
    path: String,
}

macro_rules! route_verbs {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Register a `", stringify!($method), "` handler for this path.")]
            pub fn $name(&mut self, handler: Handler) -> Result<&mut Self, RouterError> {
                self.router
                    .register(MethodFilter::Only(Method::$method), &self.path, handler)?;
                Ok(self)
            }
        )*
    };
}

impl<'r> Route<'r> {
    pub(crate) fn new(router: &'r mut Router, path: &str) -> Self {
        Self {
            router,
            path: path.to_owned(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Register a middleware scoped to this path.
    pub fn use_middleware(&mut self, handler: Handler) -> Result<&mut Self, RouterError> {
        self.router
            .register_middleware(MethodFilter::Any, &self.path, handler)?;
        Ok(self)
    }

    /// Register a handler for every method at this path.
    pub fn all(&mut self, handler: Handler) -> Result<&mut Self, RouterError> {
        self.router
            .register(MethodFilter::Any, &self.path, RegistrationTarget::Handler(handler))?;
        Ok(self)
    }

    route_verbs! {
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        patch => PATCH,
        head => HEAD,
        options => OPTIONS,
    }
}
