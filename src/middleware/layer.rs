use std::sync::Arc;

use super::Handler;
use crate::method::MethodFilter;

/// A registered middleware: the method and path it was registered for, plus
/// its handler. Layers decide which middleware wrap a route registered later.
#[derive(Clone)]
pub struct Layer {
    method: MethodFilter,
    path: String,
    segments: Vec<String>,
    handler: Handler,
}

impl Layer {
    #[must_use]
    pub fn new(method: MethodFilter, path: &str, handler: Handler) -> Self {
        Self {
            method,
            path: path.to_owned(),
            segments: path.split('/').skip(1).map(str::to_owned).collect(),
            handler,
        }
    }

    #[must_use]
    pub fn method(&self) -> &MethodFilter {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub(crate) fn set_handler(&mut self, handler: Handler) {
        self.handler = handler;
    }

    /// Copy of this layer re-rooted under `prefix`, used when the owning
    /// router is mounted into another one.
    #[must_use]
    pub fn rebased(&self, prefix: &str) -> Layer {
        Layer::new(
            self.method.clone(),
            &join_paths(prefix, &self.path),
            Arc::clone(&self.handler),
        )
    }

    /// Whether this layer applies to a route registered for `method` at `path`.
    ///
    /// Layer segments are compared position by position: `:name` segments
    /// match any request segment, a `*` segment matches the rest of the
    /// request, and a request that runs out of segments first does not
    /// match. A request longer than the layer matches, which is what scopes a
    /// middleware to a path prefix.
    #[must_use]
    pub fn matches(&self, method: &MethodFilter, path: &str) -> bool {
        if self.method != MethodFilter::Any && self.method != *method {
            return false;
        }

        let mut given = path.split('/').skip(1);
        for segment in &self.segments {
            if segment == "*" {
                return true;
            }
            let Some(given) = given.next() else {
                return false;
            };
            if segment.starts_with(':') {
                continue;
            }
            if segment != given {
                return false;
            }
        }
        true
    }
}

/// Join a mount prefix and a path registered relative to it.
pub(crate) fn join_paths(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::middleware::{handler, Next};
    use http::Method;

    fn layer(method: MethodFilter, path: &str) -> Layer {
        Layer::new(
            method,
            path,
            handler(|ctx: Context, next: Next| next.run(ctx)),
        )
    }

    fn get() -> MethodFilter {
        MethodFilter::Only(Method::GET)
    }

    #[test]
    fn test_star_path_matches_everything() {
        let l = layer(MethodFilter::Any, "*");
        assert!(l.matches(&get(), "/"));
        assert!(l.matches(&get(), "/a/b/c"));
        assert!(l.matches(&MethodFilter::Any, "*"));
    }

    #[test]
    fn test_method_filtering() {
        let l = layer(get(), "/a");
        assert!(l.matches(&get(), "/a"));
        assert!(!l.matches(&MethodFilter::Only(Method::POST), "/a"));
        assert!(!l.matches(&MethodFilter::Any, "/a"));
    }

    #[test]
    fn test_prefix_scope() {
        let l = layer(MethodFilter::Any, "/some");
        assert!(l.matches(&get(), "/some"));
        assert!(l.matches(&get(), "/some/path"));
        assert!(!l.matches(&get(), "/other/path"));
    }

    #[test]
    fn test_shorter_request_does_not_match() {
        let l = layer(MethodFilter::Any, "/a/b");
        assert!(!l.matches(&get(), "/a"));
    }

    #[test]
    fn test_parameter_segments_match_any_value() {
        let l = layer(MethodFilter::Any, "/user/:id/posts");
        assert!(l.matches(&get(), "/user/42/posts"));
        assert!(l.matches(&get(), "/user/:uid/posts"));
        assert!(!l.matches(&get(), "/user/42/comments"));
    }

    #[test]
    fn test_star_segment_matches_rest() {
        let l = layer(MethodFilter::Any, "/mounted/*");
        assert!(l.matches(&get(), "/mounted/a/b"));
        assert!(!l.matches(&get(), "/elsewhere/a"));
    }

    #[test]
    fn test_root_layer_only_matches_root() {
        let l = layer(MethodFilter::Any, "/");
        assert!(l.matches(&get(), "/"));
        assert!(!l.matches(&get(), "/x"));
    }

    #[test]
    fn test_rebase() {
        let l = layer(MethodFilter::Any, "*").rebased("/sub");
        assert_eq!(l.path(), "/sub/*");
        assert!(l.matches(&get(), "/sub/x"));
        assert!(!l.matches(&get(), "/x"));

        assert_eq!(join_paths("/", "/x"), "/x");
        assert_eq!(join_paths("/sub", "/"), "/sub/");
    }
}
