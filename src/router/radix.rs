//! Compressed trie mapping request paths to composed handlers.
//!
//! Registration walks the trie byte by byte, splitting nodes where a new path
//! diverges from an existing segment or ends inside one. Lookup is a single
//! forward walk with no backtracking: at every node the static child for the
//! next byte wins over the parameter child, and the first structural mismatch
//! returns the nearest middleware anchor seen so far.
//!
//! ## Parameters
//!
//! A `:name` segment captures everything up to the next `/`. Values are
//! copied from the request path as given, even when matching is
//! case-insensitive.
//!
//! ## Anchors
//!
//! Nodes where middleware was registered carry an anchor: the middleware
//! chain to run when a request passes through that node but no route matches
//! below it. The trie itself carries a root anchor used when nothing deeper
//! applies.

use http::Method;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::warn;

use super::node::{Arena, Node, NodeId, PARAM_MARKER};
use crate::config::RouterOptions;
use crate::context::ParamVec;
use crate::method::MethodFilter;
use crate::middleware::{compose, join_paths, Handler};

const ROOT_PATH: &str = "/";

/// Serializable snapshot of a trie node, for debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeExport {
    pub segment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    pub methods: Vec<String>,
    pub anchor: bool,
    pub children: Vec<NodeExport>,
}

/// A registered path and what answers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub path: String,
    pub methods: Vec<String>,
    pub anchor: bool,
}

fn method_names(node: &Node) -> Vec<String> {
    let mut methods: Vec<String> = node.handlers.keys().map(ToString::to_string).collect();
    methods.sort();
    if node.any_handler.is_some() {
        methods.push(MethodFilter::Any.to_string());
    }
    methods
}

/// Where a `:name` parameter starts in a registration path.
fn is_param_start(path: &[u8], i: usize) -> bool {
    path.get(i) == Some(&PARAM_MARKER) && path.get(i + 1).is_some_and(|&b| b != b'/')
}

/// Routing trie. Cloning produces a fully independent copy.
#[derive(Clone)]
pub struct Trie {
    arena: Arena,
    root: NodeId,
    root_path: String,
    options: RouterOptions,
    leaf_index: BTreeMap<String, NodeId>,
    anchor: Option<Handler>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new(RouterOptions::default())
    }
}

impl Trie {
    #[must_use]
    pub fn new(options: RouterOptions) -> Self {
        let mut arena = Arena::default();
        let root = arena.push(Node::with_segment(ROOT_PATH));
        Self {
            arena,
            root,
            root_path: ROOT_PATH.to_owned(),
            options,
            leaf_index: BTreeMap::new(),
            anchor: None,
        }
    }

    #[must_use]
    pub fn options(&self) -> RouterOptions {
        self.options
    }

    #[must_use]
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Root-level fallback chain
    #[must_use]
    pub fn anchor(&self) -> Option<&Handler> {
        self.anchor.as_ref()
    }

    pub fn set_anchor(&mut self, handler: Handler) {
        self.anchor = Some(handler);
    }

    /// Number of nodes allocated for this trie
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Find or create the node terminating `path`.
    pub(crate) fn add(&mut self, path: &str) -> NodeId {
        if path == self.root_path {
            return self.root;
        }

        let p = path.as_bytes();
        let len = p.len();
        let mut parent = self.root;
        let mut depth = self.arena[self.root].segment_len();

        while depth < len {
            let next = self.arena[parent].static_child(p[depth]).or_else(|| {
                is_param_start(p, depth)
                    .then_some(self.arena[parent].param_child)
                    .flatten()
            });
            let Some(node) = next else {
                let (head, leaf) = self.arena.alloc_path(&p[depth..]);
                self.arena.add_child(parent, head);
                return leaf;
            };

            let seg_len = self.arena[node].segment_len();
            let mut pi = 0;
            let mut i = depth;
            while pi < seg_len && i < len {
                if p[i] != self.arena[node].segment[pi] {
                    return self.arena.branch(node, parent, pi, &p[i..]);
                }
                pi += 1;
                i += 1;
            }
            if pi < seg_len {
                return self.arena.branch_upper(node, parent, pi, &p[depth..]);
            }

            if self.arena[node].is_param() {
                if !is_param_start(p, i) {
                    // Static text (or the end of the path) where this node
                    // expects a parameter: give the parameter its own node.
                    self.arena.split_param(node);
                    self.reindex();
                    if i == len {
                        return node;
                    }
                    parent = node;
                    depth = i;
                    continue;
                }
                let end = p[i..]
                    .iter()
                    .position(|&b| b == b'/')
                    .map_or(len, |offset| i + offset);
                let name = &path[i + 1..end];
                if let Some(existing) = &self.arena[node].param_name {
                    if existing.as_ref() != name {
                        warn!(
                            path,
                            existing = %existing,
                            ignored = name,
                            "Parameter name differs from the one already registered at this position"
                        );
                    }
                }
                i = end;
            }

            if i == len {
                return node;
            }
            parent = node;
            depth = i;
        }
        parent
    }

    /// Register `handler` for (`method`, `path`). A second registration for
    /// the same pair runs after the first one, as its continuation.
    pub fn add_handler(&mut self, method: &MethodFilter, path: &str, handler: Handler) {
        let node = self.add(path);
        let handler = match self.arena[node].handler_for(method) {
            Some(existing) => compose(vec![Arc::clone(existing), handler]),
            None => handler,
        };
        self.arena[node].set_handler(method, handler);
        self.leaf_index.insert(path.to_owned(), node);
    }

    /// Mark the node for `path` as an anchor running `handler` for requests
    /// allowed by `method` that fail to match at or below it.
    pub fn add_middleware(&mut self, method: &MethodFilter, path: &str, handler: Handler) {
        let node = self.add(path);
        self.arena[node].set_anchor(method.clone(), handler);
        self.leaf_index.insert(path.to_owned(), node);
    }

    /// Find the handler for a request, capturing parameters into `params`.
    ///
    /// Returns the route handler on an exact match, otherwise the nearest
    /// applicable anchor, otherwise the root anchor (`None` only when no
    /// root anchor was ever set).
    pub fn locate<'a>(
        &'a self,
        method: &Method,
        path: &str,
        params: &mut ParamVec,
    ) -> Option<&'a Handler> {
        let folded: Cow<'_, str> = if self.options.case_sensitive {
            Cow::Borrowed(path)
        } else {
            Cow::Owned(path.to_ascii_lowercase())
        };
        let mut fallback = self.anchor.as_ref();

        if folded == self.root_path {
            return self.arena[self.root].handler(method).or(fallback);
        }

        let mut len = folded.len();
        if !self.options.strict && folded.ends_with('/') {
            len -= 1;
        }
        let p = &folded.as_bytes()[..len];

        let mut depth = 0;
        let mut param_sum = 0;
        let mut node_sum = 0;
        let mut id = self.root;

        while depth < len {
            let node = &self.arena[id];
            if !p[depth..].starts_with(&node.segment) {
                return fallback;
            }
            depth += node.segment_len();

            if let Some(anchor) = node.anchor_for(method) {
                fallback = Some(anchor);
            }

            if let Some(name) = &node.param_name {
                let end = p[depth..]
                    .iter()
                    .position(|&b| b == b'/')
                    .map_or(len, |offset| depth + offset);
                if depth >= end {
                    return fallback;
                }
                let Some(value) = path.get(depth..end) else {
                    return fallback;
                };
                params.push((Arc::clone(name), value.to_owned()));
                param_sum += end - depth;
                depth = end;
            }
            node_sum += node.segment_len();

            if depth == len {
                if depth - param_sum != node_sum {
                    return fallback;
                }
                return node.handler(method).or(fallback);
            }

            match self.arena.child_for(id, p[depth]) {
                Some(child) => id = child,
                None => return fallback,
            }
        }
        fallback
    }

    /// Graft `child` at `mount_path`.
    ///
    /// The child's root takes over the mount node (which keeps its own
    /// segment and parameter), the child's root anchor becomes the mount
    /// node's anchor, and a `/` node is interposed when the mount node's
    /// segment does not already end at a path boundary. Routes the parent
    /// already had under the mount node are registered again on top of the
    /// grafted structure; only a method the mounted router also answers at
    /// the same path is dropped.
    pub fn merge(&mut self, mount_path: &str, child: Trie) {
        if child.options != self.options {
            warn!(
                mount_path,
                parent = ?self.options,
                child = ?child.options,
                "Mounted router uses different path options; the parent's options apply"
            );
        }

        let target = self.add(mount_path);
        let previous = self.arena.take_children(target);
        let below: BTreeSet<NodeId> = self.arena.subtree(&previous).into_iter().collect();
        let displaced: Vec<(String, Node)> = self
            .leaf_index
            .iter()
            .filter(|(_, id)| below.contains(id))
            .map(|(path, &id)| (path.clone(), id))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|(path, id)| (path, std::mem::take(&mut self.arena[id])))
            .collect();

        let child_anchor = child.anchor;
        let graft = self.arena.import(child.arena);

        let node = &mut self.arena[target];
        let param_name = node.param_name.take();
        let handlers = std::mem::take(&mut node.handlers);
        let any_handler = node.any_handler.take();
        node.override_with(graft);
        node.param_name = param_name;
        for (method, handler) in handlers {
            node.handlers.entry(method).or_insert(handler);
        }
        if node.any_handler.is_none() {
            node.any_handler = any_handler;
        }
        if let Some(anchor) = child_anchor {
            node.set_anchor(MethodFilter::Any, anchor);
        }

        if (node.is_param() || node.segment.last() != Some(&b'/')) && node.has_children() {
            self.arena.interpose_slash(target);
        }

        for (path, old) in displaced {
            self.restore(mount_path, &path, old);
        }
        self.reindex();
    }

    /// Put a route displaced by a mount back at `path`, keeping whatever the
    /// mounted router registered there.
    fn restore(&mut self, mount_path: &str, path: &str, old: Node) {
        let id = self.add(path);
        let node = &mut self.arena[id];
        let mut shadowed = Vec::new();
        for (method, handler) in old.handlers {
            match node.handlers.entry(method) {
                Entry::Occupied(taken) => shadowed.push(taken.key().to_string()),
                Entry::Vacant(slot) => {
                    slot.insert(handler);
                }
            }
        }
        if let Some(handler) = old.any_handler {
            if node.any_handler.is_some() {
                shadowed.push(MethodFilter::Any.to_string());
            } else {
                node.any_handler = Some(handler);
            }
        }
        if node.anchor.is_none() {
            node.anchor = old.anchor;
        }
        if !shadowed.is_empty() {
            warn!(
                mount_path,
                path,
                methods = ?shadowed,
                "Route under the mount point is shadowed by the mounted router"
            );
        }
    }

    /// Re-root this trie at `path`: the root segment becomes `path` and leaf
    /// paths are rewritten under it.
    pub fn rebase(&mut self, path: &str) {
        self.arena[self.root].segment = path.as_bytes().to_vec();
        self.root_path = path.to_owned();
        self.leaf_index = std::mem::take(&mut self.leaf_index)
            .into_iter()
            .map(|(leaf, id)| (join_paths(path, &leaf), id))
            .collect();
    }

    /// Visit every node that carries handlers or an anchor, by full path.
    pub fn traverse(&self, mut f: impl FnMut(&str, RouteEntry)) {
        for (path, &id) in &self.leaf_index {
            let node = &self.arena[id];
            f(
                path,
                RouteEntry {
                    path: path.clone(),
                    methods: method_names(node),
                    anchor: node.is_anchor(),
                },
            );
        }
    }

    /// Rewrite every route handler in place. Anchors are left alone.
    pub(crate) fn map_handlers(&mut self, mut f: impl FnMut(&MethodFilter, &str, Handler) -> Handler) {
        for (path, &id) in &self.leaf_index {
            let node = &mut self.arena[id];
            for (method, handler) in node.handlers.iter_mut() {
                let filter = MethodFilter::Only(method.clone());
                *handler = f(&filter, path, Arc::clone(handler));
            }
            if let Some(handler) = node.any_handler.take() {
                node.any_handler = Some(f(&MethodFilter::Any, path, handler));
            }
        }
    }

    #[must_use]
    pub fn routes(&self) -> Vec<RouteEntry> {
        let mut routes = Vec::with_capacity(self.leaf_index.len());
        self.traverse(|_, entry| routes.push(entry));
        routes
    }

    #[must_use]
    pub fn export(&self) -> NodeExport {
        self.export_node(self.root)
    }

    fn export_node(&self, id: NodeId) -> NodeExport {
        let node = &self.arena[id];
        NodeExport {
            segment: String::from_utf8_lossy(&node.segment).into_owned(),
            param: node.param_name.as_deref().map(str::to_owned),
            methods: method_names(node),
            anchor: node.is_anchor(),
            children: node.children().map(|child| self.export_node(child)).collect(),
        }
    }

    /// Rebuild the leaf index from the live tree.
    fn reindex(&mut self) {
        let mut index = BTreeMap::new();
        let mut stack = vec![(self.root, self.root_path.clone())];
        while let Some((id, path)) = stack.pop() {
            let node = &self.arena[id];
            if node.has_handlers() || node.is_anchor() {
                index.insert(path.clone(), id);
            }
            for child in node.children() {
                stack.push((child, format!("{path}{}", self.arena[child].pattern())));
            }
        }
        self.leaf_index = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::middleware::{handler, Next};

    fn marker(tag: &'static str) -> Handler {
        handler(move |mut ctx: Context, next: Next| async move {
            ctx.push_body(tag);
            next.run(ctx).await
        })
    }

    fn get() -> MethodFilter {
        MethodFilter::Only(Method::GET)
    }

    /// Run whatever `locate` returns and report its body, `None` on no handler.
    fn hit(trie: &Trie, method: Method, path: &str) -> Option<String> {
        let mut params = ParamVec::new();
        let h = trie.locate(&method, path, &mut params)?;
        let ctx = futures::executor::block_on(h.handle(Context::new(method, path), Next::end()));
        Some(ctx.body_text())
    }

    fn params(trie: &Trie, path: &str) -> Vec<(String, String)> {
        let mut params = ParamVec::new();
        let _ = trie.locate(&Method::GET, path, &mut params);
        params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_static_routes_resolve_exactly() {
        let mut trie = Trie::default();
        trie.add_handler(&get(), "/users", marker("users"));
        trie.add_handler(&get(), "/posts", marker("posts"));
        trie.add_handler(&get(), "/", marker("root"));

        assert_eq!(hit(&trie, Method::GET, "/users").as_deref(), Some("users"));
        assert_eq!(hit(&trie, Method::GET, "/posts").as_deref(), Some("posts"));
        assert_eq!(hit(&trie, Method::GET, "/").as_deref(), Some("root"));
        assert_eq!(hit(&trie, Method::GET, "/user"), None);
        assert_eq!(hit(&trie, Method::POST, "/users"), None);
    }

    #[test]
    fn test_branch_and_branch_upper() {
        let mut trie = Trie::default();
        trie.add_handler(&get(), "/foo", marker("foo"));
        trie.add_handler(&get(), "/far", marker("far"));
        trie.add_handler(&get(), "/foobar", marker("foobar"));
        trie.add_handler(&get(), "/fo", marker("fo"));

        for path in ["/foo", "/far", "/foobar", "/fo"] {
            assert_eq!(hit(&trie, Method::GET, path).as_deref(), Some(&path[1..]));
        }
        assert_eq!(hit(&trie, Method::GET, "/f"), None);
        assert_eq!(hit(&trie, Method::GET, "/fooba"), None);
    }

    #[test]
    fn test_parameter_capture() {
        let mut trie = Trie::default();
        trie.add_handler(&get(), "/user/:id", marker("user"));
        trie.add_handler(&get(), "/user/:a/:b/:c/:d", marker("deep"));

        assert_eq!(hit(&trie, Method::GET, "/user/42").as_deref(), Some("user"));
        assert_eq!(params(&trie, "/user/42"), vec![("id".into(), "42".into())]);
        assert_eq!(hit(&trie, Method::GET, "/user/a/bcd/ef/g").as_deref(), Some("deep"));
    }

    #[test]
    fn test_capture_keeps_original_case() {
        let mut trie = Trie::default();
        trie.add_handler(&get(), "/user/:id", marker("user"));
        assert_eq!(params(&trie, "/USER/AbC"), vec![("id".into(), "AbC".into())]);
    }

    #[test]
    fn test_empty_parameter_falls_back() {
        let mut trie = Trie::default();
        trie.add_handler(&get(), "/user/:id", marker("user"));
        trie.set_anchor(marker("fallback"));
        assert_eq!(
            hit(&trie, Method::GET, "/user//").as_deref(),
            Some("fallback")
        );
    }

    #[test]
    fn test_static_sibling_of_parameter() {
        let mut trie = Trie::default();
        trie.add_handler(&get(), "/user/:id", marker("param"));
        trie.add_handler(&get(), "/user/me", marker("me"));

        assert_eq!(hit(&trie, Method::GET, "/user/me").as_deref(), Some("me"));
        assert_eq!(hit(&trie, Method::GET, "/user/42").as_deref(), Some("param"));
        assert_eq!(params(&trie, "/user/42"), vec![("id".into(), "42".into())]);
    }

    #[test]
    fn test_strict_prefix_of_parameter_node() {
        let mut trie = Trie::new(RouterOptions::new().strict(true));
        trie.add_handler(&get(), "/user/:id", marker("param"));
        trie.add_handler(&get(), "/user/", marker("list"));

        assert_eq!(hit(&trie, Method::GET, "/user/").as_deref(), Some("list"));
        assert_eq!(hit(&trie, Method::GET, "/user/7").as_deref(), Some("param"));
        assert!(trie.routes().iter().any(|r| r.path == "/user/:id"));
    }

    #[test]
    fn test_duplicate_registration_chains() {
        let mut trie = Trie::default();
        trie.add_handler(&get(), "/x", marker("1"));
        trie.add_handler(&get(), "/x", marker("2"));
        assert_eq!(hit(&trie, Method::GET, "/x").as_deref(), Some("12"));
    }

    #[test]
    fn test_any_handler_answers_other_methods() {
        let mut trie = Trie::default();
        trie.add_handler(&MethodFilter::Any, "/x", marker("any"));
        trie.add_handler(&get(), "/x", marker("get"));
        assert_eq!(hit(&trie, Method::GET, "/x").as_deref(), Some("get"));
        assert_eq!(hit(&trie, Method::DELETE, "/x").as_deref(), Some("any"));
    }

    #[test]
    fn test_trailing_slash_and_case() {
        let mut trie = Trie::default();
        trie.add_handler(&get(), "/path", marker("p"));
        assert_eq!(hit(&trie, Method::GET, "/path/").as_deref(), Some("p"));
        assert_eq!(hit(&trie, Method::GET, "/PATH").as_deref(), Some("p"));

        let mut strict = Trie::new(RouterOptions::new().strict(true).case_sensitive(true));
        strict.add_handler(&get(), "/path", marker("p"));
        assert_eq!(hit(&strict, Method::GET, "/path/"), None);
        assert_eq!(hit(&strict, Method::GET, "/PATH"), None);
    }

    #[test]
    fn test_nearest_anchor_wins() {
        let mut trie = Trie::default();
        trie.set_anchor(marker("root"));
        trie.add_middleware(&MethodFilter::Any, "/api", marker("api"));
        trie.add_handler(&get(), "/api/users", marker("users"));

        assert_eq!(hit(&trie, Method::GET, "/api/users").as_deref(), Some("users"));
        assert_eq!(hit(&trie, Method::GET, "/api/users/9").as_deref(), Some("api"));
        assert_eq!(hit(&trie, Method::GET, "/api/nothing").as_deref(), Some("api"));
        assert_eq!(hit(&trie, Method::GET, "/elsewhere").as_deref(), Some("root"));
    }

    #[test]
    fn test_anchor_respects_method() {
        let mut trie = Trie::default();
        trie.set_anchor(marker("root"));
        trie.add_middleware(&get(), "/api", marker("api"));
        assert_eq!(hit(&trie, Method::GET, "/api/x").as_deref(), Some("api"));
        assert_eq!(hit(&trie, Method::POST, "/api/x").as_deref(), Some("root"));
    }

    #[test]
    fn test_merge_grafts_child() {
        let mut child = Trie::default();
        child.add_handler(&get(), "/", marker("child-root"));
        child.add_handler(&get(), "/:id", marker("child-id"));
        child.add_handler(&get(), "/profile", marker("profile"));
        child.set_anchor(marker("child-fallback"));

        let mut parent = Trie::default();
        parent.add_handler(&get(), "/other", marker("other"));
        let mut graft = child.clone();
        graft.rebase("/user");
        parent.merge("/user", graft);

        assert_eq!(hit(&parent, Method::GET, "/user").as_deref(), Some("child-root"));
        assert_eq!(hit(&parent, Method::GET, "/user/profile").as_deref(), Some("profile"));
        assert_eq!(hit(&parent, Method::GET, "/user/42").as_deref(), Some("child-id"));
        assert_eq!(params(&parent, "/user/42"), vec![("id".into(), "42".into())]);
        assert_eq!(
            hit(&parent, Method::GET, "/user/42/x").as_deref(),
            Some("child-fallback")
        );
        assert_eq!(hit(&parent, Method::GET, "/other").as_deref(), Some("other"));

        // the original child is untouched
        assert_eq!(hit(&child, Method::GET, "/profile").as_deref(), Some("profile"));
        assert_eq!(hit(&child, Method::GET, "/user/profile"), Some("child-fallback".into()));
    }

    #[test]
    fn test_merge_keeps_routes_below_mount_point() {
        let mut parent = Trie::default();
        parent.add_handler(&get(), "/user/settings", marker("settings"));
        parent.add_handler(&get(), "/user/profile", marker("old-profile"));
        parent.add_handler(&MethodFilter::Only(Method::POST), "/user/profile", marker("post"));

        let mut child = Trie::default();
        child.add_handler(&get(), "/profile", marker("profile"));
        child.add_handler(&get(), "/:id", marker("child-id"));
        child.rebase("/user");
        parent.merge("/user", child);

        assert_eq!(hit(&parent, Method::GET, "/user/settings").as_deref(), Some("settings"));
        assert_eq!(hit(&parent, Method::GET, "/user/profile").as_deref(), Some("profile"));
        assert_eq!(hit(&parent, Method::POST, "/user/profile").as_deref(), Some("post"));
        assert_eq!(hit(&parent, Method::GET, "/user/7").as_deref(), Some("child-id"));
        assert!(parent.routes().iter().any(|r| r.path == "/user/settings"));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut trie = Trie::default();
        trie.add_handler(&get(), "/a", marker("a"));
        let copy = trie.clone();
        trie.add_handler(&get(), "/b", marker("b"));

        assert_eq!(hit(&copy, Method::GET, "/a").as_deref(), Some("a"));
        assert_eq!(hit(&copy, Method::GET, "/b"), None);
        assert_eq!(copy.routes().len(), 1);
    }

    #[test]
    fn test_rebase_rewrites_leaf_paths() {
        let mut trie = Trie::default();
        trie.add_handler(&get(), "/", marker("root"));
        trie.add_handler(&get(), "/x", marker("x"));
        trie.rebase("/sub");
        let paths: Vec<String> = trie.routes().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/sub/".to_owned(), "/sub/x".to_owned()]);
    }

    #[test]
    fn test_export_shape() {
        let mut trie = Trie::default();
        trie.add_handler(&get(), "/user/:id", marker("u"));
        let tree = trie.export();
        assert_eq!(tree.segment, "/");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].segment, "user/");
        assert_eq!(tree.children[0].param.as_deref(), Some("id"));
        assert_eq!(tree.children[0].methods, vec!["GET".to_owned()]);
    }
}
