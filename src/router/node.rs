//! Trie nodes and the arena that owns them.
//!
//! Nodes never point at each other directly: parents hold [`NodeId`]s into the
//! arena, so splitting a segment or re-parenting a subtree is a matter of
//! rewriting a couple of indices. Ids stay stable for the lifetime of a trie,
//! which is what keeps the leaf index valid across later insertions.

use http::Method;
use std::collections::HashMap;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use crate::method::MethodFilter;
use crate::middleware::Handler;

/// Marks the start of a parameter segment in a registered path (`/user/:id`).
pub(crate) const PARAM_MARKER: u8 = b':';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) usize);

/// One edge of the compressed trie.
///
/// `segment` is the static text this node consumes. A parameter node consumes
/// its segment and then one parameter value, up to the next `/` or the end of
/// the path; whatever the registered path had after the parameter name lives
/// in the node's children.
#[derive(Clone, Default)]
pub(crate) struct Node {
    pub(crate) segment: Vec<u8>,
    /// Sorted by leading byte; at most one child per byte
    pub(crate) static_children: Vec<(u8, NodeId)>,
    /// Parameter child whose capture starts right at the end of this node
    pub(crate) param_child: Option<NodeId>,
    pub(crate) param_name: Option<Arc<str>>,
    pub(crate) handlers: HashMap<Method, Handler>,
    /// Handler registered for `*`, answering methods without their own entry
    pub(crate) any_handler: Option<Handler>,
    /// Fallback chain returned when a lookup fails at or below this node
    pub(crate) anchor: Option<(MethodFilter, Handler)>,
    pub(crate) child_count: usize,
}

impl Node {
    pub(crate) fn with_segment(segment: impl Into<Vec<u8>>) -> Self {
        Self {
            segment: segment.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub(crate) fn segment_len(&self) -> usize {
        self.segment.len()
    }

    #[inline]
    pub(crate) fn is_param(&self) -> bool {
        self.param_name.is_some()
    }

    #[inline]
    pub(crate) fn is_anchor(&self) -> bool {
        self.anchor.is_some()
    }

    pub(crate) fn has_handlers(&self) -> bool {
        !self.handlers.is_empty() || self.any_handler.is_some()
    }

    pub(crate) fn has_children(&self) -> bool {
        !self.static_children.is_empty() || self.param_child.is_some()
    }

    #[inline]
    pub(crate) fn static_child(&self, byte: u8) -> Option<NodeId> {
        self.static_children
            .binary_search_by_key(&byte, |(k, _)| *k)
            .ok()
            .map(|i| self.static_children[i].1)
    }

    /// Handler answering a request made with `method`
    #[inline]
    pub(crate) fn handler(&self, method: &Method) -> Option<&Handler> {
        self.handlers.get(method).or(self.any_handler.as_ref())
    }

    /// Handler registered for exactly this filter
    pub(crate) fn handler_for(&self, method: &MethodFilter) -> Option<&Handler> {
        match method {
            MethodFilter::Any => self.any_handler.as_ref(),
            MethodFilter::Only(m) => self.handlers.get(m),
        }
    }

    pub(crate) fn set_handler(&mut self, method: &MethodFilter, handler: Handler) {
        match method {
            MethodFilter::Any => self.any_handler = Some(handler),
            MethodFilter::Only(m) => {
                self.handlers.insert(m.clone(), handler);
            }
        }
    }

    pub(crate) fn set_anchor(&mut self, method: MethodFilter, handler: Handler) {
        self.anchor = Some((method, handler));
    }

    /// Anchor applicable to a request made with `method`
    #[inline]
    pub(crate) fn anchor_for(&self, method: &Method) -> Option<&Handler> {
        match &self.anchor {
            Some((filter, handler)) if filter.allows(method) => Some(handler),
            _ => None,
        }
    }

    /// Take over everything from `other` except the segment.
    pub(crate) fn override_with(&mut self, other: Node) {
        let segment = std::mem::take(&mut self.segment);
        *self = Node { segment, ..other };
    }

    /// Text this node matches in registration syntax (`user/:id`)
    pub(crate) fn pattern(&self) -> String {
        let mut pattern = String::from_utf8_lossy(&self.segment).into_owned();
        if let Some(name) = &self.param_name {
            pattern.push(PARAM_MARKER as char);
            pattern.push_str(name);
        }
        pattern
    }

    pub(crate) fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.static_children
            .iter()
            .map(|(_, id)| *id)
            .chain(self.param_child)
    }

    fn remap(mut self, f: impl Fn(NodeId) -> NodeId) -> Node {
        for (_, id) in &mut self.static_children {
            *id = f(*id);
        }
        self.param_child = self.param_child.map(&f);
        self
    }
}

/// Where a parameter marker sits inside a raw registration fragment:
/// `(marker index, end of the parameter name)`.
///
/// A marker followed by `/` or ending the fragment is literal text.
fn find_param(raw: &[u8]) -> Option<(usize, usize)> {
    let marker = raw.iter().enumerate().position(|(i, &b)| {
        b == PARAM_MARKER && i + 1 < raw.len() && raw[i + 1] != b'/'
    })?;
    let end = raw[marker + 1..]
        .iter()
        .position(|&b| b == b'/')
        .map_or(raw.len(), |p| marker + 1 + p);
    Some((marker, end))
}

/// Node storage for one trie.
#[derive(Clone, Default)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
}

impl Index<NodeId> for Arena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

impl Arena {
    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Child to follow from `parent` when the next byte of the path is `byte`:
    /// the static child for that byte, else the parameter child.
    #[inline]
    pub(crate) fn child_for(&self, parent: NodeId, byte: u8) -> Option<NodeId> {
        let node = &self[parent];
        node.static_child(byte).or(node.param_child)
    }

    /// Build the chain of nodes for a raw registration fragment.
    ///
    /// One node carries at most one parameter: the static text before the
    /// marker becomes its segment, the name runs up to the next `/`, and
    /// anything after the name is split off into a child, recursively.
    /// Returns `(head, leaf)`; the leaf terminates the fragment.
    pub(crate) fn alloc_path(&mut self, raw: &[u8]) -> (NodeId, NodeId) {
        let Some((marker, end)) = find_param(raw) else {
            let id = self.push(Node::with_segment(raw));
            return (id, id);
        };

        let name = String::from_utf8_lossy(&raw[marker + 1..end]);
        let mut node = Node::with_segment(&raw[..marker]);
        node.param_name = Some(Arc::from(name.as_ref()));
        let head = self.push(node);

        if end == raw.len() {
            return (head, head);
        }
        let (rest, leaf) = self.alloc_path(&raw[end..]);
        self.add_child(head, rest);
        (head, leaf)
    }

    pub(crate) fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self[parent].child_count += 1;
        self.attach(parent, child);
    }

    /// Link `child` into the slot its shape calls for, without counting it.
    fn attach(&mut self, parent: NodeId, child: NodeId) {
        match self[child].segment.first().copied() {
            Some(byte) => {
                let children = &mut self[parent].static_children;
                match children.binary_search_by_key(&byte, |(k, _)| *k) {
                    Ok(i) => children[i].1 = child,
                    Err(i) => children.insert(i, (byte, child)),
                }
            }
            None => self[parent].param_child = Some(child),
        }
    }

    /// Unlink `child` from `parent`, without counting it.
    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let node = &mut self[parent];
        node.static_children.retain(|(_, id)| *id != child);
        if node.param_child == Some(child) {
            node.param_child = None;
        }
    }

    pub(crate) fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        self.detach(parent, old);
        self.attach(parent, new);
    }

    /// The incoming path diverges from `node` partway through its segment.
    ///
    /// A fork node takes the shared prefix and `node`'s place under `parent`;
    /// `node` keeps the rest of its segment (and its parameter, handlers and
    /// children) under the fork, next to a new chain for the rest of the
    /// incoming path. Returns the leaf of the new chain.
    pub(crate) fn branch(
        &mut self,
        node: NodeId,
        parent: NodeId,
        node_break: usize,
        incoming_rest: &[u8],
    ) -> NodeId {
        let prefix = self[node].segment[..node_break].to_vec();
        let fork = self.push(Node::with_segment(prefix));
        self.replace_child(parent, node, fork);

        self[node].segment.drain(..node_break);
        self.add_child(fork, node);

        let (head, leaf) = self.alloc_path(incoming_rest);
        self.add_child(fork, head);
        leaf
    }

    /// The incoming path ends partway through `node`'s segment.
    ///
    /// A new chain for the shorter path takes `node`'s place under `parent`,
    /// and `node` keeps the remainder of its segment underneath the new leaf.
    pub(crate) fn branch_upper(
        &mut self,
        node: NodeId,
        parent: NodeId,
        node_break: usize,
        incoming: &[u8],
    ) -> NodeId {
        let (head, leaf) = self.alloc_path(incoming);
        self.replace_child(parent, node, head);

        self[node].segment.drain(..node_break);
        self.add_child(leaf, node);
        leaf
    }

    /// Move the parameter of `node`, with its handlers and children, into a
    /// fresh parameter child so `node` terminates at its static segment.
    pub(crate) fn split_param(&mut self, node: NodeId) -> NodeId {
        let source = &mut self[node];
        let child = Node {
            segment: Vec::new(),
            static_children: std::mem::take(&mut source.static_children),
            param_child: source.param_child.take(),
            param_name: source.param_name.take(),
            handlers: std::mem::take(&mut source.handlers),
            any_handler: source.any_handler.take(),
            anchor: source.anchor.take(),
            child_count: std::mem::take(&mut source.child_count),
        };
        let id = self.push(child);
        self.add_child(node, id);
        id
    }

    /// Move every child of `node` under a new `/` node that becomes its only
    /// child.
    pub(crate) fn interpose_slash(&mut self, node: NodeId) -> NodeId {
        let source = &mut self[node];
        let slash = Node {
            segment: vec![b'/'],
            static_children: std::mem::take(&mut source.static_children),
            param_child: source.param_child.take(),
            child_count: std::mem::take(&mut source.child_count),
            ..Node::default()
        };
        let id = self.push(slash);
        self.add_child(node, id);
        id
    }

    /// Unlink and return every child of `node`.
    pub(crate) fn take_children(&mut self, node: NodeId) -> Vec<NodeId> {
        let source = &mut self[node];
        let children = source.children().collect();
        source.static_children.clear();
        source.param_child = None;
        source.child_count = 0;
        children
    }

    /// `roots` and every node reachable from them
    pub(crate) fn subtree(&self, roots: &[NodeId]) -> Vec<NodeId> {
        let mut seen = Vec::new();
        let mut stack = roots.to_vec();
        while let Some(id) = stack.pop() {
            stack.extend(self[id].children());
            seen.push(id);
        }
        seen
    }

    /// Append every node of another arena except its root (index 0),
    /// shifting child ids to their new positions. Returns the root node,
    /// whose child ids are already translated.
    pub(crate) fn import(&mut self, other: Arena) -> Node {
        let base = self.nodes.len();
        let shift = move |id: NodeId| NodeId(id.0 - 1 + base);

        let mut nodes = other.nodes.into_iter();
        let root = nodes.next().unwrap_or_default().remap(shift);
        for node in nodes {
            self.nodes.push(node.remap(shift));
        }
        root
    }
}
