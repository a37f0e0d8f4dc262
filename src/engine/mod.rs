//! Engine adapter layer: pluggable per-language parsing backends.
//!
//! An [`Engine`] turns raw source text into a [`SyntaxTree`] and answers the
//! node-matching and range questions the resolver asks. The resolver never
//! inspects node internals; it only holds opaque [`NodeId`] handles.
//!
//! Trees are immutable snapshots: nodes live in a pre-order arena and parent
//! links are part of the side table built once at parse time, so resolving
//! several queries against the same tree never mutates or aliases it.

pub mod errors;
pub mod treesitter;

pub use errors::EngineError;
pub use treesitter::TreeSitterEngine;

use serde::Serialize;

/// Opaque handle to a node of an engine-built [`SyntaxTree`].
///
/// Handles are only meaningful for the tree that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub u32);

/// Half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Comment widening result: the attached comment nodes and the outermost
/// bounds they contribute. A `None` bound means no comment on that side.
#[derive(Debug, Clone, Default)]
pub struct CommentSpan {
    pub nodes: Vec<NodeId>,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

/// Per-parse options handed to [`Engine::parse`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Parse TypeScript sources with the TSX grammar.
    pub tsx: bool,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: String,
    span: Option<Span>,
    /// Grammar field name linking this node to its parent, when the
    /// backend exposes one (e.g. "body", "key", "value").
    field: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An engine-owned AST snapshot with an owned copy of the source text.
///
/// The first node pushed becomes the root. Children are kept in document
/// order; [`SyntaxTree::preorder`] therefore yields left-to-right,
/// depth-first pre-order.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    pub fn new(source: impl Into<String>) -> Self {
        SyntaxTree {
            source: source.into(),
            nodes: Vec::new(),
        }
    }

    /// Append a node and link it under `parent`.
    pub fn push_node(
        &mut self,
        parent: Option<NodeId>,
        kind: impl Into<String>,
        span: Option<Span>,
        field: Option<String>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind: kind.into(),
            span,
            field,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0 as usize].children.push(id);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self, node: NodeId) -> &str {
        &self.nodes[node.0 as usize].kind
    }

    pub fn span(&self, node: NodeId) -> Option<Span> {
        self.nodes[node.0 as usize].span
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0 as usize].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0 as usize].children
    }

    pub fn child_by_field(&self, node: NodeId, field: &str) -> Option<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .find(|&child| self.nodes[child.0 as usize].field.as_deref() == Some(field))
    }

    /// Source text covered by the node, if it has a span.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.span(node).map(|span| &self.source[span.start..span.end])
    }

    /// Depth-first, left-to-right pre-order traversal (document order).
    pub fn preorder(&self, root: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![root],
        }
    }
}

pub struct Preorder<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(node).iter().rev().copied());
        Some(node)
    }
}

/// Derive the byte range of a node per the adapter contract.
///
/// A node with a direct span uses it; otherwise the span of its `body`
/// field child; otherwise a `key`/`value` field pair derives
/// `[key.start, value.end]`. Any other shape is an engine defect and
/// surfaces as [`EngineError::UnknownRangeKind`].
pub fn derive_range(tree: &SyntaxTree, node: NodeId) -> Result<Span, EngineError> {
    if let Some(span) = tree.span(node) {
        return Ok(span);
    }
    if let Some(body) = tree.child_by_field(node, "body") {
        if let Some(span) = tree.span(body) {
            return Ok(span);
        }
    }
    if let (Some(key), Some(value)) = (
        tree.child_by_field(node, "key"),
        tree.child_by_field(node, "value"),
    ) {
        if let (Some(key_span), Some(value_span)) = (tree.span(key), tree.span(value)) {
            return Ok(Span {
                start: key_span.start,
                end: value_span.end,
            });
        }
    }
    Err(EngineError::UnknownRangeKind {
        kind: tree.kind(node).to_string(),
    })
}

/// Collect the consecutive comment siblings attached to `node`.
pub fn attached_comments(
    tree: &SyntaxTree,
    node: NodeId,
    comment_kinds: &[&str],
    include_leading: bool,
    include_trailing: bool,
) -> CommentSpan {
    let mut out = CommentSpan::default();
    let Some(parent) = tree.parent(node) else {
        return out;
    };
    let siblings = tree.children(parent);
    let Some(index) = siblings.iter().position(|&sibling| sibling == node) else {
        return out;
    };

    if include_leading {
        for &sibling in siblings[..index].iter().rev() {
            if !comment_kinds.contains(&tree.kind(sibling)) {
                break;
            }
            if let Some(span) = tree.span(sibling) {
                out.start = Some(out.start.map_or(span.start, |s| s.min(span.start)));
                out.nodes.push(sibling);
            }
        }
    }

    if include_trailing {
        for &sibling in &siblings[index + 1..] {
            if !comment_kinds.contains(&tree.kind(sibling)) {
                break;
            }
            if let Some(span) = tree.span(sibling) {
                out.end = Some(out.end.map_or(span.end, |e| e.max(span.end)));
                out.nodes.push(sibling);
            }
        }
    }

    out
}

/// Capability contract implemented once per source language.
///
/// `parse` may be expensive (some backends shell out to an external
/// process); the resolver invokes it exactly once per top-level call and
/// performs pure in-memory computation afterwards. Bounding a slow parse is
/// the engine's responsibility.
pub trait Engine {
    /// Parse source text into an owned [`SyntaxTree`].
    fn parse(&self, code: &str, options: &ParseOptions) -> Result<SyntaxTree, EngineError>;

    /// The node matching starts from.
    fn initial_root(&self, tree: &SyntaxTree) -> NodeId;

    /// Byte range of a node (see [`derive_range`] for the derivation policy).
    fn node_range(&self, tree: &SyntaxTree, node: NodeId) -> Result<Span, EngineError>;

    /// Parents of every identifier-like leaf whose text equals `matcher`,
    /// in document order, searched within `root`'s subtree.
    fn find_nodes_with_identifier(
        &self,
        tree: &SyntaxTree,
        root: NodeId,
        matcher: &str,
    ) -> Vec<NodeId>;

    /// Parents of every string literal whose content equals `matcher`,
    /// in document order, searched within `root`'s subtree.
    fn find_nodes_with_string(&self, tree: &SyntaxTree, root: NodeId, matcher: &str)
        -> Vec<NodeId>;

    /// Bounds of the comments attached to `node`.
    fn comment_range(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        include_leading: bool,
        include_trailing: bool,
    ) -> Result<CommentSpan, EngineError>;
}

/// Backend selection for the top-level entry points.
pub enum EngineChoice {
    JavaScript,
    TypeScript,
    /// Look up a backend by name: `javascript`/`js`, `typescript`/`ts`, `tsx`.
    Named(String),
    /// Use a caller-supplied backend.
    Custom(Box<dyn Engine>),
}

impl Default for EngineChoice {
    fn default() -> Self {
        EngineChoice::JavaScript
    }
}

impl EngineChoice {
    pub fn into_engine(self) -> Result<Box<dyn Engine>, EngineError> {
        match self {
            EngineChoice::JavaScript => Ok(Box::new(TreeSitterEngine::javascript())),
            EngineChoice::TypeScript => Ok(Box::new(TreeSitterEngine::typescript())),
            EngineChoice::Named(name) => engine_for_name(&name),
            EngineChoice::Custom(engine) => Ok(engine),
        }
    }
}

/// Construct a backend by name.
pub fn engine_for_name(name: &str) -> Result<Box<dyn Engine>, EngineError> {
    match name {
        "javascript" | "js" => Ok(Box::new(TreeSitterEngine::javascript())),
        "typescript" | "ts" => Ok(Box::new(TreeSitterEngine::typescript())),
        "tsx" => Ok(Box::new(TreeSitterEngine::tsx())),
        _ => Err(EngineError::UnknownEngine {
            name: name.to_string(),
        }),
    }
}
