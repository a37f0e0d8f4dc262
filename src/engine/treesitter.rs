//! Tree-sitter backed engines for JavaScript and TypeScript sources.
//!
//! The tree-sitter tree is copied into an owned [`SyntaxTree`] right after
//! parsing so resolved handles stay valid without borrowing the parser.
//! Only named nodes are copied; punctuation tokens carry no information the
//! resolver ever asks about.

use tree_sitter::Parser;

use super::{
    attached_comments, derive_range, CommentSpan, Engine, EngineError, NodeId, ParseOptions, Span,
    SyntaxTree,
};

/// Which tree-sitter grammar to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    JavaScript,
    TypeScript,
    Tsx,
}

/// A tree-sitter based [`Engine`].
///
/// The kind lists below are the grammar-specific glue: they name the leaf
/// kinds that count as identifiers and string literals when matching query
/// terms against the tree.
pub struct TreeSitterEngine {
    dialect: Dialect,
    identifier_kinds: &'static [&'static str],
    string_kinds: &'static [&'static str],
    comment_kinds: &'static [&'static str],
}

const JS_IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "property_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
    "statement_identifier",
    "jsx_identifier",
];

const TS_IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "property_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
    "statement_identifier",
    "jsx_identifier",
    "type_identifier",
];

const STRING_KINDS: &[&str] = &["string", "template_string"];

const COMMENT_KINDS: &[&str] = &["comment"];

impl TreeSitterEngine {
    pub fn javascript() -> Self {
        TreeSitterEngine {
            dialect: Dialect::JavaScript,
            identifier_kinds: JS_IDENTIFIER_KINDS,
            string_kinds: STRING_KINDS,
            comment_kinds: COMMENT_KINDS,
        }
    }

    pub fn typescript() -> Self {
        TreeSitterEngine {
            dialect: Dialect::TypeScript,
            identifier_kinds: TS_IDENTIFIER_KINDS,
            string_kinds: STRING_KINDS,
            comment_kinds: COMMENT_KINDS,
        }
    }

    pub fn tsx() -> Self {
        TreeSitterEngine {
            dialect: Dialect::Tsx,
            identifier_kinds: TS_IDENTIFIER_KINDS,
            string_kinds: STRING_KINDS,
            comment_kinds: COMMENT_KINDS,
        }
    }

    fn language(&self, options: &ParseOptions) -> tree_sitter::Language {
        match self.dialect {
            Dialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Dialect::TypeScript if options.tsx => {
                tree_sitter_typescript::LANGUAGE_TSX.into()
            }
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Recursively copy the named portion of a tree-sitter tree into the arena.
fn copy_node(
    tree: &mut SyntaxTree,
    parent: Option<NodeId>,
    node: tree_sitter::Node<'_>,
    field: Option<String>,
) -> NodeId {
    let span = Span {
        start: node.start_byte(),
        end: node.end_byte(),
    };
    let id = tree.push_node(parent, node.kind(), Some(span), field);
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() {
                let field = cursor.field_name().map(str::to_string);
                copy_node(tree, Some(id), child, field);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    id
}

/// Strip the delimiting quotes (or backticks) off a literal's source text.
fn strip_quotes(text: &str) -> &str {
    let trimmed = text
        .strip_prefix(['\'', '"', '`'])
        .unwrap_or(text);
    trimmed.strip_suffix(['\'', '"', '`']).unwrap_or(trimmed)
}

impl TreeSitterEngine {
    /// Parents of leaves in `root`'s subtree whose kind is in `kinds` and
    /// which satisfy `matches`, in document order, deduplicated.
    fn find_leaf_parents(
        &self,
        tree: &SyntaxTree,
        root: NodeId,
        kinds: &[&str],
        matches: impl Fn(&str) -> bool,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        for node in tree.preorder(root) {
            if !kinds.contains(&tree.kind(node)) {
                continue;
            }
            let Some(text) = tree.text(node) else {
                continue;
            };
            if !matches(text) {
                continue;
            }
            let hit = tree.parent(node).unwrap_or(node);
            if !out.contains(&hit) {
                out.push(hit);
            }
        }
        out
    }
}

impl Engine for TreeSitterEngine {
    fn parse(&self, code: &str, options: &ParseOptions) -> Result<SyntaxTree, EngineError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language(options))
            .map_err(|e| EngineError::LanguageSet(e.to_string()))?;
        let ts_tree = parser.parse(code, None).ok_or(EngineError::ParseFailed)?;
        let mut tree = SyntaxTree::new(code);
        copy_node(&mut tree, None, ts_tree.root_node(), None);
        Ok(tree)
    }

    fn initial_root(&self, tree: &SyntaxTree) -> NodeId {
        tree.root()
    }

    fn node_range(&self, tree: &SyntaxTree, node: NodeId) -> Result<Span, EngineError> {
        derive_range(tree, node)
    }

    fn find_nodes_with_identifier(
        &self,
        tree: &SyntaxTree,
        root: NodeId,
        matcher: &str,
    ) -> Vec<NodeId> {
        self.find_leaf_parents(tree, root, self.identifier_kinds, |text| text == matcher)
    }

    fn find_nodes_with_string(
        &self,
        tree: &SyntaxTree,
        root: NodeId,
        matcher: &str,
    ) -> Vec<NodeId> {
        self.find_leaf_parents(tree, root, self.string_kinds, |text| {
            strip_quotes(text) == matcher
        })
    }

    fn comment_range(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        include_leading: bool,
        include_trailing: bool,
    ) -> Result<CommentSpan, EngineError> {
        Ok(attached_comments(
            tree,
            node,
            self.comment_kinds,
            include_leading,
            include_trailing,
        ))
    }
}
