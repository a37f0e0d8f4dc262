//! The query AST: a parsed selector expression.
//!
//! A query string like `.Dog .bark:context(1,1)` parses into a [`Term`] tree.
//! Terms are immutable once built; a single parse serves any number of
//! resolution passes.

pub mod errors;
pub mod parser;

pub use errors::{Location, SyntaxError};
pub use parser::parse;

/// One node of the parsed query language.
///
/// `children` is always a linear descent chain: `.foo .bar` narrows the
/// scope of `.bar` to the subtree matched by `.foo`. `modifiers` extend the
/// resolved range by whole lines before (`-N`) or after (`+N`) the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub kind: TermKind,
    pub children: Vec<Term>,
    pub modifiers: Vec<Modifier>,
}

impl Term {
    pub fn new(kind: TermKind) -> Self {
        Term {
            kind,
            children: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    /// `.name` — select the node that declares `name`.
    pub fn identifier(matcher: impl Into<String>) -> Self {
        Term::new(TermKind::Identifier {
            matcher: matcher.into(),
        })
    }

    /// `'text'` — select the node containing the string literal `text`.
    pub fn string(matcher: impl Into<String>) -> Self {
        Term::new(TermKind::Str {
            matcher: matcher.into(),
        })
    }

    /// `42` — select a 1-indexed line.
    pub fn line(value: i64) -> Self {
        Term::new(TermKind::Line {
            value: LineValue::Number(value),
        })
    }

    /// `EOF` — the empty range at the end of the file.
    pub fn eof() -> Self {
        Term::new(TermKind::Line {
            value: LineValue::Eof,
        })
    }

    /// `start-end` — the span between two sub-terms.
    pub fn range(start: Term, end: Term) -> Self {
        Term::new(TermKind::Range {
            start: Box::new(start),
            end: Box::new(end),
        })
    }

    /// `inner:callee(args)` — a post-resolution transform.
    pub fn call(callee: impl Into<String>, inner: Term, args: Vec<Term>) -> Self {
        Term::new(TermKind::Call {
            callee: callee.into(),
            inner: Box::new(inner),
            args,
        })
    }
}

/// The tagged union of term shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermKind {
    /// Matches a named node (function/class/variable name, or a JSX name).
    Identifier { matcher: String },
    /// Matches a literal string value.
    Str { matcher: String },
    /// 1-indexed line selector, or the end-of-file marker.
    Line { value: LineValue },
    /// Span between two resolved sub-terms.
    Range { start: Box<Term>, end: Box<Term> },
    /// Post-resolution transform (`upto`, `context(a,b)`, `comments`).
    Call {
        callee: String,
        inner: Box<Term>,
        args: Vec<Term>,
    },
}

/// Value of a line-number term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineValue {
    Number(i64),
    Eof,
}

/// An extra-lines modifier: `+N` extends after the match, `-N` before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifier {
    pub op: ModifierOp,
    pub amount: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierOp {
    Plus,
    Minus,
}
