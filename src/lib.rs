//! snipq: extract code snippets with a textual selector language.
//!
//! A query like `.hello` selects the declaration of `hello`; `10-12` selects
//! lines 10 through 12; `.greet-.farewell` selects everything from one
//! declaration to the next. Queries resolve to byte ranges of the original
//! text, so extractions always reproduce the source exactly, indentation
//! included.
//!
//! # Architecture
//!
//! Three layers, each pure:
//!
//! - [`query`]: a recursive-descent parser turning query text into a
//!   [`query::Term`] tree.
//! - [`engine`]: pluggable per-language backends behind the
//!   [`engine::Engine`] trait. The bundled backend parses JavaScript and
//!   TypeScript with tree-sitter.
//! - [`resolver`]: walks the term tree against the engine's syntax tree and
//!   computes the final byte range.
//!
//! # Example
//!
//! ```
//! use snipq::{resolve, ResolveOptions};
//!
//! let source = "const a = 1;\nfunction hello() {\n  return 'hi';\n}\n";
//! let answer = resolve(source, ".hello", ResolveOptions::default()).unwrap();
//!
//! assert_eq!(answer.code, "function hello() {\n  return 'hi';\n}");
//! assert_eq!(answer.start_line, 2);
//! assert_eq!(answer.end_line, 4);
//! ```

pub mod engine;
pub mod lines;
pub mod query;
pub mod resolver;

use serde::Serialize;
use thiserror::Error;

use engine::{EngineChoice, NodeId, ParseOptions};
use query::Term;
use resolver::{Context, ResolveError};

/// Any failure of the parse-then-resolve pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] query::SyntaxError),

    #[error(transparent)]
    Engine(#[from] engine::EngineError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// A resolved query: the extracted text and where it came from.
///
/// `start`/`end` are byte offsets into the original source (half-open);
/// `start_line`/`end_line` are 1-based. `nodes` are the syntax-tree handles
/// that contributed to the range, empty for purely positional results
/// (line numbers, `EOF`).
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub code: String,
    pub nodes: Vec<NodeId>,
    pub start: usize,
    pub end: usize,
    pub start_line: usize,
    pub end_line: usize,
}

/// Options for the top-level entry points.
#[derive(Default)]
pub struct ResolveOptions {
    /// Which parsing backend to use (JavaScript by default).
    pub engine: EngineChoice,
    /// Per-parse flags forwarded to the backend.
    pub parse: ParseOptions,
    /// Only consider matches starting at or after this byte offset.
    pub after: Option<usize>,
}

/// Parse `query` and resolve it against `code`.
pub fn resolve(code: &str, query: &str, options: ResolveOptions) -> Result<Answer, Error> {
    let term = query::parse(query)?;
    resolve_terms(code, std::slice::from_ref(&term), options)
}

/// Resolve pre-parsed terms against `code`.
///
/// Each term resolves independently against the whole tree; the answer's
/// `code` is the concatenation of each term's extraction in order, and
/// `start`/`end` cover the union of the ranges.
pub fn resolve_terms(code: &str, terms: &[Term], options: ResolveOptions) -> Result<Answer, Error> {
    let engine = options.engine.into_engine()?;
    let tree = engine.parse(code, &options.parse)?;
    let ctx = Context {
        after: options.after,
    };
    let resolved = resolver::resolve_list(engine.as_ref(), &tree, terms, &ctx)?;
    Ok(Answer {
        start_line: lines::line_of_offset(code, resolved.start),
        end_line: lines::line_of_offset(code, resolved.end),
        code: resolved.code,
        nodes: resolved.nodes,
        start: resolved.start,
        end: resolved.end,
    })
}
