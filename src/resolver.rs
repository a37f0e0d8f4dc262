//! Resolver core: maps a parsed query [`Term`] tree plus an engine-built
//! syntax tree onto byte ranges of the original source.
//!
//! Resolution is pure, synchronous computation over immutable data. The
//! engine is consulted for node matching and ranges; all line arithmetic
//! happens here on the raw source text.

use thiserror::Error;

use crate::engine::{Engine, EngineError, NodeId, SyntaxTree};
use crate::lines::{move_position_by_lines, rewind_whitespace, widen_to_line_bounds};
use crate::query::{LineValue, Modifier, ModifierOp, Term, TermKind};

/// A query that parsed but cannot be satisfied against this source.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("cannot find node for query: {matcher}")]
    NodeNotFound { matcher: String },

    #[error("invalid line number: {line}")]
    InvalidLineNumber { line: i64 },

    #[error("unknown function call: {callee}")]
    UnknownCallable { callee: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Seed state threaded through resolution.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Context {
    /// Only candidates starting at or after this offset are considered.
    pub after: Option<usize>,
}

/// Intermediate resolution result; byte offsets into the tree's source.
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub code: String,
    pub nodes: Vec<NodeId>,
    pub start: usize,
    pub end: usize,
}

/// Slice tolerating a swapped range; reported offsets stay unswapped, only
/// the extracted text normalizes.
fn slice(code: &str, start: usize, end: usize) -> String {
    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    code[lo.min(code.len())..hi.min(code.len())].to_string()
}

/// Resolve a list of independent top-level terms against the same root.
///
/// `code` is the literal concatenation of each term's extraction in query
/// order; `start`/`end` are the min/max across terms. An empty list yields
/// the empty range at `[0, 0]`.
pub(crate) fn resolve_list(
    engine: &dyn Engine,
    tree: &SyntaxTree,
    terms: &[Term],
    ctx: &Context,
) -> Result<Resolved, ResolveError> {
    let root = engine.initial_root(tree);
    let mut out = Resolved {
        code: String::new(),
        nodes: Vec::new(),
        start: 0,
        end: 0,
    };
    let mut first = true;
    for term in terms {
        let resolved = resolve_term(engine, tree, root, term, ctx)?;
        out.code.push_str(&resolved.code);
        out.nodes.extend(resolved.nodes);
        if first {
            out.start = resolved.start;
            out.end = resolved.end;
            first = false;
        } else {
            out.start = out.start.min(resolved.start);
            out.end = out.end.max(resolved.end);
        }
    }
    Ok(out)
}

pub(crate) fn resolve_term(
    engine: &dyn Engine,
    tree: &SyntaxTree,
    root: NodeId,
    term: &Term,
    ctx: &Context,
) -> Result<Resolved, ResolveError> {
    let resolved = match &term.kind {
        TermKind::Identifier { matcher } => {
            let candidates = engine.find_nodes_with_identifier(tree, root, matcher);
            resolve_match(engine, tree, term, matcher, candidates, ctx)?
        }
        TermKind::Str { matcher } => {
            let candidates = engine.find_nodes_with_string(tree, root, matcher);
            resolve_match(engine, tree, term, matcher, candidates, ctx)?
        }
        TermKind::Line { value } => resolve_line(tree.source(), *value)?,
        TermKind::Range { start, end } => {
            let first = resolve_term(engine, tree, root, start, ctx)?;
            let second_ctx = Context {
                after: Some(first.end),
            };
            let second = resolve_term(engine, tree, root, end, &second_ctx)?;
            let mut nodes = first.nodes;
            nodes.extend(second.nodes);
            Resolved {
                code: slice(tree.source(), first.start, second.end),
                nodes,
                start: first.start,
                end: second.end,
            }
        }
        TermKind::Call {
            callee,
            inner,
            args,
        } => {
            let resolved = resolve_term(engine, tree, root, inner, ctx)?;
            apply_call(engine, tree, callee, args, resolved)?
        }
    };
    Ok(apply_modifiers(tree.source(), resolved, &term.modifiers))
}

/// Shared identifier/string resolution: pick the first candidate at or past
/// the context offset, widen to line bounds, then descend into any chained
/// child terms with the match as the new search root.
fn resolve_match(
    engine: &dyn Engine,
    tree: &SyntaxTree,
    term: &Term,
    matcher: &str,
    candidates: Vec<NodeId>,
    ctx: &Context,
) -> Result<Resolved, ResolveError> {
    let mut chosen = None;
    for candidate in candidates {
        let span = engine.node_range(tree, candidate)?;
        if ctx.after.map_or(true, |after| span.start >= after) {
            chosen = Some((candidate, span));
            break;
        }
    }
    let Some((node, span)) = chosen else {
        return Err(ResolveError::NodeNotFound {
            matcher: matcher.to_string(),
        });
    };

    if let Some(child) = term.children.first() {
        return resolve_term(engine, tree, node, child, ctx);
    }

    let (start, end) = widen_to_line_bounds(tree.source(), span.start, span.end);
    Ok(Resolved {
        code: slice(tree.source(), start, end),
        nodes: vec![node],
        start,
        end,
    })
}

/// Resolve a 1-indexed line number (or EOF) to its byte range.
fn resolve_line(code: &str, value: LineValue) -> Result<Resolved, ResolveError> {
    match value {
        LineValue::Eof => Ok(Resolved {
            code: String::new(),
            nodes: Vec::new(),
            start: code.len(),
            end: code.len(),
        }),
        LineValue::Number(line) => {
            if line <= 0 {
                return Err(ResolveError::InvalidLineNumber { line });
            }
            let wanted = (line - 1) as usize;
            let mut start = 0usize;
            for (index, text) in code.split('\n').enumerate() {
                if index == wanted {
                    return Ok(Resolved {
                        code: text.to_string(),
                        nodes: Vec::new(),
                        start,
                        end: start + text.len(),
                    });
                }
                start += text.len() + 1;
            }
            Err(ResolveError::InvalidLineNumber { line })
        }
    }
}

fn arg_amount(arg: Option<&Term>) -> i64 {
    match arg.map(|term| &term.kind) {
        Some(TermKind::Line {
            value: LineValue::Number(n),
        }) => *n,
        _ => 0,
    }
}

/// Apply a post-resolution transform to an already-resolved inner range.
fn apply_call(
    engine: &dyn Engine,
    tree: &SyntaxTree,
    callee: &str,
    args: &[Term],
    resolved: Resolved,
) -> Result<Resolved, ResolveError> {
    let code = tree.source();
    match callee {
        "upto" => {
            let start = rewind_whitespace(code, resolved.start);
            Ok(Resolved {
                code: String::new(),
                nodes: resolved.nodes,
                start,
                end: start,
            })
        }
        "context" => {
            let before = arg_amount(args.first());
            let after = arg_amount(args.get(1));
            let start = move_position_by_lines(code, -before, resolved.start, before > 0);
            let end = move_position_by_lines(code, after, resolved.end, after > 0);
            Ok(Resolved {
                code: slice(code, start, end),
                nodes: resolved.nodes,
                start,
                end,
            })
        }
        "comments" => {
            let mut start = resolved.start;
            let mut end = resolved.end;
            let mut comment_nodes = Vec::new();
            for &node in &resolved.nodes {
                let comments = engine.comment_range(tree, node, true, false)?;
                if let Some(s) = comments.start {
                    start = start.min(s);
                }
                if let Some(e) = comments.end {
                    end = end.max(e);
                }
                comment_nodes.extend(comments.nodes);
            }
            let mut nodes = comment_nodes;
            nodes.extend(resolved.nodes);
            Ok(Resolved {
                code: slice(code, start, end),
                nodes,
                start,
                end,
            })
        }
        _ => Err(ResolveError::UnknownCallable {
            callee: callee.to_string(),
        }),
    }
}

/// Extend the resolved range by whole lines: `-N` moves `start` back, `+N`
/// moves `end` forward, both trimming the boundary newline.
fn apply_modifiers(code: &str, mut resolved: Resolved, modifiers: &[Modifier]) -> Resolved {
    if modifiers.is_empty() {
        return resolved;
    }
    for modifier in modifiers {
        let amount = i64::from(modifier.amount);
        match modifier.op {
            ModifierOp::Minus => {
                resolved.start = move_position_by_lines(code, -amount, resolved.start, true);
            }
            ModifierOp::Plus => {
                resolved.end = move_position_by_lines(code, amount, resolved.end, true);
            }
        }
    }
    resolved.code = slice(code, resolved.start, resolved.end);
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ParseOptions, TreeSitterEngine};
    use crate::query::parse;

    const SOURCE: &str = r#"const bye = require('bye');
const hello = 'hello';

// says hello
function greet() {
  return hello;
}

class Dog {
  bark() {
    return 'woof';
  }
}
"#;

    fn run(query: &str) -> Result<Resolved, ResolveError> {
        let engine = TreeSitterEngine::javascript();
        let tree = engine.parse(SOURCE, &ParseOptions::default()).unwrap();
        let term = parse(query).unwrap();
        resolve_list(&engine, &tree, std::slice::from_ref(&term), &Context::default())
    }

    #[test]
    fn identifier_extracts_whole_function() {
        let resolved = run(".greet").unwrap();
        assert_eq!(resolved.code, "function greet() {\n  return hello;\n}");
        assert_eq!(resolved.nodes.len(), 1);
        assert_eq!(&SOURCE[resolved.start..resolved.end], resolved.code);
    }

    #[test]
    fn chained_terms_narrow_scope() {
        let resolved = run(".Dog .bark").unwrap();
        assert_eq!(resolved.code, "  bark() {\n    return 'woof';\n  }");
    }

    #[test]
    fn missing_identifier_is_an_error() {
        let err = run(".nope").unwrap_err();
        assert_eq!(err.to_string(), "cannot find node for query: nope");
    }

    #[test]
    fn string_term_finds_literal() {
        let resolved = run("'woof'").unwrap();
        assert!(resolved.code.contains("'woof'"));
    }

    #[test]
    fn line_numbers_are_one_indexed() {
        let resolved = run("2").unwrap();
        assert_eq!(resolved.code, "const hello = 'hello';");
    }

    #[test]
    fn line_zero_is_invalid() {
        let err = run("0").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidLineNumber { line: 0 }));
    }

    #[test]
    fn line_past_end_is_invalid() {
        let err = run("999").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidLineNumber { line: 999 }));
    }

    #[test]
    fn eof_is_empty_range_at_end() {
        let resolved = run("EOF").unwrap();
        assert_eq!(resolved.code, "");
        assert_eq!(resolved.start, SOURCE.len());
        assert_eq!(resolved.end, SOURCE.len());
        assert!(resolved.nodes.is_empty());
    }

    #[test]
    fn line_range_spans_inclusive() {
        let resolved = run("1-2").unwrap();
        assert_eq!(
            resolved.code,
            "const bye = require('bye');\nconst hello = 'hello';"
        );
    }

    #[test]
    fn range_end_resolves_after_start() {
        // two nodes named bark would be ambiguous; here the end term is
        // forced past the start term's extent
        let resolved = run(".greet-.Dog").unwrap();
        assert!(resolved.code.starts_with("function greet()"));
        assert!(resolved.code.ends_with("}"));
    }

    #[test]
    fn identifier_to_eof() {
        let resolved = run(".Dog-EOF").unwrap();
        assert!(resolved.code.starts_with("class Dog"));
        assert_eq!(resolved.end, SOURCE.len());
    }

    #[test]
    fn upto_collapses_before_leading_whitespace() {
        let resolved = run(".greet:upto").unwrap();
        assert_eq!(resolved.code, "");
        assert_eq!(resolved.start, resolved.end);
        // lands right after the comment line above the function
        let comment_end = SOURCE.find("// says hello").unwrap() + "// says hello".len();
        assert_eq!(resolved.start, comment_end);
        assert!(!resolved.nodes.is_empty());
    }

    #[test]
    fn context_adds_surrounding_lines() {
        let resolved = run("5:context(1,1)").unwrap();
        assert_eq!(
            resolved.code,
            "// says hello\nfunction greet() {\n  return hello;"
        );
    }

    #[test]
    fn context_before_first_line_clamps_then_trims() {
        // a walk past the start of text clamps at 0 and the newline trim
        // still steps forward one byte
        let resolved = run("2:context(1,0)").unwrap();
        assert_eq!(resolved.start, 1);
        assert!(resolved.code.starts_with("onst bye"));
    }

    #[test]
    fn comments_extend_to_leading_comment() {
        let resolved = run(".greet:comments").unwrap();
        assert_eq!(
            resolved.code,
            "// says hello\nfunction greet() {\n  return hello;\n}"
        );
        assert!(resolved.nodes.len() >= 2);
    }

    #[test]
    fn comments_start_at_the_comment_itself() {
        // an indented comment must not drag the range back to its line start
        let source = "class A {\n  // doc\n  m() {\n    return 1;\n  }\n}\n";
        let engine = TreeSitterEngine::javascript();
        let tree = engine.parse(source, &ParseOptions::default()).unwrap();
        let term = parse(".m:comments").unwrap();
        let resolved = resolve_list(
            &engine,
            &tree,
            std::slice::from_ref(&term),
            &Context::default(),
        )
        .unwrap();
        assert_eq!(resolved.start, source.find("// doc").unwrap());
        assert_eq!(resolved.code, "// doc\n  m() {\n    return 1;\n  }");
    }

    #[test]
    fn comments_without_any_is_identity() {
        let resolved = run(".Dog:comments").unwrap();
        let plain = run(".Dog").unwrap();
        assert_eq!(resolved.start, plain.start);
        assert_eq!(resolved.end, plain.end);
    }

    #[test]
    fn unknown_callable_is_rejected() {
        let err = run(".greet:frobnicate").unwrap_err();
        assert_eq!(err.to_string(), "unknown function call: frobnicate");
    }

    #[test]
    fn modifiers_extend_by_whole_lines() {
        let with_context = run(".greet:-1,+1").unwrap();
        let plain = run(".greet").unwrap();
        assert!(with_context.start < plain.start);
        assert!(with_context.end > plain.end);
        assert!(with_context.code.contains("// says hello"));
    }

    #[test]
    fn empty_term_list_is_empty_answer() {
        let engine = TreeSitterEngine::javascript();
        let tree = engine.parse(SOURCE, &ParseOptions::default()).unwrap();
        let resolved = resolve_list(&engine, &tree, &[], &Context::default()).unwrap();
        assert_eq!(resolved.code, "");
        assert_eq!((resolved.start, resolved.end), (0, 0));
    }

    #[test]
    fn list_concatenates_in_query_order() {
        let engine = TreeSitterEngine::javascript();
        let tree = engine.parse(SOURCE, &ParseOptions::default()).unwrap();
        let terms = vec![parse(".bark").unwrap(), parse("2").unwrap()];
        let resolved = resolve_list(&engine, &tree, &terms, &Context::default()).unwrap();
        assert!(resolved.code.starts_with("  bark()"));
        assert!(resolved.code.ends_with("const hello = 'hello';"));
        assert!(resolved.start < resolved.end);
    }

    #[test]
    fn after_context_skips_earlier_matches() {
        let engine = TreeSitterEngine::javascript();
        let tree = engine.parse(SOURCE, &ParseOptions::default()).unwrap();
        let term = parse(".hello").unwrap();
        let early = resolve_list(
            &engine,
            &tree,
            std::slice::from_ref(&term),
            &Context::default(),
        )
        .unwrap();
        let late = resolve_list(
            &engine,
            &tree,
            std::slice::from_ref(&term),
            &Context {
                after: Some(early.end),
            },
        )
        .unwrap();
        assert!(late.start >= early.end);
    }

    #[test]
    fn after_context_threads_into_chained_terms() {
        let source = "class A {\n  m() {\n    return 1;\n  }\n}\nclass B {\n  m() {\n    return 2;\n  }\n}\n";
        let engine = TreeSitterEngine::javascript();
        let tree = engine.parse(source, &ParseOptions::default()).unwrap();
        let term = parse(".B .m").unwrap();
        let resolved = resolve_list(
            &engine,
            &tree,
            std::slice::from_ref(&term),
            &Context {
                after: Some(source.find("class B").unwrap()),
            },
        )
        .unwrap();
        assert!(resolved.code.contains("return 2"));
    }
}
