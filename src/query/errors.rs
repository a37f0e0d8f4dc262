use thiserror::Error;

/// Position of a parse failure within the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Byte offset of the failure.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column (in characters) within that line.
    pub column: usize,
}

impl Location {
    /// Compute the line/column of `offset` within `input`.
    pub fn of(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let prefix = &input[..offset];
        let line = prefix.matches('\n').count() + 1;
        let column = prefix
            .rsplit('\n')
            .next()
            .unwrap_or("")
            .chars()
            .count()
            + 1;
        Location {
            offset,
            line,
            column,
        }
    }
}

/// The query text violates the selector grammar.
///
/// `expected` holds the descriptions of every token that would have allowed
/// parsing to continue at the farthest offset reached (sorted, deduplicated);
/// `found` is the character actually there, or `None` at end of input. This
/// expected/found/location shape is the external contract for query
/// diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", self.render())]
pub struct SyntaxError {
    pub expected: Vec<String>,
    pub found: Option<String>,
    pub location: Location,
}

impl SyntaxError {
    fn render(&self) -> String {
        let expected = match self.expected.len() {
            0 => String::from("nothing"),
            1 => self.expected[0].clone(),
            n => format!(
                "{} or {}",
                self.expected[..n - 1].join(", "),
                self.expected[n - 1]
            ),
        };
        let found = match &self.found {
            Some(text) => format!("\"{}\"", text.escape_default()),
            None => String::from("end of input"),
        };
        format!(
            "Expected {} but {} found (line {}, column {}).",
            expected, found, self.location.line, self.location.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_of_offsets() {
        let input = ".foo\n.bar baz";
        assert_eq!(
            Location::of(input, 0),
            Location {
                offset: 0,
                line: 1,
                column: 1
            }
        );
        assert_eq!(
            Location::of(input, 5),
            Location {
                offset: 5,
                line: 2,
                column: 1
            }
        );
        assert_eq!(
            Location::of(input, 10),
            Location {
                offset: 10,
                line: 2,
                column: 6
            }
        );
    }

    #[test]
    fn message_lists_alternatives() {
        let err = SyntaxError {
            expected: vec!["\".\"".into(), "integer".into(), "string".into()],
            found: Some("x".into()),
            location: Location {
                offset: 0,
                line: 1,
                column: 1,
            },
        };
        assert_eq!(
            err.to_string(),
            "Expected \".\", integer or string but \"x\" found (line 1, column 1)."
        );
    }

    #[test]
    fn message_at_end_of_input() {
        let err = SyntaxError {
            expected: vec!["integer".into()],
            found: None,
            location: Location {
                offset: 4,
                line: 1,
                column: 5,
            },
        };
        assert_eq!(
            err.to_string(),
            "Expected integer but end of input found (line 1, column 5)."
        );
    }
}
