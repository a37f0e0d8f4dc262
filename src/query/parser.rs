//! Recursive-descent parser for the selector language.
//!
//! Grammar (ordered alternation, full backtracking):
//!
//! ```text
//! SelectionExpression := TermWithModifiers (ws TermWithModifiers)*
//! TermWithModifiers   := Term (":" (Call | Modifiers))*
//! Term                := Range | Selection
//! Range               := Selection "-" Selection
//! Selection           := Identifier | String | LineNumber | "(" SelectionExpression ")"
//! Identifier          := "." [A-Za-z0-9_$]+
//! String              := "'" [^']* "'" | '"' [^"]* '"'
//! LineNumber          := Integer | "EOF"
//! Call                := [a-zA-Z_]+ ("(" SignedInteger ("," SignedInteger)* ")")?
//! Modifiers           := ("+" | "-") Integer ("," ("+" | "-") Integer)*
//! ```
//!
//! Space-separated terms fold into a linear `children` chain. Failures track
//! the farthest offset reached and the set of token descriptions expected
//! there, PEG-style, so diagnostics survive backtracking.

use super::errors::{Location, SyntaxError};
use super::{LineValue, Modifier, ModifierOp, Term, TermKind};
use std::collections::BTreeSet;

/// Parse a query string into a single [`Term`] (chains folded into children).
pub fn parse(input: &str) -> Result<Term, SyntaxError> {
    let mut parser = Parser::new(input);
    match parser.selection_expression() {
        Some(term) if parser.pos == input.len() => Ok(term),
        Some(_) => {
            parser.record("end of input");
            Err(parser.into_error())
        }
        None => Err(parser.into_error()),
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    farthest: usize,
    expected: BTreeSet<&'static str>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            input,
            pos: 0,
            farthest: 0,
            expected: BTreeSet::new(),
        }
    }

    /// Record a failed expectation at the current position. Only the
    /// farthest failure survives; earlier ones are discarded.
    fn record(&mut self, description: &'static str) {
        if self.pos > self.farthest {
            self.farthest = self.pos;
            self.expected.clear();
        }
        if self.pos == self.farthest {
            self.expected.insert(description);
        }
    }

    fn into_error(self) -> SyntaxError {
        let found = self.input[self.farthest..]
            .chars()
            .next()
            .map(|c| c.to_string());
        SyntaxError {
            expected: self.expected.into_iter().map(String::from).collect(),
            found,
            location: Location::of(self.input, self.farthest),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8, description: &'static str) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            self.record(description);
            false
        }
    }

    fn selection_expression(&mut self) -> Option<Term> {
        let head = self.term_with_modifiers()?;
        let mut terms = vec![head];
        loop {
            let save = self.pos;
            if !self.whitespace() {
                break;
            }
            match self.term_with_modifiers() {
                Some(term) => terms.push(term),
                None => {
                    self.pos = save;
                    break;
                }
            }
        }

        // fold `.foo .bar .baz` into a linear children chain
        let mut chained: Option<Term> = None;
        for mut term in terms.into_iter().rev() {
            if let Some(child) = chained.take() {
                term.children = vec![child];
            }
            chained = Some(term);
        }
        chained
    }

    fn term_with_modifiers(&mut self) -> Option<Term> {
        let mut term = self.term()?;
        loop {
            if !self.eat(b':', "\":\"") {
                break;
            }
            if let Some((callee, args)) = self.call_tail() {
                term = Term::call(callee, term, args);
            } else if let Some(mods) = self.modifiers() {
                term.modifiers.extend(mods);
            } else {
                // a bare trailing ':' is tolerated, as in the original grammar
                break;
            }
        }
        Some(term)
    }

    fn term(&mut self) -> Option<Term> {
        let save = self.pos;
        if let Some(range) = self.range() {
            return Some(range);
        }
        self.pos = save;
        self.selection()
    }

    fn range(&mut self) -> Option<Term> {
        let save = self.pos;
        let start = self.selection()?;
        if !self.eat(b'-', "\"-\"") {
            self.pos = save;
            return None;
        }
        match self.selection() {
            Some(end) => Some(Term::range(start, end)),
            None => {
                self.pos = save;
                None
            }
        }
    }

    fn selection(&mut self) -> Option<Term> {
        let save = self.pos;
        if let Some(term) = self.identifier() {
            return Some(term);
        }
        self.pos = save;
        if let Some(term) = self.string_literal() {
            return Some(term);
        }
        self.pos = save;
        if let Some(term) = self.line_number() {
            return Some(term);
        }
        self.pos = save;
        self.group()
    }

    fn identifier(&mut self) -> Option<Term> {
        let save = self.pos;
        if !self.eat(b'.', "\".\"") {
            return None;
        }
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
        {
            self.pos += 1;
        }
        if self.pos == start {
            self.record("[A-Za-z0-9_$]");
            self.pos = save;
            return None;
        }
        Some(Term::identifier(&self.input[start..self.pos]))
    }

    fn string_literal(&mut self) -> Option<Term> {
        let save = self.pos;
        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => {
                self.record("string");
                return None;
            }
        };
        self.pos += 1;
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte == quote {
                break;
            }
            self.pos += 1;
        }
        if self.peek() != Some(quote) {
            self.record("string");
            self.pos = save;
            return None;
        }
        let matcher = &self.input[start..self.pos];
        self.pos += 1;
        Some(Term::string(matcher))
    }

    fn line_number(&mut self) -> Option<Term> {
        if let Some(value) = self.integer() {
            return Some(Term::line(value));
        }
        if self.input[self.pos..].starts_with("EOF") {
            self.pos += 3;
            return Some(Term::eof());
        }
        self.record("\"EOF\"");
        None
    }

    fn group(&mut self) -> Option<Term> {
        let save = self.pos;
        if !self.eat(b'(', "\"(\"") {
            return None;
        }
        let expr = match self.selection_expression() {
            Some(expr) => expr,
            None => {
                self.pos = save;
                return None;
            }
        };
        if !self.eat(b')', "\")\"") {
            self.pos = save;
            return None;
        }
        Some(expr)
    }

    fn call_tail(&mut self) -> Option<(String, Vec<Term>)> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphabetic() || b == b'_') {
            self.pos += 1;
        }
        if self.pos == start {
            self.record("callable name");
            return None;
        }
        let callee = self.input[start..self.pos].to_string();

        let args_save = self.pos;
        let mut args = Vec::new();
        if self.eat(b'(', "\"(\"") {
            self.skip_whitespace();
            match self.signed_integer() {
                Some(value) => args.push(Term::line(value)),
                None => {
                    // malformed arguments: treat the call as bare and let the
                    // unconsumed "(" surface as a trailing-input error
                    self.pos = args_save;
                    return Some((callee, Vec::new()));
                }
            }
            loop {
                self.skip_whitespace();
                if !self.eat(b',', "\",\"") {
                    break;
                }
                self.skip_whitespace();
                match self.signed_integer() {
                    Some(value) => args.push(Term::line(value)),
                    None => {
                        self.pos = args_save;
                        return Some((callee, Vec::new()));
                    }
                }
            }
            self.skip_whitespace();
            if !self.eat(b')', "\")\"") {
                self.pos = args_save;
                return Some((callee, Vec::new()));
            }
        } else {
            self.pos = args_save;
        }
        Some((callee, args))
    }

    fn modifiers(&mut self) -> Option<Vec<Modifier>> {
        let first = self.modifier()?;
        let mut out = vec![first];
        loop {
            let save = self.pos;
            if !self.eat(b',', "\",\"") {
                break;
            }
            match self.modifier() {
                Some(modifier) => out.push(modifier),
                None => {
                    self.pos = save;
                    break;
                }
            }
        }
        Some(out)
    }

    fn modifier(&mut self) -> Option<Modifier> {
        let save = self.pos;
        let op = match self.peek() {
            Some(b'+') => {
                self.pos += 1;
                ModifierOp::Plus
            }
            Some(b'-') => {
                self.pos += 1;
                ModifierOp::Minus
            }
            _ => {
                self.record("\"+\"");
                self.record("\"-\"");
                return None;
            }
        };
        match self.integer() {
            Some(amount) if amount >= 0 => Some(Modifier {
                op,
                amount: u32::try_from(amount).unwrap_or(u32::MAX),
            }),
            _ => {
                self.pos = save;
                None
            }
        }
    }

    fn signed_integer(&mut self) -> Option<i64> {
        let save = self.pos;
        let negative = if self.peek() == Some(b'-') {
            self.pos += 1;
            true
        } else {
            false
        };
        match self.integer() {
            Some(value) => Some(if negative { -value } else { value }),
            None => {
                self.pos = save;
                None
            }
        }
    }

    fn integer(&mut self) -> Option<i64> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.pos == start {
            self.record("integer");
            return None;
        }
        match self.input[start..self.pos].parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = start;
                self.record("integer");
                None
            }
        }
    }

    /// Mandatory whitespace between chained terms.
    fn whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
        if self.pos == start {
            self.record("whitespace");
            false
        } else {
            true
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }
}
