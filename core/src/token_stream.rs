//! The zero-allocation tokenizer surface: a lazy iterator over a borrowed
//! input slice, driven by a fixed `{kind: Pattern}` grammar.
//!
//! `TokenStream` never allocates on its matching path; every returned
//! [`Token`] borrows directly from the slice it was built over. This is the
//! right surface when the caller can guarantee the input outlives the
//! tokens — e.g. parsing a whole in-memory document in one pass. Callers
//! needing tokens that outlive the source buffer (e.g. incremental parsing
//! over a growing/reallocating stream) should use
//! [`crate::tokenizer::Tokenizer`] instead.

use crate::pattern::Pattern;
use crate::position::Position;
use crate::token::{Token, TokenKind};

/// One entry in a tokenizer grammar: a token kind paired with the pattern
/// that recognizes it.
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: TokenKind,
    pub pattern: Pattern,
}

impl Rule {
    pub fn new(kind: TokenKind, pattern: Pattern) -> Self {
        Self { kind, pattern }
    }
}

/// A lazy, zero-allocation token iterator over a fixed `&[u8]` input.
///
/// Patterns are tried in declared order at each position; the first pattern
/// that matches with length >= 1 wins (priority-by-declaration, not
/// longest-overall across patterns — see [`Pattern`] and the tokenizer
/// algorithm notes on [`crate::tokenizer::Tokenizer`]).
pub struct TokenStream<'a> {
    input: &'a [u8],
    rules: &'a [Rule],
    skip: &'a [u32],
    pos: usize,
    position: Position,
    last_byte: Option<u8>,
}

impl<'a> TokenStream<'a> {
    /// Builds a token stream over `input` using `rules` in priority order.
    /// Token kinds whose id is present in `skip` are matched (so position
    /// tracking stays correct) but never yielded to the caller.
    pub fn new(input: &'a [u8], rules: &'a [Rule], skip: &'a [u32]) -> Self {
        Self {
            input,
            rules,
            skip,
            pos: 0,
            position: Position::new(),
            last_byte: None,
        }
    }

    /// Current byte offset into the input.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Current line/column position.
    pub fn position(&self) -> Position {
        self.position
    }

    fn advance_position(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.position.advance(b, self.last_byte);
            self.last_byte = Some(b);
        }
    }

    fn next_raw(&mut self) -> Option<Token<'a>> {
        if self.pos >= self.input.len() {
            return None;
        }
        for rule in self.rules {
            let m = rule.pattern.match_at(self.input, self.pos);
            if m.matched && m.length >= 1 {
                let start = self.pos;
                let text = &self.input[start..start + m.length];
                let token_pos = self.position;
                self.advance_position(text);
                self.pos += m.length;
                return Some(Token::borrowed(rule.kind, token_pos, text));
            }
        }
        // No configured pattern matched length >= 1: emit a reserved error
        // token for the single offending byte and advance by one.
        let start = self.pos;
        let text = &self.input[start..start + 1];
        let token_pos = self.position;
        self.advance_position(text);
        self.pos += 1;
        Some(Token::borrowed(TokenKind::ERROR, token_pos, text))
    }

    /// Collects every remaining token, skipping configured skip-kinds. Useful
    /// for tests and small inputs; streaming consumers should prefer the
    /// `Iterator` implementation.
    pub fn all(&mut self) -> Vec<Token<'a>> {
        self.by_ref().collect()
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let token = self.next_raw()?;
            if self.skip.contains(&token.kind.id) {
                continue;
            }
            return Some(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charclass::CharClass;

    const WORD: TokenKind = TokenKind::new(1, "word");
    const NUMBER: TokenKind = TokenKind::new(2, "number");
    const WS: TokenKind = TokenKind::new(3, "ws");

    fn scenario_a_rules() -> Vec<Rule> {
        vec![
            Rule::new(WORD, Pattern::one_or_more(Pattern::Class(CharClass::AlphaLower))),
            Rule::new(NUMBER, Pattern::one_or_more(Pattern::Class(CharClass::Digit))),
            Rule::new(WS, Pattern::one_or_more(Pattern::Class(CharClass::Whitespace))),
        ]
    }

    #[test]
    fn scenario_a_word_number_tokenization() {
        let rules = scenario_a_rules();
        let ts = TokenStream::new(b"hello 123 world", &rules, &[WS.id]);
        let tokens: Vec<_> = ts.collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].as_str(), Some("hello"));
        assert_eq!((tokens[0].position.line, tokens[0].position.column), (1, 1));
        assert_eq!(tokens[1].as_str(), Some("123"));
        assert_eq!((tokens[1].position.line, tokens[1].position.column), (1, 7));
        assert_eq!(tokens[2].as_str(), Some("world"));
        assert_eq!((tokens[2].position.line, tokens[2].position.column), (1, 11));
    }

    #[test]
    fn scenario_b_literal_priority_over_longest() {
        const KW_TRUE: TokenKind = TokenKind::new(10, "kw_true");
        const IDENT: TokenKind = TokenKind::new(11, "ident");
        let rules = vec![
            Rule::new(KW_TRUE, Pattern::literal("true")),
            Rule::new(IDENT, Pattern::one_or_more(Pattern::Class(CharClass::AlphaLower))),
        ];
        let mut ts = TokenStream::new(b"truest", &rules, &[]);
        let first = ts.next().unwrap();
        assert_eq!(first.kind, KW_TRUE);
        assert_eq!(first.as_str(), Some("true"));
        let second = ts.next().unwrap();
        assert_eq!(second.kind, IDENT);
        assert_eq!(second.as_str(), Some("st"));
        assert_eq!((second.position.line, second.position.column), (1, 5));
    }

    #[test]
    fn scenario_f_error_token_for_unrecognized_byte() {
        let rules = vec![Rule::new(
            WORD,
            Pattern::one_or_more(Pattern::Class(CharClass::AlphaLower)),
        )];
        let ts = TokenStream::new(b"abc\x01def", &rules, &[]);
        let tokens: Vec<_> = ts.collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].as_str(), Some("abc"));
        assert!(tokens[1].is_error());
        assert_eq!(&tokens[1].text[..], b"\x01");
        assert_eq!(tokens[2].as_str(), Some("def"));
    }

    #[test]
    fn property_exhaustion_consumes_every_byte() {
        let rules = scenario_a_rules();
        let input = b"hello 123 world";
        let ts = TokenStream::new(input, &rules, &[]);
        let total: usize = ts.map(|t| t.len()).sum();
        assert_eq!(total, input.len());
    }
}
