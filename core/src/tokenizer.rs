//! The allocating tokenizer surface: drives a [`ByteStream`], copying matched
//! text into a [`Pool`] so tokens stay valid across stream reallocation.
//!
//! Semantics are identical to [`crate::token_stream::TokenStream`] (same
//! priority-by-declaration matching, same skip-set handling, same
//! error-token behavior for unrecognized bytes) — the only difference is the
//! data source (a resizable `ByteStream` instead of a fixed slice) and token
//! ownership (owned `Vec<u8>` instead of a borrow).

use crate::pool::Pool;
use crate::position::Position;
use crate::stream::{ByteStream, StreamError};
use crate::token::{Token, TokenKind};
use crate::token_stream::Rule;

/// Drives a [`ByteStream`] through a fixed rule set, producing owned tokens.
///
/// Each token's matched text is copied into an internal [`Pool`] rather than
/// borrowed from the stream's buffer, so a reallocating `append` (growing or
/// compacting the stream) never invalidates a previously-returned token.
pub struct Tokenizer {
    rules: Vec<Rule>,
    skip: Vec<u32>,
    pool: Pool,
    lookahead: Vec<u8>,
}

impl Tokenizer {
    pub fn new(rules: Vec<Rule>, skip: Vec<u32>) -> Self {
        Self {
            rules,
            skip,
            pool: Pool::new(),
            lookahead: Vec::new(),
        }
    }

    /// Resets the token pool, invalidating previously-returned tokens' right
    /// to outlive this call (callers that need tokens to survive a reset
    /// must have already copied what they need).
    pub fn reset_pool(&mut self) {
        self.pool.reset();
    }

    /// Total bytes copied into the pool so far.
    pub fn pool_bytes_allocated(&self) -> usize {
        self.pool.bytes_allocated()
    }

    /// Pulls the next token from `stream`, or `None` at end of input.
    ///
    /// Mirrors the tokenizer algorithm: try each rule in declared order at
    /// the current position (matching against a lookahead window pulled from
    /// the stream); on no match, emit a reserved error token for the single
    /// offending byte; loop past skip-kind tokens.
    pub fn next_token(&mut self, stream: &mut ByteStream) -> Result<Option<Token<'static>>, StreamError> {
        loop {
            if stream.is_exhausted() && stream.peek().is_none() {
                return Ok(None);
            }
            let Some(raw) = self.match_one(stream)? else {
                return Ok(None);
            };
            if self.skip.contains(&raw.kind.id) {
                continue;
            }
            return Ok(Some(raw));
        }
    }

    fn refill_lookahead(&mut self, stream: &mut ByteStream, min_len: usize) {
        self.lookahead.clear();
        let mut offset = 0;
        while self.lookahead.len() < min_len.max(256) {
            match stream.peek_at(offset) {
                Some(b) => {
                    self.lookahead.push(b);
                    offset += 1;
                }
                None => break,
            }
        }
    }

    fn match_one(&mut self, stream: &mut ByteStream) -> Result<Option<Token<'static>>, StreamError> {
        if stream.peek().is_none() {
            return Ok(None);
        }
        self.refill_lookahead(stream, 0);
        if self.lookahead.is_empty() {
            return Ok(None);
        }

        let position = stream.position();
        for rule in &self.rules {
            let m = rule.pattern.match_at(&self.lookahead, 0);
            if m.matched && m.length >= 1 {
                // The lookahead window might be shorter than the true match
                // (e.g. an unbounded `Until`/repeat against a source still
                // filling); grow the window until the match stabilizes.
                //
                // A match that consumes the *entire* window is ambiguous for
                // a stream that isn't finished yet: a later append could
                // extend it further (a word split exactly at a chunk
                // boundary). In that case we defer rather than commit, so an
                // incremental caller gets the whole token once enough bytes
                // have arrived instead of one token per chunk fragment.
                let mut length = m.length;
                loop {
                    if length < self.lookahead.len() {
                        break;
                    }
                    if stream.is_finished() {
                        break;
                    }
                    if stream_lookahead_exhausted(stream, &self.lookahead) {
                        return Ok(None);
                    }
                    self.refill_lookahead(stream, length + 256);
                    let m2 = rule.pattern.match_at(&self.lookahead, 0);
                    if !m2.matched {
                        break;
                    }
                    length = m2.length;
                }
                let owned = self.pool.dup(&self.lookahead[..length]);
                stream.consume_count(length);
                return Ok(Some(Token::owned(rule.kind, position, owned)));
            }
        }

        // No rule matched length >= 1: reserved error token for one byte.
        // `match_one` already returned early above unless `stream.peek()`
        // found a byte, so the consume here can't come back empty.
        #[allow(clippy::expect_used)]
        let byte = stream.consume().expect("peeked byte must be consumable");
        let owned = self.pool.dup(&[byte]);
        Ok(Some(Token::owned(TokenKind::ERROR, position, owned)))
    }
}

fn stream_lookahead_exhausted(stream: &mut ByteStream, window: &[u8]) -> bool {
    stream.peek_at(window.len()).is_none()
}

/// A position observed mid-tokenization, exposed for diagnostics that need
/// to report where a token started without holding the token itself.
pub fn token_start_position(stream: &ByteStream) -> Position {
    stream.position()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charclass::CharClass;
    use crate::pattern::Pattern;

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
    fn whole_input_tokenization_matches_zero_alloc_path() {
        let mut stream = ByteStream::from_memory(b"hello 123 world", None);
        let mut tok = Tokenizer::new(scenario_a_rules(), vec![WS.id]);
        let mut texts = Vec::new();
        while let Some(t) = tok.next_token(&mut stream).unwrap() {
            texts.push(t.as_str().unwrap().to_string());
        }
        assert_eq!(texts, vec!["hello", "123", "world"]);
    }

    #[test]
    fn scenario_d_incremental_append() {
        let mut stream = ByteStream::with_buffer(None);
        let mut tok = Tokenizer::new(
            vec![
                Rule::new(WORD, Pattern::one_or_more(Pattern::Class(CharClass::AlphaLower))),
                Rule::new(WS, Pattern::one_or_more(Pattern::Class(CharClass::Whitespace))),
            ],
            vec![WS.id],
        );
        stream.append(b"he").unwrap();
        stream.append(b"llo ").unwrap();
        stream.append(b"world").unwrap();
        // Without this, "world" sits at the end of the buffer with nothing
        // to disprove further growth and next_token would defer it forever.
        stream.finish();

        let mut texts = Vec::new();
        while let Some(t) = tok.next_token(&mut stream).unwrap() {
            texts.push(t.as_str().unwrap().to_string());
        }
        assert_eq!(texts, vec!["hello", "world"]);
    }

    #[test]
    fn tokens_outlive_stream_reallocation() {
        let mut stream = ByteStream::with_buffer(None);
        let mut tok = Tokenizer::new(
            vec![Rule::new(WORD, Pattern::one_or_more(Pattern::Class(CharClass::AlphaLower)))],
            vec![],
        );
        // Trailing space gives the match a definitive boundary within the
        // same append, so it resolves without needing `finish()`.
        stream.append(b"abc ").unwrap();
        let first = tok.next_token(&mut stream).unwrap().unwrap();
        // force growth well beyond the original buffer
        let filler = vec![b'x'; 8192];
        stream.append(&filler).unwrap();
        assert_eq!(first.as_str(), Some("abc"));
    }
}
