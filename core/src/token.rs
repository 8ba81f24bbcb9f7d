//! Tokens produced by the tokenizer.

use crate::position::Position;
use std::borrow::Cow;

/// Reserved token kind id for a byte the configured patterns could not match.
///
/// The tokenizer never aborts on unrecognized input: it emits an `Error`
/// token carrying the single offending byte and advances by one, so this id
/// must never collide with a user-assigned token kind id.
pub const ERROR_TOKEN_KIND: u32 = u32::MAX;

/// A token kind: a stable integer id plus a display name.
///
/// User code owns the mapping from ids to its own enum; the engine only ever
/// compares ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenKind {
    pub id: u32,
    pub name: &'static str,
}

impl TokenKind {
    pub const fn new(id: u32, name: &'static str) -> Self {
        Self { id, name }
    }

    /// The reserved kind used for unrecognized-byte error tokens.
    pub const ERROR: Self = Self::new(ERROR_TOKEN_KIND, "<error>");
}

/// A successful pattern match: kind, source position, and matched text.
///
/// `text` borrows from the input buffer on the zero-allocation path
/// ([`crate::token_stream::TokenStream`]); the allocating
/// [`crate::tokenizer::Tokenizer`] instead copies matched bytes into its pool
/// so a token's text stays valid past further stream advancement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub position: Position,
    #[cfg_attr(feature = "serde", serde(borrow))]
    pub text: Cow<'a, [u8]>,
}

impl<'a> Token<'a> {
    pub fn borrowed(kind: TokenKind, position: Position, text: &'a [u8]) -> Self {
        Self {
            kind,
            position,
            text: Cow::Borrowed(text),
        }
    }

    pub fn owned(kind: TokenKind, position: Position, text: Vec<u8>) -> Token<'static> {
        Token {
            kind,
            position,
            text: Cow::Owned(text),
        }
    }

    /// The matched text as a `&str`, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.text).ok()
    }

    /// Length in bytes of the matched text.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True if this is the reserved error-byte token.
    pub fn is_error(&self) -> bool {
        self.kind.id == ERROR_TOKEN_KIND
    }
}
