//! Structured event emission to a user-supplied handler.

use crate::error::ParseError;
use crate::token::Token;

/// A structured notification emitted at well-defined points of a parse.
#[derive(Debug, Clone)]
pub enum Event<'a> {
    /// Emitted exactly once, before the first token of a successful parse.
    StartDocument,
    /// Emitted exactly once, after the last token of a successful parse.
    EndDocument,
    /// Emitted by a user action to mark the start of a structural element.
    StartElement { name: &'static str },
    /// Emitted by a user action to mark the end of a structural element.
    EndElement { name: &'static str },
    /// Emitted by a user action carrying a parsed value.
    Value { token: Token<'a> },
    /// Emitted alongside every reported error, in addition to being
    /// recorded by the [`crate::error::ErrorReporter`].
    Error { error: ParseError },
}

/// A handler invoked for every emitted [`Event`]. Returning an error aborts
/// the parse; the error propagates out of `parse`/`process_chunk`.
pub type EventHandler<'a> = Box<dyn FnMut(Event<'a>) -> Result<(), ParseError> + 'a>;

/// Dispatches events to an optional user handler, preserving emission order.
#[derive(Default)]
pub struct EventEmitter<'a> {
    handler: Option<EventHandler<'a>>,
}

impl<'a> EventEmitter<'a> {
    pub fn new() -> Self {
        Self { handler: None }
    }

    pub fn set_handler(&mut self, handler: EventHandler<'a>) {
        self.handler = Some(handler);
    }

    /// Emits `event` to the configured handler, if any. Events are emitted
    /// in the exact order actions run, matching the exact order tokens are
    /// consumed.
    pub fn emit(&mut self, event: Event<'a>) -> Result<(), ParseError> {
        match &mut self.handler {
            Some(handler) => handler(event),
            None => Ok(()),
        }
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}
