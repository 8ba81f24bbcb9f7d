//! Ties the byte stream, tokenizer, state machine, event emitter, and error
//! reporter together behind one parse surface, in whole-input and
//! incremental flavors.

use crate::config::ParseConfig;
use crate::context::ParserContext;
use crate::emitter::{Event, EventEmitter, EventHandler};
use crate::error::{ErrorCode, ErrorReporter, ParseError, ParserError, Severity};
use crate::state_machine::{StateMachine, TransitionOutcome};
use crate::stream::{ByteStream, StreamError};
use crate::token::{Token, TokenKind};
use crate::tokenizer::Tokenizer;

/// Governs what happens when the state machine cannot transition on the
/// current token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// First error aborts with `UnexpectedToken`; no recovery.
    Strict,
    /// On `UnexpectedToken`, synchronize and continue.
    Normal,
    /// On `UnexpectedToken`, first try the *following* token before
    /// synchronizing; continue either way.
    Lenient,
    /// Collect all errors, never advance state on an error, don't abort
    /// until end-of-input; raise at the end if any were recorded.
    Validation,
}

/// A buffer-utilization threshold pair used to decide when `process_chunk`
/// should compact the underlying stream: compact once utilization falls
/// below `low_watermark` and the buffer has grown past `compact_above`.
#[derive(Debug, Clone, Copy)]
pub struct CompactionPolicy {
    pub low_watermark: f64,
    pub compact_above: usize,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            low_watermark: 0.25,
            compact_above: 64 * 1024,
        }
    }
}

enum ChunkState {
    NotStarted,
    Started,
    Finished,
}

/// Ties stream + tokenizer + state machine + events + errors into one
/// parse surface.
pub struct Parser<'a> {
    stream: ByteStream,
    tokenizer: Tokenizer,
    machine: StateMachine,
    emitter: EventEmitter<'a>,
    reporter: ErrorReporter,
    ctx: ParserContext,
    mode: ParseMode,
    compaction: CompactionPolicy,
    chunk_state: ChunkState,
    max_tokens: usize,
    tokens_consumed: usize,
}

impl<'a> Parser<'a> {
    /// Builds a parser over `stream`, driving `tokenizer` through
    /// `machine`'s transitions under `mode`.
    pub fn init(
        stream: ByteStream,
        tokenizer: Tokenizer,
        machine: StateMachine,
        mode: ParseMode,
        config: ParseConfig,
    ) -> Self {
        Self {
            stream,
            tokenizer,
            machine,
            emitter: EventEmitter::new(),
            reporter: ErrorReporter::new(config.max_errors),
            ctx: ParserContext::new(),
            mode,
            compaction: CompactionPolicy::default(),
            chunk_state: ChunkState::NotStarted,
            max_tokens: config.max_tokens,
            tokens_consumed: 0,
        }
    }

    pub fn set_event_handler(&mut self, handler: EventHandler<'a>) {
        self.emitter.set_handler(handler);
    }

    pub fn context(&self) -> &ParserContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ParserContext {
        &mut self.ctx
    }

    pub fn errors(&self) -> impl Iterator<Item = &ParseError> {
        self.reporter.errors()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ParseError> {
        self.reporter.warnings()
    }

    pub fn has_errors(&self) -> bool {
        self.reporter.has_errors()
    }

    pub fn print_errors(&self, sink: &mut dyn std::fmt::Write, source: Option<&str>) -> std::fmt::Result {
        self.reporter.print_errors(sink, source)
    }

    /// Parses the whole, already-available input to exhaustion.
    pub fn parse(&mut self) -> Result<(), ParserError> {
        self.emit_infallible(Event::StartDocument);
        self.drive_to_exhaustion()?;
        self.emit_infallible(Event::EndDocument);
        if matches!(self.mode, ParseMode::Strict | ParseMode::Validation) {
            self.reporter.throw_if_errors()?;
        }
        Ok(())
    }

    /// Feeds one more chunk of bytes into the incremental parse. The first
    /// non-empty chunk emits `StartDocument`. Tokens become available to
    /// drive as soon as a full one can be matched from buffered bytes;
    /// callers typically call `parse_available` after each chunk, or rely on
    /// `finish_chunks` to drain everything at the end.
    pub fn process_chunk(&mut self, bytes: &[u8]) -> Result<(), ParserError> {
        if matches!(self.chunk_state, ChunkState::NotStarted) && !bytes.is_empty() {
            self.emit_infallible(Event::StartDocument);
            self.chunk_state = ChunkState::Started;
        }
        self.stream
            .append(bytes)
            .map_err(|e| self.fatal_stream_error(e))?;
        self.maybe_compact();
        self.drive_available()?;
        Ok(())
    }

    /// Drains any remaining buffered tokens and emits `EndDocument`, closing
    /// out an incremental parse.
    pub fn finish_chunks(&mut self) -> Result<(), ParserError> {
        if matches!(self.chunk_state, ChunkState::NotStarted) {
            self.emit_infallible(Event::StartDocument);
        }
        // A match that exactly reaches the buffer's end is ambiguous while
        // more chunks might still arrive (see `Tokenizer::match_one`), so
        // the stream must be marked finished before draining or the final
        // token would be deferred forever instead of emitted.
        self.stream.finish();
        self.drive_to_exhaustion()?;
        self.emit_infallible(Event::EndDocument);
        self.chunk_state = ChunkState::Finished;
        if matches!(self.mode, ParseMode::Strict | ParseMode::Validation) {
            self.reporter.throw_if_errors()?;
        }
        Ok(())
    }

    fn maybe_compact(&mut self) {
        let stats = self.stream.stats();
        if stats.buffer_size == 0 {
            return;
        }
        let utilization = stats.used as f64 / stats.buffer_size as f64;
        if stats.buffer_size > self.compaction.compact_above && utilization < self.compaction.low_watermark {
            self.stream.compact();
        }
    }

    /// Drives tokens to stream exhaustion (used by `parse`/`finish_chunks`).
    fn drive_to_exhaustion(&mut self) -> Result<(), ParserError> {
        loop {
            let token = self
                .tokenizer
                .next_token(&mut self.stream)
                .map_err(|e| self.fatal_stream_error(e))?;
            match token {
                Some(token) => self.dispatch(token)?,
                None => break,
            }
        }
        Ok(())
    }

    /// Drives whatever tokens are currently fully available without
    /// blocking for more input (used by `process_chunk`). Since `Tokenizer`
    /// already treats a non-exhausted external stream's "no more bytes yet"
    /// the same as end-of-input for a non-growing match, this currently
    /// shares the same drain loop as `drive_to_exhaustion`; it is kept as a
    /// separate method so the two call sites can diverge if a future
    /// incremental-match optimization needs partial-token checkpointing.
    fn drive_available(&mut self) -> Result<(), ParserError> {
        self.drive_to_exhaustion()
    }

    fn dispatch(&mut self, token: Token<'static>) -> Result<(), ParserError> {
        self.tokens_consumed += 1;
        if self.tokens_consumed > self.max_tokens {
            let error = ParseError::new(
                ErrorCode::INTERNAL_ERROR,
                token.position,
                crate::error::Error::TokenLimitExceeded {
                    consumed: self.tokens_consumed,
                    limit: self.max_tokens,
                }
                .to_string(),
            )
            .with_severity(Severity::Fatal);
            self.emit_infallible(Event::Error { error: error.clone() });
            let _ = self.reporter.report(error);
            return Err(ParserError::HasErrors {
                count: self.tokens_consumed,
            });
        }

        if token.is_error() {
            self.report_lexical_error(&token)?;
            return Ok(());
        }

        match self.mode {
            ParseMode::Validation => self.dispatch_validation(token),
            ParseMode::Strict => self.dispatch_strict(token),
            ParseMode::Normal => self.dispatch_normal(token),
            ParseMode::Lenient => self.dispatch_lenient(token),
        }
    }

    fn dispatch_strict(&mut self, token: Token<'static>) -> Result<(), ParserError> {
        match self.run_transition(&token)? {
            TransitionOutcome::Ok => Ok(()),
            TransitionOutcome::UnexpectedToken { .. } => {
                self.report_unexpected(&token)?;
                self.reporter.throw_if_errors()
            }
        }
    }

    fn dispatch_normal(&mut self, token: Token<'static>) -> Result<(), ParserError> {
        match self.run_transition(&token)? {
            TransitionOutcome::Ok => Ok(()),
            TransitionOutcome::UnexpectedToken { .. } => {
                self.report_unexpected(&token)?;
                self.synchronize()
            }
        }
    }

    fn dispatch_lenient(&mut self, token: Token<'static>) -> Result<(), ParserError> {
        match self.run_transition(&token)? {
            TransitionOutcome::Ok => Ok(()),
            TransitionOutcome::UnexpectedToken { .. } => {
                self.report_unexpected(&token)?;
                // Try the following token directly before synchronizing.
                let next = self
                    .tokenizer
                    .next_token(&mut self.stream)
                    .map_err(|e| self.fatal_stream_error(e))?;
                match next {
                    Some(next_token) if !next_token.is_error() && self.machine.try_transition(next_token.kind.id) => {
                        self.dispatch(next_token)
                    }
                    Some(next_token) => {
                        // No direct progress: fall back to synchronizing,
                        // having already consumed `next_token` as part of
                        // the probe.
                        let _ = next_token;
                        self.synchronize()
                    }
                    None => Ok(()),
                }
            }
        }
    }

    fn dispatch_validation(&mut self, token: Token<'static>) -> Result<(), ParserError> {
        // Validation mode: probe with try_transition so a mismatch never
        // advances state, but keep consuming tokens to find every error.
        if self.machine.try_transition(token.kind.id) {
            self.run_transition(&token)?;
        } else {
            self.report_unexpected(&token)?;
        }
        Ok(())
    }

    fn run_transition(&mut self, token: &Token<'static>) -> Result<TransitionOutcome, ParserError> {
        self.machine
            .transition(token, &mut self.ctx)
            .map_err(|e| {
                let err = ParseError::new(ErrorCode::INTERNAL_ERROR, token.position, e.0.clone())
                    .with_severity(Severity::Fatal);
                self.emit_infallible(Event::Error { error: err });
                ParserError::HasErrors { count: 1 }
            })
    }

    /// Records an `UnexpectedToken` diagnostic. Propagates
    /// [`ParserError::TooManyErrors`] once `max_errors` is exceeded.
    fn report_unexpected(&mut self, token: &Token<'static>) -> Result<(), ParserError> {
        let error = ParseError::new(
            ErrorCode::UNEXPECTED_TOKEN,
            token.position,
            format!("unexpected token {:?}", token.kind.name),
        )
        .with_token(token.clone());
        self.emit_infallible(Event::Error { error: error.clone() });
        self.reporter.report(error)
    }

    /// Records an `UnknownCharacter` diagnostic for an unrecognized byte.
    /// Propagates [`ParserError::TooManyErrors`] once `max_errors` is
    /// exceeded.
    fn report_lexical_error(&mut self, token: &Token<'static>) -> Result<(), ParserError> {
        let error = ParseError::new(
            ErrorCode::UNKNOWN_CHARACTER,
            token.position,
            "unrecognized byte",
        )
        .with_token(token.clone());
        self.emit_infallible(Event::Error { error: error.clone() });
        self.reporter.report(error)
    }

    /// Skips tokens until the next token is either a configured sync token
    /// or a token with a transition from the current state.
    fn synchronize(&mut self) -> Result<(), ParserError> {
        loop {
            let next = self
                .tokenizer
                .next_token(&mut self.stream)
                .map_err(|e| self.fatal_stream_error(e))?;
            match next {
                None => {
                    let error = ParseError::new(
                        ErrorCode::UNEXPECTED_END_OF_INPUT,
                        self.stream.position(),
                        "unexpected end of input during error recovery",
                    );
                    self.emit_infallible(Event::Error { error: error.clone() });
                    return self.reporter.report(error);
                }
                Some(token) if token.is_error() => {
                    self.report_lexical_error(&token)?;
                }
                Some(token)
                    if self.machine.is_sync_point(token.kind.id)
                        || self.machine.try_transition(token.kind.id) =>
                {
                    return self.dispatch(token);
                }
                Some(_) => continue,
            }
        }
    }

    fn emit_infallible(&mut self, event: Event<'a>) {
        // Handler errors during document-boundary/error events are recorded
        // as internal errors rather than unwinding the drive loop; a handler
        // that truly needs to abort the parse should do so via its own
        // side-channel checked between `process_chunk` calls.
        if let Err(err) = self.emitter.emit(event) {
            let _ = self.reporter.report(err);
        }
    }

    fn fatal_stream_error(&mut self, error: StreamError) -> ParserError {
        let err = ParseError::new(
            ErrorCode::MEMORY_ERROR,
            self.stream.position(),
            error.to_string(),
        )
        .with_severity(Severity::Fatal);
        self.emit_infallible(Event::Error { error: err });
        ParserError::HasErrors { count: 1 }
    }
}

// Compile-time assertion that the owned, non-handler state a `Parser`
// carries is `Send`, so an idle parser (no action/event closures installed)
// is movable to another thread between chunks. `Parser` itself is not
// asserted `Send`: `StateMachine`'s actions and `EventEmitter`'s handler are
// `dyn Fn`/`dyn FnMut` trait objects without a `+ Send` bound, since the
// engine only promises single-threaded cooperative use per instance.
const _: () = {
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<ByteStream>();
        assert_send::<ParserContext>();
        assert_send::<ErrorReporter>();
        assert_send::<TokenKind>();
    }
};
