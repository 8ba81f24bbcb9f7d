//! `parsekit-core`: a zero-allocation streaming lexical engine and
//! event-driven, state-machine-driven parser layer.
//!
//! The engine is organized bottom-up:
//!
//! - [`charclass`] / [`pattern`]: byte classification and the algebraic
//!   pattern matcher everything else is built on.
//! - [`stream`]: the buffered byte source (`ByteStream`), supporting both
//!   whole-input and incremental (chunked) parsing.
//! - [`token_stream`] / [`tokenizer`]: the zero-allocation and allocating
//!   tokenizer surfaces, sharing the same matching algorithm.
//! - [`state_machine`]: a flat, token-indexed transition table with action
//!   dispatch and recovery probing.
//! - [`parser`]: ties stream, tokenizer, state machine, [`emitter`], and
//!   [`error`] together behind one parse surface with four parse modes.
//! - [`grammar`]: a fluent, runtime builder that assembles tokenizer and
//!   state-machine configuration from named tokens/states/transitions.
//!
//! Everything here is single-threaded cooperative; independent
//! [`parser::Parser`] instances are fully independent and may run on
//! separate threads.

#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

pub mod charclass;
pub mod config;
pub mod context;
pub mod emitter;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod pattern;
pub mod pool;
pub mod position;
pub mod state_machine;
pub mod stream;
pub mod token;
pub mod token_stream;
pub mod tokenizer;

#[cfg(any(feature = "tokio", feature = "futures"))]
pub mod async_stream;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use charclass::CharClass;
pub use config::{ParseConfig, RecursionGuard};
pub use context::ParserContext;
pub use emitter::{Event, EventEmitter, EventHandler};
pub use error::{Error, ErrorCode, ErrorReporter, ParseError, ParserError, Severity};
pub use grammar::{GrammarBuilder, GrammarError};
pub use parser::{CompactionPolicy, ParseMode, Parser};
pub use pattern::{MatchResult, Pattern};
pub use pool::Pool;
pub use position::Position;
pub use state_machine::{Action, ActionError, State, StateMachine, Transition, TransitionOutcome};
pub use stream::{ByteStream, RingBuffer, Source, StreamError, StreamStats};
pub use token::{Token, TokenKind, ERROR_TOKEN_KIND};
pub use token_stream::{Rule, TokenStream};
pub use tokenizer::Tokenizer;
