//! Thin foreign-function shim over [`crate::parser::Parser`].
//!
//! This is deliberately *not* the core: it is a handle-based wrapper so a
//! caller across a C ABI boundary can hold an opaque integer instead of a
//! Rust reference, plus a `#[repr(C)]` result/error-code struct and a C
//! callback type for events. Building a grammar (tokens/states/transitions)
//! is still a Rust-side concern — [`crate::grammar::GrammarBuilder`] has no
//! C-safe representation of [`crate::pattern::Pattern`] to hand across the
//! boundary; concrete format front-ends are expected to build their grammar
//! in Rust and stay external collaborators with their own language
//! bindings. `create` here
//! takes an already-built [`crate::tokenizer::Tokenizer`] +
//! [`crate::state_machine::StateMachine`] pair (typically assembled by a
//! front-end crate compiled against this one) and exposes only lifecycle,
//! parsing, and diagnostics across the boundary.
//!
//! The registry is the one piece of shared mutable state in the whole
//! engine (the core library itself needs none of this): a mutex-guarded map
//! keyed by an atomically-assigned id, per the design notes' "global state
//! and handle registry" guidance.

#![allow(unsafe_code)]

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::config::ParseConfig;
use crate::emitter::Event;
use crate::parser::{ParseMode, Parser};
use crate::state_machine::StateMachine;
use crate::stream::ByteStream;
use crate::tokenizer::Tokenizer;

/// Numeric error codes surfaced across the FFI boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Unknown = 1,
    OutOfMemory = 2,
    Io = 3,
    Eof = 4,
    InvalidHandle = 5,
    InvalidArgument = 6,
    InvalidState = 7,
    UnexpectedToken = 8,
    ParserConfig = 9,
    NotImplemented = 10,
}

/// A result-and-error-code struct returned by every shim entry point.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiResult {
    pub code: FfiErrorCode,
}

impl FfiResult {
    const OK: Self = Self {
        code: FfiErrorCode::Ok,
    };

    const fn err(code: FfiErrorCode) -> Self {
        Self { code }
    }
}

/// Event kinds passed to the C callback's `event_type` field. Mirrors
/// [`crate::emitter::Event`] but as a flat, C-representable tag.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiEventType {
    StartDocument = 0,
    EndDocument = 1,
    StartElement = 2,
    EndElement = 3,
    Value = 4,
    Error = 5,
}

/// `(event_type, data_ptr, data_len, user_ctx)` — `data_ptr`/`data_len`
/// describe a UTF-8-or-raw-bytes payload valid only for the duration of the
/// call (an element name, a value's matched text, or an error message).
pub type FfiEventCallback =
    extern "C" fn(event_type: u32, data_ptr: *const u8, data_len: usize, user_ctx: *mut c_void);

struct Handle {
    parser: Parser<'static>,
}

fn registry() -> &'static Mutex<HashMap<u64, Handle>> {
    static REGISTRY: OnceLock<Mutex<HashMap<u64, Handle>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Locks the handle registry, recovering the inner map rather than
/// propagating a poison error — one FFI caller's panicking callback should
/// not permanently brick every other handle sharing the process-wide table.
fn lock_registry() -> MutexGuard<'static, HashMap<u64, Handle>> {
    registry().lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn next_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Creates a parser over an in-memory buffer, driven by an
/// already-constructed `tokenizer`/`machine` pair, and returns an opaque
/// handle. Call [`parsekit_destroy`] exactly once to release it.
pub fn parsekit_create(
    source: &[u8],
    tokenizer: Tokenizer,
    machine: StateMachine,
    mode: ParseMode,
) -> u64 {
    let stream = ByteStream::from_memory(source, None);
    let parser = Parser::init(stream, tokenizer, machine, mode, ParseConfig::default());
    let id = next_id();
    lock_registry().insert(id, Handle { parser });
    id
}

/// Registers a C event callback for `handle`. `user_ctx` is passed back
/// verbatim on every invocation; the caller owns its lifetime.
pub fn parsekit_set_event_callback(
    handle: u64,
    callback: FfiEventCallback,
    user_ctx: *mut c_void,
) -> FfiResult {
    let mut registry = lock_registry();
    let Some(entry) = registry.get_mut(&handle) else {
        return FfiResult::err(FfiErrorCode::InvalidHandle);
    };
    entry.parser.set_event_handler(Box::new(move |event| {
        emit_to_c(callback, user_ctx as usize, &event);
        Ok(())
    }));
    FfiResult::OK
}

fn emit_to_c(callback: FfiEventCallback, user_ctx: usize, event: &Event<'_>) {
    let user_ctx = user_ctx as *mut c_void;
    match event {
        Event::StartDocument => callback(FfiEventType::StartDocument as u32, std::ptr::null(), 0, user_ctx),
        Event::EndDocument => callback(FfiEventType::EndDocument as u32, std::ptr::null(), 0, user_ctx),
        Event::StartElement { name } => {
            callback(FfiEventType::StartElement as u32, name.as_ptr(), name.len(), user_ctx)
        }
        Event::EndElement { name } => {
            callback(FfiEventType::EndElement as u32, name.as_ptr(), name.len(), user_ctx)
        }
        Event::Value { token } => callback(
            FfiEventType::Value as u32,
            token.text.as_ptr(),
            token.text.len(),
            user_ctx,
        ),
        Event::Error { error } => {
            let message = error.message.as_bytes();
            callback(FfiEventType::Error as u32, message.as_ptr(), message.len(), user_ctx)
        }
    }
}

/// Runs `handle`'s parser to exhaustion over the buffer it was created with.
pub fn parsekit_parse(handle: u64) -> FfiResult {
    let mut registry = lock_registry();
    let Some(entry) = registry.get_mut(&handle) else {
        return FfiResult::err(FfiErrorCode::InvalidHandle);
    };
    match entry.parser.parse() {
        Ok(()) => FfiResult::OK,
        Err(err) => FfiResult::err(code_for(&err)),
    }
}

fn code_for(err: &crate::error::ParserError) -> FfiErrorCode {
    match err {
        crate::error::ParserError::HasErrors { .. } => FfiErrorCode::UnexpectedToken,
        crate::error::ParserError::TooManyErrors { .. } => FfiErrorCode::UnexpectedToken,
    }
}

/// Number of diagnostics (errors + warnings) currently recorded on `handle`.
/// Returns `0` for an invalid handle rather than an error code, since the
/// count has no meaningful "error" sentinel distinct from zero.
pub fn parsekit_error_count(handle: u64) -> usize {
    lock_registry()
        .get(&handle)
        .map(|h| h.parser.errors().count())
        .unwrap_or(0)
}

/// Releases `handle`. Calling any other `parsekit_*` function with a handle
/// after it has been destroyed returns [`FfiErrorCode::InvalidHandle`]
/// rather than aborting.
pub fn parsekit_destroy(handle: u64) -> FfiResult {
    let removed = lock_registry().remove(&handle);
    match removed {
        Some(_) => FfiResult::OK,
        None => FfiResult::err(FfiErrorCode::InvalidHandle),
    }
}
