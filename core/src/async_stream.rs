//! Async incremental consumption wrappers around [`Parser::process_chunk`].
//!
//! [`Parser`] itself is fully synchronous — `process_chunk`/`finish_chunks`
//! never suspend. What an async wrapper adds is a way to *drive* a parser
//! from a byte source that itself produces chunks asynchronously: a channel
//! fed by a network task, or any `futures_core::Stream` of chunks.
//!
//! Both stages (tokenizing and state-machine dispatch) collapse into the
//! single synchronous [`Parser`] here; there is no separate async lexer
//! stage to pipeline since one state machine already drives tokenization
//! internally.
//!
//! # Backpressure and cancellation
//!
//! A bounded channel (tokio `mpsc`) provides natural backpressure: the
//! producer blocks once the channel fills. Dropping the sender half (or
//! ending the upstream `Stream`) cancels the drive loop cleanly — it calls
//! `finish_chunks` and returns.

use crate::error::ParserError;
use crate::parser::Parser;

/// Drains a channel of byte chunks into `parser`, calling `process_chunk` for
/// each chunk and `finish_chunks` once the sender half is dropped.
///
/// Returns as soon as the channel closes or `parser` reports a fatal error
/// (in which case any chunks still queued in the channel are left unread).
#[cfg(feature = "tokio")]
pub async fn drive_from_channel(
    parser: &mut Parser<'_>,
    mut chunks: tokio::sync::mpsc::Receiver<Vec<u8>>,
) -> Result<(), ParserError> {
    while let Some(chunk) = chunks.recv().await {
        parser.process_chunk(&chunk)?;
    }
    parser.finish_chunks()
}

/// Drains a [`futures_core::Stream`] of byte chunks into `parser`, the same
/// way [`drive_from_channel`] drains an `mpsc::Receiver`.
///
/// Implemented with `std::future::poll_fn` rather than a combinator crate:
/// the workspace depends only on `futures-core` (the `Stream` trait itself),
/// not `futures-util`, keeping this optional path's dependency surface
/// narrow.
#[cfg(feature = "futures")]
pub async fn drive_from_stream<S>(
    parser: &mut Parser<'_>,
    chunks: S,
) -> Result<(), ParserError>
where
    S: futures_core::Stream<Item = Vec<u8>>,
{
    use core::pin::pin;

    let mut chunks = pin!(chunks);
    loop {
        let next = core::future::poll_fn(|cx| chunks.as_mut().poll_next(cx)).await;
        match next {
            Some(chunk) => parser.process_chunk(&chunk)?,
            None => break,
        }
    }
    parser.finish_chunks()
}

// Exercised end-to-end in `kit/tests/async_stream_test.rs`, which depends on
// a full tokio runtime (`rt`, `macros`) that this crate's own optional
// `tokio` dependency deliberately does not enable (it needs only `sync`).
