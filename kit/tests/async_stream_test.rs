//! Tests for the async chunk-driving wrappers around [`parsekit::Parser`].
//!
//! Gated behind the `tokio`/`futures` features so this file compiles to
//! nothing when neither is enabled.

#![cfg(any(feature = "tokio", feature = "futures"))]

use parsekit::{CharClass, GrammarBuilder, ParseConfig, ParseMode, Parser, Pattern};
use std::cell::RefCell;
use std::rc::Rc;

fn word_parser<'a>(log: Rc<RefCell<Vec<String>>>) -> Parser<'a> {
    let action_log = log.clone();
    let (rules, skip, machine) = GrammarBuilder::new()
        .token("word", Pattern::one_or_more(Pattern::Class(CharClass::AlphaLower)))
        .token("ws", Pattern::one_or_more(Pattern::Class(CharClass::Whitespace)))
        .skip("ws")
        .state("start", true)
        .transition("start", "word", "start", Some("log"))
        .action("log", move |_ctx, token| {
            action_log.borrow_mut().push(token.as_str().unwrap_or("").to_string());
            Ok(())
        })
        .build()
        .expect("grammar builds");

    let stream = parsekit::ByteStream::with_buffer(None);
    let tokenizer = parsekit::Tokenizer::new(rules, skip);
    Parser::init(stream, tokenizer, machine, ParseMode::Normal, ParseConfig::default())
}

#[cfg(feature = "tokio")]
#[tokio::test]
async fn drive_from_channel_feeds_every_chunk() {
    use parsekit::async_stream::drive_from_channel;

    let log = Rc::new(RefCell::new(Vec::new()));
    let mut parser = word_parser(log.clone());

    let (tx, rx) = tokio::sync::mpsc::channel::<Vec<u8>>(4);
    let sender = tokio::spawn(async move {
        tx.send(b"hello ".to_vec()).await.unwrap();
        tx.send(b"wor".to_vec()).await.unwrap();
        tx.send(b"ld".to_vec()).await.unwrap();
    });

    drive_from_channel(&mut parser, rx).await.unwrap();
    sender.await.unwrap();

    assert_eq!(*log.borrow(), vec!["hello", "world"]);
}

#[cfg(feature = "tokio")]
#[tokio::test]
async fn drive_from_channel_stops_cleanly_when_sender_drops() {
    use parsekit::async_stream::drive_from_channel;

    let log = Rc::new(RefCell::new(Vec::new()));
    let mut parser = word_parser(log.clone());

    let (tx, rx) = tokio::sync::mpsc::channel::<Vec<u8>>(1);
    tx.send(b"solo".to_vec()).await.unwrap();
    drop(tx);

    drive_from_channel(&mut parser, rx).await.unwrap();
    assert_eq!(*log.borrow(), vec!["solo"]);
}

#[cfg(feature = "futures")]
struct VecStream {
    chunks: std::collections::VecDeque<Vec<u8>>,
}

#[cfg(feature = "futures")]
impl futures_core::Stream for VecStream {
    type Item = Vec<u8>;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        let this = self.get_mut();
        std::task::Poll::Ready(this.chunks.pop_front())
    }
}

#[cfg(feature = "futures")]
#[tokio::test]
async fn drive_from_stream_feeds_every_item() {
    use parsekit::async_stream::drive_from_stream;

    let log = Rc::new(RefCell::new(Vec::new()));
    let mut parser = word_parser(log.clone());

    let stream = VecStream {
        chunks: vec![b"foo ".to_vec(), b"bar".to_vec()].into(),
    };

    drive_from_stream(&mut parser, stream).await.unwrap();
    assert_eq!(*log.borrow(), vec!["foo", "bar"]);
}
