//! Scenario E: error recovery via synchronization.
//!
//! Input `"123 + ) * 45"` against a toy expression grammar, normal mode,
//! with `+`/`-` configured as synchronization points. The `)` has no
//! transition from the post-operator state, so it's reported as an
//! `UnexpectedToken`; recovery then skips forward until it finds either a
//! sync token or a token the current state can actually consume, and the
//! parse continues to the end rather than aborting.

use parsekit::{CharClass, GrammarBuilder, ParseConfig, ParseMode, Parser, Pattern};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn scenario_e_recovers_past_unexpected_token_and_reaches_trailing_number() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let action_log = log.clone();

    let (rules, skip, machine) = GrammarBuilder::new()
        .token("number", Pattern::one_or_more(Pattern::Class(CharClass::Digit)))
        .token("plus", Pattern::literal("+"))
        .token("minus", Pattern::literal("-"))
        .token("star", Pattern::literal("*"))
        .token("lparen", Pattern::literal("("))
        .token("rparen", Pattern::literal(")"))
        .token("ws", Pattern::one_or_more(Pattern::Class(CharClass::Whitespace)))
        .skip("ws")
        .sync("plus")
        .sync("minus")
        // `start`: expecting an operand (a number or an opening paren).
        .state("start", true)
        .state("after_operand", false)
        .transition("start", "number", "after_operand", Some("log"))
        .transition("start", "lparen", "start", Some("log"))
        // `after_operand`: expecting an operator; no transition on `rparen`
        // here, so a stray `)` is unexpected from this state.
        .transition("after_operand", "plus", "start", Some("log"))
        .transition("after_operand", "minus", "start", Some("log"))
        .transition("after_operand", "star", "start", Some("log"))
        .action("log", move |_ctx, token| {
            action_log.borrow_mut().push(token.as_str().unwrap_or("").to_string());
            Ok(())
        })
        .build()
        .expect("grammar builds");

    let stream = parsekit::ByteStream::from_memory(b"123 + ) * 45", None);
    let tokenizer = parsekit::Tokenizer::new(rules, skip);
    let mut parser = Parser::init(stream, tokenizer, machine, ParseMode::Normal, ParseConfig::default());

    // Normal mode never re-raises recovered errors out of `parse`.
    parser.parse().expect("normal mode recovers and completes the parse");

    assert!(parser.has_errors());
    let errors: Vec<_> = parser.errors().collect();
    assert_eq!(errors.len(), 1, "exactly one UnexpectedToken for the stray ')'");
    assert_eq!(errors[0].code, parsekit::ErrorCode::UNEXPECTED_TOKEN);

    // "123" consumed, "+" consumed (sync token), then recovery skips ")"
    // (reported) and "*" (no transition, not a sync point either) until it
    // reaches "45", which the post-"+" `start` state can consume directly.
    assert_eq!(*log.borrow(), vec!["123", "+", "45"]);
}

#[test]
fn scenario_e_unexpected_end_of_input_during_recovery_is_reported() {
    // No number follows the stray ')', so recovery runs off the end of the
    // input without finding a sync point or a transitionable token.
    let log = Rc::new(RefCell::new(Vec::new()));
    let action_log = log.clone();

    let (rules, skip, machine) = GrammarBuilder::new()
        .token("number", Pattern::one_or_more(Pattern::Class(CharClass::Digit)))
        .token("plus", Pattern::literal("+"))
        .token("rparen", Pattern::literal(")"))
        .token("ws", Pattern::one_or_more(Pattern::Class(CharClass::Whitespace)))
        .skip("ws")
        .sync("plus")
        .state("start", true)
        .state("after_operand", false)
        .transition("start", "number", "after_operand", Some("log"))
        .transition("after_operand", "plus", "start", Some("log"))
        .action("log", move |_ctx, token| {
            action_log.borrow_mut().push(token.as_str().unwrap_or("").to_string());
            Ok(())
        })
        .build()
        .expect("grammar builds");

    let stream = parsekit::ByteStream::from_memory(b"123 )", None);
    let tokenizer = parsekit::Tokenizer::new(rules, skip);
    let mut parser = Parser::init(stream, tokenizer, machine, ParseMode::Normal, ParseConfig::default());

    parser.parse().expect("normal mode never aborts on recoverable errors");

    let errors: Vec<_> = parser.errors().collect();
    assert_eq!(errors.len(), 2, "the stray ')' plus end-of-input during recovery");
    assert_eq!(errors[0].code, parsekit::ErrorCode::UNEXPECTED_TOKEN);
    assert_eq!(errors[1].code, parsekit::ErrorCode::UNEXPECTED_END_OF_INPUT);
    assert_eq!(*log.borrow(), vec!["123"]);
}
