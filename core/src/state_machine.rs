//! Flat, token-indexed state machine: a small per-state transition table with
//! action dispatch, driven by the [`crate::parser::Parser`].
//!
//! There is no grammar parsing (LR/LL) here — states and transitions are
//! data the caller builds (directly, or via [`crate::grammar::GrammarBuilder`]),
//! and lookup within a state is linear, since transition tables in practice
//! stay small (a handful of token kinds per state).

use crate::context::ParserContext;
use crate::token::Token;

/// One outgoing edge from a state: on seeing `token_id`, optionally run
/// `action_id`, then move to `next_state`.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub token_id: u32,
    pub next_state: u32,
    pub action_id: Option<u32>,
}

/// A single state: a stable id, a display name, and its outgoing
/// transitions.
#[derive(Debug, Clone)]
pub struct State {
    pub id: u32,
    pub name: String,
    pub transitions: Vec<Transition>,
}

/// A user-supplied action invoked on a transition: mutate the parser context
/// in response to a token.
pub type Action = Box<dyn Fn(&mut ParserContext, &Token<'_>) -> Result<(), ActionError>>;

/// An error returned by a user action, carrying a message for diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
#[error("action error: {0}")]
pub struct ActionError(pub String);

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The outcome of [`StateMachine::transition`].
#[derive(Debug)]
pub enum TransitionOutcome {
    /// The transition succeeded; the machine's current state advanced.
    Ok,
    /// No transition matched the token from the current state.
    UnexpectedToken {
        state_id: u32,
        state_name: String,
        expected: Vec<u32>,
    },
}

/// A flat token-indexed transition table plus action dispatch.
pub struct StateMachine {
    states: Vec<State>,
    actions: Vec<Action>,
    sync_tokens: Vec<u32>,
    current_state: u32,
    initial_state: u32,
}

impl StateMachine {
    pub fn new(states: Vec<State>, actions: Vec<Action>, sync_tokens: Vec<u32>, initial_state: u32) -> Self {
        Self {
            states,
            actions,
            sync_tokens,
            current_state: initial_state,
            initial_state,
        }
    }

    // `current_state`/`initial_state` are only ever set from ids the
    // constructor or a transition table already validated, so lookup here
    // never misses.
    #[allow(clippy::expect_used)]
    fn state(&self, id: u32) -> &State {
        self.states
            .iter()
            .find(|s| s.id == id)
            .expect("state id is valid by construction")
    }

    pub fn current_state(&self) -> u32 {
        self.current_state
    }

    /// Attempts to consume `token` from the current state. On a matching
    /// transition, runs the associated action (if any) and advances state.
    /// On no match, returns `UnexpectedToken` without advancing — the
    /// caller (the [`crate::parser::Parser`]) decides how to recover based
    /// on its parse mode.
    pub fn transition(
        &mut self,
        token: &Token<'_>,
        ctx: &mut ParserContext,
    ) -> Result<TransitionOutcome, ActionError> {
        let state = self.state(self.current_state);
        let found = state
            .transitions
            .iter()
            .find(|t| t.token_id == token.kind.id)
            .copied();

        match found {
            Some(t) => {
                if let Some(action_id) = t.action_id {
                    (self.actions[action_id as usize])(ctx, token)?;
                }
                self.current_state = t.next_state;
                Ok(TransitionOutcome::Ok)
            }
            None => {
                let expected = state.transitions.iter().map(|t| t.token_id).collect();
                Ok(TransitionOutcome::UnexpectedToken {
                    state_id: state.id,
                    state_name: state.name.clone(),
                    expected,
                })
            }
        }
    }

    /// Probes whether `token` would transition from the current state,
    /// without reporting an error or running its action. Used by recovery.
    pub fn try_transition(&self, token_id: u32) -> bool {
        self.state(self.current_state)
            .transitions
            .iter()
            .any(|t| t.token_id == token_id)
    }

    /// True iff `token_id` is a configured synchronization point.
    pub fn is_sync_point(&self, token_id: u32) -> bool {
        self.sync_tokens.contains(&token_id)
    }

    /// Restores the current state to `initial_id`. Error counters (owned by
    /// the [`crate::error::ErrorReporter`], not the state machine) are left
    /// intact.
    pub fn reset(&mut self, initial_id: u32) {
        self.current_state = initial_id;
    }

    /// Resets to the state machine's originally-configured initial state.
    pub fn reset_to_initial(&mut self) {
        self.current_state = self.initial_state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(id: u32) -> Token<'static> {
        Token::owned(
            crate::token::TokenKind::new(id, "t"),
            crate::position::Position::new(),
            vec![],
        )
    }

    fn simple_machine() -> StateMachine {
        let states = vec![
            State {
                id: 0,
                name: "start".into(),
                transitions: vec![Transition {
                    token_id: 1,
                    next_state: 1,
                    action_id: None,
                }],
            },
            State {
                id: 1,
                name: "end".into(),
                transitions: vec![],
            },
        ];
        StateMachine::new(states, vec![], vec![99], 0)
    }

    #[test]
    fn matching_transition_advances_state() {
        let mut m = simple_machine();
        let mut ctx = ParserContext::new();
        let outcome = m.transition(&token(1), &mut ctx).unwrap();
        assert!(matches!(outcome, TransitionOutcome::Ok));
        assert_eq!(m.current_state(), 1);
    }

    #[test]
    fn unmatched_token_reports_expected_set() {
        let mut m = simple_machine();
        let mut ctx = ParserContext::new();
        let outcome = m.transition(&token(2), &mut ctx).unwrap();
        match outcome {
            TransitionOutcome::UnexpectedToken { expected, .. } => {
                assert_eq!(expected, vec![1]);
            }
            _ => panic!("expected UnexpectedToken"),
        }
        assert_eq!(m.current_state(), 0, "state must not advance on mismatch");
    }

    #[test]
    fn try_transition_does_not_mutate_state() {
        let m = simple_machine();
        assert!(m.try_transition(1));
        assert!(!m.try_transition(2));
        assert_eq!(m.current_state(), 0);
    }

    #[test]
    fn is_sync_point_checks_configured_set() {
        let m = simple_machine();
        assert!(m.is_sync_point(99));
        assert!(!m.is_sync_point(1));
    }

    #[test]
    fn action_runs_before_state_advances_are_observed() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let log = Rc::new(RefCell::new(Vec::new()));
        let log2 = log.clone();
        let states = vec![
            State {
                id: 0,
                name: "start".into(),
                transitions: vec![Transition {
                    token_id: 1,
                    next_state: 1,
                    action_id: Some(0),
                }],
            },
            State {
                id: 1,
                name: "end".into(),
                transitions: vec![],
            },
        ];
        let action: Action = Box::new(move |_ctx, tok| {
            log2.borrow_mut().push(tok.kind.id);
            Ok(())
        });
        let mut m = StateMachine::new(states, vec![action], vec![], 0);
        let mut ctx = ParserContext::new();
        m.transition(&token(1), &mut ctx).unwrap();
        assert_eq!(*log.borrow(), vec![1]);
    }
}
