//! Fluent, runtime construction of tokenizer + state-machine configs by
//! name.
//!
//! This is a deliberate divergence from a macro-generated grammar: names
//! (`"ident"`, `"start"`, `"shift"`) are resolved into stable integer ids at
//! `build()` time, so the grammar can be assembled at runtime from data the
//! caller doesn't know until the program is running (e.g. a grammar loaded
//! from a config file). Callers who want compile-time checking can still get
//! it by wrapping this builder behind their own `const`-friendly API; the
//! engine itself only promises the runtime contract described here.

use std::collections::HashMap;

use crate::context::ParserContext;
use crate::pattern::Pattern;
use crate::state_machine::{Action, ActionError, State, StateMachine, Transition};
use crate::token::{Token, TokenKind};
use crate::token_stream::Rule;

/// Errors raised while building or resolving a grammar.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GrammarError {
    #[error("unknown token name: {0}")]
    UnknownToken(String),
    #[error("unknown state name: {0}")]
    UnknownState(String),
    #[error("unknown action name: {0}")]
    UnknownAction(String),
    #[error("no initial state configured")]
    NoInitialState,
}

/// Fluent builder: `state.on(token).to(next).action(name)`, assigning stable
/// ids to every named token/state/action as they are declared.
#[derive(Default)]
pub struct GrammarBuilder {
    token_order: Vec<String>,
    token_patterns: HashMap<String, Pattern>,
    skip: Vec<String>,
    sync: Vec<String>,
    state_order: Vec<String>,
    state_transitions: HashMap<String, Vec<(String, String, Option<String>)>>,
    actions: HashMap<String, Action>,
    initial_state: Option<String>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a token kind and the pattern that recognizes it. Declaration
    /// order is match priority order (first-declared wins).
    pub fn token(mut self, name: impl Into<String>, pattern: Pattern) -> Self {
        let name = name.into();
        if !self.token_patterns.contains_key(&name) {
            self.token_order.push(name.clone());
        }
        self.token_patterns.insert(name, pattern);
        self
    }

    /// Marks a declared token kind as skipped (matched but not delivered to
    /// the state machine).
    pub fn skip(mut self, name: impl Into<String>) -> Self {
        self.skip.push(name.into());
        self
    }

    /// Marks a declared token kind as a synchronization point for recovery.
    pub fn sync(mut self, name: impl Into<String>) -> Self {
        self.sync.push(name.into());
        self
    }

    /// Declares a state by name. `initial` marks it as the parser's starting
    /// state (exactly one state should be marked initial).
    pub fn state(mut self, name: impl Into<String>, initial: bool) -> Self {
        let name = name.into();
        if !self.state_transitions.contains_key(&name) {
            self.state_order.push(name.clone());
            self.state_transitions.insert(name.clone(), Vec::new());
        }
        if initial {
            self.initial_state = Some(name);
        }
        self
    }

    /// Adds a transition from `from_state` on `token` to `to_state`,
    /// optionally dispatching `action` (registered separately via
    /// [`GrammarBuilder::action`]).
    pub fn transition(
        mut self,
        from_state: impl Into<String>,
        token: impl Into<String>,
        to_state: impl Into<String>,
        action: Option<&str>,
    ) -> Self {
        let from_state = from_state.into();
        self.state_transitions
            .entry(from_state)
            .or_default()
            .push((token.into(), to_state.into(), action.map(str::to_string)));
        self
    }

    /// Registers a named action callback, to be referenced by
    /// [`GrammarBuilder::transition`].
    pub fn action(
        mut self,
        name: impl Into<String>,
        action: impl Fn(&mut ParserContext, &Token<'_>) -> Result<(), ActionError> + 'static,
    ) -> Self {
        self.actions.insert(name.into(), Box::new(action));
        self
    }

    /// Resolves all declared names into index-based runtime configs,
    /// producing a rule set (for the tokenizer) and a [`StateMachine`].
    pub fn build(mut self) -> Result<(Vec<Rule>, Vec<u32>, StateMachine), GrammarError> {
        let token_ids: HashMap<String, u32> = self
            .token_order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i as u32))
            .collect();

        let rules: Vec<Rule> = self
            .token_order
            .iter()
            .map(|name| {
                // `token_order` and `token_patterns` are always inserted together by
                // `GrammarBuilder::token`, so every declared name resolves here.
                #[allow(clippy::expect_used)]
                let pattern = self.token_patterns.remove(name).expect("declared token");
                Rule::new(TokenKind::new(token_ids[name], Box::leak(name.clone().into_boxed_str())), pattern)
            })
            .collect();

        let skip_ids = self
            .skip
            .iter()
            .map(|name| resolve(&token_ids, name, GrammarError::UnknownToken(name.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let sync_ids = self
            .sync
            .iter()
            .map(|name| resolve(&token_ids, name, GrammarError::UnknownToken(name.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let state_ids: HashMap<String, u32> = self
            .state_order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i as u32))
            .collect();

        let mut action_list = Vec::new();
        let mut action_ids = HashMap::new();
        for (name, action) in self.actions.drain() {
            action_ids.insert(name, action_list.len() as u32);
            action_list.push(action);
        }

        let mut states = Vec::new();
        for state_name in &self.state_order {
            let mut transitions = Vec::new();
            for (token_name, to_state, action_name) in
                self.state_transitions.get(state_name).cloned().unwrap_or_default()
            {
                let token_id = resolve(&token_ids, &token_name, GrammarError::UnknownToken(token_name.clone()))?;
                let next_state = resolve(&state_ids, &to_state, GrammarError::UnknownState(to_state.clone()))?;
                let action_id = match action_name {
                    Some(name) => Some(
                        *action_ids
                            .get(&name)
                            .ok_or_else(|| GrammarError::UnknownAction(name.clone()))?,
                    ),
                    None => None,
                };
                transitions.push(Transition {
                    token_id,
                    next_state,
                    action_id,
                });
            }
            states.push(State {
                id: state_ids[state_name],
                name: state_name.clone(),
                transitions,
            });
        }

        let initial = self
            .initial_state
            .as_ref()
            .and_then(|name| state_ids.get(name).copied())
            .ok_or(GrammarError::NoInitialState)?;

        let machine = StateMachine::new(states, action_list, sync_ids, initial);
        Ok((rules, skip_ids, machine))
    }
}

fn resolve(map: &HashMap<String, u32>, name: &str, err: GrammarError) -> Result<u32, GrammarError> {
    map.get(name).copied().ok_or(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charclass::CharClass;

    #[test]
    fn builds_simple_grammar() {
        let (rules, skip, mut machine) = GrammarBuilder::new()
            .token("ident", Pattern::one_or_more(Pattern::Class(CharClass::AlphaLower)))
            .token("ws", Pattern::one_or_more(Pattern::Class(CharClass::Whitespace)))
            .skip("ws")
            .state("start", true)
            .state("seen_ident", false)
            .transition("start", "ident", "seen_ident", None)
            .build()
            .unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(skip.len(), 1);
        assert_eq!(machine.current_state(), 0);
        assert!(machine.try_transition(0));
    }

    #[test]
    fn missing_initial_state_errors() {
        let result = GrammarBuilder::new()
            .token("ident", Pattern::Any)
            .state("start", false)
            .build();
        assert!(matches!(result, Err(GrammarError::NoInitialState)));
    }

    #[test]
    fn unknown_action_reference_errors() {
        let result = GrammarBuilder::new()
            .token("ident", Pattern::Any)
            .state("start", true)
            .transition("start", "ident", "start", Some("missing"))
            .build();
        assert!(matches!(result, Err(GrammarError::UnknownAction(_))));
    }
}
