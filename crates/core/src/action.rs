//! Symbolic dialog acts
//!
//! Acts are what actually travels between the two agents; utterances are a
//! rendering of them. Values are indices into the owning slot's vocabulary,
//! with `None` standing for "don't care" throughout.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A slot value: an index into the slot vocabulary, or `None` = don't care.
pub type SlotValue = Option<usize>;

/// A constraint vector paired with slot names, in user-slot order.
pub type Constraints = Vec<(String, SlotValue)>;

/// A delivered goal value together with the value the user expected, if the
/// goal was raised as a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalAnswer {
    pub value: SlotValue,
    pub expected: SlotValue,
}

/// Acts the system can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "act", rename_all = "snake_case")]
pub enum SysAct {
    Greet,
    Goodbye,
    /// Ask the user for a slot value. The slot may be a user slot or one of
    /// the `#need` / `#happy` meta-slots.
    Request { slot: String },
    /// "I believe you said X."; grounding that does not demand an answer.
    ImplicitConfirm { slot: String, value: SlotValue },
    /// "Do you mean X?"; grounding that requires a yes/no answer.
    ExplicitConfirm { slot: String, value: SlotValue },
    /// Deliver goal values for a constraint set previously returned by the
    /// user's knowledge-base lookup.
    Inform {
        constraints: Constraints,
        goals: IndexMap<String, GoalAnswer>,
    },
    /// Ask the user to run a database lookup on the grounded constraints.
    Query {
        constraints: Constraints,
        goals: Vec<String>,
    },
    AskRepeat,
    AskRephrase,
    Clarify,
}

impl SysAct {
    /// Wire name of the act, matching its serialized `act` tag.
    pub fn name(&self) -> &'static str {
        match self {
            SysAct::Greet => "greet",
            SysAct::Goodbye => "goodbye",
            SysAct::Request { .. } => "request",
            SysAct::ImplicitConfirm { .. } => "implicit_confirm",
            SysAct::ExplicitConfirm { .. } => "explicit_confirm",
            SysAct::Inform { .. } => "inform",
            SysAct::Query { .. } => "query",
            SysAct::AskRepeat => "ask_repeat",
            SysAct::AskRephrase => "ask_rephrase",
            SysAct::Clarify => "clarify",
        }
    }
}

/// Acts the user can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "act", rename_all = "snake_case")]
pub enum UserAct {
    Greet,
    Goodbye,
    /// State a constraint value. `self_correct` marks the act for a spoken
    /// self-correction; `again` marks a re-emission after an ask-rephrase.
    Inform {
        slot: String,
        value: SlotValue,
        #[serde(default, skip_serializing_if = "is_false")]
        self_correct: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        again: bool,
    },
    /// Ask for a system slot (a goal).
    Request {
        slot: String,
        #[serde(default, skip_serializing_if = "is_false")]
        again: bool,
    },
    Confirm {
        slot: String,
        value: SlotValue,
        #[serde(default, skip_serializing_if = "is_false")]
        again: bool,
    },
    Disconfirm {
        slot: String,
        value: SlotValue,
        #[serde(default, skip_serializing_if = "is_false")]
        again: bool,
    },
    /// Probe a goal for a specific expected value.
    YnQuestion {
        slot: String,
        value: usize,
        #[serde(default, skip_serializing_if = "is_false")]
        again: bool,
    },
    /// All listed goals are answered and the user is done.
    Satisfy { goals: Vec<String> },
    /// The listed goals are answered but more remain.
    MoreRequest { goals: Vec<String> },
    /// Drop the current search and start over with changed constraints.
    NewSearch,
    /// Result of the database lookup the system asked for.
    KbReturn {
        query: Constraints,
        results: IndexMap<String, usize>,
    },
    Chat,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl UserAct {
    pub fn inform(slot: impl Into<String>, value: SlotValue) -> Self {
        UserAct::Inform {
            slot: slot.into(),
            value,
            self_correct: false,
            again: false,
        }
    }

    pub fn request(slot: impl Into<String>) -> Self {
        UserAct::Request {
            slot: slot.into(),
            again: false,
        }
    }

    pub fn confirm(slot: impl Into<String>, value: SlotValue) -> Self {
        UserAct::Confirm {
            slot: slot.into(),
            value,
            again: false,
        }
    }

    pub fn disconfirm(slot: impl Into<String>, value: SlotValue) -> Self {
        UserAct::Disconfirm {
            slot: slot.into(),
            value,
            again: false,
        }
    }

    pub fn yn_question(slot: impl Into<String>, value: usize) -> Self {
        UserAct::YnQuestion {
            slot: slot.into(),
            value,
            again: false,
        }
    }

    /// Wire name of the act, matching its serialized `act` tag.
    pub fn name(&self) -> &'static str {
        match self {
            UserAct::Greet => "greet",
            UserAct::Goodbye => "goodbye",
            UserAct::Inform { .. } => "inform",
            UserAct::Request { .. } => "request",
            UserAct::Confirm { .. } => "confirm",
            UserAct::Disconfirm { .. } => "disconfirm",
            UserAct::YnQuestion { .. } => "yn_question",
            UserAct::Satisfy { .. } => "satisfy",
            UserAct::MoreRequest { .. } => "more_request",
            UserAct::NewSearch => "new_search",
            UserAct::KbReturn { .. } => "kb_return",
            UserAct::Chat => "chat",
        }
    }

    /// Tag the act as a rephrase re-emission. Acts without content keep
    /// their shape.
    pub fn mark_again(&mut self) {
        match self {
            UserAct::Inform { again, .. }
            | UserAct::Request { again, .. }
            | UserAct::Confirm { again, .. }
            | UserAct::Disconfirm { again, .. }
            | UserAct::YnQuestion { again, .. } => *again = true,
            _ => {}
        }
    }

    /// Compact `<act>:<p0>-<p1>-…` rendering for the plain-text corpus mode.
    pub fn dump_string(&self) -> String {
        let params: Vec<String> = match self {
            UserAct::Inform { slot, value, .. }
            | UserAct::Confirm { slot, value, .. }
            | UserAct::Disconfirm { slot, value, .. } => {
                vec![slot.clone(), fmt_value(*value)]
            }
            UserAct::Request { slot, .. } => vec![slot.clone(), "none".into()],
            UserAct::YnQuestion { slot, value, .. } => {
                vec![slot.clone(), value.to_string()]
            }
            UserAct::Satisfy { goals } | UserAct::MoreRequest { goals } => goals.clone(),
            UserAct::KbReturn { results, .. } => results
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect(),
            _ => Vec::new(),
        };
        format!("{}:{}", self.name(), params.join("-"))
    }
}

fn fmt_value(value: SlotValue) -> String {
    match value {
        Some(idx) => idx.to_string(),
        None => "none".into(),
    }
}

/// A lexicalized act: the wire act name plus parameters with vocabulary
/// indices replaced by the words they denote. This is what the corpus
/// records for system turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexAct {
    pub act: String,
    pub parameters: Vec<serde_json::Value>,
}

impl LexAct {
    pub fn new(act: impl Into<String>, parameters: Vec<serde_json::Value>) -> Self {
        Self {
            act: act.into(),
            parameters,
        }
    }

    /// Compact `<act>:<p0>-<p1>-…` rendering for the plain-text corpus mode.
    pub fn dump_string(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| match p {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        format!("{}:{}", self.act, params.join("-"))
    }
}
