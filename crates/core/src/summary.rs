//! Per-turn system state summaries
//!
//! Every system turn in the corpus carries a snapshot of the tracker:
//! the strongest hypothesis per user slot and the status of each goal.
//! Values are verbalized so the corpus is readable without the vocabulary.

use serde::{Deserialize, Serialize};

/// Strongest hypothesis for one user slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSummary {
    pub name: String,
    pub max_conf: f64,
    /// Verbalized max-confidence value; `None` when nothing has been heard
    /// or the strongest hypothesis is "don't care".
    pub max_val: Option<String>,
}

/// Status of one system goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSummary {
    pub name: String,
    pub delivered: bool,
    pub value: Option<String>,
    pub expected: Option<String>,
    pub conf: f64,
}

/// Snapshot of the system tracker taken right after a state update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    pub usr_slots: Vec<SlotSummary>,
    pub sys_goals: Vec<GoalSummary>,
    /// True when a knowledge-base return is waiting to be delivered in the
    /// turn this summary belongs to.
    pub kb_update: bool,
}
