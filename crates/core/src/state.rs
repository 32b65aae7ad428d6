//! Turn-taking primitives
//!
//! Both agents keep an append-only history of whole turns and a small floor
//! state machine: an agent SPEAKs until its policy yields the floor, then
//! LISTENs until the other side's turn arrives, and EXITs when the session
//! is over.

use serde::{Deserialize, Serialize};

use crate::action::{SysAct, UserAct};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Speaker {
    Sys,
    Usr,
}

/// Floor state for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpkState {
    Speak,
    Listen,
    Exit,
}

/// The acts of one recorded turn.
#[derive(Debug, Clone)]
pub enum TurnActs {
    Sys(Vec<SysAct>),
    Usr(Vec<UserAct>),
}

/// Append-only dialog history. Acts are cloned on insert; nothing recorded
/// here is ever mutated.
#[derive(Debug, Clone, Default)]
pub struct History {
    turns: Vec<(Speaker, TurnActs)>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn push_sys(&mut self, acts: &[SysAct]) {
        self.turns.push((Speaker::Sys, TurnActs::Sys(acts.to_vec())));
    }

    pub fn push_usr(&mut self, acts: &[UserAct]) {
        self.turns.push((Speaker::Usr, TurnActs::Usr(acts.to_vec())));
    }

    /// The most recent user turn, if any.
    pub fn last_usr(&self) -> Option<&[UserAct]> {
        self.turns.iter().rev().find_map(|(spk, acts)| match (spk, acts) {
            (Speaker::Usr, TurnActs::Usr(acts)) => Some(acts.as_slice()),
            _ => None,
        })
    }

    /// The most recent system turn, if any.
    pub fn last_sys(&self) -> Option<&[SysAct]> {
        self.turns.iter().rev().find_map(|(spk, acts)| match (spk, acts) {
            (Speaker::Sys, TurnActs::Sys(acts)) => Some(acts.as_slice()),
            _ => None,
        })
    }
}
