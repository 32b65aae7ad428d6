//! Corpus records and writers
//!
//! A corpus file is `{ "dialogs": [...], "meta": <domain spec> }`. System
//! turns carry lexicalized acts and a tracker snapshot; user turns carry
//! the noisy symbolic acts and the channel confidence. The plain-text mode
//! writes one readable block per dialog instead.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use dialog_sim_core::action::{LexAct, UserAct};
use dialog_sim_core::summary::StateSummary;
use dialog_sim_domain::DomainSpec;

use crate::GeneratorError;

/// One transcript turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "speaker")]
pub enum TurnRecord {
    #[serde(rename = "SYS")]
    System {
        utt: String,
        actions: Vec<LexAct>,
        domain: String,
        state: StateSummary,
    },
    #[serde(rename = "USR")]
    User {
        utt: String,
        actions: Vec<UserAct>,
        conf: f64,
        domain: String,
    },
}

impl TurnRecord {
    pub fn utt(&self) -> &str {
        match self {
            TurnRecord::System { utt, .. } | TurnRecord::User { utt, .. } => utt,
        }
    }

    fn text_line(&self) -> String {
        match self {
            TurnRecord::System { utt, actions, .. } => {
                let rendered = if utt.is_empty() {
                    actions
                        .iter()
                        .map(|a| a.dump_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                } else {
                    utt.clone()
                };
                format!("SYS -> {rendered}")
            }
            TurnRecord::User {
                utt, actions, conf, ..
            } => {
                let rendered = if utt.is_empty() {
                    actions
                        .iter()
                        .map(|a| a.dump_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                } else {
                    utt.clone()
                };
                format!("USR({conf:.2})-> {rendered}")
            }
        }
    }
}

pub type Dialog = Vec<TurnRecord>;

/// A full corpus ready for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    pub dialogs: Vec<Dialog>,
    pub meta: DomainSpec,
}

impl Corpus {
    pub fn write_json(&self, path: &Path) -> Result<(), GeneratorError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_text(&self, path: &Path) -> Result<(), GeneratorError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for (idx, dialog) in self.dialogs.iter().enumerate() {
            writeln!(writer, "## DIALOG {idx} ##")?;
            for turn in dialog {
                writeln!(writer, "{}", turn.text_line())?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// Aggregate corpus statistics, logged after every run.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStats {
    pub dialog_count: usize,
    pub avg_turns: f64,
    pub max_turns: usize,
    /// Fraction of all turns carrying a database query envelope.
    pub query_turn_fraction: f64,
    /// Mean per-dialog fraction of query turns.
    pub mean_dialog_query_ratio: f64,
}

impl CorpusStats {
    pub fn compute(dialogs: &[Dialog]) -> Self {
        let dialog_count = dialogs.len();
        let mut total_turns = 0usize;
        let mut max_turns = 0usize;
        let mut query_turns = 0usize;
        let mut ratios = Vec::with_capacity(dialog_count);

        for dialog in dialogs {
            let len = dialog.len();
            total_turns += len;
            max_turns = max_turns.max(len);
            let queries = dialog
                .iter()
                .filter(|turn| turn.utt().contains("QUERY"))
                .count();
            query_turns += queries;
            if len > 0 {
                ratios.push(queries as f64 / len as f64);
            }
        }

        let avg_turns = if dialog_count > 0 {
            total_turns as f64 / dialog_count as f64
        } else {
            0.0
        };
        let query_turn_fraction = if total_turns > 0 {
            query_turns as f64 / total_turns as f64
        } else {
            0.0
        };
        let mean_dialog_query_ratio = if ratios.is_empty() {
            0.0
        } else {
            ratios.iter().sum::<f64>() / ratios.len() as f64
        };

        Self {
            dialog_count,
            avg_turns,
            max_turns,
            query_turn_fraction,
            mean_dialog_query_ratio,
        }
    }

    pub fn log(&self) {
        tracing::info!(
            dialogs = self.dialog_count,
            avg_turns = format!("{:.2}", self.avg_turns),
            max_turns = self.max_turns,
            query_fraction = format!("{:.3}", self.query_turn_fraction),
            "corpus statistics"
        );
    }
}
