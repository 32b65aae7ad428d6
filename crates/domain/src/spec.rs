//! Declarative domain specification
//!
//! Specs are plain serializable data; the whole spec is dumped verbatim
//! into each corpus file as its `meta` block. Slot names here are bare
//! ("loc", "price"); the runtime prefixes them with `#`. Surface templates
//! use `{}` as the value placeholder.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One declared slot: name, human description, and a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub name: String,
    pub description: String,
    pub vocabulary: Vec<String>,
}

impl SlotSpec {
    pub fn new(name: &str, description: &str, vocabulary: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            vocabulary: vocabulary.iter().map(|word| word.to_string()).collect(),
        }
    }
}

/// Surface templates for one slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NlgBundle {
    /// Statements carrying a value ("I am at {}.").
    #[serde(default)]
    pub inform: Vec<String>,
    /// Questions asking for the value.
    #[serde(default)]
    pub request: Vec<String>,
    /// Yes/no probes keyed by the verbalized value they expect.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub yn_question: IndexMap<String, Vec<String>>,
}

impl NlgBundle {
    pub fn new(inform: &[&str], request: &[&str]) -> Self {
        Self {
            inform: inform.iter().map(|t| t.to_string()).collect(),
            request: request.iter().map(|t| t.to_string()).collect(),
            yn_question: IndexMap::new(),
        }
    }

    pub fn with_yn(mut self, value: &str, questions: &[&str]) -> Self {
        self.yn_question.insert(
            value.to_string(),
            questions.iter().map(|q| q.to_string()).collect(),
        );
        self
    }
}

/// A complete domain declaration.
///
/// The `nlg` map is keyed by bare slot name; the reserved key `"default"`
/// carries templates for the synthetic database-entry slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSpec {
    pub name: String,
    pub greet: String,
    pub usr_slots: Vec<SlotSpec>,
    pub sys_slots: Vec<SlotSpec>,
    #[serde(rename = "nlg_spec")]
    pub nlg: IndexMap<String, NlgBundle>,
    pub db_size: usize,
}
