//! Runtime slot view
//!
//! A [`Slot`] is a declared slot with its surface template pools attached
//! and its name prefixed with `#`. All template draws go through the
//! session RNG.

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::Rng;

use dialog_sim_core::action::SlotValue;
use dialog_sim_core::error::{Result, SimError};

#[derive(Debug, Clone)]
pub struct Slot {
    /// "#"-prefixed slot name.
    pub name: String,
    pub description: String,
    pub vocabulary: Vec<String>,
    pub informs: Vec<String>,
    pub requests: Vec<String>,
    pub yn_questions: IndexMap<String, Vec<String>>,
}

impl Slot {
    pub fn new(name: String, description: String, vocabulary: Vec<String>) -> Self {
        Self {
            name,
            description,
            vocabulary,
            informs: Vec::new(),
            requests: Vec::new(),
            yn_questions: IndexMap::new(),
        }
    }

    /// Vocabulary size.
    pub fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    /// The word a value index denotes.
    pub fn word(&self, index: usize) -> Option<&str> {
        self.vocabulary.get(index).map(|word| word.as_str())
    }

    /// A request template, drawn uniformly.
    pub fn sample_request(&self, rng: &mut StdRng) -> Result<&str> {
        sample_pool(rng, &self.requests).ok_or_else(|| SimError::MissingTemplate {
            slot: self.name.clone(),
            kind: "request",
        })
    }

    /// An inform template with the value substituted.
    pub fn sample_inform(&self, rng: &mut StdRng, index: usize) -> Result<String> {
        let template = sample_pool(rng, &self.informs).ok_or_else(|| SimError::MissingTemplate {
            slot: self.name.clone(),
            kind: "inform",
        })?;
        let word = self.word(index).ok_or_else(|| SimError::UnknownSlot(format!(
            "{} has no value {index}",
            self.name
        )))?;
        Ok(template.replacen("{}", word, 1))
    }

    /// A yes/no question probing for the given verbalized value.
    pub fn sample_yn_question(&self, rng: &mut StdRng, expected_word: &str) -> Result<&str> {
        self.yn_questions
            .get(expected_word)
            .and_then(|pool| sample_pool(rng, pool))
            .ok_or_else(|| SimError::MissingTemplate {
                slot: self.name.clone(),
                kind: "yn_question",
            })
    }

    /// Whether a yes/no probe exists for the given value index.
    pub fn has_yn_question(&self, index: usize) -> bool {
        self.word(index)
            .and_then(|word| self.yn_questions.get(word))
            .map(|pool| !pool.is_empty())
            .unwrap_or(false)
    }

    /// A value different from the given one: either "don't care" or any
    /// other index. For a `None` input any concrete index qualifies. With a
    /// one-word vocabulary the only different answer is "don't care".
    pub fn sample_different(&self, rng: &mut StdRng, value: SlotValue) -> SlotValue {
        match value {
            None => Some(rng.gen_range(0..self.dim())),
            Some(current) => {
                let mut choices: Vec<SlotValue> = vec![None];
                choices.extend((0..self.dim()).filter(|i| *i != current).map(Some));
                choices[rng.gen_range(0..choices.len())]
            }
        }
    }
}

fn sample_pool<'a>(rng: &mut StdRng, pool: &'a [String]) -> Option<&'a str> {
    if pool.is_empty() {
        None
    } else {
        Some(pool[rng.gen_range(0..pool.len())].as_str())
    }
}
