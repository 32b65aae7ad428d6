//! Template surface realization
//!
//! Maps symbolic acts to text. Domain-specific wording comes from the
//! slot template pools; acts without a slot draw from the common pools
//! below. Database traffic is rendered as JSON envelopes (`QUERY`/`RET`)
//! rather than prose. The system side also returns a lexicalized copy of
//! each act for the transcript.

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::{json, Value};

use dialog_sim_core::action::{LexAct, SysAct, UserAct};
use dialog_sim_core::error::{Result, SimError};
use dialog_sim_core::meta;
use dialog_sim_domain::{Domain, Slot};

/// Shared system-side template pools, keyed by act (plus the dont-care
/// confirm specials).
static SYS_COMMON: Lazy<IndexMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    IndexMap::from([
        (
            "greet",
            vec!["Hello.", "Hi.", "Greetings.", "How are you doing?"],
        ),
        (
            "ask_repeat",
            vec!["Can you please repeat that?", "What did you say?"],
        ),
        (
            "ask_rephrase",
            vec!["Can you please rephrase that?", "Can you say it in another way?"],
        ),
        ("goodbye", vec!["Goodbye.", "See you next time."]),
        ("clarify", vec!["I didn't catch you."]),
        (
            "request#need",
            vec!["What can I do for you?", "What do you need?", "How can I help?"],
        ),
        (
            "request#happy",
            vec!["What else can I do?", "Are you happy about my answer?", "Anything else?"],
        ),
        (
            "explicit_confirm_dont_care",
            vec!["Okay, you dont_care, do you?", "You dont_care, right?"],
        ),
        (
            "implicit_confirm_dont_care",
            vec!["Okay, you dont_care.", "Alright, dont_care."],
        ),
    ])
});

const DONT_CARE_WORD: &str = "dont_care";

fn sample<'a>(rng: &mut StdRng, pool: &[&'a str]) -> &'a str {
    pool[rng.gen_range(0..pool.len())]
}

fn common(rng: &mut StdRng, key: &str) -> Result<&'static str> {
    SYS_COMMON
        .get(key)
        .map(|pool| sample(rng, pool))
        .ok_or_else(|| SimError::MissingTemplate {
            slot: key.to_string(),
            kind: "common",
        })
}

/// System-side NLG.
pub struct SysNlg {
    domain: Arc<Domain>,
}

impl SysNlg {
    pub fn new(domain: Arc<Domain>) -> Self {
        Self { domain }
    }

    fn usr_slot(&self, name: &str) -> Result<&Slot> {
        self.domain
            .usr_slot(name)
            .ok_or_else(|| SimError::UnknownSlot(name.to_string()))
    }

    fn sys_slot(&self, name: &str) -> Result<&Slot> {
        self.domain
            .sys_slot(name)
            .ok_or_else(|| SimError::UnknownSlot(name.to_string()))
    }

    /// Render one system turn. Returns the utterance and the lexicalized
    /// acts recorded in the corpus.
    pub fn generate(&self, acts: &[SysAct], rng: &mut StdRng) -> Result<(String, Vec<LexAct>)> {
        let mut sentences: Vec<String> = Vec::new();
        let mut lexicalized: Vec<LexAct> = Vec::new();

        for act in acts {
            match act {
                SysAct::Greet => {
                    sentences.push(self.domain.greet.clone());
                    lexicalized.push(LexAct::new("greet", vec![]));
                }

                SysAct::Goodbye | SysAct::AskRepeat | SysAct::AskRephrase | SysAct::Clarify => {
                    sentences.push(common(rng, act.name())?.to_string());
                    lexicalized.push(LexAct::new(act.name(), vec![]));
                }

                SysAct::Request { slot } => {
                    if slot == meta::NEED || slot == meta::HAPPY {
                        let key = format!("request{slot}");
                        sentences.push(common(rng, &key)?.to_string());
                    } else {
                        sentences.push(self.usr_slot(slot)?.sample_request(rng)?.to_string());
                    }
                    lexicalized.push(LexAct::new("request", vec![json!(slot), Value::Null]));
                }

                SysAct::ExplicitConfirm { slot, value } => match value {
                    Some(idx) => {
                        let word = self.word(slot, *idx)?;
                        sentences.push(format!("Do you mean {word}?"));
                        lexicalized.push(LexAct::new(
                            "explicit_confirm",
                            vec![json!(slot), json!(word)],
                        ));
                    }
                    None => {
                        sentences.push(common(rng, "explicit_confirm_dont_care")?.to_string());
                        lexicalized.push(LexAct::new(
                            "explicit_confirm",
                            vec![json!(slot), json!(DONT_CARE_WORD)],
                        ));
                    }
                },

                SysAct::ImplicitConfirm { slot, value } => match value {
                    Some(idx) => {
                        let word = self.word(slot, *idx)?;
                        sentences.push(format!("I believe you said {word}."));
                        lexicalized.push(LexAct::new(
                            "implicit_confirm",
                            vec![json!(slot), json!(word)],
                        ));
                    }
                    None => {
                        sentences.push(common(rng, "implicit_confirm_dont_care")?.to_string());
                        lexicalized.push(LexAct::new(
                            "implicit_confirm",
                            vec![json!(slot), json!(DONT_CARE_WORD)],
                        ));
                    }
                },

                SysAct::Query { constraints, goals } => {
                    let mut search = serde_json::Map::new();
                    for (name, value) in constraints {
                        let word = match value {
                            Some(idx) => self.word(name, *idx)?.to_string(),
                            None => DONT_CARE_WORD.to_string(),
                        };
                        search.insert(name.clone(), Value::String(word));
                    }
                    let envelope = json!({ "QUERY": search.clone(), "GOALS": goals });
                    sentences.push(envelope.to_string());
                    lexicalized.push(LexAct::new(
                        "query",
                        vec![Value::Object(search), json!(goals)],
                    ));
                }

                SysAct::Inform { goals, .. } => {
                    let mut informs: Vec<String> = Vec::new();
                    let mut goal_words = serde_json::Map::new();
                    for (name, answer) in goals {
                        let slot = self.sys_slot(name)?;
                        let idx = answer.value.ok_or_else(|| {
                            SimError::PolicyViolation(format!("informing {name} without a value"))
                        })?;
                        let word = slot.word(idx).ok_or_else(|| {
                            SimError::UnknownSlot(format!("{name} has no value {idx}"))
                        })?;
                        goal_words.insert(name.clone(), Value::String(word.to_string()));

                        let prefix = match answer.expected {
                            Some(expected) if expected == idx => "Yes, ",
                            Some(_) => "No, ",
                            None => "",
                        };
                        informs.push(format!("{prefix}{}", slot.sample_inform(rng, idx)?));
                    }
                    sentences.push(informs.join(" "));
                    lexicalized.push(LexAct::new("inform", vec![Value::Object(goal_words)]));
                }
            }
        }

        Ok((sentences.join(" "), lexicalized))
    }

    fn word(&self, slot: &str, idx: usize) -> Result<&str> {
        let slot_ref = self
            .domain
            .usr_slot(slot)
            .or_else(|| self.domain.sys_slot(slot))
            .ok_or_else(|| SimError::UnknownSlot(slot.to_string()))?;
        slot_ref
            .word(idx)
            .ok_or_else(|| SimError::UnknownSlot(format!("{slot} has no value {idx}")))
    }
}

/// User-side NLG.
pub struct UserNlg {
    domain: Arc<Domain>,
}

impl UserNlg {
    pub fn new(domain: Arc<Domain>) -> Self {
        Self { domain }
    }

    /// Render one (noisy) user turn.
    pub fn generate(&self, acts: &[UserAct], rng: &mut StdRng) -> Result<String> {
        let mut sentences: Vec<String> = Vec::new();

        for act in acts {
            match act {
                UserAct::Greet => {
                    sentences.push(sample(rng, &["Hi.", "Hello robot.", "What's up?"]).into());
                }
                UserAct::Goodbye => {
                    sentences.push(sample(rng, &["That's all.", "Thank you.", "See you."]).into());
                }
                UserAct::Confirm { .. } => {
                    sentences.push(
                        sample(rng, &["Yes.", "Yep.", "Yeah.", "That's correct.", "Uh-huh."])
                            .into(),
                    );
                }
                UserAct::Disconfirm { .. } => {
                    sentences.push(
                        sample(rng, &["No.", "Nope.", "Wrong.", "That's wrong.", "Nay."]).into(),
                    );
                }
                UserAct::Satisfy { .. } => {
                    sentences.push(
                        sample(rng, &["No more questions.", "I have all I need.", "All good."])
                            .into(),
                    );
                }
                UserAct::MoreRequest { .. } => {
                    sentences.push(
                        sample(rng, &["I have more requests.", "One more thing.", "Not done yet."])
                            .into(),
                    );
                }
                UserAct::NewSearch => {
                    sentences.push(
                        sample(rng, &["I want to search a new one.", "New request.", "A new search."])
                            .into(),
                    );
                }
                UserAct::Chat => {
                    sentences
                        .push(sample(rng, &["What's your name?", "Where are you from?"]).into());
                }

                UserAct::Request { slot, .. } => {
                    let target = self
                        .domain
                        .sys_slot(slot)
                        .ok_or_else(|| SimError::UnknownSlot(slot.to_string()))?;
                    sentences.push(target.sample_request(rng)?.to_string());
                }

                UserAct::Inform {
                    slot,
                    value,
                    self_correct,
                    ..
                } => {
                    let target = self
                        .domain
                        .usr_slot(slot)
                        .ok_or_else(|| SimError::UnknownSlot(slot.to_string()))?;
                    let rendered = render_inform(target, *value, rng)?;
                    if *self_correct {
                        let wrong = target.sample_different(rng, *value);
                        let wrong_utt = render_inform(target, wrong, rng)?;
                        let connector = sample(rng, &["Oh no,", "Uhm sorry,", "Oh sorry,"]);
                        sentences.push(format!("{wrong_utt} {connector} {rendered}"));
                    } else {
                        sentences.push(rendered);
                    }
                }

                UserAct::YnQuestion { slot, value, .. } => {
                    let target = self
                        .domain
                        .sys_slot(slot)
                        .ok_or_else(|| SimError::UnknownSlot(slot.to_string()))?;
                    let word = target.word(*value).ok_or_else(|| {
                        SimError::UnknownSlot(format!("{slot} has no value {value}"))
                    })?;
                    let word = word.to_string();
                    sentences.push(target.sample_yn_question(rng, &word)?.to_string());
                }

                UserAct::KbReturn { results, .. } => {
                    let mut ret = serde_json::Map::new();
                    for (name, value) in results {
                        let word = self
                            .domain
                            .sys_slot(name)
                            .and_then(|slot| slot.word(*value))
                            .ok_or_else(|| SimError::UnknownSlot(name.to_string()))?;
                        ret.insert(name.clone(), Value::String(word.to_string()));
                    }
                    sentences.push(json!({ "RET": ret }).to_string());
                }
            }
        }

        Ok(sentences.join(" "))
    }
}

/// One inform rendering: a slot template for a concrete value, a
/// dont-care phrase otherwise.
fn render_inform(slot: &Slot, value: Option<usize>, rng: &mut StdRng) -> Result<String> {
    match value {
        Some(idx) => slot.sample_inform(rng, idx),
        None => Ok(sample(rng, &["Anything is fine.", "I don't care.", "Whatever is good."]).into()),
    }
}
