//! Noisy channels
//!
//! The only way user intentions reach the system. [`ActionChannel`]
//! corrupts the symbolic acts: it marks informs for spoken
//! self-correction, then samples a per-turn confidence and flips or
//! rewrites acts with probability `1 - conf`. [`WordChannel`] corrupts the
//! rendered words with hesitations and false starts; the symbolic acts
//! stay untouched by it. The user's own state always sees the clean acts.

use std::sync::Arc;

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::Rng;
use statrs::distribution::Normal;

use dialog_sim_core::action::UserAct;
use dialog_sim_core::complexity::Complexity;
use dialog_sim_domain::Domain;

/// Confidence bounds of the simulated recognizer.
const CONF_FLOOR: f64 = 0.1;
const CONF_CEIL: f64 = 0.99;

/// Yes/no answers are assumed easier to recognize.
const CONFIRM_CONF_BONUS: f64 = 0.1;

pub struct ActionChannel {
    domain: Arc<Domain>,
    complexity: Complexity,
    conf_dist: Option<Normal>,
}

impl ActionChannel {
    pub fn new(domain: Arc<Domain>, complexity: Complexity) -> Self {
        let conf_dist = if complexity.asr_std > 0.0 {
            Normal::new(complexity.asr_acc, complexity.asr_std).ok()
        } else {
            None
        };
        Self {
            domain,
            complexity,
            conf_dist,
        }
    }

    /// Corrupt one user turn. Returns the noisy acts together with the
    /// sampled channel confidence.
    pub fn transmit(&self, acts: &[UserAct], rng: &mut StdRng) -> (Vec<UserAct>, f64) {
        let mut noisy = acts.to_vec();
        self.interaction(&mut noisy, rng);
        // social level: pass-through placeholder
        let conf = self.environment(&mut noisy, rng);
        (noisy, conf)
    }

    /// Interaction noise: mark informs for spoken self-correction.
    fn interaction(&self, acts: &mut [UserAct], rng: &mut StdRng) {
        for act in acts.iter_mut() {
            if let UserAct::Inform { self_correct, .. } = act {
                if rng.gen::<f64>() < self.complexity.self_correct {
                    *self_correct = true;
                }
            }
        }
    }

    /// Environment noise: sample the confidence, then independently flip
    /// confirms and rewrite inform values with probability `1 - conf`.
    fn environment(&self, acts: &mut [UserAct], rng: &mut StdRng) -> f64 {
        let mut conf = match &self.conf_dist {
            Some(dist) => dist.sample(rng),
            None => self.complexity.asr_acc,
        };
        conf = conf.clamp(CONF_FLOOR, CONF_CEIL);

        let has_confirm = acts
            .iter()
            .any(|act| matches!(act, UserAct::Confirm { .. } | UserAct::Disconfirm { .. }));
        if has_confirm {
            conf = (conf + CONFIRM_CONF_BONUS).clamp(CONF_FLOOR, CONF_CEIL);
        }

        for act in acts.iter_mut() {
            let replacement = match &*act {
                UserAct::Confirm { slot, value, again } => {
                    if rng.gen::<f64>() > conf {
                        Some(UserAct::Disconfirm {
                            slot: slot.clone(),
                            value: *value,
                            again: *again,
                        })
                    } else {
                        None
                    }
                }
                UserAct::Disconfirm { slot, value, again } => {
                    if rng.gen::<f64>() > conf {
                        Some(UserAct::Confirm {
                            slot: slot.clone(),
                            value: *value,
                            again: *again,
                        })
                    } else {
                        None
                    }
                }
                UserAct::Inform {
                    slot,
                    self_correct,
                    again,
                    ..
                } => {
                    if rng.gen::<f64>() > conf {
                        let dim = self
                            .domain
                            .usr_slot(slot)
                            .map(|s| s.dim())
                            .unwrap_or(1);
                        // uniform over the vocabulary plus "don't care"
                        let pick = rng.gen_range(0..=dim);
                        let value = if pick == dim { None } else { Some(pick) };
                        Some(UserAct::Inform {
                            slot: slot.clone(),
                            value,
                            self_correct: *self_correct,
                            again: *again,
                        })
                    } else {
                        None
                    }
                }
                _ => None,
            };
            if let Some(corrupted) = replacement {
                *act = corrupted;
            }
        }
        conf
    }
}

/// Word-level noise over the rendered utterance.
pub struct WordChannel {
    complexity: Complexity,
}

impl WordChannel {
    pub fn new(complexity: Complexity) -> Self {
        Self { complexity }
    }

    pub fn transmit(&self, utt: &str, rng: &mut StdRng) -> String {
        let utt = self.add_hesitation(utt, rng);
        self.add_self_restart(&utt, rng)
    }

    /// Insert a filler token at a random interior position.
    fn add_hesitation(&self, utt: &str, rng: &mut StdRng) -> String {
        let mut tokens: Vec<&str> = utt.split(' ').collect();
        if tokens.len() > 4 && rng.gen::<f64>() < self.complexity.hesitation {
            let fillers = ["hmm", "uhm", "hmm ..."];
            let pos = rng.gen_range(1..tokens.len() - 1);
            tokens.insert(pos, fillers[rng.gen_range(0..fillers.len())]);
            return tokens.join(" ");
        }
        utt.to_string()
    }

    /// Prefix a false start: the first word or two, an "uhm yeah", then
    /// the whole utterance again.
    fn add_self_restart(&self, utt: &str, rng: &mut StdRng) -> String {
        let tokens: Vec<&str> = utt.split(' ').collect();
        if tokens.len() > 4 && rng.gen::<f64>() < self.complexity.self_restart {
            let keep = rng.gen_range(1..3);
            let mut rebuilt: Vec<&str> = tokens[..keep].to_vec();
            rebuilt.push("uhm yeah");
            rebuilt.extend(tokens.iter().copied());
            return rebuilt.join(" ");
        }
        utt.to_string()
    }
}
