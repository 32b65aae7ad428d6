//! Complexity profiles
//!
//! A profile is a plain bundle of probabilities that parameterizes every
//! stochastic phenomenon in one session: channel noise, propositional
//! phenomena (multi-slot informs, rejections, multiple goals), and
//! word-level disfluencies. Five presets cover the test corpus.

use std::fmt;
use std::str::FromStr;

/// How the user rejects a wrong implicit confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectStyle {
    /// Bare disconfirm.
    Reject,
    /// Disconfirm followed by the corrected value.
    RejectInform,
}

/// All knobs for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Complexity {
    // Environment
    /// Mean of the sampled per-turn channel confidence.
    pub asr_acc: f64,
    /// Standard deviation of the channel confidence.
    pub asr_std: f64,

    // Proposition
    /// Chance the user probes the next goal with a yes/no question.
    pub yn_question: f64,
    /// Distribution over rejection styles.
    pub reject_style: Vec<(RejectStyle, f64)>,
    /// Distribution over how many slots one inform turn carries.
    pub multi_slots: Vec<(usize, f64)>,
    /// Distribution over how many goals a session pursues.
    pub multi_goals: Vec<(usize, f64)>,
    /// Chance any given user constraint is "don't care".
    pub dont_care: f64,

    // Interaction
    /// Chance of a mid-utterance hesitation token.
    pub hesitation: f64,
    /// Chance of a false-start restart prefix.
    pub self_restart: f64,
    /// Chance an inform act is spoken wrong and then corrected.
    pub self_correct: f64,

    // Social level knobs are reserved and not yet interpreted.
    pub self_disclosure: Option<f64>,
    pub ref_shared: Option<f64>,
    pub violation_sn: Option<f64>,
}

/// Named complexity presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Noise-free baseline.
    Clean,
    /// ASR noise only.
    Env,
    /// Semantic phenomena only.
    Prop,
    /// Disfluencies only.
    Interact,
    /// Everything together.
    Mix,
}

impl Profile {
    pub const ALL: [Profile; 5] = [
        Profile::Clean,
        Profile::Env,
        Profile::Prop,
        Profile::Interact,
        Profile::Mix,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Clean => "Clean",
            Profile::Env => "Env",
            Profile::Prop => "Prop",
            Profile::Interact => "Interact",
            Profile::Mix => "Mix",
        }
    }

    pub fn complexity(&self) -> Complexity {
        match self {
            Profile::Clean => Complexity {
                asr_acc: 1.0,
                asr_std: 0.0,
                yn_question: 0.0,
                reject_style: vec![(RejectStyle::Reject, 1.0), (RejectStyle::RejectInform, 0.0)],
                multi_slots: vec![(1, 1.0), (2, 0.0)],
                multi_goals: vec![(1, 1.0), (2, 0.0)],
                dont_care: 0.0,
                hesitation: 0.0,
                self_restart: 0.0,
                self_correct: 0.0,
                self_disclosure: None,
                ref_shared: None,
                violation_sn: None,
            },
            Profile::Env => Complexity {
                asr_acc: 0.7,
                asr_std: 0.2,
                ..Profile::Clean.complexity()
            },
            Profile::Prop => Complexity {
                yn_question: 0.4,
                reject_style: vec![(RejectStyle::Reject, 0.5), (RejectStyle::RejectInform, 0.5)],
                multi_slots: vec![(1, 0.7), (2, 0.3)],
                multi_goals: vec![(1, 0.7), (2, 0.3)],
                dont_care: 0.1,
                ..Profile::Clean.complexity()
            },
            Profile::Interact => Complexity {
                hesitation: 0.4,
                self_restart: 0.1,
                self_correct: 0.2,
                ..Profile::Clean.complexity()
            },
            Profile::Mix => Complexity {
                asr_acc: 0.7,
                asr_std: 0.15,
                yn_question: 0.4,
                reject_style: vec![(RejectStyle::Reject, 0.5), (RejectStyle::RejectInform, 0.5)],
                multi_slots: vec![(1, 0.7), (2, 0.3)],
                multi_goals: vec![(1, 0.6), (2, 0.4)],
                dont_care: 0.1,
                hesitation: 0.4,
                self_restart: 0.1,
                self_correct: 0.2,
                self_disclosure: None,
                ref_shared: None,
                violation_sn: None,
            },
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clean" => Ok(Profile::Clean),
            "env" => Ok(Profile::Env),
            "prop" => Ok(Profile::Prop),
            "interact" => Ok(Profile::Interact),
            "mix" => Ok(Profile::Mix),
            other => Err(format!("unknown complexity profile: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_is_noise_free() {
        let c = Profile::Clean.complexity();
        assert_eq!(c.asr_acc, 1.0);
        assert_eq!(c.asr_std, 0.0);
        assert_eq!(c.dont_care, 0.0);
        assert_eq!(c.self_correct, 0.0);
    }

    #[test]
    fn test_env_only_touches_environment() {
        let clean = Profile::Clean.complexity();
        let env = Profile::Env.complexity();
        assert_ne!(env.asr_acc, clean.asr_acc);
        assert_eq!(env.yn_question, clean.yn_question);
        assert_eq!(env.hesitation, clean.hesitation);
    }

    #[test]
    fn test_mix_enables_everything() {
        let mix = Profile::Mix.complexity();
        assert!(mix.asr_std > 0.0);
        assert!(mix.yn_question > 0.0);
        assert!(mix.hesitation > 0.0);
        assert!(mix.multi_goals.iter().any(|(n, w)| *n == 2 && *w > 0.0));
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("mix".parse::<Profile>().unwrap(), Profile::Mix);
        assert_eq!("Clean".parse::<Profile>().unwrap(), Profile::Clean);
        assert!("loud".parse::<Profile>().is_err());
    }

    #[test]
    fn test_distributions_sum_to_one() {
        for profile in Profile::ALL {
            let c = profile.complexity();
            for dist in [&c.multi_slots, &c.multi_goals] {
                let total: f64 = dist.iter().map(|(_, w)| w).sum();
                assert!((total - 1.0).abs() < 1e-9, "{profile}: {total}");
            }
            let total: f64 = c.reject_style.iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }
}
