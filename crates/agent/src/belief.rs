//! Belief tracking
//!
//! The system never sees the user's constraints directly; it accumulates
//! scored hypotheses from noisy observations. [`BeliefSlot`] keeps a score
//! per heard value and three confidence bands decide how the policy treats
//! the strongest one: below `EXPLICIT` the slot is still unknown, below
//! `IMPLICIT` it needs an explicit yes/no, below `GROUND` an implicit
//! confirmation, and at `GROUND` and above it is settled. [`BeliefGoal`]
//! does the same, scalar-valued, for what the user wants answered.

use indexmap::IndexMap;

use dialog_sim_core::action::SlotValue;

/// Below this the strongest value is treated as absent: request the slot.
pub const EXPLICIT_THRESHOLD: f64 = 0.2;
/// Below this the strongest value needs an explicit confirm.
pub const IMPLICIT_THRESHOLD: f64 = 0.6;
/// At or above this the strongest value is grounded.
pub const GROUND_THRESHOLD: f64 = 0.95;
/// A goal at or above this is considered requested by the user.
pub const GOAL_THRESHOLD: f64 = 0.7;

/// Scores are capped here; repeated reinforcement saturates.
const SCORE_CAP: f64 = 1.5;

/// Scored hypotheses over one user slot's values (`None` = don't care).
#[derive(Debug, Clone)]
pub struct BeliefSlot {
    pub name: String,
    scores: IndexMap<SlotValue, f64>,
    pub last_update_turn: Option<usize>,
}

impl BeliefSlot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scores: IndexMap::new(),
            last_update_turn: None,
        }
    }

    /// Ingest an informed value. A value heard before is reinforced past
    /// its previous score; a new value halves every competing score first
    /// and starts at the channel confidence.
    pub fn observe(&mut self, value: SlotValue, conf: f64, turn: usize) {
        self.last_update_turn = Some(turn);
        if let Some(score) = self.scores.get_mut(&value) {
            *score = score.max(conf) + 0.2;
            tracing::debug!(slot = %self.name, ?value, conf, turn, "reinforced value");
        } else {
            for score in self.scores.values_mut() {
                *score /= 2.0;
            }
            self.scores.insert(value, conf);
            tracing::debug!(slot = %self.name, ?value, conf, turn, "new value");
        }
    }

    /// Raise or lower the strongest hypothesis (or an explicit target) in
    /// response to a confirmation or rejection. Both directions are scaled
    /// by `1 - EXPLICIT_THRESHOLD` and the result stays in `[0, 1.5]`.
    pub fn ground(
        &mut self,
        confirm_conf: f64,
        disconfirm_conf: f64,
        turn: usize,
        target: Option<SlotValue>,
    ) {
        if self.scores.is_empty() {
            tracing::warn!(slot = %self.name, "grounding a slot without observations");
            return;
        }
        self.last_update_turn = Some(turn);
        let grounded = match target {
            Some(value) => value,
            None => match self.maxconf_value() {
                Some(value) => value,
                None => return,
            },
        };
        let up = confirm_conf * (1.0 - EXPLICIT_THRESHOLD);
        let down = disconfirm_conf * (1.0 - EXPLICIT_THRESHOLD);
        if let Some(score) = self.scores.get_mut(&grounded) {
            let old = *score;
            *score = (old + up - down).clamp(0.0, SCORE_CAP);
            tracing::debug!(slot = %self.name, ?grounded, old, new = *score, turn, "grounded");
        }
    }

    /// Highest score over all hypotheses; 0.0 when nothing was heard.
    pub fn max_conf(&self) -> f64 {
        self.scores.values().fold(0.0, |acc, &s| acc.max(s))
    }

    /// The strongest hypothesis. Ties resolve to the larger value id, with
    /// don't-care below every concrete value; `None` when nothing was
    /// heard.
    pub fn maxconf_value(&self) -> Option<SlotValue> {
        let mut best: Option<(SlotValue, f64)> = None;
        for (&value, &score) in &self.scores {
            best = match best {
                None => Some((value, score)),
                Some((bv, bs)) => {
                    if score > bs || (score == bs && value > bv) {
                        Some((value, score))
                    } else {
                        Some((bv, bs))
                    }
                }
            };
        }
        best.map(|(value, _)| value)
    }

    /// Reset every known value to the band between explicit and implicit
    /// confirmation; past observations stay plausible after a re-search
    /// without counting as grounded.
    pub fn clear(&mut self) {
        let middle = (IMPLICIT_THRESHOLD + EXPLICIT_THRESHOLD) / 2.0;
        for score in self.scores.values_mut() {
            *score = middle;
        }
    }

    pub fn score(&self, value: &SlotValue) -> Option<f64> {
        self.scores.get(value).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Tracked state of one system slot the user may want answered.
#[derive(Debug, Clone)]
pub struct BeliefGoal {
    pub name: String,
    pub conf: f64,
    pub delivered: bool,
    /// Value fetched by the latest knowledge-base return.
    pub value: Option<usize>,
    /// Value the user bet on in a yes/no question, if any.
    pub expected: Option<usize>,
}

impl BeliefGoal {
    pub fn new(name: impl Into<String>) -> Self {
        Self::seeded(name, 0.0)
    }

    pub fn seeded(name: impl Into<String>, conf: f64) -> Self {
        Self {
            name: name.into(),
            conf,
            delivered: false,
            value: None,
            expected: None,
        }
    }

    /// Ingest a request or yes/no probe for this goal.
    pub fn observe(&mut self, conf: f64, expected: Option<usize>) {
        self.conf = self.conf.max(conf) + 0.2;
        self.expected = expected;
    }

    pub fn deliver(&mut self) {
        self.delivered = true;
    }

    /// Reset for a new search. The fetched value survives until the next
    /// knowledge-base return overwrites it.
    pub fn clear(&mut self) {
        self.conf = 0.0;
        self.delivered = false;
        self.expected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_value_halves_competitors() {
        let mut slot = BeliefSlot::new("#loc");
        slot.observe(Some(0), 0.8, 1);
        slot.observe(Some(1), 0.9, 2);
        assert_eq!(slot.score(&Some(0)), Some(0.4));
        assert_eq!(slot.score(&Some(1)), Some(0.9));
        assert_eq!(slot.maxconf_value(), Some(Some(1)));
    }

    #[test]
    fn test_reobservation_is_superadditive() {
        let mut slot = BeliefSlot::new("#loc");
        slot.observe(Some(2), 0.5, 1);
        slot.observe(Some(2), 0.4, 2);
        let score = slot.score(&Some(2)).unwrap();
        assert!((score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_grounding_clamps_to_bounds() {
        let mut slot = BeliefSlot::new("#loc");
        slot.observe(Some(0), 0.9, 1);
        for turn in 0..10 {
            slot.ground(1.0, 0.0, turn, None);
        }
        assert!(slot.max_conf() <= 1.5);

        for turn in 0..10 {
            slot.ground(0.0, 1.0, turn, None);
        }
        assert!(slot.max_conf() >= 0.0);
        assert_eq!(slot.score(&Some(0)), Some(0.0));
    }

    #[test]
    fn test_disconfirm_is_monotone_nonincreasing() {
        let mut slot = BeliefSlot::new("#loc");
        slot.observe(Some(1), 1.2, 1);
        let mut prev = slot.max_conf();
        for turn in 0..6 {
            slot.ground(0.0, 1.0, turn, None);
            let now = slot.score(&Some(1)).unwrap();
            assert!(now <= prev);
            prev = now;
        }
    }

    #[test]
    fn test_grounding_empty_slot_is_a_noop() {
        let mut slot = BeliefSlot::new("#loc");
        slot.ground(1.0, 0.0, 1, None);
        assert!(slot.is_empty());
        assert_eq!(slot.max_conf(), 0.0);
    }

    #[test]
    fn test_dont_care_is_a_first_class_value() {
        let mut slot = BeliefSlot::new("#loc");
        slot.observe(None, 0.99, 1);
        assert_eq!(slot.maxconf_value(), Some(None));
        assert!(slot.max_conf() > GROUND_THRESHOLD);
    }

    #[test]
    fn test_tie_breaks_to_larger_value() {
        let mut slot = BeliefSlot::new("#loc");
        slot.observe(Some(0), 0.5, 1);
        slot.clear();
        slot.observe(Some(3), 0.2, 2);
        slot.clear();
        // both now sit at 0.4
        assert_eq!(slot.maxconf_value(), Some(Some(3)));
    }

    #[test]
    fn test_clear_resets_to_midband() {
        let mut slot = BeliefSlot::new("#loc");
        slot.observe(Some(0), 1.3, 1);
        slot.clear();
        let score = slot.score(&Some(0)).unwrap();
        assert!((score - 0.4).abs() < 1e-9);
        assert!(score > EXPLICIT_THRESHOLD && score < IMPLICIT_THRESHOLD);
    }

    #[test]
    fn test_goal_observation_and_clear() {
        let mut goal = BeliefGoal::new("#price");
        assert_eq!(goal.conf, 0.0);
        goal.observe(0.9, Some(2));
        assert!((goal.conf - 1.1).abs() < 1e-9);
        assert_eq!(goal.expected, Some(2));

        goal.value = Some(1);
        goal.deliver();
        goal.clear();
        assert_eq!(goal.conf, 0.0);
        assert!(!goal.delivered);
        assert_eq!(goal.expected, None);
        assert_eq!(goal.value, Some(1));
    }
}
