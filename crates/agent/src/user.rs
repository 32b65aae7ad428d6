//! User agent
//!
//! Simulates a user with a hidden agenda: a constraint per searchable slot
//! (possibly "don't care") and an ordered list of goals to get answered,
//! always starting with the database entry itself. The policy consumes one
//! system act at a time and reacts; on multi-goal sessions a finished
//! search flips one constraint and starts over.

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use dialog_sim_core::action::{SlotValue, SysAct, UserAct};
use dialog_sim_core::complexity::{Complexity, RejectStyle};
use dialog_sim_core::error::{Result, SimError};
use dialog_sim_core::meta;
use dialog_sim_core::sample::sample_weighted;
use dialog_sim_core::state::{History, SpkState};
use dialog_sim_domain::Domain;

/// Hard bound: past this many recorded turns the user walks away.
const PATIENCE_TURNS: usize = 100;

/// One user turn.
#[derive(Debug, Clone)]
pub struct UserStep {
    pub terminal: bool,
    pub acts: Vec<UserAct>,
}

#[derive(Debug)]
struct UserState {
    history: History,
    spk_state: SpkState,
    input_buffer: VecDeque<SysAct>,
    goals_met: IndexMap<String, bool>,
}

impl UserState {
    fn new(sys_goals: &[String]) -> Self {
        Self {
            history: History::new(),
            spk_state: SpkState::Listen,
            input_buffer: VecDeque::new(),
            goals_met: sys_goals.iter().map(|g| (g.clone(), false)).collect(),
        }
    }

    fn unmet_goal(&self) -> Option<&str> {
        self.goals_met
            .iter()
            .find(|(_, met)| !**met)
            .map(|(name, _)| name.as_str())
    }

    fn reset_goals(&mut self, sys_goals: &[String]) {
        self.goals_met = sys_goals.iter().map(|g| (g.clone(), false)).collect();
    }

    /// Mark the goals proposed by a system inform as met; returns the ones
    /// this user actually asked for.
    fn update_goals_met(&mut self, proposed: impl Iterator<Item = String>) -> Vec<String> {
        let mut completed = Vec::new();
        for goal in proposed {
            if let Some(met) = self.goals_met.get_mut(&goal) {
                *met = true;
                completed.push(goal);
            }
        }
        completed
    }
}

pub struct UserAgent {
    domain: Arc<Domain>,
    complexity: Complexity,
    constraints: IndexMap<String, SlotValue>,
    sys_goals: Vec<String>,
    goal_cnt: usize,
    goal_ptr: usize,
    state: UserState,
}

impl UserAgent {
    pub fn new(domain: Arc<Domain>, complexity: Complexity, rng: &mut StdRng) -> Self {
        let goal_cnt = sample_weighted(rng, &complexity.multi_goals);
        let constraints = sample_constraints(&domain, complexity.dont_care, rng);
        let sys_goals = sample_goal_list(&domain, rng);
        let state = UserState::new(&sys_goals);
        Self {
            domain,
            complexity,
            constraints,
            sys_goals,
            goal_cnt,
            goal_ptr: 0,
            state,
        }
    }

    /// The hidden constraints, for tests and debugging.
    pub fn constraints(&self) -> &IndexMap<String, SlotValue> {
        &self.constraints
    }

    /// The goal list for the current search, `#default` first.
    pub fn goals(&self) -> &[String] {
        &self.sys_goals
    }

    pub fn all_goals_met(&self) -> bool {
        self.state.unmet_goal().is_none()
    }

    /// Session outcome: +1 when every goal was answered, else -1.
    pub fn reward(&self) -> f64 {
        if self.all_goals_met() {
            1.0
        } else {
            -1.0
        }
    }

    fn state_update(&mut self, sys_acts: &[SysAct]) {
        self.state.history.push_sys(sys_acts);
        self.state.spk_state = SpkState::Speak;
        self.state.input_buffer = sys_acts.iter().cloned().collect();
    }

    /// Advance to the next goal of a multi-goal session. Returns the
    /// constraint slot that was flipped, or `None` when the agenda is
    /// exhausted.
    fn increment_goal(&mut self, rng: &mut StdRng) -> Option<String> {
        if self.goal_ptr + 1 >= self.goal_cnt {
            return None;
        }
        self.goal_ptr += 1;
        self.sys_goals = sample_goal_list(&self.domain, rng);

        let keys: Vec<String> = self.constraints.keys().cloned().collect();
        let change_key = keys[rng.gen_range(0..keys.len())].clone();
        let dim = self
            .domain
            .usr_slot(&change_key)
            .map(|slot| slot.dim())
            .unwrap_or(2);
        let old = self.constraints[&change_key];
        let new_value = rng.gen_range(0..dim.saturating_sub(1).max(1));
        self.constraints.insert(change_key.clone(), Some(new_value));
        tracing::info!(slot = %change_key, ?old, new_value, "flipped user constraint");

        self.state.reset_goals(&self.sys_goals);
        Some(change_key)
    }

    /// Consume one buffered system act. `Ok(None)` means nothing to say:
    /// either the act needs no reply or the buffer ran dry and the floor is
    /// yielded.
    fn policy(&mut self, rng: &mut StdRng) -> Result<Option<Vec<UserAct>>> {
        if self.state.spk_state == SpkState::Exit {
            return Ok(None);
        }
        let top = match self.state.input_buffer.pop_front() {
            Some(act) => act,
            None => {
                self.state.spk_state = SpkState::Listen;
                return Ok(None);
            }
        };

        if self.state.history.len() > PATIENCE_TURNS {
            self.state.input_buffer.clear();
            return Ok(Some(vec![UserAct::Goodbye]));
        }

        match top {
            SysAct::Greet => Ok(Some(vec![UserAct::Greet])),
            SysAct::Goodbye => Ok(Some(vec![UserAct::Goodbye])),

            SysAct::ImplicitConfirm { slot, value } => {
                if !self.domain.is_usr_slot(&slot) {
                    return Err(SimError::UnsupportedAct("implicit_confirm on a non-user slot"));
                }
                let truth = self.constraint(&slot)?;
                if value == truth || truth.is_none() {
                    return Ok(None);
                }
                match sample_weighted(rng, &self.complexity.reject_style) {
                    RejectStyle::Reject => Ok(Some(vec![UserAct::disconfirm(slot, value)])),
                    RejectStyle::RejectInform => Ok(Some(vec![
                        UserAct::disconfirm(slot.clone(), value),
                        UserAct::inform(slot, truth),
                    ])),
                }
            }

            SysAct::ExplicitConfirm { slot, value } => {
                if !self.domain.is_usr_slot(&slot) {
                    return Err(SimError::UnsupportedAct("explicit_confirm on a non-user slot"));
                }
                let truth = self.constraint(&slot)?;
                if value == truth {
                    Ok(Some(vec![UserAct::confirm(slot, value)]))
                } else {
                    Ok(Some(vec![UserAct::disconfirm(slot, value)]))
                }
            }

            SysAct::Inform { constraints, goals } => {
                if let Some(wrong_slot) = self.first_disagreement(&constraints) {
                    let truth = self.constraint(&wrong_slot)?;
                    return Ok(Some(vec![UserAct::inform(wrong_slot, truth)]));
                }
                let completed = self
                    .state
                    .update_goals_met(goals.keys().cloned());

                let next_goal = match self.state.unmet_goal() {
                    Some(goal) => goal.to_string(),
                    None => {
                        return match self.increment_goal(rng) {
                            Some(flipped) => {
                                let value = self.constraint(&flipped)?;
                                Ok(Some(vec![
                                    UserAct::NewSearch,
                                    UserAct::inform(flipped, value),
                                ]))
                            }
                            None => Ok(Some(vec![
                                UserAct::Satisfy { goals: completed },
                                UserAct::Goodbye,
                            ])),
                        };
                    }
                };

                let ack = UserAct::MoreRequest { goals: completed };
                if rng.gen::<f64>() < self.complexity.yn_question {
                    let slot = self
                        .domain
                        .sys_slot(&next_goal)
                        .ok_or_else(|| SimError::UnknownSlot(next_goal.clone()))?;
                    let expected = rng.gen_range(0..slot.dim());
                    if slot.has_yn_question(expected) {
                        return Ok(Some(vec![
                            ack,
                            UserAct::yn_question(next_goal, expected),
                        ]));
                    }
                }
                Ok(Some(vec![ack, UserAct::request(next_goal)]))
            }

            SysAct::Request { slot } => {
                if slot == meta::NEED {
                    let next = self
                        .state
                        .unmet_goal()
                        .ok_or_else(|| {
                            SimError::PolicyViolation("asked for a need with no unmet goal".into())
                        })?
                        .to_string();
                    return Ok(Some(vec![UserAct::request(next)]));
                }
                if slot == meta::HAPPY {
                    return Ok(None);
                }
                if !self.domain.is_usr_slot(&slot) {
                    return Err(SimError::UnsupportedAct("request for an unknown slot"));
                }

                let value = self.constraint(&slot)?;
                let mut acts = vec![UserAct::inform(slot.clone(), value)];
                if self.domain.usr_slots.len() > 1 {
                    let num_informs = sample_weighted(rng, &self.complexity.multi_slots);
                    if num_informs > 1 {
                        let mut candidates: Vec<String> = self
                            .constraints
                            .iter()
                            .filter(|(name, value)| name.as_str() != slot && value.is_some())
                            .map(|(name, _)| name.clone())
                            .collect();
                        candidates.shuffle(rng);
                        candidates.truncate(num_informs - 1);
                        for extra in candidates {
                            let extra_value = self.constraint(&extra)?;
                            acts.push(UserAct::inform(extra, extra_value));
                        }
                    }
                }
                Ok(Some(acts))
            }

            SysAct::AskRepeat => {
                let last = self
                    .state
                    .history
                    .last_usr()
                    .ok_or(SimError::UserSpeaksFirst)?;
                Ok(Some(last.to_vec()))
            }

            SysAct::AskRephrase => {
                let last = self
                    .state
                    .history
                    .last_usr()
                    .ok_or(SimError::UserSpeaksFirst)?;
                let mut acts = last.to_vec();
                for act in acts.iter_mut() {
                    act.mark_again();
                }
                Ok(Some(acts))
            }

            SysAct::Query { constraints, goals } => {
                let values: Vec<SlotValue> =
                    constraints.iter().map(|(_, value)| *value).collect();
                let mut rows = self.domain.db.select(&values);
                if rows.is_empty() {
                    // A mis-grounded or re-searched constraint set can miss
                    // the table entirely. The knowledge base answers with
                    // its closest entry; a wrong proposal is caught by the
                    // correction loop on the following inform.
                    tracing::debug!("query matched nothing, relaxing to the full table");
                    rows = self.domain.db.select(&vec![None; values.len()]);
                }
                if rows.is_empty() {
                    return Err(SimError::EmptyQueryResult);
                }
                let chosen = rows[rng.gen_range(0..rows.len())];

                let mut results = IndexMap::new();
                for goal in &goals {
                    let column = self
                        .domain
                        .sys_slot_index(goal)
                        .ok_or_else(|| SimError::UnknownSlot(goal.clone()))?;
                    let value = self
                        .domain
                        .db
                        .system_value(chosen, column)
                        .ok_or(SimError::EmptyQueryResult)?;
                    results.insert(goal.clone(), value);
                }
                Ok(Some(vec![UserAct::KbReturn {
                    query: constraints,
                    results,
                }]))
            }

            SysAct::Clarify => Err(SimError::UnsupportedAct("clarify")),
        }
    }

    fn constraint(&self, slot: &str) -> Result<SlotValue> {
        self.constraints
            .get(slot)
            .copied()
            .ok_or_else(|| SimError::UnknownSlot(slot.to_string()))
    }

    /// First constraint the proposal got wrong or left out, if any.
    fn first_disagreement(
        &self,
        proposed: &[(String, SlotValue)],
    ) -> Option<String> {
        for (name, truth) in &self.constraints {
            match proposed.iter().find(|(slot, _)| slot == name) {
                Some((_, value)) if value == truth => {}
                _ => return Some(name.clone()),
            }
        }
        None
    }

    /// Run one full user turn against the system's acts.
    pub fn step(&mut self, inputs: &[SysAct], rng: &mut StdRng) -> Result<UserStep> {
        self.state_update(inputs);
        let mut turn_acts: Vec<UserAct> = Vec::new();
        loop {
            if let Some(acts) = self.policy(rng)? {
                turn_acts.extend(acts);
            }
            match self.state.spk_state {
                SpkState::Exit => {
                    self.state.history.push_usr(&turn_acts);
                    return Ok(UserStep {
                        terminal: true,
                        acts: turn_acts,
                    });
                }
                SpkState::Listen => {
                    self.state.history.push_usr(&turn_acts);
                    return Ok(UserStep {
                        terminal: false,
                        acts: turn_acts,
                    });
                }
                SpkState::Speak => {}
            }
        }
    }
}

/// Draw the hidden constraints: one database row with each column possibly
/// flipped to "don't care".
fn sample_constraints(
    domain: &Domain,
    dont_care: f64,
    rng: &mut StdRng,
) -> IndexMap<String, SlotValue> {
    let row = domain.db.sample_unique_row(rng);
    domain
        .usr_slots
        .iter()
        .enumerate()
        .map(|(column, slot)| {
            let value = if rng.gen::<f64>() < dont_care {
                None
            } else {
                row.get(column).copied()
            };
            (slot.name.clone(), value)
        })
        .collect()
}

/// Draw the goal list: `#default` plus a shuffled subset of the declared
/// system slots. The subset may be empty.
fn sample_goal_list(domain: &Domain, rng: &mut StdRng) -> Vec<String> {
    let candidates: Vec<String> = domain
        .sys_slots
        .iter()
        .filter(|slot| slot.name != meta::DEFAULT)
        .map(|slot| slot.name.clone())
        .collect();
    let num_interest = if candidates.is_empty() {
        0
    } else {
        rng.gen_range(0..candidates.len())
    };
    let mut selected = candidates;
    selected.shuffle(rng);
    selected.truncate(num_interest);

    let mut goals = Vec::with_capacity(selected.len() + 1);
    goals.push(meta::DEFAULT.to_string());
    goals.extend(selected);
    goals
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialog_sim_core::complexity::Profile;
    use dialog_sim_domain::catalog;
    use rand::SeedableRng;

    fn restaurant() -> Arc<Domain> {
        let mut rng = StdRng::seed_from_u64(21);
        Arc::new(Domain::build(catalog::restaurant(), &mut rng).unwrap())
    }

    fn clean_user(domain: &Arc<Domain>, seed: u64) -> (UserAgent, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let user = UserAgent::new(domain.clone(), Profile::Clean.complexity(), &mut rng);
        (user, rng)
    }

    #[test]
    fn test_goal_list_starts_with_default() {
        let domain = restaurant();
        for seed in 0..20 {
            let (user, _) = clean_user(&domain, seed);
            assert_eq!(user.goals()[0], meta::DEFAULT);
        }
    }

    #[test]
    fn test_clean_constraints_are_concrete() {
        let domain = restaurant();
        let (user, _) = clean_user(&domain, 4);
        assert_eq!(user.constraints().len(), 2);
        for value in user.constraints().values() {
            assert!(value.is_some());
        }
    }

    #[test]
    fn test_greet_and_need_are_answered() {
        let domain = restaurant();
        let (mut user, mut rng) = clean_user(&domain, 5);
        let step = user
            .step(
                &[
                    SysAct::Greet,
                    SysAct::Request {
                        slot: meta::NEED.into(),
                    },
                ],
                &mut rng,
            )
            .unwrap();
        assert!(matches!(step.acts[0], UserAct::Greet));
        assert!(
            matches!(&step.acts[1], UserAct::Request { slot, .. } if slot == meta::DEFAULT)
        );
    }

    #[test]
    fn test_slot_request_is_answered_truthfully() {
        let domain = restaurant();
        let (mut user, mut rng) = clean_user(&domain, 6);
        let truth = user.constraints()["#loc"];
        let step = user
            .step(&[SysAct::Request { slot: "#loc".into() }], &mut rng)
            .unwrap();
        assert_eq!(step.acts.len(), 1);
        assert!(
            matches!(&step.acts[0], UserAct::Inform { slot, value, .. }
                if slot == "#loc" && *value == truth)
        );
    }

    #[test]
    fn test_explicit_confirm_answers() {
        let domain = restaurant();
        let (mut user, mut rng) = clean_user(&domain, 7);
        let truth = user.constraints()["#loc"];
        let step = user
            .step(
                &[SysAct::ExplicitConfirm {
                    slot: "#loc".into(),
                    value: truth,
                }],
                &mut rng,
            )
            .unwrap();
        assert!(matches!(step.acts[0], UserAct::Confirm { .. }));

        let wrong = truth.map(|v| (v + 1) % domain.usr_slot("#loc").unwrap().dim());
        let step = user
            .step(
                &[SysAct::ExplicitConfirm {
                    slot: "#loc".into(),
                    value: wrong,
                }],
                &mut rng,
            )
            .unwrap();
        assert!(matches!(step.acts[0], UserAct::Disconfirm { .. }));
    }

    #[test]
    fn test_correct_implicit_confirm_passes_silently() {
        let domain = restaurant();
        let (mut user, mut rng) = clean_user(&domain, 8);
        let truth = user.constraints()["#loc"];
        let step = user
            .step(
                &[
                    SysAct::ImplicitConfirm {
                        slot: "#loc".into(),
                        value: truth,
                    },
                    SysAct::Request {
                        slot: "#food_pref".into(),
                    },
                ],
                &mut rng,
            )
            .unwrap();
        // only the request is answered
        assert_eq!(step.acts.len(), 1);
        assert!(matches!(&step.acts[0], UserAct::Inform { slot, .. } if slot == "#food_pref"));
    }

    #[test]
    fn test_query_produces_matching_kb_return() {
        let domain = restaurant();
        let (mut user, mut rng) = clean_user(&domain, 9);
        let constraints: Vec<(String, SlotValue)> = user
            .constraints()
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        let step = user
            .step(
                &[SysAct::Query {
                    constraints: constraints.clone(),
                    goals: vec![meta::DEFAULT.into(), "#price".into()],
                }],
                &mut rng,
            )
            .unwrap();
        let (query, results) = match &step.acts[0] {
            UserAct::KbReturn { query, results } => (query.clone(), results.clone()),
            other => panic!("expected kb_return, got {other:?}"),
        };
        assert_eq!(query, constraints);
        assert_eq!(results.len(), 2);
        // the returned row actually matches the constraints
        let row = results[meta::DEFAULT];
        let user_row = domain.db.user_row(row).unwrap();
        for (column, (_, value)) in constraints.iter().enumerate() {
            if let Some(v) = value {
                assert_eq!(user_row[column], *v);
            }
        }
    }

    #[test]
    fn test_satisfying_inform_ends_single_goal_session() {
        let domain = restaurant();
        let (mut user, mut rng) = clean_user(&domain, 10);
        let constraints: Vec<(String, SlotValue)> = user
            .constraints()
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        let goals: IndexMap<String, dialog_sim_core::action::GoalAnswer> = user
            .goals()
            .iter()
            .map(|goal| {
                (
                    goal.clone(),
                    dialog_sim_core::action::GoalAnswer {
                        value: Some(0),
                        expected: None,
                    },
                )
            })
            .collect();
        let step = user
            .step(
                &[
                    SysAct::Inform {
                        constraints,
                        goals,
                    },
                    SysAct::Request {
                        slot: meta::HAPPY.into(),
                    },
                ],
                &mut rng,
            )
            .unwrap();
        assert!(matches!(step.acts[0], UserAct::Satisfy { .. }));
        assert!(matches!(step.acts[1], UserAct::Goodbye));
        assert!(user.all_goals_met());
        assert_eq!(user.reward(), 1.0);
    }

    #[test]
    fn test_wrong_inform_constraint_is_corrected() {
        let domain = restaurant();
        let (mut user, mut rng) = clean_user(&domain, 11);
        let mut constraints: Vec<(String, SlotValue)> = user
            .constraints()
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        let truth = constraints[0].1;
        constraints[0].1 = truth.map(|v| (v + 1) % domain.usr_slot("#loc").unwrap().dim());
        let step = user
            .step(
                &[SysAct::Inform {
                    constraints,
                    goals: IndexMap::new(),
                }],
                &mut rng,
            )
            .unwrap();
        assert!(
            matches!(&step.acts[0], UserAct::Inform { slot, value, .. }
                if slot == "#loc" && *value == truth)
        );
        assert!(!user.all_goals_met());
    }

    #[test]
    fn test_clarify_is_a_hard_error() {
        let domain = restaurant();
        let (mut user, mut rng) = clean_user(&domain, 12);
        assert!(matches!(
            user.step(&[SysAct::Clarify], &mut rng),
            Err(SimError::UnsupportedAct(_))
        ));
    }

    #[test]
    fn test_ask_repeat_reemits_last_turn() {
        let domain = restaurant();
        let (mut user, mut rng) = clean_user(&domain, 13);
        let first = user
            .step(&[SysAct::Request { slot: "#loc".into() }], &mut rng)
            .unwrap();
        let repeat = user.step(&[SysAct::AskRepeat], &mut rng).unwrap();
        assert_eq!(first.acts, repeat.acts);

        let rephrased = user.step(&[SysAct::AskRephrase], &mut rng).unwrap();
        assert!(rephrased
            .acts
            .iter()
            .all(|act| matches!(act, UserAct::Inform { again: true, .. })));
    }

    #[test]
    fn test_patience_bound_forces_goodbye() {
        let domain = restaurant();
        let (mut user, mut rng) = clean_user(&domain, 14);
        for _ in 0..60 {
            user.step(
                &[SysAct::Request {
                    slot: meta::HAPPY.into(),
                }],
                &mut rng,
            )
            .unwrap();
        }
        let step = user
            .step(&[SysAct::Request { slot: "#loc".into() }], &mut rng)
            .unwrap();
        assert_eq!(step.acts, vec![UserAct::Goodbye]);
        assert_eq!(user.reward(), -1.0);
    }
}
