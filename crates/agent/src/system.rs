//! System agent
//!
//! Tracks beliefs over the user's constraints and confidence per goal,
//! then picks the next acts by a fixed rule order: close the dialog,
//! deliver a pending knowledge-base return, query once everything is
//! grounded, otherwise confirm or request the weakest slots. The agent
//! keeps the floor until it emits an act that demands a user response.

use std::sync::Arc;

use indexmap::IndexMap;

use dialog_sim_core::action::{Constraints, GoalAnswer, SlotValue, SysAct, UserAct};
use dialog_sim_core::error::{Result, SimError};
use dialog_sim_core::meta;
use dialog_sim_core::state::{History, SpkState};
use dialog_sim_core::summary::{GoalSummary, SlotSummary, StateSummary};
use dialog_sim_domain::Domain;

use crate::belief::{BeliefGoal, BeliefSlot, GOAL_THRESHOLD};
use crate::belief::{EXPLICIT_THRESHOLD, GROUND_THRESHOLD, IMPLICIT_THRESHOLD};

/// Upper bound on policy invocations within one turn; a correct policy
/// yields the floor long before this.
const POLICY_LOOP_CAP: usize = 50;

/// One system turn: the chosen acts, whether the session ended, and the
/// tracker snapshot taken right after the state update.
#[derive(Debug, Clone)]
pub struct SystemStep {
    pub terminal: bool,
    pub acts: Vec<SysAct>,
    pub summary: StateSummary,
}

#[derive(Debug)]
struct SystemState {
    history: History,
    spk_state: SpkState,
    usr_beliefs: IndexMap<String, BeliefSlot>,
    sys_goals: IndexMap<String, BeliefGoal>,
    /// Rows satisfying the current max-confidence query; cached at
    /// construction over the unconstrained query.
    valid_entries: Vec<usize>,
    pending_return: Option<Constraints>,
}

impl SystemState {
    fn new(domain: &Domain) -> Self {
        let usr_beliefs: IndexMap<String, BeliefSlot> = domain
            .usr_slots
            .iter()
            .map(|slot| (slot.name.clone(), BeliefSlot::new(slot.name.clone())))
            .collect();
        let mut sys_goals: IndexMap<String, BeliefGoal> = domain
            .sys_slots
            .iter()
            .map(|slot| (slot.name.clone(), BeliefGoal::new(slot.name.clone())))
            .collect();
        sys_goals.insert(
            meta::DEFAULT.to_string(),
            BeliefGoal::seeded(meta::DEFAULT, 1.0),
        );

        let query: Vec<SlotValue> = usr_beliefs.values().map(|b| b.maxconf_value().flatten()).collect();
        let valid_entries = domain.db.select(&query);

        Self {
            history: History::new(),
            spk_state: SpkState::Speak,
            usr_beliefs,
            sys_goals,
            valid_entries,
            pending_return: None,
        }
    }

    fn turn_id(&self) -> usize {
        self.history.len()
    }

    /// The max-confidence constraint per user slot, in slot order.
    fn gen_query(&self) -> Constraints {
        self.usr_beliefs
            .iter()
            .map(|(name, belief)| (name.clone(), belief.maxconf_value().flatten()))
            .collect()
    }

    /// Everything grounded and no goal stuck between "heard" and
    /// "requested": every belief at GROUND and no goal with confidence in
    /// (0, GOAL_THRESHOLD). Untouched goals do not block.
    fn ready_to_inform(&self) -> bool {
        for belief in self.usr_beliefs.values() {
            if belief.max_conf() < GROUND_THRESHOLD {
                return false;
            }
        }
        for goal in self.sys_goals.values() {
            if goal.conf > 0.0 && goal.conf < GOAL_THRESHOLD {
                return false;
            }
        }
        true
    }

    fn reset_goals(&mut self) {
        for goal in self.sys_goals.values_mut() {
            goal.clear();
        }
        self.sys_goals.insert(
            meta::DEFAULT.to_string(),
            BeliefGoal::seeded(meta::DEFAULT, 1.0),
        );
    }

    fn reset_beliefs(&mut self) {
        for belief in self.usr_beliefs.values_mut() {
            belief.clear();
        }
    }

    fn summary(&self, domain: &Domain) -> StateSummary {
        let usr_slots = self
            .usr_beliefs
            .values()
            .map(|belief| {
                let max_val = match belief.maxconf_value() {
                    Some(Some(idx)) => domain
                        .usr_slot(&belief.name)
                        .and_then(|slot| slot.word(idx))
                        .map(|word| word.to_string()),
                    _ => None,
                };
                SlotSummary {
                    name: belief.name.clone(),
                    max_conf: belief.max_conf(),
                    max_val,
                }
            })
            .collect();

        let sys_goals = self
            .sys_goals
            .values()
            .map(|goal| {
                let verbalize = |idx: Option<usize>| {
                    idx.and_then(|i| {
                        domain
                            .sys_slot(&goal.name)
                            .and_then(|slot| slot.word(i))
                            .map(|word| word.to_string())
                    })
                };
                GoalSummary {
                    name: goal.name.clone(),
                    delivered: goal.delivered,
                    value: verbalize(goal.value),
                    expected: verbalize(goal.expected),
                    conf: goal.conf,
                }
            })
            .collect();

        StateSummary {
            usr_slots,
            sys_goals,
            kb_update: self.pending_return.is_some(),
        }
    }
}

pub struct SystemAgent {
    domain: Arc<Domain>,
    state: SystemState,
}

impl SystemAgent {
    pub fn new(domain: Arc<Domain>) -> Self {
        let state = SystemState::new(&domain);
        Self { domain, state }
    }

    /// Ingest one noisy user turn at the given channel confidence.
    fn state_update(&mut self, usr_acts: &[UserAct], conf: f64) -> Result<()> {
        if usr_acts.is_empty() {
            return Ok(());
        }
        self.state.history.push_usr(usr_acts);
        self.state.spk_state = SpkState::Speak;
        let turn = self.state.turn_id();

        for act in usr_acts {
            match act {
                UserAct::Confirm { slot, .. } => {
                    self.belief_mut(slot)?.ground(conf, 1.0 - conf, turn, None);
                }
                UserAct::Disconfirm { slot, .. } => {
                    self.belief_mut(slot)?.ground(1.0 - conf, conf, turn, None);
                }
                UserAct::Inform { slot, value, .. } => {
                    self.belief_mut(slot)?.observe(*value, conf, turn);
                }
                UserAct::Request { slot, .. } => {
                    self.goal_mut(slot)?.observe(conf, None);
                }
                UserAct::YnQuestion { slot, value, .. } => {
                    self.goal_mut(slot)?.observe(conf, Some(*value));
                }
                UserAct::NewSearch => {
                    self.state.reset_goals();
                    self.state.reset_beliefs();
                }
                UserAct::Satisfy { goals } | UserAct::MoreRequest { goals } => {
                    for goal in goals {
                        self.goal_mut(goal)?.deliver();
                    }
                }
                UserAct::KbReturn { query, results } => {
                    self.state.pending_return = Some(query.clone());
                    for (name, goal) in self.state.sys_goals.iter_mut() {
                        if let Some(value) = results.get(name) {
                            goal.value = Some(*value);
                        }
                    }
                }
                UserAct::Greet | UserAct::Goodbye | UserAct::Chat => {}
            }
        }
        Ok(())
    }

    fn belief_mut(&mut self, slot: &str) -> Result<&mut BeliefSlot> {
        self.state
            .usr_beliefs
            .get_mut(slot)
            .ok_or_else(|| SimError::UnknownSlot(slot.to_string()))
    }

    fn goal_mut(&mut self, slot: &str) -> Result<&mut BeliefGoal> {
        self.state
            .sys_goals
            .get_mut(slot)
            .ok_or_else(|| SimError::UnknownSlot(slot.to_string()))
    }

    /// One policy decision. `None` means the agent has left the session.
    fn policy(&mut self) -> Result<Option<Vec<SysAct>>> {
        if self.state.spk_state == SpkState::Exit {
            return Ok(None);
        }

        if self.state.history.is_empty() {
            return Ok(Some(vec![
                SysAct::Greet,
                SysAct::Request {
                    slot: meta::NEED.to_string(),
                },
            ]));
        }

        let last_usr = self.state.history.last_usr().ok_or(SimError::UserSpeaksFirst)?;
        if last_usr.iter().any(|act| matches!(act, UserAct::Goodbye)) {
            self.state.spk_state = SpkState::Exit;
            return Ok(Some(vec![SysAct::Goodbye]));
        }

        if let Some(query) = self.state.pending_return.take() {
            let mut goals = IndexMap::new();
            for goal in self.state.sys_goals.values() {
                if !goal.delivered && goal.conf >= GOAL_THRESHOLD {
                    goals.insert(
                        goal.name.clone(),
                        GoalAnswer {
                            value: goal.value,
                            expected: goal.expected,
                        },
                    );
                }
            }
            return Ok(Some(vec![
                SysAct::Inform {
                    constraints: query,
                    goals,
                },
                SysAct::Request {
                    slot: meta::HAPPY.to_string(),
                },
            ]));
        }

        if self.state.ready_to_inform() {
            let constraints = self.state.gen_query();
            let goals: Vec<String> = self
                .state
                .sys_goals
                .values()
                .filter(|goal| !goal.delivered && goal.conf >= GOAL_THRESHOLD)
                .map(|goal| goal.name.clone())
                .collect();
            if goals.is_empty() {
                return Err(SimError::PolicyViolation(
                    "no undelivered goal at query time".into(),
                ));
            }
            return Ok(Some(vec![SysAct::Query { constraints, goals }]));
        }

        let mut implicit_confirms = Vec::new();
        let mut explicit_confirms = Vec::new();
        let mut requests = Vec::new();
        for belief in self.state.usr_beliefs.values() {
            let conf = belief.max_conf();
            if conf < EXPLICIT_THRESHOLD {
                requests.push(SysAct::Request {
                    slot: belief.name.clone(),
                });
            } else if conf < IMPLICIT_THRESHOLD {
                explicit_confirms.push(SysAct::ExplicitConfirm {
                    slot: belief.name.clone(),
                    value: belief.maxconf_value().flatten(),
                });
            } else if conf < GROUND_THRESHOLD {
                implicit_confirms.push(SysAct::ImplicitConfirm {
                    slot: belief.name.clone(),
                    value: belief.maxconf_value().flatten(),
                });
            }
        }
        if self
            .state
            .sys_goals
            .values()
            .any(|goal| goal.conf > 0.0 && goal.conf < GOAL_THRESHOLD)
        {
            requests.push(SysAct::Request {
                slot: meta::NEED.to_string(),
            });
        }

        let mut acts = implicit_confirms;
        if let Some(confirm) = explicit_confirms.into_iter().next() {
            acts.push(confirm);
        } else if let Some(request) = requests.into_iter().next() {
            acts.push(request);
        }
        if acts.is_empty() {
            return Err(SimError::PolicyViolation(
                "policy produced no actions".into(),
            ));
        }
        Ok(Some(acts))
    }

    /// Treat an implicit confirmation as silently accepted; the next user
    /// turn can still override it with a disconfirm.
    fn self_ground(&mut self, acts: &[SysAct]) {
        let turn = self.state.turn_id();
        for act in acts {
            if let SysAct::ImplicitConfirm { slot, .. } = act {
                if let Some(belief) = self.state.usr_beliefs.get_mut(slot) {
                    belief.ground(1.0, 0.0, turn, None);
                }
            }
        }
    }

    fn yields_floor(acts: &[SysAct]) -> bool {
        matches!(
            acts.last(),
            Some(SysAct::Request { .. })
                | Some(SysAct::ExplicitConfirm { .. })
                | Some(SysAct::Query { .. })
        )
    }

    /// Run one full system turn against the (noisy) user acts of the
    /// previous turn.
    pub fn step(&mut self, inputs: &[UserAct], conf: f64) -> Result<SystemStep> {
        self.state_update(inputs, conf)?;
        let summary = self.state.summary(&self.domain);

        let mut turn_acts: Vec<SysAct> = Vec::new();
        for _ in 0..POLICY_LOOP_CAP {
            if let Some(acts) = self.policy()? {
                self.self_ground(&acts);
                turn_acts.extend(acts);
            }

            if self.state.spk_state == SpkState::Exit {
                self.state.history.push_sys(&turn_acts);
                return Ok(SystemStep {
                    terminal: true,
                    acts: turn_acts,
                    summary,
                });
            }
            if Self::yields_floor(&turn_acts) {
                self.state.history.push_sys(&turn_acts);
                return Ok(SystemStep {
                    terminal: false,
                    acts: turn_acts,
                    summary,
                });
            }
        }
        Err(SimError::PolicyViolation(
            "system policy failed to yield the floor".into(),
        ))
    }

    /// Rows matching the max-confidence query cached at session start.
    pub fn valid_entries(&self) -> &[usize] {
        &self.state.valid_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialog_sim_domain::catalog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn restaurant() -> Arc<Domain> {
        let mut rng = StdRng::seed_from_u64(9);
        Arc::new(Domain::build(catalog::restaurant(), &mut rng).unwrap())
    }

    #[test]
    fn test_opens_with_greet_and_need_request() {
        let mut sys = SystemAgent::new(restaurant());
        let step = sys.step(&[], 1.0).unwrap();
        assert!(!step.terminal);
        assert_eq!(step.acts.len(), 2);
        assert!(matches!(step.acts[0], SysAct::Greet));
        assert!(
            matches!(&step.acts[1], SysAct::Request { slot } if slot == meta::NEED)
        );
    }

    #[test]
    fn test_goodbye_terminates() {
        let mut sys = SystemAgent::new(restaurant());
        sys.step(&[], 1.0).unwrap();
        let step = sys.step(&[UserAct::Goodbye], 0.9).unwrap();
        assert!(step.terminal);
        assert_eq!(step.acts, vec![SysAct::Goodbye]);
    }

    #[test]
    fn test_requests_unheard_slots() {
        let mut sys = SystemAgent::new(restaurant());
        sys.step(&[], 1.0).unwrap();
        let step = sys
            .step(&[UserAct::request(meta::DEFAULT)], 0.99)
            .unwrap();
        // both user slots are unheard; exactly one gets requested
        let requests: Vec<_> = step
            .acts
            .iter()
            .filter(|act| matches!(act, SysAct::Request { .. }))
            .collect();
        assert_eq!(requests.len(), 1);
        assert!(matches!(&step.acts[0], SysAct::Request { slot } if slot == "#loc"));
    }

    #[test]
    fn test_low_confidence_triggers_explicit_confirm() {
        let mut sys = SystemAgent::new(restaurant());
        sys.step(&[], 1.0).unwrap();
        sys.step(&[UserAct::request(meta::DEFAULT)], 0.99).unwrap();
        let step = sys
            .step(&[UserAct::inform("#loc", Some(2))], 0.3)
            .unwrap();
        assert!(step
            .acts
            .iter()
            .any(|act| matches!(act, SysAct::ExplicitConfirm { slot, value }
                if slot == "#loc" && *value == Some(2))));
    }

    #[test]
    fn test_mid_confidence_triggers_implicit_confirm_and_self_grounds() {
        let mut sys = SystemAgent::new(restaurant());
        sys.step(&[], 1.0).unwrap();
        sys.step(&[UserAct::request(meta::DEFAULT)], 0.99).unwrap();
        let step = sys
            .step(&[UserAct::inform("#loc", Some(2))], 0.7)
            .unwrap();
        assert!(step
            .acts
            .iter()
            .any(|act| matches!(act, SysAct::ImplicitConfirm { slot, .. } if slot == "#loc")));
        // self-grounded past GROUND: the turn continues to a request for
        // the other slot
        assert!(step
            .acts
            .iter()
            .any(|act| matches!(act, SysAct::Request { slot } if slot == "#food_pref")));
    }

    #[test]
    fn test_grounded_session_queries_and_informs() {
        let mut sys = SystemAgent::new(restaurant());
        sys.step(&[], 1.0).unwrap();
        sys.step(&[UserAct::request(meta::DEFAULT)], 0.99).unwrap();
        sys.step(&[UserAct::inform("#loc", Some(1))], 0.99).unwrap();
        let step = sys
            .step(&[UserAct::inform("#food_pref", Some(4))], 0.99)
            .unwrap();
        let (constraints, goals) = match &step.acts[0] {
            SysAct::Query { constraints, goals } => (constraints.clone(), goals.clone()),
            other => panic!("expected query, got {other:?}"),
        };
        assert_eq!(constraints[0], ("#loc".to_string(), Some(1)));
        assert_eq!(constraints[1], ("#food_pref".to_string(), Some(4)));
        assert_eq!(goals, vec![meta::DEFAULT.to_string()]);

        // feed back the kb return and expect inform + #happy
        let results: IndexMap<String, usize> =
            [(meta::DEFAULT.to_string(), 3usize)].into_iter().collect();
        let step = sys
            .step(
                &[UserAct::KbReturn {
                    query: constraints.clone(),
                    results,
                }],
                0.99,
            )
            .unwrap();
        assert!(step.summary.kb_update);
        assert!(matches!(&step.acts[0], SysAct::Inform { goals, .. }
            if goals.get(meta::DEFAULT).map(|g| g.value) == Some(Some(3))));
        assert!(
            matches!(&step.acts[1], SysAct::Request { slot } if slot == meta::HAPPY)
        );
    }

    #[test]
    fn test_weak_goal_blocks_inform_and_requests_need() {
        let mut sys = SystemAgent::new(restaurant());
        sys.step(&[], 1.0).unwrap();
        sys.step(&[UserAct::request(meta::DEFAULT)], 0.99).unwrap();
        sys.step(&[UserAct::inform("#loc", Some(1))], 0.99).unwrap();
        // a weakly-heard goal request: conf 0.3 + 0.2 = 0.5 < threshold
        let step = sys
            .step(
                &[
                    UserAct::inform("#food_pref", Some(4)),
                    UserAct::request("#price"),
                ],
                0.3,
            )
            .unwrap();
        // food_pref at 0.3 needs explicit confirm; no query yet
        assert!(!step.acts.iter().any(|a| matches!(a, SysAct::Query { .. })));
        let mut sys2 = SystemAgent::new(restaurant());
        sys2.step(&[], 1.0).unwrap();
        sys2.step(&[UserAct::request(meta::DEFAULT)], 0.99).unwrap();
        sys2.step(&[UserAct::inform("#loc", Some(1))], 0.99).unwrap();
        sys2.step(&[UserAct::inform("#food_pref", Some(4))], 0.99)
            .unwrap();
        // all slots grounded, now a weak goal arrives alone
        let step = sys2.step(&[UserAct::request("#price")], 0.3).unwrap();
        assert!(!step.acts.iter().any(|a| matches!(a, SysAct::Query { .. })));
        assert!(step
            .acts
            .iter()
            .any(|act| matches!(act, SysAct::Request { slot } if slot == meta::NEED)));
    }

    #[test]
    fn test_new_search_resets_state() {
        let mut sys = SystemAgent::new(restaurant());
        sys.step(&[], 1.0).unwrap();
        sys.step(&[UserAct::request(meta::DEFAULT)], 0.99).unwrap();
        sys.step(&[UserAct::inform("#loc", Some(1))], 0.99).unwrap();
        let step = sys
            .step(
                &[UserAct::NewSearch, UserAct::inform("#loc", Some(5))],
                0.99,
            )
            .unwrap();
        for goal in &step.summary.sys_goals {
            assert!(!goal.delivered);
            if goal.name == meta::DEFAULT {
                assert_eq!(goal.conf, 1.0);
            }
        }
        assert!(!step.terminal);
    }
}
