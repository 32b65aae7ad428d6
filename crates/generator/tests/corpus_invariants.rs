//! Corpus-level invariants over generated sessions, across domains and
//! complexity profiles. Every dialog must close properly, carry bounded
//! confidences, keep database traffic in lockstep, and lexicalize values
//! that round-trip through the slot vocabularies.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;

use dialog_sim_core::action::UserAct;
use dialog_sim_core::complexity::Profile;
use dialog_sim_core::meta;
use dialog_sim_domain::{catalog, Domain};
use dialog_sim_generator::{run_session, Dialog, TurnRecord, TURN_CEILING};

fn generate(domain_name: &str, profile: Profile, count: u64, base_seed: u64) -> (Arc<Domain>, Vec<Dialog>) {
    let spec = catalog::by_name(domain_name).expect("unknown domain");
    let mut rng = StdRng::seed_from_u64(base_seed);
    let domain = Arc::new(Domain::build(spec, &mut rng).unwrap());
    let complexity = profile.complexity();
    let dialogs = (0..count)
        .map(|k| {
            let mut session_rng = StdRng::seed_from_u64(base_seed + k + 1);
            run_session(&domain, &complexity, &mut session_rng)
                .unwrap_or_else(|e| panic!("{domain_name}/{profile} session {k}: {e}"))
                .dialog
        })
        .collect();
    (domain, dialogs)
}

/// Re-index a lexicalized word through a slot vocabulary.
fn word_index(domain: &Domain, slot: &str, word: &str) -> Option<usize> {
    let slot = domain
        .usr_slot(slot)
        .or_else(|| domain.sys_slot(slot))
        .unwrap_or_else(|| panic!("unknown slot {slot}"));
    slot.vocabulary.iter().position(|w| w == word)
}

fn check_dialog(domain: &Domain, dialog: &Dialog) {
    assert!(!dialog.is_empty());

    // 1. the session closes with a system goodbye, unless it was cut off
    // at the safety cap
    if dialog.len() <= TURN_CEILING {
        match dialog.last().unwrap() {
            TurnRecord::System { actions, .. } => {
                assert!(
                    actions.iter().any(|a| a.act == "goodbye"),
                    "last system turn has no goodbye"
                );
            }
            _ => panic!("last turn is not a system turn"),
        }
    }

    for (idx, turn) in dialog.iter().enumerate() {
        match turn {
            // 2. user confidences stay in channel bounds
            TurnRecord::User { conf, actions, .. } => {
                assert!(
                    (0.1..=0.99).contains(conf),
                    "turn {idx}: conf {conf} out of bounds"
                );
                for act in actions {
                    if let UserAct::Inform { slot, value, .. } = act {
                        if let Some(v) = value {
                            let dim = domain.usr_slot(slot).unwrap().dim();
                            assert!(*v < dim, "turn {idx}: {slot} value {v} out of range");
                        }
                    }
                }
            }

            TurnRecord::System { actions, .. } => {
                for act in actions {
                    // 8. lexicalized confirm values round-trip through the
                    // vocabulary
                    if act.act == "explicit_confirm" || act.act == "implicit_confirm" {
                        let slot = act.parameters[0].as_str().unwrap();
                        let word = act.parameters[1].as_str().unwrap();
                        if word != "dont_care" {
                            assert!(
                                word_index(domain, slot, word).is_some(),
                                "turn {idx}: {slot} word {word} not in vocabulary"
                            );
                        }
                    }
                }
            }
        }

        // 3. every query is answered by exactly one matching kb return
        if let TurnRecord::System { actions, .. } = turn {
            for act in actions.iter().filter(|a| a.act == "query") {
                let next = dialog
                    .get(idx + 1)
                    .unwrap_or_else(|| panic!("turn {idx}: query with no user reply"));
                let user_acts = match next {
                    TurnRecord::User { actions, .. } => actions,
                    _ => panic!("turn {idx}: query not followed by a user turn"),
                };
                let returns: Vec<_> = user_acts
                    .iter()
                    .filter_map(|a| match a {
                        UserAct::KbReturn { query, .. } => Some(query),
                        _ => None,
                    })
                    .collect();
                assert_eq!(returns.len(), 1, "turn {idx}: expected one kb return");

                // the echoed query re-indexes to the lexicalized one
                let lex_query = act.parameters[0].as_object().unwrap();
                for (slot, value) in returns[0] {
                    let lex_word = lex_query[slot].as_str().unwrap();
                    match value {
                        Some(v) => assert_eq!(
                            word_index(domain, slot, lex_word),
                            Some(*v),
                            "turn {idx}: {slot} mismatch"
                        ),
                        None => assert_eq!(lex_word, "dont_care", "turn {idx}: {slot}"),
                    }
                }
            }
        }

        // 4. every kb return is delivered as inform + #happy request
        if let TurnRecord::User { actions, .. } = turn {
            if actions.iter().any(|a| matches!(a, UserAct::KbReturn { .. })) {
                let next = dialog
                    .get(idx + 1)
                    .unwrap_or_else(|| panic!("turn {idx}: kb return with no system reply"));
                let sys_acts = match next {
                    TurnRecord::System { actions, .. } => actions,
                    _ => panic!("turn {idx}: kb return not followed by a system turn"),
                };
                let informs = sys_acts.iter().filter(|a| a.act == "inform").count();
                assert_eq!(informs, 1, "turn {idx}: expected one inform");
                let inform_pos = sys_acts.iter().position(|a| a.act == "inform").unwrap();
                let follow = &sys_acts[inform_pos + 1];
                assert_eq!(follow.act, "request");
                assert_eq!(follow.parameters[0], Value::String(meta::HAPPY.into()));
            }
        }
    }
}

#[test]
fn invariants_hold_across_domains_and_profiles() {
    for domain_name in ["restaurant", "bus", "weather", "movie"] {
        for profile in Profile::ALL {
            let (domain, dialogs) = generate(domain_name, profile, 8, 1000);
            for dialog in &dialogs {
                check_dialog(&domain, dialog);
            }
        }
    }
}

#[test]
fn clean_bus_sessions_complete_the_happy_path() {
    let (domain, dialogs) = generate("bus", Profile::Clean, 10, 7);
    for dialog in &dialogs {
        check_dialog(&domain, dialog);
        // every clean user turn carries the capped confidence
        for turn in dialog {
            if let TurnRecord::User { conf, .. } = turn {
                assert_eq!(*conf, 0.99);
            }
        }
        // a query happened
        assert!(
            dialog.iter().any(|t| t.utt().contains("\"QUERY\"")),
            "clean session without a query"
        );
    }
}

#[test]
fn interact_profile_injects_disfluencies_but_keeps_acts_clean() {
    let (_, dialogs) = generate("bus", Profile::Interact, 20, 11);
    let mut fillers = 0;
    for dialog in &dialogs {
        for turn in dialog {
            if let TurnRecord::User { utt, conf, .. } = turn {
                if utt.contains("hmm") || utt.contains("uhm") {
                    fillers += 1;
                }
                // interact leaves the channel clean
                assert_eq!(*conf, 0.99);
            }
        }
    }
    assert!(fillers > 0, "no disfluency in 20 interact sessions");
}

#[test]
fn mix_profile_exercises_multi_goal_research() {
    let (domain, dialogs) = generate("movie", Profile::Mix, 30, 23);
    let mut new_searches = 0;
    for dialog in &dialogs {
        check_dialog(&domain, dialog);
        for (idx, turn) in dialog.iter().enumerate() {
            let has_new_search = match turn {
                TurnRecord::User { actions, .. } => {
                    actions.iter().any(|a| matches!(a, UserAct::NewSearch))
                }
                _ => false,
            };
            if !has_new_search {
                continue;
            }
            new_searches += 1;
            // 6. the following system snapshot shows a reset goal set
            if let Some(TurnRecord::System { state, .. }) = dialog.get(idx + 1) {
                for goal in &state.sys_goals {
                    assert!(!goal.delivered, "goal {} survived a new search", goal.name);
                    if goal.name == meta::DEFAULT {
                        assert_eq!(goal.conf, 1.0);
                    }
                }
            }
        }
    }
    assert!(
        new_searches > 0,
        "no multi-goal session in 30 mix sessions"
    );
}

#[test]
fn mix_profile_produces_dont_care_queries() {
    let (domain, dialogs) = generate("restaurant", Profile::Mix, 50, 31);
    let mut dont_cares = 0;
    for dialog in &dialogs {
        check_dialog(&domain, dialog);
        for turn in dialog {
            if let TurnRecord::System { actions, .. } = turn {
                for act in actions.iter().filter(|a| a.act == "query") {
                    let map = act.parameters[0].as_object().unwrap();
                    dont_cares += map
                        .values()
                        .filter(|v| v.as_str() == Some("dont_care"))
                        .count();
                }
            }
        }
    }
    assert!(dont_cares > 0, "no dont_care query entry in 50 mix sessions");
}

#[test]
fn env_profile_varies_confidence_within_bounds() {
    let (domain, dialogs) = generate("weather", Profile::Env, 20, 47);
    let mut confs = Vec::new();
    for dialog in &dialogs {
        check_dialog(&domain, dialog);
        for turn in dialog {
            if let TurnRecord::User { conf, .. } = turn {
                confs.push(*conf);
            }
        }
    }
    assert!(confs.iter().all(|c| (0.1..=0.99).contains(c)));
    let min = confs.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = confs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert!(max - min > 0.1, "env confidences barely vary: {min}..{max}");
}

#[test]
fn prop_profile_answers_yn_questions_with_a_verdict() {
    let (domain, dialogs) = generate("restaurant", Profile::Prop, 30, 61);
    let mut questions = 0;
    let mut verdicts = 0;
    for dialog in &dialogs {
        check_dialog(&domain, dialog);
        for turn in dialog {
            match turn {
                TurnRecord::User { actions, .. } => {
                    questions += actions
                        .iter()
                        .filter(|a| matches!(a, UserAct::YnQuestion { .. }))
                        .count();
                }
                TurnRecord::System { utt, .. } => {
                    if utt.contains("Yes, ") || utt.contains("No, ") {
                        verdicts += 1;
                    }
                }
            }
        }
    }
    assert!(questions > 0, "no yn question in 30 prop sessions");
    assert!(verdicts > 0, "yn questions never answered with a verdict");
}
