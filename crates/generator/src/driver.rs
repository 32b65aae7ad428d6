//! Session driver
//!
//! Runs one conversation to termination: the system decides, its acts are
//! rendered and recorded, the user reacts, and the user's acts pass
//! through the action and word channels before the system hears them on
//! the next iteration. The first system step happens with no user input,
//! so the system always opens.

use std::sync::Arc;

use rand::rngs::StdRng;

use dialog_sim_agent::{ActionChannel, SysNlg, SystemAgent, UserAgent, UserNlg, WordChannel};
use dialog_sim_core::action::UserAct;
use dialog_sim_core::complexity::Complexity;
use dialog_sim_core::error::Result;
use dialog_sim_domain::Domain;

use crate::corpus::{Dialog, TurnRecord};

/// Hard ceiling on recorded turns per session. A session that reaches it
/// is abandoned where it stands and written with a failure reward; it
/// never takes the rest of the corpus down with it.
pub const TURN_CEILING: usize = 200;

/// A finished session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub dialog: Dialog,
    /// +1 when the user left with every goal answered, else -1.
    pub reward: f64,
}

/// Generate one complete dialog session.
pub fn run_session(
    domain: &Arc<Domain>,
    complexity: &Complexity,
    rng: &mut StdRng,
) -> Result<SessionOutcome> {
    let mut system = SystemAgent::new(domain.clone());
    let mut user = UserAgent::new(domain.clone(), complexity.clone(), rng);
    let action_channel = ActionChannel::new(domain.clone(), complexity.clone());
    let word_channel = WordChannel::new(complexity.clone());
    let sys_nlg = SysNlg::new(domain.clone());
    let usr_nlg = UserNlg::new(domain.clone());

    let mut dialog: Dialog = Vec::new();
    let mut noisy_acts: Vec<UserAct> = Vec::new();
    let mut conf = 1.0;

    loop {
        if dialog.len() > TURN_CEILING {
            tracing::warn!(
                turns = dialog.len(),
                "session hit the turn ceiling, abandoning it"
            );
            return Ok(SessionOutcome {
                dialog,
                reward: -1.0,
            });
        }

        let step = system.step(&noisy_acts, conf)?;
        let (sys_utt, lexicalized) = sys_nlg.generate(&step.acts, rng)?;
        dialog.push(TurnRecord::System {
            utt: sys_utt,
            actions: lexicalized,
            domain: domain.name.clone(),
            state: step.summary,
        });
        if step.terminal {
            break;
        }

        let user_step = user.step(&step.acts, rng)?;
        let (acts, new_conf) = action_channel.transmit(&user_step.acts, rng);
        noisy_acts = acts;
        conf = new_conf;

        let user_utt = usr_nlg.generate(&noisy_acts, rng)?;
        let user_utt = word_channel.transmit(&user_utt, rng);
        dialog.push(TurnRecord::User {
            utt: user_utt,
            actions: noisy_acts.clone(),
            conf,
            domain: domain.name.clone(),
        });
    }

    let reward = user.reward();
    tracing::debug!(turns = dialog.len(), reward, "session finished");
    Ok(SessionOutcome { dialog, reward })
}
