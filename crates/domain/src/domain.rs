//! Runtime domain assembly
//!
//! Builds the agent-facing view out of a [`DomainSpec`]: prefixed slots
//! with template pools attached, the synthetic `#default` entry-id slot in
//! front of the system slots, and a sampled database with uniform
//! Dirichlet priors.

use rand::rngs::StdRng;

use dialog_sim_core::error::{Result, SimError};
use dialog_sim_core::meta;

use crate::database::Database;
use crate::slot::Slot;
use crate::spec::DomainSpec;

#[derive(Debug)]
pub struct Domain {
    pub name: String,
    pub greet: String,
    pub usr_slots: Vec<Slot>,
    /// System slots; index 0 is always the synthetic `#default` slot whose
    /// vocabulary is the stringified row ids.
    pub sys_slots: Vec<Slot>,
    pub db: Database,
    spec: DomainSpec,
}

impl Domain {
    pub fn build(spec: DomainSpec, rng: &mut StdRng) -> Result<Self> {
        if spec.db_size == 0 {
            return Err(SimError::Domain(format!("{}: db_size must be > 0", spec.name)));
        }

        let mut usr_slots: Vec<Slot> = spec
            .usr_slots
            .iter()
            .map(|s| {
                Slot::new(
                    format!("#{}", s.name),
                    s.description.clone(),
                    s.vocabulary.clone(),
                )
            })
            .collect();

        let mut sys_slots = Vec::with_capacity(spec.sys_slots.len() + 1);
        sys_slots.push(Slot::new(
            meta::DEFAULT.to_string(),
            String::new(),
            (0..spec.db_size).map(|row| row.to_string()).collect(),
        ));
        for s in &spec.sys_slots {
            sys_slots.push(Slot::new(
                format!("#{}", s.name),
                s.description.clone(),
                s.vocabulary.clone(),
            ));
        }

        for (raw_name, bundle) in &spec.nlg {
            let slot_name = format!("#{raw_name}");
            let slot = usr_slots
                .iter_mut()
                .chain(sys_slots.iter_mut())
                .find(|slot| slot.name == slot_name)
                .ok_or_else(|| {
                    SimError::Domain(format!(
                        "{}: nlg bundle {slot_name} matches no declared slot",
                        spec.name
                    ))
                })?;
            slot.informs.extend(bundle.inform.iter().cloned());
            slot.requests.extend(bundle.request.iter().cloned());
            for (value, pool) in &bundle.yn_question {
                slot.yn_questions
                    .entry(value.clone())
                    .or_default()
                    .extend(pool.iter().cloned());
            }
        }

        for slot in usr_slots.iter().chain(sys_slots.iter()) {
            if slot.dim() == 0 {
                return Err(SimError::Domain(format!(
                    "{}: slot {} has an empty vocabulary",
                    spec.name, slot.name
                )));
            }
        }

        // Uniform priors; #default is the key column and carries no prior.
        let usr_priors: Vec<Vec<f64>> = usr_slots.iter().map(|s| vec![1.0; s.dim()]).collect();
        let sys_priors: Vec<Vec<f64>> = sys_slots[1..].iter().map(|s| vec![1.0; s.dim()]).collect();
        let db = Database::build(&usr_priors, &sys_priors, spec.db_size, rng);

        Ok(Self {
            name: spec.name.clone(),
            greet: spec.greet.clone(),
            usr_slots,
            sys_slots,
            db,
            spec,
        })
    }

    /// The declarative spec this domain was built from (the corpus `meta`).
    pub fn spec(&self) -> &DomainSpec {
        &self.spec
    }

    pub fn usr_slot(&self, name: &str) -> Option<&Slot> {
        self.usr_slots.iter().find(|slot| slot.name == name)
    }

    pub fn usr_slot_index(&self, name: &str) -> Option<usize> {
        self.usr_slots.iter().position(|slot| slot.name == name)
    }

    pub fn sys_slot(&self, name: &str) -> Option<&Slot> {
        self.sys_slots.iter().find(|slot| slot.name == name)
    }

    /// Position of a system slot; 0 is `#default`, matching the system-side
    /// database column layout.
    pub fn sys_slot_index(&self, name: &str) -> Option<usize> {
        self.sys_slots.iter().position(|slot| slot.name == name)
    }

    pub fn is_usr_slot(&self, name: &str) -> bool {
        self.usr_slot(name).is_some()
    }
}
