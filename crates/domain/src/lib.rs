//! Slot-filling domain model
//!
//! A domain is declared as plain data (`DomainSpec`): named user slots the
//! user can constrain, system slots the system can answer, per-slot surface
//! templates, and a database size. `Domain::build` turns a spec into the
//! runtime view the agents work against: "#"-prefixed [`Slot`]s with their
//! template pools, a synthetic `#default` entry-id slot, and a freshly
//! sampled [`Database`].

pub mod catalog;
pub mod database;
pub mod domain;
pub mod slot;
pub mod spec;

pub use database::Database;
pub use domain::Domain;
pub use slot::Slot;
pub use spec::{DomainSpec, NlgBundle, SlotSpec};
