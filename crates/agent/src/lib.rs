//! Dialog agents
//!
//! The two halves of every session and the machinery between them:
//! - [`SystemAgent`]: belief tracker plus a rule policy over per-slot
//!   confidence bands; decides when to request, confirm, query, and inform
//! - [`UserAgent`]: goal-driven simulator reacting to each system act
//! - [`ActionChannel`] / [`WordChannel`]: the noisy path user acts and
//!   words take on their way to the system
//! - [`SysNlg`] / [`UserNlg`]: template surface realization

pub mod belief;
pub mod channel;
pub mod nlg;
pub mod system;
pub mod user;

pub use belief::{BeliefGoal, BeliefSlot};
pub use channel::{ActionChannel, WordChannel};
pub use nlg::{SysNlg, UserNlg};
pub use system::{SystemAgent, SystemStep};
pub use user::{UserAgent, UserStep};
