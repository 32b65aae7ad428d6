//! Reserved meta-slot names
//!
//! Meta-slots never appear in a domain's declared slot lists; they address
//! the database entry itself and the open-ended phases of the dialog.

/// The database entry identifier, always the first system goal.
pub const DEFAULT: &str = "#default";

/// The open-ended "what do you want" request target.
pub const NEED: &str = "#need";

/// The "is that all" request target after an inform.
pub const HAPPY: &str = "#happy";

/// Marker appended to acts re-emitted after an ask-rephrase.
pub const AGAIN: &str = "#again";

/// Marker appended to inform acts the user will verbally self-correct.
pub const SELF_CORRECT: &str = "#self_correct";
