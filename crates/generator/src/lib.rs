//! Corpus generation
//!
//! Ties the agents, channels, and NLG into whole corpora: N independent
//! sessions over one (domain, complexity) pair, written as a single JSON
//! (or plain-text) file. Sessions are seeded individually off the corpus
//! seed, so any corpus (and any single dialog in it) can be reproduced.

pub mod corpus;
pub mod driver;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use dialog_sim_core::complexity::Profile;
use dialog_sim_core::error::SimError;
use dialog_sim_domain::{Domain, DomainSpec};

pub use corpus::{Corpus, CorpusStats, Dialog, TurnRecord};
pub use driver::{run_session, SessionOutcome, TURN_CEILING};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("simulation failed: {0}")]
    Sim(#[from] SimError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output encoding of a corpus file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

/// How often the session loop reports progress.
const PROGRESS_EVERY: usize = 100;

/// Generate `size` sessions for one (domain, profile) pair and write them
/// under `out_dir` as `<domain>-<profile>-<size>.<ext>`. Returns the
/// written path.
///
/// The domain database is sampled from `seed`; session `k` runs on its own
/// child RNG seeded with `seed + k + 1`.
pub fn gen_corpus(
    spec: &DomainSpec,
    profile: Profile,
    size: usize,
    out_dir: &Path,
    seed: u64,
    format: OutputFormat,
) -> Result<PathBuf, GeneratorError> {
    fs::create_dir_all(out_dir)?;

    let mut corpus_rng = StdRng::seed_from_u64(seed);
    let domain = Arc::new(Domain::build(spec.clone(), &mut corpus_rng)?);
    let complexity = profile.complexity();

    tracing::info!(domain = %spec.name, profile = %profile, size, seed, "generating corpus");

    let mut dialogs = Vec::with_capacity(size);
    let mut rewards_won = 0usize;
    for session in 0..size {
        let mut session_rng = StdRng::seed_from_u64(seed.wrapping_add(session as u64 + 1));
        let outcome = run_session(&domain, &complexity, &mut session_rng)?;
        if outcome.reward > 0.0 {
            rewards_won += 1;
        }
        dialogs.push(outcome.dialog);
        if (session + 1) % PROGRESS_EVERY == 0 {
            tracing::info!(done = session + 1, total = size, domain = %spec.name, "progress");
        }
    }

    let stats = CorpusStats::compute(&dialogs);
    stats.log();
    tracing::info!(
        successful = rewards_won,
        total = size,
        "sessions with all goals met"
    );

    let file_name = format!(
        "{}-{}-{}.{}",
        spec.name,
        profile.name(),
        size,
        format.extension()
    );
    let path = out_dir.join(file_name);
    let corpus = Corpus {
        dialogs,
        meta: spec.clone(),
    };
    match format {
        OutputFormat::Json => corpus.write_json(&path)?,
        OutputFormat::Text => corpus.write_text(&path)?,
    }
    tracing::info!(path = %path.display(), "corpus written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialog_sim_domain::catalog;

    #[test]
    fn test_gen_corpus_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = gen_corpus(
            &catalog::weather(),
            Profile::Clean,
            3,
            dir.path(),
            42,
            OutputFormat::Json,
        )
        .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "weather-Clean-3.json"
        );
        let content = fs::read_to_string(&path).unwrap();
        let corpus: Corpus = serde_json::from_str(&content).unwrap();
        assert_eq!(corpus.dialogs.len(), 3);
        assert_eq!(corpus.meta.name, "weather");
    }

    #[test]
    fn test_gen_corpus_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let a = gen_corpus(
            &catalog::weather(),
            Profile::Mix,
            2,
            &dir.path().join("a"),
            7,
            OutputFormat::Json,
        )
        .unwrap();
        let b = gen_corpus(
            &catalog::weather(),
            Profile::Mix,
            2,
            &dir.path().join("b"),
            7,
            OutputFormat::Json,
        )
        .unwrap();
        assert_eq!(
            fs::read_to_string(a).unwrap(),
            fs::read_to_string(b).unwrap()
        );
    }

    #[test]
    fn test_text_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = gen_corpus(
            &catalog::weather(),
            Profile::Clean,
            2,
            dir.path(),
            42,
            OutputFormat::Text,
        )
        .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("## DIALOG 0 ##"));
        assert!(content.contains("## DIALOG 1 ##"));
        assert!(content.contains("SYS -> "));
        assert!(content.contains(")-> "));
    }
}
