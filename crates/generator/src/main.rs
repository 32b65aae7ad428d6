//! dialog-sim entry point
//!
//! Runs a matrix of (domain × complexity profile) corpora: a test set and
//! a train set for each combination, written under `<out>/test/` and
//! `<out>/train/`.

use std::collections::hash_map::DefaultHasher;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dialog_sim_core::complexity::Profile;
use dialog_sim_domain::{catalog, DomainSpec};
use dialog_sim_generator::{gen_corpus, OutputFormat};

const LOG_FILE: &str = "dialog-sim.log";

#[derive(Parser)]
#[command(
    name = "dialog-sim",
    version,
    about = "Synthesize task-oriented dialog corpora for slot-filling domains."
)]
struct Cli {
    /// Domains to generate, comma separated (default: all built-ins)
    #[arg(long, value_delimiter = ',')]
    domains: Vec<String>,

    /// Complexity profiles, comma separated (default: Clean,Mix)
    #[arg(long, value_delimiter = ',')]
    profiles: Vec<String>,

    /// Sessions per test corpus
    #[arg(long, default_value_t = 500)]
    test_size: usize,

    /// Sessions per train corpus
    #[arg(long, default_value_t = 2000)]
    train_size: usize,

    /// Output root; test/ and train/ are created below it
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Base seed; every corpus derives its own seed from this
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write plain-text transcripts instead of JSON
    #[arg(long)]
    text: bool,

    /// Log to stderr at debug level instead of the log file
    #[arg(long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let domains = resolve_domains(&cli.domains)?;
    let profiles = resolve_profiles(&cli.profiles)?;
    let format = if cli.text {
        OutputFormat::Text
    } else {
        OutputFormat::Json
    };

    tracing::info!(
        domains = domains.len(),
        profiles = profiles.len(),
        test_size = cli.test_size,
        train_size = cli.train_size,
        "starting corpus matrix"
    );

    for spec in &domains {
        for profile in &profiles {
            for (split, size) in [("test", cli.test_size), ("train", cli.train_size)] {
                if size == 0 {
                    continue;
                }
                let corpus_seed = derive_seed(cli.seed, &spec.name, profile.name(), split, size);
                let out_dir = cli.out.join(split);
                gen_corpus(spec, *profile, size, &out_dir, corpus_seed, format).with_context(
                    || {
                        format!(
                            "generating {split} corpus for {} / {}",
                            spec.name,
                            profile.name()
                        )
                    },
                )?;
            }
        }
    }

    tracing::info!("corpus matrix complete");
    Ok(())
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    if debug {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let file = File::create(LOG_FILE).context("creating log file")?;
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }
    Ok(())
}

fn resolve_domains(names: &[String]) -> anyhow::Result<Vec<DomainSpec>> {
    if names.is_empty() {
        return Ok(catalog::all());
    }
    let mut specs = Vec::with_capacity(names.len());
    for name in names {
        match catalog::by_name(name) {
            Some(spec) => specs.push(spec),
            None => bail!(
                "unknown domain {name:?}; built-ins are: {}",
                catalog::NAMES.join(", ")
            ),
        }
    }
    Ok(specs)
}

fn resolve_profiles(names: &[String]) -> anyhow::Result<Vec<Profile>> {
    if names.is_empty() {
        return Ok(vec![Profile::Clean, Profile::Mix]);
    }
    names
        .iter()
        .map(|name| name.parse::<Profile>().map_err(anyhow::Error::msg))
        .collect()
}

/// Stable per-corpus seed so test/train and every (domain, profile) pair
/// draw independent random streams from one base seed.
fn derive_seed(base: u64, domain: &str, profile: &str, split: &str, size: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    (base, domain, profile, split, size).hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        assert_eq!(resolve_domains(&[]).unwrap().len(), catalog::NAMES.len());
        assert_eq!(
            resolve_profiles(&[]).unwrap(),
            vec![Profile::Clean, Profile::Mix]
        );
    }

    #[test]
    fn test_resolve_rejects_unknown() {
        assert!(resolve_domains(&["karaoke".into()]).is_err());
        assert!(resolve_profiles(&["loud".into()]).is_err());
    }

    #[test]
    fn test_derived_seeds_differ_by_split() {
        let test = derive_seed(0, "bus", "Clean", "test", 500);
        let train = derive_seed(0, "bus", "Clean", "train", 2000);
        assert_ne!(test, train);
        assert_eq!(test, derive_seed(0, "bus", "Clean", "test", 500));
    }
}
