//! Synthetic database
//!
//! Each column's value distribution is drawn once from a Dirichlet prior,
//! then rows are sampled IID from those per-column PDFs. The user-side and
//! system-side tables are aligned by row index, and column 0 of the system
//! side is the row index itself (the `#default` entry id). Inverse indexes
//! make SELECT proportional to the match count, not the table size.

use std::collections::BTreeSet;

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::Rng;
use statrs::distribution::Gamma;

#[derive(Debug, Clone)]
pub struct Database {
    num_rows: usize,
    usr_table: Vec<Vec<usize>>,
    /// System rows; column 0 is the row id, remaining columns follow the
    /// declared system slots.
    sys_table: Vec<Vec<usize>>,
    /// Per user column, per value: the rows holding that value.
    indexes: Vec<Vec<BTreeSet<usize>>>,
}

impl Database {
    /// Sample a database. Priors are per-column Dirichlet concentration
    /// vectors, one entry per vocabulary word; the system priors exclude
    /// the synthetic `#default` column.
    pub fn build(
        usr_priors: &[Vec<f64>],
        sys_priors: &[Vec<f64>],
        num_rows: usize,
        rng: &mut StdRng,
    ) -> Self {
        let usr_pdfs: Vec<Vec<f64>> = usr_priors.iter().map(|p| sample_pdf(p, rng)).collect();
        let sys_pdfs: Vec<Vec<f64>> = sys_priors.iter().map(|p| sample_pdf(p, rng)).collect();

        let mut usr_table = vec![Vec::with_capacity(usr_pdfs.len()); num_rows];
        let mut indexes = Vec::with_capacity(usr_pdfs.len());
        for pdf in &usr_pdfs {
            let mut index = vec![BTreeSet::new(); pdf.len()];
            for (row, cells) in usr_table.iter_mut().enumerate() {
                let value = sample_value(pdf, rng);
                cells.push(value);
                index[value].insert(row);
            }
            indexes.push(index);
        }

        let mut sys_table: Vec<Vec<usize>> = (0..num_rows).map(|row| vec![row]).collect();
        for pdf in &sys_pdfs {
            for cells in sys_table.iter_mut() {
                cells.push(sample_value(pdf, rng));
            }
        }

        let db = Self {
            num_rows,
            usr_table,
            sys_table,
            indexes,
        };
        tracing::info!(
            rows = db.num_rows,
            distinct = db.distinct_user_rows(),
            attributes = db.indexes.len(),
            "database ready"
        );
        db
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Rows satisfying every non-null query entry. A `None` entry never
    /// filters; an empty result is legal and returned as-is.
    pub fn select(&self, query: &[Option<usize>]) -> Vec<usize> {
        let mut surviving: Option<BTreeSet<usize>> = None;
        for (column, entry) in query.iter().enumerate() {
            let value = match entry {
                Some(value) => *value,
                None => continue,
            };
            let matches = match self.indexes.get(column).and_then(|idx| idx.get(value)) {
                Some(matches) => matches,
                None => return Vec::new(),
            };
            surviving = Some(match surviving {
                None => matches.clone(),
                Some(prev) => prev.intersection(matches).copied().collect(),
            });
            if surviving.as_ref().map(|s| s.is_empty()).unwrap_or(false) {
                return Vec::new();
            }
        }
        match surviving {
            Some(set) => set.into_iter().collect(),
            None => (0..self.num_rows).collect(),
        }
    }

    /// The system-side value at (row, column). Column 0 is the row id.
    pub fn system_value(&self, row: usize, column: usize) -> Option<usize> {
        self.sys_table.get(row).and_then(|cells| cells.get(column)).copied()
    }

    /// The user-side row contents.
    pub fn user_row(&self, row: usize) -> Option<&[usize]> {
        self.usr_table.get(row).map(|cells| cells.as_slice())
    }

    /// A uniform draw over the *distinct* user-side rows.
    pub fn sample_unique_row(&self, rng: &mut StdRng) -> Vec<usize> {
        let unique: BTreeSet<&Vec<usize>> = self.usr_table.iter().collect();
        let pick = rng.gen_range(0..unique.len());
        unique
            .into_iter()
            .nth(pick)
            .cloned()
            .unwrap_or_default()
    }

    pub fn distinct_user_rows(&self) -> usize {
        self.usr_table.iter().collect::<BTreeSet<_>>().len()
    }
}

/// One draw from a Dirichlet prior, via normalized Gamma samples.
fn sample_pdf(prior: &[f64], rng: &mut StdRng) -> Vec<f64> {
    let mut pdf: Vec<f64> = prior
        .iter()
        .map(|&alpha| {
            if alpha <= 0.0 {
                return 0.0;
            }
            match Gamma::new(alpha, 1.0) {
                Ok(gamma) => gamma.sample(rng),
                Err(_) => 0.0,
            }
        })
        .collect();
    let total: f64 = pdf.iter().sum();
    if total > 0.0 {
        for p in pdf.iter_mut() {
            *p /= total;
        }
    } else {
        let uniform = 1.0 / pdf.len().max(1) as f64;
        for p in pdf.iter_mut() {
            *p = uniform;
        }
    }
    pdf
}

fn sample_value(pdf: &[f64], rng: &mut StdRng) -> usize {
    let mut remaining = rng.gen::<f64>();
    for (value, p) in pdf.iter().enumerate() {
        remaining -= p;
        if remaining <= 0.0 {
            return value;
        }
    }
    pdf.len().saturating_sub(1)
}
