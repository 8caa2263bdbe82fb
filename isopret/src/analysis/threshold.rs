//! Bayesian FDR control over posterior error probabilities.
//!
//! The mean PEP of all calls below a cutoff is the expected proportion of false discoveries among
//! them. We scan a fixed grid of cutoffs and keep the largest one whose mean stays within the
//! desired FDR. PEPs above [`MAX_PEP`] are never called significant.

use tracing::{debug, warn};

use crate::error::IsopretError;

pub const DEFAULT_FDR: f64 = 0.01;
/// Largest PEP cutoff we ever return.
pub const MAX_PEP: f64 = 0.25;
/// Spacing of the candidate cutoff grid.
pub const PEP_STEP: f64 = 0.01;

const N_CANDIDATES: usize = 25;

/// PEP cutoff selection for one list of posterior error probabilities.
#[derive(Debug, Clone)]
pub struct PepThreshold {
    probabilities: Vec<f64>,
    fdr: f64,
}

impl PepThreshold {
    pub fn new(mut probabilities: Vec<f64>, fdr: f64) -> Self {
        probabilities.sort_by(f64::total_cmp);
        Self { probabilities, fdr }
    }

    pub fn with_default_fdr(probabilities: Vec<f64>) -> Self {
        Self::new(probabilities, DEFAULT_FDR)
    }

    pub fn fdr(&self) -> f64 {
        self.fdr
    }

    /// Candidate cutoffs `0.01, 0.02, ..., 0.25`.
    pub fn candidates() -> impl Iterator<Item = f64> {
        (1..=N_CANDIDATES).map(|k| k as f64 * PEP_STEP)
    }

    /// Mean of all PEPs strictly below `cutoff`; `None` when nothing is selected.
    pub fn mean_below(&self, cutoff: f64) -> Option<f64> {
        let n = self.probabilities.partition_point(|&p| p < cutoff);
        if n == 0 {
            return None;
        }
        let sum: f64 = self.probabilities[..n].iter().sum();
        Some(sum / n as f64)
    }

    /// The largest grid cutoff whose selection keeps the estimated FDR at or below the target.
    ///
    /// Returns 0.0 if even the smallest cutoff fails (nothing is significant) or if there are no
    /// PEPs at all, and [`MAX_PEP`] if every cutoff passes.
    ///
    /// The FDR estimate for a cutoff `t` is the mean of the PEPs strictly below `t`, while callers
    /// select items with `pep <= t`. A PEP lying exactly on the returned grid value is therefore
    /// selected without having been counted in the estimate.
    pub fn pep_threshold(&self) -> f64 {
        if self.probabilities.is_empty() {
            warn!(
                "{}",
                IsopretError::DegenerateInput("no PEPs to derive a threshold from, using 0".into())
            );
            return 0.0;
        }

        let mut accepted = None;
        for cutoff in Self::candidates() {
            // An empty selection makes no false discoveries.
            let passes = self.mean_below(cutoff).map_or(true, |mean| mean <= self.fdr);
            if !passes {
                let threshold = accepted.unwrap_or(0.0);
                debug!(
                    "FDR {} exceeded at PEP cutoff {:.2}, using {:.2} ({} PEPs)",
                    self.fdr,
                    cutoff,
                    threshold,
                    self.probabilities.len()
                );
                return threshold;
            }
            accepted = Some(cutoff);
        }
        MAX_PEP
    }
}

/// Convenience wrapper around [`PepThreshold::pep_threshold`].
pub fn select_pep_threshold(peps: Vec<f64>, fdr: f64) -> f64 {
    PepThreshold::new(peps, fdr).pep_threshold()
}
