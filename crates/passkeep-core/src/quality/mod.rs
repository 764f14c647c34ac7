//! Password quality estimation.
//!
//! A password is split into overlapping candidate patterns (single
//! characters, repeated blocks, digit runs, constant-step sequences and
//! popular-password matches, leetspeak included). The estimate is the
//! description length in bits of the cheapest segmentation, found by a
//! time-bounded search.
//!
//! ```
//! use passkeep_core::quality::estimate_password_bits;
//!
//! let weak: Vec<char> = "password".chars().collect();
//! let strong: Vec<char> = "kX9#mQ2$vL7@".chars().collect();
//! assert!(estimate_password_bits(&weak) < estimate_password_bits(&strong));
//! ```

pub mod char_class;
pub mod dictionary;
pub mod encoder;
pub mod patterns;
pub mod search;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::config::EstimatorConfig;

pub use char_class::CharClass;
pub use dictionary::PopularPasswords;
pub use patterns::{PatternClass, PatternInstance};

/// One piece of the winning segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub length: usize,
    pub class: PatternClass,
    pub tag: char,
    /// Raw pattern cost in bits, before the coders are applied.
    pub cost: f64,
}

impl From<&PatternInstance> for Segment {
    fn from(pi: &PatternInstance) -> Self {
        Self {
            start: pi.start,
            length: pi.length,
            class: pi.class,
            tag: pi.class.tag(),
            cost: pi.cost,
        }
    }
}

/// Full result of one estimate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub bits: u32,
    pub min_cost: f64,
    pub paths_evaluated: u64,
    pub budget_exhausted: bool,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
pub struct QualityEstimator {
    config: EstimatorConfig,
    dictionary: Arc<PopularPasswords>,
}

impl Default for QualityEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default(), PopularPasswords::builtin())
    }
}

impl QualityEstimator {
    pub fn new(config: EstimatorConfig, dictionary: Arc<PopularPasswords>) -> Self {
        Self { config, dictionary }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &Arc<PopularPasswords> {
        &self.dictionary
    }

    /// Estimated strength in bits. Empty input gives 0.
    pub fn estimate_bits(&self, password: &[char]) -> u32 {
        self.report(password).bits
    }

    /// Same as [`estimate_bits`](Self::estimate_bits) for UTF-8 bytes;
    /// invalid sequences become U+FFFD.
    pub fn estimate_bits_utf8(&self, password: &[u8]) -> u32 {
        let chars: Vec<char> = String::from_utf8_lossy(password).chars().collect();
        self.estimate_bits(&chars)
    }

    /// Estimate plus the segmentation that produced it.
    ///
    /// Never panics: an internal failure is logged and reported as 0 bits.
    pub fn report(&self, password: &[char]) -> QualityReport {
        match panic::catch_unwind(AssertUnwindSafe(|| self.report_inner(password))) {
            Ok(report) => report,
            Err(_) => {
                error!("quality estimate panicked; reporting 0 bits");
                QualityReport::default()
            }
        }
    }

    fn report_inner(&self, password: &[char]) -> QualityReport {
        let password = match self.config.max_password_len {
            Some(max) if password.len() > max => {
                debug!("estimating on the first {max} of {} chars", password.len());
                &password[..max]
            }
            _ => password,
        };
        if password.is_empty() {
            return QualityReport::default();
        }

        let started = Instant::now();
        let deadline = started + Duration::from_millis(self.config.time_budget_ms);
        let patterns = patterns::discover(password, &self.dictionary, deadline);
        let outcome = search::search(password, &patterns, deadline);

        if outcome.budget_exhausted {
            warn!(
                "quality search hit its {} ms budget after {} paths ({} chars)",
                self.config.time_budget_ms,
                outcome.paths_evaluated,
                password.len()
            );
        }
        debug!(
            "quality estimate: {:.3} bits, {} paths in {:?}",
            outcome.min_cost,
            outcome.paths_evaluated,
            started.elapsed()
        );

        QualityReport {
            bits: outcome.min_cost.ceil().max(0.0) as u32,
            min_cost: outcome.min_cost,
            paths_evaluated: outcome.paths_evaluated,
            budget_exhausted: outcome.budget_exhausted,
            segments: outcome.path.iter().map(Segment::from).collect(),
        }
    }
}

/// Estimate with the default budget and the built-in dictionary.
pub fn estimate_password_bits(password: &[char]) -> u32 {
    QualityEstimator::default().estimate_bits(password)
}
