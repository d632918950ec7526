// src/report/mod.rs

use colored::Colorize;

use crate::model::ObjectKind;
use crate::submit::SubmissionOutcome;

/// Aggregate over a run's submission outcomes.
///
/// Built as a pure fold: feeding outcomes one at a time through [`record`]
/// and folding a materialized sequence through [`from_outcomes`] give the
/// same result for the same sequence.
///
/// [`record`]: BatchResult::record
/// [`from_outcomes`]: BatchResult::from_outcomes
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub total: usize,
    pub polyanets: usize,
    pub soloons: usize,
    pub comeths: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Every failed outcome, in submission order.
    pub failures: Vec<SubmissionOutcome>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one outcome into the aggregate.
    pub fn record(&mut self, outcome: SubmissionOutcome) {
        self.total += 1;
        match outcome.kind {
            ObjectKind::Polyanet => self.polyanets += 1,
            ObjectKind::Soloon => self.soloons += 1,
            ObjectKind::Cometh => self.comeths += 1,
        }
        if outcome.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            self.failures.push(outcome);
        }
    }

    /// One-pass aggregation over a materialized sequence.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = SubmissionOutcome>) -> Self {
        let mut result = Self::new();
        for outcome in outcomes {
            result.record(outcome);
        }
        result
    }

    pub fn is_fully_successful(&self) -> bool {
        self.failed == 0
    }

    /// Prints the run summary: totals, per-kind counts, and one line per
    /// failure with enough detail to retry that cell by hand.
    pub fn print_summary(&self) {
        println!();
        println!("{}", "=== Megaverse build summary ===".bold());
        println!(
            "objects: {} (polyanets {}, soloons {}, comeths {})",
            self.total, self.polyanets, self.soloons, self.comeths
        );
        println!(
            "succeeded: {}  failed: {}",
            self.succeeded.to_string().green(),
            if self.failed == 0 {
                self.failed.to_string().green()
            } else {
                self.failed.to_string().red()
            }
        );

        if self.is_fully_successful() {
            println!("{}", "All objects placed.".green().bold());
            return;
        }

        println!("{}", "Failed objects:".red().bold());
        for outcome in &self.failures {
            println!(
                "  {} {}: {}",
                outcome.kind,
                outcome.position,
                outcome.error.as_deref().unwrap_or("no error recorded")
            );
        }
    }
}
