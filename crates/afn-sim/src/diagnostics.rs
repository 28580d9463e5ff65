//! Throttled recurring warnings.
//!
//! A condition that repeats every timestep is logged the first
//! `warning_limit` times; afterwards it is only counted, together with the
//! range of the offending value, and can be summarized at the end of a run.

use tracing::warn;

/// Kinds of recurring conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    NotConverged,
    SingularMatrix,
    PressureOutOfRange,
    FlowOutOfRange,
}

impl WarningKind {
    pub const ALL: [WarningKind; 4] = [
        WarningKind::NotConverged,
        WarningKind::SingularMatrix,
        WarningKind::PressureOutOfRange,
        WarningKind::FlowOutOfRange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::NotConverged => "not converged",
            WarningKind::SingularMatrix => "singular matrix",
            WarningKind::PressureOutOfRange => "pressure out of range",
            WarningKind::FlowOutOfRange => "flow out of range",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Occurrences of one kind of warning.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RecurringWarning {
    pub count: usize,
    pub min_value: f64,
    pub max_value: f64,
}

impl RecurringWarning {
    fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min_value = value;
            self.max_value = value;
        } else {
            self.min_value = self.min_value.min(value);
            self.max_value = self.max_value.max(value);
        }
        self.count += 1;
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostics {
    warning_limit: usize,
    warnings: [RecurringWarning; 4],
}

impl Diagnostics {
    pub fn new(warning_limit: usize) -> Self {
        Self {
            warning_limit,
            warnings: [RecurringWarning::default(); 4],
        }
    }

    /// Count an occurrence and log it while under the limit.
    ///
    /// `value` is the quantity tracked for the summary (residual, pressure,
    /// flow). The message is only built while under the limit, whether or
    /// not a subscriber is listening.
    pub fn record(&mut self, kind: WarningKind, value: f64, message: impl FnOnce() -> String) {
        let entry = &mut self.warnings[kind.slot()];
        entry.record(value);
        let count = entry.count;
        if count <= self.warning_limit {
            let message = message();
            warn!(kind = kind.as_str(), count, "{message}");
            if count == self.warning_limit {
                warn!(
                    kind = kind.as_str(),
                    "warning limit reached, further occurrences are only counted"
                );
            }
        }
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings[kind.slot()].count
    }

    pub fn warning(&self, kind: WarningKind) -> &RecurringWarning {
        &self.warnings[kind.slot()]
    }

    pub fn total(&self) -> usize {
        self.warnings.iter().map(|w| w.count).sum()
    }

    /// Kinds that occurred at least once, with their statistics.
    pub fn summary(&self) -> Vec<(WarningKind, RecurringWarning)> {
        WarningKind::ALL
            .iter()
            .map(|k| (*k, self.warnings[k.slot()]))
            .filter(|(_, w)| w.count > 0)
            .collect()
    }

    /// Log one line per kind that occurred.
    pub fn log_summary(&self) {
        for (kind, w) in self.summary() {
            warn!(
                kind = kind.as_str(),
                count = w.count,
                min = w.min_value,
                max = w.max_value,
                "recurring airflow network warning"
            );
        }
    }

    pub fn reset(&mut self) {
        self.warnings = [RecurringWarning::default(); 4];
    }
}
