//! Start-up strategy and solve mode.
//!
//! The initialization type decides how the first Newton iterate of a solve
//! is produced; the solve mode decides whether Newton iterations follow.

/// How the solver obtains its first iterate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitializationType {
    /// Run one pass with every element on its laminar branch before the
    /// Newton iterations. Robust from a cold start.
    #[default]
    LinearInitialization,

    /// Start from zero unknown pressures on the first solve of a run and
    /// from the previous solution afterwards.
    ZeroNodePressures,
}

impl InitializationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitializationType::LinearInitialization => "LinearInitialization",
            InitializationType::ZeroNodePressures => "ZeroNodePressures",
        }
    }

    /// Whether the laminar pass runs before Newton iterations.
    pub fn uses_linear_pass(&self) -> bool {
        matches!(self, InitializationType::LinearInitialization)
    }
}

/// What a solve call does after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveMode {
    #[default]
    IterateToConvergence,
    /// Stop after the laminar pass.
    InitializationOnly,
}

impl SolveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveMode::IterateToConvergence => "IterateToConvergence",
            SolveMode::InitializationOnly => "InitializationOnly",
        }
    }
}
