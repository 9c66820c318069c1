use std::fmt;

/// A single schema violation reported by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending part of the document (`""` is the root).
    pub instance_path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Result of checking a document against a schema.
///
/// `is_valid()` is true exactly when there are no violations. Violations are
/// kept in engine order, which is not a stable contract.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    violations: Vec<Violation>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self::default()
    }

    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violation messages rendered as `pointer: message`.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}
