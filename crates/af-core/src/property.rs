//! Property verification types.
//!
//! Properties are named invariants checked against a synthesized tree.
//! Each result names the rule and, on failure, the offending subject.

/// Result of checking a single property.
#[derive(Debug, Clone)]
pub struct PropertyResult {
    /// Human-readable property name (e.g., "SingleAccessorPerName")
    pub name: &'static str,

    /// Whether the property holds
    pub holds: bool,

    /// Description of violation if property doesn't hold
    pub violation: Option<String>,

    /// Declaration the violation was found on (field or method name)
    pub subject: Option<String>,
}

impl PropertyResult {
    /// Create a passing property result.
    #[must_use]
    pub fn pass(name: &'static str) -> Self {
        debug_assert!(!name.is_empty(), "Property name must not be empty");

        Self {
            name,
            holds: true,
            violation: None,
            subject: None,
        }
    }

    /// Create a failing property result.
    #[must_use]
    pub fn fail(name: &'static str, subject: impl Into<String>, violation: String) -> Self {
        debug_assert!(!name.is_empty(), "Property name must not be empty");
        debug_assert!(!violation.is_empty(), "Violation description must not be empty");

        Self {
            name,
            holds: false,
            violation: Some(violation),
            subject: Some(subject.into()),
        }
    }

    /// Format as a single-line status for logging.
    #[must_use]
    pub fn format_status(&self) -> String {
        if self.holds {
            format!("[PASS] {}", self.name)
        } else {
            format!(
                "[FAIL] {} ({}): {}",
                self.name,
                self.subject.as_deref().unwrap_or("?"),
                self.violation.as_deref().unwrap_or("unknown")
            )
        }
    }
}

/// Trait for verifying properties against a state.
pub trait PropertyChecker {
    /// Check all properties and return results.
    ///
    /// Even passing properties are included for completeness.
    fn check_all(&self) -> Vec<PropertyResult>;

    /// Verify all properties, returning the first failure.
    fn verify_all(&self) -> Result<(), PropertyResult> {
        for result in self.check_all() {
            if !result.holds {
                return Err(result);
            }
        }
        Ok(())
    }

    /// Check if all properties hold.
    fn all_hold(&self) -> bool {
        self.check_all().iter().all(|r| r.holds)
    }

    /// Get a summary of all property check results.
    fn summary(&self) -> PropertySummary {
        let results = self.check_all();
        let passed = results.iter().filter(|r| r.holds).count() as u64;
        let failed = results.iter().filter(|r| !r.holds).count() as u64;
        let total = results.len() as u64;

        debug_assert!(passed + failed == total);

        PropertySummary {
            passed,
            failed,
            total,
            results,
        }
    }
}

/// Summary of property check results.
#[derive(Debug, Clone)]
pub struct PropertySummary {
    pub passed: u64,
    pub failed: u64,
    pub total: u64,
    pub results: Vec<PropertyResult>,
}

impl PropertySummary {
    /// Format as a report string.
    #[must_use]
    pub fn format_report(&self) -> String {
        let mut report = format!(
            "Property Check Summary: {}/{} passed\n",
            self.passed, self.total
        );

        for result in &self.results {
            report.push_str(&result.format_status());
            report.push('\n');
        }

        report
    }
}
