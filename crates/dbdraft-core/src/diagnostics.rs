use serde::{Deserialize, Serialize};

/// Severity level for recoverable issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Issue codes used across the workspace.
pub mod codes {
    /// Field without a name or type; the field was skipped.
    pub const INVALID_FIELD: &str = "invalid_field";
    /// Relationship or index pointing at a table or field that does not exist.
    pub const DANGLING_REFERENCE: &str = "dangling_reference";
    /// Two entities of the same kind share a name.
    pub const DUPLICATE_NAME: &str = "duplicate_name";
    /// Value list of an enum repeats an entry.
    pub const DUPLICATE_VALUE: &str = "duplicate_value";
    /// More than one auto-increment field in a table.
    pub const MULTIPLE_INCREMENT: &str = "multiple_increment";
    /// Construct accepted by the syntax but only partially represented.
    pub const UNSUPPORTED: &str = "unsupported";
}

/// Structured issue with a location path such as `tables.orders.fields.user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: String,
    pub path: String,
    pub message: String,
}

impl Issue {
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn warning(
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, code, path, message)
    }

    pub fn error(
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, code, path, message)
    }
}

/// Recoverable issues collected while exporting, importing or validating.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl Diagnostics {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn push(&mut self, issue: Issue) {
        match issue.severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }

    /// Record a warning and log it.
    pub fn warn(
        &mut self,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        let issue = Issue::warning(code, path, message);
        tracing::warn!(
            event = "diagnostic",
            code = %issue.code,
            path = %issue.path,
            message = %issue.message
        );
        self.warnings.push(issue);
    }

    /// Iterate over every issue, errors first.
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.iter().any(|issue| issue.code == code)
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}
