use serde::{Deserialize, Serialize};

use crate::error::BundleError;

/// Severity of the issue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

/// Type of issue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Structure,
    Required,
    Value,
    NotFound,
    NotSupported,
    Exception,
    Informational,
}

/// FHIR OperationOutcome resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub resource_type: String,
    pub issue: Vec<OperationOutcomeIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,
    pub code: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl OperationOutcome {
    fn single(severity: IssueSeverity, code: IssueType, diagnostics: &str) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            issue: vec![OperationOutcomeIssue {
                severity,
                code,
                diagnostics: Some(diagnostics.to_string()),
            }],
        }
    }

    pub fn error(code: IssueType, diagnostics: &str) -> Self {
        Self::single(IssueSeverity::Error, code, diagnostics)
    }

    pub fn invalid(diagnostics: &str) -> Self {
        Self::error(IssueType::Invalid, diagnostics)
    }

    pub fn not_found(diagnostics: &str) -> Self {
        Self::error(IssueType::NotFound, diagnostics)
    }

    pub fn success(diagnostics: &str) -> Self {
        Self::single(
            IssueSeverity::Information,
            IssueType::Informational,
            diagnostics,
        )
    }
}

impl From<&BundleError> for OperationOutcome {
    fn from(err: &BundleError) -> Self {
        let code = match err {
            BundleError::Io { .. } => IssueType::Exception,
            BundleError::MalformedInput(_) => IssueType::Structure,
            BundleError::SchemaMismatch(_) => IssueType::Invalid,
        };
        Self::single(IssueSeverity::Fatal, code, &err.to_string())
    }
}
