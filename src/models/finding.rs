// file: src/models/finding.rs
// description: risk finding model with severity levels and summary counts
// reference: internal data structures

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// A single identified risk within a contract. Identifiers are provisional
/// until the aggregation stage renumbers the final list from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: u32,
    pub title: String,
    pub severity: Severity,
    pub category: String,
    pub description: String,
    pub suggestion: String,
    /// Source clause excerpt; empty when the model could not cite one.
    pub clause: String,
}

/// Severity histogram over a final finding list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskSummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(id: u32, severity: Severity) -> Finding {
        Finding {
            id,
            title: format!("Finding {}", id),
            severity,
            category: "General".to_string(),
            description: String::new(),
            suggestion: String::new(),
            clause: String::new(),
        }
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!("high".parse::<Severity>(), Ok(Severity::High));
        assert_eq!(" Medium ".parse::<Severity>(), Ok(Severity::Medium));
        assert_eq!("LOW".parse::<Severity>(), Ok(Severity::Low));
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_serde_roundtrip() {
        let json = serde_json::to_string(&Severity::High).unwrap();
        assert_eq!(json, "\"high\"");
        let parsed: Severity = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Severity::Low);
    }

    #[test]
    fn test_risk_summary_counts() {
        let findings = vec![
            finding(1, Severity::High),
            finding(2, Severity::High),
            finding(3, Severity::Medium),
            finding(4, Severity::Low),
        ];

        let summary = RiskSummary::from_findings(&findings);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 1);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_risk_summary_empty() {
        let summary = RiskSummary::from_findings(&[]);
        assert_eq!(summary.total(), 0);
    }
}
