//! Health status values
//!
//! Closed severity enumeration used both as a value and as a grouping key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Health status, ordered from healthy to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Green,
    Unknown,
    Yellow,
    Red,
}

impl HealthStatus {
    /// All statuses in severity order
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::Green,
        HealthStatus::Unknown,
        HealthStatus::Yellow,
        HealthStatus::Red,
    ];

    /// Lowercase name, as rendered in reports
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Green => "green",
            HealthStatus::Unknown => "unknown",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Red => "red",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(HealthStatus::Green < HealthStatus::Unknown);
        assert!(HealthStatus::Unknown < HealthStatus::Yellow);
        assert!(HealthStatus::Yellow < HealthStatus::Red);
    }

    #[test]
    fn test_report_names() {
        let names: Vec<String> = HealthStatus::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["green", "unknown", "yellow", "red"]);
        assert_eq!(serde_json::to_string(&HealthStatus::Yellow).unwrap(), "\"yellow\"");
    }
}
