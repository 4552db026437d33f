//! Impact analysis report.

use serde::{Deserialize, Serialize};

use crate::RiskLevel;

/// A component that declares the target as an upstream source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    pub id: String,
    /// Input port through which the dependency is expressed.
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskEntry {
    pub tier: RiskLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecommendation {
    /// 1 is most important.
    pub priority: u8,
    pub target: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub target: String,
    pub dependents: Vec<Dependent>,
    /// Data-contract fields from the static contracts table.
    pub contract_fields: Vec<String>,
    pub risks: Vec<RiskEntry>,
    pub recommendations: Vec<TestRecommendation>,
}

impl ImpactReport {
    /// Highest risk tier present, if any.
    pub fn max_risk(&self) -> Option<RiskLevel> {
        self.risks.iter().map(|r| r.tier).max()
    }
}
