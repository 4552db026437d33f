//! # nodekeep-impact
//!
//! **Tier 3 (Impact Analysis)**
//!
//! Answers "what breaks if this component changes?" from the registry alone:
//! which components declare it as an upstream source, how risky a change is,
//! and what to test first.
//!
//! ## What belongs here
//! * Dependent discovery through declared port upstreams
//! * Risk tiers and ranked test recommendations
//!
//! ## What does NOT belong here
//! * Reading source or workflow files (the registry is the only input)

use std::collections::BTreeMap;

use nodekeep_types::{
    Dependent, ImpactReport, Registry, RiskEntry, RiskLevel, TestRecommendation,
};
use thiserror::Error;

/// Dependent count at which a change is high risk.
pub const HIGH_RISK_DEPENDENTS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImpactError {
    #[error("node '{id}' is not in the registry")]
    NodeNotFound { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpactConfig {
    /// Identities whose dependence on the target raises the risk to medium.
    pub critical: Vec<String>,
    /// Known data-contract fields per identity.
    pub contracts: BTreeMap<String, Vec<String>>,
}

/// Contract fields of the editor's built-in components.
const BUILTIN_CONTRACTS: &[(&str, &[&str])] = &[
    ("inputNode", &["value"]),
    ("outputNode", &["result"]),
    ("textNode", &["text"]),
    ("llmNode", &["prompt", "response"]),
];

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            critical: vec!["inputNode".to_string(), "outputNode".to_string()],
            contracts: BUILTIN_CONTRACTS
                .iter()
                .map(|(id, fields)| {
                    (id.to_string(), fields.iter().map(|f| f.to_string()).collect())
                })
                .collect(),
        }
    }
}

/// Analyze the impact of changing `id`.
///
/// `workflow` names a saved workflow the caller wants exercised; it only
/// adds a recommendation.
pub fn analyze(
    registry: &Registry,
    id: &str,
    config: &ImpactConfig,
    workflow: Option<&str>,
) -> Result<ImpactReport, ImpactError> {
    let target = registry
        .get(id)
        .ok_or_else(|| ImpactError::NodeNotFound { id: id.to_string() })?;

    let dependents: Vec<Dependent> = registry
        .records()
        .filter(|r| r.id != target.id)
        .flat_map(|r| {
            r.inputs_from(&target.id).map(move |port| Dependent {
                id: r.id.clone(),
                port: port.id.clone(),
            })
        })
        .collect();

    let mut risks = Vec::new();
    let dependent_ids: Vec<&str> = {
        let mut ids: Vec<&str> = dependents.iter().map(|d| d.id.as_str()).collect();
        ids.dedup();
        ids
    };
    if dependent_ids.len() >= HIGH_RISK_DEPENDENTS {
        risks.push(RiskEntry {
            tier: RiskLevel::High,
            message: format!(
                "{} components depend on {id}; a contract change ripples widely",
                dependent_ids.len()
            ),
        });
    }
    let critical: Vec<&str> = dependent_ids
        .iter()
        .copied()
        .filter(|d| config.critical.iter().any(|c| c == d))
        .collect();
    if !critical.is_empty() {
        risks.push(RiskEntry {
            tier: RiskLevel::Medium,
            message: format!("critical components depend on {id}: {}", critical.join(", ")),
        });
    }
    if !target.exists {
        risks.push(RiskEntry {
            tier: RiskLevel::Low,
            message: format!("{} was missing when the registry was built", target.path),
        });
    }

    let contract_fields = config.contracts.get(id).cloned().unwrap_or_default();

    let mut recommendations = vec![TestRecommendation {
        priority: 1,
        target: id.to_string(),
        description: if contract_fields.is_empty() {
            format!("Test {id} directly: its inputs, outputs, and rendering")
        } else {
            format!(
                "Test {id} directly, covering its contract fields: {}",
                contract_fields.join(", ")
            )
        },
    }];
    for dep in &dependents {
        recommendations.push(TestRecommendation {
            priority: 2,
            target: dep.id.clone(),
            description: format!("Test {} still receives data from {id} on port '{}'", dep.id, dep.port),
        });
    }
    if let Some(name) = workflow {
        recommendations.push(TestRecommendation {
            priority: 3,
            target: name.to_string(),
            description: format!("Run workflow {name} end to end"),
        });
    }

    tracing::debug!(
        node = id,
        dependents = dependents.len(),
        risks = risks.len(),
        "impact analyzed"
    );
    Ok(ImpactReport {
        target: id.to_string(),
        dependents,
        contract_fields,
        risks,
        recommendations,
    })
}
