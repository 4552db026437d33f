//! The fix-strategy catalog.

use std::collections::BTreeMap;
use std::path::Path;

use nodekeep_types::{FixStrategy, Issue, IssueKind};
use serde::Deserialize;
use thiserror::Error;

use crate::FixerRegistry;

const BUILTIN: &str = include_str!("strategies.toml");

/// Configuration errors in the strategy catalog. All are fatal.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read strategy catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse strategy catalog TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("more than one strategy for issue kind '{kind}'")]
    DuplicateKind { kind: IssueKind },

    #[error("strategy '{name}' has confidence {value}, expected 0-100")]
    InvalidConfidence { name: String, value: u8 },

    #[error("strategy '{strategy}' is auto-fixable but no fixer '{fixer}' is registered for '{kind}'")]
    UnresolvedFixer {
        strategy: String,
        fixer: String,
        kind: IssueKind,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    strategies: Vec<FixStrategy>,
}

/// At most one strategy per issue kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyCatalog {
    by_kind: BTreeMap<IssueKind, FixStrategy>,
}

impl StrategyCatalog {
    /// The embedded default catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml(BUILTIN)
    }

    pub fn from_toml(s: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(s)?;
        Self::from_strategies(file.strategies)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_strategies(strategies: Vec<FixStrategy>) -> Result<Self, CatalogError> {
        let mut by_kind = BTreeMap::new();
        for strategy in strategies {
            if strategy.confidence > 100 {
                return Err(CatalogError::InvalidConfidence {
                    name: strategy.name,
                    value: strategy.confidence,
                });
            }
            let kind = strategy.kind;
            if by_kind.insert(kind, strategy).is_some() {
                return Err(CatalogError::DuplicateKind { kind });
            }
        }
        Ok(Self { by_kind })
    }

    /// Fail if an auto-fixable strategy has no matching registered fixer.
    pub fn check_fixers(&self, fixers: &FixerRegistry) -> Result<(), CatalogError> {
        for strategy in self.by_kind.values().filter(|s| s.auto_fixable) {
            let resolved = fixers
                .get(strategy.kind)
                .is_some_and(|f| f.name() == strategy.fixer);
            if !resolved {
                return Err(CatalogError::UnresolvedFixer {
                    strategy: strategy.name.clone(),
                    fixer: strategy.fixer.clone(),
                    kind: strategy.kind,
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, kind: IssueKind) -> Option<&FixStrategy> {
        self.by_kind.get(&kind)
    }

    pub fn strategies(&self) -> impl Iterator<Item = &FixStrategy> {
        self.by_kind.values()
    }

    pub fn is_auto_fixable(&self, kind: IssueKind) -> bool {
        self.get(kind).is_some_and(|s| s.auto_fixable)
    }

    /// Attach the resolved strategy name and confidence to an issue.
    pub fn annotate(&self, issue: &mut Issue) {
        if let Some(strategy) = self.get(issue.kind) {
            issue.strategy = Some(strategy.name.clone());
            issue.confidence = Some(strategy.confidence);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodekeep_types::{RiskLevel, Severity};

    #[test]
    fn builtin_catalog_matches_taxonomy() {
        let catalog = StrategyCatalog::builtin().unwrap();
        let orphan = catalog.get(IssueKind::OrphanedReference).unwrap();
        assert_eq!(orphan.confidence, 95);
        assert_eq!(orphan.risk, RiskLevel::Low);
        assert!(orphan.auto_fixable && !orphan.requires_confirmation);

        let dep = catalog.get(IssueKind::MissingDependency).unwrap();
        assert_eq!((dep.confidence, dep.risk), (85, RiskLevel::Medium));

        let write = catalog.get(IssueKind::SourceNotWriting).unwrap();
        assert!(write.requires_confirmation);
        assert_eq!(write.confidence, 60);

        let advice = catalog.get(IssueKind::DataFlowMismatch).unwrap();
        assert!(!advice.auto_fixable);
        assert_eq!(advice.risk, RiskLevel::High);

        assert!(catalog.get(IssueKind::MissingFile).is_none());
        assert!(!catalog.is_auto_fixable(IssueKind::BrokenLink));
    }

    #[test]
    fn duplicate_kind_is_rejected() {
        let toml = r#"
            [[strategies]]
            name = "a"
            kind = "missing-file"
            fixer = "x"
            confidence = 10

            [[strategies]]
            name = "b"
            kind = "missing-file"
            fixer = "y"
            confidence = 20
        "#;
        assert!(matches!(
            StrategyCatalog::from_toml(toml),
            Err(CatalogError::DuplicateKind {
                kind: IssueKind::MissingFile
            })
        ));
    }

    #[test]
    fn confidence_over_100_is_rejected() {
        let toml = r#"
            [[strategies]]
            name = "a"
            kind = "broken-link"
            fixer = "x"
            confidence = 150
        "#;
        assert!(matches!(
            StrategyCatalog::from_toml(toml),
            Err(CatalogError::InvalidConfidence { value: 150, .. })
        ));
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let toml = r#"
            [[strategies]]
            name = "a"
            kind = "typo"
            fixer = "x"
            confidence = 1
        "#;
        assert!(matches!(
            StrategyCatalog::from_toml(toml),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn auto_fixable_strategy_needs_a_fixer() {
        let toml = r#"
            [[strategies]]
            name = "relink"
            kind = "broken-link"
            fixer = "link-fixer"
            auto_fixable = true
            confidence = 50
        "#;
        let catalog = StrategyCatalog::from_toml(toml).unwrap();
        let err = catalog.check_fixers(&FixerRegistry::new()).unwrap_err();
        assert!(matches!(err, CatalogError::UnresolvedFixer { .. }));
        assert!(err.to_string().contains("link-fixer"));
    }

    #[test]
    fn advisory_strategy_without_fixer_is_fine() {
        let toml = r#"
            [[strategies]]
            name = "explain"
            kind = "broken-link"
            fixer = "nobody"
            confidence = 10
        "#;
        let catalog = StrategyCatalog::from_toml(toml).unwrap();
        assert!(catalog.check_fixers(&FixerRegistry::new()).is_ok());
    }

    #[test]
    fn annotate_sets_strategy_and_confidence() {
        let catalog = StrategyCatalog::builtin().unwrap();
        let mut issue = Issue::new(IssueKind::MissingDependency, Severity::Warning, "x");
        catalog.annotate(&mut issue);
        assert_eq!(issue.strategy.as_deref(), Some("add-trigger-dependency"));
        assert_eq!(issue.confidence, Some(85));

        let mut plain = Issue::new(IssueKind::MissingFile, Severity::Error, "y");
        catalog.annotate(&mut plain);
        assert_eq!(plain.strategy, None);
    }
}
