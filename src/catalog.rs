//! Reference data: the health concerns, diets and allergies a user can pick.
//!
//! Loaded once at startup and never mutated.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::config::IntakeConfig;
use crate::error::ConfigError;
use crate::onboarding::model::{Item, ItemId};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Deserialize)]
struct CatalogDocument {
    health_concerns: CatalogList,
    diets: CatalogList,
    allergies: CatalogList,
}

#[derive(Deserialize)]
struct CatalogList {
    data: Vec<Item>,
}

/// Read-only pick lists for the wizard screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    health_concerns: Vec<Item>,
    diets: Vec<Item>,
    allergies: Vec<Item>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse a catalog document. Ids must be unique within each list.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let doc: CatalogDocument = serde_json::from_str(raw)
            .map_err(|e| ConfigError::ParseError(format!("catalog: {e}")))?;

        let catalog = Self {
            health_concerns: doc.health_concerns.data,
            diets: doc.diets.data,
            allergies: doc.allergies.data,
        };
        check_unique_ids("health_concerns", &catalog.health_concerns)?;
        check_unique_ids("diets", &catalog.diets)?;
        check_unique_ids("allergies", &catalog.allergies)?;
        Ok(catalog)
    }

    pub async fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    /// The configured catalog file, or the built-in one.
    pub async fn load(config: &IntakeConfig) -> Result<Self, ConfigError> {
        let catalog = match &config.catalog_path {
            Some(path) => Self::from_path(path).await?,
            None => Self::builtin()?,
        };
        info!(
            health_concerns = catalog.health_concerns.len(),
            diets = catalog.diets.len(),
            allergies = catalog.allergies.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    pub fn health_concerns(&self) -> &[Item] {
        &self.health_concerns
    }

    pub fn diets(&self) -> &[Item] {
        &self.diets
    }

    pub fn allergies(&self) -> &[Item] {
        &self.allergies
    }

    pub fn health_concern(&self, id: &ItemId) -> Option<&Item> {
        self.health_concerns.iter().find(|item| item.id == *id)
    }

    pub fn diet(&self, id: &ItemId) -> Option<&Item> {
        self.diets.iter().find(|item| item.id == *id)
    }
}

fn check_unique_ids(list: &str, items: &[Item]) -> Result<(), ConfigError> {
    for (idx, item) in items.iter().enumerate() {
        if items[..idx].iter().any(|prev| prev.id == item.id) {
            return Err(ConfigError::InvalidValue {
                key: list.to_string(),
                message: format!("duplicate id {}", item.id),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.health_concerns().is_empty());
        assert!(catalog.diets().iter().all(|d| d.tool_tip.is_some()));
        assert!(catalog.allergies().iter().any(|a| a.name == "Peanuts"));
        assert_eq!(
            catalog.health_concern(&ItemId::Number(1)).map(|c| c.name.as_str()),
            Some("Sleep")
        );
        assert!(catalog.diet(&ItemId::Number(999)).is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = r#"{
            "health_concerns": {"data": [{"id": 1, "name": "Sleep"}, {"id": 1, "name": "Stress"}]},
            "diets": {"data": []},
            "allergies": {"data": []}
        }"#;
        assert!(matches!(
            Catalog::from_json(raw),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        assert!(matches!(
            Catalog::from_json(r#"{"diets": []}"#),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn loads_from_configured_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{
                "health_concerns": {"data": [{"id": 1, "name": "Focus"}]},
                "diets": {"data": [{"id": "keto", "name": "Keto"}]},
                "allergies": {"data": []}
            }"#,
        )
        .unwrap();

        let config = IntakeConfig {
            catalog_path: Some(path),
            ..Default::default()
        };
        let catalog = Catalog::load(&config).await.unwrap();
        assert_eq!(catalog.health_concerns()[0].name, "Focus");
        assert_eq!(catalog.diets()[0].id, ItemId::from("keto"));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = Catalog::from_path(Path::new("/definitely/not/here.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
