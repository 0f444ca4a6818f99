//! Onboarding data models: catalog items, lifestyle answers and the
//! persisted profile record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a catalog or custom item.
///
/// Catalog data uses numbers; synthesized entries use strings. Serialized
/// untagged so both forms round-trip as plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A selectable entry: health concern, diet or allergy.
///
/// Identity is by `id`; `name` is not assumed unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_tip: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tool_tip: None,
        }
    }

    pub fn with_tool_tip(mut self, tool_tip: impl Into<String>) -> Self {
        self.tool_tip = Some(tool_tip.into());
        self
    }
}

/// Weekly alcoholic beverages, persisted as the answer label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlcoholIntake {
    #[serde(rename = "0-1")]
    Low,
    #[serde(rename = "2-5")]
    Medium,
    #[serde(rename = "5+")]
    High,
}

impl AlcoholIntake {
    pub const ALL: [AlcoholIntake; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "0-1",
            Self::Medium => "2-5",
            Self::High => "5+",
        }
    }
}

impl std::fmt::Display for AlcoholIntake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlcoholIntake {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0-1" => Ok(Self::Low),
            "2-5" => Ok(Self::Medium),
            "5+" => Ok(Self::High),
            other => Err(format!("unknown alcohol answer: {other}")),
        }
    }
}

/// A health concern with its 1-based priority rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedConcern {
    pub id: ItemId,
    pub name: String,
    pub priority: u32,
}

/// The completed profile as written to storage.
///
/// Field names are part of the external schema and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedProfile {
    pub health_concerns: Vec<RankedConcern>,
    pub diets: Vec<Item>,
    pub is_daily_exposure: bool,
    pub is_smoke: bool,
    pub alcohol: AlcoholIntake,
    pub allergies: Vec<Item>,
    pub custom_allergies: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
mod iso_millis {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Storage keys used for onboarding persistence.
pub mod storage_keys {
    /// Key for the PersistedProfile JSON blob.
    pub const ONBOARDING_DATA: &str = "ONBOARDING_DATA";
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn item_id_serializes_untagged() {
        assert_eq!(serde_json::to_string(&ItemId::Number(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&ItemId::from("custom_1")).unwrap(),
            "\"custom_1\""
        );
        let parsed: ItemId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, ItemId::Number(42));
    }

    #[test]
    fn item_omits_missing_tool_tip() {
        let plain = serde_json::to_value(Item::new(1, "Peanuts")).unwrap();
        assert_eq!(plain, serde_json::json!({"id": 1, "name": "Peanuts"}));

        let tipped = serde_json::to_value(Item::new(1, "Vegan").with_tool_tip("Healthy")).unwrap();
        assert_eq!(
            tipped,
            serde_json::json!({"id": 1, "name": "Vegan", "tool_tip": "Healthy"})
        );
    }

    #[test]
    fn alcohol_uses_answer_labels() {
        for answer in AlcoholIntake::ALL {
            let json = serde_json::to_string(&answer).unwrap();
            assert_eq!(json, format!("\"{answer}\""));
            assert_eq!(answer.as_str().parse::<AlcoholIntake>().unwrap(), answer);
        }
        assert!("lots".parse::<AlcoholIntake>().is_err());
    }

    #[test]
    fn timestamp_has_millis_and_zulu_suffix() {
        let profile = PersistedProfile {
            health_concerns: vec![],
            diets: vec![],
            is_daily_exposure: true,
            is_smoke: false,
            alcohol: AlcoholIntake::Low,
            allergies: vec![],
            custom_allergies: String::new(),
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["timestamp"], "2023-01-01T00:00:00.000Z");

        let parsed: PersistedProfile = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, profile);
    }
}
