//! Dataset -> indexing strategy table.
//!
//! Adding a dataset means adding a table entry; the builder never branches
//! on dataset names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Id field used for datasets without an entry.
pub const DEFAULT_ID_FIELD: &str = "id";

/// How canonical records of a dataset are re-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexingStrategy {
    /// `id -> record`
    Direct { id_field: String },
    /// `type -> level -> value`, from a list of `{type, value}` entries
    /// carried by each level record.
    LeveledCurve {
        level_field: String,
        list_field: String,
        type_field: String,
        value_field: String,
    },
    /// `parent -> rank -> record`; a missing rank files under `0`.
    NestedByParentAndRank {
        parent_field: String,
        rank_field: String,
    },
    /// `id -> record` for records passing `filter`.
    FilteredDirect { id_field: String, filter: RecordFilter },
}

impl IndexingStrategy {
    pub fn direct(id_field: impl Into<String>) -> Self {
        Self::Direct {
            id_field: id_field.into(),
        }
    }

    pub fn leveled_curve(
        level_field: impl Into<String>,
        list_field: impl Into<String>,
        type_field: impl Into<String>,
        value_field: impl Into<String>,
    ) -> Self {
        Self::LeveledCurve {
            level_field: level_field.into(),
            list_field: list_field.into(),
            type_field: type_field.into(),
            value_field: value_field.into(),
        }
    }

    pub fn nested(parent_field: impl Into<String>, rank_field: impl Into<String>) -> Self {
        Self::NestedByParentAndRank {
            parent_field: parent_field.into(),
            rank_field: rank_field.into(),
        }
    }

    pub fn filtered(id_field: impl Into<String>, filter: RecordFilter) -> Self {
        Self::FilteredDirect {
            id_field: id_field.into(),
            filter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::LeveledCurve { .. } => "leveled_curve",
            Self::NestedByParentAndRank { .. } => "nested_by_parent_and_rank",
            Self::FilteredDirect { .. } => "filtered_direct",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum RecordFilter {
    /// Keep records where `field` is present and not null.
    FieldPresent { field: String },
    /// Keep records where `field` is absent or differs from `value`.
    FieldNotEquals { field: String, value: Value },
    /// Keep the first record of each id.
    FirstOccurrence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyTable {
    datasets: BTreeMap<String, IndexingStrategy>,
    fallback: IndexingStrategy,
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self {
            datasets: BTreeMap::new(),
            fallback: IndexingStrategy::direct(DEFAULT_ID_FIELD),
        }
    }
}

impl StrategyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategies for the well-known datasets.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert(
            "AvatarExcelConfigData",
            IndexingStrategy::filtered(
                "id",
                RecordFilter::FieldNotEquals {
                    field: "useType".to_string(),
                    value: Value::from("AVATAR_ABANDON"),
                },
            ),
        );
        table.insert(
            "AvatarCostumeExcelConfigData",
            IndexingStrategy::filtered(
                "skinId",
                RecordFilter::FieldPresent {
                    field: "characterId".to_string(),
                },
            ),
        );
        table.insert(
            "AvatarTalentExcelConfigData",
            IndexingStrategy::filtered("talentId", RecordFilter::FirstOccurrence),
        );
        table.insert("WeaponExcelConfigData", IndexingStrategy::direct("id"));
        table.insert("MaterialExcelConfigData", IndexingStrategy::direct("id"));
        for curve in ["AvatarCurveExcelConfigData", "WeaponCurveExcelConfigData"] {
            table.insert(
                curve,
                IndexingStrategy::leveled_curve("level", "curveInfos", "type", "value"),
            );
        }
        table.insert(
            "AvatarPromoteExcelConfigData",
            IndexingStrategy::nested("avatarPromoteId", "promoteLevel"),
        );
        table.insert(
            "WeaponPromoteExcelConfigData",
            IndexingStrategy::nested("weaponPromoteId", "promoteLevel"),
        );
        table
    }

    pub fn insert(&mut self, dataset: impl Into<String>, strategy: IndexingStrategy) {
        self.datasets.insert(dataset.into(), strategy);
    }

    /// Adds or replaces entries.
    pub fn extend(&mut self, overrides: impl IntoIterator<Item = (String, IndexingStrategy)>) {
        self.datasets.extend(overrides);
    }

    /// Strategy of `dataset`, falling back to `Direct { id_field: "id" }`.
    pub fn get(&self, dataset: &str) -> &IndexingStrategy {
        self.datasets.get(dataset).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, dataset: &str) -> bool {
        self.datasets.contains_key(dataset)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexingStrategy)> {
        self.datasets.iter().map(|(k, v)| (k.as_str(), v))
    }
}
