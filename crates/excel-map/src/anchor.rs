//! Known-plaintext anchors.
//!
//! An anchor names a reference entity in a dataset and a value that entity
//! is known to carry for one canonical field. Locating the entity's record(s)
//! and finding the single key holding that value pins the key to the field
//! with confidence 1.0.
//!
//! Anchors are evaluated in table order, so a [`Locator::Field`] anchor can
//! rely on a field pinned by an earlier anchor. Ambiguity is never broken
//! arbitrarily: zero or several candidate keys leave the field unresolved.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use excel_model::{KeyAssignment, KeyMapping, MasterSchema, MatchMethod, Record};

/// How an anchor finds its reference record(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Locator {
    /// Records holding `value` under any key.
    Value { value: Value },
    /// Records whose key for the already resolved `field` holds `value`.
    Field { field: String, value: Value },
}

impl Locator {
    fn describe(&self) -> String {
        match self {
            Self::Value { value } => format!("value {value}"),
            Self::Field { field, value } => format!("{field} = {value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub locate: Locator,
    /// Canonical field the anchor resolves.
    pub field: String,
    /// Value the reference entity carries for `field`.
    pub expected: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Anchor {
    pub fn new(locate: Locator, field: impl Into<String>, expected: Value) -> Self {
        Self {
            locate,
            field: field.into(),
            expected,
            note: None,
        }
    }

    /// Anchor whose reference record contains `locator` under any key.
    pub fn by_value(locator: Value, field: impl Into<String>, expected: Value) -> Self {
        Self::new(Locator::Value { value: locator }, field, expected)
    }

    /// Anchor whose reference record holds `value` in an already resolved field.
    pub fn by_field(
        locator_field: impl Into<String>,
        value: Value,
        field: impl Into<String>,
        expected: Value,
    ) -> Self {
        Self::new(
            Locator::Field {
                field: locator_field.into(),
                value,
            },
            field,
            expected,
        )
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Human-readable description, used as the master's anchor hint.
    pub fn describe(&self) -> String {
        match &self.note {
            Some(note) => note.clone(),
            None => format!("{} -> {}", self.locate.describe(), self.expected),
        }
    }
}

/// Per-dataset anchor lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorTable {
    datasets: BTreeMap<String, Vec<Anchor>>,
}

#[derive(Deserialize)]
struct AnchorFile {
    #[serde(default)]
    anchors: AnchorTable,
}

impl AnchorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchors for the well-known datasets.
    pub fn builtin() -> Self {
        let mut table = Self::new();

        let traveler_icon = json!("UI_AvatarIcon_PlayerGirl");
        table.push(
            "AvatarExcelConfigData",
            Anchor::by_value(traveler_icon.clone(), "iconName", traveler_icon.clone())
                .with_note("traveler icon"),
        );
        table.push(
            "AvatarExcelConfigData",
            Anchor::by_field("iconName", traveler_icon.clone(), "id", json!(10000007))
                .with_note("traveler avatar id"),
        );
        table.push(
            "AvatarExcelConfigData",
            Anchor::by_field(
                "iconName",
                traveler_icon,
                "weaponType",
                json!("WEAPON_SWORD_ONE_HAND"),
            )
            .with_note("traveler weapon type"),
        );

        let costume = json!("Avatar_Girl_Sword_AyakaCostumeFruhling");
        table.push(
            "AvatarCostumeExcelConfigData",
            Anchor::by_value(costume.clone(), "jsonName", costume.clone())
                .with_note("Springbloom Missive costume"),
        );
        table.push(
            "AvatarCostumeExcelConfigData",
            Anchor::by_field("jsonName", costume.clone(), "characterId", json!(10000002))
                .with_note("costume owner"),
        );
        table.push(
            "AvatarCostumeExcelConfigData",
            Anchor::by_field("jsonName", costume, "skinId", json!(200301))
                .with_note("costume id"),
        );

        let dull_blade = json!("UI_EquipIcon_Sword_Blunt");
        table.push(
            "WeaponExcelConfigData",
            Anchor::by_value(dull_blade.clone(), "icon", dull_blade.clone())
                .with_note("Dull Blade icon"),
        );
        table.push(
            "WeaponExcelConfigData",
            Anchor::by_field("icon", dull_blade.clone(), "id", json!(11101))
                .with_note("Dull Blade id"),
        );
        table.push(
            "WeaponExcelConfigData",
            Anchor::by_field("icon", dull_blade, "weaponType", json!("WEAPON_SWORD_ONE_HAND"))
                .with_note("Dull Blade weapon type"),
        );

        table
    }

    /// Parses an `[anchors]` TOML document.
    ///
    /// ```toml
    /// [[anchors.WeaponExcelConfigData]]
    /// field = "id"
    /// expected = 11101
    /// locate = { by = "value", value = "UI_EquipIcon_Sword_Blunt" }
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let file: AnchorFile = toml::from_str(contents)?;
        Ok(file.anchors)
    }

    pub fn push(&mut self, dataset: impl Into<String>, anchor: Anchor) {
        self.datasets.entry(dataset.into()).or_default().push(anchor);
    }

    /// Appends every anchor of `other` after this table's anchors.
    pub fn extend(&mut self, other: AnchorTable) {
        for (dataset, anchors) in other.datasets {
            self.datasets.entry(dataset).or_default().extend(anchors);
        }
    }

    pub fn for_dataset(&self, dataset: &str) -> &[Anchor] {
        self.datasets.get(dataset).map_or(&[], Vec::as_slice)
    }

    /// Canonical field -> anchor description, for master generation.
    pub fn hints_for(&self, dataset: &str) -> BTreeMap<String, String> {
        let mut hints = BTreeMap::new();
        for anchor in self.for_dataset(dataset) {
            hints
                .entry(anchor.field.clone())
                .or_insert_with(|| anchor.describe());
        }
        hints
    }

    pub fn datasets(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.values().all(Vec::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnchorStatus {
    /// Key pinned to the field.
    Resolved { key: String },
    /// The field was already pinned to the same key.
    Confirmed { key: String },
    /// No record matched the locator.
    NotLocated,
    /// The locator's field has no key yet.
    LocatorUnresolved,
    /// No key holds the expected value in every located record.
    NoCandidate,
    /// Several keys hold the expected value.
    Ambiguous { keys: Vec<String> },
    /// The candidate key or the field is already mapped elsewhere.
    Conflict { key: String },
    /// The master has no such field.
    UnknownField,
}

impl AnchorStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. } | Self::Confirmed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchorOutcome {
    pub field: String,
    #[serde(flatten)]
    pub status: AnchorStatus,
}

/// Evaluates `anchors` in order, inserting every unique match into `mapping`.
pub fn resolve_anchors(
    records: &[Record],
    schema: &MasterSchema,
    anchors: &[Anchor],
    mapping: &mut KeyMapping,
) -> Vec<AnchorOutcome> {
    anchors
        .iter()
        .map(|anchor| {
            let status = resolve_one(records, schema, anchor, mapping);
            match &status {
                AnchorStatus::Resolved { key } => {
                    debug!(field = %anchor.field, key = %key, method = "anchor", "key resolved");
                }
                AnchorStatus::UnknownField => {
                    warn!(
                        dataset = %schema.dataset,
                        field = %anchor.field,
                        "anchor names a field absent from the master, ignoring"
                    );
                }
                other => {
                    debug!(field = %anchor.field, status = ?other, "anchor inconclusive");
                }
            }
            AnchorOutcome {
                field: anchor.field.clone(),
                status,
            }
        })
        .collect()
}

fn resolve_one(
    records: &[Record],
    schema: &MasterSchema,
    anchor: &Anchor,
    mapping: &mut KeyMapping,
) -> AnchorStatus {
    if schema.field(&anchor.field).is_none() {
        return AnchorStatus::UnknownField;
    }

    let located: Vec<&Record> = match &anchor.locate {
        Locator::Value { value } => records
            .iter()
            .filter(|record| record.values().any(|v| values_equal(v, value)))
            .collect(),
        Locator::Field { field, value } => {
            let Some(key) = mapping.key_for(field) else {
                return AnchorStatus::LocatorUnresolved;
            };
            records
                .iter()
                .filter(|record| record.get(key).is_some_and(|v| values_equal(v, value)))
                .collect()
        }
    };
    if located.is_empty() {
        return AnchorStatus::NotLocated;
    }

    let mut candidates: Option<BTreeSet<&str>> = None;
    for record in located {
        let keys: BTreeSet<&str> = record
            .iter()
            .filter(|(_, v)| values_equal(v, &anchor.expected))
            .map(|(k, _)| k.as_str())
            .collect();
        candidates = Some(match candidates {
            Some(previous) => previous.intersection(&keys).copied().collect(),
            None => keys,
        });
    }
    let candidates = candidates.unwrap_or_default();

    let mut iter = candidates.iter();
    let key = match (iter.next(), iter.next()) {
        (None, _) => return AnchorStatus::NoCandidate,
        (Some(key), None) => (*key).to_string(),
        (Some(_), Some(_)) => {
            return AnchorStatus::Ambiguous {
                keys: candidates.iter().map(|k| (*k).to_string()).collect(),
            };
        }
    };

    if mapping.canonical_for(&key) == Some(anchor.field.as_str()) {
        return AnchorStatus::Confirmed { key };
    }
    let assignment = KeyAssignment {
        obfuscated_key: key.clone(),
        canonical_name: anchor.field.clone(),
        confidence: 1.0,
        method: MatchMethod::Anchor,
    };
    match mapping.insert(assignment) {
        Ok(()) => AnchorStatus::Resolved { key },
        Err(_) => AnchorStatus::Conflict { key },
    }
}

/// JSON equality with numbers compared by value, so `1` matches `1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excel_model::{FieldDescriptor, ValueKind};

    fn records(value: Value) -> Vec<Record> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    fn schema() -> MasterSchema {
        MasterSchema::new(
            "Costume",
            vec![
                FieldDescriptor::new("jsonName", ValueKind::String),
                FieldDescriptor::new("characterId", ValueKind::Number),
                FieldDescriptor::new("rarity", ValueKind::Number),
            ],
        )
        .unwrap()
    }

    #[test]
    fn chained_anchors_resolve_in_order() {
        let recs = records(json!([
            {"QX": "Skin_A", "LM": 10000002, "ZP": 4},
            {"QX": "Skin_B", "LM": 10000003, "ZP": 5},
        ]));
        let anchors = vec![
            Anchor::by_value(json!("Skin_A"), "jsonName", json!("Skin_A")),
            Anchor::by_field("jsonName", json!("Skin_A"), "characterId", json!(10000002)),
            Anchor::by_field("jsonName", json!("Skin_B"), "rarity", json!(5)),
        ];
        let mut mapping = KeyMapping::new();
        let outcomes = resolve_anchors(&recs, &schema(), &anchors, &mut mapping);
        assert!(outcomes.iter().all(|o| o.status.is_resolved()));
        assert_eq!(mapping.key_for("jsonName"), Some("QX"));
        assert_eq!(mapping.key_for("characterId"), Some("LM"));
        assert_eq!(mapping.key_for("rarity"), Some("ZP"));
        assert_eq!(mapping.assignment_for("rarity").unwrap().confidence, 1.0);
    }

    #[test]
    fn two_equal_keys_make_the_anchor_inconclusive() {
        let recs = records(json!([{"QX": "Skin_A", "LM": 4, "ZP": 4}]));
        let anchors = vec![Anchor::by_value(json!("Skin_A"), "rarity", json!(4))];
        let mut mapping = KeyMapping::new();
        let outcomes = resolve_anchors(&recs, &schema(), &anchors, &mut mapping);
        assert_eq!(
            outcomes[0].status,
            AnchorStatus::Ambiguous {
                keys: vec!["LM".to_string(), "ZP".to_string()]
            }
        );
        assert!(mapping.is_empty());
    }

    #[test]
    fn field_locator_waits_for_its_field() {
        let recs = records(json!([{"QX": "Skin_A", "LM": 4}]));
        let anchors = vec![Anchor::by_field(
            "jsonName",
            json!("Skin_A"),
            "rarity",
            json!(4),
        )];
        let mut mapping = KeyMapping::new();
        let outcomes = resolve_anchors(&recs, &schema(), &anchors, &mut mapping);
        assert_eq!(outcomes[0].status, AnchorStatus::LocatorUnresolved);
    }

    #[test]
    fn unknown_field_and_missing_entity_are_ignored() {
        let recs = records(json!([{"QX": "Skin_A"}]));
        let anchors = vec![
            Anchor::by_value(json!("Skin_A"), "nope", json!("Skin_A")),
            Anchor::by_value(json!("Skin_Z"), "jsonName", json!("Skin_Z")),
        ];
        let mut mapping = KeyMapping::new();
        let outcomes = resolve_anchors(&recs, &schema(), &anchors, &mut mapping);
        assert_eq!(outcomes[0].status, AnchorStatus::UnknownField);
        assert_eq!(outcomes[1].status, AnchorStatus::NotLocated);
        assert!(mapping.is_empty());
    }

    #[test]
    fn claimed_key_is_a_conflict() {
        let recs = records(json!([{"QX": "Skin_A", "LM": 4}]));
        let anchors = vec![
            Anchor::by_value(json!("Skin_A"), "jsonName", json!("Skin_A")),
            Anchor::by_value(json!("Skin_A"), "characterId", json!("Skin_A")),
            Anchor::by_value(json!("Skin_A"), "jsonName", json!("Skin_A")),
        ];
        let mut mapping = KeyMapping::new();
        let outcomes = resolve_anchors(&recs, &schema(), &anchors, &mut mapping);
        assert!(matches!(outcomes[0].status, AnchorStatus::Resolved { .. }));
        assert_eq!(
            outcomes[1].status,
            AnchorStatus::Conflict {
                key: "QX".to_string()
            }
        );
        assert_eq!(
            outcomes[2].status,
            AnchorStatus::Confirmed {
                key: "QX".to_string()
            }
        );
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn located_records_must_agree_on_the_key() {
        let recs = records(json!([
            {"QX": "Dup", "LM": 4, "ZP": 4},
            {"QX": "Dup", "LM": 4, "ZP": 5},
        ]));
        let anchors = vec![Anchor::by_value(json!("Dup"), "rarity", json!(4))];
        let mut mapping = KeyMapping::new();
        resolve_anchors(&recs, &schema(), &anchors, &mut mapping);
        assert_eq!(mapping.key_for("rarity"), Some("LM"));
    }

    #[test]
    fn integer_and_float_values_compare_equal() {
        assert!(values_equal(&json!(4), &json!(4.0)));
        assert!(!values_equal(&json!(4), &json!("4")));
    }

    #[test]
    fn toml_tables_extend_builtin_anchors() {
        let extra = AnchorTable::from_toml_str(
            r#"
            [[anchors.WeaponExcelConfigData]]
            field = "rankLevel"
            expected = 1
            locate = { by = "field", field = "id", value = 11101 }
            "#,
        )
        .unwrap();
        let mut table = AnchorTable::builtin();
        let before = table.for_dataset("WeaponExcelConfigData").len();
        table.extend(extra);
        let anchors = table.for_dataset("WeaponExcelConfigData");
        assert_eq!(anchors.len(), before + 1);
        assert_eq!(anchors.last().unwrap().field, "rankLevel");
        assert!(table.for_dataset("Unknown").is_empty());
    }
}
