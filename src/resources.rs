//! Resource definitions and rest-based recovery math.
//!
//! A resource is any capped, rechargeable counter: spell slots, hit dice,
//! class-feature charges, item charges. The functions here are pure and
//! total; out-of-range inputs are re-clamped, never rejected.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    SpellSlot,
    PactSlot,
    HitDice,
    ClassFeature,
    ItemCharge,
    Custom,
}

/// When a resource recharges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RechargeOn {
    ShortRest,
    LongRest,
    Daily,
    /// Never auto-selected by a rest; the caller restores it explicitly.
    Manual,
}

/// How much a resource recharges. Serializes as `"full"`, `"half"`, or a
/// bare integer, matching the companion app's JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RechargeAmount {
    Full,
    Half,
    Fixed(i32),
}

impl Serialize for RechargeAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RechargeAmount::Full => serializer.serialize_str("full"),
            RechargeAmount::Half => serializer.serialize_str("half"),
            RechargeAmount::Fixed(n) => serializer.serialize_i32(*n),
        }
    }
}

impl<'de> Deserialize<'de> for RechargeAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl Visitor<'_> for AmountVisitor {
            type Value = RechargeAmount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(r#""full", "half", or an integer"#)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                match value {
                    "full" => Ok(RechargeAmount::Full),
                    "half" => Ok(RechargeAmount::Half),
                    other => Err(E::unknown_variant(other, &["full", "half"])),
                }
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                i32::try_from(value)
                    .map(RechargeAmount::Fixed)
                    .map_err(|_| E::custom("recharge amount out of range"))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                i32::try_from(value)
                    .map(RechargeAmount::Fixed)
                    .map_err(|_| E::custom("recharge amount out of range"))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Immutable description of one resource on a character definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    pub id: String,
    /// "1st Level Slots", "Ki Points".
    pub name: String,
    pub category: ResourceCategory,
    pub maximum: i32,
    /// For spell slots (1-9).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_level: Option<u8>,
    /// For hit dice (6, 8, 10, 12).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub die_type: Option<u32>,
    pub recharge_on: RechargeOn,
    pub recharge_amount: RechargeAmount,
}

/// The two rest lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestType {
    Short,
    Long,
}

/// New current value for a resource after a rest, clamped to
/// `[0, maximum]`.
///
/// - `Full` restores to maximum unconditionally.
/// - `Half` adds `max(1, ceil(maximum / 2))`, so at least +1 even for a
///   maximum of 1.
/// - `Fixed(n)` adds n.
pub fn calculate_recharge_amount(definition: &ResourceDefinition, current: i32) -> i32 {
    let maximum = definition.maximum.max(0);

    let recharged = match definition.recharge_amount {
        RechargeAmount::Full => maximum,
        RechargeAmount::Half => {
            let half = ((maximum + 1) / 2).max(1);
            current.saturating_add(half)
        }
        RechargeAmount::Fixed(n) => current.saturating_add(n),
    };

    recharged.clamp(0, maximum)
}

/// Resources a rest is allowed to recharge, in input order. A short rest
/// touches only short-rest resources; a long rest covers short-rest,
/// long-rest, and daily. Manual resources are never auto-selected.
pub fn eligible_for_rest(
    definitions: &[ResourceDefinition],
    rest_type: RestType,
) -> Vec<&ResourceDefinition> {
    definitions
        .iter()
        .filter(|def| match rest_type {
            RestType::Short => def.recharge_on == RechargeOn::ShortRest,
            RestType::Long => matches!(
                def.recharge_on,
                RechargeOn::ShortRest | RechargeOn::LongRest | RechargeOn::Daily
            ),
        })
        .collect()
}

// ============================================================================
// Spell slot presets
// ============================================================================

/// Spell slots granted by a caster archetype.
#[derive(Debug, Clone)]
pub struct SpellSlotPreset {
    pub name: &'static str,
    /// (slot level, count) pairs.
    pub slots: Vec<(u8, i32)>,
    /// Warlock pact magic: (slot level, count).
    pub pact_slots: Option<(u8, i32)>,
}

lazy_static::lazy_static! {
    /// Standard caster archetypes keyed by preset id.
    pub static ref CASTER_PRESETS: HashMap<&'static str, SpellSlotPreset> = {
        let mut presets = HashMap::new();
        presets.insert("full", SpellSlotPreset {
            name: "Full Caster",
            slots: vec![(1, 4), (2, 3), (3, 3), (4, 3), (5, 3), (6, 2), (7, 2), (8, 1), (9, 1)],
            pact_slots: None,
        });
        presets.insert("half", SpellSlotPreset {
            name: "Half Caster",
            slots: vec![(1, 4), (2, 3), (3, 3), (4, 3), (5, 2)],
            pact_slots: None,
        });
        presets.insert("third", SpellSlotPreset {
            name: "Third Caster",
            slots: vec![(1, 4), (2, 3), (3, 3), (4, 1)],
            pact_slots: None,
        });
        presets.insert("warlock", SpellSlotPreset {
            name: "Warlock",
            slots: vec![],
            pact_slots: Some((5, 4)),
        });
        presets.insert("artificer", SpellSlotPreset {
            name: "Artificer",
            slots: vec![(1, 4), (2, 3), (3, 3), (4, 3), (5, 2)],
            pact_slots: None,
        });
        presets
    };
}

/// Expand a caster preset into resource definitions. Standard slots
/// recharge fully on a long rest; pact slots on a short rest.
pub fn create_spell_slot_resources(preset: &SpellSlotPreset) -> Vec<ResourceDefinition> {
    let mut resources = Vec::new();

    for &(level, count) in &preset.slots {
        resources.push(ResourceDefinition {
            id: format!("spell_slot_{level}"),
            name: format!("{} Level", ordinal(level)),
            category: ResourceCategory::SpellSlot,
            maximum: count,
            slot_level: Some(level),
            die_type: None,
            recharge_on: RechargeOn::LongRest,
            recharge_amount: RechargeAmount::Full,
        });
    }

    if let Some((level, count)) = preset.pact_slots {
        resources.push(ResourceDefinition {
            id: "pact_slot".to_string(),
            name: format!("Pact Slot ({})", ordinal(level)),
            category: ResourceCategory::PactSlot,
            maximum: count,
            slot_level: Some(level),
            die_type: None,
            recharge_on: RechargeOn::ShortRest,
            recharge_amount: RechargeAmount::Full,
        });
    }

    resources
}

fn ordinal(n: u8) -> String {
    match n {
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        _ => format!("{n}th"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(maximum: i32, recharge_amount: RechargeAmount) -> ResourceDefinition {
        ResourceDefinition {
            id: "test".to_string(),
            name: "Test".to_string(),
            category: ResourceCategory::Custom,
            maximum,
            slot_level: None,
            die_type: None,
            recharge_on: RechargeOn::LongRest,
            recharge_amount,
        }
    }

    #[test]
    fn test_full_recharge_restores_maximum() {
        let def = resource(4, RechargeAmount::Full);
        assert_eq!(calculate_recharge_amount(&def, 0), 4);
        assert_eq!(calculate_recharge_amount(&def, 2), 4);
        assert_eq!(calculate_recharge_amount(&def, 9), 4);
    }

    #[test]
    fn test_half_recharge_rounds_up_minimum_one() {
        let def = resource(5, RechargeAmount::Half);
        // ceil(5/2) = 3
        assert_eq!(calculate_recharge_amount(&def, 0), 3);
        assert_eq!(calculate_recharge_amount(&def, 4), 5);

        // Maximum of 1 still recovers at least 1.
        let tiny = resource(1, RechargeAmount::Half);
        assert_eq!(calculate_recharge_amount(&tiny, 0), 1);
    }

    #[test]
    fn test_fixed_recharge_caps_at_maximum() {
        let def = resource(6, RechargeAmount::Fixed(2));
        assert_eq!(calculate_recharge_amount(&def, 3), 5);
        assert_eq!(calculate_recharge_amount(&def, 5), 6);
    }

    #[test]
    fn test_recharge_reclamps_out_of_range_current() {
        let def = resource(4, RechargeAmount::Fixed(1));
        // current above maximum is pulled back into range
        assert_eq!(calculate_recharge_amount(&def, 10), 4);
        // deeply negative current cannot end below zero
        assert_eq!(calculate_recharge_amount(&def, -10), 0);
    }

    #[test]
    fn test_short_rest_selects_only_short_rest_resources() {
        let defs = vec![
            {
                let mut d = resource(2, RechargeAmount::Full);
                d.id = "short".into();
                d.recharge_on = RechargeOn::ShortRest;
                d
            },
            {
                let mut d = resource(2, RechargeAmount::Full);
                d.id = "long".into();
                d.recharge_on = RechargeOn::LongRest;
                d
            },
            {
                let mut d = resource(2, RechargeAmount::Full);
                d.id = "daily".into();
                d.recharge_on = RechargeOn::Daily;
                d
            },
            {
                let mut d = resource(2, RechargeAmount::Full);
                d.id = "manual".into();
                d.recharge_on = RechargeOn::Manual;
                d
            },
        ];

        let short: Vec<_> = eligible_for_rest(&defs, RestType::Short)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(short, vec!["short"]);

        let long: Vec<_> = eligible_for_rest(&defs, RestType::Long)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(long, vec!["short", "long", "daily"]);
    }

    #[test]
    fn test_recharge_amount_serde_forms() {
        assert_eq!(
            serde_json::to_string(&RechargeAmount::Full).unwrap(),
            r#""full""#
        );
        assert_eq!(
            serde_json::to_string(&RechargeAmount::Half).unwrap(),
            r#""half""#
        );
        assert_eq!(serde_json::to_string(&RechargeAmount::Fixed(3)).unwrap(), "3");

        let full: RechargeAmount = serde_json::from_str(r#""full""#).unwrap();
        assert_eq!(full, RechargeAmount::Full);
        let fixed: RechargeAmount = serde_json::from_str("2").unwrap();
        assert_eq!(fixed, RechargeAmount::Fixed(2));
        assert!(serde_json::from_str::<RechargeAmount>(r#""most""#).is_err());
    }

    #[test]
    fn test_warlock_preset_expands_to_pact_slot() {
        let warlock = &CASTER_PRESETS["warlock"];
        let resources = create_spell_slot_resources(warlock);

        assert_eq!(resources.len(), 1);
        let pact = &resources[0];
        assert_eq!(pact.id, "pact_slot");
        assert_eq!(pact.maximum, 4);
        assert_eq!(pact.recharge_on, RechargeOn::ShortRest);
        assert_eq!(pact.name, "Pact Slot (5th)");
    }

    #[test]
    fn test_full_caster_preset_slot_ids() {
        let full = &CASTER_PRESETS["full"];
        let resources = create_spell_slot_resources(full);

        assert_eq!(resources.len(), 9);
        assert_eq!(resources[0].id, "spell_slot_1");
        assert_eq!(resources[0].name, "1st Level");
        assert_eq!(resources[8].id, "spell_slot_9");
        assert_eq!(resources[8].name, "9th Level");
    }
}
