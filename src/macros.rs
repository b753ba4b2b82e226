//! Typed roll macros stored on a character definition.
//!
//! A macro is a pre-configured roll: an attack (to-hit plus damage), a save
//! the character forces on others, or a straight ability/skill check. The
//! dice engine consumes `DamageRoll` and `CritBehavior` directly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::character::{Ability, Skill};

/// A damage specification: dice expression, flat bonus, and damage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageRoll {
    /// Dice expression such as "2d6" or "1d8".
    pub dice: String,
    /// Flat bonus added to the dice total.
    pub bonus: i32,
    /// Damage type for display ("slashing", "fire", ...).
    #[serde(rename = "type")]
    pub damage_type: String,
    /// Die faces that are rerolled once (Great Weapon Fighting rerolls 1s and 2s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reroll_on: Option<Vec<u32>>,
}

impl DamageRoll {
    pub fn new(dice: impl Into<String>, bonus: i32, damage_type: impl Into<String>) -> Self {
        Self {
            dice: dice.into(),
            bonus,
            damage_type: damage_type.into(),
            reroll_on: None,
        }
    }

    /// Reroll the listed faces once per die.
    pub fn with_reroll_on(mut self, faces: Vec<u32>) -> Self {
        self.reroll_on = Some(faces);
        self
    }
}

/// How critical hits affect damage dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CritBehavior {
    /// Double the number of damage dice, rolled fresh.
    #[default]
    DoubleDice,
    /// Roll normally and add the theoretical dice maximum on top.
    MaxPlusRoll,
}

/// A weapon or spell attack macro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackMacro {
    pub id: Uuid,
    /// Display name, e.g. "Longsword".
    pub name: String,
    /// To-hit bonus added to the d20.
    pub to_hit: i32,
    pub damage: DamageRoll,
    /// Two-handed damage option, if the weapon is versatile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versatile_damage: Option<DamageRoll>,
    /// Reach or range, e.g. "5 ft" or "120 ft".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub crit_behavior: CritBehavior,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AttackMacro {
    pub fn new(
        name: impl Into<String>,
        to_hit: i32,
        damage_dice: impl Into<String>,
        damage_bonus: i32,
        damage_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            to_hit,
            damage: DamageRoll::new(damage_dice, damage_bonus, damage_type),
            versatile_damage: None,
            range: None,
            tags: Vec::new(),
            crit_behavior: CritBehavior::DoubleDice,
            notes: None,
        }
    }

    /// One-line summary, e.g. "+7 to hit, 1d8+5 slashing".
    pub fn summary(&self) -> String {
        format!(
            "{} to hit, {}",
            format_modifier(self.to_hit),
            format_damage_roll(&self.damage)
        )
    }
}

/// A macro forcing a saving throw on a target (e.g. a spell like Fireball).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMacro {
    pub id: Uuid,
    pub name: String,
    pub save_dc: i32,
    pub save_ability: Ability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<DamageRoll>,
    /// Whether a successful save still takes half damage.
    pub half_on_save: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SaveMacro {
    pub fn new(name: impl Into<String>, save_dc: i32, save_ability: Ability) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            save_dc,
            save_ability,
            damage: None,
            half_on_save: true,
            notes: None,
        }
    }

    pub fn with_damage(mut self, damage: DamageRoll) -> Self {
        self.damage = Some(damage);
        self
    }
}

/// An ability or skill check macro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckMacro {
    pub id: Uuid,
    pub name: String,
    pub ability: Ability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<Skill>,
    /// Total modifier, proficiency included.
    pub bonus: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CheckMacro {
    pub fn new(name: impl Into<String>, ability: Ability, bonus: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            ability,
            skill: None,
            bonus,
            notes: None,
        }
    }

    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skill = Some(skill);
        self
    }
}

/// Format a modifier with an explicit sign: "+7", "-1", "+0".
pub fn format_modifier(modifier: i32) -> String {
    if modifier >= 0 {
        format!("+{modifier}")
    } else {
        modifier.to_string()
    }
}

/// Format a damage roll for display, e.g. "1d8+5 slashing".
pub fn format_damage_roll(roll: &DamageRoll) -> String {
    if roll.bonus != 0 {
        format!(
            "{}{} {}",
            roll.dice,
            format_modifier(roll.bonus),
            roll.damage_type
        )
    } else {
        format!("{} {}", roll.dice, roll.damage_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_macro_summary() {
        let longsword = AttackMacro::new("Longsword", 7, "1d8", 5, "slashing");
        assert_eq!(longsword.summary(), "+7 to hit, 1d8+5 slashing");
    }

    #[test]
    fn test_format_modifier_signs() {
        assert_eq!(format_modifier(3), "+3");
        assert_eq!(format_modifier(0), "+0");
        assert_eq!(format_modifier(-2), "-2");
    }

    #[test]
    fn test_format_damage_roll_without_bonus() {
        let breath = DamageRoll::new("8d6", 0, "fire");
        assert_eq!(format_damage_roll(&breath), "8d6 fire");
    }

    #[test]
    fn test_damage_roll_type_field_serializes_as_type() {
        let roll = DamageRoll::new("2d6", 3, "radiant");
        let json = serde_json::to_value(&roll).unwrap();
        assert_eq!(json["type"], "radiant");
        assert!(json.get("rerollOn").is_none());

        let back: DamageRoll = serde_json::from_value(json).unwrap();
        assert_eq!(back, roll);
    }
}
