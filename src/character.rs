//! Character data model: the static definition and the mutable play session.
//!
//! A `CharacterDefinition` is the sheet: externally owned, immutable during
//! play. A `CharacterSession` is everything that changes at the table: HP,
//! resources, conditions, concentration. The session engine only ever
//! mutates the session; the definition is read for maximums and rules.
//!
//! JSON field names are camelCase to stay structurally compatible with the
//! companion app's `{definition, session}` export format.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::conditions::ActiveCondition;
use crate::macros::{AttackMacro, CheckMacro, SaveMacro};
use crate::resources::ResourceDefinition;

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

/// The eighteen standard skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Skill {
    Acrobatics,
    AnimalHandling,
    Arcana,
    Athletics,
    Deception,
    History,
    Insight,
    Intimidation,
    Investigation,
    Medicine,
    Nature,
    Perception,
    Performance,
    Persuasion,
    Religion,
    SleightOfHand,
    Stealth,
    Survival,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyLevel {
    #[default]
    None,
    Proficient,
    Expertise,
}

/// Raw ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(rename = "str")]
    pub strength: u8,
    #[serde(rename = "dex")]
    pub dexterity: u8,
    #[serde(rename = "con")]
    pub constitution: u8,
    #[serde(rename = "int")]
    pub intelligence: u8,
    #[serde(rename = "wis")]
    pub wisdom: u8,
    #[serde(rename = "cha")]
    pub charisma: u8,
}

impl AbilityScores {
    pub fn score(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Str => self.strength,
            Ability::Dex => self.dexterity,
            Ability::Con => self.constitution,
            Ability::Int => self.intelligence,
            Ability::Wis => self.wisdom,
            Ability::Cha => self.charisma,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        ability_modifier(self.score(ability))
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

/// One class entry on a (possibly multiclassed) character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassLevel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass: Option<String>,
    pub level: u8,
}

impl ClassLevel {
    pub fn new(name: impl Into<String>, level: u8) -> Self {
        Self {
            name: name.into(),
            subclass: None,
            level,
        }
    }
}

/// The static character sheet. Read-only as far as play is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDefinition {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    pub race: String,
    pub classes: Vec<ClassLevel>,
    pub background: String,

    pub ability_scores: AbilityScores,
    #[serde(default)]
    pub saving_throw_proficiencies: HashMap<Ability, ProficiencyLevel>,
    #[serde(default)]
    pub skill_proficiencies: HashMap<Skill, ProficiencyLevel>,

    #[serde(rename = "maxHP")]
    pub max_hp: i32,
    pub armor_class: i32,
    pub speed: u32,
    pub initiative_bonus: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spellcasting_ability: Option<Ability>,
    #[serde(
        rename = "spellSaveDC",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub spell_save_dc: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_attack_bonus: Option<i32>,

    /// Capped, rechargeable counters: spell slots, hit dice, feature charges.
    #[serde(default)]
    pub resource_definitions: Vec<ResourceDefinition>,

    #[serde(default)]
    pub attack_macros: Vec<AttackMacro>,
    #[serde(default)]
    pub save_macros: Vec<SaveMacro>,
    #[serde(default)]
    pub check_macros: Vec<CheckMacro>,

    pub version: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl CharacterDefinition {
    /// Sum of class levels.
    pub fn total_level(&self) -> u32 {
        total_level(&self.classes)
    }

    pub fn proficiency_bonus(&self) -> i32 {
        proficiency_bonus(self.total_level())
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceDefinition> {
        self.resource_definitions.iter().find(|r| r.id == id)
    }
}

/// Death saving throw tallies, each clamped to [0, 3].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeathSaves {
    pub successes: u8,
    pub failures: u8,
}

impl DeathSaves {
    /// Record a success; true once three are banked.
    pub fn add_success(&mut self) -> bool {
        self.successes = (self.successes + 1).min(3);
        self.successes >= 3
    }

    /// Record a failure; true once three are banked.
    pub fn add_failure(&mut self) -> bool {
        self.failures = (self.failures + 1).min(3);
        self.failures >= 3
    }

    pub fn reset(&mut self) {
        self.successes = 0;
        self.failures = 0;
    }
}

/// What the character is concentrating on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationInfo {
    pub spell_name: String,
    #[serde(rename = "saveDC", default, skip_serializing_if = "Option::is_none")]
    pub save_dc: Option<i32>,
}

/// The mutable play-state for one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSession {
    pub id: Uuid,
    /// Links back to the owning `CharacterDefinition`.
    pub definition_id: Uuid,

    #[serde(rename = "currentHP")]
    pub current_hp: i32,
    #[serde(rename = "tempHP")]
    pub temp_hp: i32,

    pub death_saves: DeathSaves,
    /// Derived when HP is set, but manually toggleable; not kept in sync
    /// with HP outside HP-affecting operations.
    pub is_downed: bool,

    /// Current resource values keyed by resource id. An absent key means
    /// "at maximum".
    #[serde(default)]
    pub resource_currents: HashMap<String, i32>,

    #[serde(default)]
    pub conditions: Vec<ActiveCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concentrating_on: Option<ConcentrationInfo>,

    pub last_modified: String,
}

impl CharacterSession {
    /// Seed a fresh session for a definition: full HP, all resources at
    /// maximum, nothing else going on.
    pub fn new_for(definition: &CharacterDefinition) -> Self {
        let resource_currents = definition
            .resource_definitions
            .iter()
            .map(|r| (r.id.clone(), r.maximum))
            .collect();

        Self {
            id: Uuid::new_v4(),
            definition_id: definition.id,
            current_hp: definition.max_hp,
            temp_hp: 0,
            death_saves: DeathSaves::default(),
            is_downed: false,
            resource_currents,
            conditions: Vec::new(),
            concentrating_on: None,
            last_modified: now_timestamp(),
        }
    }

    /// Current value of a resource, falling back to its maximum when the
    /// session has never touched it.
    pub fn resource_current(&self, definition: &ResourceDefinition) -> i32 {
        self.resource_currents
            .get(&definition.id)
            .copied()
            .unwrap_or(definition.maximum)
    }
}

/// Ability modifier: floor((score - 10) / 2).
pub fn ability_modifier(score: u8) -> i32 {
    (score as i32 - 10).div_euclid(2)
}

/// Total character level across classes.
pub fn total_level(classes: &[ClassLevel]) -> u32 {
    classes.iter().map(|c| c.level as u32).sum()
}

/// Proficiency bonus for a total level (+2 at 1, +3 at 5, ...).
pub fn proficiency_bonus(total_level: u32) -> i32 {
    (total_level as i32 - 1).div_euclid(4) + 2
}

/// Hit-die healing: the die result plus CON modifier, minimum 1.
pub fn hit_die_healing(die_result: i32, con_mod: i32) -> i32 {
    (die_result + con_mod).max(1)
}

/// Current timestamp in unix seconds, as a string.
pub(crate) fn now_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", now.as_secs())
}

/// A ready-made level 5 fighter used by tests and demos.
pub fn sample_character() -> CharacterDefinition {
    use crate::resources::{RechargeAmount, RechargeOn, ResourceCategory};

    let timestamp = now_timestamp();

    CharacterDefinition {
        id: Uuid::new_v4(),
        name: "Branwen Oakmantle".to_string(),
        player_name: None,
        race: "Human".to_string(),
        classes: vec![ClassLevel {
            name: "Fighter".to_string(),
            subclass: Some("Battle Master".to_string()),
            level: 5,
        }],
        background: "Soldier".to_string(),
        ability_scores: AbilityScores {
            strength: 18,
            dexterity: 12,
            constitution: 16,
            intelligence: 10,
            wisdom: 13,
            charisma: 8,
        },
        saving_throw_proficiencies: HashMap::from([
            (Ability::Str, ProficiencyLevel::Proficient),
            (Ability::Con, ProficiencyLevel::Proficient),
        ]),
        skill_proficiencies: HashMap::from([
            (Skill::Athletics, ProficiencyLevel::Proficient),
            (Skill::Intimidation, ProficiencyLevel::Proficient),
        ]),
        max_hp: 49,
        armor_class: 18,
        speed: 30,
        initiative_bonus: 1,
        spellcasting_ability: None,
        spell_save_dc: None,
        spell_attack_bonus: None,
        resource_definitions: vec![
            ResourceDefinition {
                id: "hit_dice".to_string(),
                name: "Hit Dice".to_string(),
                category: ResourceCategory::HitDice,
                maximum: 5,
                slot_level: None,
                die_type: Some(10),
                recharge_on: RechargeOn::LongRest,
                recharge_amount: RechargeAmount::Half,
            },
            ResourceDefinition {
                id: "second_wind".to_string(),
                name: "Second Wind".to_string(),
                category: ResourceCategory::ClassFeature,
                maximum: 1,
                slot_level: None,
                die_type: None,
                recharge_on: RechargeOn::ShortRest,
                recharge_amount: RechargeAmount::Full,
            },
            ResourceDefinition {
                id: "superiority_dice".to_string(),
                name: "Superiority Dice".to_string(),
                category: ResourceCategory::ClassFeature,
                maximum: 4,
                slot_level: None,
                die_type: Some(8),
                recharge_on: RechargeOn::ShortRest,
                recharge_amount: RechargeAmount::Full,
            },
        ],
        attack_macros: vec![AttackMacro::new("Longsword", 7, "1d8", 4, "slashing")],
        save_macros: vec![SaveMacro::new("Menacing Attack", 15, Ability::Wis)],
        check_macros: vec![CheckMacro::new("Athletics", Ability::Str, 7).with_skill(Skill::Athletics)],
        version: 1,
        created_at: timestamp.clone(),
        updated_at: timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_modifier_table() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(12), 1);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(20), 5);
        assert_eq!(ability_modifier(3), -4);
    }

    #[test]
    fn test_proficiency_bonus_breakpoints() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(4), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(9), 4);
        assert_eq!(proficiency_bonus(17), 6);
    }

    #[test]
    fn test_total_level_sums_multiclass() {
        let classes = vec![ClassLevel::new("Fighter", 5), ClassLevel::new("Rogue", 2)];
        assert_eq!(total_level(&classes), 7);
    }

    #[test]
    fn test_death_saves_clamp_at_three() {
        let mut saves = DeathSaves::default();
        assert!(!saves.add_success());
        assert!(!saves.add_success());
        assert!(saves.add_success());
        assert!(saves.add_success());
        assert_eq!(saves.successes, 3);

        saves.reset();
        assert_eq!(saves.successes, 0);
        assert_eq!(saves.failures, 0);
    }

    #[test]
    fn test_new_session_starts_at_full() {
        let definition = sample_character();
        let session = CharacterSession::new_for(&definition);

        assert_eq!(session.definition_id, definition.id);
        assert_eq!(session.current_hp, definition.max_hp);
        assert_eq!(session.temp_hp, 0);
        assert!(!session.is_downed);
        assert!(session.conditions.is_empty());
        for resource in &definition.resource_definitions {
            assert_eq!(session.resource_current(resource), resource.maximum);
        }
    }

    #[test]
    fn test_resource_current_defaults_to_maximum() {
        let definition = sample_character();
        let mut session = CharacterSession::new_for(&definition);
        session.resource_currents.clear();

        let second_wind = definition.resource("second_wind").unwrap();
        assert_eq!(session.resource_current(second_wind), 1);
    }

    #[test]
    fn test_hit_die_healing_minimum_one() {
        assert_eq!(hit_die_healing(1, -3), 1);
        assert_eq!(hit_die_healing(6, 3), 9);
        assert_eq!(hit_die_healing(2, -1), 1);
    }

    #[test]
    fn test_session_json_uses_camel_case_contract() {
        let definition = sample_character();
        let session = CharacterSession::new_for(&definition);

        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("currentHP").is_some());
        assert!(json.get("tempHP").is_some());
        assert!(json.get("isDowned").is_some());
        assert!(json.get("resourceCurrents").is_some());
        assert!(json.get("deathSaves").is_some());

        let back: CharacterSession = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_definition_json_round_trip() {
        let definition = sample_character();
        let json = serde_json::to_value(&definition).unwrap();
        assert!(json.get("maxHP").is_some());
        assert!(json.get("abilityScores").is_some());
        assert_eq!(json["abilityScores"]["str"], 18);

        let back: CharacterDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(back, definition);
    }
}
