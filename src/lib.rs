//! Session engine for an offline tabletop RPG character tracker.
//!
//! This crate is the rules core behind a character-sheet UI:
//! - Dice rolling with advantage, crits, and saving throws
//! - Rest-based resource recovery (spell slots, hit dice, feature charges)
//! - A bounded undo/redo log of full session snapshots
//! - The `SessionEngine`, which routes every play-state mutation (damage,
//!   healing, conditions, concentration, rests) through that log
//!
//! Rendering, input handling, and storage backends live elsewhere; the
//! engine talks to them through `CharacterStore` and plain values.
//!
//! # Quick Start
//!
//! ```
//! use tracker_core::{sample_character, MemoryStore, RestType, SessionEngine};
//!
//! let store = MemoryStore::new();
//! let mut engine = SessionEngine::load(sample_character(), &store)?;
//!
//! engine.modify_hp(-7);
//! engine.modify_resource("second_wind", -1);
//! assert_eq!(engine.undo_description(), Some("Use resource"));
//!
//! engine.undo();
//! engine.apply_rest(RestType::Short, &[], &[]);
//! engine.save_to(&store)?;
//! # Ok::<(), tracker_core::StoreError>(())
//! ```

pub mod action_log;
pub mod character;
pub mod conditions;
pub mod dice;
pub mod history;
pub mod macros;
pub mod persist;
pub mod resources;
pub mod session;

// Primary public API
pub use action_log::{Action, ActionLog, MAX_UNDO_STACK};
pub use character::{
    ability_modifier, hit_die_healing, proficiency_bonus, sample_character, total_level, Ability,
    AbilityScores, CharacterDefinition, CharacterSession, ClassLevel, ConcentrationInfo,
    DeathSaves, ProficiencyLevel, Skill,
};
pub use conditions::{find_condition_info, ActiveCondition, ConditionInfo, STANDARD_CONDITIONS};
pub use dice::{
    parse_dice_expression, resolve_attack, resolve_save, roll, roll_attack, roll_d20, roll_dice,
    roll_die, roll_save, Advantage, AttackRollResult, D20Roll, DiceSpec, DieResult, RollResult,
    SaveRollResult,
};
pub use history::{HistoryEntry, RollHistory, RollOutcome, MAX_HISTORY};
pub use macros::{AttackMacro, CheckMacro, CritBehavior, DamageRoll, SaveMacro};
pub use persist::{
    character_save_path, list_character_saves, CharacterMetadata, CharacterSaveInfo,
    CharacterStore, ExportedCharacter, MemoryStore, PersistError, SavedCharacter, StoreError,
};
pub use resources::{
    calculate_recharge_amount, create_spell_slot_resources, eligible_for_rest, RechargeAmount,
    RechargeOn, ResourceCategory, ResourceDefinition, RestType, SpellSlotPreset, CASTER_PRESETS,
};
pub use session::{PendingConcentrationCheck, SessionEngine};
