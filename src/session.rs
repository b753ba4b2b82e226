//! SessionEngine - the single path through which play-state mutates.
//!
//! Every operation computes the next session as a pure function of the
//! current one (plus the immutable definition), records the `{previous,
//! new}` pair in the undo log, and publishes the result. A mutation that
//! changes nothing is not recorded at all.
//!
//! The pending concentration check is an engine-level signal, not session
//! state: it is set when damage lands while concentrating, lives outside
//! the undo history, and is cleared by the caller resolving or dismissing
//! it.

use tracing::{debug, warn};

use crate::action_log::{Action, ActionLog};
use crate::character::{
    now_timestamp, CharacterDefinition, CharacterSession, ConcentrationInfo, DeathSaves,
};
use crate::conditions::ActiveCondition;
use crate::persist::{CharacterStore, StoreError};
use crate::resources::{calculate_recharge_amount, eligible_for_rest, ResourceCategory, RestType};
use uuid::Uuid;

/// Signal that a concentration save is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConcentrationCheck {
    pub spell_name: String,
    pub dc: i32,
}

/// Holds one character's live session and its undo history.
///
/// Engines are plain values; tests create as many as they like and nothing
/// here is process-global.
pub struct SessionEngine {
    definition: CharacterDefinition,
    session: CharacterSession,
    log: ActionLog<CharacterSession>,
    pending_check: Option<PendingConcentrationCheck>,
}

impl SessionEngine {
    /// Wrap an existing session. The undo log starts empty; history never
    /// spans a character switch.
    pub fn new(definition: CharacterDefinition, session: CharacterSession) -> Self {
        Self {
            definition,
            session,
            log: ActionLog::new(),
            pending_check: None,
        }
    }

    /// Load a character: fetch its stored session, or seed and store a
    /// fresh one on first load.
    pub fn load<S: CharacterStore>(
        definition: CharacterDefinition,
        store: &S,
    ) -> Result<Self, StoreError> {
        let session = match store.get(definition.id)? {
            Some(existing) => existing,
            None => {
                debug!(character = %definition.name, "seeding initial session");
                let fresh = CharacterSession::new_for(&definition);
                store.put(&fresh)?;
                fresh
            }
        };
        Ok(Self::new(definition, session))
    }

    /// Write the current session to a store.
    pub fn save_to<S: CharacterStore>(&self, store: &S) -> Result<(), StoreError> {
        store.put(&self.session)
    }

    pub fn definition(&self) -> &CharacterDefinition {
        &self.definition
    }

    pub fn session(&self) -> &CharacterSession {
        &self.session
    }

    pub fn pending_concentration_check(&self) -> Option<&PendingConcentrationCheck> {
        self.pending_check.as_ref()
    }

    /// Run one mutation through the log. Returns false (and records
    /// nothing) when the session comes out unchanged.
    fn apply(
        &mut self,
        name: impl Into<String>,
        mutate: impl FnOnce(&mut CharacterSession, &CharacterDefinition),
    ) -> bool {
        let mut next = self.session.clone();
        mutate(&mut next, &self.definition);
        if next == self.session {
            return false;
        }

        next.last_modified = now_timestamp();
        let name = name.into();
        debug!(action = %name, "session mutation");
        self.log.push(name, self.session.clone(), next.clone());
        self.session = next;
        true
    }

    // ------------------------------------------------------------------
    // Hit points
    // ------------------------------------------------------------------

    /// Apply damage (negative) or healing (positive). Damage is absorbed
    /// by temp HP first; dropping to 0 sets downed, resets death saves,
    /// and breaks concentration. Damage taken while concentrating raises
    /// a pending concentration check at DC `max(10, floor(damage / 2))`.
    pub fn modify_hp(&mut self, delta: i32) {
        let was_concentrating = self.session.concentrating_on.clone();
        let damage_taken = if delta < 0 { delta.saturating_abs() } else { 0 };

        let name = if delta >= 0 {
            format!("HP +{delta}")
        } else {
            format!("HP {delta}")
        };

        self.apply(name, |sess, def| {
            let mut new_hp = sess.current_hp.saturating_add(delta);
            let mut new_temp = sess.temp_hp;

            if delta < 0 {
                let damage = delta.saturating_abs();
                if new_temp > 0 {
                    let absorbed = new_temp.min(damage);
                    new_temp -= absorbed;
                    new_hp = sess.current_hp.saturating_sub(damage - absorbed);
                }
            }

            new_hp = new_hp.clamp(0, def.max_hp);
            new_temp = new_temp.max(0);

            let should_be_down = new_hp == 0;
            if should_be_down && !sess.is_downed {
                sess.death_saves = DeathSaves::default();
            }
            if should_be_down {
                sess.concentrating_on = None;
            }

            sess.current_hp = new_hp;
            sess.temp_hp = new_temp;
            sess.is_downed = should_be_down;
        });

        if damage_taken > 0 {
            if let Some(concentration) = was_concentrating {
                let dc = (damage_taken / 2).max(10);
                debug!(spell = %concentration.spell_name, dc, "concentration check due");
                self.pending_check = Some(PendingConcentrationCheck {
                    spell_name: concentration.spell_name,
                    dc,
                });
            }
        }
    }

    /// Set HP directly, clamped to `[0, maxHP]`. Transitioning into 0
    /// sets downed and resets death saves.
    pub fn set_hp(&mut self, value: i32) {
        self.apply(format!("Set HP to {value}"), |sess, def| {
            let new_hp = value.clamp(0, def.max_hp);
            let should_be_down = new_hp == 0;
            if should_be_down && !sess.is_downed {
                sess.death_saves = DeathSaves::default();
            }
            sess.current_hp = new_hp;
            sess.is_downed = should_be_down;
        });
    }

    /// Set temp HP directly, floored at 0.
    pub fn set_temp_hp(&mut self, value: i32) {
        self.apply(format!("Set Temp HP to {value}"), |sess, _| {
            sess.temp_hp = value.max(0);
        });
    }

    /// Manual override of the downed flag, distinct from the HP-zero rule.
    pub fn toggle_downed(&mut self) {
        self.apply("Toggle Downed", |sess, _| {
            sess.is_downed = !sess.is_downed;
        });
    }

    // ------------------------------------------------------------------
    // Death saves
    // ------------------------------------------------------------------

    pub fn add_death_success(&mut self) {
        self.apply("Death Save Success", |sess, _| {
            sess.death_saves.add_success();
        });
    }

    pub fn add_death_failure(&mut self) {
        self.apply("Death Save Failure", |sess, _| {
            sess.death_saves.add_failure();
        });
    }

    /// Zero both tallies and clear the downed flag.
    pub fn reset_death_saves(&mut self) {
        self.apply("Reset Death Saves", |sess, _| {
            sess.death_saves.reset();
            sess.is_downed = false;
        });
    }

    // ------------------------------------------------------------------
    // Concentration
    // ------------------------------------------------------------------

    pub fn set_concentration(&mut self, spell_name: impl Into<String>) {
        let spell_name = spell_name.into();
        self.apply(format!("Concentrating on {spell_name}"), move |sess, _| {
            sess.concentrating_on = Some(ConcentrationInfo {
                spell_name,
                save_dc: None,
            });
        });
    }

    /// Drop concentration and clear any pending check.
    pub fn break_concentration(&mut self) {
        self.apply("Break Concentration", |sess, _| {
            sess.concentrating_on = None;
        });
        self.pending_check = None;
    }

    /// Treat the pending check as passed: clear the signal, keep the spell.
    pub fn dismiss_concentration_check(&mut self) {
        self.pending_check = None;
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    /// Spend (negative) or restore (positive) a resource, clamped to
    /// `[0, maximum]`. Unknown ids are ignored entirely and nothing is
    /// recorded.
    pub fn modify_resource(&mut self, resource_id: &str, delta: i32) {
        let Some(resource) = self.definition.resource(resource_id) else {
            warn!(resource_id, "ignoring modify for unknown resource");
            return;
        };
        let maximum = resource.maximum;
        let id = resource_id.to_string();

        let name = if delta >= 0 {
            "Restore resource"
        } else {
            "Use resource"
        };
        self.apply(name, move |sess, _| {
            let current = sess.resource_currents.get(&id).copied().unwrap_or(maximum);
            let new_value = current.saturating_add(delta).clamp(0, maximum);
            sess.resource_currents.insert(id, new_value);
        });
    }

    // ------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------

    pub fn add_condition(&mut self, condition: ActiveCondition) {
        self.apply(format!("Add {}", condition.name), move |sess, _| {
            sess.conditions.push(condition);
        });
    }

    pub fn remove_condition(&mut self, condition_id: Uuid) {
        let Some(condition) = self.session.conditions.iter().find(|c| c.id == condition_id) else {
            return;
        };
        let name = format!("Remove {}", condition.name);
        self.apply(name, move |sess, _| {
            sess.conditions.retain(|c| c.id != condition_id);
        });
    }

    /// Advance the round counter on timed conditions and drop any that
    /// expire. Conditions without a countdown are untouched.
    pub fn end_turn(&mut self) {
        self.apply("End Turn", |sess, _| {
            for condition in &mut sess.conditions {
                condition.tick_round();
            }
            sess.conditions.retain(|c| !c.is_expired());
        });
    }

    // ------------------------------------------------------------------
    // Rest
    // ------------------------------------------------------------------

    /// Apply a rest. Eligible resources whose ids appear in
    /// `selected_resource_ids` are recharged per their rule. A long rest
    /// also restores HP to maximum, zeroes temp HP, resets death saves,
    /// clears downed, and drops concentration. A short rest heals by the
    /// supplied hit-die healing values (see
    /// [`crate::character::hit_die_healing`]) and spends that many hit
    /// dice.
    pub fn apply_rest(
        &mut self,
        rest_type: RestType,
        selected_resource_ids: &[String],
        hit_die_rolls: &[i32],
    ) {
        let recharges: Vec<(String, i32)> =
            eligible_for_rest(&self.definition.resource_definitions, rest_type)
                .into_iter()
                .filter(|r| selected_resource_ids.iter().any(|id| *id == r.id))
                .map(|r| {
                    let current = self.session.resource_current(r);
                    (r.id.clone(), calculate_recharge_amount(r, current))
                })
                .collect();

        let hit_dice = self
            .definition
            .resource_definitions
            .iter()
            .find(|r| r.category == ResourceCategory::HitDice)
            .map(|r| (r.id.clone(), r.maximum));
        let healing = hit_die_rolls
            .iter()
            .fold(0i32, |sum, &roll| sum.saturating_add(roll));
        let dice_spent = hit_die_rolls.len() as i32;

        let name = match rest_type {
            RestType::Short => "Short Rest",
            RestType::Long => "Long Rest",
        };

        self.apply(name, move |sess, def| {
            for (id, value) in recharges {
                sess.resource_currents.insert(id, value);
            }

            match rest_type {
                RestType::Long => {
                    sess.current_hp = def.max_hp;
                    sess.temp_hp = 0;
                    sess.death_saves = DeathSaves::default();
                    sess.is_downed = false;
                    sess.concentrating_on = None;
                }
                RestType::Short => {
                    if dice_spent > 0 {
                        if let Some((id, maximum)) = hit_dice {
                            let current =
                                sess.resource_currents.get(&id).copied().unwrap_or(maximum);
                            sess.resource_currents.insert(id, (current - dice_spent).max(0));
                        }
                    }
                    if healing > 0 {
                        sess.current_hp = sess.current_hp.saturating_add(healing).min(def.max_hp);
                    }
                }
            }
        });
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    /// Revert the most recent action. Returns false when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        match self.log.undo() {
            Some(restored) => {
                debug!("undo");
                self.session = restored;
                true
            }
            None => false,
        }
    }

    /// Re-apply the next undone action. Returns false when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.log.redo() {
            Some(restored) => {
                debug!("redo");
                self.session = restored;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.log.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.log.redo_description()
    }

    pub fn recent_actions(&self, count: usize) -> Vec<&Action<CharacterSession>> {
        self.log.recent_actions(count)
    }
}
