//! Recent-roll history for display.
//!
//! A short, newest-first list of labelled roll outcomes. Independent of the
//! undo log: rolls are not state transitions and cannot be undone.

use serde::{Deserialize, Serialize};

use crate::character::now_timestamp;
use crate::dice::{AttackRollResult, RollResult, SaveRollResult};

/// Entries retained before the oldest falls off.
pub const MAX_HISTORY: usize = 10;

/// One roll outcome, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "result", rename_all = "snake_case")]
pub enum RollOutcome {
    Attack(AttackRollResult),
    Save(SaveRollResult),
    Check(RollResult),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub outcome: RollOutcome,
    /// What was rolled, e.g. "Longsword" or "DEX save".
    pub label: String,
    pub timestamp: String,
}

impl HistoryEntry {
    /// Compact one-line summary: "18! → 12" for a crit attack with damage,
    /// "14 ✓" for a passed save, the bare total for a check.
    pub fn summary(&self) -> String {
        match &self.outcome {
            RollOutcome::Attack(attack) => {
                let mut text = attack.to_hit_roll.total.to_string();
                if attack.is_crit {
                    text.push('!');
                }
                if let Some(damage) = &attack.damage_roll {
                    text.push_str(&format!(" → {}", damage.total));
                }
                text
            }
            RollOutcome::Save(save) => {
                let icon = if save.success { '✓' } else { '✗' };
                format!("{} {icon}", save.roll.total)
            }
            RollOutcome::Check(check) => check.total.to_string(),
        }
    }
}

/// Bounded, newest-first roll history.
#[derive(Debug, Clone, Default)]
pub struct RollHistory {
    entries: Vec<HistoryEntry>,
}

impl RollHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: impl Into<String>, outcome: RollOutcome) {
        self.entries.insert(
            0,
            HistoryEntry {
                outcome,
                label: label.into(),
                timestamp: now_timestamp(),
            },
        );
        self.entries.truncate(MAX_HISTORY);
    }

    /// Newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
