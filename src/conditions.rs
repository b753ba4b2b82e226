//! Active conditions and the standard 5e condition reference table.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A condition currently affecting the character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCondition {
    pub id: Uuid,
    /// "Poisoned", "Frightened", ...
    pub name: String,
    /// Where it came from, e.g. "Giant Spider bite".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Free-text end clause: "End of next turn", "CON DC 14".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends: Option<String>,
    /// Round countdown; absent means no automatic expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds_remaining: Option<u32>,
}

impl ActiveCondition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            source: None,
            ends: None,
            rounds_remaining: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_ends(mut self, ends: impl Into<String>) -> Self {
        self.ends = Some(ends.into());
        self
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds_remaining = Some(rounds);
        self
    }

    /// Count down one round. Conditions without a countdown are untouched.
    pub fn tick_round(&mut self) {
        if let Some(rounds) = self.rounds_remaining {
            if rounds > 0 {
                self.rounds_remaining = Some(rounds - 1);
            }
        }
    }

    /// Expired once the countdown reaches zero. No countdown never expires.
    pub fn is_expired(&self) -> bool {
        matches!(self.rounds_remaining, Some(0))
    }
}

/// Rules summary for a standard condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub effects: &'static [&'static str],
}

/// The fifteen standard 5e conditions plus exhaustion.
pub const STANDARD_CONDITIONS: &[ConditionInfo] = &[
    ConditionInfo {
        name: "Blinded",
        description: "Cannot see",
        effects: &[
            "Automatically fails ability checks requiring sight",
            "Attack rolls against you have advantage",
            "Your attack rolls have disadvantage",
        ],
    },
    ConditionInfo {
        name: "Charmed",
        description: "Magically influenced",
        effects: &[
            "Can't attack the charmer or target them with harmful abilities",
            "Charmer has advantage on social checks against you",
        ],
    },
    ConditionInfo {
        name: "Deafened",
        description: "Cannot hear",
        effects: &["Automatically fails ability checks requiring hearing"],
    },
    ConditionInfo {
        name: "Frightened",
        description: "Terrified of a source",
        effects: &[
            "Disadvantage on ability checks and attacks while source is visible",
            "Can't willingly move closer to the source",
        ],
    },
    ConditionInfo {
        name: "Grappled",
        description: "Held in place",
        effects: &[
            "Speed becomes 0",
            "Ends if grappler is incapacitated or you are moved apart",
        ],
    },
    ConditionInfo {
        name: "Incapacitated",
        description: "Cannot act",
        effects: &["Can't take actions or reactions"],
    },
    ConditionInfo {
        name: "Invisible",
        description: "Cannot be seen",
        effects: &[
            "Can't be seen without magic or special sense",
            "Attack rolls against you have disadvantage",
            "Your attack rolls have advantage",
        ],
    },
    ConditionInfo {
        name: "Paralyzed",
        description: "Cannot move or speak",
        effects: &[
            "Incapacitated, cannot move or speak",
            "Automatically fails STR and DEX saves",
            "Attacks against you have advantage",
            "Hits within 5 feet are automatic crits",
        ],
    },
    ConditionInfo {
        name: "Petrified",
        description: "Turned to stone",
        effects: &[
            "Transformed to inanimate substance",
            "Incapacitated, cannot move or speak",
            "Unaware of surroundings",
            "Attacks against you have advantage",
            "Automatically fails STR and DEX saves",
            "Resistance to all damage",
            "Immune to poison and disease",
        ],
    },
    ConditionInfo {
        name: "Poisoned",
        description: "Suffering from poison",
        effects: &["Disadvantage on attack rolls and ability checks"],
    },
    ConditionInfo {
        name: "Prone",
        description: "Lying on the ground",
        effects: &[
            "Can only crawl (costs extra movement to stand)",
            "Disadvantage on attack rolls",
            "Attacks within 5 feet have advantage, others have disadvantage",
        ],
    },
    ConditionInfo {
        name: "Restrained",
        description: "Held in place",
        effects: &[
            "Speed becomes 0",
            "Attack rolls against you have advantage",
            "Your attack rolls have disadvantage",
            "Disadvantage on DEX saves",
        ],
    },
    ConditionInfo {
        name: "Stunned",
        description: "Overwhelmed",
        effects: &[
            "Incapacitated, cannot move",
            "Can only speak falteringly",
            "Automatically fails STR and DEX saves",
            "Attacks against you have advantage",
        ],
    },
    ConditionInfo {
        name: "Unconscious",
        description: "Completely unaware",
        effects: &[
            "Incapacitated, cannot move or speak",
            "Unaware of surroundings, drops held items, falls prone",
            "Automatically fails STR and DEX saves",
            "Attacks against you have advantage",
            "Hits within 5 feet are automatic crits",
        ],
    },
    ConditionInfo {
        name: "Exhaustion",
        description: "Levels of fatigue",
        effects: &[
            "1: Disadvantage on ability checks",
            "2: Speed halved",
            "3: Disadvantage on attacks and saves",
            "4: HP maximum halved",
            "5: Speed reduced to 0",
            "6: Death",
        ],
    },
];

/// Case-insensitive lookup into the standard condition table.
pub fn find_condition_info(name: &str) -> Option<&'static ConditionInfo> {
    STANDARD_CONDITIONS
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_round_decrements() {
        let mut poisoned = ActiveCondition::new("Poisoned").with_rounds(2);
        poisoned.tick_round();
        assert_eq!(poisoned.rounds_remaining, Some(1));
        assert!(!poisoned.is_expired());

        poisoned.tick_round();
        assert_eq!(poisoned.rounds_remaining, Some(0));
        assert!(poisoned.is_expired());
    }

    #[test]
    fn test_no_countdown_never_expires() {
        let mut prone = ActiveCondition::new("Prone");
        prone.tick_round();
        assert_eq!(prone.rounds_remaining, None);
        assert!(!prone.is_expired());
    }

    #[test]
    fn test_find_condition_info_case_insensitive() {
        assert!(find_condition_info("poisoned").is_some());
        assert!(find_condition_info("POISONED").is_some());
        assert!(find_condition_info("Moonstruck").is_none());
    }

    #[test]
    fn test_condition_json_round_trip() {
        let condition = ActiveCondition::new("Frightened")
            .with_source("Dragon fear")
            .with_ends("WIS DC 16 at end of turn")
            .with_rounds(3);

        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["roundsRemaining"], 3);

        let back: ActiveCondition = serde_json::from_value(json).unwrap();
        assert_eq!(back, condition);
    }
}
