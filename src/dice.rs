//! Dice rolling and outcome composition.
//!
//! Expressions are the strict "NdS" form ("2d6", "1d20") with no modifier
//! terms and no multi-term sums. A flat bonus travels alongside the expression instead.
//! Malformed expressions never fail a roll: they degrade to a zero-dice,
//! bonus-only result, so callers must tolerate an empty dice list.
//!
//! Every roller has a `_with_rng` variant for deterministic use, and the
//! d20-to-outcome composition is split out (`resolve_attack`, `resolve_save`)
//! so tests can force a natural 1 or 20 without touching the RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::macros::{CritBehavior, DamageRoll};

/// A parsed "NdS" expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceSpec {
    pub count: u32,
    pub sides: u32,
}

/// One rolled die, with reroll bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DieResult {
    pub sides: u32,
    pub result: u32,
    pub was_rerolled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_roll: Option<u32>,
}

/// A complete roll: dice, flat bonus, and total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollResult {
    pub dice: Vec<DieResult>,
    pub bonus: i32,
    pub total: i32,
    pub expression: String,
}

/// Advantage state for d20 rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Advantage {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

/// A d20 roll; both dice are reported under advantage or disadvantage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    pub result: u32,
    pub rolls: Vec<u32>,
}

/// A resolved attack: to-hit roll plus damage rolled for display (hit or miss).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackRollResult {
    pub to_hit_roll: RollResult,
    /// The post-advantage d20 face, independent of bonus.
    pub natural: u32,
    pub is_crit: bool,
    pub is_fumble: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_roll: Option<RollResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_type: Option<String>,
}

/// A resolved saving throw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRollResult {
    pub roll: RollResult,
    pub natural: u32,
    #[serde(rename = "targetDC")]
    pub target_dc: i32,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<RollResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_type: Option<String>,
}

/// Largest accepted dice count in an expression.
pub const MAX_DICE_COUNT: u32 = 1000;
/// Largest accepted die size in an expression.
pub const MAX_DIE_SIDES: u32 = 1000;

/// Parse a strict "NdS" expression. Whitespace is trimmed, the "d" is
/// case-insensitive, and anything else yields `None`. Count and sides are
/// each capped at 1000, which keeps every downstream total (including the
/// doubled-dice and theoretical-maximum crit math) comfortably inside
/// `i32`.
pub fn parse_dice_expression(expression: &str) -> Option<DiceSpec> {
    let (count_str, sides_str) = expression.trim().split_once(['d', 'D'])?;
    if count_str.is_empty()
        || sides_str.is_empty()
        || !count_str.bytes().all(|b| b.is_ascii_digit())
        || !sides_str.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let count: u32 = count_str.parse().ok()?;
    let sides: u32 = sides_str.parse().ok()?;
    if count == 0 || sides == 0 || count > MAX_DICE_COUNT || sides > MAX_DIE_SIDES {
        return None;
    }

    Some(DiceSpec { count, sides })
}

/// Roll a single die, uniform in `[1, sides]`.
pub fn roll_die(sides: u32) -> u32 {
    roll_die_with_rng(&mut rand::thread_rng(), sides)
}

pub fn roll_die_with_rng<R: Rng>(rng: &mut R, sides: u32) -> u32 {
    rng.gen_range(1..=sides.max(1))
}

/// Roll `count` dice of the given size. Faces listed in `reroll_on` are
/// rerolled exactly once; the replacement stands even if it matches again.
pub fn roll_dice(count: u32, sides: u32, reroll_on: Option<&[u32]>) -> Vec<DieResult> {
    roll_dice_with_rng(&mut rand::thread_rng(), count, sides, reroll_on)
}

pub fn roll_dice_with_rng<R: Rng>(
    rng: &mut R,
    count: u32,
    sides: u32,
    reroll_on: Option<&[u32]>,
) -> Vec<DieResult> {
    let mut results = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let first = roll_die_with_rng(rng, sides);
        if reroll_on.is_some_and(|faces| faces.contains(&first)) {
            results.push(DieResult {
                sides,
                result: roll_die_with_rng(rng, sides),
                was_rerolled: true,
                original_roll: Some(first),
            });
        } else {
            results.push(DieResult {
                sides,
                result: first,
                was_rerolled: false,
                original_roll: None,
            });
        }
    }

    results
}

/// Roll an expression with a flat bonus. Never fails: an unparseable
/// expression yields no dice and `total == bonus`.
pub fn roll(expression: &str, bonus: i32, reroll_on: Option<&[u32]>) -> RollResult {
    roll_with_rng(&mut rand::thread_rng(), expression, bonus, reroll_on)
}

pub fn roll_with_rng<R: Rng>(
    rng: &mut R,
    expression: &str,
    bonus: i32,
    reroll_on: Option<&[u32]>,
) -> RollResult {
    let Some(spec) = parse_dice_expression(expression) else {
        return RollResult {
            dice: Vec::new(),
            bonus,
            total: bonus,
            expression: expression.to_string(),
        };
    };

    let dice = roll_dice_with_rng(rng, spec.count, spec.sides, reroll_on);
    let dice_total: i32 = dice.iter().map(|d| d.result as i32).sum();

    RollResult {
        dice,
        bonus,
        total: dice_total + bonus,
        expression: expression.to_string(),
    }
}

/// Roll a d20 under the given advantage state. Advantage and disadvantage
/// roll twice and report both dice.
pub fn roll_d20(advantage: Advantage) -> D20Roll {
    roll_d20_with_rng(&mut rand::thread_rng(), advantage)
}

pub fn roll_d20_with_rng<R: Rng>(rng: &mut R, advantage: Advantage) -> D20Roll {
    if advantage == Advantage::Normal {
        let result = roll_die_with_rng(rng, 20);
        return D20Roll {
            result,
            rolls: vec![result],
        };
    }

    let roll1 = roll_die_with_rng(rng, 20);
    let roll2 = roll_die_with_rng(rng, 20);
    let result = match advantage {
        Advantage::Advantage => roll1.max(roll2),
        Advantage::Disadvantage => roll1.min(roll2),
        Advantage::Normal => unreachable!(),
    };

    D20Roll {
        result,
        rolls: vec![roll1, roll2],
    }
}

/// Roll a full attack: d20 to hit plus damage.
pub fn roll_attack(
    to_hit_bonus: i32,
    damage: &DamageRoll,
    crit_behavior: CritBehavior,
    advantage: Advantage,
) -> AttackRollResult {
    roll_attack_with_rng(
        &mut rand::thread_rng(),
        to_hit_bonus,
        damage,
        crit_behavior,
        advantage,
    )
}

pub fn roll_attack_with_rng<R: Rng>(
    rng: &mut R,
    to_hit_bonus: i32,
    damage: &DamageRoll,
    crit_behavior: CritBehavior,
    advantage: Advantage,
) -> AttackRollResult {
    let d20 = roll_d20_with_rng(rng, advantage);
    resolve_attack(rng, &d20, to_hit_bonus, damage, crit_behavior)
}

/// Compose an attack from an already-rolled d20. A natural 20 is a crit,
/// a natural 1 a fumble; damage is rolled either way so a miss can still
/// be displayed.
pub fn resolve_attack<R: Rng>(
    rng: &mut R,
    d20: &D20Roll,
    to_hit_bonus: i32,
    damage: &DamageRoll,
    crit_behavior: CritBehavior,
) -> AttackRollResult {
    let natural = d20.result;
    let is_crit = natural == 20;
    let is_fumble = natural == 1;

    let to_hit_roll = RollResult {
        dice: vec![DieResult {
            sides: 20,
            result: natural,
            was_rerolled: false,
            original_roll: None,
        }],
        bonus: to_hit_bonus,
        total: natural as i32 + to_hit_bonus,
        expression: "1d20".to_string(),
    };

    let Some(spec) = parse_dice_expression(&damage.dice) else {
        return AttackRollResult {
            to_hit_roll,
            natural,
            is_crit,
            is_fumble,
            damage_roll: None,
            damage_type: None,
        };
    };

    let reroll_on = damage.reroll_on.as_deref();

    if is_crit && crit_behavior == CritBehavior::MaxPlusRoll {
        // Roll the base dice once, then add the theoretical maximum on top.
        let dice = roll_dice_with_rng(rng, spec.count, spec.sides, reroll_on);
        let dice_total: i32 = dice.iter().map(|d| d.result as i32).sum();
        let max_damage = (spec.count * spec.sides) as i32;

        return AttackRollResult {
            to_hit_roll,
            natural,
            is_crit,
            is_fumble,
            damage_roll: Some(RollResult {
                dice,
                bonus: damage.bonus + max_damage,
                total: dice_total + damage.bonus + max_damage,
                expression: format!("{}+{}(max)", damage.dice, max_damage),
            }),
            damage_type: Some(damage.damage_type.clone()),
        };
    }

    let count = if is_crit { spec.count * 2 } else { spec.count };
    let dice = roll_dice_with_rng(rng, count, spec.sides, reroll_on);
    let dice_total: i32 = dice.iter().map(|d| d.result as i32).sum();

    AttackRollResult {
        to_hit_roll,
        natural,
        is_crit,
        is_fumble,
        damage_roll: Some(RollResult {
            dice,
            bonus: damage.bonus,
            total: dice_total + damage.bonus,
            expression: if is_crit {
                format!("{count}d{}", spec.sides)
            } else {
                damage.dice.clone()
            },
        }),
        damage_type: Some(damage.damage_type.clone()),
    }
}

/// Roll a saving throw against a DC, optionally with damage on the line.
pub fn roll_save(
    save_dc: i32,
    save_bonus: i32,
    damage: Option<&DamageRoll>,
    half_on_save: bool,
    advantage: Advantage,
) -> SaveRollResult {
    roll_save_with_rng(
        &mut rand::thread_rng(),
        save_dc,
        save_bonus,
        damage,
        half_on_save,
        advantage,
    )
}

pub fn roll_save_with_rng<R: Rng>(
    rng: &mut R,
    save_dc: i32,
    save_bonus: i32,
    damage: Option<&DamageRoll>,
    half_on_save: bool,
    advantage: Advantage,
) -> SaveRollResult {
    let d20 = roll_d20_with_rng(rng, advantage);
    resolve_save(rng, &d20, save_dc, save_bonus, damage, half_on_save)
}

/// Compose a save from an already-rolled d20. Ties favor the saver. On a
/// success the damage is halved (rounded down) when `half_on_save`, or
/// dropped entirely otherwise; failure takes the full roll.
pub fn resolve_save<R: Rng>(
    rng: &mut R,
    d20: &D20Roll,
    save_dc: i32,
    save_bonus: i32,
    damage: Option<&DamageRoll>,
    half_on_save: bool,
) -> SaveRollResult {
    let natural = d20.result;
    let total = natural as i32 + save_bonus;
    let success = total >= save_dc;

    let roll_result = RollResult {
        dice: vec![DieResult {
            sides: 20,
            result: natural,
            was_rerolled: false,
            original_roll: None,
        }],
        bonus: save_bonus,
        total,
        expression: "1d20".to_string(),
    };

    let mut damage_roll = None;
    let mut damage_type = None;

    if let Some(damage) = damage {
        let full = roll_with_rng(rng, &damage.dice, damage.bonus, damage.reroll_on.as_deref());

        if success && half_on_save {
            let halved_total = full.total.div_euclid(2);
            damage_roll = Some(RollResult {
                total: halved_total,
                ..full
            });
        } else if !success {
            damage_roll = Some(full);
        }
        // Success without half_on_save: no damage at all.

        damage_type = Some(damage.damage_type.clone());
    }

    SaveRollResult {
        roll: roll_result,
        natural,
        target_dc: save_dc,
        success,
        damage: damage_roll,
        damage_type,
    }
}

impl fmt::Display for RollResult {
    /// "13 (6+4+3)": per-die breakdown with the bonus, rerolls annotated
    /// as "4(1→)".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dice.is_empty() {
            return write!(f, "{}", self.total);
        }

        let dice_str = self
            .dice
            .iter()
            .map(|d| match d.original_roll {
                Some(original) => format!("{}({original}→)", d.result),
                None => d.result.to_string(),
            })
            .collect::<Vec<_>>()
            .join("+");

        if self.bonus == 0 {
            write!(f, "{} ({dice_str})", self.total)
        } else {
            write!(
                f,
                "{} ({dice_str}{})",
                self.total,
                crate::macros::format_modifier(self.bonus)
            )
        }
    }
}

impl fmt::Display for AttackRollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "To Hit: {}", self.to_hit_roll)?;
        if self.is_crit {
            write!(f, " CRIT!")?;
        } else if self.is_fumble {
            write!(f, " Fumble!")?;
        }
        if let Some(damage) = &self.damage_roll {
            let damage_type = self.damage_type.as_deref().unwrap_or("");
            write!(f, "\nDamage: {damage} {damage_type}")?;
        }
        Ok(())
    }
}
