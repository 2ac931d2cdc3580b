use bm_core::{AttackKind, Die, Properties, Sides};

use crate::combos::enumerate_subsets;
use crate::mv::Move;
use crate::player::Player;

/// Candidate turbo side-count choices for a turbo die, spaced by
/// `1/turbo_accuracy` across its swing or option range, always including
/// both endpoints and the die's current size as the "no change" baseline.
/// `turbo_accuracy <= 0` collapses to just the two endpoints plus baseline
/// (a documented boundary behavior).
fn turbo_side_choices(die: &Die, turbo_accuracy: f64) -> Vec<u32> {
    if !die.has_property(Properties::TURBO) {
        return vec![];
    }
    let (lo, hi) = match die.sides() {
        Sides::Swing(t, _) => t.range(),
        Sides::Option(values, _) => (values[0].min(values[1]), values[0].max(values[1])),
        _ => return vec![],
    };
    let mut choices = vec![lo, hi];
    if let Some(current) = die.sides_max() {
        choices.push(current);
    }
    if turbo_accuracy > 0.0 {
        let step = (1.0 / turbo_accuracy).max(1.0);
        let mut x = lo as f64;
        while x < hi as f64 {
            choices.push(x.round() as u32);
            x += step;
        }
    }
    choices.retain(|v| (lo..=hi).contains(v));
    choices.sort_unstable();
    choices.dedup();
    choices
}

/// Expands `base` into turbo siblings for every turbo die among its
/// attackers ("for every move using a turbo die, emit siblings with
/// alternate side choices").
fn expand_turbo_siblings(base: Move, attacker: &Player, turbo_accuracy: f64) -> Vec<Move> {
    let Move::Attack { ref attackers, .. } = base else {
        return vec![base];
    };
    let turbo_die = attackers
        .iter()
        .filter_map(|&i| attacker.die(i))
        .find(|d| d.has_property(Properties::TURBO));

    match turbo_die {
        None => vec![base],
        Some(die) => {
            let choices = turbo_side_choices(die, turbo_accuracy);
            if choices.is_empty() {
                vec![base]
            } else {
                choices
                    .into_iter()
                    .map(|side| {
                        let mut mv = base.clone();
                        if let Move::Attack { ref mut turbo_side, .. } = mv {
                            *turbo_side = Some(side);
                        }
                        mv
                    })
                    .collect()
            }
        }
    }
}

/// Walks the attacker's available dice and, for each attack kind it can
/// perform, enumerates candidate target sets ("Legal-move
/// generation"). `attacker_player`/`target_player` are the indices used to
/// tag the resulting moves; `turbo_accuracy` comes from the search
/// parameters, threaded through because turbo siblings are part of
/// the legal set, not a post-hoc filter.
pub fn legal_attacks(
    attacker: &Player,
    target: &Player,
    attacker_player: usize,
    target_player: usize,
    turbo_accuracy: f64,
) -> Vec<Move> {
    let mut moves = Vec::new();
    let attacker_dice = &attacker.dice()[..attacker.available_dice()];
    let target_dice = &target.dice()[..target.available_dice()];

    for die in attacker_dice {
        for kind in die.attacks().iter() {
            if kind.is_one_to_one() {
                one_to_one(die, kind, target_dice, attacker_player, target_player, &mut moves);
            }
        }
    }

    many_to_one_skill(attacker_dice, target_dice, attacker_player, target_player, &mut moves);

    for die in attacker_dice {
        for kind in [AttackKind::Berserk, AttackKind::Speed] {
            if die.attacks().can_perform(kind) {
                one_to_many(die, kind, target_dice, attacker_player, target_player, &mut moves);
            }
        }
    }

    moves
        .into_iter()
        .flat_map(|m| expand_turbo_siblings(m, attacker, turbo_accuracy))
        .collect()
}

fn one_to_one(
    attacker_die: &Die,
    kind: AttackKind,
    target_dice: &[Die],
    attacker_player: usize,
    target_player: usize,
    out: &mut Vec<Move>,
) {
    let attacker_value = attacker_die.value().unwrap_or(0);
    let attacker_sides_max = attacker_die.sides_max().unwrap_or(0);

    let mut sorted: Vec<&Die> = target_dice.iter().collect();
    sorted.sort_by_key(|d| d.value().unwrap_or(0));

    for target_die in sorted {
        if !target_die.valid().can_be_attacked(kind) {
            continue;
        }
        let target_value = target_die.value().unwrap_or(0);
        let eligible = match kind {
            AttackKind::Power => target_value <= attacker_value,
            AttackKind::Shadow => target_value <= attacker_sides_max,
            AttackKind::Trip => dice_count(attacker_die.sides()) >= dice_count(target_die.sides()),
            _ => false,
        };
        if !eligible {
            continue;
        }
        out.push(Move::Attack {
            kind,
            attackers: vec![attacker_die.original_index()],
            targets: vec![target_die.original_index()],
            attacker_player,
            target_player,
            turbo_side: None,
        });
    }
}

fn dice_count(sides: &Sides) -> usize {
    match sides {
        Sides::Twin(_, _) => 2,
        _ => 1,
    }
}

fn many_to_one_skill(
    attacker_dice: &[Die],
    target_dice: &[Die],
    attacker_player: usize,
    target_player: usize,
    out: &mut Vec<Move>,
) {
    let eligible: Vec<&Die> = attacker_dice
        .iter()
        .filter(|d| d.attacks().can_perform(AttackKind::Skill))
        .collect();
    if eligible.len() < 2 {
        return;
    }
    for subset in enumerate_subsets(eligible.len()) {
        if subset.len() < 2 {
            continue;
        }
        let warrior_count = subset
            .iter()
            .filter(|&&i| eligible[i].has_property(Properties::WARRIOR))
            .count();
        if warrior_count > 1 {
            continue;
        }
        let sum: u32 = subset.iter().map(|&i| eligible[i].value().unwrap_or(0)).sum();
        let has_stinger = subset.iter().any(|&i| eligible[i].has_property(Properties::STINGER));
        // Stinger widens the match to a range rather than an exact total: each
        // stinger die in the subset counts for only 1 toward the minimum,
        // every other die counts for its full value, so the valid window is
        // [minimum, sum] rather than a single point.
        let minimum = subset
            .iter()
            .map(|&i| if eligible[i].has_property(Properties::STINGER) { 1 } else { eligible[i].value().unwrap_or(0) })
            .sum::<u32>();

        for target_die in target_dice {
            if !target_die.valid().can_be_attacked(AttackKind::Skill) {
                continue;
            }
            let target_value = target_die.value().unwrap_or(0);
            let matches = if has_stinger {
                (minimum..=sum).contains(&target_value)
            } else {
                sum == target_value
            };
            if matches {
                out.push(Move::Attack {
                    kind: AttackKind::Skill,
                    attackers: subset.iter().map(|&i| eligible[i].original_index()).collect(),
                    targets: vec![target_die.original_index()],
                    attacker_player,
                    target_player,
                    turbo_side: None,
                });
            }
        }
    }
}

fn one_to_many(
    attacker_die: &Die,
    kind: AttackKind,
    target_dice: &[Die],
    attacker_player: usize,
    target_player: usize,
    out: &mut Vec<Move>,
) {
    let attacker_value = attacker_die.value().unwrap_or(0);
    let eligible: Vec<&Die> = target_dice
        .iter()
        .filter(|d| d.valid().can_be_attacked(kind))
        .collect();
    if eligible.is_empty() {
        return;
    }
    for subset in enumerate_subsets(eligible.len()) {
        let sum: u32 = subset.iter().map(|&i| eligible[i].value().unwrap_or(0)).sum();
        if sum == attacker_value {
            out.push(Move::Attack {
                kind,
                attackers: vec![attacker_die.original_index()],
                targets: subset.iter().map(|&i| eligible[i].original_index()).collect(),
                attacker_player,
                target_player,
                turbo_side: None,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_core::Sides;

    fn player_with_values(values: &[(Properties, u32)]) -> Player {
        let mut p = Player::new();
        p.set_button(values.iter().map(|(props, _)| (*props, Sides::Fixed(20))).collect());
        for (die, (_, v)) in p.dice_mut().iter_mut().zip(values.iter()) {
            die.set_value(*v, false);
        }
        p.recompute_aggregates();
        p
    }

    #[test]
    fn scenario_1_simple_power_capture() {
        // p0 6:5, p1 4:3 -- expected: power, attacker 0, target 0.
        let p0 = player_with_values(&[(Properties::empty(), 5)]);
        let p1 = player_with_values(&[(Properties::empty(), 3)]);
        let moves = legal_attacks(&p0, &p1, 0, 1, 1.0);
        assert!(moves.iter().any(|m| matches!(
            m,
            Move::Attack { kind: AttackKind::Power, attackers, targets, .. }
                if attackers == &vec![0] && targets == &vec![0]
        )));
    }

    #[test]
    fn scenario_2_skill_combination() {
        // p0 4:3, 2:2, 1:1 ; p1 6:6 -- attackers {2,1,0} sum to 6.
        let p0 = player_with_values(&[
            (Properties::empty(), 3),
            (Properties::empty(), 2),
            (Properties::empty(), 1),
        ]);
        let p1 = player_with_values(&[(Properties::empty(), 6)]);
        let moves = legal_attacks(&p0, &p1, 0, 1, 1.0);
        let found = moves.iter().any(|m| match m {
            Move::Attack { kind: AttackKind::Skill, attackers, targets, .. } => {
                let mut sorted = attackers.clone();
                sorted.sort_unstable();
                sorted == vec![0, 1, 2] && targets == &vec![0]
            }
            _ => false,
        });
        assert!(found);
    }

    #[test]
    fn power_does_not_fire_when_target_exceeds_attacker_value() {
        let p0 = player_with_values(&[(Properties::empty(), 3)]);
        let p1 = player_with_values(&[(Properties::empty(), 5)]);
        let moves = legal_attacks(&p0, &p1, 0, 1, 1.0);
        assert!(!moves.iter().any(|m| m.attack_kind() == Some(AttackKind::Power)));
    }

    #[test]
    fn stinger_subset_matches_an_asymmetric_range_not_just_the_sum() {
        // stinger die worth 5 counts as only 1 toward the minimum, plain die
        // worth 2 counts in full: valid window is [1+2, 5+2] = [3, 7].
        let mut p0 = Player::new();
        p0.set_button(vec![
            (Properties::STINGER, Sides::Fixed(20)),
            (Properties::empty(), Sides::Fixed(20)),
        ]);
        p0.die_mut(0).unwrap().set_value(5, false);
        p0.die_mut(1).unwrap().set_value(2, false);
        p0.recompute_aggregates();

        let p1 = player_with_values(&[(Properties::empty(), 3)]);
        let moves = legal_attacks(&p0, &p1, 0, 1, 1.0);
        let found = moves.iter().any(|m| match m {
            Move::Attack { kind: AttackKind::Skill, attackers, targets, .. } => {
                let mut sorted = attackers.clone();
                sorted.sort_unstable();
                sorted == vec![0, 1] && targets == &vec![0]
            }
            _ => false,
        });
        assert!(found, "target value 3 is below the old sum-of-7 match but within [3, 7]");
    }

    #[test]
    fn turbo_accuracy_non_positive_yields_only_endpoints_and_baseline() {
        let mut p0 = Player::new();
        p0.set_button(vec![(
            Properties::TURBO,
            Sides::Swing(bm_core::SwingType::X, Some(10)),
        )]);
        let die = &p0.dice()[0];
        let choices = turbo_side_choices(die, 0.0);
        assert_eq!(choices, vec![4, 10, 20]);
    }
}
