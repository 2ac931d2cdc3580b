use bm_core::Properties;

use crate::player::Player;

/// Result of comparing two players' available dice for initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initiative {
    Winner(usize),
}

/// Dice carrying any of these properties are skipped when walking a
/// player's available dice from the tail for initiative comparison.
fn is_initiative_exempt(props: Properties) -> bool {
    props.has(Properties::TRIP) || props.has(Properties::SLOW) || props.has(Properties::STINGER)
}

/// Eligible values for initiative comparison: a player's available dice,
/// sorted descending (the order `Player::recompute_aggregates` already
/// maintains), with exempt dice removed, read from the tail upward.
fn eligible_tail(player: &Player) -> Vec<u32> {
    let mut values: Vec<u32> = player.dice()[..player.available_dice()]
        .iter()
        .filter(|d| !is_initiative_exempt(d.properties()))
        .filter_map(|d| d.value())
        .collect();
    values.reverse(); // walk from the tail (smallest) upward
    values
}

/// Determines initiative between the two players ("Initiative
/// determination"). Idempotent: calling this twice without a state change
/// between calls returns the same winner.
pub fn determine(players: &[Player; 2]) -> Initiative {
    let mut a = eligible_tail(&players[0]);
    let mut b = eligible_tail(&players[1]);

    loop {
        match (a.pop(), b.pop()) {
            (None, None) => return Initiative::Winner(0), // open question 2: tie -> player 0
            (None, Some(_)) => return Initiative::Winner(1), // a exhausted first: b has more eligible dice
            (Some(_), None) => return Initiative::Winner(0),
            (Some(va), Some(vb)) => {
                if va != vb {
                    return Initiative::Winner(if va > vb { 0 } else { 1 });
                }
                // equal values: continue upward
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_core::Sides;

    fn ready_player(dice: Vec<(Properties, Sides, u32)>) -> Player {
        let mut p = Player::new();
        p.set_button(dice.iter().map(|(props, sides, _)| (*props, sides.clone())).collect());
        for (die, (_, _, value)) in p.dice_mut().iter_mut().zip(dice.iter()) {
            die.set_value(*value, false);
        }
        p.recompute_aggregates();
        p
    }

    #[test]
    fn scenario_5_trip_die_skipped() {
        // p0: t20:1, 4:4 ; p1: 6:5 -- the trip die is ignored, p0's
        // remaining die (4) versus p1's (5) gives initiative to p1.
        let p0 = ready_player(vec![
            (Properties::TRIP, Sides::Fixed(20), 1),
            (Properties::empty(), Sides::Fixed(4), 4),
        ]);
        let p1 = ready_player(vec![(Properties::empty(), Sides::Fixed(6), 5)]);
        assert_eq!(determine(&[p0, p1]), Initiative::Winner(1));
    }

    #[test]
    fn both_sides_empty_is_tie_to_player_0() {
        let p0 = Player::new();
        let p1 = Player::new();
        assert_eq!(determine(&[p0, p1]), Initiative::Winner(0));
    }

    #[test]
    fn side_with_more_eligible_dice_wins_when_other_exhausts() {
        let p0 = ready_player(vec![(Properties::empty(), Sides::Fixed(6), 3)]);
        let p1 = ready_player(vec![(Properties::TRIP, Sides::Fixed(6), 6)]);
        assert_eq!(determine(&[p0, p1]), Initiative::Winner(0));
    }

    #[test]
    fn equal_values_continue_upward() {
        let p0 = ready_player(vec![
            (Properties::empty(), Sides::Fixed(6), 4),
            (Properties::empty(), Sides::Fixed(6), 2),
        ]);
        let p1 = ready_player(vec![
            (Properties::empty(), Sides::Fixed(6), 4),
            (Properties::empty(), Sides::Fixed(6), 5),
        ]);
        assert_eq!(determine(&[p0, p1]), Initiative::Winner(1));
    }
}
