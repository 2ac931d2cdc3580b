use std::collections::BTreeMap;

use bm_core::{Die, DieState, Properties, Rng, Sides, SwingType};

use crate::error::GameplayError;

/// Tri-state swing-commitment tracker: a player's swing/option dice are
/// either still open (`Not`), privately chosen but not yet revealed
/// (`Ready`), or revealed and immutable for the rest of the round
/// (`Locked`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingSet {
    Not,
    Ready,
    Locked,
}

/// Sentinel score assigned on surrender; strictly less than any reachable
/// non-surrendered score.
pub const SURRENDER_SCORE: f64 = -1000.0;

/// One side of the match: an ordered roster of up to 10 dice plus the
/// aggregates the rules engine and search read on every move.
#[derive(Debug, Clone)]
pub struct Player {
    dice: Vec<Die>,
    score: f64,
    swing_values: BTreeMap<SwingType, Option<u32>>,
    swing_set: SwingSet,
    available_dice: usize,
    max_value: u32,
    min_value: u32,
    surrendered: bool,
}

impl Player {
    pub fn new() -> Self {
        Player {
            dice: Vec::new(),
            score: 0.0,
            swing_values: BTreeMap::new(),
            swing_set: SwingSet::Not,
            available_dice: 0,
            max_value: 0,
            min_value: 0,
            surrendered: false,
        }
    }

    /// Populates dice from a button-man template (a list of `(properties,
    /// sides)` pairs, one per die, in original-index order), then
    /// recomputes swing counts and score.
    pub fn set_button(&mut self, template: Vec<(Properties, Sides)>) {
        self.dice = template
            .into_iter()
            .enumerate()
            .map(|(i, (props, sides))| Die::new(props, sides, i))
            .collect();
        self.swing_values.clear();
        for die in &self.dice {
            for swing in die.sides().swing_types() {
                self.swing_values.entry(swing).or_insert(None);
            }
        }
        self.swing_set = SwingSet::Not;
        self.surrendered = false;
        self.recompute_aggregates();
    }

    /// Reconstructs a player from a parsed position: the listed dice
    /// are exactly the ones on the board, since the position format has no
    /// serialized capture pile, so `score` is taken verbatim from the
    /// position line rather than recomputed — recomputing would silently
    /// drop whatever score any already-captured, unlisted dice contributed.
    /// `swing_locked` should be `false` only when the position was loaded
    /// mid-preround with swing dice still open for a `swing` command.
    pub fn from_position(dice: Vec<Die>, score: f64, swing_locked: bool) -> Self {
        let mut player = Player {
            dice,
            score,
            swing_values: BTreeMap::new(),
            swing_set: if swing_locked { SwingSet::Locked } else { SwingSet::Not },
            available_dice: 0,
            max_value: 0,
            min_value: 0,
            surrendered: false,
        };
        for die in &player.dice {
            for swing in die.sides().swing_types() {
                let chosen = match die.sides() {
                    Sides::Swing(t, v) if *t == swing => *v,
                    _ => None,
                };
                player.swing_values.entry(swing).or_insert(chosen);
            }
        }
        player.recompute_aggregates();
        player.score = score;
        player
    }

    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    pub fn dice_mut(&mut self) -> &mut [Die] {
        &mut self.dice
    }

    pub fn die(&self, original_index: usize) -> Option<&Die> {
        self.dice.iter().find(|d| d.original_index() == original_index)
    }

    pub fn die_mut(&mut self, original_index: usize) -> Option<&mut Die> {
        self.dice.iter_mut().find(|d| d.original_index() == original_index)
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn swing_set(&self) -> SwingSet {
        self.swing_set
    }

    pub fn swing_value(&self, t: SwingType) -> Option<u32> {
        self.swing_values.get(&t).copied().flatten()
    }

    pub fn swing_types(&self) -> Vec<SwingType> {
        self.swing_values.keys().copied().collect()
    }

    pub fn available_dice(&self) -> usize {
        self.available_dice
    }

    pub fn max_value(&self) -> u32 {
        self.max_value
    }

    pub fn min_value(&self) -> u32 {
        self.min_value
    }

    pub fn is_surrendered(&self) -> bool {
        self.surrendered
    }

    /// Rolls every used die, then recomputes score. "Used" excludes `Reserve`
    /// dice, which stay out of play until promoted.
    pub fn roll_dice(&mut self, rng: &mut Rng) {
        for die in &mut self.dice {
            if !matches!(die.state(), DieState::Reserve | DieState::NotUsed) {
                die.roll(rng);
            }
        }
        self.recompute_aggregates();
    }

    /// Updates every die of the given swing type. Forbidden once locked,
    /// unless the call originates from a turbo mutation (`from_turbo`),
    /// which is allowed to rewrite a swing value mid-fight.
    pub fn set_swing(
        &mut self,
        swing: SwingType,
        value: u32,
        from_turbo: bool,
    ) -> Result<(), GameplayError> {
        if !self.swing_values.contains_key(&swing) {
            return Err(GameplayError::UnknownSwingType(swing));
        }
        if self.swing_set == SwingSet::Locked && !from_turbo {
            return Err(GameplayError::SwingAlreadyLocked(swing));
        }
        debug_assert!(swing.contains(value), "swing value out of range");
        self.swing_values.insert(swing, Some(value));
        for die in &mut self.dice {
            die.sides_mut().set_swing_value(swing, value);
        }
        if !from_turbo {
            self.swing_set = SwingSet::Ready;
        }
        self.recompute_aggregates();
        Ok(())
    }

    /// Chooses side `0` or `1` for an option die at roster index `i`.
    pub fn set_option_die(&mut self, i: usize, side: u8) -> Result<(), GameplayError> {
        let die = self
            .dice
            .iter_mut()
            .find(|d| d.original_index() == i)
            .ok_or(GameplayError::DieIndexOutOfRange(i))?;
        die.sides_mut().choose_option(side);
        self.recompute_aggregates();
        Ok(())
    }

    /// Compacts the roster after losing a die: available dice stay packed
    /// at the front, the lost die is appended at the back.
    pub fn on_die_lost(&mut self, original_index: usize) {
        if let Some(pos) = self.dice.iter().position(|d| d.original_index() == original_index) {
            let mut die = self.dice.remove(pos);
            die.set_state(DieState::Captured);
            self.dice.push(die);
        }
        self.recompute_aggregates();
    }

    /// Adds a captured die's score contribution (attacker side of a
    /// successful attack).
    pub fn on_die_captured(&mut self, die: &Die) {
        self.score += die.score(false);
    }

    /// Resets swing choices and the tri-state tracker after losing a round.
    /// Per the decided open question, a *tied* round does not trigger this.
    pub fn on_round_lost(&mut self) {
        for value in self.swing_values.values_mut() {
            *value = None;
        }
        self.swing_set = SwingSet::Not;
    }

    /// Locks swing/option choices for the rest of the round (preround's
    /// exit edge, both players, once neither still `needs_set_swing`).
    pub fn lock_swing(&mut self) {
        self.swing_set = SwingSet::Locked;
    }

    /// Hides a privately-chosen but not-yet-revealed swing from a recursive
    /// opponent evaluator: reverts `Ready` swing/option dice to unresolved
    /// and downgrades the tracker to `Not`, returning a snapshot to pass to
    /// [`Player::unmask_swing`] once the opponent's search has moved past
    /// this player's turn. A no-op (`None`) once the swing is `Locked` (it's
    /// been revealed to both sides by then) or still `Not` (nothing to hide).
    pub fn mask_ready_swing(&mut self) -> Option<Player> {
        if self.swing_set != SwingSet::Ready {
            return None;
        }
        let snapshot = self.clone();
        for value in self.swing_values.values_mut() {
            *value = None;
        }
        for die in &mut self.dice {
            for swing in die.sides().swing_types() {
                die.sides_mut().unset_swing_value(swing);
            }
            if die.sides().is_option() {
                die.sides_mut().unchoose_option();
            }
        }
        self.swing_set = SwingSet::Not;
        self.recompute_aggregates();
        Some(snapshot)
    }

    /// Restores the state [`Player::mask_ready_swing`] hid.
    pub fn unmask_swing(&mut self, snapshot: Player) {
        *self = snapshot;
    }

    pub fn on_surrendered(&mut self) {
        self.score = SURRENDER_SCORE;
        self.surrendered = true;
    }

    /// Un-sets every die still in active play (not captured, not reserve)
    /// ahead of a new round's roll. Captured dice stay captured for the
    /// rest of the match; reserve dice stay held until promoted.
    pub fn prepare_next_round(&mut self) {
        for die in &mut self.dice {
            if !matches!(die.state(), DieState::Captured | DieState::Reserve | DieState::NotUsed) {
                die.mark_not_set();
            }
        }
        self.recompute_aggregates();
    }

    /// Promotes a held-out reserve die into play (round-end "reserve"
    /// sub-phase). Returns an error if `i` isn't a reserve die.
    pub fn promote_reserve(&mut self, original_index: usize) -> Result<(), GameplayError> {
        let die = self
            .dice
            .iter_mut()
            .find(|d| d.original_index() == original_index)
            .ok_or(GameplayError::DieIndexOutOfRange(original_index))?;
        if !matches!(die.state(), DieState::Reserve) {
            return Err(GameplayError::IllegalMove("die is not in reserve".into()));
        }
        die.mark_not_set();
        self.recompute_aggregates();
        Ok(())
    }

    /// `true` iff this player has any die still sitting in reserve.
    pub fn has_reserve_die(&self) -> bool {
        self.dice.iter().any(|d| matches!(d.state(), DieState::Reserve))
    }

    /// Returns `1 + index` of the first die matching `p` (or, if `all`, the
    /// first die for which *every* bit of `p` is set, same predicate either
    /// way since `Properties::has` already requires every bit) — `0` if
    /// none match. `all` selects whether to search only available dice or
    /// every die in the roster.
    pub fn has_die_with_property(&self, p: Properties, all: bool) -> usize {
        let dice = if all {
            &self.dice[..]
        } else {
            &self.dice[..self.available_dice]
        };
        for die in dice {
            if die.has_property(p) {
                return die.original_index() + 1;
            }
        }
        0
    }

    /// True iff any own swing or option die has not yet been set.
    pub fn needs_set_swing(&self) -> bool {
        if self.swing_values.values().any(|v| v.is_none()) {
            return true;
        }
        self.dice.iter().any(|d| d.sides().is_option() && !d.sides().is_resolved())
    }

    /// Recomputes the available-dice partition (ready/dizzy dice sorted by
    /// descending value, packed to the front) and the cached aggregates
    /// that depend on it. Must be called after any mutation that could
    /// change a die's state or value.
    pub fn recompute_aggregates(&mut self) {
        self.dice.sort_by(|a, b| {
            let a_avail = a.is_available();
            let b_avail = b.is_available();
            b_avail.cmp(&a_avail).then_with(|| b.value().unwrap_or(0).cmp(&a.value().unwrap_or(0)))
        });
        self.available_dice = self.dice.iter().filter(|d| d.is_available()).count();
        let avail = &self.dice[..self.available_dice];
        self.max_value = avail.iter().filter_map(|d| d.value()).max().unwrap_or(0);
        self.min_value = avail.iter().filter_map(|d| d.value()).min().unwrap_or(0);

        self.score = avail.iter().map(|d| d.score(true)).sum::<f64>()
            + self.dice[self.available_dice..]
                .iter()
                .filter(|d| matches!(d.state(), DieState::Captured))
                .map(|d| d.score(false))
                .sum::<f64>();
        if self.surrendered {
            self.score = SURRENDER_SCORE;
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_core::Properties;

    fn simple_player() -> Player {
        let mut p = Player::new();
        p.set_button(vec![
            (Properties::empty(), Sides::Fixed(6)),
            (Properties::empty(), Sides::Fixed(4)),
        ]);
        p
    }

    #[test]
    fn available_dice_sorted_descending_after_roll() {
        let mut p = simple_player();
        let mut rng = Rng::from_seed(3);
        p.roll_dice(&mut rng);
        let values: Vec<u32> = p.dice().iter().map(|d| d.value().unwrap()).collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn needs_set_swing_false_with_no_swing_dice() {
        let p = simple_player();
        assert!(!p.needs_set_swing());
    }

    #[test]
    fn needs_set_swing_true_until_swing_chosen() {
        let mut p = Player::new();
        p.set_button(vec![(Properties::empty(), Sides::Swing(SwingType::X, None))]);
        assert!(p.needs_set_swing());
        p.set_swing(SwingType::X, 12, false).unwrap();
        assert!(!p.needs_set_swing());
    }

    #[test]
    fn set_swing_rejected_once_locked() {
        let mut p = Player::new();
        p.set_button(vec![(Properties::empty(), Sides::Swing(SwingType::X, None))]);
        p.set_swing(SwingType::X, 12, false).unwrap();
        // Simulate the round's preround->initiative transition locking it.
        p.swing_set = SwingSet::Locked;
        assert!(p.set_swing(SwingType::X, 10, false).is_err());
        // But a turbo mutation mid-fight is still allowed.
        assert!(p.set_swing(SwingType::X, 10, true).is_ok());
    }

    #[test]
    fn on_surrendered_sets_sentinel_score() {
        let mut p = simple_player();
        p.on_surrendered();
        assert_eq!(p.score(), SURRENDER_SCORE);
    }

    #[test]
    fn mask_ready_swing_hides_then_restores_value() {
        let mut p = Player::new();
        p.set_button(vec![(Properties::empty(), Sides::Swing(SwingType::X, None))]);
        p.set_swing(SwingType::X, 12, false).unwrap();
        assert_eq!(p.swing_value(SwingType::X), Some(12));

        let snapshot = p.mask_ready_swing().expect("ready swing should mask");
        assert_eq!(p.swing_value(SwingType::X), None);
        assert!(p.needs_set_swing());

        p.unmask_swing(snapshot);
        assert_eq!(p.swing_value(SwingType::X), Some(12));
        assert!(!p.needs_set_swing());
    }

    #[test]
    fn mask_ready_swing_is_noop_before_set_or_after_lock() {
        let mut p = Player::new();
        p.set_button(vec![(Properties::empty(), Sides::Swing(SwingType::X, None))]);
        assert!(p.mask_ready_swing().is_none());

        p.set_swing(SwingType::X, 12, false).unwrap();
        p.lock_swing();
        assert!(p.mask_ready_swing().is_none());
    }

    #[test]
    fn has_die_with_property_returns_one_plus_index() {
        let mut p = Player::new();
        p.set_button(vec![
            (Properties::empty(), Sides::Fixed(6)),
            (Properties::POISON, Sides::Fixed(4)),
        ]);
        assert_eq!(p.has_die_with_property(Properties::POISON, true), 2);
        assert_eq!(p.has_die_with_property(Properties::NULL, true), 0);
    }
}
