use bm_core::{Properties, Rng, SwingType};

use crate::apply::{apply_attack, mark_ornery_not_set};
use crate::error::GameplayError;
use crate::initiative::{self, Initiative};
use crate::legal::legal_attacks;
use crate::mv::Move;
use crate::phase::Phase;
use crate::player::Player;

/// A move-choosing collaborator ("Game holds pointers to the two AIs
/// controlling each side"). `Game` never owns an AI directly — it would
/// force a dependency from this crate onto whatever implements move
/// choice (search, a heuristic, a human prompt). Instead the caller
/// supplies one per side to [`Game::play_round`]/[`Game::play_match`].
pub trait MoveChooser {
    /// Picks an index into `legal`. `game` is read-only: a chooser may
    /// inspect it (e.g. to clone-and-simulate) but never mutate it directly.
    fn choose(&mut self, game: &Game, legal: &[Move]) -> usize;
}

/// The per-round phase state machine plus match-level bookkeeping
/// (win counts, target, surrender toggle). One `Game` lives for an entire
/// match, cycling `Preround -> ... -> RoundEnd -> Preround` until a side
/// reaches `target_wins`.
#[derive(Debug, Clone)]
pub struct Game {
    players: [Player; 2],
    target_wins: u32,
    wins: [u32; 2],
    ties: u32,
    phase: Phase,
    /// The player currently expected to act: the still-swinging player in
    /// preround, the non-initiative player in chance/focus, the attacker
    /// in fight, the loser choosing a reserve die in reserve.
    phasing: usize,
    initiative_winner: Option<usize>,
    consecutive_passes: u32,
    last_move: Option<Move>,
    turbo_accuracy: f64,
    surrender_enabled: bool,
}

impl Game {
    pub fn new(target_wins: u32, turbo_accuracy: f64, surrender_enabled: bool) -> Self {
        Game {
            players: [Player::new(), Player::new()],
            target_wins,
            wins: [0, 0],
            ties: 0,
            phase: Phase::Preround,
            phasing: 0,
            initiative_winner: None,
            consecutive_passes: 0,
            last_move: None,
            turbo_accuracy,
            surrender_enabled,
        }
    }

    /// Reconstructs a `Game` already mid-match, from a parsed position
    /// players with dice already in whatever state/value the
    /// position line described, an explicit phase, and the running win/tie
    /// tally. Bypasses the normal preround-forward lifecycle entirely,
    /// since a position is read in, not played into existence.
    #[allow(clippy::too_many_arguments)]
    pub fn from_position(
        players: [Player; 2],
        target_wins: u32,
        wins: [u32; 2],
        ties: u32,
        phase: Phase,
        phasing: usize,
        turbo_accuracy: f64,
        surrender_enabled: bool,
    ) -> Self {
        Game {
            players,
            target_wins,
            wins,
            ties,
            phase,
            phasing,
            initiative_winner: None,
            consecutive_passes: 0,
            last_move: None,
            turbo_accuracy,
            surrender_enabled,
        }
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    /// Live-updates the turbo/surrender knobs (`turbo_accuracy`/`surrender`
    /// protocol commands) on a game already in progress.
    pub fn set_turbo_accuracy(&mut self, v: f64) {
        self.turbo_accuracy = v;
    }

    pub fn set_surrender_enabled(&mut self, on: bool) {
        self.surrender_enabled = on;
    }

    pub fn player_mut(&mut self, i: usize) -> &mut Player {
        &mut self.players[i]
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn wins(&self) -> [u32; 2] {
        self.wins
    }

    pub fn ties(&self) -> u32 {
        self.ties
    }

    pub fn initiative_winner(&self) -> Option<usize> {
        self.initiative_winner
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.last_move.as_ref()
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver)
    }

    /// Which player is expected to choose a move right now, or `None` if
    /// the phase resolves automatically (see [`Game::auto_advance`]).
    pub fn acting_player(&self) -> Option<usize> {
        match self.phase {
            Phase::Preround => {
                if self.players[0].needs_set_swing() {
                    Some(0)
                } else if self.players[1].needs_set_swing() {
                    Some(1)
                } else {
                    None
                }
            }
            Phase::Initiative => None,
            Phase::InitiativeChance => {
                if self.players[self.phasing].has_die_with_property(Properties::CHANCE, false) > 0 {
                    Some(self.phasing)
                } else {
                    None
                }
            }
            Phase::InitiativeFocus => {
                if self.players[self.phasing].has_die_with_property(Properties::FOCUS, false) > 0 {
                    Some(self.phasing)
                } else {
                    None
                }
            }
            Phase::Fight => Some(self.phasing),
            Phase::Reserve => Some(self.phasing),
            Phase::RoundEnd | Phase::GameOver => None,
        }
    }

    /// Resolves phase transitions that don't involve a player decision:
    /// preround -> initiative once both swings are set, initiative's
    /// roll+determine, and the chance/focus sub-phases exiting once the
    /// phasing player has no die of the relevant property. Returns `true`
    /// if it changed anything, so a driver can call it in a `while` loop.
    pub fn auto_advance(&mut self, rng: &mut Rng) -> bool {
        match self.phase {
            Phase::Preround if self.acting_player().is_none() => {
                for p in &mut self.players {
                    p.lock_swing();
                }
                self.phase = Phase::Initiative;
                true
            }
            Phase::Initiative => {
                for p in &mut self.players {
                    p.roll_dice(rng);
                }
                let winner = match initiative::determine(&self.players) {
                    Initiative::Winner(w) => w,
                };
                self.initiative_winner = Some(winner);
                self.phasing = 1 - winner;
                self.phase = Phase::InitiativeChance;
                true
            }
            Phase::InitiativeChance if self.acting_player().is_none() => {
                self.phase = Phase::InitiativeFocus;
                true
            }
            Phase::InitiativeFocus if self.acting_player().is_none() => {
                self.phase = Phase::Fight;
                self.phasing = self.initiative_winner.unwrap_or(0);
                self.consecutive_passes = 0;
                true
            }
            _ => false,
        }
    }

    /// Legal moves for [`Game::acting_player`]. Empty only when the phase
    /// has no acting player (caller should `auto_advance` first).
    pub fn legal_moves(&self) -> Vec<Move> {
        let Some(actor) = self.acting_player() else {
            return vec![];
        };
        match self.phase {
            Phase::Preround => preround_moves(&self.players[actor]),
            Phase::InitiativeChance => {
                let mut moves = chance_moves(&self.players[actor]);
                moves.push(Move::Pass);
                moves
            }
            Phase::InitiativeFocus => {
                let mut moves = focus_moves(self, actor);
                moves.push(Move::Pass);
                moves
            }
            Phase::Fight => {
                let other = 1 - actor;
                let mut moves = legal_attacks(&self.players[actor], &self.players[other], actor, other, self.turbo_accuracy);
                moves.push(Move::Pass);
                if self.surrender_enabled {
                    moves.push(Move::Surrender);
                }
                moves
            }
            Phase::Reserve => reserve_moves(&self.players[actor]),
            Phase::Initiative | Phase::RoundEnd | Phase::GameOver => vec![],
        }
    }

    /// Applies `mv`, chosen by `acting_player()` from `legal_moves()`, and
    /// advances the phase machine as far as the rules dictate (not
    /// including further auto-advance, which the driver still has to call).
    pub fn apply(&mut self, mv: Move, rng: &mut Rng) -> Result<(), GameplayError> {
        match self.phase {
            Phase::Preround => self.apply_preround(mv)?,
            Phase::InitiativeChance => self.apply_chance(mv, rng)?,
            Phase::InitiativeFocus => self.apply_focus(mv)?,
            Phase::Fight => self.apply_fight(mv, rng)?,
            Phase::Reserve => self.apply_reserve(mv)?,
            Phase::Initiative | Phase::RoundEnd | Phase::GameOver => {
                return Err(GameplayError::IllegalMove("no moves accepted in this phase".into()));
            }
        }
        Ok(())
    }

    fn apply_preround(&mut self, mv: Move) -> Result<(), GameplayError> {
        let actor = self.acting_player().ok_or_else(|| GameplayError::IllegalMove("preround already resolved".into()))?;
        match mv.clone() {
            Move::SetSwing { values, options } => {
                for (swing, value) in values {
                    self.players[actor].set_swing(swing, value, false)?;
                }
                for (die_idx, side) in options {
                    self.players[actor].set_option_die(die_idx, side)?;
                }
                Ok(())
            }
            _ => Err(GameplayError::IllegalMove("expected set-swing in preround".into())),
        }?;
        self.last_move = Some(mv);
        Ok(())
    }

    fn apply_chance(&mut self, mv: Move, rng: &mut Rng) -> Result<(), GameplayError> {
        let chancer = self.phasing;
        match mv.clone() {
            Move::UseChance { reroll } => {
                if reroll.is_empty() {
                    return Err(GameplayError::IllegalMove("chance reroll must be nonempty".into()));
                }
                for idx in &reroll {
                    if let Some(die) = self.players[chancer].die_mut(*idx) {
                        die.mark_not_set();
                        if die.has_property(Properties::MOOD) {
                            die.mood_reroll(rng);
                        } else {
                            die.roll(rng);
                        }
                    }
                }
                self.players[chancer].recompute_aggregates();
                if let Initiative::Winner(w) = initiative::determine(&self.players) {
                    if w == chancer {
                        self.initiative_winner = Some(chancer);
                        self.phasing = 1 - chancer;
                    }
                    // no flip: chance sub-phase simply continues to be offered
                    // to the (still non-initiative) phasing player next call,
                    // matching the "may iterate" wording.
                }
            }
            Move::Pass => {
                self.phase = Phase::InitiativeFocus;
            }
            _ => return Err(GameplayError::IllegalMove("expected chance move or pass".into())),
        }
        self.last_move = Some(mv);
        Ok(())
    }

    fn apply_focus(&mut self, mv: Move) -> Result<(), GameplayError> {
        let focuser = self.phasing;
        match mv.clone() {
            Move::UseFocus { values } => {
                if values.is_empty() {
                    return Err(GameplayError::IllegalMove("focus move must set at least one die".into()));
                }
                for (idx, value) in &values {
                    if let Some(die) = self.players[focuser].die_mut(*idx) {
                        die.set_value(*value, true);
                    }
                }
                self.players[focuser].recompute_aggregates();
                if let Initiative::Winner(w) = initiative::determine(&self.players) {
                    if w == focuser {
                        self.initiative_winner = Some(focuser);
                        self.phasing = 1 - focuser;
                    }
                }
            }
            Move::Pass => {
                self.phase = Phase::Fight;
                self.phasing = self.initiative_winner.unwrap_or(0);
                self.consecutive_passes = 0;
            }
            _ => return Err(GameplayError::IllegalMove("expected focus move or pass".into())),
        }
        self.last_move = Some(mv);
        Ok(())
    }

    fn apply_fight(&mut self, mv: Move, rng: &mut Rng) -> Result<(), GameplayError> {
        let actor = self.phasing;
        let other = 1 - actor;
        match mv.clone() {
            Move::Attack { .. } => {
                self.consecutive_passes = 0;
                let (left, right) = if actor == 0 {
                    let (a, b) = self.players.split_at_mut(1);
                    (&mut a[0], &mut b[0])
                } else {
                    let (a, b) = self.players.split_at_mut(1);
                    (&mut b[0], &mut a[0])
                };
                let outcome = apply_attack(left, right, &mv, rng)?;
                recover_dizzy(&mut self.players[actor]);
                if self.players[other].available_dice() == 0 {
                    self.resolve_round_end();
                } else if !outcome.extra_turn {
                    self.phasing = other;
                }
            }
            Move::Pass => {
                self.consecutive_passes += 1;
                mark_ornery_not_set(&mut self.players[actor]);
                if self.consecutive_passes >= 2 {
                    self.resolve_round_end();
                } else {
                    recover_dizzy(&mut self.players[actor]);
                    self.phasing = other;
                }
            }
            Move::Surrender => {
                self.players[actor].on_surrendered();
                self.resolve_round_end();
            }
            _ => return Err(GameplayError::IllegalMove("expected attack, pass, or surrender in fight".into())),
        }
        self.last_move = Some(mv);
        Ok(())
    }

    fn apply_reserve(&mut self, mv: Move) -> Result<(), GameplayError> {
        let actor = self.phasing;
        match mv.clone() {
            Move::UseReserve { promote: Some(idx) } => {
                self.players[actor].promote_reserve(idx)?;
            }
            Move::UseReserve { promote: None } => {}
            _ => return Err(GameplayError::IllegalMove("expected use-reserve in reserve phase".into())),
        }
        for p in &mut self.players {
            p.prepare_next_round();
        }
        self.phase = Phase::Preround;
        self.last_move = Some(mv);
        Ok(())
    }

    /// Higher score wins the round ("Round end"). A tie (per the
    /// decided open question) triggers neither `on_round_lost` nor a
    /// reserve offer; both players simply prepare for another round.
    fn resolve_round_end(&mut self) {
        self.phase = Phase::RoundEnd;
        let s0 = self.players[0].score();
        let s1 = self.players[1].score();
        if s0 == s1 {
            self.ties += 1;
            for p in &mut self.players {
                p.prepare_next_round();
            }
            self.phase = Phase::Preround;
            return;
        }
        let winner = if s0 > s1 { 0 } else { 1 };
        let loser = 1 - winner;
        log::info!("round over: player {winner} wins {s0:.1}-{s1:.1}");
        self.wins[winner] += 1;
        self.players[loser].on_round_lost();

        if self.wins[winner] >= self.target_wins {
            self.phase = Phase::GameOver;
        } else if self.players[loser].has_reserve_die() {
            self.phase = Phase::Reserve;
            self.phasing = loser;
        } else {
            for p in &mut self.players {
                p.prepare_next_round();
            }
            self.phase = Phase::Preround;
        }
    }

    /// Plays until the next round boundary (back to `Preround`) or the
    /// match ends, asking `choosers[p]` whenever player `p` must act.
    pub fn play_round(&mut self, choosers: &mut [&mut dyn MoveChooser; 2], rng: &mut Rng) -> Result<(), GameplayError> {
        let rounds_before = self.wins[0] + self.wins[1] + self.ties;
        loop {
            while self.auto_advance(rng) {}
            if self.is_over() {
                return Ok(());
            }
            if self.wins[0] + self.wins[1] + self.ties != rounds_before {
                return Ok(());
            }
            let actor = match self.acting_player() {
                Some(a) => a,
                None => return Ok(()),
            };
            let legal = self.legal_moves();
            if legal.is_empty() {
                return Err(GameplayError::IllegalMove("no legal moves for acting player".into()));
            }
            let choice = choosers[actor].choose(self, &legal);
            let mv = legal.get(choice).cloned().unwrap_or(Move::Pass);
            self.apply(mv, rng)?;
        }
    }

    /// Runs [`Game::play_round`] until the match ends.
    pub fn play_match(&mut self, choosers: &mut [&mut dyn MoveChooser; 2], rng: &mut Rng) -> Result<(), GameplayError> {
        while !self.is_over() {
            self.play_round(choosers, rng)?;
        }
        Ok(())
    }
}

fn recover_dizzy(player: &mut Player) {
    for die in player.dice_mut() {
        die.recover_from_dizzy();
    }
    player.recompute_aggregates();
}

/// One slot of preround choice: a still-open swing letter, or an
/// unresolved option die at the given roster index.
enum SwingSlot {
    Swing(SwingType),
    Option(usize),
}

/// Enumerates the full cross-product of every swing type and option die the
/// acting player still has open, so one `Move::SetSwing` resolves the whole
/// preround decision at once instead of one slot at a time — matching the
/// original's combination walk across all outstanding swing/option actions
/// together, odometer-style.
fn preround_moves(player: &Player) -> Vec<Move> {
    let mut slots = Vec::new();
    for swing in player.swing_types() {
        if player.swing_value(swing).is_none() {
            slots.push(SwingSlot::Swing(swing));
        }
    }
    for die in player.dice() {
        if die.sides().is_option() && !die.sides().is_resolved() {
            slots.push(SwingSlot::Option(die.original_index()));
        }
    }
    if slots.is_empty() {
        return vec![];
    }

    let candidate_sets: Vec<Vec<u32>> = slots
        .iter()
        .map(|slot| match slot {
            SwingSlot::Swing(t) => {
                let (lo, hi) = t.range();
                (lo..=hi).collect()
            }
            SwingSlot::Option(_) => vec![0, 1],
        })
        .collect();

    let mut combos: Vec<Vec<u32>> = vec![vec![]];
    for set in &candidate_sets {
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                set.iter().map(move |&v| {
                    let mut p = prefix.clone();
                    p.push(v);
                    p
                })
            })
            .collect();
    }

    combos
        .into_iter()
        .map(|combo| {
            let mut values = Vec::new();
            let mut options = Vec::new();
            for (slot, v) in slots.iter().zip(combo) {
                match slot {
                    SwingSlot::Swing(t) => values.push((*t, v)),
                    SwingSlot::Option(idx) => options.push((*idx, v as u8)),
                }
            }
            Move::SetSwing { values, options }
        })
        .collect()
}

fn chance_moves(player: &Player) -> Vec<Move> {
    let chance_dice: Vec<usize> = player
        .dice()
        .iter()
        .filter(|d| d.has_property(Properties::CHANCE))
        .map(|d| d.original_index())
        .collect();
    if chance_dice.is_empty() {
        return vec![];
    }
    crate::combos::enumerate_subsets(chance_dice.len())
        .into_iter()
        .map(|subset| Move::UseChance {
            reroll: subset.into_iter().map(|i| chance_dice[i]).collect(),
        })
        .collect()
}

/// Enumerates candidate focus moves: every non-empty subset of the mover's
/// focus dice, crossed with every reduced value each die in the subset
/// could take, filtered to combinations that actually flip initiative. A
/// die already down to `1` has nothing left to reduce and is dropped before
/// the subset walk, same optimization as the original's "ignore value of 1".
fn focus_moves(game: &Game, actor: usize) -> Vec<Move> {
    let mut out = Vec::new();
    let focus_dice: Vec<(usize, u32)> = game.players[actor]
        .dice()
        .iter()
        .filter(|d| d.has_property(Properties::FOCUS))
        .filter_map(|d| d.value().map(|v| (d.original_index(), v)))
        .filter(|&(_, v)| v > 1)
        .collect();
    if focus_dice.is_empty() {
        return out;
    }

    for subset in crate::combos::enumerate_subsets(focus_dice.len()) {
        let candidate_sets: Vec<Vec<u32>> = subset.iter().map(|&i| (1..focus_dice[i].1).collect()).collect();

        let mut combos: Vec<Vec<u32>> = vec![vec![]];
        for set in &candidate_sets {
            combos = combos
                .into_iter()
                .flat_map(|prefix| {
                    set.iter().map(move |&v| {
                        let mut p = prefix.clone();
                        p.push(v);
                        p
                    })
                })
                .collect();
        }

        for combo in combos {
            let values: Vec<(usize, u32)> = subset.iter().zip(combo).map(|(&i, v)| (focus_dice[i].0, v)).collect();
            let mut probe = game.clone();
            for &(idx, value) in &values {
                if let Some(die) = probe.players[actor].die_mut(idx) {
                    die.set_value(value, true);
                }
            }
            probe.players[actor].recompute_aggregates();
            if let Initiative::Winner(w) = initiative::determine(&probe.players) {
                if w == actor {
                    out.push(Move::UseFocus { values });
                }
            }
        }
    }
    out
}

fn reserve_moves(player: &Player) -> Vec<Move> {
    let mut out: Vec<Move> = player
        .dice()
        .iter()
        .filter(|d| matches!(d.state(), bm_core::DieState::Reserve))
        .map(|d| Move::UseReserve { promote: Some(d.original_index()) })
        .collect();
    out.push(Move::UseReserve { promote: None });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_core::Sides;

    struct FirstChoice;
    impl MoveChooser for FirstChoice {
        fn choose(&mut self, _game: &Game, _legal: &[Move]) -> usize {
            0
        }
    }

    fn simple_button() -> Vec<(Properties, Sides)> {
        vec![(Properties::empty(), Sides::Fixed(6)), (Properties::empty(), Sides::Fixed(6))]
    }

    #[test]
    fn match_runs_to_completion_without_panicking() {
        let mut game = Game::new(1, 1.0, false);
        game.player_mut(0).set_button(simple_button());
        game.player_mut(1).set_button(simple_button());

        let mut rng = Rng::from_seed(7);
        let mut chooser_a = FirstChoice;
        let mut chooser_b = FirstChoice;
        let mut choosers: [&mut dyn MoveChooser; 2] = [&mut chooser_a, &mut chooser_b];

        for _ in 0..500 {
            if game.is_over() {
                break;
            }
            game.play_round(&mut choosers, &mut rng).unwrap();
        }
        assert!(game.is_over());
        assert!(game.wins()[0] >= 1 || game.wins()[1] >= 1);
    }

    #[test]
    fn acting_player_is_none_during_automatic_phases() {
        let mut game = Game::new(3, 1.0, false);
        game.player_mut(0).set_button(simple_button());
        game.player_mut(1).set_button(simple_button());
        assert_eq!(game.acting_player(), None);
        let mut rng = Rng::from_seed(1);
        while game.auto_advance(&mut rng) {}
        assert_eq!(game.phase(), Phase::Fight);
    }

    #[test]
    fn preround_moves_is_full_cross_product_of_open_swings() {
        let mut p = Player::new();
        p.set_button(vec![
            (Properties::empty(), Sides::Swing(SwingType::X, None)),
            (Properties::empty(), Sides::Swing(SwingType::V, None)),
        ]);
        let moves = preround_moves(&p);
        let (x_lo, x_hi) = SwingType::X.range();
        let (v_lo, v_hi) = SwingType::V.range();
        let expected = ((x_hi - x_lo + 1) * (v_hi - v_lo + 1)) as usize;
        assert_eq!(moves.len(), expected);
        for mv in &moves {
            match mv {
                Move::SetSwing { values, options } => {
                    assert_eq!(values.len(), 2);
                    assert!(options.is_empty());
                }
                _ => panic!("expected SetSwing"),
            }
        }
    }

    #[test]
    fn pass_marks_ornery_die_not_set() {
        let mut game = Game::new(3, 1.0, false);
        game.player_mut(0).set_button(vec![
            (Properties::ORNERY, Sides::Fixed(6)),
            (Properties::empty(), Sides::Fixed(6)),
        ]);
        game.player_mut(1).set_button(simple_button());
        let mut rng = Rng::from_seed(5);
        while game.auto_advance(&mut rng) {}
        assert_eq!(game.phase(), Phase::Fight);

        let actor = game.phasing;
        let ornery_idx = game.players()[actor]
            .dice()
            .iter()
            .position(|d| d.has_property(Properties::ORNERY))
            .expect("ornery die present");
        let ornery_original_index = game.players()[actor].dice()[ornery_idx].original_index();

        game.apply(Move::Pass, &mut rng).unwrap();
        let die = game.players()[actor].die(ornery_original_index).unwrap();
        assert_eq!(die.value(), None);
    }

    #[test]
    fn focus_moves_can_combine_two_dice() {
        let mut game = Game::new(3, 1.0, false);
        game.player_mut(0).set_button(vec![
            (Properties::FOCUS, Sides::Fixed(6)),
            (Properties::FOCUS, Sides::Fixed(6)),
        ]);
        game.player_mut(1).set_button(simple_button());
        for (idx, value) in [(0u32, 6u32), (1, 6)] {
            game.player_mut(0).die_mut(idx as usize).unwrap().set_value(value, true);
        }
        game.player_mut(0).recompute_aggregates();
        game.player_mut(1).die_mut(0).unwrap().set_value(6, true);
        game.player_mut(1).die_mut(1).unwrap().set_value(6, true);
        game.player_mut(1).recompute_aggregates();

        let moves = focus_moves(&game, 0);
        let has_multi_die_move = moves.iter().any(|mv| matches!(mv, Move::UseFocus { values } if values.len() >= 2));
        assert!(has_multi_die_move, "expected at least one multi-die focus combination");
    }
}
