use bm_core::Rng;
use bm_gameplay::{Game, Move, MoveChooser};
use bm_search::{Bmai, Qai};

/// The protocol's `ai P T` type code: `0` selects BMAI's full
/// recursive search, `1` selects the cheap QAI heuristic, `2` selects
/// BMAI3 — BMAI with triple the branching and sim budget, used as the
/// strong side of a `playfair` fairness run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiKind {
    Bmai,
    Qai,
    Bmai3,
}

impl TryFrom<u8> for AiKind {
    type Error = String;
    fn try_from(t: u8) -> Result<Self, Self::Error> {
        match t {
            0 => Ok(AiKind::Bmai),
            1 => Ok(AiKind::Qai),
            2 => Ok(AiKind::Bmai3),
            other => Err(format!("unknown ai type: {other}")),
        }
    }
}

/// A driver-facing seat: whichever evaluator the `ai` command last picked
/// for this player, implementing [`MoveChooser`] by delegating to the
/// wrapped instance so the driver's dispatch table never needs to branch
/// on concrete type.
#[derive(Debug)]
pub enum AiSlot {
    Bmai(Bmai),
    Qai(Qai),
}

impl AiSlot {
    pub fn new(kind: AiKind, rng: Rng) -> Self {
        match kind {
            AiKind::Bmai => AiSlot::Bmai(Bmai::new(rng)),
            AiKind::Qai => AiSlot::Qai(Qai::new(rng, 0)),
            AiKind::Bmai3 => {
                let mut bmai = Bmai::new(rng);
                bmai.max_branch *= 3;
                bmai.max_sims *= 3;
                AiSlot::Bmai(bmai)
            }
        }
    }

    pub fn set_surrender_enabled(&mut self, on: bool) {
        if let AiSlot::Bmai(b) = self {
            b.surrender_enabled = on;
        }
    }

    /// Applies the protocol's search knobs (`ply`/`maxbranch`/`max_sims`/
    /// `min_sims`) to this slot, a no-op for a `Qai` slot since it has no
    /// budget to tune.
    pub fn configure_search(&mut self, max_ply: u32, max_branch: u32, max_sims: u32, min_sims: u32) {
        if let AiSlot::Bmai(b) = self {
            b.max_ply = max_ply;
            b.max_branch = max_branch;
            b.max_sims = max_sims;
            b.min_sims = min_sims;
        }
    }

    pub fn reseed(&mut self, rng: Rng) {
        match self {
            AiSlot::Bmai(b) => b.set_rng(rng),
            AiSlot::Qai(q) => q.set_rng(rng),
        }
    }
}

impl MoveChooser for AiSlot {
    fn choose(&mut self, game: &Game, legal: &[Move]) -> usize {
        match self {
            AiSlot::Bmai(b) => b.choose(game, legal),
            AiSlot::Qai(q) => q.choose(game, legal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_core::{Properties, Sides};

    fn button() -> Vec<(Properties, Sides)> {
        vec![(Properties::empty(), Sides::Fixed(6))]
    }

    #[test]
    fn kind_round_trips_through_u8() {
        assert_eq!(AiKind::try_from(0), Ok(AiKind::Bmai));
        assert_eq!(AiKind::try_from(1), Ok(AiKind::Qai));
        assert_eq!(AiKind::try_from(2), Ok(AiKind::Bmai3));
        assert!(AiKind::try_from(3).is_err());
    }

    #[test]
    fn bmai3_triples_the_budget_over_bmai() {
        let base = AiSlot::new(AiKind::Bmai, Rng::from_seed(1));
        let strong = AiSlot::new(AiKind::Bmai3, Rng::from_seed(1));
        let (AiSlot::Bmai(base), AiSlot::Bmai(strong)) = (base, strong) else {
            panic!("expected both slots to hold a Bmai");
        };
        assert_eq!(strong.max_sims, base.max_sims * 3);
        assert_eq!(strong.max_branch, base.max_branch * 3);
    }

    #[test]
    fn slot_chooses_a_legal_move_index() {
        let mut game = Game::new(1, 1.0, false);
        game.player_mut(0).set_button(button());
        game.player_mut(1).set_button(button());
        let mut rng = Rng::from_seed(4);
        while game.auto_advance(&mut rng) {}
        let legal = game.legal_moves();
        let mut slot = AiSlot::new(AiKind::Qai, Rng::from_seed(5));
        let idx = slot.choose(&game, &legal);
        assert!(idx < legal.len());
    }
}
