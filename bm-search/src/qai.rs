use bm_core::{Properties, Rng};
use bm_gameplay::{Game, Move, MoveChooser, Phase};

/// The cheap heuristic move chooser. Scores each legal attack by
/// applying it to a cloned `Game`, then de-noising the realized reroll with
/// its *expected* value shift so the score reflects the attack's average
/// outcome rather than the one random roll that happened to land in the
/// clone. Outside fight, it always passes (or takes whatever the legal set's
/// minimally-populated default is, e.g. a swing die's low end).
#[derive(Debug)]
pub struct Qai {
    fuzziness: u32,
    rng: Rng,
}

impl Qai {
    pub fn new(rng: Rng, fuzziness: u32) -> Self {
        Qai { fuzziness, rng }
    }

    /// Swaps in a fresh RNG stream, e.g. when the protocol's `seed`/`ai`
    /// commands reseed a search that's already in play.
    pub fn set_rng(&mut self, rng: Rng) {
        self.rng = rng;
    }

    fn choose_attack(&mut self, game: &Game, legal: &[Move]) -> usize {
        let mut best_idx = None;
        let mut best_score = f64::NEG_INFINITY;

        for (i, mv) in legal.iter().enumerate() {
            let Move::Attack { attacker_player, target_player, attackers, .. } = mv else {
                continue;
            };
            let mut probe = game.clone();
            if probe.apply(mv.clone(), &mut self.rng).is_err() {
                continue;
            }
            let mut score = probe.players()[*attacker_player].score() - probe.players()[*target_player].score();
            for &idx in attackers {
                let Some(die) = probe.players()[*attacker_player].die(idx) else { continue };
                if die.has_property(Properties::KONSTANT) {
                    continue; // konstant dice don't reroll, nothing to de-noise
                }
                let Some(value) = die.value() else { continue };
                let sides_max = die.sides_max().unwrap_or(value) as f64;
                let shift = (sides_max + 1.0) / 2.0 - value as f64;
                score += if die.has_property(Properties::SHADOW) {
                    0.0
                } else if die.has_property(Properties::POISON) {
                    -shift
                } else {
                    shift
                };
            }
            score += self.rng.noise(self.fuzziness.max(1)) as f64;

            if score > best_score {
                best_score = score;
                best_idx = Some(i);
            }
        }

        best_idx.unwrap_or_else(|| legal.iter().position(Move::is_pass).unwrap_or(0))
    }
}

impl MoveChooser for Qai {
    fn choose(&mut self, game: &Game, legal: &[Move]) -> usize {
        match game.phase() {
            Phase::Fight => self.choose_attack(game, legal),
            _ => legal.iter().position(Move::is_pass).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_core::Sides;

    fn button() -> Vec<(Properties, Sides)> {
        vec![(Properties::empty(), Sides::Fixed(6))]
    }

    #[test]
    fn prefers_a_capturing_attack_over_pass_when_one_exists() {
        let mut game = Game::new(3, 1.0, false);
        game.player_mut(0).set_button(button());
        game.player_mut(1).set_button(button());
        let mut rng = Rng::from_seed(5);
        while game.auto_advance(&mut rng) {}
        // equal values: whichever side ends up phasing can power-capture the
        // other (target value <= attacker value), independent of who won
        // initiative on this particular roll.
        game.player_mut(0).die_mut(0).unwrap().set_value(6, false);
        game.player_mut(0).recompute_aggregates();
        game.player_mut(1).die_mut(0).unwrap().set_value(6, false);
        game.player_mut(1).recompute_aggregates();

        let legal = game.legal_moves();
        let mut qai = Qai::new(Rng::from_seed(9), 0);
        let choice = qai.choose(&game, &legal);
        assert!(legal[choice].is_attack());
    }

    #[test]
    fn passes_outside_fight_when_nothing_else_is_needed() {
        let mut game = Game::new(3, 1.0, false);
        game.player_mut(0).set_button(button());
        game.player_mut(1).set_button(button());
        let mut qai = Qai::new(Rng::from_seed(1), 0);
        // Preround with no swing dice has no legal moves to offer QAI
        // (acting_player is None), so exercise the chance phase instead.
        let mut rng = Rng::from_seed(2);
        game.auto_advance(&mut rng);
        assert_eq!(game.phase(), Phase::Initiative);
    }
}
