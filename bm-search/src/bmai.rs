use bm_core::{AttackKind, Rng};
use bm_gameplay::{Game, Move, MoveChooser, Phase};

use crate::qai::Qai;
use crate::stats::Stats;

/// Recursive rollout search with move culling. `level` is threaded as
/// an explicit parameter rather than kept in a mutable static, per the
/// design note — it starts at `1` for the top-level [`Bmai::choose`] call
/// and increases by one every time a candidate move's score is itself
/// estimated by recursing into the next ply.
#[derive(Debug, Clone)]
pub struct Bmai {
    pub max_ply: u32,
    pub max_branch: u32,
    pub max_sims: u32,
    pub min_sims: u32,
    pub sims_per_check: u32,
    pub ply_decay: f64,
    pub min_cull_threshold: f64,
    pub max_cull_threshold: f64,
    pub surrender_enabled: bool,
    rng: Rng,
    stats: Stats,
}

impl Bmai {
    pub fn new(rng: Rng) -> Self {
        Bmai {
            max_ply: 2,
            max_branch: 2_000,
            max_sims: 80,
            min_sims: 2,
            sims_per_check: 10,
            ply_decay: 0.5,
            min_cull_threshold: 0.25,
            max_cull_threshold: 0.90,
            surrender_enabled: false,
            rng,
            stats: Stats::new(),
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Swaps in a fresh RNG stream, e.g. when the protocol's `seed`/`ai`
    /// commands reseed a search that's already in play.
    pub fn set_rng(&mut self, rng: Rng) {
        self.rng = rng;
    }

    /// Applies `mv` to a clone of `game` and scores the result for
    /// `perspective`, either by playing the round out with QAI on both
    /// sides (once `level` reaches `max_ply`) or by recursing one ply
    /// deeper into the full search.
    fn simulate_move(&mut self, game: &Game, mv: &Move, level: u32, perspective: usize) -> f64 {
        let mut clone = game.clone();
        if clone.apply(mv.clone(), &mut self.rng).is_err() {
            return 0.0;
        }
        if level >= self.max_ply {
            self.rollout_with_qai(&mut clone, perspective)
        } else {
            self.evaluate(&clone, level + 1, perspective)
        }
    }

    /// Plays a cloned game to its next round boundary (or match end) using
    /// QAI for both sides — the "simulation substitution" at `level >=
    /// max_ply` — and scores 1/0.5/0 for perspective's win/tie/loss.
    fn rollout_with_qai(&mut self, game: &mut Game, perspective: usize) -> f64 {
        let wins_before = game.wins();
        let ties_before = game.ties();
        let seed_a = self.rng.range_inclusive(1, u32::MAX) as u64;
        let seed_b = self.rng.range_inclusive(1, u32::MAX) as u64;
        let mut qai_a = Qai::new(Rng::from_seed(seed_a), 0);
        let mut qai_b = Qai::new(Rng::from_seed(seed_b), 0);
        let mut choosers: [&mut dyn MoveChooser; 2] = [&mut qai_a, &mut qai_b];
        if game.play_round(&mut choosers, &mut self.rng).is_err() {
            return 0.5;
        }
        if game.wins()[perspective] > wins_before[perspective] {
            1.0
        } else if game.ties() > ties_before {
            0.5
        } else {
            0.0
        }
    }

    /// Auto-advances `game` to its next decision point and greedily plays
    /// out moves (each chosen by [`Bmai::select_best`] at the current
    /// `level`) until the round concludes, returning the realized
    /// win/tie/loss score for `perspective`. This is the "next-ply
    /// evaluator" the per-move budgeting queries: scoring a candidate one
    /// ply deeper means handing control to this function instead of a raw
    /// QAI rollout.
    ///
    /// Simultaneous swing masking: while it's the opponent's turn to set a
    /// swing at `level > 1`, `perspective`'s own not-yet-revealed (`Ready`)
    /// swing is hidden from the opponent's recursive evaluator — the clone
    /// it searches through reverts that swing to unresolved, same as real
    /// play where both sides commit face-down. The real value is restored
    /// on `probe` immediately after the opponent's move is applied, so the
    /// rest of this function (and its return value) still sees the truth.
    fn evaluate(&mut self, game: &Game, level: u32, perspective: usize) -> f64 {
        let mut probe = game.clone();
        loop {
            while probe.auto_advance(&mut self.rng) {}
            if probe.is_over() {
                return if probe.wins()[perspective] > probe.wins()[1 - perspective] { 1.0 } else { 0.0 };
            }
            let Some(actor) = probe.acting_player() else {
                return 0.5;
            };

            let masked = if level > 1 && actor != perspective && probe.phase() == Phase::Preround {
                probe.player_mut(perspective).mask_ready_swing()
            } else {
                None
            };

            let legal = probe.legal_moves();
            let legal = if probe.phase() == Phase::Preround {
                let keep = self.cap_preround_indices(&legal);
                keep.into_iter().map(|i| legal[i].clone()).collect()
            } else {
                legal
            };
            if legal.is_empty() {
                if let Some(snapshot) = masked {
                    probe.player_mut(perspective).unmask_swing(snapshot);
                }
                return 0.5;
            }
            let (idx, score_for_actor) = self.select_best(&probe, &legal, level, actor);
            let mv = legal[idx].clone();
            let applied = probe.apply(mv, &mut self.rng);
            if let Some(snapshot) = masked {
                probe.player_mut(perspective).unmask_swing(snapshot);
            }
            if applied.is_err() {
                return 0.5;
            }
            if probe.is_over() || probe.phase() == Phase::Preround {
                return if actor == perspective { score_for_actor } else { 1.0 - score_for_actor };
            }
        }
    }

    /// Budgets sims across `legal`'s candidates ("per-move
    /// budgeting"), runs rollouts in batches of `sims_per_check` with a
    /// cull pass after each batch, and returns the surviving best move's
    /// index plus its average score for `actor`.
    fn select_best(&mut self, game: &Game, legal: &[Move], level: u32, actor: usize) -> (usize, f64) {
        let m = legal.len();
        if m == 1 {
            return (0, self.simulate_move(game, &legal[0], level, actor));
        }

        let decay = self.ply_decay.powi(level as i32 - 1);
        let sims_target = ((self.max_branch as f64 * decay / m as f64)
            .clamp((self.min_sims as f64 * decay).ceil(), (self.max_sims as f64 * decay).ceil()))
        .round()
        .max(1.0) as u32;

        let mut totals = vec![0.0f64; m];
        let mut counts = vec![0u32; m];
        let mut alive = vec![true; m];
        let mut sims_run = 0u32;

        while sims_run < sims_target && alive.iter().filter(|&&a| a).count() > 1 {
            let batch = self.sims_per_check.min(sims_target - sims_run).max(1);
            for i in 0..m {
                if !alive[i] {
                    continue;
                }
                for _ in 0..batch {
                    let outcome = self.simulate_move(game, &legal[i], level, actor);
                    totals[i] += outcome;
                    counts[i] += 1;
                }
            }
            sims_run += batch;
            self.stats.sims_run += batch as u64 * alive.iter().filter(|&&a| a).count() as u64;
            self.cull(&mut alive, &totals, &counts, legal, sims_run, sims_target);
        }

        self.stats.moves_considered += m as u64;
        self.stats.moves_culled += alive.iter().filter(|&&a| !a).count() as u64;

        let best = (0..m)
            .filter(|&i| counts[i] > 0)
            .max_by(|&a, &b| average(&totals, &counts, a).partial_cmp(&average(&totals, &counts, b)).unwrap())
            .unwrap_or(0);
        (best, average(&totals, &counts, best))
    }

    /// Swing/option enumeration for the search: when the number of legal
    /// preround combinations exceeds `max_branch/min_sims`, keep every
    /// combination whose swing values sit at an extreme of their range and
    /// fill the rest of the budget with a random sample of what's left,
    /// rather than running the budgeted search over every combination.
    /// Returns the indices of `legal` to keep; a no-op (all indices) when
    /// the count is already within budget.
    fn cap_preround_indices(&mut self, legal: &[Move]) -> Vec<usize> {
        let cap = (self.max_branch / self.min_sims.max(1)) as usize;
        if legal.len() <= cap || cap == 0 {
            return (0..legal.len()).collect();
        }
        let is_extreme = |mv: &Move| match mv {
            Move::SetSwing { values, .. } => values.iter().any(|&(swing, v)| {
                let (lo, hi) = swing.range();
                v == lo || v == hi
            }),
            _ => false,
        };
        let (mut extreme, mut rest): (Vec<usize>, Vec<usize>) = (0..legal.len()).partition(|&i| is_extreme(&legal[i]));
        if extreme.len() > cap {
            self.rng.shuffle(&mut extreme);
            extreme.truncate(cap);
            return extreme;
        }
        let remaining = cap - extreme.len();
        self.rng.shuffle(&mut rest);
        rest.truncate(remaining);
        extreme.extend(rest);
        extreme
    }

    /// One cull pass ("cull pass"): never runs while only one
    /// candidate survives (the caller's loop already guards that).
    fn cull(&mut self, alive: &mut [bool], totals: &[f64], counts: &[u32], legal: &[Move], sims_run: u32, sims_target: u32) {
        let frac = sims_run as f64 / sims_target as f64;
        let best_score = (0..alive.len())
            .filter(|&i| alive[i])
            .map(|i| average(totals, counts, i))
            .fold(f64::NEG_INFINITY, f64::max);
        if !best_score.is_finite() {
            return;
        }
        let best_threshold = self.min_cull_threshold + frac * (self.max_cull_threshold - self.min_cull_threshold);
        let mut delta_points = (1.0 - frac) * self.sims_per_check as f64 * 0.5;
        if best_score > 1.0 {
            delta_points = delta_points.min(best_score);
        }
        let remaining = (sims_target.saturating_sub(sims_run)) as f64;

        for i in 0..alive.len() {
            if !alive[i] {
                continue;
            }
            let avg = average(totals, counts, i);
            let best_possible = (totals[i] + remaining) / (counts[i] as f64 + remaining).max(1.0);
            let is_trip = matches!(legal[i], Move::Attack { kind: AttackKind::Trip, .. });
            let threshold_deficit = if is_trip { delta_points / 2.0 } else { delta_points };

            let cannot_catch_up = best_possible < best_score;
            let deficient = avg < best_threshold * best_score && (best_score - avg) > threshold_deficit;
            if cannot_catch_up || deficient {
                alive[i] = false;
            }
        }
    }
}

fn average(totals: &[f64], counts: &[u32], i: usize) -> f64 {
    if counts[i] == 0 {
        0.0
    } else {
        totals[i] / counts[i] as f64
    }
}

impl MoveChooser for Bmai {
    fn choose(&mut self, game: &Game, legal: &[Move]) -> usize {
        let Some(actor) = game.acting_player() else {
            return 0;
        };

        let (idx, best_score) = if game.phase() == Phase::Preround {
            let keep = self.cap_preround_indices(legal);
            let submoves: Vec<Move> = keep.iter().map(|&i| legal[i].clone()).collect();
            let (local_idx, score) = self.select_best(game, &submoves, 1, actor);
            (keep[local_idx], score)
        } else {
            self.select_best(game, legal, 1, actor)
        };

        if best_score == 0.0 && self.surrender_enabled {
            if let Some(i) = legal.iter().position(Move::is_surrender) {
                return i;
            }
        }
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_core::{Properties, Sides, SwingType};

    fn button() -> Vec<(Properties, Sides)> {
        vec![(Properties::empty(), Sides::Fixed(6))]
    }

    #[test]
    fn picks_a_legal_move_index() {
        let mut game = Game::new(1, 1.0, false);
        game.player_mut(0).set_button(button());
        game.player_mut(1).set_button(button());
        let mut rng = Rng::from_seed(11);
        while game.auto_advance(&mut rng) {}
        let legal = game.legal_moves();
        let mut bmai = Bmai::new(Rng::from_seed(12));
        bmai.max_sims = 4;
        bmai.min_sims = 1;
        bmai.sims_per_check = 2;
        let idx = bmai.choose(&game, &legal);
        assert!(idx < legal.len());
    }

    #[test]
    fn single_legal_move_short_circuits_without_budgeting() {
        let mut game = Game::new(1, 1.0, false);
        game.player_mut(0).set_button(button());
        game.player_mut(1).set_button(button());
        let mut rng = Rng::from_seed(2);
        while game.auto_advance(&mut rng) {}
        let legal = vec![Move::Pass];
        let mut bmai = Bmai::new(Rng::from_seed(3));
        assert_eq!(bmai.choose(&game, &legal), 0);
    }

    fn swing_move(t: SwingType, v: u32) -> Move {
        Move::SetSwing { values: vec![(t, v)], options: vec![] }
    }

    #[test]
    fn cap_preround_indices_is_noop_within_budget() {
        let mut bmai = Bmai::new(Rng::from_seed(1));
        bmai.max_branch = 2_000;
        bmai.min_sims = 2;
        let legal: Vec<Move> = (4..=10).map(|v| swing_move(SwingType::X, v)).collect();
        let keep = bmai.cap_preround_indices(&legal);
        assert_eq!(keep.len(), legal.len());
        assert_eq!(keep, (0..legal.len()).collect::<Vec<_>>());
    }

    #[test]
    fn cap_preround_indices_reduces_and_prefers_extremes() {
        let mut bmai = Bmai::new(Rng::from_seed(1));
        bmai.max_branch = 4;
        bmai.min_sims = 1;
        let (lo, hi) = SwingType::X.range();
        let legal: Vec<Move> = (lo..=hi).map(|v| swing_move(SwingType::X, v)).collect();
        assert!(legal.len() > 4);
        let keep = bmai.cap_preround_indices(&legal);
        assert_eq!(keep.len(), 4);
        let lo_idx = 0;
        let hi_idx = legal.len() - 1;
        assert!(keep.contains(&lo_idx));
        assert!(keep.contains(&hi_idx));
    }
}
