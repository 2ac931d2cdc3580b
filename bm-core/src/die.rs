use crate::attacks::{AttackKind, AttackMask};
use crate::properties::Properties;
use crate::rng::Rng;
use crate::sides::Sides;
use crate::swing::{step_down, step_up};

/// A die's lifecycle state.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum DieState {
    Ready,
    NotSet,
    Captured,
    Dizzy,
    Nullified,
    NotUsed,
    Reserve,
}

/// A single die: properties, side specification, lifecycle state, current
/// value, and the attack/vulnerability sets derived from all three.
///
/// `original_index` is the die's stable position in its owner's roster as
/// parsed from the position format; it never changes even as the roster is
/// re-sorted by current value, so protocol output can always refer back to
/// "the fourth die" unambiguously across the move and protocol layers.
#[derive(Debug, Clone)]
pub struct Die {
    properties: Properties,
    sides: Sides,
    state: DieState,
    value: Option<u32>,
    attacks: AttackMask,
    valid: AttackMask,
    original_index: usize,
}

impl Die {
    pub fn new(properties: Properties, sides: Sides, original_index: usize) -> Self {
        debug_assert!(properties.is_valid(), "invalid property combination");
        let mut die = Die {
            properties,
            sides,
            state: DieState::NotSet,
            value: None,
            attacks: AttackMask::empty(),
            valid: AttackMask::empty(),
            original_index,
        };
        die.recompute_attacks();
        die
    }

    pub fn properties(&self) -> Properties {
        self.properties
    }

    pub fn sides(&self) -> &Sides {
        &self.sides
    }

    pub fn sides_mut(&mut self) -> &mut Sides {
        &mut self.sides
    }

    pub fn state(&self) -> DieState {
        self.state
    }

    pub fn value(&self) -> Option<u32> {
        self.value
    }

    pub fn attacks(&self) -> AttackMask {
        self.attacks
    }

    pub fn valid(&self) -> AttackMask {
        self.valid
    }

    pub fn original_index(&self) -> usize {
        self.original_index
    }

    pub fn has_property(&self, p: Properties) -> bool {
        self.properties.has(p)
    }

    pub fn sides_max(&self) -> Option<u32> {
        self.sides.sides_max()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, DieState::Ready)
    }

    pub fn is_dizzy(&self) -> bool {
        matches!(self.state, DieState::Dizzy)
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, DieState::Ready | DieState::Dizzy)
    }

    pub fn set_state(&mut self, state: DieState) {
        self.state = state;
        self.recompute_attacks();
    }

    /// Sets a concrete ready value directly, bypassing the RNG. Used by the
    /// protocol parser to reconstruct a die already showing a value (the
    /// `:N` suffix of the die syntax) without re-rolling it.
    pub fn set_value(&mut self, value: u32, dizzy: bool) {
        self.value = Some(value);
        self.state = if dizzy { DieState::Dizzy } else { DieState::Ready };
        self.recompute_attacks();
    }

    pub fn mark_not_set(&mut self) {
        self.state = DieState::NotSet;
        self.value = None;
        self.recompute_attacks();
    }

    /// Recovery at the end of a player's turn during fight: own dizzy dice
    /// return to `ready`.
    pub fn recover_from_dizzy(&mut self) {
        if self.is_dizzy() {
            self.state = DieState::Ready;
            self.recompute_attacks();
        }
    }

    /// Recomputes `attacks`/`valid` from `(properties, state)`, applying the
    /// rules in order — later rules override earlier ones. This is
    /// the single place either set is ever written; every other mutation
    /// that can affect them (roll, state transition, property change) must
    /// call back through here, never set the masks directly.
    pub fn recompute_attacks(&mut self) {
        let mut attacks = AttackMask::empty().with(AttackKind::Power).with(AttackKind::Skill);
        let mut valid = AttackMask::all();

        if self.properties.has(Properties::UNSKILLED) {
            attacks = attacks.without(AttackKind::Skill);
        }
        if self.properties.has(Properties::SPEED) {
            attacks = attacks.with(AttackKind::Speed);
        }
        if self.properties.has(Properties::TRIP) {
            attacks = attacks.with(AttackKind::Trip);
        }
        if self.properties.has(Properties::SHADOW) {
            attacks = attacks.with(AttackKind::Shadow).without(AttackKind::Power);
        }
        if self.properties.has(Properties::KONSTANT) {
            attacks = attacks.without(AttackKind::Power);
        }
        if self.properties.has(Properties::INSULT) {
            valid = valid.without(AttackKind::Skill);
        }
        if self.properties.has(Properties::BERSERK) {
            attacks = attacks.with(AttackKind::Berserk).without(AttackKind::Skill);
        }
        if self.properties.has(Properties::STEALTH) {
            attacks = attacks.without(AttackKind::Power);
            valid = AttackMask::empty().with(AttackKind::Skill);
        }
        if self.properties.has(Properties::WARRIOR) {
            valid = AttackMask::empty();
            attacks = AttackMask::empty().with(AttackKind::Skill);
        }
        if self.properties.has(Properties::QUEER) {
            if let Some(v) = self.value {
                if v % 2 == 1 {
                    attacks = attacks.with(AttackKind::Shadow).without(AttackKind::Power);
                }
            }
        }
        if matches!(self.state, DieState::Dizzy) {
            attacks = AttackMask::empty();
        }

        self.attacks = attacks;
        self.valid = valid;
    }

    /// Rolls the die: sum of one uniform draw in `[1, sides]` per sub-die,
    /// unless `warrior` or `maximum` (those always roll maximum). Transitions
    /// to `ready` and recomputes attacks.
    pub fn roll(&mut self, rng: &mut Rng) {
        let forced_max = self.properties.has(Properties::WARRIOR) || self.properties.has(Properties::MAXIMUM);
        self.value = Some(self.roll_sides(&self.sides.clone(), rng, forced_max));
        self.state = DieState::Ready;
        self.recompute_attacks();
    }

    fn roll_sides(&self, sides: &Sides, rng: &mut Rng, forced_max: bool) -> u32 {
        match sides {
            Sides::Fixed(n) => {
                if forced_max {
                    *n
                } else {
                    rng.roll(*n)
                }
            }
            Sides::Swing(_, chosen) => {
                let n = chosen.unwrap_or(1);
                if forced_max {
                    n
                } else {
                    rng.roll(n)
                }
            }
            Sides::Twin(a, b) => self.roll_sides(a, rng, forced_max) + self.roll_sides(b, rng, forced_max),
            Sides::Option(values, chosen) => {
                let n = chosen.map(|c| values[c as usize]).unwrap_or(1);
                if forced_max {
                    n
                } else {
                    rng.roll(n)
                }
            }
        }
    }

    /// Mood re-roll: re-pick sides uniformly from the swing type's table,
    /// then roll. Only meaningful for dice carrying a swing sub-spec; no-op
    /// otherwise.
    pub fn mood_reroll(&mut self, rng: &mut Rng) {
        debug_assert!(self.properties.has(crate::properties::Properties::MOOD));
        self.reroll_mood_sides(rng);
        self.roll(rng);
    }

    fn reroll_mood_sides(&mut self, rng: &mut Rng) {
        fn visit(sides: &mut Sides, rng: &mut Rng) {
            match sides {
                Sides::Swing(t, chosen) => {
                    let table = t.mood_table();
                    if let Some(pick) = rng.choose(&table) {
                        *chosen = Some(*pick);
                    }
                }
                Sides::Twin(a, b) => {
                    visit(a, rng);
                    visit(b, rng);
                }
                _ => {}
            }
        }
        visit(&mut self.sides, rng);
    }

    /// `score(own)`.
    pub fn score(&self, own: bool) -> f64 {
        if self.properties.has(Properties::NULL) || self.properties.has(Properties::WARRIOR) {
            return 0.0;
        }
        let value = self.value.unwrap_or(0) as f64;
        let sides_max = self.sides_max().unwrap_or(0) as f64;
        let has_value = self.properties.has(Properties::VALUE);
        let has_poison = self.properties.has(Properties::POISON);

        match (has_value, has_poison) {
            (true, true) => {
                if own {
                    -value
                } else {
                    -value / 2.0
                }
            }
            (false, true) => {
                if own {
                    -sides_max
                } else {
                    -sides_max / 2.0
                }
            }
            (true, false) => {
                if own {
                    value / 2.0
                } else {
                    value
                }
            }
            (false, false) => {
                if own {
                    sides_max / 2.0
                } else {
                    sides_max
                }
            }
        }
    }

    /// `berserk` halving: sides halved, rounded up, then the property is
    /// cleared (one-shot mutation).
    pub fn apply_berserk_halving(&mut self) {
        if self.properties.has(Properties::BERSERK) {
            self.sides.halve_round_up();
            self.properties.remove(Properties::BERSERK);
        }
    }

    /// Pre-roll mutations: `mighty` raises sides to the next step, `weak`
    /// lowers by the symmetric table.
    pub fn apply_pre_roll_mutations(&mut self) {
        if self.properties.has(Properties::MIGHTY) {
            self.sides.map_resolved(step_up);
        }
        if self.properties.has(Properties::WEAK) {
            self.sides.map_resolved(step_down);
        }
    }

    /// `morphing` on a capturing attack: copy sides from the target die (or
    /// all sub-sides if target is twin).
    pub fn apply_morphing(&mut self, target: &Die) {
        if self.properties.has(Properties::MORPHING) {
            self.sides.morph_from(&target.sides);
        }
    }

    /// `warrior` property clears after the die's first attack.
    pub fn clear_warrior_after_attack(&mut self) {
        self.properties.remove(Properties::WARRIOR);
    }

    pub fn is_konstant(&self) -> bool {
        self.properties.has(Properties::KONSTANT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::Properties;

    fn fixed_die(sides: u32, props: Properties, idx: usize) -> Die {
        Die::new(props, Sides::Fixed(sides), idx)
    }

    #[test]
    fn default_attacks_are_power_and_skill() {
        let die = fixed_die(6, Properties::empty(), 0);
        assert!(die.attacks().can_perform(AttackKind::Power));
        assert!(die.attacks().can_perform(AttackKind::Skill));
        assert!(die.valid().can_be_attacked(AttackKind::Power));
        assert!(die.valid().can_be_attacked(AttackKind::Skill));
    }

    #[test]
    fn insult_blocks_skill_vulnerability_only() {
        let die = fixed_die(6, Properties::INSULT, 0);
        assert!(!die.valid().can_be_attacked(AttackKind::Skill));
        assert!(die.valid().can_be_attacked(AttackKind::Power));
    }

    #[test]
    fn stealth_restricts_attacks_and_vulnerability() {
        let die = fixed_die(6, Properties::STEALTH, 0);
        assert!(!die.attacks().can_perform(AttackKind::Power));
        assert!(die.valid().can_be_attacked(AttackKind::Skill));
        assert!(!die.valid().can_be_attacked(AttackKind::Power));
    }

    #[test]
    fn warrior_restricts_to_skill_only_and_no_vulnerability() {
        let die = fixed_die(6, Properties::WARRIOR, 0);
        assert!(die.attacks().can_perform(AttackKind::Skill));
        assert!(!die.attacks().can_perform(AttackKind::Power));
        assert!(die.valid().is_empty());
    }

    #[test]
    fn dizzy_clears_all_attacks() {
        let mut die = fixed_die(6, Properties::empty(), 0);
        die.set_state(DieState::Dizzy);
        assert!(die.attacks().is_empty());
    }

    #[test]
    fn score_null_die_is_zero() {
        let mut die = fixed_die(9, Properties::NULL | Properties::VALUE, 0);
        die.value = Some(9);
        die.state = DieState::Ready;
        assert_eq!(die.score(true), 0.0);
        assert_eq!(die.score(false), 0.0);
    }

    #[test]
    fn score_plain_ready_die_halves_for_own() {
        let mut die = fixed_die(9, Properties::empty(), 0);
        die.value = Some(9);
        die.state = DieState::Ready;
        assert_eq!(die.score(true), 4.5);
        assert_eq!(die.score(false), 9.0);
    }

    #[test]
    fn score_value_and_poison_is_negative_value() {
        let mut die = fixed_die(9, Properties::VALUE | Properties::POISON, 0);
        die.value = Some(9);
        die.state = DieState::Ready;
        assert_eq!(die.score(true), -9.0);
        assert_eq!(die.score(false), -4.5);
    }

    #[test]
    fn berserk_halving_rounds_up_and_clears_property() {
        let mut die = fixed_die(7, Properties::BERSERK, 0);
        die.apply_berserk_halving();
        assert_eq!(die.sides_max(), Some(4));
        assert!(!die.has_property(Properties::BERSERK));
    }

    #[test]
    fn deterministic_roll_matches_seed() {
        let mut rng_a = Rng::from_seed(99);
        let mut rng_b = Rng::from_seed(99);
        let mut die_a = fixed_die(20, Properties::empty(), 0);
        let mut die_b = fixed_die(20, Properties::empty(), 0);
        die_a.roll(&mut rng_a);
        die_b.roll(&mut rng_b);
        assert_eq!(die_a.value(), die_b.value());
    }

    #[test]
    fn warrior_always_rolls_max() {
        let mut rng = Rng::from_seed(1);
        let mut die = fixed_die(20, Properties::WARRIOR, 0);
        for _ in 0..10 {
            die.roll(&mut rng);
            assert_eq!(die.value(), Some(20));
        }
    }
}
