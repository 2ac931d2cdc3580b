use bm_core::AttackKind;
use colored::Colorize;

/// One of the seven action kinds a player may take, as a sum type: rather
/// than a shared struct with a discriminator and overlapped fields, the
/// variant tag itself distinguishes the action.
///
/// Die references are by *original index* into the acting/target player's
/// roster, matching the protocol's `getaction` output convention.
#[derive(Debug, Clone, PartialEq)]
pub enum Move {
    Attack {
        kind: AttackKind,
        attackers: Vec<usize>,
        targets: Vec<usize>,
        attacker_player: usize,
        target_player: usize,
        /// Present only when a turbo die among the attackers chooses an
        /// alternate side for this particular move.
        turbo_side: Option<u32>,
    },
    SetSwing {
        /// Chosen value per swing letter touched by this move.
        values: Vec<(bm_core::SwingType, u32)>,
        /// Option die index -> chosen side, for option dice set in the
        /// same preround action.
        options: Vec<(usize, u8)>,
    },
    UseChance {
        reroll: Vec<usize>,
    },
    UseFocus {
        /// (die index, new value); `0` means "unchanged" and is never
        /// actually emitted as an entry — only dice that move appear here.
        values: Vec<(usize, u32)>,
    },
    UseReserve {
        promote: Option<usize>,
    },
    Pass,
    Surrender,
}

impl Move {
    pub fn is_attack(&self) -> bool {
        matches!(self, Move::Attack { .. })
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Move::Pass)
    }

    pub fn is_surrender(&self) -> bool {
        matches!(self, Move::Surrender)
    }

    pub fn attack_kind(&self) -> Option<AttackKind> {
        match self {
            Move::Attack { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Keyword for this move's line in `getaction`'s output.
    pub fn keyword(&self) -> &'static str {
        match self {
            Move::Attack { kind, .. } => kind.keyword(),
            Move::SetSwing { .. } => "swing",
            Move::UseChance { .. } => "chance",
            Move::UseFocus { .. } => "focus",
            Move::UseReserve { .. } => "reserve",
            Move::Pass => "pass",
            Move::Surrender => "surrender",
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Move::Attack { kind, attackers, targets, .. } => {
                let label = format!("{} {:?}->{:?}", kind.keyword(), attackers, targets);
                let colored = match kind {
                    AttackKind::Power => label.red(),
                    AttackKind::Skill => label.yellow(),
                    AttackKind::Speed => label.cyan(),
                    AttackKind::Berserk => label.magenta(),
                    AttackKind::Shadow => label.blue(),
                    AttackKind::Trip => label.green(),
                };
                write!(f, "{colored}")
            }
            Move::Pass => write!(f, "{}", "pass".white()),
            Move::Surrender => write!(f, "{}", "surrender".bright_red()),
            other => write!(f, "{}", other.keyword()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_matches_attack_kind() {
        let mv = Move::Attack {
            kind: AttackKind::Power,
            attackers: vec![0],
            targets: vec![1],
            attacker_player: 0,
            target_player: 1,
            turbo_side: None,
        };
        assert_eq!(mv.keyword(), "power");
        assert!(mv.is_attack());
    }

    #[test]
    fn pass_and_surrender_are_distinct() {
        assert!(Move::Pass.is_pass());
        assert!(!Move::Pass.is_surrender());
        assert!(Move::Surrender.is_surrender());
    }
}
