//! `getaction`'s move encoding: a keyword line followed by one line
//! per field, die references by original index.

use bm_gameplay::Move;

pub fn encode_move(mv: &Move) -> Vec<String> {
    let mut lines = vec![mv.keyword().to_string()];
    match mv {
        Move::Attack { attackers, targets, turbo_side, .. } => {
            lines.push(join_indices(attackers));
            lines.push(join_indices(targets));
            if let Some(side) = turbo_side {
                lines.push(format!("turbo {side}"));
            }
        }
        Move::SetSwing { values, options } => {
            for (swing, value) in values {
                lines.push(format!("{} {value}", swing.letter()));
            }
            for (idx, side) in options {
                lines.push(format!("option {idx} {side}"));
            }
        }
        Move::UseChance { reroll } => {
            lines.push(join_indices(reroll));
        }
        Move::UseFocus { values } => {
            for (idx, value) in values {
                lines.push(format!("{idx} {value}"));
            }
        }
        Move::UseReserve { promote } => {
            lines.push(promote.map(|i| i.to_string()).unwrap_or_else(|| "none".to_string()));
        }
        Move::Pass | Move::Surrender => {}
    }
    lines
}

fn join_indices(indices: &[usize]) -> String {
    indices.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_core::AttackKind;

    #[test]
    fn encodes_a_simple_power_attack() {
        let mv = Move::Attack {
            kind: AttackKind::Power,
            attackers: vec![0],
            targets: vec![1],
            attacker_player: 0,
            target_player: 1,
            turbo_side: None,
        };
        assert_eq!(encode_move(&mv), vec!["power".to_string(), "0".to_string(), "1".to_string()]);
    }

    #[test]
    fn encodes_a_multi_attacker_skill_attack() {
        let mv = Move::Attack {
            kind: AttackKind::Skill,
            attackers: vec![2, 1, 0],
            targets: vec![0],
            attacker_player: 0,
            target_player: 1,
            turbo_side: None,
        };
        assert_eq!(encode_move(&mv), vec!["skill".to_string(), "2 1 0".to_string(), "0".to_string()]);
    }

    #[test]
    fn encodes_pass_as_just_the_keyword() {
        assert_eq!(encode_move(&Move::Pass), vec!["pass".to_string()]);
    }
}
