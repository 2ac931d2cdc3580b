//! Die syntax: an optional run of prefix property characters, a side
//! specification (numeric, swing letter, twin, or option), optional
//! postfix turbo/mood markers, and an optional `:value` suffix.
//!
//! Examples: `n9:9` (a null 9-sided die showing 9), `X-12` (an X swing die
//! set to 12 sides, not yet rolled), `(4,6):7` (a twin die showing 7),
//! `<4>/8-4:3` (an option die that resolved to its 4-sided face, showing 3).

use bm_core::{Die, DieState, Properties, Sides, SwingType};

use crate::error::ParseError;

pub fn parse_die(input: &str, original_index: usize) -> Result<Die, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;

    let mut properties = Properties::empty();
    while let Some(&c) = chars.get(pos) {
        match bm_core::properties::PREFIX_TABLE.iter().find(|(ch, _)| *ch == c) {
            Some((_, flag)) => {
                properties.insert(*flag);
                pos += 1;
            }
            None => break,
        }
    }

    let (sides, consumed) = parse_sides(&chars[pos..], input)?;
    pos += consumed;

    loop {
        match chars.get(pos) {
            Some('!') => {
                properties.insert(Properties::TURBO);
                pos += 1;
            }
            Some('?') => {
                properties.insert(Properties::MOOD);
                pos += 1;
            }
            _ => break,
        }
    }

    let mut value = None;
    let mut dizzy = false;
    if chars.get(pos) == Some(&':') {
        pos += 1;
        let start = pos;
        while chars.get(pos).is_some_and(|c| c.is_ascii_digit()) {
            pos += 1;
        }
        if pos == start {
            return Err(ParseError::MalformedDie(input.to_string()));
        }
        let n: u32 = chars[start..pos].iter().collect::<String>().parse().map_err(|_| ParseError::MalformedDie(input.to_string()))?;
        if chars.get(pos) == Some(&'d') {
            dizzy = true;
            pos += 1;
        }
        value = Some(n);
    }

    if pos != chars.len() {
        return Err(ParseError::MalformedDie(input.to_string()));
    }
    if !properties.is_valid() {
        return Err(ParseError::InvalidProperties(input.to_string()));
    }

    let mut die = Die::new(properties, sides, original_index);
    if properties.has(Properties::RESERVE) {
        die.set_state(DieState::Reserve);
    } else if let Some(v) = value {
        die.set_value(v, dizzy);
    }
    Ok(die)
}

/// Parses one side specification from the front of `chars`, returning it
/// plus how many characters it consumed. `whole` is only used to build
/// error messages that quote the full token being parsed.
fn parse_sides(chars: &[char], whole: &str) -> Result<(Sides, usize), ParseError> {
    match chars.first() {
        Some('(') => {
            let close = chars.iter().position(|&c| c == ')').ok_or_else(|| ParseError::MalformedDie(whole.to_string()))?;
            let inner = &chars[1..close];
            let comma = inner.iter().position(|&c| c == ',').ok_or_else(|| ParseError::MalformedDie(whole.to_string()))?;
            let (a, consumed_a) = parse_sides(&inner[..comma], whole)?;
            if consumed_a != comma {
                return Err(ParseError::MalformedDie(whole.to_string()));
            }
            let (b, consumed_b) = parse_sides(&inner[comma + 1..], whole)?;
            if consumed_b != inner.len() - comma - 1 {
                return Err(ParseError::MalformedDie(whole.to_string()));
            }
            Ok((Sides::Twin(Box::new(a), Box::new(b)), close + 1))
        }
        Some('<') => {
            let close = chars.iter().position(|&c| c == '>').ok_or_else(|| ParseError::MalformedDie(whole.to_string()))?;
            let a: u32 = chars[1..close].iter().collect::<String>().parse().map_err(|_| ParseError::MalformedDie(whole.to_string()))?;
            let mut pos = close + 1;
            if chars.get(pos) != Some(&'/') {
                return Err(ParseError::MalformedDie(whole.to_string()));
            }
            pos += 1;
            let start = pos;
            while chars.get(pos).is_some_and(|c| c.is_ascii_digit()) {
                pos += 1;
            }
            if pos == start {
                return Err(ParseError::MalformedDie(whole.to_string()));
            }
            let b: u32 = chars[start..pos].iter().collect::<String>().parse().map_err(|_| ParseError::MalformedDie(whole.to_string()))?;
            let mut chosen = None;
            if chars.get(pos) == Some(&'-') {
                pos += 1;
                let start = pos;
                while chars.get(pos).is_some_and(|c| c.is_ascii_digit()) {
                    pos += 1;
                }
                if pos == start {
                    return Err(ParseError::MalformedDie(whole.to_string()));
                }
                let picked: u32 = chars[start..pos].iter().collect::<String>().parse().map_err(|_| ParseError::MalformedDie(whole.to_string()))?;
                chosen = Some(if picked == a {
                    0
                } else if picked == b {
                    1
                } else {
                    return Err(ParseError::MalformedDie(whole.to_string()));
                });
            }
            Ok((Sides::Option([a, b], chosen), pos))
        }
        Some(&c) if ('P'..='Z').contains(&c) => {
            let swing = SwingType::try_from(c).map_err(|_| ParseError::MalformedDie(whole.to_string()))?;
            let mut pos = 1;
            let mut chosen = None;
            if chars.get(pos) == Some(&'-') {
                pos += 1;
                let start = pos;
                while chars.get(pos).is_some_and(|c| c.is_ascii_digit()) {
                    pos += 1;
                }
                if pos == start {
                    return Err(ParseError::MalformedDie(whole.to_string()));
                }
                let n: u32 = chars[start..pos].iter().collect::<String>().parse().map_err(|_| ParseError::MalformedDie(whole.to_string()))?;
                chosen = Some(n);
            }
            Ok((Sides::Swing(swing, chosen), pos))
        }
        Some(c) if c.is_ascii_digit() => {
            let mut pos = 0;
            while chars.get(pos).is_some_and(|c| c.is_ascii_digit()) {
                pos += 1;
            }
            let n: u32 = chars[..pos].iter().collect::<String>().parse().map_err(|_| ParseError::MalformedDie(whole.to_string()))?;
            Ok((Sides::Fixed(n), pos))
        }
        _ => Err(ParseError::MalformedDie(whole.to_string())),
    }
}

/// Renders a die back into its canonical text form: prefix property
/// characters in table order, the side specification, postfix turbo/mood
/// markers, then the `:value` suffix if the die has been set.
pub fn encode_die(die: &Die) -> String {
    let mut out = String::new();
    for (ch, flag) in bm_core::properties::PREFIX_TABLE {
        if die.properties().has(*flag) {
            out.push(*ch);
        }
    }
    out.push_str(&encode_sides(die.sides()));
    if die.properties().has(Properties::TURBO) {
        out.push('!');
    }
    if die.properties().has(Properties::MOOD) {
        out.push('?');
    }
    match (die.state(), die.value()) {
        (DieState::Ready, Some(v)) => out.push_str(&format!(":{v}")),
        (DieState::Dizzy, Some(v)) => out.push_str(&format!(":{v}d")),
        _ => {}
    }
    out
}

fn encode_sides(sides: &Sides) -> String {
    match sides {
        Sides::Fixed(n) => n.to_string(),
        Sides::Swing(t, chosen) => match chosen {
            Some(v) => format!("{}-{v}", t.letter()),
            None => t.letter().to_string(),
        },
        Sides::Twin(a, b) => format!("({},{})", encode_sides(a), encode_sides(b)),
        Sides::Option(values, chosen) => match chosen {
            Some(c) => format!("<{}>/{}-{}", values[0], values[1], values[*c as usize]),
            None => format!("<{}>/{}", values[0], values[1]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_plain_fixed_die() {
        let die = parse_die("6", 0).unwrap();
        assert_eq!(die.sides(), &Sides::Fixed(6));
        assert!(die.value().is_none());
    }

    #[test]
    fn parses_prefix_and_value_suffix() {
        let die = parse_die("n9:9", 0).unwrap();
        assert!(die.has_property(Properties::NULL));
        assert_eq!(die.sides(), &Sides::Fixed(9));
        assert_eq!(die.value(), Some(9));
        assert_eq!(die.state(), DieState::Ready);
    }

    #[test]
    fn parses_dizzy_suffix() {
        let die = parse_die("6:3d", 0).unwrap();
        assert_eq!(die.value(), Some(3));
        assert_eq!(die.state(), DieState::Dizzy);
    }

    #[test]
    fn parses_swing_letter_with_chosen_value() {
        let die = parse_die("X-12:7", 0).unwrap();
        assert_eq!(die.sides(), &Sides::Swing(SwingType::X, Some(12)));
        assert_eq!(die.value(), Some(7));
    }

    #[test]
    fn parses_unresolved_swing_letter() {
        let die = parse_die("X", 0).unwrap();
        assert_eq!(die.sides(), &Sides::Swing(SwingType::X, None));
    }

    #[test]
    fn parses_twin_die() {
        let die = parse_die("(4,6):7", 0).unwrap();
        assert_eq!(die.sides(), &Sides::Twin(Box::new(Sides::Fixed(4)), Box::new(Sides::Fixed(6))));
        assert_eq!(die.value(), Some(7));
    }

    #[test]
    fn parses_option_die_with_chosen_side() {
        let die = parse_die("<4>/8-4:3", 0).unwrap();
        assert_eq!(die.sides(), &Sides::Option([4, 8], Some(0)));
        assert_eq!(die.value(), Some(3));
    }

    #[test]
    fn parses_turbo_and_mood_markers() {
        let die = parse_die("z6!", 0).unwrap();
        assert!(die.has_property(Properties::SPEED));
        assert!(die.has_property(Properties::TURBO));

        let die = parse_die("X?", 0).unwrap();
        assert!(die.has_property(Properties::MOOD));
    }

    #[test]
    fn reserve_prefix_sets_reserve_state() {
        let die = parse_die("r6", 0).unwrap();
        assert_eq!(die.state(), DieState::Reserve);
    }

    #[test]
    fn rejects_invalid_property_combination() {
        assert!(parse_die("mz6", 0).is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_die("6x", 0).is_err());
    }

    #[test]
    fn encode_round_trips_a_plain_die() {
        let die = parse_die("n9:9", 0).unwrap();
        assert_eq!(encode_die(&die), "n9:9");
    }

    #[test]
    fn encode_round_trips_a_twin_die() {
        let die = parse_die("(4,6):7", 0).unwrap();
        assert_eq!(encode_die(&die), "(4,6):7");
    }

    #[test]
    fn encode_round_trips_an_unset_swing_die() {
        let die = parse_die("X-12", 0).unwrap();
        assert_eq!(encode_die(&die), "X-12");
    }
}
