//! Position format: a `game [target_wins]` header, a phase-name line,
//! then two `player P dice_count score` blocks each followed by that many
//! die lines. There's no serialized capture pile or phasing-player field —
//! phasing always defaults to player 0 on load, a deliberate simplification
//! recorded in the grounding ledger, since the format gives no other way to
//! recover whose turn it was.

use bm_gameplay::{Phase, Player};

use crate::die_syntax;
use crate::error::ParseError;

pub struct ParsedPosition {
    pub target_wins: u32,
    pub phase: Phase,
    pub players: [Player; 2],
}

/// Parses a `player P dice_count score` header line into its three fields.
pub fn parse_player_header(line: &str) -> Result<(usize, usize, f64), ParseError> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("player") {
        return Err(ParseError::MalformedField("expected a `player` header".into()));
    }
    let idx: usize = parts
        .next()
        .ok_or_else(|| ParseError::MissingField("player index".into()))?
        .parse()
        .map_err(|_| ParseError::MalformedField("player index".into()))?;
    let dice_count: usize = parts
        .next()
        .ok_or_else(|| ParseError::MissingField("dice count".into()))?
        .parse()
        .map_err(|_| ParseError::MalformedField("dice count".into()))?;
    let score: f64 = parts
        .next()
        .ok_or_else(|| ParseError::MissingField("score".into()))?
        .parse()
        .map_err(|_| ParseError::MalformedField("score".into()))?;
    Ok((idx, dice_count, score))
}

/// Parses a whole position from one string (blank lines ignored). The
/// line-oriented driver reads the same grammar directly off stdin instead,
/// since it doesn't know the total line count up front; this entry point
/// is for callers that already hold a complete position in memory (tests,
/// saved snapshots).
pub fn parse_position(input: &str) -> Result<ParsedPosition, ParseError> {
    let mut lines = input.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = lines.next().ok_or(ParseError::UnexpectedEof)?;
    let mut parts = header.split_whitespace();
    match parts.next() {
        Some("game") => {}
        Some(other) => return Err(ParseError::UnknownCommand(other.to_string())),
        None => return Err(ParseError::UnexpectedEof),
    }
    let target_wins = parts
        .next()
        .map(|s| s.parse::<u32>().map_err(|_| ParseError::MalformedField("target_wins".into())))
        .transpose()?
        .unwrap_or(3);

    let phase_line = lines.next().ok_or(ParseError::UnexpectedEof)?;
    let phase = Phase::try_from(phase_line).map_err(ParseError::UnknownPhase)?;

    let mut players = [Player::new(), Player::new()];
    for expected in 0..2usize {
        let header = lines.next().ok_or(ParseError::UnexpectedEof)?;
        let (idx, dice_count, score) = parse_player_header(header)?;
        if idx != expected {
            return Err(ParseError::MalformedField("player index out of order".into()));
        }
        let mut dice = Vec::with_capacity(dice_count);
        for die_idx in 0..dice_count {
            let die_line = lines.next().ok_or(ParseError::UnexpectedEof)?;
            dice.push(die_syntax::parse_die(die_line, die_idx)?);
        }
        players[idx] = Player::from_position(dice, score, phase == Phase::Preround);
    }

    Ok(ParsedPosition { target_wins, phase, players })
}
