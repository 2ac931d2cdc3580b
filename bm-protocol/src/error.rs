use std::fmt;

/// Everything that can go wrong turning a protocol line into game state
/// (the "parse error" category): malformed die syntax, a position missing a
/// field, or a command the dispatch table doesn't recognize. The driver
/// wraps these in `anyhow::Error` with `.context(...)` before reporting
/// them, so a caller sees both the proximate field and the line it came
/// from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnknownCommand(String),
    UnknownPhase(String),
    UnknownAiType(String),
    UnknownDebugCategory(String),
    MalformedDie(String),
    InvalidProperties(String),
    MalformedField(String),
    MissingField(String),
    NoActiveGame,
    UnexpectedEof,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownCommand(s) => write!(f, "unknown command: {s}"),
            ParseError::UnknownPhase(s) => write!(f, "unknown phase: {s}"),
            ParseError::UnknownAiType(s) => write!(f, "unknown ai type: {s}"),
            ParseError::UnknownDebugCategory(s) => write!(f, "unknown debug category: {s}"),
            ParseError::MalformedDie(s) => write!(f, "malformed die: {s}"),
            ParseError::InvalidProperties(s) => write!(f, "invalid property combination: {s}"),
            ParseError::MalformedField(s) => write!(f, "malformed field: {s}"),
            ParseError::MissingField(s) => write!(f, "missing field: {s}"),
            ParseError::NoActiveGame => write!(f, "no active game; send a `game` command first"),
            ParseError::UnexpectedEof => write!(f, "unexpected end of input"),
        }
    }
}

impl std::error::Error for ParseError {}
