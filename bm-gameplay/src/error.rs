use std::fmt;

/// Internal invariant violations. These are raised
/// only at points the rules engine treats as genuinely unreachable given an
/// authoritative move generator — callers in debug builds see a panic via
/// `assert!`; release builds log and recover via the call sites that check
/// this type instead of asserting directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameplayError {
    SwingAlreadyLocked(bm_core::SwingType),
    UnknownSwingType(bm_core::SwingType),
    DieIndexOutOfRange(usize),
    IllegalMove(String),
}

impl fmt::Display for GameplayError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GameplayError::SwingAlreadyLocked(t) => {
                write!(f, "swing type {t} is already locked for this round")
            }
            GameplayError::UnknownSwingType(t) => {
                write!(f, "no die of swing type {t} on this player")
            }
            GameplayError::DieIndexOutOfRange(i) => write!(f, "die index {i} out of range"),
            GameplayError::IllegalMove(reason) => write!(f, "illegal move: {reason}"),
        }
    }
}

impl std::error::Error for GameplayError {}
