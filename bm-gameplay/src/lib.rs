//! Player, Move, and the Game phase state machine: legal-move generation,
//! attack resolution, initiative, and the preround/fight/round-end cycle
//! that drives a full match. Depends only on `bm-core`'s die model — no
//! notion of search or heuristics lives here (see `bm-search`).

pub mod apply;
pub mod combos;
pub mod error;
pub mod game;
pub mod initiative;
pub mod legal;
pub mod mv;
pub mod phase;
pub mod player;

pub use apply::{apply_attack, AttackOutcome};
pub use error::GameplayError;
pub use game::{Game, MoveChooser};
pub use initiative::{determine as determine_initiative, Initiative};
pub use legal::legal_attacks;
pub use mv::Move;
pub use phase::Phase;
pub use player::{Player, SwingSet, SURRENDER_SCORE};
