//! Die model: properties, side/value representation, roll and the mutation
//! rules an attack triggers. This crate has no notion of a game,
//! player, or move — it only knows how one die behaves.

pub mod arbitrary;
pub mod attacks;
pub mod die;
pub mod properties;
pub mod rng;
pub mod sides;
pub mod swing;

pub use arbitrary::Arbitrary;
pub use attacks::{AttackKind, AttackMask};
pub use die::{Die, DieState};
pub use properties::Properties;
pub use rng::Rng;
pub use sides::Sides;
pub use swing::SwingType;
