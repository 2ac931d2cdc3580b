//! Thin seat adapters the driver assigns per player via the `ai` command:
//! whichever of `bm-search`'s move choosers the command last selected,
//! boxed behind one type so the driver's dispatch table doesn't need to
//! match on which concrete evaluator is in play.

pub mod ai;

pub use ai::{AiKind, AiSlot};
