//! Move choosers that sit on top of `bm-gameplay`'s `Game`: the cheap
//! heuristic evaluator (`Qai`) and the budgeted recursive rollout search
//! (`Bmai`), plus the `Stats` counters and log-category gates both can
//! report through.

pub mod bmai;
pub mod qai;
pub mod stats;

pub use bmai::Bmai;
pub use qai::Qai;
pub use stats::{LogCategory, Stats};
