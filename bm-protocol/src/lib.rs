//! Text protocol: die syntax, position format, move encoding, and the
//! stdin/stdout command driver built on top of `bm-gameplay`/`bm-search`.

pub mod die_syntax;
pub mod driver;
pub mod error;
pub mod mv_encode;
pub mod position;

pub use die_syntax::{encode_die, parse_die};
pub use driver::Driver;
pub use error::ParseError;
pub use mv_encode::encode_move;
pub use position::{parse_player_header, parse_position, ParsedPosition};
