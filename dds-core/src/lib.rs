//! Card-domain value types for double-dummy analysis.
//!
//! Everything here is a small, copyable, validated value: suits and strains,
//! ranks, seats and trick positions, 13-bit rank sets with table-backed
//! queries, and the hand/deal aggregates the solver consumes. Construction
//! from raw numbers or characters always goes through a checked path;
//! conversion back out goes through named functions, never casts at call
//! sites.

mod card;
mod deal;
mod hand;
mod notation;
mod rank;
mod rankset;
mod seat;
mod suit;

pub use card::Card;
pub use deal::{Deal, DealError};
pub use hand::Hand;
pub use notation::NotationError;
pub use rank::Rank;
pub use rankset::{initialize, Priority, RankSet};
pub use seat::{Seat, TrickPosition};
pub use suit::{Strain, Suit};
