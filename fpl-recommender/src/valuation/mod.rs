// Valuation engine: team strength, fixture outlook, composite score and the
// player frame that ties them together.

pub mod frame;
pub mod outlook;
pub mod score;
pub mod strength;

pub use frame::{build_player_frame, Availability, FrameError, PlayerRecord};
