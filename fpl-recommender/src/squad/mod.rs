// Squad-side logic: positions, request parsing and the greedy allocator.

pub mod allocate;
pub mod parse;
pub mod position;

pub use allocate::{allocate, AllocationRequest, AllocationResult, Pick, PositionFill};
pub use parse::ParseError;
pub use position::Position;
