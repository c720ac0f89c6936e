// Pure game engine: no I/O, no clocks beyond the timestamps passed in.

pub mod actions;
pub mod changeset;
pub mod fraud;
pub mod items;
pub mod reducer;
pub mod replay;
pub mod state;
pub mod units;
