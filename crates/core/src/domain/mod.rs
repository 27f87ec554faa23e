pub mod calls;
pub mod dates;
pub mod positions;
pub mod regime;
pub mod scan;
pub mod ticker;
pub mod trackers;
