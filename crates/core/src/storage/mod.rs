pub mod files;
pub mod snapshot;
pub mod trackers;
