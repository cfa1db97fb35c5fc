// Application layer: configuration, data files, SQLite persistence and the
// session loop that drives a draft.

pub mod config;
pub mod data;
pub mod db;
pub mod protocol;
pub mod session;
pub mod simulators;
