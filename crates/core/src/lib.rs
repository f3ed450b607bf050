#![forbid(unsafe_code)]

pub mod flow;
pub mod leaderboard;
pub mod model;
pub mod progression;
pub mod time;

pub use time::Clock;
