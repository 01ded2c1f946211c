pub mod config;
pub mod log;
pub mod run;
pub mod stats;
pub mod timer;

mod common;
