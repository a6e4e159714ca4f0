pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod optimizer;
pub mod parallel;
pub mod reward;
pub mod server;
pub mod sim;
