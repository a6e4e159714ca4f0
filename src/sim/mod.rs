pub mod engine;
mod pitch;
pub mod result;

pub use engine::{simulate_match, simulate_match_with, MATCH_STEPS};
pub use result::{MatchResult, Outcome, Side, SideView, Winner};
