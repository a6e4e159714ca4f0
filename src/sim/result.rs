use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub const fn opponent(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Home,
    Away,
    Draw,
}

impl Winner {
    pub fn from_goals(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => Self::Home,
            std::cmp::Ordering::Less => Self::Away,
            std::cmp::Ordering::Equal => Self::Draw,
        }
    }
}

/// Result of a match as seen by one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub home_goals: u32,
    pub away_goals: u32,
    pub home_possession: f64,
    pub away_possession: f64,
    pub home_shots: u32,
    pub away_shots: u32,
    #[serde(default)]
    pub home_crosses: u32,
    #[serde(default)]
    pub away_crosses: u32,
    #[serde(default)]
    pub home_through_balls: u32,
    #[serde(default)]
    pub away_through_balls: u32,
    pub winner: Winner,
}

/// One side's perspective on a [`MatchResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideView {
    pub goals_for: u32,
    pub goals_against: u32,
    pub possession: f64,
    pub shots: u32,
    pub outcome: Outcome,
}

impl MatchResult {
    pub fn view(&self, side: Side) -> SideView {
        let (goals_for, goals_against, possession, shots) = match side {
            Side::Home => (
                self.home_goals,
                self.away_goals,
                self.home_possession,
                self.home_shots,
            ),
            Side::Away => (
                self.away_goals,
                self.home_goals,
                self.away_possession,
                self.away_shots,
            ),
        };
        let outcome = match goals_for.cmp(&goals_against) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Draw,
        };
        SideView {
            goals_for,
            goals_against,
            possession,
            shots,
            outcome,
        }
    }
}
