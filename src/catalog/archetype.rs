//! Player archetypes: stat multipliers applied to one line of the team.

use serde::Serialize;

/// Multipliers centred on 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatLine {
    pub speed: f64,
    pub power: f64,
    pub technique: f64,
    pub defense: f64,
}

impl StatLine {
    pub const NEUTRAL: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(speed: f64, power: f64, technique: f64, defense: f64) -> Self {
        Self {
            speed,
            power,
            technique,
            defense,
        }
    }

    /// Finishing ability used for shots and headers.
    pub fn shooting(&self) -> f64 {
        self.power * 0.6 + self.technique * 0.4
    }

    /// Defensive duel strength used for blocks, tackles and aerial duels.
    pub fn stopping(&self) -> f64 {
        self.defense * 0.7 + self.power * 0.3
    }

    /// Ball-carrying ability used when dribbling past a challenge.
    pub fn carrying(&self) -> f64 {
        self.technique * 0.5 + self.speed * 0.5
    }
}

catalog_enum! {
    pub enum ForwardType: "forward archetype" {
        Speed => "Speed",
        Power => "Power",
        Technique => "Technique",
    }
}

catalog_enum! {
    pub enum MidfielderType: "midfielder archetype" {
        Playmaker => "Playmaker",
        Box2Box => "Box2Box",
        Attacker => "Attacker",
    }
}

catalog_enum! {
    pub enum DefenderType: "defender archetype" {
        Stopper => "Stopper",
        Cover => "Cover",
        BuildUp => "BuildUp",
    }
}

impl ForwardType {
    pub const fn stats(self) -> StatLine {
        match self {
            Self::Speed => StatLine::new(1.2, 0.9, 0.9, 0.7),
            Self::Power => StatLine::new(0.9, 1.2, 0.9, 0.7),
            Self::Technique => StatLine::new(0.9, 0.9, 1.2, 0.7),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Speed => "Pace merchant",
            Self::Power => "Target striker",
            Self::Technique => "Technical finisher",
        }
    }
}

impl MidfielderType {
    pub const fn stats(self) -> StatLine {
        match self {
            Self::Playmaker => StatLine::new(0.8, 0.8, 1.3, 0.9),
            Self::Box2Box => StatLine::new(1.1, 1.0, 1.0, 1.1),
            Self::Attacker => StatLine::new(1.1, 1.1, 1.0, 0.7),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Playmaker => "Playmaker",
            Self::Box2Box => "Box-to-box",
            Self::Attacker => "Attacking midfielder",
        }
    }
}

impl DefenderType {
    pub const fn stats(self) -> StatLine {
        match self {
            Self::Stopper => StatLine::new(0.8, 1.2, 0.8, 1.3),
            Self::Cover => StatLine::new(1.1, 0.9, 1.0, 1.1),
            Self::BuildUp => StatLine::new(0.9, 0.9, 1.2, 1.0),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Stopper => "Stopper",
            Self::Cover => "Covering defender",
            Self::BuildUp => "Ball-playing defender",
        }
    }
}
