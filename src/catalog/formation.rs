//! Formation layouts. Coordinates are relative to a pitch of `[0,1] x [0,1]` with the
//! owning side attacking towards `x = 1`; the away side is mirrored at simulation time.

/// Players per side, goalkeeper included.
pub const SLOTS: usize = 11;

const MIN_COORD: f64 = 0.02;
const MAX_COORD: f64 = 0.98;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    GK,
    CB,
    LB,
    RB,
    LWB,
    RWB,
    CDM,
    CM,
    LM,
    RM,
    CAM,
    LW,
    RW,
    ST,
}

/// Positional group a role belongs to; archetypes are applied per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    Goalkeeper,
    Defense,
    Midfield,
    Attack,
}

impl Role {
    pub const fn line(self) -> Line {
        match self {
            Self::GK => Line::Goalkeeper,
            Self::CB | Self::LB | Self::RB | Self::LWB | Self::RWB => Line::Defense,
            Self::CDM | Self::CM | Self::LM | Self::RM | Self::CAM => Line::Midfield,
            Self::LW | Self::RW | Self::ST => Line::Attack,
        }
    }
}

/// Which bias a formation applies when producing target coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Normal,
    Attack,
    Defense,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub role: Role,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormationProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub slots: [Slot; SLOTS],
    pub attack_bias: f64,
    pub defense_bias: f64,
}

impl FormationProfile {
    /// Target slot for `index` in the given phase. The goalkeeper never takes a bias.
    pub fn target(&self, index: usize, phase: Phase) -> Slot {
        let slot = self.slots[index];
        if slot.role == Role::GK {
            return slot;
        }
        let offset = match phase {
            Phase::Normal => 0.0,
            Phase::Attack => self.attack_bias,
            Phase::Defense => self.defense_bias,
        };
        Slot {
            x: (slot.x + offset).clamp(MIN_COORD, MAX_COORD),
            ..slot
        }
    }
}

catalog_enum! {
    pub enum Formation: "formation" {
        F442 => "4-4-2",
        F433 => "4-3-3",
        F352 => "3-5-2",
        F4231 => "4-2-3-1",
        F532 => "5-3-2",
        F343 => "3-4-3",
    }
}

const fn s(role: Role, x: f64, y: f64) -> Slot {
    Slot { role, x, y }
}

static F442: FormationProfile = FormationProfile {
    name: "4-4-2",
    description: "Balanced two-bank shape",
    category: "balanced",
    slots: [
        s(Role::GK, 0.05, 0.5),
        s(Role::LB, 0.2, 0.15),
        s(Role::CB, 0.18, 0.38),
        s(Role::CB, 0.18, 0.62),
        s(Role::RB, 0.2, 0.85),
        s(Role::LM, 0.45, 0.12),
        s(Role::CM, 0.42, 0.38),
        s(Role::CM, 0.42, 0.62),
        s(Role::RM, 0.45, 0.88),
        s(Role::ST, 0.7, 0.35),
        s(Role::ST, 0.7, 0.65),
    ],
    attack_bias: 0.08,
    defense_bias: -0.06,
};

static F433: FormationProfile = FormationProfile {
    name: "4-3-3",
    description: "Attacking front three",
    category: "offensive",
    slots: [
        s(Role::GK, 0.05, 0.5),
        s(Role::LB, 0.2, 0.15),
        s(Role::CB, 0.18, 0.38),
        s(Role::CB, 0.18, 0.62),
        s(Role::RB, 0.2, 0.85),
        s(Role::CM, 0.42, 0.3),
        s(Role::CDM, 0.38, 0.5),
        s(Role::CM, 0.42, 0.7),
        s(Role::LW, 0.7, 0.12),
        s(Role::ST, 0.72, 0.5),
        s(Role::RW, 0.7, 0.88),
    ],
    attack_bias: 0.1,
    defense_bias: -0.05,
};

static F352: FormationProfile = FormationProfile {
    name: "3-5-2",
    description: "Midfield control with wing-backs",
    category: "balanced",
    slots: [
        s(Role::GK, 0.05, 0.5),
        s(Role::CB, 0.18, 0.25),
        s(Role::CB, 0.16, 0.5),
        s(Role::CB, 0.18, 0.75),
        s(Role::LWB, 0.38, 0.08),
        s(Role::CM, 0.4, 0.32),
        s(Role::CDM, 0.36, 0.5),
        s(Role::CM, 0.4, 0.68),
        s(Role::RWB, 0.38, 0.92),
        s(Role::ST, 0.7, 0.38),
        s(Role::ST, 0.7, 0.62),
    ],
    attack_bias: 0.09,
    defense_bias: -0.07,
};

static F4231: FormationProfile = FormationProfile {
    name: "4-2-3-1",
    description: "Double pivot, stable defensively",
    category: "defensive",
    slots: [
        s(Role::GK, 0.05, 0.5),
        s(Role::LB, 0.2, 0.15),
        s(Role::CB, 0.18, 0.38),
        s(Role::CB, 0.18, 0.62),
        s(Role::RB, 0.2, 0.85),
        s(Role::CDM, 0.35, 0.38),
        s(Role::CDM, 0.35, 0.62),
        s(Role::LW, 0.55, 0.15),
        s(Role::CAM, 0.55, 0.5),
        s(Role::RW, 0.55, 0.85),
        s(Role::ST, 0.73, 0.5),
    ],
    attack_bias: 0.07,
    defense_bias: -0.08,
};

static F532: FormationProfile = FormationProfile {
    name: "5-3-2",
    description: "Low block with five at the back",
    category: "defensive",
    slots: [
        s(Role::GK, 0.05, 0.5),
        s(Role::LWB, 0.22, 0.08),
        s(Role::CB, 0.16, 0.3),
        s(Role::CB, 0.14, 0.5),
        s(Role::CB, 0.16, 0.7),
        s(Role::RWB, 0.22, 0.92),
        s(Role::CM, 0.4, 0.3),
        s(Role::CM, 0.38, 0.5),
        s(Role::CM, 0.4, 0.7),
        s(Role::ST, 0.68, 0.38),
        s(Role::ST, 0.68, 0.62),
    ],
    attack_bias: 0.06,
    defense_bias: -0.1,
};

static F343: FormationProfile = FormationProfile {
    name: "3-4-3",
    description: "All-out attack",
    category: "offensive",
    slots: [
        s(Role::GK, 0.05, 0.5),
        s(Role::CB, 0.18, 0.25),
        s(Role::CB, 0.16, 0.5),
        s(Role::CB, 0.18, 0.75),
        s(Role::LM, 0.42, 0.1),
        s(Role::CM, 0.4, 0.38),
        s(Role::CM, 0.4, 0.62),
        s(Role::RM, 0.42, 0.9),
        s(Role::LW, 0.7, 0.15),
        s(Role::ST, 0.73, 0.5),
        s(Role::RW, 0.7, 0.85),
    ],
    attack_bias: 0.12,
    defense_bias: -0.04,
};

impl Formation {
    pub fn profile(self) -> &'static FormationProfile {
        match self {
            Self::F442 => &F442,
            Self::F433 => &F433,
            Self::F352 => &F352,
            Self::F4231 => &F4231,
            Self::F532 => &F532,
            Self::F343 => &F343,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_formation_has_a_leading_goalkeeper_and_in_bounds_slots() {
        for formation in Formation::ALL {
            let profile = formation.profile();
            assert_eq!(profile.slots[0].role, Role::GK, "{formation}");
            assert_eq!(
                profile.slots.iter().filter(|slot| slot.role == Role::GK).count(),
                1
            );
            for slot in &profile.slots {
                assert!((0.0..=1.0).contains(&slot.x) && (0.0..=1.0).contains(&slot.y));
            }
        }
    }

    #[test]
    fn goalkeeper_ignores_phase_bias() {
        let profile = Formation::F343.profile();
        assert_eq!(profile.target(0, Phase::Attack), profile.slots[0]);
        assert_eq!(profile.target(0, Phase::Defense), profile.slots[0]);
        let striker = profile.target(9, Phase::Attack);
        assert!((striker.x - (0.73 + 0.12)).abs() < 1e-12);
    }

    #[test]
    fn unknown_formation_key_is_rejected() {
        let err = "4-6-0".parse::<Formation>().unwrap_err();
        assert!(err.to_string().contains("formation"));
    }
}
