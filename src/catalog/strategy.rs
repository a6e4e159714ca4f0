//! Attacking and defending strategy profiles.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildUp {
    Short,
    Long,
    Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackArea {
    Central,
    Wide,
    Balanced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttackProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub pass_accuracy_bonus: f64,
    pub shot_frequency: f64,
    pub press_intensity: f64,
    pub counter_speed: f64,
    pub build_up: BuildUp,
    pub attack_area: AttackArea,
    pub through_ball_frequency: f64,
    pub cross_frequency: f64,
    pub dribble_frequency: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefenseProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub tackle_success: f64,
    pub interception_rate: f64,
    pub block_rate: f64,
    /// 0 = deep line, 1 = very high line.
    pub line_height: f64,
    pub press_intensity: f64,
    pub compactness: f64,
    pub cover_range: f64,
}

catalog_enum! {
    pub enum AttackStyle: "attack strategy" {
        Possession => "possession",
        ShortCounter => "shortCounter",
        LongCounter => "longCounter",
        SideAttack => "sideAttack",
        LongBall => "longBall",
    }
}

catalog_enum! {
    pub enum DefenseStyle: "defense strategy" {
        Forecheck => "forecheck",
        Retreat => "retreat",
        HighPress => "highPress",
        Aggressive => "aggressive",
    }
}

static POSSESSION: AttackProfile = AttackProfile {
    name: "Possession",
    description: "Keep the ball with short passes and break the block patiently",
    pass_accuracy_bonus: 0.15,
    shot_frequency: 0.25,
    press_intensity: 0.3,
    counter_speed: 0.2,
    build_up: BuildUp::Short,
    attack_area: AttackArea::Balanced,
    through_ball_frequency: 0.3,
    cross_frequency: 0.2,
    dribble_frequency: 0.2,
};

static SHORT_COUNTER: AttackProfile = AttackProfile {
    name: "Short counter",
    description: "Win the ball high and attack quickly with short passes",
    pass_accuracy_bonus: 0.05,
    shot_frequency: 0.55,
    press_intensity: 0.8,
    counter_speed: 0.85,
    build_up: BuildUp::Short,
    attack_area: AttackArea::Central,
    through_ball_frequency: 0.5,
    cross_frequency: 0.15,
    dribble_frequency: 0.35,
};

static LONG_COUNTER: AttackProfile = AttackProfile {
    name: "Long counter",
    description: "Defend deep and break with long passes after winning the ball",
    pass_accuracy_bonus: -0.05,
    shot_frequency: 0.5,
    press_intensity: 0.2,
    counter_speed: 0.95,
    build_up: BuildUp::Long,
    attack_area: AttackArea::Central,
    through_ball_frequency: 0.6,
    cross_frequency: 0.2,
    dribble_frequency: 0.3,
};

static SIDE_ATTACK: AttackProfile = AttackProfile {
    name: "Side attack",
    description: "Overload the flanks and create chances from crosses and cut-ins",
    pass_accuracy_bonus: 0.08,
    shot_frequency: 0.4,
    press_intensity: 0.4,
    counter_speed: 0.4,
    build_up: BuildUp::Side,
    attack_area: AttackArea::Wide,
    through_ball_frequency: 0.25,
    cross_frequency: 0.6,
    dribble_frequency: 0.4,
};

static LONG_BALL: AttackProfile = AttackProfile {
    name: "Long ball",
    description: "Feed the front line directly with long deliveries",
    pass_accuracy_bonus: -0.1,
    shot_frequency: 0.55,
    press_intensity: 0.35,
    counter_speed: 0.7,
    build_up: BuildUp::Long,
    attack_area: AttackArea::Central,
    through_ball_frequency: 0.4,
    cross_frequency: 0.5,
    dribble_frequency: 0.15,
};

static FORECHECK: DefenseProfile = DefenseProfile {
    name: "Forecheck",
    description: "Press from the front to win the ball high",
    tackle_success: 0.6,
    interception_rate: 0.55,
    block_rate: 0.4,
    line_height: 0.7,
    press_intensity: 0.85,
    compactness: 0.7,
    cover_range: 0.6,
};

static RETREAT: DefenseProfile = DefenseProfile {
    name: "Retreat",
    description: "Drop back and form a compact block in front of goal",
    tackle_success: 0.5,
    interception_rate: 0.55,
    block_rate: 0.7,
    line_height: 0.3,
    press_intensity: 0.2,
    compactness: 0.85,
    cover_range: 0.4,
};

static HIGH_PRESS: DefenseProfile = DefenseProfile {
    name: "High press",
    description: "Coordinated pressing from the front line to regain possession immediately",
    tackle_success: 0.65,
    interception_rate: 0.6,
    block_rate: 0.35,
    line_height: 0.8,
    press_intensity: 0.95,
    compactness: 0.6,
    cover_range: 0.7,
};

static AGGRESSIVE: DefenseProfile = DefenseProfile {
    name: "Aggressive",
    description: "Tight man-marking that closes down the ball carrier hard",
    tackle_success: 0.7,
    interception_rate: 0.4,
    block_rate: 0.5,
    line_height: 0.55,
    press_intensity: 0.75,
    compactness: 0.5,
    cover_range: 0.8,
};

impl AttackStyle {
    pub fn profile(self) -> &'static AttackProfile {
        match self {
            Self::Possession => &POSSESSION,
            Self::ShortCounter => &SHORT_COUNTER,
            Self::LongCounter => &LONG_COUNTER,
            Self::SideAttack => &SIDE_ATTACK,
            Self::LongBall => &LONG_BALL,
        }
    }
}

impl DefenseStyle {
    pub fn profile(self) -> &'static DefenseProfile {
        match self {
            Self::Forecheck => &FORECHECK,
            Self::Retreat => &RETREAT,
            Self::HighPress => &HIGH_PRESS,
            Self::Aggressive => &AGGRESSIVE,
        }
    }
}
