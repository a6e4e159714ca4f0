//! Player positions and per-side state for one match.

use crate::catalog::{AttackProfile, DefenseProfile, Line, Phase, Role, StatLine, Tactic, SLOTS};
use crate::sim::Side;

/// Fraction of the remaining distance a player with neutral speed covers per step.
const MOVE_RATE: f64 = 0.15;
/// Horizontal shift applied to the back line per unit of line height above 0.5.
const LINE_HEIGHT_SHIFT: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const CENTER: Self = Self { x: 0.5, y: 0.5 };

    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Player {
    pub role: Role,
    pub pos: Point,
}

/// Converts formation coordinates (attacking towards `x = 1`) to pitch coordinates.
fn orient(side: Side, x: f64, y: f64) -> Point {
    match side {
        Side::Home => Point { x, y },
        Side::Away => Point { x: 1.0 - x, y },
    }
}

pub(crate) struct Team<'t> {
    pub side: Side,
    pub tactic: &'t Tactic,
    pub attack: &'static AttackProfile,
    pub defense: &'static DefenseProfile,
    pub players: [Player; SLOTS],
}

impl<'t> Team<'t> {
    pub fn new(tactic: &'t Tactic, side: Side) -> Self {
        let formation = tactic.attack_formation.profile();
        let players = std::array::from_fn(|index| {
            let slot = formation.target(index, Phase::Normal);
            Player {
                role: slot.role,
                pos: orient(side, slot.x, slot.y),
            }
        });
        Self {
            side,
            tactic,
            attack: tactic.attack_strategy.profile(),
            defense: tactic.defense_strategy.profile(),
            players,
        }
    }

    /// `+1` when attacking towards `x = 1`, `-1` otherwise.
    pub fn direction(&self) -> f64 {
        match self.side {
            Side::Home => 1.0,
            Side::Away => -1.0,
        }
    }

    pub fn distance_to_goal(&self, pos: Point) -> f64 {
        let goal_x = match self.side {
            Side::Home => 1.0,
            Side::Away => 0.0,
        };
        (pos.x - goal_x).abs()
    }

    pub fn stats(&self, index: usize) -> StatLine {
        self.tactic.stats_for(self.players[index].role.line())
    }

    pub fn pos(&self, index: usize) -> Point {
        self.players[index].pos
    }

    pub fn outfield(&self) -> impl Iterator<Item = usize> + '_ {
        (0..SLOTS).filter(move |&index| self.players[index].role != Role::GK)
    }

    /// Closest non-goalkeeper to `pos`.
    pub fn nearest_outfield(&self, pos: Point) -> usize {
        self.outfield()
            .min_by(|&a, &b| {
                self.pos(a)
                    .distance(pos)
                    .total_cmp(&self.pos(b).distance(pos))
            })
            .unwrap_or(0)
    }

    /// Outfield teammate of `carrier` closest to the opposing goal.
    pub fn most_advanced(&self, carrier: usize) -> Option<usize> {
        self.outfield().filter(|&index| index != carrier).min_by(|&a, &b| {
            self.distance_to_goal(self.pos(a))
                .total_cmp(&self.distance_to_goal(self.pos(b)))
        })
    }

    /// Moves every player a speed-scaled fraction of the way to their target for `phase`.
    ///
    /// In the defending phase the back line is nudged up or down the pitch by the
    /// side's own line height.
    pub fn reposition(&mut self, phase: Phase) {
        let formation = match phase {
            Phase::Defense => self.tactic.defense_formation,
            Phase::Normal | Phase::Attack => self.tactic.attack_formation,
        }
        .profile();
        let line_shift = match phase {
            Phase::Defense => (self.defense.line_height - 0.5) * LINE_HEIGHT_SHIFT,
            Phase::Normal | Phase::Attack => 0.0,
        };
        for index in 0..SLOTS {
            let slot = formation.target(index, phase);
            let x = if slot.role.line() == Line::Defense {
                slot.x + line_shift
            } else {
                slot.x
            };
            let target = orient(self.side, x, slot.y);
            let rate = (MOVE_RATE * self.tactic.stats_for(slot.role.line()).speed).min(1.0);
            let player = &mut self.players[index];
            player.role = slot.role;
            player.pos = Point {
                x: player.pos.x + (target.x - player.pos.x) * rate,
                y: player.pos.y + (target.y - player.pos.y) * rate,
            }
            .clamped();
        }
    }
}
