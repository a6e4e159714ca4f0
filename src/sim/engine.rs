//! Stochastic 2D match simulation.
//!
//! Each step: the side in possession moves towards its attacking shape, the other side
//! towards its defending shape, then the ball carrier picks one action and it is resolved.

use rand::Rng;

use crate::catalog::{AttackArea, BuildUp, Phase, StatLine, Tactic};
use crate::sim::pitch::{Point, Team};
use crate::sim::{MatchResult, Side, Winner};

pub const MATCH_STEPS: u32 = 200;

const SHOT_RANGE: f64 = 0.3;
const SHOT_LANE: (f64, f64) = (0.25, 0.75);
const SHOT_CONVERSION: f64 = 0.45;
const BLOCK_WEIGHT: f64 = 0.6;
const SHOT_TURNOVER: f64 = 0.6;

const WING_MARGIN: f64 = 0.25;
const CROSS_RANGE: f64 = 0.4;
const CROSS_BASE_ACCURACY: f64 = 0.55;
const HEADER_TURNOVER: f64 = 0.5;

const THROUGH_BALL_RANGE: f64 = 0.5;
const THROUGH_BALL_BASE_ACCURACY: f64 = 0.5;
const HIGH_LINE: f64 = 0.6;
const BREAKAWAY_CHANCE: f64 = 0.3;
const BREAKAWAY_CONVERSION: f64 = 0.35;

const PASS_BASE_ACCURACY: f64 = 0.7;
const PASS_DISTANCE_PENALTY: f64 = 0.3;
const PASS_OPTIONS: usize = 3;
const TECHNIQUE_WEIGHT: f64 = 0.2;

const PRESSURE_RADIUS: f64 = 0.1;
const DRIBBLE_STEP: f64 = 0.03;
const TACKLE_RADIUS: f64 = 0.08;
/// Bounds on attacker/defender skill ratios in one-on-one duels.
const DUEL_RANGE: (f64, f64) = (0.5, 1.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Shoot,
    Cross,
    ThroughBall,
    Pass,
    Dribble,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    goals: u32,
    shots: u32,
    crosses: u32,
    through_balls: u32,
    possession_steps: u32,
}

fn technique_edge(stats: StatLine) -> f64 {
    (stats.technique - 1.0) * TECHNIQUE_WEIGHT
}

fn duel(attacker: f64, defender: f64) -> f64 {
    (attacker / defender).clamp(DUEL_RANGE.0, DUEL_RANGE.1)
}

fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    rng.random::<f64>() < chance
}

struct Pitch<'t> {
    home: Team<'t>,
    away: Team<'t>,
    ball: Point,
    possession: Side,
    tally: [Tally; 2],
}

impl<'t> Pitch<'t> {
    fn new(home: &'t Tactic, away: &'t Tactic) -> Self {
        Self {
            home: Team::new(home, Side::Home),
            away: Team::new(away, Side::Away),
            ball: Point::CENTER,
            possession: Side::Home,
            tally: [Tally::default(); 2],
        }
    }

    fn team(&self, side: Side) -> &Team<'t> {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    fn team_mut(&mut self, side: Side) -> &mut Team<'t> {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    fn tally_mut(&mut self, side: Side) -> &mut Tally {
        match side {
            Side::Home => &mut self.tally[0],
            Side::Away => &mut self.tally[1],
        }
    }

    fn attackers(&self) -> &Team<'t> {
        self.team(self.possession)
    }

    fn defenders(&self) -> &Team<'t> {
        self.team(self.possession.opponent())
    }

    fn turnover(&mut self) {
        self.possession = self.possession.opponent();
    }

    fn goal(&mut self) {
        let side = self.possession;
        self.tally_mut(side).goals += 1;
        self.ball = Point::CENTER;
        self.turnover();
    }

    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let side = self.possession;
        self.tally_mut(side).possession_steps += 1;
        self.team_mut(side).reposition(Phase::Attack);
        self.team_mut(side.opponent()).reposition(Phase::Defense);

        let carrier = self.attackers().nearest_outfield(self.ball);
        self.ball = self.attackers().pos(carrier);
        match self.decide(carrier, rng) {
            Action::Shoot => self.shoot(carrier, rng),
            Action::Cross => self.cross(carrier, rng),
            Action::ThroughBall => self.through_ball(carrier, rng),
            Action::Pass => self.pass(carrier, rng),
            Action::Dribble => self.dribble(carrier, rng),
        }
    }

    fn decide<R: Rng + ?Sized>(&self, carrier: usize, rng: &mut R) -> Action {
        let atk = self.attackers();
        let style = atk.attack;
        let pos = atk.pos(carrier);
        let to_goal = atk.distance_to_goal(pos);

        let in_lane = pos.y > SHOT_LANE.0 && pos.y < SHOT_LANE.1;
        if to_goal < SHOT_RANGE && in_lane && roll(rng, style.shot_frequency) {
            return Action::Shoot;
        }
        let on_wing = pos.y < WING_MARGIN || pos.y > 1.0 - WING_MARGIN;
        if on_wing && to_goal < CROSS_RANGE && roll(rng, style.cross_frequency * 0.5) {
            return Action::Cross;
        }
        if to_goal < THROUGH_BALL_RANGE && roll(rng, style.through_ball_frequency * 0.3) {
            return Action::ThroughBall;
        }

        let def = self.defenders();
        let marker = def.nearest_outfield(pos);
        let r: f64 = rng.random();
        if def.pos(marker).distance(pos) < PRESSURE_RADIUS {
            return if r < 1.0 - style.dribble_frequency {
                Action::Pass
            } else {
                Action::Dribble
            };
        }
        if style.counter_speed > 0.7 && r < 0.35 {
            return Action::Dribble;
        }
        if r < style.dribble_frequency * 0.4 {
            return Action::Dribble;
        }
        Action::Pass
    }

    /// Defending side tries to win a loose ball at `at`.
    fn contest<R: Rng + ?Sized>(&mut self, at: Point, rng: &mut R) {
        let def = self.defenders();
        let interceptor = def.nearest_outfield(at);
        let chance = def.defense.interception_rate
            * (0.8 + def.defense.cover_range * 0.2)
            * def.stats(interceptor).defense;
        if roll(rng, chance) {
            self.ball = def.pos(interceptor);
            self.turnover();
        }
    }

    fn shoot<R: Rng + ?Sized>(&mut self, carrier: usize, rng: &mut R) {
        let side = self.possession;
        self.tally_mut(side).shots += 1;

        let atk = self.attackers();
        let def = self.defenders();
        let pos = atk.pos(carrier);
        let to_goal = atk.distance_to_goal(pos);
        let on_target = ((1.0 - to_goal * 1.5).max(0.0)
            * SHOT_CONVERSION
            * atk.stats(carrier).shooting())
        .clamp(0.0, 1.0);
        let blocker = def.nearest_outfield(pos);
        let block = (def.defense.block_rate
            * (1.0 - to_goal * 0.5)
            * (0.7 + def.defense.compactness * 0.3)
            * BLOCK_WEIGHT
            * def.stats(blocker).stopping())
        .clamp(0.0, 1.0);

        let scored = roll(rng, on_target);
        let blocked = roll(rng, block);
        if scored && !blocked {
            self.goal();
        } else if roll(rng, SHOT_TURNOVER) {
            self.turnover();
        }
    }

    /// One of the best few teammates: widest when attacking wide, else closest to goal.
    fn pass_target<R: Rng + ?Sized>(&self, carrier: usize, rng: &mut R) -> Option<usize> {
        let atk = self.attackers();
        let score = |index: usize| {
            let pos = atk.pos(index);
            match atk.attack.attack_area {
                AttackArea::Wide => -(pos.y - 0.5).abs(),
                AttackArea::Central | AttackArea::Balanced => atk.distance_to_goal(pos),
            }
        };
        let mut options: Vec<usize> = atk.outfield().filter(|&i| i != carrier).collect();
        options.sort_by(|&a, &b| score(a).total_cmp(&score(b)));
        options.truncate(PASS_OPTIONS);
        if options.is_empty() {
            return None;
        }
        Some(options[rng.random_range(0..options.len())])
    }

    fn pass<R: Rng + ?Sized>(&mut self, carrier: usize, rng: &mut R) {
        let Some(target) = self.pass_target(carrier, rng) else {
            return;
        };
        let atk = self.attackers();
        let from = atk.pos(carrier);
        let to = atk.pos(target);
        let build_up = match atk.attack.build_up {
            BuildUp::Short => 0.05,
            BuildUp::Long => -0.05,
            BuildUp::Side => 0.0,
        };
        let accuracy = PASS_BASE_ACCURACY + atk.attack.pass_accuracy_bonus
            - from.distance(to) * PASS_DISTANCE_PENALTY
            + technique_edge(atk.stats(carrier))
            + build_up;
        if roll(rng, accuracy) {
            self.ball = to;
        } else {
            self.contest(from.midpoint(to), rng);
        }
    }

    fn cross<R: Rng + ?Sized>(&mut self, carrier: usize, rng: &mut R) {
        let side = self.possession;
        self.tally_mut(side).crosses += 1;
        let Some(target) = self.attackers().most_advanced(carrier) else {
            return;
        };

        let atk = self.attackers();
        let def = self.defenders();
        let from = atk.pos(carrier);
        let to = atk.pos(target);
        let accuracy =
            CROSS_BASE_ACCURACY + atk.attack.pass_accuracy_bonus * 0.3 + technique_edge(atk.stats(carrier));
        if !roll(rng, accuracy) {
            self.contest(from.midpoint(to), rng);
            return;
        }

        let marker = def.nearest_outfield(to);
        let header = (0.25 + atk.attack.cross_frequency * 0.15)
            * duel(atk.stats(target).power, def.stats(marker).stopping());
        let block = def.defense.block_rate * def.defense.compactness * BLOCK_WEIGHT;
        self.ball = to;
        self.tally_mut(side).shots += 1;

        let scored = roll(rng, header);
        let blocked = roll(rng, block);
        if scored && !blocked {
            self.goal();
        } else if roll(rng, HEADER_TURNOVER) {
            self.turnover();
        }
    }

    fn through_ball<R: Rng + ?Sized>(&mut self, carrier: usize, rng: &mut R) {
        let side = self.possession;
        self.tally_mut(side).through_balls += 1;
        let Some(target) = self.attackers().most_advanced(carrier) else {
            return;
        };

        let atk = self.attackers();
        let from = atk.pos(carrier);
        let to = atk.pos(target);
        let accuracy = THROUGH_BALL_BASE_ACCURACY + atk.attack.pass_accuracy_bonus * 0.5
            - from.distance(to) * 0.4
            + technique_edge(atk.stats(carrier));
        if !roll(rng, accuracy) {
            self.contest(from.midpoint(to), rng);
            return;
        }
        self.ball = to;

        // A high line leaves space in behind for the runner.
        if self.defenders().defense.line_height > HIGH_LINE && roll(rng, BREAKAWAY_CHANCE) {
            let finish = (BREAKAWAY_CONVERSION * self.attackers().stats(target).shooting()).clamp(0.0, 1.0);
            self.tally_mut(side).shots += 1;
            if roll(rng, finish) {
                self.goal();
            }
        }
    }

    fn dribble<R: Rng + ?Sized>(&mut self, carrier: usize, rng: &mut R) {
        let side = self.possession;
        let atk = self.attackers();
        let stats = atk.stats(carrier);
        let pos = atk.pos(carrier);
        let drift = match atk.attack.attack_area {
            AttackArea::Wide if pos.y < 0.5 => -DRIBBLE_STEP,
            AttackArea::Wide => DRIBBLE_STEP,
            AttackArea::Central | AttackArea::Balanced => (rng.random::<f64>() - 0.5) * 0.04,
        };
        let moved = Point {
            x: pos.x + atk.direction() * DRIBBLE_STEP * stats.speed,
            y: pos.y + drift,
        }
        .clamped();
        self.team_mut(side).players[carrier].pos = moved;
        self.ball = moved;

        let def = self.defenders();
        let tackler = def.nearest_outfield(moved);
        let reach = TACKLE_RADIUS + def.defense.cover_range * 0.03;
        if def.pos(tackler).distance(moved) >= reach {
            return;
        }
        let chance = (def.defense.tackle_success
            * (0.7 + def.defense.press_intensity * 0.3)
            * duel(def.stats(tackler).stopping(), stats.carrying()))
        .clamp(0.0, 1.0);
        if roll(rng, chance) {
            self.ball = def.pos(tackler);
            self.turnover();
        }
    }

    fn into_result(self) -> MatchResult {
        let [home, away] = self.tally;
        let total = f64::from(home.possession_steps + away.possession_steps).max(1.0);
        MatchResult {
            home_goals: home.goals,
            away_goals: away.goals,
            home_possession: f64::from(home.possession_steps) / total,
            away_possession: f64::from(away.possession_steps) / total,
            home_shots: home.shots,
            away_shots: away.shots,
            home_crosses: home.crosses,
            away_crosses: away.crosses,
            home_through_balls: home.through_balls,
            away_through_balls: away.through_balls,
            winner: Winner::from_goals(home.goals, away.goals),
        }
    }
}

/// Plays one match using the thread-local generator.
pub fn simulate_match(home: &Tactic, away: &Tactic) -> MatchResult {
    simulate_match_with(home, away, &mut rand::rng())
}

/// Plays one match drawing every random decision from `rng`.
pub fn simulate_match_with<R: Rng + ?Sized>(home: &Tactic, away: &Tactic, rng: &mut R) -> MatchResult {
    let mut pitch = Pitch::new(home, away);
    for _ in 0..MATCH_STEPS {
        pitch.step(rng);
    }
    pitch.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TacticSpace;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn pair(seed: u64) -> (Tactic, Tactic) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let space = TacticSpace::full();
        (space.random(&mut rng), space.random(&mut rng))
    }

    #[test]
    fn same_seed_same_match() {
        let (home, away) = pair(5);
        let a = simulate_match_with(&home, &away, &mut SmallRng::seed_from_u64(42));
        let b = simulate_match_with(&home, &away, &mut SmallRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn possession_splits_the_match_and_goals_need_shots() {
        for seed in 0..40 {
            let (home, away) = pair(seed);
            let result = simulate_match_with(&home, &away, &mut SmallRng::seed_from_u64(seed));
            assert!((result.home_possession + result.away_possession - 1.0).abs() < 1e-9);
            assert!(result.home_goals <= result.home_shots);
            assert!(result.away_goals <= result.away_shots);
            assert_eq!(result.winner, Winner::from_goals(result.home_goals, result.away_goals));
        }
    }

    #[test]
    fn ball_ends_each_step_on_a_player_or_the_centre_spot() {
        let (home, away) = pair(21);
        let mut pitch = Pitch::new(&home, &away);
        let mut rng = SmallRng::seed_from_u64(21);
        for step in 0..MATCH_STEPS {
            pitch.step(&mut rng);
            let ball = pitch.ball;
            let on_player = pitch
                .home
                .players
                .iter()
                .chain(pitch.away.players.iter())
                .any(|player| player.pos == ball);
            assert!(
                on_player || ball == Point::CENTER,
                "ball detached at step {step}: {ball:?}"
            );
        }
    }

    #[test]
    fn decide_only_shoots_inside_range() {
        let (home, away) = pair(9);
        let pitch = Pitch::new(&home, &away);
        let mut rng = SmallRng::seed_from_u64(1);
        // Kick-off: every outfield player is far from the opposing goal.
        let carrier = pitch.attackers().nearest_outfield(pitch.ball);
        for _ in 0..500 {
            assert_ne!(pitch.decide(carrier, &mut rng), Action::Shoot);
        }
    }
}
