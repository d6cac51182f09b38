//! Per-monster decision step.
//!
//! `monster_turn` both ticks the monster's own counters (frozen, sleeping,
//! confused, scared) and picks its action for the turn; the two are coupled
//! because a counter that is active consumes the monster's turn.

use std::collections::HashSet;

use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::DistanceAlg;
use tracing::debug;

use crate::{
    ecs::{
        components::{MonsterAbilities, MonsterStatus},
        resources::MovementContext,
    },
    rng::GameRng,
};

pub const ORTHOGONAL: [Point; 4] = [
    Point { x: -1, y: 0 },
    Point { x: 1, y: 0 },
    Point { x: 0, y: -1 },
    Point { x: 0, y: 1 },
];

pub const EIGHT_WAY: [Point; 8] = [
    Point { x: -1, y: 0 },
    Point { x: 1, y: 0 },
    Point { x: 0, y: -1 },
    Point { x: 0, y: 1 },
    Point { x: -1, y: -1 },
    Point { x: 1, y: -1 },
    Point { x: -1, y: 1 },
    Point { x: 1, y: 1 },
];

pub fn manhattan(a: Point, b: Point) -> i32 {
    DistanceAlg::Manhattan.distance2d(a, b) as i32
}

pub fn chebyshev(a: Point, b: Point) -> i32 {
    DistanceAlg::Chebyshev.distance2d(a, b) as i32
}

/// What a monster can see of the floor around it this turn.
pub struct Surroundings<'a> {
    pub map: &'a MovementContext,
    pub player: Point,
    /// Tiles held by living monsters and merchants.
    pub occupied: &'a HashSet<Point>,
}

impl Surroundings<'_> {
    pub fn is_open(&self, point: Point, can_fly: bool) -> bool {
        self.map.is_passable(point, can_fly)
            && point != self.player
            && !self.occupied.contains(&point)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonsterAction {
    Idle,
    Step(Point),
    Attack,
    Steal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonsterTurn {
    pub woke: bool,
    pub action: MonsterAction,
}

impl MonsterTurn {
    fn idle() -> Self {
        Self {
            woke: false,
            action: MonsterAction::Idle,
        }
    }
}

pub fn monster_turn(
    position: Point,
    abilities: &MonsterAbilities,
    status: &mut MonsterStatus,
    around: &Surroundings,
    rng: &mut GameRng,
) -> MonsterTurn {
    if status.frozen > 0 {
        status.frozen -= 1;
        return MonsterTurn::idle();
    }

    let mut woke = false;
    if status.sleeping > 0 {
        status.sleeping -= 1;
        if manhattan(position, around.player) <= 1 && rng.coin() {
            status.sleeping = 0;
            woke = true;
        } else {
            return MonsterTurn::idle();
        }
    }

    let act = |action| MonsterTurn { woke, action };

    if abilities.is_mean && !status.enraged && status.aggravated == 0 && rng.percent(10) {
        return act(MonsterAction::Idle);
    }

    let dx = (around.player.x - position.x).signum();
    let dy = (around.player.y - position.y).signum();

    if status.confused > 0 {
        status.confused -= 1;
        let Some(dir) = rng.pick(&ORTHOGONAL).copied() else {
            return act(MonsterAction::Idle);
        };
        let target = position + dir;
        if around.is_open(target, abilities.can_fly) {
            return act(MonsterAction::Step(target));
        }
        return act(MonsterAction::Idle);
    }

    if status.scared > 0 {
        status.scared -= 1;
        let target = Point::new(position.x - dx, position.y - dy);
        if target != position && around.is_open(target, abilities.can_fly) {
            return act(MonsterAction::Step(target));
        }
        return act(MonsterAction::Idle);
    }

    if chebyshev(position, around.player) <= 1 {
        return act(MonsterAction::Attack);
    }

    let horizontal = Point::new(position.x + dx, position.y);
    let vertical = Point::new(position.x, position.y + dy);
    let candidates = if rng.coin() {
        [(dx != 0, horizontal), (dy != 0, vertical)]
    } else {
        [(dy != 0, vertical), (dx != 0, horizontal)]
    };
    let next = candidates
        .into_iter()
        .find(|(moves, target)| *moves && around.is_open(*target, abilities.can_fly))
        .map(|(_, target)| target)
        .unwrap_or(position);

    if abilities.thief.is_some() && chebyshev(next, around.player) <= 1 && rng.percent(30) {
        debug!(x = position.x, y = position.y, "thief goes for the pack");
        return act(MonsterAction::Steal);
    }

    if next == position {
        act(MonsterAction::Idle)
    } else {
        act(MonsterAction::Step(next))
    }
}

/// First neighbouring tile that puts more distance between a thief and the player.
pub fn flee_step(position: Point, can_fly: bool, around: &Surroundings) -> Option<Point> {
    let current = manhattan(position, around.player);
    EIGHT_WAY
        .iter()
        .map(|dir| position + *dir)
        .find(|target| {
            around.is_open(*target, can_fly) && manhattan(*target, around.player) > current
        })
}
