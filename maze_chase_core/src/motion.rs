use glam::DVec2;

use crate::{
    collision::{Aabb, Circle, overlaps, penetration_vector},
    dungeon::{Obstacle, TileKind},
};

/// Upper bound on full passes over the solid set per move.
const MAX_RESOLVE_PASSES: usize = 4;

/// Position and physical properties shared by the player and monsters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: DVec2,
    pub radius: f64,
    /// World units per tick.
    pub speed: f64,
    /// Non-solid bodies pass through obstacles.
    pub solid: bool,
}

impl Body {
    /// Creates a solid body.
    pub fn new(position: DVec2, radius: f64, speed: f64) -> Self {
        Body {
            position,
            radius,
            speed,
            solid: true,
        }
    }

    /// Collision circle at the current position.
    pub fn circle(&self) -> Circle {
        Circle::new(self.position, self.radius)
    }
}

/// Who is moving. Only the player interacts with the door and goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    Player { has_key: bool },
    Monster,
}

/// Side effects of one `move_body` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionOutcome {
    pub door_unlocked: bool,
    pub reached_goal: bool,
    /// Unit pushes applied while resolving collisions.
    pub corrections: usize,
}

/// Lock state of the door guarding the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorState {
    pub locked: bool,
}

/// Rescales `intent` to a vector of length `speed`. The zero vector stays zero.
pub fn scale_intent(intent: DVec2, speed: f64) -> DVec2 {
    let magnitude = intent.length();
    if magnitude == 0.0 || !magnitude.is_finite() {
        DVec2::ZERO
    } else {
        intent * (speed / magnitude)
    }
}

/// Moves `body` one tick along `intent` and resolves collisions against the
/// solid set.
///
/// Obstacles are visited in order. A door the player touches while holding
/// the key is unlocked and dropped from `obstacles`; a goal the player
/// touches once the door is open reports `reached_goal`. Any other contact
/// pushes a solid body out of the obstacle one unit at a time.
pub fn move_body(
    body: &mut Body,
    intent: DVec2,
    mover: Mover,
    obstacles: &mut Vec<Obstacle>,
    mut door: Option<&mut DoorState>,
) -> MotionOutcome {
    let mut trial = body.position + scale_intent(intent, body.speed);
    let mut outcome = MotionOutcome::default();

    for _ in 0..MAX_RESOLVE_PASSES {
        let mut corrected = false;
        let mut i = 0;
        while i < obstacles.len() {
            let obstacle = obstacles[i];
            if !overlaps(Circle::new(trial, body.radius), obstacle.bounds) {
                i += 1;
                continue;
            }

            let door_open = door.as_deref().is_none_or(|d| !d.locked);
            match (obstacle.kind, mover) {
                (TileKind::Door, Mover::Player { has_key: true }) => {
                    if let Some(d) = door.as_deref_mut() {
                        d.locked = false;
                    }
                    obstacles.remove(i);
                    outcome.door_unlocked = true;
                    continue;
                }
                (TileKind::Goal, Mover::Player { .. }) if door_open => {
                    outcome.reached_goal = true;
                }
                _ if body.solid => {
                    let pushes = push_out(&mut trial, body.radius, obstacle.bounds);
                    if pushes > 0 {
                        corrected = true;
                        outcome.corrections += pushes;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        if !corrected {
            break;
        }
    }

    body.position = trial;
    outcome
}

/// Applies unit pushes until the circle clears `bounds`. Returns the number
/// of pushes applied.
fn push_out(center: &mut DVec2, radius: f64, bounds: Aabb) -> usize {
    // Each push moves the circle one unit; no overlap is deeper than this.
    let cap = (2.0 * (bounds.half.x + bounds.half.y + radius)).ceil() as usize + 1;
    let mut pushes = 0;
    while let Some(push) = penetration_vector(Circle::new(*center, radius), bounds) {
        *center += push;
        pushes += 1;
        if pushes >= cap {
            tracing::warn!(?center, ?bounds, pushes, "collision push cap reached");
            break;
        }
    }
    pushes
}
