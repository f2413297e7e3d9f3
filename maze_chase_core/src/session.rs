use glam::DVec2;
use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    TileCoord,
    collision::{Circle, circles_touch},
    config::GameConfig,
    direction::Direction,
    dungeon::{Dungeon, MapError, MapLayout, Obstacle},
    monster::{Monster, MonsterMode},
    motion::{Body, DoorState, Mover, move_body},
};

/// Overall phase. `Won` and `Lost` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Playing,
    Won,
    Lost,
}

/// The player-controlled body and its key state.
#[derive(Debug, Clone)]
pub struct Player {
    pub body: Body,
    pub has_key: bool,
    pub alive: bool,
}

/// The key lying on the floor until picked up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key {
    pub coord: TileCoord,
    pub circle: Circle,
}

/// The door guarding the goal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Door {
    pub coord: TileCoord,
    pub state: DoorState,
}

impl Door {
    /// True until the player brings the key.
    pub fn locked(&self) -> bool {
        self.state.locked
    }
}

/// Per-tick movement input, each axis in `-1..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    pub x_dir: i8,
    pub y_dir: i8,
}

impl PlayerInput {
    /// No movement.
    pub const IDLE: PlayerInput = PlayerInput { x_dir: 0, y_dir: 0 };

    /// Creates an input, clamping each axis to `-1..=1`.
    pub fn new(x_dir: i8, y_dir: i8) -> Self {
        PlayerInput {
            x_dir: x_dir.clamp(-1, 1),
            y_dir: y_dir.clamp(-1, 1),
        }
    }

    /// Raw intent vector handed to motion.
    pub fn intent(self) -> DVec2 {
        DVec2::new(
            f64::from(self.x_dir.clamp(-1, 1)),
            f64::from(self.y_dir.clamp(-1, 1)),
        )
    }
}

/// Read-only view of a monster for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonsterView {
    pub position: DVec2,
    pub radius: f64,
    pub facing: Direction,
    pub mode: MonsterMode,
}

/// Everything a renderer needs after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub player: DVec2,
    pub player_radius: f64,
    pub has_key: bool,
    pub monsters: Vec<MonsterView>,
    /// `None` when the map has no door.
    pub door_locked: Option<bool>,
    /// Key position while it is still on the floor.
    pub key: Option<DVec2>,
}

/// One game from map load to win or loss.
///
/// Owns the dungeon, every entity and the random source. Nothing moves once
/// the phase is terminal; start over by building a new session.
#[derive(Debug)]
pub struct GameSession {
    dungeon: Dungeon,
    player: Player,
    monsters: Vec<Monster>,
    obstacles: Vec<Obstacle>,
    key: Option<Key>,
    door: Option<Door>,
    phase: GamePhase,
    rng: StdRng,
    cheating: bool,
    key_collected: bool,
    tick: u64,
}

impl GameSession {
    /// Builds a session from a map layout.
    pub fn new(layout: &MapLayout, config: &GameConfig, mut rng: StdRng) -> Result<Self, MapError> {
        let (dungeon, spawns) = Dungeon::load(layout, config.tile_width)?;
        let player_tile = spawns.player.ok_or(MapError::MissingPlayerSpawn)?;

        let player = Player {
            body: Body::new(
                dungeon.center_of(player_tile),
                config.player.radius,
                config.player.speed,
            ),
            has_key: false,
            alive: true,
        };

        let monsters = spawns
            .monsters
            .iter()
            .map(|&coord| {
                let body = Body::new(
                    dungeon.center_of(coord),
                    config.monster.radius,
                    config.monster.speed,
                );
                let facing = Direction::from_index(rng.random_range(0..4));
                Monster::new(body, facing, config.monster.max_chase_distance)
            })
            .collect::<Vec<_>>();

        let key = spawns.key.map(|coord| Key {
            coord,
            circle: Circle::new(dungeon.center_of(coord), config.key_radius),
        });
        let door = spawns.goal.map(|coord| Door {
            coord,
            state: DoorState { locked: true },
        });
        let obstacles = dungeon.solid_obstacles();

        tracing::info!(
            width = dungeon.width(),
            height = dungeon.height(),
            monsters = monsters.len(),
            has_key = key.is_some(),
            has_door = door.is_some(),
            "game session created"
        );

        Ok(GameSession {
            dungeon,
            player,
            monsters,
            obstacles,
            key,
            door,
            phase: GamePhase::Playing,
            rng,
            cheating: false,
            key_collected: false,
            tick: 0,
        })
    }

    /// Advances the game by one tick and returns the resulting snapshot.
    ///
    /// Order: player moves (door, goal), key pickup, contact check, then each
    /// monster thinks and moves, then a final contact check. Terminal phases
    /// skip the update entirely.
    pub fn tick(&mut self, input: PlayerInput) -> Snapshot {
        if self.is_over() {
            return self.snapshot();
        }
        self.tick += 1;

        self.move_player(input);
        if self.is_over() {
            return self.snapshot();
        }

        self.pick_up_key();
        if self.check_monster_contact() {
            return self.snapshot();
        }

        self.move_monsters();
        self.check_monster_contact();
        self.snapshot()
    }

    fn move_player(&mut self, input: PlayerInput) {
        let mover = Mover::Player {
            has_key: self.player.has_key,
        };
        let outcome = move_body(
            &mut self.player.body,
            input.intent(),
            mover,
            &mut self.obstacles,
            self.door.as_mut().map(|d| &mut d.state),
        );

        if outcome.door_unlocked {
            if let Some(door) = self.door {
                tracing::info!(tick = self.tick, door = ?door.coord, "door unlocked");
            }
        }
        if outcome.reached_goal {
            tracing::info!(tick = self.tick, "player reached the goal");
            self.phase = GamePhase::Won;
        }
    }

    fn pick_up_key(&mut self) {
        if self.player.has_key {
            return;
        }
        let Some(key) = self.key else {
            return;
        };
        if circles_touch(self.player.body.circle(), key.circle) {
            self.key = None;
            self.key_collected = true;
            self.player.has_key = true;
            tracing::info!(tick = self.tick, key = ?key.coord, "key picked up");
        }
    }

    /// Sets `Lost` if any monster touches the player.
    fn check_monster_contact(&mut self) -> bool {
        let player = self.player.body.circle();
        if self
            .monsters
            .iter()
            .any(|m| circles_touch(player, m.body.circle()))
        {
            self.player.alive = false;
            self.phase = GamePhase::Lost;
            tracing::info!(tick = self.tick, "player caught by a monster");
            true
        } else {
            false
        }
    }

    fn move_monsters(&mut self) {
        let player = self.player.body.position;
        for (index, monster) in self.monsters.iter_mut().enumerate() {
            let Some(intent) = monster.think(&self.dungeon, player, &mut self.rng) else {
                tracing::warn!(
                    monster = index,
                    position = ?monster.body.position,
                    "monster found no destination"
                );
                continue;
            };
            move_body(
                &mut monster.body,
                intent,
                Mover::Monster,
                &mut self.obstacles,
                None,
            );
        }
    }

    /// Debug mode: the player walks through walls and holds the key.
    ///
    /// Turning it off restores solidity and keeps the key only if it was
    /// actually picked up.
    pub fn set_cheat(&mut self, enabled: bool) {
        self.cheating = enabled;
        self.player.body.solid = !enabled;
        self.player.has_key = enabled || self.key_collected;
        tracing::info!(enabled, "cheat mode toggled");
    }

    /// Captures the render-facing state without advancing the game.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            phase: self.phase,
            player: self.player.body.position,
            player_radius: self.player.body.radius,
            has_key: self.player.has_key,
            monsters: self
                .monsters
                .iter()
                .map(|m| MonsterView {
                    position: m.body.position,
                    radius: m.body.radius,
                    facing: m.facing,
                    mode: m.mode(),
                })
                .collect(),
            door_locked: self.door.map(|d| d.locked()),
            key: self.key.map(|k| k.circle.center),
        }
    }

    /// True once the game is won or lost.
    pub fn is_over(&self) -> bool {
        self.phase != GamePhase::Playing
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Whether cheat mode is on.
    pub fn is_cheating(&self) -> bool {
        self.cheating
    }

    /// The static tile grid.
    pub fn dungeon(&self) -> &Dungeon {
        &self.dungeon
    }

    /// The player.
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// All monsters in spawn order.
    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    /// Current solid set. The door leaves it once unlocked.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// The key, while it is still on the floor.
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// The goal door, if the map has one.
    pub fn door(&self) -> Option<&Door> {
        self.door.as_ref()
    }
}
