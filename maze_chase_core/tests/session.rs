use glam::DVec2;
use maze_chase_core::{
    TileCoord,
    collision::overlaps,
    config::{GameConfig, MazeConfig},
    dungeon::{MapLayout, TileKind},
    game::{FixedMap, Game, GameError},
    maze,
    monster::MonsterMode,
    session::{GamePhase, GameSession, PlayerInput, Snapshot},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn session(map: &str) -> GameSession {
    let layout = MapLayout::parse(map).unwrap();
    GameSession::new(&layout, &GameConfig::default(), StdRng::seed_from_u64(1)).unwrap()
}

fn run(session: &mut GameSession, input: PlayerInput, ticks: usize) -> Snapshot {
    let mut last = session.snapshot();
    for _ in 0..ticks {
        last = session.tick(input);
    }
    last
}

const WEST: PlayerInput = PlayerInput { x_dir: -1, y_dir: 0 };
const EAST: PlayerInput = PlayerInput { x_dir: 1, y_dir: 0 };

/// Key to the west of the player, goal door to the east.
const KEY_BEHIND: &str = "
    1 1 1 1 1 1 1
    1 9 0 2 0 8 1
    1 1 1 1 1 1 1
";

#[test]
fn locked_door_blocks_the_goal() {
    let mut s = session(KEY_BEHIND);
    let snap = run(&mut s, EAST, 100);
    assert_eq!(snap.phase, GamePhase::Playing);
    assert_eq!(snap.door_locked, Some(true));
    // Door face at x = 900, player radius 25.
    assert!(snap.player.x <= 875.0);
    assert!(snap.player.x > 865.0);
    assert_eq!(snap.player.y, 200.0);
}

#[test]
fn key_door_goal_sequence() {
    let mut s = session(KEY_BEHIND);
    run(&mut s, EAST, 60);

    let mut pickups = 0;
    let mut had_key = false;
    for _ in 0..120 {
        let snap = s.tick(WEST);
        if snap.has_key && !had_key {
            pickups += 1;
            assert_eq!(snap.key, None);
        }
        had_key = snap.has_key;
    }
    assert_eq!(pickups, 1);
    assert!(s.key().is_none());

    let mut unlocks = 0;
    let mut was_locked = true;
    let mut snap = s.snapshot();
    for _ in 0..200 {
        snap = s.tick(EAST);
        let locked = snap.door_locked.unwrap();
        if was_locked && !locked {
            unlocks += 1;
        }
        was_locked = locked;
        if snap.phase == GamePhase::Won {
            break;
        }
    }
    assert_eq!(unlocks, 1);
    assert_eq!(snap.phase, GamePhase::Won);
    assert!(
        !s.obstacles()
            .iter()
            .any(|o| o.kind == TileKind::Door)
    );
}

#[test]
fn won_game_is_frozen() {
    let mut s = session(KEY_BEHIND);
    run(&mut s, WEST, 40);
    let won = run(&mut s, EAST, 200);
    assert_eq!(won.phase, GamePhase::Won);

    for input in [WEST, EAST, PlayerInput::new(0, 1)] {
        let again = s.tick(input);
        assert_eq!(again, won);
    }
}

/// Border walls with the monster spawn cut into the top wall.
const OPEN_ROOM: &str = "
    1 1 3 1 1
    1 0 0 0 1
    1 0 2 0 1
    1 0 0 0 1
    1 1 1 1 1
";

#[test]
fn monster_chases_player_straight_down() {
    let mut s = session(OPEN_ROOM);
    let player = s.player().body.position;
    assert_eq!(player, DVec2::new(400.0, 400.0));

    let mut probe = s.monsters()[0].clone();
    let start = probe.body.position;
    assert_eq!(start, DVec2::new(400.0, 0.0));
    let intent = probe
        .think(s.dungeon(), player, &mut StdRng::seed_from_u64(0))
        .unwrap();
    assert_eq!(intent, player - start);
    assert_eq!(probe.mode(), MonsterMode::Chasing);

    let snap = s.tick(PlayerInput::IDLE);
    assert_eq!(snap.monsters[0].mode, MonsterMode::Chasing);
    assert!(
        snap.monsters[0]
            .position
            .abs_diff_eq(DVec2::new(400.0, 7.0), 1e-9)
    );
}

#[test]
fn monster_contact_loses_and_freezes() {
    let mut s = session(OPEN_ROOM);
    let mut lost_at = None;
    for tick in 1..=80 {
        let snap = s.tick(PlayerInput::IDLE);
        if snap.phase == GamePhase::Lost {
            lost_at = Some(tick);
            break;
        }
        assert_eq!(snap.monsters[0].position.x, 400.0);
    }
    // Gap of 400 closes at 7 per tick until within 55.
    assert_eq!(lost_at, Some(50));
    assert!(!s.player().alive);

    let frozen = s.snapshot();
    for _ in 0..10 {
        assert_eq!(s.tick(EAST), frozen);
    }
}

#[test]
fn cheat_walks_through_walls_and_carries_a_key() {
    let mut s = session(KEY_BEHIND);
    s.set_cheat(true);
    assert!(s.player().has_key);
    let snap = run(&mut s, PlayerInput::new(0, -1), 30);
    assert!(snap.player.y < 0.0);

    s.set_cheat(false);
    assert!(s.player().body.solid);
    assert!(!s.player().has_key);
}

#[test]
fn generated_maze_keeps_player_out_of_walls() {
    let config = GameConfig {
        maze: MazeConfig {
            width: 6,
            height: 6,
            monsters: 0,
        },
        ..GameConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(99);
    let layout = maze::generate(&config.maze, &mut rng).unwrap();
    let mut s = GameSession::new(&layout, &config, StdRng::seed_from_u64(3)).unwrap();

    let mut input = PlayerInput::IDLE;
    for tick in 0..3000 {
        if tick % 25 == 0 {
            input = PlayerInput::new(rng.random_range(-1..=1), rng.random_range(-1..=1));
        }
        s.tick(input);
        if s.is_over() {
            break;
        }
        let circle = s.player().body.circle();
        for obstacle in s.obstacles() {
            if obstacle.kind == TileKind::Wall {
                assert!(
                    !overlaps(circle, obstacle.bounds),
                    "tick {tick}: {circle:?} inside wall {:?}",
                    obstacle.coord
                );
            }
        }
    }
}

#[test]
fn monsters_never_leave_the_floor() {
    let config = GameConfig {
        maze: MazeConfig {
            width: 5,
            height: 5,
            monsters: 4,
        },
        ..GameConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(17);
    let layout = maze::generate(&config.maze, &mut rng).unwrap();
    let mut s = GameSession::new(&layout, &config, StdRng::seed_from_u64(4)).unwrap();

    for _ in 0..1500 {
        s.tick(PlayerInput::IDLE);
        if s.is_over() {
            break;
        }
        for monster in s.monsters() {
            let circle = monster.body.circle();
            for obstacle in s.obstacles() {
                assert!(!overlaps(circle, obstacle.bounds));
            }
        }
    }
}

#[test]
fn snapshot_serializes_for_renderers() {
    let s = session(OPEN_ROOM);
    let json = serde_json::to_value(s.snapshot()).unwrap();
    assert_eq!(json["phase"], "Playing");
    assert_eq!(json["monsters"].as_array().unwrap().len(), 1);
    assert_eq!(json["door_locked"], serde_json::Value::Null);
    assert_eq!(s.dungeon().tile(TileCoord::new(2, 0)).kind, TileKind::Floor);
}

/// Player boxed in by a single wall column to the east.
const THIN_WALL: &str = "
    1 1 1 1 1
    1 2 1 0 1
    1 1 1 1 1
";

#[test]
fn fastest_allowed_player_cannot_cross_a_wall() {
    let mut config = GameConfig::default();
    config.player.speed = config.player.radius - 1.0;
    config.validate().unwrap();

    let layout = MapLayout::parse(THIN_WALL).unwrap();
    let mut s = GameSession::new(&layout, &config, StdRng::seed_from_u64(1)).unwrap();
    let snap = run(&mut s, EAST, 20);
    assert!(snap.player.x < 274.5, "{:?}", snap.player);
    for obstacle in s.obstacles() {
        assert!(!overlaps(s.player().body.circle(), obstacle.bounds));
    }
}

#[test]
fn tunnelling_speed_is_rejected() {
    let mut config = GameConfig::default();
    config.player.speed = 150.0;
    let layout = MapLayout::parse(THIN_WALL).unwrap();
    assert!(matches!(
        Game::new(config, Box::new(FixedMap(layout))),
        Err(GameError::Config(_))
    ));
}
