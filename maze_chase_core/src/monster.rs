use std::collections::{HashMap, HashSet, VecDeque};

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    TileCoord,
    direction::Direction,
    dungeon::{Dungeon, Tile},
    motion::Body,
};

/// What a monster is doing this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MonsterMode {
    /// No waypoint yet.
    #[default]
    Wandering,
    /// Player in direct line of sight.
    Chasing,
    /// Following a path found by the pursuit search.
    ChasingByPath,
    /// Walking to a randomly chosen neighbouring tile.
    WanderingWithPath,
}

/// A monster and its pursuit state.
#[derive(Debug, Clone)]
pub struct Monster {
    pub body: Body,
    pub facing: Direction,
    /// Set once the player has been seen; enables the pursuit search.
    pub chasing_player: bool,
    /// Pending waypoints, consumed front to back.
    pub path: VecDeque<TileCoord>,
    pub max_chase_distance: usize,
    mode: MonsterMode,
}

impl Monster {
    /// Creates a wandering monster that has not yet seen the player.
    pub fn new(body: Body, facing: Direction, max_chase_distance: usize) -> Self {
        Monster {
            body,
            facing,
            chasing_player: false,
            path: VecDeque::new(),
            max_chase_distance,
            mode: MonsterMode::Wandering,
        }
    }

    /// Mode chosen by the last [`Monster::think`].
    pub fn mode(&self) -> MonsterMode {
        self.mode
    }

    fn tile_indices(&self, dungeon: &Dungeon) -> (isize, isize) {
        dungeon.indices_of(self.body.position)
    }

    /// Cardinal line of sight to `player`.
    ///
    /// Checks the monster's own tile first, then walks each direction one
    /// tile at a time while the tiles are floor.
    pub fn sees_player(&self, dungeon: &Dungeon, player: DVec2) -> bool {
        let (col, row) = self.tile_indices(dungeon);
        if let Some(own) = dungeon.tile_at(col, row) {
            if dungeon.tile_bounds(own.coord).contains_point(player) {
                return true;
            }
        }

        for dir in Direction::ALL {
            let (mut c, mut r) = (col, row);
            loop {
                (c, r) = dir.adjacent(c, r);
                let Some(tile) = dungeon.tile_at(c, r).filter(Tile::is_floor) else {
                    break;
                };
                if dungeon.tile_bounds(tile.coord).contains_point(player) {
                    return true;
                }
            }
        }
        false
    }

    /// Bounded breadth-first search for the player through floor tiles.
    ///
    /// Returns the tiles from the first step to the tile containing the
    /// player, excluding the monster's own tile, or `None` if the player is
    /// not within `max_chase_distance` steps.
    pub fn find_path_to_player(&self, dungeon: &Dungeon, player: DVec2) -> Option<Vec<TileCoord>> {
        let (col, row) = self.tile_indices(dungeon);
        let start = dungeon.tile_at(col, row)?.coord;

        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut visited = HashSet::from([start]);
        let mut came_from: HashMap<TileCoord, TileCoord> = HashMap::new();

        while let Some((current, distance)) = queue.pop_front() {
            if distance >= self.max_chase_distance {
                continue;
            }
            let (c, r) = current.signed();
            for dir in Direction::ALL {
                let (nc, nr) = dir.adjacent(c, r);
                let Some(tile) = dungeon.tile_at(nc, nr).filter(Tile::is_floor) else {
                    continue;
                };
                if !visited.insert(tile.coord) {
                    continue;
                }
                came_from.insert(tile.coord, current);

                if dungeon.tile_bounds(tile.coord).contains_point(player) {
                    let mut path = vec![tile.coord];
                    let mut step = tile.coord;
                    while let Some(&parent) = came_from.get(&step) {
                        if parent == start {
                            break;
                        }
                        path.push(parent);
                        step = parent;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back((tile.coord, distance + 1));
            }
        }
        None
    }

    /// Picks the next single-tile waypoint for wandering.
    ///
    /// Left, ahead and right of `facing` are drawn at random without
    /// replacement and the first floor tile wins. If none is floor, the tile
    /// behind is taken whatever its kind, provided it exists.
    pub fn choose_wander_tile<R: Rng + ?Sized>(
        &mut self,
        dungeon: &Dungeon,
        rng: &mut R,
    ) -> Option<TileCoord> {
        let (col, row) = self.tile_indices(dungeon);
        let mut candidates = vec![self.facing.left(), self.facing, self.facing.right()];

        while !candidates.is_empty() {
            let dir = candidates.swap_remove(rng.random_range(0..candidates.len()));
            let (c, r) = dir.adjacent(col, row);
            if let Some(tile) = dungeon.tile_at(c, r).filter(Tile::is_floor) {
                self.facing = dir;
                return Some(tile.coord);
            }
        }

        let back = self.facing.back();
        let (c, r) = back.adjacent(col, row);
        let tile = dungeon.tile_at(c, r)?;
        self.facing = back;
        Some(tile.coord)
    }

    /// One decision step. Returns the raw intent vector for this tick, or
    /// `None` when no destination could be found.
    pub fn think<R: Rng + ?Sized>(
        &mut self,
        dungeon: &Dungeon,
        player: DVec2,
        rng: &mut R,
    ) -> Option<DVec2> {
        if self.sees_player(dungeon, player) {
            if self.mode != MonsterMode::Chasing {
                tracing::debug!(position = ?self.body.position, "monster sighted player");
            }
            self.mode = MonsterMode::Chasing;
            self.chasing_player = true;
            self.path.clear();
            let intent = player - self.body.position;
            if let Some(dir) = Direction::from_vector(intent) {
                self.facing = dir;
            }
            return Some(intent);
        }

        if self.chasing_player {
            match self.find_path_to_player(dungeon, player) {
                Some(path) => {
                    tracing::debug!(steps = path.len(), "pursuit path found");
                    self.path = path.into();
                    self.mode = MonsterMode::ChasingByPath;
                }
                None if self.mode == MonsterMode::Chasing => {
                    tracing::debug!("lost sight of player, no path within range");
                    self.mode = MonsterMode::Wandering;
                }
                None => {}
            }
        }

        if let Some(&next) = self.path.front() {
            if dungeon.tile_bounds(next).contains_circle(self.body.circle()) {
                self.path.pop_front();
            }
        }

        if self.path.is_empty() {
            let tile = self.choose_wander_tile(dungeon, rng)?;
            self.path.push_back(tile);
            self.mode = MonsterMode::WanderingWithPath;
        } else if self.mode == MonsterMode::ChasingByPath {
            let here = self.tile_indices(dungeon);
            if let Some(&next) = self.path.front() {
                let (nc, nr) = next.signed();
                let step = DVec2::new((nc - here.0) as f64, (nr - here.1) as f64);
                if let Some(dir) = Direction::from_vector(step) {
                    self.facing = dir;
                }
            }
        }

        let target = self.path.front().map(|&coord| dungeon.center_of(coord))?;
        Some(target - self.body.position)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::dungeon::MapLayout;

    fn dungeon(map: &str) -> Dungeon {
        let layout = MapLayout::parse(map).unwrap();
        Dungeon::load(&layout, 200.0).unwrap().0
    }

    fn monster_at(d: &Dungeon, col: usize, row: usize, facing: Direction) -> Monster {
        let body = Body::new(d.center_of(TileCoord::new(col, row)), 30.0, 7.0);
        Monster::new(body, facing, 5)
    }

    const CORRIDOR: &str = "
        1 1 1 1 1 1 1
        1 3 0 0 0 2 1
        1 1 1 1 1 1 1
    ";

    #[test]
    fn sees_player_down_a_clear_corridor() {
        let d = dungeon(CORRIDOR);
        let m = monster_at(&d, 1, 1, Direction::North);
        assert!(m.sees_player(&d, d.center_of(TileCoord::new(5, 1))));
    }

    #[test]
    fn wall_blocks_sight() {
        let d = dungeon(
            "
            1 1 1 1 1 1 1
            1 3 0 1 0 2 1
            1 1 1 1 1 1 1
            ",
        );
        let m = monster_at(&d, 1, 1, Direction::North);
        assert!(!m.sees_player(&d, d.center_of(TileCoord::new(5, 1))));
    }

    #[test]
    fn sight_is_cardinal_only() {
        let d = dungeon(
            "
            1 1 1 1 1
            1 3 0 0 1
            1 0 0 2 1
            1 1 1 1 1
            ",
        );
        let m = monster_at(&d, 1, 1, Direction::North);
        assert!(!m.sees_player(&d, d.center_of(TileCoord::new(3, 2))));
    }

    #[test]
    fn own_tile_counts_as_sight() {
        let d = dungeon(CORRIDOR);
        let m = monster_at(&d, 1, 1, Direction::North);
        assert!(m.sees_player(&d, d.center_of(TileCoord::new(1, 1)) + DVec2::new(40.0, 0.0)));
    }

    const BENT: &str = "
        1 1 1 1 1
        1 3 0 0 1
        1 1 1 0 1
        1 2 0 0 1
        1 1 1 1 1
    ";

    #[test]
    fn pursuit_search_follows_floor_tiles() {
        let d = dungeon(BENT);
        let mut m = monster_at(&d, 1, 1, Direction::East);
        m.max_chase_distance = 10;
        let path = m
            .find_path_to_player(&d, d.center_of(TileCoord::new(1, 3)))
            .unwrap();
        assert_eq!(
            path,
            vec![
                TileCoord::new(2, 1),
                TileCoord::new(3, 1),
                TileCoord::new(3, 2),
                TileCoord::new(3, 3),
                TileCoord::new(2, 3),
                TileCoord::new(1, 3),
            ]
        );
    }

    #[test]
    fn pursuit_search_is_bounded() {
        let d = dungeon(BENT);
        let player = d.center_of(TileCoord::new(1, 3));

        let mut m = monster_at(&d, 1, 1, Direction::East);
        m.max_chase_distance = 5;
        assert_eq!(m.find_path_to_player(&d, player), None);

        m.max_chase_distance = 6;
        let path = m.find_path_to_player(&d, player).unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(path.first(), Some(&TileCoord::new(2, 1)));
        assert_eq!(path.last(), Some(&TileCoord::new(1, 3)));
    }

    #[test]
    fn pursuit_search_without_route_finds_nothing() {
        let d = dungeon(
            "
            1 1 1 1 1
            1 3 1 2 1
            1 1 1 1 1
            ",
        );
        let mut m = monster_at(&d, 1, 1, Direction::East);
        m.max_chase_distance = 50;
        assert_eq!(m.find_path_to_player(&d, d.center_of(TileCoord::new(3, 1))), None);
    }

    #[test]
    fn wandering_takes_the_only_open_side() {
        // Dead end to the east; only north of the facing-east monster is floor.
        let d = dungeon(
            "
            1 1 1 1
            1 0 2 1
            1 3 1 1
            1 1 1 1
            ",
        );
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut m = monster_at(&d, 1, 2, Direction::East);
            assert_eq!(
                m.choose_wander_tile(&d, &mut rng),
                Some(TileCoord::new(1, 1))
            );
            assert_eq!(m.facing, Direction::North);
        }
    }

    #[test]
    fn wandering_falls_back_to_the_tile_behind() {
        let d = dungeon(
            "
            1 1 1 1 1
            1 0 3 1 1
            1 1 1 1 1
            1 1 1 2 1
            ",
        );
        let mut rng = StdRng::seed_from_u64(3);
        let mut m = monster_at(&d, 2, 1, Direction::East);
        assert_eq!(m.choose_wander_tile(&d, &mut rng), Some(TileCoord::new(1, 1)));
        assert_eq!(m.facing, Direction::West);
    }

    #[test]
    fn chasing_intent_points_at_player() {
        let d = dungeon(CORRIDOR);
        let mut rng = StdRng::seed_from_u64(1);
        let mut m = monster_at(&d, 1, 1, Direction::North);
        m.path.push_back(TileCoord::new(2, 1));
        let player = DVec2::new(1000.0, 205.0);
        let intent = m.think(&d, player, &mut rng).unwrap();
        assert_eq!(intent, player - m.body.position);
        assert_eq!(m.mode(), MonsterMode::Chasing);
        assert!(m.path.is_empty());
        assert_eq!(m.facing, Direction::East);
    }

    #[test]
    fn losing_sight_switches_to_path_pursuit() {
        let d = dungeon(BENT);
        let mut rng = StdRng::seed_from_u64(1);
        let mut m = monster_at(&d, 1, 1, Direction::East);
        m.max_chase_distance = 6;
        m.chasing_player = true;
        let intent = m.think(&d, d.center_of(TileCoord::new(1, 3)), &mut rng).unwrap();
        assert_eq!(m.mode(), MonsterMode::ChasingByPath);
        assert_eq!(m.path.front(), Some(&TileCoord::new(2, 1)));
        assert_eq!(intent, DVec2::new(200.0, 0.0));
    }

    #[test]
    fn reached_waypoint_is_consumed() {
        let d = dungeon(CORRIDOR);
        let mut rng = StdRng::seed_from_u64(9);
        let mut m = monster_at(&d, 2, 1, Direction::East);
        m.path.push_back(TileCoord::new(2, 1));
        // Player hidden behind the wall row.
        let player = DVec2::new(-1000.0, -1000.0);
        m.think(&d, player, &mut rng).unwrap();
        assert_eq!(m.mode(), MonsterMode::WanderingWithPath);
        assert_eq!(m.path.len(), 1);
        assert_ne!(m.path.front(), Some(&TileCoord::new(2, 1)));
    }
}
