use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{
    TileCoord,
    collision::Aabb,
    map::{Grid, GridError},
};

/// Map code for an empty floor cell.
pub const CODE_FLOOR: u8 = 0;
pub const CODE_WALL: u8 = 1;
pub const CODE_PLAYER: u8 = 2;
pub const CODE_MONSTER: u8 = 3;
/// Goal tile sitting behind a locked door.
pub const CODE_GOAL_DOOR: u8 = 8;
pub const CODE_KEY: u8 = 9;

/// Errors raised while turning map data into a dungeon.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Map is empty.")]
    Empty,
    #[error("Map has zero width.")]
    ZeroWidth,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Inconsistent height at column {col}: expected {expected}, found {found}")]
    RaggedColumn {
        col: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid map token '{token}' at ({col}, {row}).")]
    InvalidCode {
        token: String,
        col: usize,
        row: usize,
    },
    #[error("Unknown map code {code} at ({col}, {row}).")]
    UnknownCode { code: u8, col: usize, row: usize },
    #[error("No player spawn (code 2) found in map.")]
    MissingPlayerSpawn,
    #[error("Multiple player spawns found: {first:?} and {second:?}.")]
    MultiplePlayerSpawns { first: TileCoord, second: TileCoord },
    #[error("Multiple goal cells (code 8) found.")]
    MultipleGoals,
    #[error("Multiple key cells (code 9) found.")]
    MultipleKeys,
    #[error("Failed to parse JSON map: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("Maze of {cells} cells cannot hold {required} spawns.")]
    MazeTooSmall { cells: usize, required: usize },
}

/// Static kind of a dungeon cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Floor,
    Wall,
    Door,
    Goal,
}

impl TileKind {
    /// Side of the square collision footprint for solid kinds.
    ///
    /// Walls are one unit wider than the tile so neighbouring walls leave no
    /// seam; the goal is smaller so it sits inside the door's footprint.
    pub fn footprint(self, tile_width: f64) -> Option<f64> {
        match self {
            TileKind::Floor => None,
            TileKind::Wall => Some(tile_width + 1.0),
            TileKind::Door => Some(tile_width),
            TileKind::Goal => Some(tile_width - 10.0),
        }
    }
}

/// One cell of the dungeon as seen by queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub coord: TileCoord,
    pub kind: TileKind,
    /// World-space centre.
    pub center: DVec2,
}

impl Tile {
    /// Floor is the only kind creatures may see and path through.
    pub fn is_floor(&self) -> bool {
        self.kind == TileKind::Floor
    }
}

/// A member of the solid obstacle set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub coord: TileCoord,
    pub kind: TileKind,
    pub bounds: Aabb,
}

/// Spawn cells discovered while loading a map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Spawns {
    pub player: Option<TileCoord>,
    pub monsters: Vec<TileCoord>,
    pub key: Option<TileCoord>,
    pub goal: Option<TileCoord>,
}

/// Raw numeric map codes, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapLayout {
    codes: Grid<u8>,
}

impl MapLayout {
    /// Builds a layout from rows of codes.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self, MapError> {
        let height = rows.len();
        let width = rows.first().ok_or(MapError::Empty)?.len();
        if width == 0 {
            return Err(MapError::ZeroWidth);
        }
        let mut cells = Vec::with_capacity(width * height);
        for (row, line) in rows.into_iter().enumerate() {
            if line.len() != width {
                return Err(MapError::Ragged {
                    row,
                    expected: width,
                    found: line.len(),
                });
            }
            cells.extend(line);
        }
        Ok(MapLayout {
            codes: Grid::from_cells(width, height, cells)?,
        })
    }

    /// Builds a layout from columns of codes (`data[col][row]`), the layout
    /// used by JSON map files.
    pub fn from_columns(columns: Vec<Vec<u8>>) -> Result<Self, MapError> {
        let width = columns.len();
        let height = columns.first().ok_or(MapError::Empty)?.len();
        if height == 0 {
            return Err(MapError::Empty);
        }
        for (col, column) in columns.iter().enumerate() {
            if column.len() != height {
                return Err(MapError::RaggedColumn {
                    col,
                    expected: height,
                    found: column.len(),
                });
            }
        }
        let codes = Grid::from_generator(width, height, |c| columns[c.col][c.row]);
        Ok(MapLayout { codes })
    }

    /// Parses whitespace-separated integer codes, one map row per line.
    pub fn parse(map_string: &str) -> Result<Self, MapError> {
        let lines: Vec<&str> = map_string
            .trim()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return Err(MapError::Empty);
        }

        let mut rows = Vec::with_capacity(lines.len());
        for (row, line) in lines.iter().enumerate() {
            let parsed = line
                .split_whitespace()
                .enumerate()
                .map(|(col, token)| {
                    token.parse::<u8>().map_err(|_| MapError::InvalidCode {
                        token: token.to_string(),
                        col,
                        row,
                    })
                })
                .collect::<Result<Vec<u8>, MapError>>()?;
            rows.push(parsed);
        }
        Self::from_rows(rows)
    }

    /// Parses a JSON array of columns.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let columns: Vec<Vec<u8>> = serde_json::from_str(json)?;
        Self::from_columns(columns)
    }

    pub fn width(&self) -> usize {
        self.codes.width()
    }

    pub fn height(&self) -> usize {
        self.codes.height()
    }

    /// Map code at `(col, row)`, `None` outside the layout.
    pub fn code(&self, col: usize, row: usize) -> Option<u8> {
        self.codes.get(col, row).copied()
    }

    /// Underlying code grid.
    pub fn codes(&self) -> &Grid<u8> {
        &self.codes
    }
}

/// The static tile grid plus world-space geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Dungeon {
    tiles: Grid<TileKind>,
    tile_width: f64,
}

impl Dungeon {
    /// Classifies every map code, recording spawns.
    ///
    /// Fails on unknown codes, a missing or repeated player spawn, or repeated
    /// goal and key cells.
    pub fn load(layout: &MapLayout, tile_width: f64) -> Result<(Dungeon, Spawns), MapError> {
        let mut spawns = Spawns::default();
        let mut tiles = Vec::with_capacity(layout.width() * layout.height());

        for (coord, &code) in layout.codes().enumerate() {
            let kind = match code {
                CODE_FLOOR => TileKind::Floor,
                CODE_WALL => TileKind::Wall,
                CODE_PLAYER => {
                    if let Some(first) = spawns.player {
                        return Err(MapError::MultiplePlayerSpawns {
                            first,
                            second: coord,
                        });
                    }
                    spawns.player = Some(coord);
                    TileKind::Floor
                }
                CODE_MONSTER => {
                    spawns.monsters.push(coord);
                    TileKind::Floor
                }
                CODE_GOAL_DOOR => {
                    if spawns.goal.replace(coord).is_some() {
                        return Err(MapError::MultipleGoals);
                    }
                    TileKind::Goal
                }
                CODE_KEY => {
                    if spawns.key.replace(coord).is_some() {
                        return Err(MapError::MultipleKeys);
                    }
                    TileKind::Floor
                }
                unknown => {
                    return Err(MapError::UnknownCode {
                        code: unknown,
                        col: coord.col,
                        row: coord.row,
                    });
                }
            };
            tiles.push(kind);
        }

        if spawns.player.is_none() {
            return Err(MapError::MissingPlayerSpawn);
        }

        let tiles = Grid::from_cells(layout.width(), layout.height(), tiles)?;
        Ok((Dungeon { tiles, tile_width }, spawns))
    }

    /// Width in tiles.
    pub fn width(&self) -> usize {
        self.tiles.width()
    }

    /// Height in tiles.
    pub fn height(&self) -> usize {
        self.tiles.height()
    }

    /// World units per tile side.
    pub fn tile_width(&self) -> f64 {
        self.tile_width
    }

    /// Tile at signed indices, `None` outside the map.
    pub fn tile_at(&self, col: isize, row: isize) -> Option<Tile> {
        let coord = self.tiles.checked_coord(col, row)?;
        Some(self.tile(coord))
    }

    /// Tile at an in-bounds coordinate.
    ///
    /// Panics if `coord` is outside the map.
    pub fn tile(&self, coord: TileCoord) -> Tile {
        Tile {
            coord,
            kind: self.tiles[coord],
            center: self.center_of(coord),
        }
    }

    /// Nearest tile indices for a world position. May be out of bounds.
    ///
    /// Half-tile points round up, so the result is the tile whose half-open
    /// square contains `point`.
    pub fn indices_of(&self, point: DVec2) -> (isize, isize) {
        let col = (point.x / self.tile_width + 0.5).floor();
        let row = (point.y / self.tile_width + 0.5).floor();
        (col as isize, row as isize)
    }

    /// World-space centre of a tile. Tile `(0, 0)` is centred on the origin.
    pub fn center_of(&self, coord: TileCoord) -> DVec2 {
        DVec2::new(coord.col as f64, coord.row as f64) * self.tile_width
    }

    /// The full tile square, used for containment tests.
    pub fn tile_bounds(&self, coord: TileCoord) -> Aabb {
        Aabb::square(self.center_of(coord), self.tile_width)
    }

    /// Solid obstacle for a cell of the given kind, or `None` for floor.
    pub fn obstacle(&self, coord: TileCoord, kind: TileKind) -> Option<Obstacle> {
        let size = kind.footprint(self.tile_width)?;
        Some(Obstacle {
            coord,
            kind,
            bounds: Aabb::square(self.center_of(coord), size),
        })
    }

    /// Initial solid set in grid order. The goal cell contributes its door
    /// first and the goal blocker second.
    pub fn solid_obstacles(&self) -> Vec<Obstacle> {
        let mut solids = Vec::new();
        for (coord, &kind) in self.tiles.enumerate() {
            match kind {
                TileKind::Floor => {}
                TileKind::Goal => {
                    solids.extend(self.obstacle(coord, TileKind::Door));
                    solids.extend(self.obstacle(coord, TileKind::Goal));
                }
                other => solids.extend(self.obstacle(coord, other)),
            }
        }
        solids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "
        1 1 1 1
        1 2 9 1
        1 3 8 1
        1 1 1 1
    ";

    #[test]
    fn parse_and_load_small_map() {
        let layout = MapLayout::parse(SMALL).unwrap();
        assert_eq!((layout.width(), layout.height()), (4, 4));
        let (dungeon, spawns) = Dungeon::load(&layout, 200.0).unwrap();
        assert_eq!(spawns.player, Some(TileCoord::new(1, 1)));
        assert_eq!(spawns.monsters, vec![TileCoord::new(1, 2)]);
        assert_eq!(spawns.key, Some(TileCoord::new(2, 1)));
        assert_eq!(spawns.goal, Some(TileCoord::new(2, 2)));
        assert_eq!(dungeon.tile_at(2, 2).unwrap().kind, TileKind::Goal);
        assert_eq!(dungeon.tile_at(2, 1).unwrap().kind, TileKind::Floor);
        assert_eq!(dungeon.tile_at(0, 0).unwrap().kind, TileKind::Wall);
    }

    #[test]
    fn columns_and_rows_agree() {
        let rows = vec![vec![1, 1, 1], vec![1, 2, 0]];
        let columns = vec![vec![1, 1], vec![1, 2], vec![1, 0]];
        assert_eq!(
            MapLayout::from_rows(rows).unwrap(),
            MapLayout::from_columns(columns).unwrap()
        );
        let json = MapLayout::from_json("[[1,1],[1,2],[1,0]]").unwrap();
        assert_eq!(json.code(1, 1), Some(2));
    }

    #[test]
    fn malformed_maps_fail_fast() {
        assert!(matches!(MapLayout::parse(""), Err(MapError::Empty)));
        assert!(matches!(
            MapLayout::parse("1 1 1\n1 1"),
            Err(MapError::Ragged { row: 1, .. })
        ));
        assert!(matches!(
            MapLayout::parse("1 x"),
            Err(MapError::InvalidCode { .. })
        ));

        let no_player = MapLayout::parse("1 1\n1 0").unwrap();
        assert!(matches!(
            Dungeon::load(&no_player, 200.0),
            Err(MapError::MissingPlayerSpawn)
        ));
        let two_players = MapLayout::parse("2 2").unwrap();
        assert!(matches!(
            Dungeon::load(&two_players, 200.0),
            Err(MapError::MultiplePlayerSpawns { .. })
        ));
        let unknown = MapLayout::parse("2 5").unwrap();
        assert!(matches!(
            Dungeon::load(&unknown, 200.0),
            Err(MapError::UnknownCode { code: 5, .. })
        ));
        let two_keys = MapLayout::parse("2 9 9").unwrap();
        assert!(matches!(
            Dungeon::load(&two_keys, 200.0),
            Err(MapError::MultipleKeys)
        ));
    }

    #[test]
    fn indices_round_to_nearest_tile() {
        let layout = MapLayout::parse(SMALL).unwrap();
        let (dungeon, _) = Dungeon::load(&layout, 200.0).unwrap();
        assert_eq!(dungeon.indices_of(DVec2::new(210.0, 390.0)), (1, 2));
        assert_eq!(dungeon.indices_of(DVec2::new(-120.0, 0.0)), (-1, 0));
        assert!(dungeon.tile_at(-1, 0).is_none());
        assert!(dungeon.tile_at(4, 0).is_none());
    }

    #[test]
    fn half_tile_points_match_tile_squares() {
        let layout = MapLayout::parse(SMALL).unwrap();
        let (dungeon, _) = Dungeon::load(&layout, 200.0).unwrap();
        for point in [
            DVec2::new(-100.0, -100.0),
            DVec2::new(100.0, 100.0),
            DVec2::new(300.0, -100.0),
            DVec2::new(-100.0, 500.0),
            DVec2::new(99.9, 100.0),
        ] {
            let (col, row) = dungeon.indices_of(point);
            let coord = TileCoord::new(col as usize, row as usize);
            assert!(
                dungeon.tile_bounds(coord).contains_point(point),
                "{point:?} -> ({col}, {row})"
            );
        }
        assert_eq!(dungeon.indices_of(DVec2::new(-100.0, 100.0)), (0, 1));
    }

    #[test]
    fn goal_cell_contributes_door_then_goal() {
        let layout = MapLayout::parse(SMALL).unwrap();
        let (dungeon, _) = Dungeon::load(&layout, 200.0).unwrap();
        let solids = dungeon.solid_obstacles();
        let kinds: Vec<_> = solids
            .iter()
            .filter(|o| o.coord == TileCoord::new(2, 2))
            .map(|o| o.kind)
            .collect();
        assert_eq!(kinds, vec![TileKind::Door, TileKind::Goal]);
        let wall = solids.iter().find(|o| o.kind == TileKind::Wall).unwrap();
        assert_eq!(wall.bounds.half.x, 100.5);
    }
}
