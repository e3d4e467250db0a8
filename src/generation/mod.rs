//! Tile graph generation.
//!
//! The dungeon is an endless chain of 18x18 tiles. Only a small window around
//! the player exists at any time: the current tile, the tile the player came
//! from, and one ring of forward neighbors. Tiles live in an arena keyed by
//! [`TileId`]; neighbor links are id maps, so dropping a tile from the window
//! is just removing it from the arena.

pub mod palette;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::FIRST_WALL_ID;
pub use palette::Rgb;

/// Compass side of a tile. Grid y grows southwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Side counter-clockwise of this one
    pub fn left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Side clockwise of this one
    pub fn right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn dx(self) -> i32 {
        match self {
            Direction::East => 1,
            Direction::West => -1,
            _ => 0,
        }
    }

    pub fn dy(self) -> i32 {
        match self {
            Direction::North => -1,
            Direction::South => 1,
            _ => 0,
        }
    }

    /// Direction of a unit tile offset, if it is one
    pub fn from_offset(dx: i32, dy: i32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.dx() == dx && d.dy() == dy)
    }
}

/// Small set of sides stored as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SideSet(u8);

impl SideSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn of(sides: &[Direction]) -> Self {
        let mut set = Self::empty();
        for side in sides {
            set.insert(*side);
        }
        set
    }

    pub fn insert(&mut self, side: Direction) {
        self.0 |= 1 << side.index();
    }

    pub fn remove(&mut self, side: Direction) {
        self.0 &= !(1 << side.index());
    }

    pub fn contains(&self, side: Direction) -> bool {
        self.0 & (1 << side.index()) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

/// Tile layout family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Spawn room of every run, open on E, N and S
    Start,
    /// Hollow room open on all four sides
    Room,
    /// Hollow room open only where it was entered
    DeadEnd,
    Straight,
    TurnLeft,
    TurnRight,
}

impl TileKind {
    /// Weighted draw table for freshly generated tiles
    pub const WEIGHTS: [(TileKind, f32); 5] = [
        (TileKind::Room, 0.30),
        (TileKind::DeadEnd, 0.12),
        (TileKind::Straight, 0.28),
        (TileKind::TurnLeft, 0.15),
        (TileKind::TurnRight, 0.15),
    ];

    /// Rooms are hollow boxes that can hold enemies; the rest are corridors
    pub fn is_room(self) -> bool {
        matches!(self, TileKind::Start | TileKind::Room | TileKind::DeadEnd)
    }

    /// Open sides for a tile of this kind entered through `entry`
    pub fn open_sides(self, entry: Direction) -> SideSet {
        match self {
            TileKind::Start => {
                SideSet::of(&[Direction::East, Direction::North, Direction::South])
            }
            TileKind::Room => SideSet::of(&[
                entry,
                entry.opposite(),
                entry.left(),
                entry.right(),
            ]),
            TileKind::DeadEnd => SideSet::of(&[entry]),
            TileKind::Straight => SideSet::of(&[entry, entry.opposite()]),
            TileKind::TurnLeft => SideSet::of(&[entry, entry.left()]),
            TileKind::TurnRight => SideSet::of(&[entry, entry.right()]),
        }
    }

    fn pick<R: Rng>(rng: &mut R) -> Self {
        let roll: f32 = rng.gen();
        let mut acc = 0.0;
        for (kind, weight) in Self::WEIGHTS {
            acc += weight;
            if roll <= acc {
                return kind;
            }
        }
        TileKind::Room
    }
}

/// Cover layout inside a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PillarVariety {
    /// One 5x5 pillar in the middle
    Center,
    /// Four 2x2 pillars inset from the corners
    Corners,
}

/// Stable arena key of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u32);

/// One room or corridor of the dungeon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    /// Side the tile was entered through when generated
    pub orientation: Direction,
    pub kind: TileKind,
    pub open_sides: SideSet,
    pub wall_id: u32,
    pub color: Rgb,
    pub variety: Option<PillarVariety>,
    /// Forward neighbors; the side leading back to the previous tile is never stored
    pub neighbors: BTreeMap<Direction, TileId>,
    /// Enemies were already issued for this tile
    pub spawned: bool,
    pub has_active_enemies: bool,
    /// Sides currently sealed by exit blocks
    pub exit_blocks: SideSet,
}

impl Tile {
    pub fn is_room(&self) -> bool {
        self.kind.is_room()
    }
}

/// Arena of the tiles that are still reachable from the active window
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileGraph {
    tiles: HashMap<TileId, Tile>,
    next_id: u32,
    next_wall_id: u32,
}

impl TileGraph {
    pub fn new() -> Self {
        Self {
            tiles: HashMap::new(),
            next_id: 0,
            next_wall_id: FIRST_WALL_ID,
        }
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Drop every tile and restart id allocation
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Create a tile entered through `entry` with a random kind, hue and cover
    pub fn generate<R: Rng>(&mut self, entry: Direction, rng: &mut R) -> TileId {
        let kind = TileKind::pick(rng);
        let variety = if matches!(kind, TileKind::Room | TileKind::DeadEnd) {
            Some(if rng.gen_bool(0.5) {
                PillarVariety::Center
            } else {
                PillarVariety::Corners
            })
        } else {
            None
        };
        let color = palette::random_hue(rng);
        self.insert(entry, kind, variety, color)
    }

    /// Spawn room of a new run. No cover and nothing to spawn.
    pub fn generate_start<R: Rng>(&mut self, rng: &mut R) -> TileId {
        let color = palette::random_hue(rng);
        let id = self.insert(Direction::West, TileKind::Start, None, color);
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.spawned = true;
        }
        id
    }

    fn insert(
        &mut self,
        entry: Direction,
        kind: TileKind,
        variety: Option<PillarVariety>,
        color: Rgb,
    ) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        let wall_id = self.next_wall_id;
        self.next_wall_id += 1;

        self.tiles.insert(
            id,
            Tile {
                id,
                orientation: entry,
                kind,
                open_sides: kind.open_sides(entry),
                wall_id,
                color,
                variety,
                neighbors: BTreeMap::new(),
                spawned: false,
                has_active_enemies: false,
                exit_blocks: SideSet::empty(),
            },
        );
        id
    }

    /// Materialize one ring of neighbors around `center`.
    ///
    /// Every open side except `arrival` gets a tile entered from the facing
    /// side. Neighbors that already exist are kept. The arrival side is left
    /// empty because the previous tile occupies it.
    pub fn generate_neighbors<R: Rng>(
        &mut self,
        center: TileId,
        arrival: Option<Direction>,
        rng: &mut R,
    ) {
        let Some(tile) = self.tiles.get(&center) else {
            return;
        };
        let open = tile.open_sides;
        let mut existing = tile.neighbors.clone();

        if let Some(back) = arrival {
            existing.remove(&back);
        }
        existing.retain(|side, id| open.contains(*side) && self.tiles.contains_key(id));

        for side in open.iter() {
            if Some(side) == arrival || existing.contains_key(&side) {
                continue;
            }
            let neighbor = self.generate(side.opposite(), rng);
            existing.insert(side, neighbor);
        }

        if let Some(tile) = self.tiles.get_mut(&center) {
            tile.neighbors = existing;
        }
    }

    /// Keep only tiles that can appear in a window reachable within one move.
    ///
    /// That is the center, the previous tile and their forward neighbors.
    /// Dangling neighbor links are pruned.
    pub fn evict_outside(&mut self, center: TileId, previous: Option<TileId>) {
        let mut keep = BTreeSet::new();
        for id in [Some(center), previous].into_iter().flatten() {
            keep.insert(id);
            if let Some(tile) = self.tiles.get(&id) {
                keep.extend(tile.neighbors.values().copied());
            }
        }

        let before = self.tiles.len();
        self.tiles.retain(|id, _| keep.contains(id));
        for tile in self.tiles.values_mut() {
            tile.neighbors.retain(|_, id| keep.contains(id));
        }
        let evicted = before - self.tiles.len();
        if evicted > 0 {
            tracing::trace!(evicted, remaining = self.tiles.len(), "evicted tiles");
        }
    }
}
