//! World builder: rasterizes the active tile window into the occupancy grid.
//!
//! The window is laid out on a 3x3 board of tile slots. The center tile
//! always sits in the middle slot, the previous tile in the slot it was
//! left through, and the center's forward neighbors in their compass slots.
//! Every rebuild starts from an empty grid, so no geometry survives a
//! window change except what the tile state asks to be restored.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::WorldGrid;
use crate::constants::*;
use crate::generation::{Direction, PillarVariety, Rgb, Tile, TileGraph, TileId, TileKind};
use crate::logging::TimingSpan;

/// Axis-aligned block of grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl CellRect {
    /// Whether a continuous point lies inside the rect grown by `margin`
    pub fn contains_with_margin(&self, px: f32, py: f32, margin: f32) -> bool {
        px >= self.x as f32 - margin
            && px < (self.x + self.w) as f32 + margin
            && py >= self.y as f32 - margin
            && py < (self.y + self.h) as f32 + margin
    }
}

/// Top-left grid cell of a slot on the 3x3 board
pub fn grid_origin(tx: i32, ty: i32) -> (i32, i32) {
    (WORLD_BORDER + tx * TILE_SIZE, WORLD_BORDER + ty * TILE_SIZE)
}

/// Middle cell of a tile placed at `(ox, oy)`
fn tile_center(ox: i32, oy: i32) -> (i32, i32) {
    (ox + TILE_SIZE / 2, oy + TILE_SIZE / 2)
}

/// Pillar footprints of a room placed at `(ox, oy)`
pub fn pillar_rects(variety: Option<PillarVariety>, ox: i32, oy: i32) -> Vec<CellRect> {
    match variety {
        None => Vec::new(),
        Some(PillarVariety::Center) => {
            let (cx, cy) = tile_center(ox, oy);
            let half = CENTER_PILLAR_SIZE / 2;
            vec![CellRect {
                x: cx - half,
                y: cy - half,
                w: CENTER_PILLAR_SIZE,
                h: CENTER_PILLAR_SIZE,
            }]
        }
        Some(PillarVariety::Corners) => {
            let near = CORNER_PILLAR_INSET;
            let far = TILE_SIZE - CORNER_PILLAR_INSET - CORNER_PILLAR_SIZE;
            [(near, near), (far, near), (near, far), (far, far)]
                .into_iter()
                .map(|(dx, dy)| CellRect {
                    x: ox + dx,
                    y: oy + dy,
                    w: CORNER_PILLAR_SIZE,
                    h: CORNER_PILLAR_SIZE,
                })
                .collect()
        }
    }
}

/// Cells just outside the door on `side` of a tile at `(ox, oy)`
fn exit_block_cells(side: Direction, ox: i32, oy: i32) -> impl Iterator<Item = (i32, i32)> {
    let (cx, cy) = tile_center(ox, oy);
    let far_edge = TILE_SIZE - 1 + EXIT_BLOCK_OFFSET;
    (-DOOR_HALF..=DOOR_HALF).map(move |i| match side {
        Direction::North => (cx + i, oy - EXIT_BLOCK_OFFSET),
        Direction::South => (cx + i, oy + far_edge),
        Direction::West => (ox - EXIT_BLOCK_OFFSET, cy + i),
        Direction::East => (ox + far_edge, cy + i),
    })
}

fn fill_rect(grid: &mut WorldGrid, rect: CellRect, id: u32) {
    for y in rect.y..rect.y + rect.h {
        for x in rect.x..rect.x + rect.w {
            grid.set(x, y, id);
        }
    }
}

/// Clear an inclusive cell rectangle, never touching the outer boundary ring
fn carve_rect(grid: &mut WorldGrid, x0: i32, y0: i32, x1: i32, y1: i32) {
    let last = grid.size() - 2;
    let (x0, x1) = (x0.min(x1).max(1), x0.max(x1).min(last));
    let (y0, y1) = (y0.min(y1).max(1), y0.max(y1).min(last));
    for y in y0..=y1 {
        for x in x0..=x1 {
            grid.set(x, y, CELL_EMPTY);
        }
    }
}

fn draw_border_box(grid: &mut WorldGrid, ox: i32, oy: i32, id: u32) {
    let last = TILE_SIZE - 1;
    for i in 0..TILE_SIZE {
        grid.set(ox + i, oy, id);
        grid.set(ox + i, oy + last, id);
        grid.set(ox, oy + i, id);
        grid.set(ox + last, oy + i, id);
    }
}

fn carve_door(grid: &mut WorldGrid, side: Direction, ox: i32, oy: i32) {
    let (cx, cy) = tile_center(ox, oy);
    let last = TILE_SIZE - 1;
    for i in -DOOR_HALF..=DOOR_HALF {
        match side {
            Direction::North => grid.set(cx + i, oy, CELL_EMPTY),
            Direction::South => grid.set(cx + i, oy + last, CELL_EMPTY),
            Direction::West => grid.set(ox, cy + i, CELL_EMPTY),
            Direction::East => grid.set(ox + last, cy + i, CELL_EMPTY),
        }
    }
}

fn build_room(grid: &mut WorldGrid, ox: i32, oy: i32, tile: &Tile) {
    draw_border_box(grid, ox, oy, tile.wall_id);
    for rect in pillar_rects(tile.variety, ox, oy) {
        fill_rect(grid, rect, tile.wall_id);
    }
}

/// Solid block with a path arm from the middle cell to every open side
fn build_corridor(grid: &mut WorldGrid, ox: i32, oy: i32, tile: &Tile) {
    fill_rect(
        grid,
        CellRect {
            x: ox,
            y: oy,
            w: TILE_SIZE,
            h: TILE_SIZE,
        },
        tile.wall_id,
    );
    let (cx, cy) = tile_center(ox, oy);
    let inner = TILE_SIZE - 2;
    for side in tile.open_sides.iter() {
        match side {
            Direction::North => carve_rect(grid, cx - PATH_HALF, oy + 1, cx + PATH_HALF, cy),
            Direction::South => carve_rect(grid, cx - PATH_HALF, cy, cx + PATH_HALF, oy + inner),
            Direction::West => carve_rect(grid, ox + 1, cy - PATH_HALF, cx, cy + PATH_HALF),
            Direction::East => carve_rect(grid, cx, cy - PATH_HALF, ox + inner, cy + PATH_HALF),
        }
    }
}

fn build_tile_at(grid: &mut WorldGrid, ox: i32, oy: i32, tile: &Tile) {
    match tile.kind {
        TileKind::Start | TileKind::Room | TileKind::DeadEnd => build_room(grid, ox, oy, tile),
        TileKind::Straight | TileKind::TurnLeft | TileKind::TurnRight => {
            build_corridor(grid, ox, oy, tile)
        }
    }
    for side in tile.open_sides.iter() {
        carve_door(grid, side, ox, oy);
    }
}

/// Occupancy grid plus the placement of every tile in the active window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub grid: WorldGrid,
    center: Option<TileId>,
    positions: BTreeMap<TileId, (i32, i32)>,
    /// Cells each sealed room actually turned into blocks
    sealed: BTreeMap<TileId, Vec<(i32, i32)>>,
    palette: HashMap<u32, Rgb>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            grid: WorldGrid::new(WORLD_SIZE),
            center: None,
            positions: BTreeMap::new(),
            sealed: BTreeMap::new(),
            palette: Self::base_palette(),
        }
    }

    fn base_palette() -> HashMap<u32, Rgb> {
        HashMap::from([(CELL_BOUNDARY, Rgb::BLACK), (CELL_BLOCK, Rgb::BLOCK_GRAY)])
    }

    pub fn center(&self) -> Option<TileId> {
        self.center
    }

    /// Grid origin of a placed tile
    pub fn origin(&self, id: TileId) -> Option<(i32, i32)> {
        self.positions.get(&id).copied()
    }

    pub fn positions(&self) -> impl Iterator<Item = (TileId, (i32, i32))> + '_ {
        self.positions.iter().map(|(id, origin)| (*id, *origin))
    }

    /// Cells currently sealed for a room
    pub fn sealed_cells(&self, id: TileId) -> &[(i32, i32)] {
        self.sealed.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Base color of a cell id
    pub fn wall_color(&self, id: u32) -> Rgb {
        self.palette.get(&id).copied().unwrap_or(Rgb::BLOCK_GRAY)
    }

    /// Rasterize the window around `center` from scratch.
    ///
    /// `previous` is placed on the `arrival` side of the center. Rooms still
    /// flagged with active enemies get their exit blocks back.
    pub fn rebuild(
        &mut self,
        graph: &mut TileGraph,
        center: TileId,
        previous: Option<TileId>,
        arrival: Option<Direction>,
    ) {
        let _timing = TimingSpan::new("world_rebuild");

        self.grid.reset();
        self.positions.clear();
        self.sealed.clear();
        self.palette = Self::base_palette();
        self.center = Some(center);

        let Some(center_tile) = graph.get(center) else {
            tracing::warn!(?center, "rebuild requested for unknown tile");
            return;
        };
        let neighbors: Vec<(Direction, TileId)> =
            center_tile.neighbors.iter().map(|(d, id)| (*d, *id)).collect();

        self.place(graph, center, 1, 1);
        if let (Some(prev), Some(side)) = (previous, arrival) {
            self.place(graph, prev, 1 + side.dx(), 1 + side.dy());
        }
        for (side, id) in neighbors {
            self.place(graph, id, 1 + side.dx(), 1 + side.dy());
        }

        let active: Vec<TileId> = self
            .positions
            .keys()
            .copied()
            .filter(|id| graph.get(*id).is_some_and(|t| t.has_active_enemies))
            .collect();
        for id in active {
            self.create_exit_blocks(graph, id);
        }

        tracing::debug!(
            center = center.0,
            placed = self.positions.len(),
            sealed = self.sealed.len(),
            "world rebuilt"
        );
    }

    fn place(&mut self, graph: &TileGraph, id: TileId, tx: i32, ty: i32) {
        if !(0..GRID_SIDE).contains(&tx) || !(0..GRID_SIDE).contains(&ty) {
            return;
        }
        let Some(tile) = graph.get(id) else {
            return;
        };
        let (ox, oy) = grid_origin(tx, ty);
        build_tile_at(&mut self.grid, ox, oy, tile);
        self.positions.insert(id, (ox, oy));
        self.palette.insert(tile.wall_id, tile.color);
    }

    /// Seal every open side of a placed room.
    ///
    /// Only cells that are passable at sealing time become blocks, and only
    /// those are handed back on removal.
    pub fn create_exit_blocks(&mut self, graph: &mut TileGraph, id: TileId) {
        let Some((ox, oy)) = self.origin(id) else {
            return;
        };
        let Some(tile) = graph.get_mut(id) else {
            return;
        };
        if !tile.is_room() {
            return;
        }

        self.release_cells(id);
        let mut cells = Vec::new();
        for side in tile.open_sides.iter() {
            for (x, y) in exit_block_cells(side, ox, oy) {
                if self.grid.in_bounds(x, y) && self.grid.get(x, y) == CELL_EMPTY {
                    self.grid.set(x, y, CELL_BLOCK);
                    cells.push((x, y));
                }
            }
        }
        tile.exit_blocks = tile.open_sides;
        self.sealed.insert(id, cells);
    }

    /// Reopen a room's exits and clear its sealed-side set
    pub fn remove_exit_blocks(&mut self, graph: &mut TileGraph, id: TileId) {
        self.release_cells(id);
        if let Some(tile) = graph.get_mut(id) {
            tile.exit_blocks = Default::default();
        }
    }

    fn release_cells(&mut self, id: TileId) {
        if let Some(cells) = self.sealed.remove(&id) {
            for (x, y) in cells {
                if self.grid.get(x, y) == CELL_BLOCK {
                    self.grid.set(x, y, CELL_EMPTY);
                }
            }
        }
    }

    /// Placed tile whose strict interior holds `(x, y)`
    pub fn tile_at(&self, x: f32, y: f32) -> Option<TileId> {
        let inner = (TILE_SIZE - 1) as f32;
        self.positions.iter().find_map(|(id, (ox, oy))| {
            let (ox, oy) = (*ox as f32, *oy as f32);
            (ox < x && x < ox + inner && oy < y && y < oy + inner).then_some(*id)
        })
    }

    /// Neighbor tile the point has moved into, with its side relative to the center.
    ///
    /// Returns `None` inside the center, outside every tile, or when the
    /// center has that exit sealed.
    pub fn entered_neighbor(&self, graph: &TileGraph, x: f32, y: f32) -> Option<(TileId, Direction)> {
        let center = self.center?;
        let id = self.tile_at(x, y)?;
        if id == center {
            return None;
        }
        let (cox, coy) = self.origin(center)?;
        let (ox, oy) = self.origin(id)?;
        let side = Direction::from_offset((ox - cox) / TILE_SIZE, (oy - coy) / TILE_SIZE)?;
        if graph
            .get(center)
            .is_some_and(|t| t.exit_blocks.contains(side))
        {
            return None;
        }
        Some((id, side))
    }
}
