//! Level: tile grid, entity list, spawn/exit points, completion state.
//!
//! The level owns every entity it creates; nothing outlives it. Entity
//! storage is a plain Vec so iteration order is stable within a frame.

use glam::Vec2;
use serde::Deserialize;

use super::context::{SimEvent, SimulationContext};
use super::enemy;
use super::entity::{
    Aabb, CollectibleKind, CollectibleState, Entity, EntityId, EntityIdGenerator, EntityKind,
    Facing, ProjectileState, SpawnRequest, Timer,
};
use super::grid::{TileGrid, TileKind};
use super::player::PlayerState;
use crate::consts::TILE_SIZE;

/// A point in tile coordinates, as it appears in level data.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TilePoint {
    pub x: f32,
    pub y: f32,
}

impl TilePoint {
    fn to_world(self) -> Vec2 {
        Vec2::new(self.x * TILE_SIZE, self.y * TILE_SIZE)
    }
}

/// An enemy or collectible placement in level data.
#[derive(Debug, Clone, Deserialize)]
pub struct Placement {
    #[serde(rename = "type")]
    pub type_name: String,
    pub x: f32,
    pub y: f32,
}

/// Consumed level interface. Tile codes are 0=air 1=solid 2=platform
/// 3=breakable 4=hazard, row-major. A missing or wrong-sized `tiles` payload
/// falls back to the generated default layout.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelData {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub tiles: Option<Vec<u8>>,
    pub player_spawn: TilePoint,
    pub exit_point: TilePoint,
    #[serde(default)]
    pub enemies: Vec<Placement>,
    #[serde(default)]
    pub collectibles: Vec<Placement>,
}

impl LevelData {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// The running level.
#[derive(Debug)]
pub struct Level {
    pub grid: TileGrid,
    pub(crate) entities: Vec<Entity>,
    ids: EntityIdGenerator,
    player_id: EntityId,
    pub player_spawn: Vec2,
    pub exit: Aabb,
    pub completed: bool,
    pub player_defeated: bool,
    pub score: u32,
    pub coins: u32,
}

impl Level {
    /// Build a level from consumed data. Geometry problems degrade to the
    /// default layout; unknown placement types are skipped.
    pub fn from_data(data: &LevelData, ctx: &SimulationContext) -> Self {
        let width = data.width.max(8);
        let height = data.height.max(6);
        let grid = match &data.tiles {
            Some(codes) if codes.len() == (width * height) as usize => {
                let kinds: Vec<TileKind> = codes.iter().map(|&c| decode_tile(c)).collect();
                TileGrid::from_codes(width, height, &kinds)
            }
            Some(codes) => {
                log::warn!(
                    "level tiles length {} does not match {}x{}; using default layout",
                    codes.len(),
                    width,
                    height
                );
                default_layout(width, height)
            }
            None => default_layout(width, height),
        };

        let mut level = Self::with_grid(
            grid,
            data.player_spawn.to_world(),
            data.exit_point.to_world(),
            ctx,
        );

        for placement in &data.enemies {
            let pos = Vec2::new(placement.x * TILE_SIZE, placement.y * TILE_SIZE);
            level.spawn_enemy(&placement.type_name, pos, ctx);
        }
        for placement in &data.collectibles {
            let pos = Vec2::new(placement.x * TILE_SIZE, placement.y * TILE_SIZE);
            match placement.type_name.as_str() {
                "coin" => level.spawn_collectible(CollectibleKind::Coin, pos, Vec2::ZERO, ctx),
                "power" => level.spawn_collectible(CollectibleKind::Power, pos, Vec2::ZERO, ctx),
                "one_up" => level.spawn_collectible(CollectibleKind::OneUp, pos, Vec2::ZERO, ctx),
                other => log::warn!("unknown collectible type {other:?} skipped"),
            }
        }
        level
    }

    /// A ready-to-run level on the default layout.
    pub fn default_level(ctx: &SimulationContext) -> Self {
        let grid = default_layout(60, 15);
        let spawn = Vec2::new(2.0 * TILE_SIZE, 11.0 * TILE_SIZE);
        let exit = Vec2::new(57.0 * TILE_SIZE, 11.0 * TILE_SIZE);
        let mut level = Self::with_grid(grid, spawn, exit, ctx);
        level.spawn_enemy("patrol", Vec2::new(10.0 * TILE_SIZE, 11.0 * TILE_SIZE), ctx);
        level.spawn_enemy("hopper", Vec2::new(30.0 * TILE_SIZE, 11.0 * TILE_SIZE), ctx);
        level.spawn_enemy("flyer", Vec2::new(40.0 * TILE_SIZE, 6.0 * TILE_SIZE), ctx);
        level
    }

    fn with_grid(
        grid: TileGrid,
        player_spawn: Vec2,
        exit_pos: Vec2,
        ctx: &SimulationContext,
    ) -> Self {
        let mut ids = EntityIdGenerator::new();
        let player_id = ids.next();
        let state = PlayerState::new(&ctx.tuning);
        let player = Entity::new(
            player_id,
            EntityKind::Player(state),
            player_spawn,
            super::player::PowerTier::Base.box_size(),
        );

        Self {
            grid,
            entities: vec![player],
            ids,
            player_id,
            player_spawn,
            // The goal region is one tile wide and two tall, feet-aligned
            exit: Aabb::new(
                Vec2::new(exit_pos.x, exit_pos.y - TILE_SIZE),
                Vec2::new(TILE_SIZE, 2.0 * TILE_SIZE),
            ),
            completed: false,
            player_defeated: false,
            score: 0,
            coins: 0,
        }
    }

    // ------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------

    pub fn spawn_enemy(&mut self, type_name: &str, pos: Vec2, ctx: &SimulationContext) {
        let id = self.ids.next();
        match enemy::make_entity(id, type_name, pos, ctx) {
            Some(entity) => self.entities.push(entity),
            None => log::warn!("unknown enemy type {type_name:?} skipped"),
        }
    }

    pub fn spawn_projectile(
        &mut self,
        pos: Vec2,
        facing: Facing,
        from_player: bool,
        ctx: &SimulationContext,
    ) {
        let id = self.ids.next();
        let speed = if from_player {
            ctx.tuning.projectile_speed
        } else {
            ctx.tuning.projectile_speed * 0.6
        };
        let mut lifetime = Timer::new(ctx.tuning.projectile_lifetime_ms);
        lifetime.arm();
        let state = ProjectileState {
            lifetime,
            from_player,
            damage: 1,
            facing,
        };
        let mut entity = Entity::new(id, EntityKind::Projectile(state), pos, Vec2::new(6.0, 6.0));
        entity.vel.x = facing.sign() * speed;
        entity.gravity_scale = 0.0;
        entity.solid = false;
        self.entities.push(entity);
    }

    pub fn spawn_collectible(
        &mut self,
        kind: CollectibleKind,
        pos: Vec2,
        vel: Vec2,
        _ctx: &SimulationContext,
    ) {
        let id = self.ids.next();
        let mut entity = Entity::new(
            id,
            EntityKind::Collectible(CollectibleState { kind }),
            pos,
            Vec2::new(12.0, 12.0),
        );
        entity.vel = vel;
        entity.solid = false;
        self.entities.push(entity);
    }

    /// Apply spawns queued during the entity pass.
    pub fn apply_spawns(&mut self, spawns: Vec<SpawnRequest>, ctx: &SimulationContext) {
        for request in spawns {
            match request {
                SpawnRequest::Projectile {
                    pos,
                    facing,
                    from_player,
                } => self.spawn_projectile(pos, facing, from_player, ctx),
                SpawnRequest::Collectible { kind, pos, vel } => {
                    self.spawn_collectible(kind, pos, vel, ctx)
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Frame upkeep
    // ------------------------------------------------------------------

    /// Remove inactive entities at end of frame. The player entity is kept
    /// even when inactive so its lives/tier survive for the owning scene.
    pub fn reap(&mut self) {
        let player_id = self.player_id;
        self.entities
            .retain(|e| e.active || e.id == player_id);
    }

    /// Raise the completion/defeat flags from this frame's end state.
    pub fn check_completion(&mut self, ctx: &mut SimulationContext) {
        let (in_exit, lives) = match self.player() {
            Some(p) => (
                p.active && p.aabb().overlaps(&self.exit),
                match &p.kind {
                    EntityKind::Player(state) => Some(state.lives),
                    _ => None,
                },
            ),
            None => (false, None),
        };
        if in_exit && !self.completed {
            self.completed = true;
            ctx.emit(SimEvent::Victory);
        }
        if lives == Some(0) {
            self.player_defeated = true;
        }
    }

    // ------------------------------------------------------------------
    // Read-only query surface for the renderer and scenes
    // ------------------------------------------------------------------

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn player(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == self.player_id)
    }

    pub(crate) fn player_index(&self) -> Option<usize> {
        self.entities.iter().position(|e| e.id == self.player_id)
    }

    /// Player hitbox center, when the player is alive.
    pub fn player_center(&self) -> Option<Vec2> {
        self.player()
            .filter(|p| p.active)
            .map(|p| p.aabb().center())
    }

    pub fn tile_at(&self, col: i32, row: i32) -> TileKind {
        self.grid.get(col, row)
    }
}

fn decode_tile(code: u8) -> TileKind {
    match code {
        0 => TileKind::Air,
        1 => TileKind::Solid,
        2 => TileKind::Platform,
        3 => TileKind::Breakable,
        4 => TileKind::Hazard,
        other => {
            log::warn!("unknown tile code {other}; treating as air");
            TileKind::Air
        }
    }
}

/// Deterministic fallback layout: solid ground with a hazard gap, a few
/// floating platforms and a breakable row. Used whenever level geometry is
/// missing or malformed.
fn default_layout(width: i32, height: i32) -> TileGrid {
    let mut grid = TileGrid::new(width, height);
    let floor = height - 3;

    grid.fill_row(floor, 0, width - 1, TileKind::Solid);
    grid.fill_row(floor + 1, 0, width - 1, TileKind::Solid);
    grid.fill_row(floor + 2, 0, width - 1, TileKind::Solid);

    // A spike strip one third of the way in; the rows beneath stay solid
    // so the strip hurts rather than swallows
    let gap = width / 3;
    for col in gap..(gap + 3).min(width - 1) {
        grid.set(col, floor, TileKind::Hazard);
    }

    // Floating platforms and a breakable run above the midpoint
    let deck = floor - 4;
    grid.fill_row(deck, gap - 4, gap + 6, TileKind::Platform);
    let mid = width / 2;
    grid.fill_row(deck - 2, mid, mid + 3, TileKind::Breakable);

    grid
}
