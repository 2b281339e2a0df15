//! Entity storage types.
//!
//! Entities are a flat record plus a `kind` discriminant carrying the
//! kind-specific payload; behavior is dispatched by matching on the kind,
//! not through an inheritance chain. Storage is array-based so iteration
//! order is stable within a frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::EnemyState;
use super::player::PlayerState;

/// Unique identifier for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Hands out entity IDs in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityIdGenerator {
    next_id: u32,
}

impl Default for EntityIdGenerator {
    fn default() -> Self {
        Self { next_id: 1 }
    }
}

impl EntityIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Axis-aligned bounding box, the only collision shape in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    pub fn left(&self) -> f32 {
        self.pos.x
    }

    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    pub fn top(&self) -> f32 {
        self.pos.y
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Symmetric overlap test; touching edges do not count as overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Penetration depth on each axis, positive only when overlapping.
    pub fn overlap_depth(&self, other: &Aabb) -> Vec2 {
        let dx = (self.right().min(other.right()) - self.left().max(other.left())).max(0.0);
        let dy = (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.0);
        Vec2::new(dx, dy)
    }

}

/// Countdown timer in milliseconds. One type for every window the sim
/// tracks: coyote, jump buffer, invulnerability, cooldowns, boss phases.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Timer {
    pub remaining_ms: f32,
    pub duration_ms: f32,
}

impl Timer {
    /// An expired timer that remembers its duration for later `arm` calls.
    pub fn new(duration_ms: f32) -> Self {
        Self {
            remaining_ms: 0.0,
            duration_ms,
        }
    }

    /// Start (or restart) the countdown at the stored duration.
    pub fn arm(&mut self) {
        self.remaining_ms = self.duration_ms;
    }

    /// Start the countdown with an explicit duration.
    pub fn arm_for(&mut self, duration_ms: f32) {
        self.duration_ms = duration_ms;
        self.remaining_ms = duration_ms;
    }

    /// Advance the countdown. Clamps at zero.
    pub fn tick(&mut self, dt_ms: f32) {
        self.remaining_ms = (self.remaining_ms - dt_ms).max(0.0);
    }

    pub fn active(&self) -> bool {
        self.remaining_ms > 0.0
    }

    pub fn expired(&self) -> bool {
        self.remaining_ms <= 0.0
    }

    pub fn clear(&mut self) {
        self.remaining_ms = 0.0;
    }

    /// Fraction of the window elapsed, in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            1.0 - (self.remaining_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }
}

/// Which way an entity faces / moves horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Projectile payload: dies on lifetime expiry, on leaving the world, or on
/// hit. Keeps its own facing so flight speed can be re-asserted each frame
/// against air friction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileState {
    pub lifetime: Timer,
    pub from_player: bool,
    pub damage: i32,
    pub facing: Facing,
}

/// Collectible types spawned from broken tiles or placed in level data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectibleKind {
    Coin,
    /// Raises the player's power tier by one.
    Power,
    OneUp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectibleState {
    pub kind: CollectibleKind,
}

/// Deferred spawn produced by a state machine mid-tick and applied by the
/// level once the entity pass is over, so spawning never mutates the entity
/// list while it is being iterated.
#[derive(Debug, Clone, Copy)]
pub enum SpawnRequest {
    Projectile {
        pos: Vec2,
        facing: Facing,
        from_player: bool,
    },
    Collectible {
        kind: CollectibleKind,
        pos: Vec2,
        vel: Vec2,
    },
}

/// Kind discriminant plus kind-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    Player(PlayerState),
    Enemy(EnemyState),
    Projectile(ProjectileState),
    Collectible(CollectibleState),
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Player(_) => "player",
            EntityKind::Enemy(e) => e.behavior.name(),
            EntityKind::Projectile(_) => "projectile",
            EntityKind::Collectible(c) => match c.kind {
                CollectibleKind::Coin => "coin",
                CollectibleKind::Power => "power",
                CollectibleKind::OneUp => "one_up",
            },
        }
    }
}

/// A simulated entity. `pos` is the top-left corner of the sprite box in
/// world pixels; the hitbox may be inset from the sprite box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Sprite box size. Always positive on both axes.
    pub size: Vec2,
    /// Hitbox offset from `pos`.
    pub hitbox_offset: Vec2,
    /// Hitbox size; defaults to the sprite box.
    pub hitbox_size: Vec2,
    /// Per-entity gravity multiplier (flyers use 0, the player uses a
    /// reduced value while holding jump on the way up).
    pub gravity_scale: f32,
    /// Whether this entity participates in tile collision.
    pub collides_tiles: bool,
    pub active: bool,
    pub solid: bool,
    pub on_ground: bool,
    /// Bottom edge at the start of the frame, used for one-way platform
    /// crossing tests.
    pub prev_bottom: f32,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, pos: Vec2, size: Vec2) -> Self {
        debug_assert!(size.x > 0.0 && size.y > 0.0, "entity size must be positive");
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            size,
            hitbox_offset: Vec2::ZERO,
            hitbox_size: size,
            gravity_scale: 1.0,
            collides_tiles: true,
            active: true,
            solid: true,
            on_ground: false,
            prev_bottom: pos.y + size.y,
        }
    }

    /// The collision box at the current position.
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos + self.hitbox_offset, self.hitbox_size)
    }

    /// Resize the sprite box in place, keeping the bottom edge fixed so a
    /// tier change doesn't clip the entity into the floor.
    pub fn resize_keep_feet(&mut self, size: Vec2) {
        debug_assert!(size.x > 0.0 && size.y > 0.0, "entity size must be positive");
        let bottom = self.pos.y + self.size.y;
        let center_x = self.pos.x + self.size.x * 0.5;
        self.size = size;
        self.hitbox_size = size;
        self.pos.y = bottom - size.y;
        self.pos.x = center_x - size.x * 0.5;
    }

    /// Animation state name for the renderer.
    pub fn animation(&self) -> &'static str {
        match &self.kind {
            EntityKind::Player(p) => p.action.name(),
            _ => self.kind.name(),
        }
    }
}
