//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Capped variable timestep, normalized to a 60 Hz reference frame
//! - Seeded RNG only (owned by [`SimulationContext`])
//! - Stable iteration order (entities stored in insertion order, no hash
//!   containers)
//! - No rendering, audio or platform dependencies; side effects surface as
//!   [`SimEvent`]s for collaborators to drain

pub mod collision;
pub mod context;
pub mod enemy;
pub mod entity;
pub mod grid;
pub mod input;
pub mod level;
pub mod physics;
pub mod player;
pub mod tick;

pub use collision::{
    ContactAxis, EntityContact, TileContact, overlaps, resolve_entity_overlap, swept_impact_time,
};
pub use context::{SimEvent, SimulationContext};
pub use enemy::{BossPhase, BossState, EnemyBehavior, EnemyState};
pub use entity::{
    Aabb, CollectibleKind, CollectibleState, Entity, EntityId, EntityIdGenerator, EntityKind,
    Facing, ProjectileState, SpawnRequest, Timer,
};
pub use grid::{TileGrid, TileKind};
pub use input::{Action, InputFrame};
pub use level::{Level, LevelData, Placement, TilePoint};
pub use player::{PlayerAction, PlayerState, PowerTier};
pub use tick::SimClock;
