//! Enemy behavior variants and boss phases.
//!
//! Every kind shares the same physics and collision pipeline; only the
//! intent (velocity/timers before integration) and the reaction to contact
//! facts differ. Dispatch is a match on the behavior variant.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::TileContact;
use super::context::{SimEvent, SimulationContext};
use super::entity::{Entity, EntityId, EntityKind, Facing, SpawnRequest, Timer};
use super::grid::TileGrid;

/// Boss attack patterns, one per phase window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    Charge,
    Leap,
    Ranged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossState {
    pub phase: BossPhase,
    pub enraged: bool,
    /// Shot spacing while in the ranged phase.
    pub fire_cooldown: Timer,
}

/// Behavior variant plus its variant-specific bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EnemyBehavior {
    /// Constant walk; reverses on wall hit or ledge.
    Patrol,
    /// Stationary, toggling between a harmless dormant half-period and a
    /// hazardous active one.
    Sentinel { dormant: bool },
    /// Patrol that re-launches itself every time it regains the ground.
    Hopper,
    /// Tile-collision exempt; sinusoidal vertical path around its origin.
    Flyer { origin: Vec2, phase_ms: f32 },
    Boss(BossState),
}

impl EnemyBehavior {
    pub fn name(&self) -> &'static str {
        match self {
            EnemyBehavior::Patrol => "patrol",
            EnemyBehavior::Sentinel { .. } => "sentinel",
            EnemyBehavior::Hopper => "hopper",
            EnemyBehavior::Flyer { .. } => "flyer",
            EnemyBehavior::Boss(_) => "boss",
        }
    }
}

/// Kind-specific payload for enemy entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyState {
    pub behavior: EnemyBehavior,
    pub health: i32,
    pub max_health: i32,
    pub direction: Facing,
    pub timer: Timer,
}

impl EnemyState {
    fn new(behavior: EnemyBehavior, health: i32, timer_ms: f32) -> Self {
        Self {
            behavior,
            health,
            max_health: health,
            direction: Facing::Left,
            timer: Timer::new(timer_ms),
        }
    }

    pub fn alive(&self) -> bool {
        self.health > 0
    }

    /// Score awarded when this enemy is defeated.
    pub fn score_value(&self) -> u32 {
        match self.behavior {
            EnemyBehavior::Patrol => 100,
            EnemyBehavior::Sentinel { .. } => 150,
            EnemyBehavior::Hopper => 150,
            EnemyBehavior::Flyer { .. } => 200,
            EnemyBehavior::Boss(_) => 5000,
        }
    }

    /// A dormant sentinel's contact is harmless.
    pub fn harmless(&self) -> bool {
        matches!(self.behavior, EnemyBehavior::Sentinel { dormant: true })
    }
}

/// Build an enemy entity at a world position from a level-data type name.
/// Unknown names are skipped by the caller.
pub fn make_entity(
    id: EntityId,
    type_name: &str,
    pos: Vec2,
    ctx: &SimulationContext,
) -> Option<Entity> {
    let tuning = &ctx.tuning;
    let (state, size) = match type_name {
        "patrol" => (
            EnemyState::new(EnemyBehavior::Patrol, 1, 0.0),
            Vec2::new(14.0, 14.0),
        ),
        "sentinel" => {
            let mut state = EnemyState::new(
                EnemyBehavior::Sentinel { dormant: false },
                2,
                tuning.sentinel_period_ms,
            );
            state.timer.arm();
            (state, Vec2::new(16.0, 16.0))
        }
        "hopper" => (
            EnemyState::new(EnemyBehavior::Hopper, 1, 0.0),
            Vec2::new(14.0, 14.0),
        ),
        "flyer" => (
            EnemyState::new(
                EnemyBehavior::Flyer {
                    origin: pos,
                    phase_ms: 0.0,
                },
                1,
                0.0,
            ),
            Vec2::new(14.0, 12.0),
        ),
        "boss" => {
            let mut state = EnemyState::new(
                EnemyBehavior::Boss(BossState {
                    phase: BossPhase::Charge,
                    enraged: false,
                    fire_cooldown: Timer::new(600.0),
                }),
                12,
                tuning.boss_phase_ms,
            );
            state.timer.arm();
            (state, Vec2::new(28.0, 30.0))
        }
        _ => return None,
    };

    let mut entity = Entity::new(id, EntityKind::Enemy(state), pos, size);
    if type_name == "flyer" {
        entity.gravity_scale = 0.0;
        entity.collides_tiles = false;
    }
    Some(entity)
}

/// Set this frame's velocity and timers before integration. Bosses may
/// return a projectile spawn.
pub fn intent(
    entity: &mut Entity,
    grid: &TileGrid,
    ctx: &mut SimulationContext,
    player_center: Option<Vec2>,
    dt_ms: f32,
) -> Option<SpawnRequest> {
    let center = entity.aabb().center();
    let bb = entity.aabb();
    let Entity { kind, vel, pos, on_ground, .. } = entity;
    let EntityKind::Enemy(state) = kind else {
        return None;
    };
    if !state.alive() {
        return None;
    }
    state.timer.tick(dt_ms);

    match &mut state.behavior {
        EnemyBehavior::Patrol | EnemyBehavior::Hopper => {
            // Turn at ledges before walking off them
            if *on_ground && ledge_ahead(&bb, state.direction, grid) {
                state.direction = state.direction.flip();
            }
            vel.x = state.direction.sign() * ctx.tuning.patrol_speed;
        }
        EnemyBehavior::Sentinel { dormant } => {
            vel.x = 0.0;
            if state.timer.expired() {
                *dormant = !*dormant;
                state.timer.arm();
            }
        }
        EnemyBehavior::Flyer { origin, phase_ms } => {
            *phase_ms += dt_ms;
            let cycle = *phase_ms / ctx.tuning.flyer_period_ms * std::f32::consts::TAU;
            vel.x = state.direction.sign() * ctx.tuning.flyer_speed;
            vel.y = 0.0;
            pos.y = origin.y + cycle.sin() * ctx.tuning.flyer_amplitude;
            if pos.x < origin.x - ctx.tuning.flyer_range {
                state.direction = Facing::Right;
            } else if pos.x > origin.x + ctx.tuning.flyer_range {
                state.direction = Facing::Left;
            }
        }
        EnemyBehavior::Boss(boss) => {
            let rage = if boss.enraged {
                ctx.tuning.boss_enrage_scale
            } else {
                1.0
            };

            // Phase timer drives attack-pattern selection
            if state.timer.expired() {
                boss.phase = match ctx.rng.random_range(0..3u8) {
                    0 => BossPhase::Charge,
                    1 => BossPhase::Leap,
                    _ => BossPhase::Ranged,
                };
                state
                    .timer
                    .arm_for(ctx.tuning.boss_phase_ms / rage);
                if boss.phase == BossPhase::Leap && *on_ground {
                    vel.y = ctx.tuning.boss_leap_impulse;
                    *on_ground = false;
                }
            }

            if let Some(target) = player_center {
                state.direction = if target.x < center.x {
                    Facing::Left
                } else {
                    Facing::Right
                };
            }

            boss.fire_cooldown.tick(dt_ms);
            match boss.phase {
                BossPhase::Charge => {
                    vel.x = state.direction.sign() * ctx.tuning.boss_charge_speed * rage;
                }
                BossPhase::Leap => {
                    vel.x = state.direction.sign() * ctx.tuning.boss_charge_speed * 0.6 * rage;
                }
                BossPhase::Ranged => {
                    vel.x = 0.0;
                    if boss.fire_cooldown.expired() && player_center.is_some() {
                        boss.fire_cooldown.arm_for(600.0 / rage);
                        let facing = state.direction;
                        let muzzle = Vec2::new(
                            match facing {
                                Facing::Right => bb.right(),
                                Facing::Left => bb.left() - 6.0,
                            },
                            center.y,
                        );
                        return Some(SpawnRequest::Projectile {
                            pos: muzzle,
                            facing,
                            from_player: false,
                        });
                    }
                }
            }
        }
    }
    None
}

/// React to this frame's tile-contact facts.
pub fn react(entity: &mut Entity, contact: &TileContact, ctx: &mut SimulationContext) {
    let Entity {
        kind,
        vel,
        active,
        on_ground,
        ..
    } = entity;
    let EntityKind::Enemy(state) = kind else {
        return;
    };

    // Enemies falling outside the level are quietly destroyed
    if contact.below_level {
        *active = false;
        return;
    }

    let is_hopper = matches!(state.behavior, EnemyBehavior::Hopper);
    match &mut state.behavior {
        EnemyBehavior::Patrol | EnemyBehavior::Hopper | EnemyBehavior::Boss(_) => {
            if contact.hit_left {
                state.direction = Facing::Right;
            } else if contact.hit_right {
                state.direction = Facing::Left;
            }
        }
        _ => {}
    }
    if is_hopper && contact.landed {
        vel.y = ctx.tuning.hopper_impulse;
        *on_ground = false;
    }
}

/// Apply damage; returns true when this hit defeated the enemy. The boss's
/// one-shot enrage transition happens here so it keys off real health, not
/// the phase clock.
pub fn take_damage(entity: &mut Entity, amount: i32, ctx: &mut SimulationContext) -> bool {
    let EntityKind::Enemy(state) = &mut entity.kind else {
        return false;
    };
    if !state.alive() {
        return false;
    }
    state.health -= amount;

    if state.health <= 0 {
        entity.active = false;
        ctx.emit(SimEvent::EnemyDeath);
        return true;
    }

    if let EnemyBehavior::Boss(boss) = &mut state.behavior {
        let threshold = (state.max_health as f32 * ctx.tuning.boss_enrage_fraction).ceil() as i32;
        if !boss.enraged && state.health <= threshold {
            boss.enraged = true;
            ctx.emit(SimEvent::BossEnraged);
        }
    }
    false
}

/// Whether the tile one step ahead and one below the leading edge can
/// support a walker.
fn ledge_ahead(bb: &super::entity::Aabb, direction: Facing, grid: &TileGrid) -> bool {
    let probe_x = match direction {
        Facing::Left => bb.left() - 1.0,
        Facing::Right => bb.right() + 1.0,
    };
    let col = TileGrid::col_at(probe_x);
    let row = TileGrid::row_at(bb.bottom() + 1.0);
    if row >= grid.height() {
        return true;
    }
    !grid.get(col, row).supports_from_above()
}
