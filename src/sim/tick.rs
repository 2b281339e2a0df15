//! Frame advance: capped variable timestep and the fixed update order.
//!
//! One tick runs, in order: state machines + integration + tile resolution
//! for every entity, then the entity-vs-entity pass over post-tile-collision
//! positions, then spawns, reaping and the completion check. Nothing in here
//! blocks; the owning loop decides when the next frame happens.

use super::collision::{self, overlaps, resolve_entity_overlap, swept_impact_time};
use super::context::{SimEvent, SimulationContext};
use super::enemy;
use super::entity::{Entity, EntityKind, SpawnRequest};
use super::input::{Action, InputFrame};
use super::level::Level;
use super::physics;
use super::player;
use crate::consts::{MAX_FRAME_DT, REFERENCE_DT};

/// Advances the frame loop.
#[derive(Debug, Default)]
pub struct SimClock {
    pub frame: u64,
    pub paused: bool,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one frame. `dt_seconds` is wall time since the previous
    /// frame; runaway deltas are clamped, never propagated.
    pub fn advance(
        &mut self,
        level: &mut Level,
        ctx: &mut SimulationContext,
        input: &InputFrame,
        dt_seconds: f32,
    ) {
        if input.pressed(Action::Pause) {
            // The toggle frame itself never simulates
            self.paused = !self.paused;
            return;
        }
        if self.paused || level.completed || level.player_defeated {
            return;
        }
        self.frame += 1;

        let dt = dt_seconds.clamp(0.0, MAX_FRAME_DT);
        let dt_scale = dt / REFERENCE_DT;
        let dt_ms = dt * 1000.0;

        let player_center = level.player_center();
        let mut spawns: Vec<SpawnRequest> = Vec::new();

        // ------------------------------------------------------------------
        // Phase 1: state machine, integration, tile resolution, per entity.
        // Every entity finishes this phase before any pair is resolved, so
        // the pair pass always sees post-tile-collision positions.
        // ------------------------------------------------------------------
        let Level { grid, entities, .. } = level;
        for entity in entities.iter_mut() {
            if !entity.active {
                continue;
            }

            let spawn = match &mut entity.kind {
                EntityKind::Player(_) => player::control(entity, input, ctx, dt_ms, dt_scale),
                EntityKind::Enemy(_) => {
                    enemy::intent(entity, grid, ctx, player_center, dt_ms)
                }
                EntityKind::Projectile(state) => {
                    state.lifetime.tick(dt_ms);
                    if state.lifetime.expired() {
                        entity.active = false;
                    } else {
                        // Re-assert flight speed against air friction
                        let speed = if state.from_player {
                            ctx.tuning.projectile_speed
                        } else {
                            ctx.tuning.projectile_speed * 0.6
                        };
                        entity.vel.x = state.facing.sign() * speed;
                    }
                    None
                }
                EntityKind::Collectible(_) => None,
            };
            if let Some(request) = spawn {
                spawns.push(request);
            }
            if !entity.active {
                continue;
            }

            physics::integrate(entity, &ctx.tuning, dt_scale);
            let contact = collision::resolve_against_tiles(entity, grid);

            match &entity.kind {
                EntityKind::Player(_) => {
                    if let Some(request) = player::apply_tile_contact(entity, &contact, grid, ctx)
                    {
                        spawns.push(request);
                    }
                }
                EntityKind::Enemy(_) => enemy::react(entity, &contact, ctx),
                EntityKind::Projectile(_) => {
                    // Projectiles die on any blocking contact or on leaving
                    // the level
                    if contact.hit_left
                        || contact.hit_right
                        || contact.hit_ceiling
                        || contact.landed
                        || contact.below_level
                    {
                        entity.active = false;
                    }
                }
                EntityKind::Collectible(_) => {
                    if contact.below_level {
                        entity.active = false;
                    }
                }
            }
        }

        // ------------------------------------------------------------------
        // Phase 2: entity-vs-entity resolution
        // ------------------------------------------------------------------
        self.resolve_pairs(level, ctx, dt_scale);

        // ------------------------------------------------------------------
        // Phase 3: deferred spawns, reap, completion
        // ------------------------------------------------------------------
        level.apply_spawns(spawns, ctx);
        level.reap();
        level.check_completion(ctx);
    }

    fn resolve_pairs(&mut self, level: &mut Level, ctx: &mut SimulationContext, dt_scale: f32) {
        let Some(player_idx) = level.player_index() else {
            return;
        };

        // Player vs enemies and pickups
        for idx in 0..level.entities.len() {
            if idx == player_idx {
                continue;
            }
            let (player, other) = pair_mut(&mut level.entities, player_idx, idx);
            if !player.active || !other.active {
                continue;
            }

            match &other.kind {
                EntityKind::Enemy(state) => {
                    if !overlaps(player, other) {
                        continue;
                    }
                    // Approach geometry decides stomp vs. hit: bottom edge
                    // near the target's top, moving downward
                    let tol = ctx.tuning.stomp_tolerance + player.vel.y.max(0.0) * dt_scale;
                    let stomp = player.vel.y >= 0.0
                        && player.aabb().bottom() - other.aabb().top() <= tol;
                    if stomp {
                        ctx.emit(SimEvent::Stomp);
                        let value = state.score_value();
                        if enemy::take_damage(other, 1, ctx) {
                            level.score += value;
                        }
                        player::bounce(player, ctx);
                    } else {
                        if !state.harmless() {
                            player::take_damage(player, ctx);
                        }
                        if other.solid {
                            resolve_entity_overlap(player, other);
                        }
                    }
                }
                EntityKind::Collectible(state) => {
                    if !overlaps(player, other) {
                        continue;
                    }
                    match state.kind {
                        super::entity::CollectibleKind::Coin => {
                            level.coins += 1;
                            level.score += 200;
                            ctx.emit(SimEvent::Coin);
                        }
                        super::entity::CollectibleKind::Power => {
                            player::power_up(player, ctx);
                            level.score += 1000;
                        }
                        super::entity::CollectibleKind::OneUp => {
                            if let EntityKind::Player(p) = &mut player.kind {
                                p.lives += 1;
                            }
                            ctx.emit(SimEvent::OneUp);
                        }
                    }
                    other.active = false;
                }
                EntityKind::Projectile(state) => {
                    if state.from_player {
                        continue;
                    }
                    if overlaps(player, other) {
                        player::take_damage(player, ctx);
                        other.active = false;
                    }
                }
                EntityKind::Player(_) => {}
            }
        }

        // Player projectiles vs enemies, swept so fast throws cannot tunnel
        // through a thin target in one frame
        for proj_idx in 0..level.entities.len() {
            let (damage, delta, start_box) = match &level.entities[proj_idx] {
                e if e.active => match &e.kind {
                    EntityKind::Projectile(p) if p.from_player => {
                        let delta = e.vel * dt_scale;
                        let mut start = e.aabb();
                        start.pos -= delta;
                        (p.damage, delta, start)
                    }
                    _ => continue,
                },
                _ => continue,
            };

            for enemy_idx in 0..level.entities.len() {
                if enemy_idx == proj_idx {
                    continue;
                }
                let (proj, target) = pair_mut(&mut level.entities, proj_idx, enemy_idx);
                if !target.active || !matches!(target.kind, EntityKind::Enemy(_)) {
                    continue;
                }
                let t = swept_impact_time(&start_box, delta, &target.aabb());
                if t < 1.0 {
                    let value = match &target.kind {
                        EntityKind::Enemy(state) => state.score_value(),
                        _ => 0,
                    };
                    if enemy::take_damage(target, damage, ctx) {
                        level.score += value;
                    }
                    proj.active = false;
                    break;
                }
            }
        }
    }
}

/// Disjoint mutable access to two entities in the same list.
fn pair_mut(entities: &mut [Entity], a: usize, b: usize) -> (&mut Entity, &mut Entity) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = entities.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = entities.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}
