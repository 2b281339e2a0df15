//! Player state machine.
//!
//! Owns the jump feel: coyote time, jump buffering and variable height all
//! run through [`Timer`] windows so the logic stays a handful of compares.
//! Damage, tier changes and tile breaking are handled here too; the physics
//! and collision layers only ever report facts.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::TileContact;
use super::context::{SimEvent, SimulationContext};
use super::entity::{CollectibleKind, Entity, EntityKind, Facing, SpawnRequest, Timer};
use super::grid::{TileGrid, TileKind};
use super::input::{Action, InputFrame};
use crate::approach;
use crate::consts::TILE_SIZE;

/// Player movement/animation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    Idle,
    Walk,
    Run,
    Crouch,
    Jump,
    Fall,
    Hurt,
    Dead,
}

impl PlayerAction {
    pub fn name(self) -> &'static str {
        match self {
            PlayerAction::Idle => "idle",
            PlayerAction::Walk => "walk",
            PlayerAction::Run => "run",
            PlayerAction::Crouch => "crouch",
            PlayerAction::Jump => "jump",
            PlayerAction::Fall => "fall",
            PlayerAction::Hurt => "hurt",
            PlayerAction::Dead => "dead",
        }
    }
}

/// Power tier: changes the bounding box and unlocks the ranged attack at
/// the top tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerTier {
    Base,
    Tier2,
    Tier3,
}

impl PowerTier {
    pub fn box_size(self) -> Vec2 {
        match self {
            PowerTier::Base => Vec2::new(12.0, 14.0),
            PowerTier::Tier2 | PowerTier::Tier3 => Vec2::new(12.0, 26.0),
        }
    }

    pub fn raised(self) -> Self {
        match self {
            PowerTier::Base => PowerTier::Tier2,
            PowerTier::Tier2 | PowerTier::Tier3 => PowerTier::Tier3,
        }
    }

    pub fn lowered(self) -> Self {
        match self {
            PowerTier::Base | PowerTier::Tier2 => PowerTier::Base,
            PowerTier::Tier3 => PowerTier::Tier2,
        }
    }

    /// Minimum tier able to break breakable tiles with a head bump.
    pub fn can_break_tiles(self) -> bool {
        self >= PowerTier::Tier2
    }

    pub fn can_throw(self) -> bool {
        self == PowerTier::Tier3
    }
}

/// Kind-specific payload for the player entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub action: PlayerAction,
    pub tier: PowerTier,
    pub lives: u32,
    pub facing: Facing,
    /// Re-armed every grounded frame; its tail is the post-ledge jump grace.
    pub coyote: Timer,
    /// Armed on every jump press; executes when a grounded frame arrives.
    pub jump_buffer: Timer,
    pub invuln: Timer,
    pub hurt: Timer,
    pub throw_cooldown: Timer,
}

impl PlayerState {
    pub fn new(tuning: &crate::tuning::Tuning) -> Self {
        Self {
            action: PlayerAction::Idle,
            tier: PowerTier::Base,
            lives: 3,
            facing: Facing::Right,
            coyote: Timer::new(tuning.coyote_ms),
            jump_buffer: Timer::new(tuning.jump_buffer_ms),
            invuln: Timer::new(tuning.invuln_ms),
            hurt: Timer::new(tuning.hurt_ms),
            throw_cooldown: Timer::new(tuning.throw_cooldown_ms),
        }
    }

    pub fn alive(&self) -> bool {
        self.action != PlayerAction::Dead
    }
}

/// Drive the player from this frame's input. Runs before integration;
/// returns any spawn the level must apply after the entity pass.
pub fn control(
    entity: &mut Entity,
    input: &InputFrame,
    ctx: &mut SimulationContext,
    dt_ms: f32,
    dt_scale: f32,
) -> Option<SpawnRequest> {
    let Entity {
        kind,
        vel,
        on_ground,
        gravity_scale,
        pos,
        size,
        ..
    } = entity;
    let EntityKind::Player(state) = kind else {
        return None;
    };
    if !state.alive() {
        return None;
    }

    state.coyote.tick(dt_ms);
    state.jump_buffer.tick(dt_ms);
    state.invuln.tick(dt_ms);
    state.hurt.tick(dt_ms);
    state.throw_cooldown.tick(dt_ms);

    if *on_ground {
        state.coyote.arm();
    }

    let stunned = state.hurt.active();
    if !stunned && state.action == PlayerAction::Hurt {
        state.action = if *on_ground { PlayerAction::Idle } else { PlayerAction::Fall };
    }

    let running = input.is_down(Action::Run);
    let axis = if stunned { 0.0 } else { input.horizontal() };
    let crouching = !stunned && *on_ground && input.is_down(Action::Down) && axis == 0.0;

    // Horizontal drive toward the speed cap for the current mode
    if axis != 0.0 && !crouching {
        let accel = if *on_ground {
            ctx.tuning.ground_accel
        } else {
            ctx.tuning.air_accel
        };
        let target = axis * ctx.tuning.max_run_speed(running);
        vel.x = approach(vel.x, target, accel * dt_scale);
        state.facing = if axis < 0.0 { Facing::Left } else { Facing::Right };
    }

    // Jump: buffer the press, honor it while grounded or inside the coyote
    // window. A request with neither window open just times out quietly.
    if !stunned && input.pressed(Action::Jump) {
        state.jump_buffer.arm();
    }
    if state.jump_buffer.active() && (*on_ground || state.coyote.active()) {
        vel.y = ctx.tuning.jump_impulse_for(vel.x);
        *on_ground = false;
        state.coyote.clear();
        state.jump_buffer.clear();
        state.action = PlayerAction::Jump;
        ctx.emit(SimEvent::Jump);
    }

    // Variable height: reduced gravity while ascending with jump held
    *gravity_scale = if vel.y < 0.0 && input.is_down(Action::Jump) {
        ctx.tuning.hold_gravity_scale
    } else {
        1.0
    };

    // Ranged attack, Tier3 only
    let mut spawn = None;
    if !stunned
        && state.tier.can_throw()
        && input.pressed(Action::Throw)
        && state.throw_cooldown.expired()
    {
        state.throw_cooldown.arm();
        ctx.emit(SimEvent::Throw);
        let muzzle = Vec2::new(
            match state.facing {
                Facing::Right => pos.x + size.x,
                Facing::Left => pos.x - 6.0,
            },
            pos.y + size.y * 0.35,
        );
        spawn = Some(SpawnRequest::Projectile {
            pos: muzzle,
            facing: state.facing,
            from_player: true,
        });
    }

    // Animation state
    if state.action != PlayerAction::Hurt {
        state.action = if !*on_ground {
            if vel.y < 0.0 { PlayerAction::Jump } else { PlayerAction::Fall }
        } else if crouching {
            PlayerAction::Crouch
        } else if vel.x.abs() > ctx.tuning.velocity_epsilon {
            if running { PlayerAction::Run } else { PlayerAction::Walk }
        } else {
            PlayerAction::Idle
        };
    }

    spawn
}

/// Convert this frame's tile-contact facts into player policy: landing
/// state, hazard damage, head-bump tile breaking, death-pit loss.
pub fn apply_tile_contact(
    entity: &mut Entity,
    contact: &TileContact,
    grid: &mut TileGrid,
    ctx: &mut SimulationContext,
) -> Option<SpawnRequest> {
    let mut spawn = None;

    // Head bump: breaking is gated on power tier and happens here, as a
    // state-machine side effect, never inside the passive resolver
    if contact.hit_ceiling {
        if let Some((col, row)) = contact.ceiling_tile {
            let tier = match &entity.kind {
                EntityKind::Player(state) => state.tier,
                _ => return None,
            };
            if grid.get(col, row) == TileKind::Breakable && tier.can_break_tiles() {
                grid.set(col, row, TileKind::Air);
                ctx.emit(SimEvent::Break);
                spawn = Some(SpawnRequest::Collectible {
                    kind: roll_drop(ctx),
                    pos: Vec2::new(col as f32 * TILE_SIZE + 2.0, (row - 1) as f32 * TILE_SIZE),
                    vel: Vec2::new(0.0, ctx.tuning.collectible_pop),
                });
            }
        }
    }

    if contact.on_hazard {
        take_damage(entity, ctx);
    }

    if contact.below_level {
        lose_to_pit(entity, ctx);
    }

    spawn
}

/// Weighted drop table for broken tiles: 60% coin, 30% power item, 10%
/// extra life. Drawn from the context RNG so runs stay deterministic.
fn roll_drop(ctx: &mut SimulationContext) -> CollectibleKind {
    let roll: f32 = ctx.rng.random();
    if roll < 0.6 {
        CollectibleKind::Coin
    } else if roll < 0.9 {
        CollectibleKind::Power
    } else {
        CollectibleKind::OneUp
    }
}

/// One hit. The invulnerability window makes repeat overlap a no-op; above
/// the base tier a hit costs a tier, at base it costs a life.
pub fn take_damage(entity: &mut Entity, ctx: &mut SimulationContext) {
    let EntityKind::Player(state) = &mut entity.kind else {
        return;
    };
    if !state.alive() || state.invuln.active() {
        return;
    }

    ctx.emit(SimEvent::Hurt);
    if state.tier != PowerTier::Base {
        state.tier = state.tier.lowered();
        ctx.emit(SimEvent::PowerDown);
        let new_size = state.tier.box_size();
        state.invuln.arm();
        state.hurt.arm();
        state.action = PlayerAction::Hurt;
        entity.resize_keep_feet(new_size);
        return;
    }

    state.lives = state.lives.saturating_sub(1);
    if state.lives == 0 {
        state.action = PlayerAction::Dead;
        entity.active = false;
        ctx.emit(SimEvent::PlayerDefeated);
    } else {
        state.invuln.arm();
        state.hurt.arm();
        state.action = PlayerAction::Hurt;
    }
}

/// Falling past the level bottom costs a life outright, ignoring the
/// invulnerability window; the owning scene decides respawn or game over.
pub fn lose_to_pit(entity: &mut Entity, ctx: &mut SimulationContext) {
    let EntityKind::Player(state) = &mut entity.kind else {
        entity.active = false;
        return;
    };
    if !state.alive() {
        return;
    }
    state.lives = state.lives.saturating_sub(1);
    state.action = PlayerAction::Dead;
    entity.active = false;
    if state.lives == 0 {
        ctx.emit(SimEvent::PlayerDefeated);
    }
}

/// Upward bounce after a stomp.
pub fn bounce(entity: &mut Entity, ctx: &SimulationContext) {
    entity.vel.y = ctx.tuning.stomp_bounce;
    entity.on_ground = false;
    if let EntityKind::Player(state) = &mut entity.kind {
        state.action = PlayerAction::Jump;
    }
}

/// Raise the power tier by one (power collectible). The box grows, so tile
/// collision re-runs next frame with the new bounds.
pub fn power_up(entity: &mut Entity, ctx: &mut SimulationContext) {
    let EntityKind::Player(state) = &mut entity.kind else {
        return;
    };
    let before = state.tier;
    state.tier = state.tier.raised();
    ctx.emit(SimEvent::PowerUp);
    if state.tier != before {
        let new_size = state.tier.box_size();
        entity.resize_keep_feet(new_size);
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EntityId;
    use crate::tuning::Tuning;

    const FRAME_MS: f32 = 1000.0 / 60.0;

    fn setup() -> (Entity, SimulationContext) {
        let tuning = Tuning::default();
        let state = PlayerState::new(&tuning);
        let mut entity = Entity::new(
            EntityId(1),
            EntityKind::Player(state),
            Vec2::new(100.0, 100.0),
            PowerTier::Base.box_size(),
        );
        entity.on_ground = true;
        (entity, SimulationContext::new(7, tuning))
    }

    fn step(entity: &mut Entity, input: &InputFrame, ctx: &mut SimulationContext) {
        control(entity, input, ctx, FRAME_MS, 1.0);
    }

    fn idle() -> InputFrame {
        let mut input = InputFrame::new();
        input.step(0);
        input
    }

    fn jump_press() -> InputFrame {
        let mut input = InputFrame::new();
        input.step(InputFrame::pack(&[Action::Jump]));
        input
    }

    #[test]
    fn grounded_jump_executes() {
        let (mut player, mut ctx) = setup();
        step(&mut player, &jump_press(), &mut ctx);
        assert!(player.vel.y < 0.0);
        assert!(!player.on_ground);
        assert!(ctx.events().contains(&SimEvent::Jump));
    }

    #[test]
    fn jump_within_coyote_window_succeeds() {
        let (mut player, mut ctx) = setup();
        step(&mut player, &idle(), &mut ctx); // arms coyote while grounded
        player.on_ground = false;

        // Six airborne frames (~100 ms) keep us inside the 120 ms window
        for _ in 0..6 {
            step(&mut player, &idle(), &mut ctx);
        }
        step(&mut player, &jump_press(), &mut ctx);
        assert!(player.vel.y < 0.0, "coyote jump should have fired");
    }

    #[test]
    fn jump_after_coyote_window_fails() {
        let (mut player, mut ctx) = setup();
        step(&mut player, &idle(), &mut ctx);
        player.on_ground = false;

        // Nine airborne frames (~150 ms) put us past the window
        for _ in 0..9 {
            step(&mut player, &idle(), &mut ctx);
        }
        step(&mut player, &jump_press(), &mut ctx);
        assert_eq!(player.vel.y, 0.0, "stale jump must be a silent no-op");
    }

    #[test]
    fn buffered_jump_fires_on_landing() {
        let (mut player, mut ctx) = setup();
        step(&mut player, &idle(), &mut ctx);
        player.on_ground = false;
        // Drain the coyote window first so only the buffer can honor the press
        for _ in 0..9 {
            step(&mut player, &idle(), &mut ctx);
        }

        // Press in the air, shortly before landing
        step(&mut player, &jump_press(), &mut ctx);
        assert_eq!(player.vel.y, 0.0);

        // Land three frames later (~50 ms), inside the 100 ms buffer
        for _ in 0..2 {
            step(&mut player, &idle(), &mut ctx);
        }
        player.on_ground = true;
        step(&mut player, &idle(), &mut ctx);
        assert!(player.vel.y < 0.0, "buffered jump should execute at landing");
    }

    #[test]
    fn early_press_outlives_buffer() {
        let (mut player, mut ctx) = setup();
        step(&mut player, &idle(), &mut ctx);
        player.on_ground = false;
        for _ in 0..9 {
            step(&mut player, &idle(), &mut ctx);
        }

        step(&mut player, &jump_press(), &mut ctx);
        // Stay airborne past the buffer window (~117 ms)
        for _ in 0..7 {
            step(&mut player, &idle(), &mut ctx);
        }
        player.on_ground = true;
        step(&mut player, &idle(), &mut ctx);
        assert_eq!(player.vel.y, 0.0, "expired buffer must not jump");
    }

    #[test]
    fn hold_reduces_gravity_while_ascending() {
        let (mut player, mut ctx) = setup();
        let mut held = jump_press();
        step(&mut player, &held, &mut ctx);
        assert!(player.vel.y < 0.0);
        assert_eq!(player.gravity_scale, ctx.tuning.hold_gravity_scale);

        // Release: full gravity returns immediately
        held.step(0);
        step(&mut player, &held, &mut ctx);
        assert_eq!(player.gravity_scale, 1.0);
    }

    #[test]
    fn base_tier_hit_costs_a_life() {
        let (mut player, mut ctx) = setup();
        take_damage(&mut player, &mut ctx);
        let EntityKind::Player(state) = &player.kind else { unreachable!() };
        assert_eq!(state.lives, 2);
        assert!(state.invuln.active());
        assert_eq!(state.action, PlayerAction::Hurt);
        assert!(ctx.events().contains(&SimEvent::Hurt));
    }

    #[test]
    fn invulnerability_suppresses_repeat_damage() {
        let (mut player, mut ctx) = setup();
        take_damage(&mut player, &mut ctx);
        take_damage(&mut player, &mut ctx);
        take_damage(&mut player, &mut ctx);
        let EntityKind::Player(state) = &player.kind else { unreachable!() };
        assert_eq!(state.lives, 2, "only the first hit may land");
    }

    #[test]
    fn tier_hit_powers_down_instead_of_killing() {
        let (mut player, mut ctx) = setup();
        power_up(&mut player, &mut ctx);
        let tall = player.size.y;
        take_damage(&mut player, &mut ctx);
        let EntityKind::Player(state) = &player.kind else { unreachable!() };
        assert_eq!(state.tier, PowerTier::Base);
        assert_eq!(state.lives, 3, "tier absorbs the hit");
        assert!(player.size.y < tall, "box shrinks with the tier");
        assert!(ctx.events().contains(&SimEvent::PowerDown));
    }

    #[test]
    fn zero_lives_deactivates() {
        let (mut player, mut ctx) = setup();
        for _ in 0..3 {
            take_damage(&mut player, &mut ctx);
            let EntityKind::Player(state) = &mut player.kind else { unreachable!() };
            state.invuln.clear();
            state.hurt.clear();
            if state.action == PlayerAction::Hurt {
                state.action = PlayerAction::Idle;
            }
        }
        let EntityKind::Player(state) = &player.kind else { unreachable!() };
        assert_eq!(state.lives, 0);
        assert_eq!(state.action, PlayerAction::Dead);
        assert!(!player.active);
        assert!(ctx.events().contains(&SimEvent::PlayerDefeated));
    }

    #[test]
    fn tier2_head_bump_breaks_tile() {
        let (mut player, mut ctx) = setup();
        power_up(&mut player, &mut ctx);
        let mut grid = TileGrid::new(10, 10);
        grid.set(5, 5, TileKind::Breakable);

        let contact = TileContact {
            hit_ceiling: true,
            ceiling_tile: Some((5, 5)),
            ..Default::default()
        };
        let spawn = apply_tile_contact(&mut player, &contact, &mut grid, &mut ctx);
        assert_eq!(grid.get(5, 5), TileKind::Air);
        assert!(ctx.events().contains(&SimEvent::Break));
        match spawn {
            Some(SpawnRequest::Collectible { pos, vel, .. }) => {
                // Collectible appears in the tile directly above, with pop
                assert_eq!(TileGrid::row_at(pos.y), 4);
                assert!(vel.y < 0.0);
            }
            other => panic!("expected a collectible spawn, got {other:?}"),
        }
    }

    #[test]
    fn base_tier_cannot_break_tiles() {
        let (mut player, mut ctx) = setup();
        let mut grid = TileGrid::new(10, 10);
        grid.set(5, 5, TileKind::Breakable);

        let contact = TileContact {
            hit_ceiling: true,
            ceiling_tile: Some((5, 5)),
            ..Default::default()
        };
        let spawn = apply_tile_contact(&mut player, &contact, &mut grid, &mut ctx);
        assert_eq!(grid.get(5, 5), TileKind::Breakable);
        assert!(spawn.is_none());
    }

    #[test]
    fn throw_requires_tier3_and_cooldown() {
        let (mut player, mut ctx) = setup();
        power_up(&mut player, &mut ctx);
        power_up(&mut player, &mut ctx);

        let mut throw = InputFrame::new();
        throw.step(InputFrame::pack(&[Action::Throw]));
        let spawn = control(&mut player, &throw, &mut ctx, FRAME_MS, 1.0);
        assert!(matches!(spawn, Some(SpawnRequest::Projectile { .. })));

        // Immediately again: edge re-triggered but cooldown holds
        throw.step(0);
        throw.step(InputFrame::pack(&[Action::Throw]));
        let spawn = control(&mut player, &throw, &mut ctx, FRAME_MS, 1.0);
        assert!(spawn.is_none(), "cooldown must gate the second throw");
    }
}
