//! Data-driven game balance.
//!
//! Every speed, impulse and timer window the simulation uses lives here so a
//! build can be re-tuned from JSON without touching sim code. Values are in
//! pixels per 60 Hz reference frame unless noted otherwise.

use serde::{Deserialize, Serialize};

/// The canonical constant set for the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    // ========================================================================
    // Gravity & friction
    // ========================================================================
    /// Downward acceleration (px/frame^2).
    pub gravity: f32,

    /// Terminal fall speed (px/frame).
    pub max_fall_speed: f32,

    /// Gravity multiplier while ascending with the jump input held.
    /// Lower values give a higher apex; this is what makes jump height
    /// respond to how long the button is held.
    pub hold_gravity_scale: f32,

    /// Per-frame horizontal velocity multiplier while grounded.
    pub friction_ground: f32,

    /// Per-frame horizontal velocity multiplier while airborne.
    pub friction_air: f32,

    /// Speeds below this snap to zero to avoid perpetual creep (px/frame).
    pub velocity_epsilon: f32,

    // ========================================================================
    // Player movement
    // ========================================================================
    /// Horizontal speed cap while walking (px/frame).
    pub walk_speed: f32,

    /// Horizontal speed cap while running (px/frame).
    pub run_speed: f32,

    /// Horizontal acceleration toward the input direction (px/frame^2).
    pub ground_accel: f32,

    /// Horizontal acceleration while airborne (px/frame^2).
    pub air_accel: f32,

    /// Upward jump impulse (px/frame, negative is up).
    pub jump_impulse: f32,

    /// Extra jump impulse at full run speed (px/frame, negative is up).
    pub run_jump_bonus: f32,

    /// Upward bounce applied to the player after a stomp (px/frame).
    pub stomp_bounce: f32,

    // ========================================================================
    // Timer windows (milliseconds)
    // ========================================================================
    /// Grace period after leaving the ground during which a jump is still
    /// honored as if grounded.
    pub coyote_ms: f32,

    /// How long a jump press is buffered before landing.
    pub jump_buffer_ms: f32,

    /// Invulnerability window after taking damage.
    pub invuln_ms: f32,

    /// Hurt-stun duration before the player regains control.
    pub hurt_ms: f32,

    /// Cooldown between ranged attacks (Tier3 only).
    pub throw_cooldown_ms: f32,

    // ========================================================================
    // Projectiles & collectibles
    // ========================================================================
    /// Thrown projectile horizontal speed (px/frame).
    pub projectile_speed: f32,

    /// Projectile lifetime (ms).
    pub projectile_lifetime_ms: f32,

    /// Upward pop given to a collectible spawned from a broken tile
    /// (px/frame, negative is up).
    pub collectible_pop: f32,

    // ========================================================================
    // Enemies
    // ========================================================================
    /// Patrol walker speed (px/frame).
    pub patrol_speed: f32,

    /// Hop impulse a hopper applies each time it regains ground contact
    /// (px/frame, negative is up).
    pub hopper_impulse: f32,

    /// Flyer horizontal speed (px/frame).
    pub flyer_speed: f32,

    /// Flyer sine amplitude (px).
    pub flyer_amplitude: f32,

    /// Flyer sine period (ms).
    pub flyer_period_ms: f32,

    /// Horizontal range a flyer patrols to each side of its origin (px).
    pub flyer_range: f32,

    /// Sentinel on/off toggle period (ms).
    pub sentinel_period_ms: f32,

    /// Vertical tolerance for a contact to count as a stomp (px).
    pub stomp_tolerance: f32,

    // ========================================================================
    // Boss
    // ========================================================================
    /// Duration each boss attack phase holds before the next selection (ms).
    pub boss_phase_ms: f32,

    /// Boss charge speed (px/frame).
    pub boss_charge_speed: f32,

    /// Boss leap impulse (px/frame, negative is up).
    pub boss_leap_impulse: f32,

    /// Health fraction below which the boss permanently enrages.
    pub boss_enrage_fraction: f32,

    /// Speed and phase-rate multiplier once enraged.
    pub boss_enrage_scale: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            // Gravity & friction
            gravity: 0.5,
            max_fall_speed: 8.0,
            hold_gravity_scale: 0.55,
            friction_ground: 0.82,
            friction_air: 0.96,
            velocity_epsilon: 0.05,

            // Player movement
            walk_speed: 2.2,
            run_speed: 3.6,
            ground_accel: 0.8,
            air_accel: 0.5,
            jump_impulse: -7.5,
            run_jump_bonus: -1.2,
            stomp_bounce: -6.5,

            // Timers
            coyote_ms: 120.0,
            jump_buffer_ms: 100.0,
            invuln_ms: 1500.0,
            hurt_ms: 350.0,
            throw_cooldown_ms: 400.0,

            // Projectiles & collectibles
            projectile_speed: 6.0,
            projectile_lifetime_ms: 2000.0,
            collectible_pop: -4.5,

            // Enemies
            patrol_speed: 0.6,
            hopper_impulse: -5.0,
            flyer_speed: 0.8,
            flyer_amplitude: 24.0,
            flyer_period_ms: 2000.0,
            flyer_range: 96.0,
            sentinel_period_ms: 1600.0,
            stomp_tolerance: 6.0,

            // Boss
            boss_phase_ms: 2400.0,
            boss_charge_speed: 2.4,
            boss_leap_impulse: -9.0,
            boss_enrage_fraction: 0.4,
            boss_enrage_scale: 1.4,
        }
    }
}

impl Tuning {
    /// The floatier alternate set kept around for A/B play testing.
    pub fn floaty() -> Self {
        Self {
            gravity: 0.38,
            max_fall_speed: 7.0,
            hold_gravity_scale: 0.45,
            jump_impulse: -6.8,
            coyote_ms: 150.0,
            jump_buffer_ms: 130.0,
            friction_ground: 0.86,
            ..Default::default()
        }
    }

    /// Load tuning from a JSON string, e.g. a balance file shipped next to
    /// level data.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Horizontal speed cap for the current movement mode.
    pub fn max_run_speed(&self, running: bool) -> f32 {
        if running { self.run_speed } else { self.walk_speed }
    }

    /// Jump impulse scaled by how close the player is to full run speed.
    pub fn jump_impulse_for(&self, horizontal_speed: f32) -> f32 {
        let run_factor = (horizontal_speed.abs() / self.run_speed).clamp(0.0, 1.0);
        self.jump_impulse + self.run_jump_bonus * run_factor
    }
}
