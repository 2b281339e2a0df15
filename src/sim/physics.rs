//! Velocity integration: gravity, friction, position update.
//!
//! Pure per entity and order-independent across entities. All constants are
//! expressed per 60 Hz reference frame; `dt_scale` stretches them to the
//! actual frame duration.

use super::entity::Entity;
use crate::tuning::Tuning;

/// Apply gravity, friction and the velocity-based position update to one
/// entity. No side effects beyond the entity passed in.
pub fn integrate(entity: &mut Entity, tuning: &Tuning, dt_scale: f32) {
    if !entity.active {
        return;
    }

    entity.prev_bottom = entity.aabb().bottom();

    // Gravity, skipped while grounded
    if !entity.on_ground && entity.gravity_scale != 0.0 {
        entity.vel.y += tuning.gravity * entity.gravity_scale * dt_scale;
        if entity.vel.y > tuning.max_fall_speed {
            entity.vel.y = tuning.max_fall_speed;
        }
    }

    // Friction; exponent keeps decay frame-rate independent
    let friction = if entity.on_ground {
        tuning.friction_ground
    } else {
        tuning.friction_air
    };
    entity.vel.x *= friction.powf(dt_scale);
    if entity.vel.x.abs() < tuning.velocity_epsilon {
        entity.vel.x = 0.0;
    }

    entity.pos += entity.vel * dt_scale;
}
