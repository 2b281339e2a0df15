//! Collision detection and response.
//!
//! Tile resolution is two-pass and axis-separated: the horizontal pass snaps
//! and recomputes the box before the vertical pass runs. Entity-vs-entity
//! resolution is a minimum-translation push along the smaller overlap axis.
//! Both return plain facts; damage/defeat policy belongs to the state
//! machines.

use glam::Vec2;

use super::entity::{Aabb, Entity};
use super::grid::{TileGrid, TileKind};
use crate::consts::{DEATH_PIT_MARGIN, TILE_SIZE};

/// Inset used when converting box edges to tile indices, so a box resting
/// flush against a tile boundary does not read into the next cell.
const EDGE_EPS: f32 = 0.01;

/// How far below the feet the ground-loss probe reaches (px).
const GROUND_PROBE: f32 = 1.0;

/// Slack allowed on the "was above last frame" test for one-way platforms
/// (px). Absorbs float drift from the position update.
const PLATFORM_TOL: f32 = 1.0;

/// What the tile resolver observed while clipping one entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileContact {
    pub hit_left: bool,
    pub hit_right: bool,
    pub hit_ceiling: bool,
    /// Grid coordinates of the tile the head struck, when `hit_ceiling`.
    pub ceiling_tile: Option<(i32, i32)>,
    /// Entity became grounded during this resolution.
    pub landed: bool,
    /// Entity was grounded but no support remains beneath it.
    pub ground_lost: bool,
    /// Final box overlaps at least one hazard tile.
    pub on_hazard: bool,
    /// Entity fell past the level bottom plus the death-pit margin.
    pub below_level: bool,
}

/// Resolve an entity's motion against the grid, mutating position, velocity
/// and the ground-contact flag. Called after integration, before any
/// entity-vs-entity resolution.
pub fn resolve_against_tiles(entity: &mut Entity, grid: &TileGrid) -> TileContact {
    let mut contact = TileContact::default();
    if !entity.active || !entity.collides_tiles {
        return contact;
    }
    let was_grounded = entity.on_ground;

    // Horizontal pass. Only solid tiles block sideways motion; platforms
    // never do.
    let bb = entity.aabb();
    let top_row = TileGrid::row_at(bb.top() + EDGE_EPS);
    let bottom_row = TileGrid::row_at(bb.bottom() - EDGE_EPS);

    if entity.vel.x < 0.0 {
        let col = TileGrid::col_at(bb.left());
        for row in top_row..=bottom_row {
            if grid.get(col, row).blocks_horizontal() {
                let snapped_x = (col + 1) as f32 * TILE_SIZE;
                entity.pos.x = snapped_x - entity.hitbox_offset.x;
                entity.vel.x = 0.0;
                contact.hit_left = true;
                break;
            }
        }
    } else if entity.vel.x > 0.0 {
        let col = TileGrid::col_at(bb.right() - EDGE_EPS);
        for row in top_row..=bottom_row {
            if grid.get(col, row).blocks_horizontal() {
                let snapped_x = col as f32 * TILE_SIZE - entity.hitbox_size.x;
                entity.pos.x = snapped_x - entity.hitbox_offset.x;
                entity.vel.x = 0.0;
                contact.hit_right = true;
                break;
            }
        }
    }

    // Hard level boundary on x
    let max_x = grid.pixel_width() - entity.hitbox_size.x;
    let bb_x = entity.pos.x + entity.hitbox_offset.x;
    let clamped = bb_x.clamp(0.0, max_x.max(0.0));
    if clamped != bb_x {
        entity.pos.x = clamped - entity.hitbox_offset.x;
        entity.vel.x = 0.0;
    }

    // Vertical pass on the corrected box
    let bb = entity.aabb();
    let left_col = TileGrid::col_at(bb.left() + EDGE_EPS);
    let right_col = TileGrid::col_at(bb.right() - EDGE_EPS);

    if entity.vel.y < 0.0 {
        let row = TileGrid::row_at(bb.top());
        for col in left_col..=right_col {
            if grid.get(col, row).is_solid() {
                let snapped_y = (row + 1) as f32 * TILE_SIZE;
                entity.pos.y = snapped_y - entity.hitbox_offset.y;
                entity.vel.y = 0.0;
                contact.hit_ceiling = true;
                contact.ceiling_tile = Some((col, row));
                break;
            }
        }
    } else {
        let row = TileGrid::row_at(bb.bottom() - EDGE_EPS);
        let tile_top = row as f32 * TILE_SIZE;
        // The bottom edge of the level is open: out-of-bounds below must not
        // support, or nothing could ever reach the death pit
        if row < grid.height() {
            for col in left_col..=right_col {
                let tile = grid.get(col, row);
                let supports = tile.is_solid()
                    || (tile == TileKind::Platform
                        && entity.prev_bottom <= tile_top + PLATFORM_TOL);
                if supports {
                    entity.pos.y = tile_top - entity.hitbox_size.y - entity.hitbox_offset.y;
                    entity.vel.y = 0.0;
                    entity.on_ground = true;
                    break;
                }
            }
        }
    }

    // Ground-loss check: grounded entities with nothing beneath them fall
    let bb = entity.aabb();
    if entity.on_ground {
        let foot_row = TileGrid::row_at(bb.bottom() + GROUND_PROBE);
        let foot_top = foot_row as f32 * TILE_SIZE;
        let mut supported = false;
        if foot_row < grid.height() {
            for col in left_col..=right_col {
                let tile = grid.get(col, foot_row);
                if tile.is_solid()
                    || (tile == TileKind::Platform && bb.bottom() <= foot_top + PLATFORM_TOL)
                {
                    supported = true;
                    break;
                }
            }
        }
        if !supported {
            entity.on_ground = false;
            if was_grounded {
                contact.ground_lost = true;
            }
        }
    }
    contact.landed = entity.on_ground && !was_grounded;

    // Hazard overlap on the final box
    let top_row = TileGrid::row_at(bb.top() + EDGE_EPS);
    let bottom_row = TileGrid::row_at(bb.bottom() - EDGE_EPS);
    'hazard: for row in top_row..=bottom_row {
        for col in left_col..=right_col {
            if grid.get(col, row) == TileKind::Hazard {
                contact.on_hazard = true;
                break 'hazard;
            }
        }
    }

    // Death pit
    if bb.top() > grid.pixel_height() + DEATH_PIT_MARGIN {
        contact.below_level = true;
    }

    contact
}

/// Axis the entity push-apart acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactAxis {
    Horizontal,
    Vertical,
}

/// Fact describing a resolved entity-vs-entity overlap.
#[derive(Debug, Clone, Copy)]
pub struct EntityContact {
    pub axis: ContactAxis,
    /// The mover's center was above the target's when they met.
    pub from_above: bool,
}

/// Symmetric overlap test between two live entities.
pub fn overlaps(a: &Entity, b: &Entity) -> bool {
    a.active && b.active && a.aabb().overlaps(&b.aabb())
}

/// Push `mover` out of `target` along the axis of smaller overlap, leaving
/// `target` untouched. Returns the contact fact, or None when the boxes do
/// not overlap or either entity is inactive. Kind-specific semantics
/// (damage vs. defeat) are the caller's business.
pub fn resolve_entity_overlap(mover: &mut Entity, target: &Entity) -> Option<EntityContact> {
    if !mover.active || !target.active {
        return None;
    }
    let a = mover.aabb();
    let b = target.aabb();
    let depth = a.overlap_depth(&b);
    if depth.x <= 0.0 || depth.y <= 0.0 {
        return None;
    }

    let from_above = a.center().y < b.center().y;
    if depth.y < depth.x {
        if from_above {
            mover.pos.y -= depth.y;
            // Landing: a downward mover comes to rest on the target
            if mover.vel.y >= 0.0 {
                mover.vel.y = 0.0;
                mover.on_ground = true;
            }
        } else {
            mover.pos.y += depth.y;
            if mover.vel.y < 0.0 {
                mover.vel.y = 0.0;
            }
        }
        Some(EntityContact {
            axis: ContactAxis::Vertical,
            from_above,
        })
    } else {
        if a.center().x < b.center().x {
            mover.pos.x -= depth.x;
        } else {
            mover.pos.x += depth.x;
        }
        mover.vel.x = 0.0;
        Some(EntityContact {
            axis: ContactAxis::Horizontal,
            from_above,
        })
    }
}

/// Time of impact for a moving box against a stationary one, as a fraction
/// of this step's displacement. `1.0` means no collision within the step.
/// Used for fast movers (thrown projectiles) that could tunnel through a
/// thin target in one frame.
pub fn swept_impact_time(mover: &Aabb, delta: Vec2, target: &Aabb) -> f32 {
    // Minkowski sum: shrink the mover to a point, grow the target
    let half = mover.size * 0.5;
    let origin = mover.center();
    let lo = target.pos - half;
    let hi = target.pos + target.size + half;

    let mut t_enter = 0.0f32;
    let mut t_exit = 1.0f32;

    for axis in 0..2 {
        let (o, d, lo, hi) = if axis == 0 {
            (origin.x, delta.x, lo.x, hi.x)
        } else {
            (origin.y, delta.y, lo.y, hi.y)
        };
        if d == 0.0 {
            if o <= lo || o >= hi {
                return 1.0;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (lo - o) * inv;
        let mut t1 = (hi - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return 1.0;
        }
    }

    if t_enter >= 1.0 { 1.0 } else { t_enter.max(0.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{CollectibleKind, CollectibleState, EntityId, EntityKind};
    use proptest::prelude::*;

    fn boxed_entity(pos: Vec2, size: Vec2) -> Entity {
        Entity::new(
            EntityId(1),
            EntityKind::Collectible(CollectibleState {
                kind: CollectibleKind::Coin,
            }),
            pos,
            size,
        )
    }

    /// 20x15 grid: solid floor on the bottom row, solid walls on both edges,
    /// a platform strip at row 10 and a breakable block at (10, 8).
    fn test_grid() -> TileGrid {
        let mut grid = TileGrid::new(20, 15);
        grid.fill_row(14, 0, 19, TileKind::Solid);
        for row in 0..15 {
            grid.set(0, row, TileKind::Solid);
            grid.set(19, row, TileKind::Solid);
        }
        grid.fill_row(10, 5, 8, TileKind::Platform);
        grid.set(10, 8, TileKind::Breakable);
        grid
    }

    #[test]
    fn falling_entity_lands_on_floor() {
        let grid = test_grid();
        let mut e = boxed_entity(Vec2::new(64.0, 14.0 * TILE_SIZE - 10.0), Vec2::new(12.0, 14.0));
        e.vel.y = 5.0;
        let contact = resolve_against_tiles(&mut e, &grid);
        assert!(contact.landed);
        assert!(e.on_ground);
        assert_eq!(e.vel.y, 0.0);
        assert_eq!(e.aabb().bottom(), 14.0 * TILE_SIZE);
    }

    #[test]
    fn leftward_motion_blocked_by_wall() {
        let grid = test_grid();
        let mut e = boxed_entity(Vec2::new(TILE_SIZE - 4.0, 100.0), Vec2::new(12.0, 14.0));
        e.vel.x = -3.0;
        let contact = resolve_against_tiles(&mut e, &grid);
        assert!(contact.hit_left);
        assert_eq!(e.vel.x, 0.0);
        assert_eq!(e.aabb().left(), TILE_SIZE);
    }

    #[test]
    fn platform_never_blocks_horizontal() {
        let grid = test_grid();
        // Entity moving right through the platform strip at its own height
        let mut e = boxed_entity(
            Vec2::new(5.0 * TILE_SIZE - 6.0, 10.0 * TILE_SIZE + 2.0),
            Vec2::new(12.0, 12.0),
        );
        e.prev_bottom = e.aabb().bottom(); // was level with the platform
        e.vel.x = 2.0;
        let contact = resolve_against_tiles(&mut e, &grid);
        assert!(!contact.hit_right);
        assert_ne!(e.vel.x, 0.0);
    }

    #[test]
    fn platform_catches_entity_from_above() {
        let grid = test_grid();
        let platform_top = 10.0 * TILE_SIZE;
        let mut e = boxed_entity(Vec2::new(6.0 * TILE_SIZE, platform_top - 12.0), Vec2::new(12.0, 14.0));
        e.prev_bottom = platform_top - 2.0; // above the platform last frame
        e.pos.y = platform_top - 10.0; // feet now 4px into the tile
        e.vel.y = 4.0;
        let contact = resolve_against_tiles(&mut e, &grid);
        assert!(contact.landed);
        assert_eq!(e.aabb().bottom(), platform_top);
    }

    #[test]
    fn platform_ignored_when_rising_from_below() {
        let grid = test_grid();
        let platform_top = 10.0 * TILE_SIZE;
        let mut e = boxed_entity(Vec2::new(6.0 * TILE_SIZE, platform_top + 4.0), Vec2::new(12.0, 14.0));
        e.prev_bottom = platform_top + 20.0; // was below
        e.vel.y = -6.0;
        let contact = resolve_against_tiles(&mut e, &grid);
        assert!(!contact.hit_ceiling, "platforms must not block upward motion");
        assert!(!e.on_ground);
    }

    #[test]
    fn ceiling_bump_reports_tile() {
        let grid = test_grid();
        // Head 2px into the breakable block at (10, 8)
        let mut e = boxed_entity(
            Vec2::new(10.0 * TILE_SIZE + 2.0, 9.0 * TILE_SIZE - 2.0),
            Vec2::new(12.0, 14.0),
        );
        e.vel.y = -4.0;
        let contact = resolve_against_tiles(&mut e, &grid);
        assert!(contact.hit_ceiling);
        assert_eq!(contact.ceiling_tile, Some((10, 8)));
        assert_eq!(e.aabb().top(), 9.0 * TILE_SIZE);
        assert_eq!(e.vel.y, 0.0);
    }

    #[test]
    fn walking_off_ledge_clears_ground_flag() {
        let grid = test_grid();
        // Standing past the right end of the platform strip
        let mut e = boxed_entity(
            Vec2::new(9.5 * TILE_SIZE, 10.0 * TILE_SIZE - 14.0),
            Vec2::new(12.0, 14.0),
        );
        e.on_ground = true;
        e.vel.x = 0.0;
        let contact = resolve_against_tiles(&mut e, &grid);
        assert!(contact.ground_lost);
        assert!(!e.on_ground);
    }

    #[test]
    fn death_pit_reported_not_applied() {
        let grid = test_grid();
        let mut e = boxed_entity(
            Vec2::new(64.0, grid.pixel_height() + DEATH_PIT_MARGIN + 10.0),
            Vec2::new(12.0, 14.0),
        );
        e.vel.y = 6.0;
        let contact = resolve_against_tiles(&mut e, &grid);
        assert!(contact.below_level);
        assert!(e.active, "the resolver defers the kill to the state machine");
    }

    #[test]
    fn inactive_entity_is_untouched() {
        let grid = test_grid();
        let mut e = boxed_entity(Vec2::new(8.0, 100.0), Vec2::new(12.0, 14.0));
        e.active = false;
        e.vel.x = -5.0;
        let before = e.pos;
        let contact = resolve_against_tiles(&mut e, &grid);
        assert!(!contact.hit_left);
        assert_eq!(e.pos, before);
    }

    #[test]
    fn mtv_resolves_smaller_axis() {
        let target = boxed_entity(Vec2::new(100.0, 100.0), Vec2::new(16.0, 16.0));
        // Mostly-above overlap: y depth smaller than x depth
        let mut mover = boxed_entity(Vec2::new(102.0, 88.0), Vec2::new(16.0, 16.0));
        mover.vel.y = 3.0;
        let contact = resolve_entity_overlap(&mut mover, &target).unwrap();
        assert_eq!(contact.axis, ContactAxis::Vertical);
        assert!(contact.from_above);
        assert_eq!(mover.aabb().bottom(), 100.0);
        assert_eq!(mover.vel.y, 0.0);
        assert!(mover.on_ground);
    }

    #[test]
    fn horizontal_push_zeroes_vx() {
        let target = boxed_entity(Vec2::new(100.0, 100.0), Vec2::new(16.0, 16.0));
        let mut mover = boxed_entity(Vec2::new(88.0, 102.0), Vec2::new(16.0, 16.0));
        mover.vel.x = 2.0;
        let contact = resolve_entity_overlap(&mut mover, &target).unwrap();
        assert_eq!(contact.axis, ContactAxis::Horizontal);
        assert_eq!(mover.aabb().right(), 100.0);
        assert_eq!(mover.vel.x, 0.0);
    }

    #[test]
    fn inactive_target_is_no_op() {
        let mut target = boxed_entity(Vec2::new(100.0, 100.0), Vec2::new(16.0, 16.0));
        target.active = false;
        let mut mover = boxed_entity(Vec2::new(102.0, 98.0), Vec2::new(16.0, 16.0));
        assert!(resolve_entity_overlap(&mut mover, &target).is_none());
    }

    #[test]
    fn swept_hit_reports_fractional_time() {
        let mover = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0));
        let target = Aabb::new(Vec2::new(20.0, 0.0), Vec2::new(8.0, 8.0));
        let t = swept_impact_time(&mover, Vec2::new(40.0, 0.0), &target);
        assert!(t > 0.0 && t < 1.0, "t = {t}");
        // Impact when mover right edge reaches target left edge: 16px of 40
        assert!((t - 0.4).abs() < 1e-4);
    }

    #[test]
    fn swept_miss_is_one() {
        let mover = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0));
        let target = Aabb::new(Vec2::new(20.0, 40.0), Vec2::new(8.0, 8.0));
        assert_eq!(swept_impact_time(&mover, Vec2::new(40.0, 0.0), &target), 1.0);
    }

    #[test]
    fn swept_through_thin_wall_still_hits() {
        let mover = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0));
        // 2px-thin target the full displacement would jump past
        let target = Aabb::new(Vec2::new(30.0, 0.0), Vec2::new(2.0, 8.0));
        let t = swept_impact_time(&mover, Vec2::new(200.0, 0.0), &target);
        assert!(t < 1.0);
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(
            ax in -200.0f32..200.0, ay in -200.0f32..200.0,
            aw in 1.0f32..50.0, ah in 1.0f32..50.0,
            bx in -200.0f32..200.0, by in -200.0f32..200.0,
            bw in 1.0f32..50.0, bh in 1.0f32..50.0,
        ) {
            let a = Aabb::new(Vec2::new(ax, ay), Vec2::new(aw, ah));
            let b = Aabb::new(Vec2::new(bx, by), Vec2::new(bw, bh));
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn no_penetration_after_tile_resolution(
            x in TILE_SIZE..18.0 * TILE_SIZE,
            y in 0.0f32..13.0 * TILE_SIZE,
            vx in -6.0f32..6.0,
            vy in -6.0f32..8.0,
        ) {
            let grid = test_grid();
            let mut e = boxed_entity(Vec2::new(x, y), Vec2::new(12.0, 14.0));
            e.vel = Vec2::new(vx, vy);
            resolve_against_tiles(&mut e, &grid);
            let bb = e.aabb();

            // After resolution no solid tile on the motion-facing edges may
            // penetrate deeper than the snap epsilon
            if vx != 0.0 || vy != 0.0 {
                let top = TileGrid::row_at(bb.top() + EDGE_EPS);
                let bottom = TileGrid::row_at(bb.bottom() - EDGE_EPS);
                let left = TileGrid::col_at(bb.left() + EDGE_EPS);
                let right = TileGrid::col_at(bb.right() - EDGE_EPS);
                if vx < 0.0 {
                    for row in top..=bottom {
                        prop_assert!(!grid.get(left, row).is_solid());
                    }
                }
                if vx > 0.0 {
                    for row in top..=bottom {
                        prop_assert!(!grid.get(right, row).is_solid());
                    }
                }
                if vy < 0.0 {
                    for col in left..=right {
                        prop_assert!(!grid.get(col, top).is_solid());
                    }
                }
                if vy > 0.0 && e.on_ground {
                    for col in left..=right {
                        prop_assert!(!grid.get(col, bottom).is_solid());
                    }
                }
            }
        }

        #[test]
        fn boundary_containment(
            x in -100.0f32..25.0 * TILE_SIZE,
            vx in -10.0f32..10.0,
        ) {
            let grid = test_grid();
            let mut e = boxed_entity(Vec2::new(x, 100.0), Vec2::new(12.0, 14.0));
            e.vel.x = vx;
            resolve_against_tiles(&mut e, &grid);
            let bb = e.aabb();
            prop_assert!(bb.left() >= 0.0);
            prop_assert!(bb.right() <= grid.pixel_width());
        }
    }
}
