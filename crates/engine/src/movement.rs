use tracing::debug;

use crate::geometry::{Polygon, Vec2};

/// Targets closer than this many scene units are treated as already
/// reached; issuing a move to one succeeds without starting a tween.
pub const ARRIVAL_EPSILON_UNITS: f32 = 2.0;

/// Lower bound for vertical damping. Values at or below this would make
/// vertical travel pathologically slow, so they are pulled up to it.
pub const DAMPING_FLOOR: f32 = 0.1;

const WALK_FRAME_SECONDS: f32 = 0.12;
const WALK_FRAME_COUNT: u8 = 4;

/// Compass direction a character sprite faces. South is toward the
/// viewer (positive Y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    North,
    #[default]
    South,
    East,
    West,
}

impl Facing {
    /// Dominant-axis facing for a displacement. Horizontal wins exact
    /// ties so strafing diagonals read as sideways steps.
    pub fn from_displacement(dx: f32, dy: f32) -> Facing {
        if dx.abs() >= dy.abs() {
            if dx >= 0.0 {
                Facing::East
            } else {
                Facing::West
            }
        } else if dy >= 0.0 {
            Facing::South
        } else {
            Facing::North
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveState {
    #[default]
    Idle,
    Moving,
}

/// What a single [`Mover::tick`] did, so the caller can refresh depth
/// entries and fire arrival work without the mover calling back into it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoverTick {
    /// The position changed this tick.
    pub moved: bool,
    /// The active move finished this tick; the mover is now idle at
    /// its target.
    pub arrived: bool,
}

#[derive(Debug, Clone)]
struct ActiveMove {
    start: Vec2,
    target: Vec2,
    duration_seconds: f32,
    elapsed_seconds: f32,
}

/// Point-to-point tween for one character. Travel time is computed per
/// axis from a base speed, with vertical speed scaled down by a damping
/// factor so walking "into" a perspective scene reads slower; the move
/// takes the longer of the two axis times.
#[derive(Debug, Clone)]
pub struct Mover {
    position: Vec2,
    facing: Facing,
    state: MoveState,
    base_speed: f32,
    damping: f32,
    walk_area: Option<Polygon>,
    active: Option<ActiveMove>,
    frame_index: u8,
    frame_elapsed: f32,
}

impl Mover {
    /// `base_speed` is in scene units per second and must be positive.
    pub fn new(position: Vec2, base_speed: f32) -> Self {
        Mover {
            position,
            facing: Facing::default(),
            state: MoveState::default(),
            base_speed: base_speed.max(f32::EPSILON),
            damping: 1.0,
            walk_area: None,
            active: None,
            frame_index: 0,
            frame_elapsed: 0.0,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn state(&self) -> MoveState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state == MoveState::Moving
    }

    /// Current sprite frame: the animation row is implied by `facing`,
    /// the column by this index. Idle always sits on frame zero.
    pub fn frame_index(&self) -> u8 {
        self.frame_index
    }

    pub fn walk_area(&self) -> Option<&Polygon> {
        self.walk_area.as_ref()
    }

    /// Teleport, cancelling any active move.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.active = None;
        self.state = MoveState::Idle;
        self.frame_index = 0;
        self.frame_elapsed = 0.0;
    }

    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
    }

    /// Replace the walkable region. `None` means the whole scene is
    /// walkable.
    pub fn set_walk_area(&mut self, walk_area: Option<Polygon>) {
        self.walk_area = walk_area;
    }

    /// Vertical damping, clamped to [`DAMPING_FLOOR`], 1.0]. Non-finite
    /// values fall back to the undamped default.
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = clamp_damping(damping);
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn is_walkable(&self, point: Vec2) -> bool {
        match &self.walk_area {
            Some(area) => area.contains(point),
            None => true,
        }
    }

    /// Begin a move toward `target`. Returns `false` and leaves the
    /// mover untouched when the target is outside the walkable area.
    /// A target within the arrival epsilon succeeds without starting a
    /// tween, so callers can treat `true` as "you will be there".
    pub fn move_to(&mut self, target: Vec2) -> bool {
        if !self.is_walkable(target) {
            debug!(x = target.x, y = target.y, "move_target_unwalkable");
            return false;
        }
        if self.position.distance_to(target) <= ARRIVAL_EPSILON_UNITS {
            return true;
        }
        let dx = target.x - self.position.x;
        let dy = target.y - self.position.y;
        let x_seconds = dx.abs() / self.base_speed;
        let y_seconds = dy.abs() / (self.base_speed * self.damping);
        self.facing = Facing::from_displacement(dx, dy);
        self.state = MoveState::Moving;
        self.frame_index = 0;
        self.frame_elapsed = 0.0;
        self.active = Some(ActiveMove {
            start: self.position,
            target,
            duration_seconds: x_seconds.max(y_seconds),
            elapsed_seconds: 0.0,
        });
        true
    }

    /// Cancel any active move in place, keeping the current facing.
    pub fn stop(&mut self) {
        self.active = None;
        self.state = MoveState::Idle;
        self.frame_index = 0;
        self.frame_elapsed = 0.0;
    }

    /// Advance the tween by `dt_seconds`. On the final tick the
    /// position snaps exactly to the target.
    pub fn tick(&mut self, dt_seconds: f32) -> MoverTick {
        let Some(active) = self.active.as_mut() else {
            return MoverTick::default();
        };
        active.elapsed_seconds += dt_seconds;
        let progress = if active.duration_seconds <= 0.0 {
            1.0
        } else {
            (active.elapsed_seconds / active.duration_seconds).min(1.0)
        };
        if progress >= 1.0 {
            self.position = active.target;
            self.active = None;
            self.state = MoveState::Idle;
            self.frame_index = 0;
            self.frame_elapsed = 0.0;
            return MoverTick {
                moved: true,
                arrived: true,
            };
        }
        self.position = active.start.lerp(active.target, progress);
        self.frame_elapsed += dt_seconds;
        while self.frame_elapsed >= WALK_FRAME_SECONDS {
            self.frame_elapsed -= WALK_FRAME_SECONDS;
            self.frame_index = (self.frame_index + 1) % WALK_FRAME_COUNT;
        }
        MoverTick {
            moved: true,
            arrived: false,
        }
    }
}

pub fn clamp_damping(damping: f32) -> f32 {
    if !damping.is_finite() {
        return 1.0;
    }
    damping.clamp(DAMPING_FLOOR, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticked_until_idle(mover: &mut Mover) -> u32 {
        let mut ticks = 0;
        while mover.is_moving() {
            mover.tick(1.0 / 60.0);
            ticks += 1;
            assert!(ticks < 10_000, "mover never arrived");
        }
        ticks
    }

    #[test]
    fn move_to_rejects_target_outside_walk_area() {
        let mut mover = Mover::new(Vec2::new(5.0, 5.0), 100.0);
        mover.set_walk_area(Some(Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ])));
        assert!(!mover.move_to(Vec2::new(50.0, 5.0)));
        assert!(!mover.is_moving());
        assert_eq!(mover.position(), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn move_to_within_epsilon_is_a_successful_no_op() {
        let mut mover = Mover::new(Vec2::new(100.0, 100.0), 100.0);
        assert!(mover.move_to(Vec2::new(101.0, 100.5)));
        assert!(!mover.is_moving());
    }

    #[test]
    fn mover_arrives_exactly_on_target() {
        let mut mover = Mover::new(Vec2::ZERO, 100.0);
        assert!(mover.move_to(Vec2::new(50.0, 20.0)));
        ticked_until_idle(&mut mover);
        assert_eq!(mover.position(), Vec2::new(50.0, 20.0));
        assert_eq!(mover.state(), MoveState::Idle);
    }

    #[test]
    fn damping_stretches_vertical_travel_time() {
        let mut undamped = Mover::new(Vec2::ZERO, 100.0);
        let mut damped = Mover::new(Vec2::ZERO, 100.0);
        damped.set_damping(0.5);
        assert!(undamped.move_to(Vec2::new(0.0, 100.0)));
        assert!(damped.move_to(Vec2::new(0.0, 100.0)));
        let fast = ticked_until_idle(&mut undamped);
        let slow = ticked_until_idle(&mut damped);
        assert!(slow > fast, "damped move took {slow} ticks vs {fast}");
    }

    #[test]
    fn damping_is_clamped_to_its_valid_range() {
        let mut mover = Mover::new(Vec2::ZERO, 100.0);
        mover.set_damping(0.0);
        assert_eq!(mover.damping(), DAMPING_FLOOR);
        mover.set_damping(7.5);
        assert_eq!(mover.damping(), 1.0);
        mover.set_damping(f32::NAN);
        assert_eq!(mover.damping(), 1.0);
    }

    #[test]
    fn facing_follows_dominant_axis_with_horizontal_tiebreak() {
        assert_eq!(Facing::from_displacement(10.0, 3.0), Facing::East);
        assert_eq!(Facing::from_displacement(-10.0, 3.0), Facing::West);
        assert_eq!(Facing::from_displacement(2.0, 9.0), Facing::South);
        assert_eq!(Facing::from_displacement(2.0, -9.0), Facing::North);
        assert_eq!(Facing::from_displacement(5.0, 5.0), Facing::East);
        assert_eq!(Facing::from_displacement(-5.0, 5.0), Facing::West);
    }

    #[test]
    fn facing_is_retained_after_arrival() {
        let mut mover = Mover::new(Vec2::ZERO, 100.0);
        assert!(mover.move_to(Vec2::new(-80.0, 0.0)));
        ticked_until_idle(&mut mover);
        assert_eq!(mover.facing(), Facing::West);
        assert_eq!(mover.frame_index(), 0);
    }

    #[test]
    fn walk_frames_advance_while_moving() {
        let mut mover = Mover::new(Vec2::ZERO, 10.0);
        assert!(mover.move_to(Vec2::new(100.0, 0.0)));
        let mut seen_nonzero_frame = false;
        for _ in 0..120 {
            mover.tick(1.0 / 60.0);
            if mover.frame_index() != 0 {
                seen_nonzero_frame = true;
            }
        }
        assert!(seen_nonzero_frame);
    }

    #[test]
    fn set_position_cancels_an_active_move() {
        let mut mover = Mover::new(Vec2::ZERO, 100.0);
        assert!(mover.move_to(Vec2::new(500.0, 0.0)));
        mover.set_position(Vec2::new(9.0, 9.0));
        assert!(!mover.is_moving());
        let tick = mover.tick(1.0 / 60.0);
        assert!(!tick.moved && !tick.arrived);
        assert_eq!(mover.position(), Vec2::new(9.0, 9.0));
    }
}
