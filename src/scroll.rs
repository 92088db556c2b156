use std::time::Duration;
use wasm_timer::Instant;

use crate::helper::lerp;

/// Pointer travel below this many pixels between down and up is a click,
/// anything above is a drag. Disambiguated by displacement only, never time.
pub const CLICK_SLOP_PX: f32 = 5.0;
/// A click lands on the centered item only when it sits within this fraction
/// of one item width from the viewport center.
pub const CLICK_SNAP_RATIO: f32 = 0.3;
/// Fraction of `scroll_speed` applied per wheel notch.
pub const WHEEL_STEP: f32 = 0.2;
/// Drag distance to scroll-target scale, matching pointer feel.
pub const DRAG_SCALE: f32 = 0.025;
/// Settling exits once current trails target by less than this. Must sit
/// above the autoplay steady-state lag (autoplay_speed / ease).
pub const SETTLE_EPSILON: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
}

/// Interpolated scroll offset. `current` chases `target` geometrically each
/// frame and never overshoots for ease in (0, 1].
#[derive(Clone, Copy, Debug)]
pub struct ScrollState {
    pub current: f32,
    pub target: f32,
    pub last: f32,
    pub ease: f32,
}

impl ScrollState {
    pub fn new(ease: f32) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            last: 0.0,
            ease: ease.clamp(f32::EPSILON, 1.0),
        }
    }

    pub fn step(&mut self) {
        self.current = lerp(self.current, self.target, self.ease);
    }

    pub fn direction(&self) -> Direction {
        if self.current > self.last {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    /// Per-frame velocity, fed to the distortion shader.
    pub fn speed(&self) -> f32 {
        self.current - self.last
    }

    pub fn commit(&mut self) {
        self.last = self.current;
    }
}

/// Snap to the nearest multiple of one item width, sign-preserving.
pub fn snap_to_item(target: f32, item_width: f32) -> f32 {
    if item_width <= 0.0 {
        return target;
    }
    let steps = (target.abs() / item_width).round();
    item_width * steps * if target < 0.0 { -1.0 } else { 1.0 }
}

/// Index and |distance| of the item closest to the viewport center.
pub fn closest_item(positions: &[f32]) -> Option<(usize, f32)> {
    positions
        .iter()
        .map(|x| x.abs())
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControllerState {
    Idle,
    Dragging { start_x: f32, origin: f32 },
    Settling,
}

/// Translates pointer/touch/wheel input into scroll targets. The drag origin
/// lives in the `Dragging` variant, not in loose booleans.
#[derive(Debug)]
pub struct ScrollController {
    pub state: ControllerState,
    scroll_speed: f32,
    autoplay_speed: f32,
    item_width: f32,
    snap_debounce: Duration,
    wheel_settle_at: Option<Instant>,
}

impl ScrollController {
    pub fn new(scroll_speed: f32, autoplay_speed: f32, snap_debounce_ms: u64) -> Self {
        Self {
            state: ControllerState::Idle,
            scroll_speed,
            autoplay_speed,
            item_width: 0.0,
            snap_debounce: Duration::from_millis(snap_debounce_ms),
            wheel_settle_at: None,
        }
    }

    /// Set on every resize; zero until the first layout pass.
    pub fn set_item_width(&mut self, width: f32) {
        self.item_width = width;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ControllerState::Dragging { .. })
    }

    pub fn on_down(&mut self, x: f32, scroll: &ScrollState) {
        self.state = ControllerState::Dragging {
            start_x: x,
            origin: scroll.target,
        };
    }

    pub fn on_move(&mut self, x: f32, scroll: &mut ScrollState) {
        if let ControllerState::Dragging { start_x, origin } = self.state {
            let distance = start_x - x;
            scroll.target = origin + distance * self.scroll_speed * DRAG_SCALE;
        }
    }

    /// Release. Snaps the target onto an item boundary and, when the pointer
    /// barely moved, resolves which item (if any) was clicked.
    /// `positions` are the items' current center offsets in index order.
    pub fn on_up(&mut self, x: f32, positions: &[f32], scroll: &mut ScrollState) -> Option<usize> {
        let ControllerState::Dragging { start_x, .. } = self.state else {
            return None;
        };
        self.state = ControllerState::Settling;
        scroll.target = snap_to_item(scroll.target, self.item_width);

        if (start_x - x).abs() >= CLICK_SLOP_PX {
            return None;
        }
        let (index, distance) = closest_item(positions)?;
        (distance < self.item_width * CLICK_SNAP_RATIO).then_some(index)
    }

    pub fn on_wheel(&mut self, delta_y: f32, scroll: &mut ScrollState) {
        let step = self.scroll_speed * WHEEL_STEP;
        scroll.target += if delta_y > 0.0 { step } else { -step };
        self.wheel_settle_at = Some(Instant::now());
    }

    /// Per-frame bookkeeping: autoplay drift while not dragging, the wheel
    /// quiet-period snap, and the Settling -> Idle transition.
    pub fn tick(&mut self, scroll: &mut ScrollState) {
        if !self.is_dragging() {
            scroll.target += self.autoplay_speed;
        }

        if let Some(armed) = self.wheel_settle_at {
            if armed.elapsed() >= self.snap_debounce {
                self.wheel_settle_at = None;
                scroll.target = snap_to_item(scroll.target, self.item_width);
                self.state = ControllerState::Settling;
            }
        }

        if self.state == ControllerState::Settling
            && (scroll.target - scroll.current).abs() < SETTLE_EPSILON
        {
            self.state = ControllerState::Idle;
        }
    }

    /// Drop any pending wheel settle, e.g. on teardown.
    pub fn cancel_pending(&mut self) {
        self.wheel_settle_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_converges_without_overshoot() {
        for &ease in &[0.01_f32, 0.05, 0.3, 1.0] {
            let mut scroll = ScrollState::new(ease);
            scroll.target = 100.0;
            let mut previous_gap = (scroll.target - scroll.current).abs();
            for _ in 0..2000 {
                scroll.step();
                assert!(
                    scroll.current <= scroll.target,
                    "overshoot at ease {}",
                    ease
                );
                let gap = (scroll.target - scroll.current).abs();
                assert!(gap <= previous_gap, "non-monotone at ease {}", ease);
                previous_gap = gap;
            }
            assert!(previous_gap < 1e-2, "did not converge at ease {}", ease);
        }
    }

    #[test]
    fn snap_is_idempotent_and_sign_preserving() {
        for &target in &[0.0_f32, 3.2, -3.2, 17.9, -17.9, 100.0] {
            let snapped = snap_to_item(target, 4.0);
            assert_eq!(snapped, snap_to_item(snapped, 4.0));
            assert!(snapped % 4.0 == 0.0);
            assert!(snapped * target >= 0.0, "sign flipped for {}", target);
        }
        // degenerate width passes through
        assert_eq!(snap_to_item(7.3, 0.0), 7.3);
    }

    #[test]
    fn click_resolved_below_slop_only() {
        let mut controller = ScrollController::new(2.0, 0.0, 200);
        controller.set_item_width(100.0);
        let mut scroll = ScrollState::new(0.05);

        // net movement under the slop resolves a click
        controller.on_down(50.0, &scroll);
        controller.on_move(52.0, &mut scroll);
        let hit = controller.on_up(52.0, &[5.0, 120.0], &mut scroll);
        assert_eq!(hit, Some(0));

        // the same gesture with real travel is a drag, never a click
        controller.on_down(50.0, &scroll);
        controller.on_move(200.0, &mut scroll);
        let hit = controller.on_up(200.0, &[0.0, 120.0], &mut scroll);
        assert_eq!(hit, None);
    }

    #[test]
    fn click_requires_item_near_center() {
        let mut controller = ScrollController::new(2.0, 0.0, 200);
        controller.set_item_width(100.0);
        let mut scroll = ScrollState::new(0.05);

        // 5 < 0.3 * 100 resolves
        controller.on_down(10.0, &scroll);
        assert_eq!(controller.on_up(10.0, &[5.0], &mut scroll), Some(0));

        // 40 > 30 does not
        controller.on_down(10.0, &scroll);
        assert_eq!(controller.on_up(10.0, &[40.0], &mut scroll), None);
    }

    #[test]
    fn drag_moves_target_against_pointer() {
        let mut controller = ScrollController::new(2.0, 0.0, 200);
        let mut scroll = ScrollState::new(0.05);
        scroll.target = 10.0;

        controller.on_down(100.0, &scroll);
        controller.on_move(60.0, &mut scroll);
        assert!((scroll.target - (10.0 + 40.0 * 2.0 * DRAG_SCALE)).abs() < 1e-6);
        assert!(controller.is_dragging());
    }

    #[test]
    fn wheel_nudges_by_fixed_step() {
        let mut controller = ScrollController::new(2.0, 0.0, 200);
        let mut scroll = ScrollState::new(0.05);

        controller.on_wheel(120.0, &mut scroll);
        assert!((scroll.target - 0.4).abs() < 1e-6);
        controller.on_wheel(-120.0, &mut scroll);
        assert!(scroll.target.abs() < 1e-6);
    }

    #[test]
    fn wheel_settle_snaps_after_quiet_period() {
        // zero debounce fires the armed snap on the very next tick
        let mut controller = ScrollController::new(2.0, 0.0, 0);
        controller.set_item_width(4.0);
        let mut scroll = ScrollState::new(0.05);

        controller.on_wheel(120.0, &mut scroll);
        assert!((scroll.target - 0.4).abs() < 1e-6);

        controller.tick(&mut scroll);
        assert_eq!(scroll.target, 0.0);
        // current already equals the snapped target, so the same tick
        // completes Settling and lands back in Idle
        assert_eq!(controller.state, ControllerState::Idle);

        // a second tick with nothing armed leaves the target alone
        controller.tick(&mut scroll);
        assert_eq!(scroll.target, 0.0);
    }

    #[test]
    fn autoplay_drifts_only_while_not_dragging() {
        let mut controller = ScrollController::new(2.0, 0.02, 200);
        let mut scroll = ScrollState::new(0.05);

        controller.tick(&mut scroll);
        assert!((scroll.target - 0.02).abs() < 1e-6);

        controller.on_down(0.0, &scroll);
        let before = scroll.target;
        controller.tick(&mut scroll);
        assert_eq!(scroll.target, before);
    }

    #[test]
    fn settling_returns_to_idle() {
        let mut controller = ScrollController::new(2.0, 0.0, 200);
        controller.set_item_width(4.0);
        let mut scroll = ScrollState::new(0.5);

        controller.on_down(0.0, &scroll);
        controller.on_move(100.0, &mut scroll);
        controller.on_up(100.0, &[], &mut scroll);
        assert_eq!(controller.state, ControllerState::Settling);

        for _ in 0..64 {
            scroll.step();
            controller.tick(&mut scroll);
            scroll.commit();
        }
        assert_eq!(controller.state, ControllerState::Idle);
    }

    #[test]
    fn direction_follows_motion() {
        let mut scroll = ScrollState::new(0.1);
        scroll.target = 10.0;
        scroll.step();
        assert_eq!(scroll.direction(), Direction::Right);
        scroll.commit();
        scroll.target = -10.0;
        scroll.step();
        assert_eq!(scroll.direction(), Direction::Left);
    }
}
