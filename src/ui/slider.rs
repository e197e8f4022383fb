use crate::config::SliderConfig;
use bevy::prelude::*;

/// Horizontal drag control whose button travels over `[left_limit, right_limit]` in window
/// coordinates and reports its offset as a fraction of the track width.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SpeedSlider {
    left_limit: f32,
    right_limit: f32,
    y: f32,
    button_size: Vec2,
    /// Button offset from `left_limit`, always within `[0, track_width]`.
    offset: f32,
    /// Offset the current drag is measured from.
    origin: f32,
    /// Pointer x at drag start; `None` while idle.
    press_x: Option<f32>,
    last_pointer_x: f32,
}

impl SpeedSlider {
    pub fn new(left_limit: f32, right_limit: f32, y: f32, button_size: Vec2) -> Self {
        assert!(
            right_limit > left_limit,
            "slider track must have positive width ({left_limit} .. {right_limit})"
        );
        Self {
            left_limit,
            right_limit,
            y,
            button_size,
            offset: 0.0,
            origin: 0.0,
            press_x: None,
            last_pointer_x: left_limit,
        }
    }

    pub fn from_config(config: &SliderConfig) -> Self {
        Self::new(
            config.left_limit,
            config.right_limit,
            config.y,
            Vec2::from(config.button_size),
        )
    }

    pub fn track_width(&self) -> f32 {
        self.right_limit - self.left_limit
    }

    pub fn value(&self) -> f32 {
        self.offset / self.track_width()
    }

    pub fn is_dragging(&self) -> bool {
        self.press_x.is_some()
    }

    pub fn button_center(&self) -> Vec2 {
        Vec2::new(self.left_limit + self.offset, self.y)
    }

    pub fn button_size(&self) -> Vec2 {
        self.button_size
    }

    pub fn left_limit(&self) -> f32 {
        self.left_limit
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let delta = (point - self.button_center()).abs();
        let half = self.button_size * 0.5;
        delta.x <= half.x && delta.y <= half.y
    }

    /// Starts a drag when `point` hits the button. Returns whether the press was captured.
    pub fn press(&mut self, point: Vec2) -> bool {
        if !self.contains(point) {
            return false;
        }
        self.press_x = Some(point.x);
        self.last_pointer_x = point.x;
        true
    }

    /// Moves the button by the cumulative pointer delta since the drag began and reports the new
    /// fraction. Idle sliders ignore moves.
    pub fn drag(&mut self, pointer_x: f32) -> Option<f32> {
        let press_x = self.press_x?;
        self.last_pointer_x = pointer_x;
        self.offset = (self.origin + (pointer_x - press_x)).clamp(0.0, self.track_width());
        Some(self.value())
    }

    pub fn release(&mut self) {
        if self.press_x.take().is_some() {
            self.origin = self.offset;
        }
    }

    /// Repositions the button without reporting a change; a drag in progress continues from here.
    pub fn set(&mut self, fraction: f32) {
        self.offset = fraction.clamp(0.0, 1.0) * self.track_width();
        self.origin = self.offset;
        if self.press_x.is_some() {
            self.press_x = Some(self.last_pointer_x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slider() -> SpeedSlider {
        SpeedSlider::new(40.0, 240.0, 560.0, Vec2::new(24.0, 24.0))
    }

    #[test]
    fn press_outside_button_is_not_captured() {
        let mut slider = slider();

        assert!(!slider.press(Vec2::new(140.0, 560.0)));
        assert!(!slider.press(Vec2::new(40.0, 300.0)));
        assert!(!slider.is_dragging());
        assert_eq!(slider.drag(200.0), None);
    }

    #[test]
    fn drag_reports_fraction_of_track() {
        let mut slider = slider();

        assert!(slider.press(Vec2::new(45.0, 555.0)));
        assert_eq!(slider.drag(95.0), Some(0.25));
        assert_eq!(slider.drag(145.0), Some(0.5));
    }

    #[test]
    fn drag_clamps_to_track_bounds() {
        let mut slider = slider();

        slider.press(Vec2::new(40.0, 560.0));
        assert_eq!(slider.drag(-500.0), Some(0.0));
        assert_eq!(slider.drag(5000.0), Some(1.0));
    }

    #[test]
    fn values_stay_in_range_and_follow_pointer_order() {
        let mut slider = slider();
        slider.press(Vec2::new(40.0, 560.0));

        let mut previous = 0.0;
        for pointer_x in (-100..400).step_by(7) {
            let value = slider.drag(pointer_x as f32).unwrap();
            assert!((0.0..=1.0).contains(&value));
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn release_keeps_position_as_next_origin() {
        let mut slider = slider();

        slider.press(Vec2::new(40.0, 560.0));
        slider.drag(140.0);
        slider.release();
        assert!(!slider.is_dragging());
        assert_eq!(slider.button_center().x, 140.0);

        assert!(slider.press(Vec2::new(140.0, 560.0)));
        assert_eq!(slider.drag(190.0), Some(0.75));
    }

    #[test]
    fn set_zero_then_still_drag_reports_exactly_zero() {
        let mut slider = slider();
        slider.press(Vec2::new(40.0, 560.0));
        slider.drag(200.0);
        slider.release();

        slider.set(0.0);
        assert_eq!(slider.value(), 0.0);

        assert!(slider.press(Vec2::new(40.0, 560.0)));
        assert_eq!(slider.drag(40.0), Some(0.0));
    }

    #[test]
    fn set_during_drag_rebases_the_gesture() {
        let mut slider = slider();
        slider.press(Vec2::new(40.0, 560.0));
        slider.drag(190.0);

        slider.set(0.0);

        assert_eq!(slider.drag(190.0), Some(0.0));
        assert_eq!(slider.drag(240.0), Some(0.25));
    }
}
