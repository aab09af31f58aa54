//! Input handling

use std::collections::HashSet;

use glam::Vec3;

use crate::ecs::Transform;

/// Logical player actions the simulation reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    /// Use the held ability
    UseAbility,
    /// Confirm a target (mouse click)
    ConfirmTarget,
    /// Abort a pending target selection
    Cancel,
}

/// Input state manager
#[derive(Debug)]
pub struct Input {
    /// Currently pressed actions
    pressed: HashSet<InputAction>,
    /// Actions that were just pressed this tick
    just_pressed: HashSet<InputAction>,
    /// Actions that were just released this tick
    just_released: HashSet<InputAction>,
    /// Camera transform the player looks through
    view: Transform,
    /// Direction under the cursor, world space
    pointer_direction: Vec3,
}

impl Input {
    /// Create a new input manager
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            view: Transform::default(),
            pointer_direction: Vec3::ZERO,
        }
    }

    /// Call at the end of each tick to clear per-tick state
    pub fn update(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }

    /// Press an action
    pub fn press(&mut self, action: InputAction) {
        if self.pressed.insert(action) {
            self.just_pressed.insert(action);
        }
    }

    /// Release an action
    pub fn release(&mut self, action: InputAction) {
        if self.pressed.remove(&action) {
            self.just_released.insert(action);
        }
    }

    /// Press and release within the same tick
    pub fn tap(&mut self, action: InputAction) {
        self.press(action);
        self.release(action);
    }

    /// Check if an action is currently held
    pub fn is_pressed(&self, action: InputAction) -> bool {
        self.pressed.contains(&action)
    }

    /// Check if an action was just pressed this tick
    pub fn is_just_pressed(&self, action: InputAction) -> bool {
        self.just_pressed.contains(&action)
    }

    /// Check if an action was just released this tick
    pub fn is_just_released(&self, action: InputAction) -> bool {
        self.just_released.contains(&action)
    }

    /// Set the camera transform
    pub fn set_view(&mut self, view: Transform) {
        self.view = view;
    }

    /// Camera transform
    pub fn view(&self) -> &Transform {
        &self.view
    }

    /// Aim the cursor along a world-space direction
    pub fn set_pointer_direction(&mut self, direction: Vec3) {
        self.pointer_direction = direction.normalize_or_zero();
    }

    /// Direction under the cursor, or the camera forward when unset
    pub fn pointer_direction(&self) -> Vec3 {
        if self.pointer_direction == Vec3::ZERO {
            self.view.forward()
        } else {
            self.pointer_direction
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_is_visible_for_one_tick() {
        let mut input = Input::new();
        input.tap(InputAction::UseAbility);

        assert!(input.is_just_pressed(InputAction::UseAbility));
        assert!(input.is_just_released(InputAction::UseAbility));
        assert!(!input.is_pressed(InputAction::UseAbility));

        input.update();
        assert!(!input.is_just_pressed(InputAction::UseAbility));
    }

    #[test]
    fn test_held_press_reports_once() {
        let mut input = Input::new();
        input.press(InputAction::ConfirmTarget);
        input.update();
        input.press(InputAction::ConfirmTarget);

        assert!(input.is_pressed(InputAction::ConfirmTarget));
        assert!(!input.is_just_pressed(InputAction::ConfirmTarget));
    }

    #[test]
    fn test_pointer_defaults_to_view_forward() {
        let mut input = Input::new();
        input.set_view(Transform::looking_along(Vec3::ZERO, Vec3::X));
        assert!((input.pointer_direction() - Vec3::X).length() < 1e-5);

        input.set_pointer_direction(Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(input.pointer_direction(), Vec3::Z);
    }
}
