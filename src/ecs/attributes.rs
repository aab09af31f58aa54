//! Per-entity numeric attributes
//!
//! Health, stamina and the movement/perception values behavior states read
//! when deciding transitions. Values are clamped to `[0, max]`.

use serde::{Deserialize, Serialize};

/// Named attribute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Health,
    Stamina,
    Speed,
    DetectionRadius,
    ChaseDistance,
    EscapeDistance,
}

impl AttributeKind {
    /// Every attribute, in storage order
    pub const ALL: [Self; 6] = [
        Self::Health,
        Self::Stamina,
        Self::Speed,
        Self::DetectionRadius,
        Self::ChaseDistance,
        Self::EscapeDistance,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Current and maximum value of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Attribute {
    pub current: f32,
    pub max: f32,
}

impl Attribute {
    /// Attribute filled to `max`
    #[must_use]
    pub const fn full(max: f32) -> Self {
        Self { current: max, max }
    }
}

/// Attribute component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Attributes {
    values: [Attribute; 6],
}

impl Attributes {
    /// Attributes with the given health and everything else at zero
    #[must_use]
    pub fn with_health(health: f32) -> Self {
        Self::default().with(AttributeKind::Health, health)
    }

    /// Set an attribute to full at `max`
    #[must_use]
    pub fn with(mut self, kind: AttributeKind, max: f32) -> Self {
        self.values[kind.index()] = Attribute::full(max.max(0.0));
        self
    }

    /// Current value of an attribute
    #[must_use]
    pub fn current(&self, kind: AttributeKind) -> f32 {
        self.values[kind.index()].current
    }

    /// Maximum value of an attribute
    #[must_use]
    pub fn max(&self, kind: AttributeKind) -> f32 {
        self.values[kind.index()].max
    }

    /// Get the full attribute record
    #[must_use]
    pub fn get(&self, kind: AttributeKind) -> Attribute {
        self.values[kind.index()]
    }

    /// Add `delta` to the current value, clamped. Returns the applied change.
    pub fn modify(&mut self, kind: AttributeKind, delta: f32) -> f32 {
        let slot = &mut self.values[kind.index()];
        let before = slot.current;
        slot.current = (slot.current + delta).clamp(0.0, slot.max);
        slot.current - before
    }

    /// Remove health. Returns the damage actually dealt.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        -self.modify(AttributeKind::Health, -amount)
    }

    /// Restore health. Returns the amount actually healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        self.modify(AttributeKind::Health, amount)
    }

    /// Whether health is above zero
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current(AttributeKind::Health) > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut attrs = Attributes::with_health(10.0);

        assert_eq!(attrs.apply_damage(4.0), 4.0);
        assert_eq!(attrs.apply_damage(20.0), 6.0);
        assert_eq!(attrs.current(AttributeKind::Health), 0.0);
        assert!(!attrs.is_alive());
    }

    #[test]
    fn test_heal_clamps_at_max() {
        let mut attrs = Attributes::with_health(10.0);
        attrs.apply_damage(3.0);

        assert_eq!(attrs.heal(5.0), 3.0);
        assert_eq!(attrs.current(AttributeKind::Health), 10.0);
    }

    #[test]
    fn test_negative_amounts_are_ignored() {
        let mut attrs = Attributes::with_health(10.0);

        assert_eq!(attrs.apply_damage(-5.0), 0.0);
        assert_eq!(attrs.heal(-5.0), 0.0);
        assert_eq!(attrs.current(AttributeKind::Health), 10.0);
    }

    #[test]
    fn test_independent_slots() {
        let mut attrs = Attributes::with_health(50.0).with(AttributeKind::Stamina, 20.0);
        attrs.modify(AttributeKind::Stamina, -5.0);

        assert_eq!(attrs.current(AttributeKind::Stamina), 15.0);
        assert_eq!(attrs.max(AttributeKind::Stamina), 20.0);
        assert_eq!(attrs.current(AttributeKind::Health), 50.0);
        assert_eq!(attrs.current(AttributeKind::Speed), 0.0);
    }
}
