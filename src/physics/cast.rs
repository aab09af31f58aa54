//! Detection volumes used for perception and targeting

use std::ops::{BitAnd, BitOr};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::ecs::Transform;

/// Bit-set of entity categories a cast may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMask(pub u32);

impl CategoryMask {
    /// Matches nothing
    pub const NONE: Self = Self(0);
    /// Player-controlled entities
    pub const PLAYER: Self = Self(1 << 0);
    /// Autonomous creatures
    pub const MOB: Self = Self(1 << 1);
    /// Static scenery and destructibles
    pub const PROP: Self = Self(1 << 2);
    /// Every category
    pub const ALL: Self = Self(u32::MAX);

    /// Raw bits
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether no category is set
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether any category of `other` is also in `self`
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for CategoryMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for CategoryMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Shape of a detection volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastKind {
    /// Ball of radius `size`
    Sphere,
    /// Oriented box with full extents `box_size`
    Box,
    /// Segment of length `size` along forward, swept by `radius`
    Capsule,
    /// Nearest hit along forward, up to `size`
    Ray,
}

/// Invalid cast parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CastError {
    #[error("cast size must be non-negative, got {0}")]
    NegativeSize(f32),
    #[error("cast box size must be non-negative, got {0:?}")]
    NegativeBoxSize(Vec3),
    #[error("capsule radius must be non-negative, got {0}")]
    NegativeRadius(f32),
    #[error("cast parameters must be finite")]
    NonFinite,
}

fn default_radius() -> f32 {
    0.5
}

/// A parameterized detection volume.
///
/// Offset and rotation are local to the origin transform the cast is
/// performed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cast {
    pub kind: CastKind,
    /// Radius (sphere) or length (capsule, ray)
    pub size: f32,
    /// Full extents of a box cast
    #[serde(default)]
    pub box_size: Vec3,
    /// Sweep radius of a capsule cast
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default)]
    pub offset: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    pub mask: CategoryMask,
}

impl Cast {
    /// Sphere cast
    #[must_use]
    pub fn sphere(radius: f32, mask: CategoryMask) -> Self {
        Self {
            kind: CastKind::Sphere,
            size: radius,
            box_size: Vec3::ZERO,
            radius: default_radius(),
            offset: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            mask,
        }
    }

    /// Oriented box cast with full extents `size`
    #[must_use]
    pub fn cuboid(size: Vec3, mask: CategoryMask) -> Self {
        Self {
            kind: CastKind::Box,
            box_size: size,
            ..Self::sphere(0.0, mask)
        }
    }

    /// Capsule cast reaching `length` forward
    #[must_use]
    pub fn capsule(length: f32, radius: f32, mask: CategoryMask) -> Self {
        Self {
            kind: CastKind::Capsule,
            size: length,
            radius,
            ..Self::sphere(0.0, mask)
        }
    }

    /// Ray cast reaching `length` forward
    #[must_use]
    pub fn ray(length: f32, mask: CategoryMask) -> Self {
        Self {
            kind: CastKind::Ray,
            size: length,
            ..Self::sphere(0.0, mask)
        }
    }

    /// Set the local offset
    #[must_use]
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Set the local rotation
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Same cast with every extent multiplied by `factor`; offset and
    /// orientation are kept
    #[must_use]
    pub fn scaled(mut self, factor: f32) -> Self {
        let factor = factor.max(0.0);
        self.size *= factor;
        self.box_size *= factor;
        self.radius *= factor;
        self
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns an error for negative sizes or non-finite values.
    pub fn validate(&self) -> Result<(), CastError> {
        let finite = self.size.is_finite()
            && self.radius.is_finite()
            && self.box_size.is_finite()
            && self.offset.is_finite()
            && self.rotation.is_finite();
        if !finite {
            return Err(CastError::NonFinite);
        }
        if self.size < 0.0 {
            return Err(CastError::NegativeSize(self.size));
        }
        if self.box_size.min_element() < 0.0 {
            return Err(CastError::NegativeBoxSize(self.box_size));
        }
        if self.radius < 0.0 {
            return Err(CastError::NegativeRadius(self.radius));
        }
        Ok(())
    }

    /// Whether the cast can never hit anything.
    ///
    /// Zero-size volumes and an empty category mask match nothing.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        if self.mask.is_empty() || self.validate().is_err() {
            return true;
        }
        match self.kind {
            CastKind::Sphere | CastKind::Ray => self.size <= 0.0,
            CastKind::Box => self.box_size.min_element() <= 0.0,
            CastKind::Capsule => self.size <= 0.0 || self.radius <= 0.0,
        }
    }

    /// World-space center and orientation of the cast from `origin`.
    #[must_use]
    pub fn world_pose(&self, origin: &Transform) -> (Vec3, Quat) {
        let center = origin.position + origin.rotation * self.offset;
        let rotation = (origin.rotation * self.rotation).normalize();
        (center, rotation)
    }

    /// World-space forward axis of the cast from `origin`.
    #[must_use]
    pub fn forward(&self, origin: &Transform) -> Vec3 {
        let (_, rotation) = self.world_pose(origin);
        rotation * Vec3::NEG_Z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_is_degenerate() {
        assert!(Cast::sphere(0.0, CategoryMask::ALL).is_degenerate());
        assert!(Cast::ray(0.0, CategoryMask::ALL).is_degenerate());
        assert!(Cast::cuboid(Vec3::new(1.0, 0.0, 1.0), CategoryMask::ALL).is_degenerate());
        assert!(Cast::capsule(2.0, 0.0, CategoryMask::ALL).is_degenerate());
        assert!(!Cast::sphere(1.0, CategoryMask::ALL).is_degenerate());
    }

    #[test]
    fn test_empty_mask_is_degenerate() {
        assert!(Cast::sphere(5.0, CategoryMask::NONE).is_degenerate());
    }

    #[test]
    fn test_validate_rejects_negative_sizes() {
        assert_eq!(
            Cast::sphere(-1.0, CategoryMask::ALL).validate(),
            Err(CastError::NegativeSize(-1.0))
        );
        assert!(matches!(
            Cast::cuboid(Vec3::new(1.0, -1.0, 1.0), CategoryMask::ALL).validate(),
            Err(CastError::NegativeBoxSize(_))
        ));
        assert_eq!(
            Cast::sphere(f32::NAN, CategoryMask::ALL).validate(),
            Err(CastError::NonFinite)
        );
    }

    #[test]
    fn test_world_pose_applies_origin_rotation_to_offset() {
        let origin = Transform::from_position_rotation(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        let cast = Cast::sphere(1.0, CategoryMask::ALL).with_offset(Vec3::new(0.0, 0.0, -2.0));

        let (center, _) = cast.world_pose(&origin);

        // Facing -X after a quarter turn around Y
        assert!((center - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-4);
        assert!((cast.forward(&origin) - Vec3::NEG_X).length() < 1e-4);
    }

    #[test]
    fn test_mask_ops() {
        let mask = CategoryMask::PLAYER | CategoryMask::MOB;

        assert!(mask.intersects(CategoryMask::MOB));
        assert!(!mask.intersects(CategoryMask::PROP));
        assert_eq!(mask & CategoryMask::PLAYER, CategoryMask::PLAYER);
    }

    #[test]
    fn test_cast_ron_round_trip() {
        let cast = Cast::capsule(4.0, 0.75, CategoryMask::MOB)
            .with_offset(Vec3::new(0.0, 1.0, 0.0))
            .with_rotation(Quat::from_rotation_x(0.3));

        let text = ron::to_string(&cast).unwrap();
        let back: Cast = ron::from_str(&text).unwrap();

        assert_eq!(back.kind, cast.kind);
        assert_eq!(back.mask, cast.mask);
        assert!((back.size - cast.size).abs() < 1e-6);
        assert!((back.offset - cast.offset).length() < 1e-6);
    }

    #[test]
    fn test_scaled_keeps_shape_and_pose() {
        let cast = Cast::capsule(4.0, 1.0, CategoryMask::MOB).with_offset(Vec3::Y);

        let half = cast.scaled(0.5);
        assert_eq!(half.size, 2.0);
        assert_eq!(half.radius, 0.5);
        assert_eq!(half.offset, Vec3::Y);
        assert!(cast.scaled(0.0).is_degenerate());
        assert!(cast.scaled(-3.0).is_degenerate());
    }
}
