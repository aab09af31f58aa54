//! Debug visualization hooks

use glam::{Quat, Vec3};

use crate::ecs::Transform;
use crate::physics::{Cast, CastKind};

/// Receiver for cast volumes, typically a wireframe renderer.
pub trait DebugDraw {
    /// A cast was performed from `origin` and hit `hits` entities.
    fn draw_cast(&mut self, origin: &Transform, cast: &Cast, hits: usize);
}

/// World-space description of one cast volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastGizmo {
    pub kind: CastKind,
    /// Center of the volume (start point for capsules and rays)
    pub center: Vec3,
    pub rotation: Quat,
    /// Radius, half extents, or length depending on `kind`
    pub extent: Vec3,
    pub hits: usize,
}

impl CastGizmo {
    /// Describe `cast` performed from `origin`
    #[must_use]
    pub fn new(origin: &Transform, cast: &Cast, hits: usize) -> Self {
        let (center, rotation) = cast.world_pose(origin);
        let extent = match cast.kind {
            CastKind::Sphere => Vec3::splat(cast.size),
            CastKind::Box => cast.box_size * 0.5,
            CastKind::Capsule => Vec3::new(cast.radius, cast.radius, cast.size),
            CastKind::Ray => Vec3::new(0.0, 0.0, cast.size),
        };
        Self {
            kind: cast.kind,
            center,
            rotation,
            extent,
            hits,
        }
    }
}

/// Debug overlay information
#[derive(Debug, Default)]
pub struct DebugOverlay {
    /// Whether casts are recorded
    pub enabled: bool,
    /// Casts recorded this tick
    gizmos: Vec<CastGizmo>,
}

impl DebugOverlay {
    /// Create new debug overlay
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    /// Casts recorded since the last clear
    pub fn gizmos(&self) -> &[CastGizmo] {
        &self.gizmos
    }

    /// One summary line per recorded cast
    pub fn summary_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.gizmos.iter().map(|gizmo| {
            format!(
                "{:?} at ({:.1}, {:.1}, {:.1}) hits={}",
                gizmo.kind, gizmo.center.x, gizmo.center.y, gizmo.center.z, gizmo.hits
            )
        })
    }

    /// Forget everything recorded
    pub fn clear(&mut self) {
        self.gizmos.clear();
    }
}

impl DebugDraw for DebugOverlay {
    fn draw_cast(&mut self, origin: &Transform, cast: &Cast, hits: usize) {
        if self.enabled {
            self.gizmos.push(CastGizmo::new(origin, cast, hits));
        }
    }
}
