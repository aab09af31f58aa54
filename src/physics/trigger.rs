//! Overlap tracking for trigger volumes

use hecs::Entity;
use smallvec::SmallVec;

use crate::ai::TriggerPhase;
use crate::ecs::Transform;

use super::{Cast, Detection, SpatialIndex};

/// A cast re-run every tick whose overlaps are reported as
/// enter / stay / exit phases.
#[derive(Debug, Clone)]
pub struct TriggerVolume {
    pub cast: Cast,
    overlapping: SmallVec<[Entity; 4]>,
}

/// One overlap change reported by a trigger volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Entity owning the volume
    pub owner: Entity,
    pub phase: TriggerPhase,
    pub other: Entity,
}

impl TriggerVolume {
    #[must_use]
    pub fn new(cast: Cast) -> Self {
        Self {
            cast,
            overlapping: SmallVec::new(),
        }
    }

    /// Entities overlapping as of the last refresh
    #[must_use]
    pub fn overlapping(&self) -> &[Entity] {
        &self.overlapping
    }

    /// Re-run the cast and append the phase of every overlap to `out`.
    ///
    /// Exits are reported before enters.
    pub fn refresh(
        &mut self,
        owner: Entity,
        origin: &Transform,
        spatial: &SpatialIndex,
        out: &mut Vec<TriggerEvent>,
    ) {
        let current: Detection = spatial.detect(origin, &self.cast, Some(owner));

        for &other in &self.overlapping {
            if !current.contains(&other) {
                out.push(TriggerEvent {
                    owner,
                    phase: TriggerPhase::Exit,
                    other,
                });
            }
        }
        for &other in &current {
            let phase = if self.overlapping.contains(&other) {
                TriggerPhase::Stay
            } else {
                TriggerPhase::Enter
            };
            out.push(TriggerEvent { owner, phase, other });
        }

        self.overlapping = current.into_iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::ecs::{Body, BodyShape, World};
    use crate::physics::CategoryMask;

    #[test]
    fn test_enter_stay_exit() {
        let mut world = World::new();
        let owner = world.spawn((Transform::default(),));
        let other = world.spawn((
            Transform::from_position(Vec3::new(1.0, 0.0, 0.0)),
            Body {
                shape: BodyShape::Sphere { radius: 0.5 },
                category: CategoryMask::MOB,
            },
        ));
        let mut spatial = SpatialIndex::new();
        spatial.sync(&world);

        let mut volume = TriggerVolume::new(Cast::sphere(1.0, CategoryMask::ALL));
        let origin = Transform::default();
        let mut events = Vec::new();

        volume.refresh(owner, &origin, &spatial, &mut events);
        volume.refresh(owner, &origin, &spatial, &mut events);
        let phases: Vec<_> = events.iter().map(|e| e.phase).collect();
        assert_eq!(phases, [TriggerPhase::Enter, TriggerPhase::Stay]);

        world
            .get_mut::<Transform>(other)
            .unwrap()
            .position = Vec3::new(10.0, 0.0, 0.0);
        spatial.sync(&world);
        events.clear();

        volume.refresh(owner, &origin, &spatial, &mut events);
        assert_eq!(
            events,
            [TriggerEvent {
                owner,
                phase: TriggerPhase::Exit,
                other
            }]
        );
        assert!(volume.overlapping().is_empty());
    }
}
