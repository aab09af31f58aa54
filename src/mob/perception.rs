//! Target detection and predator/prey arbitration

use hecs::Entity;

use crate::core::Command;
use crate::ecs::EntityKind;

use super::context::MobContext;
use super::memory::Hunt;

/// Scan the detection volume and lock onto a target.
///
/// The volume follows the mob's current detection radius attribute.
///
/// Skipped while the mob already hunts or flees. Players listed as prey
/// win over any mob, whatever the query order; among mobs the first
/// detected one wins. Returns the new hunt, if any.
pub fn check_chase_conditions(ctx: &mut MobContext<'_>) -> Option<Hunt> {
    if ctx.memory.is_engaged() {
        return None;
    }

    let world = ctx.frame.world;
    let detection = ctx.detection();
    let detected = ctx
        .frame
        .detect(&ctx.transform, &detection, Some(ctx.entity));

    let mut fallback: Option<Entity> = None;
    let mut player: Option<Entity> = None;

    for &candidate in &detected {
        if !world.is_alive(candidate) {
            continue;
        }
        let Ok(kind) = world.get::<EntityKind>(candidate) else {
            continue;
        };
        match &*kind {
            EntityKind::Player if ctx.profile.hunts_players() => {
                player = Some(candidate);
                break;
            }
            EntityKind::Mob { species } if fallback.is_none() && ctx.profile.hunts(species) => {
                fallback = Some(candidate);
            }
            _ => {}
        }
    }

    let hunt = match (player, fallback) {
        (Some(player), _) => Hunt::Player(player),
        (None, Some(prey)) => Hunt::Prey(prey),
        (None, None) => {
            ctx.memory.clear_hunt();
            return None;
        }
    };

    log::debug!(
        "{:?} ({}) locks onto {:?}",
        ctx.entity,
        ctx.profile.species,
        hunt
    );
    ctx.acquire(hunt);
    if let Hunt::Prey(prey) = hunt {
        ctx.frame.command(Command::NotifyPredator {
            prey,
            predator: ctx.entity,
        });
    }
    Some(hunt)
}
