//! Engagement zones: who gets pulled into a fight.
//!
//! Participation is measured from the initiator's own cell, not from the clicked
//! target. Allies inside the initiator's attack range join as support and enemies
//! inside it join as one squad. A clicked target outside the zone is still included.

use crate::combat::EncounterRequest;
use crate::grid::chebyshev;
use crate::types::UnitId;
use crate::unit::Units;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Engagement {
    pub initiator: UnitId,
    pub primary_target: Option<UnitId>,
    /// Initiator's side, initiator first, then roster order.
    pub allies: Vec<UnitId>,
    /// Opposing side in roster order.
    pub enemies: Vec<UnitId>,
}

impl Engagement {
    pub fn can_confirm(&self) -> bool {
        !self.enemies.is_empty()
    }

    pub fn to_request(&self) -> EncounterRequest {
        EncounterRequest {
            initiator: self.initiator,
            allies: self.allies.clone(),
            enemies: self.enemies.clone(),
        }
    }
}

/// Build the zone around `initiator`. `None` when the initiator is missing or dead.
pub fn resolve_engagement(
    units: &Units,
    initiator: UnitId,
    target: Option<UnitId>,
) -> Option<Engagement> {
    let source = units.get(initiator).filter(|unit| unit.is_alive())?;
    let range = source.attack_range;
    let origin = source.pos;

    let mut allies = vec![initiator];
    allies.extend(
        units
            .living(source.team)
            .filter(|unit| unit.id != initiator && chebyshev(origin, unit.pos) <= range)
            .map(|unit| unit.id),
    );

    let mut enemies: Vec<UnitId> = units
        .living(source.team.opponent())
        .filter(|unit| chebyshev(origin, unit.pos) <= range)
        .map(|unit| unit.id)
        .collect();

    let primary_target = target.filter(|id| {
        units.get(*id).is_some_and(|unit| unit.is_alive() && unit.team != source.team)
    });
    if let Some(id) = primary_target
        && !enemies.contains(&id)
    {
        enemies.push(id);
    }

    Some(Engagement { initiator, primary_target, allies, enemies })
}
