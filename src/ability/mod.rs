//! Job ability dispatch.
//!
//! Every cast goes through [`check_castable`] first. It checks the table
//! entry, the level gate, one-time use, seal, and then the job's own
//! preconditions. Only when all of them pass does [`cast`] touch any state,
//! so a refused cast leaves both combatants exactly as they were.

mod arcane;
mod craft;
mod melee;
mod puppetry;
mod support;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::battle::events::MatchEvent;
use crate::catalog::{AbilityDef, GameData, Job};
use crate::combat::{pursuit, status_event, Engagement};
use crate::combatant::Combatant;
use crate::error::AbilityFailure;
use crate::item::{CostumePart, ItemId, ItemIds};
use crate::rng::MatchRng;
use crate::shop::ShopGenerator;
use crate::side::Side;

/// Extra choices some abilities need from the caster.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CastParams {
    /// Costume part to reinforce.
    pub part: Option<CostumePart>,
    /// HP paid into the doll, a multiple of 10.
    pub hp_cost: Option<i32>,
    /// Exactly three normal items to fuse.
    pub item_ids: Option<Vec<ItemId>>,
}

pub struct AbilityContext<'a> {
    pub caster: &'a mut Combatant,
    pub caster_side: Side,
    pub target: &'a mut Combatant,
    pub data: &'a GameData,
    pub rng: &'a mut MatchRng,
    pub ids: &'a mut ItemIds,
    pub shop: &'a dyn ShopGenerator,
}

impl<'a> AbilityContext<'a> {
    pub fn target_side(&self) -> Side {
        self.caster_side.other()
    }

    pub fn engagement(&mut self) -> Engagement<'_> {
        Engagement {
            actor: &mut *self.caster,
            actor_side: self.caster_side,
            target: &mut *self.target,
            data: self.data,
            rng: &mut *self.rng,
        }
    }

    fn grant_buff(&mut self, def: &AbilityDef) -> Vec<MatchEvent> {
        match &def.buff {
            Some(b) => {
                self.caster.effects.add_buff(b.kind, b.magnitude, b.rounds);
                vec![status_event(self.caster_side, self.caster)]
            }
            None => Vec::new(),
        }
    }
}

/// Everything that must hold for `caster` to cast `index` right now.
pub fn check_castable<'d>(
    caster: &Combatant,
    index: u8,
    params: &CastParams,
    data: &'d GameData,
) -> Result<&'d AbilityDef, AbilityFailure> {
    let def = data
        .ability(caster.job, index)
        .ok_or(AbilityFailure::UnknownAbility(index))?;
    if caster.level < def.min_level {
        return Err(AbilityFailure::InsufficientLevel {
            index,
            level: caster.level,
        });
    }
    if !def.reusable && caster.used_abilities.contains(&index) {
        return Err(AbilityFailure::AlreadyUsed(index));
    }
    if caster.is_sealed() {
        return Err(AbilityFailure::Sealed);
    }
    match caster.job {
        Job::Thief => support::check_thief(caster, index)?,
        Job::Mage => arcane::check_mage(caster, def)?,
        Job::Alchemist => craft::check_alchemist(caster, index, params)?,
        Job::Archer => craft::check_archer(caster, index)?,
        Job::Puppeteer => puppetry::check(caster, index, params, data)?,
        Job::Warrior | Job::Knight | Job::Priest | Job::Onmyoji => {}
    }
    Ok(def)
}

/// Cast an ability. On success the ability is recorded as used (unless it is
/// reusable) and the events are returned in the order they happened.
pub fn cast(
    ctx: &mut AbilityContext,
    index: u8,
    params: &CastParams,
) -> Result<Vec<MatchEvent>, AbilityFailure> {
    let data = ctx.data;
    let def = check_castable(ctx.caster, index, params, data)?;
    log::debug!(
        "{} casts {} ({} #{})",
        ctx.caster.name,
        def.name,
        ctx.caster.job.name(),
        index
    );
    let mut events = vec![MatchEvent::AbilityCast {
        side: ctx.caster_side,
        index,
        name: def.name.clone(),
    }];
    events.extend(match ctx.caster.job {
        Job::Warrior => melee::warrior(ctx, def),
        Job::Knight => melee::knight(ctx, def),
        Job::Priest => support::priest(ctx, def),
        Job::Thief => support::thief(ctx, def),
        Job::Mage => arcane::mage(ctx, def),
        Job::Onmyoji => arcane::onmyoji(ctx, def),
        Job::Alchemist => craft::alchemist(ctx, def, params),
        Job::Archer => craft::archer(ctx, def),
        Job::Puppeteer => puppetry::resolve(ctx, def, params),
    });
    events.extend(pursuit(&mut ctx.engagement()));
    if !def.reusable {
        ctx.caster.used_abilities.insert(index);
    }
    Ok(events)
}
