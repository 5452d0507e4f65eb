use super::AbilityContext;
use crate::battle::events::{DamageKind, MatchEvent};
use crate::catalog::AbilityDef;
use crate::combat::strike;
use crate::combatant::HitKind;

fn skill_hit(ctx: &mut AbilityContext, raw: i32, ignore_defense: bool) -> Vec<MatchEvent> {
    let side = ctx.target_side();
    strike(
        ctx.target,
        side,
        raw,
        ignore_defense,
        HitKind::Primary,
        DamageKind::Skill,
    )
}

pub(super) fn warrior(ctx: &mut AbilityContext, def: &AbilityDef) -> Vec<MatchEvent> {
    let raw = match def.index {
        3 => def.power + ctx.caster.total_attack(),
        _ => def.power,
    };
    let mut events = skill_hit(ctx, raw, true);
    events.extend(ctx.grant_buff(def));
    events
}

/// Knight damage scales off defense from rank 2; the buff lands after the hit
/// so it never feeds the same cast.
pub(super) fn knight(ctx: &mut AbilityContext, def: &AbilityDef) -> Vec<MatchEvent> {
    let raw = match def.index {
        1 => def.power,
        _ => def.power + ctx.caster.total_defense(),
    };
    let mut events = skill_hit(ctx, raw, false);
    events.extend(ctx.grant_buff(def));
    events
}
