use super::{AbilityContext, CastParams};
use crate::battle::events::MatchEvent;
use crate::catalog::gear::costume;
use crate::catalog::{AbilityDef, GameData};
use crate::combat::{doll_event, hp_event};
use crate::combatant::Combatant;
use crate::error::AbilityFailure;

fn invalid(reason: &str) -> AbilityFailure {
    AbilityFailure::InvalidTarget(reason.to_string())
}

pub(super) fn check(
    caster: &Combatant,
    index: u8,
    params: &CastParams,
    data: &GameData,
) -> Result<(), AbilityFailure> {
    let doll = caster.doll().ok_or_else(|| invalid("no doll"))?;
    let rules = &data.rules.doll;
    match index {
        1 => {
            let part = params.part.ok_or_else(|| invalid("choose a costume part"))?;
            let worn = doll
                .costumes
                .get(&part)
                .and_then(|i| i.as_costume())
                .ok_or_else(|| invalid("no costume in that part"))?;
            if worn.star >= rules.max_costume_star {
                return Err(invalid("costume is already at the top star"));
            }
        }
        2 => {
            let cost = params.hp_cost.ok_or_else(|| invalid("choose an hp cost"))?;
            if !(10..=100).contains(&cost) || cost % 10 != 0 {
                return Err(invalid("hp cost must be 10 to 100 in steps of 10"));
            }
            if caster.hp - cost < 1 {
                return Err(AbilityFailure::InsufficientResource {
                    needed: cost + 1,
                    available: caster.hp,
                });
            }
            if doll.is_broken {
                return Err(invalid("the doll is broken"));
            }
        }
        _ => {
            if doll.is_broken || doll.is_rampage {
                return Err(invalid("the doll cannot rampage now"));
            }
            if doll.durability < rules.rampage_min_durability {
                return Err(AbilityFailure::InsufficientResource {
                    needed: rules.rampage_min_durability,
                    available: doll.durability,
                });
            }
        }
    }
    Ok(())
}

pub(super) fn resolve(
    ctx: &mut AbilityContext,
    def: &AbilityDef,
    params: &CastParams,
) -> Vec<MatchEvent> {
    let side = ctx.caster_side;
    let data = ctx.data;
    let rules = &data.rules.doll;
    match def.index {
        1 => {
            let Some(part) = params.part else {
                return Vec::new();
            };
            if let Some(doll) = ctx.caster.doll_mut() {
                if let Some(item) = doll.costumes.get_mut(&part) {
                    if let Some(c) = item.as_costume().cloned() {
                        let star = c.star + 1;
                        let id = item.id;
                        *item = costume(c.part, c.stat, star);
                        item.id = id;
                    }
                }
            }
        }
        2 => {
            let cost = params.hp_cost.unwrap_or(0);
            ctx.caster.lose_hp(cost);
            if let Some(doll) = ctx.caster.doll_mut() {
                doll.mend(cost / 2);
            }
            let mut events = vec![hp_event(side, ctx.caster)];
            events.extend(doll_event(side, ctx.caster));
            return events;
        }
        _ => {
            if let Some(doll) = ctx.caster.doll_mut() {
                doll.start_rampage(rules);
            }
        }
    }
    doll_event(side, ctx.caster).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::super::tests::Bench;
    use super::*;
    use crate::catalog::Job;
    use crate::item::{CostumePart, CostumeStat};

    fn dressed(star: u8) -> Bench {
        let mut b = Bench::new(Job::Puppeteer, Job::Warrior);
        let mut hat = costume(CostumePart::Head, CostumeStat::Atk, star);
        hat.id = 40;
        if let Some(d) = b.caster.doll_mut() {
            d.dress(hat);
        }
        b
    }

    fn head() -> CastParams {
        CastParams {
            part: Some(CostumePart::Head),
            ..CastParams::default()
        }
    }

    #[test]
    fn tailoring_raises_star_and_keeps_id() {
        let mut b = dressed(1);
        b.cast(1, head()).expect("tailor");
        let hat = b.caster.doll().and_then(|d| d.costumes.get(&CostumePart::Head)).cloned();
        let hat = hat.expect("hat");
        assert_eq!(hat.id, 40);
        assert_eq!(hat.as_costume().map(|c| c.star), Some(2));
        assert_eq!(b.caster.doll().map(|d| d.attack(&b.data.rules.doll)), Some(25));
    }

    #[test]
    fn tailoring_rejects_empty_and_maxed_parts() {
        let mut b = Bench::new(Job::Puppeteer, Job::Warrior);
        assert_eq!(b.cast(1, head()).map(|_| ()).unwrap_err().code(), "INVALID_TARGET");
        let mut b = dressed(4);
        assert!(b.cast(1, head()).is_err());
        assert!(b.caster.used_abilities.is_empty());
    }

    #[test]
    fn lifeblood_mending_converts_half() {
        let mut b = Bench::new(Job::Puppeteer, Job::Warrior);
        b.caster.level = 2;
        let bad = CastParams {
            hp_cost: Some(15),
            ..CastParams::default()
        };
        assert!(b.cast(2, bad).is_err());
        let params = CastParams {
            hp_cost: Some(40),
            ..CastParams::default()
        };
        b.cast(2, params).expect("mend");
        assert_eq!(b.caster.hp, 160);
        assert_eq!(b.caster.doll().map(|d| d.durability), Some(80));
    }

    #[test]
    fn rampage_halves_durability() {
        let mut b = Bench::new(Job::Puppeteer, Job::Warrior);
        b.caster.level = 3;
        b.cast(3, CastParams::default()).expect("rampage");
        let doll = b.caster.doll().cloned().expect("doll");
        assert_eq!(doll.durability, 30);
        assert!(doll.is_rampage);
        assert_eq!(doll.rampage_rounds_remaining, 3);
        assert_eq!(doll.attack(&b.data.rules.doll), 40);
    }
}
