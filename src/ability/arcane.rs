use super::AbilityContext;
use crate::battle::events::{DamageKind, MatchEvent};
use crate::catalog::AbilityDef;
use crate::combat::{hp_event, status_event, strike};
use crate::combatant::effects::{BuffKind, Shikigami, SummonLifetime};
use crate::combatant::{Combatant, HitKind};
use crate::error::AbilityFailure;

pub(super) fn check_mage(caster: &Combatant, def: &AbilityDef) -> Result<(), AbilityFailure> {
    let available = caster.mana();
    if def.mana_cost > available {
        return Err(AbilityFailure::InsufficientResource {
            needed: def.mana_cost,
            available,
        });
    }
    Ok(())
}

pub(super) fn mage(ctx: &mut AbilityContext, def: &AbilityDef) -> Vec<MatchEvent> {
    let side = ctx.caster_side;
    let pierce = ctx.caster.mage().map(|k| k.magic_pierce()).unwrap_or(false);
    let raw = match def.index {
        1 => {
            ctx.caster.add_mana(def.power);
            None
        }
        2 => {
            ctx.caster.add_mana(-def.mana_cost);
            Some(def.power)
        }
        _ => {
            let spent = ctx.caster.mana();
            ctx.caster.add_mana(-spent);
            Some((spent - def.power).max(0))
        }
    };
    let mut events = vec![MatchEvent::ManaChanged {
        side,
        mana: ctx.caster.mana(),
    }];
    if let Some(raw) = raw {
        let target_side = ctx.target_side();
        events.extend(strike(
            ctx.target,
            target_side,
            raw,
            pierce,
            HitKind::Primary,
            DamageKind::Skill,
        ));
    }
    events
}

pub(super) fn onmyoji(ctx: &mut AbilityContext, def: &AbilityDef) -> Vec<MatchEvent> {
    let picks: Vec<Shikigami> = match def.index {
        1 => ctx.rng.pick(&Shikigami::NOVICE).copied().into_iter().collect(),
        2 => ctx.rng.pick(&Shikigami::ALL).copied().into_iter().collect(),
        _ => ctx
            .rng
            .distinct_indexes(Shikigami::ALL.len(), 2)
            .into_iter()
            .map(|n| Shikigami::ALL[n])
            .collect(),
    };
    let mut events = Vec::new();
    for s in picks {
        log::debug!("{} summons {}", ctx.caster.name, s.name());
        events.extend(summon(ctx, s));
    }
    events
}

fn announce(ctx: &AbilityContext, s: Shikigami) -> MatchEvent {
    MatchEvent::SummonChanged {
        side: ctx.caster_side,
        summon: s.name().to_string(),
        active: true,
    }
}

fn summon(ctx: &mut AbilityContext, s: Shikigami) -> Vec<MatchEvent> {
    let side = ctx.caster_side;
    let target_side = ctx.target_side();
    match s {
        Shikigami::Onibi => {
            ctx.target.effects.add_dot(s.name(), 3, 5);
            vec![status_event(target_side, ctx.target)]
        }
        Shikigami::Nekomata => {
            ctx.target.effects.add_buff(BuffKind::SkillSeal, 0, 2);
            ctx.caster.effects.summon(s, SummonLifetime::Rounds(3));
            vec![
                announce(ctx, s),
                status_event(target_side, ctx.target),
                status_event(side, ctx.caster),
            ]
        }
        Shikigami::Genbu => {
            ctx.caster.effects.add_buff(BuffKind::DefenseUp, 5, 3);
            ctx.caster.barrier += 1;
            ctx.caster.effects.summon(s, SummonLifetime::Rounds(4));
            vec![announce(ctx, s), status_event(side, ctx.caster)]
        }
        Shikigami::KarasuTengu => {
            ctx.caster.effects.summon(s, SummonLifetime::Triggers(3));
            vec![announce(ctx, s), status_event(side, ctx.caster)]
        }
        Shikigami::Kyubi => {
            let mut events = strike(
                ctx.target,
                target_side,
                30,
                true,
                HitKind::Primary,
                DamageKind::Skill,
            );
            if let Some(lost) = ctx.target.equipped.take() {
                log::debug!("kyubi burns {}", lost.name);
            }
            ctx.target.effects.clear_buffs();
            ctx.target.barrier = 0;
            events.push(status_event(target_side, ctx.target));
            events
        }
        Shikigami::Hakuryu => {
            let healed = ctx.caster.heal(30 + ctx.caster.total_defense());
            vec![
                MatchEvent::HealApplied {
                    target: side,
                    amount: healed,
                },
                hp_event(side, ctx.caster),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Bench;
    use super::super::CastParams;
    use super::*;
    use crate::catalog::Job;
    use crate::item::{EquipCategory, Equipment, Item, ItemKind};

    #[test]
    fn element_burst_needs_mana() {
        let mut b = Bench::new(Job::Mage, Job::Warrior);
        b.caster.level = 2;
        let err = b.cast(2, CastParams::default()).expect_err("no mana");
        assert_eq!(
            err,
            AbilityFailure::InsufficientResource {
                needed: 30,
                available: 0
            }
        );
        b.caster.add_mana(45);
        b.cast(2, CastParams::default()).expect("burst");
        assert_eq!(b.caster.mana(), 15);
        assert_eq!(b.target.hp, 180);
        assert!(b.caster.used_abilities.is_empty());
    }

    #[test]
    fn meteor_spends_everything() {
        let mut b = Bench::new(Job::Mage, Job::Warrior);
        b.caster.level = 3;
        b.caster.add_mana(100);
        b.cast(3, CastParams::default()).expect("meteor");
        assert_eq!(b.caster.mana(), 0);
        // 100 - 30 = 70 raw, minus 10 defense
        assert_eq!(b.target.hp, 140);
    }

    #[test]
    fn mana_charge_is_once_per_match() {
        let mut b = Bench::new(Job::Mage, Job::Warrior);
        b.cast(1, CastParams::default()).expect("charge");
        assert_eq!(b.caster.mana(), 20);
        assert_eq!(
            b.cast(1, CastParams::default()),
            Err(AbilityFailure::AlreadyUsed(1))
        );
    }

    #[test]
    fn novice_summons_come_from_the_small_pool() {
        for seed in 0..20 {
            let mut b = Bench::new(Job::Onmyoji, Job::Warrior);
            b.rng = crate::rng::MatchRng::from_seed(seed);
            b.cast(1, CastParams::default()).expect("summon");
            assert!(b.caster.effects.summons.iter().all(|s| Shikigami::NOVICE.contains(&s.name)));
            assert!(b.target.hp <= 200);
        }
    }

    #[test]
    fn supreme_summons_two_different_spirits() {
        for seed in 0..20 {
            let mut b = Bench::new(Job::Onmyoji, Job::Knight);
            b.caster.level = 3;
            b.rng = crate::rng::MatchRng::from_seed(seed);
            let events = b.cast(3, CastParams::default()).expect("supreme");
            assert!(matches!(events[0], MatchEvent::AbilityCast { index: 3, .. }));
            let names: Vec<_> = b.caster.effects.summons.iter().map(|s| s.name).collect();
            let mut dedup = names.clone();
            dedup.dedup();
            assert_eq!(names, dedup);
        }
    }

    #[test]
    fn kyubi_burns_equipment_and_clears_buffs() {
        let mut b = Bench::new(Job::Onmyoji, Job::Knight);
        b.target.equipped = Some(Item {
            id: 77,
            name: "Shield".to_string(),
            price: 10,
            kind: ItemKind::Equipment(Equipment::new(EquipCategory::Defense, 2)),
        });
        b.target.effects.add_buff(BuffKind::DefenseUp, 4, 3);
        let mut ctx = super::super::AbilityContext {
            caster: &mut b.caster,
            caster_side: crate::side::Side::P1,
            target: &mut b.target,
            data: &b.data,
            rng: &mut b.rng,
            ids: &mut b.ids,
            shop: &crate::shop::StandardShop,
        };
        summon(&mut ctx, Shikigami::Kyubi);
        assert_eq!(b.target.hp, 170);
        assert!(b.target.equipped.is_none());
        assert!(b.target.effects.buffs.is_empty());
        assert_eq!(b.target.total_defense(), 13);
    }

    #[test]
    fn genbu_blocks_the_next_hit() {
        let mut b = Bench::new(Job::Onmyoji, Job::Warrior);
        let mut ctx = super::super::AbilityContext {
            caster: &mut b.caster,
            caster_side: crate::side::Side::P1,
            target: &mut b.target,
            data: &b.data,
            rng: &mut b.rng,
            ids: &mut b.ids,
            shop: &crate::shop::StandardShop,
        };
        summon(&mut ctx, Shikigami::Genbu);
        assert_eq!(b.caster.barrier, 1);
        assert_eq!(b.caster.total_defense(), 15);
        assert!(b.caster.effects.has_summon(Shikigami::Genbu));
    }
}
