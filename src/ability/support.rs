use super::AbilityContext;
use crate::battle::events::{DamageKind, MatchEvent};
use crate::catalog::AbilityDef;
use crate::combat::{consumable_events, hp_event, status_event, strike};
use crate::combatant::{Combatant, HitKind};
use crate::error::AbilityFailure;

pub(super) fn check_thief(caster: &Combatant, index: u8) -> Result<(), AbilityFailure> {
    if index == 3 && caster.items.is_empty() {
        return Err(AbilityFailure::InvalidTarget(
            "no consumables to trigger".to_string(),
        ));
    }
    Ok(())
}

pub(super) fn priest(ctx: &mut AbilityContext, def: &AbilityDef) -> Vec<MatchEvent> {
    let side = ctx.caster_side;
    let healed = ctx.caster.heal(def.power + ctx.caster.heal_bonus);
    let mut events = vec![
        MatchEvent::HealApplied {
            target: side,
            amount: healed,
        },
        hp_event(side, ctx.caster),
    ];
    if def.index >= 2 {
        ctx.caster.effects.remove_debuffs();
        ctx.caster.effects.clear_dots();
        events.push(status_event(side, ctx.caster));
    }
    events
}

pub(super) fn thief(ctx: &mut AbilityContext, def: &AbilityDef) -> Vec<MatchEvent> {
    if def.index == 3 {
        return dark_alchemy(ctx);
    }
    let raw = match def.index {
        2 => def.power + 2 * ctx.caster.items.len() as i32,
        _ => def.power,
    };
    let target_side = ctx.target_side();
    let mut events = strike(
        ctx.target,
        target_side,
        raw,
        false,
        HitKind::Primary,
        DamageKind::Skill,
    );
    events.extend(steal(ctx));
    events
}

/// Take one random item from the opponent: a consumable other than mana
/// water, or unequipped normal equipment. With nothing to take, lift one
/// item from the opponent's shop offer instead.
fn steal(ctx: &mut AbilityContext) -> Vec<MatchEvent> {
    enum Source {
        Items(usize),
        Equipment(usize),
    }
    let candidates: Vec<Source> = ctx
        .target
        .items
        .iter()
        .enumerate()
        .filter(|(_, i)| !i.is_mana_restore())
        .map(|(n, _)| Source::Items(n))
        .chain(
            ctx.target
                .equipment_inventory
                .iter()
                .enumerate()
                .filter(|(_, i)| i.as_equipment().is_some())
                .map(|(n, _)| Source::Equipment(n)),
        )
        .collect();

    let taken = if candidates.is_empty() {
        if ctx.target.shop.is_empty() {
            None
        } else {
            let n = ctx.rng.index(ctx.target.shop.len());
            Some(ctx.target.shop.remove(n))
        }
    } else {
        match candidates[ctx.rng.index(candidates.len())] {
            Source::Items(n) => Some(ctx.target.items.remove(n)),
            Source::Equipment(n) => Some(ctx.target.equipment_inventory.remove(n)),
        }
    };

    match taken {
        Some(item) => {
            let item = ctx.ids.stamp(&item);
            log::debug!("{} steals {}", ctx.caster.name, item.name);
            let event = MatchEvent::ItemStolen {
                thief: ctx.caster_side,
                item: item.name.clone(),
            };
            ctx.caster.stow(item);
            vec![event]
        }
        None => {
            log::debug!("{} finds nothing to steal", ctx.caster.name);
            Vec::new()
        }
    }
}

/// Every owned consumable takes effect once. Nothing is consumed and the
/// per-turn item count is left alone.
fn dark_alchemy(ctx: &mut AbilityContext) -> Vec<MatchEvent> {
    let side = ctx.caster_side;
    let data = ctx.data;
    let consumables: Vec<_> = ctx
        .caster
        .items
        .iter()
        .filter_map(|i| i.as_consumable().cloned())
        .collect();
    let mut events = Vec::new();
    for c in consumables {
        match ctx.caster.apply_consumable(&c, &data.rules) {
            Ok(outcome) => events.extend(consumable_events(side, ctx.caster, &outcome)),
            Err(e) => log::debug!("dark alchemy skips an item: {}", e),
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::super::tests::Bench;
    use super::super::CastParams;
    use crate::catalog::Job;
    use crate::combatant::effects::BuffKind;
    use crate::item::{Consumable, ConsumableEffect, Item, ItemKind};

    fn tonic(id: u64, effect: ConsumableEffect, power: i32) -> Item {
        Item {
            id,
            name: "Tonic".to_string(),
            price: 10,
            kind: ItemKind::Consumable(Consumable {
                effect,
                power,
                duration: 2,
                star: 1,
            }),
        }
    }

    #[test]
    fn dispel_heal_cleanses_debuffs_and_dots() {
        let mut b = Bench::new(Job::Priest, Job::Warrior);
        b.caster.level = 2;
        b.caster.hp = 100;
        b.caster.effects.add_buff(BuffKind::AttackDown, 3, 2);
        b.caster.effects.add_buff(BuffKind::AttackUp, 2, 2);
        b.caster.effects.add_dot("Poison", 3, 2);
        b.cast(2, CastParams::default()).expect("dispel heal");
        assert_eq!(b.caster.hp, 138);
        assert!(!b.caster.effects.has(BuffKind::AttackDown));
        assert!(b.caster.effects.has(BuffKind::AttackUp));
        assert!(b.caster.effects.dots.is_empty());
    }

    #[test]
    fn steal_takes_from_inventory_before_shop() {
        let mut b = Bench::new(Job::Thief, Job::Warrior);
        b.target.items.push(tonic(500, ConsumableEffect::Heal, 10));
        b.target.items.push(tonic(501, ConsumableEffect::ManaRestore, 10));
        b.cast(1, CastParams::default()).expect("steal attack");
        assert_eq!(b.target.hp, 185);
        assert_eq!(b.target.items.len(), 1);
        assert!(b.target.items[0].is_mana_restore());
        assert_eq!(b.caster.items.len(), 1);
        assert_ne!(b.caster.items[0].id, 500);
    }

    #[test]
    fn steal_falls_back_to_shop_offer() {
        let mut b = Bench::new(Job::Thief, Job::Knight);
        b.target.shop.push(tonic(0, ConsumableEffect::AttackBuff, 2));
        b.cast(1, CastParams::default()).expect("steal attack");
        assert!(b.target.shop.is_empty());
        assert_eq!(b.caster.items.len(), 1);
        assert!(b.caster.items[0].id > 0);
    }

    #[test]
    fn dark_alchemy_needs_and_keeps_items() {
        let mut b = Bench::new(Job::Thief, Job::Knight);
        b.caster.level = 3;
        let err = b.cast(3, CastParams::default()).expect_err("empty bag");
        assert_eq!(err.code(), "INVALID_TARGET");
        b.caster.hp = 150;
        b.caster.items.push(tonic(1, ConsumableEffect::Heal, 20));
        b.caster.items.push(tonic(2, ConsumableEffect::AttackBuff, 4));
        b.cast(3, CastParams::default()).expect("dark alchemy");
        assert_eq!(b.caster.hp, 170);
        assert_eq!(b.caster.total_attack(), 24);
        assert_eq!(b.caster.items.len(), 2);
        assert_eq!(b.caster.items_used_this_turn, 0);
    }
}
