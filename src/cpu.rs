//! The computer opponent.
//!
//! [`decide`] is a pure function of the match state. It walks a fixed ladder
//! (consumables, upgrades, shopping, abilities, attack) and every candidate
//! is checked with the same validation a human action goes through, so the
//! chosen action is normally accepted. When it is not, the session driver
//! falls back to a plain attack.

use crate::ability::{check_castable, CastParams};
use crate::battle::{Action, Match};
use crate::catalog::{GameData, Job};
use crate::combatant::effects::BuffKind;
use crate::combatant::{Combatant, JobKit};
use crate::item::{ConsumableEffect, CostumePart, Item, ItemKind, SpecialEquipment};
use crate::shop::purchase_price;
use crate::side::Side;

/// Below this share of max hp the CPU wants healing.
const LOW_HP_PERCENT: i32 = 70;

pub fn decide(game: &Match, side: Side) -> Action {
    let me = game.combatant(side);
    let data = game.data();
    use_consumable(me, data)
        .or_else(|| upgrade(me))
        .or_else(|| shop(me))
        .or_else(|| ability(me, data))
        .unwrap_or(Action::Attack)
}

fn low_hp(me: &Combatant) -> bool {
    me.hp * 100 < me.max_hp * LOW_HP_PERCENT
}

fn consumable_helps(me: &Combatant, item: &Item, data: &GameData) -> bool {
    let Some(c) = item.as_consumable() else {
        return false;
    };
    if me.check_consumable(c).is_err() {
        return false;
    }
    match c.effect {
        ConsumableEffect::Heal => me.max_hp - me.hp >= c.power + me.heal_bonus || low_hp(me),
        ConsumableEffect::AttackBuff => !me.effects.has(BuffKind::AttackUp),
        ConsumableEffect::DefenseBuff => !me.effects.has(BuffKind::DefenseUp),
        ConsumableEffect::ManaRestore => me
            .mage()
            .map(|k| k.mana + c.power <= k.mana_max)
            .unwrap_or(false),
        ConsumableEffect::DollRepair => me
            .doll()
            .map(|d| {
                d.is_broken || d.max_durability - d.durability >= data.rules.doll.repair_amount
            })
            .unwrap_or(false),
    }
}

fn use_consumable(me: &Combatant, data: &GameData) -> Option<Action> {
    if me.items_used_this_turn >= data.rules.max_item_uses_per_turn {
        return None;
    }
    me.items
        .iter()
        .find(|i| consumable_helps(me, i, data))
        .map(|i| Action::UseItem {
            item_id: i.id,
            slot: None,
        })
}

fn special_score(item: &Item) -> i32 {
    match &item.kind {
        ItemKind::Special(SpecialEquipment::Arrow(a)) => a.score(),
        ItemKind::Special(SpecialEquipment::MageGear(g)) => g.score(),
        ItemKind::Special(SpecialEquipment::Artifact(a)) => {
            a.attack + a.defense + a.coins as i32
        }
        ItemKind::Special(SpecialEquipment::Costume(c)) => c.value(),
        ItemKind::Equipment(e) => e.power,
        ItemKind::Consumable(_) => 0,
    }
}

/// True when `candidate` beats what it would replace, or fills an empty spot.
fn beats(candidate: &Item, current: Option<&Item>) -> bool {
    current
        .map(|c| special_score(candidate) > special_score(c))
        .unwrap_or(true)
}

fn equip(item: &Item, slot: Option<u8>) -> Action {
    Action::UseItem {
        item_id: item.id,
        slot,
    }
}

/// Strictly better equipment, normal items first.
fn upgrade(me: &Combatant) -> Option<Action> {
    let normal = me
        .equipment_inventory
        .iter()
        .filter(|i| beats(i, me.equipped.as_ref()))
        .max_by_key(|i| special_score(i));
    if let Some(item) = normal {
        return Some(equip(item, None));
    }
    for item in &me.special_inventory {
        let found = match (&item.kind, &me.kit) {
            (ItemKind::Special(SpecialEquipment::Arrow(_)), JobKit::Archer(k)) => k
                .slots
                .iter()
                .position(|s| beats(item, s.as_ref()))
                .map(|i| equip(item, Some(i as u8 + 1))),
            (ItemKind::Special(SpecialEquipment::MageGear(g)), JobKit::Mage(k)) => {
                beats(item, k.gear.get(&g.slot)).then(|| equip(item, None))
            }
            (ItemKind::Special(SpecialEquipment::Artifact(_)), JobKit::Alchemist(k)) => {
                beats(item, k.artifact.as_ref()).then(|| equip(item, None))
            }
            (ItemKind::Special(SpecialEquipment::Costume(c)), JobKit::Puppeteer(d)) => {
                beats(item, d.costumes.get(&c.part)).then(|| equip(item, None))
            }
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Whether buying `item` fills a gap the CPU currently has.
fn fills_gap(me: &Combatant, item: &Item) -> bool {
    let has_heal = me.items.iter().any(|i| {
        i.as_consumable()
            .map(|c| c.effect == ConsumableEffect::Heal)
            .unwrap_or(false)
    });
    match &item.kind {
        ItemKind::Consumable(c) => match c.effect {
            ConsumableEffect::Heal => low_hp(me) && !has_heal,
            ConsumableEffect::DollRepair => me.doll().map(|d| d.is_broken).unwrap_or(false),
            _ => false,
        },
        ItemKind::Equipment(_) => me.equipped.is_none() && me.equipment_inventory.is_empty(),
        ItemKind::Special(special) => match (special, &me.kit) {
            (SpecialEquipment::Arrow(_), JobKit::Archer(k)) => k.slots.iter().any(Option::is_none),
            (SpecialEquipment::MageGear(g), JobKit::Mage(k)) => !k.gear.contains_key(&g.slot),
            (SpecialEquipment::Artifact(_), JobKit::Alchemist(k)) => k.artifact.is_none(),
            (SpecialEquipment::Costume(c), JobKit::Puppeteer(d)) => {
                !d.costumes.contains_key(&c.part)
            }
            _ => false,
        },
    }
}

fn shop(me: &Combatant) -> Option<Action> {
    me.shop
        .iter()
        .position(|i| purchase_price(me, i) <= me.coins && fills_gap(me, i))
        .map(|index| Action::BuyItem { index })
}

/// Choices the CPU makes for abilities that need them.
fn params_for(me: &Combatant, index: u8, data: &GameData) -> CastParams {
    match (me.job, index) {
        (Job::Puppeteer, 1) => CastParams {
            part: me.doll().and_then(|d| {
                CostumePart::ALL.into_iter().find(|p| {
                    d.costumes
                        .get(p)
                        .and_then(Item::as_costume)
                        .map(|c| c.star < data.rules.doll.max_costume_star)
                        .unwrap_or(false)
                })
            }),
            ..CastParams::default()
        },
        (Job::Puppeteer, 2) => CastParams {
            hp_cost: Some(20),
            ..CastParams::default()
        },
        _ => CastParams::default(),
    }
}

/// Skip casts that would do nothing useful right now.
fn worth_casting(me: &Combatant, index: u8) -> bool {
    match (me.job, index) {
        (Job::Priest, _) => me.max_hp - me.hp >= 30,
        (Job::Mage, 1) => me.mage().map(|k| k.mana + 20 <= k.mana_max).unwrap_or(false),
        (Job::Archer, 1) | (Job::Archer, 2) => {
            me.archer().map(|k| k.extra_shots == 0).unwrap_or(false)
        }
        (Job::Thief, 3) => !me.items.is_empty(),
        (Job::Puppeteer, 2) => {
            me.hp > 60
                && me
                    .doll()
                    .map(|d| !d.is_broken && d.durability < d.max_durability)
                    .unwrap_or(false)
        }
        _ => true,
    }
}

fn ability(me: &Combatant, data: &GameData) -> Option<Action> {
    [3u8, 2, 1].into_iter().find_map(|index| {
        let params = params_for(me, index, data);
        let ok = worth_casting(me, index)
            && check_castable(me, index, &params, data).is_ok();
        ok.then_some(Action::CastSkill { index, params })
    })
}
