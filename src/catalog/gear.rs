//! Prototype items for job-locked gear. Per-player copies are stamped from these.

use crate::item::{
    Arrow, ArrowEffect, Consumable, ConsumableEffect, Costume, CostumePart, CostumeStat, Item,
    ItemKind, MageGear, MageSlot, SpecialEquipment,
};

fn arrow(name: &str, price: u32, power: i32, effect: ArrowEffect) -> Item {
    Item {
        id: 0,
        name: name.to_string(),
        price,
        kind: ItemKind::Special(SpecialEquipment::Arrow(Arrow {
            effect,
            power,
            pierce: false,
            crit_percent: 0,
            crit_bonus_percent: 0,
        })),
    }
}

pub(crate) fn standard_arrows() -> Vec<Item> {
    vec![
        arrow("Normal Arrow", 20, 15, ArrowEffect::Normal),
        arrow(
            "Poison Arrow",
            25,
            15,
            ArrowEffect::Poison { power: 3, ticks: 2 },
        ),
        arrow(
            "Freeze Arrow",
            25,
            15,
            ArrowEffect::Freeze {
                penalty: 2,
                rounds: 2,
            },
        ),
        arrow("Counter Arrow", 30, 10, ArrowEffect::Counter),
        arrow(
            "Critical Arrow",
            30,
            20,
            ArrowEffect::Critical {
                percent: 25,
                bonus_percent: 50,
            },
        ),
    ]
}

fn gear(name: &str, price: u32, g: MageGear) -> Item {
    Item {
        id: 0,
        name: name.to_string(),
        price,
        kind: ItemKind::Special(SpecialEquipment::MageGear(g)),
    }
}

pub(crate) fn standard_mage_gear() -> Vec<Item> {
    let blank = |slot: MageSlot, mana: i32| MageGear {
        slot,
        mana_per_round: mana,
        coins_per_round: 0,
        hp_per_round: 0,
        defense_bonus: 0,
        magic_pierce: false,
    };
    vec![
        gear(
            "Mage Staff",
            15,
            MageGear {
                coins_per_round: 3,
                ..blank(MageSlot::Staff, 2)
            },
        ),
        gear(
            "Mana Ring",
            10,
            MageGear {
                hp_per_round: 2,
                ..blank(MageSlot::Ring, 3)
            },
        ),
        gear(
            "Mage Robe",
            10,
            MageGear {
                defense_bonus: 2,
                ..blank(MageSlot::Robe, 3)
            },
        ),
        gear(
            "Ancient Grimoire",
            25,
            MageGear {
                magic_pierce: true,
                ..blank(MageSlot::Book, 5)
            },
        ),
    ]
}

fn consumable(name: &str, price: u32, effect: ConsumableEffect, power: i32) -> Item {
    Item {
        id: 0,
        name: name.to_string(),
        price,
        kind: ItemKind::Consumable(Consumable {
            effect,
            power,
            duration: 0,
            star: 1,
        }),
    }
}

pub(crate) fn standard_mana_waters() -> Vec<Item> {
    vec![
        consumable("Mana Water (S)", 10, ConsumableEffect::ManaRestore, 10),
        consumable("Mana Water (M)", 15, ConsumableEffect::ManaRestore, 20),
        consumable("Mana Water (L)", 20, ConsumableEffect::ManaRestore, 30),
    ]
}

pub(crate) fn standard_repair_kit() -> Item {
    consumable("Repair Kit", 12, ConsumableEffect::DollRepair, 20)
}

pub fn costume(part: CostumePart, stat: CostumeStat, star: u8) -> Item {
    let stat_label = match stat {
        CostumeStat::Atk => "Striker",
        CostumeStat::Def => "Guard",
        CostumeStat::Dur => "Sturdy",
    };
    let part_label = match part {
        CostumePart::Head => "Hat",
        CostumePart::Body => "Coat",
        CostumePart::Leg => "Trousers",
        CostumePart::Foot => "Boots",
    };
    Item {
        id: 0,
        name: format!("★{} {} {}", star, stat_label, part_label),
        price: 10 + u32::from(star) * 5,
        kind: ItemKind::Special(SpecialEquipment::Costume(Costume { part, stat, star })),
    }
}
