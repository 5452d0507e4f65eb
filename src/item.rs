//! Items are a closed tagged union: a consumable, a normal piece of equipment,
//! or job-locked special equipment. Whether something is equippable is derived
//! from the variant and never stored.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

pub type ItemId = u64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: u32,
    pub kind: ItemKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum ItemKind {
    Consumable(Consumable),
    Equipment(Equipment),
    Special(SpecialEquipment),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum ConsumableEffect {
    AttackBuff,
    DefenseBuff,
    Heal,
    ManaRestore,
    DollRepair,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Consumable {
    pub effect: ConsumableEffect,
    pub power: i32,
    /// Rounds for buffs, 0 for instant effects.
    pub duration: u32,
    pub star: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum EquipCategory {
    Attack,
    Defense,
    Coin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Equipment {
    pub category: EquipCategory,
    pub star: u8,
    pub power: i32,
}

impl Equipment {
    /// Power of a normal item for its category at the given star.
    pub fn power_for(category: EquipCategory, star: u8) -> i32 {
        match category {
            EquipCategory::Coin => i32::from(star) * 2,
            EquipCategory::Attack | EquipCategory::Defense => match star {
                0 | 1 => 2,
                2 => 3,
                3 => 4,
                _ => 5,
            },
        }
    }

    pub fn new(category: EquipCategory, star: u8) -> Self {
        Equipment {
            category,
            star,
            power: Equipment::power_for(category, star),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum SpecialEquipment {
    MageGear(MageGear),
    Arrow(Arrow),
    Artifact(Artifact),
    Costume(Costume),
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum MageSlot {
    Staff,
    Ring,
    Robe,
    Book,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MageGear {
    pub slot: MageSlot,
    pub mana_per_round: i32,
    pub coins_per_round: u32,
    pub hp_per_round: i32,
    pub defense_bonus: i32,
    pub magic_pierce: bool,
}

impl MageGear {
    pub fn score(&self) -> i32 {
        self.mana_per_round
            + self.coins_per_round as i32
            + self.hp_per_round
            + self.defense_bonus
            + if self.magic_pierce { 10 } else { 0 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case", tag = "type")]
pub enum ArrowEffect {
    Normal,
    Poison { power: i32, ticks: u32 },
    Freeze { penalty: i32, rounds: u32 },
    Counter,
    Critical { percent: u32, bonus_percent: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Arrow {
    pub effect: ArrowEffect,
    pub power: i32,
    pub pierce: bool,
    pub crit_percent: u32,
    pub crit_bonus_percent: u32,
}

impl Arrow {
    pub fn score(&self) -> i32 {
        let effect = match self.effect {
            ArrowEffect::Normal => 0,
            ArrowEffect::Poison { power, ticks } => power * ticks as i32,
            ArrowEffect::Freeze { penalty, rounds } => penalty * rounds as i32,
            ArrowEffect::Counter => 5,
            ArrowEffect::Critical { .. } => 5,
        };
        self.power + effect + if self.pierce { 5 } else { 0 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Artifact {
    pub attack: i32,
    pub defense: i32,
    pub coins: u32,
    pub star: u8,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum CostumePart {
    Head,
    Body,
    Leg,
    Foot,
}

impl CostumePart {
    pub const ALL: [CostumePart; 4] = [
        CostumePart::Head,
        CostumePart::Body,
        CostumePart::Leg,
        CostumePart::Foot,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum CostumeStat {
    Atk,
    Def,
    Dur,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Costume {
    pub part: CostumePart,
    pub stat: CostumeStat,
    pub star: u8,
}

impl Costume {
    pub fn value(&self) -> i32 {
        let star = i32::from(self.star);
        match self.stat {
            CostumeStat::Dur => 1 + star,
            CostumeStat::Atk | CostumeStat::Def => 1 + star * 2,
        }
    }
}

impl Item {
    pub fn is_equip(&self) -> bool {
        !matches!(self.kind, ItemKind::Consumable(_))
    }

    pub fn as_consumable(&self) -> Option<&Consumable> {
        match &self.kind {
            ItemKind::Consumable(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_equipment(&self) -> Option<&Equipment> {
        match &self.kind {
            ItemKind::Equipment(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_equipment_mut(&mut self) -> Option<&mut Equipment> {
        match &mut self.kind {
            ItemKind::Equipment(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_arrow(&self) -> Option<&Arrow> {
        match &self.kind {
            ItemKind::Special(SpecialEquipment::Arrow(a)) => Some(a),
            _ => None,
        }
    }

    pub fn as_arrow_mut(&mut self) -> Option<&mut Arrow> {
        match &mut self.kind {
            ItemKind::Special(SpecialEquipment::Arrow(a)) => Some(a),
            _ => None,
        }
    }

    pub fn as_mage_gear(&self) -> Option<&MageGear> {
        match &self.kind {
            ItemKind::Special(SpecialEquipment::MageGear(g)) => Some(g),
            _ => None,
        }
    }

    pub fn as_artifact(&self) -> Option<&Artifact> {
        match &self.kind {
            ItemKind::Special(SpecialEquipment::Artifact(a)) => Some(a),
            _ => None,
        }
    }

    pub fn as_costume(&self) -> Option<&Costume> {
        match &self.kind {
            ItemKind::Special(SpecialEquipment::Costume(c)) => Some(c),
            _ => None,
        }
    }

    pub fn as_costume_mut(&mut self) -> Option<&mut Costume> {
        match &mut self.kind {
            ItemKind::Special(SpecialEquipment::Costume(c)) => Some(c),
            _ => None,
        }
    }

    pub fn is_mana_restore(&self) -> bool {
        matches!(
            self.as_consumable(),
            Some(Consumable {
                effect: ConsumableEffect::ManaRestore,
                ..
            })
        )
    }

    /// Upgrade a normal item by one star, recomputing its power.
    pub fn refine(&mut self) -> bool {
        let name_star;
        match self.as_equipment_mut() {
            Some(e) => {
                e.star = e.star.saturating_add(1);
                e.power = Equipment::power_for(e.category, e.star);
                name_star = e.star;
            }
            None => return false,
        }
        if let Some(base) = self.name.split(" ★").next() {
            self.name = format!("{} ★{}", base, name_star);
        }
        true
    }
}

/// Hands out match-unique item identities.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ItemIds {
    next: ItemId,
}

impl ItemIds {
    pub fn new() -> Self {
        ItemIds { next: 0 }
    }

    pub fn next_id(&mut self) -> ItemId {
        self.next += 1;
        self.next
    }

    /// Deep copy a template item under a fresh identity.
    pub fn stamp(&mut self, template: &Item) -> Item {
        let mut item = template.clone();
        item.id = self.next_id();
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sword(star: u8) -> Item {
        Item {
            id: 1,
            name: format!("Sword ★{}", star),
            price: 10,
            kind: ItemKind::Equipment(Equipment::new(EquipCategory::Attack, star)),
        }
    }

    #[test]
    fn equipment_power_table() {
        assert_eq!(Equipment::power_for(EquipCategory::Attack, 1), 2);
        assert_eq!(Equipment::power_for(EquipCategory::Defense, 3), 4);
        assert_eq!(Equipment::power_for(EquipCategory::Defense, 4), 5);
        assert_eq!(Equipment::power_for(EquipCategory::Coin, 3), 6);
    }

    #[test]
    fn refine_bumps_star_and_power() {
        let mut item = sword(2);
        assert!(item.refine());
        let e = item.as_equipment().expect("equipment");
        assert_eq!(e.star, 3);
        assert_eq!(e.power, 4);
        assert_eq!(item.name, "Sword ★3");
    }

    #[test]
    fn costume_values() {
        let atk = Costume {
            part: CostumePart::Head,
            stat: CostumeStat::Atk,
            star: 2,
        };
        let dur = Costume {
            part: CostumePart::Leg,
            stat: CostumeStat::Dur,
            star: 2,
        };
        assert_eq!(atk.value(), 5);
        assert_eq!(dur.value(), 3);
    }

    #[test]
    fn stamping_gives_fresh_ids() {
        let mut ids = ItemIds::new();
        let template = sword(1);
        let a = ids.stamp(&template);
        let b = ids.stamp(&template);
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, b.kind);
        assert!(a.is_equip());
    }
}
