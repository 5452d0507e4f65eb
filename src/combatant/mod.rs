//! A single side's full mutable state and the operations every other part
//! of the engine goes through to change it.

pub mod doll;
pub mod effects;

use std::collections::{BTreeMap, BTreeSet};

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::{GameData, Job, JobTemplate, Rules};
use crate::error::ActionRejection;
use crate::item::{
    Consumable, ConsumableEffect, EquipCategory, Item, ItemId, ItemIds, ItemKind, MageSlot,
    SpecialEquipment,
};
use doll::Doll;
use effects::{BuffKind, StatusEffectLedger};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MageKit {
    pub mana: i32,
    pub mana_max: i32,
    pub gear: BTreeMap<MageSlot, Item>,
}

impl MageKit {
    pub fn magic_pierce(&self) -> bool {
        self.gear
            .values()
            .filter_map(Item::as_mage_gear)
            .any(|g| g.magic_pierce)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ArcherKit {
    /// One entry per open arrow slot.
    pub slots: Vec<Option<Item>>,
    /// Attacks left that fire a bonus arrow.
    pub extra_shots: u32,
}

impl ArcherKit {
    pub fn equipped_arrows(&self) -> impl Iterator<Item = &Item> {
        self.slots.iter().flatten()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct AlchemistKit {
    pub artifact: Option<Item>,
}

/// Job-specific sub-state, fixed when the combatant is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case", tag = "kit")]
pub enum JobKit {
    Standard,
    Mage(MageKit),
    Archer(ArcherKit),
    Alchemist(AlchemistKit),
    Puppeteer(Doll),
}

/// Whether a hit is the main blow of an action or a follow-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitKind {
    Primary,
    Secondary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum LevelUpMode {
    Exp,
    Coins,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsumableOutcome {
    Healed(i32),
    Buffed {
        kind: BuffKind,
        magnitude: i32,
        rounds: u32,
    },
    ManaRestored(i32),
    DollMended(i32),
    DollRevived,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemUse {
    Consumed {
        name: String,
        outcome: ConsumableOutcome,
    },
    Equipped {
        name: String,
        replaced: Option<String>,
    },
}

/// Per-round passive gains from mage gear.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GearTick {
    pub mana: i32,
    pub coins: u32,
    pub healed: i32,
    pub defense_buff: i32,
}

enum Pocket {
    Items(usize),
    Equipment(usize),
    Special(usize),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Combatant {
    pub name: String,
    pub job: Job,
    pub level: u8,
    pub exp: u32,
    pub hp: i32,
    pub max_hp: i32,
    pub coins: u32,
    pub base_attack: i32,
    pub base_defense: i32,
    pub heal_bonus: i32,
    pub coin_bonus: u32,
    pub equipment_discount_percent: u32,
    pub items: Vec<Item>,
    pub equipment_inventory: Vec<Item>,
    pub special_inventory: Vec<Item>,
    pub equipped: Option<Item>,
    pub kit: JobKit,
    pub used_abilities: BTreeSet<u8>,
    pub barrier: u32,
    pub effects: StatusEffectLedger,
    pub items_used_this_turn: u8,
    pub last_primary_damage_taken: i32,
    pub shop: Vec<Item>,
}

impl Combatant {
    /// Build a fresh combatant from its job template. Gear is stamped from the
    /// shared prototypes, never aliased.
    pub fn new(name: &str, template: &JobTemplate, data: &GameData, ids: &mut ItemIds) -> Self {
        let kit = match template.job {
            Job::Mage => JobKit::Mage(MageKit {
                mana: 0,
                mana_max: data.rules.mana_max,
                gear: BTreeMap::new(),
            }),
            Job::Archer => JobKit::Archer(ArcherKit {
                slots: vec![data.starting_arrow().map(|a| ids.stamp(a))],
                extra_shots: 0,
            }),
            Job::Alchemist => JobKit::Alchemist(AlchemistKit::default()),
            Job::Puppeteer => JobKit::Puppeteer(Doll::new(&data.rules.doll)),
            _ => JobKit::Standard,
        };
        Combatant {
            name: name.to_string(),
            job: template.job,
            level: 1,
            exp: 0,
            hp: template.max_hp,
            max_hp: template.max_hp,
            coins: template.starting_coins,
            base_attack: template.base_attack,
            base_defense: template.base_defense,
            heal_bonus: template.heal_bonus,
            coin_bonus: template.coin_bonus,
            equipment_discount_percent: template.equipment_discount_percent,
            items: Vec::new(),
            equipment_inventory: Vec::new(),
            special_inventory: Vec::new(),
            equipped: None,
            kit,
            used_abilities: BTreeSet::new(),
            barrier: 0,
            effects: StatusEffectLedger::new(),
            items_used_this_turn: 0,
            last_primary_damage_taken: 0,
            shop: Vec::new(),
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }

    fn normal_bonus(&self, category: EquipCategory) -> i32 {
        self.equipped
            .as_ref()
            .and_then(Item::as_equipment)
            .filter(|e| e.category == category)
            .map(|e| e.power)
            .unwrap_or(0)
    }

    fn artifact(&self) -> Option<&crate::item::Artifact> {
        match &self.kit {
            JobKit::Alchemist(k) => k.artifact.as_ref().and_then(Item::as_artifact),
            _ => None,
        }
    }

    pub fn total_attack(&self) -> i32 {
        let artifact = self.artifact().map(|a| a.attack).unwrap_or(0);
        (self.base_attack + self.effects.attack_delta() + self.normal_bonus(EquipCategory::Attack)
            + artifact
            - self.effects.freeze_penalty())
        .max(0)
    }

    pub fn total_defense(&self) -> i32 {
        let artifact = self.artifact().map(|a| a.defense).unwrap_or(0);
        let doll = self.doll().map(Doll::defense_bonus).unwrap_or(0);
        (self.base_defense
            + self.effects.defense_delta()
            + self.normal_bonus(EquipCategory::Defense)
            + artifact
            + doll)
            .max(0)
    }

    pub fn round_income(&self, rules: &Rules) -> u32 {
        let artifact = self.artifact().map(|a| a.coins).unwrap_or(0);
        rules.base_income
            + self.coin_bonus
            + self.normal_bonus(EquipCategory::Coin).max(0) as u32
            + artifact
    }

    /// Apply an incoming hit and return the damage that landed.
    ///
    /// A barrier charge negates the whole hit. Otherwise defense mitigates
    /// down to a floor of 1 unless the hit ignores defense. An intact doll
    /// soaks the hit before hp does. Only primary hits are remembered for
    /// counter effects.
    pub fn take_damage(&mut self, raw: i32, ignore_defense: bool, hit: HitKind) -> i32 {
        if self.barrier > 0 {
            self.barrier -= 1;
            return 0;
        }
        let raw = raw.max(0);
        let dealt = if ignore_defense {
            raw
        } else {
            (raw - self.total_defense()).max(1)
        };
        let to_hp = match &mut self.kit {
            JobKit::Puppeteer(doll) if doll.is_intact() => doll.absorb(dealt),
            _ => dealt,
        };
        self.hp = (self.hp - to_hp).max(0);
        if hit == HitKind::Primary {
            self.last_primary_damage_taken = dealt;
        }
        dealt
    }

    /// Flat damage that skips barrier, defense and doll.
    pub fn lose_hp(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp - amount.max(0)).max(0);
        before - self.hp
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
        self.hp - before
    }

    pub fn is_sealed(&self) -> bool {
        self.effects.is_sealed()
    }

    pub fn mage(&self) -> Option<&MageKit> {
        match &self.kit {
            JobKit::Mage(k) => Some(k),
            _ => None,
        }
    }

    pub fn mage_mut(&mut self) -> Option<&mut MageKit> {
        match &mut self.kit {
            JobKit::Mage(k) => Some(k),
            _ => None,
        }
    }

    pub fn mana(&self) -> i32 {
        self.mage().map(|k| k.mana).unwrap_or(0)
    }

    /// Add mana up to the cap; returns what was actually gained.
    pub fn add_mana(&mut self, amount: i32) -> i32 {
        match self.mage_mut() {
            Some(k) => {
                let before = k.mana;
                k.mana = (k.mana + amount).clamp(0, k.mana_max);
                k.mana - before
            }
            None => 0,
        }
    }

    pub fn archer(&self) -> Option<&ArcherKit> {
        match &self.kit {
            JobKit::Archer(k) => Some(k),
            _ => None,
        }
    }

    pub fn archer_mut(&mut self) -> Option<&mut ArcherKit> {
        match &mut self.kit {
            JobKit::Archer(k) => Some(k),
            _ => None,
        }
    }

    pub fn doll(&self) -> Option<&Doll> {
        match &self.kit {
            JobKit::Puppeteer(d) => Some(d),
            _ => None,
        }
    }

    pub fn doll_mut(&mut self) -> Option<&mut Doll> {
        match &mut self.kit {
            JobKit::Puppeteer(d) => Some(d),
            _ => None,
        }
    }

    pub fn alchemist(&self) -> Option<&AlchemistKit> {
        match &self.kit {
            JobKit::Alchemist(k) => Some(k),
            _ => None,
        }
    }

    /// Ids of normal equipment that can feed a fusion: the equipped item first,
    /// then the inventory in order.
    pub fn fusable_items(&self) -> Vec<ItemId> {
        self.equipped
            .iter()
            .chain(self.equipment_inventory.iter())
            .filter(|i| i.as_equipment().is_some())
            .map(|i| i.id)
            .collect()
    }

    /// Remove a normal item from the equipped slot or the inventory.
    pub fn take_normal(&mut self, id: ItemId) -> Option<Item> {
        if self.equipped.as_ref().map(|i| i.id) == Some(id) {
            return self.equipped.take();
        }
        let idx = self.equipment_inventory.iter().position(|i| i.id == id)?;
        Some(self.equipment_inventory.remove(idx))
    }

    /// File an acquired item into the pocket its variant belongs to.
    pub fn stow(&mut self, item: Item) {
        match item.kind {
            ItemKind::Consumable(_) => self.items.push(item),
            ItemKind::Equipment(_) => self.equipment_inventory.push(item),
            ItemKind::Special(_) => self.special_inventory.push(item),
        }
    }

    /// Check that a consumable can take effect right now, without changing anything.
    pub fn check_consumable(&self, c: &Consumable) -> Result<(), ActionRejection> {
        match c.effect {
            ConsumableEffect::ManaRestore if self.mage().is_none() => Err(
                ActionRejection::ItemNotUsable("only a mage can drink mana water".to_string()),
            ),
            ConsumableEffect::DollRepair => match self.doll() {
                None => Err(ActionRejection::ItemNotUsable(
                    "only a puppeteer can use a repair kit".to_string(),
                )),
                Some(d) if d.is_rampage => Err(ActionRejection::ItemNotUsable(
                    "the doll is rampaging".to_string(),
                )),
                Some(_) => Ok(()),
            },
            _ => Ok(()),
        }
    }

    pub fn apply_consumable(
        &mut self,
        c: &Consumable,
        rules: &Rules,
    ) -> Result<ConsumableOutcome, ActionRejection> {
        self.check_consumable(c)?;
        let outcome = match c.effect {
            ConsumableEffect::Heal => ConsumableOutcome::Healed(self.heal(c.power + self.heal_bonus)),
            ConsumableEffect::AttackBuff => {
                self.effects.add_buff(BuffKind::AttackUp, c.power, c.duration);
                ConsumableOutcome::Buffed {
                    kind: BuffKind::AttackUp,
                    magnitude: c.power,
                    rounds: c.duration,
                }
            }
            ConsumableEffect::DefenseBuff => {
                let rounds = c.duration + 1;
                self.effects.add_buff(BuffKind::DefenseUp, c.power, rounds);
                ConsumableOutcome::Buffed {
                    kind: BuffKind::DefenseUp,
                    magnitude: c.power,
                    rounds,
                }
            }
            ConsumableEffect::ManaRestore => ConsumableOutcome::ManaRestored(self.add_mana(c.power)),
            ConsumableEffect::DollRepair => match self.doll_mut() {
                Some(d) if d.is_broken => {
                    d.revive(&rules.doll);
                    ConsumableOutcome::DollRevived
                }
                Some(d) => ConsumableOutcome::DollMended(d.mend(rules.doll.repair_amount)),
                None => ConsumableOutcome::DollMended(0),
            },
        };
        Ok(outcome)
    }

    fn locate(&self, id: ItemId) -> Option<Pocket> {
        if let Some(i) = self.items.iter().position(|i| i.id == id) {
            return Some(Pocket::Items(i));
        }
        if let Some(i) = self.equipment_inventory.iter().position(|i| i.id == id) {
            return Some(Pocket::Equipment(i));
        }
        self.special_inventory
            .iter()
            .position(|i| i.id == id)
            .map(Pocket::Special)
    }

    /// Use or equip an owned item. Consumables count against the per-turn limit.
    pub fn use_item(
        &mut self,
        id: ItemId,
        slot: Option<u8>,
        rules: &Rules,
    ) -> Result<ItemUse, ActionRejection> {
        match self.locate(id).ok_or(ActionRejection::UnknownItem(id))? {
            Pocket::Items(idx) => {
                if self.items_used_this_turn >= rules.max_item_uses_per_turn {
                    return Err(ActionRejection::ItemLimitReached(
                        rules.max_item_uses_per_turn,
                    ));
                }
                let consumable = self.items[idx]
                    .as_consumable()
                    .cloned()
                    .ok_or_else(|| ActionRejection::ItemNotUsable(self.items[idx].name.clone()))?;
                let outcome = self.apply_consumable(&consumable, rules)?;
                let item = self.items.remove(idx);
                self.items_used_this_turn += 1;
                Ok(ItemUse::Consumed {
                    name: item.name,
                    outcome,
                })
            }
            Pocket::Equipment(idx) => {
                let item = self.equipment_inventory.remove(idx);
                let name = item.name.clone();
                let replaced = self.equipped.replace(item);
                let replaced_name = replaced.as_ref().map(|r| r.name.clone());
                if let Some(old) = replaced {
                    self.equipment_inventory.push(old);
                }
                Ok(ItemUse::Equipped {
                    name,
                    replaced: replaced_name,
                })
            }
            Pocket::Special(idx) => self.equip_special(idx, slot),
        }
    }

    fn equip_special(&mut self, idx: usize, slot: Option<u8>) -> Result<ItemUse, ActionRejection> {
        let special = match &self.special_inventory[idx].kind {
            ItemKind::Special(s) => s.clone(),
            _ => {
                return Err(ActionRejection::ItemNotUsable(
                    self.special_inventory[idx].name.clone(),
                ))
            }
        };
        let wrong_job = |who: &str| ActionRejection::ItemNotUsable(format!("only a {} can equip this", who));
        // validate before taking the item out of the inventory
        match (&special, &self.kit) {
            (SpecialEquipment::Arrow(_), JobKit::Archer(k)) => {
                let s = slot.unwrap_or(1);
                if s == 0 || usize::from(s) > k.slots.len() {
                    return Err(ActionRejection::InvalidSlot(s));
                }
            }
            (SpecialEquipment::Arrow(_), _) => return Err(wrong_job("archer")),
            (SpecialEquipment::MageGear(_), JobKit::Mage(_)) => {}
            (SpecialEquipment::MageGear(_), _) => return Err(wrong_job("mage")),
            (SpecialEquipment::Artifact(_), JobKit::Alchemist(_)) => {}
            (SpecialEquipment::Artifact(_), _) => return Err(wrong_job("alchemist")),
            (SpecialEquipment::Costume(_), JobKit::Puppeteer(_)) => {}
            (SpecialEquipment::Costume(_), _) => return Err(wrong_job("puppeteer")),
        }
        let item = self.special_inventory.remove(idx);
        let name = item.name.clone();
        let replaced = match (&special, &mut self.kit) {
            (SpecialEquipment::Arrow(_), JobKit::Archer(k)) => {
                let s = usize::from(slot.unwrap_or(1)) - 1;
                k.slots[s].replace(item)
            }
            (SpecialEquipment::MageGear(g), JobKit::Mage(k)) => k.gear.insert(g.slot, item),
            (SpecialEquipment::Artifact(_), JobKit::Alchemist(k)) => k.artifact.replace(item),
            (SpecialEquipment::Costume(_), JobKit::Puppeteer(d)) => d.dress(item),
            _ => None,
        };
        let replaced_name = replaced.as_ref().map(|r| r.name.clone());
        if let Some(old) = replaced {
            self.special_inventory.push(old);
        }
        Ok(ItemUse::Equipped {
            name,
            replaced: replaced_name,
        })
    }

    /// Promote one level if exp allows. Returns the new level.
    pub fn try_auto_level_up(&mut self, rules: &Rules) -> Option<u8> {
        let req = rules.exp_requirement(self.level)?;
        if self.level >= rules.max_level() || self.exp < req {
            return None;
        }
        self.exp -= req;
        self.promote(rules);
        Some(self.level)
    }

    pub fn level_up(&mut self, mode: LevelUpMode, rules: &Rules) -> Result<u8, ActionRejection> {
        let req = match rules.exp_requirement(self.level) {
            Some(r) if self.level < rules.max_level() => r,
            _ => return Err(ActionRejection::LevelCapReached),
        };
        match mode {
            LevelUpMode::Exp => {
                if self.exp < req {
                    return Err(ActionRejection::ExpInsufficient {
                        needed: req,
                        available: self.exp,
                    });
                }
                self.exp -= req;
            }
            LevelUpMode::Coins => {
                let shortage = req.saturating_sub(self.exp);
                if shortage == 0 {
                    return Err(ActionRejection::ExpAlreadySufficient);
                }
                if self.coins < shortage {
                    return Err(ActionRejection::InsufficientCoins {
                        needed: shortage,
                        available: self.coins,
                    });
                }
                self.coins -= shortage;
                self.exp = 0;
            }
        }
        self.promote(rules);
        Ok(self.level)
    }

    fn promote(&mut self, rules: &Rules) {
        self.level += 1;
        self.base_attack += rules.attack_increase(self.level);
    }

    /// Per-round gear passives. The robe's defense is granted as a fresh
    /// one-round buff each time so it never stacks.
    pub fn gear_tick(&mut self) -> GearTick {
        let gear: Vec<crate::item::MageGear> = match self.mage() {
            Some(k) => k.gear.values().filter_map(Item::as_mage_gear).cloned().collect(),
            None => return GearTick::default(),
        };
        let mut tick = GearTick::default();
        for g in gear {
            tick.mana += self.add_mana(g.mana_per_round);
            self.coins += g.coins_per_round;
            tick.coins += g.coins_per_round;
            tick.healed += self.heal(g.hp_per_round);
            if g.defense_bonus > 0 {
                self.effects.add_buff(BuffKind::DefenseUp, g.defense_bonus, 1);
                tick.defense_buff += g.defense_bonus;
            }
        }
        tick
    }
}
