//! Shop offers and pricing.
//!
//! The match asks a [`ShopGenerator`] for each side's offer at that side's
//! round start. [`StandardShop`] carries the default drop tables; tests and
//! alternative rule sets can plug in their own.

use crate::catalog::gear::costume;
use crate::catalog::{GameData, Job};
use crate::combatant::Combatant;
use crate::error::ConfigurationError;
use crate::item::{
    Consumable, ConsumableEffect, CostumePart, CostumeStat, EquipCategory, Equipment, Item,
    ItemKind,
};
use crate::rng::MatchRng;

pub trait ShopGenerator: Send + Sync {
    /// Items offered to `actor` this round. Ids are assigned on purchase.
    fn generate_offer(&self, actor: &Combatant, data: &GameData, rng: &mut MatchRng) -> Vec<Item>;

    /// One random piece of normal equipment for an actor of `level`.
    fn random_equipment(&self, level: u8, rng: &mut MatchRng) -> Item;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StandardShop;

/// Star 1-3 rolled with odds that improve with level.
pub fn roll_star(level: u8, rng: &mut MatchRng) -> u8 {
    let (one, two) = match level {
        0 | 1 => (70, 95),
        2 => (40, 90),
        _ => (20, 70),
    };
    let roll = rng.percent();
    if roll < one {
        1
    } else if roll < two {
        2
    } else {
        3
    }
}

fn star_multiplier_tenths(star: u8) -> i32 {
    // 1.0, 1.5, 2.0 in tenths
    10 + (i32::from(star) - 1) * 5
}

fn round_div(num: i32, den: i32) -> i32 {
    (num * 2 + den) / (den * 2)
}

pub fn random_consumable(level: u8, rng: &mut MatchRng) -> Item {
    let star = roll_star(level, rng);
    let mult = star_multiplier_tenths(star);
    let idx = usize::from(star - 1);
    match rng.index(3) {
        0 | 1 => {
            let attack = rng.index(2) == 0;
            let duration = rng.between(1, 3);
            let power = round_div(6 * mult, 10 * duration as i32).max(1);
            let (effect, label) = if attack {
                (ConsumableEffect::AttackBuff, "Attack Tonic")
            } else {
                (ConsumableEffect::DefenseBuff, "Guard Tonic")
            };
            Item {
                id: 0,
                name: format!("★{} {}", star, label),
                price: [8, 12, 16][idx],
                kind: ItemKind::Consumable(Consumable {
                    effect,
                    power,
                    duration,
                    star,
                }),
            }
        }
        _ => Item {
            id: 0,
            name: format!("★{} Healing Draught", star),
            price: [15, 20, 25][idx],
            kind: ItemKind::Consumable(Consumable {
                effect: ConsumableEffect::Heal,
                power: round_div(10 * mult, 10),
                duration: 0,
                star,
            }),
        },
    }
}

fn doll_offer(data: &GameData, rng: &mut MatchRng) -> Item {
    if rng.chance(25) {
        return data.repair_kit.clone();
    }
    let roll = rng.percent();
    let star = if roll < 60 {
        1
    } else if roll < 85 {
        2
    } else {
        3
    };
    let part = CostumePart::ALL[rng.index(CostumePart::ALL.len())];
    let stat = [CostumeStat::Atk, CostumeStat::Def, CostumeStat::Dur][rng.index(3)];
    costume(part, stat, star)
}

impl StandardShop {
    fn generic(&self, level: u8, rng: &mut MatchRng) -> Item {
        if rng.chance(50) {
            self.random_equipment(level, rng)
        } else {
            random_consumable(level, rng)
        }
    }
}

impl ShopGenerator for StandardShop {
    fn generate_offer(&self, actor: &Combatant, data: &GameData, rng: &mut MatchRng) -> Vec<Item> {
        (0..data.rules.shop_size)
            .map(|_| match actor.job {
                Job::Archer if rng.chance(70) => rng
                    .pick(&data.arrows)
                    .cloned()
                    .unwrap_or_else(|| self.generic(actor.level, rng)),
                Job::Mage if rng.chance(70) => rng
                    .pick(&data.mage_gear)
                    .cloned()
                    .unwrap_or_else(|| self.generic(actor.level, rng)),
                Job::Mage if rng.chance(50) => rng
                    .pick(&data.mana_waters)
                    .cloned()
                    .unwrap_or_else(|| self.generic(actor.level, rng)),
                Job::Puppeteer => doll_offer(data, rng),
                _ => self.generic(actor.level, rng),
            })
            .collect()
    }

    fn random_equipment(&self, level: u8, rng: &mut MatchRng) -> Item {
        let star = roll_star(level, rng);
        let (category, label) = match rng.index(3) {
            0 => (EquipCategory::Attack, "Blade"),
            1 => (EquipCategory::Defense, "Shield"),
            _ => (EquipCategory::Coin, "Charm"),
        };
        Item {
            id: 0,
            name: format!("{} ★{}", label, star),
            price: [10, 20, 30][usize::from(star - 1)],
            kind: ItemKind::Equipment(Equipment::new(category, star)),
        }
    }
}

/// What `buyer` pays for `item`. Alchemists get their discount on normal equipment.
pub fn purchase_price(buyer: &Combatant, item: &Item) -> u32 {
    if buyer.equipment_discount_percent > 0 && item.as_equipment().is_some() {
        (item.price * (100 - buyer.equipment_discount_percent) / 100).max(1)
    } else {
        item.price
    }
}

/// Reject offers a generator should never produce. A bad offer means the
/// content tables behind the generator are broken.
pub fn check_offer(offer: &[Item]) -> Result<(), ConfigurationError> {
    for item in offer {
        let broken = match &item.kind {
            ItemKind::Consumable(c) => {
                c.power <= 0
                    || (matches!(
                        c.effect,
                        ConsumableEffect::AttackBuff | ConsumableEffect::DefenseBuff
                    ) && c.duration == 0)
            }
            ItemKind::Equipment(e) => e.star == 0,
            ItemKind::Special(_) => false,
        };
        if broken || item.name.is_empty() {
            return Err(ConfigurationError::CorruptItemData(format!(
                "shop produced an unusable item {:?}",
                item.name
            )));
        }
    }
    Ok(())
}
