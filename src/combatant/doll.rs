use std::collections::BTreeMap;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::DollRules;
use crate::item::{CostumePart, CostumeStat, Item};

/// The puppeteer's doll. It fights in the owner's place and soaks hits
/// until it breaks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Doll {
    pub durability: i32,
    pub max_durability: i32,
    pub is_broken: bool,
    pub is_rampage: bool,
    pub rampage_rounds_remaining: u32,
    pub revive_guard_rounds: u32,
    pub costumes: BTreeMap<CostumePart, Item>,
}

/// What happened to the doll at its owner's round start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DollTick {
    Idle,
    Regenerated(i32),
    Rampaging(u32),
    SelfDestruct,
}

impl Doll {
    pub fn new(rules: &DollRules) -> Self {
        Doll {
            durability: rules.initial_durability,
            max_durability: rules.max_durability,
            is_broken: false,
            is_rampage: false,
            rampage_rounds_remaining: 0,
            revive_guard_rounds: 0,
            costumes: BTreeMap::new(),
        }
    }

    pub fn is_intact(&self) -> bool {
        !self.is_broken
    }

    fn costume_total(&self, stat: CostumeStat) -> i32 {
        self.costumes
            .values()
            .filter_map(Item::as_costume)
            .filter(|c| c.stat == stat)
            .map(|c| c.value())
            .sum()
    }

    pub fn attack(&self, rules: &DollRules) -> i32 {
        let base = rules.base_attack + self.costume_total(CostumeStat::Atk);
        if self.is_rampage {
            base * 2
        } else {
            base
        }
    }

    pub fn defense_bonus(&self) -> i32 {
        if self.is_broken {
            0
        } else {
            self.costume_total(CostumeStat::Def)
        }
    }

    pub fn regen(&self) -> i32 {
        self.costume_total(CostumeStat::Dur)
    }

    /// Take a mitigated hit. Returns the overflow that reaches the owner.
    pub fn absorb(&mut self, damage: i32) -> i32 {
        if self.is_broken {
            return damage;
        }
        if self.revive_guard_rounds > 0 {
            return 0;
        }
        let soaked = damage.min(self.durability);
        self.durability -= soaked;
        if self.durability <= 0 {
            self.break_down();
        }
        damage - soaked
    }

    pub fn break_down(&mut self) {
        self.durability = 0;
        self.is_broken = true;
        self.is_rampage = false;
        self.rampage_rounds_remaining = 0;
    }

    pub fn mend(&mut self, amount: i32) -> i32 {
        let before = self.durability;
        self.durability = (self.durability + amount).min(self.max_durability);
        self.durability - before
    }

    pub fn revive(&mut self, rules: &DollRules) {
        self.is_broken = false;
        self.durability = rules.revive_durability.min(self.max_durability);
        self.revive_guard_rounds = rules.revive_guard_rounds;
    }

    pub fn start_rampage(&mut self, rules: &DollRules) {
        self.durability /= 2;
        self.is_rampage = true;
        self.rampage_rounds_remaining = rules.rampage_rounds;
    }

    /// Round-start tick for the owner.
    pub fn tick(&mut self) -> DollTick {
        if self.revive_guard_rounds > 0 {
            self.revive_guard_rounds -= 1;
        }
        if self.is_broken {
            return DollTick::Idle;
        }
        if self.is_rampage {
            self.rampage_rounds_remaining = self.rampage_rounds_remaining.saturating_sub(1);
            if self.rampage_rounds_remaining == 0 {
                self.break_down();
                return DollTick::SelfDestruct;
            }
            return DollTick::Rampaging(self.rampage_rounds_remaining);
        }
        let regen = self.regen();
        if regen > 0 {
            let gained = self.mend(regen);
            if gained > 0 {
                return DollTick::Regenerated(gained);
            }
        }
        DollTick::Idle
    }

    /// Put a costume into its part slot, handing back whatever was there.
    pub fn dress(&mut self, item: Item) -> Option<Item> {
        let part = item.as_costume().map(|c| c.part)?;
        self.costumes.insert(part, item)
    }
}
