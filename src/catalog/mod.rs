//! Static game content: job templates, ability tables and gear prototypes.
//!
//! `GameData::standard()` is built once at startup and shared read-only
//! (`Arc<GameData>`) by every match. Matches never mutate it; anything a
//! player owns is a stamped copy of a prototype.

pub mod abilities;
pub mod gear;
pub mod jobs;

use std::collections::BTreeMap;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

pub use abilities::{AbilityDef, BuffGrant};
pub use jobs::{Job, JobTemplate};

use crate::error::ConfigurationError;
use crate::item::{ConsumableEffect, Item, ItemKind, SpecialEquipment};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct DollRules {
    pub max_durability: i32,
    pub initial_durability: i32,
    pub base_attack: i32,
    pub repair_amount: i32,
    pub revive_durability: i32,
    pub revive_guard_rounds: u32,
    pub rampage_rounds: u32,
    pub rampage_min_durability: i32,
    pub self_destruct_damage: i32,
    pub max_costume_star: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Rules {
    pub max_hp: i32,
    pub base_attack: i32,
    pub base_defense: i32,
    pub shop_size: usize,
    pub max_item_uses_per_turn: u8,
    pub base_income: u32,
    pub reroll_cost: u32,
    pub exp_per_action: u32,
    /// Exp needed to leave level `i + 1`.
    pub exp_requirements: Vec<u32>,
    /// Attack gained on reaching level `i + 2`.
    pub attack_per_level: Vec<i32>,
    pub mana_max: i32,
    pub doll: DollRules,
}

impl Rules {
    pub fn max_level(&self) -> u8 {
        (self.exp_requirements.len() + 1) as u8
    }

    pub fn exp_requirement(&self, level: u8) -> Option<u32> {
        self.exp_requirements
            .get(usize::from(level).checked_sub(1)?)
            .copied()
    }

    pub fn attack_increase(&self, new_level: u8) -> i32 {
        usize::from(new_level)
            .checked_sub(2)
            .and_then(|i| self.attack_per_level.get(i))
            .copied()
            .unwrap_or(0)
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            max_hp: 200,
            base_attack: 20,
            base_defense: 10,
            shop_size: 5,
            max_item_uses_per_turn: 2,
            base_income: 10,
            reroll_cost: 10,
            exp_per_action: 10,
            exp_requirements: vec![30, 40],
            attack_per_level: vec![3, 5],
            mana_max: 200,
            doll: DollRules {
                max_durability: 100,
                initial_durability: 60,
                base_attack: 20,
                repair_amount: 20,
                revive_durability: 15,
                revive_guard_rounds: 1,
                rampage_rounds: 3,
                rampage_min_durability: 10,
                self_destruct_damage: 20,
                max_costume_star: 4,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct GameData {
    pub rules: Rules,
    templates: BTreeMap<Job, JobTemplate>,
    abilities: Vec<AbilityDef>,
    pub arrows: Vec<Item>,
    pub mage_gear: Vec<Item>,
    pub mana_waters: Vec<Item>,
    pub repair_kit: Item,
}

impl GameData {
    pub fn standard() -> Self {
        let rules = Rules::default();
        let templates = jobs::standard_templates(rules.max_hp, rules.base_attack, rules.base_defense)
            .into_iter()
            .map(|t| (t.job, t))
            .collect();
        GameData {
            rules,
            templates,
            abilities: abilities::standard_abilities(),
            arrows: gear::standard_arrows(),
            mage_gear: gear::standard_mage_gear(),
            mana_waters: gear::standard_mana_waters(),
            repair_kit: gear::standard_repair_kit(),
        }
    }

    /// Build content from explicit parts. Call [`GameData::validate`] before use.
    pub fn from_parts(
        rules: Rules,
        templates: Vec<JobTemplate>,
        abilities: Vec<AbilityDef>,
    ) -> Self {
        let mut data = GameData::standard();
        data.rules = rules;
        data.templates = templates.into_iter().map(|t| (t.job, t)).collect();
        data.abilities = abilities;
        data
    }

    pub fn template(&self, job: Job) -> Result<&JobTemplate, ConfigurationError> {
        self.templates
            .get(&job)
            .ok_or_else(|| ConfigurationError::MissingJobTemplate(job.name().to_string()))
    }

    pub fn templates(&self) -> impl Iterator<Item = &JobTemplate> {
        self.templates.values()
    }

    pub fn ability(&self, job: Job, index: u8) -> Option<&AbilityDef> {
        self.abilities
            .iter()
            .find(|a| a.job == job && a.index == index)
    }

    pub fn abilities_for(&self, job: Job) -> Vec<&AbilityDef> {
        let mut list: Vec<&AbilityDef> = self.abilities.iter().filter(|a| a.job == job).collect();
        list.sort_by_key(|a| a.index);
        list
    }

    /// Check that every job has a template and exactly abilities 1..=3, and
    /// that every gear prototype is the variant its table claims.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for job in Job::ALL {
            let t = self.template(job)?;
            if t.max_hp <= 0 {
                return Err(ConfigurationError::MissingJobTemplate(format!(
                    "{} has non-positive max_hp",
                    job.name()
                )));
            }
            let abilities = self.abilities_for(job);
            let indexes: Vec<u8> = abilities.iter().map(|a| a.index).collect();
            if indexes != vec![1, 2, 3] {
                return Err(ConfigurationError::InvalidAbilityTable(format!(
                    "{} has abilities {:?}",
                    job.name(),
                    indexes
                )));
            }
            if let Some(bad) = abilities.iter().find(|a| a.min_level != a.index) {
                return Err(ConfigurationError::InvalidAbilityTable(format!(
                    "{} ability {} gated at level {}",
                    job.name(),
                    bad.index,
                    bad.min_level
                )));
            }
        }
        if self.rules.exp_requirements.len() != self.rules.attack_per_level.len() {
            return Err(ConfigurationError::InvalidAbilityTable(
                "level tables differ in length".to_string(),
            ));
        }
        if !self.arrows.iter().all(|i| i.as_arrow().is_some()) {
            return Err(ConfigurationError::CorruptItemData(
                "arrow table holds a non-arrow".to_string(),
            ));
        }
        if !self.mage_gear.iter().all(|i| i.as_mage_gear().is_some()) {
            return Err(ConfigurationError::CorruptItemData(
                "mage gear table holds a non-gear item".to_string(),
            ));
        }
        if !self.mana_waters.iter().all(Item::is_mana_restore) {
            return Err(ConfigurationError::CorruptItemData(
                "mana water table holds a non-mana item".to_string(),
            ));
        }
        match &self.repair_kit.kind {
            ItemKind::Consumable(c) if c.effect == ConsumableEffect::DollRepair => {}
            _ => {
                return Err(ConfigurationError::CorruptItemData(
                    "repair kit is not a repair consumable".to_string(),
                ))
            }
        }
        if self.arrows.is_empty() {
            return Err(ConfigurationError::CorruptItemData(
                "arrow table is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The arrow an archer starts the match with.
    pub fn starting_arrow(&self) -> Option<&Item> {
        self.arrows.iter().find(|a| {
            matches!(
                &a.kind,
                ItemKind::Special(SpecialEquipment::Arrow(arrow))
                    if arrow.effect == crate::item::ArrowEffect::Normal
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_content_is_valid() {
        let data = GameData::standard();
        assert_eq!(data.validate(), Ok(()));
        assert_eq!(data.rules.max_level(), 3);
        assert_eq!(data.rules.exp_requirement(1), Some(30));
        assert_eq!(data.rules.exp_requirement(3), None);
        assert_eq!(data.rules.attack_increase(3), 5);
    }

    #[test]
    fn job_modifiers() {
        let data = GameData::standard();
        let warrior = data.template(Job::Warrior).expect("warrior");
        assert_eq!(warrior.base_attack, 23);
        let doll = data.template(Job::Puppeteer).expect("puppeteer");
        assert_eq!(doll.base_attack, 1);
        let thief = data.template(Job::Thief).expect("thief");
        assert_eq!((thief.starting_coins, thief.coin_bonus), (15, 3));
    }

    #[test]
    fn only_mage_damage_abilities_are_reusable() {
        let data = GameData::standard();
        for job in Job::ALL {
            for a in data.abilities_for(job) {
                let expected = job == Job::Mage && a.index >= 2;
                assert_eq!(a.reusable, expected, "{:?} {}", job, a.index);
            }
        }
    }

    #[test]
    fn missing_template_is_reported() {
        let data = GameData::standard();
        let templates: Vec<JobTemplate> = data
            .templates()
            .filter(|t| t.job != Job::Knight)
            .cloned()
            .collect();
        let broken = GameData::from_parts(
            data.rules.clone(),
            templates,
            abilities::standard_abilities(),
        );
        let err = broken.validate().expect_err("knight missing");
        assert_eq!(err.code(), "MISSING_JOB_TEMPLATE");
    }
}
