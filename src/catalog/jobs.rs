use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum Job {
    Warrior,
    Knight,
    Priest,
    Thief,
    Mage,
    Onmyoji,
    Alchemist,
    Archer,
    Puppeteer,
}

impl Job {
    pub const ALL: [Job; 9] = [
        Job::Warrior,
        Job::Knight,
        Job::Priest,
        Job::Thief,
        Job::Mage,
        Job::Onmyoji,
        Job::Alchemist,
        Job::Archer,
        Job::Puppeteer,
    ];

    /// Wire id, 1-based.
    pub fn id(self) -> u8 {
        match self {
            Job::Warrior => 1,
            Job::Knight => 2,
            Job::Priest => 3,
            Job::Thief => 4,
            Job::Mage => 5,
            Job::Onmyoji => 6,
            Job::Alchemist => 7,
            Job::Archer => 8,
            Job::Puppeteer => 9,
        }
    }

    pub fn from_id(id: u8) -> Option<Job> {
        Job::ALL.into_iter().find(|j| j.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Job::Warrior => "Warrior",
            Job::Knight => "Knight",
            Job::Priest => "Priest",
            Job::Thief => "Thief",
            Job::Mage => "Mage",
            Job::Onmyoji => "Onmyoji",
            Job::Alchemist => "Alchemist",
            Job::Archer => "Archer",
            Job::Puppeteer => "Puppeteer",
        }
    }
}

/// Starting stats and passive modifiers for a job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct JobTemplate {
    pub job: Job,
    pub max_hp: i32,
    pub base_attack: i32,
    pub base_defense: i32,
    pub starting_coins: u32,
    pub heal_bonus: i32,
    pub coin_bonus: u32,
    /// Shown on the job card; no ability reads it.
    pub skill_bonus: i32,
    /// Percent taken off normal equipment prices.
    pub equipment_discount_percent: u32,
}

pub(crate) fn standard_templates(
    max_hp: i32,
    base_attack: i32,
    base_defense: i32,
) -> Vec<JobTemplate> {
    let base = |job: Job| JobTemplate {
        job,
        max_hp,
        base_attack,
        base_defense,
        starting_coins: 10,
        heal_bonus: 0,
        coin_bonus: 0,
        skill_bonus: 0,
        equipment_discount_percent: 0,
    };
    Job::ALL
        .into_iter()
        .map(|job| {
            let mut t = base(job);
            match job {
                Job::Warrior => t.base_attack += 3,
                Job::Knight => t.base_defense += 3,
                Job::Priest => t.heal_bonus = 3,
                Job::Thief => {
                    t.starting_coins = 15;
                    t.coin_bonus = 3;
                }
                Job::Mage => t.skill_bonus = 5,
                Job::Onmyoji => {}
                Job::Alchemist => t.equipment_discount_percent = 20,
                Job::Archer => t.base_attack -= 5,
                Job::Puppeteer => t.base_attack -= 19,
            }
            t
        })
        .collect()
}
