use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use super::jobs::Job;
use crate::combatant::effects::BuffKind;

/// A timed buff granted to the caster as part of an ability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct BuffGrant {
    pub kind: BuffKind,
    pub magnitude: i32,
    pub rounds: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct AbilityDef {
    pub job: Job,
    /// 1, 2 or 3. Also the minimum level.
    pub index: u8,
    pub name: String,
    pub description: String,
    pub min_level: u8,
    /// Reusable abilities are not recorded as used after a cast.
    pub reusable: bool,
    pub mana_cost: i32,
    /// Fixed part of the ability's damage, heal or resource amount.
    pub power: i32,
    pub buff: Option<BuffGrant>,
}

fn def(
    job: Job,
    index: u8,
    name: &str,
    description: &str,
    power: i32,
    buff: Option<(BuffKind, i32, u32)>,
) -> AbilityDef {
    AbilityDef {
        job,
        index,
        name: name.to_string(),
        description: description.to_string(),
        min_level: index,
        reusable: false,
        mana_cost: 0,
        power,
        buff: buff.map(|(kind, magnitude, rounds)| BuffGrant {
            kind,
            magnitude,
            rounds,
        }),
    }
}

pub(crate) fn standard_abilities() -> Vec<AbilityDef> {
    use BuffKind::{AttackUp, DefenseUp};
    let mut table = vec![
        def(Job::Warrior, 1, "Break Hit", "Deals 20 damage, ignoring defense.", 20, None),
        def(
            Job::Warrior,
            2,
            "Burst Up",
            "Deals 30 damage ignoring defense and raises attack by 3 for 3 rounds.",
            30,
            Some((AttackUp, 3, 3)),
        ),
        def(
            Job::Warrior,
            3,
            "Berserker Smash",
            "Deals 20 plus current attack as damage, ignoring defense.",
            20,
            None,
        ),
        def(
            Job::Knight,
            1,
            "Guard Strike",
            "Deals 20 damage and raises own defense by 2 for 4 rounds.",
            20,
            Some((DefenseUp, 2, 4)),
        ),
        def(
            Job::Knight,
            2,
            "Fortress Break",
            "Deals 15 plus own defense as damage and raises defense by 4 for 3 rounds.",
            15,
            Some((DefenseUp, 4, 3)),
        ),
        def(
            Job::Knight,
            3,
            "Paladin Smash",
            "Deals 25 plus own defense as damage.",
            25,
            None,
        ),
        def(Job::Priest, 1, "Heal", "Restores 30 HP plus heal bonus.", 30, None),
        def(
            Job::Priest,
            2,
            "Dispel Heal",
            "Restores 35 HP plus heal bonus and removes debuffs.",
            35,
            None,
        ),
        def(
            Job::Priest,
            3,
            "Holy Heal",
            "Restores 40 HP plus heal bonus and removes debuffs.",
            40,
            None,
        ),
        def(
            Job::Thief,
            1,
            "Steal Attack",
            "Deals 25 damage and steals one item or piece of equipment.",
            25,
            None,
        ),
        def(
            Job::Thief,
            2,
            "Greed Blow",
            "Deals 25 plus 2 per owned item as damage and steals.",
            25,
            None,
        ),
        def(
            Job::Thief,
            3,
            "Dark Alchemy",
            "Triggers every owned item at once without consuming it.",
            0,
            None,
        ),
        def(
            Job::Mage,
            1,
            "Mana Charge",
            "Restores 20 mana. Once per battle.",
            20,
            None,
        ),
        def(
            Job::Mage,
            2,
            "Element Burst",
            "Spends 30 mana to deal 30 damage. Pierces with the right gear.",
            30,
            None,
        ),
        def(
            Job::Mage,
            3,
            "Meteor Impact",
            "Spends all mana to deal (spent - 30) damage. Needs 60 mana.",
            30,
            None,
        ),
        def(
            Job::Onmyoji,
            1,
            "Shikigami: Novice",
            "Summons one novice shikigami.",
            0,
            None,
        ),
        def(
            Job::Onmyoji,
            2,
            "Shikigami: Adept",
            "Summons a random shikigami of any kind.",
            0,
            None,
        ),
        def(
            Job::Onmyoji,
            3,
            "Shikigami: Supreme",
            "Summons two different shikigami.",
            0,
            None,
        ),
        def(
            Job::Alchemist,
            1,
            "Transmute",
            "Creates two random pieces of equipment.",
            2,
            None,
        ),
        def(
            Job::Alchemist,
            2,
            "Refine",
            "Raises the star of all owned and equipped equipment by one.",
            1,
            None,
        ),
        def(
            Job::Alchemist,
            3,
            "Triple Fusion",
            "Fuses three pieces of equipment into a higher rank artifact.",
            3,
            None,
        ),
        def(
            Job::Archer,
            1,
            "Pursuit Stance",
            "For 3 attacks, fires one extra arrow.",
            3,
            None,
        ),
        def(
            Job::Archer,
            2,
            "Quiver Expansion",
            "Opens a second arrow slot and fires one extra arrow for 3 attacks.",
            3,
            None,
        ),
        def(
            Job::Archer,
            3,
            "Piercing Fletching",
            "Every equipped arrow ignores defense.",
            0,
            None,
        ),
        def(
            Job::Puppeteer,
            1,
            "Tailoring",
            "Raises the star of one costume part by one, up to 4.",
            1,
            None,
        ),
        def(
            Job::Puppeteer,
            2,
            "Lifeblood Mending",
            "Pays HP in steps of 10 to restore half as much doll durability.",
            10,
            None,
        ),
        def(
            Job::Puppeteer,
            3,
            "Rampage",
            "Halves doll durability; the doll hits twice as hard for 3 rounds, then self-destructs.",
            3,
            None,
        ),
    ];
    for ability in table.iter_mut() {
        if ability.job == Job::Mage && ability.index >= 2 {
            ability.reusable = true;
            ability.mana_cost = if ability.index == 2 { 30 } else { 60 };
        }
    }
    table
}
