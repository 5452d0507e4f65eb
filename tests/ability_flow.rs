// Job abilities exercised through full turns
use std::sync::Arc;

use duel_arena::ability::CastParams;
use duel_arena::battle::events::{DamageKind, MatchEvent};
use duel_arena::battle::{Action, Match, Participant};
use duel_arena::catalog::{GameData, Job};
use duel_arena::combatant::effects::BuffKind;
use duel_arena::config::MatchConfig;
use duel_arena::item::{EquipCategory, Equipment, Item, ItemKind};
use duel_arena::shop::StandardShop;
use duel_arena::side::Side;

fn duel(a: Job, b: Job) -> Match {
    Match::new(
        Arc::new(GameData::standard()),
        Arc::new(StandardShop),
        MatchConfig::default(),
        [Participant::human("ann", a), Participant::human("bob", b)],
    )
    .expect("valid match")
}

fn cast(index: u8, params: CastParams) -> Action {
    Action::CastSkill { index, params }
}

fn blade(id: u64, category: EquipCategory, star: u8) -> Item {
    Item {
        id,
        name: format!("Blade ★{}", star),
        price: 10,
        kind: ItemKind::Equipment(Equipment::new(category, star)),
    }
}

#[test]
fn cast_announces_itself_first_and_passes_the_turn() {
    let mut m = duel(Job::Knight, Job::Warrior);
    let out = m
        .handle_action(Side::P1, cast(1, CastParams::default()))
        .expect("guard strike");
    assert!(matches!(
        out[0].event,
        MatchEvent::AbilityCast {
            side: Side::P1,
            index: 1,
            ..
        }
    ));
    assert!(m.combatant(Side::P1).effects.has(BuffKind::DefenseUp));
    assert_eq!(m.active(), Side::P2);
}

#[test]
fn archer_extra_shot_adds_a_second_arrow() {
    let mut m = duel(Job::Archer, Job::Knight);
    m.handle_action(Side::P1, cast(1, CastParams::default()))
        .expect("extra shot");
    m.handle_action(Side::P2, Action::Attack).expect("P2");
    let out = m.handle_action(Side::P1, Action::Attack).expect("volley");
    let arrows = out
        .iter()
        .filter(|e| {
            matches!(
                e.event,
                MatchEvent::DamageDealt {
                    target: Side::P2,
                    kind: DamageKind::Arrow { .. },
                    ..
                }
            )
        })
        .count();
    assert_eq!(arrows, 2);
    assert_eq!(m.combatant(Side::P1).archer().map(|k| k.extra_shots), Some(2));
}

#[test]
fn alchemist_fuses_chosen_items_into_an_artifact() {
    let mut m = duel(Job::Alchemist, Job::Knight);
    {
        let me = m.combatant_mut(Side::P1);
        me.level = 3;
        me.stow(blade(801, EquipCategory::Attack, 1));
        me.stow(blade(802, EquipCategory::Defense, 2));
        me.stow(blade(803, EquipCategory::Coin, 1));
        me.stow(blade(804, EquipCategory::Attack, 3));
    }
    let params = CastParams {
        item_ids: Some(vec![801, 802, 803]),
        ..CastParams::default()
    };
    m.handle_action(Side::P1, cast(3, params)).expect("fusion");
    let me = m.combatant(Side::P1);
    assert_eq!(me.equipment_inventory.len(), 1);
    assert_eq!(me.equipment_inventory[0].id, 804);
    let relic = me.special_inventory.first().expect("artifact");
    let artifact = relic.as_artifact().expect("artifact kind");
    assert_eq!((artifact.attack, artifact.defense, artifact.coins), (2, 3, 2));
    assert_eq!(artifact.star, 4);
    assert_eq!(relic.name, "Fused Relic ★4");
}

#[test]
fn fusion_rejects_duplicates_without_spending_the_turn() {
    let mut m = duel(Job::Alchemist, Job::Knight);
    {
        let me = m.combatant_mut(Side::P1);
        me.level = 3;
        me.stow(blade(801, EquipCategory::Attack, 1));
        me.stow(blade(802, EquipCategory::Attack, 1));
    }
    let params = CastParams {
        item_ids: Some(vec![801, 801, 802]),
        ..CastParams::default()
    };
    let err = m.handle_action(Side::P1, cast(3, params)).expect_err("dupes");
    assert_eq!(err.code(), "INVALID_TARGET");
    assert_eq!(m.active(), Side::P1);
    assert_eq!(m.combatant(Side::P1).equipment_inventory.len(), 2);
}

#[test]
fn puppeteer_doll_fights_in_its_owners_place() {
    let mut m = duel(Job::Puppeteer, Job::Warrior);
    m.handle_action(Side::P1, Action::Attack).expect("doll attack");
    // doll attack 20 against defense 10
    assert_eq!(m.combatant(Side::P2).hp, 190);
    m.handle_action(Side::P2, Action::Attack).expect("P2");
    let p = m.combatant(Side::P1);
    assert_eq!(p.hp, 200);
    assert_eq!(p.doll().map(|d| d.durability), Some(47));
}

#[test]
fn priest_heal_includes_the_bonus() {
    let mut m = duel(Job::Priest, Job::Warrior);
    m.combatant_mut(Side::P1).hp = 100;
    m.handle_action(Side::P1, cast(1, CastParams::default()))
        .expect("heal");
    assert_eq!(m.combatant(Side::P1).hp, 133);
}

#[test]
fn sealed_casters_cannot_cast() {
    let mut m = duel(Job::Warrior, Job::Knight);
    m.combatant_mut(Side::P1)
        .effects
        .add_buff(BuffKind::SkillSeal, 0, 2);
    let err = m
        .handle_action(Side::P1, cast(1, CastParams::default()))
        .expect_err("sealed");
    assert_eq!(err.code(), "SEALED");
    m.handle_action(Side::P1, Action::Attack).expect("attack still works");
}

#[test]
fn freeze_stacks_age_on_the_archers_round_start() {
    let mut m = duel(Job::Archer, Job::Warrior);
    let mut frost = m
        .data()
        .arrows
        .iter()
        .find(|a| a.name == "Freeze Arrow")
        .cloned()
        .expect("freeze arrow");
    frost.id = 950;
    if let Some(k) = m.combatant_mut(Side::P1).archer_mut() {
        k.slots[0] = Some(frost);
    }
    m.handle_action(Side::P1, Action::Attack).expect("P1");
    let warrior = m.combatant(Side::P2);
    assert_eq!(warrior.effects.freeze[0].owner, Side::P1);
    assert_eq!(warrior.effects.freeze[0].remaining_rounds, 2);
    assert_eq!(warrior.total_attack(), 21);
    m.handle_action(Side::P2, Action::Attack).expect("P2");
    assert_eq!(m.combatant(Side::P2).effects.freeze[0].remaining_rounds, 1);
    if let Some(k) = m.combatant_mut(Side::P1).archer_mut() {
        k.slots[0] = None;
    }
    m.handle_action(Side::P1, Action::Attack).expect("P1");
    m.handle_action(Side::P2, Action::Attack).expect("P2");
    assert!(m.combatant(Side::P2).effects.freeze.is_empty());
    assert_eq!(m.combatant(Side::P2).effects.freeze_penalty(), 0);
}
