// Shop, items and level-up through the match interface
use std::sync::Arc;

use duel_arena::battle::events::MatchEvent;
use duel_arena::battle::{Action, Match, Participant};
use duel_arena::catalog::{GameData, Job};
use duel_arena::combatant::LevelUpMode;
use duel_arena::config::MatchConfig;
use duel_arena::error::ActionRejection;
use duel_arena::item::{Consumable, ConsumableEffect, Item, ItemKind};
use duel_arena::shop::{purchase_price, StandardShop};
use duel_arena::side::Side;

fn duel(a: Job, b: Job) -> Match {
    Match::new(
        Arc::new(GameData::standard()),
        Arc::new(StandardShop),
        MatchConfig {
            seed: 11,
            ..MatchConfig::default()
        },
        [Participant::human("ann", a), Participant::human("bob", b)],
    )
    .expect("valid match")
}

fn tonic(id: u64) -> Item {
    Item {
        id,
        name: "Attack Tonic".to_string(),
        price: 8,
        kind: ItemKind::Consumable(Consumable {
            effect: ConsumableEffect::AttackBuff,
            power: 2,
            duration: 2,
            star: 1,
        }),
    }
}

#[test]
fn open_shop_is_private_to_the_owner() {
    let mut m = duel(Job::Warrior, Job::Knight);
    let out = m.handle_action(Side::P1, Action::OpenShop).expect("open");
    assert_eq!(out.len(), 1);
    assert!(!out[0].recipient.includes(Side::P2));
    assert!(matches!(out[0].event, MatchEvent::ShopOffered { side: Side::P1, .. }));
    assert_eq!(m.active(), Side::P1);
}

#[test]
fn reroll_costs_ten_and_replaces_the_offer() {
    let mut m = duel(Job::Warrior, Job::Knight);
    m.combatant_mut(Side::P1).coins = 25;
    m.handle_action(Side::P1, Action::RerollShop).expect("reroll");
    assert_eq!(m.combatant(Side::P1).coins, 15);
    assert_eq!(m.combatant(Side::P1).shop.len(), 5);
}

#[test]
fn alchemist_pays_discounted_prices() {
    let mut m = duel(Job::Alchemist, Job::Knight);
    m.combatant_mut(Side::P1).coins = 1_000;
    let idx = m
        .combatant(Side::P1)
        .shop
        .iter()
        .position(|i| i.as_equipment().is_some());
    if let Some(index) = idx {
        let listed = m.combatant(Side::P1).shop[index].clone();
        let price = purchase_price(m.combatant(Side::P1), &listed);
        assert!(price < listed.price);
        m.handle_action(Side::P1, Action::BuyItem { index }).expect("buy");
        assert_eq!(m.combatant(Side::P1).coins, 1_000 - price);
    }
}

#[test]
fn two_consumables_per_turn_then_reset() {
    let mut m = duel(Job::Warrior, Job::Knight);
    for id in 501..=503 {
        m.combatant_mut(Side::P1).items.push(tonic(id));
    }
    let use_item = |item_id| Action::UseItem {
        item_id,
        slot: None,
    };
    m.handle_action(Side::P1, use_item(501)).expect("first");
    m.handle_action(Side::P1, use_item(502)).expect("second");
    assert_eq!(
        m.handle_action(Side::P1, use_item(503)).map(|_| ()),
        Err(ActionRejection::ItemLimitReached(2))
    );
    m.handle_action(Side::P1, Action::Attack).expect("P1");
    m.handle_action(Side::P2, Action::Attack).expect("P2");
    m.handle_action(Side::P1, use_item(503)).expect("new turn");
}

#[test]
fn unknown_items_are_rejected() {
    let mut m = duel(Job::Warrior, Job::Knight);
    let err = m
        .handle_action(
            Side::P1,
            Action::UseItem {
                item_id: 4242,
                slot: None,
            },
        )
        .expect_err("missing");
    assert_eq!(err.code(), "UNKNOWN_ITEM");
}

#[test]
fn coin_level_up_keeps_the_turn() {
    let mut m = duel(Job::Warrior, Job::Knight);
    m.combatant_mut(Side::P1).coins = 40;
    let out = m
        .handle_action(
            Side::P1,
            Action::RequestLevelUp {
                mode: LevelUpMode::Coins,
            },
        )
        .expect("level up");
    let me = m.combatant(Side::P1);
    assert_eq!(me.level, 2);
    assert_eq!(me.coins, 10);
    assert_eq!(me.base_attack, 26);
    assert_eq!(m.active(), Side::P1);
    assert!(out
        .iter()
        .any(|e| matches!(e.event, MatchEvent::LevelChanged { level: 2, .. })));
    let err = m
        .handle_action(
            Side::P1,
            Action::RequestLevelUp {
                mode: LevelUpMode::Exp,
            },
        )
        .expect_err("no exp");
    assert_eq!(err.code(), "EXP_INSUFFICIENT");
}

#[test]
fn mage_gear_pays_out_at_round_start() {
    let mut m = duel(Job::Warrior, Job::Mage);
    let data = GameData::standard();
    let mut staff = data.mage_gear[0].clone();
    staff.id = 700;
    let per_round = staff
        .as_mage_gear()
        .map(|g| g.mana_per_round)
        .unwrap_or(0);
    m.combatant_mut(Side::P2).stow(staff);
    m.handle_action(Side::P1, Action::Attack).expect("P1");
    m.handle_action(
        Side::P2,
        Action::UseItem {
            item_id: 700,
            slot: None,
        },
    )
    .expect("equip staff");
    m.handle_action(Side::P2, Action::Attack).expect("P2");
    m.handle_action(Side::P1, Action::Attack).expect("P1");
    assert_eq!(m.combatant(Side::P2).mana(), per_round.min(200));
}
