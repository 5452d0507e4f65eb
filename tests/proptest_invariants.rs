// Property-based checks that random action sequences keep every combatant in bounds
use std::sync::Arc;

use duel_arena::ability::CastParams;
use duel_arena::battle::{Action, Match, Participant};
use duel_arena::catalog::{GameData, Job};
use duel_arena::combatant::{Combatant, LevelUpMode};
use duel_arena::config::{FirstSide, MatchConfig};
use duel_arena::session::simulate;
use duel_arena::shop::StandardShop;
use duel_arena::side::Side;
use proptest::prelude::*;

fn duel(a: Job, b: Job, seed: u64) -> Match {
    Match::new(
        Arc::new(GameData::standard()),
        Arc::new(StandardShop),
        MatchConfig {
            seed,
            first_side: FirstSide::Random,
            ..MatchConfig::default()
        },
        [Participant::human("ann", a), Participant::human("bob", b)],
    )
    .expect("valid match")
}

fn action_for(m: &Match, side: Side, kind: u8, n: u8) -> Action {
    let me = m.combatant(side);
    match kind {
        0 => Action::Attack,
        1 => Action::CastSkill {
            index: n % 3 + 1,
            params: CastParams::default(),
        },
        2 => {
            let owned: Vec<u64> = me
                .items
                .iter()
                .chain(me.equipment_inventory.iter())
                .chain(me.special_inventory.iter())
                .map(|i| i.id)
                .collect();
            Action::UseItem {
                item_id: owned.get(usize::from(n) % owned.len().max(1)).copied().unwrap_or(0),
                slot: None,
            }
        }
        3 => Action::OpenShop,
        4 => Action::BuyItem {
            index: usize::from(n % 6),
        },
        5 => Action::RerollShop,
        _ => Action::RequestLevelUp {
            mode: if n % 2 == 0 {
                LevelUpMode::Coins
            } else {
                LevelUpMode::Exp
            },
        },
    }
}

fn check_bounds(m: &Match, c: &Combatant) -> Result<(), TestCaseError> {
    prop_assert!(c.hp >= 0 && c.hp <= c.max_hp, "hp {} of {}", c.hp, c.max_hp);
    prop_assert!(c.mana() >= 0 && c.mana() <= m.data().rules.mana_max);
    if let Some(d) = c.doll() {
        prop_assert!(d.durability >= 0 && d.durability <= d.max_durability);
        prop_assert!(!d.is_broken || d.durability == 0);
    }
    let stacked: i32 = c.effects.freeze.iter().map(|f| f.attack_penalty).sum();
    prop_assert_eq!(c.effects.freeze_penalty(), stacked);
    prop_assert!(c.level >= 1 && c.level <= m.data().rules.max_level());
    Ok(())
}

fn job() -> impl Strategy<Value = Job> {
    prop::sample::select(Job::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_actions_keep_state_in_bounds(
        jobs in (job(), job()),
        seed in any::<u64>(),
        moves in prop::collection::vec((any::<bool>(), 0u8..7, any::<u8>()), 0..60)
    ) {
        let mut m = duel(jobs.0, jobs.1, seed);
        let mut round = m.round();
        let mut last_seq = m.journal().last_seq();
        for (p1, kind, n) in moves {
            if m.is_ended() {
                break;
            }
            let side = if p1 { Side::P1 } else { Side::P2 };
            let action = action_for(&m, side, kind, n);
            let before = m.snapshot();
            match m.handle_action(side, action) {
                Ok(_) => {
                    prop_assert!(m.journal().last_seq() >= last_seq);
                    last_seq = m.journal().last_seq();
                }
                Err(_) => {
                    let after = m.snapshot();
                    prop_assert_eq!(after.combatants, before.combatants);
                    prop_assert_eq!(after.phase, before.phase);
                }
            }
            prop_assert!(m.round() >= round);
            round = m.round();
            for s in Side::ALL {
                check_bounds(&m, m.combatant(s))?;
            }
        }
    }

    #[test]
    fn attacks_alone_always_finish(
        jobs in (job(), job()),
        seed in any::<u64>()
    ) {
        let mut m = duel(jobs.0, jobs.1, seed);
        let mut guard = 0;
        while !m.is_ended() && guard < 2_000 {
            let side = m.active();
            m.handle_action(side, Action::Attack).map_err(|e| TestCaseError::fail(e.to_string()))?;
            guard += 1;
        }
        prop_assert!(m.is_ended());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn cpu_simulation_stays_in_bounds(
        jobs in (job(), job()),
        seed in any::<u64>()
    ) {
        let summary = simulate(Arc::new(GameData::standard()), [jobs.0, jobs.1], seed, 300)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(summary.turns <= 300);
        for hp in summary.hp {
            prop_assert!((0..=200).contains(&hp));
        }
        if summary.result.is_none() {
            prop_assert_eq!(summary.turns, 300);
        }
    }
}
