//! Round-end and round-start hooks, run in a fixed order after every
//! completed turn.

use std::sync::Arc;

use super::events::{DamageKind, MatchEvent};
use super::{Match, MatchPhase};
use crate::combat::{doll_event, hp_event, status_event};
use crate::combatant::doll::DollTick;
use crate::combatant::effects::Shikigami;
use crate::combatant::HitKind;
use crate::side::Side;

impl Match {
    /// Close out the active side's turn and hand the match to the other side.
    ///
    /// For the side that acted: exp and auto level-up, summon aging, then its
    /// damage over time followed by a win check. Then the swap, the round
    /// counter, and the new side's round start.
    pub(super) fn finish_turn(&mut self) -> Vec<MatchEvent> {
        self.phase = MatchPhase::RoundEndHooks;
        let acted = self.active;
        let mut events = self.grant_exp(acted);
        events.extend(self.age_summons(acted));
        events.extend(self.tick_dots(acted));
        if let Some(result) = self.knockout() {
            events.extend(self.end(result));
            return events;
        }

        let next = acted.other();
        self.active = next;
        if next == self.first {
            self.round += 1;
        }
        events.extend(self.start_round(next));
        if self.is_ended() {
            return events;
        }
        self.phase = MatchPhase::AwaitingAction { active: next };
        events.push(MatchEvent::TurnChanged {
            active: next,
            round: self.round,
        });
        events
    }

    fn grant_exp(&mut self, side: Side) -> Vec<MatchEvent> {
        let data = Arc::clone(&self.data);
        let c = &mut self.combatants[side.index()];
        c.exp += data.rules.exp_per_action;
        let mut events = Vec::new();
        while let Some(level) = c.try_auto_level_up(&data.rules) {
            log::info!("{} reaches level {}", c.name, level);
            events.push(MatchEvent::LevelChanged {
                side,
                level,
                exp: c.exp,
            });
        }
        events
    }

    fn age_summons(&mut self, side: Side) -> Vec<MatchEvent> {
        let c = &mut self.combatants[side.index()];
        let before: Vec<Shikigami> = c.effects.summons.iter().map(|s| s.name).collect();
        if !c.effects.decrement_summon_rounds() {
            return Vec::new();
        }
        let mut events: Vec<MatchEvent> = before
            .into_iter()
            .filter(|name| !c.effects.has_summon(*name))
            .map(|name| MatchEvent::SummonChanged {
                side,
                summon: name.name().to_string(),
                active: false,
            })
            .collect();
        events.push(status_event(side, c));
        events
    }

    fn tick_dots(&mut self, side: Side) -> Vec<MatchEvent> {
        let c = &mut self.combatants[side.index()];
        if c.effects.dots.is_empty() {
            return Vec::new();
        }
        let due = c.effects.tick_dots();
        let dealt = c.lose_hp(due);
        vec![
            MatchEvent::DamageDealt {
                target: side,
                amount: dealt,
                kind: DamageKind::DamageOverTime,
            },
            hp_event(side, c),
            status_event(side, c),
        ]
    }

    fn start_round(&mut self, side: Side) -> Vec<MatchEvent> {
        log::debug!("round {} starts for {}", self.round, side);
        let data = Arc::clone(&self.data);
        let mut events = Vec::new();

        let c = &mut self.combatants[side.index()];
        c.items_used_this_turn = 0;
        let expired = c.effects.decrement_buffs();
        let income = c.round_income(&data.rules);
        c.coins += income;
        let tick = c.gear_tick();
        events.push(MatchEvent::CoinsChanged {
            side,
            coins: c.coins,
        });
        if tick.mana > 0 {
            events.push(MatchEvent::ManaChanged {
                side,
                mana: c.mana(),
            });
        }
        if tick.healed > 0 {
            events.push(MatchEvent::HealApplied {
                target: side,
                amount: tick.healed,
            });
            events.push(hp_event(side, c));
        }
        if !expired.is_empty() || tick.defense_buff > 0 {
            events.push(status_event(side, c));
        }

        let foe = &mut self.combatants[side.other().index()];
        if foe.effects.decrement_freeze_owned_by(side) > 0 || !foe.effects.freeze.is_empty() {
            events.push(status_event(side.other(), foe));
        }

        events.extend(self.tick_doll(side));
        if self.is_ended() {
            return events;
        }
        events.extend(self.refresh_shop(side));
        events
    }

    fn tick_doll(&mut self, side: Side) -> Vec<MatchEvent> {
        let damage = self.data.rules.doll.self_destruct_damage;
        let c = &mut self.combatants[side.index()];
        let Some(doll) = c.doll_mut() else {
            return Vec::new();
        };
        let tick = doll.tick();
        let mut events: Vec<MatchEvent> = match tick {
            DollTick::Idle => return Vec::new(),
            _ => doll_event(side, c).into_iter().collect(),
        };
        if tick != DollTick::SelfDestruct {
            return events;
        }
        log::info!("{}'s doll self-destructs", c.name);
        for target in [side, side.other()] {
            let t = &mut self.combatants[target.index()];
            let dealt = t.take_damage(damage, true, HitKind::Secondary);
            events.push(MatchEvent::DamageDealt {
                target,
                amount: dealt,
                kind: DamageKind::SelfDestruct,
            });
            events.push(hp_event(target, t));
        }
        if let Some(result) = self.knockout() {
            events.extend(self.end(result));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::{Action, Match, Participant};
    use crate::battle::events::{EndReason, MatchEvent, MatchResult};
    use crate::catalog::{GameData, Job};
    use crate::combatant::effects::BuffKind;
    use crate::config::MatchConfig;
    use crate::shop::StandardShop;
    use crate::side::Side;

    fn duel(a: Job, b: Job) -> Match {
        Match::new(
            Arc::new(GameData::standard()),
            Arc::new(StandardShop),
            MatchConfig::default(),
            [Participant::human("ann", a), Participant::human("bob", b)],
        )
        .expect("match")
    }

    #[test]
    fn round_advances_after_both_sides_act() {
        let mut m = duel(Job::Warrior, Job::Knight);
        assert_eq!(m.round(), 1);
        m.handle_action(Side::P1, Action::Attack).expect("p1");
        assert_eq!(m.round(), 1);
        assert_eq!(m.active(), Side::P2);
        m.handle_action(Side::P2, Action::Attack).expect("p2");
        assert_eq!(m.round(), 2);
        assert_eq!(m.active(), Side::P1);
    }

    #[test]
    fn dots_tick_on_the_afflicted_sides_turn_only() {
        let mut m = duel(Job::Warrior, Job::Knight);
        m.combatant_mut(Side::P2).effects.add_dot("Poison", 3, 2);
        m.handle_action(Side::P1, Action::Attack).expect("p1");
        assert_eq!(m.combatant(Side::P2).effects.dots[0].remaining_ticks, 2);
        let hp = m.combatant(Side::P2).hp;
        m.handle_action(Side::P2, Action::Attack).expect("p2");
        assert_eq!(m.combatant(Side::P2).hp, hp - 3);
        assert_eq!(m.combatant(Side::P2).effects.dots[0].remaining_ticks, 1);
    }

    #[test]
    fn three_round_buff_expires_at_round_n_plus_three() {
        let mut m = duel(Job::Warrior, Job::Knight);
        m.combatant_mut(Side::P1).effects.add_buff(BuffKind::DefenseUp, 5, 3);
        for round in 1..=2 {
            m.handle_action(Side::P1, Action::Attack).expect("p1");
            m.handle_action(Side::P2, Action::Attack).expect("p2");
            assert_eq!(m.round(), round + 1);
            if round + 1 < 4 {
                assert!(m.combatant(Side::P1).effects.has(BuffKind::DefenseUp));
            }
        }
        m.handle_action(Side::P1, Action::Attack).expect("p1");
        m.handle_action(Side::P2, Action::Attack).expect("p2");
        assert_eq!(m.round(), 4);
        assert!(!m.combatant(Side::P1).effects.has(BuffKind::DefenseUp));
    }

    #[test]
    fn exp_accrues_and_levels_automatically() {
        let mut m = duel(Job::Warrior, Job::Knight);
        for _ in 0..3 {
            m.handle_action(Side::P1, Action::Attack).expect("p1");
            m.handle_action(Side::P2, Action::Attack).expect("p2");
        }
        assert_eq!(m.combatant(Side::P1).level, 2);
        assert_eq!(m.combatant(Side::P1).exp, 0);
    }

    #[test]
    fn income_arrives_at_round_start() {
        let mut m = duel(Job::Warrior, Job::Thief);
        let coins = m.combatant(Side::P2).coins;
        let out = m.handle_action(Side::P1, Action::Attack).expect("p1");
        assert_eq!(m.combatant(Side::P2).coins, coins + 13);
        assert!(out.iter().any(|e| matches!(
            e.event,
            MatchEvent::TurnChanged {
                active: Side::P2,
                round: 1
            }
        )));
    }

    #[test]
    fn lethal_dot_ends_the_match() {
        let mut m = duel(Job::Warrior, Job::Knight);
        m.combatant_mut(Side::P1).hp = 2;
        m.combatant_mut(Side::P1).effects.add_dot("Poison", 5, 1);
        m.handle_action(Side::P1, Action::Attack).expect("p1");
        assert_eq!(
            m.result(),
            Some(&MatchResult::winner(Side::P2, EndReason::Knockout))
        );
    }

    #[test]
    fn rampage_self_destruct_hits_both() {
        let mut m = duel(Job::Warrior, Job::Puppeteer);
        let rules = m.data().rules.doll.clone();
        if let Some(d) = m.combatant_mut(Side::P2).doll_mut() {
            d.start_rampage(&rules);
            d.rampage_rounds_remaining = 1;
        }
        m.handle_action(Side::P1, Action::Attack).expect("p1");
        let p2 = m.combatant(Side::P2);
        assert!(p2.doll().map(|d| d.is_broken).unwrap_or(false));
        assert_eq!(p2.hp, 180);
        assert!(m.combatant(Side::P1).hp <= 180);
    }
}
