//! Damage resolution for plain attacks, arrow volleys and follow-up strikes.
//!
//! Pure functions over an [`Engagement`]: they mutate the two combatants they
//! are handed and return the events that describe what happened. Win checks
//! are left to the match.

use crate::battle::events::{DamageKind, MatchEvent};
use crate::catalog::GameData;
use crate::combatant::effects::Shikigami;
use crate::combatant::{Combatant, ConsumableOutcome, HitKind};
use crate::item::{Arrow, ArrowEffect};
use crate::rng::MatchRng;
use crate::side::Side;

/// The two sides of one action: who acts and who receives it.
pub struct Engagement<'a> {
    pub actor: &'a mut Combatant,
    pub actor_side: Side,
    pub target: &'a mut Combatant,
    pub data: &'a GameData,
    pub rng: &'a mut MatchRng,
}

impl<'a> Engagement<'a> {
    pub fn target_side(&self) -> Side {
        self.actor_side.other()
    }
}

pub fn hp_event(side: Side, c: &Combatant) -> MatchEvent {
    MatchEvent::HpChanged {
        side,
        hp: c.hp,
        max_hp: c.max_hp,
    }
}

pub fn status_event(side: Side, c: &Combatant) -> MatchEvent {
    MatchEvent::StatusChanged {
        side,
        buffs: c.effects.labels(),
    }
}

pub fn doll_event(side: Side, c: &Combatant) -> Option<MatchEvent> {
    c.doll().map(|d| MatchEvent::DollChanged {
        side,
        durability: d.durability,
        broken: d.is_broken,
        rampage: d.is_rampage,
    })
}

/// Describe what a consumable did to its user.
pub fn consumable_events(side: Side, c: &Combatant, outcome: &ConsumableOutcome) -> Vec<MatchEvent> {
    match outcome {
        ConsumableOutcome::Healed(amount) => vec![
            MatchEvent::HealApplied {
                target: side,
                amount: *amount,
            },
            hp_event(side, c),
        ],
        ConsumableOutcome::Buffed { .. } => vec![status_event(side, c)],
        ConsumableOutcome::ManaRestored(_) => vec![MatchEvent::ManaChanged {
            side,
            mana: c.mana(),
        }],
        ConsumableOutcome::DollMended(_) | ConsumableOutcome::DollRevived => {
            doll_event(side, c).into_iter().collect()
        }
    }
}

/// Land one hit on `target` and describe it.
pub fn strike(
    target: &mut Combatant,
    target_side: Side,
    raw: i32,
    ignore_defense: bool,
    hit: HitKind,
    kind: DamageKind,
) -> Vec<MatchEvent> {
    let barrier_before = target.barrier;
    let durability_before = target.doll().map(|d| (d.durability, d.is_broken));
    let amount = target.take_damage(raw, ignore_defense, hit);
    let kind = if target.barrier < barrier_before {
        DamageKind::Blocked
    } else {
        kind
    };
    let mut events = vec![
        MatchEvent::DamageDealt {
            target: target_side,
            amount,
            kind,
        },
        hp_event(target_side, target),
    ];
    if durability_before != target.doll().map(|d| (d.durability, d.is_broken)) {
        events.extend(doll_event(target_side, target));
    }
    events
}

/// Resolve a plain attack. Archers fire their arrows, an intact doll strikes
/// for its owner, everyone else hits with total attack.
pub fn resolve_attack(e: &mut Engagement) -> Vec<MatchEvent> {
    if e.actor.archer().map(|k| k.equipped_arrows().next().is_some()) == Some(true) {
        return arrow_volley(e);
    }
    let raw = match e.actor.doll() {
        Some(doll) if doll.is_intact() => doll.attack(&e.data.rules.doll),
        _ => e.actor.total_attack(),
    };
    let target_side = e.target_side();
    let mut events = strike(
        e.target,
        target_side,
        raw,
        false,
        HitKind::Primary,
        DamageKind::Attack,
    );
    events.extend(pursuit(e));
    events
}

/// Karasu-tengu's bonus strike, if the actor has one live.
pub fn pursuit(e: &mut Engagement) -> Vec<MatchEvent> {
    if e.target.is_defeated() || !e.actor.effects.consume_trigger(Shikigami::KarasuTengu) {
        return Vec::new();
    }
    let raw = (e.actor.total_attack() + 1) / 2 + 5;
    let target_side = e.target_side();
    let mut events = strike(
        e.target,
        target_side,
        raw,
        false,
        HitKind::Secondary,
        DamageKind::Pursuit,
    );
    if !e.actor.effects.has_summon(Shikigami::KarasuTengu) {
        events.push(MatchEvent::SummonChanged {
            side: e.actor_side,
            summon: Shikigami::KarasuTengu.name().to_string(),
            active: false,
        });
    }
    events.push(status_event(e.actor_side, e.actor));
    events
}

fn arrow_volley(e: &mut Engagement) -> Vec<MatchEvent> {
    let mut volley: Vec<Arrow> = e
        .actor
        .archer()
        .map(|k| k.equipped_arrows().filter_map(|i| i.as_arrow().cloned()).collect())
        .unwrap_or_default();
    if let Some(k) = e.actor.archer_mut() {
        if k.extra_shots > 0 {
            k.extra_shots -= 1;
            if let Some(first) = volley.first().cloned() {
                volley.push(first);
            }
        }
    }
    let target_side = e.target_side();
    let mut events = Vec::new();
    for (n, arrow) in volley.iter().enumerate() {
        if e.target.is_defeated() {
            break;
        }
        let critical = arrow.crit_percent > 0 && e.rng.chance(arrow.crit_percent);
        let power = if critical {
            arrow.power * (100 + arrow.crit_bonus_percent as i32) / 100
        } else {
            arrow.power
        };
        events.extend(strike(
            e.target,
            target_side,
            power,
            arrow.pierce,
            HitKind::Primary,
            DamageKind::Arrow { critical },
        ));
        if n == 0 {
            events.extend(pursuit(e));
        }
        events.extend(arrow_on_hit(e, arrow));
    }
    events
}

fn arrow_on_hit(e: &mut Engagement, arrow: &Arrow) -> Vec<MatchEvent> {
    let target_side = e.target_side();
    match arrow.effect {
        ArrowEffect::Normal => Vec::new(),
        ArrowEffect::Poison { power, ticks } => {
            e.target.effects.add_dot("Poison", power, ticks);
            vec![status_event(target_side, e.target)]
        }
        ArrowEffect::Freeze { penalty, rounds } => {
            e.target.effects.add_freeze(penalty, rounds, e.actor_side);
            vec![status_event(target_side, e.target)]
        }
        ArrowEffect::Counter => {
            let bonus = e.actor.last_primary_damage_taken / 2;
            if bonus <= 0 || e.target.is_defeated() {
                return Vec::new();
            }
            strike(
                e.target,
                target_side,
                bonus,
                false,
                HitKind::Secondary,
                DamageKind::Counter,
            )
        }
        ArrowEffect::Critical {
            percent,
            bonus_percent,
        } => {
            if let Some(k) = e.actor.archer_mut() {
                for slot in k.slots.iter_mut().flatten() {
                    if let Some(a) = slot.as_arrow_mut() {
                        a.crit_percent = percent;
                        a.crit_bonus_percent = bonus_percent;
                    }
                }
            }
            Vec::new()
        }
    }
}
