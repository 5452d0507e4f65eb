//! The match state machine.
//!
//! A [`Match`] owns both combatants and advances only through
//! [`Match::handle_action`]. Every accepted action returns the envelopes it
//! produced, which are also appended to the match's [`EventJournal`].
//! Rejected actions leave the match untouched.

pub mod endpoints;
pub mod events;
mod hooks;
pub mod journal;
pub mod registry;

use std::sync::Arc;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::ability::{self, AbilityContext, CastParams};
use crate::catalog::{GameData, Job};
use crate::combat::{consumable_events, hp_event, resolve_attack, status_event, Engagement};
use crate::combatant::{Combatant, ItemUse, LevelUpMode};
use crate::config::{FirstSide, MatchConfig};
use crate::error::{ActionRejection, ConfigurationError};
use crate::item::{ItemId, ItemIds};
use crate::ledger::{AccountId, MatchLedger, MatchRecord, SeatRecord};
use crate::rng::MatchRng;
use crate::shop::{check_offer, purchase_price, ShopGenerator};
use crate::side::Side;
use events::{dispatch, EndReason, Envelope, MatchEvent, MatchResult, Transport};
use journal::EventJournal;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum Controller {
    Human,
    Cpu,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Participant {
    pub name: String,
    pub job: Job,
    pub controller: Controller,
    pub account: Option<AccountId>,
}

impl Participant {
    pub fn human(name: &str, job: Job) -> Self {
        Participant {
            name: name.to_string(),
            job,
            controller: Controller::Human,
            account: None,
        }
    }

    pub fn cpu(name: &str, job: Job) -> Self {
        Participant {
            controller: Controller::Cpu,
            ..Participant::human(name, job)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "phase")]
pub enum MatchPhase {
    AwaitingAction { active: Side },
    Resolving,
    RoundEndHooks,
    Ended { result: MatchResult },
}

/// Inbound commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "action_type")]
pub enum Action {
    Attack,
    CastSkill {
        index: u8,
        #[serde(default)]
        params: CastParams,
    },
    UseItem {
        item_id: ItemId,
        slot: Option<u8>,
    },
    OpenShop,
    BuyItem {
        index: usize,
    },
    RerollShop,
    RequestLevelUp {
        mode: LevelUpMode,
    },
    /// Also how a disconnect reaches the engine.
    Forfeit,
}

impl Action {
    /// Whether a successful action hands the turn over.
    pub fn consumes_turn(&self) -> bool {
        matches!(self, Action::Attack | Action::CastSkill { .. } | Action::Forfeit)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Attack => "Attack",
            Action::CastSkill { .. } => "CastSkill",
            Action::UseItem { .. } => "UseItem",
            Action::OpenShop => "OpenShop",
            Action::BuyItem { .. } => "BuyItem",
            Action::RerollShop => "RerollShop",
            Action::RequestLevelUp { .. } => "RequestLevelUp",
            Action::Forfeit => "Forfeit",
        }
    }
}

/// Public view of a match.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MatchSnapshot {
    pub phase: MatchPhase,
    pub round: u32,
    pub first: Side,
    pub participants: [Participant; 2],
    pub combatants: [Combatant; 2],
    pub last_seq: u64,
}

fn split(combatants: &mut [Combatant; 2], actor: Side) -> (&mut Combatant, &mut Combatant) {
    let [p1, p2] = combatants;
    match actor {
        Side::P1 => (p1, p2),
        Side::P2 => (p2, p1),
    }
}

fn envelopes(events: Vec<MatchEvent>) -> Vec<Envelope> {
    events.into_iter().map(Envelope::from).collect()
}

pub struct Match {
    data: Arc<GameData>,
    shop: Arc<dyn ShopGenerator>,
    ledger: Option<Arc<dyn MatchLedger>>,
    transport: Option<Arc<dyn Transport>>,
    config: MatchConfig,
    participants: [Participant; 2],
    combatants: [Combatant; 2],
    phase: MatchPhase,
    active: Side,
    first: Side,
    round: u32,
    rng: MatchRng,
    ids: ItemIds,
    skill_lock: bool,
    journal: EventJournal,
}

impl Match {
    /// Build a match ready for the first side's action. Both sides receive a
    /// shop offer up front; the first turn runs no round-start hooks.
    pub fn new(
        data: Arc<GameData>,
        shop: Arc<dyn ShopGenerator>,
        config: MatchConfig,
        participants: [Participant; 2],
    ) -> Result<Self, ConfigurationError> {
        data.validate()?;
        let mut rng = MatchRng::from_seed(config.seed);
        let mut ids = ItemIds::new();
        let [a, b] = &participants;
        let combatants = [
            Combatant::new(&a.name, data.template(a.job)?, &data, &mut ids),
            Combatant::new(&b.name, data.template(b.job)?, &data, &mut ids),
        ];
        let first = match config.first_side {
            FirstSide::Fixed(side) => side,
            FirstSide::Random => Side::ALL[rng.index(2)],
        };
        let mut game = Match {
            data,
            shop,
            ledger: None,
            transport: None,
            config,
            participants,
            combatants,
            phase: MatchPhase::AwaitingAction { active: first },
            active: first,
            first,
            round: 1,
            rng,
            ids,
            skill_lock: false,
            journal: EventJournal::new(),
        };
        for side in Side::ALL {
            let offer = game.roll_offer(side);
            check_offer(&offer)?;
            game.combatants[side.index()].shop = offer;
        }
        log::info!(
            "match created: {} ({}) vs {} ({}), seed {}, {} moves first",
            game.participants[0].name,
            game.participants[0].job.name(),
            game.participants[1].name,
            game.participants[1].job.name(),
            game.config.seed,
            first
        );
        let mut opening = vec![MatchEvent::TurnChanged {
            active: first,
            round: 1,
        }];
        for side in Side::ALL {
            opening.push(MatchEvent::ShopOffered {
                side,
                items: game.combatants[side.index()].shop.clone(),
            });
        }
        game.journal.append(&envelopes(opening));
        Ok(game)
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn MatchLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Deliver every envelope through `transport`, starting with what the
    /// match has already journaled.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        dispatch(&self.journal.envelopes(), transport.as_ref());
        self.transport = Some(transport);
        self
    }

    pub fn data(&self) -> &GameData {
        &self.data
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn phase(&self) -> &MatchPhase {
        &self.phase
    }

    pub fn active(&self) -> Side {
        self.active
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        &self.combatants[side.index()]
    }

    /// Direct access for setting up scenarios. Not reachable from the API.
    pub fn combatant_mut(&mut self, side: Side) -> &mut Combatant {
        &mut self.combatants[side.index()]
    }

    pub fn participant(&self, side: Side) -> &Participant {
        &self.participants[side.index()]
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, MatchPhase::Ended { .. })
    }

    pub fn result(&self) -> Option<&MatchResult> {
        match &self.phase {
            MatchPhase::Ended { result } => Some(result),
            _ => None,
        }
    }

    /// The CPU side whose move it is, if any.
    pub fn cpu_to_move(&self) -> Option<Side> {
        match self.phase {
            MatchPhase::AwaitingAction { active }
                if self.participants[active.index()].controller == Controller::Cpu =>
            {
                Some(active)
            }
            _ => None,
        }
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            phase: self.phase.clone(),
            round: self.round,
            first: self.first,
            participants: self.participants.clone(),
            combatants: self.combatants.clone(),
            last_seq: self.journal.last_seq(),
        }
    }

    /// Validate and apply one action from `side`.
    pub fn handle_action(
        &mut self,
        side: Side,
        action: Action,
    ) -> Result<Vec<Envelope>, ActionRejection> {
        match self.apply(side, &action) {
            Ok(events) => {
                log::debug!("{} {} accepted ({} events)", side, action.name(), events.len());
                let out = envelopes(events);
                self.journal.append(&out);
                if let Some(transport) = &self.transport {
                    dispatch(&out, transport.as_ref());
                }
                Ok(out)
            }
            Err(e) => {
                log::info!("{} {} rejected: {} ({})", side, action.name(), e.code(), e);
                Err(e)
            }
        }
    }

    fn apply(&mut self, side: Side, action: &Action) -> Result<Vec<MatchEvent>, ActionRejection> {
        if self.is_ended() {
            return Err(ActionRejection::MatchEnded);
        }
        if let Action::Forfeit = action {
            return Ok(self.forfeit(side));
        }
        if self.skill_lock {
            return Err(ActionRejection::SkillInProgress);
        }
        if side != self.active {
            return Err(ActionRejection::NotYourTurn(side));
        }
        match action {
            Action::Attack => Ok(self.attack(side)),
            Action::CastSkill { index, params } => self.cast(side, *index, params),
            Action::UseItem { item_id, slot } => self.use_item(side, *item_id, *slot),
            Action::OpenShop => Ok(vec![MatchEvent::ShopOffered {
                side,
                items: self.combatant(side).shop.clone(),
            }]),
            Action::BuyItem { index } => self.buy(side, *index),
            Action::RerollShop => self.reroll(side),
            Action::RequestLevelUp { mode } => self.level_up(side, *mode),
            Action::Forfeit => Ok(Vec::new()),
        }
    }

    fn attack(&mut self, side: Side) -> Vec<MatchEvent> {
        self.phase = MatchPhase::Resolving;
        let (actor, target) = split(&mut self.combatants, side);
        let mut engagement = Engagement {
            actor,
            actor_side: side,
            target,
            data: &self.data,
            rng: &mut self.rng,
        };
        let mut events = resolve_attack(&mut engagement);
        events.extend(self.after_resolution());
        events
    }

    fn cast(
        &mut self,
        side: Side,
        index: u8,
        params: &CastParams,
    ) -> Result<Vec<MatchEvent>, ActionRejection> {
        self.skill_lock = true;
        let (caster, target) = split(&mut self.combatants, side);
        let mut ctx = AbilityContext {
            caster,
            caster_side: side,
            target,
            data: &self.data,
            rng: &mut self.rng,
            ids: &mut self.ids,
            shop: self.shop.as_ref(),
        };
        let outcome = ability::cast(&mut ctx, index, params);
        self.skill_lock = false;
        let mut events = outcome?;
        self.phase = MatchPhase::Resolving;
        events.extend(self.after_resolution());
        Ok(events)
    }

    /// Win check after a turn-consuming action, then the round-end hooks.
    fn after_resolution(&mut self) -> Vec<MatchEvent> {
        if let Some(result) = self.knockout() {
            return self.end(result);
        }
        self.finish_turn()
    }

    fn use_item(
        &mut self,
        side: Side,
        item_id: ItemId,
        slot: Option<u8>,
    ) -> Result<Vec<MatchEvent>, ActionRejection> {
        let rules = &self.data.rules;
        let c = &mut self.combatants[side.index()];
        let used = c.use_item(item_id, slot, rules)?;
        Ok(match used {
            ItemUse::Consumed { name, outcome } => {
                log::debug!("{} uses {}", side, name);
                consumable_events(side, c, &outcome)
            }
            ItemUse::Equipped { name, .. } => {
                let mut events = vec![MatchEvent::ItemEquipped { side, item: name }];
                events.push(status_event(side, c));
                events.extend(crate::combat::doll_event(side, c));
                events
            }
        })
    }

    fn buy(&mut self, side: Side, index: usize) -> Result<Vec<MatchEvent>, ActionRejection> {
        let c = &mut self.combatants[side.index()];
        let listed = c
            .shop
            .get(index)
            .ok_or(ActionRejection::ShopIndexOutOfRange(index))?;
        let price = purchase_price(c, listed);
        if c.coins < price {
            return Err(ActionRejection::InsufficientCoins {
                needed: price,
                available: c.coins,
            });
        }
        c.coins -= price;
        let listed = c.shop.remove(index);
        let item = self.ids.stamp(&listed);
        log::debug!("{} buys {} for {}", side, item.name, price);
        c.stow(item);
        Ok(vec![
            MatchEvent::CoinsChanged {
                side,
                coins: c.coins,
            },
            MatchEvent::ShopOffered {
                side,
                items: c.shop.clone(),
            },
        ])
    }

    fn reroll(&mut self, side: Side) -> Result<Vec<MatchEvent>, ActionRejection> {
        let cost = self.data.rules.reroll_cost;
        let coins = self.combatants[side.index()].coins;
        if coins < cost {
            return Err(ActionRejection::InsufficientCoins {
                needed: cost,
                available: coins,
            });
        }
        self.combatants[side.index()].coins -= cost;
        let mut events = vec![MatchEvent::CoinsChanged {
            side,
            coins: coins - cost,
        }];
        events.extend(self.refresh_shop(side));
        Ok(events)
    }

    fn level_up(&mut self, side: Side, mode: LevelUpMode) -> Result<Vec<MatchEvent>, ActionRejection> {
        let rules = &self.data.rules;
        let c = &mut self.combatants[side.index()];
        let level = c.level_up(mode, rules)?;
        log::info!("{} reaches level {} ({:?})", c.name, level, mode);
        let mut events = vec![MatchEvent::LevelChanged {
            side,
            level,
            exp: c.exp,
        }];
        if mode == LevelUpMode::Coins {
            events.push(MatchEvent::CoinsChanged {
                side,
                coins: c.coins,
            });
        }
        Ok(events)
    }

    fn forfeit(&mut self, side: Side) -> Vec<MatchEvent> {
        log::info!("{} forfeits", side);
        let c = &mut self.combatants[side.index()];
        c.hp = 0;
        let mut events = vec![hp_event(side, c)];
        events.extend(self.end(MatchResult::winner(side.other(), EndReason::Forfeit)));
        events
    }

    fn roll_offer(&mut self, side: Side) -> Vec<crate::item::Item> {
        self.shop
            .generate_offer(&self.combatants[side.index()], &self.data, &mut self.rng)
    }

    /// Replace `side`'s offer. A generator that produces unusable items
    /// aborts the match.
    fn refresh_shop(&mut self, side: Side) -> Vec<MatchEvent> {
        let offer = self.roll_offer(side);
        if let Err(e) = check_offer(&offer) {
            return self.abort(&e);
        }
        self.combatants[side.index()].shop = offer.clone();
        vec![MatchEvent::ShopOffered { side, items: offer }]
    }

    /// Knockout check: both down is a draw, otherwise the survivor wins.
    fn knockout(&self) -> Option<MatchResult> {
        let down = |s: Side| self.combatants[s.index()].is_defeated();
        match (down(Side::P1), down(Side::P2)) {
            (true, true) => Some(MatchResult::draw(EndReason::Knockout)),
            (true, false) => Some(MatchResult::winner(Side::P2, EndReason::Knockout)),
            (false, true) => Some(MatchResult::winner(Side::P1, EndReason::Knockout)),
            (false, false) => None,
        }
    }

    /// End the match as an aborted draw.
    pub fn abort(&mut self, error: &ConfigurationError) -> Vec<MatchEvent> {
        log::warn!("match aborted: {} ({})", error, error.code());
        self.end(MatchResult::draw(EndReason::Aborted {
            code: error.code().to_string(),
        }))
    }

    fn end(&mut self, result: MatchResult) -> Vec<MatchEvent> {
        if self.is_ended() {
            return Vec::new();
        }
        self.skill_lock = false;
        self.phase = MatchPhase::Ended {
            result: result.clone(),
        };
        log::info!(
            "match ended in round {}: {:?} ({:?})",
            self.round,
            result.winner,
            result.reason
        );
        if let Some(ledger) = &self.ledger {
            let seats = [Side::P1, Side::P2].map(|s| SeatRecord {
                account: self.participants[s.index()].account.clone(),
                job: self.participants[s.index()].job,
                cpu: self.participants[s.index()].controller == Controller::Cpu,
            });
            ledger.record_match_result(&MatchRecord {
                kind: self.config.kind,
                seats,
                result: result.clone(),
            });
        }
        vec![MatchEvent::MatchEnded { result }]
    }
}
