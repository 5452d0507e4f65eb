//! Outbound events and the transport seam they leave through.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::item::Item;
use crate::side::Side;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case", tag = "type")]
pub enum DamageKind {
    Attack,
    Arrow { critical: bool },
    Skill,
    Pursuit,
    Counter,
    DamageOverTime,
    SelfDestruct,
    Blocked,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum EndReason {
    Knockout,
    Forfeit,
    Aborted { code: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MatchResult {
    /// `None` is a draw.
    pub winner: Option<Side>,
    pub reason: EndReason,
}

impl MatchResult {
    pub fn winner(side: Side, reason: EndReason) -> Self {
        MatchResult {
            winner: Some(side),
            reason,
        }
    }

    pub fn draw(reason: EndReason) -> Self {
        MatchResult {
            winner: None,
            reason,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "event")]
pub enum MatchEvent {
    HpChanged {
        side: Side,
        hp: i32,
        max_hp: i32,
    },
    DamageDealt {
        target: Side,
        amount: i32,
        kind: DamageKind,
    },
    HealApplied {
        target: Side,
        amount: i32,
    },
    StatusChanged {
        side: Side,
        buffs: Vec<String>,
    },
    TurnChanged {
        active: Side,
        round: u32,
    },
    MatchEnded {
        result: MatchResult,
    },
    CoinsChanged {
        side: Side,
        coins: u32,
    },
    ManaChanged {
        side: Side,
        mana: i32,
    },
    LevelChanged {
        side: Side,
        level: u8,
        exp: u32,
    },
    AbilityCast {
        side: Side,
        index: u8,
        name: String,
    },
    ItemStolen {
        thief: Side,
        item: String,
    },
    ItemEquipped {
        side: Side,
        item: String,
    },
    ShopOffered {
        side: Side,
        items: Vec<Item>,
    },
    DollChanged {
        side: Side,
        durability: i32,
        broken: bool,
        rampage: bool,
    },
    SummonChanged {
        side: Side,
        summon: String,
        active: bool,
    },
}

impl MatchEvent {
    /// Who should see this event.
    pub fn recipient(&self) -> Recipient {
        match self {
            MatchEvent::ShopOffered { side, .. } => Recipient::Only(*side),
            _ => Recipient::Both,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum Recipient {
    Both,
    Only(Side),
}

impl Recipient {
    pub fn includes(self, side: Side) -> bool {
        match self {
            Recipient::Both => true,
            Recipient::Only(s) => s == side,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Envelope {
    pub recipient: Recipient,
    pub event: MatchEvent,
}

impl From<MatchEvent> for Envelope {
    fn from(event: MatchEvent) -> Self {
        Envelope {
            recipient: event.recipient(),
            event,
        }
    }
}

/// Message delivery to a connected participant.
pub trait Transport: Send + Sync {
    fn send(&self, side: Side, event: &MatchEvent);
}

/// Delivery for clients that poll the journal instead of holding a
/// connection: every send is only logged.
#[derive(Debug, Default)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn send(&self, side: Side, event: &MatchEvent) {
        log::trace!("to {}: {:?}", side, event);
    }
}

/// Fan envelopes out to their recipients, in order.
pub fn dispatch<T: Transport + ?Sized>(envelopes: &[Envelope], transport: &T) {
    for envelope in envelopes {
        for side in Side::ALL {
            if envelope.recipient.includes(side) {
                transport.send(side, &envelope.event);
            }
        }
    }
}
