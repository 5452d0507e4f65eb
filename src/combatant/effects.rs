//! Per-combatant status bookkeeping.
//!
//! Four categories live side by side and each has its own clock:
//!
//! - timed buffs tick at the owner's round start;
//! - damage over time ticks at the end of the afflicted side's own turn;
//! - freeze stacks tick at the round start of the side that applied them;
//! - summons tick per round or per trigger, never both.
//!
//! An entry is dropped the moment its counter reaches zero.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::side::Side;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum BuffKind {
    AttackUp,
    DefenseUp,
    AttackDown,
    DefenseDown,
    SkillSeal,
}

impl BuffKind {
    pub fn is_debuff(self) -> bool {
        matches!(
            self,
            BuffKind::AttackDown | BuffKind::DefenseDown | BuffKind::SkillSeal
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct TimedBuff {
    pub kind: BuffKind,
    pub magnitude: i32,
    pub remaining_rounds: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct DamageOverTime {
    pub name: String,
    pub power: i32,
    pub remaining_ticks: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct FreezeStack {
    pub attack_penalty: i32,
    pub remaining_rounds: u32,
    /// The side whose round start ages this stack.
    pub owner: Side,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum Shikigami {
    Onibi,
    Nekomata,
    Genbu,
    KarasuTengu,
    Kyubi,
    Hakuryu,
}

impl Shikigami {
    pub const NOVICE: [Shikigami; 4] = [
        Shikigami::Onibi,
        Shikigami::Nekomata,
        Shikigami::Genbu,
        Shikigami::KarasuTengu,
    ];
    pub const ALL: [Shikigami; 6] = [
        Shikigami::Onibi,
        Shikigami::Nekomata,
        Shikigami::Genbu,
        Shikigami::KarasuTengu,
        Shikigami::Kyubi,
        Shikigami::Hakuryu,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Shikigami::Onibi => "Onibi",
            Shikigami::Nekomata => "Nekomata",
            Shikigami::Genbu => "Genbu",
            Shikigami::KarasuTengu => "Karasu-tengu",
            Shikigami::Kyubi => "Kyubi",
            Shikigami::Hakuryu => "Hakuryu",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum SummonLifetime {
    Rounds(u32),
    Triggers(u32),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SummonEffect {
    pub name: Shikigami,
    pub lifetime: SummonLifetime,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct StatusEffectLedger {
    pub buffs: Vec<TimedBuff>,
    pub dots: Vec<DamageOverTime>,
    pub freeze: Vec<FreezeStack>,
    pub summons: Vec<SummonEffect>,
}

impl StatusEffectLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_buff(&mut self, kind: BuffKind, magnitude: i32, rounds: u32) {
        if rounds == 0 {
            return;
        }
        self.buffs.push(TimedBuff {
            kind,
            magnitude,
            remaining_rounds: rounds,
        });
    }

    pub fn total(&self, kind: BuffKind) -> i32 {
        self.buffs
            .iter()
            .filter(|b| b.kind == kind)
            .map(|b| b.magnitude)
            .sum()
    }

    pub fn attack_delta(&self) -> i32 {
        self.total(BuffKind::AttackUp) - self.total(BuffKind::AttackDown)
    }

    pub fn defense_delta(&self) -> i32 {
        self.total(BuffKind::DefenseUp) - self.total(BuffKind::DefenseDown)
    }

    pub fn has(&self, kind: BuffKind) -> bool {
        self.buffs.iter().any(|b| b.kind == kind)
    }

    pub fn is_sealed(&self) -> bool {
        self.has(BuffKind::SkillSeal)
    }

    /// Age every timed buff by one round; returns what expired.
    pub fn decrement_buffs(&mut self) -> Vec<TimedBuff> {
        let mut expired = Vec::new();
        for b in self.buffs.iter_mut() {
            b.remaining_rounds = b.remaining_rounds.saturating_sub(1);
        }
        self.buffs.retain(|b| {
            if b.remaining_rounds == 0 {
                expired.push(b.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn remove_debuffs(&mut self) -> usize {
        let before = self.buffs.len();
        self.buffs.retain(|b| !b.kind.is_debuff());
        before - self.buffs.len()
    }

    pub fn clear_buffs(&mut self) {
        self.buffs.clear();
    }

    pub fn add_dot(&mut self, name: &str, power: i32, ticks: u32) {
        if ticks == 0 {
            return;
        }
        self.dots.push(DamageOverTime {
            name: name.to_string(),
            power,
            remaining_ticks: ticks,
        });
    }

    /// Apply one tick of every DOT. Returns the total damage due.
    pub fn tick_dots(&mut self) -> i32 {
        let mut damage = 0;
        for d in self.dots.iter_mut() {
            damage += d.power;
            d.remaining_ticks = d.remaining_ticks.saturating_sub(1);
        }
        self.dots.retain(|d| d.remaining_ticks > 0);
        damage
    }

    pub fn clear_dots(&mut self) {
        self.dots.clear();
    }

    pub fn add_freeze(&mut self, attack_penalty: i32, rounds: u32, owner: Side) {
        if rounds == 0 {
            return;
        }
        self.freeze.push(FreezeStack {
            attack_penalty,
            remaining_rounds: rounds,
            owner,
        });
    }

    pub fn freeze_penalty(&self) -> i32 {
        self.freeze.iter().map(|f| f.attack_penalty).sum()
    }

    /// Age only the stacks applied by `owner`.
    pub fn decrement_freeze_owned_by(&mut self, owner: Side) -> usize {
        let before = self.freeze.len();
        for f in self.freeze.iter_mut().filter(|f| f.owner == owner) {
            f.remaining_rounds = f.remaining_rounds.saturating_sub(1);
        }
        self.freeze.retain(|f| f.remaining_rounds > 0);
        before - self.freeze.len()
    }

    /// Add a summon, refreshing an existing entry of the same name.
    pub fn summon(&mut self, name: Shikigami, lifetime: SummonLifetime) {
        self.summons.retain(|s| s.name != name);
        self.summons.push(SummonEffect { name, lifetime });
    }

    pub fn has_summon(&self, name: Shikigami) -> bool {
        self.summons.iter().any(|s| s.name == name)
    }

    /// Age round-bound summons. Trigger-bound summons are left alone.
    pub fn decrement_summon_rounds(&mut self) -> bool {
        let before = self.summons.clone();
        for s in self.summons.iter_mut() {
            if let SummonLifetime::Rounds(r) = &mut s.lifetime {
                *r = r.saturating_sub(1);
            }
        }
        self.summons
            .retain(|s| !matches!(s.lifetime, SummonLifetime::Rounds(0)));
        before != self.summons
    }

    /// Spend one trigger of a trigger-bound summon. False when none is live.
    pub fn consume_trigger(&mut self, name: Shikigami) -> bool {
        let mut fired = false;
        for s in self.summons.iter_mut().filter(|s| s.name == name) {
            if let SummonLifetime::Triggers(t) = &mut s.lifetime {
                if *t > 0 {
                    *t -= 1;
                    fired = true;
                }
            }
        }
        self.summons
            .retain(|s| !matches!(s.lifetime, SummonLifetime::Triggers(0)));
        fired
    }

    /// Short labels for the status bar.
    pub fn labels(&self) -> Vec<String> {
        let mut out = Vec::new();
        for b in &self.buffs {
            let label = match b.kind {
                BuffKind::AttackUp => format!("ATK+{} ({}R)", b.magnitude, b.remaining_rounds),
                BuffKind::DefenseUp => format!("DEF+{} ({}R)", b.magnitude, b.remaining_rounds),
                BuffKind::AttackDown => format!("ATK-{} ({}R)", b.magnitude, b.remaining_rounds),
                BuffKind::DefenseDown => format!("DEF-{} ({}R)", b.magnitude, b.remaining_rounds),
                BuffKind::SkillSeal => format!("Sealed ({}R)", b.remaining_rounds),
            };
            out.push(label);
        }
        for d in &self.dots {
            out.push(format!("{} {}x{}", d.name, d.power, d.remaining_ticks));
        }
        for f in &self.freeze {
            out.push(format!("Freeze -{} ({}R)", f.attack_penalty, f.remaining_rounds));
        }
        for s in &self.summons {
            match s.lifetime {
                SummonLifetime::Rounds(r) => out.push(format!("{} ({}R)", s.name.name(), r)),
                SummonLifetime::Triggers(t) => out.push(format!("{} ({}x)", s.name.name(), t)),
            }
        }
        out
    }
}
