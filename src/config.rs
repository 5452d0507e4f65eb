//! Per-match and per-process settings.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::side::Side;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum FirstSide {
    /// Drawn from the match seed.
    Random,
    Fixed(Side),
}

/// Selects how the ledger records the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum MatchKind {
    Ranked,
    Room,
    Cpu,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum CpuPacing {
    Headless,
    Delay(u64),
}

impl CpuPacing {
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            CpuPacing::Headless
        } else {
            CpuPacing::Delay(ms)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MatchConfig {
    pub seed: u64,
    pub first_side: FirstSide,
    pub kind: MatchKind,
    pub pacing: CpuPacing,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            seed: 0,
            first_side: FirstSide::Fixed(Side::P1),
            kind: MatchKind::Room,
            pacing: CpuPacing::Headless,
        }
    }
}

/// Process-wide settings read once at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub cpu_delay_ms: u64,
    pub default_seed: Option<u64>,
}

fn parse_var(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("ignoring {}={:?}: {}", name, raw, e);
            None
        }
    }
}

impl ServerConfig {
    /// Reads `DUEL_CPU_DELAY_MS` and `DUEL_DEFAULT_SEED`.
    pub fn from_env() -> Self {
        ServerConfig {
            cpu_delay_ms: parse_var("DUEL_CPU_DELAY_MS").unwrap_or(0),
            default_seed: parse_var("DUEL_DEFAULT_SEED"),
        }
    }

    pub fn pacing(&self) -> CpuPacing {
        CpuPacing::from_millis(self.cpu_delay_ms)
    }

    /// Seed for a match created without one. With a base seed configured the
    /// sequence is reproducible; otherwise it comes from the clock.
    pub fn seed_for(&self, match_number: u64) -> u64 {
        match self.default_seed {
            Some(base) => base.wrapping_add(match_number),
            None => {
                let nanos = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0);
                nanos ^ match_number.rotate_left(32)
            }
        }
    }
}
