//! Driving CPU-controlled sides, paced for live play or headless.

use std::sync::Arc;
use std::time::Duration;

use rocket::futures::lock::Mutex;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::battle::events::{Envelope, MatchResult};
use crate::battle::{Action, Match, Participant};
use crate::catalog::{GameData, Job};
use crate::config::{CpuPacing, FirstSide, MatchConfig, MatchKind};
use crate::cpu;
use crate::error::ConfigurationError;
use crate::shop::StandardShop;
use crate::side::Side;

/// Free actions a CPU may take in one turn before it must attack.
pub const MAX_CPU_SIDE_ACTIONS: u8 = 8;

/// Upper bound on CPU steps per drive, in case two CPUs stall each other.
const DRIVE_LIMIT: usize = 10_000;

/// Feeds CPU decisions into a match, one action per step.
#[derive(Debug, Default)]
pub struct CpuDriver {
    turn: Option<(u32, Side)>,
    side_actions: u8,
}

impl CpuDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide and submit one action for the CPU whose move it is. Returns
    /// `None` when no CPU is to move.
    pub fn step(&mut self, game: &mut Match) -> Option<Vec<Envelope>> {
        let side = game.cpu_to_move()?;
        let turn = (game.round(), side);
        if self.turn != Some(turn) {
            self.turn = Some(turn);
            self.side_actions = 0;
        }
        let action = if self.side_actions >= MAX_CPU_SIDE_ACTIONS {
            Action::Attack
        } else {
            cpu::decide(game, side)
        };
        if !action.consumes_turn() {
            self.side_actions += 1;
        }
        match game.handle_action(side, action) {
            Ok(out) => Some(out),
            Err(e) => {
                log::debug!("cpu {} fell back to attack after {}", side, e.code());
                game.handle_action(side, Action::Attack).ok()
            }
        }
    }
}

/// Run CPU turns until a human is to move or the match ends.
pub fn drive_cpu_blocking(game: &mut Match) -> Vec<Envelope> {
    let mut driver = CpuDriver::new();
    let mut out = Vec::new();
    for _ in 0..DRIVE_LIMIT {
        match driver.step(game) {
            Some(envelopes) => out.extend(envelopes),
            None => return out,
        }
    }
    log::warn!("cpu drive stopped after {} steps", DRIVE_LIMIT);
    out
}

/// Async version of [`drive_cpu_blocking`] that waits before every CPU
/// action when paced. The lock is released while waiting.
pub async fn run_cpu_turns(game: &Mutex<Match>, pacing: CpuPacing) -> Vec<Envelope> {
    let mut driver = CpuDriver::new();
    let mut out = Vec::new();
    for _ in 0..DRIVE_LIMIT {
        if let CpuPacing::Delay(ms) = pacing {
            if game.lock().await.cpu_to_move().is_none() {
                break;
            }
            rocket::tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        let mut guard = game.lock().await;
        match driver.step(&mut guard) {
            Some(envelopes) => out.extend(envelopes),
            None => break,
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MatchSummary {
    /// `None` if the turn limit was reached first.
    pub result: Option<MatchResult>,
    pub rounds: u32,
    pub turns: u32,
    pub hp: [i32; 2],
}

/// Play a headless CPU-vs-CPU match to the end or `max_turns`.
pub fn simulate(
    data: Arc<GameData>,
    jobs: [Job; 2],
    seed: u64,
    max_turns: u32,
) -> Result<MatchSummary, ConfigurationError> {
    let _ = env_logger::try_init();
    let config = MatchConfig {
        seed,
        first_side: FirstSide::Random,
        kind: MatchKind::Cpu,
        pacing: CpuPacing::Headless,
    };
    let participants = [
        Participant::cpu("cpu-1", jobs[0]),
        Participant::cpu("cpu-2", jobs[1]),
    ];
    let mut game = Match::new(data, Arc::new(StandardShop), config, participants)?;
    let mut driver = CpuDriver::new();
    let mut turns = 0;
    while turns < max_turns {
        let before = (game.round(), game.active());
        if driver.step(&mut game).is_none() {
            break;
        }
        if game.is_ended() || (game.round(), game.active()) != before {
            turns += 1;
        }
    }
    Ok(MatchSummary {
        result: game.result().cloned(),
        rounds: game.round(),
        turns,
        hp: Side::ALL.map(|s| game.combatant(s).hp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_is_reproducible() {
        let data = Arc::new(GameData::standard());
        let a = simulate(Arc::clone(&data), [Job::Warrior, Job::Knight], 42, 400).expect("sim");
        let b = simulate(data, [Job::Warrior, Job::Knight], 42, 400).expect("sim");
        assert_eq!(a, b);
        assert!(a.result.is_some());
    }

    #[test]
    fn blocking_drive_stops_at_the_human() {
        let mut game = Match::new(
            Arc::new(GameData::standard()),
            Arc::new(StandardShop),
            MatchConfig {
                first_side: FirstSide::Fixed(Side::P2),
                ..MatchConfig::default()
            },
            [
                Participant::human("ann", Job::Priest),
                Participant::cpu("cpu", Job::Warrior),
            ],
        )
        .expect("match");
        let out = drive_cpu_blocking(&mut game);
        assert!(!out.is_empty());
        assert_eq!(game.active(), Side::P1);
        assert_eq!(game.cpu_to_move(), None);
    }

    #[test]
    fn paced_driver_runs_under_tokio() {
        let mut game = Match::new(
            Arc::new(GameData::standard()),
            Arc::new(StandardShop),
            MatchConfig::default(),
            [
                Participant::cpu("cpu", Job::Knight),
                Participant::human("bob", Job::Mage),
            ],
        )
        .expect("match");
        game.combatant_mut(Side::P1).shop.clear();
        let game = Mutex::new(game);
        let rt = rocket::tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let out = rt.block_on(run_cpu_turns(&game, CpuPacing::Delay(1)));
        assert!(!out.is_empty());
        let game = rt.block_on(game.lock());
        assert_eq!(game.active(), Side::P2);
    }
}
