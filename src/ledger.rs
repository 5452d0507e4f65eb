//! Result recording and per-job ratings.
//!
//! The match engine only talks to [`MatchLedger`]. [`MemoryLedger`] keeps
//! everything in process memory, which is all the server needs since
//! accounts do not outlive it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::battle::events::MatchResult;
use crate::catalog::Job;
use crate::config::MatchKind;
use crate::side::Side;

pub const DEFAULT_RATING: i32 = 1000;
pub const MIN_RATING: i32 = 500;
pub const RANKED_K: f64 = 32.0;
pub const CPU_K: f64 = 16.0;
pub const CPU_RATING: i32 = 1000;

pub type AccountId = String;

/// One seat as the ledger sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SeatRecord {
    pub account: Option<AccountId>,
    pub job: Job,
    pub cpu: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MatchRecord {
    pub kind: MatchKind,
    pub seats: [SeatRecord; 2],
    pub result: MatchResult,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct JobRecord {
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Default for JobRecord {
    fn default() -> Self {
        JobRecord {
            rating: DEFAULT_RATING,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct AccountSummary {
    pub account: AccountId,
    pub jobs: BTreeMap<Job, JobRecord>,
}

pub trait MatchLedger: Send + Sync {
    fn record_match_result(&self, record: &MatchRecord);
    fn summary(&self, account: &str) -> Option<AccountSummary>;
}

/// Expected score of a player rated `ra` against `rb`.
pub fn expected_score(ra: i32, rb: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(rb - ra) / 400.0))
}

pub fn next_rating(rating: i32, opponent: i32, score: f64, k: f64) -> i32 {
    let updated = f64::from(rating) + k * (score - expected_score(rating, opponent));
    (updated.round() as i32).max(MIN_RATING)
}

fn score_for(side: Side, result: &MatchResult) -> f64 {
    match result.winner {
        None => 0.5,
        Some(w) if w == side => 1.0,
        Some(_) => 0.0,
    }
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    accounts: Mutex<HashMap<AccountId, AccountSummary>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn tally(record: &mut JobRecord, score: f64) {
        if score >= 1.0 {
            record.wins += 1;
        } else if score <= 0.0 {
            record.losses += 1;
        } else {
            record.draws += 1;
        }
    }
}

impl MatchLedger for MemoryLedger {
    fn record_match_result(&self, record: &MatchRecord) {
        let mut accounts = match self.accounts.lock() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        };
        let rating_of = |accounts: &HashMap<AccountId, AccountSummary>, seat: &SeatRecord| {
            seat.account
                .as_ref()
                .and_then(|a| accounts.get(a))
                .and_then(|s| s.jobs.get(&seat.job))
                .map(|r| r.rating)
                .unwrap_or(DEFAULT_RATING)
        };
        let before = [
            rating_of(&*accounts, &record.seats[0]),
            rating_of(&*accounts, &record.seats[1]),
        ];
        for side in Side::ALL {
            let seat = &record.seats[side.index()];
            let Some(account) = seat.account.as_ref().filter(|_| !seat.cpu) else {
                continue;
            };
            let score = score_for(side, &record.result);
            let new_rating = match record.kind {
                MatchKind::Ranked => Some(next_rating(
                    before[side.index()],
                    before[side.other().index()],
                    score,
                    RANKED_K,
                )),
                MatchKind::Cpu => Some(next_rating(before[side.index()], CPU_RATING, score, CPU_K)),
                MatchKind::Room => None,
            };
            let summary = accounts
                .entry(account.clone())
                .or_insert_with(|| AccountSummary {
                    account: account.clone(),
                    jobs: BTreeMap::new(),
                });
            let job = summary.jobs.entry(seat.job).or_default();
            Self::tally(job, score);
            if let Some(r) = new_rating {
                log::info!("{} ({}) rating {} -> {}", account, seat.job.name(), job.rating, r);
                job.rating = r;
            }
        }
    }

    fn summary(&self, account: &str) -> Option<AccountSummary> {
        let accounts = match self.accounts.lock() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        };
        accounts.get(account).cloned()
    }
}
