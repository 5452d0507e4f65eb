use std::sync::Arc;

use either::{Either, Left, Right};
use rocket::futures::lock::Mutex;
use rocket::response::status::{BadRequest, NotFound};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};

use super::events::MatchEvent;
use super::journal::JournalPage;
use super::registry::{MatchId, MatchRegistry, MatchRequest};
use super::{Action, MatchSnapshot};
use crate::catalog::{AbilityDef, Job, JobTemplate};
use crate::ledger::{AccountSummary, MatchLedger};
use crate::session::{run_cpu_turns, simulate, MatchSummary};
use crate::side::Side;
use crate::status_messages::{new_status, Status};

pub type SharedRegistry = Arc<Mutex<MatchRegistry>>;

const DEFAULT_SIMULATION_TURNS: u32 = 500;
const MAX_SIMULATION_TURNS: u32 = 2_000;

fn simulation_turns(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_SIMULATION_TURNS)
        .min(MAX_SIMULATION_TURNS)
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CreatedMatch {
    pub id: MatchId,
    pub location: String,
    pub snapshot: MatchSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SideAction {
    pub side: Side,
    pub action: Action,
}

/// Events visible to the acting side, including any CPU replies, and the
/// state after them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    pub events: Vec<MatchEvent>,
    pub snapshot: MatchSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct JobInfo {
    pub template: JobTemplate,
    pub abilities: Vec<AbilityDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SimulationRequest {
    pub jobs: [Job; 2],
    pub seed: Option<u64>,
    pub max_turns: Option<u32>,
}

fn unknown_match(id: MatchId) -> NotFound<Json<Status>> {
    NotFound(new_status("MATCH_NOT_FOUND", format!("Match {} not found", id)))
}

/// Create a match between two participants. CPU sides that move first
/// play straight away.
#[openapi]
#[post("/matches", format = "json", data = "<request>")]
pub async fn create_match(
    registry: &State<SharedRegistry>,
    request: Json<MatchRequest>,
) -> Result<(rocket::http::Status, Json<CreatedMatch>), BadRequest<Json<Status>>> {
    let (created, pacing) = {
        let mut r = registry.lock().await;
        let pacing = r.config().pacing();
        (r.create(request.0), pacing)
    };
    let (id, game) = created.map_err(|e| BadRequest(new_status(e.code(), e.to_string())))?;
    run_cpu_turns(&game, pacing).await;
    let snapshot = game.lock().await.snapshot();
    Ok((
        rocket::http::Status::Created,
        Json(CreatedMatch {
            id,
            location: format!("/matches/{}", id),
            snapshot,
        }),
    ))
}

#[openapi]
#[get("/matches/<id>")]
pub async fn get_match(
    registry: &State<SharedRegistry>,
    id: MatchId,
) -> Result<Json<MatchSnapshot>, NotFound<Json<Status>>> {
    let game = registry.lock().await.get(id).ok_or_else(|| unknown_match(id))?;
    let snapshot = game.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// Submit one action for a side.
#[openapi]
#[post("/matches/<id>/actions", format = "json", data = "<request>")]
pub async fn submit_action(
    registry: &State<SharedRegistry>,
    id: MatchId,
    request: Json<SideAction>,
) -> Result<(rocket::http::Status, Json<ActionResponse>), Either<NotFound<Json<Status>>, BadRequest<Json<Status>>>>
{
    let (game, pacing) = {
        let r = registry.lock().await;
        (r.get(id), r.config().pacing())
    };
    let game = game.ok_or_else(|| Left(unknown_match(id)))?;
    let SideAction { side, action } = request.0;
    let mut envelopes = game
        .lock()
        .await
        .handle_action(side, action)
        .map_err(|e| Right(BadRequest(new_status(e.code(), e.to_string()))))?;
    envelopes.extend(run_cpu_turns(&game, pacing).await);
    let events = envelopes
        .into_iter()
        .filter(|e| e.recipient.includes(side))
        .map(|e| e.event)
        .collect();
    let snapshot = game.lock().await.snapshot();
    Ok((
        rocket::http::Status::Ok,
        Json(ActionResponse { events, snapshot }),
    ))
}

/// Page through a match's event journal, optionally as one side sees it.
#[openapi]
#[get("/matches/<id>/events?<side>&<from_seq>&<limit>")]
pub async fn list_match_events(
    registry: &State<SharedRegistry>,
    id: MatchId,
    side: Option<String>,
    from_seq: Option<u64>,
    limit: Option<usize>,
) -> Result<Json<JournalPage>, Either<NotFound<Json<Status>>, BadRequest<Json<Status>>>> {
    let side = match side.as_deref().map(str::parse::<Side>) {
        Some(Err(e)) => return Err(Right(BadRequest(new_status("INVALID_SIDE", e)))),
        Some(Ok(s)) => Some(s),
        None => None,
    };
    let game = registry
        .lock()
        .await
        .get(id)
        .ok_or_else(|| Left(unknown_match(id)))?;
    let page = game.lock().await.journal().page(side, from_seq, limit);
    Ok(Json(page))
}

/// Job templates and their abilities.
#[openapi]
#[get("/jobs")]
pub async fn list_jobs(registry: &State<SharedRegistry>) -> Json<Vec<JobInfo>> {
    let data = registry.lock().await.data();
    let jobs = data
        .templates()
        .map(|t| JobInfo {
            template: t.clone(),
            abilities: data.abilities_for(t.job).into_iter().cloned().collect(),
        })
        .collect();
    Json(jobs)
}

/// Run a headless CPU-vs-CPU match.
#[openapi]
#[post("/simulate", format = "json", data = "<request>")]
pub async fn simulate_match(
    registry: &State<SharedRegistry>,
    request: Json<SimulationRequest>,
) -> Result<Json<MatchSummary>, BadRequest<Json<Status>>> {
    let (data, seed) = {
        let r = registry.lock().await;
        (r.data(), request.seed.unwrap_or_else(|| r.config().seed_for(0)))
    };
    let turns = simulation_turns(request.max_turns);
    simulate(data, request.jobs, seed, turns)
        .map(Json)
        .map_err(|e| BadRequest(new_status(e.code(), e.to_string())))
}

#[openapi]
#[get("/accounts/<account>")]
pub async fn get_account(
    registry: &State<SharedRegistry>,
    account: &str,
) -> Result<Json<AccountSummary>, NotFound<Json<Status>>> {
    let ledger = registry.lock().await.ledger();
    ledger.summary(account).map(Json).ok_or_else(|| {
        NotFound(new_status(
            "ACCOUNT_NOT_FOUND",
            format!("Account {} has no recorded matches", account),
        ))
    })
}
