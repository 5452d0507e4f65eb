//! # Duel Arena
//!
//! An authoritative match engine for a two-player, turn-based duel between
//! job classes, served over a small HTTP API.
//!
//! ## Overview
//!
//! Each match is a [`battle::Match`]: a sequential state machine that
//! validates every inbound action, resolves it, and emits ordered events.
//! Content (jobs, abilities, items) is immutable [`catalog::GameData`]
//! shared by reference, randomness is a per-match seeded stream, and CPU
//! opponents go through exactly the same validation as humans.
//!
//! ## Architecture
//!
//! The API is built on Rocket with OpenAPI documentation. Matches live in a
//! registry behind `Arc<Mutex<T>>` so concurrent requests against different
//! matches never touch the same state.

// Rocket makes this a bit tricky to support
#![allow(clippy::module_name_repetitions)]
#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};

pub mod ability;
pub mod battle;
pub mod catalog;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod cpu;
pub mod error;
pub mod item;
pub mod ledger;
pub mod rng;
pub mod session;
pub mod shop;
pub mod side;
pub mod status_messages;

/// Initializes and configures the Rocket web server with all routes and OpenAPI documentation.
///
/// # Example
///
/// ```no_run
/// use duel_arena::rocket_initialize;
///
/// #[rocket::main]
/// async fn main() {
///     rocket_initialize().launch().await.expect("Failed to launch rocket");
/// }
/// ```
pub fn rocket_initialize() -> rocket::Rocket<rocket::Build> {
    use crate::battle::endpoints::{
        create_match, get_account, get_match, list_jobs, list_match_events, simulate_match,
        submit_action,
    };
    use crate::battle::endpoints::{
        okapi_add_operation_for_create_match_, okapi_add_operation_for_get_account_,
        okapi_add_operation_for_get_match_, okapi_add_operation_for_list_jobs_,
        okapi_add_operation_for_list_match_events_, okapi_add_operation_for_simulate_match_,
        okapi_add_operation_for_submit_action_,
    };
    use crate::battle::registry::MatchRegistry;

    #[allow(clippy::no_effect_underscore_binding)]
    let _ = env_logger::try_init();

    let config = config::ServerConfig::from_env();
    let registry = MatchRegistry::new(config, Arc::new(catalog::GameData::standard()));

    rocket::build()
        .mount(
            "/",
            openapi_get_routes![
                create_match,
                get_match,
                submit_action,
                list_match_events,
                list_jobs,
                simulate_match,
                get_account
            ],
        )
        .mount("/swagger", make_swagger_ui(&get_docs()))
        .manage(Arc::new(rocket::futures::lock::Mutex::new(registry)))
}

fn get_docs() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}
