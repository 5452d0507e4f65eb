use std::collections::HashMap;
use std::sync::Arc;

use rocket::futures::lock::Mutex;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use super::events::{LogTransport, Transport};
use super::{Match, Participant};
use crate::catalog::GameData;
use crate::config::{FirstSide, MatchConfig, MatchKind, ServerConfig};
use crate::error::ConfigurationError;
use crate::ledger::MemoryLedger;
use crate::shop::{ShopGenerator, StandardShop};
use crate::side::Side;

pub type MatchId = u64;
pub type SharedMatch = Arc<Mutex<Match>>;

/// Finished matches kept around for late journal reads.
const FINISHED_KEPT: usize = 64;

/// What a client sends to open a match.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MatchRequest {
    pub participants: [Participant; 2],
    pub kind: MatchKind,
    pub seed: Option<u64>,
    pub first_side: Option<FirstSide>,
}

/// Every live and finished match the server knows about, plus the shared
/// content and ledger they are built from.
pub struct MatchRegistry {
    matches: HashMap<MatchId, SharedMatch>,
    next_id: MatchId,
    config: ServerConfig,
    data: Arc<GameData>,
    shop: Arc<dyn ShopGenerator>,
    ledger: Arc<MemoryLedger>,
    transport: Arc<dyn Transport>,
}

impl MatchRegistry {
    pub fn new(config: ServerConfig, data: Arc<GameData>) -> Self {
        MatchRegistry {
            matches: HashMap::new(),
            next_id: 0,
            config,
            data,
            shop: Arc::new(StandardShop),
            ledger: Arc::new(MemoryLedger::new()),
            transport: Arc::new(LogTransport),
        }
    }

    /// Deliver the events of every match created from now on through
    /// `transport`.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn create(&mut self, request: MatchRequest) -> Result<(MatchId, SharedMatch), ConfigurationError> {
        self.evict_finished();
        self.next_id += 1;
        let id = self.next_id;
        let config = MatchConfig {
            seed: request.seed.unwrap_or_else(|| self.config.seed_for(id)),
            first_side: request.first_side.unwrap_or(match request.kind {
                MatchKind::Cpu => FirstSide::Fixed(Side::P1),
                _ => FirstSide::Random,
            }),
            kind: request.kind,
            pacing: self.config.pacing(),
        };
        let game = Match::new(
            Arc::clone(&self.data),
            Arc::clone(&self.shop),
            config,
            request.participants,
        )?
        .with_ledger(self.ledger.clone())
        .with_transport(Arc::clone(&self.transport));
        let shared = Arc::new(Mutex::new(game));
        self.matches.insert(id, Arc::clone(&shared));
        log::info!("registered match {}", id);
        Ok((id, shared))
    }

    /// Drop the oldest finished matches beyond [`FINISHED_KEPT`]. Matches
    /// locked by a request in flight are left alone.
    fn evict_finished(&mut self) {
        let mut finished: Vec<MatchId> = self
            .matches
            .iter()
            .filter(|(_, m)| m.try_lock().map(|g| g.is_ended()).unwrap_or(false))
            .map(|(id, _)| *id)
            .collect();
        if finished.len() <= FINISHED_KEPT {
            return;
        }
        finished.sort_unstable();
        let stale = finished.len() - FINISHED_KEPT;
        for id in finished.into_iter().take(stale) {
            self.matches.remove(&id);
        }
        log::debug!("evicted {} finished matches", stale);
    }

    pub fn get(&self, id: MatchId) -> Option<SharedMatch> {
        self.matches.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn data(&self) -> Arc<GameData> {
        Arc::clone(&self.data)
    }

    pub fn ledger(&self) -> Arc<MemoryLedger> {
        Arc::clone(&self.ledger)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::events::MatchEvent;
    use crate::battle::Action;
    use crate::catalog::Job;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Outbox {
        sent: StdMutex<Vec<(Side, MatchEvent)>>,
    }

    impl Transport for Outbox {
        fn send(&self, side: Side, event: &MatchEvent) {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((side, event.clone()));
            }
        }
    }

    fn request(kind: MatchKind) -> MatchRequest {
        MatchRequest {
            participants: [
                Participant::human("ann", Job::Warrior),
                Participant::human("bob", Job::Knight),
            ],
            kind,
            seed: Some(7),
            first_side: None,
        }
    }

    #[test]
    fn ids_are_sequential_and_matches_retrievable() {
        let mut registry = MatchRegistry::new(ServerConfig::default(), Arc::new(GameData::standard()));
        let (a, _) = registry.create(request(MatchKind::Room)).expect("a");
        let (b, _) = registry.create(request(MatchKind::Ranked)).expect("b");
        assert_eq!((a, b), (1, 2));
        assert_eq!(registry.len(), 2);
        assert!(registry.get(a).is_some());
        assert!(registry.get(99).is_none());
    }

    #[test]
    fn events_reach_only_their_recipients() {
        let outbox = Arc::new(Outbox::default());
        let mut registry = MatchRegistry::new(ServerConfig::default(), Arc::new(GameData::standard()))
            .with_transport(outbox.clone());
        let mut req = request(MatchKind::Room);
        req.first_side = Some(FirstSide::Fixed(Side::P1));
        let (_, shared) = registry.create(req).expect("match");
        let mut game = shared.try_lock().expect("unlocked");
        let out = game.handle_action(Side::P1, Action::OpenShop).expect("shop");
        let sent = outbox.sent.lock().expect("outbox");
        let to_p1 = sent.iter().filter(|(s, _)| *s == Side::P1).count();
        let to_p2 = sent.iter().filter(|(s, _)| *s == Side::P2).count();
        // opening turn broadcast plus one private offer each
        assert_eq!(to_p2, 2);
        assert_eq!(to_p1, 2 + out.len());
        assert!(!sent.iter().any(|(to, e)| matches!(
            e,
            MatchEvent::ShopOffered { side, .. } if *side != *to
        )));
    }

    #[test]
    fn only_the_oldest_finished_matches_are_evicted() {
        let mut registry = MatchRegistry::new(ServerConfig::default(), Arc::new(GameData::standard()));
        let (live, _) = registry.create(request(MatchKind::Room)).expect("live");
        for _ in 0..FINISHED_KEPT + 3 {
            let (_, shared) = registry.create(request(MatchKind::Room)).expect("match");
            let mut game = shared.try_lock().expect("unlocked");
            game.handle_action(Side::P2, Action::Forfeit).expect("forfeit");
        }
        registry.create(request(MatchKind::Room)).expect("next");
        assert!(registry.get(live).is_some());
        assert!(registry.get(2).is_none());
        assert!(registry.get(4).is_none());
        assert!(registry.get(5).is_some());
        assert_eq!(registry.len(), FINISHED_KEPT + 2);
    }
}
