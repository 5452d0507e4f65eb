use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use super::events::{Envelope, MatchEvent, Recipient};
use crate::side::Side;

pub const DEFAULT_PAGE_LIMIT: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct JournalEntry {
    pub seq: u64,
    pub recipient: Recipient,
    pub event: MatchEvent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct JournalPage {
    pub entries: Vec<JournalEntry>,
    /// Where the next page starts, when there is more.
    pub next_seq: Option<u64>,
    pub limit: usize,
}

/// Append-only record of every envelope a match has sent, numbered from 1.
/// Clients poll it to catch up on what they missed.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct EventJournal {
    entries: Vec<JournalEntry>,
    seq: u64,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, envelopes: &[Envelope]) {
        for envelope in envelopes {
            self.seq += 1;
            self.entries.push(JournalEntry {
                seq: self.seq,
                recipient: envelope.recipient,
                event: envelope.event.clone(),
            });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_seq(&self) -> u64 {
        self.seq
    }

    /// Everything appended so far, in order, as it was first delivered.
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.entries
            .iter()
            .map(|e| Envelope {
                recipient: e.recipient,
                event: e.event.clone(),
            })
            .collect()
    }

    /// Entries visible to `side` (or all of them) starting at `from_seq`.
    pub fn page(&self, side: Option<Side>, from_seq: Option<u64>, limit: Option<usize>) -> JournalPage {
        let from = from_seq.unwrap_or(1);
        let max = limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);
        let mut entries: Vec<JournalEntry> = self
            .entries
            .iter()
            .filter(|e| e.seq >= from)
            .filter(|e| side.map(|s| e.recipient.includes(s)).unwrap_or(true))
            .take(max.saturating_add(1))
            .cloned()
            .collect();
        let has_more = entries.len() > max;
        entries.truncate(max);
        let next_seq = if has_more {
            entries.last().map(|e| e.seq + 1)
        } else {
            None
        };
        JournalPage {
            entries,
            next_seq,
            limit: max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(round: u32) -> Envelope {
        MatchEvent::TurnChanged {
            active: Side::P1,
            round,
        }
        .into()
    }

    #[test]
    fn sequence_numbers_are_monotonic() {
        let mut journal = EventJournal::new();
        journal.append(&[turn(1), turn(2)]);
        journal.append(&[turn(3)]);
        let seqs: Vec<u64> = journal.page(None, None, None).entries.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn private_entries_are_filtered_per_side() {
        let mut journal = EventJournal::new();
        journal.append(&[
            MatchEvent::ShopOffered {
                side: Side::P1,
                items: vec![],
            }
            .into(),
            turn(1),
        ]);
        assert_eq!(journal.page(Some(Side::P2), None, None).entries.len(), 1);
        assert_eq!(journal.page(Some(Side::P1), None, None).entries.len(), 2);
    }

    #[test]
    fn paging_reports_next_seq() {
        let mut journal = EventJournal::new();
        journal.append(&(1..=5).map(turn).collect::<Vec<_>>());
        let page = journal.page(None, Some(2), Some(2));
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.next_seq, Some(4));
        let rest = journal.page(None, page.next_seq, Some(10));
        assert_eq!(rest.entries.len(), 2);
        assert_eq!(rest.next_seq, None);
    }
}
