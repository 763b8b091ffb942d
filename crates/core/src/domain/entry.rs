// Pending Entry Domain Model

use super::error::{DomainError, Result};
use super::key::PipelineConfigKey;
use super::message::Message;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Ordering identifier of a pending entry (ULID)
///
/// The 26-character text form sorts lexicographically in creation order,
/// so stores can order by the column without decoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Ulid);

impl EntryId {
    pub fn parse(s: &str) -> Result<Self> {
        Ulid::from_string(s)
            .map(Self)
            .map_err(|e| DomainError::Validation(format!("invalid entry id {}: {}", s, e)))
    }

    /// Milliseconds since epoch encoded in the id
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl From<Ulid> for EntryId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One queued message plus its ordering metadata
///
/// Entries are never mutated after creation: they are inserted by `enqueue`
/// and deleted in the same step that hands them to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub id: EntryId,
    pub key: PipelineConfigKey,
    /// Partition label, fixed at enqueue time
    pub shard: Option<String>,
    pub message: Message,
}

impl PendingEntry {
    pub fn new(
        id: EntryId,
        key: PipelineConfigKey,
        shard: Option<String>,
        message: Message,
    ) -> Self {
        Self {
            id,
            key,
            shard,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_order_matches_creation_order() {
        let mut gen = ulid::Generator::new();
        let ids: Vec<EntryId> = (0..50).map(|_| EntryId::from(gen.generate().unwrap())).collect();

        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].to_string() < pair[1].to_string());
        }
    }

    #[test]
    fn test_parse_round_trips_text_form() {
        let id = EntryId::from(Ulid::from_parts(1_700_000_000_000, 42));
        let parsed = EntryId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.timestamp_ms(), 1_700_000_000_000);
        assert!(EntryId::parse("not-a-ulid").is_err());
    }
}
