//! Request identifiers.
//!
//! Every [`Context`](crate::context::Context) carries a [`RequestId`]. Ids are
//! ULIDs, so they sort by the millisecond they were minted and can be handed
//! in from an upstream hop (the `resolve` command's `--request-id`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId(Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Adopt a propagated id. Falls back to a fresh one when `given` is absent
    /// or does not parse.
    #[must_use]
    pub fn from_propagated(given: Option<&str>) -> Self {
        match given.map(str::parse) {
            Some(Ok(id)) => id,
            _ => Self::new(),
        }
    }

    /// Milliseconds since the Unix epoch at which the id was minted.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s.trim()).map(Self)
    }
}

impl TryFrom<String> for RequestId {
    type Error = ulid::DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";

    #[test]
    fn test_propagated_id_is_adopted() {
        let id = RequestId::from_propagated(Some(KNOWN));
        assert_eq!(id.to_string(), KNOWN);
        assert_eq!(RequestId::from_propagated(Some(" 01ARZ3NDEKTSV4RRFFQ69G5FAV ")), id);
    }

    #[test]
    fn test_unusable_id_is_replaced() {
        let known = KNOWN.parse::<RequestId>().unwrap();
        for given in [None, Some(""), Some("not-a-ulid")] {
            assert_ne!(RequestId::from_propagated(given), known, "{given:?}");
        }
    }

    #[test]
    fn test_ids_order_by_mint_time() {
        let early = KNOWN.parse::<RequestId>().unwrap();
        let now = RequestId::new();
        assert!(early < now);
        assert!(early.timestamp_ms() < now.timestamp_ms());
    }

    #[test]
    fn test_serializes_as_string() {
        let id = KNOWN.parse::<RequestId>().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{KNOWN}\""));
        assert_eq!(serde_json::from_str::<RequestId>(&json).unwrap(), id);
        assert!(serde_json::from_str::<RequestId>("\"nope\"").is_err());
    }
}
