//! Per-query lookup outcome.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Outcome of resolving one coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// Exactly one zone contains the point
    Resolved(String),
    /// Several zones contain the point (overlapping or shared borders).
    ///
    /// `candidates` is ordered by tie-break priority; `candidates[0] == zone`.
    Ambiguous {
        zone: String,
        candidates: Vec<String>,
    },
    /// Open ocean or otherwise uncovered
    NoMatch,
}

impl LookupResult {
    /// The resolved identifier, if any.
    pub fn zone(&self) -> Option<&str> {
        match self {
            LookupResult::Resolved(zone) => Some(zone),
            LookupResult::Ambiguous { zone, .. } => Some(zone),
            LookupResult::NoMatch => None,
        }
    }

    /// All matching identifiers when ambiguous, otherwise empty.
    pub fn candidates(&self) -> &[String] {
        match self {
            LookupResult::Ambiguous { candidates, .. } => candidates,
            _ => &[],
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, LookupResult::NoMatch)
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, LookupResult::Ambiguous { .. })
    }
}

impl Serialize for LookupResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LookupResult", 2)?;
        state.serialize_field("zone", &self.zone())?;
        state.serialize_field("candidates", self.candidates())?;
        state.end()
    }
}
