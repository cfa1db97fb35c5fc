// Team identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Canonical team identity. The abbreviation is a display attribute only;
/// two teams are the same team iff their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A franchise as loaded from the team source. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Short display code (e.g. "MTL"). Not used for identity.
    pub abbreviation: String,
    /// City or market name.
    pub market: String,
    /// Nickname (e.g. "Canadiens").
    pub name: String,
    pub conference: String,
    pub division: String,
    /// Logo reference for the display layer (path or URL).
    pub logo: String,
}

impl Team {
    /// "Market Name", e.g. "Montreal Canadiens".
    pub fn full_name(&self) -> String {
        if self.market.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.market, self.name)
        }
    }
}

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Team {}

impl Hash for Team {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation)
    }
}
