use std::fmt;

use serde::{Deserialize, Serialize};

/// Organizational segment with its own goal configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TeamType {
    #[serde(rename = "CARTEIRA_0")]
    Carteira0,
    #[serde(rename = "CARTEIRA_I")]
    CarteiraI,
    #[serde(rename = "CARTEIRA_II")]
    CarteiraII,
    #[serde(rename = "CARTEIRA_III")]
    CarteiraIII,
    #[serde(rename = "CARTEIRA_IV")]
    CarteiraIV,
    #[serde(rename = "ER")]
    Er,
}

pub const ALL_TEAMS: [TeamType; 6] = [
    TeamType::Carteira0,
    TeamType::CarteiraI,
    TeamType::CarteiraII,
    TeamType::CarteiraIII,
    TeamType::CarteiraIV,
    TeamType::Er,
];

/// Platform team id that grants access to every team but maps to none.
pub const ADMIN_TEAM_ID: &str = "E6U1B1p";

struct TeamInfo {
    team: TeamType,
    label: &'static str,
    key: &'static str,
    platform_id: &'static str,
    tokens: &'static [&'static str],
}

const TEAM_TABLE: &[TeamInfo] = &[
    TeamInfo {
        team: TeamType::Carteira0,
        label: "Carteira 0",
        key: "CARTEIRA_0",
        platform_id: "E6F5k30",
        tokens: &["carteira0", "c0"],
    },
    TeamInfo {
        team: TeamType::CarteiraI,
        label: "Carteira I",
        key: "CARTEIRA_I",
        platform_id: "E6F4sCh",
        tokens: &["carteirai", "c1"],
    },
    TeamInfo {
        team: TeamType::CarteiraII,
        label: "Carteira II",
        key: "CARTEIRA_II",
        platform_id: "E6F4O1b",
        tokens: &["carteiraii", "c2"],
    },
    TeamInfo {
        team: TeamType::CarteiraIII,
        label: "Carteira III",
        key: "CARTEIRA_III",
        platform_id: "E6F4Xf2",
        tokens: &["carteiraiii", "c3"],
    },
    TeamInfo {
        team: TeamType::CarteiraIV,
        label: "Carteira IV",
        key: "CARTEIRA_IV",
        platform_id: "E6F41Bb",
        tokens: &["carteiraiv", "c4"],
    },
    TeamInfo {
        team: TeamType::Er,
        label: "ER",
        key: "ER",
        platform_id: "E500Cbu",
        tokens: &["er"],
    },
];

impl TeamType {
    fn info(self) -> &'static TeamInfo {
        // TEAM_TABLE is ordered like the enum.
        &TEAM_TABLE[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    /// Registry key, e.g. `CARTEIRA_II`.
    pub fn key(self) -> &'static str {
        self.info().key
    }

    pub fn platform_id(self) -> &'static str {
        self.info().platform_id
    }

    /// Resolve a platform team id (exact match).
    pub fn from_platform_id(id: &str) -> Option<Self> {
        let id = id.trim();
        TEAM_TABLE
            .iter()
            .find(|info| info.platform_id == id)
            .map(|info| info.team)
    }

    /// Lenient parse of a team label or key: `CARTEIRA_II`, `Carteira II`,
    /// `carteira-ii`, `c2`, or the platform id.
    pub fn from_label(raw: &str) -> Option<Self> {
        if let Some(team) = Self::from_platform_id(raw) {
            return Some(team);
        }
        let compact = compact_token(raw);
        if compact.is_empty() {
            return None;
        }
        TEAM_TABLE
            .iter()
            .find(|info| info.tokens.contains(&compact.as_str()))
            .map(|info| info.team)
    }

    /// Last-resort heuristic over a player identifier such as
    /// `joao.silva_c2` or `carteira-iii-0042`.
    pub fn from_player_id(player_id: &str) -> Option<Self> {
        let lower = player_id.to_ascii_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        // "carteira-iii" is split into two tokens; rejoin adjacent pairs.
        for pair in tokens.windows(2) {
            if pair[0] == "carteira" {
                let joined = format!("carteira{}", pair[1]);
                if let Some(info) = TEAM_TABLE.iter().find(|i| i.tokens[0] == joined) {
                    return Some(info.team);
                }
            }
        }
        tokens.iter().find_map(|token| {
            TEAM_TABLE
                .iter()
                .find(|info| info.tokens.contains(token))
                .map(|info| info.team)
        })
    }
}

impl fmt::Display for TeamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn compact_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
