//! Source families.
//!
//! The five independent external data categories. The set is closed:
//! every snapshot carries exactly one record per family.

use serde::{Deserialize, Serialize};

/// One of the five external data categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFamily {
    /// Spot price board (CEPEA/ESALQ).
    PriceBoard,
    /// Exchange-traded futures (B3 contracts via Yahoo chart API).
    Futures,
    /// USD/BRL exchange rate.
    Currency,
    /// Daily rainfall from INMET stations.
    Rainfall,
    /// Crop production estimates (CONAB).
    Production,
}

impl SourceFamily {
    /// All families in collection order.
    pub const ALL: [Self; 5] = [
        Self::PriceBoard,
        Self::Futures,
        Self::Currency,
        Self::Rainfall,
        Self::Production,
    ];

    /// Snapshot key for this family.
    pub const fn key(self) -> &'static str {
        match self {
            Self::PriceBoard => "cepea",
            Self::Futures => "b3",
            Self::Currency => "usd",
            Self::Rainfall => "inmet",
            Self::Production => "conab",
        }
    }

    /// Real-source provenance tag.
    pub const fn real_tag(self) -> &'static str {
        match self {
            Self::PriceBoard => "CEPEA/ESALQ",
            Self::Futures => "B3/YAHOO",
            Self::Currency => "BACEN/YAHOO",
            Self::Rainfall => "INMET",
            Self::Production => "CONAB",
        }
    }

    /// Prefix used for synthetic tags (`<prefix>_SIMULADO`).
    pub const fn synthetic_prefix(self) -> &'static str {
        match self {
            Self::PriceBoard => "CEPEA",
            Self::Futures => "B3",
            Self::Currency => "USD",
            Self::Rainfall => "INMET",
            Self::Production => "CONAB",
        }
    }

    /// Look up a family by its snapshot key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl std::fmt::Display for SourceFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
