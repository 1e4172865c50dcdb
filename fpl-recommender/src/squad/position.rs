// Squad positions and the FPL element-type ids they map to.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// FPL element_type ids (from the bootstrap-static API)
// ---------------------------------------------------------------------------

pub const ELEMENT_TYPE_GK: u32 = 1;
pub const ELEMENT_TYPE_DEF: u32 = 2;
pub const ELEMENT_TYPE_MID: u32 = 3;
pub const ELEMENT_TYPE_FWD: u32 = 4;

/// The four squad positions a player can be bought for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Position {
    /// All positions in squad-sheet order.
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse a short position label.
    ///
    /// Accepts the FPL `singular_name_short` labels (`GK`, `DEF`, `MID`, `FWD`)
    /// plus the common `GKP` spelling, case-insensitively.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "GKP" => Some(Position::Goalkeeper),
            "DEF" => Some(Position::Defender),
            "MID" => Some(Position::Midfielder),
            "FWD" => Some(Position::Forward),
            _ => None,
        }
    }

    /// Map an FPL `element_type` id using the built-in table.
    pub fn from_element_type(id: u32) -> Option<Self> {
        match id {
            ELEMENT_TYPE_GK => Some(Position::Goalkeeper),
            ELEMENT_TYPE_DEF => Some(Position::Defender),
            ELEMENT_TYPE_MID => Some(Position::Midfielder),
            ELEMENT_TYPE_FWD => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn element_type(&self) -> u32 {
        match self {
            Position::Goalkeeper => ELEMENT_TYPE_GK,
            Position::Defender => ELEMENT_TYPE_DEF,
            Position::Midfielder => ELEMENT_TYPE_MID,
            Position::Forward => ELEMENT_TYPE_FWD,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
