use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// FEN of the standard initial position.
pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Chess variants the board adapter can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    Standard,
    /// Fischer random chess (Chess960). Games usually carry a FEN tag
    /// because the back rank is shuffled.
    Fischerandom,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Standard, Variant::Fischerandom];

    /// Name used in the PGN `Variant` tag.
    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Fischerandom => "Fischerandom",
        }
    }

    /// True if the starting position is randomised.
    pub fn is_random(self) -> bool {
        matches!(self, Self::Fischerandom)
    }

    pub fn starting_fen(self) -> &'static str {
        STANDARD_START_FEN
    }
}

impl FromStr for Variant {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "standard" | "normal" => Ok(Self::Standard),
            "fischerandom" | "fischerrandom" | "chess960" => Ok(Self::Fischerandom),
            _ => Err(VariantError::Unknown(s.to_string())),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariantError {
    #[error("Unknown variant: {0}")]
    Unknown(String),
}
