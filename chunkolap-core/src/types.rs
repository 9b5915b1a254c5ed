use serde::{Deserialize, Serialize};

/// Identifier of a chunk (contig or unitig) in the assembly graph.
pub type ChunkId = u32;

/// Index of an edge in the assembly graph.
pub type EdgeId = usize;

/// Signed coordinate/length in bases.
pub type Coord = i64;

/// Relative arrangement of two chunks A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    /// A's end abuts B's start (A forward, B forward).
    Normal,
    /// The ends face each other (A forward, B reversed).
    Innie,
    /// The ends face away from each other (A reversed, B forward).
    Outtie,
    /// Mirror of Normal (both reversed). Never stored canonically.
    Antinormal,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Normal,
        Orientation::Innie,
        Orientation::Outtie,
        Orientation::Antinormal,
    ];

    /// Whether the second chunk has to be reverse-complemented to align it
    /// against the first in this arrangement.
    pub fn is_opposite(self) -> bool {
        matches!(self, Orientation::Innie | Orientation::Outtie)
    }

    /// Innie and Outtie describe the same arrangement under operand swap.
    pub fn is_symmetric(self) -> bool {
        matches!(self, Orientation::Innie | Orientation::Outtie)
    }

    /// The orientation class obtained when the alignment slides past its
    /// partner: Innie and Outtie trade places, Normal stays Normal (the slide
    /// is expressed by swapping operands instead).
    pub fn slipped(self) -> Orientation {
        match self {
            Orientation::Innie => Orientation::Outtie,
            Orientation::Outtie => Orientation::Innie,
            other => other,
        }
    }

    /// Stable tag used by the persisted record format.
    pub fn tag(self) -> u8 {
        match self {
            Orientation::Normal => b'N',
            Orientation::Innie => b'I',
            Orientation::Outtie => b'O',
            Orientation::Antinormal => b'A',
        }
    }

    pub fn from_tag(tag: u8) -> Option<Orientation> {
        match tag {
            b'N' => Some(Orientation::Normal),
            b'I' => Some(Orientation::Innie),
            b'O' => Some(Orientation::Outtie),
            b'A' => Some(Orientation::Antinormal),
            _ => None,
        }
    }
}

impl From<Orientation> for char {
    fn from(orientation: Orientation) -> Self {
        orientation.tag() as char
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", char::from(*self))
    }
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "normal" | "ab_ab" => Ok(Orientation::Normal),
            "i" | "innie" | "ab_ba" => Ok(Orientation::Innie),
            "o" | "outtie" | "ba_ab" => Ok(Orientation::Outtie),
            "a" | "antinormal" | "ba_ba" => Ok(Orientation::Antinormal),
            other => Err(format!("unknown orientation: {}", other)),
        }
    }
}

/// Mean and variance of a length or distance estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthEstimate {
    pub mean: f64,
    pub variance: f64,
}

impl LengthEstimate {
    pub fn new(mean: f64, variance: f64) -> Self {
        Self { mean, variance }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for orientation in Orientation::ALL {
            assert_eq!(Orientation::from_tag(orientation.tag()), Some(orientation));
        }
        assert_eq!(Orientation::from_tag(b'X'), None);
    }

    #[test]
    fn test_parse_orientation() {
        assert_eq!("innie".parse::<Orientation>(), Ok(Orientation::Innie));
        assert_eq!("BA_AB".parse::<Orientation>(), Ok(Orientation::Outtie));
        assert_eq!("N".parse::<Orientation>(), Ok(Orientation::Normal));
        assert!("sideways".parse::<Orientation>().is_err());
    }

    #[test]
    fn test_slipped_swaps_symmetric_pair() {
        assert_eq!(Orientation::Innie.slipped(), Orientation::Outtie);
        assert_eq!(Orientation::Outtie.slipped(), Orientation::Innie);
        assert_eq!(Orientation::Normal.slipped(), Orientation::Normal);
    }
}
