//! Region profiles
//!
//! Fixed capture targets within a reference screenshot. Each profile names
//! the rectangle holding the in-game ping readout for one game/resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a built-in region profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileId {
    /// PUBG Mobile, 1080p reference capture
    #[default]
    Pubg,
    /// Wild Rift, 1080p reference capture
    WildRift,
    /// Wild Rift, 720p reference capture
    WildRift720p,
}

impl ProfileId {
    /// All profiles in selection order
    pub const ALL: [ProfileId; 3] = [ProfileId::Pubg, ProfileId::WildRift, ProfileId::WildRift720p];

    /// Get the display label for this profile
    pub fn label(&self) -> &'static str {
        match self {
            ProfileId::Pubg => "PubG",
            ProfileId::WildRift => "WildRift",
            ProfileId::WildRift720p => "WildRift 720p",
        }
    }

    /// Position of this profile in the selection list
    pub fn position(&self) -> usize {
        match self {
            ProfileId::Pubg => 0,
            ProfileId::WildRift => 1,
            ProfileId::WildRift720p => 2,
        }
    }

    /// Map a selection position back to a profile
    pub fn from_position(position: usize) -> Option<Self> {
        Self::ALL.get(position).copied()
    }

    /// Resolve the full profile for this identifier
    pub fn profile(&self) -> &'static RegionProfile {
        &PROFILES[self.position()]
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProfileId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "pubg" => Ok(ProfileId::Pubg),
            "wild-rift" | "wildrift" => Ok(ProfileId::WildRift),
            "wild-rift-720p" | "wildrift-720p" => Ok(ProfileId::WildRift720p),
            other => Err(format!(
                "unknown profile '{}' (expected pubg, wild-rift or wild-rift-720p)",
                other
            )),
        }
    }
}

/// A rectangle in source-image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionRect {
    /// Create a rectangle. Zero-sized regions are rejected, at compile time
    /// for the constant profile table.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "region size must be positive");
        Self { x, y, width, height }
    }

    /// Exclusive right edge, widened so it cannot overflow
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge, widened so it cannot overflow
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Check whether the rectangle lies fully inside an image of the given size
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.right() <= image_width as u64 && self.bottom() <= image_height as u64
    }
}

impl fmt::Display for RegionRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// A named capture target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionProfile {
    pub id: ProfileId,
    /// Bundled reference screenshot for this profile
    pub asset: &'static str,
    pub rect: RegionRect,
}

/// Built-in profile table, indexed by `ProfileId::position`
pub static PROFILES: [RegionProfile; 3] = [
    RegionProfile {
        id: ProfileId::Pubg,
        asset: "pubg_hd.png",
        rect: RegionRect::new(80, 1032, 72, 48),
    },
    RegionProfile {
        id: ProfileId::WildRift,
        asset: "snap_hd.png",
        rect: RegionRect::new(1540, 140, 72, 48),
    },
    RegionProfile {
        id: ProfileId::WildRift720p,
        asset: "snap_sd.png",
        rect: RegionRect::new(1026, 89, 48, 35),
    },
];
