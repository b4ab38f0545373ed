//! Tile coordinate types for map sections.

use serde::{Deserialize, Serialize};

/// Tile coordinate within a map section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column of the tile
    pub x: i32,
    /// Row of the tile
    pub y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns true if both components are non-negative.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.x >= 0 && self.y >= 0
    }
}

/// A tile addressed within a specific map section.
///
/// Sections are the sub-maps of a map file (the overworld is section 0,
/// interiors and caves follow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SectionTile {
    /// Map section index
    pub section: i32,
    /// Tile inside the section
    pub tile: TileCoord,
}

impl SectionTile {
    /// Creates a new section tile.
    #[must_use]
    pub const fn new(section: i32, x: i32, y: i32) -> Self {
        Self {
            section,
            tile: TileCoord::new(x, y),
        }
    }

    /// Returns true if the section and tile are both valid.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.section >= 0 && self.tile.is_valid()
    }
}
