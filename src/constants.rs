//! Constants for board geometry, coordinate packing and opening rules.
//!
//! The grid is stored as a 1D array with a one-cell sentinel ring around the
//! playable area, so every orthogonal and diagonal walk can step off a
//! playable cell without a bounds check.

// =============================================================================
// Board Geometry
// =============================================================================

/// Width of the sentinel ring on each side of the playable area.
///
/// With an offset of one, public coordinates are 1-based: playable cells run
/// from `1..=width` and `1..=height`.
pub const OFFSET: u8 = 1;

/// Largest supported width or height. Two extra columns for the ring must
/// still fit in the packed coordinate.
pub const MAX_DIMENSION: u8 = u8::MAX - 2 * OFFSET - 1;

// =============================================================================
// Coordinate Packing
// =============================================================================

/// Number of bits used by each coordinate in a packed position.
pub const COORDINATE_BITS: u32 = 8;

/// Mask selecting the `y` coordinate from a packed position.
pub const COORDINATE_MASK: u16 = (1 << COORDINATE_BITS) - 1;

// =============================================================================
// Special Move Values
// =============================================================================
//
// Finishing moves are stored as positions on the top sentinel row, which can
// never hold a dot.

/// `x` coordinate of the grounding sentinel.
pub const GROUND_X: u8 = 1;

/// `x` coordinate of the resignation sentinel.
pub const RESIGN_X: u8 = 2;

/// `x` coordinate of the stop sentinel.
pub const STOP_X: u8 = 3;

/// `x` coordinate of the time-expired sentinel.
pub const TIME_X: u8 = 4;

/// `x` coordinate of the interrupted sentinel.
pub const INTERRUPT_X: u8 = 5;

/// `x` coordinate of the draw sentinel.
pub const DRAW_X: u8 = 6;

// =============================================================================
// Opening Restriction
// =============================================================================

/// Number of played moves that must land in the central opening region.
pub const OPENING_MOVES: usize = 2;

/// Side length of the square central opening region.
pub const OPENING_REGION: u8 = 6;

// =============================================================================
// Neighbor Offsets
// =============================================================================

/// Offsets `(dx, dy)` to the 8 neighbors in clockwise order, starting North.
///
/// `y` grows downwards, so North is `(0, -1)`. Even indices are orthogonal
/// neighbors, odd indices diagonal ones.
pub const CLOCKWISE: [(i16, i16); 8] = [
    (0, -1),  // North
    (1, -1),  // NE
    (1, 0),   // East
    (1, 1),   // SE
    (0, 1),   // South
    (-1, 1),  // SW
    (-1, 0),  // West
    (-1, -1), // NW
];
