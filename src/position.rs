//! Board coordinates, players and per-cell state.
//!
//! A [`Position`] packs an `(x, y)` pair into a `u16`. Coordinates include the
//! sentinel ring (see [`OFFSET`]), so playable cells are 1-based. A handful of
//! positions on the top sentinel row double as finishing moves (grounding,
//! resignation, ...) so they can live in the same move history as dots.
//!
//! A [`CellState`] is a small bit set: a cell is empty, holds a dot, is
//! territory of a player, or sits inside an unsettled empty region. A dot and
//! a territory tag may combine: that is a captured dot (or a dot inside its
//! own player's base).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    COORDINATE_BITS, COORDINATE_MASK, DRAW_X, GROUND_X, INTERRUPT_X, OFFSET, RESIGN_X, STOP_X,
    TIME_X,
};
use crate::moves::FinishReason;

/// One of the two players.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    First,
    Second,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }

    /// Index into per-player arrays (0 for first, 1 for second).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Player::First => 0,
            Player::Second => 1,
        }
    }

    /// Text marker used by board dumps.
    pub fn marker(self) -> char {
        match self {
            Player::First => '*',
            Player::Second => '+',
        }
    }

    /// Text marker for a dot of this player that has been captured.
    pub fn captured_marker(self) -> char {
        match self {
            Player::First => 'x',
            Player::Second => 'o',
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::First => write!(f, "first"),
            Player::Second => write!(f, "second"),
        }
    }
}

/// A packed board coordinate or a finishing-move sentinel.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position(u16);

impl Position {
    /// Grounding: the mover concedes the remaining board.
    pub const GROUND: Position = Position::new(GROUND_X, 0);
    pub const RESIGN: Position = Position::new(RESIGN_X, 0);
    pub const STOP: Position = Position::new(STOP_X, 0);
    /// The mover ran out of time.
    pub const TIME: Position = Position::new(TIME_X, 0);
    pub const INTERRUPT: Position = Position::new(INTERRUPT_X, 0);
    pub const DRAW: Position = Position::new(DRAW_X, 0);

    /// Create a position from raw (ring-inclusive) coordinates.
    ///
    /// The top-left playable cell is `Position::new(1, 1)`.
    #[inline]
    pub const fn new(x: u8, y: u8) -> Self {
        Position(((x as u16) << COORDINATE_BITS) | y as u16)
    }

    /// Create a position from 0-based playable coordinates.
    #[inline]
    pub const fn from_zero_based(x: u8, y: u8) -> Self {
        Position::new(x + OFFSET, y + OFFSET)
    }

    #[inline]
    pub const fn x(self) -> u8 {
        (self.0 >> COORDINATE_BITS) as u8
    }

    #[inline]
    pub const fn y(self) -> u8 {
        (self.0 & COORDINATE_MASK) as u8
    }

    /// The packed representation.
    #[inline]
    pub const fn packed(self) -> u16 {
        self.0
    }

    /// Whether this position is one of the finishing-move sentinels.
    pub fn is_game_over_move(self) -> bool {
        self.finish_reason().is_some()
    }

    /// The finishing reason encoded by a sentinel, `None` for board cells.
    pub fn finish_reason(self) -> Option<FinishReason> {
        if self.y() != 0 {
            return None;
        }
        match self.x() {
            GROUND_X => Some(FinishReason::Grounding),
            RESIGN_X => Some(FinishReason::Resign),
            STOP_X => Some(FinishReason::Stop),
            TIME_X => Some(FinishReason::Time),
            INTERRUPT_X => Some(FinishReason::Interrupt),
            DRAW_X => Some(FinishReason::Draw),
            _ => None,
        }
    }

    /// Step by `(dx, dy)`, or `None` if the result leaves the `u8` range.
    #[inline]
    pub fn offset(self, dx: i16, dy: i16) -> Option<Position> {
        let x = u8::try_from(i16::from(self.x()) + dx).ok()?;
        let y = u8::try_from(i16::from(self.y()) + dy).ok()?;
        Some(Position::new(x, y))
    }

    /// Signed-area contribution of the boundary step `self -> next`.
    ///
    /// Summed over a closed walk this is twice the enclosed area; it is
    /// positive when the walk keeps the swept cells on its inside.
    #[inline]
    pub fn square(self, next: Position) -> i32 {
        i32::from(self.y()) * i32::from(next.x()) - i32::from(self.x()) * i32::from(next.y())
    }

    /// Squared Euclidean distance (1 for orthogonal, 2 for diagonal neighbors).
    pub fn square_distance_to(self, other: Position) -> i32 {
        let dx = i32::from(self.x()) - i32::from(other.x());
        let dy = i32::from(self.y()) - i32::from(other.y());
        dx * dx + dy * dy
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.finish_reason() {
            Some(reason) => write!(f, "{reason}"),
            None => write!(f, "({};{})", self.x(), self.y()),
        }
    }
}

/// State of a single grid cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct CellState(u8);

impl CellState {
    const PLACED: u8 = 0b0000_0001;
    const PLACED_SECOND: u8 = 0b0000_0010;
    const TERRITORY: u8 = 0b0000_0100;
    const TERRITORY_SECOND: u8 = 0b0000_1000;
    const EMPTY_TERRITORY: u8 = 0b0001_0000;
    const EMPTY_TERRITORY_SECOND: u8 = 0b0010_0000;
    const BORDER_BIT: u8 = 0b1000_0000;

    /// A free cell.
    pub const EMPTY: CellState = CellState(0);

    /// A sentinel cell of the ring around the playable area.
    pub const BORDER: CellState = CellState(Self::BORDER_BIT);

    /// A fresh dot of `player`.
    #[inline]
    pub fn placed(player: Player) -> Self {
        CellState(Self::PLACED | Self::player_bit(player, Self::PLACED_SECOND))
    }

    #[inline]
    fn player_bit(player: Player, second_bit: u8) -> u8 {
        match player {
            Player::First => 0,
            Player::Second => second_bit,
        }
    }

    #[inline]
    fn player_of(self, second_bit: u8) -> Player {
        if self.0 & second_bit != 0 {
            Player::Second
        } else {
            Player::First
        }
    }

    #[inline]
    pub fn is_border(self) -> bool {
        self.0 & Self::BORDER_BIT != 0
    }

    /// Holds a dot, captured or not.
    #[inline]
    pub fn is_placed(self) -> bool {
        self.0 & Self::PLACED != 0
    }

    /// The player who placed the dot here.
    #[inline]
    pub fn placed_player(self) -> Option<Player> {
        self.is_placed().then(|| self.player_of(Self::PLACED_SECOND))
    }

    /// Lies inside a base.
    #[inline]
    pub fn is_territory(self) -> bool {
        self.0 & Self::TERRITORY != 0
    }

    /// The owner of the base this cell lies in.
    #[inline]
    pub fn territory_player(self) -> Option<Player> {
        self.is_territory()
            .then(|| self.player_of(Self::TERRITORY_SECOND))
    }

    /// Lies inside an enclosed region that has not become a base yet.
    #[inline]
    pub fn is_empty_territory(self) -> bool {
        self.0 & Self::EMPTY_TERRITORY != 0
    }

    /// The player whose unsettled empty region contains this cell.
    #[inline]
    pub fn empty_territory_player(self) -> Option<Player> {
        self.is_empty_territory()
            .then(|| self.player_of(Self::EMPTY_TERRITORY_SECOND))
    }

    /// A dot that now sits in the opponent's base.
    #[inline]
    pub fn is_captured(self) -> bool {
        match (self.placed_player(), self.territory_player()) {
            (Some(placed), Some(owner)) => placed != owner,
            _ => false,
        }
    }

    /// Whether a dot may still be placed here.
    #[inline]
    pub fn is_free(self) -> bool {
        self.0 & (Self::BORDER_BIT | Self::PLACED | Self::TERRITORY) == 0
    }

    /// Counts as `player`'s wall for connectivity: an uncaptured dot of
    /// `player`, or any cell of `player`'s territory.
    #[inline]
    pub fn is_active(self, player: Player) -> bool {
        match self.territory_player() {
            Some(owner) => owner == player,
            None => self.placed_player() == Some(player),
        }
    }

    /// Mark as territory of `owner`, keeping the dot (if any) and dropping
    /// any unsettled-region mark.
    #[inline]
    pub fn with_territory(self, owner: Player) -> Self {
        let dot = self.0 & (Self::PLACED | Self::PLACED_SECOND);
        CellState(dot | Self::TERRITORY | Self::player_bit(owner, Self::TERRITORY_SECOND))
    }

    /// Mark a free cell as lying inside `owner`'s unsettled empty region.
    #[inline]
    pub fn with_empty_territory(self, owner: Player) -> Self {
        CellState(Self::EMPTY_TERRITORY | Self::player_bit(owner, Self::EMPTY_TERRITORY_SECOND))
    }

    /// Character used by board dumps.
    pub fn marker(self) -> char {
        if self.is_border() {
            return '#';
        }
        match (self.placed_player(), self.territory_player()) {
            (Some(player), Some(owner)) if player != owner => player.captured_marker(),
            (Some(player), _) => player.marker(),
            (None, Some(Player::First)) => '^',
            (None, Some(Player::Second)) => '~',
            (None, None) if self.is_empty_territory() => ',',
            (None, None) => '.',
        }
    }
}

impl fmt::Debug for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellState({:#010b} '{}')", self.0, self.marker())
    }
}
