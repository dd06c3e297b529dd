//! Move outcomes, captured regions and move rejections.
//!
//! A [`MoveResult`] carries everything needed to undo a move exactly: the
//! prior state of every cell it touched, the prior scores and the prior
//! player to move.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::position::{CellState, Player, Position};

/// Why a finishing (non-spatial) move ended the game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinishReason {
    Grounding,
    Resign,
    Stop,
    Time,
    Interrupt,
    Draw,
}

impl FinishReason {
    /// The sentinel position this reason is recorded as.
    pub fn position(self) -> Position {
        match self {
            FinishReason::Grounding => Position::GROUND,
            FinishReason::Resign => Position::RESIGN,
            FinishReason::Stop => Position::STOP,
            FinishReason::Time => Position::TIME,
            FinishReason::Interrupt => Position::INTERRUPT,
            FinishReason::Draw => Position::DRAW,
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FinishReason::Grounding => "ground",
            FinishReason::Resign => "resign",
            FinishReason::Stop => "stop",
            FinishReason::Time => "time",
            FinishReason::Interrupt => "interrupt",
            FinishReason::Draw => "draw",
        };
        f.write_str(name)
    }
}

/// Result of attempting to play or undo a move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Position is outside the playable area
    #[error("position {0} is out of bounds")]
    OutOfBounds(Position),
    /// Position already holds a dot or lies inside a base
    #[error("the dot at position {0} is already placed or captured")]
    Occupied(Position),
    /// Game is over, or a finishing move is not allowed yet
    #[error("move {0} is prohibited: the game is over or cannot be finished yet")]
    GameOverProhibited(Position),
    /// One of the first moves lies outside the central opening region
    #[error("position {0} is outside the opening region")]
    OpeningRestricted(Position),
    /// The move would only get the mover's own dots captured
    #[error("move {0} is suicide")]
    Suicide(Position),
    /// There is no played move to take back
    #[error("there is no move to undo")]
    NothingToUndo,
}

/// How an enclosure was credited.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BaseKind {
    /// Opponent dots were taken. `freed` counts the owner's own dots that an
    /// earlier opponent base had captured and that are released again.
    Capture { captured: u32, freed: u32 },
    /// Pure territory: no dot was taken.
    Territory,
    /// Enclosed empty region that stays open to play; the cells are only
    /// marked, and an opponent dot placed inside is captured.
    Unsettled,
}

/// An enclosed region created by a single move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base {
    /// The player who owns the enclosure.
    pub player: Player,
    pub kind: BaseKind,
    /// Ordered boundary, as traced (a cell may repeat where the boundary
    /// touches itself).
    pub closure: Vec<Position>,
    /// Every cell strictly inside the closure.
    pub interior: Vec<Position>,
    /// Prior state of every cell this base changed.
    pub previous_states: Vec<(Position, CellState)>,
}

impl Base {
    /// Whether this base took at least one opponent dot.
    pub fn is_real(&self) -> bool {
        matches!(self.kind, BaseKind::Capture { .. })
    }

    /// Number of opponent dots taken by this base.
    pub fn captured(&self) -> u32 {
        match self.kind {
            BaseKind::Capture { captured, .. } => captured,
            BaseKind::Territory | BaseKind::Unsettled => 0,
        }
    }

    /// Number of the owner's dots released from an earlier opponent base.
    pub fn freed(&self) -> u32 {
        match self.kind {
            BaseKind::Capture { freed, .. } => freed,
            BaseKind::Territory | BaseKind::Unsettled => 0,
        }
    }
}

/// An accepted move together with its undo information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    pub position: Position,
    pub player: Player,
    /// 0-based index in the played move sequence.
    pub number: usize,
    /// Enclosures created by this move, in discovery order.
    pub bases: Vec<Base>,
    /// Prior state of the placed cell (`None` for finishing moves).
    pub previous_state: Option<CellState>,
    pub previous_scores: [i32; 2],
    pub previous_player: Player,
}

impl MoveResult {
    /// The `(position, player)` key identifying this move among siblings.
    pub fn position_player(&self) -> (Position, Player) {
        (self.position, self.player)
    }

    /// The finishing reason, if this is a finishing move.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.position.finish_reason()
    }

    /// Whether the placed dot ended up inside an opponent base.
    pub fn is_self_capture(&self) -> bool {
        self.bases
            .iter()
            .any(|base| base.player != self.player && base.interior.contains(&self.position))
    }
}

/// Outcome of a finished game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Draw,
    ScoreWin { winner: Player, score: u32 },
    ResignWin(Player),
    TimeWin(Player),
    InterruptWin(Player),
}

impl GameResult {
    /// The winning player, `None` for a draw.
    pub fn winner(self) -> Option<Player> {
        match self {
            GameResult::Draw => None,
            GameResult::ScoreWin { winner, .. } => Some(winner),
            GameResult::ResignWin(winner)
            | GameResult::TimeWin(winner)
            | GameResult::InterruptWin(winner) => Some(winner),
        }
    }
}
