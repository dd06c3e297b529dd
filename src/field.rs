//! The game board: move legality, capturing, scoring and exact undo.
//!
//! A [`Field`] owns a [`Grid`] and the history of accepted moves. Every
//! accepted move is recorded as a [`MoveResult`] holding the prior state of
//! each cell it changed, so [`Field::undo_move`] restores the board, scores
//! and player to move exactly.
//!
//! A rejected move never changes anything: bases are computed on a read-only
//! view first and applied only once the move is known to be legal.

use std::fmt;

use tracing::{debug, instrument, trace};

use crate::capture::{apply_base, find_bases, revert_base};
use crate::constants::OPENING_MOVES;
use crate::grid::Grid;
use crate::moves::{FinishReason, GameResult, MoveError, MoveResult};
use crate::position::{CellState, Player, Position};
use crate::rules::{Rules, RulesError};

/// Receives placements that were rejected without a caller to report to:
/// initial placements and unchecked replays.
pub type Diagnostics = Box<dyn FnMut(&MoveError, Position, Player)>;

pub struct Field {
    rules: Rules,
    grid: Grid,
    initial_moves: Vec<MoveResult>,
    moves: Vec<MoveResult>,
    scores: [i32; 2],
    player: Player,
    diagnostics: Option<Diagnostics>,
}

impl Field {
    /// Create a field and apply the initial position of `rules`.
    pub fn new(rules: Rules) -> Result<Self, RulesError> {
        Self::build(rules, None)
    }

    /// Like [`Field::new`], reporting rejected placements to `diagnostics`.
    pub fn with_diagnostics(
        rules: Rules,
        diagnostics: impl FnMut(&MoveError, Position, Player) + 'static,
    ) -> Result<Self, RulesError> {
        Self::build(rules, Some(Box::new(diagnostics)))
    }

    fn build(rules: Rules, diagnostics: Option<Diagnostics>) -> Result<Self, RulesError> {
        rules.validate()?;
        let placements = rules.all_initial_moves()?;
        let grid = Grid::new(rules.width(), rules.height());
        let mut field = Field {
            rules,
            grid,
            initial_moves: Vec::new(),
            moves: Vec::new(),
            scores: [0; 2],
            player: Player::First,
            diagnostics,
        };

        for (position, player) in placements {
            if let Err(err) = field.place(position, player, false) {
                field.report(&err, position, player);
            }
        }
        // Initial placements are part of the position, not of the history
        field.initial_moves = std::mem::take(&mut field.moves);
        field.player = Player::First;

        debug!(
            width = field.width(),
            height = field.height(),
            initial = field.initial_moves.len(),
            "field created"
        );
        Ok(field)
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn width(&self) -> u8 {
        self.grid.width()
    }

    pub fn height(&self) -> u8 {
        self.grid.height()
    }

    /// Width including the border ring.
    pub fn real_width(&self) -> usize {
        self.grid.real_width()
    }

    /// Height including the border ring.
    pub fn real_height(&self) -> usize {
        self.grid.real_height()
    }

    /// State of the cell at `pos`; anything off the board reads as border.
    pub fn state(&self, pos: Position) -> CellState {
        self.grid.state(pos)
    }

    pub fn is_playable(&self, pos: Position) -> bool {
        self.grid.is_playable(pos)
    }

    /// All playable positions, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        self.grid.playable_positions()
    }

    /// Whether a dot may be placed at `pos` right now (ignoring the opening
    /// restriction and suicide).
    pub fn is_free(&self, pos: Position) -> bool {
        self.grid.is_playable(pos) && self.grid.state(pos).is_free()
    }

    pub fn score(&self, player: Player) -> i32 {
        self.scores[player.index()]
    }

    /// Scores of `[first, second]`.
    pub fn scores(&self) -> [i32; 2] {
        self.scores
    }

    /// First player's score minus second player's score.
    pub fn score_diff(&self) -> i32 {
        self.scores[0] - self.scores[1]
    }

    /// Played moves, oldest first. Initial placements are not included.
    pub fn moves(&self) -> &[MoveResult] {
        &self.moves
    }

    /// Placements applied when the field was created.
    pub fn initial_moves(&self) -> &[MoveResult] {
        &self.initial_moves
    }

    pub fn last_move(&self) -> Option<&MoveResult> {
        self.moves.last()
    }

    pub fn moves_count(&self) -> usize {
        self.moves.len()
    }

    /// The player to move: the opponent of the last mover.
    pub fn current_player(&self) -> Player {
        self.player
    }

    /// Whether a finishing move has been played.
    pub fn is_game_over(&self) -> bool {
        self.moves
            .last()
            .is_some_and(|result| result.position.is_game_over_move())
    }

    /// Outcome of the game, `None` while it is still running.
    ///
    /// Scores are compared as they are; komi is not applied.
    pub fn game_result(&self) -> Option<GameResult> {
        let last = self.moves.last()?;
        let loser = last.player;
        let result = match last.finish_reason()? {
            FinishReason::Draw => GameResult::Draw,
            FinishReason::Resign => GameResult::ResignWin(loser.opponent()),
            FinishReason::Time => GameResult::TimeWin(loser.opponent()),
            FinishReason::Interrupt => GameResult::InterruptWin(loser.opponent()),
            FinishReason::Grounding | FinishReason::Stop => {
                let diff = self.score_diff();
                match diff.signum() {
                    0 => GameResult::Draw,
                    1 => GameResult::ScoreWin {
                        winner: Player::First,
                        score: diff.unsigned_abs(),
                    },
                    _ => GameResult::ScoreWin {
                        winner: Player::Second,
                        score: diff.unsigned_abs(),
                    },
                }
            }
        };
        Some(result)
    }

    /// Play a dot or a finishing move for `player`.
    ///
    /// Checks, in order: bounds, occupancy, game over and the opening
    /// restriction, then suicide once the bases are known. On error the
    /// field is unchanged.
    #[instrument(level = "trace", skip(self))]
    pub fn make_move(
        &mut self,
        position: Position,
        player: Player,
    ) -> Result<&MoveResult, MoveError> {
        if position.is_game_over_move() {
            if self.in_opening() {
                debug!(%position, %player, "finishing move during the opening");
                return Err(MoveError::GameOverProhibited(position));
            }
            return Ok(self.record_finish(position, player));
        }
        self.place(position, player, true)
            .inspect_err(|err| debug!(%err, "move rejected"))?;
        Ok(self.last_recorded())
    }

    /// Play without the game-over, opening and suicide checks.
    ///
    /// Used to replay trusted histories. A placement on a bad or occupied
    /// cell is still rejected and reported to the diagnostics callback.
    pub fn make_move_unchecked(
        &mut self,
        position: Position,
        player: Player,
    ) -> Result<&MoveResult, MoveError> {
        if position.is_game_over_move() {
            return Ok(self.record_finish(position, player));
        }
        if let Err(err) = self.place(position, player, false) {
            self.report(&err, position, player);
            return Err(err);
        }
        Ok(self.last_recorded())
    }

    /// End the game for `reason`, played by `player`.
    pub fn finish(
        &mut self,
        player: Player,
        reason: FinishReason,
    ) -> Result<&MoveResult, MoveError> {
        self.make_move(reason.position(), player)
    }

    /// Take back the last played move, restoring the exact prior state.
    pub fn undo_move(&mut self) -> Result<MoveResult, MoveError> {
        let result = self.moves.pop().ok_or(MoveError::NothingToUndo)?;
        for base in result.bases.iter().rev() {
            revert_base(&mut self.grid, base);
        }
        if let Some(previous) = result.previous_state {
            self.grid.set(result.position, previous);
        }
        self.scores = result.previous_scores;
        self.player = result.previous_player;
        trace!(position = %result.position, player = %result.player, "undo");
        Ok(result)
    }

    fn in_opening(&self) -> bool {
        self.rules.opening_restriction() && self.moves.len() < OPENING_MOVES
    }

    fn in_opening_region(&self, position: Position) -> bool {
        let (xs, ys) = self.rules.opening_region();
        xs.contains(&position.x()) && ys.contains(&position.y())
    }

    fn last_recorded(&self) -> &MoveResult {
        &self.moves[self.moves.len() - 1]
    }

    fn report(&mut self, err: &MoveError, position: Position, player: Player) {
        debug!(%position, %player, %err, "placement rejected");
        if let Some(diagnostics) = self.diagnostics.as_mut() {
            diagnostics(err, position, player);
        }
    }

    fn record_finish(&mut self, position: Position, player: Player) -> &MoveResult {
        debug!(%position, %player, "game finished");
        self.moves.push(MoveResult {
            position,
            player,
            number: self.moves.len(),
            bases: Vec::new(),
            previous_state: None,
            previous_scores: self.scores,
            previous_player: self.player,
        });
        self.player = player.opponent();
        self.last_recorded()
    }

    /// Place a dot. With `checked` unset only bounds and occupancy are
    /// verified.
    fn place(&mut self, position: Position, player: Player, checked: bool) -> Result<(), MoveError> {
        if !self.grid.is_playable(position) {
            return Err(MoveError::OutOfBounds(position));
        }
        let previous_state = self.grid.state(position);
        if !previous_state.is_free() {
            return Err(MoveError::Occupied(position));
        }
        if checked {
            if self.is_game_over() {
                return Err(MoveError::GameOverProhibited(position));
            }
            if self.in_opening() && !self.in_opening_region(position) {
                return Err(MoveError::OpeningRestricted(position));
            }
        }

        let captures = find_bases(&self.grid, &self.rules, position, player);
        if captures.suicide && checked && !self.rules.suicide_allowed() {
            return Err(MoveError::Suicide(position));
        }

        let delta = captures.score_delta();
        self.grid.set(position, CellState::placed(player));
        for base in &captures.bases {
            apply_base(&mut self.grid, base);
        }
        let previous_scores = self.scores;
        self.scores[0] += delta[0];
        self.scores[1] += delta[1];

        if captures.suicide {
            debug!(%position, %player, "dot captured on placement");
        } else if !captures.bases.is_empty() {
            debug!(%position, %player, bases = captures.bases.len(), scores = ?self.scores, "bases created");
        }

        self.moves.push(MoveResult {
            position,
            player,
            number: self.moves.len(),
            bases: captures.bases,
            previous_state: Some(previous_state),
            previous_scores,
            previous_player: self.player,
        });
        self.player = player.opponent();
        Ok(())
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("scores", &self.scores)
            .field("player", &self.player)
            .field("moves", &self.moves.len())
            .field("initial_moves", &self.initial_moves.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 1..=self.height() {
            for x in 1..=self.width() {
                write!(f, "{} ", self.state(Position::new(x, y)).marker())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
