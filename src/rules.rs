//! Game configuration.
//!
//! A [`Rules`] value is built once per game and never changes afterwards; the
//! [`Field`](crate::field::Field) validates it on construction.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_DIMENSION, OFFSET, OPENING_REGION};
use crate::position::{Player, Position};

/// Which enclosures become bases.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum BaseMode {
    /// The enclosure must contain at least one opponent dot.
    #[default]
    AtLeastOneOpponentDot,
    /// Any enclosure counts.
    AnySurrounding,
    /// Every enclosed cell must hold an opponent dot.
    AllOpponentDots,
}

/// Dots placed before the first move.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitialPosition {
    #[default]
    Empty,
    /// Four dots in the center, each player on one diagonal.
    Cross,
}

impl InitialPosition {
    /// The placements of this preset on a `width` x `height` board.
    pub fn placements(self, width: u8, height: u8) -> Result<Vec<(Position, Player)>, RulesError> {
        match self {
            InitialPosition::Empty => Ok(Vec::new()),
            InitialPosition::Cross => {
                if width < 2 || height < 2 {
                    return Err(RulesError::InitialPositionDoesNotFit { width, height });
                }
                let x = width / 2 - 1;
                let y = height / 2 - 1;
                Ok(vec![
                    (Position::from_zero_based(x, y), Player::First),
                    (Position::from_zero_based(x + 1, y), Player::Second),
                    (Position::from_zero_based(x + 1, y + 1), Player::First),
                    (Position::from_zero_based(x, y + 1), Player::Second),
                ])
            }
        }
    }
}

/// Errors in a [`Rules`] value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("board size {width}x{height} is not within 1..={max}", max = MAX_DIMENSION)]
    InvalidDimensions { width: u8, height: u8 },
    #[error("initial position does not fit a {width}x{height} board")]
    InitialPositionDoesNotFit { width: u8, height: u8 },
}

/// Immutable game configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    width: u8,
    height: u8,
    #[serde(default)]
    capture_empty_base: bool,
    #[serde(default)]
    capture_by_border: bool,
    #[serde(default)]
    base_mode: BaseMode,
    #[serde(default = "default_suicide_allowed")]
    suicide_allowed: bool,
    #[serde(default)]
    opening_restriction: bool,
    #[serde(default)]
    initial_position: InitialPosition,
    #[serde(default)]
    initial_moves: Vec<(Position, Player)>,
    #[serde(default)]
    komi: f64,
}

fn default_suicide_allowed() -> bool {
    true
}

impl Rules {
    /// Rules for an empty `width` x `height` board with classic capturing.
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            capture_empty_base: false,
            capture_by_border: false,
            base_mode: BaseMode::default(),
            suicide_allowed: default_suicide_allowed(),
            opening_restriction: false,
            initial_position: InitialPosition::default(),
            initial_moves: Vec::new(),
            komi: 0.0,
        }
    }

    pub fn with_capture_empty_base(mut self, enabled: bool) -> Self {
        self.capture_empty_base = enabled;
        self
    }

    pub fn with_capture_by_border(mut self, enabled: bool) -> Self {
        self.capture_by_border = enabled;
        self
    }

    pub fn with_base_mode(mut self, base_mode: BaseMode) -> Self {
        self.base_mode = base_mode;
        self
    }

    pub fn with_suicide_allowed(mut self, allowed: bool) -> Self {
        self.suicide_allowed = allowed;
        self
    }

    pub fn with_opening_restriction(mut self, enabled: bool) -> Self {
        self.opening_restriction = enabled;
        self
    }

    pub fn with_initial_position(mut self, initial_position: InitialPosition) -> Self {
        self.initial_position = initial_position;
        self
    }

    /// Extra placements applied after the initial position preset.
    pub fn with_initial_moves(mut self, moves: Vec<(Position, Player)>) -> Self {
        self.initial_moves = moves;
        self
    }

    pub fn with_komi(mut self, komi: f64) -> Self {
        self.komi = komi;
        self
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn capture_empty_base(&self) -> bool {
        self.capture_empty_base
    }

    pub fn capture_by_border(&self) -> bool {
        self.capture_by_border
    }

    pub fn base_mode(&self) -> BaseMode {
        self.base_mode
    }

    pub fn suicide_allowed(&self) -> bool {
        self.suicide_allowed
    }

    pub fn opening_restriction(&self) -> bool {
        self.opening_restriction
    }

    pub fn initial_position(&self) -> InitialPosition {
        self.initial_position
    }

    pub fn initial_moves(&self) -> &[(Position, Player)] {
        &self.initial_moves
    }

    /// Compensation points for the second player. Display-only: the engine
    /// never adds it to a score.
    pub fn komi(&self) -> f64 {
        self.komi
    }

    /// Check the board dimensions.
    pub fn validate(&self) -> Result<(), RulesError> {
        let valid = 1..=MAX_DIMENSION;
        if !valid.contains(&self.width) || !valid.contains(&self.height) {
            return Err(RulesError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// All placements to apply before the first move, preset first.
    pub fn all_initial_moves(&self) -> Result<Vec<(Position, Player)>, RulesError> {
        let mut moves = self.initial_position.placements(self.width, self.height)?;
        moves.extend_from_slice(&self.initial_moves);
        Ok(moves)
    }

    /// Columns and rows (1-based) of the central opening region.
    pub fn opening_region(&self) -> (RangeInclusive<u8>, RangeInclusive<u8>) {
        (
            central_range(self.width),
            central_range(self.height),
        )
    }
}

/// A run of `OPENING_REGION` cells around the middle of `size`, clamped.
fn central_range(size: u8) -> RangeInclusive<u8> {
    let half = OPENING_REGION / 2;
    let start = (size / 2).saturating_sub(half);
    let end = (size / 2 + half - 1).min(size.saturating_sub(1));
    (start + OFFSET)..=(end + OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = Rules::new(10, 12);
        assert_eq!(rules.width(), 10);
        assert_eq!(rules.height(), 12);
        assert_eq!(rules.base_mode(), BaseMode::AtLeastOneOpponentDot);
        assert!(rules.suicide_allowed());
        assert!(!rules.capture_by_border());
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Rules::new(0, 5).validate(),
            Err(RulesError::InvalidDimensions { .. })
        ));
        assert!(Rules::new(MAX_DIMENSION, MAX_DIMENSION).validate().is_ok());
        assert!(Rules::new(MAX_DIMENSION + 1, 1).validate().is_err());
    }

    #[test]
    fn test_cross_placements() {
        let cross = InitialPosition::Cross.placements(8, 8).unwrap();
        assert_eq!(
            cross,
            vec![
                (Position::new(4, 4), Player::First),
                (Position::new(5, 4), Player::Second),
                (Position::new(5, 5), Player::First),
                (Position::new(4, 5), Player::Second),
            ]
        );
        // Odd boards round towards the top-left
        assert_eq!(
            InitialPosition::Cross.placements(9, 9).unwrap()[0].0,
            Position::new(4, 4)
        );
        assert_eq!(
            InitialPosition::Cross.placements(2, 2).unwrap()[0].0,
            Position::new(1, 1)
        );
        assert!(InitialPosition::Cross.placements(1, 1).is_err());
    }

    #[test]
    fn test_opening_region() {
        // 1-based bounds for common board sizes
        let (xs, ys) = Rules::new(39, 32).opening_region();
        assert_eq!(xs, 17..=22);
        assert_eq!(ys, 14..=19);

        let (xs, ys) = Rules::new(20, 20).opening_region();
        assert_eq!(xs, 8..=13);
        assert_eq!(ys, 8..=13);

        let (xs, _) = Rules::new(30, 30).opening_region();
        assert_eq!(xs, 13..=18);

        // Small boards clamp to the whole board
        let (xs, _) = Rules::new(3, 3).opening_region();
        assert_eq!(xs, 1..=3);
    }

    #[test]
    fn test_serde_defaults() {
        let rules: Rules = serde_json::from_str(r#"{"width": 5, "height": 4}"#).unwrap();
        assert_eq!(rules, Rules::new(5, 4));

        let json = serde_json::to_string(&Rules::new(7, 7).with_komi(0.5)).unwrap();
        let back: Rules = serde_json::from_str(&json).unwrap();
        assert_eq!(back.komi(), 0.5);
    }
}
