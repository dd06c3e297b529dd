//! Dots-Engine: rules engine for the game of Dots.
//!
//! Players alternately place dots on a grid; enclosing opponent dots with a
//! closed chain of your own captures them. This crate implements the board
//! (legality, capturing, scoring and exact undo) and a branching move
//! history on top of it.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, coordinate packing and opening rules
//! - [`position`] - Coordinates, players and per-cell state
//! - [`rules`] - Game configuration
//! - [`moves`] - Move outcomes, bases and move errors
//! - [`grid`] - Cell storage with a sentinel ring
//! - [`capture`] - Enclosure detection for a single move
//! - [`field`] - The board engine
//! - [`game_tree`] - Branching move history
//! - [`playout`] - Random game simulation
//!
//! ## Example
//!
//! ```
//! use dots_engine::field::Field;
//! use dots_engine::position::{Player, Position};
//! use dots_engine::rules::Rules;
//!
//! let mut field = Field::new(Rules::new(5, 5)).unwrap();
//!
//! // Surround a second-player dot
//! field.make_move(Position::new(3, 3), Player::Second).unwrap();
//! for (x, y) in [(3, 2), (2, 3), (4, 3), (3, 4)] {
//!     field.make_move(Position::new(x, y), Player::First).unwrap();
//! }
//! assert_eq!(field.score(Player::First), 1);
//!
//! // Every move can be taken back exactly
//! field.undo_move().unwrap();
//! assert_eq!(field.score(Player::First), 0);
//! ```

pub mod capture;
pub mod constants;
pub mod field;
pub mod game_tree;
pub mod grid;
pub mod moves;
pub mod playout;
pub mod position;
pub mod rules;
