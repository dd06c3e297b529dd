//! Random playouts (random game simulation).
//!
//! A playout plays uniformly random legal dots, alternating players, until
//! the board is full or a move limit is reached. Runs are reproducible from
//! a seeded [`fastrand::Rng`].

use fastrand::Rng;

use crate::field::Field;
use crate::position::{Player, Position};

/// Play a uniformly random legal dot for `player`.
///
/// Candidates are tried in random order until the field accepts one, so
/// cells that are free but illegal (opening restriction, suicide) are
/// skipped. Returns the played position, `None` if no dot can be placed.
pub fn random_move(field: &mut Field, player: Player, rng: &mut Rng) -> Option<Position> {
    let mut candidates: Vec<Position> = field.positions().filter(|&pos| field.is_free(pos)).collect();
    rng.shuffle(&mut candidates);
    candidates
        .into_iter()
        .find(|&pos| field.make_move(pos, player).is_ok())
}

/// Play random dots for the player to move until no dot can be placed or
/// `max_moves` were played. Returns the number of moves played.
pub fn random_game(field: &mut Field, max_moves: usize, rng: &mut Rng) -> usize {
    let mut played = 0;
    while played < max_moves && !field.is_game_over() {
        let player = field.current_player();
        if random_move(field, player, rng).is_none() {
            break;
        }
        played += 1;
    }
    played
}
