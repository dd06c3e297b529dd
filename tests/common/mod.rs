//! Shared helpers for integration tests.
//!
//! Boards are written as text diagrams, one row per line and one
//! whitespace-separated cell per token:
//! - `*` - dot of the first player
//! - `+` - dot of the second player
//! - `.` - empty cell
//!
//! A dot may carry a move number (`*7`). Numbered dots are played at that
//! (0-based) index; unnumbered dots fill the remaining indices in reading
//! order.

#![allow(dead_code)]

use std::collections::BTreeMap;

use dots_engine::field::Field;
use dots_engine::position::{CellState, Player, Position};
use dots_engine::rules::Rules;

/// Board size and ordered moves of a diagram.
pub struct Diagram {
    pub width: u8,
    pub height: u8,
    pub moves: Vec<(Position, Player)>,
}

pub fn parse_diagram(diagram: &str) -> Diagram {
    let mut numbered = BTreeMap::new();
    let mut unnumbered = Vec::new();
    let mut width = 0;
    let mut height = 0;

    for line in diagram.lines().filter(|line| !line.trim().is_empty()) {
        height += 1;
        let mut x = 0;
        for token in line.split_whitespace() {
            x += 1;
            let (marker, number) = token.split_at(1);
            let player = match marker {
                "*" => Player::First,
                "+" => Player::Second,
                "." => continue,
                other => panic!("unexpected marker {other:?} in {token:?}"),
            };
            let mv = (Position::new(x, height), player);
            if number.is_empty() {
                unnumbered.push(mv);
            } else {
                let number: usize = number.parse().expect("move number");
                assert!(numbered.insert(number, mv).is_none(), "duplicate move {number}");
            }
        }
        width = width.max(x);
    }

    let mut moves = Vec::new();
    let mut rest = unnumbered.into_iter();
    for (number, mv) in numbered {
        while moves.len() < number {
            match rest.next() {
                Some(unnumbered) => moves.push(unnumbered),
                None => break,
            }
        }
        moves.push(mv);
    }
    moves.extend(rest);

    Diagram {
        width,
        height,
        moves,
    }
}

/// A field sized to `diagram` with all its moves played.
pub fn field_from_diagram(diagram: &str, configure: impl FnOnce(Rules) -> Rules) -> Field {
    let Diagram {
        width,
        height,
        moves,
    } = parse_diagram(diagram);
    let mut field = Field::new(configure(Rules::new(width, height))).expect("valid rules");
    for (position, player) in moves {
        if let Err(err) = field.make_move_unchecked(position, player).map(|_| ()) {
            panic!("cannot play {position} for {player}: {err}\n{field}");
        }
    }
    field
}

/// Undo every played move and check the board is empty again.
pub fn check_rollback(field: &mut Field) {
    while field.moves_count() > 0 {
        field.undo_move().expect("undo");
    }
    assert_eq!(field.scores(), [0, 0]);
    assert_eq!(field.current_player(), Player::First);
    for pos in field.positions() {
        assert_eq!(field.state(pos), CellState::EMPTY, "{pos} after rollback\n{field}");
    }
}

/// Build the field, run `check` on it, then roll everything back.
pub fn test_field_with_rollback(
    diagram: &str,
    configure: impl FnOnce(Rules) -> Rules,
    check: impl FnOnce(&mut Field),
) {
    let mut field = field_from_diagram(diagram, configure);
    check(&mut field);
    check_rollback(&mut field);
}
