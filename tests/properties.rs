//! Property-based tests for the field and the move tree.
//!
//! Games are random playouts driven by a seeded generator, so every failing
//! case is reproducible from its seed.

#![allow(clippy::unwrap_used)]

use fastrand::Rng;
use proptest::prelude::*;

use dots_engine::field::Field;
use dots_engine::game_tree::{GameTree, MoveKey, NodeId};
use dots_engine::playout::{random_game, random_move};
use dots_engine::position::{CellState, Player, Position};
use dots_engine::rules::{BaseMode, InitialPosition, Rules};

/// Everything a move may change.
#[derive(Debug, PartialEq)]
struct Snapshot {
    cells: Vec<CellState>,
    scores: [i32; 2],
    player: Player,
    moves: usize,
}

fn snapshot(field: &Field) -> Snapshot {
    Snapshot {
        cells: field.positions().map(|pos| field.state(pos)).collect(),
        scores: field.scores(),
        player: field.current_player(),
        moves: field.moves_count(),
    }
}

fn rules(width: u8, height: u8, mode: u8, empty_base: bool, border: bool, cross: bool) -> Rules {
    let base_mode = match mode {
        0 => BaseMode::AtLeastOneOpponentDot,
        1 => BaseMode::AnySurrounding,
        _ => BaseMode::AllOpponentDots,
    };
    let initial_position = if cross {
        InitialPosition::Cross
    } else {
        InitialPosition::Empty
    };
    Rules::new(width, height)
        .with_base_mode(base_mode)
        .with_capture_empty_base(empty_base)
        .with_capture_by_border(border)
        .with_initial_position(initial_position)
}

fn field_moves(tree: &GameTree) -> Vec<MoveKey> {
    tree.field()
        .moves()
        .iter()
        .map(|result| result.position_player())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Undoing moves one by one passes through every earlier state exactly.
    #[test]
    fn prop_undo_restores_every_state(
        width in 3u8..10,
        height in 3u8..10,
        mode in 0u8..3,
        empty_base in any::<bool>(),
        border in any::<bool>(),
        cross in any::<bool>(),
        seed in any::<u64>()
    ) {
        let mut field = Field::new(rules(width, height, mode, empty_base, border, cross)).unwrap();
        let mut rng = Rng::with_seed(seed);

        let mut history = vec![snapshot(&field)];
        loop {
            let player = field.current_player();
            if random_move(&mut field, player, &mut rng).is_none() {
                break;
            }
            history.push(snapshot(&field));
        }

        while let Some(expected) = history.pop() {
            prop_assert_eq!(snapshot(&field), expected);
            if history.is_empty() {
                break;
            }
            field.undo_move().unwrap();
        }
        prop_assert!(field.undo_move().is_err());
    }

    /// Scores stay in step with the bases recorded in the history.
    #[test]
    fn prop_scores_match_bases(
        width in 3u8..10,
        height in 3u8..10,
        mode in 0u8..3,
        border in any::<bool>(),
        seed in any::<u64>()
    ) {
        let mut field = Field::new(rules(width, height, mode, false, border, false)).unwrap();
        random_game(&mut field, 200, &mut Rng::with_seed(seed));

        let mut scores = [0i64; 2];
        for result in field.moves() {
            for base in &result.bases {
                scores[base.player.index()] += i64::from(base.captured());
                scores[base.player.opponent().index()] -= i64::from(base.freed());
            }
        }
        let [first, second] = field.scores();
        prop_assert_eq!(scores, [i64::from(first), i64::from(second)]);
    }

    /// Rejected moves leave the field untouched.
    #[test]
    fn prop_rejected_moves_are_noops(
        width in 3u8..10,
        height in 3u8..10,
        moves in 0usize..60,
        seed in any::<u64>()
    ) {
        let mut field = Field::new(Rules::new(width, height)).unwrap();
        let mut rng = Rng::with_seed(seed);
        random_game(&mut field, moves, &mut rng);
        let before = snapshot(&field);

        let taken: Vec<Position> = field.positions().filter(|&pos| !field.is_free(pos)).collect();
        for pos in taken {
            for player in [Player::First, Player::Second] {
                prop_assert!(field.make_move(pos, player).is_err());
                prop_assert!(field.make_move_unchecked(pos, player).is_err());
            }
        }
        for pos in [Position::new(width + 1, 1), Position::new(1, height + 1)] {
            prop_assert!(field.make_move(pos, Player::First).is_err());
        }
        prop_assert_eq!(snapshot(&field), before);
    }

    /// The active node's path equals the field's moves after any sequence of
    /// tree operations.
    #[test]
    fn prop_tree_stays_in_sync(
        ops in prop::collection::vec(0u8..6, 1..80),
        memoize in any::<bool>(),
        seed in any::<u64>()
    ) {
        let mut tree = GameTree::new(Field::new(Rules::new(6, 6)).unwrap());
        tree.set_memoize_paths(memoize);
        let mut rng = Rng::with_seed(seed);

        for op in ops {
            match op {
                0 | 1 => {
                    let player = tree.field().current_player();
                    if random_move(tree.field_mut(), player, &mut rng).is_some() {
                        let result = tree.field().last_move().unwrap().clone();
                        tree.add(result, None, None).unwrap();
                    }
                }
                2 => {
                    let _ = tree.step_back();
                }
                3 => {
                    let _ = tree.step_forward();
                }
                4 => {
                    let ids: Vec<NodeId> = tree.nodes().map(|(id, _)| id).collect();
                    let target = ids[rng.usize(..ids.len())];
                    tree.switch(target).unwrap();
                    prop_assert_eq!(tree.current(), target);
                }
                _ => {
                    let len = tree.len();
                    if tree.current() != tree.root() {
                        tree.remove().unwrap();
                        prop_assert!(tree.len() < len);
                    }
                }
            }

            let current = tree.current();
            prop_assert_eq!(tree.path_to(current).unwrap(), field_moves(&tree));
            prop_assert_eq!(tree.nodes().count(), tree.len());
        }
    }

    /// Switching away and back reproduces the board reached directly.
    #[test]
    fn prop_switch_round_trip(
        depth in 1usize..20,
        fork in 0usize..20,
        seed in any::<u64>()
    ) {
        let mut tree = GameTree::new(Field::new(Rules::new(7, 7)).unwrap());
        let mut rng = Rng::with_seed(seed);
        let extend = |tree: &mut GameTree, rng: &mut Rng| {
            for _ in 0..depth {
                let player = tree.field().current_player();
                if random_move(tree.field_mut(), player, rng).is_none() {
                    break;
                }
                let result = tree.field().last_move().unwrap().clone();
                tree.add(result, None, None).unwrap();
            }
        };

        extend(&mut tree, &mut rng);
        let a = tree.current();
        let direct = snapshot(tree.field());

        tree.back_by(fork);
        extend(&mut tree, &mut rng);
        let b = tree.current();

        tree.switch(a).unwrap();
        prop_assert_eq!(&snapshot(tree.field()), &direct);
        tree.switch(b).unwrap();
        tree.switch(a).unwrap();
        prop_assert_eq!(snapshot(tree.field()), direct);
    }
}
