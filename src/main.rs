//! Dots-Engine command line.
//!
//! ## Usage
//!
//! - `dots` - Show a demo
//! - `dots demo` - Play a scripted capture and take it back
//! - `dots random --seed 7 --moves 200` - Play a random game
//! - `dots tree` - Explore branches of a random game with the move tree
//!
//! Rules come from flags (`--width`, `--capture-by-border`, ...) or from a
//! JSON file given with `--rules`. Set `RUST_LOG` to control logging.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use fastrand::Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dots_engine::field::Field;
use dots_engine::game_tree::GameTree;
use dots_engine::moves::FinishReason;
use dots_engine::playout::{random_game, random_move};
use dots_engine::position::{Player, Position};
use dots_engine::rules::{BaseMode, InitialPosition, Rules};

/// Dots-Engine: rules engine for the game of Dots
#[derive(Parser)]
#[command(name = "dots")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    rules: RulesArgs,

    /// Log engine internals (`debug` level) unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scripted capture and take it back
    Demo,
    /// Play a random game and print the final board
    Random {
        /// Seed for the move generator
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Maximum number of dots to place
        #[arg(long, default_value_t = 300)]
        moves: usize,
    },
    /// Build branches of random games and navigate between them
    Tree {
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Dots per branch
        #[arg(long, default_value_t = 10)]
        moves: usize,
        /// Number of branches started from the middle of the main line
        #[arg(long, default_value_t = 3)]
        branches: usize,
    },
}

#[derive(Args)]
struct RulesArgs {
    /// Read rules from a JSON file instead of the flags below
    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,
    #[arg(long, default_value_t = 39)]
    width: u8,
    #[arg(long, default_value_t = 32)]
    height: u8,
    #[arg(long, value_enum, default_value_t = BaseMode::AtLeastOneOpponentDot)]
    base_mode: BaseMode,
    /// Empty enclosures become territory right away
    #[arg(long)]
    capture_empty_base: bool,
    /// The board edge counts as a wall for both players
    #[arg(long)]
    capture_by_border: bool,
    /// Allow moves that only get the mover's dot captured
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    suicide_allowed: bool,
    /// The first two moves must be played in the center
    #[arg(long)]
    opening_restriction: bool,
    /// Compensation shown for the second player
    #[arg(long, default_value_t = 0.0)]
    komi: f64,
    /// Start from the four-dot cross
    #[arg(long)]
    cross: bool,
}

impl RulesArgs {
    fn load(&self) -> Result<Rules> {
        if let Some(path) = &self.rules {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading rules from {}", path.display()))?;
            return serde_json::from_str(&text)
                .with_context(|| format!("parsing rules in {}", path.display()));
        }
        let initial_position = if self.cross {
            InitialPosition::Cross
        } else {
            InitialPosition::Empty
        };
        Ok(Rules::new(self.width, self.height)
            .with_base_mode(self.base_mode)
            .with_capture_empty_base(self.capture_empty_base)
            .with_capture_by_border(self.capture_by_border)
            .with_suicide_allowed(self.suicide_allowed)
            .with_opening_restriction(self.opening_restriction)
            .with_komi(self.komi)
            .with_initial_position(initial_position))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Some(Commands::Random { seed, moves }) => run_random(&cli.rules, seed, moves),
        Some(Commands::Tree {
            seed,
            moves,
            branches,
        }) => run_tree(&cli.rules, seed, moves, branches),
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn new_field(rules: Rules) -> Result<Field> {
    Field::with_diagnostics(rules, |err, position, player| {
        warn!(%position, %player, "initial placement skipped: {err}");
    })
    .context("invalid rules")
}

fn print_scores(field: &Field) {
    println!(
        "Score: first {} - second {} (komi {})",
        field.score(Player::First),
        field.score(Player::Second),
        field.rules().komi()
    );
}

fn run_demo() -> Result<()> {
    println!("Dots-Engine: rules engine for the game of Dots\n");

    let mut field = new_field(Rules::new(5, 5))?;
    field.make_move(Position::new(3, 3), Player::Second)?;
    for (x, y) in [(3, 2), (2, 3), (4, 3), (3, 4)] {
        let result = field.make_move(Position::new(x, y), Player::First)?;
        for base in &result.bases {
            println!("{} closed a base around {} cell(s)", base.player, base.interior.len());
        }
    }
    println!("{field}");
    print_scores(&field);

    field.undo_move()?;
    println!("\nAfter undo:\n{field}");
    print_scores(&field);
    Ok(())
}

fn run_random(args: &RulesArgs, seed: u64, moves: usize) -> Result<()> {
    let mut field = new_field(args.load()?)?;
    let mut rng = Rng::with_seed(seed);

    let played = random_game(&mut field, moves, &mut rng);
    info!(played, seed, "random game finished");

    let player = field.current_player();
    field.finish(player, FinishReason::Grounding)?;

    println!("{field}");
    print_scores(&field);
    if let Some(result) = field.game_result() {
        println!("Result: {result:?}");
    }
    Ok(())
}

fn run_tree(args: &RulesArgs, seed: u64, moves: usize, branches: usize) -> Result<()> {
    let field = new_field(args.load()?)?;
    let mut tree = GameTree::new(field);
    tree.set_memoize_paths(true);
    let mut rng = Rng::with_seed(seed);

    let mut leaves = Vec::new();
    for branch in 0..=branches {
        if branch > 0 {
            // New branches start halfway down the main line
            tree.switch(tree.root())?;
            tree.forward_by(moves / 2);
        }
        for _ in 0..moves {
            let player = tree.field().current_player();
            let Some(position) = random_move(tree.field_mut(), player, &mut rng) else {
                break;
            };
            let result = tree
                .field()
                .last_move()
                .cloned()
                .context("the played move is missing")?;
            tree.add(result, None, None)
                .with_context(|| format!("recording {position}"))?;
        }
        leaves.push(tree.current());
    }
    info!(nodes = tree.len(), leaves = leaves.len(), "tree built");

    for &leaf in &leaves {
        tree.switch(leaf)?;
        let depth = tree.current_node().number();
        println!(
            "Leaf {leaf:?} at depth {depth}: first {} - second {}",
            tree.field().score(Player::First),
            tree.field().score(Player::Second)
        );
    }
    println!("\n{}", tree.field());
    println!("Nodes: {}", tree.len());
    Ok(())
}
