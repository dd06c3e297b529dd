//! Enclosure detection for a single move.
//!
//! [`find_bases`] is a pure function: it looks at the grid as it would be
//! right after the dot is placed and reports every base the move creates,
//! each with the prior state of the cells it will change. Nothing is
//! written until the [`Field`](crate::field::Field) has accepted the move,
//! which keeps rejected moves free of side effects.
//!
//! Closures are found with Moore-neighbor contour tracing around each
//! orthogonal neighbor of the new dot. The signed area of the traced walk
//! tells an enclosing loop (positive) from the outer contour of a blob of
//! dots (negative or zero). The interior is then flood-filled with
//! 4-connectivity, bounded by the traced closure.

use std::cmp::Reverse;
use std::collections::{HashSet, VecDeque};

use tracing::trace;

use crate::constants::CLOCKWISE;
use crate::grid::Grid;
use crate::moves::{Base, BaseKind};
use crate::position::{CellState, Player, Position};
use crate::rules::{BaseMode, Rules};

/// Bases produced by one placement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Captures {
    /// Bases in discovery order (clockwise from North around the new dot).
    pub bases: Vec<Base>,
    /// The new dot landed in an opponent's unsettled region and got
    /// captured: `bases` then holds only that opponent base.
    pub suicide: bool,
}

impl Captures {
    /// Score change `[first, second]` from applying every base.
    pub fn score_delta(&self) -> [i32; 2] {
        let mut delta = [0; 2];
        for base in &self.bases {
            delta[base.player.index()] += base.captured() as i32;
            delta[base.player.opponent().index()] -= base.freed() as i32;
        }
        delta
    }
}

/// Orthogonal neighbor offsets, clockwise from North.
fn orthogonal() -> impl Iterator<Item = (i16, i16)> {
    CLOCKWISE.into_iter().step_by(2)
}

/// Signed coordinates, so the trace may probe cells beyond the ring.
type Coord = (i16, i16);

fn coord(pos: Position) -> Coord {
    (i16::from(pos.x()), i16::from(pos.y()))
}

fn to_position(c: Coord) -> Option<Position> {
    Some(Position::new(u8::try_from(c.0).ok()?, u8::try_from(c.1).ok()?))
}

/// Read-only view of the grid with the new dot overlaid.
struct View<'a> {
    grid: &'a Grid,
    placed: Position,
    placed_state: CellState,
    walls_active: bool,
}

impl View<'_> {
    fn cell(&self, pos: Position) -> Option<CellState> {
        if pos == self.placed {
            Some(self.placed_state)
        } else {
            self.grid.cell(pos)
        }
    }

    fn is_boundary_state(&self, state: CellState, owner: Player) -> bool {
        if state.is_border() {
            self.walls_active
        } else {
            state.is_active(owner)
        }
    }

    fn is_boundary(&self, c: Coord, owner: Player) -> Option<Position> {
        let pos = to_position(c)?;
        let state = self.cell(pos)?;
        self.is_boundary_state(state, owner).then_some(pos)
    }
}

/// Compute every base created by `player` placing a dot at `position`.
///
/// The cell at `position` must be free; the grid is not modified.
pub fn find_bases(grid: &Grid, rules: &Rules, position: Position, player: Player) -> Captures {
    let view = View {
        grid,
        placed: position,
        placed_state: CellState::placed(player),
        walls_active: rules.capture_by_border(),
    };

    let mut enclosures = Vec::new();
    let mut open = false;
    let mut claimed: HashSet<Position> = HashSet::new();
    for (dx, dy) in orthogonal() {
        let Some(hint) = position.offset(dx, dy) else {
            continue;
        };
        if claimed.contains(&hint) {
            continue;
        }
        match view.cell(hint) {
            Some(state) if !state.is_border() && !state.is_active(player) => {}
            _ => continue,
        }
        let Some((closure, interior)) = enclose(&view, position, hint, player) else {
            open = true;
            continue;
        };
        if !separates(&view, position, player, &interior) {
            // The region was already closed before this move
            continue;
        }
        claimed.extend(interior.iter().copied());
        let walled = view.walls_active && !sealed_without_walls(&view, hint, &closure);
        enclosures.push((closure, interior, walled));
    }

    if view.walls_active && !open {
        // Walled in on every side: the largest region leaning on the walls
        // is the outside
        let outside = enclosures
            .iter()
            .enumerate()
            .filter(|(_, (_, _, walled))| *walled)
            .max_by_key(|(_, (_, interior, _))| {
                (interior.len(), Reverse(opponent_dots(&view, player, interior)))
            })
            .map(|(i, _)| i);
        if let Some(i) = outside {
            enclosures.remove(i);
        }
    }

    let mut bases = Vec::new();
    for (closure, interior, _) in enclosures {
        if let Some(base) = classify(&view, rules, player, closure, interior) {
            trace!(%position, %player, kind = ?base.kind, cells = base.interior.len(), "enclosure");
            bases.push(base);
        }
    }

    if !bases.iter().any(Base::is_real) {
        let owner = player.opponent();
        // Only the strict mode leaves sealed holes unmarked
        let marked = grid.state(position).empty_territory_player() == Some(owner);
        if marked || rules.base_mode() == BaseMode::AllOpponentDots {
            if let Some(base) = surround(&view, rules, position, owner).filter(Base::is_real) {
                trace!(%position, %owner, "dot placed inside a sealed region");
                return Captures {
                    bases: vec![base],
                    suicide: true,
                };
            }
        }
    }

    Captures {
        bases,
        suicide: false,
    }
}

/// Write the new states of `base` into `grid`.
pub fn apply_base(grid: &mut Grid, base: &Base) {
    for &(pos, previous) in &base.previous_states {
        let next = match base.kind {
            BaseKind::Capture { .. } | BaseKind::Territory => previous.with_territory(base.player),
            BaseKind::Unsettled => previous.with_empty_territory(base.player),
        };
        grid.set(pos, next);
    }
}

/// Restore the prior states recorded by `base`.
pub fn revert_base(grid: &mut Grid, base: &Base) {
    for &(pos, previous) in base.previous_states.iter().rev() {
        grid.set(pos, previous);
    }
}

/// Trace the closure through `start` hugging the region of `hint`, and fill
/// its interior. `None` unless the closure really encloses `hint`.
fn enclose(
    view: &View<'_>,
    start: Position,
    hint: Position,
    owner: Player,
) -> Option<(Vec<Position>, Vec<Position>)> {
    let (closure, square) = trace_closure(view, start, hint, owner)?;
    if square <= 0 {
        return None;
    }
    let boundary: HashSet<Position> = closure.iter().copied().collect();
    let interior = fill(view, hint, |pos, _| boundary.contains(&pos))?;
    Some((closure, interior))
}

/// First boundary cell clockwise around `center`, starting at `from`.
///
/// Returns the found cell and the last non-boundary cell checked before it,
/// which is where the scan around the found cell has to start.
fn next_boundary(
    view: &View<'_>,
    center: Coord,
    from: Coord,
    owner: Player,
) -> Option<(Position, Coord)> {
    let start = CLOCKWISE
        .iter()
        .position(|&(dx, dy)| (center.0 + dx, center.1 + dy) == from)?;
    let mut backtrack = from;
    for i in 0..CLOCKWISE.len() {
        let (dx, dy) = CLOCKWISE[(start + i) % CLOCKWISE.len()];
        let c = (center.0 + dx, center.1 + dy);
        if let Some(found) = view.is_boundary(c, owner) {
            return Some((found, backtrack));
        }
        backtrack = c;
    }
    None
}

/// Moore-neighbor tracing with Jacob's stopping criterion.
///
/// Returns the closure and the signed area of the walk.
fn trace_closure(
    view: &View<'_>,
    start: Position,
    hint: Position,
    owner: Player,
) -> Option<(Vec<Position>, i32)> {
    let (first, mut backtrack) = next_boundary(view, coord(start), coord(hint), owner)?;
    let mut closure = vec![start];
    let mut square = start.square(first);
    let mut current = first;
    let limit = 8 * view.grid.len() + CLOCKWISE.len();
    for _ in 0..limit {
        let (next, next_backtrack) = next_boundary(view, coord(current), backtrack, owner)?;
        if current == start && next == first {
            return Some((closure, square));
        }
        closure.push(current);
        square += current.square(next);
        current = next;
        backtrack = next_backtrack;
    }
    None
}

/// 4-connected flood fill from `seed`, stopping at cells where `is_barrier`
/// holds. `None` if the fill reaches a border cell that is not a barrier.
fn fill(
    view: &View<'_>,
    seed: Position,
    is_barrier: impl Fn(Position, CellState) -> bool,
) -> Option<Vec<Position>> {
    let mut visited = HashSet::from([seed]);
    let mut queue = VecDeque::from([seed]);
    let mut region = Vec::new();

    while let Some(pos) = queue.pop_front() {
        region.push(pos);
        for (dx, dy) in orthogonal() {
            let next = pos.offset(dx, dy)?;
            if visited.contains(&next) {
                continue;
            }
            let state = view.cell(next)?;
            if is_barrier(next, state) {
                continue;
            }
            if state.is_border() {
                return None;
            }
            visited.insert(next);
            queue.push_back(next);
        }
    }

    Some(region)
}

/// Whether `closure` seals the region of `hint` without help from the walls.
fn sealed_without_walls(view: &View<'_>, hint: Position, closure: &[Position]) -> bool {
    let boundary: HashSet<Position> = closure.iter().copied().collect();
    fill(view, hint, |pos, state| !state.is_border() && boundary.contains(&pos)).is_some()
}

/// Whether the new dot split `interior` off from the rest of the board:
/// some open neighbor of `position` lies outside it.
fn separates(view: &View<'_>, position: Position, owner: Player, interior: &[Position]) -> bool {
    orthogonal().any(|(dx, dy)| {
        let Some(neighbor) = position.offset(dx, dy) else {
            return false;
        };
        match view.cell(neighbor) {
            Some(state) => !view.is_boundary_state(state, owner) && !interior.contains(&neighbor),
            None => false,
        }
    })
}

/// The base `owner` holds around `position`, if the region of cells not
/// active for `owner` that contains it is sealed.
fn surround(view: &View<'_>, rules: &Rules, position: Position, owner: Player) -> Option<Base> {
    let region = fill(view, position, |_, state| view.is_boundary_state(state, owner))?;
    let top = *region.iter().min_by_key(|pos| (pos.y(), pos.x()))?;
    let start = top.offset(0, -1)?;
    let (closure, interior) = enclose(view, start, top, owner)?;
    classify(view, rules, owner, closure, interior)
}

/// Uncaptured opponent dots among `cells`.
fn opponent_dots(view: &View<'_>, owner: Player, cells: &[Position]) -> usize {
    cells
        .iter()
        .filter_map(|&pos| view.cell(pos))
        .filter(|state| {
            state.placed_player() == Some(owner.opponent()) && state.territory_player() != Some(owner)
        })
        .count()
}

/// Credit an enclosure of `owner` according to the base mode.
fn classify(
    view: &View<'_>,
    rules: &Rules,
    owner: Player,
    closure: Vec<Position>,
    interior: Vec<Position>,
) -> Option<Base> {
    let opponent = owner.opponent();
    let mut captured = 0;
    let mut freed = 0;
    let mut all_opponent = true;
    for &pos in &interior {
        let state = view.cell(pos)?;
        match state.placed_player() {
            Some(player) if player == opponent && state.territory_player() != Some(owner) => {
                captured += 1;
            }
            Some(player) if player == owner && state.territory_player() == Some(opponent) => {
                freed += 1;
                all_opponent = false;
            }
            _ => all_opponent = false,
        }
    }

    let takes_dots = captured > 0 || freed > 0;
    let capture = BaseKind::Capture { captured, freed };
    let kind = match rules.base_mode() {
        BaseMode::AtLeastOneOpponentDot if takes_dots => capture,
        BaseMode::AtLeastOneOpponentDot if rules.capture_empty_base() => BaseKind::Territory,
        BaseMode::AtLeastOneOpponentDot => BaseKind::Unsettled,
        BaseMode::AnySurrounding if takes_dots => capture,
        BaseMode::AnySurrounding => BaseKind::Territory,
        BaseMode::AllOpponentDots if all_opponent && captured > 0 => capture,
        BaseMode::AllOpponentDots => return None,
    };

    let mut previous_states = Vec::new();
    for &pos in &interior {
        let state = view.cell(pos)?;
        let changes = match kind {
            BaseKind::Capture { .. } | BaseKind::Territory => {
                state.with_territory(owner) != state
            }
            BaseKind::Unsettled => {
                state.is_free() && state.empty_territory_player() != Some(owner)
            }
        };
        if changes {
            previous_states.push((pos, state));
        }
    }

    Some(Base {
        player: owner,
        kind,
        closure,
        interior,
        previous_states,
    })
}
