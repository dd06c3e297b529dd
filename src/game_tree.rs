//! Branching move history on top of a [`Field`].
//!
//! The field only keeps a linear undo stack. A [`GameTree`] keeps every
//! explored continuation as a node in an arena and moves the field along with
//! its active node: stepping back undoes, stepping forward and switching
//! replay recorded moves. The root-to-active path always equals the field's
//! move sequence.
//!
//! Nodes are addressed by [`NodeId`]. Ids are never reused, so an id of a
//! removed node stays invalid.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::field::Field;
use crate::moves::{MoveError, MoveResult};
use crate::position::{Player, Position};

/// Errors from tree navigation and bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameTreeError {
    #[error("the active node is the root")]
    NoPredecessor,
    #[error("the active node has no continuation")]
    NoChildren,
    #[error("node {0:?} does not belong to this tree")]
    UnrelatedNode(NodeId),
    /// The field's history no longer matches the active node's path
    #[error("the field and the tree are out of sync")]
    Desynchronized,
    #[error(transparent)]
    Move(#[from] MoveError),
}

/// Index of a node in the tree's arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Identifies a move among its siblings.
pub type MoveKey = (Position, Player);

#[derive(Debug, Clone)]
pub struct Node {
    move_result: Option<MoveResult>,
    previous: Option<NodeId>,
    number: usize,
    /// First entry is the main line.
    children: Vec<(MoveKey, NodeId)>,
    time_left: Option<f64>,
    comment: Option<String>,
}

impl Node {
    fn new(move_result: Option<MoveResult>, previous: Option<NodeId>, number: usize) -> Self {
        Node {
            move_result,
            previous,
            number,
            children: Vec::new(),
            time_left: None,
            comment: None,
        }
    }

    /// The move leading to this node; `None` for the root.
    pub fn move_result(&self) -> Option<&MoveResult> {
        self.move_result.as_ref()
    }

    pub fn key(&self) -> Option<MoveKey> {
        self.move_result.as_ref().map(MoveResult::position_player)
    }

    pub fn previous(&self) -> Option<NodeId> {
        self.previous
    }

    /// Depth in the tree: 0 for the root, parent + 1 otherwise.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn is_root(&self) -> bool {
        self.previous.is_none()
    }

    /// Children in registration order, main line first.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().map(|&(_, id)| id)
    }

    pub fn child(&self, key: MoveKey) -> Option<NodeId> {
        self.children
            .iter()
            .find(|(child_key, _)| *child_key == key)
            .map(|&(_, id)| id)
    }

    /// Clock of the mover after this move, if recorded.
    pub fn time_left(&self) -> Option<f64> {
        self.time_left
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

#[derive(Debug)]
pub struct GameTree {
    field: Field,
    nodes: Vec<Option<Node>>,
    root: NodeId,
    current: NodeId,
    live: usize,
    memoize_paths: bool,
    paths: HashMap<NodeId, Vec<NodeId>>,
}

impl GameTree {
    /// Wrap `field`. Moves already played on it become the main line.
    pub fn new(field: Field) -> Self {
        let mut tree = GameTree {
            field,
            nodes: vec![Some(Node::new(None, None, 0))],
            root: NodeId(0),
            current: NodeId(0),
            live: 1,
            memoize_paths: false,
            paths: HashMap::new(),
        };
        let played = tree.field.moves().to_vec();
        for result in played {
            tree.attach(result);
        }
        tree
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Mutable access for applying a move before [`GameTree::add`].
    ///
    /// Any other change to the move history desynchronizes the tree; its
    /// navigation then fails with [`GameTreeError::Desynchronized`].
    pub fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    pub fn into_field(self) -> Field {
        self.field
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The active node.
    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn current_node(&self) -> &Node {
        // The active node is never removed
        self.nodes[self.current.0]
            .as_ref()
            .unwrap_or_else(|| unreachable!("active node {:?} was removed", self.current))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// All live nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.as_ref().map(|node| (NodeId(i), node)))
    }

    /// Number of live nodes, root included; never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Cache root-to-node paths to speed up repeated switching.
    pub fn set_memoize_paths(&mut self, enabled: bool) {
        self.memoize_paths = enabled;
        if !enabled {
            self.paths.clear();
        }
    }

    /// Record `result`, which must already be the field's last move.
    ///
    /// Returns `true` if a new child was created, `false` if the active node
    /// already had a child for the same `(position, player)`. Either way the
    /// child becomes the active node.
    pub fn add(
        &mut self,
        result: MoveResult,
        time_left: Option<f64>,
        comment: Option<String>,
    ) -> Result<bool, GameTreeError> {
        let key = result.position_player();
        let in_sync = self.field.moves_count() == self.current_node().number + 1
            && self.field.last_move().map(MoveResult::position_player) == Some(key);
        if !in_sync {
            return Err(GameTreeError::Desynchronized);
        }

        if let Some(existing) = self.current_node().child(key) {
            self.current = existing;
            return Ok(false);
        }

        let id = self.attach(result);
        if let Some(node) = self.nodes[id.0].as_mut() {
            node.time_left = time_left;
            node.comment = comment;
        }
        Ok(true)
    }

    /// Play a move on the field and record it.
    pub fn play(&mut self, position: Position, player: Player) -> Result<bool, GameTreeError> {
        self.ensure_sync()?;
        let result = self.field.make_move(position, player)?.clone();
        self.add(result, None, None)
    }

    /// Undo the active move and move to its predecessor.
    pub fn step_back(&mut self) -> Result<(), GameTreeError> {
        self.ensure_sync()?;
        let previous = self
            .current_node()
            .previous
            .ok_or(GameTreeError::NoPredecessor)?;
        self.field.undo_move()?;
        self.current = previous;
        Ok(())
    }

    /// Replay the main-line child of the active node.
    pub fn step_forward(&mut self) -> Result<(), GameTreeError> {
        self.ensure_sync()?;
        let next = self
            .current_node()
            .children()
            .next()
            .ok_or(GameTreeError::NoChildren)?;
        self.replay(&[next])?;
        self.current = next;
        Ok(())
    }

    /// Step back up to `n` times; returns the number of steps taken.
    pub fn back_by(&mut self, n: usize) -> usize {
        (0..n).take_while(|_| self.step_back().is_ok()).count()
    }

    /// Step forward along the main line up to `n` times; returns the number
    /// of steps taken.
    pub fn forward_by(&mut self, n: usize) -> usize {
        (0..n).take_while(|_| self.step_forward().is_ok()).count()
    }

    /// Make `target` the active node, undoing to the lowest common ancestor
    /// and replaying down to `target`.
    #[instrument(level = "trace", skip(self))]
    pub fn switch(&mut self, target: NodeId) -> Result<(), GameTreeError> {
        self.ensure_sync()?;
        if self.node(target).is_none() {
            return Err(GameTreeError::UnrelatedNode(target));
        }
        if target == self.current {
            return Ok(());
        }

        let (ancestor, down) = self.route(target)?;
        let ancestor_number = self
            .node(ancestor)
            .map(Node::number)
            .ok_or(GameTreeError::UnrelatedNode(ancestor))?;

        // Nodes being left, nearest first
        let mut up = Vec::new();
        let mut id = self.current;
        while let Some(node) = self.node(id).filter(|node| node.number > ancestor_number) {
            up.push(id);
            id = node.previous.ok_or(GameTreeError::UnrelatedNode(id))?;
        }

        for undone in 0..up.len() {
            if let Err(err) = self.field.undo_move() {
                let redo: Vec<NodeId> = up[..undone].iter().rev().copied().collect();
                self.replay(&redo)?;
                return Err(err.into());
            }
        }
        if let Err(err) = self.replay(&down) {
            let redo: Vec<NodeId> = up.iter().rev().copied().collect();
            self.replay(&redo)?;
            return Err(err);
        }

        debug!(from = ?self.current, to = ?target, back = up.len(), forward = down.len(), "switched");
        self.current = target;
        Ok(())
    }

    /// Remove the active node with its whole subtree, stepping back to its
    /// predecessor.
    pub fn remove(&mut self) -> Result<(), GameTreeError> {
        let removed = self.current;
        let key = self
            .current_node()
            .key()
            .ok_or(GameTreeError::NoPredecessor)?;
        self.step_back()?;

        let parent = self.current;
        if let Some(node) = self.nodes[parent.0].as_mut() {
            node.children.retain(|&(child_key, _)| child_key != key);
        }

        let mut stack = vec![removed];
        let mut count = 0;
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes[id.0].take() {
                stack.extend(node.children());
                self.paths.remove(&id);
                count += 1;
            }
        }
        self.live -= count;
        debug!(?removed, count, "removed subtree");
        Ok(())
    }

    /// The moves from the root to `id`, `None` for an unknown node.
    pub fn path_to(&mut self, id: NodeId) -> Option<Vec<MoveKey>> {
        let path = self.id_path(id)?;
        Some(
            path.iter()
                .filter_map(|&id| self.node(id).and_then(Node::key))
                .collect(),
        )
    }

    fn attach(&mut self, result: MoveResult) -> NodeId {
        let key = result.position_player();
        let number = self.current_node().number + 1;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(Some(result), Some(self.current), number)));
        if let Some(parent) = self.nodes[self.current.0].as_mut() {
            parent.children.push((key, id));
        }
        self.live += 1;
        self.current = id;
        id
    }

    fn ensure_sync(&self) -> Result<(), GameTreeError> {
        if self.field.moves_count() == self.current_node().number {
            Ok(())
        } else {
            Err(GameTreeError::Desynchronized)
        }
    }

    /// Replay the moves of `path` in order. On failure the moves already
    /// replayed are undone again.
    fn replay(&mut self, path: &[NodeId]) -> Result<(), GameTreeError> {
        for (applied, &id) in path.iter().enumerate() {
            let key = self.node(id).and_then(Node::key);
            let outcome = match key {
                Some((position, player)) => self
                    .field
                    .make_move_unchecked(position, player)
                    .map(|_| ())
                    .map_err(GameTreeError::from),
                None => Err(GameTreeError::UnrelatedNode(id)),
            };
            if let Err(err) = outcome {
                for _ in 0..applied {
                    self.field.undo_move()?;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Lowest common ancestor of the active node and `target`, with the
    /// nodes below it leading to `target`.
    fn route(&mut self, target: NodeId) -> Result<(NodeId, Vec<NodeId>), GameTreeError> {
        if self.memoize_paths {
            let current = self
                .id_path(self.current)
                .ok_or(GameTreeError::UnrelatedNode(self.current))?;
            let path = self
                .id_path(target)
                .ok_or(GameTreeError::UnrelatedNode(target))?;
            let common = current
                .iter()
                .zip(&path)
                .take_while(|(a, b)| a == b)
                .count();
            let ancestor = common
                .checked_sub(1)
                .and_then(|i| path.get(i).copied())
                .ok_or(GameTreeError::UnrelatedNode(target))?;
            return Ok((ancestor, path[common..].to_vec()));
        }

        let mut visited = HashSet::new();
        let mut id = Some(self.current);
        while let Some(node_id) = id {
            visited.insert(node_id);
            if node_id == target {
                break;
            }
            id = self.node(node_id).and_then(Node::previous);
        }

        let mut down = Vec::new();
        let mut id = Some(target);
        while let Some(node_id) = id {
            if visited.contains(&node_id) {
                down.reverse();
                return Ok((node_id, down));
            }
            down.push(node_id);
            id = self.node(node_id).and_then(Node::previous);
        }
        Err(GameTreeError::UnrelatedNode(target))
    }

    /// Node ids from the root to `id`, both included.
    fn id_path(&mut self, id: NodeId) -> Option<Vec<NodeId>> {
        if let Some(path) = self.paths.get(&id) {
            return Some(path.clone());
        }
        self.node(id)?;
        let mut path = Vec::new();
        let mut next = Some(id);
        while let Some(node_id) = next {
            path.push(node_id);
            next = self.node(node_id).and_then(Node::previous);
        }
        path.reverse();
        if self.memoize_paths {
            self.paths.insert(id, path.clone());
        }
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rules;

    fn tree() -> GameTree {
        GameTree::new(Field::new(Rules::new(5, 5)).unwrap())
    }

    fn pos(x: u8, y: u8) -> Position {
        Position::new(x, y)
    }

    fn field_path(tree: &GameTree) -> Vec<MoveKey> {
        tree.field()
            .moves()
            .iter()
            .map(MoveResult::position_player)
            .collect()
    }

    #[test]
    fn test_add_reports_existing_child() {
        let mut tree = tree();
        assert!(tree.play(pos(1, 1), Player::First).unwrap());
        tree.step_back().unwrap();
        assert!(!tree.play(pos(1, 1), Player::First).unwrap());
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.current_node().number(), 1);
    }

    #[test]
    fn test_add_requires_applied_move() {
        let mut tree = tree();
        let result = tree
            .field_mut()
            .make_move(pos(2, 2), Player::First)
            .unwrap()
            .clone();
        let mut other = result.clone();
        other.position = pos(3, 3);
        assert_eq!(
            tree.add(other, None, None),
            Err(GameTreeError::Desynchronized)
        );
        assert!(tree.add(result, Some(12.5), Some("opening".into())).unwrap());
        assert_eq!(tree.current_node().time_left(), Some(12.5));
        assert_eq!(tree.current_node().comment(), Some("opening"));
    }

    #[test]
    fn test_navigation_errors() {
        let mut tree = tree();
        assert_eq!(tree.step_back(), Err(GameTreeError::NoPredecessor));
        assert_eq!(tree.step_forward(), Err(GameTreeError::NoChildren));
        assert_eq!(tree.remove(), Err(GameTreeError::NoPredecessor));
        assert_eq!(
            tree.switch(NodeId(42)),
            Err(GameTreeError::UnrelatedNode(NodeId(42)))
        );
        assert_eq!(tree.switch(tree.root()), Ok(()));
    }

    #[test]
    fn test_step_forward_follows_main_line() {
        let mut tree = tree();
        tree.play(pos(1, 1), Player::First).unwrap();
        tree.step_back().unwrap();
        tree.play(pos(2, 2), Player::First).unwrap();
        assert_eq!(tree.back_by(5), 1);
        assert_eq!(tree.forward_by(5), 1);
        assert_eq!(field_path(&tree), vec![(pos(1, 1), Player::First)]);
    }

    #[test]
    fn test_switch_between_branches() {
        for memoize in [false, true] {
            let mut tree = tree();
            tree.set_memoize_paths(memoize);
            tree.play(pos(1, 1), Player::First).unwrap();
            tree.play(pos(2, 2), Player::Second).unwrap();
            let a = tree.current();
            tree.back_by(1);
            tree.play(pos(3, 3), Player::Second).unwrap();
            tree.play(pos(4, 4), Player::First).unwrap();
            let b = tree.current();

            tree.switch(a).unwrap();
            assert_eq!(tree.current(), a);
            assert_eq!(field_path(&tree), tree.path_to(a).unwrap());

            tree.switch(b).unwrap();
            assert_eq!(field_path(&tree), tree.path_to(b).unwrap());
            assert_eq!(tree.field().moves_count(), 3);

            tree.switch(tree.root()).unwrap();
            assert_eq!(tree.field().moves_count(), 0);
        }
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = tree();
        tree.play(pos(1, 1), Player::First).unwrap();
        let branch = tree.current();
        tree.play(pos(2, 2), Player::Second).unwrap();
        tree.play(pos(3, 3), Player::First).unwrap();
        tree.back_by(1);
        tree.play(pos(4, 4), Player::First).unwrap();
        assert_eq!(tree.len(), 5);

        tree.switch(branch).unwrap();
        tree.remove().unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.current(), tree.root());
        assert_eq!(tree.current_node().children().count(), 0);
        assert!(tree.node(branch).is_none());
        assert_eq!(tree.field().moves_count(), 0);
    }

    #[test]
    fn test_adopts_played_moves() {
        let mut field = Field::new(Rules::new(5, 5)).unwrap();
        field.make_move(pos(1, 1), Player::First).unwrap();
        field.make_move(pos(2, 1), Player::Second).unwrap();
        let mut tree = GameTree::new(field);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.current_node().number(), 2);
        assert_eq!(tree.back_by(3), 2);
    }

    #[test]
    fn test_detects_foreign_changes() {
        let mut tree = tree();
        tree.play(pos(1, 1), Player::First).unwrap();
        tree.field_mut().make_move(pos(2, 2), Player::Second).unwrap();
        assert_eq!(tree.step_back(), Err(GameTreeError::Desynchronized));
        assert_eq!(tree.field().moves_count(), 2);
    }
}
