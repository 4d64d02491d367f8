//! Downward tree search
//!
//! A pre-order depth-first search over any structure that can list a node's
//! children. The search keeps an explicit stack and a visited set, so a
//! malformed graph (a token reachable from itself) cannot make it loop.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Anything whose nodes own an ordered list of child nodes
pub trait Tree {
    type Node: Copy + Eq + Hash + Into<usize>;

    /// Children of `node`, in their given order
    fn children(&self, node: Self::Node) -> &[Self::Node];
}

/// What the search does when it reaches a node a second time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Skip the revisited node and continue with the rest of the search
    #[default]
    Skip,
    /// Abort the search with [`TraversalError::Cycle`]
    Error,
}

impl std::str::FromStr for CyclePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidValue {
                key: "RUFEERS_ON_CYCLE".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for CyclePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Bounds applied to a single search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalLimits {
    /// Deepest level below the start node the search may descend to
    pub max_depth: usize,
    pub on_cycle: CyclePolicy,
}

impl TraversalLimits {
    pub const DEFAULT_MAX_DEPTH: usize = 512;

    pub fn new(max_depth: usize, on_cycle: CyclePolicy) -> Self {
        Self {
            max_depth,
            on_cycle,
        }
    }
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DEPTH, CyclePolicy::default())
    }
}

/// Errors raised when a search hits one of its bounds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraversalError {
    #[error("Traversal from token {start} exceeded the depth limit of {limit}")]
    DepthExceeded { start: usize, limit: usize },

    #[error("Token {token} was reached twice; the dependency graph contains a cycle")]
    Cycle { token: usize },
}

/// Find the first descendant of `start`, in pre-order, matching `predicate`
///
/// `start` itself is never tested. Siblings are visited in the order
/// [`Tree::children`] returns them, and each child's whole subtree is searched
/// before its next sibling.
pub fn find_first<T, P>(
    tree: &T,
    start: T::Node,
    mut predicate: P,
    limits: TraversalLimits,
) -> Result<Option<T::Node>, TraversalError>
where
    T: Tree + ?Sized,
    P: FnMut(T::Node) -> bool,
{
    let mut visited: HashSet<T::Node> = HashSet::new();
    visited.insert(start);

    // Children are pushed in reverse so the first child is popped first
    let mut stack: Vec<(T::Node, usize)> = tree
        .children(start)
        .iter()
        .rev()
        .map(|&child| (child, 1))
        .collect();

    while let Some((node, depth)) = stack.pop() {
        if depth > limits.max_depth {
            return Err(TraversalError::DepthExceeded {
                start: start.into(),
                limit: limits.max_depth,
            });
        }

        if !visited.insert(node) {
            let token: usize = node.into();
            match limits.on_cycle {
                CyclePolicy::Skip => {
                    tracing::warn!(token, "Skipping token reached twice during traversal");
                    continue;
                }
                CyclePolicy::Error => return Err(TraversalError::Cycle { token }),
            }
        }

        if predicate(node) {
            return Ok(Some(node));
        }

        stack.extend(
            tree.children(node)
                .iter()
                .rev()
                .map(|&child| (child, depth + 1)),
        );
    }

    Ok(None)
}
