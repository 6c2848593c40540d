//! Checks whether every leaf of a binary tree sits at the same depth.

use std::cmp::max;

/// A plain, unbalanced binary tree.
pub type Tree<T> = Option<Box<Node<T>>>;

/// A struct representing a node of a plain binary tree.
pub struct Node<T> {
    pub key: T,
    pub left: Tree<T>,
    pub right: Tree<T>,
}

impl<T> Node<T> {
    pub fn new(key: T) -> Self {
        Node {
            key,
            left: None,
            right: None,
        }
    }

    pub fn with_children(key: T, left: Tree<T>, right: Tree<T>) -> Self {
        Node { key, left, right }
    }
}

// Returns the number of nodes on every root-to-leaf path, or `None` if the paths differ.
fn path_len<T>(tree: &Tree<T>) -> Option<usize> {
    match tree {
        None => Some(0),
        Some(ref node) => {
            let left = path_len(&node.left)?;
            let right = path_len(&node.right)?;
            if node.left.is_some() && node.right.is_some() && left != right {
                return None;
            }
            Some(max(left, right) + 1)
        },
    }
}

/// Returns `true` if all root-to-leaf paths of the tree have the same length. An empty tree
/// trivially satisfies this, and a node with a single child only has the paths through that
/// child.
///
/// # Examples
///
/// ```
/// use avl_collections::equal_paths::{equal_paths, Node};
///
/// let balanced = Some(Box::new(Node::with_children(
///     2,
///     Some(Box::new(Node::new(1))),
///     Some(Box::new(Node::new(3))),
/// )));
/// assert!(equal_paths(&balanced));
///
/// let lopsided = Some(Box::new(Node::with_children(
///     2,
///     Some(Box::new(Node::with_children(1, Some(Box::new(Node::new(0))), None))),
///     Some(Box::new(Node::new(3))),
/// )));
/// assert!(!equal_paths(&lopsided));
/// ```
pub fn equal_paths<T>(tree: &Tree<T>) -> bool {
    path_len(tree).is_some()
}
