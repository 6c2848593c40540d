use crate::arena::Slot;
use crate::entry::Entry;

/// The side of a node on which a child hangs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// The change in balance factor when the subtree on this side grows by one level.
    pub fn weight(self) -> i8 {
        match self {
            Side::Left => 1,
            Side::Right => -1,
        }
    }

    /// The heavy side of a node with a non-zero balance factor.
    pub fn heavier(balance: i8) -> Side {
        if balance > 0 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// A struct representing an internal node of an avl tree.
///
/// `left` and `right` own their subtrees: a node is only freed after it is unlinked from its
/// parent. `parent` is a back-link that never owns anything and is `None` for the root.
pub struct Node<T, U> {
    pub entry: Entry<T, U>,
    pub balance: i8,
    pub parent: Option<Slot>,
    pub left: Option<Slot>,
    pub right: Option<Slot>,
}

impl<T, U> Node<T, U> {
    pub fn new(key: T, value: U, parent: Option<Slot>) -> Self {
        Node {
            entry: Entry { key, value },
            balance: 0,
            parent,
            left: None,
            right: None,
        }
    }

    pub fn child(&self, side: Side) -> Option<Slot> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn child_mut(&mut self, side: Side) -> &mut Option<Slot> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Returns the side on which `child` hangs off this node.
    pub fn side_of(&self, child: Slot) -> Side {
        if self.left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }
}
