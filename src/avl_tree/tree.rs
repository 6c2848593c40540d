use crate::arena::{Slot, TypedArena};
use crate::avl_tree::node::{Node, Side};
use crate::entry::Entry;
use log::{debug, trace};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

/// The node arena together with the handle of the root node.
pub struct Tree<T, U> {
    pub arena: TypedArena<Node<T, U>>,
    pub root: Option<Slot>,
}

impl<T, U> Tree<T, U> {
    pub fn new(chunk_size: usize) -> Self {
        Tree {
            arena: TypedArena::new(chunk_size),
            root: None,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }
}

// Re-points the link that referred to `old` (a child link of `parent`, or the root) at `new`.
fn replace_child<T, U>(tree: &mut Tree<T, U>, parent: Option<Slot>, old: Slot, new: Option<Slot>) {
    match parent {
        None => tree.root = new,
        Some(parent) => {
            let side = tree.arena[parent].side_of(old);
            *tree.arena[parent].child_mut(side) = new;
        },
    }
}

fn rotate_left<T, U>(tree: &mut Tree<T, U>, pivot: Slot) {
    let child = tree.arena[pivot]
        .right
        .expect("Expected right child node to be `Some`.");
    trace!("rotating left around {:?}", pivot);

    let inner = tree.arena[child].left;
    tree.arena[pivot].right = inner;
    if let Some(inner) = inner {
        tree.arena[inner].parent = Some(pivot);
    }

    let parent = tree.arena[pivot].parent;
    tree.arena[child].parent = parent;
    replace_child(tree, parent, pivot, Some(child));

    tree.arena[child].left = Some(pivot);
    tree.arena[pivot].parent = Some(child);
}

fn rotate_right<T, U>(tree: &mut Tree<T, U>, pivot: Slot) {
    let child = tree.arena[pivot]
        .left
        .expect("Expected left child node to be `Some`.");
    trace!("rotating right around {:?}", pivot);

    let inner = tree.arena[child].right;
    tree.arena[pivot].left = inner;
    if let Some(inner) = inner {
        tree.arena[inner].parent = Some(pivot);
    }

    let parent = tree.arena[pivot].parent;
    tree.arena[child].parent = parent;
    replace_child(tree, parent, pivot, Some(child));

    tree.arena[child].right = Some(pivot);
    tree.arena[pivot].parent = Some(child);
}

// Lifts the child of `pivot` on `side` into the position of `pivot`.
fn promote<T, U>(tree: &mut Tree<T, U>, pivot: Slot, side: Side) {
    match side {
        Side::Left => rotate_right(tree, pivot),
        Side::Right => rotate_left(tree, pivot),
    }
}

// Resolves a zig-zag below `slot`, where `heavy` is the child of `slot` on `side` and leans the
// other way. The grandchild ends up as the root of the subtree with a balance of zero.
fn rotate_double<T, U>(tree: &mut Tree<T, U>, slot: Slot, heavy: Slot, side: Side) {
    let grandchild = tree.arena[heavy]
        .child(side.opposite())
        .expect("Expected grandchild node to be `Some`.");
    let weight = side.weight();
    let grandchild_balance = tree.arena[grandchild].balance;

    promote(tree, heavy, side.opposite());
    promote(tree, slot, side);

    let (slot_balance, heavy_balance) = if grandchild_balance == weight {
        (-weight, 0)
    } else if grandchild_balance == 0 {
        (0, 0)
    } else {
        (0, weight)
    };
    tree.arena[slot].balance = slot_balance;
    tree.arena[heavy].balance = heavy_balance;
    tree.arena[grandchild].balance = 0;
}

fn heavy_child<T, U>(tree: &Tree<T, U>, slot: Slot, side: Side) -> Slot {
    tree.arena[slot]
        .child(side)
        .expect("Expected heavy child node to be `Some`.")
}

// Restores a node whose balance reached two on `side` after an insertion. The subtree regains
// its height from before the insertion.
fn fix_insert_imbalance<T, U>(tree: &mut Tree<T, U>, slot: Slot, side: Side) {
    let heavy = heavy_child(tree, slot, side);
    if tree.arena[heavy].balance == side.weight() {
        promote(tree, slot, side);
        tree.arena[slot].balance = 0;
        tree.arena[heavy].balance = 0;
        debug!("insert rebalanced {:?} with a single rotation", slot);
    } else {
        rotate_double(tree, slot, heavy, side);
        debug!("insert rebalanced {:?} with a double rotation", slot);
    }
}

// Restores a node whose balance reached two on `side` after a removal. Returns `true` if the
// subtree lost a level, in which case the walk continues upward.
fn fix_remove_imbalance<T, U>(tree: &mut Tree<T, U>, slot: Slot, side: Side) -> bool {
    let heavy = heavy_child(tree, slot, side);
    let weight = side.weight();
    let heavy_balance = tree.arena[heavy].balance;

    if heavy_balance == weight {
        promote(tree, slot, side);
        tree.arena[slot].balance = 0;
        tree.arena[heavy].balance = 0;
        debug!("remove rebalanced {:?} with a single rotation", slot);
        true
    } else if heavy_balance == 0 {
        promote(tree, slot, side);
        tree.arena[slot].balance = weight;
        tree.arena[heavy].balance = -weight;
        debug!("remove rebalanced {:?} with a single rotation, height kept", slot);
        false
    } else {
        rotate_double(tree, slot, heavy, side);
        debug!("remove rebalanced {:?} with a double rotation", slot);
        true
    }
}

fn rebalance_after_insert<T, U>(tree: &mut Tree<T, U>, slot: Slot) {
    let mut child = slot;
    let mut parent = tree.arena[slot].parent;

    while let Some(curr) = parent {
        let balance = {
            let node = &mut tree.arena[curr];
            let weight = node.side_of(child).weight();
            node.balance += weight;
            node.balance
        };

        match balance {
            0 => return,
            -1 | 1 => {
                child = curr;
                parent = tree.arena[curr].parent;
            },
            _ => {
                fix_insert_imbalance(tree, curr, Side::heavier(balance));
                return;
            },
        }
    }
}

// Walks up from `start`, whose subtree on `side` just lost a level.
fn rebalance_after_remove<T, U>(tree: &mut Tree<T, U>, start: Slot, side: Side) {
    let mut curr = Some(start);
    let mut delta = -side.weight();

    while let Some(slot) = curr {
        let (parent, parent_delta) = match tree.arena[slot].parent {
            Some(parent) => (Some(parent), -tree.arena[parent].side_of(slot).weight()),
            None => (None, 0),
        };

        let balance = tree.arena[slot].balance + delta;
        let shrunk = match balance {
            -1 | 1 => {
                tree.arena[slot].balance = balance;
                false
            },
            0 => {
                tree.arena[slot].balance = 0;
                true
            },
            _ => fix_remove_imbalance(tree, slot, Side::heavier(balance)),
        };

        if !shrunk {
            return;
        }
        curr = parent;
        delta = parent_delta;
    }
}

fn find<T, U, V>(tree: &Tree<T, U>, key: &V) -> Option<Slot>
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    let mut curr = tree.root;
    while let Some(slot) = curr {
        let node = &tree.arena[slot];
        curr = match key.cmp(node.entry.key.borrow()) {
            Ordering::Less => node.left,
            Ordering::Greater => node.right,
            Ordering::Equal => return Some(slot),
        };
    }
    None
}

fn extreme<T, U>(tree: &Tree<T, U>, mut slot: Slot, side: Side) -> Slot {
    while let Some(child) = tree.arena[slot].child(side) {
        slot = child;
    }
    slot
}

// Exchanges the key-value pairs of two nodes. Balance factors and links belong to the structural
// positions and stay where they are.
fn swap_entries<T, U>(tree: &mut Tree<T, U>, first: Slot, second: Slot) {
    let (first, second) = tree
        .arena
        .get_pair_mut(first, second)
        .expect("Expected two distinct occupied nodes.");
    mem::swap(&mut first.entry, &mut second.entry);
}

/// Inserts a key-value pair, returning the previous value if the key already existed. An existing
/// key keeps its node and the tree shape is left untouched.
pub fn insert<T, U>(tree: &mut Tree<T, U>, key: T, value: U) -> Option<U>
where
    T: Ord,
{
    let mut parent = None;
    let mut side = Side::Left;
    let mut curr = tree.root;

    while let Some(slot) = curr {
        let node = &mut tree.arena[slot];
        side = match key.cmp(&node.entry.key) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => return Some(mem::replace(&mut node.entry.value, value)),
        };
        parent = Some(slot);
        curr = node.child(side);
    }

    let slot = tree.arena.allocate(Node::new(key, value, parent));
    match parent {
        None => tree.root = Some(slot),
        Some(parent) => {
            *tree.arena[parent].child_mut(side) = Some(slot);
            rebalance_after_insert(tree, slot);
        },
    }
    None
}

/// Removes the node with a particular key and returns its entry. Nodes with two children first
/// trade entries with their in-order predecessor, so the node that is unlinked has at most one
/// child.
pub fn remove<T, U, V>(tree: &mut Tree<T, U>, key: &V) -> Option<Entry<T, U>>
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    let mut slot = find(tree, key)?;

    if let (Some(left), Some(_)) = (tree.arena[slot].left, tree.arena[slot].right) {
        let predecessor = extreme(tree, left, Side::Right);
        swap_entries(tree, slot, predecessor);
        slot = predecessor;
    }

    let (parent, child) = {
        let node = &tree.arena[slot];
        (node.parent, node.left.or(node.right))
    };
    let side = parent.map(|parent| tree.arena[parent].side_of(slot));

    replace_child(tree, parent, slot, child);
    if let Some(child) = child {
        tree.arena[child].parent = parent;
    }
    let Node { entry, .. } = tree.arena.free(slot);

    if let (Some(parent), Some(side)) = (parent, side) {
        rebalance_after_remove(tree, parent, side);
    }
    Some(entry)
}

pub fn get<'a, T, U, V>(tree: &'a Tree<T, U>, key: &V) -> Option<&'a Entry<T, U>>
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    find(tree, key).map(|slot| &tree.arena[slot].entry)
}

pub fn get_mut<'a, T, U, V>(tree: &'a mut Tree<T, U>, key: &V) -> Option<&'a mut Entry<T, U>>
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    match find(tree, key) {
        Some(slot) => Some(&mut tree.arena[slot].entry),
        None => None,
    }
}

pub fn ceil<'a, T, U, V>(tree: &'a Tree<T, U>, key: &V) -> Option<&'a Entry<T, U>>
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    let mut ret = None;
    let mut curr = tree.root;
    while let Some(slot) = curr {
        let node = &tree.arena[slot];
        match key.cmp(node.entry.key.borrow()) {
            Ordering::Greater => curr = node.right,
            Ordering::Less => {
                ret = Some(&node.entry);
                curr = node.left;
            },
            Ordering::Equal => return Some(&node.entry),
        }
    }
    ret
}

pub fn floor<'a, T, U, V>(tree: &'a Tree<T, U>, key: &V) -> Option<&'a Entry<T, U>>
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    let mut ret = None;
    let mut curr = tree.root;
    while let Some(slot) = curr {
        let node = &tree.arena[slot];
        match key.cmp(node.entry.key.borrow()) {
            Ordering::Less => curr = node.left,
            Ordering::Greater => {
                ret = Some(&node.entry);
                curr = node.right;
            },
            Ordering::Equal => return Some(&node.entry),
        }
    }
    ret
}

pub fn min<T, U>(tree: &Tree<T, U>) -> Option<&Entry<T, U>> {
    tree.root
        .map(|root| &tree.arena[extreme(tree, root, Side::Left)].entry)
}

pub fn max<T, U>(tree: &Tree<T, U>) -> Option<&Entry<T, U>> {
    tree.root
        .map(|root| &tree.arena[extreme(tree, root, Side::Right)].entry)
}

/// Returns the entries in key order.
pub fn traverse<T, U>(tree: &Tree<T, U>) -> Vec<&Entry<T, U>> {
    let mut ret = Vec::with_capacity(tree.len());
    let mut stack = Vec::new();
    let mut curr = tree.root;

    loop {
        while let Some(slot) = curr {
            stack.push(slot);
            curr = tree.arena[slot].left;
        }
        match stack.pop() {
            Some(slot) => {
                let node = &tree.arena[slot];
                ret.push(&node.entry);
                curr = node.right;
            },
            None => break,
        }
    }
    ret
}

/// Returns the number of nodes on the longest path from the root to a leaf. The balance factors
/// point at the taller subtree, so only one path is followed.
pub fn height<T, U>(tree: &Tree<T, U>) -> usize {
    let mut ret = 0;
    let mut curr = tree.root;
    while let Some(slot) = curr {
        let node = &tree.arena[slot];
        ret += 1;
        curr = if node.balance < 0 { node.right } else { node.left };
    }
    ret
}

#[cfg(test)]
pub mod tests {
    use super::Tree;
    use crate::arena::Slot;
    use std::cmp;

    // Recomputes the height of every subtree and checks stored balances and back-links.
    fn check_subtree<T, U>(tree: &Tree<T, U>, slot: Slot) -> usize {
        let node = &tree.arena[slot];
        let mut heights = [0usize; 2];
        for (index, child) in [node.left, node.right].iter().enumerate() {
            if let Some(child) = *child {
                assert_eq!(tree.arena[child].parent, Some(slot));
                heights[index] = check_subtree(tree, child);
            }
        }
        assert_eq!(i64::from(node.balance), heights[0] as i64 - heights[1] as i64);
        assert!(node.balance.abs() <= 1);
        cmp::max(heights[0], heights[1]) + 1
    }

    pub fn check<T, U>(tree: &Tree<T, U>)
    where
        T: Ord,
    {
        let height = match tree.root {
            Some(root) => {
                assert_eq!(tree.arena[root].parent, None);
                check_subtree(tree, root)
            },
            None => 0,
        };
        assert_eq!(super::height(tree), height);
        assert!(height <= height_bound(tree.len()));

        let entries = super::traverse(tree);
        assert_eq!(entries.len(), tree.len());
        assert!(entries.windows(2).all(|pair| pair[0].key < pair[1].key));
    }

    pub fn height_bound(len: usize) -> usize {
        (1.44 * ((len + 2) as f64).log2()).ceil() as usize
    }

    fn build(keys: &[u32]) -> Tree<u32, u32> {
        let mut tree = Tree::new(8);
        for key in keys {
            super::insert(&mut tree, *key, *key);
            check(&tree);
        }
        tree
    }

    fn root_key(tree: &Tree<u32, u32>) -> u32 {
        tree.arena[tree.root.unwrap()].entry.key
    }

    fn balance_of(tree: &Tree<u32, u32>, key: u32) -> i8 {
        tree.arena[super::find(tree, &key).unwrap()].balance
    }

    fn children_of(tree: &Tree<u32, u32>, key: u32) -> (Option<u32>, Option<u32>) {
        let node = &tree.arena[super::find(tree, &key).unwrap()];
        (
            node.left.map(|slot| tree.arena[slot].entry.key),
            node.right.map(|slot| tree.arena[slot].entry.key),
        )
    }

    #[test]
    fn test_insert_single_left_rotation() {
        let tree = build(&[10, 20, 30]);
        assert_eq!(root_key(&tree), 20);
        assert_eq!(children_of(&tree, 20), (Some(10), Some(30)));
        for key in &[10, 20, 30] {
            assert_eq!(balance_of(&tree, *key), 0);
        }
    }

    #[test]
    fn test_insert_single_right_rotation() {
        let tree = build(&[30, 20, 10]);
        assert_eq!(root_key(&tree), 20);
        assert_eq!(children_of(&tree, 20), (Some(10), Some(30)));
    }

    #[test]
    fn test_insert_left_right_rotation() {
        let tree = build(&[30, 10, 20]);
        assert_eq!(root_key(&tree), 20);
        assert_eq!(children_of(&tree, 20), (Some(10), Some(30)));
        for key in &[10, 20, 30] {
            assert_eq!(balance_of(&tree, *key), 0);
        }
    }

    #[test]
    fn test_insert_right_left_rotation() {
        let tree = build(&[10, 30, 20]);
        assert_eq!(root_key(&tree), 20);
        assert_eq!(children_of(&tree, 20), (Some(10), Some(30)));
    }

    #[test]
    fn test_insert_double_rotation_with_leaning_grandchild() {
        // 40 is rotated up while leaning left, so 50 ends up right-heavy.
        let tree = build(&[50, 30, 70, 10, 40, 35]);
        assert_eq!(root_key(&tree), 40);
        assert_eq!(children_of(&tree, 40), (Some(30), Some(50)));
        assert_eq!(children_of(&tree, 30), (Some(10), Some(35)));
        assert_eq!(children_of(&tree, 50), (None, Some(70)));
        assert_eq!(balance_of(&tree, 30), 0);
        assert_eq!(balance_of(&tree, 50), -1);
    }

    #[test]
    fn test_insert_existing_key_keeps_shape() {
        let mut tree = build(&[4, 2, 6, 1]);
        let before: Vec<(u32, i8)> = super::traverse(&tree)
            .iter()
            .map(|entry| (entry.key, balance_of(&tree, entry.key)))
            .collect();

        assert_eq!(super::insert(&mut tree, 2, 20), Some(2));

        let after: Vec<(u32, i8)> = super::traverse(&tree)
            .iter()
            .map(|entry| (entry.key, balance_of(&tree, entry.key)))
            .collect();
        assert_eq!(before, after);
        assert_eq!(root_key(&tree), 4);
        assert_eq!(super::get(&tree, &2).map(|entry| entry.value), Some(20));
    }

    #[test]
    fn test_remove_leaf_without_rotation() {
        let mut tree = build(&[4, 2, 6, 1, 3, 5, 7]);
        assert_eq!(super::remove(&mut tree, &1).map(|entry| entry.key), Some(1));
        check(&tree);

        assert_eq!(root_key(&tree), 4);
        assert_eq!(balance_of(&tree, 2), -1);
        for key in &[3, 4, 5, 6, 7] {
            assert_eq!(balance_of(&tree, *key), 0);
        }
    }

    #[test]
    fn test_remove_two_children_uses_predecessor() {
        let mut tree = build(&[4, 2, 6, 1, 3, 5, 7]);
        assert_eq!(super::remove(&mut tree, &4).map(|entry| entry.value), Some(4));
        check(&tree);

        assert_eq!(root_key(&tree), 3);
        assert_eq!(children_of(&tree, 3), (Some(2), Some(6)));
        assert_eq!(children_of(&tree, 2), (Some(1), None));
        assert_eq!(balance_of(&tree, 2), 1);
        assert_eq!(balance_of(&tree, 3), 0);
    }

    #[test]
    fn test_remove_rotation_keeps_height() {
        let mut tree = build(&[2, 1, 4, 3, 5]);
        super::remove(&mut tree, &1);
        check(&tree);

        assert_eq!(root_key(&tree), 4);
        assert_eq!(children_of(&tree, 4), (Some(2), Some(5)));
        assert_eq!(children_of(&tree, 2), (None, Some(3)));
        assert_eq!(balance_of(&tree, 4), 1);
        assert_eq!(balance_of(&tree, 2), -1);
    }

    #[test]
    fn test_remove_double_rotation() {
        let mut tree = build(&[2, 1, 4, 3]);
        super::remove(&mut tree, &1);
        check(&tree);

        assert_eq!(root_key(&tree), 3);
        assert_eq!(children_of(&tree, 3), (Some(2), Some(4)));
    }

    #[test]
    fn test_remove_propagates_past_rotation() {
        // Removing 35 rotates at 30, and the lost level forces a second rotation at the root.
        let mut tree = build(&[20, 10, 30, 5, 15, 25, 35, 3, 7, 12, 22, 1]);
        assert_eq!(root_key(&tree), 20);
        assert_eq!(balance_of(&tree, 20), 1);

        super::remove(&mut tree, &35);
        check(&tree);

        assert_eq!(root_key(&tree), 10);
        assert_eq!(children_of(&tree, 10), (Some(5), Some(20)));
        assert_eq!(children_of(&tree, 20), (Some(15), Some(25)));
        assert_eq!(children_of(&tree, 25), (Some(22), Some(30)));
        assert_eq!(balance_of(&tree, 10), 0);
        assert_eq!(balance_of(&tree, 20), 0);
    }

    #[test]
    fn test_remove_root_with_single_child() {
        let mut tree = build(&[1, 2]);
        super::remove(&mut tree, &1);
        check(&tree);
        assert_eq!(root_key(&tree), 2);
        assert_eq!(tree.arena[tree.root.unwrap()].parent, None);
    }

    #[test]
    fn test_remove_absent_key() {
        let mut tree = build(&[2, 1, 3]);
        assert!(super::remove(&mut tree, &4).is_none());
        assert_eq!(tree.len(), 3);
        check(&tree);
    }

    #[test]
    fn test_remove_all() {
        let mut tree = build(&[8, 4, 12, 2, 6, 10, 14, 1, 3, 5, 7, 9, 11, 13, 15]);
        for key in &[8, 1, 15, 4, 12, 6, 2, 3, 14, 9, 7, 10, 5, 11, 13] {
            assert!(super::remove(&mut tree, key).is_some());
            check(&tree);
        }
        assert!(tree.root.is_none());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn test_increasing_run_stays_balanced() {
        let mut tree = Tree::new(64);
        for key in 1..=1000u32 {
            super::insert(&mut tree, key, key);
            check(&tree);
            assert!(super::height(&tree) <= height_bound(tree.len()));
        }
    }

    #[test]
    fn test_decreasing_run_then_drain() {
        let mut tree = Tree::new(64);
        for key in (1..=500u32).rev() {
            super::insert(&mut tree, key, key);
        }
        check(&tree);
        for key in (1..=500u32).step_by(2) {
            super::remove(&mut tree, &key);
            check(&tree);
        }
        assert_eq!(tree.len(), 250);
    }

    #[test]
    fn test_ordered_queries() {
        let tree = build(&[10, 20, 30, 40]);
        assert_eq!(super::min(&tree).map(|entry| entry.key), Some(10));
        assert_eq!(super::max(&tree).map(|entry| entry.key), Some(40));
        assert_eq!(super::floor(&tree, &25).map(|entry| entry.key), Some(20));
        assert_eq!(super::floor(&tree, &5).map(|entry| entry.key), None);
        assert_eq!(super::ceil(&tree, &25).map(|entry| entry.key), Some(30));
        assert_eq!(super::ceil(&tree, &45).map(|entry| entry.key), None);
    }
}
