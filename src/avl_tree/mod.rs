//! Self-balancing binary search tree where the heights of the two child subtrees of any node
//! differ by at most one.
//!
//! Every node stores its balance factor, the height of its left subtree minus the height of its
//! right subtree, along with a link to its parent. Insertions and removals adjust balance factors
//! on the way back up from the modified node and rotate as soon as a factor leaves `-1..=1`.

mod map;
mod node;
mod set;
mod tree;

pub use self::map::AvlMap;
pub use self::set::AvlSet;

/// Number of node slots allocated at a time by maps and sets built with `new`.
pub const DEFAULT_CHUNK_SIZE: usize = 256;
