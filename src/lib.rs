//! Ordered collections backed by an arena-allocated avl tree, plus a small utility for checking
//! whether all leaves of a binary tree are at the same depth.

pub mod arena;
pub mod avl_tree;
mod entry;
pub mod equal_paths;
mod error;

pub use self::error::KeyError;
