//! Chunked allocator for tree nodes.

use std::mem;
use std::ops::{Index, IndexMut};
use std::vec::Vec;

/// A handle to an object stored in a `TypedArena<T>`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Slot {
    chunk_index: usize,
    block_index: usize,
}

enum Block<T> {
    Occupied(T),
    Vacant(Option<Slot>),
}

/// An allocator that only allocates a single type of object.
///
/// Objects are stored in fixed-size chunks, so a chunk is never reallocated once it has been
/// created and handles stay valid until the object they refer to is freed. Freed blocks are
/// threaded onto a free list and reused by later allocations.
///
/// # Examples
///
/// ```
/// use avl_collections::arena::TypedArena;
///
/// let mut arena = TypedArena::new(16);
///
/// let x = arena.allocate(1);
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena[x], 2);
///
/// assert_eq!(arena.free(x), 2);
/// assert!(arena.is_empty());
/// ```
pub struct TypedArena<T> {
    head: Option<Slot>,
    chunks: Vec<Vec<Block<T>>>,
    chunk_size: usize,
    len: usize,
    capacity: usize,
}

impl<T> TypedArena<T> {
    fn is_valid_slot(&self, slot: Slot) -> bool {
        slot.chunk_index < self.chunks.len()
            && slot.block_index < self.chunks[slot.chunk_index].len()
    }

    /// Constructs a new, empty `TypedArena<T>` that allocates `chunk_size` objects per chunk.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::arena::TypedArena;
    ///
    /// let arena: TypedArena<u32> = TypedArena::new(1024);
    /// ```
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "Error: chunk size must be positive.");
        TypedArena {
            head: None,
            chunks: Vec::new(),
            chunk_size,
            len: 0,
            capacity: 0,
        }
    }

    /// Stores an object in the arena and returns its `Slot`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(16);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.get(x), Some(&0));
    /// ```
    pub fn allocate(&mut self, value: T) -> Slot {
        if self.len == self.capacity {
            self.chunks.push(Vec::with_capacity(self.chunk_size));
            self.capacity += self.chunk_size;
        }
        self.len += 1;

        match self.head.take() {
            None => {
                let chunk_index = self.chunks.len() - 1;
                let chunk = &mut self.chunks[chunk_index];
                chunk.push(Block::Occupied(value));
                Slot {
                    chunk_index,
                    block_index: chunk.len() - 1,
                }
            },
            Some(slot) => {
                let block = &mut self.chunks[slot.chunk_index][slot.block_index];
                match mem::replace(block, Block::Occupied(value)) {
                    Block::Vacant(next) => {
                        self.head = next;
                        slot
                    },
                    Block::Occupied(_) => unreachable!(),
                }
            },
        }
    }

    /// Removes an object from the arena and returns it. The slot is recycled by a later
    /// allocation.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of bounds or already vacant.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(16);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.free(x), 0);
    /// ```
    pub fn free(&mut self, slot: Slot) -> T {
        assert!(self.is_valid_slot(slot), "Error: attempting to free invalid block.");
        let block = &mut self.chunks[slot.chunk_index][slot.block_index];
        if let Block::Vacant(_) = block {
            panic!("Error: attempting to free vacant block.");
        }
        match mem::replace(block, Block::Vacant(self.head.take())) {
            Block::Occupied(value) => {
                self.len -= 1;
                self.head = Some(slot);
                value
            },
            Block::Vacant(_) => unreachable!(),
        }
    }

    /// Returns an immutable reference to an object in the arena, or `None` if the slot is invalid
    /// or vacant.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(16);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.get(x), Some(&0));
    /// ```
    pub fn get(&self, slot: Slot) -> Option<&T> {
        if !self.is_valid_slot(slot) {
            return None;
        }
        match self.chunks[slot.chunk_index][slot.block_index] {
            Block::Occupied(ref value) => Some(value),
            Block::Vacant(_) => None,
        }
    }

    /// Returns a mutable reference to an object in the arena, or `None` if the slot is invalid
    /// or vacant.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(16);
    /// let x = arena.allocate(0);
    /// *arena.get_mut(x).unwrap() = 3;
    /// assert_eq!(arena[x], 3);
    /// ```
    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        if !self.is_valid_slot(slot) {
            return None;
        }
        match self.chunks[slot.chunk_index][slot.block_index] {
            Block::Occupied(ref mut value) => Some(value),
            Block::Vacant(_) => None,
        }
    }

    /// Returns mutable references to two distinct objects at once. Returns `None` if the slots
    /// are equal or if either of them is invalid or vacant.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::arena::TypedArena;
    /// use std::mem;
    ///
    /// let mut arena = TypedArena::new(16);
    /// let x = arena.allocate(1);
    /// let y = arena.allocate(2);
    /// {
    ///     let (a, b) = arena.get_pair_mut(x, y).unwrap();
    ///     mem::swap(a, b);
    /// }
    /// assert_eq!(arena[x], 2);
    /// assert_eq!(arena[y], 1);
    /// assert!(arena.get_pair_mut(x, x).is_none());
    /// ```
    pub fn get_pair_mut(&mut self, first: Slot, second: Slot) -> Option<(&mut T, &mut T)> {
        if first == second || !self.is_valid_slot(first) || !self.is_valid_slot(second) {
            return None;
        }

        let (first_block, second_block) = if first.chunk_index == second.chunk_index {
            let chunk = &mut self.chunks[first.chunk_index];
            if first.block_index < second.block_index {
                let (lo, hi) = chunk.split_at_mut(second.block_index);
                (&mut lo[first.block_index], &mut hi[0])
            } else {
                let (lo, hi) = chunk.split_at_mut(first.block_index);
                (&mut hi[0], &mut lo[second.block_index])
            }
        } else if first.chunk_index < second.chunk_index {
            let (lo, hi) = self.chunks.split_at_mut(second.chunk_index);
            (
                &mut lo[first.chunk_index][first.block_index],
                &mut hi[0][second.block_index],
            )
        } else {
            let (lo, hi) = self.chunks.split_at_mut(first.chunk_index);
            (
                &mut hi[0][first.block_index],
                &mut lo[second.chunk_index][second.block_index],
            )
        };

        match (first_block, second_block) {
            (Block::Occupied(first_value), Block::Occupied(second_value)) => {
                Some((first_value, second_value))
            },
            _ => None,
        }
    }

    /// Returns the number of objects currently stored in the arena.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every object and releases all chunks. Previously issued slots become invalid.
    pub fn clear(&mut self) {
        self.head = None;
        self.chunks.clear();
        self.len = 0;
        self.capacity = 0;
    }
}

impl<T> Index<Slot> for TypedArena<T> {
    type Output = T;

    fn index(&self, slot: Slot) -> &Self::Output {
        self.get(slot).expect("Error: slot out of bounds.")
    }
}

impl<T> IndexMut<Slot> for TypedArena<T> {
    fn index_mut(&mut self, slot: Slot) -> &mut Self::Output {
        self.get_mut(slot).expect("Error: slot out of bounds.")
    }
}

#[cfg(test)]
mod tests {
    use super::Slot;
    use super::TypedArena;

    fn slot(chunk_index: usize, block_index: usize) -> Slot {
        Slot {
            chunk_index,
            block_index,
        }
    }

    #[test]
    #[should_panic]
    fn test_zero_chunk_size() {
        let _: TypedArena<u32> = TypedArena::new(0);
    }

    #[test]
    #[should_panic]
    fn test_free_invalid_block() {
        let mut arena: TypedArena<u32> = TypedArena::new(4);
        arena.free(slot(0, 0));
    }

    #[test]
    #[should_panic]
    fn test_free_vacant_block() {
        let mut arena = TypedArena::new(4);
        let x = arena.allocate(0);
        arena.free(x);
        arena.free(x);
    }

    #[test]
    fn test_allocate_multiple_chunks() {
        let mut arena = TypedArena::new(2);
        assert_eq!(arena.allocate(0), slot(0, 0));
        assert_eq!(arena.allocate(0), slot(0, 1));
        assert_eq!(arena.allocate(0), slot(1, 0));
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_free_reuses_slot() {
        let mut arena = TypedArena::new(4);
        let x = arena.allocate(0);
        let y = arena.allocate(1);
        assert_eq!(arena.free(x), 0);
        assert_eq!(arena.get(x), None);
        assert_eq!(arena.allocate(2), x);
        assert_eq!(arena[x], 2);
        assert_eq!(arena[y], 1);
    }

    #[test]
    fn test_free_list_order() {
        let mut arena = TypedArena::new(4);
        let x = arena.allocate(0);
        let y = arena.allocate(1);
        arena.free(x);
        arena.free(y);
        assert_eq!(arena.allocate(3), y);
        assert_eq!(arena.allocate(4), x);
        assert_eq!(arena.allocate(5), slot(0, 2));
    }

    #[test]
    fn test_get_invalid_block() {
        let arena: TypedArena<u32> = TypedArena::new(4);
        assert_eq!(arena.get(slot(3, 0)), None);
    }

    #[test]
    fn test_get_pair_mut_across_chunks() {
        let mut arena = TypedArena::new(1);
        let x = arena.allocate(1);
        let y = arena.allocate(2);
        {
            let (a, b) = arena.get_pair_mut(y, x).unwrap();
            *a += 10;
            *b += 20;
        }
        assert_eq!(arena[x], 21);
        assert_eq!(arena[y], 12);
    }

    #[test]
    fn test_get_pair_mut_vacant() {
        let mut arena = TypedArena::new(4);
        let x = arena.allocate(1);
        let y = arena.allocate(2);
        arena.free(y);
        assert!(arena.get_pair_mut(x, y).is_none());
    }

    #[test]
    fn test_clear() {
        let mut arena = TypedArena::new(2);
        let x = arena.allocate(1);
        arena.allocate(2);
        arena.allocate(3);
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.get(x), None);
        assert_eq!(arena.allocate(4), slot(0, 0));
    }
}
