use std::error;
use std::fmt;

/// Error returned by lookups that require a key to be present in a map.
///
/// Neither `insert` nor `remove` produce this error: inserting an existing key overwrites its
/// value and removing an absent key does nothing.
///
/// # Examples
///
/// ```
/// use avl_collections::avl_tree::AvlMap;
/// use avl_collections::KeyError;
///
/// let mut map = AvlMap::new();
/// map.insert(1, "one");
/// assert_eq!(map.fetch(&1), Ok(&"one"));
/// assert_eq!(map.fetch(&2), Err(KeyError));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyError;

impl error::Error for KeyError {}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "key not found")
    }
}
