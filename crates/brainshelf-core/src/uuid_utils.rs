//! UUID v7 utilities for time-ordered identifiers.
//!
//! Every record id in brainshelf is a UUIDv7: the first 48 bits hold a Unix
//! millisecond timestamp, so ids sort by creation time and make stable
//! tie-breakers for timestamp ordering.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use brainshelf_core::uuid_utils::new_v7;
///
/// let id = new_v7();
/// assert_eq!(id.get_version_num(), 7);
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_v7_is_version_7() {
        assert_eq!(new_v7().get_version_num(), 7);
    }
}
