//! Idempotent id-set merges for membership lists.
//!
//! Lists such as `managedUsers`, `teamMembers` and `adminMembers` are treated as
//! sets stored in insertion order: adding is add-if-absent, removing is
//! remove-if-present. Replaying either operation leaves the list unchanged.

/// Appends every item not already present. Returns true when the list changed.
pub fn add_all<T: PartialEq + Clone>(list: &mut Vec<T>, items: &[T]) -> bool {
    let before = list.len();
    for item in items {
        if !list.contains(item) {
            list.push(item.clone());
        }
    }
    list.len() != before
}

/// Removes every occurrence of each item. Returns true when the list changed.
pub fn remove_all<T: PartialEq>(list: &mut Vec<T>, items: &[T]) -> bool {
    let before = list.len();
    list.retain(|existing| !items.contains(existing));
    list.len() != before
}
