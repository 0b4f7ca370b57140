//! Page merge: apply a partial page back onto its full collection.
//!
//! A page replaces a window `full[start..end]`. Membership is diffed by
//! identifier as a multiset:
//!
//! ```text
//! full:    a  [ b  c ]  d  e        window = 1..3
//! page:       [ b  x  c ]
//!             kept ins kept
//! result:  a    b  x  c    d  e
//! ```
//!
//! - page items matched against window items are kept at their existing
//!   position; page order decides membership only
//! - unmatched page items are inserted right after the nearest preceding
//!   kept page item, or at the window start when there is none
//! - unmatched window items are removed
//! - everything outside the window is untouched

use std::collections::{HashMap, VecDeque};
use std::ops::Range;

use tusk_core::{Identifier, Reference};

use crate::error::DbError;

/// Outcome of a page merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub items: Vec<Reference>,
    pub kept: usize,
    pub inserted: usize,
    pub removed: usize,
}

impl Merged {
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.removed == 0
    }
}

/// Merge `page` into `full` over `window`. The window is clamped to the
/// collection bounds, so a window past the end appends.
pub fn merge_page(
    full: &[Reference],
    window: Range<usize>,
    page: &[Reference],
) -> Result<Merged, DbError> {
    let start = window.start.min(full.len());
    let end = window.end.clamp(start, full.len());
    let current = &full[start..end];

    // Window positions per identifier, consumed in order for duplicates
    let mut available: HashMap<&Identifier, VecDeque<usize>> = HashMap::new();
    for (pos, item) in current.iter().enumerate() {
        available.entry(item_id(item)?).or_default().push_back(pos);
    }

    let mut matched = vec![false; current.len()];
    let mut leading: Vec<Reference> = Vec::new();
    let mut trailing: Vec<Vec<Reference>> = vec![Vec::new(); current.len()];
    let mut anchor: Option<usize> = None;
    let mut kept = 0;
    let mut inserted = 0;

    for item in page {
        let id = item_id(item)?;
        match available.get_mut(id).and_then(VecDeque::pop_front) {
            Some(pos) => {
                matched[pos] = true;
                anchor = Some(pos);
                kept += 1;
            }
            None => {
                match anchor {
                    Some(pos) => trailing[pos].push(item.clone()),
                    None => leading.push(item.clone()),
                }
                inserted += 1;
            }
        }
    }

    let removed = current.len() - kept;

    let mut items = Vec::with_capacity(full.len() + inserted - removed);
    items.extend_from_slice(&full[..start]);
    items.extend(leading);
    for (pos, item) in current.iter().enumerate() {
        if matched[pos] {
            items.push(item.clone());
        }
        items.append(&mut trailing[pos]);
    }
    items.extend_from_slice(&full[end..]);

    Ok(Merged {
        items,
        kept,
        inserted,
        removed,
    })
}

/// The identifier an item reference names. Items must be addressable.
pub(crate) fn item_id(item: &Reference) -> Result<&Identifier, DbError> {
    item.id()
        .ok_or_else(|| DbError::InvalidDocument("collection item carries no id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tusk_core::{Document, Object};

    fn refs(names: &[&str]) -> Vec<Reference> {
        names
            .iter()
            .map(|n| format!("https://example.com/notes/{n}"))
            .map(|s| Reference::from(Identifier::parse(&s).unwrap()))
            .collect()
    }

    fn names(items: &[Reference]) -> Vec<String> {
        items
            .iter()
            .map(|r| r.id().unwrap().path().rsplit('/').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_insert_inside_window() {
        let full = refs(&["a", "b", "c", "d", "e"]);
        let merged = merge_page(&full, 1..3, &refs(&["b", "x", "c"])).unwrap();
        assert_eq!(names(&merged.items), ["a", "b", "x", "c", "d", "e"]);
        assert_eq!((merged.kept, merged.inserted, merged.removed), (2, 1, 0));
    }

    #[test]
    fn test_remove_inside_window() {
        let full = refs(&["a", "b", "c", "d", "e"]);
        let merged = merge_page(&full, 1..3, &refs(&["b"])).unwrap();
        assert_eq!(names(&merged.items), ["a", "b", "d", "e"]);
        assert_eq!(merged.removed, 1);
    }

    #[test]
    fn test_reorder_keeps_collection_order() {
        let full = refs(&["a", "b", "c", "d"]);
        let merged = merge_page(&full, 0..4, &refs(&["d", "c", "b", "a"])).unwrap();
        assert_eq!(names(&merged.items), ["a", "b", "c", "d"]);
        assert!(merged.is_noop());
    }

    #[test]
    fn test_insert_anchors_on_preceding_kept_item() {
        let full = refs(&["a", "b", "c"]);
        // c is the nearest kept item before y, even though it sorts last
        let merged = merge_page(&full, 0..3, &refs(&["c", "y", "a", "b"])).unwrap();
        assert_eq!(names(&merged.items), ["a", "b", "c", "y"]);
    }

    #[test]
    fn test_prepend_without_anchor() {
        let full = refs(&["a", "b", "c", "d"]);
        let merged = merge_page(&full, 0..2, &refs(&["n1", "n2", "a", "b"])).unwrap();
        assert_eq!(names(&merged.items), ["n1", "n2", "a", "b", "c", "d"]);
    }

    #[test]
    fn test_duplicates_matched_as_multiset() {
        let full = refs(&["a", "a", "b"]);
        let merged = merge_page(&full, 0..3, &refs(&["a", "b"])).unwrap();
        assert_eq!(names(&merged.items), ["a", "b"]);

        let merged = merge_page(&full, 0..3, &refs(&["a", "a", "a", "b"])).unwrap();
        assert_eq!(names(&merged.items), ["a", "a", "a", "b"]);
        assert_eq!(merged.inserted, 1);
    }

    #[test]
    fn test_window_past_end_appends() {
        let full = refs(&["a", "b"]);
        let merged = merge_page(&full, 5..10, &refs(&["z"])).unwrap();
        assert_eq!(names(&merged.items), ["a", "b", "z"]);
    }

    #[test]
    fn test_empty_collection() {
        let merged = merge_page(&[], 0..20, &refs(&["a", "b"])).unwrap();
        assert_eq!(names(&merged.items), ["a", "b"]);
    }

    #[test]
    fn test_item_without_id_is_invalid() {
        let full = refs(&["a"]);
        let anonymous = Reference::from(Document::from(Object::new("Note")));
        let result = merge_page(&full, 0..1, &[anonymous]);
        assert!(matches!(result, Err(DbError::InvalidDocument(_))));
    }
}
