//! Cycle guard: a tag may never become its own ancestor.

use tracing::warn;

use crate::domain::arena::TagTree;
use crate::domain::error::{TagError, TagResult};
use crate::domain::tag::{Tag, TagId};

/// Reject attaching `tag` under `parent` when `tag` is `parent` itself or one
/// of its ancestors.
///
/// Compares handles, never payloads. The walk is bounded by the number of
/// live tags, so a corrupted chain is reported instead of looping.
pub fn check_attach<T: Tag>(tree: &TagTree<T>, parent: TagId, tag: TagId) -> TagResult<()> {
    let mut current = Some(parent);
    let mut steps = 0;

    while let Some(ancestor) = current {
        if ancestor == tag {
            warn!(%tag, %parent, "rejected cyclic attachment");
            return Err(TagError::CyclicAttachment { tag, parent });
        }
        steps += 1;
        if steps > tree.len() {
            return Err(TagError::BrokenInvariant(format!(
                "parent chain of {parent} does not reach a root"
            )));
        }
        current = tree.parent(ancestor)?;
    }
    Ok(())
}

/// Whether attaching `tag` under `parent` would be rejected.
pub fn would_create_cycle<T: Tag>(tree: &TagTree<T>, parent: TagId, tag: TagId) -> bool {
    matches!(
        check_attach(tree, parent, tag),
        Err(TagError::CyclicAttachment { .. })
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Bin(u8);
    impl Tag for Bin {}

    #[test]
    fn test_self_attachment_is_cyclic() {
        let mut tree = TagTree::new();
        let a = tree.new_container(Bin(0));
        assert!(would_create_cycle(&tree, a, a));
    }

    #[test]
    fn test_unrelated_and_descendant_targets() {
        let mut tree = TagTree::new();
        let a = tree.new_container(Bin(0));
        let b = tree.new_container(Bin(1));
        let c = tree.new_container(Bin(2));
        tree.append_child(a, b).unwrap();
        tree.append_child(b, c).unwrap();

        // c -> a would close the loop a > b > c > a
        assert!(would_create_cycle(&tree, c, a));
        assert!(would_create_cycle(&tree, b, a));
        // moving a leaf-ward tag further down is fine
        assert!(!would_create_cycle(&tree, a, c));
        assert!(check_attach(&tree, a, c).is_ok());
    }
}
