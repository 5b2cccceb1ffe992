//! Ordered child collection of a container tag.
//!
//! All structural mutation of a tree goes through [`ChildrenMut`]:
//! - each child belongs to at most one container at a time
//! - re-inserting a member is a move: no cycle check, no configuration
//! - attaching a non-member runs the cycle guard first, then the container's
//!   `configure_child` hook, then sets the back-reference
//! - no two children of one container are structurally equal
//!
//! Every precondition is checked before the first mutation, so an `Err`
//! always leaves the tree untouched.

use tracing::{debug, instrument, trace};

use crate::domain::arena::TagTree;
use crate::domain::cycle;
use crate::domain::error::{TagError, TagResult};
use crate::domain::tag::{Tag, TagId};

/// Read view of a container's children.
pub struct Children<'a, T> {
    tree: &'a TagTree<T>,
    owner: TagId,
}

impl<'a, T: Tag> Children<'a, T> {
    pub(crate) fn new(tree: &'a TagTree<T>, owner: TagId) -> Self {
        Self { tree, owner }
    }

    /// The container owning this collection.
    pub fn owner(&self) -> TagId {
        self.owner
    }

    pub fn as_slice(&self) -> &'a [TagId] {
        self.tree
            .get(self.owner)
            .map(|node| node.children())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn get(&self, index: usize) -> TagResult<TagId> {
        let items = self.as_slice();
        items.get(index).copied().ok_or(TagError::OutOfRange {
            index,
            len: items.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = TagId> + 'a {
        self.as_slice().iter().copied()
    }

    /// Position of `tag`, or of a child structurally equal to it.
    ///
    /// The tag itself wins over an equal sibling.
    pub fn index_of(&self, tag: TagId) -> TagResult<Option<usize>> {
        let node = self.tree.get(tag)?;
        let items = self.as_slice();
        Ok(items.iter().position(|&item| item == tag).or_else(|| {
            items.iter().position(|&item| {
                self.tree
                    .get(item)
                    .is_ok_and(|candidate| candidate.matches(node))
            })
        }))
    }

    /// Whether `tag` itself (not merely an equal tag) is a child.
    pub fn contains(&self, tag: TagId) -> bool {
        self.as_slice().contains(&tag)
    }
}

/// Mutable handle to a container's children.
pub struct ChildrenMut<'a, T> {
    tree: &'a mut TagTree<T>,
    owner: TagId,
}

impl<'a, T: Tag> ChildrenMut<'a, T> {
    pub(crate) fn new(tree: &'a mut TagTree<T>, owner: TagId) -> Self {
        Self { tree, owner }
    }

    /// Read view over the same collection.
    pub fn view(&self) -> Children<'_, T> {
        Children::new(self.tree, self.owner)
    }

    pub fn owner(&self) -> TagId {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.view().len()
    }

    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }

    pub fn get(&self, index: usize) -> TagResult<TagId> {
        self.view().get(index)
    }

    pub fn index_of(&self, tag: TagId) -> TagResult<Option<usize>> {
        self.view().index_of(tag)
    }

    pub fn contains(&self, tag: TagId) -> bool {
        self.view().contains(tag)
    }

    /// Insert `tag` at `offset` (`offset == len` appends).
    ///
    /// - the tag, or an equal child, already sits at `offset`: nothing happens
    /// - the tag is a child elsewhere: it moves, later offsets compensating
    ///   for its removal
    /// - an equal but distinct child sits elsewhere: that child is detached
    ///   and `tag` is attached in its place at the compensated offset
    /// - otherwise `tag` is detached from any previous container and attached
    ///   here
    ///
    /// An equal but distinct child already at `offset` counts as "in place":
    /// the call succeeds and `tag` stays where it was, while the same call
    /// with any other offset substitutes `tag` for that child. Check
    /// [`contains`](Self::contains) afterwards to tell the two apart.
    #[instrument(level = "debug", skip(self), fields(owner = %self.owner))]
    pub fn insert(&mut self, offset: usize, tag: TagId) -> TagResult<()> {
        let len = self.len();
        if offset > len {
            return Err(TagError::OutOfRange { index: offset, len });
        }

        let found = self.index_of(tag)?;
        let member = found.is_some_and(|index| self.view().as_slice().get(index) == Some(&tag));

        match found {
            Some(current) if current == offset => {
                trace!(%tag, offset, "already in place");
                Ok(())
            }
            Some(current) if member => {
                let offset = compensate(current, offset);
                let items = self.items_mut()?;
                items.remove(current);
                items.insert(offset, tag);
                debug!(%tag, from = current, to = offset, "moved");
                Ok(())
            }
            Some(current) => {
                cycle::check_attach(self.tree, self.owner, tag)?;
                let occupant = self.detach_at(current)?;
                debug!(%occupant, %tag, "replacing structurally equal child");
                self.attach_at(compensate(current, offset), tag)
            }
            None => {
                cycle::check_attach(self.tree, self.owner, tag)?;
                self.attach_at(offset, tag)
            }
        }
    }

    /// Append `tag`, moving it last if it is already a child.
    pub fn append(&mut self, tag: TagId) -> TagResult<()> {
        let len = self.len();
        self.insert(len, tag)
    }

    /// Replace the child at `index` with `tag`, returning the previous child.
    ///
    /// When `tag` equals the occupant nothing changes and the occupant is
    /// returned, even if `tag` is a distinct handle that stays unattached.
    /// Otherwise the occupant is detached and `tag` is inserted at
    /// `index` following the [`insert`](Self::insert) rules.
    #[instrument(level = "debug", skip(self), fields(owner = %self.owner))]
    pub fn set(&mut self, index: usize, tag: TagId) -> TagResult<TagId> {
        let occupant = self.get(index)?;
        let node = self.tree.get(tag)?;
        if occupant == tag || self.tree.get(occupant)?.matches(node) {
            trace!(%tag, index, "same child, nothing to replace");
            return Ok(occupant);
        }
        if !self.contains(tag) {
            cycle::check_attach(self.tree, self.owner, tag)?;
        }

        self.detach_at(index)?;
        self.insert(index, tag)?;
        Ok(occupant)
    }

    /// Detach and return the child at `index`.
    #[instrument(level = "debug", skip(self), fields(owner = %self.owner))]
    pub fn remove(&mut self, index: usize) -> TagResult<TagId> {
        let len = self.len();
        if index >= len {
            return Err(TagError::OutOfRange { index, len });
        }
        self.detach_at(index)
    }

    /// Detach `tag` if it is a child, returning the index it had.
    pub fn remove_tag(&mut self, tag: TagId) -> TagResult<Option<usize>> {
        match self.view().as_slice().iter().position(|&item| item == tag) {
            Some(index) => {
                self.detach_at(index)?;
                Ok(Some(index))
            }
            None => Ok(None),
        }
    }

    /// Detach every child, returning them in their former order.
    pub fn clear(&mut self) -> TagResult<Vec<TagId>> {
        let mut removed = Vec::with_capacity(self.len());
        while !self.is_empty() {
            removed.push(self.detach_at(0)?);
        }
        Ok(removed)
    }

    fn items_mut(&mut self) -> TagResult<&mut Vec<TagId>> {
        let owner = self.owner;
        self.tree
            .get_mut(owner)?
            .children
            .as_mut()
            .ok_or(TagError::NotAContainer(owner))
    }

    fn detach_at(&mut self, index: usize) -> TagResult<TagId> {
        let tag = self.items_mut()?.remove(index);
        self.tree.get_mut(tag)?.parent = None;
        debug!(%tag, index, "detached");
        Ok(tag)
    }

    /// Attach a tag that is not a member yet. The cycle guard has already
    /// passed.
    fn attach_at(&mut self, offset: usize, tag: TagId) -> TagResult<()> {
        self.tree.detach_from_parent(tag)?;
        self.items_mut()?.insert(offset, tag);
        self.tree.configure(self.owner, tag)?;
        self.tree.get_mut(tag)?.parent = Some(self.owner);
        debug!(%tag, offset, "attached");
        Ok(())
    }
}

/// Target offset once the element at `current` has been taken out.
fn compensate(current: usize, offset: usize) -> usize {
    if current < offset {
        offset - 1
    } else {
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compensate() {
        assert_eq!(compensate(3, 1), 1);
        assert_eq!(compensate(1, 3), 2);
        assert_eq!(compensate(0, 4), 3);
        assert_eq!(compensate(2, 2), 2);
    }
}
