use std::collections::HashMap;

use generational_arena::Arena;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::children::{Children, ChildrenMut};
use crate::domain::cycle;
use crate::domain::error::{TagError, TagResult};
use crate::domain::tag::{Tag, TagId, TagNode};

/// When a container's `configure_child` hook fires for a newly attached tag.
///
/// Moves inside one collection never fire the hook under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigurePolicy {
    /// Once per (container, tag) pair: a detach followed by a reattach to the
    /// same container does not configure the tag again.
    #[default]
    FirstAttach,
    /// On every attach of a tag that was not already a member.
    EveryAttach,
}

/// Arena-based tag tree.
///
/// The arena owns every tag; containers own the order of their children and
/// each tag keeps a non-owning back-reference to its container. Any number of
/// independent trees may live in one arena.
#[derive(Debug)]
pub struct TagTree<T> {
    arena: Arena<TagNode<T>>,
    policy: ConfigurePolicy,
}

impl<T: Tag> Default for TagTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tag> TagTree<T> {
    pub fn new() -> Self {
        Self::with_policy(ConfigurePolicy::default())
    }

    pub fn with_policy(policy: ConfigurePolicy) -> Self {
        Self {
            arena: Arena::new(),
            policy,
        }
    }

    pub fn policy(&self) -> ConfigurePolicy {
        self.policy
    }

    /// Number of live tags.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Create a detached leaf tag.
    #[instrument(level = "trace", skip(self, payload))]
    pub fn new_tag(&mut self, payload: T) -> TagId {
        TagId(self.arena.insert(TagNode::new(payload, false)))
    }

    /// Create a detached container tag with an empty child collection.
    #[instrument(level = "trace", skip(self, payload))]
    pub fn new_container(&mut self, payload: T) -> TagId {
        TagId(self.arena.insert(TagNode::new(payload, true)))
    }

    pub fn contains(&self, tag: TagId) -> bool {
        self.arena.contains(tag.0)
    }

    pub fn get(&self, tag: TagId) -> TagResult<&TagNode<T>> {
        self.arena.get(tag.0).ok_or(TagError::MissingTag(tag))
    }

    pub(crate) fn get_mut(&mut self, tag: TagId) -> TagResult<&mut TagNode<T>> {
        self.arena.get_mut(tag.0).ok_or(TagError::MissingTag(tag))
    }

    pub fn payload(&self, tag: TagId) -> TagResult<&T> {
        Ok(&self.get(tag)?.payload)
    }

    /// Mutable payload access. Structure is not reachable from here.
    pub fn payload_mut(&mut self, tag: TagId) -> TagResult<&mut T> {
        Ok(&mut self.get_mut(tag)?.payload)
    }

    pub fn is_container(&self, tag: TagId) -> TagResult<bool> {
        Ok(self.get(tag)?.is_container())
    }

    pub fn tag_id(&self, tag: TagId) -> TagResult<Option<&str>> {
        Ok(self.get(tag)?.id())
    }

    /// Assign a nonblank identifier.
    #[instrument(level = "trace", skip(self))]
    pub fn set_id(&mut self, tag: TagId, id: &str) -> TagResult<()> {
        if id.trim().is_empty() {
            return Err(TagError::BlankIdentifier(tag));
        }
        self.get_mut(tag)?.id = Some(id.to_string());
        Ok(())
    }

    pub fn clear_id(&mut self, tag: TagId) -> TagResult<Option<String>> {
        Ok(self.get_mut(tag)?.id.take())
    }

    pub fn parent(&self, tag: TagId) -> TagResult<Option<TagId>> {
        Ok(self.get(tag)?.parent)
    }

    /// Finish a fluent element: the container this tag belongs to.
    pub fn end(&self, tag: TagId) -> TagResult<Option<TagId>> {
        self.parent(tag)
    }

    /// Move `tag` under `new_parent` (appended last), or detach it with `None`.
    ///
    /// Returns the previous parent. Asking for the current parent changes
    /// nothing, in particular the tag keeps its position.
    #[instrument(level = "debug", skip(self))]
    pub fn set_parent(&mut self, tag: TagId, new_parent: Option<TagId>) -> TagResult<Option<TagId>> {
        let previous = self.parent(tag)?;
        match new_parent {
            None => {
                self.detach_from_parent(tag)?;
            }
            Some(parent) => {
                self.ensure_container(parent)?;
                if previous == Some(parent) {
                    return Ok(previous);
                }
                cycle::check_attach(self, parent, tag)?;
                self.children_mut(parent)?.append(tag)?;
            }
        }
        Ok(previous)
    }

    /// Read view of a container's children.
    pub fn children(&self, container: TagId) -> TagResult<Children<'_, T>> {
        self.ensure_container(container)?;
        Ok(Children::new(self, container))
    }

    /// Mutable handle to a container's children. All structural changes go
    /// through this handle.
    pub fn children_mut(&mut self, container: TagId) -> TagResult<ChildrenMut<'_, T>> {
        self.ensure_container(container)?;
        Ok(ChildrenMut::new(self, container))
    }

    /// Append `child` to `container` (moving it last if already there) and
    /// return it for chaining.
    pub fn append_child(&mut self, container: TagId, child: TagId) -> TagResult<TagId> {
        self.children_mut(container)?.append(child)?;
        Ok(child)
    }

    /// Remove a tag from the arena and return its payload.
    ///
    /// The tag is detached from its parent and its direct children become
    /// detached roots; they are not destroyed. Every tag forgets that this
    /// container configured it.
    #[instrument(level = "debug", skip(self))]
    pub fn destroy(&mut self, tag: TagId) -> TagResult<T> {
        self.detach_from_parent(tag)?;
        let node = self.arena.remove(tag.0).ok_or(TagError::MissingTag(tag))?;
        for &child in node.children() {
            if let Some(child) = self.arena.get_mut(child.0) {
                child.parent = None;
            }
        }
        if node.is_container() {
            for (_, other) in self.arena.iter_mut() {
                other.configured_by.remove(&tag);
            }
        }
        debug!(%tag, children = node.children().len(), "destroyed");
        Ok(node.payload)
    }

    /// Validate `tag` and then its children in order, depth first.
    /// The first failure stops the walk and is returned as is.
    #[instrument(level = "debug", skip(self))]
    pub fn validate(&self, tag: TagId) -> TagResult<()> {
        for (_, node) in self.iter(tag)? {
            node.payload.validate()?;
        }
        Ok(())
    }

    /// Tags without a parent.
    pub fn roots(&self) -> impl Iterator<Item = TagId> + '_ {
        self.arena
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| TagId(index))
    }

    /// Proper ancestors of `tag`, nearest first.
    pub fn ancestors(&self, tag: TagId) -> TagResult<Ancestors<'_, T>> {
        let parent = self.parent(tag)?;
        Ok(Ancestors {
            tree: self,
            next: parent,
        })
    }

    pub fn root_of(&self, tag: TagId) -> TagResult<TagId> {
        Ok(self.ancestors(tag)?.last().unwrap_or(tag))
    }

    /// Height of the subtree rooted at `tag`; a lone tag has depth 1.
    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self, tag: TagId) -> TagResult<usize> {
        // children are visited before their container
        let mut heights: HashMap<TagId, usize> = HashMap::new();
        for (current, node) in self.iter_postorder(tag)? {
            let deepest = node
                .children()
                .iter()
                .filter_map(|child| heights.remove(child))
                .max()
                .unwrap_or(0);
            heights.insert(current, deepest + 1);
        }
        Ok(heights.remove(&tag).unwrap_or(1))
    }

    /// Pre-order walk of the subtree rooted at `tag`, children in order.
    /// Uses an explicit stack, so depth is bounded by memory only.
    pub fn iter(&self, tag: TagId) -> TagResult<TreeIterator<'_, T>> {
        self.get(tag)?;
        Ok(TreeIterator {
            tree: self,
            stack: vec![tag],
        })
    }

    /// Post-order walk of the subtree rooted at `tag`.
    pub fn iter_postorder(&self, tag: TagId) -> TagResult<PostOrderIterator<'_, T>> {
        self.get(tag)?;
        Ok(PostOrderIterator {
            tree: self,
            stack: vec![(tag, false)],
        })
    }

    /// Verify the parent/child biconditional and the no-duplicates rule over
    /// the whole arena.
    ///
    /// Collection operations keep both; editing payloads or identifiers of
    /// siblings in place can make two of them structurally equal.
    #[instrument(level = "debug", skip(self))]
    pub fn check_invariants(&self) -> TagResult<()> {
        for (index, node) in self.arena.iter() {
            let tag = TagId(index);
            if let Some(parent) = node.parent {
                let owner = self.arena.get(parent.0).ok_or_else(|| {
                    TagError::BrokenInvariant(format!("{tag} points at missing parent {parent}"))
                })?;
                let count = owner.children().iter().filter(|&&c| c == tag).count();
                if count != 1 {
                    return Err(TagError::BrokenInvariant(format!(
                        "{tag} has parent {parent} but appears {count} times among its children"
                    )));
                }
            }

            let children = node.children();
            for (position, &child) in children.iter().enumerate() {
                let child_node = self.arena.get(child.0).ok_or_else(|| {
                    TagError::BrokenInvariant(format!("{tag} lists missing child {child}"))
                })?;
                if child_node.parent != Some(tag) {
                    return Err(TagError::BrokenInvariant(format!(
                        "{child} is listed under {tag} but its parent is {:?}",
                        child_node.parent
                    )));
                }
                for &other in &children[position + 1..] {
                    let equal = self
                        .arena
                        .get(other.0)
                        .is_some_and(|other| other.matches(child_node));
                    if other == child || equal {
                        return Err(TagError::BrokenInvariant(format!(
                            "{tag} holds duplicate children {child} and {other}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn ensure_container(&self, tag: TagId) -> TagResult<()> {
        if self.get(tag)?.is_container() {
            Ok(())
        } else {
            Err(TagError::NotAContainer(tag))
        }
    }

    /// Remove `tag` from its parent's collection and clear the back-reference.
    pub(crate) fn detach_from_parent(&mut self, tag: TagId) -> TagResult<Option<TagId>> {
        let Some(parent) = self.get(tag)?.parent else {
            return Ok(None);
        };
        if let Some(items) = self
            .arena
            .get_mut(parent.0)
            .and_then(|node| node.children.as_mut())
        {
            items.retain(|&item| item != tag);
        }
        self.get_mut(tag)?.parent = None;
        debug!(%tag, %parent, "detached from previous parent");
        Ok(Some(parent))
    }

    /// Run the container's hook for a newly attached tag, honoring the policy.
    pub(crate) fn configure(&mut self, container: TagId, tag: TagId) -> TagResult<()> {
        if container == tag {
            return Err(TagError::CyclicAttachment { tag, parent: container });
        }
        let first = self.get_mut(tag)?.configured_by.insert(container);
        if !first && self.policy == ConfigurePolicy::FirstAttach {
            trace!(%container, %tag, "already configured");
            return Ok(());
        }
        match self.arena.get2_mut(container.0, tag.0) {
            (Some(owner), Some(child)) => {
                owner.payload.configure_child(&mut child.payload);
                trace!(%container, %tag, "configured");
                Ok(())
            }
            (None, _) => Err(TagError::MissingTag(container)),
            (_, None) => Err(TagError::MissingTag(tag)),
        }
    }
}

/// Walk up the parent chain.
pub struct Ancestors<'a, T> {
    tree: &'a TagTree<T>,
    next: Option<TagId>,
}

impl<'a, T: Tag> Iterator for Ancestors<'a, T> {
    type Item = TagId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.arena.get(current.0).and_then(|node| node.parent);
        Some(current)
    }
}

pub struct TreeIterator<'a, T> {
    tree: &'a TagTree<T>,
    stack: Vec<TagId>,
}

impl<'a, T: Tag> Iterator for TreeIterator<'a, T> {
    type Item = (TagId, &'a TagNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.tree.arena.get(current.0) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children().iter().rev());
                return Some((current, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a, T> {
    tree: &'a TagTree<T>,
    stack: Vec<(TagId, bool)>,
}

impl<'a, T: Tag> Iterator for PostOrderIterator<'a, T> {
    type Item = (TagId, &'a TagNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.arena.get(current.0) {
                if visited {
                    return Some((current, node));
                }
                self.stack.push((current, true));
                for &child in node.children().iter().rev() {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Part(&'static str);
    impl Tag for Part {}

    fn sample() -> (TagTree<Part>, TagId, TagId, TagId, TagId) {
        let mut tree = TagTree::new();
        let car = tree.new_container(Part("car"));
        let body = tree.new_container(Part("body"));
        let door = tree.new_tag(Part("door"));
        let engine = tree.new_tag(Part("engine"));
        tree.append_child(car, body).unwrap();
        tree.append_child(body, door).unwrap();
        tree.append_child(car, engine).unwrap();
        (tree, car, body, door, engine)
    }

    #[test]
    fn test_iterators_follow_child_order() {
        let (tree, car, body, door, engine) = sample();

        let pre: Vec<TagId> = tree.iter(car).unwrap().map(|(id, _)| id).collect();
        assert_eq!(pre, vec![car, body, door, engine]);

        let post: Vec<TagId> = tree.iter_postorder(car).unwrap().map(|(id, _)| id).collect();
        assert_eq!(post, vec![door, body, engine, car]);
    }

    #[test]
    fn test_depth_ancestors_and_root() {
        let (tree, car, body, door, engine) = sample();

        assert_eq!(tree.depth(car).unwrap(), 3);
        assert_eq!(tree.depth(engine).unwrap(), 1);
        assert_eq!(tree.ancestors(door).unwrap().collect::<Vec<_>>(), vec![body, car]);
        assert_eq!(tree.root_of(door).unwrap(), car);
        assert_eq!(tree.root_of(car).unwrap(), car);
        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![car]);
    }

    #[test]
    fn test_detach_from_parent_clears_both_sides() {
        let (mut tree, car, body, _door, _engine) = sample();

        assert_eq!(tree.detach_from_parent(body).unwrap(), Some(car));
        assert_eq!(tree.parent(body).unwrap(), None);
        assert!(!tree.get(car).unwrap().children().contains(&body));
        assert_eq!(tree.detach_from_parent(body).unwrap(), None);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_check_invariants_reports_equal_siblings_after_payload_edit() {
        let (mut tree, car, _body, _door, _engine) = sample();
        let spare = tree.new_tag(Part("spare"));
        tree.append_child(car, spare).unwrap();
        tree.check_invariants().unwrap();

        *tree.payload_mut(spare).unwrap() = Part("engine");

        assert!(matches!(
            tree.check_invariants(),
            Err(TagError::BrokenInvariant(_))
        ));
    }
}
