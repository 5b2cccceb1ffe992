//! Fluent construction of tag trees.

use tracing::instrument;

use crate::domain::arena::TagTree;
use crate::domain::error::{TagError, TagResult};
use crate::domain::tag::{Tag, TagId};

/// Builds a subtree inside an existing [`TagTree`] in DSL style.
///
/// ```ignore
/// let car = TagBuilder::new(&mut tree, Part::Car)
///     .id("my-car")
///     .open(Part::Engine)
///         .id("M28.01")
///         .leaf(Part::Gear(5))
///     .end()
///     .build()?;
/// ```
///
/// Every child is attached through [`TagTree::append_child`], so cycle checks
/// and configuration hooks run as usual. The first error is kept and returned
/// by [`build`](Self::build); later steps are skipped.
pub struct TagBuilder<'a, T> {
    tree: &'a mut TagTree<T>,
    root: TagId,
    /// Open containers, innermost last
    open: Vec<TagId>,
    /// Most recently created tag, target of `id`
    last: TagId,
    error: Option<TagError>,
}

impl<'a, T: Tag> TagBuilder<'a, T> {
    /// Start a new root container.
    pub fn new(tree: &'a mut TagTree<T>, payload: T) -> Self {
        let root = tree.new_container(payload);
        Self::from_container(tree, root)
    }

    /// Continue building under an existing container.
    pub fn from_container(tree: &'a mut TagTree<T>, container: TagId) -> Self {
        let error = tree.ensure_container(container).err();
        Self {
            tree,
            root: container,
            open: vec![container],
            last: container,
            error,
        }
    }

    /// Name the most recently created tag.
    pub fn id(mut self, id: &str) -> Self {
        if self.error.is_none() {
            self.error = self.tree.set_id(self.last, id).err();
        }
        self
    }

    /// Append a leaf tag to the current container.
    pub fn leaf(mut self, payload: T) -> Self {
        if self.error.is_none() {
            let tag = self.tree.new_tag(payload);
            self.attach(tag);
        }
        self
    }

    /// Append a container and make it the current one.
    pub fn open(mut self, payload: T) -> Self {
        if self.error.is_none() {
            let tag = self.tree.new_container(payload);
            if self.attach(tag) {
                self.open.push(tag);
            }
        }
        self
    }

    /// Append an already created tag (moving it if it has a parent).
    pub fn adopt(mut self, tag: TagId) -> Self {
        if self.error.is_none() {
            self.attach(tag);
        }
        self
    }

    /// Close the current container; the builder continues in its parent.
    /// Closing the root is a no-op.
    pub fn end(mut self) -> Self {
        if self.open.len() > 1 {
            self.open.pop();
        }
        self.last = self.current();
        self
    }

    /// The container children are currently appended to.
    pub fn current(&self) -> TagId {
        self.open.last().copied().unwrap_or(self.root)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn build(self) -> TagResult<TagId> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.root),
        }
    }

    fn attach(&mut self, tag: TagId) -> bool {
        let container = self.current();
        match self.tree.append_child(container, tag) {
            Ok(tag) => {
                self.last = tag;
                true
            }
            Err(error) => {
                self.error = Some(error);
                false
            }
        }
    }
}
