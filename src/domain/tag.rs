//! Tags: arena handles, the payload trait and the node record.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use generational_arena::Index;

use crate::domain::error::ValidationError;

/// Stable handle of a tag inside a [`TagTree`](crate::domain::TagTree).
///
/// Handles compare by identity: two structurally equal tags still have
/// different handles. A handle of a destroyed tag never resolves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(pub(crate) Index);

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "{}:{}", slot, generation)
    }
}

/// Behaviour a payload contributes to the tree.
///
/// All methods have defaults, so `impl Tag for MyPayload {}` is enough for
/// plain data. Containers override `configure_child` to set up children they
/// receive; leaves and containers alike override `validate`.
pub trait Tag: fmt::Debug + PartialEq {
    /// Human-readable tag name, used by rendering.
    fn tag_name(&self) -> Cow<'_, str> {
        Cow::Owned(default_tag_name(std::any::type_name::<Self>()))
    }

    /// Structural equality used by child collections to detect "already
    /// present". Return `false` to fall back to identity only.
    fn same_tag(&self, other: &Self) -> bool {
        self == other
    }

    /// Invoked on the container's payload when `child` is newly attached.
    fn configure_child(&mut self, _child: &mut Self) {}

    /// Consistency check of this payload alone; children are validated by
    /// the tree.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Simple type name with the first letter lower-cased, unless the name
/// starts with two capitals (`EngineBlock` -> `engineBlock`, `URL` -> `URL`).
pub(crate) fn default_tag_name(type_name: &str) -> String {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    let simple = without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics);

    let mut chars = simple.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            simple.to_string()
        }
        (Some(first), _) => first.to_lowercase().chain(simple.chars().skip(1)).collect(),
        (None, _) => String::new(),
    }
}

/// A tag stored in the arena.
#[derive(Debug)]
pub struct TagNode<T> {
    pub(crate) id: Option<String>,
    pub(crate) parent: Option<TagId>,
    /// `Some` for containers, `None` for leaf tags
    pub(crate) children: Option<Vec<TagId>>,
    /// Live containers whose `configure_child` already ran for this tag.
    /// Grows with every distinct container the tag joins; `destroy` prunes it.
    pub(crate) configured_by: HashSet<TagId>,
    pub(crate) payload: T,
}

impl<T: Tag> TagNode<T> {
    pub(crate) fn new(payload: T, container: bool) -> Self {
        Self {
            id: None,
            parent: None,
            children: container.then(Vec::new),
            configured_by: HashSet::new(),
            payload,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn parent(&self) -> Option<TagId> {
        self.parent
    }

    pub fn is_container(&self) -> bool {
        self.children.is_some()
    }

    /// Child handles in order; empty for leaf tags.
    pub fn children(&self) -> &[TagId] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Whether `container` has already configured this tag.
    pub fn is_configured_by(&self, container: TagId) -> bool {
        self.configured_by.contains(&container)
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    /// Structural equality: same identifier, same kind, equal payloads.
    /// Neither parents nor children take part.
    pub fn matches(&self, other: &TagNode<T>) -> bool {
        self.id == other.id
            && self.is_container() == other.is_container()
            && self.payload.same_tag(&other.payload)
    }
}
