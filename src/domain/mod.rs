//! Domain layer: the tag tree and its mutation protocol
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod children;
pub mod cycle;
pub mod error;
pub mod tag;

pub use arena::{Ancestors, ConfigurePolicy, PostOrderIterator, TagTree, TreeIterator};
pub use builder::TagBuilder;
pub use children::{Children, ChildrenMut};
pub use error::{TagError, TagResult, ValidationError};
pub use tag::{Tag, TagId, TagNode};
