//! Tag trees for builder DSLs.
//!
//! Tags live in an arena ([`domain::TagTree`]); containers own the order of
//! their children, children keep a back-reference to their container. All
//! structural changes go through a container's child collection, which keeps
//! both sides consistent, turns re-insertion into a move and refuses to make a
//! tag its own ancestor.

pub mod cli;
pub mod config;
pub mod document;
pub mod domain;
pub mod exitcode;
pub mod render;
pub mod util;

pub use domain::{
    Children, ChildrenMut, ConfigurePolicy, Tag, TagBuilder, TagError, TagId, TagResult, TagTree,
    ValidationError,
};
