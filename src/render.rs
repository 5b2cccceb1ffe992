//! Tree display via `termtree`.

use std::collections::HashMap;

use termtree::Tree;
use tracing::instrument;

use crate::config::RenderSettings;
use crate::domain::{Tag, TagError, TagId, TagNode, TagResult, TagTree};

pub trait TreeRender {
    fn to_tree_string(&self, root: TagId, settings: &RenderSettings) -> TagResult<Tree<String>>;
}

impl<T: Tag> TreeRender for TagTree<T> {
    #[instrument(level = "debug", skip(self, settings))]
    fn to_tree_string(&self, root: TagId, settings: &RenderSettings) -> TagResult<Tree<String>> {
        // post-order: every child subtree is finished before its container
        let mut done: HashMap<TagId, Tree<String>> = HashMap::new();
        for (tag, node) in self.iter_postorder(root)? {
            let leaves: Vec<Tree<String>> = node
                .children()
                .iter()
                .filter_map(|child| done.remove(child))
                .collect();
            done.insert(tag, Tree::new(label(tag, node, settings)).with_leaves(leaves));
        }
        done.remove(&root).ok_or(TagError::MissingTag(root))
    }
}

/// `name#id`, or `name@handle` for anonymous tags when handles are shown.
pub fn label<T: Tag>(tag: TagId, node: &TagNode<T>, settings: &RenderSettings) -> String {
    let name = node.payload().tag_name();
    match node.id() {
        Some(id) if settings.show_ids => format!("{name}#{id}"),
        None if settings.show_handles => format!("{name}@{tag}"),
        _ => name.into_owned(),
    }
}
