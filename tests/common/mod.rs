use tagtree::{Tag, TagId, TagTree, ValidationError};

/// Test payload: `A` containers record which `B` numbers they configured.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    A { name: &'static str, configured: Vec<u32> },
    B(u32),
    /// Always fails validation
    Broken(&'static str),
}

impl Tag for Part {
    fn configure_child(&mut self, child: &mut Self) {
        if let (Part::A { configured, .. }, Part::B(n)) = (self, child) {
            configured.push(*n);
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Part::Broken(reason) => Err(ValidationError::new(*reason)),
            _ => Ok(()),
        }
    }
}

#[allow(dead_code)]
pub fn container(tree: &mut TagTree<Part>, name: &'static str) -> TagId {
    tree.new_container(Part::A {
        name,
        configured: Vec::new(),
    })
}

#[allow(dead_code)]
pub fn b(tree: &mut TagTree<Part>, n: u32) -> TagId {
    tree.new_tag(Part::B(n))
}

/// Container `a` with children `B(0)..B(count)`, appended in order.
#[allow(dead_code)]
pub fn with_children(count: u32) -> (TagTree<Part>, TagId, Vec<TagId>) {
    let mut tree = TagTree::new();
    let a = container(&mut tree, "a");
    let children = (0..count)
        .map(|n| {
            let child = b(&mut tree, n);
            tree.append_child(a, child).unwrap()
        })
        .collect();
    (tree, a, children)
}

/// Children of `a` rendered like a list, e.g. `[0, 3, 2]`.
#[allow(dead_code)]
pub fn labels(tree: &TagTree<Part>, a: TagId) -> String {
    let items: Vec<String> = tree
        .children(a)
        .unwrap()
        .iter()
        .map(|child| match tree.payload(child).unwrap() {
            Part::B(n) => n.to_string(),
            Part::A { name, .. } => name.to_string(),
            Part::Broken(reason) => format!("!{reason}"),
        })
        .collect();
    format!("[{}]", items.join(", "))
}

/// Numbers `a` has configured so far.
#[allow(dead_code)]
pub fn configured(tree: &TagTree<Part>, a: TagId) -> Vec<u32> {
    match tree.payload(a).unwrap() {
        Part::A { configured, .. } => configured.clone(),
        other => panic!("not a container payload: {other:?}"),
    }
}
