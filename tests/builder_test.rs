//! Tests for TagBuilder and building trees from TOML documents

mod common;

use std::path::PathBuf;

use tempfile::TempDir;

use common::{labels, Part};
use tagtree::config::RenderSettings;
use tagtree::document::{Document, DocumentError, Element};
use tagtree::render::TreeRender;
use tagtree::{TagBuilder, TagError, TagTree, ValidationError};

fn create_document(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write document");
    path
}

fn a(name: &'static str) -> Part {
    Part::A {
        name,
        configured: Vec::new(),
    }
}

const CAR: &str = r#"
[root]
name = "car"
id = "my-car"
inherit = ["brand"]
attributes = { brand = "Porsche" }

[[root.children]]
name = "engine"
id = "M28.01"
required = ["gears"]
attributes = { gears = "5" }

[[root.children]]
name = "body"

[[root.children.children]]
name = "door"
id = "left"

[[root.children.children]]
name = "door"
id = "right"
"#;

// ============================================================
// TagBuilder
// ============================================================

#[test]
fn given_builder_when_nesting_then_tree_follows_call_order() {
    // Arrange
    let mut tree = TagTree::new();

    // Act
    let root = TagBuilder::new(&mut tree, a("car"))
        .id("my-car")
        .leaf(Part::B(1))
        .open(a("engine"))
        .id("M28.01")
        .leaf(Part::B(5))
        .leaf(Part::B(6))
        .end()
        .leaf(Part::B(2))
        .build()
        .unwrap();

    // Assert
    assert_eq!(tree.tag_id(root).unwrap(), Some("my-car"));
    assert_eq!(labels(&tree, root), "[1, engine, 2]");
    let engine = tree.children(root).unwrap().get(1).unwrap();
    assert_eq!(tree.tag_id(engine).unwrap(), Some("M28.01"));
    assert_eq!(labels(&tree, engine), "[5, 6]");
    assert_eq!(common::configured(&tree, root), vec![1, 2]);
    assert_eq!(common::configured(&tree, engine), vec![5, 6]);
    tree.check_invariants().unwrap();
}

#[test]
fn given_builder_when_ending_at_root_then_stays_at_root() {
    let mut tree = TagTree::new();

    let builder = TagBuilder::new(&mut tree, a("car")).end().end();
    let current = builder.current();
    let root = builder.leaf(Part::B(1)).build().unwrap();

    assert_eq!(current, root);
    assert_eq!(labels(&tree, root), "[1]");
}

#[test]
fn given_blank_identifier_when_building_then_first_error_is_returned() {
    let mut tree = TagTree::new();

    let result = TagBuilder::new(&mut tree, a("car"))
        .leaf(Part::B(1))
        .id("  ")
        .leaf(Part::B(2))
        .build();

    assert!(matches!(result, Err(TagError::BlankIdentifier(_))));
}

#[test]
fn given_existing_container_when_continuing_then_children_are_appended() {
    let mut tree = TagTree::new();
    let root = tree.new_container(a("car"));
    let spare = tree.new_tag(Part::B(9));

    TagBuilder::from_container(&mut tree, root)
        .leaf(Part::B(1))
        .adopt(spare)
        .build()
        .unwrap();

    assert_eq!(labels(&tree, root), "[1, 9]");
}

#[test]
fn given_leaf_when_continuing_from_it_then_not_a_container() {
    let mut tree = TagTree::new();
    let leaf = tree.new_tag(Part::B(0));

    let result = TagBuilder::from_container(&mut tree, leaf)
        .leaf(Part::B(1))
        .build();

    assert_eq!(result, Err(TagError::NotAContainer(leaf)));
    assert_eq!(tree.len(), 1, "steps after the error are skipped");
}

#[test]
fn given_ancestor_when_adopted_below_itself_then_cyclic() {
    let mut tree = TagTree::new();
    let root = tree.new_container(a("car"));

    let result = TagBuilder::from_container(&mut tree, root)
        .open(a("engine"))
        .adopt(root)
        .build();

    assert!(matches!(
        result,
        Err(TagError::CyclicAttachment { tag, .. }) if tag == root
    ));
}

// ============================================================
// Document
// ============================================================

#[test]
fn given_document_when_building_then_containers_configure_children() {
    // Arrange
    let document = Document::from_toml(CAR).unwrap();
    let mut tree = TagTree::new();

    // Act
    let root = document.build(&mut tree).unwrap();

    // Assert
    let children: Vec<_> = tree.children(root).unwrap().iter().collect();
    assert_eq!(children.len(), 2);
    let engine = tree.payload(children[0]).unwrap();
    assert_eq!(engine.attributes["brand"], "Porsche");
    let body = children[1];
    assert!(tree.is_container(body).unwrap());
    assert_eq!(tree.children(body).unwrap().len(), 2);
    assert!(tree.validate(root).is_ok());
    tree.check_invariants().unwrap();
}

#[test]
fn given_document_when_rendered_then_labels_show_ids() {
    let document = Document::from_toml(CAR).unwrap();
    let mut tree = TagTree::new();
    let root = document.build(&mut tree).unwrap();

    let rendered = tree
        .to_tree_string(root, &RenderSettings::default())
        .unwrap()
        .to_string();

    assert!(rendered.starts_with("car#my-car\n"));
    assert!(rendered.contains("engine#M28.01"));
    assert!(rendered.contains("door#left"));
    assert!(rendered.contains("door#right"));
}

#[test]
fn given_missing_required_attribute_when_validating_then_first_failure_surfaces() {
    let document = Document::from_toml(
        r#"
[root]
name = "car"

[[root.children]]
name = "engine"
required = ["gears"]

[[root.children]]
name = "wheel"
required = ["size"]
"#,
    )
    .unwrap();
    let mut tree = TagTree::new();
    let root = document.build(&mut tree).unwrap();

    let result = tree.validate(root);

    assert_eq!(
        result,
        Err(TagError::Validation(ValidationError::new(
            "<engine> requires attribute 'gears'"
        )))
    );
}

#[test]
fn given_document_file_when_loading_then_parsed() {
    let dir = TempDir::new().unwrap();
    let path = create_document(&dir, "car.toml", CAR);

    let document = Document::load(&path).unwrap();

    assert_eq!(document.root.name, "car");
    assert_eq!(document.root.children.len(), 2);
}

#[test]
fn given_missing_file_when_loading_then_read_error() {
    let dir = TempDir::new().unwrap();

    let result = Document::load(&dir.path().join("absent.toml"));

    assert!(matches!(result, Err(DocumentError::Read { .. })));
}

#[test]
fn given_malformed_document_when_parsing_then_parse_error() {
    let result = Document::from_toml("[root]\nid = \"no-name\"\n");

    assert!(matches!(result, Err(DocumentError::Parse(_))));
}

#[test]
fn given_lone_root_when_building_then_it_is_still_a_container() {
    let document = Document::from_toml("[root]\nname = \"garage\"\n").unwrap();
    let mut tree: TagTree<Element> = TagTree::new();

    let root = document.build(&mut tree).unwrap();

    assert!(tree.is_container(root).unwrap());
    assert!(tree.children(root).unwrap().is_empty());
}
