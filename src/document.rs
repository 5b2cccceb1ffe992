//! TOML tree documents: a collaborator that builds tag trees from files.
//!
//! ```toml
//! [root]
//! name = "car"
//! id = "my-car"
//! inherit = ["brand"]
//! attributes = { brand = "Porsche" }
//!
//! [[root.children]]
//! name = "engine"
//! id = "M28.01"
//! required = ["gears"]
//! attributes = { gears = "5" }
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{Tag, TagBuilder, TagId, TagResult, TagTree, ValidationError};

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse document: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Generic element payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    /// Attributes that must be present for `validate` to pass
    pub required: Vec<String>,
    /// Attributes this container hands down to children that lack them
    pub inherit: Vec<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn require(mut self, key: impl Into<String>) -> Self {
        self.required.push(key.into());
        self
    }

    pub fn inherit(mut self, key: impl Into<String>) -> Self {
        self.inherit.push(key.into());
        self
    }
}

impl Tag for Element {
    fn tag_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn configure_child(&mut self, child: &mut Self) {
        for key in &self.inherit {
            if let Some(value) = self.attributes.get(key) {
                child
                    .attributes
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self
            .required
            .iter()
            .find(|key| !self.attributes.contains_key(*key))
        {
            Some(missing) => Err(ValidationError::new(format!(
                "<{}> requires attribute '{}'",
                self.name, missing
            ))),
            None => Ok(()),
        }
    }
}

/// One element of a document.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ElementSpec {
    pub name: String,
    pub id: Option<String>,
    /// Defaults to whether `children` is non-empty
    pub container: Option<bool>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub inherit: Vec<String>,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    fn is_container(&self) -> bool {
        self.container.unwrap_or(!self.children.is_empty())
    }

    fn element(&self) -> Element {
        Element {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            required: self.required.clone(),
            inherit: self.inherit.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub root: ElementSpec,
}

impl Document {
    pub fn from_toml(content: &str) -> Result<Self, DocumentError> {
        Ok(toml::from_str(content)?)
    }

    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Build the document into `tree` and return the root tag.
    ///
    /// The root is always a container, so a lone element still gets a place
    /// for children added later.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn build(&self, tree: &mut TagTree<Element>) -> TagResult<TagId> {
        let mut builder = TagBuilder::new(tree, self.root.element());
        if let Some(id) = &self.root.id {
            builder = builder.id(id);
        }
        for child in &self.root.children {
            builder = add_spec(builder, child);
        }
        let root = builder.build()?;
        debug!(%root, "document built");
        Ok(root)
    }
}

fn add_spec<'a>(
    builder: TagBuilder<'a, Element>,
    spec: &ElementSpec,
) -> TagBuilder<'a, Element> {
    if spec.is_container() {
        let mut builder = builder.open(spec.element());
        if let Some(id) = &spec.id {
            builder = builder.id(id);
        }
        for child in &spec.children {
            builder = add_spec(builder, child);
        }
        builder.end()
    } else {
        let builder = builder.leaf(spec.element());
        match &spec.id {
            Some(id) => builder.id(id),
            None => builder,
        }
    }
}
