//! collection of hcl documents ([Body] and path to source file)
//!
//! [HclDocuments] tracks
//! - the source path
//! - the root blocks
//! - the root attributes
//! and defines a numeric index for each. Once added those indices are stable (removal is not possible)
//!
//! [HclDocuments::to_document] turns the collection into a [Document] that tokens can be extracted from.
use crate::document::{Document, NodeId};
use hcl_edit::structure::{Attribute, Block, Body, Structure};
use std::path::Path;

#[derive(Default, Debug)]
pub struct HclDocuments {
    sources: Vec<Source>,
    root_attributes: Vec<(usize, Attribute)>,
    root_blocks: Vec<(usize, Block)>,
}

impl HclDocuments {
    /// Inserts and indexes an hcl document
    pub fn insert(&mut self, document: Body, path: impl Into<Option<std::path::PathBuf>>) {
        let source_index = self.sources.len();
        self.sources.push(path.into());

        for structure in document.into_iter() {
            match structure {
                Structure::Block(block) => self.root_blocks.push((source_index, block)),
                Structure::Attribute(attribute) => {
                    self.root_attributes.push((source_index, attribute))
                }
            }
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = SourceAttribute> {
        self.root_attributes
            .iter()
            .enumerate()
            .map(|(index, (source_index, attribute))| {
                (index, &self.sources[*source_index], attribute)
            })
    }

    pub fn blocks(&self) -> impl Iterator<Item = SourceBlock> {
        self.root_blocks
            .iter()
            .enumerate()
            .map(|(index, (source_index, block))| (index, &self.sources[*source_index], block))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Convert all documents into a single [Document] with a root element named `root_tag`
    ///
    /// - root attributes become attributes of the root element
    /// - blocks become elements (tag = block identifier), the first label is stored as `name` attribute
    /// - string, number and bool values become attribute text, other expressions are skipped
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn to_document(&self, root_tag: &str) -> Document {
        let mut document = Document::new(root_tag);
        let root = document.root();

        for (_, _, attribute) in self.attributes() {
            insert_attribute(&mut document, root, attribute);
        }
        for (_, _, block) in self.blocks() {
            insert_block(&mut document, root, block);
        }

        document
    }
}

fn insert_block(document: &mut Document, parent: NodeId, block: &Block) {
    let element = document.create_element(parent, block.ident.value().as_str());
    if let Some(label) = block.labels.first() {
        document.set_attribute(element, "name", label.as_str());
    }

    for attribute in block.body.attributes() {
        insert_attribute(document, element, attribute);
    }
    for child in block.body.blocks() {
        insert_block(document, element, child);
    }
}

fn insert_attribute(document: &mut Document, element: NodeId, attribute: &Attribute) {
    let key = attribute.key.value().as_str();
    match hcl::Expression::from(attribute.value.clone()) {
        hcl::Expression::String(text) => document.set_attribute(element, key, text),
        hcl::Expression::Number(number) => document.set_attribute(element, key, number.to_string()),
        hcl::Expression::Bool(value) => document.set_attribute(element, key, value.to_string()),
        _ => tracing::debug!(key, "skipping attribute without scalar value"),
    }
}

impl HclDocuments {
    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        let body = hcl_edit::parser::parse_body(&file_contents)?;

        self.insert(body, Some(file_path));
        Ok(())
    }

    /// Load every `*.hcl` file of a directory, in file name order
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut file_paths = vec![];
        for dir_entry in std::fs::read_dir(dir_path)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let is_hcl_file = dir_entry.file_name().to_string_lossy().ends_with(".hcl");
            if is_hcl_file {
                file_paths.push(dir_entry.path());
            }
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound);
        }

        file_paths.sort();
        for file_path in &file_paths {
            self.load_file(file_path)?;
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl file")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
}

impl From<Body> for HclDocuments {
    fn from(value: Body) -> Self {
        let mut tree = HclDocuments::default();
        tree.insert(value, None);
        tree
    }
}

/// Utility macro to create [HclDocuments]
///
/// Create from a single document
/// ```
/// # use dynbind::hcl_documents;
/// hcl_documents!("attribute = 42");
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use dynbind::hcl_documents;
/// hcl_documents! {
///   "one.hcl" => "attribute_one = 1",
///   "two.hcl" => "attribute_two = 2"
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use dynbind::hcl_documents;
/// hcl_documents!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! hcl_documents {
    // single document without source
    { $expr:expr } => {
        $crate::hcl_documents::HclDocuments::from(hcl_edit::parser::parse_body($expr).expect("body must parse"))
    };
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut docs = $crate::hcl_documents::HclDocuments::default();
        $(
            docs.insert(hcl_edit::parser::parse_body($expr).expect("body must parse"), Some(std::path::PathBuf::from($source)));
        )+

        docs
    }};
}

pub type Source = Option<std::path::PathBuf>;
pub type SourceAttribute<'a> = (usize, &'a Source, &'a Attribute);
pub type SourceBlock<'a> = (usize, &'a Source, &'a Block);

#[cfg(test)]
pub(crate) mod test {
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn iterators() {
        let hcl_documents = hcl_documents! {r#"
        attr_1 = 1
        one two {}
        three four five {}
        attr_2 = 2
        attr_3 = 3
        "#};

        assert_eq!(hcl_documents.attributes().count(), 3);
        assert_eq!(hcl_documents.blocks().count(), 2);
    }

    #[test]
    fn multiple_sources() {
        let hcl_documents = hcl_documents! {
            "one.hcl" => "a = 1",
            "two.hcl" => "b = 2"
        };

        assert_eq!(hcl_documents.source_count(), 2);
        let sources: Vec<_> = hcl_documents
            .attributes()
            .map(|(_, source, _)| source.clone())
            .collect();
        assert_eq!(
            sources,
            vec![Some(PathBuf::from("one.hcl")), Some(PathBuf::from("two.hcl"))]
        );
    }

    #[test]
    fn converts_to_document() {
        let hcl_documents = hcl_documents! {r#"
        version = "$[version|1.0]"
        debug = true

        task build {
          timeout = 30
          command = "make $[target|all]"
          tags = ["ci"]

          step {
            run = "echo"
          }
        }
        "#};

        let document = hcl_documents.to_document("project");
        assert_eq!(
            document.to_string(),
            r#"project version="$[version|1.0]" debug="true"
  task name="build" timeout="30" command="make $[target|all]"
    step run="echo"
"#
        );
    }
}
