//! # dynbind - dynamic value binding
//!
//! Configuration documents carry tokens like `$[env|dev]` in place of hard coded values. `dynbind` pulls those
//! tokens out into declarations and later writes user supplied values into a typed object graph.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `dynbind` works internally.
//!
//! ### Object graph
//!
//! The target of a write is a tree of [value::Value]s. Records ([value::Record]) are typed by an internal type name
//! and store their members by internal member name.
//!
//! Paths use external names. A [registry::TypeRegistry] maps them:
//! - each type has an external type tag (used to pick elements out of collections)
//! - each member has an external name, a kind (property or field) and a declared [schema::ValueType]
//!
//! Lookups go through the registry only. There is no reflection.
//!
//! ### Paths
//!
//! ```text
//! tasks[name=build].timeout
//! items[2]
//! tasks.compile.timeout
//! ```
//!
//! A path is split at `.` into segments ([path::parse]), each with an optional selector:
//!
//! | **segment**          | **meaning**                                                |
//! |----------------------|------------------------------------------------------------|
//! | `tasks`              | member `tasks`                                             |
//! | `tasks[name=build]`  | first element of `tasks` whose `name` is `build`           |
//! | `items[2]`           | element 2 of `items`                                       |
//! | `compile` (on a list)| last element of the list with type tag `compile`           |
//!
//! [resolve::find_property] walks the segments and returns a [handle::ValueHandle] for the final member, or `None`
//! when anything along the way is missing. Writing through the handle coerces the value into the declared type.
//!
//! ### Extraction
//!
//! Documents are trees of elements, attributes and text ([document::Document]). HCL input is converted into one
//! ([hcl_documents::HclDocuments::to_document]):
//!
//! ```hcl
//! version = "$[version|1.0]"
//!
//! task build {
//!   command = "make $[target|all]"
//! }
//! ```
//!
//! [extract::extract] visits every attribute value and text node, turns each token into an
//! [extract::Declaration] and rewrites the text:
//!
//! | **property**         | **declaration**                      | **rewritten text** |
//! |----------------------|--------------------------------------|--------------------|
//! | `version`            | direct `version`, default `1.0`      | `1.0`              |
//! | `task/command`       | formatted `make {0}`, `target=all`   | `make {0}`         |
//!
//! The declarations are also stored in the document itself, below a `dynamicValues` element, so a rewritten
//! document can be bound again later ([extract::Declaration::read_all]).
//!
//! ### Binding
//!
//! [bind::Binder] evaluates each declaration with overrides (or the defaults), converts raw values via
//! [convert::ParameterDefinition]s, renders formatted declarations with [format::format] and writes the result to
//! the property path.
//!
pub mod bind;
pub mod convert;
pub mod document;
pub mod extract;
pub mod format;
pub mod handle;
pub mod hcl_documents;
pub mod path;
pub mod registry;
pub mod resolve;
pub mod schema;
pub mod value;
mod visit;
