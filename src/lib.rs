//! docsearch — chunk rendered documentation pages and search them
//! semantically.
//!
//! The pipeline turns a tree of rendered HTML documentation into small,
//! independently embeddable chunks tagged with page URL, section
//! anchor, and kind (text or code):
//!
//! ```text
//! HTML page -> render -> normalize -> sections -> chunks -> validate
//!                                                             |
//!                                       embed + vector index <-
//! ```
//!
//! The transformation core ([`normalize`], [`sections`], [`chunk`],
//! [`validate`]) is pure string processing with no I/O; embedding,
//! the vector index, and snapshots are thin collaborators around it.

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod index;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod pages;
pub mod render;
pub mod search;
pub mod sections;
pub mod snapshot;
pub mod validate;
