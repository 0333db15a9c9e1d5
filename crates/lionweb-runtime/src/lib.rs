//! LionWeb runtime: typed model graphs with replayable deltas.
//!
//! This crate keeps a graph of nodes whose properties, containments and
//! references are governed by a schema, emits a delta for every mutation,
//! and serializes graphs and deltas to the LionWeb JSON format.
//!
//! # Overview
//!
//! - Every mutation enforces the multiplicity of its feature and the tree
//!   shape of containment (one parent per node, no cycles).
//! - Every mutation reports exactly the deltas describing it, in order, to
//!   the graph's [`DeltaHandler`].
//! - Deltas received from elsewhere are replayed through the direct,
//!   non-emitting path, so replay never echoes.
//!
//! # Quick Start
//!
//! ```rust
//! use lionweb_runtime::schema::{LanguageBuilder, Multiplicity, PrimitiveType, SymbolTable};
//! use lionweb_runtime::codec::{decode_chunk, encode_chunk, serialize_nodes};
//! use lionweb_runtime::codec::{AccumulatingProblemHandler, Deserializer};
//! use lionweb_runtime::{DeltaCollector, Graph};
//!
//! let language = LanguageBuilder::new("Library", "1")
//!     .concept("Book", |c| c.property("title", PrimitiveType::String))
//!     .concept("Shelf", |c| c.containment("books", "Book", Multiplicity::ZeroOrMore))
//!     .build()
//!     .unwrap();
//! let shelf_concept = language.classifier("Shelf").unwrap();
//! let book_concept = language.classifier("Book").unwrap();
//! let books = shelf_concept.feature("books").unwrap().clone();
//! let title = book_concept.feature("title").unwrap().clone();
//!
//! let deltas = DeltaCollector::new();
//! let mut graph = Graph::with_delta_handler(deltas.clone());
//! let shelf = graph.create_node(shelf_concept, "shelf").unwrap();
//! let book = graph.create_node(book_concept, "book").unwrap();
//! graph.set_property(book, &title, Some("Dune".into())).unwrap();
//! graph.add_child(shelf, &books, book).unwrap();
//! assert_eq!(deltas.len(), 2);
//!
//! // Serialize, then load into a fresh graph.
//! let text = encode_chunk(&serialize_nodes(&graph, &[shelf])).unwrap();
//! let symbols = SymbolTable::new([language.clone()]);
//! let mut copy = Graph::new();
//! let mut problems = AccumulatingProblemHandler::new();
//! let roots = Deserializer::new(&symbols)
//!     .deserialize(&decode_chunk(&text).unwrap(), &mut copy, &mut problems)
//!     .unwrap();
//! assert_eq!(copy.id_of(roots[0]).as_str(), "shelf");
//! assert!(problems.is_empty());
//! ```
//!
//! # Modules
//!
//! - [`schema`]: Languages, classifiers, features and the symbol table
//! - [`model`]: Nodes, the graph arena, property values and deltas
//! - [`value_manager`]: Emitting and direct mutation entry points
//! - [`replay`]: Non-emitting replay of deltas
//! - [`codec`]: JSON chunks, wire deltas and compression
//! - [`validate`]: Structural validation
//! - [`error`]: Error types
//! - [`limits`]: Limits for decoding untrusted input
//!
//! # Wire Format
//!
//! Chunks are LionWeb JSON (`serializationFormatVersion` 2023.1), either as
//! text or compressed:
//! - Plain: the JSON text
//! - Compressed: `LWCZ` magic + uncompressed size + zstd data
//!
//! [`codec::decode_chunk_bytes`] detects and handles both.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod replay;
pub mod schema;
pub mod validate;
pub mod value_manager;

// Re-export commonly used types at crate root
pub use codec::{
    decode_chunk, decode_chunk_bytes, encode_chunk, encode_chunk_compressed, replay_serialized_delta,
    serialize_delta, serialize_nodes, Deserializer, SerializationChunk, SerializedDelta,
};
pub use error::{DecodeError, EncodeError, ErrorCode, Problem, RuntimeError, SchemaError, ValidationError};
pub use model::{
    Delta, DeltaCollector, DeltaHandler, Graph, Id, IdMapping, Link, Node, NodeHandle, Parentage, PropertyValue,
    ReferenceTarget,
};
pub use schema::{Classifier, Feature, Language, LanguageBuilder, MetaPointer, SymbolTable};
pub use validate::{validate_graph, validate_subtree};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serialization format version of the chunks this crate reads and writes.
pub const SERIALIZATION_FORMAT_VERSION: &str = "2023.1";
