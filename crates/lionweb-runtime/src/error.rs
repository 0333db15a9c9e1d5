//! Error types for graph mutation, (de)serialization and validation.

use thiserror::Error;

use crate::model::Id;
use crate::schema::{FeatureKind, MetaPointer, Multiplicity};

/// Error codes grouping the decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Malformed or unsupported wire input
    MalformedInput,
    /// E002: Schema mismatch between sender and receiver
    SchemaMismatch,
    /// E003: Node identifier not known to the receiver
    UnknownNode,
    /// E004: Input exceeds decoding limits
    LimitExceeded,
    /// E005: Decoded delta could not be applied
    Rejected,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::MalformedInput => "E001",
            ErrorCode::SchemaMismatch => "E002",
            ErrorCode::UnknownNode => "E003",
            ErrorCode::LimitExceeded => "E004",
            ErrorCode::Rejected => "E005",
        }
    }
}

/// Error raised by a mutation or read on a graph.
///
/// These are programmer errors: the call fails and the graph is left as it
/// was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("can't read required {kind} \"{feature}\" that's unset on instance of {classifier} with id={id}")]
    UnsetRequiredRead {
        kind: FeatureKind,
        classifier: String,
        feature: String,
        id: Id,
    },

    #[error("can't unset required {kind} \"{feature}\" on instance of {classifier} with id={id}")]
    UnsetRequired {
        kind: FeatureKind,
        classifier: String,
        feature: String,
        id: Id,
    },

    #[error("index {index} out of bounds (length: {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("classifier {classifier} has no feature \"{feature}\"")]
    FeatureNotFound { classifier: String, feature: String },

    #[error("feature \"{feature}\" is a {actual}, not a {expected}")]
    FeatureKindMismatch {
        feature: String,
        expected: FeatureKind,
        actual: FeatureKind,
    },

    #[error("feature \"{feature}\" has multiplicity {multiplicity}, which this operation doesn't support")]
    MultiplicityMismatch {
        feature: String,
        multiplicity: Multiplicity,
    },

    #[error("value for property \"{property}\" doesn't conform to its type {expected}")]
    ValueTypeMismatch { property: String, expected: String },

    #[error("enumeration {enumeration} has no literal with key \"{literal}\"")]
    UnknownEnumerationLiteral { enumeration: String, literal: String },

    #[error("single-valued {kind} \"{feature}\" on node with id={id} is already set")]
    SlotOccupied {
        kind: FeatureKind,
        feature: String,
        id: Id,
    },

    #[error("a node with id={id} already exists")]
    DuplicateId { id: Id },

    #[error("\"{id}\" is not a valid node id")]
    InvalidId { id: String },

    #[error("node with id={id} is an instance of {classifier}, which is not an annotation")]
    NotAnAnnotation { id: Id, classifier: String },

    #[error("annotation with id={id} can't be contained through containment \"{feature}\"")]
    AnnotationInContainment { id: Id, feature: String },

    #[error("attaching node with id={child} under node with id={container} would create a containment cycle")]
    CyclicContainment { container: Id, child: Id },

    #[error("reference target {target:?} is unresolved")]
    UnresolvedReference { target: Option<Id> },

    #[error("delta doesn't match the graph: {context}")]
    DeltaMismatch { context: String },
}

/// Error while decoding wire input (chunks and deltas).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("[E001] malformed JSON: {0}")]
    Json(String),

    #[error("[E001] invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    #[error("[E001] unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("[E001] invalid magic bytes: expected LWCZ, found {found:?}")]
    InvalidMagic { found: [u8; 4] },

    #[error("[E001] varint exceeds maximum length")]
    VarintTooLong,

    #[error("[E001] varint overflows u64")]
    VarintOverflow,

    #[error("[E001] unsupported serialization format version: {version}")]
    UnsupportedFormatVersion { version: String },

    #[error("[E001] invalid value {value:?} for property {property:?}: {reason}")]
    InvalidPropertyValue {
        property: MetaPointer,
        value: String,
        reason: String,
    },

    #[error("[E001] zstd decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("[E001] decompressed size {actual} doesn't match declared {declared}")]
    UncompressedSizeMismatch { declared: usize, actual: usize },

    #[error("[E002] no feature matches meta-pointer {feature:?}")]
    UnknownFeatureMetaPointer { feature: MetaPointer },

    #[error("[E002] no classifier matches meta-pointer {classifier:?}")]
    UnknownClassifier { classifier: MetaPointer },

    #[error("[E003] no node with id={id}")]
    UnknownNodeId { id: Id },

    #[error("[E004] {field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("[E005] {0}")]
    Runtime(#[from] RuntimeError),
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::UnknownFeatureMetaPointer { .. } | DecodeError::UnknownClassifier { .. } => {
                ErrorCode::SchemaMismatch
            }
            DecodeError::UnknownNodeId { .. } => ErrorCode::UnknownNode,
            DecodeError::LengthExceedsLimit { .. } => ErrorCode::LimitExceeded,
            DecodeError::Runtime(_) => ErrorCode::Rejected,
            _ => ErrorCode::MalformedInput,
        }
    }
}

/// Error during encoding to the wire.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("JSON encoding failed: {0}")]
    Json(String),

    #[error("zstd compression failed: {0}")]
    CompressionFailed(String),
}

/// Error while building a schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("language {language} has no enumeration named {name}")]
    UnknownEnumeration { language: String, name: String },

    #[error("language {language} declares key {key} more than once")]
    DuplicateKey { language: String, key: String },
}

/// A non-fatal issue found while deserializing a chunk.
///
/// The offending node or feature value is skipped (or replaced by a
/// placeholder); the rest of the chunk still loads.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Problem {
    #[error("node with id={node} has unknown classifier {classifier:?}, skipped it")]
    UnknownClassifier { node: Id, classifier: MetaPointer },

    #[error("node with id={node} has a value for unknown feature {feature:?}")]
    UnknownFeature { node: Id, feature: MetaPointer },

    #[error("node with id={node} has invalid value {value:?} for property {property:?}: {reason}")]
    InvalidPropertyValue {
        node: Id,
        property: MetaPointer,
        value: String,
        reason: String,
    },

    #[error("node with id={node} has unknown literal {literal:?} for property {property:?}")]
    UnknownEnumerationLiteral {
        node: Id,
        property: MetaPointer,
        literal: String,
    },

    #[error("node with id={node} refers to unresolved target {target:?} through {reference:?}")]
    UnresolvedReferenceTarget {
        node: Id,
        reference: MetaPointer,
        target: Option<Id>,
    },

    #[error("node with id={node} contains unknown child with id={child} through {containment:?}")]
    UnresolvedChild {
        node: Id,
        containment: MetaPointer,
        child: Id,
    },

    #[error("node with id={node} is annotated with unknown node with id={annotation}")]
    UnresolvedAnnotation { node: Id, annotation: Id },

    #[error("a node with id={node} already exists, skipped the record")]
    DuplicateNodeId { node: Id },

    #[error("node with id={node} has {count} values for single-valued feature {feature:?}")]
    MultiplicityViolation {
        node: Id,
        feature: MetaPointer,
        count: usize,
    },

    #[error("couldn't wire node with id={node}: {error}")]
    Rejected { node: Id, error: RuntimeError },
}

/// Structural validation finding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("required {kind} \"{feature}\" is unset on node with id={node}")]
    RequiredFeatureUnset {
        node: Id,
        kind: FeatureKind,
        feature: String,
    },

    #[error("reference \"{feature}\" on node with id={node} has unresolved target {target:?}")]
    UnresolvedReference {
        node: Id,
        feature: String,
        target: Option<Id>,
    },

    #[error("node with id={node} isn't held by its parent at the feature it claims")]
    ParentMismatch { node: Id },
}
