//! Wire format: LionWeb JSON chunks and deltas.
//!
//! A graph is serialized to a flat, id-addressed [`SerializationChunk`];
//! deltas to [`SerializedDelta`]s that embed the subtrees they move in or
//! out. Both encode as JSON text, and chunks optionally as zstd-compressed
//! bytes.

pub mod chunk;
pub mod delta;
pub mod deserializer;
pub mod json;
pub(crate) mod primitives;
pub mod serializer;
pub mod value;

pub use chunk::{
    SerializationChunk, SerializedContainment, SerializedNode, SerializedProperty, SerializedReference,
    SerializedReferenceTarget, UsedLanguage,
};
pub use delta::{replay_serialized_delta, serialize_delta, DeltaDeserializer, SerializedDelta, SerializedDeltaCollector};
pub use deserializer::{AccumulatingProblemHandler, DeserializeMode, DeserializeOptions, Deserializer, ProblemHandler};
pub use json::{
    decode_chunk, decode_chunk_bytes, decode_delta, decompress, encode_chunk, encode_chunk_compressed,
    encode_chunk_pretty, encode_delta,
};
pub use serializer::{serialize_node, serialize_nodes, serialize_target};
pub use value::{decode_property_value, encode_property_value, ValueDecodeError};
