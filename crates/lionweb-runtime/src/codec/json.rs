//! Text and byte encodings of chunks and deltas.
//!
//! Chunks travel either as plain JSON or compressed:
//!
//! ```text
//! "LWCZ" | uncompressed size (varint) | zstd frame of the JSON text
//! ```
//!
//! [`decode_chunk_bytes`] tells the two apart by the magic.

use std::io::Read;

use serde::de::DeserializeOwned;

use crate::codec::chunk::SerializationChunk;
use crate::codec::delta::SerializedDelta;
use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAGIC_COMPRESSED, MAX_DECOMPRESSED_BYTES, MAX_NODES_PER_CHUNK};

/// Encodes a chunk as JSON text.
pub fn encode_chunk(chunk: &SerializationChunk) -> Result<String, EncodeError> {
    serde_json::to_string(chunk).map_err(|e| EncodeError::Json(e.to_string()))
}

/// Encodes a chunk as indented JSON text.
pub fn encode_chunk_pretty(chunk: &SerializationChunk) -> Result<String, EncodeError> {
    serde_json::to_string_pretty(chunk).map_err(|e| EncodeError::Json(e.to_string()))
}

/// Decodes a chunk from JSON text.
pub fn decode_chunk(text: &str) -> Result<SerializationChunk, DecodeError> {
    check_chunk(from_json(text.as_bytes())?)
}

/// Encodes a chunk as compressed bytes.
pub fn encode_chunk_compressed(chunk: &SerializationChunk, level: i32) -> Result<Vec<u8>, EncodeError> {
    let uncompressed = serde_json::to_vec(chunk).map_err(|e| EncodeError::Json(e.to_string()))?;
    compress(&uncompressed, level)
}

/// Decodes a chunk from bytes, compressed or plain JSON.
pub fn decode_chunk_bytes(input: &[u8]) -> Result<SerializationChunk, DecodeError> {
    if input.starts_with(MAGIC_COMPRESSED) {
        let decompressed = decompress(input)?;
        return check_chunk(from_json(&decompressed)?);
    }
    check_chunk(from_json(input)?)
}

/// Encodes a delta as JSON text.
pub fn encode_delta(delta: &SerializedDelta) -> Result<String, EncodeError> {
    serde_json::to_string(delta).map_err(|e| EncodeError::Json(e.to_string()))
}

/// Decodes a delta from JSON text.
pub fn decode_delta(text: &str) -> Result<SerializedDelta, DecodeError> {
    from_json(text.as_bytes())
}

/// Strips the compressed header and inflates the payload.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut reader = Reader::new(input);
    let magic = reader.read_bytes(MAGIC_COMPRESSED.len(), "magic")?;
    if magic != MAGIC_COMPRESSED {
        let mut found = [0u8; 4];
        found.copy_from_slice(magic);
        return Err(DecodeError::InvalidMagic { found });
    }

    let declared_size = reader.read_varint("uncompressed_size")? as usize;
    if declared_size > MAX_DECOMPRESSED_BYTES {
        return Err(DecodeError::LengthExceedsLimit {
            field: "uncompressed_size",
            len: declared_size,
            max: MAX_DECOMPRESSED_BYTES,
        });
    }

    let decoder =
        zstd::Decoder::new(reader.remaining()).map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;
    let mut decompressed = Vec::with_capacity(declared_size);
    // One byte past the declared size is enough to detect a lying header.
    decoder
        .take(declared_size as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() != declared_size {
        return Err(DecodeError::UncompressedSizeMismatch {
            declared: declared_size,
            actual: decompressed.len(),
        });
    }
    Ok(decompressed)
}

fn compress(uncompressed: &[u8], level: i32) -> Result<Vec<u8>, EncodeError> {
    let compressed = zstd::encode_all(uncompressed, level).map_err(|e| EncodeError::CompressionFailed(e.to_string()))?;

    let mut writer = Writer::with_capacity(MAGIC_COMPRESSED.len() + 10 + compressed.len());
    writer.write_bytes(MAGIC_COMPRESSED);
    writer.write_varint(uncompressed.len() as u64);
    writer.write_bytes(&compressed);
    Ok(writer.into_bytes())
}

fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError::Json(e.to_string()))
}

fn check_chunk(chunk: SerializationChunk) -> Result<SerializationChunk, DecodeError> {
    if chunk.nodes.len() > MAX_NODES_PER_CHUNK {
        return Err(DecodeError::LengthExceedsLimit {
            field: "nodes",
            len: chunk.nodes.len(),
            max: MAX_NODES_PER_CHUNK,
        });
    }
    Ok(chunk)
}
