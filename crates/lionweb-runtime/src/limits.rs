//! Limits applied when decoding untrusted wire input.

/// Maximum length of a node identifier.
pub const MAX_ID_LEN: usize = 256;

/// Maximum number of node records in one chunk.
pub const MAX_NODES_PER_CHUNK: usize = 1_000_000;

/// Maximum size of a decompressed chunk or delta.
pub const MAX_DECOMPRESSED_BYTES: usize = 256 * 1024 * 1024;

/// Maximum number of bytes of an unsigned varint.
pub const MAX_VARINT_BYTES: usize = 10;

/// Magic prefix of zstd-compressed payloads.
pub const MAGIC_COMPRESSED: &[u8; 4] = b"LWCZ";
