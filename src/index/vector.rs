//! Embedding storage format

/// Little-endian `f32` bytes, the BLOB layout of `chunks.embedding`
///
/// This is the layout libsql's vector functions read, so stored chunks can be
/// compared with `vector_distance_cos` for any embedding dimension.
pub fn encode_embedding(vec: &[f64]) -> Vec<u8> {
    vec.iter().flat_map(|v| (*v as f32).to_le_bytes()).collect()
}
