// src/dag/id.rs

use std::collections::HashSet;

use chrono::Utc;

/// Hex characters kept from the hash (24 bits, ~16M ids).
const ID_HEX_LEN: usize = 6;

/// Short hash id: `prefix` + first hex chars of `blake3(label-nanos)`.
pub fn generate_id(prefix: &str, label: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    hash_id(prefix, &format!("{label}-{nanos}"))
}

/// Like [`generate_id`], but re-salts until the id is not in `taken`.
/// The returned id is inserted into `taken`.
pub fn generate_unique_id(prefix: &str, label: &str, taken: &mut HashSet<String>) -> String {
    let mut id = generate_id(prefix, label);
    let mut attempt = 1u32;
    while !taken.insert(id.clone()) {
        id = generate_id(prefix, &format!("{label}#{attempt}"));
        attempt += 1;
    }
    id
}

fn hash_id(prefix: &str, data: &str) -> String {
    let hex = blake3::hash(data.as_bytes()).to_hex();
    format!("{prefix}{}", &hex[..ID_HEX_LEN])
}
