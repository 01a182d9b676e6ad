use sha2::{Digest, Sha256};

use crate::UtcDateTime;

/// Case-fold and collapse runs of whitespace to a single space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex SHA-256 over the normalized title, publisher and publish instant.
///
/// Each field is prefixed with its byte length, so no choice of field
/// contents can make two different triples hash the same input.
pub fn fingerprint(title: &str, publisher: &str, published_at: UtcDateTime) -> String {
    let mut hasher = Sha256::new();
    update_field(&mut hasher, &normalize(title));
    update_field(&mut hasher, &normalize(publisher));
    update_field(&mut hasher, &published_at.format_rfc3339());
    hex::encode(hasher.finalize())
}

fn update_field(hasher: &mut Sha256, field: &str) {
    let bytes = field.as_bytes();
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
