//! Shared file naming for resource ids.

use crate::traits::{StoreError, StoreResult};
use mediaprep_core::ResourceId;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything but RFC 3986 unreserved characters
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const PARTIAL_SUFFIX: &str = ".part";

/// File name holding the complete data of `id`.
pub fn resource_file_name(id: &ResourceId) -> StoreResult<String> {
    let encoded = utf8_percent_encode(id.as_str(), FILE_NAME).to_string();

    if encoded.is_empty() || encoded == "." || encoded == ".." {
        return Err(StoreError::InvalidId(id.to_string()));
    }

    Ok(encoded)
}

/// File name holding bytes of `id` that are still being written.
pub fn partial_file_name(id: &ResourceId) -> StoreResult<String> {
    Ok(format!("{}{}", resource_file_name(id)?, PARTIAL_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_encodes_separators() {
        let name = resource_file_name(&ResourceId::new("local-file:ab/../cd")).unwrap();
        assert_eq!(name, "local-file%3Aab%2F..%2Fcd");
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_dot_ids_rejected() {
        for id in ["", ".", ".."] {
            let result = resource_file_name(&ResourceId::new(id));
            assert!(matches!(result, Err(StoreError::InvalidId(_))), "{id}");
        }
    }

    #[test]
    fn test_partial_name() {
        let name = partial_file_name(&ResourceId::new("doc:1")).unwrap();
        assert_eq!(name, "doc%3A1.part");
    }
}
