// Bincode wrappers so the rest of the crate never touches the codec config
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Serialize data using bincode 2.0 with standard configuration
pub fn serialize<T: Serialize + bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::encode_to_vec(data, config)
        .map_err(|e| LedgerError::Serialization(format!("Serialization failed: {e}")))
}

/// Deserialize data using bincode 2.0 with standard configuration
pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: for<'de> Deserialize<'de> + bincode::Decode<()>,
{
    let config = bincode::config::standard();
    let (data, _) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| LedgerError::Serialization(format!("Deserialization failed: {e}")))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
    struct StoredRecord {
        address: String,
        balance: u64,
        history: Vec<i64>,
    }

    #[test]
    fn test_record_roundtrip() {
        let original = StoredRecord {
            address: "0x00aa11bb22cc33dd44ee55ff66aa77bb88cc99dd".to_string(),
            balance: 10_000_000_000,
            history: vec![1_700_000_000_000, 1_700_000_060_000],
        };

        let serialized = serialize(&original).expect("Serialization should work");
        let deserialized: StoredRecord =
            deserialize(&serialized).expect("Deserialization should work");

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_serialize_empty_data() {
        let empty_vec: Vec<u8> = vec![];
        let serialized = serialize(&empty_vec).expect("Should serialize empty vector");
        let deserialized: Vec<u8> =
            deserialize(&serialized).expect("Should deserialize empty vector");
        assert_eq!(empty_vec, deserialized);
    }

    #[test]
    fn test_deserialize_invalid_data() {
        let invalid_bytes = vec![0xFF, 0xFF, 0xFF, 0xFF];
        let result: Result<StoredRecord> = deserialize(&invalid_bytes);
        assert!(result.is_err());
    }
}
