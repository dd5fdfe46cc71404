use crate::repository::{PersistedValue, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Split a value into the `(kind, value)` column pair.
///
/// Integers and text are stored verbatim; lists are JSON arrays.
pub(crate) fn encode_value(
    value: &PersistedValue,
) -> Result<(&'static str, String), StorageError> {
    let encoded = match value {
        PersistedValue::Integer(n) => n.to_string(),
        PersistedValue::Text(text) => text.clone(),
        PersistedValue::TextList(items) => serde_json::to_string(items).map_err(ser)?,
    };
    Ok((value.kind(), encoded))
}

pub(crate) fn decode_value(kind: &str, raw: String) -> Result<PersistedValue, StorageError> {
    match kind {
        "integer" => raw
            .trim()
            .parse::<i64>()
            .map(PersistedValue::Integer)
            .map_err(ser),
        "text" => Ok(PersistedValue::Text(raw)),
        "text_list" => serde_json::from_str::<Vec<String>>(&raw)
            .map(PersistedValue::TextList)
            .map_err(ser),
        _ => Err(StorageError::Serialization(format!("invalid kind: {kind}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_json_encoded() {
        let (kind, raw) =
            encode_value(&PersistedValue::TextList(vec!["1".into(), "7".into()])).unwrap();
        assert_eq!(kind, "text_list");
        assert_eq!(raw, r#"["1","7"]"#);
    }

    #[test]
    fn unknown_kind_is_a_serialization_error() {
        let err = decode_value("float", "1.5".into()).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn corrupt_integer_is_a_serialization_error() {
        let err = decode_value("integer", "twelve".into()).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
