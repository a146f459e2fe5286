//! Parsing of `key=value` style module output.

use std::collections::BTreeMap;

use crate::error::{GeoError, GeoResult};

/// Parsed key/value pairs, ordered by key.
pub type KeyValues = BTreeMap<String, String>;

/// Parse `key<sep>value` records.
///
/// Records are separated by `vsep`, or by lines when `vsep` is `None`.
/// Blank records are skipped; surrounding whitespace is trimmed from both
/// key and value. A record without `sep` is an error.
pub fn parse_key_values(text: &str, sep: &str, vsep: Option<&str>) -> GeoResult<KeyValues> {
    let records: Vec<&str> = match vsep {
        Some(vsep) => text.split(vsep).collect(),
        None => text.lines().collect(),
    };

    let mut values = KeyValues::new();
    for record in records.into_iter().map(str::trim).filter(|r| !r.is_empty()) {
        let (key, value) = record.split_once(sep).ok_or_else(|| {
            GeoError::parse(
                "key/value output",
                format!("no '{}' in record '{}'", sep, record),
            )
        })?;
        values.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let values = parse_key_values("n=228500\ns=215000\n\nrows=1350\n", "=", None).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values["n"], "228500");
        assert_eq!(values["rows"], "1350");
    }

    #[test]
    fn test_parse_single_line_with_space_separator() {
        let values =
            parse_key_values("n=50.1 s=48.5 w=12 e=15.5 rows=160 cols=350\n", "=", Some(" "))
                .unwrap();
        assert_eq!(values["e"], "15.5");
        assert_eq!(values["cols"], "350");
    }

    #[test]
    fn test_value_may_contain_separator() {
        let values = parse_key_values("proj=+proj=utm +zone=33", "=", None).unwrap();
        assert_eq!(values["proj"], "+proj=utm +zone=33");
    }

    #[test]
    fn test_record_without_separator() {
        let err = parse_key_values("n=1\ngarbage\n", "=", None).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_colon_separator() {
        let values = parse_key_values("GISDBASE: /data\nMAPSET: PERMANENT\n", ":", None).unwrap();
        assert_eq!(values["GISDBASE"], "/data");
        assert_eq!(values["MAPSET"], "PERMANENT");
    }
}
