//! Values document loading.
//!
//! A values file is sniffed rather than trusted by extension: if the raw bytes
//! are valid JSON the document is deserialized as JSON, otherwise it is
//! deserialized as YAML. There is no fallback from one format to the other.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::Value;

use crate::{Error, Result};

/// The values exposed to templates as `Values`.
pub type ValuesDocument = serde_json::Map<String, Value>;

/// Format of a values document, selected by sniffing its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValuesFormat {
    /// RFC 8259 JSON.
    Json,
    /// YAML (anything that is not valid JSON).
    Yaml,
}

impl ValuesFormat {
    /// Returns the display name of the format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }
}

impl fmt::Display for ValuesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detects the format of raw values bytes.
///
/// Strict JSON validation is attempted on the whole input; only input that
/// validates is treated as JSON.
#[must_use]
pub fn detect_format(bytes: &[u8]) -> ValuesFormat {
    if serde_json::from_slice::<IgnoredAny>(bytes).is_ok() {
        ValuesFormat::Json
    } else {
        ValuesFormat::Yaml
    }
}

/// Loads the values document at `path`.
///
/// `None` or an empty path yields an empty document.
///
/// # Errors
///
/// Returns [`Error::ReadFile`] if the file cannot be read and
/// [`Error::ParseValues`] if it cannot be parsed by the detected format.
pub fn load_values(path: Option<&Path>) -> Result<ValuesDocument> {
    let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(ValuesDocument::new());
    };

    let bytes = std::fs::read(path).map_err(|source| Error::ReadFile {
        kind: "values file",
        path: path.to_path_buf(),
        source,
    })?;

    parse_values(path, &bytes)
}

/// Parses raw values bytes read from `path`.
///
/// A `null` document (JSON `null`, or an empty or comment-only YAML file) is
/// an empty mapping. Any other non-mapping root is rejected.
///
/// YAML input uses its first document only. Merge keys (`<<: *anchor`) are
/// applied, and scalar mapping keys such as `404` or `true` become strings.
///
/// # Errors
///
/// Returns [`Error::ParseValues`] if the bytes cannot be parsed by the
/// detected format or the root is not a mapping.
pub fn parse_values(path: &Path, bytes: &[u8]) -> Result<ValuesDocument> {
    let format = detect_format(bytes);
    tracing::debug!(path = %path.display(), %format, "Detected values format");

    let parse_error = |cause: String| Error::ParseValues {
        path: path.to_path_buf(),
        format,
        cause,
    };

    match format {
        ValuesFormat::Json => {
            let value: Value =
                serde_json::from_slice(bytes).map_err(|e| parse_error(e.to_string()))?;
            match value {
                Value::Object(map) => Ok(map),
                Value::Null => Ok(ValuesDocument::new()),
                other => Err(parse_error(format!(
                    "expected a mapping at the document root, found {}",
                    json_kind(&other)
                ))),
            }
        },
        ValuesFormat::Yaml => parse_yaml(bytes).map_err(parse_error),
    }
}

fn parse_yaml(bytes: &[u8]) -> std::result::Result<ValuesDocument, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {e}"))?;
    let document = first_yaml_document(text).map_err(|e| e.to_string())?;

    match yaml_to_json(document)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(ValuesDocument::new()),
        Value::Array(_) => {
            Err("expected a mapping at the document root, found a sequence".to_string())
        },
        _ => Err("expected a mapping at the document root, found a scalar".to_string()),
    }
}

/// Parses the first document of a YAML stream with merge keys applied.
///
/// Later documents are ignored. A stream with no documents is `Null`.
pub(crate) fn first_yaml_document(text: &str) -> serde_yaml_ng::Result<serde_yaml_ng::Value> {
    let Some(document) = serde_yaml_ng::Deserializer::from_str(text).next() else {
        return Ok(serde_yaml_ng::Value::Null);
    };
    let mut value = serde_yaml_ng::Value::deserialize(document)?;
    value.apply_merge()?;
    Ok(value)
}

/// Converts a YAML tree to JSON, stringifying scalar mapping keys.
fn yaml_to_json(value: serde_yaml_ng::Value) -> std::result::Result<Value, String> {
    use serde_yaml_ng::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => yaml_number(&n),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<std::result::Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = ValuesDocument::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(map)
        },
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml_ng::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        // NaN and infinities have no JSON form.
        n.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map_or(Value::Null, Value::Number)
    }
}

fn yaml_key(key: serde_yaml_ng::Value) -> std::result::Result<String, String> {
    use serde_yaml_ng::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        Yaml::Sequence(_) | Yaml::Mapping(_) => {
            Err("mapping keys must be scalars, found a collection".to_string())
        },
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_case::test_case;

    fn parse(input: &str) -> Result<ValuesDocument> {
        parse_values(Path::new("values"), input.as_bytes())
    }

    #[test_case(r#"{"host": "example.com"}"#, ValuesFormat::Json ; "json object")]
    #[test_case("[1, 2, 3]", ValuesFormat::Json ; "json array")]
    #[test_case("null", ValuesFormat::Json ; "json null")]
    #[test_case("host: example.com", ValuesFormat::Yaml ; "yaml mapping")]
    #[test_case("{host: example.com}", ValuesFormat::Yaml ; "yaml flow mapping")]
    #[test_case("", ValuesFormat::Yaml ; "empty input")]
    #[test_case(r#"{"host": "a",}"#, ValuesFormat::Yaml ; "json trailing comma")]
    fn test_detect_format(input: &str, expected: ValuesFormat) {
        assert_eq!(detect_format(input.as_bytes()), expected);
    }

    #[test]
    fn test_parse_json_mapping() {
        let values = parse(r#"{"host": "example.com", "port": 8080, "tls": true}"#).unwrap();
        assert_eq!(values["host"], "example.com");
        assert_eq!(values["port"], 8080);
        assert_eq!(values["tls"], true);
    }

    #[test]
    fn test_parse_yaml_nested() {
        let input = r"
server:
  name: example.com
  locations:
    - /api
    - /static
";
        let values = parse(input).unwrap();
        assert_eq!(values["server"]["name"], "example.com");
        assert_eq!(values["server"]["locations"][1], "/static");
    }

    #[test]
    fn test_json_is_never_parsed_as_yaml() {
        // Valid JSON whose root is not a mapping must fail instead of falling back.
        let err = parse("[1, 2, 3]").unwrap_err();
        assert!(matches!(
            &err,
            Error::ParseValues { format: ValuesFormat::Json, cause, .. } if cause.contains("an array")
        ));
    }

    #[test]
    fn test_invalid_yaml_is_fatal() {
        let err = parse("host: [unclosed\n  - : :").unwrap_err();
        assert!(matches!(
            err,
            Error::ParseValues {
                format: ValuesFormat::Yaml,
                ..
            }
        ));
    }

    #[test]
    fn test_yaml_scalar_root_is_rejected() {
        let err = parse("just a string").unwrap_err();
        assert!(err.to_string().contains("found a scalar"));
    }

    #[test_case("" ; "empty")]
    #[test_case("   \n\n" ; "whitespace")]
    #[test_case("# only a comment\n" ; "comment only")]
    #[test_case("null" ; "json null")]
    #[test_case("~" ; "yaml null")]
    fn test_null_documents_are_empty(input: &str) {
        assert!(parse(input).unwrap().is_empty());
    }

    #[test_case(
        "base: &base\n  port: 80\n  gzip: on\nprod:\n  <<: *base\n  host: example.com\n" ;
        "single merge"
    )]
    #[test_case(
        "a: &a {port: 80}\nb: &b {gzip: on}\nprod:\n  <<: [*a, *b]\n  host: example.com\n" ;
        "merge list"
    )]
    fn test_yaml_merge_keys_are_applied(input: &str) {
        let values = parse(input).unwrap();
        let prod = values["prod"].as_object().unwrap();

        assert_eq!(prod["port"], 80);
        assert_eq!(prod["host"], "example.com");
        assert!(!prod.contains_key("<<"));
    }

    #[test]
    fn test_yaml_merge_keeps_local_overrides() {
        let values = parse("base: &b\n  port: 80\nprod:\n  <<: *b\n  port: 443\n").unwrap();
        assert_eq!(values["prod"]["port"], 443);
    }

    #[test]
    fn test_yaml_scalar_keys_become_strings() {
        let input = r"
error_pages:
  404: /404.html
  500: /50x.html
ports:
  80: http
features:
  true: enabled
  ~: nothing
";
        let values = parse(input).unwrap();

        assert_eq!(values["error_pages"]["404"], "/404.html");
        assert_eq!(values["error_pages"]["500"], "/50x.html");
        assert_eq!(values["ports"]["80"], "http");
        assert_eq!(values["features"]["true"], "enabled");
        assert_eq!(values["features"]["null"], "nothing");
    }

    #[test]
    fn test_yaml_collection_key_is_rejected() {
        let err = parse("? [a, b]\n: value\n").unwrap_err();
        assert!(err.to_string().contains("mapping keys must be scalars"));
    }

    #[test]
    fn test_yaml_uses_first_document() {
        let values = parse("host: first\n---\nhost: second\n").unwrap();
        assert_eq!(values["host"], "first");
    }

    #[test]
    fn test_load_values_without_path_is_empty() {
        assert!(load_values(None).unwrap().is_empty());
        assert!(load_values(Some(Path::new(""))).unwrap().is_empty());
    }

    #[test]
    fn test_load_values_missing_file() {
        let err = load_values(Some(Path::new("/nonexistent/values.yaml"))).unwrap_err();
        assert!(matches!(err, Error::ReadFile { kind: "values file", .. }));
    }

    #[test]
    fn test_load_values_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "upstream:\n  port: 9000\n").unwrap();

        let values = load_values(Some(file.path())).unwrap();
        assert_eq!(values["upstream"]["port"], 9000);
    }
}
