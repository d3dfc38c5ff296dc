//! Sprig-compatible filters and functions.
//!
//! Covers the sprig helpers that configuration templates commonly use and
//! that the engine and `minijinja-contrib` do not already provide. Names
//! follow sprig so existing templates read the same:
//!
//! ```text
//! server_name {{ Values.host | required("host is required") | quote }};
//! {{ Values.extra | toYaml | nindent(4) }}
//! {% if hasKey(Values, "tls") %}listen 443 ssl;{% endif %}
//! ```
//!
//! | Name | Kind |
//! |------|------|
//! | `quote`, `squote`, `nindent`, `trimPrefix`, `trimSuffix` | filter |
//! | `b64enc`, `b64dec`, `sha256sum`, `toYaml`, `toJson` | filter |
//! | `ternary`, `required` | filter |
//! | `dict`, `list`, `hasKey` | function |
//!
//! Sprig's pipeline argument becomes the filter's input, so
//! `cond | ternary "a" "b"` is written `cond | ternary("a", "b")`.
//! Unlike `getFile` and `getYaml`, failures here are template errors.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;

use minijinja::value::{Rest, Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};
use sha2::{Digest, Sha256};

/// Registers the sprig filters and functions into `env`.
pub fn install(env: &mut Environment<'_>) {
    env.add_filter("quote", quote);
    env.add_filter("squote", squote);
    env.add_filter("nindent", nindent);
    env.add_filter("trimPrefix", trim_prefix);
    env.add_filter("trimSuffix", trim_suffix);
    env.add_filter("b64enc", b64enc);
    env.add_filter("b64dec", b64dec);
    env.add_filter("sha256sum", sha256sum);
    env.add_filter("toYaml", to_yaml);
    env.add_filter("toJson", to_json);
    env.add_filter("ternary", ternary);
    env.add_filter("required", required);

    env.add_function("dict", dict);
    env.add_function("list", list);
    env.add_function("hasKey", has_key);
}

fn is_nil(value: &Value) -> bool {
    value.is_undefined() || value.is_none()
}

/// Wraps the value in double quotes, escaping as a JSON string.
fn quote(value: Value) -> String {
    if is_nil(&value) {
        return String::new();
    }
    serde_json::Value::String(value.to_string()).to_string()
}

/// Wraps the value in single quotes without escaping.
fn squote(value: Value) -> String {
    if is_nil(&value) {
        return String::new();
    }
    format!("'{value}'")
}

/// Indents every line by `width` spaces and prepends a newline.
fn nindent(value: String, width: usize) -> String {
    let pad = " ".repeat(width);
    format!("\n{pad}{}", value.replace('\n', &format!("\n{pad}")))
}

fn trim_prefix(value: String, prefix: String) -> String {
    value.strip_prefix(prefix.as_str()).unwrap_or(&value).to_string()
}

fn trim_suffix(value: String, suffix: String) -> String {
    value.strip_suffix(suffix.as_str()).unwrap_or(&value).to_string()
}

fn b64enc(value: String) -> String {
    STANDARD.encode(value)
}

fn b64dec(value: String) -> Result<String, Error> {
    let bytes = STANDARD.decode(value.trim()).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("b64dec: invalid base64 input: {e}"),
        )
    })?;
    String::from_utf8(bytes).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("b64dec: decoded bytes are not UTF-8: {e}"),
        )
    })
}

fn sha256sum(value: String) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Serializes the value as YAML without the trailing newline.
fn to_yaml(value: Value) -> Result<String, Error> {
    let yaml = serde_yaml_ng::to_string(&value).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("toYaml: cannot serialize value: {e}"),
        )
    })?;
    Ok(yaml.trim_end_matches('\n').to_string())
}

/// Serializes the value as compact JSON.
fn to_json(value: Value) -> Result<String, Error> {
    serde_json::to_string(&value).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("toJson: cannot serialize value: {e}"),
        )
    })
}

fn ternary(condition: &Value, if_true: Value, if_false: Value) -> Value {
    if condition.is_true() { if_true } else { if_false }
}

/// Fails the render with `message` when the value is missing or empty.
fn required(value: Value, message: &str) -> Result<Value, Error> {
    if is_nil(&value) || value.as_str() == Some("") {
        return Err(Error::new(ErrorKind::InvalidOperation, message.to_string()));
    }
    Ok(value)
}

/// Builds a mapping from alternating keys and values.
///
/// A lone mapping argument, which is also how keyword arguments arrive, is
/// returned unchanged so the engine's `dict(port=80)` form keeps working. A
/// trailing key without a value maps to `""`.
fn dict(args: Rest<Value>) -> Value {
    if let [single] = args.as_slice()
        && single.kind() == ValueKind::Map
    {
        return single.clone();
    }

    let map: BTreeMap<String, Value> = args
        .chunks(2)
        .map(|pair| {
            let value = pair.get(1).cloned().unwrap_or_else(|| Value::from(""));
            (pair[0].to_string(), value)
        })
        .collect();
    Value::from_serialize(&map)
}

fn list(items: Rest<Value>) -> Value {
    Value::from(items.0)
}

fn has_key(map: &Value, key: &str) -> Result<bool, Error> {
    if map.kind() != ValueKind::Map {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("hasKey: expected a mapping, found {}", map.kind()),
        ));
    }
    Ok(!map.get_attr(key)?.is_undefined())
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;
    use test_case::test_case;

    fn render(source: &str, ctx: Value) -> String {
        let mut env = Environment::new();
        install(&mut env);
        env.render_str(source, ctx).unwrap()
    }

    #[test_case(r#"{{ "example.com" | quote }}"#, r#""example.com""# ; "quote string")]
    #[test_case(r#"{{ 'say "hi"' | quote }}"#, r#""say \"hi\"""# ; "quote escapes")]
    #[test_case("{{ missing | quote }}", "" ; "quote undefined")]
    #[test_case("{{ 8080 | squote }}", "'8080'" ; "squote number")]
    #[test_case(r#"{{ "a\nb" | nindent(2) }}"#, "\n  a\n  b" ; "nindent")]
    #[test_case(r#"{{ "/api/v1" | trimPrefix("/api") }}"#, "/v1" ; "trim prefix")]
    #[test_case(r#"{{ "app.conf" | trimSuffix(".conf") }}"#, "app" ; "trim suffix")]
    #[test_case(r#"{{ "app" | trimSuffix(".conf") }}"#, "app" ; "trim suffix absent")]
    #[test_case(r#"{{ "user:pass" | b64enc }}"#, "dXNlcjpwYXNz" ; "b64enc")]
    #[test_case(r#"{{ "dXNlcjpwYXNz" | b64dec }}"#, "user:pass" ; "b64dec")]
    #[test_case(
        r#"{{ "abc" | sha256sum }}"#,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad" ;
        "sha256sum"
    )]
    #[test_case(r#"{{ true | ternary("on", "off") }}"#, "on" ; "ternary true")]
    #[test_case(r#"{{ 0 | ternary("on", "off") }}"#, "off" ; "ternary falsy")]
    #[test_case(r#"{{ "x" | required("host is required") }}"#, "x" ; "required present")]
    #[test_case(
        r#"{{ dict("port", 80, "host", "a") | toJson }}"#,
        r#"{"host":"a","port":80}"# ;
        "dict pairs"
    )]
    #[test_case(r#"{{ dict("only") | toJson }}"#, r#"{"only":""}"# ; "dict odd arguments")]
    #[test_case(r#"{{ dict() | toJson }}"#, "{}" ; "dict empty")]
    #[test_case(r#"{{ list(1, "a") | toJson }}"#, r#"[1,"a"]"# ; "list")]
    #[test_case(r#"{{ hasKey(dict("a", none), "a") }}"#, "true" ; "has key with none value")]
    #[test_case(r#"{{ hasKey(dict("a", 1), "b") }}"#, "false" ; "has key absent")]
    fn test_filters(source: &str, expected: &str) {
        assert_eq!(render(source, context! {}), expected);
    }

    #[test]
    fn test_dict_passes_a_mapping_through() {
        let ctx = context! { upstream => context! { port => 9000 } };
        assert_eq!(render("{{ dict(upstream) | toJson }}", ctx), r#"{"port":9000}"#);
    }

    #[test_case("{{ missing | required(\"host is required\") }}" ; "undefined")]
    #[test_case("{{ none | required(\"host is required\") }}" ; "none")]
    #[test_case("{{ \"\" | required(\"host is required\") }}" ; "empty string")]
    fn test_required_fails_render(source: &str) {
        let mut env = Environment::new();
        install(&mut env);
        let err = env.render_str(source, context! {}).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert_eq!(err.detail(), Some("host is required"));
    }

    #[test]
    fn test_has_key_on_non_mapping_is_template_error() {
        let mut env = Environment::new();
        install(&mut env);
        let err = env
            .render_str(r#"{{ hasKey("text", "a") }}"#, context! {})
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_to_yaml_and_to_json() {
        let ctx = context! { upstream => context! { host => "backend", port => 9000 } };

        assert_eq!(
            render("{{ upstream | toYaml }}", ctx.clone()),
            "host: backend\nport: 9000"
        );
        assert_eq!(
            render("{{ upstream | toJson }}", ctx),
            r#"{"host":"backend","port":9000}"#
        );
    }

    #[test]
    fn test_b64dec_invalid_is_template_error() {
        let mut env = Environment::new();
        install(&mut env);
        let err = env
            .render_str(r#"{{ "not base64!" | b64dec }}"#, context! {})
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }
}
