use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::error::{CodecError, CodecResult};
use crate::format::Format;
use crate::ser::to_value;
use crate::value::Value;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Encode `value` as `format`.
///
/// `indent` is the number of spaces per JSON nesting level; `0` yields
/// compact JSON. YAML output always uses block style and ignores `indent`.
pub fn encode<T: Serialize + ?Sized>(value: &T, format: Format, indent: usize) -> CodecResult<Vec<u8>> {
    let tree = to_value(value)?;
    check_representable(&tree, format)?;

    let bytes = match format {
        Format::Json => render_json(&tree, indent)?,
        Format::Yaml => serde_yaml::to_string(&tree)?.into_bytes(),
    };
    debug!(%format, indent, bytes = bytes.len(), "encoded value");
    Ok(bytes)
}

/// Parse `bytes` into a shape-free [`Value`].
pub fn decode(bytes: &[u8], format: Format) -> CodecResult<Value> {
    decode_as(bytes, format)
}

/// Parse `bytes` directly into `T`.
///
/// Missing fields, type mismatches and unknown fields (under
/// `#[serde(deny_unknown_fields)]`) surface as the format's parse error.
pub fn decode_as<T: DeserializeOwned>(bytes: &[u8], format: Format) -> CodecResult<T> {
    let bytes = strip_bom(bytes);
    match format {
        Format::Json => Ok(serde_json::from_slice(bytes)?),
        Format::Yaml => Ok(serde_yaml::from_slice(bytes)?),
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

fn render_json(tree: &Value, indent: usize) -> CodecResult<Vec<u8>> {
    if indent == 0 {
        return Ok(serde_json::to_vec(tree)?);
    }
    let spaces = vec![b' '; indent];
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(&spaces));
    tree.serialize(&mut ser)?;
    Ok(out)
}

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn render_path(segments: &[Segment<'_>]) -> String {
    let mut path = String::from("$");
    for segment in segments {
        match segment {
            Segment::Key(key) => {
                path.push('.');
                path.push_str(key);
            }
            Segment::Index(idx) => path.push_str(&format!("[{idx}]")),
        }
    }
    path
}

/// Reject values the target format would silently mangle.
fn check_representable(tree: &Value, format: Format) -> CodecResult<()> {
    let mut segments = Vec::new();
    walk(tree, format, &mut segments)
}

fn walk<'a>(value: &'a Value, format: Format, segments: &mut Vec<Segment<'a>>) -> CodecResult<()> {
    let reason = match value {
        Value::Integer(n) if *n < i128::from(i64::MIN) || *n > i128::from(u64::MAX) => {
            Some(format!("integer {n} is outside the 64-bit range"))
        }
        Value::Float(f) if format == Format::Json && !f.is_finite() => {
            Some(format!("{f} is not a finite number"))
        }
        Value::Sequence(items) => {
            for (idx, item) in items.iter().enumerate() {
                segments.push(Segment::Index(idx));
                walk(item, format, segments)?;
                segments.pop();
            }
            None
        }
        Value::Mapping(map) => {
            for (key, item) in map.iter() {
                segments.push(Segment::Key(key));
                walk(item, format, segments)?;
                segments.pop();
            }
            None
        }
        _ => None,
    };

    match reason {
        Some(reason) => Err(CodecError::Unrepresentable {
            format,
            path: render_path(segments),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde::Deserialize;

    use super::*;
    use crate::value::Mapping;

    fn project() -> Value {
        let mut map = Mapping::new();
        map.insert("name", "Easy File");
        map.insert("version", "0.4.0");
        Value::Mapping(map)
    }

    #[test]
    fn json_pretty_two_spaces() {
        let bytes = encode(&project(), Format::Json, 2).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\n  \"name\": \"Easy File\",\n  \"version\": \"0.4.0\"\n}"
        );
    }

    #[test]
    fn json_compact_at_zero() {
        let bytes = encode(&project(), Format::Json, 0).unwrap();
        assert_eq!(bytes, br#"{"name":"Easy File","version":"0.4.0"}"#);
    }

    #[test]
    fn json_custom_indent() {
        let bytes = encode(&vec![1, 2], Format::Json, 4).unwrap();
        assert_eq!(bytes, b"[\n    1,\n    2\n]");
    }

    #[test]
    fn yaml_is_block_style() {
        let text = String::from_utf8(encode(&project(), Format::Yaml, 8).unwrap()).unwrap();
        assert!(text.starts_with("name: Easy File\n"), "{text}");
        assert!(!text.contains('{'));
        assert_eq!(decode(text.as_bytes(), Format::Yaml).unwrap(), project());
    }

    #[test]
    fn key_order_survives_both_formats() {
        let mut map = Mapping::new();
        for key in ["zulu", "alpha", "mike", "bravo"] {
            map.insert(key, key.len());
        }
        let value = Value::Mapping(map);
        for format in [Format::Json, Format::Yaml] {
            let back = decode(&encode(&value, format, 2).unwrap(), format).unwrap();
            let keys: Vec<_> = back.as_mapping().unwrap().keys().collect();
            assert_eq!(keys, vec!["zulu", "alpha", "mike", "bravo"], "{format}");
        }
    }

    #[test]
    fn non_finite_float_rejected_for_json_only() {
        let mut map = Mapping::new();
        map.insert("ratio", vec![1.0, f64::NAN]);
        let value = Value::Mapping(map);

        let err = encode(&value, Format::Json, 2).unwrap_err();
        match err {
            CodecError::Unrepresentable { format, path, .. } => {
                assert_eq!(format, Format::Json);
                assert_eq!(path, "$.ratio[1]");
            }
            other => panic!("unexpected error: {other}"),
        }

        let yaml = encode(&value, Format::Yaml, 2).unwrap();
        let back = decode(&yaml, Format::Yaml).unwrap();
        assert!(back["ratio"][1].as_f64().unwrap().is_nan());
    }

    #[test]
    fn wide_integers_rejected() {
        let value = Value::Sequence(vec![Value::Integer(i128::from(u64::MAX) + 1)]);
        for format in [Format::Json, Format::Yaml] {
            assert!(matches!(
                encode(&value, format, 0),
                Err(CodecError::Unrepresentable { .. })
            ));
        }
        let edges = vec![Value::from(i64::MIN), Value::from(u64::MAX)];
        let json = encode(&edges, Format::Json, 0).unwrap();
        assert_eq!(decode(&json, Format::Json).unwrap(), Value::Sequence(edges));
    }

    #[test]
    fn bom_is_ignored() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(br#"{"a": 1}"#);
        assert_eq!(decode(&bytes, Format::Json).unwrap()["a"].as_i64(), Some(1));

        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"a: 1\n");
        assert_eq!(decode(&bytes, Format::Yaml).unwrap()["a"].as_i64(), Some(1));
    }

    #[test]
    fn malformed_input_is_a_syntax_error() {
        let err = decode(b"{bad json", Format::Json).unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
        assert_eq!(err.format(), Some(Format::Json));

        let err = decode(b"a: [1, 2", Format::Yaml).unwrap_err();
        assert!(matches!(err, CodecError::Yaml(_)));
    }

    #[test]
    fn duplicate_keys_rejected() {
        let err = decode(br#"{"a": 1, "a": 2}"#, Format::Json).unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{err}");
    }

    #[test]
    fn yaml_scalar_keys_become_strings() {
        let v = decode(b"1: one\ntrue: yes\n", Format::Yaml).unwrap();
        assert_eq!(v["1"].as_str(), Some("one"));
        assert!(v.get("true").is_some());
    }

    #[test]
    fn unicode_strings() {
        let value = Value::from(vec!["Grüße", "日本語", "🦀🚀"]);
        for format in [Format::Json, Format::Yaml] {
            let back = decode(&encode(&value, format, 2).unwrap(), format).unwrap();
            assert_eq!(back, value);
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Config {
        name: String,
        retries: u32,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn decode_into_shape() {
        let cfg: Config = decode_as(br#"{"name":"svc","retries":3}"#, Format::Json).unwrap();
        assert_eq!(
            cfg,
            Config {
                name: "svc".into(),
                retries: 3,
                tags: vec![],
            }
        );

        let cfg: Config = decode_as(b"name: svc\nretries: 1\ntags: [a]\n", Format::Yaml).unwrap();
        assert_eq!(cfg.tags, vec!["a".to_string()]);
    }

    #[test]
    fn shape_mismatches() {
        let missing = decode_as::<Config>(br#"{"name":"svc"}"#, Format::Json).unwrap_err();
        assert!(missing.to_string().contains("retries"), "{missing}");

        let wrong_type = decode_as::<Config>(br#"{"name":"svc","retries":"x"}"#, Format::Json).unwrap_err();
        assert!(matches!(wrong_type, CodecError::Json(_)));

        let unknown = decode_as::<Config>(b"name: svc\nretries: 1\nextra: 2\n", Format::Yaml).unwrap_err();
        assert!(unknown.to_string().contains("extra"), "{unknown}");
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            any::<u64>().prop_map(Value::from),
            any::<f64>()
                .prop_filter("finite", |f| f.is_finite())
                .prop_map(Value::Float),
            "[a-zA-Zäöüß€😀 ]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Sequence),
                prop::collection::vec(("[a-z]{1,8}", inner), 0..4)
                    .prop_map(|entries| Value::Mapping(entries.into_iter().collect())),
            ]
        })
    }

    fn arb_document() -> impl Strategy<Value = Value> {
        prop::collection::vec(("[a-z]{1,8}", arb_value()), 0..5)
            .prop_map(|entries| Value::Mapping(entries.into_iter().collect()))
    }

    /// Every mapping's keys, depth first, in stored order.
    fn key_order(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Mapping(map) => {
                for (key, child) in map.iter() {
                    out.push(key.to_string());
                    key_order(child, out);
                }
            }
            Value::Sequence(items) => items.iter().for_each(|item| key_order(item, out)),
            _ => {}
        }
    }

    fn keys_of(value: &Value) -> Vec<String> {
        let mut out = Vec::new();
        key_order(value, &mut out);
        out
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn json_round_trip(doc in arb_document(), indent in 0usize..5) {
            let bytes = encode(&doc, Format::Json, indent).unwrap();
            let back = decode(&bytes, Format::Json).unwrap();
            prop_assert_eq!(keys_of(&back), keys_of(&doc));
            prop_assert_eq!(back, doc);
        }

        #[test]
        fn yaml_round_trip(doc in arb_document()) {
            let bytes = encode(&doc, Format::Yaml, 2).unwrap();
            let back = decode(&bytes, Format::Yaml).unwrap();
            prop_assert_eq!(keys_of(&back), keys_of(&doc));
            prop_assert_eq!(back, doc);
        }
    }
}
