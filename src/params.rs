use std::fmt;

use rosc::OscType;
use thiserror::Error;

use crate::remote::osc_sender::{OscSink, SendError};
use crate::remote::query::{fetch_parameter, Fetched, ParamType, ParameterQuery, QueryError};

/// A raw caller-supplied value, before validation against the target
/// parameter's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Map a JSON scalar from config.json. Arrays, objects and null are not
    /// sendable values.
    pub fn from_json(value: &serde_json::Value) -> Option<ParamValue> {
        match value {
            serde_json::Value::Bool(b) => Some(ParamValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(ParamValue::Int(i))
                } else {
                    n.as_f64().map(ParamValue::Float)
                }
            }
            serde_json::Value::String(s) => Some(ParamValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Natural OSC representation, used when the target declares no type.
    fn to_osc(&self) -> OscType {
        match self {
            ParamValue::Bool(b) => OscType::Bool(*b),
            ParamValue::Int(i) => match i32::try_from(*i) {
                Ok(v) => OscType::Int(v),
                Err(_) => OscType::Long(*i),
            },
            ParamValue::Float(f) => OscType::Float(*f as f32),
            ParamValue::Text(s) => OscType::String(s.clone()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Raw value could not be converted to the parameter's declared type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Cannot convert '{raw}' to {target}")]
pub struct CoerceError {
    raw: String,
    target: &'static str,
}

impl CoerceError {
    fn new(raw: &ParamValue, target: &'static str) -> CoerceError {
        CoerceError {
            raw: raw.to_string(),
            target,
        }
    }
}

/// Validate `raw` against the declared parameter type and produce the OSC
/// argument to send.
pub fn coerce(raw: &ParamValue, target: ParamType) -> Result<OscType, CoerceError> {
    match target {
        ParamType::Bool => coerce_bool(raw).map(OscType::Bool),
        ParamType::Int => coerce_int(raw).map(OscType::Int),
        ParamType::Float => coerce_float(raw).map(OscType::Float),
        // Stringification never fails.
        ParamType::Text => Ok(OscType::String(raw.to_string())),
        ParamType::Unknown => Ok(raw.to_osc()),
    }
}

fn coerce_bool(raw: &ParamValue) -> Result<bool, CoerceError> {
    match raw {
        ParamValue::Bool(b) => Ok(*b),
        ParamValue::Int(i) => Ok(*i != 0),
        ParamValue::Text(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(CoerceError::new(raw, "bool")),
        },
        ParamValue::Float(_) => Err(CoerceError::new(raw, "bool")),
    }
}

fn coerce_int(raw: &ParamValue) -> Result<i32, CoerceError> {
    match raw {
        ParamValue::Int(i) => i32::try_from(*i).map_err(|_| CoerceError::new(raw, "int")),
        ParamValue::Float(f) => {
            let truncated = f.trunc();
            if f.is_finite()
                && truncated >= f64::from(i32::MIN)
                && truncated <= f64::from(i32::MAX)
            {
                Ok(truncated as i32)
            } else {
                Err(CoerceError::new(raw, "int"))
            }
        }
        ParamValue::Bool(b) => Ok(i32::from(*b)),
        ParamValue::Text(s) => s
            .trim()
            .parse::<i32>()
            .map_err(|_| CoerceError::new(raw, "int")),
    }
}

fn coerce_float(raw: &ParamValue) -> Result<f32, CoerceError> {
    match raw {
        ParamValue::Float(f) => Ok(*f as f32),
        ParamValue::Int(i) => Ok(*i as f32),
        ParamValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        ParamValue::Text(s) => s
            .trim()
            .parse::<f32>()
            .map_err(|_| CoerceError::new(raw, "float")),
    }
}

/// Result of one parameter write. Every failure keeps its category so the
/// caller can tell validation failures from collaborator faults.
#[derive(Debug)]
pub enum WriteOutcome {
    Sent,
    Rejected(String),
    QueryFailed(QueryError),
    SendFailed(SendError),
}

/// Set one parameter: fetch its metadata, gate on access mode, coerce the
/// value against the declared type, then hand exactly one datagram to the
/// sink. The first failing gate wins; nothing is sent on rejection.
pub fn set_parameter(
    query: &dyn ParameterQuery,
    sink: &mut dyn OscSink,
    path: &str,
    raw: &ParamValue,
) -> WriteOutcome {
    let node = match fetch_parameter(query, path) {
        Fetched::Node(node) => node,
        Fetched::NotFound => {
            return WriteOutcome::Rejected(format!("parameter '{}' not found", path));
        }
        Fetched::Failed(err) => return WriteOutcome::QueryFailed(err),
    };

    if let Some(mode) = node.access_mode() {
        if mode.forbids_write() {
            println!(
                "Error: Parameter '{}' is not writable (Access: {})",
                path,
                mode.name()
            );
            return WriteOutcome::Rejected(format!("access mode {}", mode.name()));
        }
    }

    let arg = match node.param_type() {
        Some(target) => match coerce(raw, target) {
            Ok(arg) => arg,
            Err(err) => {
                println!("Error: {}", err);
                return WriteOutcome::Rejected(err.to_string());
            }
        },
        // No declared type: the raw value goes out untouched.
        None => raw.to_osc(),
    };

    match sink.send(path, arg) {
        Ok(()) => WriteOutcome::Sent,
        Err(err) => {
            eprintln!("Error setting parameter '{}': {}", path, err);
            WriteOutcome::SendFailed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::query::ParameterNode;
    use rstest::rstest;

    fn node(tags: Option<&str>, access: Option<u8>) -> ParameterNode {
        ParameterNode {
            full_path: "/avatar/parameters/VRCEmote".to_string(),
            type_tags: tags.map(str::to_string),
            access,
            value: None,
            contents: None,
        }
    }

    struct MockQuery {
        node: Option<ParameterNode>,
        fail: bool,
    }

    impl MockQuery {
        fn with(node: ParameterNode) -> MockQuery {
            MockQuery {
                node: Some(node),
                fail: false,
            }
        }
    }

    impl ParameterQuery for MockQuery {
        fn query_node(&self, _path: &str) -> Result<Option<ParameterNode>, QueryError> {
            if self.fail {
                return Err(QueryError::Status {
                    url: "http://127.0.0.1:1/avatar/parameters/VRCEmote".to_string(),
                    status: 500,
                });
            }
            Ok(self.node.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<(String, OscType)>,
    }

    impl OscSink for RecordingSink {
        fn send(&mut self, addr: &str, value: OscType) -> Result<(), SendError> {
            self.sent.push((addr.to_string(), value));
            Ok(())
        }
    }

    // --- coercion ---

    #[rstest]
    #[case("TRUE", true)]
    #[case("true", true)]
    #[case("1", true)]
    #[case("yes", true)]
    #[case("Yes", true)]
    #[case("FALSE", false)]
    #[case("false", false)]
    #[case("0", false)]
    #[case("no", false)]
    fn bool_target_maps_known_strings(#[case] raw: &str, #[case] expected: bool) {
        let got = coerce(&ParamValue::Text(raw.to_string()), ParamType::Bool).unwrap();
        assert_eq!(got, OscType::Bool(expected));
    }

    #[rstest]
    #[case("maybe")]
    #[case("2")]
    #[case("")]
    fn bool_target_rejects_unknown_strings(#[case] raw: &str) {
        assert!(coerce(&ParamValue::Text(raw.to_string()), ParamType::Bool).is_err());
    }

    #[test]
    fn bool_target_takes_integers_by_truthiness() {
        assert_eq!(
            coerce(&ParamValue::Int(5), ParamType::Bool).unwrap(),
            OscType::Bool(true)
        );
        assert_eq!(
            coerce(&ParamValue::Int(0), ParamType::Bool).unwrap(),
            OscType::Bool(false)
        );
    }

    #[test]
    fn bool_target_rejects_floats() {
        assert!(coerce(&ParamValue::Float(1.0), ParamType::Bool).is_err());
    }

    #[rstest]
    #[case("42", 42)]
    #[case("-7", -7)]
    #[case(" 13 ", 13)]
    fn int_target_parses_strings(#[case] raw: &str, #[case] expected: i32) {
        let got = coerce(&ParamValue::Text(raw.to_string()), ParamType::Int).unwrap();
        assert_eq!(got, OscType::Int(expected));
    }

    #[rstest]
    #[case("abc")]
    #[case("4.5")]
    #[case("")]
    fn int_target_rejects_non_numeric_strings(#[case] raw: &str) {
        assert!(coerce(&ParamValue::Text(raw.to_string()), ParamType::Int).is_err());
    }

    #[test]
    fn int_target_truncates_floats() {
        assert_eq!(
            coerce(&ParamValue::Float(3.9), ParamType::Int).unwrap(),
            OscType::Int(3)
        );
        assert_eq!(
            coerce(&ParamValue::Float(-3.9), ParamType::Int).unwrap(),
            OscType::Int(-3)
        );
        assert!(coerce(&ParamValue::Float(f64::NAN), ParamType::Int).is_err());
        assert!(coerce(&ParamValue::Float(1e12), ParamType::Int).is_err());
    }

    #[test]
    fn int_target_takes_bools_as_zero_or_one() {
        assert_eq!(
            coerce(&ParamValue::Bool(true), ParamType::Int).unwrap(),
            OscType::Int(1)
        );
        assert_eq!(
            coerce(&ParamValue::Bool(false), ParamType::Int).unwrap(),
            OscType::Int(0)
        );
    }

    #[test]
    fn float_target_accepts_numerics_and_parses_strings() {
        assert_eq!(
            coerce(&ParamValue::Int(2), ParamType::Float).unwrap(),
            OscType::Float(2.0)
        );
        assert_eq!(
            coerce(&ParamValue::Text("0.25".to_string()), ParamType::Float).unwrap(),
            OscType::Float(0.25)
        );
        assert_eq!(
            coerce(&ParamValue::Bool(true), ParamType::Float).unwrap(),
            OscType::Float(1.0)
        );
        assert!(coerce(&ParamValue::Text("abc".to_string()), ParamType::Float).is_err());
    }

    #[test]
    fn text_target_stringifies_anything() {
        assert_eq!(
            coerce(&ParamValue::Int(42), ParamType::Text).unwrap(),
            OscType::String("42".to_string())
        );
        assert_eq!(
            coerce(&ParamValue::Bool(false), ParamType::Text).unwrap(),
            OscType::String("false".to_string())
        );
    }

    #[test]
    fn already_typed_values_pass_through_unchanged() {
        assert_eq!(
            coerce(&ParamValue::Bool(true), ParamType::Bool).unwrap(),
            OscType::Bool(true)
        );
        assert_eq!(
            coerce(&ParamValue::Int(42), ParamType::Int).unwrap(),
            OscType::Int(42)
        );
        assert_eq!(
            coerce(&ParamValue::Float(0.5), ParamType::Float).unwrap(),
            OscType::Float(0.5)
        );
        assert_eq!(
            coerce(&ParamValue::Text("hi".to_string()), ParamType::Text).unwrap(),
            OscType::String("hi".to_string())
        );
    }

    #[test]
    fn unknown_target_passes_the_raw_value_through() {
        assert_eq!(
            coerce(&ParamValue::Float(0.5), ParamType::Unknown).unwrap(),
            OscType::Float(0.5)
        );
        assert_eq!(
            coerce(&ParamValue::Text("x".to_string()), ParamType::Unknown).unwrap(),
            OscType::String("x".to_string())
        );
    }

    // --- write gates ---

    #[test]
    fn emote_write_sends_exactly_one_int_datagram() {
        let query = MockQuery::with(node(Some("i"), Some(3)));
        let mut sink = RecordingSink::default();
        let outcome = set_parameter(
            &query,
            &mut sink,
            "/avatar/parameters/VRCEmote",
            &ParamValue::Int(20),
        );
        assert!(matches!(outcome, WriteOutcome::Sent));
        assert_eq!(
            sink.sent,
            vec![(
                "/avatar/parameters/VRCEmote".to_string(),
                OscType::Int(20)
            )]
        );
    }

    #[test]
    fn read_only_parameter_always_rejects() {
        let query = MockQuery::with(node(Some("i"), Some(1)));
        let mut sink = RecordingSink::default();
        let outcome = set_parameter(
            &query,
            &mut sink,
            "/avatar/parameters/VRCEmote",
            &ParamValue::Int(20),
        );
        assert!(matches!(outcome, WriteOutcome::Rejected(_)));
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn no_value_parameter_rejects() {
        let query = MockQuery::with(node(Some("i"), Some(0)));
        let mut sink = RecordingSink::default();
        let outcome = set_parameter(
            &query,
            &mut sink,
            "/avatar/parameters/VRCEmote",
            &ParamValue::Int(1),
        );
        assert!(matches!(outcome, WriteOutcome::Rejected(_)));
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn absent_access_metadata_is_permissive() {
        let query = MockQuery::with(node(Some("i"), None));
        let mut sink = RecordingSink::default();
        let outcome = set_parameter(
            &query,
            &mut sink,
            "/avatar/parameters/VRCEmote",
            &ParamValue::Int(1),
        );
        assert!(matches!(outcome, WriteOutcome::Sent));
        assert_eq!(sink.sent.len(), 1);
    }

    #[test]
    fn missing_node_rejects_without_sending() {
        let query = MockQuery { node: None, fail: false };
        let mut sink = RecordingSink::default();
        let outcome = set_parameter(
            &query,
            &mut sink,
            "/avatar/parameters/Missing",
            &ParamValue::Int(1),
        );
        assert!(matches!(outcome, WriteOutcome::Rejected(_)));
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn query_fault_surfaces_without_sending() {
        let query = MockQuery { node: None, fail: true };
        let mut sink = RecordingSink::default();
        let outcome = set_parameter(
            &query,
            &mut sink,
            "/avatar/parameters/VRCEmote",
            &ParamValue::Int(1),
        );
        assert!(matches!(outcome, WriteOutcome::QueryFailed(_)));
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn coercion_failure_rejects_without_sending() {
        let query = MockQuery::with(node(Some("i"), Some(3)));
        let mut sink = RecordingSink::default();
        let outcome = set_parameter(
            &query,
            &mut sink,
            "/avatar/parameters/VRCEmote",
            &ParamValue::Text("abc".to_string()),
        );
        assert!(matches!(outcome, WriteOutcome::Rejected(_)));
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn untyped_node_sends_the_raw_value() {
        let query = MockQuery::with(node(None, Some(3)));
        let mut sink = RecordingSink::default();
        let outcome = set_parameter(
            &query,
            &mut sink,
            "/avatar/parameters/VRCEmote",
            &ParamValue::Float(0.5),
        );
        assert!(matches!(outcome, WriteOutcome::Sent));
        assert_eq!(sink.sent[0].1, OscType::Float(0.5));
    }

    #[test]
    fn int_value_reaches_a_bool_parameter_by_truthiness() {
        // MuteSelf is declared bool; the config sends 1/0 like the ints they are.
        let query = MockQuery::with(node(Some("T"), Some(3)));
        let mut sink = RecordingSink::default();
        let outcome = set_parameter(
            &query,
            &mut sink,
            "/avatar/parameters/MuteSelf",
            &ParamValue::Int(1),
        );
        assert!(matches!(outcome, WriteOutcome::Sent));
        assert_eq!(sink.sent[0].1, OscType::Bool(true));
    }

    #[test]
    fn config_json_scalars_map_to_values() {
        assert_eq!(
            ParamValue::from_json(&serde_json::json!(20)),
            Some(ParamValue::Int(20))
        );
        assert_eq!(
            ParamValue::from_json(&serde_json::json!(0.5)),
            Some(ParamValue::Float(0.5))
        );
        assert_eq!(
            ParamValue::from_json(&serde_json::json!(true)),
            Some(ParamValue::Bool(true))
        );
        assert_eq!(
            ParamValue::from_json(&serde_json::json!("hi")),
            Some(ParamValue::Text("hi".to_string()))
        );
        assert_eq!(ParamValue::from_json(&serde_json::json!([1, 2])), None);
        assert_eq!(ParamValue::from_json(&serde_json::Value::Null), None);
    }
}
