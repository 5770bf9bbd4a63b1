//! Round trips of the standard payload shapes through the params codec.

use proptest::prelude::*;
use serde_json::{json, Value};

use lspkit::codec::{decode_params, encode_params, encode_result};
use lspkit::types::*;

// ─────────────────────── strategies ───────────────────────

fn token() -> impl Strategy<Value = ProgressToken> {
    prop_oneof![
        any::<i64>().prop_map(ProgressToken::Number),
        ".{0,12}".prop_map(ProgressToken::String),
    ]
}

fn trace() -> impl Strategy<Value = TraceValue> {
    prop_oneof![
        Just(TraceValue::Off),
        Just(TraceValue::Messages),
        Just(TraceValue::Compact),
        Just(TraceValue::Verbose),
    ]
}

fn program() -> impl Strategy<Value = ProgramInfo> {
    ("[a-z-]{1,12}", proptest::option::of("[0-9.]{1,8}"))
        .prop_map(|(name, version)| ProgramInfo { name, version })
}

fn folder() -> impl Strategy<Value = WorkspaceFolder> {
    ("file:///[a-z/]{0,16}", ".{0,8}").prop_map(|(uri, name)| WorkspaceFolder { uri, name })
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        ".{0,10}".prop_map(Value::from),
    ]
}

/// Opaque JSON payloads: scalars and one level of nesting.
fn opaque() -> impl Strategy<Value = Value> {
    prop_oneof![
        scalar(),
        proptest::collection::vec(scalar(), 0..4).prop_map(Value::Array),
        ("[a-z]{1,6}", scalar()).prop_map(|(key, value)| json!({ key: value })),
    ]
}

fn message() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(".{0,16}")
}

fn initialize_params() -> impl Strategy<Value = InitializeParams> {
    (
        proptest::option::of(token()),
        proptest::option::of(any::<i64>()),
        proptest::option::of(program()),
        proptest::option::of("[a-z]{2}(-[A-Z]{2})?"),
        proptest::option::of("file:///[a-z/]{0,16}"),
        proptest::option::of(opaque().prop_map(|v| json!({ "options": v }))),
        proptest::option::of(trace()),
        proptest::option::of(proptest::collection::vec(folder(), 0..3)),
    )
        .prop_map(
            |(work_done_token, process_id, client_info, locale, root_uri, options, trace, folders)| {
                InitializeParams {
                    work_done: WorkDoneProgressParams { work_done_token },
                    process_id,
                    client_info,
                    locale,
                    root_path: None,
                    root_uri,
                    capabilities: ClientCapabilities::default(),
                    initialization_options: options,
                    trace,
                    workspace_folders: folders,
                }
            },
        )
}

fn work_done_progress() -> impl Strategy<Value = WorkDoneProgress> {
    prop_oneof![
        (
            ".{0,16}",
            proptest::option::of(any::<bool>()),
            message(),
            proptest::option::of(0u32..=100),
        )
            .prop_map(|(title, cancellable, message, percentage)| {
                WorkDoneProgress::Begin(WorkDoneProgressBegin {
                    title,
                    cancellable,
                    message,
                    percentage,
                })
            }),
        (
            proptest::option::of(any::<bool>()),
            message(),
            proptest::option::of(0u32..=100),
        )
            .prop_map(|(cancellable, message, percentage)| {
                WorkDoneProgress::Report(WorkDoneProgressReport {
                    cancellable,
                    message,
                    percentage,
                })
            }),
        message().prop_map(|message| WorkDoneProgress::End(WorkDoneProgressEnd { message })),
    ]
}

// ═══════════════════════════════════════════════════════
// ROUND TRIPS
// ═══════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn initialize_params_survive_the_codec(params in initialize_params()) {
        let raw = encode_params(&params).unwrap();
        prop_assert_eq!(decode_params::<InitializeParams>(raw).unwrap(), params);
    }

    #[test]
    fn progress_params_survive_the_codec(token in token(), value in opaque()) {
        let params = ProgressParams { token, value };
        let raw = encode_params(&params).unwrap();
        prop_assert_eq!(decode_params::<ProgressParams>(raw).unwrap(), params);
    }

    #[test]
    fn progress_tokens_survive_the_codec(token in token()) {
        let raw = encode_result(Some(&token)).unwrap();
        prop_assert_eq!(decode_params::<ProgressToken>(raw).unwrap(), token);
    }

    #[test]
    fn work_done_progress_survives_the_codec(progress in work_done_progress()) {
        let raw = encode_result(Some(&progress)).unwrap();
        prop_assert_eq!(decode_params::<WorkDoneProgress>(raw).unwrap(), progress);
    }

    #[test]
    fn void_decodes_from_every_empty_body(body in prop_oneof![
        Just(None::<Value>),
        Just(Some(Value::Null)),
        Just(Some(json!({}))),
        ("[a-z]{1,6}", any::<i64>()).prop_map(|(key, value)| Some(json!({ key: value }))),
    ]) {
        prop_assert_eq!(decode_params::<Void>(body).unwrap(), Void {});
        let raw = encode_result(Some(Void {})).unwrap();
        prop_assert_eq!(decode_params::<Void>(raw).unwrap(), Void {});
    }
}
