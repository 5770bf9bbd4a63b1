//! Dispatch integration tests: registry semantics, typed wrappers and
//! partial results.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Notify;

use lspkit::types::*;
use lspkit::{
    CallContext, ChannelPort, HeaderSet, LifecycleState, MethodDefinition, MethodDirection,
    MethodSet, PartialResult, Session, SessionBuilder,
};

// ─────────────────────── fixtures ───────────────────────

#[derive(Default)]
struct App {
    touched: AtomicUsize,
    gate: Notify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EchoParams {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    query: String,
    #[serde(flatten)]
    partial: PartialResultParams,
}

impl PartialParams for SearchParams {
    fn partial_token(&self) -> Option<&ProgressToken> {
        self.partial.partial_token()
    }
}

async fn echo(
    _call: CallContext<App>,
    _id: RequestId,
    params: EchoParams,
) -> LspResult<Option<EchoParams>> {
    Ok(Some(params))
}

async fn shout(
    _call: CallContext<App>,
    _id: RequestId,
    params: EchoParams,
) -> LspResult<Option<EchoParams>> {
    Ok(Some(EchoParams {
        text: params.text.to_uppercase(),
    }))
}

async fn nothing(_call: CallContext<App>, _id: RequestId, _params: Void) -> LspResult<Option<Void>> {
    Ok(None)
}

async fn fail(_call: CallContext<App>, _id: RequestId, _params: Void) -> LspResult<Option<Void>> {
    Err(LspError::rpc(-32042, "domain failure", Some(json!({"reason": "test"}))))
}

async fn touch(call: CallContext<App>, _params: EchoParams) -> LspResult<()> {
    call.context().touched.fetch_add(1, Ordering::SeqCst);
    Ok(())
}

async fn wait_for_gate(
    call: CallContext<App>,
    _id: RequestId,
    _params: Void,
) -> LspResult<Option<String>> {
    call.context().touched.fetch_add(1, Ordering::SeqCst);
    call.context().gate.notified().await;
    Ok(Some("released".to_string()))
}

async fn content_type(
    call: CallContext<App>,
    _id: RequestId,
    _params: Void,
) -> LspResult<Option<String>> {
    Ok(Some(call.headers().content_type().to_string()))
}

async fn search(
    _call: CallContext<App>,
    _id: RequestId,
    params: SearchParams,
    partial: Option<PartialResult<Vec<String>>>,
) -> LspResult<Option<Vec<String>>> {
    let hits: Vec<String> = (1..=3).map(|i| format!("{}-{i}", params.query)).collect();
    if let Some(partial) = &partial {
        for hit in &hits {
            partial.send(&vec![hit.clone()])?;
        }
    }
    Ok(Some(hits))
}

fn app_methods() -> MethodSet<App> {
    let mut set = MethodSet::standard();
    set.add(MethodDefinition::request(
        "test/echo",
        MethodDirection::ClientToServer,
        echo,
    ));
    set.add(MethodDefinition::request(
        "test/nothing",
        MethodDirection::ClientToServer,
        nothing,
    ));
    set.add(MethodDefinition::request(
        "test/fail",
        MethodDirection::ClientToServer,
        fail,
    ));
    set.add(MethodDefinition::notification(
        "test/touch",
        MethodDirection::ClientToServer,
        touch,
    ));
    set.add(MethodDefinition::request(
        "test/wait",
        MethodDirection::ClientToServer,
        wait_for_gate,
    ));
    set.add(MethodDefinition::request(
        "test/contentType",
        MethodDirection::ClientToServer,
        content_type,
    ));
    set.add(MethodDefinition::request_with_partial(
        "test/search",
        MethodDirection::ClientToServer,
        search,
    ));
    set
}

fn new_session() -> (Arc<Session<App>>, UnboundedReceiver<JsonRpcMessage>) {
    let (port, rx) = ChannelPort::new();
    let session = SessionBuilder::new(App::default())
        .methods(Arc::new(app_methods()))
        .build(port);
    (session, rx)
}

async fn send(session: &Arc<Session<App>>, msg: Value) -> Option<Value> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    session
        .handle_message(HeaderSet::new(), parsed)
        .await
        .map(|reply| serde_json::to_value(reply).unwrap())
}

async fn call(session: &Arc<Session<App>>, id: i64, method: &str, params: Value) -> Value {
    send(
        session,
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}),
    )
    .await
    .expect("expected response")
}

async fn notify(session: &Arc<Session<App>>, method: &str, params: Value) {
    let reply = send(
        session,
        json!({"jsonrpc": "2.0", "method": method, "params": params}),
    )
    .await;
    assert!(reply.is_none(), "notifications never get a reply");
}

async fn ready_session() -> (Arc<Session<App>>, UnboundedReceiver<JsonRpcMessage>) {
    let (session, rx) = new_session();
    call(&session, 0, "initialize", json!({"capabilities": {}})).await;
    notify(&session, "initialized", json!({})).await;
    assert_eq!(session.state(), LifecycleState::Initialized);
    (session, rx)
}

fn drain(rx: &mut UnboundedReceiver<JsonRpcMessage>) -> Vec<JsonRpcMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

// ═══════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════

#[test]
fn test_standard_set_has_lifecycle_methods() {
    let set: MethodSet<App> = MethodSet::standard();
    assert_eq!(set.len(), 4);
    for name in ["initialize", "initialized", "shutdown", "exit"] {
        let def = set.get(name).expect(name);
        assert_eq!(def.direction(), MethodDirection::ClientToServer);
    }
    assert!(set.get("initialize").unwrap().is_request());
    assert!(!set.get("exit").unwrap().is_request());
}

#[test]
fn test_lookup_absent_and_case_sensitive() {
    let set: MethodSet<App> = MethodSet::standard();
    assert!(set.get("textDocument/hover").is_none());
    assert!(set.get("Initialize").is_none());
    assert!(MethodSet::<App>::new().is_empty());
}

#[test]
fn test_descriptor_records_shapes() {
    let set = app_methods();
    let desc = set.get("test/echo").unwrap().descriptor();
    assert!(desc.params_type.ends_with("EchoParams"));
    assert!(desc.result_type.unwrap().ends_with("EchoParams"));

    let desc = set.get("test/touch").unwrap().descriptor();
    assert!(desc.result_type.is_none());
}

#[tokio::test]
async fn test_reregistration_overwrites() {
    let mut set = app_methods();
    let before = set.len();
    set.add(MethodDefinition::request(
        "test/echo",
        MethodDirection::ServerToClient,
        shout,
    ));
    assert_eq!(set.len(), before);
    assert_eq!(
        set.get("test/echo").unwrap().direction(),
        MethodDirection::ServerToClient
    );

    let (port, _rx) = ChannelPort::new();
    let session = SessionBuilder::new(App::default())
        .methods(Arc::new(set))
        .build(port);
    call(&session, 0, "initialize", json!({})).await;
    notify(&session, "initialized", json!({})).await;

    let resp = call(&session, 1, "test/echo", json!({"text": "hi"})).await;
    assert_eq!(resp["result"], json!({"text": "HI"}));
}

#[tokio::test]
async fn test_method_set_shared_across_sessions() {
    let methods = Arc::new(app_methods());
    let (port_a, _rx_a) = ChannelPort::new();
    let (port_b, _rx_b) = ChannelPort::new();
    let a = SessionBuilder::new(App::default())
        .methods(methods.clone())
        .build(port_a);
    let b = SessionBuilder::new(App::default())
        .methods(methods)
        .build(port_b);

    call(&a, 0, "initialize", json!({})).await;
    assert_eq!(a.state(), LifecycleState::Initializing);
    assert_eq!(b.state(), LifecycleState::Uninitialized);
    assert!(Arc::ptr_eq(a.methods(), b.methods()));
}

// ═══════════════════════════════════════════════════════
// WRAPPERS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_typed_request_round_trip() {
    let (session, _rx) = ready_session().await;
    let resp = call(&session, 1, "test/echo", json!({"text": "héllo ✓"})).await;
    assert_eq!(resp["result"], json!({"text": "héllo ✓"}));
}

#[tokio::test]
async fn test_absent_result_is_null() {
    let (session, _rx) = ready_session().await;
    let resp = call(&session, 1, "test/nothing", json!(null)).await;
    assert_eq!(resp["result"], Value::Null);
    assert!(resp.get("error").is_none());
}

#[tokio::test]
async fn test_invalid_params_skip_handler() {
    let (session, _rx) = ready_session().await;
    let resp = call(&session, 1, "test/echo", json!({"txt": "typo"})).await;
    assert_eq!(resp["error"]["code"], json!(-32602));

    notify(&session, "test/touch", json!({"wrong": true})).await;
    assert_eq!(session.context().touched.load(Ordering::SeqCst), 0);

    notify(&session, "test/touch", json!({"text": "ok"})).await;
    assert_eq!(session.context().touched.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_error_passes_through() {
    let (session, _rx) = ready_session().await;
    let resp = call(&session, 3, "test/fail", json!({})).await;
    assert_eq!(
        resp["error"],
        json!({"code": -32042, "message": "domain failure", "data": {"reason": "test"}})
    );
    assert_eq!(resp["id"], json!(3));
}

#[tokio::test]
async fn test_notification_before_initialized_is_dropped() {
    let (session, _rx) = new_session();
    notify(&session, "test/touch", json!({"text": "early"})).await;
    assert_eq!(session.context().touched.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dollar_notifications_ignored() {
    let (session, mut rx) = ready_session().await;
    notify(&session, "$/cancelRequest", json!({"id": 1})).await;
    notify(&session, "$/setTrace", json!({"value": "off"})).await;
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_headers_reach_handler() {
    let (session, _rx) = ready_session().await;
    let mut headers = HeaderSet::new();
    headers.insert("Content-Type", "application/json");
    let req = JsonRpcRequest::new(RequestId::Number(4), "test/contentType", None);

    let reply = session.handle_request(headers, req).await;
    match reply {
        JsonRpcMessage::Response(resp) => assert_eq!(resp.result, json!("application/json")),
        other => panic!("expected response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_handler_does_not_block_lifecycle() {
    let (session, _rx) = ready_session().await;

    let slow = {
        let session = session.clone();
        tokio::spawn(async move { call(&session, 10, "test/wait", json!({})).await })
    };
    while session.context().touched.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(session.state(), LifecycleState::Initialized);
    let resp = call(&session, 11, "shutdown", json!(null)).await;
    assert_eq!(resp["result"], json!({}));
    assert_eq!(session.state(), LifecycleState::Shutdown);

    session.context().gate.notify_one();
    let resp = slow.await.unwrap();
    assert_eq!(resp["result"], json!("released"));
}

// ═══════════════════════════════════════════════════════
// PARTIAL RESULTS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_partial_results_with_token() {
    let (session, mut rx) = ready_session().await;
    let resp = call(
        &session,
        7,
        "test/search",
        json!({"query": "foo", "partialResultToken": "p1"}),
    )
    .await;
    assert_eq!(resp["result"], json!(["foo-1", "foo-2", "foo-3"]));

    let progress: Vec<JsonRpcNotification> = drain(&mut rx)
        .into_iter()
        .filter_map(|msg| match msg {
            JsonRpcMessage::Notification(n) => Some(n),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 3);
    for (i, n) in progress.iter().enumerate() {
        assert_eq!(n.method, "$/progress");
        let params = n.params.as_ref().unwrap();
        assert_eq!(params["token"], json!("p1"));
        assert_eq!(params["value"], json!([format!("foo-{}", i + 1)]));
    }
}

#[tokio::test]
async fn test_partial_results_without_token() {
    let (session, mut rx) = ready_session().await;
    let resp = call(&session, 8, "test/search", json!({"query": "bar"})).await;
    assert_eq!(resp["result"], json!(["bar-1", "bar-2", "bar-3"]));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_partial_request_with_numeric_token() {
    let (session, mut rx) = ready_session().await;
    call(
        &session,
        9,
        "test/search",
        json!({"query": "n", "partialResultToken": 12}),
    )
    .await;
    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 3);
    match &sent[0] {
        JsonRpcMessage::Notification(n) => assert_eq!(n.params.as_ref().unwrap()["token"], json!(12)),
        other => panic!("expected notification, got {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════
// OUTBOUND
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_work_done_progress() {
    let (port, mut rx) = ChannelPort::new();
    let session = SessionBuilder::new(App::default()).build(port.clone());

    let creating = {
        let session = session.clone();
        tokio::spawn(async move { session.create_work_done_progress(ProgressToken::from("w1")).await })
    };

    let id = match rx.recv().await.unwrap() {
        JsonRpcMessage::Request(req) => {
            assert_eq!(req.method, "window/workDoneProgress/create");
            assert_eq!(req.params, Some(json!({"token": "w1"})));
            req.id
        }
        other => panic!("expected request, got {other:?}"),
    };
    port.complete(JsonRpcMessage::Response(JsonRpcResponse::new(id, Value::Null)));

    let reporter = creating.await.unwrap().unwrap();
    reporter.begin("Indexing", true).unwrap();
    reporter.end(Some("done".to_string())).unwrap();

    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 2);
    match &sent[1] {
        JsonRpcMessage::Notification(n) => assert_eq!(
            n.params,
            Some(json!({"token": "w1", "value": {"kind": "end", "message": "done"}}))
        ),
        other => panic!("expected notification, got {other:?}"),
    }
}

#[tokio::test]
async fn test_session_notify_after_exit_fails() {
    let (session, _rx) = ready_session().await;
    notify(&session, "exit", json!(null)).await;
    let err = session
        .notify("window/logMessage", &json!({"type": 3, "message": "late"}))
        .unwrap_err();
    assert!(matches!(err, LspError::ChannelClosed));
}
