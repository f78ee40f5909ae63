use opperai::{
    ApiKey, CallOptions, ClientConfig, Delta, FunctionRef, FunctionSpec, OpperError, blocking,
};
use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// The mock server lives on its own runtime; the blocking client brings another.
fn start_server(runtime: &Runtime, mocks: Vec<Mock>) -> MockServer {
    runtime.block_on(async {
        let server = MockServer::start().await;
        for mock in mocks {
            mock.mount(&server).await;
        }
        server
    })
}

fn client_for(server: &MockServer) -> blocking::Opper {
    let config = ClientConfig::new(ApiKey::Custom("test-key".into()))
        .unwrap()
        .with_base_url(server.uri());
    blocking::Opper::with_config(config).unwrap()
}

fn function_mock() -> Mock {
    Mock::given(method("GET"))
        .and(path("/api/v1/functions/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "path": "sdk/echo"
        })))
}

#[test]
fn blocking_crud_and_call() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(
        &runtime,
        vec![
            Mock::given(method("POST"))
                .and(path("/api/v1/functions"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 }))),
            function_mock(),
            Mock::given(method("POST"))
                .and(path("/v1/chat/sdk/echo"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "message": "echo: hi",
                    "cached": true
                }))),
            Mock::given(method("DELETE"))
                .and(path("/api/v1/functions/1"))
                .respond_with(ResponseTemplate::new(204)),
        ],
    );

    let functions = client_for(&server).functions();
    let created = functions
        .create(FunctionSpec::new("sdk/echo", "echo the input"))
        .unwrap();
    assert_eq!(created.id(), 1);

    let handle = functions.get(FunctionRef::ById(1)).unwrap();
    let (text, meta): (String, _) = handle.call("hi", CallOptions::default()).unwrap();
    assert_eq!(text, "echo: hi");
    assert!(meta.cached);

    assert!(handle.delete().unwrap());
}

#[test]
fn blocking_errors_propagate() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(
        &runtime,
        vec![
            Mock::given(method("GET"))
                .and(path("/api/v1/functions/2"))
                .respond_with(
                    ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found" })),
                ),
        ],
    );

    let err = client_for(&server)
        .functions()
        .get(FunctionRef::ById(2))
        .unwrap_err();
    assert!(matches!(err, OpperError::NotFound { .. }));
}

#[test]
fn blocking_stream_iterates_once() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(
        &runtime,
        vec![
            function_mock(),
            Mock::given(method("POST"))
                .and(path("/v1/chat/sdk/echo"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("content-type", "text/event-stream")
                        .set_body_string(concat!(
                            "data: {\"delta\": \"e\"}\n\n",
                            "data: {\"delta\": \"cho\"}\n\n",
                            "data: [DONE]\n\n",
                        )),
                ),
        ],
    );

    let handle = client_for(&server)
        .functions()
        .get(FunctionRef::ById(1))
        .unwrap();
    let mut response = handle.call_stream("echo", CallOptions::default()).unwrap();

    let deltas: Vec<Delta> = response.deltas().map(Result::unwrap).collect();
    assert_eq!(deltas, vec![Delta::Text("e".into()), Delta::Text("cho".into())]);
    assert_eq!(response.deltas().count(), 0);
}
