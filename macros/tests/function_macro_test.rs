use opperai::{ApiKey, ClientConfig, Opper, blocking, function, schema};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

#[schema]
#[derive(Debug, PartialEq)]
struct Translation {
    /// The translated text
    text: String,
    language: String,
}

/// Translate the input text to German.
#[function(model = "openai/gpt-4o")]
async fn translate(text: String) -> Translation;

/// Add two numbers.
#[function(name = "sdk/add")]
fn add(a: i64, b: i64) -> i64;

/// Say hello.
#[function]
pub async fn hello() -> String;

#[test]
fn test_schema_derives_strict_schema() {
    let schema = opperai::functions::json_schema_for::<Translation>();
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["additionalProperties"], false);
    assert_eq!(
        schema["properties"]["text"]["description"],
        "The translated text"
    );

    let value: Translation =
        serde_json::from_value(json!({ "text": "Hallo", "language": "de" })).unwrap();
    assert_eq!(value.language, "de");
    assert!(
        serde_json::from_value::<Translation>(json!({ "text": "x", "language": "y", "extra": 1 }))
            .is_ok(),
        "only the schema is strict, decoding still tolerates extra fields"
    );
}

#[test]
fn test_definition_uses_doc_comment_and_options() {
    let spec = translate_definition().to_spec();
    assert_eq!(spec.path, "translate");
    assert_eq!(spec.instructions, "Translate the input text to German.");
    assert_eq!(spec.model.as_deref(), Some("openai/gpt-4o"));
    assert_eq!(spec.input_schema.unwrap()["type"], "string");
    assert!(spec.output_schema.unwrap()["properties"]["language"].is_object());
}

#[test]
fn test_multiple_parameters_become_an_args_struct() {
    let spec = add_definition().to_spec();
    assert_eq!(spec.path, "sdk/add");
    assert!(spec.model.is_none());

    let input = spec.input_schema.unwrap();
    assert_eq!(input["properties"]["a"]["type"], "integer");
    assert_eq!(input["properties"]["b"]["type"], "integer");

    let args = serde_json::to_value(AddArgs { a: 1, b: 2 }).unwrap();
    assert_eq!(args, json!({ "a": 1, "b": 2 }));
}

#[test]
fn test_no_parameters_use_unit_input() {
    let spec = hello_definition().to_spec();
    assert_eq!(spec.path, "hello");
    assert_eq!(spec.instructions, "Say hello.");
}

async fn mount_new_function(server: &MockServer, name: &str, id: u64, output: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/functions/by_path/{name}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found" })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/functions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/chat/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "json_payload": output,
            "span_id": "span-1",
            "cached": false
        })))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(ApiKey::Custom("test-key".into()))
        .unwrap()
        .with_base_url(server.uri())
}

#[tokio::test]
async fn test_async_function_calls_the_remote_function() {
    let server = MockServer::start().await;
    mount_new_function(
        &server,
        "translate",
        3,
        json!({ "text": "Guten Morgen", "language": "de" }),
    )
    .await;

    let client = Opper::with_config(config_for(&server)).unwrap();
    let translation = translate(&client, "Good morning".to_string())
        .await
        .expect("translation");
    assert_eq!(
        translation,
        Translation {
            text: "Guten Morgen".into(),
            language: "de".into()
        }
    );

    let requests = server.received_requests().await.unwrap();
    let call = requests.last().unwrap();
    let body: Value = serde_json::from_slice(&call.body).unwrap();
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "Good morning");
}

#[test]
fn test_sync_function_uses_the_blocking_client() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        mount_new_function(&server, "sdk/add", 4, json!(3)).await;
        server
    });

    let client = blocking::Opper::with_config(config_for(&server)).unwrap();
    assert_eq!(add(&client, 1, 2).unwrap(), 3);

    let requests = runtime.block_on(server.received_requests()).unwrap();
    let call = requests.last().unwrap();
    let body: Value = serde_json::from_slice(&call.body).unwrap();
    let content: Value =
        serde_json::from_str(body["messages"][0]["content"].as_str().unwrap()).unwrap();
    assert_eq!(content, json!({ "a": 1, "b": 2 }));
}
