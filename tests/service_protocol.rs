use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use scriptfn::provider::FunctionProvider;
use scriptfn::service::{Service, payload_from_json, payload_to_json};
use scriptfn::wire::{DynamicValue, Type, Value};
use serde_json::{Value as Json, json};
use std::io::Cursor;
use std::sync::Arc;

fn run_session(requests: Vec<Json>) -> Vec<Json> {
    let service = Service::new(Arc::new(FunctionProvider::new()));

    let input = requests
        .into_iter()
        .map(|req| serde_json::to_string(&req).unwrap())
        .collect::<Vec<_>>()
        .join("\n");

    let mut output = Vec::<u8>::new();
    service
        .run(Cursor::new(format!("{input}\n")), &mut output)
        .unwrap();

    output
        .split(|b| *b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_slice::<Json>(line).unwrap())
        .collect()
}

fn number_arg(n: f64) -> Json {
    payload_to_json(&DynamicValue::new(&Type::Dynamic, &Value::Number(n)).unwrap())
}

fn result_value(response: &Json) -> Value {
    let payload = payload_from_json(&response["result"]["result"]).unwrap();
    payload.unmarshal(&Type::Dynamic).unwrap()
}

#[test]
fn service_handles_a_full_session() {
    let script = concat!(
        "fn Add(a, b) { a + b }\n",
        "fn Shout(s) { s.to_upper() }\n",
        "fn Boom() { throw \"nope\"; }",
    );

    let lines = run_session(vec![
        json!({"id": 1, "command": "get_metadata"}),
        json!({"id": 2, "command": "get_provider_schema", "params": {}}),
        json!({"id": 3, "command": "configure_provider", "params": {
            "config": {"json": {"js": script}}
        }}),
        json!({"id": 4, "command": "get_functions", "params": {}}),
        json!({"id": 5, "command": "call_function", "params": {
            "name": "add",
            "arguments": [number_arg(2.0), number_arg(3.0)]
        }}),
        json!({"id": 6, "command": "call_function", "params": {
            "name": "shout",
            "arguments": [{"json": "{\"type\": \"string\", \"value\": \"hi\"}"}]
        }}),
        json!({"id": 7, "command": "call_function", "params": {"name": "boom"}}),
        json!({"id": 8, "command": "call_function", "params": {
            "name": "missing",
            "arguments": []
        }}),
        json!({"id": 9, "command": "get_metadata"}),
        json!({"id": 10, "command": "stop_provider"}),
    ]);

    assert_eq!(lines.len(), 10);

    // Before configuration nothing is exposed.
    assert_eq!(lines[0]["id"], 1);
    assert_eq!(lines[0]["result"]["get_provider_schema_optional"], true);
    assert_eq!(lines[0]["result"]["functions"], json!([]));
    assert!(lines[0]["result"].get("script_fingerprint").is_none());

    let attributes = lines[1]["result"]["provider"]["attributes"]
        .as_array()
        .unwrap();
    let names: Vec<_> = attributes.iter().map(|a| a["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["js", "strict"]);
    assert_eq!(attributes[0]["type"], "string");
    assert_eq!(attributes[0]["required"], true);

    assert_eq!(lines[2]["result"]["diagnostics"], json!([]));

    let functions = lines[3]["result"]["functions"].as_object().unwrap();
    assert_eq!(
        functions.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["add", "boom", "shout"]
    );
    assert_eq!(functions["add"]["return_type"], "dynamic");

    assert_eq!(result_value(&lines[4]), Value::Number(5.0));
    assert_eq!(result_value(&lines[5]), Value::from("HI"));

    let error = &lines[6]["result"]["error"];
    assert!(error["text"].as_str().unwrap().starts_with("Error calling boom(): "));
    assert!(error.get("function_argument").is_none());

    assert!(lines[7].get("result").is_none());
    assert_eq!(lines[7]["error"]["code"], "unknown_function");
    assert_eq!(lines[7]["error"]["message"], "unknown function missing");

    assert_eq!(lines[8]["result"]["functions"], json!(["add", "boom", "shout"]));
    assert!(lines[8]["result"]["script_fingerprint"].is_string());

    assert_eq!(lines[9]["result"], json!({}));
}

#[test]
fn results_use_the_binary_form() {
    let lines = run_session(vec![
        json!({"id": "c", "command": "configure_provider", "params": {
            "config": {"json": "{\"js\": \"fn Two() { 2 }\", \"strict\": false}"}
        }}),
        json!({"id": "r", "command": "call_function", "params": {"name": "two"}}),
    ]);

    assert_eq!(lines[0]["result"]["diagnostics"], json!([]));
    let encoded = lines[1]["result"]["result"]["msgpack"].as_str().unwrap();
    let bytes = BASE64.decode(encoded).unwrap();
    let payload = DynamicValue::from_msgpack(bytes);
    assert_eq!(payload.unmarshal(&Type::Dynamic).unwrap(), Value::Number(2.0));
}

#[test]
fn configure_failures_are_reported_as_diagnostics() {
    let lines = run_session(vec![
        json!({"id": 1, "command": "configure_provider", "params": {
            "config": {"json": {"js": "fn Add(a, b) {"}}
        }}),
        json!({"id": 2, "command": "configure_provider", "params": {
            "config": {"json": {"strict": true}}
        }}),
        json!({"id": 3, "command": "get_functions"}),
    ]);

    let diagnostics = lines[0]["result"]["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0]["severity"], "error");
    assert_eq!(diagnostics[0]["summary"], "Failed to compile script");

    let diagnostics = lines[1]["result"]["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics[0]["summary"], "Invalid configure payload");
    assert_eq!(
        diagnostics[0]["detail"],
        "Missing required configuration value 'js'"
    );

    assert_eq!(lines[2]["result"]["functions"], json!({}));
}

#[test]
fn validate_returns_the_payload_unchanged() {
    let lines = run_session(vec![json!({"id": 1, "command": "validate_provider_config", "params": {
        "config": {"json": "{\"js\": \"\"}"}
    }})]);

    assert_eq!(
        lines[0]["result"]["prepared_config"],
        json!({"json": "{\"js\": \"\"}"})
    );
}

#[test]
fn malformed_requests_get_error_envelopes() {
    let service = Service::new(Arc::new(FunctionProvider::new()));
    let input = concat!(
        "not json\n",
        "\n",
        "{\"id\": 1, \"command\": \"noop\"}\n",
        "{\"id\": 2, \"command\": \"call_function\", \"params\": {}}\n",
        r#"{"id": 3, "command": "call_function", "params": {"name": "x", "arguments": [{}]}}"#,
        "\n",
        r#"{"id": 4, "command": "configure_provider", "params": {"config": {"msgpack": 5}}}"#,
        "\n",
    );

    let mut output = Vec::<u8>::new();
    service.run(Cursor::new(input), &mut output).unwrap();
    let lines: Vec<Json> = output
        .split(|b| *b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_slice(line).unwrap())
        .collect();

    // The blank line is skipped.
    assert_eq!(lines.len(), 5);

    assert_eq!(lines[0]["id"], Json::Null);
    assert_eq!(lines[0]["error"]["code"], "parse_error");

    assert_eq!(lines[1]["error"]["code"], "unsupported_command");
    assert_eq!(lines[1]["error"]["message"], "Command 'noop' is not supported");

    assert_eq!(lines[2]["error"]["code"], "invalid_params");
    assert_eq!(
        lines[2]["error"]["message"],
        "missing or invalid parameter: name"
    );

    assert_eq!(lines[3]["error"]["code"], "invalid_params");
    assert!(
        lines[3]["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("argument #0: ")
    );

    assert_eq!(lines[4]["error"]["code"], "invalid_params");
    assert!(
        lines[4]["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("config: ")
    );
}
