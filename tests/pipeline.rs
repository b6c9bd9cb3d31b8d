use std::sync::{Arc, Mutex};

use nimbus::http::{
    BinaryError, CallOptions, ClientConfig, ClientError, HttpClient, Interceptor, RequestDescriptor, ResponseEnvelope,
};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let config = ClientConfig::new(&format!("{}/v1/", server.uri()))
        .unwrap()
        .with_header("x-client", "nimbus")
        .unwrap();
    HttpClient::new(config).unwrap()
}

#[tokio::test]
async fn comma_in_query_reaches_server_unescaped() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let _: Value = client
        .json_do("current.json", CallOptions::new().param("q", "1,2"))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), Some("q=1,2"));
}

#[tokio::test]
async fn default_and_call_headers_are_both_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/v1/ping"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client
        .do_request("ping", CallOptions::new().header("x-client", "cli").header("x-trace", "7"))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let values: Vec<_> = requests[0]
        .headers
        .get_all("x-client")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(values, vec!["nimbus", "cli"]);
    assert_eq!(requests[0].headers.get("x-trace").unwrap(), "7");
}

#[tokio::test]
async fn json_classification_over_the_wire() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/v1/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;
    Mock::given(path("/v1/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>hello</p>", "text/html"))
        .mount(&mock_server)
        .await;
    Mock::given(path("/v1/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let empty: Value = client.json_do("empty", CallOptions::new()).await.unwrap();
    assert_eq!(empty, json!({}));

    let err: ClientError = client.json_do::<Value>("page", CallOptions::new()).await.unwrap_err();
    assert_eq!(err.status, 200);
    assert_eq!(err.data, json!({}));

    let err: ClientError = client.json_do::<Value>("missing", CallOptions::new()).await.unwrap_err();
    assert_eq!(err.status, 404);
    assert_eq!(err.data, json!({"error": "not found"}));
}

#[tokio::test]
async fn buffer_path_hands_back_unsuccessful_response() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/v1/icon.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"))
        .mount(&mock_server)
        .await;
    Mock::given(path("/v1/gone.png"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let blob = client.blob_do("icon.png", CallOptions::new()).await.unwrap();
    assert_eq!(blob.content_type(), Some("image/png"));
    assert_eq!(blob.len(), 4);

    match client.buffer_do("gone.png", CallOptions::new()).await {
        Err(BinaryError::Response(response)) => assert_eq!(response.status().as_u16(), 410),
        other => panic!("expected unsuccessful response, got {:?}", other.map(|b| b.len())),
    }
}

#[tokio::test]
async fn interceptors_run_in_their_documented_order() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let seen = Arc::new(Mutex::new(Vec::new()));

    for name in ["req-a", "req-b"] {
        let seen = seen.clone();
        client
            .interceptors()
            .request
            .register(Interceptor::new().on_fulfilled(move |request: RequestDescriptor| {
                seen.lock().unwrap().push(name);
                async move { Ok(request) }
            }));
    }
    for name in ["res-a", "res-b"] {
        let seen = seen.clone();
        client
            .interceptors()
            .response
            .register(Interceptor::new().on_fulfilled(move |response: ResponseEnvelope| {
                seen.lock().unwrap().push(name);
                async move { Ok(response) }
            }));
    }

    client.do_request("current.json", CallOptions::new()).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["req-b", "req-a", "res-a", "res-b"]);
}

#[tokio::test]
async fn failing_request_interceptor_still_dispatches() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client
        .interceptors()
        .request
        .register(Interceptor::new().on_fulfilled(|mut request: RequestDescriptor| async move {
            request.headers.insert("x-stage", "never-sent".parse().unwrap());
            Ok(request)
        }));
    client
        .interceptors()
        .request
        .register(Interceptor::new().on_fulfilled(|_: RequestDescriptor| async move {
            Err(nimbus::http::HttpError::interceptor(anyhow::anyhow!("token refresh failed")))
        }));

    let response = client.do_request("current.json", CallOptions::new()).await.unwrap();
    assert!(response.ok());

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("x-stage").is_none());
}
