use renderflow::jobs::IntegrationConfig;
use renderflow::render::{
    ApiShape, HeyGenClient, PollStatus, RenderError, RenderProvider, RenderRequest, RenderTicket,
};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn integration(server: &MockServer) -> IntegrationConfig {
    IntegrationConfig {
        api_key: "secret-key".to_string(),
        base_url: server.uri(),
        avatar_id: Some("anna".to_string()),
        voice_id: "de-DE-Neural2-D".to_string(),
    }
}

fn request() -> RenderRequest {
    RenderRequest {
        avatar_id: Some("anna".to_string()),
        voice_id: "de-DE-Neural2-D".to_string(),
        text: "Hello there".to_string(),
        captions_on: true,
        overlay: None,
    }
}

fn client(shape: ApiShape) -> HeyGenClient {
    HeyGenClient::new(shape, None).expect("client builds")
}

#[tokio::test]
async fn v1_create_falls_back_after_404() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/video.generate"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/videos/generate"))
        .and(header("X-Api-Key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "video_id": "v-42" } })))
        .expect(1)
        .mount(&server)
        .await;

    let ticket = client(ApiShape::V1)
        .create(&integration(&server), &request())
        .await
        .unwrap();

    assert_eq!(ticket.id, "v-42");
}

#[tokio::test]
async fn create_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/video.generate"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = client(ApiShape::V1)
        .create(&integration(&server), &request())
        .await
        .unwrap_err();

    match err {
        RenderError::CreateFailed { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_without_any_job_id_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/video.generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .mount(&server)
        .await;

    let err = client(ApiShape::V1)
        .create(&integration(&server), &request())
        .await
        .unwrap_err();

    assert!(matches!(err, RenderError::MissingJobId));
}

#[tokio::test]
async fn v2_posts_video_inputs_to_versioned_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/video/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "t-7" })))
        .mount(&server)
        .await;

    let ticket = client(ApiShape::V2)
        .create(&integration(&server), &request())
        .await
        .unwrap();
    assert_eq!(ticket.id, "t-7");

    let received = server.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 1);
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["video_inputs"][0]["voice"]["input_text"], json!("Hello there"));
    assert_eq!(body["video_inputs"][0]["character"]["avatar_id"], json!("anna"));
}

#[tokio::test]
async fn status_check_sends_id_and_key_and_prefers_captioned_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/video.status"))
        .and(query_param("video_id", "v-42"))
        .and(header("X-Api-Key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "status": "completed",
                "video_url": "https://cdn/plain.mp4",
                "video_url_caption": "https://cdn/captioned.mp4"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = client(ApiShape::V1)
        .status(&integration(&server), &RenderTicket { id: "v-42".into() })
        .await
        .unwrap();

    assert_eq!(status, PollStatus::Completed("https://cdn/captioned.mp4".into()));
}

#[tokio::test]
async fn v2_status_uses_its_own_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/video_status.get"))
        .and(query_param("video_id", "t-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "status": "failed", "error": { "message": "voice unavailable" } }
        })))
        .mount(&server)
        .await;

    let status = client(ApiShape::V2)
        .status(&integration(&server), &RenderTicket { id: "t-7".into() })
        .await
        .unwrap();

    assert_eq!(status, PollStatus::Failed("voice unavailable".into()));
}

#[tokio::test]
async fn unreadable_status_body_counts_as_pending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/video.status"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let status = client(ApiShape::V1)
        .status(&integration(&server), &RenderTicket { id: "v-1".into() })
        .await
        .unwrap();

    assert_eq!(status, PollStatus::Pending);
}
