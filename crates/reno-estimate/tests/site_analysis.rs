use reno_estimate::analysis::{AnalysisError, GeminiAnalyzer, SiteAnalyzer};
use reno_estimate::estimate::Category;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-1.5-flash";
const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

async fn serve_photo(server: &MockServer) -> String {
    Mock::given(method("GET"))
        .and(path("/photos/site.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]),
        )
        .mount(server)
        .await;
    format!("{}/photos/site.png", server.uri())
}

fn candidate_text(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ] } }
        ]
    })
}

#[tokio::test]
async fn fenced_model_output_is_parsed() {
    let server = MockServer::start().await;
    let image_url = serve_photo(&server).await;
    let fenced = "```json\n{\"needs_demolition\": true, \"floor_condition\": \"들뜬 장판\", \
                  \"wall_condition\": \"곰팡이\", \"recommendations\": [\"바닥\", \"벽\", \"지붕\"], \
                  \"estimated_pyung\": 18.5}\n```";
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "vision-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_text(fenced)))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = GeminiAnalyzer::new(Some("vision-key".to_string()), server.uri(), MODEL);
    let analysis = analyzer.analyze(&image_url).await.expect("analysis parses");

    assert!(analysis.needs_demolition);
    assert_eq!(analysis.estimated_pyung, Some(18.5));
    assert_eq!(analysis.expert_advice, None);

    let categories: Vec<_> = analysis.recommended_categories().categories().collect();
    assert_eq!(categories, vec![Category::Flooring, Category::Wall]);
    assert!(analysis.implies(Category::Demolition));
}

#[tokio::test]
async fn upstream_error_message_is_surfaced() {
    let server = MockServer::start().await;
    let image_url = serve_photo(&server).await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource has been exhausted" }
        })))
        .mount(&server)
        .await;

    let analyzer = GeminiAnalyzer::new(Some("vision-key".to_string()), server.uri(), MODEL);

    match analyzer.analyze(&image_url).await {
        Err(AnalysisError::Upstream(message)) => {
            assert_eq!(message, "Resource has been exhausted")
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn unparsable_model_text_is_malformed() {
    let server = MockServer::start().await;
    let image_url = serve_photo(&server).await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(candidate_text("I cannot see a room here.")),
        )
        .mount(&server)
        .await;

    let analyzer = GeminiAnalyzer::new(Some("vision-key".to_string()), server.uri(), MODEL);

    assert!(matches!(
        analyzer.analyze(&image_url).await,
        Err(AnalysisError::Malformed(_))
    ));
}

#[tokio::test]
async fn missing_key_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let analyzer = GeminiAnalyzer::new(None, server.uri(), MODEL);

    assert!(!analyzer.is_configured());
    assert!(matches!(
        analyzer
            .analyze(&format!("{}/photos/site.png", server.uri()))
            .await,
        Err(AnalysisError::MissingApiKey)
    ));
}

#[tokio::test]
async fn unreachable_image_is_reported_as_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let analyzer = GeminiAnalyzer::new(Some("vision-key".to_string()), server.uri(), MODEL);

    match analyzer
        .analyze(&format!("{}/photos/gone.png", server.uri()))
        .await
    {
        Err(AnalysisError::ImageFetch(message)) => assert!(message.contains("404")),
        other => panic!("expected image fetch error, got {other:?}"),
    }
}
