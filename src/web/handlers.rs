use actix_web::{http::header, web, HttpRequest, HttpResponse};
use log::{debug, error, info};
use uuid::Uuid;

use crate::error::RelayError;
use crate::web::models::{AiRequest, AiResponse, ConfigResponse, HealthResponse};
use crate::AppState;

// Diagnostic endpoint echoing the caller's origin
pub async fn config(req: HttpRequest) -> HttpResponse {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    HttpResponse::Ok().json(ConfigResponse {
        status: "ok",
        origin,
    })
}

// Health check endpoint
pub async fn health_check(data: web::Data<AppState>) -> HttpResponse {
    let backend = if data.backend.is_some() {
        "configured"
    } else {
        "fallback"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        backend,
        model: data.config.backend.model.clone(),
    })
}

// Prompt relay endpoint
pub async fn ai(
    data: web::Data<AppState>,
    req: web::Json<AiRequest>,
) -> Result<HttpResponse, RelayError> {
    let request_id = Uuid::new_v4();
    let format = data.config.response_format;

    let prompt = req.derive_prompt()?;
    info!(
        "AI request {}: prompt of {} characters",
        request_id,
        prompt.chars().count()
    );
    debug!("AI request {} prompt: {}", request_id, prompt);

    let Some(backend) = data.backend.as_ref() else {
        info!("AI request {}: backend not configured, using fallback response", request_id);
        return Ok(HttpResponse::Ok().json(AiResponse::new(data.config.fallback_text.clone(), format)));
    };

    let conversation = req.conversation()?;
    match backend.generate(conversation).await {
        Ok(text) => {
            info!(
                "AI request {}: {} characters returned",
                request_id,
                text.chars().count()
            );
            debug!("AI request {} response: {}", request_id, text);
            Ok(HttpResponse::Ok().json(AiResponse::new(text, format)))
        }
        Err(e) => {
            error!("AI request {} failed: {}", request_id, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ResponseFormat};
    use crate::model::GeminiClient;
    use crate::web::{origin, routes};
    use actix_web::{middleware::from_fn, test, App};
    use mockito::{Matcher, Server};
    use serde_json::{json, Value};

    const GEMINI_PATH: &str = "/models/gemini-1.5-flash:generateContent";

    fn test_config(base_url: Option<&str>) -> Config {
        let base_url = base_url.map(str::to_string);
        Config::from_lookup(move |key| match key {
            "API_KEY" => base_url.as_ref().map(|_| "test-key".to_string()),
            "GEMINI_API_BASE_URL" => base_url.clone(),
            _ => None,
        })
    }

    fn state_for(config: Config) -> web::Data<AppState> {
        let backend = GeminiClient::from_config(&config.backend).ok();
        web::Data::new(AppState { config, backend })
    }

    async fn call(state: web::Data<AppState>, req: test::TestRequest) -> (u16, Value) {
        let gate = web::Data::new(origin::OriginGate::new(state.config.allowed_origins.clone()));
        let app = test::init_service(
            App::new()
                .app_data(state)
                .app_data(gate.clone())
                .wrap(origin::cors(gate.get_ref().clone()))
                .wrap(from_fn(origin::enforce))
                .configure(routes::configure),
        )
        .await;
        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status().as_u16();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    fn post_ai(body: Value) -> test::TestRequest {
        test::TestRequest::post().uri("/api/ai").set_json(body)
    }

    #[actix_web::test]
    async fn relays_prompt_and_returns_text() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", GEMINI_PATH)
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::Json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }]
            })))
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Hi there"}]}}]}"#)
            .create_async()
            .await;

        let state = state_for(test_config(Some(&server.url())));
        let (status, body) = call(state, post_ai(json!({ "prompt": "Hello" }))).await;

        mock.assert_async().await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({ "text": "Hi there" }));
    }

    #[actix_web::test]
    async fn relays_multibyte_prompt_unchanged() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", GEMINI_PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Grüße, 世界" }] }]
            })))
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"こんにちは"}]}}]}"#)
            .create_async()
            .await;

        let state = state_for(test_config(Some(&server.url())));
        let req = post_ai(json!({ "prompt": "Grüße, 世界" }))
            .insert_header((header::ORIGIN, "https://lilitools.com"));
        let (status, body) = call(state, req).await;

        mock.assert_async().await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({ "text": "こんにちは" }));
    }

    #[actix_web::test]
    async fn forwards_contents_and_answers_with_candidates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", GEMINI_PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Summarize this" }] }]
            })))
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"T"}],"role":"model"}}]}"#)
            .create_async()
            .await;

        let mut config = test_config(Some(&server.url()));
        config.response_format = ResponseFormat::Candidates;

        let (status, body) = call(
            state_for(config),
            post_ai(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Summarize this" }] }]
            })),
        )
        .await;

        mock.assert_async().await;
        assert_eq!(status, 200);
        assert_eq!(body["candidates"][0]["content"]["parts"][0]["text"], "T");
    }

    #[actix_web::test]
    async fn empty_body_is_rejected() {
        let state = state_for(test_config(None));
        let (status, body) = call(state, post_ai(json!({}))).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({ "error": "Prompt is required" }));
    }

    #[actix_web::test]
    async fn malformed_json_is_rejected_with_error_field() {
        let state = state_for(test_config(None));
        let req = test::TestRequest::post()
            .uri("/api/ai")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json");
        let (status, body) = call(state, req).await;
        assert_eq!(status, 400);
        assert!(body["error"].is_string());

        let state = state_for(test_config(None));
        let (status, body) = call(state, post_ai(json!({ "prompt": 42 }))).await;
        assert_eq!(status, 400);
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn unconfigured_backend_returns_fallback_text() {
        let state = state_for(test_config(None));
        assert!(state.backend.is_none());

        let (status, body) = call(state, post_ai(json!({ "prompt": "Hello" }))).await;
        assert_eq!(status, 200);
        let text = body["text"].as_str().unwrap();
        assert!(!text.is_empty());
        assert!(text.contains("configure your Gemini API key"));
    }

    #[actix_web::test]
    async fn malformed_backend_payload_is_bad_gateway() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", GEMINI_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"unexpected":true}"#)
            .create_async()
            .await;

        let state = state_for(test_config(Some(&server.url())));
        let (status, body) = call(state, post_ai(json!({ "prompt": "Hello" }))).await;

        assert_eq!(status, 502);
        assert_eq!(body["error"], "No text from AI");
        assert_eq!(body["details"], json!({ "unexpected": true }));
    }

    #[actix_web::test]
    async fn unreachable_backend_is_internal_error() {
        // Nothing listens on port 9 of localhost
        let state = state_for(test_config(Some("http://127.0.0.1:9")));
        let (status, body) = call(state, post_ai(json!({ "prompt": "Hello" }))).await;
        assert_eq!(status, 500);
        assert_eq!(body["error"], "Internal Server Error");
        assert!(body["details"].is_string());
    }

    #[actix_web::test]
    async fn foreign_origin_never_reaches_handler() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", GEMINI_PATH)
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let state = state_for(test_config(Some(&server.url())));
        let req = post_ai(json!({ "prompt": "Hello" }))
            .insert_header((header::ORIGIN, "https://evil.example"));
        let (status, body) = call(state, req).await;

        mock.assert_async().await;
        assert_eq!(status, 403);
        assert!(body["error"].as_str().unwrap().contains("https://evil.example"));
    }

    #[actix_web::test]
    async fn config_echoes_origin() {
        let state = state_for(test_config(None));
        let req = test::TestRequest::get()
            .uri("/api/config")
            .insert_header((header::ORIGIN, "https://lilitools.com"));
        let (status, body) = call(state, req).await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({ "status": "ok", "origin": "https://lilitools.com" }));

        let state = state_for(test_config(None));
        let (_, body) = call(state, test::TestRequest::get().uri("/api/config")).await;
        assert_eq!(body, json!({ "status": "ok", "origin": null }));
    }

    #[actix_web::test]
    async fn health_reports_backend_mode() {
        let state = state_for(test_config(None));
        let (status, body) = call(state, test::TestRequest::get().uri("/health")).await;
        assert_eq!(status, 200);
        assert_eq!(body["backend"], "fallback");
        assert_eq!(body["model"], "gemini-1.5-flash");
    }
}
