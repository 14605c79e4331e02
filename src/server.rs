use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Redirect,
    },
    routing::{get, post},
    Form, Json, Router,
};
use serde::Serialize;
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tera::Tera;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower_http::trace::TraceLayer;

use spending_score::config::AppConfig;
use spending_score::{predict, CustomerProfile, Prediction, SpendingScorer};

use crate::api::{
    ApiPredictRequest, ApiPredictResponse, ApiSessionResponse, PredictForm, SessionUpdate,
};
use crate::dashboard::render_page;
use crate::locale::LocaleCatalog;
use crate::session::DashboardSession;

type Channels = Arc<Mutex<HashMap<String, broadcast::Sender<StreamEvent>>>>;

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    scorer: SpendingScorer,
    catalog: Arc<LocaleCatalog>,
    templates: Arc<Tera>,
    session: Arc<Mutex<DashboardSession>>,
    channels: Channels,
}

impl AppState {
    pub fn new(config: AppConfig, catalog: LocaleCatalog, templates: Tera) -> Self {
        Self {
            scorer: config.scorer(),
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            templates: Arc::new(templates),
            session: Arc::new(Mutex::new(DashboardSession::default())),
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[derive(Clone, Serialize)]
struct StreamEvent {
    event: String,
    message: String,
    timestamp_ms: u128,
}

#[derive(serde::Deserialize)]
struct StreamQuery {
    request_id: String,
}

static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

const CHANNEL_TTL: Duration = Duration::from_secs(10);

pub async fn serve(config: AppConfig, catalog: LocaleCatalog, templates: Tera) -> Result<(), String> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    let app = router(AppState::new(config, catalog, templates));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind server: {}", err))?;
    tracing::info!(%addr, "dashboard listening");

    axum::serve(listener, app)
        .await
        .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/predict", post(predict_form_handler))
        .route("/session", post(session_form_handler))
        .route("/api/health", get(health))
        .route("/api/session", get(session_handler).put(update_session_handler))
        .route("/api/predict", post(predict_handler))
        .route("/api/predict/stream", get(stream_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn page_handler(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, String)> {
    let session = state.session.lock().await;
    let html = render_page(&state.templates, &session, state.catalog.get(session.locale))
        .map_err(|err| {
            tracing::error!(error = ?err, "dashboard render failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("template error: {}", err),
            )
        })?;
    Ok(Html(html))
}

async fn predict_form_handler(
    State(state): State<AppState>,
    Form(form): Form<PredictForm>,
) -> Redirect {
    let profile = form.to_profile();
    analysis_pause(&state).await;
    let prediction = run_prediction(&state, &profile);
    state.session.lock().await.record(prediction);
    Redirect::to("/")
}

async fn session_form_handler(
    State(state): State<AppState>,
    Form(update): Form<SessionUpdate>,
) -> Result<Redirect, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    update
        .apply(&mut session)
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?;
    Ok(Redirect::to("/"))
}

async fn session_handler(State(state): State<AppState>) -> Json<ApiSessionResponse> {
    let session = state.session.lock().await;
    Json(ApiSessionResponse::from_session(&session))
}

async fn update_session_handler(
    State(state): State<AppState>,
    Json(update): Json<SessionUpdate>,
) -> Result<Json<ApiSessionResponse>, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    update
        .apply(&mut session)
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?;
    Ok(Json(ApiSessionResponse::from_session(&session)))
}

async fn predict_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiPredictRequest>,
) -> Result<Json<ApiPredictResponse>, (StatusCode, String)> {
    let request_id = request
        .request_id
        .clone()
        .unwrap_or_else(generate_request_id);
    let profile = request
        .to_profile()
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
    let requested_locale = request
        .locale()
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?;

    let locale = match requested_locale {
        Some(locale) => locale,
        None => state.session.lock().await.locale,
    };
    let t = state.catalog.get(locale);

    let sender = get_or_create_channel(&state, &request_id).await;
    send_event(&sender, "analyzing", t.text("analyzing"));
    analysis_pause(&state).await;

    let prediction = run_prediction(&state, &profile);
    send_event(&sender, "scored", &prediction.score.to_string());

    let response =
        ApiPredictResponse::from_prediction(&prediction, locale, t, request_id.clone());
    state.session.lock().await.record(prediction);

    send_event(&sender, "done", "Prediction complete");
    schedule_cleanup(state.channels.clone(), request_id);

    Ok(Json(response))
}

async fn stream_handler(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>, StatusCode>
{
    let sender = get_or_create_channel(&state, &query.request_id).await;
    let receiver = sender.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|event| match event {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(data)))
        }
        Err(_) => None,
    });

    send_event(&sender, "connected", "Streaming prediction status");
    schedule_cleanup(state.channels.clone(), query.request_id);
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(8))))
}

fn run_prediction(state: &AppState, profile: &CustomerProfile) -> Prediction {
    let mut noise = state.config.noise.build_noise();
    predict(profile, &state.scorer, &mut noise)
}

async fn analysis_pause(state: &AppState) {
    let delay = state.config.server.analysis_delay_ms;
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

async fn get_or_create_channel(
    state: &AppState,
    request_id: &str,
) -> broadcast::Sender<StreamEvent> {
    let mut guard = state.channels.lock().await;
    if let Some(sender) = guard.get(request_id) {
        return sender.clone();
    }
    let (sender, _) = broadcast::channel(32);
    guard.insert(request_id.to_string(), sender.clone());
    sender
}

fn send_event(sender: &broadcast::Sender<StreamEvent>, event: &str, message: &str) {
    let _ = sender.send(StreamEvent {
        event: event.to_string(),
        message: message.to_string(),
        timestamp_ms: now_ms(),
    });
}

/// Drops the request's channel once no late subscriber can still need it.
fn schedule_cleanup(channels: Channels, request_id: String) {
    tokio::spawn(async move {
        tokio::time::sleep(CHANNEL_TTL).await;
        let mut guard = channels.lock().await;
        guard.remove(&request_id);
    });
}

fn generate_request_id() -> String {
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("req-{}-{}", now_ms(), counter)
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::dashboard::embedded_templates;
    use crate::locale::Locale;

    fn test_state() -> AppState {
        let mut config = AppConfig::default();
        config.server.analysis_delay_ms = 0;
        config.noise.std_dev = 0.0;
        AppState::new(
            config,
            LocaleCatalog::load().unwrap(),
            embedded_templates().unwrap(),
        )
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn predict_rejects_out_of_domain_age() {
        let state = test_state();
        let response = router(state.clone())
            .oneshot(json_request("POST", "/api/predict", json!({ "age": 17 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!state.session.lock().await.has_prediction());
        assert!(state.channels.lock().await.is_empty());
    }

    #[tokio::test]
    async fn predict_saturated_profile_is_high_value() {
        let state = test_state();
        let body = json!({
            "request_id": "req-test",
            "age": 70,
            "annual_income": 200000,
            "membership_years": 20,
            "purchase_frequency": 100
        });
        let response = router(state.clone())
            .oneshot(json_request("POST", "/api/predict", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["category"], "high");
        assert_eq!(json["request_id"], "req-test");
        assert_eq!(json["score"], json!(100.0));
        assert_eq!(json["actions"].as_array().map(Vec::len), Some(5));
        assert!(state.session.lock().await.has_prediction());
    }

    #[tokio::test]
    async fn session_update_changes_locale() {
        let state = test_state();
        let response = router(state.clone())
            .oneshot(json_request("PUT", "/api/session", json!({ "locale": "ar" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["locale"], "ar");
        assert_eq!(json["rtl"], true);

        let response = router(state.clone())
            .oneshot(empty_request("/api/session"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["locale"], "ar");
        assert_eq!(state.session.lock().await.locale, Locale::Ar);
    }

    #[tokio::test]
    async fn session_update_rejects_unknown_theme() {
        let state = test_state();
        let response = router(state.clone())
            .oneshot(json_request(
                "PUT",
                "/api/session",
                json!({ "locale": "ar", "theme": "sepia" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.session.lock().await.locale, Locale::En);
    }

    #[tokio::test]
    async fn form_post_clamps_and_redirects() {
        let state = test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "age=90&annual_income=600000&membership_years=3&purchase_frequency=-2",
            ))
            .unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let session = state.session.lock().await;
        assert_eq!(session.profile.age(), 70);
        assert_eq!(session.profile.annual_income(), 500_000);
        assert_eq!(session.profile.purchase_frequency(), 0);
    }

    #[tokio::test]
    async fn dashboard_page_renders() {
        let response = router(test_state())
            .oneshot(empty_request("/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("How It Works"));
    }

    #[tokio::test(start_paused = true)]
    async fn unused_stream_channel_is_cleaned_up() {
        let state = test_state();
        let response = router(state.clone())
            .oneshot(empty_request("/api/predict/stream?request_id=idle"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.channels.lock().await.contains_key("idle"));
        drop(response);

        tokio::time::sleep(CHANNEL_TTL + Duration::from_secs(1)).await;
        assert!(state.channels.lock().await.is_empty());
    }
}
