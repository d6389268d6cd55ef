#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use moodle_console::client::ApiClient;
use moodle_console::config::ConsoleConfig;
use moodle_console::guard::{Navigator, Route};
use moodle_console::session::SessionContext;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "tok-1";
pub const COURSE_ID: i64 = 12;
pub const USER_ID: i64 = 7;

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn reject(status: StatusCode, detail: Value) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": detail })))
}

/// In-process stand-in for the REST backend.
pub struct BackendState {
    valid_token: Mutex<String>,
    instances: Mutex<Vec<Value>>,
    mappings: Mutex<Vec<Value>>,
    next_id: AtomicI64,
    pub fail_logout: AtomicBool,
    pub fail_mappings: AtomicBool,
    pub fail_grades: AtomicBool,
    pub slow_contents_rejected: AtomicBool,
    pub empty_report: AtomicBool,
    pub requests: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl BackendState {
    fn seeded() -> Self {
        Self {
            valid_token: Mutex::new(TOKEN.to_string()),
            instances: Mutex::new(vec![
                instance_json(1, "Digital Health", "digitalhealth", "https://good.example.org", true),
                instance_json(2, "Archive", "archive", "https://old.example.org", false),
            ]),
            mappings: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(3),
            fail_logout: AtomicBool::new(false),
            fail_mappings: AtomicBool::new(false),
            fail_grades: AtomicBool::new(false),
            slow_contents_rejected: AtomicBool::new(false),
            empty_report: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    /// Every token issued so far stops working.
    pub fn revoke_tokens(&self) {
        *self.valid_token.lock().unwrap() = "revoked".to_string();
    }

    pub fn instances(&self) -> Vec<Value> {
        self.instances.lock().unwrap().clone()
    }

    pub fn mappings(&self) -> Vec<Value> {
        self.mappings.lock().unwrap().clone()
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some(value) if value == expected => Ok(()),
            _ => Err(reject(
                StatusCode::UNAUTHORIZED,
                json!("Could not validate credentials"),
            )),
        }
    }
}

fn instance_json(id: i64, name: &str, slug: &str, url: &str, active: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": slug,
        "moodle_url": url,
        "moodle_token": "abcdef123456",
        "contact_email": null,
        "notes": null,
        "is_active": active,
        "last_sync_at": null,
        "created_at": "2024-01-10T09:00:00",
        "updated_at": "2024-01-10T09:00:00"
    })
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(State(state): State<Arc<BackendState>>, Form(form): Form<LoginForm>) -> Reply {
    if form.username.is_empty() {
        return Err(reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!([{ "loc": ["body", "username"], "msg": "field required", "type": "missing" }]),
        ));
    }
    if form.username != EMAIL || form.password != PASSWORD {
        return Err(reject(
            StatusCode::UNAUTHORIZED,
            json!("Incorrect email or password"),
        ));
    }
    Ok(Json(json!({
        "access_token": state.valid_token.lock().unwrap().clone(),
        "token_type": "bearer"
    })))
}

async fn me(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Reply {
    state.authorize(&headers)?;
    Ok(Json(json!({
        "id": 1,
        "email": EMAIL,
        "full_name": "Console Admin",
        "is_active": true,
        "is_superuser": true,
        "created_at": "2024-01-01T00:00:00",
        "updated_at": null
    })))
}

async fn logout(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Reply {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    state.authorize(&headers)?;
    if state.fail_logout.load(Ordering::SeqCst) {
        return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, json!("boom")));
    }
    Ok(Json(json!({ "message": "Logged out" })))
}

#[derive(Deserialize)]
struct ListQuery {
    active_only: Option<bool>,
}

async fn list_instances(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Reply {
    state.authorize(&headers)?;
    let active_only = query.active_only.unwrap_or(false);
    let list: Vec<Value> = state
        .instances()
        .into_iter()
        .filter(|i| !active_only || i["is_active"] == json!(true))
        .collect();
    Ok(Json(Value::Array(list)))
}

async fn create_instance(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    state.authorize(&headers)?;
    let slug = body["slug"].as_str().unwrap_or_default().to_string();
    if state.instances().iter().any(|i| i["slug"] == slug.as_str()) {
        return Err(reject(StatusCode::BAD_REQUEST, json!("Slug already exists")));
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let mut created = instance_json(
        id,
        body["name"].as_str().unwrap_or_default(),
        &slug,
        body["moodle_url"].as_str().unwrap_or_default(),
        body["is_active"].as_bool().unwrap_or(true),
    );
    created["moodle_token"] = body["moodle_token"].clone();
    created["contact_email"] = body.get("contact_email").cloned().unwrap_or(Value::Null);
    created["notes"] = body.get("notes").cloned().unwrap_or(Value::Null);
    state.instances.lock().unwrap().push(created.clone());
    Ok(Json(created))
}

fn find_instance(state: &BackendState, id: i64) -> Result<Value, (StatusCode, Json<Value>)> {
    state
        .instances()
        .into_iter()
        .find(|i| i["id"] == json!(id))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, json!("Instance not found")))
}

async fn get_instance(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    state.authorize(&headers)?;
    Ok(Json(find_instance(&state, id)?))
}

async fn update_instance(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    state.authorize(&headers)?;
    find_instance(&state, id)?;
    let mut instances = state.instances.lock().unwrap();
    let Some(stored) = instances.iter_mut().find(|i| i["id"] == json!(id)) else {
        return Err(reject(StatusCode::NOT_FOUND, json!("Instance not found")));
    };
    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            stored[key.as_str()] = value.clone();
        }
    }
    Ok(Json(stored.clone()))
}

async fn delete_instance(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    state.authorize(&headers)?;
    find_instance(&state, id)?;
    state.instances.lock().unwrap().retain(|i| i["id"] != json!(id));
    Ok(Json(json!({ "message": "Instance deleted" })))
}

async fn test_instance(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    state.authorize(&headers)?;
    let instance = find_instance(&state, id)?;
    let url = instance["moodle_url"].as_str().unwrap_or_default();
    if url.contains("good") {
        Ok(Json(json!({
            "success": true,
            "message": "Connection successful",
            "site_name": "Digital Health Academy",
            "moodle_version": "4.1",
            "courses_count": 2
        })))
    } else {
        Ok(Json(json!({
            "success": false,
            "message": "Connection failed",
            "error": "Invalid token"
        })))
    }
}

async fn dashboard(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Reply {
    state.authorize(&headers)?;
    Ok(Json(json!({
        "summary": {
            "total_instances": 2,
            "active_instances": 1,
            "total_courses": 2,
            "total_users": 1
        },
        "instances": [{
            "id": 1,
            "name": "Digital Health",
            "slug": "digitalhealth",
            "url": "https://good.example.org",
            "courses_count": 2,
            "users_count": 1,
            "status": "online",
            "last_sync": null
        }]
    })))
}

async fn courses(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(_instance_id): Path<i64>,
) -> Reply {
    state.authorize(&headers)?;
    Ok(Json(json!([
        { "id": 1, "shortname": "site", "fullname": "Academy", "categoryid": 0, "visible": 1, "startdate": 0, "enddate": 0 },
        { "id": COURSE_ID, "shortname": "BLS", "fullname": "Basic Life Support", "categoryid": 2, "visible": 1, "startdate": 1700000000, "enddate": 0 }
    ])))
}

async fn course_users(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((_instance_id, course_id)): Path<(i64, i64)>,
) -> Reply {
    state.authorize(&headers)?;
    if course_id != COURSE_ID {
        return Ok(Json(json!([])));
    }
    Ok(Json(json!([{
        "id": USER_ID,
        "username": "mrossi",
        "firstname": "Mario",
        "lastname": "Rossi",
        "email": "mario@example.org",
        "customfields": [
            { "type": "text", "value": "RSSMRA80A01H501U", "name": "Codice fiscale", "shortname": "codice_fiscale" }
        ]
    }])))
}

async fn completion(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((_i, _c, _u)): Path<(i64, i64, i64)>,
) -> Reply {
    state.authorize(&headers)?;
    Ok(Json(json!({ "completed": true, "timecompleted": 1700500000 })))
}

async fn grades(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((_i, _c, _u)): Path<(i64, i64, i64)>,
) -> Reply {
    state.authorize(&headers)?;
    if state.fail_grades.load(Ordering::SeqCst) {
        return Err(reject(StatusCode::BAD_GATEWAY, json!("Moodle unreachable")));
    }
    Ok(Json(json!([
        { "itemtype": "course", "itemname": null, "graderaw": 78.0, "grademin": 0.0, "grademax": 100.0 },
        { "itemtype": "mod", "itemname": "Week 1 Quiz", "itemmodule": "quiz", "graderaw": 8.0, "grademin": 0.0, "grademax": 10.0 }
    ])))
}

async fn activities(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((_i, _c, _u)): Path<(i64, i64, i64)>,
) -> Reply {
    state.authorize(&headers)?;
    Ok(Json(json!([
        {
            "cmid": 5,
            "modname": "quiz",
            "state": 1,
            "timecompleted": 1700400000,
            "details": [{ "rulename": "completionpassgrade", "rulevalue": { "status": 1, "description": "Passing grade" } }]
        },
        { "cmid": 99, "modname": "scorm", "state": 0, "timecompleted": 0, "details": [] }
    ])))
}

async fn contents(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((_i, _c)): Path<(i64, i64)>,
) -> Reply {
    state.authorize(&headers)?;
    if state.slow_contents_rejected.load(Ordering::SeqCst) {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        return Err(reject(
            StatusCode::UNAUTHORIZED,
            json!("Could not validate credentials"),
        ));
    }
    Ok(Json(json!([
        { "id": 10, "name": "Week 1", "modules": [{ "id": 5, "name": "Week 1 Quiz", "modname": "quiz" }] }
    ])))
}

async fn report_rows(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((_i, _c)): Path<(i64, i64)>,
) -> Reply {
    state.authorize(&headers)?;
    if state.empty_report.load(Ordering::SeqCst) {
        return Ok(Json(json!([])));
    }
    Ok(Json(json!([
        { "user": "mrossi", "score": 78, "note": "x,y" },
        { "user": "abianchi", "score": null, "note": "He said \"hi\"" }
    ])))
}

fn mappings_guard(state: &BackendState) -> Result<(), (StatusCode, Json<Value>)> {
    if state.fail_mappings.load(Ordering::SeqCst) {
        return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, json!(null)));
    }
    Ok(())
}

async fn list_mappings(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(instance_id): Path<i64>,
) -> Reply {
    state.authorize(&headers)?;
    mappings_guard(&state)?;
    let list: Vec<Value> = state
        .mappings()
        .into_iter()
        .filter(|m| m["instance_id"] == json!(instance_id))
        .collect();
    Ok(Json(Value::Array(list)))
}

fn find_mapping(
    state: &BackendState,
    instance_id: i64,
    course_id: i64,
) -> Result<Value, (StatusCode, Json<Value>)> {
    state
        .mappings()
        .into_iter()
        .find(|m| m["instance_id"] == json!(instance_id) && m["course_id"] == json!(course_id))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, json!("Report configuration not found")))
}

async fn get_mapping(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((instance_id, course_id)): Path<(i64, i64)>,
) -> Reply {
    state.authorize(&headers)?;
    mappings_guard(&state)?;
    Ok(Json(find_mapping(&state, instance_id, course_id)?))
}

async fn create_mapping(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(instance_id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    state.authorize(&headers)?;
    mappings_guard(&state)?;
    let course_id = body["course_id"].as_i64().unwrap_or_default();
    if find_mapping(&state, instance_id, course_id).is_ok() {
        return Err(reject(StatusCode::BAD_REQUEST, json!("Report already configured")));
    }
    let created = json!({
        "id": state.next_id.fetch_add(1, Ordering::SeqCst),
        "instance_id": instance_id,
        "course_id": course_id,
        "report_id": body["report_id"],
        "notes": body.get("notes").cloned().unwrap_or(Value::Null),
        "created_at": "2024-02-01T10:00:00",
        "updated_at": null
    });
    state.mappings.lock().unwrap().push(created.clone());
    Ok(Json(created))
}

async fn update_mapping(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((instance_id, course_id)): Path<(i64, i64)>,
    Json(body): Json<Value>,
) -> Reply {
    state.authorize(&headers)?;
    mappings_guard(&state)?;
    find_mapping(&state, instance_id, course_id)?;
    let mut mappings = state.mappings.lock().unwrap();
    let Some(stored) = mappings
        .iter_mut()
        .find(|m| m["instance_id"] == json!(instance_id) && m["course_id"] == json!(course_id))
    else {
        return Err(reject(StatusCode::NOT_FOUND, json!("Report configuration not found")));
    };
    stored["report_id"] = body["report_id"].clone();
    stored["notes"] = body.get("notes").cloned().unwrap_or(Value::Null);
    stored["updated_at"] = json!("2024-02-02T10:00:00");
    Ok(Json(stored.clone()))
}

async fn delete_mapping(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((instance_id, course_id)): Path<(i64, i64)>,
) -> Reply {
    state.authorize(&headers)?;
    mappings_guard(&state)?;
    find_mapping(&state, instance_id, course_id)?;
    state
        .mappings
        .lock()
        .unwrap()
        .retain(|m| !(m["instance_id"] == json!(instance_id) && m["course_id"] == json!(course_id)));
    Ok(Json(json!({ "message": "Report configuration deleted" })))
}

fn router(state: Arc<BackendState>) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/moodle-instances", get(list_instances).post(create_instance))
        .route(
            "/moodle-instances/{id}",
            get(get_instance).put(update_instance).delete(delete_instance),
        )
        .route("/moodle-instances/{id}/test", post(test_instance))
        .route("/dashboard/stats", get(dashboard))
        .route("/instances/{instance_id}/courses", get(courses))
        .route(
            "/instances/{instance_id}/courses/{course_id}/users",
            get(course_users),
        )
        .route(
            "/instances/{instance_id}/courses/{course_id}/users/{user_id}/completion",
            get(completion),
        )
        .route(
            "/instances/{instance_id}/courses/{course_id}/users/{user_id}/grades",
            get(grades),
        )
        .route(
            "/instances/{instance_id}/courses/{course_id}/users/{user_id}/activities",
            get(activities),
        )
        .route(
            "/instances/{instance_id}/courses/{course_id}/contents",
            get(contents),
        )
        .route(
            "/instances/{instance_id}/courses/{course_id}/report",
            get(report_rows),
        )
        .route(
            "/course-reports/{instance_id}",
            get(list_mappings).post(create_mapping),
        )
        .route(
            "/course-reports/{instance_id}/{course_id}",
            get(get_mapping).put(update_mapping).delete(delete_mapping),
        )
        .with_state(state);

    Router::new().nest("/api/v1", api)
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<BackendState>,
}

impl MockBackend {
    /// Binds to an ephemeral port and serves in the background.
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::seeded());
        let app = router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock backend crashed");
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Remembers every forced navigation.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, to: Route) {
        self.routes.lock().unwrap().push(to);
    }
}

pub struct Harness {
    pub session: SessionContext,
    pub client: ApiClient,
    pub navigator: Arc<RecordingNavigator>,
}

pub fn harness(base_url: &str) -> Harness {
    harness_with_session(base_url, SessionContext::in_memory())
}

pub fn harness_with_session(base_url: &str, session: SessionContext) -> Harness {
    let navigator = Arc::new(RecordingNavigator::default());
    let client = ApiClient::new(
        &ConsoleConfig::new(base_url),
        session.clone(),
        navigator.clone(),
    )
    .expect("Failed to build client");
    Harness {
        session,
        client,
        navigator,
    }
}
