//! In-memory stand-in for the parts of a TeamCity server the client talks to:
//! the `app/rest` resources and the `action.html` build trigger, behind HTTP
//! basic auth.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::Engine;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "admin";
pub const VERSION: &str = "2024.12 (build 174331)";

const ALL_COMPATIBLE_AGENTS: &str = "allEnabledCompatible";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_project_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectList {
    pub count: usize,
    pub project: Vec<Project>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildType {
    pub id: String,
    pub name: String,
    pub project_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTypeList {
    pub count: usize,
    pub build_type: Vec<BuildType>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentList {
    pub count: usize,
    pub agent: Vec<Agent>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropertyList {
    pub property: Vec<Property>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: u64,
    pub build_type_id: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyList>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuildList {
    pub count: usize,
    pub build: Vec<Build>,
}

/// Server contents: a fixed project tree plus the build queue.
pub struct Server {
    projects: Vec<Project>,
    build_types: Vec<BuildType>,
    agents: Vec<Agent>,
    queue: Vec<Build>,
    next_build_id: u64,
}

impl Server {
    fn seeded() -> Self {
        let project = |id: &str, name: &str, parent: Option<&str>| Project {
            id: id.to_string(),
            name: name.to_string(),
            parent_project_id: parent.map(str::to_string),
        };
        let build_type = |id: &str, name: &str| BuildType {
            id: id.to_string(),
            name: name.to_string(),
            project_id: "Tcapy".to_string(),
        };
        Self {
            projects: vec![
                project("_Root", "<Root project>", None),
                project("Tcapy", "tcapy", Some("_Root")),
            ],
            build_types: vec![build_type("Tcapy_Build", "Build"), build_type("Tcapy_Test", "Test")],
            agents: vec![
                Agent {
                    id: 1,
                    name: "agent-1".to_string(),
                },
                Agent {
                    id: 2,
                    name: "agent-2".to_string(),
                },
            ],
            queue: Vec::new(),
            next_build_id: 1,
        }
    }
}

pub type Db = Arc<RwLock<Server>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    authorization: Arc<str>,
}

pub fn app() -> Router {
    app_with_credentials(USERNAME, PASSWORD)
}

pub fn app_with_credentials(username: &str, password: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Server::seeded())),
        authorization: basic_auth(username, password).into(),
    };
    Router::new()
        .route("/app/rest/version", get(version))
        .route("/app/rest/projects", get(list_projects))
        .route("/app/rest/projects/{locator}", get(get_project))
        .route("/app/rest/buildTypes", get(list_build_types))
        .route("/app/rest/buildTypes/{locator}", get(get_build_type))
        .route("/app/rest/builds", get(list_builds))
        .route("/app/rest/builds/{locator}", get(get_build))
        .route("/app/rest/agents", get(list_agents))
        .route("/app/rest/agents/{locator}", get(get_agent))
        .route("/action.html", get(add_to_queue))
        .layer(middleware::from_fn_with_state(state.clone(), require_basic_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    info!("mock TeamCity listening on {}", listener.local_addr()?);
    axum::serve(listener, app()).await
}

/// `Authorization` header value for `username:password`.
pub fn basic_auth(username: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

async fn require_basic_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == &*state.authorization);
    if !authorized {
        debug!("rejecting unauthenticated {}", request.uri());
        return (
            StatusCode::UNAUTHORIZED,
            [
                (header::CONTENT_TYPE, "text/plain"),
                (header::WWW_AUTHENTICATE, "Basic realm=\"TeamCity\""),
            ],
            "Incorrect username or password.",
        )
            .into_response();
    }
    next.run(request).await
}

fn text(status: StatusCode, content_type: &'static str, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

fn not_found(locator: &str) -> Response {
    text(
        StatusCode::NOT_FOUND,
        "text/plain",
        format!("Nothing is found by locator '{locator}'."),
    )
}

/// JSON only when the client asks for it; TeamCity defaults to XML.
fn negotiate<T: Serialize>(headers: &HeaderMap, root: &str, body: T) -> Response {
    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    if wants_json {
        Json(body).into_response()
    } else {
        text(StatusCode::OK, "application/xml", format!("<{root}/>"))
    }
}

/// `id:<v>` or `name:<v>` against an item's id and name.
fn matches_locator(locator: &str, id: &str, name: &str) -> bool {
    match locator.split_once(':') {
        Some(("id", value)) => value == id,
        Some(("name", value)) => value == name,
        _ => false,
    }
}

async fn version() -> Response {
    text(StatusCode::OK, "text/plain", VERSION.to_string())
}

async fn list_projects(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let db = state.db.read().await;
    let project = db.projects.clone();
    negotiate(&headers, "projects", ProjectList { count: project.len(), project })
}

async fn get_project(
    State(state): State<AppState>,
    Path(locator): Path<String>,
    headers: HeaderMap,
) -> Response {
    let db = state.db.read().await;
    match db.projects.iter().find(|p| matches_locator(&locator, &p.id, &p.name)) {
        Some(project) => negotiate(&headers, "project", project),
        None => not_found(&locator),
    }
}

async fn list_build_types(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let db = state.db.read().await;
    let build_type = db.build_types.clone();
    negotiate(
        &headers,
        "buildTypes",
        BuildTypeList {
            count: build_type.len(),
            build_type,
        },
    )
}

async fn get_build_type(
    State(state): State<AppState>,
    Path(locator): Path<String>,
    headers: HeaderMap,
) -> Response {
    let db = state.db.read().await;
    match db.build_types.iter().find(|b| matches_locator(&locator, &b.id, &b.name)) {
        Some(build_type) => negotiate(&headers, "buildType", build_type),
        None => not_found(&locator),
    }
}

async fn list_builds(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let db = state.db.read().await;
    let build = db.queue.clone();
    negotiate(&headers, "builds", BuildList { count: build.len(), build })
}

async fn get_build(
    State(state): State<AppState>,
    Path(locator): Path<String>,
    headers: HeaderMap,
) -> Response {
    let db = state.db.read().await;
    let found = db
        .queue
        .iter()
        .find(|b| matches_locator(&locator, &b.id.to_string(), &b.build_type_id));
    match found {
        Some(build) => negotiate(&headers, "build", build),
        None => not_found(&locator),
    }
}

async fn list_agents(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let db = state.db.read().await;
    let agent = db.agents.clone();
    negotiate(&headers, "agents", AgentList { count: agent.len(), agent })
}

async fn get_agent(
    State(state): State<AppState>,
    Path(locator): Path<String>,
    headers: HeaderMap,
) -> Response {
    let db = state.db.read().await;
    match db.agents.iter().find(|a| matches_locator(&locator, &a.id.to_string(), &a.name)) {
        Some(agent) => negotiate(&headers, "agent", agent),
        None => not_found(&locator),
    }
}

/// Queue one build per requested agent, or a single unassigned build.
async fn add_to_queue(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let mut build_type_id = None;
    let mut move_to_top = false;
    let mut agent_ids = Vec::new();
    let mut properties = Vec::new();
    let mut pending_name = None;
    for (key, value) in params {
        match key.as_str() {
            "add2Queue" => build_type_id = Some(value),
            "moveToTop" => move_to_top = value.eq_ignore_ascii_case("true"),
            "agentId" => agent_ids.push(value),
            "name" => pending_name = Some(value),
            "value" => {
                if let Some(name) = pending_name.take() {
                    properties.push(Property { name, value });
                }
            }
            other => debug!("ignoring action parameter {other}={value}"),
        }
    }

    let Some(build_type_id) = build_type_id else {
        return text(StatusCode::BAD_REQUEST, "text/plain", "add2Queue is required".to_string());
    };

    let mut db = state.db.write().await;
    if !db.build_types.iter().any(|b| b.id == build_type_id) {
        return not_found(&format!("id:{build_type_id}"));
    }

    let mut agents = Vec::new();
    for agent_id in &agent_ids {
        if agent_id == ALL_COMPATIBLE_AGENTS {
            agents.extend(db.agents.iter().map(|a| Some(a.id)));
            continue;
        }
        match agent_id.parse::<u64>() {
            Ok(id) if db.agents.iter().any(|a| a.id == id) => agents.push(Some(id)),
            _ => return not_found(&format!("id:{agent_id}")),
        }
    }
    if agents.is_empty() {
        agents.push(None);
    }

    let properties = (!properties.is_empty()).then_some(PropertyList { property: properties });
    for agent_id in agents {
        let build = Build {
            id: db.next_build_id,
            build_type_id: build_type_id.clone(),
            state: "queued".to_string(),
            agent_id,
            properties: properties.clone(),
        };
        db.next_build_id += 1;
        info!("queued build {} of {}", build.id, build.build_type_id);
        if move_to_top {
            db.queue.insert(0, build);
        } else {
            db.queue.push(build);
        }
    }

    text(
        StatusCode::OK,
        "text/html",
        "<html><body>Build added to queue</body></html>".to_string(),
    )
}
