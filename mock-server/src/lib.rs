use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Parsers the mock knows about, with the results each can return.
pub const PARSERS: &[(&str, &[&str])] = &[
    ("SE::Google", &["serp", "totalcount", "related"]),
    ("SE::Bing", &["serp", "totalcount"]),
    ("HTML::LinkExtractor", &["links", "intcount", "extcount"]),
];

#[derive(Debug, Deserialize)]
pub struct ApiRequest {
    pub action: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Clone, Debug)]
pub struct Task {
    pub uid: u64,
    pub status: &'static str,
    pub conf: Value,
    pub results_file: Option<String>,
}

#[derive(Debug)]
pub struct Server {
    password: String,
    next_uid: u64,
    /// Queue order, head first.
    active: Vec<Task>,
    completed: Vec<Task>,
}

impl Server {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            next_uid: 1,
            active: Vec::new(),
            completed: Vec::new(),
        }
    }

    fn find(&self, uid: u64) -> Option<&Task> {
        self.active
            .iter()
            .chain(self.completed.iter())
            .find(|t| t.uid == uid)
    }

    fn find_mut(&mut self, uid: u64) -> Option<&mut Task> {
        self.active
            .iter_mut()
            .chain(self.completed.iter_mut())
            .find(|t| t.uid == uid)
    }
}

pub type Db = Arc<RwLock<Server>>;

pub fn app(password: impl Into<String>) -> Router {
    let db: Db = Arc::new(RwLock::new(Server::new(password)));
    Router::new().route("/API", post(api)).with_state(db)
}

pub async fn run(listener: TcpListener, password: impl Into<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, app(password)).await
}

async fn api(State(db): State<Db>, Json(req): Json<ApiRequest>) -> Json<Value> {
    tracing::debug!(action = %req.action, "request");
    let mut server = db.write().await;
    if req.password != server.password {
        return Json(json!({"success": 0, "msg": "Wrong password"}));
    }
    Json(dispatch(&mut server, &req.action, &req.data))
}

fn ok(data: Value) -> Value {
    json!({"success": true, "data": data})
}

fn done() -> Value {
    json!({"success": true})
}

fn fail(msg: impl Into<String>) -> Value {
    json!({"success": false, "msg": msg.into()})
}

fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

fn flag(data: &Value, key: &str) -> bool {
    data.get(key).and_then(Value::as_i64).unwrap_or(0) != 0
}

fn known_parser(name: &str) -> Option<&'static [&'static str]> {
    PARSERS.iter().find(|(p, _)| *p == name).map(|(_, r)| *r)
}

fn dispatch(server: &mut Server, action: &str, data: &Value) -> Value {
    match action {
        "ping" => ok(json!("pong")),
        "info" => ok(json!({
            "version": "mock",
            "parsers": PARSERS.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
            "tasksInQueue": server.active.len(),
        })),
        "oneRequest" => one_request(data),
        "bulkRequest" => bulk_request(data),
        "getParserPreset" => match str_field(data, "parser") {
            Some(parser) if known_parser(parser).is_some() => ok(json!({
                "parser": parser,
                "preset": str_field(data, "preset").unwrap_or("default"),
                "options": {},
            })),
            _ => fail("Unknown parser"),
        },
        "getProxies" => ok(json!({"127.0.0.1:3128": ["default"]})),
        "addTask" => add_task(server, data),
        "getTaskState" => with_task(server, data, |task| {
            ok(json!({
                "taskUid": task.uid,
                "status": task.status,
                "queriesCount": task.conf["queries"].as_array().map_or(0, Vec::len),
            }))
        }),
        "getTaskConf" => with_task(server, data, |task| ok(task.conf.clone())),
        "getTaskResultsFile" => with_task(server, data, |task| match &task.results_file {
            Some(file) => ok(json!(format!("http://127.0.0.1:9091/downloadResults?fileName={file}"))),
            None => fail("Results file not found"),
        }),
        "deleteTaskResultsFile" => delete_task_results_file(server, data),
        "changeTaskStatus" => change_task_status(server, data),
        "moveTask" => move_task(server, data),
        "getTasksList" => {
            let tasks = if flag(data, "completed") {
                &server.completed
            } else {
                &server.active
            };
            ok(json!(tasks.iter().map(|t| t.uid).collect::<Vec<_>>()))
        }
        "getParserInfo" => match str_field(data, "parser").and_then(known_parser) {
            Some(results) => ok(json!({"results": results})),
            None => fail("Unknown parser"),
        },
        "update" => done(),
        "getAccountsCount" => ok(json!(0)),
        other => fail(format!("Unknown action: {other}")),
    }
}

fn one_request(data: &Value) -> Value {
    let (Some(query), Some(parser)) = (str_field(data, "query"), str_field(data, "parser")) else {
        return fail("Missing query or parser");
    };
    if known_parser(parser).is_none() {
        return fail("Unknown parser");
    }
    let mut reply = json!({
        "resultString": format!("{parser}: {query}\n"),
        "logs": [],
    });
    if flag(data, "rawResults") {
        reply["results"] = json!({"query": query});
    }
    ok(reply)
}

fn bulk_request(data: &Value) -> Value {
    let (Some(queries), Some(parser)) = (
        data.get("queries").and_then(Value::as_array),
        str_field(data, "parser"),
    ) else {
        return fail("Missing queries or parser");
    };
    if known_parser(parser).is_none() {
        return fail("Unknown parser");
    }
    let result: String = queries
        .iter()
        .filter_map(Value::as_str)
        .map(|q| format!("{parser}: {q}\n"))
        .collect();
    ok(json!({
        "resultString": result,
        "threads": data.get("threads").cloned().unwrap_or(json!(5)),
        "logs": [],
    }))
}

fn add_task(server: &mut Server, data: &Value) -> Value {
    if !data.is_object() {
        return fail("Invalid task config");
    }
    let uid = server.next_uid;
    server.next_uid += 1;
    server.active.push(Task {
        uid,
        status: "paused",
        conf: data.clone(),
        results_file: Some(format!("{}.txt", Uuid::new_v4())),
    });
    ok(json!(uid))
}

fn task_uid(data: &Value) -> Option<u64> {
    data.get("taskUid").and_then(Value::as_u64)
}

fn with_task(server: &Server, data: &Value, f: impl FnOnce(&Task) -> Value) -> Value {
    match task_uid(data).and_then(|uid| server.find(uid)) {
        Some(task) => f(task),
        None => fail("Task not found"),
    }
}

fn delete_task_results_file(server: &mut Server, data: &Value) -> Value {
    let Some(uid) = task_uid(data) else {
        return fail("Task not found");
    };
    match server.find_mut(uid) {
        Some(task) => {
            task.results_file = None;
            done()
        }
        None => fail("Task not found"),
    }
}

fn change_task_status(server: &mut Server, data: &Value) -> Value {
    let Some(uid) = task_uid(data) else {
        return fail("Task not found");
    };
    let status = str_field(data, "toStatus").unwrap_or_default();
    if !matches!(status, "starting" | "pausing" | "stopping" | "deleting") {
        return fail(format!("Unknown status: {status}"));
    }
    if server.find(uid).is_none() {
        return fail("Task not found");
    }
    match status {
        "deleting" => {
            server.active.retain(|t| t.uid != uid);
            server.completed.retain(|t| t.uid != uid);
        }
        "stopping" => {
            if let Some(pos) = server.active.iter().position(|t| t.uid == uid) {
                let mut task = server.active.remove(pos);
                task.status = "completed";
                server.completed.push(task);
            }
        }
        "starting" | "pausing" => match server.active.iter_mut().find(|t| t.uid == uid) {
            Some(task) => task.status = if status == "starting" { "work" } else { "paused" },
            None => return fail("Task already completed"),
        },
        _ => {}
    }
    done()
}

fn move_task(server: &mut Server, data: &Value) -> Value {
    let Some(pos) = task_uid(data).and_then(|uid| server.active.iter().position(|t| t.uid == uid))
    else {
        return fail("Task not found");
    };
    let last = server.active.len() - 1;
    let target = match str_field(data, "direction").unwrap_or_default() {
        "start" => 0,
        "end" => last,
        "up" => pos.saturating_sub(1),
        "down" => (pos + 1).min(last),
        other => return fail(format!("Unknown direction: {other}")),
    };
    let task = server.active.remove(pos);
    server.active.insert(target, task);
    done()
}
