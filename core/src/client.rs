//! Blocking client for the A-Parser API.
//!
//! # Design
//! `AParserClient` holds an immutable `ClientConfig` and a `Transport`, and
//! carries no state between calls, so one instance can be shared freely.
//! Every public method is a fixed mapping from its arguments to an
//! `(Action, Data)` pair handed to `call`, which does exactly one round-trip:
//! build the envelope, send it, interpret the reply.

use serde::Serialize;
use serde_json::{json, Value};

use crate::action::Action;
use crate::config::{CallTimeout, ClientConfig};
use crate::envelope::{build_request, parse_response};
use crate::error::{ApiError, ConfigError, TransportError};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    AddTask, BulkRequest, Data, MoveDirection, OneRequest, Reply, TaskStatus, TaskUid,
};

#[derive(Debug, Clone)]
pub struct AParserClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl AParserClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Build a client from `APARSER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(ClientConfig::from_env()?))
    }
}

impl<T: Transport> AParserClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `action` with `data` and interpret the reply.
    ///
    /// A `Duration` converts into `CallTimeout::After`.
    pub fn call(
        &self,
        action: Action,
        data: Data,
        timeout: impl Into<CallTimeout>,
    ) -> Result<Reply, ApiError> {
        let timeout = timeout.into().resolve(&self.config, action);
        let request = build_request(&self.config, action, data)?;
        tracing::debug!(%action, endpoint = %request.url, ?timeout, "dispatching");

        let response = self.transport.send(&request, timeout).map_err(|e| {
            tracing::warn!(%action, error = %e, "transport failure");
            e
        })?;

        match parse_response(&response) {
            Ok(reply) => {
                tracing::debug!(%action, done = reply.is_done(), "reply");
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(%action, error = %e, "call failed");
                Err(e)
            }
        }
    }

    /// Check that the server is alive.
    pub fn ping(&self) -> Result<Reply, ApiError> {
        self.call(Action::Ping, Data::new(), CallTimeout::Default)
    }

    /// General information and the list of available parsers.
    pub fn info(&self) -> Result<Reply, ApiError> {
        self.call(Action::Info, Data::new(), CallTimeout::Default)
    }

    /// Parse a single query with any parser and preset.
    pub fn one_request(&self, request: &OneRequest) -> Result<Reply, ApiError> {
        self.call(Action::OneRequest, to_data(request)?, CallTimeout::Default)
    }

    /// Parse many queries in `threads` threads.
    pub fn bulk_request(&self, request: &BulkRequest) -> Result<Reply, ApiError> {
        self.call(Action::BulkRequest, to_data(request)?, CallTimeout::Default)
    }

    pub fn get_parser_preset(&self, parser: &str, preset: &str) -> Result<Reply, ApiError> {
        self.call(
            Action::GetParserPreset,
            data(json!({"parser": parser, "preset": preset})),
            CallTimeout::Default,
        )
    }

    /// Live proxies from all checkers.
    pub fn get_proxies(&self) -> Result<Reply, ApiError> {
        self.call(Action::GetProxies, Data::new(), CallTimeout::Default)
    }

    /// Queue a task. The reply carries the new task's uid.
    pub fn add_task(&self, task: &AddTask) -> Result<Reply, ApiError> {
        self.call(Action::AddTask, task.to_data(), CallTimeout::Default)
    }

    pub fn get_task_state(&self, task_uid: TaskUid) -> Result<Reply, ApiError> {
        self.call(Action::GetTaskState, task_data(task_uid), CallTimeout::Default)
    }

    pub fn get_task_conf(&self, task_uid: TaskUid) -> Result<Reply, ApiError> {
        self.call(Action::GetTaskConf, task_data(task_uid), CallTimeout::Default)
    }

    /// Download link for the task's results.
    pub fn get_task_results_file(&self, task_uid: TaskUid) -> Result<Reply, ApiError> {
        self.call(Action::GetTaskResultsFile, task_data(task_uid), CallTimeout::Default)
    }

    pub fn delete_task_results_file(&self, task_uid: TaskUid) -> Result<Reply, ApiError> {
        self.call(Action::DeleteTaskResultsFile, task_data(task_uid), CallTimeout::Default)
    }

    pub fn change_task_status(
        &self,
        task_uid: TaskUid,
        to_status: TaskStatus,
    ) -> Result<Reply, ApiError> {
        self.call(
            Action::ChangeTaskStatus,
            data(json!({"taskUid": task_uid, "toStatus": to_status.as_str()})),
            CallTimeout::Default,
        )
    }

    /// Move a task within the queue.
    pub fn move_task(&self, task_uid: TaskUid, direction: MoveDirection) -> Result<Reply, ApiError> {
        self.call(
            Action::MoveTask,
            data(json!({"taskUid": task_uid, "direction": direction.as_str()})),
            CallTimeout::Default,
        )
    }

    /// Active tasks, or completed ones when `completed` is set.
    pub fn get_tasks_list(&self, completed: bool) -> Result<Reply, ApiError> {
        self.call(
            Action::GetTasksList,
            data(json!({"completed": u8::from(completed)})),
            CallTimeout::Default,
        )
    }

    /// Results the given parser can return.
    pub fn get_parser_info(&self, parser: &str) -> Result<Reply, ApiError> {
        self.call(Action::GetParserInfo, data(json!({"parser": parser})), CallTimeout::Default)
    }

    /// Update the server executable; the server restarts afterwards. This can
    /// take minutes, so it runs under the long timeout.
    pub fn update(&self) -> Result<Reply, ApiError> {
        self.call(Action::Update, Data::new(), CallTimeout::Default)
    }

    pub fn get_accounts_count(&self) -> Result<Reply, ApiError> {
        self.call(Action::GetAccountsCount, Data::new(), CallTimeout::Default)
    }
}

fn task_data(task_uid: TaskUid) -> Data {
    data(json!({ "taskUid": task_uid }))
}

fn data(value: Value) -> Data {
    match value {
        Value::Object(map) => map,
        _ => Data::new(),
    }
}

fn to_data<S: Serialize>(params: &S) -> Result<Data, ApiError> {
    match serde_json::to_value(params) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(TransportError::Encode(format!("expected an object, got {other}")).into()),
        Err(e) => Err(TransportError::Encode(e.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::http::{HttpRequest, HttpResponse};

    /// Records every request and answers with a canned response.
    struct FakeTransport {
        reply: Result<(u16, String), fn() -> TransportError>,
        seen: Mutex<Vec<(HttpRequest, Option<Duration>)>>,
    }

    impl FakeTransport {
        fn answering(body: &str) -> Self {
            Self {
                reply: Ok((200, body.to_string())),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: fn() -> TransportError) -> Self {
            Self {
                reply: Err(err),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last_body(&self) -> Value {
            let seen = self.seen.lock().unwrap();
            serde_json::from_str(&seen.last().unwrap().0.body).unwrap()
        }

        fn last_timeout(&self) -> Option<Duration> {
            self.seen.lock().unwrap().last().unwrap().1
        }
    }

    impl Transport for FakeTransport {
        fn send(
            &self,
            request: &HttpRequest,
            timeout: Option<Duration>,
        ) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push((request.clone(), timeout));
            match &self.reply {
                Ok((status, body)) => Ok(HttpResponse {
                    status: *status,
                    headers: Vec::new(),
                    body: body.as_bytes().to_vec(),
                }),
                Err(make) => Err(make()),
            }
        }
    }

    fn client(transport: &FakeTransport) -> AParserClient<&FakeTransport> {
        AParserClient::with_transport(ClientConfig::new("http://h/API", "pw"), transport)
    }

    const DONE: &str = r#"{"success":true}"#;

    #[test]
    fn ping_sends_empty_data_with_short_timeout() {
        let fake = FakeTransport::answering(r#"{"success":1,"data":"pong"}"#);
        let reply = client(&fake).ping().unwrap();

        assert_eq!(reply, Reply::Data(json!("pong")));
        assert_eq!(
            fake.last_body(),
            json!({"action": "ping", "password": "pw", "data": {}})
        );
        assert_eq!(fake.last_timeout(), Some(crate::config::DEFAULT_TIMEOUT));
    }

    #[test]
    fn long_actions_use_long_timeout() {
        let fake = FakeTransport::answering(DONE);
        let c = AParserClient::with_transport(
            ClientConfig::new("http://h/API", "pw").with_long_timeout(Some(Duration::from_secs(90))),
            &fake,
        );
        c.update().unwrap();
        assert_eq!(fake.last_timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn per_call_timeout_overrides_config() {
        let fake = FakeTransport::answering(DONE);
        client(&fake)
            .call(Action::Info, Data::new(), Duration::from_millis(250))
            .unwrap();
        assert_eq!(fake.last_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn unbounded_call_ignores_configured_timeout() {
        let fake = FakeTransport::answering(DONE);
        client(&fake)
            .call(Action::Info, Data::new(), CallTimeout::Unbounded)
            .unwrap();
        assert_eq!(fake.last_timeout(), None);
    }

    #[test]
    fn one_request_payload() {
        let fake = FakeTransport::answering(r#"{"success":true,"data":{"resultString":"ok"}}"#);
        client(&fake)
            .one_request(&OneRequest::new("rust", "SE::Google"))
            .unwrap();
        assert_eq!(
            fake.last_body()["data"],
            json!({
                "query": "rust",
                "parser": "SE::Google",
                "preset": "default",
                "rawResults": 0,
                "options": [],
            })
        );
    }

    #[test]
    fn bulk_request_payload() {
        let fake = FakeTransport::answering(DONE);
        client(&fake)
            .bulk_request(&BulkRequest::new(["a", "b"], "SE::Bing").threads(10).raw_results(true))
            .unwrap();
        let body = fake.last_body();
        assert_eq!(body["action"], "bulkRequest");
        assert_eq!(body["data"]["queries"], json!(["a", "b"]));
        assert_eq!(body["data"]["threads"], 10);
        assert_eq!(body["data"]["rawResults"], 1);
    }

    #[test]
    fn add_task_sends_merged_defaults() {
        let fake = FakeTransport::answering(r#"{"success":true,"data":12}"#);
        let reply = client(&fake)
            .add_task(&AddTask::new().queries(["q"]).option("prio", 9))
            .unwrap();

        assert_eq!(reply, Reply::Data(json!(12)));
        let data = &fake.last_body()["data"];
        assert_eq!(data["prio"], 9);
        assert_eq!(data["queries"], json!(["q"]));
        assert_eq!(data.as_object().unwrap().len(), 30);
    }

    #[test]
    fn task_methods_send_task_uid() {
        let fake = FakeTransport::answering(DONE);
        let c = client(&fake);
        let cases: [(&str, fn(&AParserClient<&FakeTransport>) -> Result<Reply, ApiError>); 4] = [
            ("getTaskState", |c| c.get_task_state(3)),
            ("getTaskConf", |c| c.get_task_conf(3)),
            ("getTaskResultsFile", |c| c.get_task_results_file(3)),
            ("deleteTaskResultsFile", |c| c.delete_task_results_file(3)),
        ];
        for (action, f) in cases {
            f(&c).unwrap();
            assert_eq!(
                fake.last_body(),
                json!({"action": action, "password": "pw", "data": {"taskUid": 3}})
            );
        }
    }

    #[test]
    fn change_status_and_move_payloads() {
        let fake = FakeTransport::answering(DONE);
        let c = client(&fake);

        c.change_task_status(4, TaskStatus::Pausing).unwrap();
        assert_eq!(fake.last_body()["data"], json!({"taskUid": 4, "toStatus": "pausing"}));

        c.move_task(4, MoveDirection::Down).unwrap();
        assert_eq!(fake.last_body()["data"], json!({"taskUid": 4, "direction": "down"}));
    }

    #[test]
    fn tasks_list_sends_completed_flag() {
        let fake = FakeTransport::answering(r#"{"success":true,"data":[]}"#);
        let c = client(&fake);
        c.get_tasks_list(false).unwrap();
        assert_eq!(fake.last_body()["data"], json!({"completed": 0}));
        c.get_tasks_list(true).unwrap();
        assert_eq!(fake.last_body()["data"], json!({"completed": 1}));
    }

    #[test]
    fn parser_methods_pass_arguments_through() {
        let fake = FakeTransport::answering(DONE);
        let c = client(&fake);
        c.get_parser_preset("SE::Google", "deep").unwrap();
        assert_eq!(
            fake.last_body()["data"],
            json!({"parser": "SE::Google", "preset": "deep"})
        );
        c.get_parser_info("SE::Google").unwrap();
        assert_eq!(fake.last_body()["data"], json!({"parser": "SE::Google"}));
    }

    #[test]
    fn no_argument_methods_send_empty_data() {
        let fake = FakeTransport::answering(DONE);
        let c = client(&fake);
        c.info().unwrap();
        assert_eq!(fake.last_body()["action"], "info");
        c.get_proxies().unwrap();
        assert_eq!(fake.last_body()["action"], "getProxies");
        c.get_accounts_count().unwrap();
        assert_eq!(fake.last_body()["action"], "getAccountsCount");
        assert_eq!(fake.last_body()["data"], json!({}));
    }

    #[test]
    fn application_error_surfaces_message() {
        let fake = FakeTransport::answering(r#"{"success":false,"msg":"bad password"}"#);
        let err = client(&fake).ping().unwrap_err();
        assert_eq!(err.message(), Some("bad password"));
    }

    #[test]
    fn transport_error_is_propagated_untouched() {
        let fake = FakeTransport::failing(|| TransportError::Timeout);
        let err = client(&fake).update().unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::Timeout)));
        assert_eq!(fake.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AParserClient>();
    }
}
