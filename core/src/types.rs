//! Parameter objects and results for the A-Parser API.
//!
//! # Design
//! Operations with several optional arguments get a builder-style struct
//! whose serde form is exactly the `data` mapping sent on the wire, so the
//! client only has to serialize it. Field names follow the service's
//! camelCase keys and `0|1` flags are carried as `bool`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Numeric identifier the service assigns to a task.
pub type TaskUid = u64;

/// Data mapping sent in a request envelope.
pub type Data = Map<String, Value>;

const DEFAULT_PRESET: &str = "default";
const DEFAULT_THREADS: u32 = 5;

fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}

fn default_threads() -> u32 {
    DEFAULT_THREADS
}

/// Serializes a `bool` as `0|1`; accepts a bool or any integer back.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
    }

    pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Raw::deserialize(d)? {
            Raw::Bool(b) => b,
            Raw::Int(n) => n != 0,
        })
    }
}

/// Outcome of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The envelope carried a `data` payload, including falsy ones such as
    /// `0` or `""`.
    Data(Value),
    /// The call succeeded without a payload (`data` absent or `null`).
    Done,
}

impl Reply {
    pub fn data(&self) -> Option<&Value> {
        match self {
            Reply::Data(value) => Some(value),
            Reply::Done => None,
        }
    }

    pub fn into_data(self) -> Option<Value> {
        match self {
            Reply::Data(value) => Some(value),
            Reply::Done => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Reply::Done)
    }

    /// The payload, or `true` for a call that succeeded without one.
    pub fn into_value(self) -> Value {
        self.into_data().unwrap_or(Value::Bool(true))
    }
}

/// Target status for `changeTaskStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Starting,
    Pausing,
    Stopping,
    Deleting,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Starting => "starting",
            TaskStatus::Pausing => "pausing",
            TaskStatus::Stopping => "stopping",
            TaskStatus::Deleting => "deleting",
        }
    }
}

/// Queue movement for `moveTask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Start,
    End,
    Up,
    Down,
}

impl MoveDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveDirection::Start => "start",
            MoveDirection::End => "end",
            MoveDirection::Up => "up",
            MoveDirection::Down => "down",
        }
    }
}

/// One entry of the `options` list of `oneRequest` / `bulkRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserOption {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub value: Value,
}

impl ParserOption {
    /// Override the preset's value of option `id`.
    pub fn overriding(id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            kind: "override".to_string(),
            id: id.into(),
            value: value.into(),
        }
    }
}

/// Parameters of a single-query `oneRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneRequest {
    pub query: String,
    pub parser: String,
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default, with = "flag")]
    pub raw_results: bool,
    #[serde(default)]
    pub options: Vec<ParserOption>,
}

impl OneRequest {
    pub fn new(query: impl Into<String>, parser: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parser: parser.into(),
            preset: default_preset(),
            raw_results: false,
            options: Vec::new(),
        }
    }

    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    pub fn raw_results(mut self, raw: bool) -> Self {
        self.raw_results = raw;
        self
    }

    pub fn option(mut self, option: ParserOption) -> Self {
        self.options.push(option);
        self
    }
}

/// Parameters of a multi-query `bulkRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    pub queries: Vec<String>,
    pub parser: String,
    #[serde(default = "default_preset")]
    pub preset: String,
    /// Thread-count hint for the service.
    #[serde(default = "default_threads")]
    pub threads: u32,
    #[serde(default, with = "flag")]
    pub raw_results: bool,
    #[serde(default)]
    pub options: Vec<ParserOption>,
}

impl BulkRequest {
    pub fn new<I, S>(queries: I, parser: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queries: queries.into_iter().map(Into::into).collect(),
            parser: parser.into(),
            preset: default_preset(),
            threads: DEFAULT_THREADS,
            raw_results: false,
            options: Vec::new(),
        }
    }

    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    pub fn threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    pub fn raw_results(mut self, raw: bool) -> Self {
        self.raw_results = raw;
        self
    }

    pub fn option(mut self, option: ParserOption) -> Self {
        self.options.push(option);
        self
    }
}

/// Parameters of `addTask`.
///
/// `options` is merged over [`task_defaults`] when the request is built, so
/// any of the default keys can be overridden and unknown keys pass through.
#[derive(Debug, Clone, PartialEq)]
pub struct AddTask {
    pub config_preset: String,
    pub task_preset: String,
    pub queries: Vec<String>,
    pub options: Data,
}

impl Default for AddTask {
    fn default() -> Self {
        Self {
            config_preset: default_preset(),
            task_preset: default_preset(),
            queries: Vec::new(),
            options: Data::new(),
        }
    }
}

impl AddTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config_preset(mut self, preset: impl Into<String>) -> Self {
        self.config_preset = preset.into();
        self
    }

    pub fn task_preset(mut self, preset: impl Into<String>) -> Self {
        self.task_preset = preset.into();
        self
    }

    pub fn queries<I, S>(mut self, queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queries = queries.into_iter().map(Into::into).collect();
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// The `data` mapping: defaults with `options` laid over them.
    pub fn to_data(&self) -> Data {
        let mut data = task_defaults(&self.config_preset, &self.task_preset, &self.queries);
        for (key, value) in &self.options {
            data.insert(key.clone(), value.clone());
        }
        data
    }
}

/// The task configuration the service expects when none is customized.
pub fn task_defaults(config_preset: &str, task_preset: &str, queries: &[String]) -> Data {
    let defaults = json!({
        "preset": task_preset,
        "configPreset": config_preset,
        "parsers": [],
        "resultsFormat": "",
        "resultsSaveTo": "file",
        "resultsFileName": "$datefile.format().txt",
        "additionalFormats": [],
        "resultsUnique": "no",
        "queriesFrom": "text",
        "queryFormat": ["$query"],
        "uniqueQueries": 0,
        "saveFailedQueries": 0,
        "resultsOptions": [],
        "doLog": "no",
        "limitLogsCount": "0",
        "keepUnique": "No",
        "moreOptions": 0,
        "resultsPrepend": "",
        "resultsAppend": "",
        "queryBuilders": [],
        "resultsBuilders": [],
        "configOverrides": [],
        "runTaskOnComplete": null,
        "useResultsFileAsQueriesFile": 0,
        "runTaskOnCompleteConfig": "default",
        "toolsJS": "",
        "prio": 5,
        "removeOnComplete": 0,
        "callURLOnComplete": "",
        "queries": queries,
    });
    match defaults {
        Value::Object(map) => map,
        _ => Data::new(),
    }
}
