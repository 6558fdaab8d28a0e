//! The fixed set of remote operations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named remote operation, sent as the envelope's `action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Ping,
    Info,
    OneRequest,
    BulkRequest,
    GetParserPreset,
    GetProxies,
    AddTask,
    GetTaskState,
    GetTaskConf,
    GetTaskResultsFile,
    DeleteTaskResultsFile,
    ChangeTaskStatus,
    MoveTask,
    GetTasksList,
    GetParserInfo,
    Update,
    GetAccountsCount,
}

impl Action {
    pub const ALL: [Action; 17] = [
        Action::Ping,
        Action::Info,
        Action::OneRequest,
        Action::BulkRequest,
        Action::GetParserPreset,
        Action::GetProxies,
        Action::AddTask,
        Action::GetTaskState,
        Action::GetTaskConf,
        Action::GetTaskResultsFile,
        Action::DeleteTaskResultsFile,
        Action::ChangeTaskStatus,
        Action::MoveTask,
        Action::GetTasksList,
        Action::GetParserInfo,
        Action::Update,
        Action::GetAccountsCount,
    ];

    /// Wire name of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Ping => "ping",
            Action::Info => "info",
            Action::OneRequest => "oneRequest",
            Action::BulkRequest => "bulkRequest",
            Action::GetParserPreset => "getParserPreset",
            Action::GetProxies => "getProxies",
            Action::AddTask => "addTask",
            Action::GetTaskState => "getTaskState",
            Action::GetTaskConf => "getTaskConf",
            Action::GetTaskResultsFile => "getTaskResultsFile",
            Action::DeleteTaskResultsFile => "deleteTaskResultsFile",
            Action::ChangeTaskStatus => "changeTaskStatus",
            Action::MoveTask => "moveTask",
            Action::GetTasksList => "getTasksList",
            Action::GetParserInfo => "getParserInfo",
            Action::Update => "update",
            Action::GetAccountsCount => "getAccountsCount",
        }
    }

    /// Lightweight actions are bounded by the short default timeout; the
    /// rest may legitimately run for minutes.
    pub fn is_lightweight(self) -> bool {
        matches!(self, Action::Ping | Action::Info)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the known action names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action {0:?}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::ping(Action::Ping, "ping")]
    #[case::one_request(Action::OneRequest, "oneRequest")]
    #[case::results_file(Action::DeleteTaskResultsFile, "deleteTaskResultsFile")]
    #[case::tasks_list(Action::GetTasksList, "getTasksList")]
    #[case::accounts(Action::GetAccountsCount, "getAccountsCount")]
    fn wire_name_matches_serde(#[case] action: Action, #[case] name: &str) {
        assert_eq!(action.as_str(), name);
        assert_eq!(serde_json::to_value(action).unwrap(), name);
        assert_eq!(name.parse::<Action>().unwrap(), action);
    }

    #[test]
    fn every_action_roundtrips_through_its_name() {
        for action in Action::ALL {
            assert_eq!(action.to_string().parse::<Action>(), Ok(action));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "reboot".parse::<Action>().unwrap_err();
        assert_eq!(err, UnknownAction("reboot".to_string()));
    }

    #[test]
    fn only_ping_and_info_are_lightweight() {
        let light: Vec<_> = Action::ALL.into_iter().filter(|a| a.is_lightweight()).collect();
        assert_eq!(light, vec![Action::Ping, Action::Info]);
    }
}
