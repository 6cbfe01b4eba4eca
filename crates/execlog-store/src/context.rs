//! Per-execution context values used to expand path templates

use serde::{Deserialize, Serialize};

/// Runtime values describing the execution whose log is being stored
///
/// Every field is optional: a value that was not supplied is absent, which
/// is not the same as an empty string. Keys are addressed from path
/// templates as `${job.<key>}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    /// Execution id (`${job.execid}`)
    pub execid: Option<String>,

    /// Project name (`${job.project}`)
    pub project: Option<String>,

    /// Job UUID, absent for ad-hoc executions (`${job.id}`)
    pub id: Option<String>,

    /// Job group (`${job.group}`)
    pub group: Option<String>,

    /// Job name (`${job.name}`)
    pub name: Option<String>,

    /// Execution URL (`${job.url}`)
    pub url: Option<String>,

    /// Base URL of the server running the execution (`${job.serverUrl}`)
    pub server_url: Option<String>,

    /// UUID of the server running the execution (`${job.serverUUID}`)
    #[serde(rename = "serverUUID")]
    pub server_uuid: Option<String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a context from a JSON object such as `{"execid": "42", "project": "ops"}`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up the value for a placeholder key
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "execid" => &self.execid,
            "project" => &self.project,
            "id" => &self.id,
            "group" => &self.group,
            "name" => &self.name,
            "url" => &self.url,
            "serverUrl" => &self.server_url,
            "serverUUID" => &self.server_uuid,
            _ => return None,
        };
        value.as_deref()
    }

    pub fn with_execid(mut self, execid: impl Into<String>) -> Self {
        self.execid = Some(execid.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    pub fn with_server_uuid(mut self, server_uuid: impl Into<String>) -> Self {
        self.server_uuid = Some(server_uuid.into());
        self
    }
}
