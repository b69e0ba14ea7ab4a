use serde::{Deserialize, Serialize};

/// Project type and framework recorded in the app manifest metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfiguration {
    pub project_type: String,
    pub framework: String,
}

impl ProjectConfiguration {
    pub fn is_empty(&self) -> bool {
        self.project_type.is_empty() && self.framework.is_empty()
    }
}
