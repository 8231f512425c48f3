use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::selection::SelectionPath;
use crate::selection::SelectionToken;

/// Inputs submitted on one query screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInputs {
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

impl QueryInputs {
    pub fn new(inputs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
        }
    }

    pub fn has_inputs(&self) -> bool {
        !self.inputs.is_empty()
    }
}

pub type QueryData = BTreeMap<String, QueryInputs>;

/// The externally resumable state of one navigation session. This is also
/// the request body sent to the execution service and the URL fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub app_id: String,
    #[serde(default)]
    pub selections: SelectionPath,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query_data: QueryData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl SessionDescriptor {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            selections: SelectionPath::root(),
            query_data: QueryData::new(),
            search: None,
            page: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.selections.is_empty()
    }

    /// Descriptor one step deeper. Search and page belong to the screen they
    /// were set on and do not carry over.
    pub fn with_selection(&self, token: SelectionToken) -> Self {
        Self {
            app_id: self.app_id.clone(),
            selections: self.selections.append(token),
            query_data: self.query_data.clone(),
            search: None,
            page: None,
        }
    }

    pub fn with_path(&self, selections: SelectionPath) -> Self {
        Self {
            app_id: self.app_id.clone(),
            selections,
            query_data: self.query_data.clone(),
            search: None,
            page: None,
        }
    }

    pub fn query_inputs(&self, query_key: &str) -> Option<&QueryInputs> {
        self.query_data.get(query_key)
    }
}
