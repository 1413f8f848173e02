//! Portal configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use clientdesk_core::DEFAULT_CHECKLIST;

/// Configuration for the Portal.
///
/// Every field has a default, so a partial JSON document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortalConfig {
    /// How many recently updated projects the dashboard shows.
    pub recent_projects_limit: usize,
    /// How many invoices a client detail view shows.
    pub recent_invoices_limit: usize,
    /// Confine team members to the clients they are assigned to on mutations.
    pub enforce_team_assignment: bool,
    /// Onboarding steps created for every new client.
    pub default_checklist: Vec<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            recent_projects_limit: 5,
            recent_invoices_limit: 5,
            enforce_team_assignment: false,
            default_checklist: DEFAULT_CHECKLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PortalConfig {
    /// Parse from JSON, defaulting missing fields.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("parsing portal config")
    }
}
