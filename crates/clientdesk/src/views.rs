//! Read models returned by the Portal.

use serde::{Deserialize, Serialize};

use clientdesk_core::{
    ChecklistProgress, Client, ClientProgress, Invoice, OnboardingChecklist, Project, Service,
};

/// A client as shown in the client list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOverview {
    pub client: Client,
    pub project_count: usize,
    pub progress: ClientProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithServices {
    pub project: Project,
    pub services: Vec<Service>,
}

/// Everything the client detail page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetail {
    pub client: Client,
    /// Newest first.
    pub projects: Vec<ProjectWithServices>,
    pub checklist: Option<OnboardingChecklist>,
    pub checklist_progress: Option<ChecklistProgress>,
    /// Newest first. Empty when the subject may not view finance.
    pub recent_invoices: Vec<Invoice>,
    pub progress: ClientProgress,
}

/// Agency-wide counters for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_clients: usize,
    pub active_projects: usize,
    pub completed_services: usize,
    pub pending_tasks: usize,
    pub recent_projects: Vec<Project>,
}
