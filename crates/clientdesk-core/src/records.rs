//! Domain records owned by the persistence layer.
//!
//! Every record that belongs to a client implements [`ScopedRecord`] so the
//! ownership check can be applied uniformly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::subject::ScopedRecord;
use crate::types::{ClientId, InvoiceId, ProjectId, ServiceId, TaskId, UserId};

macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name of this value.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(CoreError::UnknownStatus(other.to_string())),
                }
            }
        }
    };
}

status_enum!(
    /// Lifecycle of a client relationship.
    ClientStatus {
        Onboarding => "ONBOARDING",
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Archived => "ARCHIVED",
    }
);

status_enum!(
    ProjectStatus {
        Planning => "PLANNING",
        InProgress => "IN_PROGRESS",
        OnHold => "ON_HOLD",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
);

status_enum!(
    ServiceStatus {
        Todo => "TODO",
        InProgress => "IN_PROGRESS",
        Waiting => "WAITING",
        Approved => "APPROVED",
        Completed => "COMPLETED",
    }
);

status_enum!(
    ServiceKind {
        Branding => "BRANDING",
        Website => "WEBSITE",
        Marketing => "MARKETING",
        Content => "CONTENT",
        Other => "OTHER",
    }
);

status_enum!(
    TaskStatus {
        Todo => "TODO",
        InProgress => "IN_PROGRESS",
        Done => "DONE",
    }
);

status_enum!(
    InvoiceStatus {
        Draft => "DRAFT",
        Sent => "SENT",
        Paid => "PAID",
        Overdue => "OVERDUE",
    }
);

status_enum!(
    ChecklistStatus {
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
    }
);

status_enum!(
    /// Kind of record an activity entry refers to.
    EntityKind {
        Client => "CLIENT",
        Project => "PROJECT",
        Service => "SERVICE",
        Task => "TASK",
        Checklist => "CHECKLIST",
    }
);

status_enum!(
    /// Mutation recorded in the activity log.
    ActivityAction {
        CreatedClient => "CREATED_CLIENT",
        UpdatedClient => "UPDATED_CLIENT",
        DeletedClient => "DELETED_CLIENT",
        CreatedProject => "CREATED_PROJECT",
        CreatedService => "CREATED_SERVICE",
        UpdatedServiceStatus => "UPDATED_SERVICE_STATUS",
        CreatedTask => "CREATED_TASK",
        CommentedTask => "COMMENTED_TASK",
        UpdatedChecklist => "UPDATED_CHECKLIST",
    }
);

impl TaskStatus {
    /// Whether work on the task is still outstanding.
    pub fn is_pending(self) -> bool {
        matches!(self, TaskStatus::Todo | TaskStatus::InProgress)
    }
}

/// A client organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub company_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub industry: Option<String>,
    pub billing_address: Option<String>,
    pub assigned_team: Vec<UserId>,
    pub status: ClientStatus,
    /// Creation time (Unix milliseconds).
    pub created_at: i64,
}

impl ScopedRecord for Client {
    fn owning_client(&self) -> &ClientId {
        &self.id
    }
}

/// Input for creating a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub company_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub industry: Option<String>,
    pub billing_address: Option<String>,
    #[serde(default)]
    pub assigned_team: Vec<UserId>,
}

impl NewClient {
    pub fn new(company_name: impl Into<String>, contact_email: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            contact_email: contact_email.into(),
            ..Self::default()
        }
    }

    /// Check required fields. Company name and contact email must be non-blank.
    pub fn validate(&self) -> Result<()> {
        require("company_name", &self.company_name)?;
        require("contact_email", &self.contact_email)
    }

    /// Materialize into a client record. New clients start onboarding.
    pub fn into_client(self, id: ClientId, created_at: i64) -> Result<Client> {
        self.validate()?;
        Ok(Client {
            id,
            company_name: self.company_name.trim().to_string(),
            contact_email: self.contact_email.trim().to_string(),
            contact_phone: self.contact_phone,
            industry: self.industry,
            billing_address: self.billing_address,
            assigned_team: self.assigned_team,
            status: ClientStatus::Onboarding,
            created_at,
        })
    }
}

/// Partial update of a client. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub company_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub industry: Option<String>,
    pub billing_address: Option<String>,
    pub assigned_team: Option<Vec<UserId>>,
    pub status: Option<ClientStatus>,
}

impl ClientUpdate {
    /// Apply to `client`, rejecting blank replacements for required fields.
    pub fn apply_to(self, client: &mut Client) -> Result<()> {
        if let Some(name) = self.company_name {
            require("company_name", &name)?;
            client.company_name = name.trim().to_string();
        }
        if let Some(email) = self.contact_email {
            require("contact_email", &email)?;
            client.contact_email = email.trim().to_string();
        }
        if self.contact_phone.is_some() {
            client.contact_phone = self.contact_phone;
        }
        if self.industry.is_some() {
            client.industry = self.industry;
        }
        if self.billing_address.is_some() {
            client.billing_address = self.billing_address;
        }
        if let Some(team) = self.assigned_team {
            client.assigned_team = team;
        }
        if let Some(status) = self.status {
            client.status = status;
        }
        Ok(())
    }
}

/// A project delivered to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub client_id: ClientId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ScopedRecord for Project {
    fn owning_client(&self) -> &ClientId {
        &self.client_id
    }
}

/// Input for creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            status: ProjectStatus::Planning,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    pub fn into_project(self, id: ProjectId, client_id: ClientId, now: i64) -> Result<Project> {
        require("name", &self.name)?;
        Ok(Project {
            id,
            client_id,
            name: self.name.trim().to_string(),
            description: self.description,
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: now,
            updated_at: now,
        })
    }
}

/// A unit of work within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub project_id: ProjectId,
    /// Denormalized from the parent project for ownership checks.
    pub client_id: ClientId,
    pub kind: ServiceKind,
    pub name: String,
    pub description: Option<String>,
    pub status: ServiceStatus,
    pub created_at: i64,
}

impl ScopedRecord for Service {
    fn owning_client(&self) -> &ClientId {
        &self.client_id
    }
}

/// Input for creating a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewService {
    pub kind: ServiceKind,
    pub name: String,
    pub description: Option<String>,
    pub status: ServiceStatus,
}

impl NewService {
    pub fn new(kind: ServiceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            status: ServiceStatus::Todo,
        }
    }

    pub fn with_status(mut self, status: ServiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn into_service(self, id: ServiceId, project: &Project, now: i64) -> Result<Service> {
        require("name", &self.name)?;
        Ok(Service {
            id,
            project_id: project.id.clone(),
            client_id: project.client_id.clone(),
            kind: self.kind,
            name: self.name.trim().to_string(),
            description: self.description,
            status: self.status,
            created_at: now,
        })
    }
}

/// A comment left on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskComment {
    pub author: UserId,
    pub body: String,
    pub at: i64,
}

/// A task within a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub service_id: ServiceId,
    pub client_id: ClientId,
    pub title: String,
    pub status: TaskStatus,
    /// Whether client users may see this task.
    pub client_visible: bool,
    pub comments: Vec<TaskComment>,
    pub created_at: i64,
}

impl ScopedRecord for Task {
    fn owning_client(&self) -> &ClientId {
        &self.client_id
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub status: TaskStatus,
    pub client_visible: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: TaskStatus::Todo,
            client_visible: false,
        }
    }

    pub fn visible_to_client(mut self) -> Self {
        self.client_visible = true;
        self
    }

    pub fn into_task(self, id: TaskId, service: &Service, now: i64) -> Result<Task> {
        require("title", &self.title)?;
        Ok(Task {
            id,
            service_id: service.id.clone(),
            client_id: service.client_id.clone(),
            title: self.title.trim().to_string(),
            status: self.status,
            client_visible: self.client_visible,
            comments: Vec::new(),
            created_at: now,
        })
    }
}

/// An invoice issued to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub client_id: ClientId,
    pub number: String,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
    pub created_at: i64,
}

impl ScopedRecord for Invoice {
    fn owning_client(&self) -> &ClientId {
        &self.client_id
    }
}

/// Labels of the checklist created for every new client.
pub const DEFAULT_CHECKLIST: [&str; 6] = [
    "Contract signed and uploaded",
    "Scope of work defined",
    "Payment plan established",
    "Team members assigned",
    "Initial project created",
    "Drive folder structure created",
];

/// A single onboarding step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    pub completed: bool,
}

/// Onboarding checklist of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingChecklist {
    pub client_id: ClientId,
    pub items: Vec<ChecklistItem>,
    pub status: ChecklistStatus,
}

impl OnboardingChecklist {
    /// Build a fresh checklist; item ids are 1-based positions.
    pub fn new<I, L>(client_id: ClientId, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let items = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| ChecklistItem {
                id: (i + 1).to_string(),
                label: label.into(),
                completed: false,
            })
            .collect();

        let mut checklist = Self {
            client_id,
            items,
            status: ChecklistStatus::InProgress,
        };
        checklist.refresh_status();
        checklist
    }

    /// Mark an item. Returns false if no item has that id.
    pub fn set_completed(&mut self, item_id: &str, completed: bool) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.id == item_id) else {
            return false;
        };
        item.completed = completed;
        self.refresh_status();
        true
    }

    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|i| i.completed).count()
    }

    fn refresh_status(&mut self) {
        let all_done = !self.items.is_empty() && self.items.iter().all(|i| i.completed);
        self.status = if all_done {
            ChecklistStatus::Completed
        } else {
            ChecklistStatus::InProgress
        };
    }
}

impl ScopedRecord for OnboardingChecklist {
    fn owning_client(&self) -> &ClientId {
        &self.client_id
    }
}

/// An entry in the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub user_id: UserId,
    pub action: ActivityAction,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub metadata: serde_json::Value,
    pub at: i64,
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CoreError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_requires_name_and_email() {
        assert_eq!(
            NewClient::new("", "a@b.c").validate(),
            Err(CoreError::MissingField("company_name"))
        );
        assert_eq!(
            NewClient::new("Acme", "   ").validate(),
            Err(CoreError::MissingField("contact_email"))
        );
        assert!(NewClient::new("Acme", "a@b.c").validate().is_ok());
    }

    #[test]
    fn test_new_client_starts_onboarding() {
        let client = NewClient::new(" Acme ", "ops@acme.test")
            .into_client(ClientId::from("c1"), 10)
            .unwrap();
        assert_eq!(client.status, ClientStatus::Onboarding);
        assert_eq!(client.company_name, "Acme");
    }

    #[test]
    fn test_client_update_rejects_blank_name() {
        let mut client = NewClient::new("Acme", "ops@acme.test")
            .into_client(ClientId::from("c1"), 10)
            .unwrap();
        let update = ClientUpdate {
            company_name: Some(" ".into()),
            ..ClientUpdate::default()
        };
        assert!(update.apply_to(&mut client).is_err());
        assert_eq!(client.company_name, "Acme");
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(ProjectStatus::InProgress.as_str(), "IN_PROGRESS");
        assert_eq!(
            "ON_HOLD".parse::<ProjectStatus>().unwrap(),
            ProjectStatus::OnHold
        );
        assert!(matches!(
            "DONE".parse::<ServiceStatus>(),
            Err(CoreError::UnknownStatus(_))
        ));
        assert_eq!(
            serde_json::to_string(&ActivityAction::CreatedClient).unwrap(),
            "\"CREATED_CLIENT\""
        );
    }

    #[test]
    fn test_default_checklist_items() {
        let checklist = OnboardingChecklist::new(ClientId::from("c1"), DEFAULT_CHECKLIST);
        assert_eq!(checklist.items.len(), 6);
        assert_eq!(checklist.items[0].id, "1");
        assert_eq!(checklist.items[5].label, "Drive folder structure created");
        assert_eq!(checklist.status, ChecklistStatus::InProgress);
    }

    #[test]
    fn test_checklist_completes_when_all_items_done() {
        let mut checklist = OnboardingChecklist::new(ClientId::from("c1"), ["a", "b"]);
        assert!(checklist.set_completed("1", true));
        assert_eq!(checklist.status, ChecklistStatus::InProgress);
        assert!(checklist.set_completed("2", true));
        assert_eq!(checklist.status, ChecklistStatus::Completed);
        assert!(checklist.set_completed("2", false));
        assert_eq!(checklist.status, ChecklistStatus::InProgress);
        assert!(!checklist.set_completed("9", true));
    }

    #[test]
    fn test_children_inherit_owning_client() {
        let project = NewProject::new("Site")
            .into_project(ProjectId::from("p1"), ClientId::from("c1"), 0)
            .unwrap();
        let service = NewService::new(ServiceKind::Website, "Build")
            .into_service(ServiceId::from("s1"), &project, 0)
            .unwrap();
        let task = NewTask::new("Wireframes")
            .into_task(TaskId::from("t1"), &service, 0)
            .unwrap();

        assert_eq!(service.owning_client(), &ClientId::from("c1"));
        assert_eq!(task.owning_client(), &ClientId::from("c1"));
    }
}
