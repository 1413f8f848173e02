//! Store trait: the abstract interface for record persistence.
//!
//! This trait allows the portal to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use clientdesk_core::{
    ActivityEntry, Client, ClientId, ClientStatus, Invoice, OnboardingChecklist, Project,
    ProjectId, ProjectStatus, Service, ServiceId, ServiceStatus, Task, TaskId, TaskStatus,
};

use crate::error::{Result, StoreError};

/// The Store trait: async interface for record persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, blocking work runs on `spawn_blocking`.
///
/// # Design Notes
///
/// - **No authorization**: callers check permissions before calling in.
/// - **Upserts return existence**: `update_*` returns `false` when the
///   record did not exist, rather than inserting it.
/// - **Ordering**: `list_*` returns newest first unless noted.
/// - **Parents**: inserting a child whose owning record is missing fails
///   with `NotFound`; a duplicate id fails with `InvalidData`.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Clients
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_client(&self, client: &Client) -> Result<()>;

    /// Insert a client and its onboarding checklist as one unit. On error
    /// neither is stored.
    async fn insert_client_with_checklist(
        &self,
        client: &Client,
        checklist: &OnboardingChecklist,
    ) -> Result<()>;

    async fn get_client(&self, id: &ClientId) -> Result<Option<Client>>;

    /// Replace a stored client. Returns `false` if it does not exist.
    async fn update_client(&self, client: &Client) -> Result<bool>;

    /// Delete a client and every record it owns. Returns `false` if absent.
    async fn delete_client(&self, id: &ClientId) -> Result<bool>;

    /// List clients, optionally restricted to a single id.
    async fn list_clients(&self, only: Option<&ClientId>) -> Result<Vec<Client>>;

    async fn count_clients(&self, status: ClientStatus) -> Result<usize>;

    // ─────────────────────────────────────────────────────────────────────────
    // Projects
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_project(&self, project: &Project) -> Result<()>;

    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>>;

    async fn list_projects(&self, client_id: &ClientId) -> Result<Vec<Project>>;

    /// Most recently updated projects across all clients.
    async fn recent_projects(&self, limit: usize) -> Result<Vec<Project>>;

    async fn count_projects(&self, status: ProjectStatus) -> Result<usize>;

    /// Set a project's `updated_at`. Returns `false` if it does not exist.
    async fn touch_project(&self, id: &ProjectId, at: i64) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_service(&self, service: &Service) -> Result<()>;

    async fn get_service(&self, id: &ServiceId) -> Result<Option<Service>>;

    async fn update_service(&self, service: &Service) -> Result<bool>;

    async fn list_services(&self, project_id: &ProjectId) -> Result<Vec<Service>>;

    /// Every service across all projects of a client.
    async fn list_client_services(&self, client_id: &ClientId) -> Result<Vec<Service>>;

    async fn count_services(&self, status: ServiceStatus) -> Result<usize>;

    // ─────────────────────────────────────────────────────────────────────────
    // Tasks
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_task(&self, task: &Task) -> Result<()>;

    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>>;

    async fn update_task(&self, task: &Task) -> Result<bool>;

    async fn list_tasks(&self, service_id: &ServiceId) -> Result<Vec<Task>>;

    /// Count tasks whose status is any of `statuses`.
    async fn count_tasks(&self, statuses: &[TaskStatus]) -> Result<usize>;

    // ─────────────────────────────────────────────────────────────────────────
    // Invoices
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<()>;

    /// Invoices of a client, newest first, at most `limit` if given.
    async fn list_invoices(&self, client_id: &ClientId, limit: Option<usize>)
        -> Result<Vec<Invoice>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Onboarding
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or replace the checklist of a client.
    async fn put_checklist(&self, checklist: &OnboardingChecklist) -> Result<()>;

    async fn get_checklist(&self, client_id: &ClientId) -> Result<Option<OnboardingChecklist>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Activity log
    // ─────────────────────────────────────────────────────────────────────────

    async fn append_activity(&self, entry: &ActivityEntry) -> Result<()>;

    /// Activity entries, oldest first, optionally for one entity.
    async fn list_activity(&self, entity_id: Option<&str>) -> Result<Vec<ActivityEntry>>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Fetch a client or fail with `NotFound`.
    fn require_client(
        &self,
        id: &ClientId,
    ) -> impl std::future::Future<Output = Result<Client>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn require_client(&self, id: &ClientId) -> Result<Client> {
        self.get_client(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("client {}", id)))
    }
}

/// A checklist may only be stored alongside the client it belongs to.
pub(crate) fn ensure_checklist_owner(
    client: &Client,
    checklist: &OnboardingChecklist,
) -> Result<()> {
    if checklist.client_id != client.id {
        return Err(StoreError::InvalidData(format!(
            "checklist for {} attached to client {}",
            checklist.client_id, client.id
        )));
    }
    Ok(())
}
