//! The Portal: authorized access to client records.
//!
//! Every operation takes the caller as `Option<&Subject>` and runs the same
//! sequence before touching a record: authenticated, granted by the table,
//! then confined to the subject's own client. Only then does it read or
//! write through the store.

use std::sync::Arc;

use serde_json::json;

use clientdesk_core::{
    now_millis, ActivityAction, ActivityEntry, ChecklistProgress, Client, ClientId,
    ClientProgress, ClientStatus, ClientUpdate, CoreError, EntityKind, Invoice, NewClient,
    NewProject, NewService, NewTask, OnboardingChecklist, Permission, Project, ProjectId,
    ProjectStatus, Resource, Role, ScopedRecord, Service, ServiceId, ServiceStatus, Subject,
    Task, TaskComment, TaskId, TaskStatus,
};
use clientdesk_perms::{check_assignment, visible_client_filter, AccessDenied, Authorizer};
use clientdesk_store::{Store, StoreError, StoreExt};

use crate::config::PortalConfig;
use crate::error::{PortalError, Result};
use crate::views::{ClientDetail, ClientOverview, DashboardStats, ProjectWithServices};

/// The main Portal struct.
///
/// Holds the store, the authorizer and configuration. Stateless between
/// requests; cheap to share behind an `Arc`.
pub struct Portal<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Permission table lookups.
    authz: Authorizer,
    /// Configuration.
    config: PortalConfig,
}

impl<S: Store> Portal<S> {
    /// Create a portal over the standard permission table.
    pub fn new(store: S, config: PortalConfig) -> Self {
        Self::with_authorizer(store, Authorizer::standard(), config)
    }

    /// Create a portal with a custom authorizer.
    pub fn with_authorizer(store: S, authz: Authorizer, config: PortalConfig) -> Self {
        Self {
            store: Arc::new(store),
            authz,
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn authorizer(&self) -> Authorizer {
        self.authz
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Access checks
    // ─────────────────────────────────────────────────────────────────────────

    fn authenticated<'a>(&self, subject: Option<&'a Subject>) -> Result<&'a Subject> {
        subject.ok_or_else(|| {
            tracing::warn!("rejected unauthenticated request");
            PortalError::Unauthenticated
        })
    }

    /// Authenticate and check the table.
    fn require<'a>(
        &self,
        subject: Option<&'a Subject>,
        resource: Resource,
        permission: Permission,
    ) -> Result<&'a Subject> {
        let subject = self.authenticated(subject)?;
        self.authz
            .authorize(subject, resource, permission)
            .map_err(|e| denied(subject, e))?;
        Ok(subject)
    }

    /// Table check followed by ownership narrowing against `record`.
    fn require_record<R: ScopedRecord + ?Sized>(
        &self,
        subject: &Subject,
        resource: Resource,
        permission: Permission,
        record: &R,
    ) -> Result<()> {
        self.authz
            .authorize_record(subject, resource, permission, record)
            .map_err(|e| denied(subject, e))
    }

    /// Confine team members to assigned clients when configured.
    async fn ensure_assigned(&self, subject: &Subject, client_id: &ClientId) -> Result<()> {
        if !self.config.enforce_team_assignment || subject.role() != Role::TeamMember {
            return Ok(());
        }
        let client = self.load_client(client_id).await?;
        check_assignment(subject, &client).map_err(|e| denied(subject, e))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────────────────

    async fn load_client(&self, id: &ClientId) -> Result<Client> {
        self.store.require_client(id).await.map_err(|e| match e {
            StoreError::NotFound(what) => PortalError::NotFound(what),
            other => other.into(),
        })
    }

    async fn load_project(&self, id: &ProjectId) -> Result<Project> {
        self.store
            .get_project(id)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("project {}", id)))
    }

    async fn load_service(&self, id: &ServiceId) -> Result<Service> {
        self.store
            .get_service(id)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("service {}", id)))
    }

    async fn load_task(&self, id: &TaskId) -> Result<Task> {
        self.store
            .get_task(id)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("task {}", id)))
    }

    async fn record_activity(
        &self,
        subject: &Subject,
        action: ActivityAction,
        entity_kind: EntityKind,
        entity_id: &str,
        metadata: serde_json::Value,
    ) -> Result<()> {
        let entry = ActivityEntry {
            user_id: subject.user_id().clone(),
            action,
            entity_kind,
            entity_id: entity_id.to_string(),
            metadata,
            at: now_millis(),
        };
        self.store.append_activity(&entry).await?;
        Ok(())
    }

    /// Bump a project's `updated_at` after work under it changed.
    async fn touch_project(&self, id: &ProjectId) -> Result<()> {
        self.store.touch_project(id, now_millis()).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Clients
    // ─────────────────────────────────────────────────────────────────────────

    /// List clients with their progress. Scoped subjects see only their own.
    #[tracing::instrument(skip_all)]
    pub async fn list_clients(&self, subject: Option<&Subject>) -> Result<Vec<ClientOverview>> {
        let subject = self.require(subject, Resource::Clients, Permission::View)?;

        let clients = self
            .store
            .list_clients(visible_client_filter(subject))
            .await?;

        let mut overviews = Vec::with_capacity(clients.len());
        for client in clients {
            let projects = self.store.list_projects(&client.id).await?;
            let services = self.store.list_client_services(&client.id).await?;
            overviews.push(ClientOverview {
                project_count: projects.len(),
                progress: ClientProgress::compute(&projects, &services),
                client,
            });
        }
        Ok(overviews)
    }

    /// Full detail of one client.
    ///
    /// Ownership is checked against the requested id before the lookup, so a
    /// scoped subject cannot learn whether other clients exist.
    #[tracing::instrument(skip_all, fields(client = %id))]
    pub async fn get_client(&self, subject: Option<&Subject>, id: &ClientId) -> Result<ClientDetail> {
        let subject = self.authenticated(subject)?;
        self.require_record(subject, Resource::Clients, Permission::View, id)?;

        let client = self.load_client(id).await?;

        let mut projects = Vec::new();
        let mut all_services = Vec::new();
        let project_records = self.store.list_projects(id).await?;
        for project in &project_records {
            let services = self.store.list_services(&project.id).await?;
            all_services.extend(services.iter().cloned());
            projects.push(ProjectWithServices {
                project: project.clone(),
                services,
            });
        }

        let checklist = self.store.get_checklist(id).await?;
        let checklist_progress = checklist.as_ref().map(ChecklistProgress::compute);

        let recent_invoices = if self.authz.can_view(subject.role(), Resource::Finance) {
            self.store
                .list_invoices(id, Some(self.config.recent_invoices_limit))
                .await?
        } else {
            Vec::new()
        };

        Ok(ClientDetail {
            progress: ClientProgress::compute(&project_records, &all_services),
            client,
            projects,
            checklist,
            checklist_progress,
            recent_invoices,
        })
    }

    /// Create a client with its onboarding checklist.
    pub async fn create_client(&self, subject: Option<&Subject>, new: NewClient) -> Result<Client> {
        let subject = self.require(subject, Resource::Clients, Permission::Create)?;

        let client = new.into_client(ClientId::generate(), now_millis())?;
        let checklist = OnboardingChecklist::new(
            client.id.clone(),
            self.config.default_checklist.iter().cloned(),
        );
        self.store
            .insert_client_with_checklist(&client, &checklist)
            .await?;

        self.record_activity(
            subject,
            ActivityAction::CreatedClient,
            EntityKind::Client,
            client.id.as_str(),
            json!({ "companyName": client.company_name }),
        )
        .await?;

        tracing::info!(client = %client.id, user = %subject.user_id(), "created client");
        Ok(client)
    }

    pub async fn update_client(
        &self,
        subject: Option<&Subject>,
        id: &ClientId,
        update: ClientUpdate,
    ) -> Result<Client> {
        let subject = self.authenticated(subject)?;
        self.require_record(subject, Resource::Clients, Permission::Edit, id)?;
        self.ensure_assigned(subject, id).await?;

        let mut client = self.load_client(id).await?;
        update.apply_to(&mut client)?;
        if !self.store.update_client(&client).await? {
            return Err(PortalError::NotFound(format!("client {}", id)));
        }

        self.record_activity(
            subject,
            ActivityAction::UpdatedClient,
            EntityKind::Client,
            id.as_str(),
            json!({ "status": client.status }),
        )
        .await?;

        tracing::info!(client = %id, user = %subject.user_id(), "updated client");
        Ok(client)
    }

    /// Delete a client and everything it owns.
    pub async fn delete_client(&self, subject: Option<&Subject>, id: &ClientId) -> Result<()> {
        let subject = self.authenticated(subject)?;
        self.require_record(subject, Resource::Clients, Permission::Delete, id)?;
        self.ensure_assigned(subject, id).await?;

        if !self.store.delete_client(id).await? {
            return Err(PortalError::NotFound(format!("client {}", id)));
        }

        self.record_activity(
            subject,
            ActivityAction::DeletedClient,
            EntityKind::Client,
            id.as_str(),
            serde_json::Value::Null,
        )
        .await?;

        tracing::info!(client = %id, user = %subject.user_id(), "deleted client");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Projects
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_project(
        &self,
        subject: Option<&Subject>,
        client_id: &ClientId,
        new: NewProject,
    ) -> Result<Project> {
        let subject = self.authenticated(subject)?;
        self.require_record(subject, Resource::Projects, Permission::Create, client_id)?;
        self.ensure_assigned(subject, client_id).await?;

        let client = self.load_client(client_id).await?;
        let project = new.into_project(ProjectId::generate(), client.id, now_millis())?;
        self.store.insert_project(&project).await?;

        self.record_activity(
            subject,
            ActivityAction::CreatedProject,
            EntityKind::Project,
            project.id.as_str(),
            json!({ "name": project.name, "clientId": project.client_id }),
        )
        .await?;

        tracing::info!(project = %project.id, client = %project.client_id, "created project");
        Ok(project)
    }

    pub async fn get_project(&self, subject: Option<&Subject>, id: &ProjectId) -> Result<Project> {
        let subject = self.require(subject, Resource::Projects, Permission::View)?;
        let project = self.load_project(id).await?;
        self.require_record(subject, Resource::Projects, Permission::View, &project)?;
        Ok(project)
    }

    /// Projects of one client, newest first.
    pub async fn list_projects(
        &self,
        subject: Option<&Subject>,
        client_id: &ClientId,
    ) -> Result<Vec<Project>> {
        let subject = self.authenticated(subject)?;
        self.require_record(subject, Resource::Projects, Permission::View, client_id)?;

        let client = self.load_client(client_id).await?;
        Ok(self.store.list_projects(&client.id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_service(
        &self,
        subject: Option<&Subject>,
        project_id: &ProjectId,
        new: NewService,
    ) -> Result<Service> {
        let subject = self.require(subject, Resource::Services, Permission::Create)?;
        let project = self.load_project(project_id).await?;
        self.require_record(subject, Resource::Services, Permission::Create, &project)?;
        self.ensure_assigned(subject, &project.client_id).await?;

        let service = new.into_service(ServiceId::generate(), &project, now_millis())?;
        self.store.insert_service(&service).await?;
        self.touch_project(&project.id).await?;

        self.record_activity(
            subject,
            ActivityAction::CreatedService,
            EntityKind::Service,
            service.id.as_str(),
            json!({ "name": service.name, "kind": service.kind }),
        )
        .await?;

        tracing::info!(service = %service.id, project = %project.id, "created service");
        Ok(service)
    }

    pub async fn update_service_status(
        &self,
        subject: Option<&Subject>,
        id: &ServiceId,
        status: ServiceStatus,
    ) -> Result<Service> {
        let subject = self.require(subject, Resource::Services, Permission::Edit)?;
        let mut service = self.load_service(id).await?;
        self.require_record(subject, Resource::Services, Permission::Edit, &service)?;
        self.ensure_assigned(subject, &service.client_id).await?;

        let previous = service.status;
        service.status = status;
        if !self.store.update_service(&service).await? {
            return Err(PortalError::NotFound(format!("service {}", id)));
        }
        self.touch_project(&service.project_id).await?;

        self.record_activity(
            subject,
            ActivityAction::UpdatedServiceStatus,
            EntityKind::Service,
            id.as_str(),
            json!({ "from": previous, "to": status }),
        )
        .await?;

        tracing::info!(service = %id, from = %previous, to = %status, "updated service status");
        Ok(service)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tasks
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_task(
        &self,
        subject: Option<&Subject>,
        service_id: &ServiceId,
        new: NewTask,
    ) -> Result<Task> {
        let subject = self.require(subject, Resource::Tasks, Permission::Create)?;
        let service = self.load_service(service_id).await?;
        self.require_record(subject, Resource::Tasks, Permission::Create, &service)?;
        self.ensure_assigned(subject, &service.client_id).await?;

        let task = new.into_task(TaskId::generate(), &service, now_millis())?;
        self.store.insert_task(&task).await?;
        self.touch_project(&service.project_id).await?;

        self.record_activity(
            subject,
            ActivityAction::CreatedTask,
            EntityKind::Task,
            task.id.as_str(),
            json!({ "title": task.title, "serviceId": task.service_id }),
        )
        .await?;

        tracing::info!(task = %task.id, service = %service.id, "created task");
        Ok(task)
    }

    /// Tasks of a service. Scoped subjects only see client-visible tasks.
    pub async fn list_tasks(
        &self,
        subject: Option<&Subject>,
        service_id: &ServiceId,
    ) -> Result<Vec<Task>> {
        let subject = self.require(subject, Resource::Tasks, Permission::View)?;
        let service = self.load_service(service_id).await?;
        self.require_record(subject, Resource::Tasks, Permission::View, &service)?;

        let mut tasks = self.store.list_tasks(service_id).await?;
        if subject.scope().is_some() {
            tasks.retain(|t| t.client_visible);
        }
        Ok(tasks)
    }

    pub async fn comment_on_task(
        &self,
        subject: Option<&Subject>,
        task_id: &TaskId,
        body: &str,
    ) -> Result<Task> {
        let subject = self.require(subject, Resource::Tasks, Permission::Comment)?;
        let mut task = self.load_task(task_id).await?;
        self.require_record(subject, Resource::Tasks, Permission::Comment, &task)?;
        // Hidden tasks do not exist as far as scoped subjects can tell.
        if subject.scope().is_some() && !task.client_visible {
            return Err(PortalError::NotFound(format!("task {}", task_id)));
        }
        self.ensure_assigned(subject, &task.client_id).await?;

        let body = body.trim();
        if body.is_empty() {
            return Err(CoreError::MissingField("body").into());
        }
        task.comments.push(TaskComment {
            author: subject.user_id().clone(),
            body: body.to_string(),
            at: now_millis(),
        });
        if !self.store.update_task(&task).await? {
            return Err(PortalError::NotFound(format!("task {}", task_id)));
        }
        if let Some(service) = self.store.get_service(&task.service_id).await? {
            self.touch_project(&service.project_id).await?;
        }

        self.record_activity(
            subject,
            ActivityAction::CommentedTask,
            EntityKind::Task,
            task_id.as_str(),
            serde_json::Value::Null,
        )
        .await?;

        tracing::info!(task = %task_id, user = %subject.user_id(), "commented on task");
        Ok(task)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Finance and onboarding
    // ─────────────────────────────────────────────────────────────────────────

    /// All invoices of a client, newest first.
    pub async fn list_invoices(
        &self,
        subject: Option<&Subject>,
        client_id: &ClientId,
    ) -> Result<Vec<Invoice>> {
        let subject = self.authenticated(subject)?;
        self.require_record(subject, Resource::Finance, Permission::View, client_id)?;

        let client = self.load_client(client_id).await?;
        Ok(self.store.list_invoices(&client.id, None).await?)
    }

    pub async fn toggle_checklist_item(
        &self,
        subject: Option<&Subject>,
        client_id: &ClientId,
        item_id: &str,
        completed: bool,
    ) -> Result<OnboardingChecklist> {
        let subject = self.authenticated(subject)?;
        self.require_record(subject, Resource::Clients, Permission::Edit, client_id)?;
        self.ensure_assigned(subject, client_id).await?;

        let mut checklist = self
            .store
            .get_checklist(client_id)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("checklist of client {}", client_id)))?;
        if !checklist.set_completed(item_id, completed) {
            return Err(PortalError::NotFound(format!("checklist item {}", item_id)));
        }
        self.store.put_checklist(&checklist).await?;

        self.record_activity(
            subject,
            ActivityAction::UpdatedChecklist,
            EntityKind::Checklist,
            client_id.as_str(),
            json!({ "itemId": item_id, "completed": completed }),
        )
        .await?;

        tracing::info!(client = %client_id, item = item_id, completed, "updated checklist");
        Ok(checklist)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Analytics
    // ─────────────────────────────────────────────────────────────────────────

    /// Agency-wide counters. Client users are refused by the table.
    #[tracing::instrument(skip_all)]
    pub async fn dashboard(&self, subject: Option<&Subject>) -> Result<DashboardStats> {
        self.require(subject, Resource::Analytics, Permission::View)?;

        Ok(DashboardStats {
            active_clients: self.store.count_clients(ClientStatus::Active).await?,
            active_projects: self.store.count_projects(ProjectStatus::InProgress).await?,
            completed_services: self.store.count_services(ServiceStatus::Completed).await?,
            pending_tasks: self
                .store
                .count_tasks(&[TaskStatus::Todo, TaskStatus::InProgress])
                .await?,
            recent_projects: self
                .store
                .recent_projects(self.config.recent_projects_limit)
                .await?,
        })
    }
}

fn denied(subject: &Subject, err: AccessDenied) -> PortalError {
    tracing::warn!(
        user = %subject.user_id(),
        role = %subject.role(),
        reason = %err,
        "access denied"
    );
    PortalError::Forbidden(err)
}
