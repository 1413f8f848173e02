//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use clientdesk_core::{
    ActivityEntry, Client, ClientId, ClientStatus, Invoice, OnboardingChecklist, Project,
    ProjectId, ProjectStatus, Service, ServiceId, ServiceStatus, Task, TaskId, TaskStatus,
};

use crate::error::{Result, StoreError};
use crate::traits::{ensure_checklist_owner, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records in insertion order; lookups scan.
    clients: Vec<Client>,
    projects: Vec<Project>,
    services: Vec<Service>,
    tasks: Vec<Task>,
    invoices: Vec<Invoice>,

    /// Checklists by owning client.
    checklists: HashMap<ClientId, OnboardingChecklist>,

    activity: Vec<ActivityEntry>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Newest first by `key`; among equal keys, later insertions first.
fn newest_first<T, F>(items: impl DoubleEndedIterator<Item = T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> i64,
{
    let mut out: Vec<T> = items.rev().collect();
    out.sort_by_key(|item| Reverse(key(item)));
    out
}

fn replace<T, F: Fn(&T) -> bool>(items: &mut [T], matches: F, value: T) -> bool {
    match items.iter_mut().find(|item| matches(item)) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

fn ensure_absent(exists: bool, what: &str, id: &str) -> Result<()> {
    if exists {
        return Err(StoreError::duplicate(what, id));
    }
    Ok(())
}

fn ensure_parent(exists: bool, what: &str, id: &str) -> Result<()> {
    if !exists {
        return Err(StoreError::missing_parent(what, id));
    }
    Ok(())
}

impl MemoryStoreInner {
    fn has_client(&self, id: &ClientId) -> bool {
        self.clients.iter().any(|c| &c.id == id)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_client(&self, client: &Client) -> Result<()> {
        let mut inner = self.write()?;
        ensure_absent(
            inner.has_client(&client.id),
            "client",
            client.id.as_str(),
        )?;
        inner.clients.push(client.clone());
        Ok(())
    }

    async fn insert_client_with_checklist(
        &self,
        client: &Client,
        checklist: &OnboardingChecklist,
    ) -> Result<()> {
        ensure_checklist_owner(client, checklist)?;
        let mut inner = self.write()?;
        ensure_absent(inner.has_client(&client.id), "client", client.id.as_str())?;
        inner.clients.push(client.clone());
        inner
            .checklists
            .insert(client.id.clone(), checklist.clone());
        Ok(())
    }

    async fn get_client(&self, id: &ClientId) -> Result<Option<Client>> {
        let inner = self.read()?;
        Ok(inner.clients.iter().find(|c| &c.id == id).cloned())
    }

    async fn update_client(&self, client: &Client) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(replace(&mut inner.clients, |c| c.id == client.id, client.clone()))
    }

    async fn delete_client(&self, id: &ClientId) -> Result<bool> {
        let mut inner = self.write()?;
        let before = inner.clients.len();
        inner.clients.retain(|c| &c.id != id);
        if inner.clients.len() == before {
            return Ok(false);
        }

        inner.projects.retain(|p| &p.client_id != id);
        inner.services.retain(|s| &s.client_id != id);
        inner.tasks.retain(|t| &t.client_id != id);
        inner.invoices.retain(|i| &i.client_id != id);
        inner.checklists.remove(id);
        Ok(true)
    }

    async fn list_clients(&self, only: Option<&ClientId>) -> Result<Vec<Client>> {
        let inner = self.read()?;
        let matching = inner
            .clients
            .iter()
            .filter(|c| only.map_or(true, |id| &c.id == id))
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(matching.into_iter(), |c| c.created_at))
    }

    async fn count_clients(&self, status: ClientStatus) -> Result<usize> {
        let inner = self.read()?;
        Ok(inner.clients.iter().filter(|c| c.status == status).count())
    }

    async fn insert_project(&self, project: &Project) -> Result<()> {
        let mut inner = self.write()?;
        ensure_absent(
            inner.projects.iter().any(|p| p.id == project.id),
            "project",
            project.id.as_str(),
        )?;
        ensure_parent(
            inner.has_client(&project.client_id),
            "project",
            project.id.as_str(),
        )?;
        inner.projects.push(project.clone());
        Ok(())
    }

    async fn touch_project(&self, id: &ProjectId, at: i64) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.projects.iter_mut().find(|p| &p.id == id) {
            Some(project) => {
                project.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        let inner = self.read()?;
        Ok(inner.projects.iter().find(|p| &p.id == id).cloned())
    }

    async fn list_projects(&self, client_id: &ClientId) -> Result<Vec<Project>> {
        let inner = self.read()?;
        let matching = inner
            .projects
            .iter()
            .filter(|p| &p.client_id == client_id)
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(matching.into_iter(), |p| p.created_at))
    }

    async fn recent_projects(&self, limit: usize) -> Result<Vec<Project>> {
        let inner = self.read()?;
        let mut projects = newest_first(inner.projects.iter().cloned(), |p| p.updated_at);
        projects.truncate(limit);
        Ok(projects)
    }

    async fn count_projects(&self, status: ProjectStatus) -> Result<usize> {
        let inner = self.read()?;
        Ok(inner.projects.iter().filter(|p| p.status == status).count())
    }

    async fn insert_service(&self, service: &Service) -> Result<()> {
        let mut inner = self.write()?;
        ensure_absent(
            inner.services.iter().any(|s| s.id == service.id),
            "service",
            service.id.as_str(),
        )?;
        ensure_parent(
            inner.projects.iter().any(|p| p.id == service.project_id),
            "service",
            service.id.as_str(),
        )?;
        inner.services.push(service.clone());
        Ok(())
    }

    async fn get_service(&self, id: &ServiceId) -> Result<Option<Service>> {
        let inner = self.read()?;
        Ok(inner.services.iter().find(|s| &s.id == id).cloned())
    }

    async fn update_service(&self, service: &Service) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(replace(&mut inner.services, |s| s.id == service.id, service.clone()))
    }

    async fn list_services(&self, project_id: &ProjectId) -> Result<Vec<Service>> {
        let inner = self.read()?;
        let matching = inner
            .services
            .iter()
            .filter(|s| &s.project_id == project_id)
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(matching.into_iter(), |s| s.created_at))
    }

    async fn list_client_services(&self, client_id: &ClientId) -> Result<Vec<Service>> {
        let inner = self.read()?;
        let matching = inner
            .services
            .iter()
            .filter(|s| &s.client_id == client_id)
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(matching.into_iter(), |s| s.created_at))
    }

    async fn count_services(&self, status: ServiceStatus) -> Result<usize> {
        let inner = self.read()?;
        Ok(inner.services.iter().filter(|s| s.status == status).count())
    }

    async fn insert_task(&self, task: &Task) -> Result<()> {
        let mut inner = self.write()?;
        ensure_absent(
            inner.tasks.iter().any(|t| t.id == task.id),
            "task",
            task.id.as_str(),
        )?;
        ensure_parent(
            inner.services.iter().any(|s| s.id == task.service_id),
            "task",
            task.id.as_str(),
        )?;
        inner.tasks.push(task.clone());
        Ok(())
    }

    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        let inner = self.read()?;
        Ok(inner.tasks.iter().find(|t| &t.id == id).cloned())
    }

    async fn update_task(&self, task: &Task) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(replace(&mut inner.tasks, |t| t.id == task.id, task.clone()))
    }

    async fn list_tasks(&self, service_id: &ServiceId) -> Result<Vec<Task>> {
        let inner = self.read()?;
        let matching = inner
            .tasks
            .iter()
            .filter(|t| &t.service_id == service_id)
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(matching.into_iter(), |t| t.created_at))
    }

    async fn count_tasks(&self, statuses: &[TaskStatus]) -> Result<usize> {
        let inner = self.read()?;
        Ok(inner
            .tasks
            .iter()
            .filter(|t| statuses.contains(&t.status))
            .count())
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<()> {
        let mut inner = self.write()?;
        ensure_absent(
            inner.invoices.iter().any(|i| i.id == invoice.id),
            "invoice",
            invoice.id.as_str(),
        )?;
        ensure_parent(
            inner.has_client(&invoice.client_id),
            "invoice",
            invoice.id.as_str(),
        )?;
        inner.invoices.push(invoice.clone());
        Ok(())
    }

    async fn list_invoices(
        &self,
        client_id: &ClientId,
        limit: Option<usize>,
    ) -> Result<Vec<Invoice>> {
        let inner = self.read()?;
        let matching = inner
            .invoices
            .iter()
            .filter(|i| &i.client_id == client_id)
            .cloned()
            .collect::<Vec<_>>();
        let mut invoices = newest_first(matching.into_iter(), |i| i.created_at);
        if let Some(limit) = limit {
            invoices.truncate(limit);
        }
        Ok(invoices)
    }

    async fn put_checklist(&self, checklist: &OnboardingChecklist) -> Result<()> {
        let mut inner = self.write()?;
        ensure_parent(
            inner.has_client(&checklist.client_id),
            "checklist",
            checklist.client_id.as_str(),
        )?;
        inner
            .checklists
            .insert(checklist.client_id.clone(), checklist.clone());
        Ok(())
    }

    async fn get_checklist(&self, client_id: &ClientId) -> Result<Option<OnboardingChecklist>> {
        let inner = self.read()?;
        Ok(inner.checklists.get(client_id).cloned())
    }

    async fn append_activity(&self, entry: &ActivityEntry) -> Result<()> {
        let mut inner = self.write()?;
        inner.activity.push(entry.clone());
        Ok(())
    }

    async fn list_activity(&self, entity_id: Option<&str>) -> Result<Vec<ActivityEntry>> {
        let inner = self.read()?;
        Ok(inner
            .activity
            .iter()
            .filter(|e| entity_id.map_or(true, |id| e.entity_id == id))
            .cloned()
            .collect())
    }
}
