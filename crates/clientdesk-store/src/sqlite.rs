//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{ffi, params, params_from_iter, Connection, OptionalExtension, Params, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;

use clientdesk_core::{
    ActivityEntry, ChecklistStatus, Client, ClientId, ClientStatus, CoreError, Invoice,
    OnboardingChecklist, Project, ProjectId, ProjectStatus, Service, ServiceId, ServiceStatus,
    Task, TaskId, TaskStatus,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ensure_checklist_owner, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row helpers
// ─────────────────────────────────────────────────────────────────────────────

fn conversion_error(column: &str, ty: Type, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        ty,
        Box::new(StoreError::InvalidData(format!("{}: {}", column, message))),
    )
}

fn parse_column<T: FromStr<Err = CoreError>>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    let text: String = row.get(column)?;
    text.parse()
        .map_err(|e: CoreError| conversion_error(column, Type::Text, e.to_string()))
}

fn cbor_column<T: DeserializeOwned>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    let bytes: Vec<u8> = row.get(column)?;
    ciborium::from_reader(bytes.as_slice())
        .map_err(|e| conversion_error(column, Type::Blob, e.to_string()))
}

fn encode_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Map key violations to the errors the memory store reports.
fn insert_error(what: &str, id: &str, err: rusqlite::Error) -> StoreError {
    let code = match &err {
        rusqlite::Error::SqliteFailure(e, _) => Some(e.extended_code),
        _ => None,
    };
    match code {
        Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE) => {
            StoreError::duplicate(what, id)
        }
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => StoreError::missing_parent(what, id),
        _ => StoreError::Database(err),
    }
}

fn insert_client_row(conn: &Connection, client: &Client, team: &[u8]) -> Result<()> {
    conn.execute(
        "INSERT INTO clients (id, company_name, contact_email, contact_phone, industry,
            billing_address, assigned_team, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            client.id.as_str(),
            client.company_name,
            client.contact_email,
            client.contact_phone,
            client.industry,
            client.billing_address,
            team,
            client.status.as_str(),
            client.created_at,
        ],
    )
    .map_err(|e| insert_error("client", client.id.as_str(), e))?;
    Ok(())
}

fn upsert_checklist_row(
    conn: &Connection,
    client_id: &ClientId,
    items: &[u8],
    status: ChecklistStatus,
) -> Result<()> {
    conn.execute(
        "INSERT INTO onboarding_checklists (client_id, items, status)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(client_id) DO UPDATE SET items = excluded.items,
            status = excluded.status",
        params![client_id.as_str(), items, status.as_str()],
    )
    .map_err(|e| insert_error("checklist", client_id.as_str(), e))?;
    Ok(())
}

fn query_all<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, map)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn query_count<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<usize> {
    let count: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(count as usize)
}

fn row_to_client(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: ClientId::new(row.get::<_, String>("id")?),
        company_name: row.get("company_name")?,
        contact_email: row.get("contact_email")?,
        contact_phone: row.get("contact_phone")?,
        industry: row.get("industry")?,
        billing_address: row.get("billing_address")?,
        assigned_team: cbor_column(row, "assigned_team")?,
        status: parse_column(row, "status")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: ProjectId::new(row.get::<_, String>("id")?),
        client_id: ClientId::new(row.get::<_, String>("client_id")?),
        name: row.get("name")?,
        description: row.get("description")?,
        status: parse_column(row, "status")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_service(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: ServiceId::new(row.get::<_, String>("id")?),
        project_id: ProjectId::new(row.get::<_, String>("project_id")?),
        client_id: ClientId::new(row.get::<_, String>("client_id")?),
        kind: parse_column(row, "kind")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: parse_column(row, "status")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: TaskId::new(row.get::<_, String>("id")?),
        service_id: ServiceId::new(row.get::<_, String>("service_id")?),
        client_id: ClientId::new(row.get::<_, String>("client_id")?),
        title: row.get("title")?,
        status: parse_column(row, "status")?,
        client_visible: row.get("client_visible")?,
        comments: cbor_column(row, "comments")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_invoice(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        id: row.get::<_, String>("id")?.into(),
        client_id: ClientId::new(row.get::<_, String>("client_id")?),
        number: row.get("number")?,
        amount_cents: row.get("amount_cents")?,
        status: parse_column(row, "status")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_checklist(row: &Row<'_>) -> rusqlite::Result<OnboardingChecklist> {
    Ok(OnboardingChecklist {
        client_id: ClientId::new(row.get::<_, String>("client_id")?),
        items: cbor_column(row, "items")?,
        status: parse_column(row, "status")?,
    })
}

fn row_to_activity(row: &Row<'_>) -> rusqlite::Result<ActivityEntry> {
    let metadata: String = row.get("metadata")?;
    Ok(ActivityEntry {
        user_id: row.get::<_, String>("user_id")?.into(),
        action: parse_column(row, "action")?,
        entity_kind: parse_column(row, "entity_kind")?,
        entity_id: row.get("entity_id")?,
        metadata: serde_json::from_str(&metadata)
            .map_err(|e| conversion_error("metadata", Type::Text, e.to_string()))?,
        at: row.get("at")?,
    })
}

const CLIENT_COLUMNS: &str = "id, company_name, contact_email, contact_phone, industry, \
     billing_address, assigned_team, status, created_at";
const PROJECT_COLUMNS: &str =
    "id, client_id, name, description, status, start_date, end_date, created_at, updated_at";
const SERVICE_COLUMNS: &str =
    "id, project_id, client_id, kind, name, description, status, created_at";
const TASK_COLUMNS: &str =
    "id, service_id, client_id, title, status, client_visible, comments, created_at";

#[async_trait]
impl Store for SqliteStore {
    // ─────────────────────────────────────────────────────────────────────────
    // Clients
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_client(&self, client: &Client) -> Result<()> {
        let client = client.clone();
        let team = encode_cbor(&client.assigned_team)?;

        self.run(move |conn| insert_client_row(conn, &client, &team)).await
    }

    async fn insert_client_with_checklist(
        &self,
        client: &Client,
        checklist: &OnboardingChecklist,
    ) -> Result<()> {
        ensure_checklist_owner(client, checklist)?;
        let client = client.clone();
        let team = encode_cbor(&client.assigned_team)?;
        let items = encode_cbor(&checklist.items)?;
        let status = checklist.status;

        self.run(move |conn| {
            let tx = conn.transaction()?;
            insert_client_row(&tx, &client, &team)?;
            upsert_checklist_row(&tx, &client.id, &items, status)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_client(&self, id: &ClientId) -> Result<Option<Client>> {
        let id = id.clone();
        self.run(move |conn| {
            let sql = format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS);
            Ok(conn
                .query_row(&sql, params![id.as_str()], row_to_client)
                .optional()?)
        })
        .await
    }

    async fn update_client(&self, client: &Client) -> Result<bool> {
        let client = client.clone();
        let team = encode_cbor(&client.assigned_team)?;

        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE clients SET company_name = ?2, contact_email = ?3, contact_phone = ?4,
                    industry = ?5, billing_address = ?6, assigned_team = ?7, status = ?8
                 WHERE id = ?1",
                params![
                    client.id.as_str(),
                    client.company_name,
                    client.contact_email,
                    client.contact_phone,
                    client.industry,
                    client.billing_address,
                    team,
                    client.status.as_str(),
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete_client(&self, id: &ClientId) -> Result<bool> {
        let id = id.clone();
        self.run(move |conn| {
            // Children cascade through foreign keys.
            let changed = conn.execute("DELETE FROM clients WHERE id = ?1", params![id.as_str()])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn list_clients(&self, only: Option<&ClientId>) -> Result<Vec<Client>> {
        let only = only.map(|id| id.as_str().to_string());
        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM clients WHERE (?1 IS NULL OR id = ?1)
                 ORDER BY created_at DESC, rowid DESC",
                CLIENT_COLUMNS
            );
            query_all(conn, &sql, params![only], row_to_client)
        })
        .await
    }

    async fn count_clients(&self, status: ClientStatus) -> Result<usize> {
        self.run(move |conn| {
            query_count(
                conn,
                "SELECT COUNT(*) FROM clients WHERE status = ?1",
                params![status.as_str()],
            )
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Projects
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_project(&self, project: &Project) -> Result<()> {
        let project = project.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO projects (id, client_id, name, description, status, start_date,
                    end_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    project.id.as_str(),
                    project.client_id.as_str(),
                    project.name,
                    project.description,
                    project.status.as_str(),
                    project.start_date,
                    project.end_date,
                    project.created_at,
                    project.updated_at,
                ],
            )
            .map_err(|e| insert_error("project", project.id.as_str(), e))?;
            Ok(())
        })
        .await
    }

    async fn touch_project(&self, id: &ProjectId, at: i64) -> Result<bool> {
        let id = id.clone();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE projects SET updated_at = ?2 WHERE id = ?1",
                params![id.as_str(), at],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        let id = id.clone();
        self.run(move |conn| {
            let sql = format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS);
            Ok(conn
                .query_row(&sql, params![id.as_str()], row_to_project)
                .optional()?)
        })
        .await
    }

    async fn list_projects(&self, client_id: &ClientId) -> Result<Vec<Project>> {
        let client_id = client_id.clone();
        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM projects WHERE client_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
                PROJECT_COLUMNS
            );
            query_all(conn, &sql, params![client_id.as_str()], row_to_project)
        })
        .await
    }

    async fn recent_projects(&self, limit: usize) -> Result<Vec<Project>> {
        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM projects ORDER BY updated_at DESC, rowid DESC LIMIT ?1",
                PROJECT_COLUMNS
            );
            query_all(conn, &sql, params![limit as i64], row_to_project)
        })
        .await
    }

    async fn count_projects(&self, status: ProjectStatus) -> Result<usize> {
        self.run(move |conn| {
            query_count(
                conn,
                "SELECT COUNT(*) FROM projects WHERE status = ?1",
                params![status.as_str()],
            )
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_service(&self, service: &Service) -> Result<()> {
        let service = service.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO services (id, project_id, client_id, kind, name, description,
                    status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    service.id.as_str(),
                    service.project_id.as_str(),
                    service.client_id.as_str(),
                    service.kind.as_str(),
                    service.name,
                    service.description,
                    service.status.as_str(),
                    service.created_at,
                ],
            )
            .map_err(|e| insert_error("service", service.id.as_str(), e))?;
            Ok(())
        })
        .await
    }

    async fn get_service(&self, id: &ServiceId) -> Result<Option<Service>> {
        let id = id.clone();
        self.run(move |conn| {
            let sql = format!("SELECT {} FROM services WHERE id = ?1", SERVICE_COLUMNS);
            Ok(conn
                .query_row(&sql, params![id.as_str()], row_to_service)
                .optional()?)
        })
        .await
    }

    async fn update_service(&self, service: &Service) -> Result<bool> {
        let service = service.clone();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE services SET kind = ?2, name = ?3, description = ?4, status = ?5
                 WHERE id = ?1",
                params![
                    service.id.as_str(),
                    service.kind.as_str(),
                    service.name,
                    service.description,
                    service.status.as_str(),
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn list_services(&self, project_id: &ProjectId) -> Result<Vec<Service>> {
        let project_id = project_id.clone();
        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM services WHERE project_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
                SERVICE_COLUMNS
            );
            query_all(conn, &sql, params![project_id.as_str()], row_to_service)
        })
        .await
    }

    async fn list_client_services(&self, client_id: &ClientId) -> Result<Vec<Service>> {
        let client_id = client_id.clone();
        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM services WHERE client_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
                SERVICE_COLUMNS
            );
            query_all(conn, &sql, params![client_id.as_str()], row_to_service)
        })
        .await
    }

    async fn count_services(&self, status: ServiceStatus) -> Result<usize> {
        self.run(move |conn| {
            query_count(
                conn,
                "SELECT COUNT(*) FROM services WHERE status = ?1",
                params![status.as_str()],
            )
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tasks
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_task(&self, task: &Task) -> Result<()> {
        let task = task.clone();
        let comments = encode_cbor(&task.comments)?;

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO tasks (id, service_id, client_id, title, status, client_visible,
                    comments, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    task.id.as_str(),
                    task.service_id.as_str(),
                    task.client_id.as_str(),
                    task.title,
                    task.status.as_str(),
                    task.client_visible,
                    comments,
                    task.created_at,
                ],
            )
            .map_err(|e| insert_error("task", task.id.as_str(), e))?;
            Ok(())
        })
        .await
    }

    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        let id = id.clone();
        self.run(move |conn| {
            let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
            Ok(conn
                .query_row(&sql, params![id.as_str()], row_to_task)
                .optional()?)
        })
        .await
    }

    async fn update_task(&self, task: &Task) -> Result<bool> {
        let task = task.clone();
        let comments = encode_cbor(&task.comments)?;

        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE tasks SET title = ?2, status = ?3, client_visible = ?4, comments = ?5
                 WHERE id = ?1",
                params![
                    task.id.as_str(),
                    task.title,
                    task.status.as_str(),
                    task.client_visible,
                    comments,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn list_tasks(&self, service_id: &ServiceId) -> Result<Vec<Task>> {
        let service_id = service_id.clone();
        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM tasks WHERE service_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
                TASK_COLUMNS
            );
            query_all(conn, &sql, params![service_id.as_str()], row_to_task)
        })
        .await
    }

    async fn count_tasks(&self, statuses: &[TaskStatus]) -> Result<usize> {
        if statuses.is_empty() {
            return Ok(0);
        }
        let names: Vec<&'static str> = statuses.iter().map(|s| s.as_str()).collect();

        self.run(move |conn| {
            let placeholders = vec!["?"; names.len()].join(", ");
            let sql = format!(
                "SELECT COUNT(*) FROM tasks WHERE status IN ({})",
                placeholders
            );
            query_count(conn, &sql, params_from_iter(names))
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invoices
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<()> {
        let invoice = invoice.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO invoices (id, client_id, number, amount_cents, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    invoice.id.as_str(),
                    invoice.client_id.as_str(),
                    invoice.number,
                    invoice.amount_cents,
                    invoice.status.as_str(),
                    invoice.created_at,
                ],
            )
            .map_err(|e| insert_error("invoice", invoice.id.as_str(), e))?;
            Ok(())
        })
        .await
    }

    async fn list_invoices(
        &self,
        client_id: &ClientId,
        limit: Option<usize>,
    ) -> Result<Vec<Invoice>> {
        let client_id = client_id.clone();
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map_or(-1, |l| l as i64);

        self.run(move |conn| {
            query_all(
                conn,
                "SELECT id, client_id, number, amount_cents, status, created_at
                 FROM invoices WHERE client_id = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
                params![client_id.as_str(), limit],
                row_to_invoice,
            )
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Onboarding
    // ─────────────────────────────────────────────────────────────────────────

    async fn put_checklist(&self, checklist: &OnboardingChecklist) -> Result<()> {
        let client_id = checklist.client_id.clone();
        let items = encode_cbor(&checklist.items)?;
        let status = checklist.status;

        self.run(move |conn| upsert_checklist_row(conn, &client_id, &items, status)).await
    }

    async fn get_checklist(&self, client_id: &ClientId) -> Result<Option<OnboardingChecklist>> {
        let client_id = client_id.clone();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT client_id, items, status FROM onboarding_checklists
                     WHERE client_id = ?1",
                    params![client_id.as_str()],
                    row_to_checklist,
                )
                .optional()?)
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Activity log
    // ─────────────────────────────────────────────────────────────────────────

    async fn append_activity(&self, entry: &ActivityEntry) -> Result<()> {
        let entry = entry.clone();
        let metadata = serde_json::to_string(&entry.metadata)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO activity_log (user_id, action, entity_kind, entity_id, metadata, at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.user_id.as_str(),
                    entry.action.as_str(),
                    entry.entity_kind.as_str(),
                    entry.entity_id,
                    metadata,
                    entry.at,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_activity(&self, entity_id: Option<&str>) -> Result<Vec<ActivityEntry>> {
        let entity_id = entity_id.map(str::to_string);
        self.run(move |conn| {
            query_all(
                conn,
                "SELECT user_id, action, entity_kind, entity_id, metadata, at
                 FROM activity_log WHERE (?1 IS NULL OR entity_id = ?1)
                 ORDER BY seq",
                params![entity_id],
                row_to_activity,
            )
        })
        .await
    }
}
