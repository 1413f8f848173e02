//! The memory and SQLite backends must answer the same way.

use clientdesk_core::{
    Client, ClientId, Invoice, InvoiceId, InvoiceStatus, NewClient, NewProject, NewService,
    NewTask, OnboardingChecklist, ProjectId, ServiceId, ServiceKind, TaskId, DEFAULT_CHECKLIST,
};
use clientdesk_store::{MemoryStore, SqliteStore, Store, StoreError};

fn client(id: &str) -> Client {
    NewClient::new(format!("Client {}", id), format!("{}@example.test", id))
        .into_client(ClientId::from(id), 1)
        .unwrap()
}

async fn rejects_orphans_and_duplicates<S: Store>(store: S) {
    let orphan = NewProject::new("Site")
        .into_project(ProjectId::from("p1"), ClientId::from("nope"), 1)
        .unwrap();
    assert!(matches!(
        store.insert_project(&orphan).await,
        Err(StoreError::NotFound(_))
    ));

    let c = client("c1");
    store.insert_client(&c).await.unwrap();
    let project = NewProject::new("Site")
        .into_project(ProjectId::from("p1"), c.id.clone(), 1)
        .unwrap();
    store.insert_project(&project).await.unwrap();
    assert!(matches!(
        store.insert_project(&project).await,
        Err(StoreError::InvalidData(_))
    ));

    // Children of records that were never stored.
    let ghost_project = NewProject::new("Ghost")
        .into_project(ProjectId::from("p-ghost"), c.id.clone(), 1)
        .unwrap();
    let ghost_service = NewService::new(ServiceKind::Marketing, "Audit")
        .into_service(ServiceId::from("s-ghost"), &ghost_project, 1)
        .unwrap();
    assert!(matches!(
        store.insert_service(&ghost_service).await,
        Err(StoreError::NotFound(_))
    ));
    let task = NewTask::new("Keywords")
        .into_task(TaskId::from("t1"), &ghost_service, 1)
        .unwrap();
    assert!(matches!(
        store.insert_task(&task).await,
        Err(StoreError::NotFound(_))
    ));

    let invoice = Invoice {
        id: InvoiceId::from("i1"),
        client_id: ClientId::from("nope"),
        number: "INV-0001".into(),
        amount_cents: 100,
        status: InvoiceStatus::Draft,
        created_at: 1,
    };
    assert!(matches!(
        store.insert_invoice(&invoice).await,
        Err(StoreError::NotFound(_))
    ));

    let checklist = OnboardingChecklist::new(ClientId::from("nope"), DEFAULT_CHECKLIST);
    assert!(matches!(
        store.put_checklist(&checklist).await,
        Err(StoreError::NotFound(_))
    ));

    assert_eq!(store.list_projects(&c.id).await.unwrap(), vec![project]);
}

async fn client_with_checklist_is_all_or_nothing<S: Store>(store: S) {
    let c = client("c1");
    let foreign = OnboardingChecklist::new(ClientId::from("c2"), DEFAULT_CHECKLIST);
    assert!(matches!(
        store.insert_client_with_checklist(&c, &foreign).await,
        Err(StoreError::InvalidData(_))
    ));
    assert!(store.get_client(&c.id).await.unwrap().is_none());

    let checklist = OnboardingChecklist::new(c.id.clone(), DEFAULT_CHECKLIST);
    store
        .insert_client_with_checklist(&c, &checklist)
        .await
        .unwrap();
    assert_eq!(store.get_checklist(&c.id).await.unwrap(), Some(checklist));
}

async fn touched_project_moves_to_front<S: Store>(store: S) {
    let c = client("c1");
    store.insert_client(&c).await.unwrap();
    for (id, at) in [("p1", 10), ("p2", 20)] {
        let project = NewProject::new(id)
            .into_project(ProjectId::from(id), c.id.clone(), at)
            .unwrap();
        store.insert_project(&project).await.unwrap();
    }

    let recent = store.recent_projects(1).await.unwrap();
    assert_eq!(recent[0].id.as_str(), "p2");

    assert!(store.touch_project(&ProjectId::from("p1"), 30).await.unwrap());
    assert!(!store.touch_project(&ProjectId::from("p9"), 30).await.unwrap());

    let recent = store.recent_projects(1).await.unwrap();
    assert_eq!(recent[0].id.as_str(), "p1");
    assert_eq!(recent[0].updated_at, 30);
    assert_eq!(recent[0].created_at, 10);
}

#[tokio::test]
async fn memory_rejects_orphans_and_duplicates() {
    rejects_orphans_and_duplicates(MemoryStore::new()).await;
}

#[tokio::test]
async fn sqlite_rejects_orphans_and_duplicates() {
    rejects_orphans_and_duplicates(SqliteStore::open_memory().unwrap()).await;
}

#[tokio::test]
async fn memory_client_with_checklist_is_all_or_nothing() {
    client_with_checklist_is_all_or_nothing(MemoryStore::new()).await;
}

#[tokio::test]
async fn sqlite_client_with_checklist_is_all_or_nothing() {
    client_with_checklist_is_all_or_nothing(SqliteStore::open_memory().unwrap()).await;
}

#[tokio::test]
async fn memory_touched_project_moves_to_front() {
    touched_project_moves_to_front(MemoryStore::new()).await;
}

#[tokio::test]
async fn sqlite_touched_project_moves_to_front() {
    touched_project_moves_to_front(SqliteStore::open_memory().unwrap()).await;
}
