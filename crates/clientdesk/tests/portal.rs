//! End-to-end authorization scenarios against the Portal.

use std::time::Duration;

use clientdesk::core::{
    ActivityAction, ChecklistStatus, ClientStatus, ClientUpdate, NewClient, NewProject,
    NewService, NewTask, ProjectStatus, ServiceKind, ServiceStatus, TaskStatus,
};
use clientdesk::perms::AccessDenied;
use clientdesk::store::{MemoryStore, SqliteStore, Store};
use clientdesk::{
    authenticate, ClientId, Portal, PortalConfig, PortalError, StaticIdentityProvider, Subject,
};

struct World<S: Store> {
    portal: Portal<S>,
    admin: Subject,
    team: Subject,
    c1: ClientId,
    c2: ClientId,
    c1_user: Subject,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn world<S: Store>(store: S, config: PortalConfig) -> World<S> {
    init_tracing();
    let portal = Portal::new(store, config);
    let admin = Subject::admin("admin");

    let c1 = portal
        .create_client(Some(&admin), NewClient::new("First", "one@first.test"))
        .await
        .unwrap()
        .id;
    let c2 = portal
        .create_client(Some(&admin), NewClient::new("Second", "two@second.test"))
        .await
        .unwrap()
        .id;

    World {
        portal,
        admin,
        team: Subject::team_member("team"),
        c1_user: Subject::client_user("client-1", c1.clone()),
        c1,
        c2,
    }
}

async fn memory_world() -> World<MemoryStore> {
    world(MemoryStore::new(), PortalConfig::default()).await
}

#[tokio::test]
async fn unauthenticated_requests_are_401() {
    let w = memory_world().await;

    let results = [
        w.portal.list_clients(None).await.map(|_| ()),
        w.portal.get_client(None, &w.c1).await.map(|_| ()),
        w.portal.dashboard(None).await.map(|_| ()),
        w.portal
            .create_client(None, NewClient::new("X", "x@x.test"))
            .await
            .map(|_| ()),
    ];
    for result in results {
        assert_eq!(result.unwrap_err().status_code(), 401);
    }
}

#[tokio::test]
async fn client_user_lists_only_own_client() {
    let w = memory_world().await;

    let visible = w.portal.list_clients(Some(&w.c1_user)).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].client.id, w.c1);

    let all = w.portal.list_clients(Some(&w.team)).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn client_user_cannot_open_foreign_client() {
    let w = memory_world().await;

    let err = w
        .portal
        .get_client(Some(&w.c1_user), &w.c2)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert!(matches!(
        err,
        PortalError::Forbidden(AccessDenied::OutOfScope { .. })
    ));

    // Same answer for ids that do not exist: no existence leak.
    let err = w
        .portal
        .get_client(Some(&w.c1_user), &ClientId::from("nope"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    assert!(w.portal.get_client(Some(&w.c1_user), &w.c1).await.is_ok());
}

#[tokio::test]
async fn forbidden_mutations_leave_store_untouched() {
    let w = memory_world().await;
    let before = w.portal.store().list_activity(None).await.unwrap().len();

    let err = w
        .portal
        .delete_client(Some(&w.team), &w.c1)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    let err = w
        .portal
        .update_client(
            Some(&w.c1_user),
            &w.c1,
            ClientUpdate {
                status: Some(ClientStatus::Archived),
                ..ClientUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    assert!(w.portal.store().get_client(&w.c1).await.unwrap().is_some());
    assert_eq!(
        w.portal.store().list_activity(None).await.unwrap().len(),
        before
    );
}

#[tokio::test]
async fn dashboard_denied_for_client_users() {
    let w = memory_world().await;

    let err = w.portal.dashboard(Some(&w.c1_user)).await.unwrap_err();
    assert!(matches!(
        err,
        PortalError::Forbidden(AccessDenied::NotGranted { .. })
    ));
    assert!(w.portal.dashboard(Some(&w.team)).await.is_ok());
}

#[tokio::test]
async fn dashboard_counts_and_recent_projects() {
    let w = world(
        MemoryStore::new(),
        PortalConfig {
            recent_projects_limit: 2,
            ..PortalConfig::default()
        },
    )
    .await;

    w.portal
        .update_client(
            Some(&w.admin),
            &w.c1,
            ClientUpdate {
                status: Some(ClientStatus::Active),
                ..ClientUpdate::default()
            },
        )
        .await
        .unwrap();

    for name in ["One", "Two", "Three"] {
        w.portal
            .create_project(
                Some(&w.admin),
                &w.c1,
                NewProject::new(name).with_status(ProjectStatus::InProgress),
            )
            .await
            .unwrap();
    }
    let project = w
        .portal
        .create_project(Some(&w.admin), &w.c2, NewProject::new("Paused"))
        .await
        .unwrap();
    let service = w
        .portal
        .create_service(
            Some(&w.admin),
            &project.id,
            NewService::new(ServiceKind::Branding, "Logo").with_status(ServiceStatus::Completed),
        )
        .await
        .unwrap();
    w.portal
        .create_task(Some(&w.team), &service.id, NewTask::new("Sketch"))
        .await
        .unwrap();

    let stats = w.portal.dashboard(Some(&w.admin)).await.unwrap();
    assert_eq!(stats.active_clients, 1);
    assert_eq!(stats.active_projects, 3);
    assert_eq!(stats.completed_services, 1);
    assert_eq!(stats.pending_tasks, 1);
    assert_eq!(stats.recent_projects.len(), 2);
}

async fn service_update_refreshes_recent_projects<S: Store>(w: World<S>) {
    let older = w
        .portal
        .create_project(Some(&w.admin), &w.c1, NewProject::new("Older"))
        .await
        .unwrap();
    let service = w
        .portal
        .create_service(
            Some(&w.admin),
            &older.id,
            NewService::new(ServiceKind::Website, "Build"),
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newer = w
        .portal
        .create_project(Some(&w.admin), &w.c2, NewProject::new("Newer"))
        .await
        .unwrap();

    let stats = w.portal.dashboard(Some(&w.admin)).await.unwrap();
    assert_eq!(stats.recent_projects[0].id, newer.id);

    tokio::time::sleep(Duration::from_millis(5)).await;
    w.portal
        .update_service_status(Some(&w.team), &service.id, ServiceStatus::InProgress)
        .await
        .unwrap();

    let stats = w.portal.dashboard(Some(&w.admin)).await.unwrap();
    assert_eq!(stats.recent_projects[0].id, older.id);
    assert!(stats.recent_projects[0].updated_at > newer.updated_at);
}

#[tokio::test]
async fn service_update_refreshes_recent_projects_in_memory() {
    service_update_refreshes_recent_projects(memory_world().await).await;
}

#[tokio::test]
async fn service_update_refreshes_recent_projects_in_sqlite() {
    let store = SqliteStore::open_memory().unwrap();
    service_update_refreshes_recent_projects(world(store, PortalConfig::default()).await).await;
}

#[tokio::test]
async fn team_member_edits_services_but_cannot_create_projects() {
    let w = memory_world().await;

    let err = w
        .portal
        .create_project(Some(&w.team), &w.c1, NewProject::new("Site"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    let project = w
        .portal
        .create_project(Some(&w.admin), &w.c1, NewProject::new("Site"))
        .await
        .unwrap();
    let service = w
        .portal
        .create_service(
            Some(&w.admin),
            &project.id,
            NewService::new(ServiceKind::Website, "Build"),
        )
        .await
        .unwrap();

    let updated = w
        .portal
        .update_service_status(Some(&w.team), &service.id, ServiceStatus::Waiting)
        .await
        .unwrap();
    assert_eq!(updated.status, ServiceStatus::Waiting);

    let activity = w
        .portal
        .store()
        .list_activity(Some(service.id.as_str()))
        .await
        .unwrap();
    assert_eq!(
        activity.last().map(|e| e.action),
        Some(ActivityAction::UpdatedServiceStatus)
    );
}

#[tokio::test]
async fn team_assignment_enforced_when_configured() {
    let w = world(
        MemoryStore::new(),
        PortalConfig {
            enforce_team_assignment: true,
            ..PortalConfig::default()
        },
    )
    .await;

    let project = w
        .portal
        .create_project(Some(&w.admin), &w.c1, NewProject::new("Site"))
        .await
        .unwrap();
    let service = w
        .portal
        .create_service(
            Some(&w.admin),
            &project.id,
            NewService::new(ServiceKind::Website, "Build"),
        )
        .await
        .unwrap();

    let err = w
        .portal
        .update_service_status(Some(&w.team), &service.id, ServiceStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PortalError::Forbidden(AccessDenied::NotAssigned(_))
    ));

    w.portal
        .update_client(
            Some(&w.admin),
            &w.c1,
            ClientUpdate {
                assigned_team: Some(vec![w.team.user_id().clone()]),
                ..ClientUpdate::default()
            },
        )
        .await
        .unwrap();

    assert!(w
        .portal
        .update_service_status(Some(&w.team), &service.id, ServiceStatus::InProgress)
        .await
        .is_ok());
}

#[tokio::test]
async fn client_user_sees_and_comments_on_visible_tasks_only() {
    let w = memory_world().await;

    let project = w
        .portal
        .create_project(Some(&w.admin), &w.c1, NewProject::new("Site"))
        .await
        .unwrap();
    let service = w
        .portal
        .create_service(
            Some(&w.admin),
            &project.id,
            NewService::new(ServiceKind::Website, "Build"),
        )
        .await
        .unwrap();
    let hidden = w
        .portal
        .create_task(Some(&w.team), &service.id, NewTask::new("Internal QA"))
        .await
        .unwrap();
    let shared = w
        .portal
        .create_task(
            Some(&w.team),
            &service.id,
            NewTask::new("Review copy").visible_to_client(),
        )
        .await
        .unwrap();

    let tasks = w
        .portal
        .list_tasks(Some(&w.c1_user), &service.id)
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, shared.id);
    assert_eq!(tasks[0].status, TaskStatus::Todo);

    let staff_tasks = w.portal.list_tasks(Some(&w.team), &service.id).await.unwrap();
    assert_eq!(staff_tasks.len(), 2);

    let commented = w
        .portal
        .comment_on_task(Some(&w.c1_user), &shared.id, "Looks great")
        .await
        .unwrap();
    assert_eq!(commented.comments.len(), 1);
    assert_eq!(&commented.comments[0].author, w.c1_user.user_id());

    let err = w
        .portal
        .comment_on_task(Some(&w.c1_user), &hidden.id, "Hello?")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    // Team members hold no comment grant on tasks.
    let err = w
        .portal
        .comment_on_task(Some(&w.team), &shared.id, "Noted")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn foreign_client_user_cannot_reach_child_records() {
    let w = memory_world().await;
    let c2_user = Subject::client_user("client-2", w.c2.clone());

    let project = w
        .portal
        .create_project(Some(&w.admin), &w.c1, NewProject::new("Site"))
        .await
        .unwrap();
    let service = w
        .portal
        .create_service(
            Some(&w.admin),
            &project.id,
            NewService::new(ServiceKind::Website, "Build"),
        )
        .await
        .unwrap();

    for err in [
        w.portal
            .get_project(Some(&c2_user), &project.id)
            .await
            .map(|_| ())
            .unwrap_err(),
        w.portal
            .list_projects(Some(&c2_user), &w.c1)
            .await
            .map(|_| ())
            .unwrap_err(),
        w.portal
            .list_tasks(Some(&c2_user), &service.id)
            .await
            .map(|_| ())
            .unwrap_err(),
    ] {
        assert!(matches!(
            err,
            PortalError::Forbidden(AccessDenied::OutOfScope { .. })
        ));
    }

    assert_eq!(
        w.portal
            .get_project(Some(&w.c1_user), &project.id)
            .await
            .unwrap(),
        project
    );
}

#[tokio::test]
async fn invoices_require_finance_view() {
    let w = memory_world().await;

    let err = w
        .portal
        .list_invoices(Some(&w.c1_user), &w.c1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PortalError::Forbidden(AccessDenied::NotGranted { .. })
    ));
    assert!(w
        .portal
        .list_invoices(Some(&w.team), &w.c1)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn admin_completes_checklist() {
    let w = memory_world().await;

    let mut checklist = None;
    for item in 1..=6 {
        checklist = Some(
            w.portal
                .toggle_checklist_item(Some(&w.admin), &w.c1, &item.to_string(), true)
                .await
                .unwrap(),
        );
    }
    assert_eq!(
        checklist.map(|c| c.status),
        Some(ChecklistStatus::Completed)
    );

    let err = w
        .portal
        .toggle_checklist_item(Some(&w.admin), &w.c1, "42", true)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let err = w
        .portal
        .toggle_checklist_item(Some(&w.c1_user), &w.c1, "1", false)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn delete_client_cascades() {
    let w = memory_world().await;
    let project = w
        .portal
        .create_project(Some(&w.admin), &w.c2, NewProject::new("Site"))
        .await
        .unwrap();

    w.portal.delete_client(Some(&w.admin), &w.c2).await.unwrap();

    let err = w
        .portal
        .get_project(Some(&w.admin), &project.id)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let err = w
        .portal
        .delete_client(Some(&w.admin), &w.c2)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn invalid_input_is_400() {
    let w = memory_world().await;
    let err = w
        .portal
        .create_client(Some(&w.admin), NewClient::new("  ", "a@b.test"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn sqlite_backend_behaves_the_same() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("portal.db")).unwrap();
    let w = world(store, PortalConfig::default()).await;

    let visible = w.portal.list_clients(Some(&w.c1_user)).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].client.id, w.c1);

    let err = w
        .portal
        .get_client(Some(&w.c1_user), &w.c2)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    let detail = w.portal.get_client(Some(&w.admin), &w.c1).await.unwrap();
    assert_eq!(detail.checklist.map(|c| c.items.len()), Some(6));
}

#[tokio::test]
async fn token_to_portal_flow() {
    let w = memory_world().await;
    let provider = StaticIdentityProvider::new()
        .with("admin-token", w.admin.clone())
        .with("client-token", w.c1_user.clone());

    let subject = authenticate(&provider, Some("client-token")).await.unwrap();
    let visible = w.portal.list_clients(Some(&subject)).await.unwrap();
    assert_eq!(visible.len(), 1);

    let err = authenticate(&provider, Some("expired")).await.unwrap_err();
    assert_eq!(err.status_code(), 401);
}
