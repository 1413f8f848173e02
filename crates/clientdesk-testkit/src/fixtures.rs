//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a demo tenant written straight
//! into a store, bypassing authorization.

use anyhow::Context;

use clientdesk::{Portal, PortalConfig};
use clientdesk_core::{
    now_millis, Client, ClientId, ClientStatus, ClientUpdate, Invoice, InvoiceId, InvoiceStatus,
    NewClient, NewProject, NewService, OnboardingChecklist, Project, ProjectId, ProjectStatus,
    Service, ServiceId, ServiceKind, ServiceStatus, Subject, DEFAULT_CHECKLIST,
};
use clientdesk_store::{MemoryStore, Store};

/// The seeded demo tenant.
#[derive(Debug, Clone)]
pub struct DemoTenant {
    pub admin: Subject,
    pub team_member: Subject,
    pub client_user: Subject,
    pub client: Client,
    pub project: Project,
    /// Branding (completed) then website (in progress).
    pub services: Vec<Service>,
    pub invoice: Invoice,
}

/// Insert a client with a fresh default checklist.
pub async fn seed_client<S: Store + ?Sized>(
    store: &S,
    company_name: &str,
    contact_email: &str,
) -> anyhow::Result<Client> {
    let client = NewClient::new(company_name, contact_email)
        .into_client(ClientId::generate(), now_millis())?;
    let checklist = OnboardingChecklist::new(client.id.clone(), DEFAULT_CHECKLIST);
    store
        .insert_client_with_checklist(&client, &checklist)
        .await
        .with_context(|| format!("seeding client {}", company_name))?;
    Ok(client)
}

/// Seed the demo tenant: an active client with one in-flight project,
/// a finished onboarding checklist and one paid invoice.
pub async fn seed_demo<S: Store + ?Sized>(store: &S) -> anyhow::Result<DemoTenant> {
    let now = now_millis();

    let mut client = seed_client(store, "Harbor Kitchen", "hello@harbor.test").await?;
    ClientUpdate {
        industry: Some("Food & Beverage".into()),
        status: Some(ClientStatus::Active),
        assigned_team: Some(vec!["team@agency.test".into()]),
        ..ClientUpdate::default()
    }
    .apply_to(&mut client)?;
    store.update_client(&client).await?;

    let mut checklist = store
        .get_checklist(&client.id)
        .await?
        .context("demo checklist missing")?;
    for id in (1..=checklist.items.len()).map(|i| i.to_string()) {
        checklist.set_completed(&id, true);
    }
    store.put_checklist(&checklist).await?;

    let project = NewProject::new("Brand Refresh & Digital Presence")
        .with_status(ProjectStatus::InProgress)
        .into_project(ProjectId::generate(), client.id.clone(), now)?;
    store.insert_project(&project).await?;

    let mut services = Vec::new();
    for (kind, name, status) in [
        (ServiceKind::Branding, "Brand Identity Design", ServiceStatus::Completed),
        (ServiceKind::Website, "Website Development", ServiceStatus::InProgress),
    ] {
        let service = NewService::new(kind, name)
            .with_status(status)
            .into_service(ServiceId::generate(), &project, now)?;
        store.insert_service(&service).await?;
        services.push(service);
    }

    let invoice = Invoice {
        id: InvoiceId::generate(),
        client_id: client.id.clone(),
        number: "INV-0001".into(),
        amount_cents: 450_000,
        status: InvoiceStatus::Paid,
        created_at: now,
    };
    store.insert_invoice(&invoice).await?;

    Ok(DemoTenant {
        admin: Subject::admin("admin@agency.test"),
        team_member: Subject::team_member("team@agency.test"),
        client_user: Subject::client_user("owner@harbor.test", client.id.clone()),
        client,
        project,
        services,
        invoice,
    })
}

/// A portal over a memory store with the demo tenant seeded.
pub struct TestFixture {
    pub portal: Portal<MemoryStore>,
    pub demo: DemoTenant,
}

impl TestFixture {
    /// Seed with the default configuration.
    pub async fn seeded() -> anyhow::Result<Self> {
        Self::with_config(PortalConfig::default()).await
    }

    pub async fn with_config(config: PortalConfig) -> anyhow::Result<Self> {
        let portal = Portal::new(MemoryStore::new(), config);
        let demo = seed_demo(portal.store()).await?;
        Ok(Self { portal, demo })
    }

    /// Add a second, unrelated client and a user scoped to it.
    pub async fn other_tenant(&self) -> anyhow::Result<(Client, Subject)> {
        let client = seed_client(self.portal.store(), "Northwind", "ops@northwind.test").await?;
        let user = Subject::client_user("owner@northwind.test", client.id.clone());
        Ok((client, user))
    }
}
