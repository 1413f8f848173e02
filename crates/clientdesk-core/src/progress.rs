//! Progress aggregates shown on client and dashboard views.

use serde::{Deserialize, Serialize};

use crate::records::{OnboardingChecklist, Project, ProjectStatus, Service, ServiceStatus};

/// Whole-number percentage of `completed` over `total`, clamped to 0..=100.
///
/// An empty total yields 0.
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let value = (completed as f64 / total as f64 * 100.0).round();
    value.clamp(0.0, 100.0) as u8
}

/// Delivery progress of a single client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProgress {
    pub total_services: usize,
    pub completed_services: usize,
    pub active_projects: usize,
    pub percent: u8,
}

impl ClientProgress {
    /// Compute from a client's projects and all of their services.
    pub fn compute(projects: &[Project], services: &[Service]) -> Self {
        let total_services = services.len();
        let completed_services = services
            .iter()
            .filter(|s| s.status == ServiceStatus::Completed)
            .count();
        let active_projects = projects
            .iter()
            .filter(|p| p.status == ProjectStatus::InProgress)
            .count();

        Self {
            total_services,
            completed_services,
            active_projects,
            percent: percent(completed_services, total_services),
        }
    }
}

/// Progress through an onboarding checklist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

impl ChecklistProgress {
    pub fn compute(checklist: &OnboardingChecklist) -> Self {
        let completed = checklist.completed_count();
        let total = checklist.items.len();
        Self {
            completed,
            total,
            percent: percent(completed, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{NewProject, NewService, ServiceKind};
    use crate::types::{ClientId, ProjectId, ServiceId};
    use proptest::prelude::*;

    #[test]
    fn test_percent_rounds() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn test_percent_clamps_overflowing_counts() {
        assert_eq!(percent(5, 3), 100);
    }

    #[test]
    fn test_client_progress() {
        let project = NewProject::new("Refresh")
            .with_status(ProjectStatus::InProgress)
            .into_project(ProjectId::from("p1"), ClientId::from("c1"), 0)
            .unwrap();
        let done = NewService::new(ServiceKind::Branding, "Identity")
            .with_status(ServiceStatus::Completed)
            .into_service(ServiceId::from("s1"), &project, 0)
            .unwrap();
        let open = NewService::new(ServiceKind::Website, "Site")
            .with_status(ServiceStatus::InProgress)
            .into_service(ServiceId::from("s2"), &project, 0)
            .unwrap();

        let progress = ClientProgress::compute(&[project], &[done, open]);
        assert_eq!(progress.total_services, 2);
        assert_eq!(progress.completed_services, 1);
        assert_eq!(progress.active_projects, 1);
        assert_eq!(progress.percent, 50);
    }

    #[test]
    fn test_checklist_progress() {
        let mut checklist =
            OnboardingChecklist::new(ClientId::from("c1"), crate::records::DEFAULT_CHECKLIST);
        checklist.set_completed("1", true);
        checklist.set_completed("2", true);

        let progress = ChecklistProgress::compute(&checklist);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.total, 6);
        assert_eq!(progress.percent, 33);
    }

    proptest! {
        #[test]
        fn test_percent_is_bounded(completed in 0usize..10_000, total in 0usize..10_000) {
            let p = percent(completed.min(total), total);
            prop_assert!(p <= 100);
        }
    }
}
