//! Repository/project reconciliation state
//!
//! This module owns the client-side view of the repository catalogue: the
//! repository list, the selection set used for bulk operations, and the
//! current transient alert. Operations dispatch requests through a shared
//! [`ProjectService`] handle and merge the returned project descriptors back
//! into the list.
//!
//! Each repository is either unlinked (`project_id == None`) or linked;
//! create operations move it to linked, delete operations back to unlinked,
//! and failed operations leave it untouched.

use crate::service::{Project, ProjectService, Repository};
use anyhow::Error;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Visual severity of a transient alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertVariant {
    Success,
    Danger,
}

impl AlertVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertVariant::Success => "success",
            AlertVariant::Danger => "danger",
        }
    }
}

/// A transient operation notification
///
/// The `id` is a per-reconciler sequence number; the presentation layer keys
/// its dismiss timer on it so a stale timer can never clear a newer alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: u64,
    pub title: String,
    pub message: String,
    pub variant: AlertVariant,
}

/// Client-side reconciler between the repository catalogue and project links
pub struct Reconciler {
    service: Arc<dyn ProjectService>,
    repos: Vec<Repository>,
    selection: HashSet<String>,
    alert: Option<Alert>,
    alert_seq: u64,
}

impl Reconciler {
    /// Create a reconciler with an empty repository list
    pub fn new(service: Arc<dyn ProjectService>) -> Self {
        Self {
            service,
            repos: Vec::new(),
            selection: HashSet::new(),
            alert: None,
            alert_seq: 0,
        }
    }

    // =========================================================================
    // View accessors
    // =========================================================================

    /// Current repository list, in catalogue order
    pub fn repos(&self) -> &[Repository] {
        &self.repos
    }

    /// Ids currently selected for bulk operations
    pub fn selection(&self) -> &HashSet<String> {
        &self.selection
    }

    /// Whether a repository id is currently selected
    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    /// Current transient alert, if one is showing
    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    /// Selected repositories, in catalogue order
    pub fn selected_repos(&self) -> Vec<Repository> {
        self.repos
            .iter()
            .filter(|repo| self.selection.contains(&repo.id))
            .cloned()
            .collect()
    }

    /// Selected repositories without a project entry (bulk create input)
    pub fn pending_creates(&self) -> Vec<Repository> {
        self.selected_repos()
            .into_iter()
            .filter(|repo| !repo.is_linked())
            .collect()
    }

    /// Project ids of selected, linked repositories (bulk delete input)
    pub fn pending_delete_ids(&self) -> Vec<String> {
        self.selected_repos()
            .iter()
            .filter_map(|repo| repo.project_id.clone())
            .collect()
    }

    // =========================================================================
    // Catalogue loading
    // =========================================================================

    /// Fetch the repository catalogue from the service
    ///
    /// On failure the previous list is kept and a danger alert is posted;
    /// the error never escalates past the alert.
    pub async fn load(&mut self) {
        match self.service.fetch_repositories().await {
            Ok(repos) => {
                info!("Loaded {} repositories", repos.len());
                self.set_repos(repos);
            }
            Err(err) => {
                warn!("Repository fetch failed: {:#}", err);
                self.post_alert(
                    AlertVariant::Danger,
                    "Error fetching repositories",
                    format!("{:#}", err),
                );
            }
        }
    }

    /// Replace the repository list, pruning stale ids from the selection
    pub fn set_repos(&mut self, repos: Vec<Repository>) {
        self.repos = repos;
        let ids: HashSet<&str> = self.repos.iter().map(|repo| repo.id.as_str()).collect();
        self.selection.retain(|id| ids.contains(id.as_str()));
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Add or remove one repository id from the selection
    ///
    /// Ids not present in the repository list are ignored.
    pub fn toggle_select(&mut self, id: &str, selected: bool) {
        if selected {
            if self.repos.iter().any(|repo| repo.id == id) {
                self.selection.insert(id.to_string());
            }
        } else {
            self.selection.remove(id);
        }
    }

    /// Select every repository, or clear the selection
    pub fn select_all(&mut self, selected: bool) {
        if selected {
            self.selection = self.repos.iter().map(|repo| repo.id.clone()).collect();
        } else {
            self.selection.clear();
        }
    }

    // =========================================================================
    // Single operations
    // =========================================================================

    /// Create a project entry for one repository
    ///
    /// The caller only offers this action for unlinked repositories; an
    /// already-linked target is not guarded against here.
    pub async fn create_single(&mut self, repo: Repository) {
        match self.service.create_project(&repo).await {
            Ok(project) => {
                debug!("Linked repository {} to project {}", repo.id, project.id);
                self.link(&repo.id, &project.id);
                self.post_alert(
                    AlertVariant::Success,
                    "Project created",
                    format!("Successfully created project {}", project.title),
                );
            }
            Err(err) => {
                self.post_alert(
                    AlertVariant::Danger,
                    "Error creating a project",
                    format!("Error creating a project for {}: {:#}", repo.name, err),
                );
            }
        }
    }

    /// Delete the project entry linked to one repository
    pub async fn delete_single(&mut self, repo: Repository) {
        let project_id = repo.project_id.clone().unwrap_or_default();

        match self.service.delete_project(&project_id).await {
            Ok(project) => {
                debug!("Unlinked repository {} from project {}", repo.id, project.id);
                self.unlink(&repo.id);
                self.post_alert(
                    AlertVariant::Success,
                    "Project deleted",
                    format!("Successfully deleted project {}", project.title),
                );
            }
            Err(err) => {
                self.post_alert(
                    AlertVariant::Danger,
                    "Error deleting a project",
                    format!("Error deleting a project for {}: {:#}", repo.name, err),
                );
            }
        }
    }

    // =========================================================================
    // Bulk operations
    // =========================================================================

    /// Create project entries for a batch of unlinked repositories
    ///
    /// The batch succeeds only when the service returns exactly one project
    /// per requested repository; a shorter response reports the whole batch
    /// as failed and applies nothing. The selection is cleared whichever way
    /// the call resolves.
    pub async fn create_many(&mut self, repos: Vec<Repository>) {
        match self.service.create_projects(&repos).await {
            Ok(created) if created.len() == repos.len() => {
                apply_created(&mut self.repos, &created);
                self.post_alert(
                    AlertVariant::Success,
                    "Projects created",
                    format!("Successfully created {} projects", repos.len()),
                );
            }
            Ok(created) => {
                warn!(
                    "Bulk create applied {} of {} entries; reporting batch as failed",
                    created.len(),
                    repos.len()
                );
                self.post_alert(
                    AlertVariant::Danger,
                    "Error creating projects",
                    "Error creating some projects".to_string(),
                );
            }
            Err(err) => {
                self.report_batch_error("creating", err);
            }
        }

        self.selection.clear();
    }

    /// Delete a batch of project entries addressed by project id
    ///
    /// Mirror of [`Reconciler::create_many`]: count-matched success policy,
    /// selection cleared unconditionally.
    pub async fn delete_many(&mut self, project_ids: Vec<String>) {
        match self.service.delete_projects(&project_ids).await {
            Ok(deleted) if deleted.len() == project_ids.len() => {
                apply_deleted(&mut self.repos, &deleted);
                self.post_alert(
                    AlertVariant::Success,
                    "Projects deleted",
                    format!("Successfully deleted {} projects", project_ids.len()),
                );
            }
            Ok(deleted) => {
                warn!(
                    "Bulk delete applied {} of {} entries; reporting batch as failed",
                    deleted.len(),
                    project_ids.len()
                );
                self.post_alert(
                    AlertVariant::Danger,
                    "Error deleting projects",
                    "Error deleting some projects".to_string(),
                );
            }
            Err(err) => {
                self.report_batch_error("deleting", err);
            }
        }

        self.selection.clear();
    }

    // =========================================================================
    // Alerts
    // =========================================================================

    /// Post a transient alert, superseding the current one
    pub fn post_alert(&mut self, variant: AlertVariant, title: &str, message: String) {
        self.alert_seq += 1;
        self.alert = Some(Alert {
            id: self.alert_seq,
            title: title.to_string(),
            message,
            variant,
        });
    }

    /// Dismiss the alert with the given id
    ///
    /// A no-op unless `id` names the alert currently showing, so an expired
    /// timer for a superseded alert never clears its successor.
    pub fn dismiss_alert(&mut self, id: u64) {
        if self.alert.as_ref().map(|alert| alert.id) == Some(id) {
            self.alert = None;
        }
    }

    fn report_batch_error(&mut self, verb: &str, err: Error) {
        self.post_alert(
            AlertVariant::Danger,
            &format!("Error {} projects", verb),
            format!("Error {} some projects: {:#}", verb, err),
        );
    }

    fn link(&mut self, repo_id: &str, project_id: &str) {
        if let Some(repo) = self.repos.iter_mut().find(|repo| repo.id == repo_id) {
            repo.project_id = Some(project_id.to_string());
        }
    }

    fn unlink(&mut self, repo_id: &str) {
        if let Some(repo) = self.repos.iter_mut().find(|repo| repo.id == repo_id) {
            repo.project_id = None;
        }
    }
}

/// Merge created project descriptors into the repository list
///
/// Matches by repository id; already-linked repositories and repositories
/// with no matching descriptor are left untouched. Re-applying the same
/// response is a no-op.
fn apply_created(repos: &mut [Repository], created: &[Project]) {
    for repo in repos.iter_mut() {
        if repo.project_id.is_some() {
            continue;
        }
        if let Some(project) = created.iter().find(|p| p.repository_id == repo.id) {
            repo.project_id = Some(project.id.clone());
        }
    }
}

/// Merge deleted project descriptors into the repository list
///
/// Mirror of [`apply_created`]: matched, linked repositories become unlinked.
fn apply_deleted(repos: &mut [Repository], deleted: &[Project]) {
    for repo in repos.iter_mut() {
        if repo.project_id.is_none() {
            continue;
        }
        if deleted.iter().any(|p| p.repository_id == repo.id) {
            repo.project_id = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    /// Canned-response service; `None` slots fail with a transport error
    #[derive(Default)]
    struct StubService {
        repositories: Vec<Repository>,
        create_one: Option<Project>,
        delete_one: Option<Project>,
        create_batch: Option<Vec<Project>>,
        delete_batch: Option<Vec<Project>>,
    }

    #[async_trait]
    impl ProjectService for StubService {
        async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
            Ok(self.repositories.clone())
        }

        async fn create_project(&self, _repo: &Repository) -> Result<Project> {
            self.create_one
                .clone()
                .ok_or_else(|| anyhow!("service unavailable"))
        }

        async fn delete_project(&self, _project_id: &str) -> Result<Project> {
            self.delete_one
                .clone()
                .ok_or_else(|| anyhow!("service unavailable"))
        }

        async fn create_projects(&self, _repos: &[Repository]) -> Result<Vec<Project>> {
            self.create_batch
                .clone()
                .ok_or_else(|| anyhow!("service unavailable"))
        }

        async fn delete_projects(&self, _project_ids: &[String]) -> Result<Vec<Project>> {
            self.delete_batch
                .clone()
                .ok_or_else(|| anyhow!("service unavailable"))
        }
    }

    fn repo(id: &str, project_id: Option<&str>) -> Repository {
        Repository {
            id: id.to_string(),
            name: format!("repo-{}", id),
            short_description: String::new(),
            url: format!("https://github.com/acme/repo-{}", id),
            project_id: project_id.map(str::to_string),
        }
    }

    fn project(id: &str, repository_id: &str) -> Project {
        Project {
            id: id.to_string(),
            title: format!("Project {}", id),
            repository_id: repository_id.to_string(),
        }
    }

    fn reconciler_with(service: StubService, repos: Vec<Repository>) -> Reconciler {
        let mut reconciler = Reconciler::new(Arc::new(service));
        reconciler.set_repos(repos);
        reconciler
    }

    #[tokio::test]
    async fn create_single_links_only_the_matching_repository() {
        let service = StubService {
            create_one: Some(project("p1", "1")),
            ..StubService::default()
        };
        let mut reconciler =
            reconciler_with(service, vec![repo("1", None), repo("2", Some("p2"))]);

        let target = reconciler.repos()[0].clone();
        reconciler.create_single(target).await;

        assert_eq!(reconciler.repos()[0].project_id, Some("p1".to_string()));
        assert_eq!(reconciler.repos()[1].project_id, Some("p2".to_string()));

        let alert = reconciler.alert().unwrap();
        assert_eq!(alert.variant, AlertVariant::Success);
        assert_eq!(alert.title, "Project created");
    }

    #[tokio::test]
    async fn create_single_failure_leaves_state_unchanged() {
        let mut reconciler =
            reconciler_with(StubService::default(), vec![repo("1", None)]);

        let target = reconciler.repos()[0].clone();
        reconciler.create_single(target).await;

        assert_eq!(reconciler.repos()[0].project_id, None);

        let alert = reconciler.alert().unwrap();
        assert_eq!(alert.variant, AlertVariant::Danger);
        assert!(alert.message.contains("repo-1"));
    }

    #[tokio::test]
    async fn delete_single_unlinks_on_success() {
        let service = StubService {
            delete_one: Some(project("p2", "2")),
            ..StubService::default()
        };
        let mut reconciler = reconciler_with(service, vec![repo("2", Some("p2"))]);

        let target = reconciler.repos()[0].clone();
        reconciler.delete_single(target).await;

        assert_eq!(reconciler.repos()[0].project_id, None);
        assert_eq!(reconciler.alert().unwrap().title, "Project deleted");
    }

    #[tokio::test]
    async fn create_many_full_response_links_all_and_clears_selection() {
        let service = StubService {
            create_batch: Some(vec![project("p1", "1"), project("p3", "3")]),
            ..StubService::default()
        };
        let mut reconciler = reconciler_with(
            service,
            vec![repo("1", None), repo("2", Some("p2")), repo("3", None)],
        );
        reconciler.select_all(true);

        let batch = reconciler.pending_creates();
        assert_eq!(batch.len(), 2);
        reconciler.create_many(batch).await;

        assert_eq!(reconciler.repos()[0].project_id, Some("p1".to_string()));
        assert_eq!(reconciler.repos()[1].project_id, Some("p2".to_string()));
        assert_eq!(reconciler.repos()[2].project_id, Some("p3".to_string()));
        assert!(reconciler.selection().is_empty());
        assert_eq!(reconciler.alert().unwrap().variant, AlertVariant::Success);
    }

    #[tokio::test]
    async fn create_many_short_response_applies_nothing() {
        let service = StubService {
            create_batch: Some(vec![project("p1", "1")]),
            ..StubService::default()
        };
        let mut reconciler =
            reconciler_with(service, vec![repo("1", None), repo("3", None)]);
        reconciler.select_all(true);

        let batch = reconciler.pending_creates();
        reconciler.create_many(batch).await;

        // No partial application even though the service created one project
        assert_eq!(reconciler.repos()[0].project_id, None);
        assert_eq!(reconciler.repos()[1].project_id, None);
        assert!(reconciler.selection().is_empty());

        let alert = reconciler.alert().unwrap();
        assert_eq!(alert.variant, AlertVariant::Danger);
        assert_eq!(alert.message, "Error creating some projects");
    }

    #[tokio::test]
    async fn create_many_transport_failure_still_clears_selection() {
        let mut reconciler =
            reconciler_with(StubService::default(), vec![repo("1", None)]);
        reconciler.toggle_select("1", true);

        let batch = reconciler.pending_creates();
        reconciler.create_many(batch).await;

        assert_eq!(reconciler.repos()[0].project_id, None);
        assert!(reconciler.selection().is_empty());
        assert_eq!(reconciler.alert().unwrap().variant, AlertVariant::Danger);
    }

    #[tokio::test]
    async fn selected_mixed_batch_create_scenario() {
        // Repositories [{id:"1",unlinked},{id:"2",linked p2}]; both selected;
        // bulk create targets only repo "1" and the service answers in full.
        let service = StubService {
            create_batch: Some(vec![project("p1", "1")]),
            ..StubService::default()
        };
        let mut reconciler =
            reconciler_with(service, vec![repo("1", None), repo("2", Some("p2"))]);
        reconciler.select_all(true);

        let batch = reconciler.pending_creates();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, "1");

        reconciler.create_many(batch).await;

        assert_eq!(reconciler.repos()[0].project_id, Some("p1".to_string()));
        assert!(reconciler.selection().is_empty());
    }

    #[tokio::test]
    async fn delete_many_full_response_unlinks_all() {
        let service = StubService {
            delete_batch: Some(vec![project("p2", "2")]),
            ..StubService::default()
        };
        let mut reconciler =
            reconciler_with(service, vec![repo("1", None), repo("2", Some("p2"))]);
        reconciler.toggle_select("2", true);

        let ids = reconciler.pending_delete_ids();
        assert_eq!(ids, vec!["p2".to_string()]);
        reconciler.delete_many(ids).await;

        assert_eq!(reconciler.repos()[1].project_id, None);
        assert!(reconciler.selection().is_empty());
        assert_eq!(reconciler.alert().unwrap().title, "Projects deleted");
    }

    #[tokio::test]
    async fn delete_many_empty_response_keeps_link() {
        // Mismatch: one project requested, none reported deleted
        let service = StubService {
            delete_batch: Some(vec![]),
            ..StubService::default()
        };
        let mut reconciler = reconciler_with(service, vec![repo("2", Some("p2"))]);
        reconciler.toggle_select("2", true);

        let ids = reconciler.pending_delete_ids();
        reconciler.delete_many(ids).await;

        assert_eq!(reconciler.repos()[0].project_id, Some("p2".to_string()));
        assert!(reconciler.selection().is_empty());

        let alert = reconciler.alert().unwrap();
        assert_eq!(alert.variant, AlertVariant::Danger);
        assert_eq!(alert.title, "Error deleting projects");
    }

    #[test]
    fn apply_created_is_idempotent() {
        let mut repos = vec![repo("1", None), repo("2", None)];
        let created = vec![project("p1", "1"), project("p2", "2")];

        apply_created(&mut repos, &created);
        let once = repos.clone();
        apply_created(&mut repos, &created);

        assert_eq!(repos, once);
        assert_eq!(repos[0].project_id, Some("p1".to_string()));
        assert_eq!(repos[1].project_id, Some("p2".to_string()));
    }

    #[test]
    fn apply_created_leaves_unmatched_repositories_unlinked() {
        let mut repos = vec![repo("1", None), repo("9", None)];
        let created = vec![project("p1", "1")];

        apply_created(&mut repos, &created);

        assert_eq!(repos[0].project_id, Some("p1".to_string()));
        assert_eq!(repos[1].project_id, None);
    }

    #[test]
    fn apply_deleted_is_idempotent() {
        let mut repos = vec![repo("1", Some("p1")), repo("2", Some("p2"))];
        let deleted = vec![project("p1", "1")];

        apply_deleted(&mut repos, &deleted);
        let once = repos.clone();
        apply_deleted(&mut repos, &deleted);

        assert_eq!(repos, once);
        assert_eq!(repos[0].project_id, None);
        assert_eq!(repos[1].project_id, Some("p2".to_string()));
    }

    #[test]
    fn toggle_select_ignores_unknown_ids() {
        let mut reconciler =
            reconciler_with(StubService::default(), vec![repo("1", None)]);

        reconciler.toggle_select("ghost", true);
        assert!(reconciler.selection().is_empty());

        reconciler.toggle_select("1", true);
        assert!(reconciler.is_selected("1"));

        reconciler.toggle_select("1", false);
        assert!(!reconciler.is_selected("1"));
    }

    #[test]
    fn set_repos_prunes_stale_selection() {
        let mut reconciler = reconciler_with(
            StubService::default(),
            vec![repo("1", None), repo("2", None)],
        );
        reconciler.select_all(true);

        reconciler.set_repos(vec![repo("2", None)]);

        assert_eq!(reconciler.selection().len(), 1);
        assert!(reconciler.is_selected("2"));
    }

    #[test]
    fn stale_dismiss_does_not_clear_newer_alert() {
        let mut reconciler = reconciler_with(StubService::default(), vec![]);

        reconciler.post_alert(AlertVariant::Success, "First", "first".to_string());
        let first_id = reconciler.alert().unwrap().id;

        reconciler.post_alert(AlertVariant::Danger, "Second", "second".to_string());

        reconciler.dismiss_alert(first_id);
        assert_eq!(reconciler.alert().unwrap().title, "Second");

        let second_id = reconciler.alert().unwrap().id;
        reconciler.dismiss_alert(second_id);
        assert!(reconciler.alert().is_none());
    }

    #[tokio::test]
    async fn load_failure_posts_alert_and_keeps_list() {
        struct FailingService;

        #[async_trait]
        impl ProjectService for FailingService {
            async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
                Err(anyhow!("connection refused"))
            }
            async fn create_project(&self, _: &Repository) -> Result<Project> {
                unreachable!()
            }
            async fn delete_project(&self, _: &str) -> Result<Project> {
                unreachable!()
            }
            async fn create_projects(&self, _: &[Repository]) -> Result<Vec<Project>> {
                unreachable!()
            }
            async fn delete_projects(&self, _: &[String]) -> Result<Vec<Project>> {
                unreachable!()
            }
        }

        let mut reconciler = Reconciler::new(Arc::new(FailingService));
        reconciler.set_repos(vec![repo("1", Some("p1"))]);

        reconciler.load().await;

        assert_eq!(reconciler.repos().len(), 1);
        let alert = reconciler.alert().unwrap();
        assert_eq!(alert.title, "Error fetching repositories");
        assert_eq!(alert.variant, AlertVariant::Danger);
    }
}
