use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::ai::{AiClient, IssueAnalysis, PrDraft};
use crate::config::GitHubSettings;
use crate::github::{Issue, IssueClient, IssueCreation, IssueFetch, IssueState};
use crate::launch::LaunchParams;
use crate::notes::Notebook;
use crate::store::{ConfigStore, RepoConfig, Storage, StorageError};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Failed to save configuration: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to create issue: {0}")]
    CreateIssue(String),

    #[error("Issue #{0} is not loaded")]
    UnknownIssue(u64),

    #[error("No research note is selected")]
    NoNoteSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Issues,
    Research,
    Settings,
}

/// Handle for one fetch cycle. Only the most recently issued ticket may
/// update the issue list.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    config: RepoConfig,
}

impl FetchTicket {
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }
}

/// Owns the dashboard state and drives both API clients in response to
/// user intents.
pub struct Controller {
    storage: Arc<dyn Storage>,
    github: GitHubSettings,
    issue_client: IssueClient,
    ai_client: AiClient,

    config: RepoConfig,
    view: View,
    issues: Vec<Issue>,
    error: Option<String>,
    loading: bool,
    creating: bool,
    new_issue_form_open: bool,
    notes: Notebook,
    analyses: HashMap<u64, IssueAnalysis>,
    pr_draft: Option<(u64, PrDraft)>,
    generation: u64,
}

impl Controller {
    pub fn new(
        storage: Arc<dyn Storage>,
        github: GitHubSettings,
        issue_client: IssueClient,
        ai_client: AiClient,
    ) -> Self {
        Self {
            storage,
            github,
            issue_client,
            ai_client,
            config: RepoConfig::default(),
            view: View::Dashboard,
            issues: Vec::new(),
            error: None,
            loading: false,
            creating: false,
            new_issue_form_open: false,
            notes: Notebook::seeded(),
            analyses: HashMap::new(),
            pr_draft: None,
            generation: 0,
        }
    }

    /// Load configuration (defaults, then storage, then launch overrides)
    /// and run the first fetch cycle.
    #[instrument(skip_all)]
    pub async fn init(&mut self, launch: Option<&LaunchParams>) {
        self.load_config(launch);
        info!(owner = %self.config.owner, repo = %self.config.repo, "dashboard initialized");
        self.refresh_issues().await;
    }

    /// Load configuration without fetching. A launch link naming a
    /// repository opens the issue list.
    pub fn load_config(&mut self, launch: Option<&LaunchParams>) {
        self.config = self.config_store().load(launch);
        if launch.is_some_and(LaunchParams::targets_repository) {
            self.view = View::Issues;
        }
    }

    pub fn shutdown(self) {
        debug!(issues = self.issues.len(), notes = self.notes.len(), "dashboard shut down");
    }

    fn config_store(&self) -> ConfigStore<'_> {
        ConfigStore::new(self.storage.as_ref(), &self.github)
    }

    // ── configuration ───────────────────────────────────────────────

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn set_credential(&mut self, credential: &str) {
        self.config.credential = credential.to_string();
    }

    /// Point the dashboard at another repository. A change starts a new fetch cycle.
    pub async fn set_repository(&mut self, owner: &str, repo: &str) {
        if self.stage_repository(owner, repo) {
            self.refresh_issues().await;
        }
    }

    /// Edit owner and repo without fetching, as the settings form does before
    /// a save. Returns whether anything changed.
    pub fn stage_repository(&mut self, owner: &str, repo: &str) -> bool {
        if self.config.owner == owner && self.config.repo == repo {
            return false;
        }
        self.config.owner = owner.to_string();
        self.config.repo = repo.to_string();
        true
    }

    /// Persist the current configuration, reload issues and show the issue list.
    pub async fn save_config(&mut self) -> Result<(), ControllerError> {
        self.config_store().save(&self.config)?;
        info!(owner = %self.config.owner, repo = %self.config.repo, "configuration saved");
        self.refresh_issues().await;
        self.view = View::Issues;
        Ok(())
    }

    // ── view state ──────────────────────────────────────────────────

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    // ── issues ──────────────────────────────────────────────────────

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn open_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.state == IssueState::Open)
    }

    pub fn issue(&self, number: u64) -> Option<&Issue> {
        self.issues.iter().find(|i| i.number == number)
    }

    /// Start a fetch cycle: mark loading and hand out the next generation.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        FetchTicket {
            generation: self.generation,
            config: self.config.clone(),
        }
    }

    /// Apply a finished fetch. Results from superseded cycles are dropped
    /// and `false` is returned.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, outcome: IssueFetch) -> bool {
        if ticket.generation != self.generation {
            debug!(stale = ticket.generation, latest = self.generation, "discarding superseded fetch");
            return false;
        }
        let (issues, error) = outcome.into_parts();
        if let Some(error) = &error {
            warn!(error = %error, "showing sample issues");
        }
        self.issues = issues;
        self.error = error;
        self.loading = false;
        true
    }

    pub async fn refresh_issues(&mut self) {
        let ticket = self.begin_fetch();
        let outcome = self.issue_client.fetch_issues(ticket.config()).await;
        self.complete_fetch(ticket, outcome);
    }

    pub fn is_new_issue_form_open(&self) -> bool {
        self.new_issue_form_open
    }

    pub fn open_new_issue_form(&mut self) {
        self.new_issue_form_open = true;
    }

    pub fn close_new_issue_form(&mut self) {
        self.new_issue_form_open = false;
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    /// Create an issue. On success it is prepended and the form closes; on
    /// failure the form stays open and the reason is returned.
    pub async fn create_issue(&mut self, title: &str, body: &str) -> Result<&Issue, ControllerError> {
        let config = self.begin_create();
        let outcome = self.issue_client.create_issue(&config, title, body).await;
        self.complete_create(outcome)
    }

    /// Mark a submission in flight and snapshot the config it is sent with.
    pub fn begin_create(&mut self) -> RepoConfig {
        self.creating = true;
        self.config.clone()
    }

    /// Apply the result of a submission started with [`Self::begin_create`].
    pub fn complete_create(&mut self, outcome: IssueCreation) -> Result<&Issue, ControllerError> {
        self.creating = false;
        match outcome {
            IssueCreation::Created(issue) => {
                info!(number = issue.number, "issue created");
                self.issues.insert(0, issue);
                self.new_issue_form_open = false;
                Ok(&self.issues[0])
            }
            IssueCreation::Rejected(message) | IssueCreation::Failed(message) => {
                Err(ControllerError::CreateIssue(message))
            }
        }
    }

    // ── AI assistance ───────────────────────────────────────────────

    pub fn analysis(&self, number: u64) -> Option<&IssueAnalysis> {
        self.analyses.get(&number)
    }

    /// Analyze an issue at most once per session; later calls return the cached result.
    pub async fn analyze_issue(&mut self, number: u64) -> Result<IssueAnalysis, ControllerError> {
        if let Some(cached) = self.analyses.get(&number) {
            debug!(number, "analysis cached");
            return Ok(cached.clone());
        }
        let issue = self.issue(number).ok_or(ControllerError::UnknownIssue(number))?;
        let analysis = self.ai_client.analyze_issue(&issue.title, &issue.body).await;
        self.analyses.insert(number, analysis.clone());
        Ok(analysis)
    }

    /// Draft a pull request for an issue, reusing its cached analysis when present.
    pub async fn draft_pull_request(&mut self, number: u64) -> Result<&PrDraft, ControllerError> {
        let issue = self.issue(number).ok_or(ControllerError::UnknownIssue(number))?;
        let suggested_fix = self.analyses.get(&number).map(|a| a.suggested_fix.as_str());
        let draft = self
            .ai_client
            .draft_pull_request(&issue.title, &issue.body, suggested_fix)
            .await;
        let (_, draft) = self.pr_draft.insert((number, draft));
        Ok(draft)
    }

    pub fn pr_draft(&self) -> Option<&PrDraft> {
        self.pr_draft.as_ref().map(|(_, draft)| draft)
    }

    /// The open draft, for user edits.
    pub fn pr_draft_mut(&mut self) -> Option<&mut PrDraft> {
        self.pr_draft.as_mut().map(|(_, draft)| draft)
    }

    pub fn dismiss_pr_draft(&mut self) {
        self.pr_draft = None;
    }

    // ── research notes ──────────────────────────────────────────────

    pub fn notes(&self) -> &Notebook {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut Notebook {
        &mut self.notes
    }

    /// Append AI research avenues to the selected note.
    pub async fn expand_selected_note(&mut self) -> Result<(), ControllerError> {
        let topic = self
            .notes
            .selected()
            .map(|note| note.research_topic())
            .ok_or(ControllerError::NoNoteSelected)?;
        let ideas = self.ai_client.generate_research_ideas(&topic).await;
        let note = self.notes.selected_mut().ok_or(ControllerError::NoNoteSelected)?;
        note.append_research_ideas(&ideas);
        debug!(ideas = ideas.len(), "expanded research note");
        Ok(())
    }
}
