//! Dashboard Pages
//! Mission: One method per user action; fetch, render, then swap the regions
//!
//! An action either replaces every region with fresh output or, on any
//! failure, leaves them untouched and pushes a notification.

use crate::applications::{ApplicationData, ReviewDecision};
use crate::auth::{Permission, UserRole};
use crate::dashboard::{
    client::{is_auth_failure, ApiClient, ClientError, RegisterForm},
    render::{ApplicationsMode, Renderer},
    session::Session,
    view::{NotificationLevel, Regions, ViewState},
};
use crate::scholarships::{models::ScholarshipQuery, ScholarshipStatus};
use chrono::{NaiveDate, Utc};
use handlebars::{RenderError, TemplateError};
use thiserror::Error;
use tracing::{info, warn};

/// Cards shown in the dashboard's "Recent Scholarships" panel.
const RECENT_SCHOLARSHIPS: usize = 4;

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("failed to render page: {0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    NotAllowed(&'static str),
}

pub struct Dashboard {
    client: ApiClient,
    renderer: Renderer,
    view: ViewState,
    session: Option<Session>,
    today: fn() -> NaiveDate,
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

impl Dashboard {
    pub fn new(client: ApiClient) -> Result<Self, TemplateError> {
        Ok(Self {
            client,
            renderer: Renderer::new()?,
            view: ViewState::new(),
            session: None,
            today: utc_today,
        })
    }

    /// Override the clock used for deadline checks.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn set_session(&mut self, session: Option<Session>) {
        self.client
            .set_token(session.as_ref().map(|s| s.token.clone()));
        self.session = session;
    }

    fn require(&self, permission: Permission, message: &'static str) -> Result<&Session, PageError> {
        match self.session.as_ref() {
            Some(session) if session.can(permission) => Ok(session),
            Some(_) => Err(PageError::NotAllowed(message)),
            None => Err(PageError::Client(ClientError::NotLoggedIn)),
        }
    }

    /// Swap in new regions, or record the failure without touching them.
    fn apply(&mut self, action: &str, outcome: Result<Regions, PageError>) -> bool {
        match outcome {
            Ok(regions) => {
                self.view.replace(regions);
                true
            }
            Err(err) => {
                self.fail(action, err);
                false
            }
        }
    }

    fn fail(&mut self, action: &str, err: PageError) {
        warn!(action, error = %err, "Dashboard action failed");
        let message = match &err {
            PageError::Render(_) => format!("Error loading {}", action),
            other => format!("Error loading {}: {}", action, other),
        };
        self.view.notify(NotificationLevel::Danger, message);
    }

    fn regions(&self, title: &str, actions: String, content: String) -> Result<Regions, PageError> {
        Ok(Regions {
            navbar: self.renderer.navbar(self.session.as_ref())?,
            page_title: title.to_string(),
            page_actions: actions,
            content,
        })
    }

    // ===== Pages =====

    async fn build_dashboard(&self) -> Result<Regions, PageError> {
        let session = self.session.as_ref();
        let today = (self.today)();

        let content = match session {
            None => self.renderer.dashboard(None, None, &[], today)?,
            Some(session) => {
                let stats = if session.can(Permission::ViewStats) {
                    Some(self.client.stats().await?)
                } else {
                    None
                };
                let query = ScholarshipQuery {
                    status: Some(ScholarshipStatus::Active.to_string()),
                    ..Default::default()
                };
                let page = self.client.scholarships(&query).await?;
                let recent: Vec<_> = page.data.into_iter().take(RECENT_SCHOLARSHIPS).collect();
                self.renderer
                    .dashboard(Some(session), stats.as_ref(), &recent, today)?
            }
        };

        self.regions("Dashboard", String::new(), content)
    }

    pub async fn load_dashboard(&mut self) -> bool {
        let outcome = self.build_dashboard().await;
        self.apply("dashboard", outcome)
    }

    async fn build_scholarships(&self, search: Option<&str>, page: Option<u32>) -> Result<Regions, PageError> {
        let session = self.session.as_ref();
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let query = ScholarshipQuery {
            status: None,
            search: search.map(str::to_string),
            page,
        };
        let listing = self.client.scholarships(&query).await?;
        let (actions, content) =
            self.renderer
                .scholarship_list(session, &listing, search, (self.today)())?;
        self.regions("Available Scholarships", actions, content)
    }

    pub async fn load_scholarships(&mut self, search: Option<&str>, page: Option<u32>) -> bool {
        let outcome = self.build_scholarships(search, page).await;
        self.apply("scholarships", outcome)
    }

    async fn build_scholarship(&self, id: i64) -> Result<Regions, PageError> {
        let scholarship = self.client.scholarship(id).await?;
        let (actions, content) =
            self.renderer
                .scholarship_detail(self.session.as_ref(), &scholarship, (self.today)())?;
        self.regions(&scholarship.title, actions, content)
    }

    pub async fn view_scholarship(&mut self, id: i64) -> bool {
        let outcome = self.build_scholarship(id).await;
        self.apply("scholarship details", outcome)
    }

    async fn build_applications(&self, mode: ApplicationsMode, page: u32) -> Result<Regions, PageError> {
        let (title, listing) = match mode {
            ApplicationsMode::Mine => {
                self.require(
                    Permission::ApplyForScholarships,
                    "Only students can view their applications",
                )?;
                ("My Applications", self.client.applications(page).await?)
            }
            ApplicationsMode::ReviewQueue => {
                self.require(
                    Permission::ReviewApplications,
                    "Only reviewers can open the review queue",
                )?;
                ("Review Queue", self.client.review_queue(page).await?)
            }
        };
        let content = self
            .renderer
            .applications(self.session.as_ref(), &listing, mode)?;
        self.regions(title, String::new(), content)
    }

    pub async fn load_my_applications(&mut self, page: u32) -> bool {
        let outcome = self.build_applications(ApplicationsMode::Mine, page).await;
        self.apply("applications", outcome)
    }

    pub async fn load_review_queue(&mut self, page: u32) -> bool {
        let outcome = self
            .build_applications(ApplicationsMode::ReviewQueue, page)
            .await;
        self.apply("review queue", outcome)
    }

    // ===== Actions =====

    /// Create a draft application, then show the caller's applications.
    pub async fn apply_for(&mut self, scholarship_id: i64, data: ApplicationData) -> bool {
        let created = match self.require(
            Permission::ApplyForScholarships,
            "Only students can apply for scholarships",
        ) {
            Ok(_) => self
                .client
                .create_application(scholarship_id, &data)
                .await
                .map_err(PageError::from),
            Err(e) => Err(e),
        };

        match created {
            Ok(app) => {
                info!(application_id = app.id, scholarship_id, "Application drafted");
                self.view.notify(
                    NotificationLevel::Success,
                    "Application saved as a draft. Submit it from My Applications.",
                );
                self.load_my_applications(1).await
            }
            Err(err) => {
                self.fail("application", err);
                false
            }
        }
    }

    pub async fn submit_application(&mut self, id: i64) -> bool {
        match self.client.submit_application(id).await {
            Ok(_) => {
                self.view
                    .notify(NotificationLevel::Success, "Application submitted successfully!");
                self.load_my_applications(1).await
            }
            Err(err) => {
                self.fail("application", err.into());
                false
            }
        }
    }

    pub async fn review_application(
        &mut self,
        id: i64,
        decision: ReviewDecision,
        notes: Option<&str>,
    ) -> bool {
        let reviewed = match self.require(
            Permission::ReviewApplications,
            "Only reviewers can review applications",
        ) {
            Ok(_) => self
                .client
                .review_application(id, decision, notes)
                .await
                .map_err(PageError::from),
            Err(e) => Err(e),
        };

        match reviewed {
            Ok(app) => {
                self.view.notify(
                    NotificationLevel::Success,
                    format!("Application {} {}", app.id, app.review_status),
                );
                self.load_review_queue(1).await
            }
            Err(err) => {
                self.fail("review", err);
                false
            }
        }
    }

    // ===== Session =====

    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        match self.client.login(email, password).await {
            Ok(login) => {
                info!(user = %login.user.email, role = %login.user.role, "Signed in");
                self.set_session(Some(Session::new(login.token, login.user)));
                self.view
                    .notify(NotificationLevel::Success, "Login successful!");
                self.load_dashboard().await
            }
            Err(err) => {
                self.fail("login", err.into());
                false
            }
        }
    }

    pub async fn register(&mut self, name: &str, email: &str, password: &str, role: UserRole) -> bool {
        let form = RegisterForm {
            name,
            email,
            password,
            role,
        };
        match self.client.register(&form).await {
            Ok(_) => {
                self.view.notify(
                    NotificationLevel::Success,
                    "Registration successful! Please login.",
                );
                true
            }
            Err(err) => {
                self.fail("registration", err.into());
                false
            }
        }
    }

    /// Drop the local session even when the server call fails.
    pub async fn logout(&mut self) -> bool {
        if self.session.is_some() {
            if let Err(err) = self.client.logout().await {
                warn!(error = %err, "Server-side logout failed");
            }
        }
        self.set_session(None);
        self.view
            .notify(NotificationLevel::Info, "Logged out successfully");
        self.load_dashboard().await
    }

    /// Re-establish a session from a stored token by asking the server who it belongs to.
    pub async fn restore_session(&mut self, token: &str) -> bool {
        self.client.set_token(Some(token.to_string()));

        match self.client.profile().await {
            Ok(user) => {
                self.set_session(Some(Session::new(token.to_string(), user)));
                match self.renderer.navbar(self.session.as_ref()) {
                    Ok(navbar) => self.view.set_navbar(navbar),
                    Err(err) => self.fail("navigation", err.into()),
                }
                true
            }
            Err(err) => {
                self.set_session(None);
                if is_auth_failure(&err) {
                    self.view
                        .notify(NotificationLevel::Info, "Session expired. Please login again.");
                } else {
                    self.fail("session", err.into());
                }
                false
            }
        }
    }
}
