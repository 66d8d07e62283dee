//! Dashboard Rendering
//! Mission: Typed view models in, escaped HTML fragments out
//!
//! Every render call takes the session explicitly; nothing reads ambient state.

use crate::applications::{Application, ApplicationStatus, ReviewStatus};
use crate::auth::{Permission, UserRole};
use crate::dashboard::session::Session;
use crate::models::{AdminStats, Page};
use crate::scholarships::{Scholarship, ScholarshipStatus};
use chrono::NaiveDate;
use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

const EXCERPT_CHARS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Navbar,
    Dashboard,
    ScholarshipListActions,
    ScholarshipList,
    ScholarshipDetailActions,
    ScholarshipDetail,
    Applications,
}

impl Template {
    pub const ALL: [Template; 7] = [
        Template::Navbar,
        Template::Dashboard,
        Template::ScholarshipListActions,
        Template::ScholarshipList,
        Template::ScholarshipDetailActions,
        Template::ScholarshipDetail,
        Template::Applications,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Template::Navbar => "navbar",
            Template::Dashboard => "dashboard",
            Template::ScholarshipListActions => "scholarship_list_actions",
            Template::ScholarshipList => "scholarship_list",
            Template::ScholarshipDetailActions => "scholarship_detail_actions",
            Template::ScholarshipDetail => "scholarship_detail",
            Template::Applications => "applications",
        }
    }

    fn source(self) -> &'static str {
        match self {
            Template::Navbar => include_str!("templates/navbar.hbs"),
            Template::Dashboard => include_str!("templates/dashboard.hbs"),
            Template::ScholarshipListActions => include_str!("templates/scholarship_list_actions.hbs"),
            Template::ScholarshipList => include_str!("templates/scholarship_list.hbs"),
            Template::ScholarshipDetailActions => {
                include_str!("templates/scholarship_detail_actions.hbs")
            }
            Template::ScholarshipDetail => include_str!("templates/scholarship_detail.hbs"),
            Template::Applications => include_str!("templates/applications.hbs"),
        }
    }
}

// ===== View models =====

#[derive(Debug, Serialize)]
struct NavUser<'a> {
    name: &'a str,
    role: UserRole,
}

#[derive(Debug, Default, Serialize)]
struct NavLinks {
    apply: bool,
    review: bool,
    admin: bool,
}

#[derive(Debug, Serialize)]
struct NavbarView<'a> {
    user: Option<NavUser<'a>>,
    links: NavLinks,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScholarshipCard {
    pub id: i64,
    pub title: String,
    pub provider: String,
    pub description: String,
    pub excerpt: String,
    pub eligibility_criteria: String,
    pub application_process: String,
    pub amount: String,
    pub deadline: String,
    pub status: ScholarshipStatus,
    pub active: bool,
    pub expired: bool,
    pub can_apply: bool,
}

impl ScholarshipCard {
    pub fn new(s: &Scholarship, session: Option<&Session>, today: NaiveDate) -> Self {
        let expired = s.is_past_deadline(today);
        let can_apply =
            !expired && session.is_some_and(|sess| sess.can(Permission::ApplyForScholarships));

        Self {
            id: s.id,
            title: s.title.clone(),
            provider: s.provider.clone(),
            description: s.description.clone(),
            excerpt: excerpt(&s.description, EXCERPT_CHARS),
            eligibility_criteria: s.eligibility_criteria.clone(),
            application_process: s.application_process.clone(),
            amount: format!("{:.2}", s.amount),
            deadline: s.deadline.format("%Y-%m-%d").to_string(),
            status: s.status,
            active: s.status == ScholarshipStatus::Active,
            expired,
            can_apply,
        }
    }
}

#[derive(Debug, Serialize)]
struct DashboardView<'a> {
    signed_in: bool,
    stats: Option<&'a AdminStats>,
    recent: Vec<ScholarshipCard>,
}

#[derive(Debug, Serialize)]
struct ListView<'a> {
    scholarships: Vec<ScholarshipCard>,
    search: &'a str,
    current_page: u32,
    last_page: u32,
    total: u64,
}

#[derive(Debug, Serialize)]
struct ApplicationRow<'a> {
    id: i64,
    scholarship_title: &'a str,
    applicant_name: &'a str,
    status: ApplicationStatus,
    review_status: ReviewStatus,
    review_notes: Option<&'a str>,
    updated_at: &'a str,
    can_submit: bool,
    can_review: bool,
}

#[derive(Debug, Serialize)]
struct ApplicationsView<'a> {
    rows: Vec<ApplicationRow<'a>>,
    show_applicant: bool,
    empty_message: &'a str,
    current_page: u32,
    last_page: u32,
    total: u64,
}

/// Which table an application listing is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationsMode {
    Mine,
    ReviewQueue,
}

/// Truncate on a char boundary, appending an ellipsis when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        for template in Template::ALL {
            registry.register_template_string(template.name(), template.source())?;
        }
        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, template: Template, data: &T) -> Result<String, RenderError> {
        self.registry.render(template.name(), data)
    }

    pub fn navbar(&self, session: Option<&Session>) -> Result<String, RenderError> {
        let view = NavbarView {
            user: session.map(|s| NavUser {
                name: &s.user.name,
                role: s.role(),
            }),
            links: session
                .map(|s| NavLinks {
                    apply: s.can(Permission::ApplyForScholarships),
                    review: s.can(Permission::ReviewApplications),
                    admin: s.can(Permission::ManageUsers),
                })
                .unwrap_or_default(),
        };
        self.render(Template::Navbar, &view)
    }

    pub fn dashboard(
        &self,
        session: Option<&Session>,
        stats: Option<&AdminStats>,
        recent: &[Scholarship],
        today: NaiveDate,
    ) -> Result<String, RenderError> {
        let view = DashboardView {
            signed_in: session.is_some(),
            stats,
            recent: recent
                .iter()
                .map(|s| ScholarshipCard::new(s, session, today))
                .collect(),
        };
        self.render(Template::Dashboard, &view)
    }

    /// Returns `(page_actions, content)`.
    pub fn scholarship_list(
        &self,
        session: Option<&Session>,
        page: &Page<Scholarship>,
        search: Option<&str>,
        today: NaiveDate,
    ) -> Result<(String, String), RenderError> {
        let view = ListView {
            scholarships: page
                .data
                .iter()
                .map(|s| ScholarshipCard::new(s, session, today))
                .collect(),
            search: search.unwrap_or_default(),
            current_page: page.current_page,
            last_page: page.last_page,
            total: page.total,
        };
        Ok((
            self.render(Template::ScholarshipListActions, &view)?,
            self.render(Template::ScholarshipList, &view)?,
        ))
    }

    /// Returns `(page_actions, content)`.
    pub fn scholarship_detail(
        &self,
        session: Option<&Session>,
        scholarship: &Scholarship,
        today: NaiveDate,
    ) -> Result<(String, String), RenderError> {
        let card = ScholarshipCard::new(scholarship, session, today);
        Ok((
            self.render(Template::ScholarshipDetailActions, &card)?,
            self.render(Template::ScholarshipDetail, &card)?,
        ))
    }

    pub fn applications(
        &self,
        session: Option<&Session>,
        page: &Page<Application>,
        mode: ApplicationsMode,
    ) -> Result<String, RenderError> {
        let reviewer = session.is_some_and(|s| s.can(Permission::ReviewApplications));
        let user_id = session.map(|s| s.user.id);

        let rows = page
            .data
            .iter()
            .map(|app| ApplicationRow {
                id: app.id,
                scholarship_title: &app.scholarship_title,
                applicant_name: &app.applicant_name,
                status: app.status,
                review_status: app.review_status,
                review_notes: app.review_notes.as_deref(),
                updated_at: &app.updated_at,
                can_submit: mode == ApplicationsMode::Mine
                    && app.status == ApplicationStatus::Draft
                    && user_id == Some(app.user_id),
                can_review: mode == ApplicationsMode::ReviewQueue
                    && reviewer
                    && app.status == ApplicationStatus::Submitted
                    && app.review_status == ReviewStatus::Pending,
            })
            .collect();

        let view = ApplicationsView {
            rows,
            show_applicant: mode == ApplicationsMode::ReviewQueue,
            empty_message: match mode {
                ApplicationsMode::Mine => "You have not applied for any scholarships yet.",
                ApplicationsMode::ReviewQueue => "No applications are waiting for review.",
            },
            current_page: page.current_page,
            last_page: page.last_page,
            total: page.total,
        };
        self.render(Template::Applications, &view)
    }
}
