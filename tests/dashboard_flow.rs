//! Dashboard client driven against a live server on an ephemeral port.

use chrono::NaiveDate;
use scholarship_backend::applications::{ApplicationData, ReviewDecision};
use scholarship_backend::auth::UserRole;
use scholarship_backend::dashboard::{ApiClient, Dashboard, NotificationLevel};
use scholarship_backend::scholarships::{models::ScholarshipInput, ScholarshipStatus};
use scholarship_backend::{create_router, AppState, Config};
use tokio::net::TcpListener;

const ADMIN_EMAIL: &str = "admin@scholarships.local";
const ADMIN_PASSWORD: &str = "admin12345";

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

async fn spawn_server() -> (String, AppState) {
    let state = AppState::new(Config::for_tests()).unwrap();
    let app = create_router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

fn seed_scholarship(state: &AppState, title: &str, deadline: NaiveDate) -> i64 {
    state
        .scholarships
        .create(ScholarshipInput {
            title: title.to_string(),
            description: "Support for ambitious engineering students".to_string(),
            provider: "Acme Foundation".to_string(),
            amount: 5000.0,
            deadline,
            eligibility_criteria: "Enrolled full time".to_string(),
            application_process: "Essay and transcript".to_string(),
            status: ScholarshipStatus::Active,
        })
        .unwrap()
        .id
}

fn dashboard(base_url: &str) -> Dashboard {
    Dashboard::new(ApiClient::new(base_url).unwrap())
        .unwrap()
        .with_today(fixed_today)
}

fn essay() -> ApplicationData {
    ApplicationData {
        essay: "I build bridges".to_string(),
        achievements: "Robotics champion".to_string(),
        extracurricular: "Chess".to_string(),
    }
}

#[tokio::test]
async fn test_student_applies_and_reviewer_decides() {
    let (url, state) = spawn_server().await;
    let open_id = seed_scholarship(&state, "Engineering Grant", NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());

    // Student: register, login, browse, apply, submit
    let mut student = dashboard(&url);
    assert!(
        student
            .register("Sam Student", "sam@example.com", "password123", UserRole::Student)
            .await
    );
    assert!(student.login("sam@example.com", "password123").await);
    assert!(student.view().regions().navbar.contains("My Applications"));
    assert!(!student.view().regions().content.contains("Registered users"));

    assert!(student.load_scholarships(Some("engineering"), None).await);
    assert!(student.view().regions().content.contains("Engineering Grant"));

    assert!(student.view_scholarship(open_id).await);
    assert_eq!(student.view().regions().page_title, "Engineering Grant");
    assert!(student.view().regions().page_actions.contains("Apply Now"));

    assert!(student.apply_for(open_id, essay()).await);
    assert_eq!(student.view().regions().page_title, "My Applications");
    assert!(student.view().regions().content.contains("draft"));

    let app_id = state
        .applications
        .list(&Default::default(), Default::default())
        .unwrap()
        .data[0]
        .id;
    assert!(student.submit_application(app_id).await);
    assert!(student.view().regions().content.contains("submitted"));

    // Reviewer: queue, approve
    let mut reviewer = dashboard(&url);
    reviewer
        .register("Rita Reviewer", "rita@example.com", "password123", UserRole::Reviewer)
        .await;
    assert!(reviewer.login("rita@example.com", "password123").await);
    assert!(reviewer.load_review_queue(1).await);
    assert!(reviewer.view().regions().content.contains("Sam Student"));

    assert!(
        reviewer
            .review_application(app_id, ReviewDecision::Approved, Some("Strong"))
            .await
    );
    assert!(reviewer
        .view()
        .notifications()
        .iter()
        .any(|n| n.message.contains("approved")));

    // Admin: dashboard stats
    let mut admin = dashboard(&url);
    assert!(admin.login(ADMIN_EMAIL, ADMIN_PASSWORD).await);
    let content = &admin.view().regions().content;
    assert!(content.contains("Registered users"));
    assert!(content.contains("Engineering Grant"));
}

#[tokio::test]
async fn test_failed_call_leaves_regions_and_notifies() {
    let (url, state) = spawn_server().await;
    seed_scholarship(&state, "Any Grant", NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());

    let mut admin = dashboard(&url);
    assert!(admin.login(ADMIN_EMAIL, ADMIN_PASSWORD).await);
    assert!(admin.load_scholarships(None, None).await);

    let before = admin.view().regions().clone();
    let notes_before = admin.view().notifications().len();

    assert!(!admin.view_scholarship(424242).await);

    assert_eq!(admin.view().regions(), &before);
    assert_eq!(admin.view().notifications().len(), notes_before + 1);
    let last = admin.view().notifications().last().unwrap();
    assert_eq!(last.level, NotificationLevel::Danger);
}

#[tokio::test]
async fn test_titles_are_escaped_in_listing() {
    let (url, state) = spawn_server().await;
    seed_scholarship(&state, "<img src=x onerror=alert(1)>", NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());

    let mut admin = dashboard(&url);
    assert!(admin.login(ADMIN_EMAIL, ADMIN_PASSWORD).await);
    assert!(admin.load_scholarships(None, None).await);

    let content = &admin.view().regions().content;
    assert!(!content.contains("<img"));
    assert!(content.contains("&lt;img"));
}

#[tokio::test]
async fn test_expired_scholarship_has_no_apply_button() {
    let (url, state) = spawn_server().await;
    let id = seed_scholarship(&state, "Past Grant", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

    let mut student = dashboard(&url);
    student
        .register("Sam", "sam@example.com", "password123", UserRole::Student)
        .await;
    assert!(student.login("sam@example.com", "password123").await);
    assert!(student.view_scholarship(id).await);

    assert!(student.view().regions().content.contains("Expired"));
    assert!(!student.view().regions().page_actions.contains("Apply Now"));
}

#[tokio::test]
async fn test_restore_session_and_logout() {
    let (url, _state) = spawn_server().await;

    let mut first = dashboard(&url);
    assert!(first.login(ADMIN_EMAIL, ADMIN_PASSWORD).await);
    let token = first.session().unwrap().token.clone();

    let mut restored = dashboard(&url);
    assert!(restored.restore_session(&token).await);
    assert_eq!(restored.session().unwrap().user.email, ADMIN_EMAIL);
    assert!(restored.view().regions().navbar.contains("Logout"));

    assert!(restored.logout().await);
    assert!(restored.session().is_none());
    assert!(restored.view().regions().content.contains("Please login or register"));

    // The revoked token no longer restores
    let mut stale = dashboard(&url);
    assert!(!stale.restore_session(&token).await);
    assert!(stale.session().is_none());
    assert!(stale
        .view()
        .notifications()
        .iter()
        .any(|n| n.message.contains("Session expired")));
}

#[tokio::test]
async fn test_reviewer_pages_refused_for_students() {
    let (url, _state) = spawn_server().await;

    let mut student = dashboard(&url);
    student
        .register("Sam", "sam@example.com", "password123", UserRole::Student)
        .await;
    assert!(student.login("sam@example.com", "password123").await);
    let before = student.view().regions().clone();

    assert!(!student.load_review_queue(1).await);
    assert_eq!(student.view().regions(), &before);
}
