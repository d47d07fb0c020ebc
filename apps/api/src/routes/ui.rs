use axum::response::Html;

const CREATE_RESUME_PAGE: &str = include_str!("../../static/create_resume.html");

/// GET / and GET /create-resume
/// Serves the paste-analyze-edit-generate form.
pub async fn create_resume_page() -> Html<&'static str> {
    Html(CREATE_RESUME_PAGE)
}
