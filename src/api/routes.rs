//! API route definitions

use super::handlers::{self, CmsState};
use super::{company_handlers, content_handlers, user_handlers, webhook_handlers};
use crate::auth::require_auth;
use crate::content::{
    ContentFields, FaqFields, FeatureFields, ProcessStepFields, ProjectFields, ServiceFields,
    StudioValueFields, TeamMemberFields, TestimonialFields,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Public list route for a collection
fn public_content<F: ContentFields>(router: Router<CmsState>) -> Router<CmsState> {
    router.route(
        &format!("/api/{}", F::COLLECTION.slug()),
        get(content_handlers::list_public::<F>),
    )
}

/// Admin CRUD + reorder routes for a collection
fn admin_content<F: ContentFields>(router: Router<CmsState>) -> Router<CmsState> {
    let base = format!("/api/admin/{}", F::COLLECTION.slug());
    router
        .route(
            &base,
            get(content_handlers::admin_list::<F>).post(content_handlers::create::<F>),
        )
        .route(
            &format!("{}/reorder", base),
            post(content_handlers::reorder::<F>),
        )
        .route(
            &format!("{}/{{id}}", base),
            get(content_handlers::admin_get::<F>)
                .patch(content_handlers::update::<F>)
                .delete(content_handlers::remove::<F>),
        )
}

/// Create the API router
pub fn create_router(state: CmsState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // ========================================================================
    // Public site
    // ========================================================================
    let mut public = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/projects",
            get(content_handlers::list_published_projects),
        )
        .route(
            "/api/projects/{slug}",
            get(content_handlers::get_published_project),
        )
        .route("/api/company", get(company_handlers::get_public))
        .route(
            "/api/webhooks/identity",
            post(webhook_handlers::identity_webhook),
        );
    public = public_content::<ServiceFields>(public);
    public = public_content::<TestimonialFields>(public);
    public = public_content::<FaqFields>(public);
    public = public_content::<ProcessStepFields>(public);
    public = public_content::<FeatureFields>(public);
    public = public_content::<TeamMemberFields>(public);
    public = public_content::<StudioValueFields>(public);

    // ========================================================================
    // Admin (bearer token required)
    // ========================================================================
    let mut admin = Router::new()
        .route(
            "/api/admin/projects/slug/{slug}",
            get(content_handlers::admin_get_project_by_slug),
        )
        .route(
            "/api/admin/company",
            get(company_handlers::admin_get).patch(company_handlers::update),
        )
        .route("/api/me", get(user_handlers::me))
        .route("/api/me/sync", post(user_handlers::sync_me))
        .route("/api/admin/users", get(user_handlers::list_users))
        .route("/api/admin/users/invite", post(user_handlers::invite))
        .route(
            "/api/admin/users/{id}/role",
            patch(user_handlers::update_role),
        )
        .route(
            "/api/admin/users/{id}/resync",
            post(user_handlers::resync),
        )
        .route("/api/admin/users/{id}", delete(user_handlers::remove_user));
    admin = admin_content::<ProjectFields>(admin);
    admin = admin_content::<ServiceFields>(admin);
    admin = admin_content::<TestimonialFields>(admin);
    admin = admin_content::<FaqFields>(admin);
    admin = admin_content::<ProcessStepFields>(admin);
    admin = admin_content::<FeatureFields>(admin);
    admin = admin_content::<TeamMemberFields>(admin);
    admin = admin_content::<StudioValueFields>(admin);
    let admin = admin.route_layer(from_fn_with_state(state.clone(), require_auth));

    public
        .merge(admin)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{mock_server_state, test_auth_config, test_bearer_token};
    use crate::users::Role;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(mock_server_state(Some(test_auth_config())))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        role: Option<Role>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send_as(app, "user_test", method, uri, role, body).await
    }

    async fn send_as(
        app: &Router,
        clerk_id: &str,
        method: &str,
        uri: &str,
        role: Option<Role>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            builder = builder.header(
                "authorization",
                format!("Bearer {}", test_bearer_token(clerk_id, "ed@studio.test", Some(role))),
            );
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_admin_routes_require_token() {
        let (status, body) = send(&app(), "GET", "/api/admin/faqs", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_viewer_cannot_write() {
        let app = app();
        let (status, _) = send(&app, "GET", "/api/admin/faqs", Some(Role::Viewer), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "POST",
            "/api/admin/faqs",
            Some(Role::Viewer),
            Some(json!({"question": "Q", "answer": "A"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_faq_crud_over_http() {
        let app = app();
        let (status, a) = send(
            &app,
            "POST",
            "/api/admin/faqs",
            Some(Role::Editor),
            Some(json!({"question": "Q1", "answer": "A1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(a["order"], 1);

        let (_, b) = send(
            &app,
            "POST",
            "/api/admin/faqs",
            Some(Role::Editor),
            Some(json!({"question": "Q2", "answer": "A2"})),
        )
        .await;
        assert_eq!(b["order"], 2);

        let a_id = a["id"].as_str().unwrap();
        let b_id = b["id"].as_str().unwrap();

        let (status, updated) = send(
            &app,
            "PATCH",
            &format!("/api/admin/faqs/{}", a_id),
            Some(Role::Editor),
            Some(json!({"answer": "A1-revised"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["question"], "Q1");
        assert_eq!(updated["answer"], "A1-revised");

        let (status, list) = send(
            &app,
            "POST",
            "/api/admin/faqs/reorder",
            Some(Role::Editor),
            Some(json!({"ids": [b_id, a_id]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["id"], b_id);
        assert_eq!(list[1]["id"], a_id);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/admin/faqs/{}", b_id),
            Some(Role::Editor),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/admin/faqs/{}", b_id),
            Some(Role::Editor),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, public) = send(&app, "GET", "/api/faqs", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(public.as_array().unwrap().len(), 1);
        assert_eq!(public[0]["answer"], "A1-revised");
    }

    #[tokio::test]
    async fn test_missing_required_field_is_400() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/admin/faqs",
            Some(Role::Editor),
            Some(json!({"question": "Q only"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("answer"));
    }

    #[tokio::test]
    async fn test_public_projects_hide_drafts() {
        let app = app();
        for (title, published) in [("Live Site", true), ("Draft Site", false)] {
            let (status, _) = send(
                &app,
                "POST",
                "/api/admin/projects",
                Some(Role::Editor),
                Some(json!({
                    "title": title,
                    "category": "Web",
                    "summary": "A case study",
                    "isPublished": published
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, public) = send(&app, "GET", "/api/projects", None, None).await;
        assert_eq!(public.as_array().unwrap().len(), 1);
        assert_eq!(public[0]["slug"], "live-site");

        let (status, _) = send(&app, "GET", "/api/projects/draft-site", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, draft) = send(
            &app,
            "GET",
            "/api/admin/projects/slug/draft-site",
            Some(Role::Viewer),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["isPublished"], false);

        let (_, all) = send(&app, "GET", "/api/admin/projects", Some(Role::Viewer), None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_company_upsert_over_http() {
        let app = app();
        let (status, _) = send(&app, "GET", "/api/company", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, info) = send(
            &app,
            "PATCH",
            "/api/admin/company",
            Some(Role::Editor),
            Some(json!({"name": "Northwind Studio"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(info["foundedYear"], 2024);

        let (_, public) = send(&app, "GET", "/api/company", None, None).await;
        assert_eq!(public["name"], "Northwind Studio");
    }

    #[tokio::test]
    async fn test_user_management_requires_admin() {
        let app = app();
        let (status, _) = send(&app, "GET", "/api/admin/users", Some(Role::Editor), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "GET", "/api/admin/users", Some(Role::Admin), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_me_sync_then_role_change() {
        let app = app();
        let (status, _) = send(&app, "GET", "/api/me", Some(Role::Editor), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, synced) = send(&app, "POST", "/api/me/sync", Some(Role::Editor), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(synced["user"]["role"], "editor");
        // no identity provider in the mock state
        assert_eq!(synced["role_mirrored"], false);

        let id = synced["user"]["id"].as_str().unwrap().to_string();
        let (status, change) = send_as(
            &app,
            "user_admin",
            "PATCH",
            &format!("/api/admin/users/{}/role", id),
            Some(Role::Admin),
            Some(json!({"role": "viewer"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(change["user"]["role"], "viewer");
        assert_eq!(change["mirrored"], false);

        let (_, me) = send(&app, "GET", "/api/me", Some(Role::Editor), None).await;
        assert_eq!(me["role"], "viewer");

        // the stored role decides, whatever the token still claims
        let (status, _) = send(
            &app,
            "POST",
            "/api/admin/faqs",
            Some(Role::Editor),
            Some(json!({"question": "Q", "answer": "A"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_webhook_refused_without_secret() {
        let (status, _) = send(
            &app(),
            "POST",
            "/api/webhooks/identity",
            None,
            Some(json!({"type": "user.created", "data": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
