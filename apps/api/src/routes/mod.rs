pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::{admin, campaigns, compose, email, prospects, unipile};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Campaigns
        .route(
            "/api/campaigns",
            get(campaigns::handlers::handle_list_campaigns)
                .post(campaigns::handlers::handle_create_campaign),
        )
        .route(
            "/api/campaigns/:id",
            get(campaigns::handlers::handle_get_campaign)
                .patch(campaigns::handlers::handle_update_campaign)
                .delete(campaigns::handlers::handle_delete_campaign),
        )
        // Prospects
        .route(
            "/api/prospects",
            get(prospects::handlers::handle_list_prospects)
                .post(prospects::handlers::handle_create_prospect),
        )
        .route(
            "/api/prospects/bulk",
            post(prospects::handlers::handle_bulk_prospects),
        )
        .route(
            "/api/prospects/:id",
            get(prospects::handlers::handle_get_prospect)
                .patch(prospects::handlers::handle_update_prospect)
                .delete(prospects::handlers::handle_delete_prospect),
        )
        // LinkedIn relay
        .route("/api/unipile/connect", post(unipile::handlers::handle_connect))
        .route("/api/unipile/verify", post(unipile::handlers::handle_verify))
        .route(
            "/api/unipile/accounts",
            get(unipile::handlers::handle_list_accounts),
        )
        .route(
            "/api/unipile/accounts/:account_id",
            delete(unipile::handlers::handle_delete_account),
        )
        .route("/api/unipile/search", post(unipile::handlers::handle_search))
        .route(
            "/api/unipile/send-message",
            post(unipile::handlers::handle_send_message),
        )
        .route("/api/unipile/invite", post(unipile::handlers::handle_invite))
        // Messages and e-mail
        .route("/api/messages", get(unipile::handlers::handle_list_messages))
        .route(
            "/api/messages/send-email",
            post(email::handlers::handle_send_email),
        )
        .route(
            "/api/messages/sent-emails",
            get(email::handlers::handle_list_sent_emails),
        )
        // Settings
        .route(
            "/api/settings/email-accounts",
            get(email::handlers::handle_get_email_accounts)
                .put(email::handlers::handle_save_email_accounts),
        )
        .route(
            "/api/settings/ai",
            get(compose::handlers::handle_get_ai_settings)
                .put(compose::handlers::handle_save_ai_settings),
        )
        // AI
        .route(
            "/api/ai/generate-message",
            post(compose::handlers::handle_generate_message),
        )
        // Admin
        .route("/api/admin/users", get(admin::handlers::handle_list_users))
        .route(
            "/api/admin/users/:id",
            patch(admin::handlers::handle_update_user),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::lazy_state as test_state;

    #[tokio::test]
    async fn test_health_is_public() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_bearer_token() {
        for uri in ["/api/prospects", "/api/campaigns", "/api/admin/users"] {
            let app = build_router(test_state());
            let response = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_invalid_token_rejected_before_database() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/prospects")
                    .header("authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
