// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    chat::ChatConfig,
    domain::{
        AuthProvider, Entitlements, Subscription, SubscriptionPlatform, SubscriptionType, User,
    },
    models::{
        AuthRequest, ChatRequest, ChatResponse, GuestRequest, MessageResponse,
        SetEntitlementsRequest, UpdatePromptRequest, UserResponse,
    },
    state::AppState,
};

pub mod admin;
pub mod chat;
pub mod health;
pub mod sessions;

pub fn router(state: AppState) -> Router {
    let api_v1 = Router::new()
        // Sessions
        .route("/guest", post(sessions::guest_session))
        .route("/auth", post(sessions::authenticate))
        // Chat
        .route("/next-message", post(chat::next_message))
        .route("/summarize", post(chat::summarize))
        // Admin
        .route("/set-entitlements", post(admin::set_entitlements))
        .route("/update-config", post(admin::update_config))
        .route("/update-prompt", post(admin::update_prompt));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Outermost first
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive());

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        sessions::guest_session,
        sessions::authenticate,
        chat::next_message,
        chat::summarize,
        admin::set_entitlements,
        admin::update_config,
        admin::update_prompt,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            User,
            AuthProvider,
            Entitlements,
            Subscription,
            SubscriptionType,
            SubscriptionPlatform,
            ChatConfig,
            GuestRequest,
            AuthRequest,
            UserResponse,
            ChatRequest,
            ChatResponse,
            SetEntitlementsRequest,
            UpdatePromptRequest,
            MessageResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Sessions", description = "Guest and provider sign-in"),
        (name = "Chat", description = "Quota-metered conversation"),
        (name = "Admin", description = "Entitlement and model administration"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
