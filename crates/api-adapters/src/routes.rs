use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

use crate::handlers::{availability, ops, pages, rooms};
use crate::middleware::session_cookie;
use crate::state::AppState;

fn build_page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route(
            "/search-availability",
            get(pages::search_page).post(pages::search_submit),
        )
        .route("/choose-room", get(pages::choose_room_page))
        .route("/choose-room/{id}", get(pages::choose_room))
        .route("/book-room", get(pages::book_room))
        .route(
            "/make-reservation",
            get(pages::reservation_page).post(pages::reservation_submit),
        )
        .route("/reservation-summary", get(pages::summary_page))
}

fn build_api_routes() -> Router<AppState> {
    Router::new()
        .route("/search-availability-json", post(availability::availability_json))
        .route("/rooms", get(rooms::list_rooms))
        .route("/rooms/{id}", get(rooms::show_room))
        .route("/rooms/{id}/restrictions", get(rooms::room_restrictions))
}

fn build_ops_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
}

/// The complete application: pages behind the session cookie layer, the
/// stateless endpoints beside them, request ids and tracing around all.
pub fn build_router(state: AppState) -> Router {
    let pages = build_page_routes().layer(from_fn_with_state(state.clone(), session_cookie));

    Router::new()
        .merge(pages)
        .merge(build_api_routes())
        .merge(build_ops_routes())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
