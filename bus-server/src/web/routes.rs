//! HTTP route handlers.

use askama::Template;
use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tracing::{error, warn};
use uuid::Uuid;

use crate::checkout::{self, CheckoutError, CheckoutRequest, Contact};
use crate::domain::{BusId, SeatId, parse_optional_travel_date};
use crate::search::{self, SearchError, SearchRequest};
use crate::seatmap::{ProceedError, SeatMap, SeatMapInputs, Toggle};
use crate::stations::{DEFAULT_LIMIT, DEFAULT_STATIONS};
use crate::store::{BookingStore, StoreError};

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/api/stations/search", get(search_stations))
        .route("/search", get(search_buses))
        .route("/buses/:bus_id/seats", post(open_seat_map))
        .route("/seatmap/:session", get(show_seat_map))
        .route("/seatmap/:session/toggle/:seat", post(toggle_seat))
        .route("/seatmap/:session/proceed", post(proceed_to_checkout))
        .route("/checkout", get(checkout_page).post(submit_checkout))
        .route("/bookings", get(list_bookings))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Index page with search form.
async fn index_page() -> Result<Response, AppError> {
    let template = IndexTemplate {
        stations: DEFAULT_STATIONS.iter().map(|s| s.to_string()).collect(),
        today: today(),
    };
    render(&template)
}

/// Station name suggestions.
async fn search_stations(
    State(state): State<AppState>,
    Query(req): Query<StationSearchRequest>,
) -> Json<StationSearchResponse> {
    let limit = req.limit.unwrap_or(DEFAULT_LIMIT);
    let stations = state.station_names.search(&req.q, limit).await;
    Json(StationSearchResponse { stations })
}

/// Check if request accepts HTML.
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Render a template as an HTML response.
fn render(template: &impl Template) -> Result<Response, AppError> {
    let html = template.render().map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })?;
    Ok(Html(html).into_response())
}

/// Turn a handler result into a response, rendering errors as an HTML page
/// for browsers and as JSON otherwise.
fn respond(html: bool, result: Result<Response, AppError>) -> Response {
    match result {
        Ok(response) => response,
        Err(e) if html => e.into_page(),
        Err(e) => e.into_response(),
    }
}

/// Search buses on a route.
async fn search_buses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let html = accepts_html(&headers);
    let params = BusSearchParams::from_pairs(pairs);
    let request = SearchRequest::from_params(
        params.source.as_deref(),
        params.destination.as_deref(),
        params.date.as_deref(),
        params.bus_type.as_deref(),
    );

    let result = match request {
        Ok(request) => run_search(&state, html, request).await,
        // An incomplete form shows an empty results page rather than an error
        Err(e @ (SearchError::MissingSource | SearchError::MissingDestination)) if html => {
            render(&SearchResultsTemplate {
                source: params.source.clone().unwrap_or_default(),
                destination: params.destination.clone().unwrap_or_default(),
                date: params.date.clone().unwrap_or_default(),
                filters: TypeFilterView::all(&[]),
                buses: Vec::new(),
                notice: Some(e.to_string()),
            })
        }
        Err(e) => Err(e.into()),
    };
    respond(html, result)
}

async fn run_search(state: &AppState, html: bool, request: SearchRequest) -> Result<Response, AppError> {
    let results = search::search(&state.store, request).await?;
    let buses = results.buses();

    if html {
        let request = &results.request;
        render(&SearchResultsTemplate {
            source: request.source.clone(),
            destination: request.destination.clone(),
            date: date_param(request.date),
            filters: TypeFilterView::all(&request.types),
            buses: buses.iter().map(|b| BusView::from_bus(b)).collect(),
            notice: None,
        })
    } else {
        Ok(Json(BusSearchResponse {
            count: buses.len(),
            buses: buses.iter().map(|b| BusResult::from_bus(b)).collect(),
        })
        .into_response())
    }
}

/// Open a seat map session for a bus.
async fn open_seat_map(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(bus_id): Path<String>,
    Query(params): Query<OpenSeatMapParams>,
) -> Response {
    let html = accepts_html(&headers);
    respond(html, open_seat_map_inner(&state, html, &bus_id, params).await)
}

async fn open_seat_map_inner(
    state: &AppState,
    html: bool,
    bus_id: &str,
    params: OpenSeatMapParams,
) -> Result<Response, AppError> {
    let bus_id = BusId::parse(bus_id).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    let date = parse_optional_travel_date(params.date.as_deref()).map_err(|e| {
        AppError::BadRequest {
            message: e.to_string(),
        }
    })?;
    let bus = state
        .store
        .get_bus(&bus_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            message: format!("bus {} not found", bus_id),
        })?;

    let inputs = SeatMapInputs::new(Some(bus_id), date, bus.fare);
    let (session, map) = state.sessions.open(state.store.as_ref(), inputs).await;

    if html {
        Ok(Redirect::to(&format!("/seatmap/{}", session)).into_response())
    } else {
        Ok((StatusCode::CREATED, Json(SeatMapResponse::new(session, &map))).into_response())
    }
}

fn parse_session(session: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(session).map_err(|_| AppError::NotFound {
        message: "seat map session not found".to_string(),
    })
}

async fn load_session(state: &AppState, session: &str) -> Result<(Uuid, SeatMap), AppError> {
    let id = parse_session(session)?;
    let map = state.sessions.get(&id).await.ok_or_else(|| AppError::NotFound {
        message: "seat map session not found or expired".to_string(),
    })?;
    Ok((id, map))
}

/// Render a seat map session.
async fn show_seat_map(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session): Path<String>,
) -> Response {
    let html = accepts_html(&headers);
    respond(html, show_seat_map_inner(&state, html, &session).await)
}

async fn show_seat_map_inner(
    state: &AppState,
    html: bool,
    session: &str,
) -> Result<Response, AppError> {
    let (id, map) = load_session(state, session).await?;
    if !html {
        return Ok(Json(SeatMapResponse::new(id, &map)).into_response());
    }

    // The bus only decorates the page; a failed lookup still shows the map
    let bus = match map.bus_id() {
        Some(bus_id) => state.store.get_bus(bus_id).await.unwrap_or_else(|e| {
            warn!(%bus_id, error = %e, "bus lookup failed for seat map page");
            None
        }),
        None => None,
    };
    render(&SeatMapTemplate::new(id.to_string(), bus.as_deref(), &map))
}

/// Toggle one seat in a session.
async fn toggle_seat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((session, seat)): Path<(String, String)>,
) -> Response {
    let html = accepts_html(&headers);
    respond(html, toggle_seat_inner(&state, html, &session, &seat).await)
}

async fn toggle_seat_inner(
    state: &AppState,
    html: bool,
    session: &str,
    seat: &str,
) -> Result<Response, AppError> {
    let id = parse_session(session)?;
    let seat = SeatId::parse_normalized(seat).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    let (map, outcome) = state
        .sessions
        .toggle(&id, seat)
        .await
        .ok_or_else(|| AppError::NotFound {
            message: "seat map session not found or expired".to_string(),
        })?;
    if outcome == Toggle::OutOfLayout {
        return Err(AppError::BadRequest {
            message: format!("seat {} is not on this bus", seat),
        });
    }

    if html {
        Ok(Redirect::to(&format!("/seatmap/{}", id)).into_response())
    } else {
        Ok(Json(ToggleResponse {
            outcome,
            seat_map: SeatMapResponse::new(id, &map),
        })
        .into_response())
    }
}

/// Hand the selection to checkout.
async fn proceed_to_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session): Path<String>,
) -> Response {
    let html = accepts_html(&headers);
    respond(html, proceed_inner(&state, html, &session).await)
}

async fn proceed_inner(state: &AppState, html: bool, session: &str) -> Result<Response, AppError> {
    let id = parse_session(session)?;
    let handoff = state
        .sessions
        .proceed(&id)
        .await
        .ok_or_else(|| AppError::NotFound {
            message: "seat map session not found or expired".to_string(),
        })??;
    let query = handoff.to_query_string().map_err(|e| AppError::Internal {
        message: format!("could not encode checkout link: {}", e),
    })?;
    let url = format!("/checkout?{}", query);

    if html {
        Ok(Redirect::to(&url).into_response())
    } else {
        Ok(Json(ProceedResponse::new(url, &handoff)).into_response())
    }
}

/// Checkout page for a handed-off selection.
async fn checkout_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CheckoutParams>,
) -> Response {
    let html = accepts_html(&headers);
    respond(html, checkout_page_inner(&state, html, params).await)
}

async fn checkout_page_inner(
    state: &AppState,
    html: bool,
    params: CheckoutParams,
) -> Result<Response, AppError> {
    let request = CheckoutRequest::from_params(
        params.bus_id.as_deref(),
        params.seats.as_deref(),
        params.date.as_deref(),
        params.total.as_deref(),
    )?;
    let summary = checkout::prepare(&state.store, &request).await?;

    if html {
        render(&CheckoutTemplate {
            checkout: CheckoutView::from_summary(&summary),
        })
    } else {
        Ok(Json(CheckoutResponse::from_summary(&summary)).into_response())
    }
}

/// Submit a booking.
async fn submit_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let html = accepts_html(&headers);
    respond(html, submit_checkout_inner(&state, html, form).await)
}

async fn submit_checkout_inner(
    state: &AppState,
    html: bool,
    form: CheckoutForm,
) -> Result<Response, AppError> {
    let request = CheckoutRequest::from_params(
        form.bus_id.as_deref(),
        form.seats.as_deref(),
        form.date.as_deref(),
        None,
    )?;
    let contact = Contact::parse(&form.email, &form.phone)?;
    let booking = checkout::submit(&state.store, &request, &contact).await?;

    if html {
        Ok(Redirect::to("/bookings").into_response())
    } else {
        Ok((StatusCode::CREATED, Json(BookingResult::from_booking(&booking))).into_response())
    }
}

/// Past bookings, newest first.
async fn list_bookings(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let html = accepts_html(&headers);
    respond(html, list_bookings_inner(&state, html).await)
}

async fn list_bookings_inner(state: &AppState, html: bool) -> Result<Response, AppError> {
    let bookings = state.store.list_bookings().await?;

    if html {
        render(&BookingsTemplate {
            bookings: bookings.iter().map(BookingView::from_booking).collect(),
        })
    } else {
        Ok(Json(BookingsResponse {
            bookings: bookings.iter().map(BookingResult::from_booking).collect(),
        })
        .into_response())
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Internal { message: String },
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Conflict { message }
            | AppError::Internal { message } => message,
        }
    }

    fn log(&self) {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, message = self.message(), "request failed");
        } else {
            warn!(%status, message = self.message(), "request rejected");
        }
    }

    /// Render as an HTML error page.
    fn into_page(self) -> Response {
        self.log();
        let status = self.status();
        let template = ErrorTemplate {
            title: status
                .canonical_reason()
                .unwrap_or("Something went wrong")
                .to_string(),
            message: self.message().to_string(),
        };
        match template.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => (status, format!("Template error: {}", e)).into_response(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(message) => AppError::Conflict { message },
            other => AppError::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<ProceedError> for AppError {
    fn from(e: ProceedError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(e: CheckoutError) -> Self {
        let message = e.to_string();
        match e {
            CheckoutError::BusNotFound(_) => AppError::NotFound { message },
            CheckoutError::SeatsTaken(_) | CheckoutError::Rejected(_) => {
                AppError::Conflict { message }
            }
            CheckoutError::Store(e) => e.into(),
            CheckoutError::InvalidBus(_)
            | CheckoutError::NoSeats
            | CheckoutError::InvalidSeat(_)
            | CheckoutError::SeatOutsideLayout(_)
            | CheckoutError::InvalidDate(_)
            | CheckoutError::MissingDate
            | CheckoutError::InvalidEmail
            | CheckoutError::MissingPhone => AppError::BadRequest { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.message().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_html_checks_header() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_html(&headers));

        headers.insert(header::ACCEPT, "application/json".parse().unwrap());
        assert!(!accepts_html(&headers));

        headers.insert(
            header::ACCEPT,
            "text/html,application/xhtml+xml;q=0.9".parse().unwrap(),
        );
        assert!(accepts_html(&headers));
    }

    #[test]
    fn checkout_errors_map_to_status() {
        let taken = CheckoutError::SeatsTaken(vec![SeatId::parse("A1").unwrap()]);
        assert_eq!(AppError::from(taken).status(), StatusCode::CONFLICT);

        let rejected = CheckoutError::from(StoreError::Conflict("duplicate".into()));
        assert_eq!(AppError::from(rejected).status(), StatusCode::CONFLICT);

        assert_eq!(
            AppError::from(CheckoutError::InvalidEmail).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CheckoutError::BusNotFound(BusId::parse("x").unwrap())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(CheckoutError::Store(StoreError::RateLimited)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn empty_selection_is_bad_request() {
        let err = AppError::from(ProceedError::EmptySelection);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "select at least one seat to continue");
    }

    #[test]
    fn invalid_session_is_not_found() {
        let err = parse_session("not-a-uuid").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn error_body_is_json() {
        let response = AppError::Conflict {
            message: "seats already booked: A1".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    async fn state() -> AppState {
        use std::sync::Arc;

        use crate::seatmap::{SeatMapSessions, SessionConfig};
        use crate::stations::StationNames;
        use crate::store::{CacheConfig, CachedStore, fixtures};

        let inner: Arc<dyn BookingStore> = Arc::new(fixtures::store());
        AppState::new(
            CachedStore::new(inner.clone(), &CacheConfig::default()),
            SeatMapSessions::new(&SessionConfig::default()),
            StationNames::load(inner).await,
        )
    }

    fn location(response: &Response) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn seat_map_flow_hands_off_to_checkout() {
        let state = state().await;
        let params = OpenSeatMapParams {
            date: Some("2024-03-15".into()),
        };
        let opened = open_seat_map_inner(&state, true, "bus-1", params).await.unwrap();
        assert_eq!(opened.status(), StatusCode::SEE_OTHER);
        let page = location(&opened);
        let session = page.trim_start_matches("/seatmap/").to_string();

        for seat in ["C4", "C3", "A1"] {
            let toggled = toggle_seat_inner(&state, true, &session, seat).await.unwrap();
            assert_eq!(location(&toggled), page);
        }
        let map = state.sessions.get(&parse_session(&session).unwrap()).await.unwrap();
        assert_eq!(map.total().to_string(), "₹1000");

        let err = toggle_seat_inner(&state, false, &session, "K9").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let proceeded = proceed_inner(&state, true, &session).await.unwrap();
        assert_eq!(proceeded.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&proceeded),
            "/checkout?busId=bus-1&seats=C3%2CC4&total=1000&date=2024-03-15"
        );

        // The session is gone once handed off
        let err = proceed_inner(&state, true, &session).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn proceed_without_seats_is_rejected() {
        let state = state().await;
        let opened = open_seat_map_inner(&state, false, "bus-1", OpenSeatMapParams::default())
            .await
            .unwrap();
        assert_eq!(opened.status(), StatusCode::CREATED);

        let inputs = SeatMapInputs::new(BusId::parse("bus-1").ok(), None, Default::default());
        let (session, _) = state.sessions.open(state.store.as_ref(), inputs).await;
        let err = proceed_inner(&state, false, &session.to_string()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "select at least one seat to continue");
    }

    #[tokio::test]
    async fn unknown_bus_is_not_found() {
        let err = open_seat_map_inner(&state().await, false, "bus-404", OpenSeatMapParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn error_page_is_html() {
        let response = AppError::NotFound {
            message: "bus x not found".into(),
        }
        .into_page();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
    }
}
