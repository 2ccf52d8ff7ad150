use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use driveconnect_common::{ApiResponse, AppError, UserRole};
use driveconnect_database::{Instructor, Slot};

use crate::access::{self, CallerView};
use crate::accounts::AccountService;
use crate::bookings::BookingService;
use crate::extractor::CurrentUser;
use crate::instructors::InstructorService;
use crate::models::{
    AuthResponse, BookingAction, BookingActionOutcome, BookingActionRequest, BookingResponse,
    CreateBookingRequest, CreateSlotRequest, InstructorListing, LoginRequest, RegisterRequest,
    SlotsQuery, UpdateInstructorRequest,
};
use crate::slots::SlotService;
use crate::state::AppState;

type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

fn error_response(err: AppError) -> ErrorResponse {
    let status = err.status_code();
    if status == 500 {
        tracing::error!("Request failed: {:?}", err);
    }
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ApiResponse::error(err.public_message())),
    )
}

// Health check
pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success("DriveConnect API is healthy".to_string()))
}

// Account registration
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ErrorResponse> {
    if let Err(validation_errors) = request.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation error: {:?}", validation_errors))),
        ));
    }

    AccountService::new(&state)
        .register(request)
        .await
        .map(|response| (StatusCode::CREATED, Json(ApiResponse::success(response))))
        .map_err(error_response)
}

// Account login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ErrorResponse> {
    AccountService::new(&state)
        .login(request)
        .await
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(error_response)
}

// Reserve a slot (students only)
pub async fn create_booking(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingResponse>>), ErrorResponse> {
    if user.claims.role != UserRole::Student {
        return Err(error_response(AppError::Authorization(
            "Students only".to_string(),
        )));
    }

    let slot_id = request
        .slot_id
        .ok_or_else(|| error_response(AppError::Validation("slotId is required".to_string())))?;

    BookingService::new(&state)
        .reserve(user.user_id, slot_id, request.external_payment_ref)
        .await
        .map(|booking| (StatusCode::CREATED, Json(ApiResponse::success(booking))))
        .map_err(error_response)
}

// List the caller's bookings, newest first
pub async fn list_bookings(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<BookingResponse>>>, ErrorResponse> {
    let caller = access::resolve_caller(&state.db_pool, &user)
        .await
        .map_err(error_response)?;

    BookingService::new(&state)
        .list_for(caller)
        .await
        .map(|bookings| Json(ApiResponse::success(bookings)))
        .map_err(error_response)
}

// Cancel, confirm or reject a booking
pub async fn update_booking(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<BookingActionRequest>,
) -> Result<Json<ApiResponse<BookingActionOutcome>>, ErrorResponse> {
    // The action is parsed at the boundary: unknown values never reach the
    // store.
    let action = BookingAction::parse(request.action.as_deref()).map_err(error_response)?;

    BookingService::new(&state)
        .apply_action(&user, booking_id, action)
        .await
        .map(|outcome| Json(ApiResponse::success(outcome)))
        .map_err(error_response)
}

// Public listing of an instructor's available future slots
pub async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<ApiResponse<Vec<Slot>>>, ErrorResponse> {
    let instructor_id = query.instructor_id.ok_or_else(|| {
        error_response(AppError::Validation("instructorId is required".to_string()))
    })?;

    SlotService::new(&state)
        .list_available(instructor_id)
        .await
        .map(|slots| Json(ApiResponse::success(slots)))
        .map_err(error_response)
}

// Publish a slot (instructors only)
pub async fn create_slot(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Slot>>), ErrorResponse> {
    let instructor_id = require_instructor(&state, &user).await?;

    SlotService::new(&state)
        .create(instructor_id, request)
        .await
        .map(|slot| (StatusCode::CREATED, Json(ApiResponse::success(slot))))
        .map_err(error_response)
}

// Delete an unbooked slot (owning instructor only)
pub async fn delete_slot(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<ApiResponse<String>>, ErrorResponse> {
    let instructor_id = require_instructor(&state, &user).await?;

    SlotService::new(&state)
        .delete(instructor_id, slot_id)
        .await
        .map(|_| Json(ApiResponse::success("Slot deleted successfully".to_string())))
        .map_err(error_response)
}

// Public discovery listing, ranked by visibility score
pub async fn list_instructors(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<InstructorListing>>>, ErrorResponse> {
    InstructorService::new(&state)
        .list_ranked()
        .await
        .map(|instructors| Json(ApiResponse::success(instructors)))
        .map_err(error_response)
}

// The caller's own instructor profile
pub async fn get_own_instructor(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Instructor>>, ErrorResponse> {
    require_instructor_role(&user)?;

    InstructorService::new(&state)
        .get_by_user(user.user_id)
        .await
        .map(|instructor| Json(ApiResponse::success(instructor)))
        .map_err(error_response)
}

pub async fn update_own_instructor(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<UpdateInstructorRequest>,
) -> Result<Json<ApiResponse<Instructor>>, ErrorResponse> {
    require_instructor_role(&user)?;

    InstructorService::new(&state)
        .update_own(user.user_id, request)
        .await
        .map(|instructor| Json(ApiResponse::success(instructor)))
        .map_err(error_response)
}

fn require_instructor_role(user: &CurrentUser) -> Result<(), ErrorResponse> {
    if user.claims.role != UserRole::Instructor {
        return Err(error_response(AppError::Authorization(
            "Instructors only".to_string(),
        )));
    }
    Ok(())
}

async fn require_instructor(state: &AppState, user: &CurrentUser) -> Result<Uuid, ErrorResponse> {
    require_instructor_role(user)?;

    match access::resolve_caller(&state.db_pool, user)
        .await
        .map_err(error_response)?
    {
        CallerView::Instructor { instructor_id, .. } => Ok(instructor_id),
        CallerView::Student(_) => Err(error_response(AppError::Authorization(
            "Instructors only".to_string(),
        ))),
    }
}
