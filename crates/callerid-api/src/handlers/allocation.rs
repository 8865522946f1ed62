//! Allocation handlers
//!
//! HTTP handlers for the `Allocate`/`Release`/`LookupReservation` surface
//! (`spec.md` §6). Thin: validation and orchestration both live in
//! `callerid_allocator::Allocator`; handlers only translate between JSON
//! and the engine's types.

use crate::dto::{AllocateRequestDto, AllocateResponseDto, ApiResponse, ReleaseResponseDto, ReservationResponseDto};
use crate::AppAllocator;
use actix_web::{web, HttpResponse};
use callerid_core::models::AllocationRequest;
use callerid_core::traits::DeleteOutcome;
use callerid_core::AppError;
use std::sync::Arc;
use tracing::{debug, instrument};
use validator::Validate;

/// Request a caller-ID.
///
/// POST /api/v1/allocations
#[instrument(skip(allocator, body))]
pub async fn allocate(
    allocator: web::Data<Arc<AppAllocator>>,
    body: web::Json<AllocateRequestDto>,
) -> Result<HttpResponse, AppError> {
    let req: AllocationRequest = body.into_inner().into();
    req.validate()?;

    debug!("Allocating for campaign={} agent={}", req.campaign, req.agent);

    let allocation = allocator.allocate(&req).await?;
    let response: AllocateResponseDto = allocation.into();

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// Release a caller-ID's reservation.
///
/// DELETE /api/v1/allocations/{number}
#[instrument(skip(allocator))]
pub async fn release(
    allocator: web::Data<Arc<AppAllocator>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let number = path.into_inner();
    debug!("Releasing reservation for {}", number);

    let outcome = allocator.release(&number).await?;
    let response = ReleaseResponseDto {
        deleted: outcome == DeleteOutcome::Deleted,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// Look up the live reservation for a caller-ID, if any.
///
/// GET /api/v1/allocations/{number}
#[instrument(skip(allocator))]
pub async fn lookup_reservation(
    allocator: web::Data<Arc<AppAllocator>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let number = path.into_inner();
    debug!("Looking up reservation for {}", number);

    match allocator.lookup_reservation(&number).await? {
        Some(reservation) => {
            let response: ReservationResponseDto = reservation.into();
            Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
        }
        None => Err(AppError::NotFound(format!("no active reservation for {}", number))),
    }
}

/// Configure allocation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/allocations")
            .route("", web::post().to(allocate))
            .route("/{number}", web::get().to(lookup_reservation))
            .route("/{number}", web::delete().to(release)),
    );
}
