//! Route handlers for the admin ledger endpoints and the trigger surface.
//!
//! Handlers are generic over the backend `B` and registered against concrete types in
//! [`crate::server::create_server_instance`]. The trigger endpoints deliberately return 5xx on ledger
//! failures so the upstream relay redelivers the event; the engine's idempotency markers make the
//! redelivery safe.
use actix_web::{get, web, HttpResponse, Responder};
use care_payment_engine::{
    db_types::{NewMessage, OrderDoc, OrderId, Role},
    traits::AccountManagement,
    AccountApi,
    LedgerApi,
    LedgerDatabase,
    OrderFlowApi,
};
use log::*;

use crate::{
    auth::AuthenticatedCaller,
    data_objects::{
        AdjustmentRequest,
        BalanceResponse,
        CouponRegistration,
        HistoryResponse,
        JsonResponse,
        PushTokenUpdate,
        WorkerRegistration,
    },
    errors::ServerError,
};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//--------------------------------------------   Admin ledger  -------------------------------------------------

pub async fn settle<B: LedgerDatabase>(
    auth: AuthenticatedCaller,
    body: web::Json<AdjustmentRequest>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💳️ POST settle {} for {}", req.amount, req.nurse_id);
    let new_balance = api.settle_balance(auth.caller(), &req.nurse_id, req.amount, &req.note).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse { success: true, nurse_id: req.nurse_id, new_balance }))
}

pub async fn payout<B: LedgerDatabase>(
    auth: AuthenticatedCaller,
    body: web::Json<AdjustmentRequest>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💳️ POST payout {} for {}", req.amount, req.nurse_id);
    let new_balance = api.payout(auth.caller(), &req.nurse_id, req.amount, &req.note).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse { success: true, nurse_id: req.nurse_id, new_balance }))
}

/// Support-staff lookup of a single mirrored order.
pub async fn order_by_id<B: AccountManagement>(
    auth: AuthenticatedCaller,
    path: web::Path<String>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    auth.require_role(Role::Admin)?;
    let order_id = OrderId::from(path.into_inner());
    let order = api
        .order_by_order_id(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id}")))?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn history<B: LedgerDatabase>(
    auth: AuthenticatedCaller,
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let worker_id = path.into_inner();
    let (account, entries) = api.history(auth.caller(), &worker_id).await?;
    debug!("💳️ Returning {} ledger entries for {worker_id}", entries.len());
    Ok(HttpResponse::Ok().json(HistoryResponse { account, entries }))
}

//-------------------------------------------   Trigger surface  -----------------------------------------------

pub async fn incoming_order_created<B: LedgerDatabase>(
    auth: AuthenticatedCaller,
    body: web::Json<OrderDoc>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    auth.require_role(Role::Service)?;
    let doc = body.into_inner();
    let (order, created) = api.process_order_created(doc).await?;
    let message = if created {
        format!("Order {} created", order.order_id)
    } else {
        format!("Order {} already known", order.order_id)
    };
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

pub async fn incoming_order_updated<B: LedgerDatabase>(
    auth: AuthenticatedCaller,
    body: web::Json<OrderDoc>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    auth.require_role(Role::Service)?;
    let doc = body.into_inner();
    // Every ledger failure becomes a 5xx here, even "not found": the relay delivers triggers out of order at
    // times, and a redelivery after the missing account arrives will succeed.
    let outcome = api.process_order_update(doc).await.map_err(|e| {
        warn!("🔄️ Order update trigger failed and will be redelivered: {e}");
        ServerError::BackendError(e.to_string())
    })?;
    let message = format!("Order {}: {} transition(s)", outcome.order.order_id, outcome.transitions.len());
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

pub async fn incoming_message<B: LedgerDatabase>(
    auth: AuthenticatedCaller,
    body: web::Json<NewMessage>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    auth.require_role(Role::Service)?;
    api.process_new_message(body.into_inner()).await;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Message queued for delivery")))
}

pub async fn incoming_worker_registered<B: LedgerDatabase>(
    auth: AuthenticatedCaller,
    body: web::Json<WorkerRegistration>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    auth.require_role(Role::Service)?;
    let req = body.into_inner();
    let account = api.db().register_worker_account(&req.worker_id, req.fcm_token).await?;
    info!("🧑️ Worker {} registered with balance {}", account.worker_id, account.payout_balance);
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Worker {} registered", account.worker_id))))
}

pub async fn incoming_push_token<B: LedgerDatabase>(
    auth: AuthenticatedCaller,
    body: web::Json<PushTokenUpdate>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    auth.require_role(Role::Service)?;
    let req = body.into_inner();
    api.db().set_push_token(&req.user_id, &req.token).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Push token stored")))
}

pub async fn incoming_coupon_created<B: LedgerDatabase>(
    auth: AuthenticatedCaller,
    body: web::Json<CouponRegistration>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    auth.require_role(Role::Service)?;
    let req = body.into_inner();
    api.db().upsert_coupon(&req.code).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Coupon {} registered", req.code))))
}
