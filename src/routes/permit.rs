use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::PermitError;
use crate::models::{
    checklist::{ChecklistAnswerRequest, ChecklistKind, CloseApproach, PartBHighRisk},
    crew_member::CrewMemberRequest,
    daily_log::{CrewSignOnRequest, DailyLogClearQuery, ReceiverSignOnRequest, RoleAssignRequest},
    handover_log::HandoverRequest,
    note::{PermitNoteRequest, PermitPhotoRequest},
    permit::{
        Permit, PermitClosureRequest, PermitDetailResponse, PermitQuery, PermitRequest,
        RiskAnswerRequest, SignatureSlot,
    },
    signature::SignatureRequest,
};

fn error_response(error: PermitError) -> HttpResponse {
    let code = error.code();
    match error {
        PermitError::Validation(_) => HttpResponse::BadRequest().body(code),
        PermitError::NotFound(_) => HttpResponse::NotFound().body(code),
        PermitError::Duplicate(_) | PermitError::InvalidState(_) => {
            HttpResponse::Conflict().body(code)
        }
        PermitError::Unauthorized(_) => {
            warn!(code, "authorisation refused");
            HttpResponse::Unauthorized().body(code)
        }
        PermitError::Database(_) => HttpResponse::InternalServerError().body(code),
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, PermitError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| PermitError::Validation("INVALID_DATE"))
}

#[get("/permits")]
pub async fn get_permits() -> HttpResponse {
    let query: PermitQuery = PermitQuery {
        status: None,
        limit: None,
    };

    match Permit::find_many(&query).await {
        Ok(permits) => HttpResponse::Ok().json(permits),
        Err(error) => error_response(error),
    }
}

#[get("/permits/{permit_id}")]
pub async fn get_permit(permit_id: web::Path<String>) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => HttpResponse::Ok().json(PermitDetailResponse::from(permit)),
        Ok(None) => HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => error_response(error),
    }
}

#[post("/permits")]
pub async fn create_permit(payload: web::Json<PermitRequest>) -> HttpResponse {
    let permit_number = match Permit::next_permit_number().await {
        Ok(permit_number) => permit_number,
        Err(error) => return error_response(error),
    };

    let mut permit = match Permit::new(payload.into_inner(), permit_number) {
        Ok(permit) => permit,
        Err(error) => return error_response(error),
    };

    match permit.save().await {
        Ok(permit_id) => {
            info!(permit = %permit.permit_number, "permit issued");
            HttpResponse::Created().body(permit_id.to_string())
        }
        Err(error) => error_response(error),
    }
}

#[post("/permits/{permit_id}/activate")]
pub async fn activate_permit(permit_id: web::Path<String>) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.activate() {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[put("/permits/{permit_id}/checklists/{kind}")]
pub async fn update_checklist_answer(
    path: web::Path<(String, String)>,
    payload: web::Json<ChecklistAnswerRequest>,
) -> HttpResponse {
    let (permit_id, kind) = path.into_inner();
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };
    let kind = match kind.as_str() {
        "part_a" => ChecklistKind::PartA,
        "part_b" => ChecklistKind::PartB,
        "receiver" => ChecklistKind::Receiver,
        _ => return HttpResponse::BadRequest().body("INVALID_CHECKLIST"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    let payload = payload.into_inner();
    if let Err(error) =
        permit.set_checklist_answer(kind, &payload.item_id, payload.answer, payload.comment)
    {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[put("/permits/{permit_id}/risk-answers")]
pub async fn update_risk_answer(
    permit_id: web::Path<String>,
    payload: web::Json<RiskAnswerRequest>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    let payload = payload.into_inner();
    if let Err(error) = permit.set_risk_answer(payload.question, payload.answer, payload.comment) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[put("/permits/{permit_id}/close-approach")]
pub async fn update_close_approach(
    permit_id: web::Path<String>,
    payload: web::Json<CloseApproach>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.set_close_approach(payload.into_inner()) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[put("/permits/{permit_id}/high-risk")]
pub async fn update_high_risk(
    permit_id: web::Path<String>,
    payload: web::Json<PartBHighRisk>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.set_high_risk(payload.into_inner()) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[put("/permits/{permit_id}/signatures/{slot}")]
pub async fn update_signature(
    path: web::Path<(String, String)>,
    payload: web::Json<SignatureRequest>,
) -> HttpResponse {
    let (permit_id, slot) = path.into_inner();
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };
    let slot = match slot.as_str() {
        "site_engineer" => SignatureSlot::SiteEngineer,
        "issuer" => SignatureSlot::Issuer,
        "receiver" => SignatureSlot::Receiver,
        "approver" => SignatureSlot::Approver,
        _ => return HttpResponse::BadRequest().body("INVALID_SIGNATURE_SLOT"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.sign_slot(slot, payload.into_inner()) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[post("/permits/{permit_id}/crew")]
pub async fn register_crew_member(
    permit_id: web::Path<String>,
    payload: web::Json<CrewMemberRequest>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    let member_id = match permit.register_crew_member(payload.into_inner()) {
        Ok(member_id) => member_id,
        Err(error) => return error_response(error),
    };

    match permit.update().await {
        Ok(_) => HttpResponse::Created().body(member_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[post("/permits/{permit_id}/daily-logs/crew")]
pub async fn sign_on_crew(
    permit_id: web::Path<String>,
    payload: web::Json<CrewSignOnRequest>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    let payload = payload.into_inner();
    let date = match parse_date(&payload.date) {
        Ok(date) => date,
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.sign_on_crew(&payload.member_id, date) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[post("/permits/{permit_id}/daily-logs/roles")]
pub async fn assign_role(
    permit_id: web::Path<String>,
    payload: web::Json<RoleAssignRequest>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    let payload = payload.into_inner();
    let date = match parse_date(&payload.date) {
        Ok(date) => date,
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.assign_role(&payload.member_id, payload.role, date) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[post("/permits/{permit_id}/daily-logs/receiver")]
pub async fn sign_on_receiver(
    permit_id: web::Path<String>,
    payload: web::Json<ReceiverSignOnRequest>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    let date = match parse_date(&payload.date) {
        Ok(date) => date,
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.sign_on_receiver(date) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[delete("/permits/{permit_id}/daily-logs")]
pub async fn clear_role(
    permit_id: web::Path<String>,
    query: web::Query<DailyLogClearQuery>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    let date = match parse_date(&query.date) {
        Ok(date) => date,
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.clear_role(query.role, date) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[post("/permits/{permit_id}/handovers")]
pub async fn record_handover(
    permit_id: web::Path<String>,
    payload: web::Json<HandoverRequest>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    let payload = payload.into_inner();
    let date = match parse_date(&payload.date) {
        Ok(date) => date,
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.record_handover(payload.receiver_name, date, payload.signature) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => {
            info!(permit = %permit.permit_number, "custody transferred");
            HttpResponse::Created().body(permit_id.to_string())
        }
        Err(error) => error_response(error),
    }
}

#[post("/permits/{permit_id}/closure")]
pub async fn close_permit(
    permit_id: web::Path<String>,
    payload: web::Json<PermitClosureRequest>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.close(payload.into_inner()) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => {
            info!(permit = %permit.permit_number, "permit closed");
            HttpResponse::Ok().body(permit_id.to_string())
        }
        Err(error) => error_response(error),
    }
}

#[post("/permits/{permit_id}/notes")]
pub async fn add_note(
    permit_id: web::Path<String>,
    payload: web::Json<PermitNoteRequest>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    let note_id = match permit.add_note(payload.into_inner()) {
        Ok(note_id) => note_id,
        Err(error) => return error_response(error),
    };

    match permit.update().await {
        Ok(_) => HttpResponse::Created().body(note_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[delete("/permits/{permit_id}/notes/{note_id}")]
pub async fn remove_note(path: web::Path<(String, String)>) -> HttpResponse {
    let (permit_id, note_id) = path.into_inner();
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };
    let note_id = match note_id.parse() {
        Ok(note_id) => note_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.remove_note(&note_id) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[post("/permits/{permit_id}/photos")]
pub async fn add_photo(
    permit_id: web::Path<String>,
    payload: web::Json<PermitPhotoRequest>,
) -> HttpResponse {
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    let photo_id = match permit.add_photo(payload.into_inner()) {
        Ok(photo_id) => photo_id,
        Err(error) => return error_response(error),
    };

    match permit.update().await {
        Ok(_) => HttpResponse::Created().body(photo_id.to_string()),
        Err(error) => error_response(error),
    }
}

#[delete("/permits/{permit_id}/photos/{photo_id}")]
pub async fn remove_photo(path: web::Path<(String, String)>) -> HttpResponse {
    let (permit_id, photo_id) = path.into_inner();
    let permit_id = match permit_id.parse() {
        Ok(permit_id) => permit_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };
    let photo_id = match photo_id.parse() {
        Ok(photo_id) => photo_id,
        Err(_) => return HttpResponse::BadRequest().body("INVALID_ID"),
    };

    let mut permit = match Permit::find_by_id(&permit_id).await {
        Ok(Some(permit)) => permit,
        Ok(None) => return HttpResponse::NotFound().body("PERMIT_NOT_FOUND"),
        Err(error) => return error_response(error),
    };

    if let Err(error) = permit.remove_photo(&photo_id) {
        return error_response(error);
    }

    match permit.update().await {
        Ok(permit_id) => HttpResponse::Ok().body(permit_id.to_string()),
        Err(error) => error_response(error),
    }
}
