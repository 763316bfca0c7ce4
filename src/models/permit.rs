use crate::database::get_db;
use chrono::{NaiveDate, Utc};
use futures::stream::StreamExt;
use mongodb::{
    bson::{doc, from_document, oid::ObjectId, to_bson, DateTime},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

use super::{
    checklist::{ChecklistAnswer, ChecklistItem, ChecklistKind, CloseApproach, PartBHighRisk},
    crew_member::{CrewMember, CrewMemberRequest},
    daily_log::{DailyLog, DailyLogRole},
    handover_log::HandoverLog,
    note::{PermitNote, PermitNoteRequest, PermitPhoto, PermitPhotoRequest, PHOTO_LIMIT},
    signature::{Signature, SignatureRequest},
};
use crate::error::PermitError;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermitStatus {
    Draft,
    Active,
    Closed,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExcavationType {
    Mechanical,
    Hydro,
    Hand,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskQuestion {
    KnownServicesScanned,
    ServicesMarked,
    PotholingMarkers,
    TranspowerDesignation,
    WatercareWorksOver,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignatureSlot {
    SiteEngineer,
    Issuer,
    Receiver,
    Approver,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Permit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub permit_number: String,
    pub itwocx_number: Option<String>,
    pub status: PermitStatus,
    pub created_at: DateTime,
    pub location: String,
    pub scope_of_works: String,
    pub excavation_type: ExcavationType,
    pub reveal_model_layer: bool,
    pub sub_layers: bool,
    pub eba_construction_layer: bool,
    pub as_built_layers: bool,
    pub known_services_scanned: Option<ChecklistAnswer>,
    pub known_services_scanned_comment: Option<String>,
    pub services_marked: Option<ChecklistAnswer>,
    pub services_marked_comment: Option<String>,
    pub potholing_markers: Option<ChecklistAnswer>,
    pub potholing_markers_comment: Option<String>,
    pub transpower_designation: Option<ChecklistAnswer>,
    pub transpower_designation_comment: Option<String>,
    pub watercare_works_over: Option<ChecklistAnswer>,
    pub watercare_works_over_comment: Option<String>,
    pub part_a_checklist: Vec<ChecklistItem>,
    pub part_a_potholing_method: String,
    pub part_a_frequency: String,
    pub part_a_overhead_protection: String,
    pub part_a_close_approach: CloseApproach,
    pub part_b_checklist: Vec<ChecklistItem>,
    pub part_b_high_risk: PartBHighRisk,
    pub receiver_checklist: Vec<ChecklistItem>,
    pub site_engineer_signature: Option<Signature>,
    pub issuer_signature: Option<Signature>,
    pub receiver_signature: Option<Signature>,
    pub approver_signature: Option<Signature>,
    pub crew_members: Vec<CrewMember>,
    pub daily_logs: Vec<DailyLog>,
    pub handover_logs: Vec<HandoverLog>,
    pub notes: Vec<PermitNote>,
    pub photos: Vec<PermitPhoto>,
    pub closure_date: Option<DateTime>,
    pub closure_receiver_name: Option<String>,
    pub closure_signature: Option<Signature>,
    pub closure_excavation_safe: Option<bool>,
    pub closure_as_built_returned: Option<bool>,
    pub closure_outstanding_acknowledged: Option<bool>,
    pub closure_outstanding_details: Option<String>,
}

#[derive(Debug)]
pub struct PermitQuery {
    pub status: Option<PermitStatus>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PermitRequest {
    pub itwocx_number: Option<String>,
    pub status: Option<PermitStatus>,
    pub location: String,
    pub scope_of_works: String,
    pub excavation_type: ExcavationType,
    pub reveal_model_layer: bool,
    pub sub_layers: bool,
    pub eba_construction_layer: bool,
    pub as_built_layers: bool,
    pub part_a_potholing_method: String,
    pub part_a_frequency: String,
    pub part_a_overhead_protection: String,
    pub part_a_close_approach: Option<CloseApproach>,
    pub part_b_high_risk: Option<PartBHighRisk>,
    pub site_engineer_signature: Option<SignatureRequest>,
    pub issuer_signature: Option<SignatureRequest>,
    pub receiver_signature: Option<SignatureRequest>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RiskAnswerRequest {
    pub question: RiskQuestion,
    pub answer: Option<ChecklistAnswer>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PermitClosureRequest {
    pub receiver_name: String,
    pub signature: Option<SignatureRequest>,
    pub excavation_safe: bool,
    pub as_built_returned: bool,
    pub outstanding_acknowledged: bool,
    pub outstanding_details: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PermitSummaryResponse {
    pub _id: String,
    pub permit_number: String,
    pub itwocx_number: Option<String>,
    pub status: PermitStatus,
    pub excavation_type: ExcavationType,
    pub location: String,
    pub created_at: DateTime,
}

#[derive(Debug, Serialize)]
pub struct PermitDetailResponse {
    #[serde(flatten)]
    pub permit: Permit,
    pub current_receiver: Option<String>,
    pub mechanical_approval_outstanding: bool,
}

impl From<Permit> for PermitDetailResponse {
    fn from(permit: Permit) -> PermitDetailResponse {
        let current_receiver = permit.current_receiver().map(String::from);
        let mechanical_approval_outstanding = permit.mechanical_approval_outstanding();
        PermitDetailResponse {
            current_receiver,
            mechanical_approval_outstanding,
            permit,
        }
    }
}

impl Permit {
    pub fn new(request: PermitRequest, permit_number: String) -> Result<Permit, PermitError> {
        let status = match request.status {
            Some(PermitStatus::Closed) => {
                return Err(PermitError::Validation("PERMIT_CANNOT_BE_CREATED_CLOSED"))
            }
            Some(status) => status,
            None => PermitStatus::Active,
        };

        let site_engineer_signature = match request.site_engineer_signature {
            Some(signature) => Some(Signature::accept(signature)?),
            None => None,
        };
        let issuer_signature = match request.issuer_signature {
            Some(signature) => Some(Signature::accept(signature)?),
            None => None,
        };
        let receiver_signature = match request.receiver_signature {
            Some(signature) => Some(Signature::accept(signature)?),
            None => None,
        };

        let mut permit = Permit {
            _id: None,
            permit_number,
            itwocx_number: request.itwocx_number,
            status,
            created_at: DateTime::now(),
            location: request.location,
            scope_of_works: request.scope_of_works,
            excavation_type: request.excavation_type,
            reveal_model_layer: request.reveal_model_layer,
            sub_layers: request.sub_layers,
            eba_construction_layer: request.eba_construction_layer,
            as_built_layers: request.as_built_layers,
            known_services_scanned: None,
            known_services_scanned_comment: None,
            services_marked: None,
            services_marked_comment: None,
            potholing_markers: None,
            potholing_markers_comment: None,
            transpower_designation: None,
            transpower_designation_comment: None,
            watercare_works_over: None,
            watercare_works_over_comment: None,
            part_a_checklist: ChecklistItem::initial_part_a(),
            part_a_potholing_method: request.part_a_potholing_method,
            part_a_frequency: request.part_a_frequency,
            part_a_overhead_protection: request.part_a_overhead_protection,
            part_a_close_approach: request.part_a_close_approach.unwrap_or_default(),
            part_b_checklist: ChecklistItem::initial_part_b(),
            part_b_high_risk: request.part_b_high_risk.unwrap_or_default(),
            receiver_checklist: ChecklistItem::initial_receiver(),
            site_engineer_signature,
            issuer_signature,
            receiver_signature,
            approver_signature: None,
            crew_members: Vec::new(),
            daily_logs: Vec::new(),
            handover_logs: Vec::new(),
            notes: Vec::new(),
            photos: Vec::new(),
            closure_date: None,
            closure_receiver_name: None,
            closure_signature: None,
            closure_excavation_safe: None,
            closure_as_built_returned: None,
            closure_outstanding_acknowledged: None,
            closure_outstanding_details: None,
        };

        // The issuance receiver is the first inducted crew member, so custody
        // checks and handovers have a registry entry to match against.
        if let Some(signature) = permit.receiver_signature.clone() {
            permit.crew_members.push(CrewMember {
                _id: ObjectId::new(),
                name: signature.name.clone(),
                role: String::from("Permit Receiver"),
                signature,
                date_inducted: DateTime::now(),
            });
        }

        Ok(permit)
    }

    fn ensure_open(&self) -> Result<(), PermitError> {
        if self.status == PermitStatus::Closed {
            return Err(PermitError::InvalidState("PERMIT_ALREADY_CLOSED"));
        }
        Ok(())
    }

    pub fn is_streamlined(&self) -> bool {
        matches!(
            self.excavation_type,
            ExcavationType::Hydro | ExcavationType::Hand
        )
    }

    // Advisory only: a missing approval never blocks activation or closure.
    pub fn mechanical_approval_outstanding(&self) -> bool {
        self.excavation_type == ExcavationType::Mechanical && self.approver_signature.is_none()
    }

    pub fn current_receiver(&self) -> Option<&str> {
        if let Some(handover) = self.handover_logs.last() {
            return Some(&handover.receiver_name);
        }
        self.receiver_signature
            .as_ref()
            .map(|signature| signature.name.as_str())
    }

    fn current_receiver_signature(&self) -> Option<&Signature> {
        if let Some(handover) = self.handover_logs.last() {
            return Some(&handover.signature);
        }
        self.receiver_signature.as_ref()
    }

    pub fn activate(&mut self) -> Result<(), PermitError> {
        self.ensure_open()?;
        self.status = PermitStatus::Active;
        Ok(())
    }

    pub fn set_checklist_answer(
        &mut self,
        kind: ChecklistKind,
        item_id: &str,
        answer: Option<ChecklistAnswer>,
        comment: Option<String>,
    ) -> Result<(), PermitError> {
        self.ensure_open()?;

        // Part B and the receiver checklist only apply to mechanical digs.
        if self.is_streamlined() && kind != ChecklistKind::PartA {
            return Ok(());
        }

        let items = match kind {
            ChecklistKind::PartA => &mut self.part_a_checklist,
            ChecklistKind::PartB => &mut self.part_b_checklist,
            ChecklistKind::Receiver => &mut self.receiver_checklist,
        };
        ChecklistItem::set_answer(items, item_id, answer, comment)
    }

    pub fn set_risk_answer(
        &mut self,
        question: RiskQuestion,
        answer: Option<ChecklistAnswer>,
        comment: Option<String>,
    ) -> Result<(), PermitError> {
        self.ensure_open()?;

        let (slot, slot_comment) = match question {
            RiskQuestion::KnownServicesScanned => (
                &mut self.known_services_scanned,
                &mut self.known_services_scanned_comment,
            ),
            RiskQuestion::ServicesMarked => {
                (&mut self.services_marked, &mut self.services_marked_comment)
            }
            RiskQuestion::PotholingMarkers => (
                &mut self.potholing_markers,
                &mut self.potholing_markers_comment,
            ),
            RiskQuestion::TranspowerDesignation => (
                &mut self.transpower_designation,
                &mut self.transpower_designation_comment,
            ),
            RiskQuestion::WatercareWorksOver => (
                &mut self.watercare_works_over,
                &mut self.watercare_works_over_comment,
            ),
        };

        *slot = answer;
        if let Some(comment) = comment {
            *slot_comment = Some(comment);
        }
        Ok(())
    }

    pub fn set_close_approach(&mut self, close_approach: CloseApproach) -> Result<(), PermitError> {
        self.ensure_open()?;
        self.part_a_close_approach = close_approach;
        Ok(())
    }

    pub fn set_high_risk(&mut self, high_risk: PartBHighRisk) -> Result<(), PermitError> {
        self.ensure_open()?;
        if self.is_streamlined() {
            return Ok(());
        }
        self.part_b_high_risk = high_risk;
        Ok(())
    }

    pub fn sign_slot(
        &mut self,
        slot: SignatureSlot,
        request: SignatureRequest,
    ) -> Result<(), PermitError> {
        self.ensure_open()?;

        if slot == SignatureSlot::Approver && self.is_streamlined() {
            return Ok(());
        }

        let signature = Signature::accept(request)?;
        let slot = match slot {
            SignatureSlot::SiteEngineer => &mut self.site_engineer_signature,
            SignatureSlot::Issuer => &mut self.issuer_signature,
            SignatureSlot::Receiver => &mut self.receiver_signature,
            SignatureSlot::Approver => &mut self.approver_signature,
        };
        *slot = Some(signature);
        Ok(())
    }

    pub fn approve_mechanical(&mut self, request: SignatureRequest) -> Result<(), PermitError> {
        self.sign_slot(SignatureSlot::Approver, request)
    }

    pub fn register_crew_member(
        &mut self,
        request: CrewMemberRequest,
    ) -> Result<ObjectId, PermitError> {
        self.ensure_open()?;

        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(PermitError::Validation("CREW_MEMBER_NAME_REQUIRED"));
        }
        if CrewMember::find_by_name(&self.crew_members, &name).is_some() {
            return Err(PermitError::Duplicate("CREW_MEMBER_ALREADY_REGISTERED"));
        }

        let signature = Signature::accept(request.signature)?;
        let member_id = ObjectId::new();
        self.crew_members.push(CrewMember {
            _id: member_id,
            name,
            role: request.role,
            signature,
            date_inducted: DateTime::now(),
        });
        Ok(member_id)
    }

    pub fn sign_on_crew(&mut self, member_id: &ObjectId, date: NaiveDate) -> Result<(), PermitError> {
        self.ensure_open()?;

        let member = self
            .crew_members
            .iter()
            .find(|member| member._id == *member_id)
            .ok_or(PermitError::NotFound("CREW_MEMBER_NOT_FOUND"))?;
        let name = member.name.clone();
        let signature = member.signature.clone();

        let already_signed = self.daily_logs.iter().any(|log| {
            log.role == DailyLogRole::Crew && log.name == name && log.is_on(date)
        });
        if already_signed {
            return Ok(());
        }

        self.daily_logs.push(DailyLog {
            _id: ObjectId::new(),
            date: DailyLog::sign_on_time(date),
            name,
            role: DailyLogRole::Crew,
            signature,
        });
        Ok(())
    }

    pub fn assign_role(
        &mut self,
        member_id: &ObjectId,
        role: DailyLogRole,
        date: NaiveDate,
    ) -> Result<(), PermitError> {
        self.ensure_open()?;

        if !role.is_assignable() {
            return Err(PermitError::Validation("ROLE_NOT_ASSIGNABLE"));
        }

        let member = self
            .crew_members
            .iter()
            .find(|member| member._id == *member_id)
            .ok_or(PermitError::NotFound("CREW_MEMBER_NOT_FOUND"))?;
        let name = member.name.clone();
        let signature = member.signature.clone();

        // Reassignment replaces the previous holder for that day.
        self.daily_logs
            .retain(|log| !(log.role == role && log.is_on(date)));
        self.daily_logs.push(DailyLog {
            _id: ObjectId::new(),
            date: DailyLog::sign_on_time(date),
            name,
            role,
            signature,
        });
        Ok(())
    }

    pub fn sign_on_receiver(&mut self, date: NaiveDate) -> Result<(), PermitError> {
        self.ensure_open()?;

        let (name, signature) = match (self.current_receiver(), self.current_receiver_signature())
        {
            (Some(name), Some(signature)) => (name.to_string(), signature.clone()),
            _ => return Ok(()),
        };

        let already_signed = self
            .daily_logs
            .iter()
            .any(|log| log.role == DailyLogRole::Receiver && log.is_on(date));
        if already_signed {
            return Ok(());
        }

        self.daily_logs.push(DailyLog {
            _id: ObjectId::new(),
            date: DailyLog::sign_on_time(date),
            name,
            role: DailyLogRole::Receiver,
            signature,
        });
        Ok(())
    }

    pub fn clear_role(&mut self, role: DailyLogRole, date: NaiveDate) -> Result<(), PermitError> {
        self.ensure_open()?;
        self.daily_logs
            .retain(|log| !(log.role == role && log.is_on(date)));
        Ok(())
    }

    pub fn record_handover(
        &mut self,
        receiver_name: String,
        date: NaiveDate,
        request: SignatureRequest,
    ) -> Result<(), PermitError> {
        self.ensure_open()?;

        let receiver_name = receiver_name.trim().to_string();
        if CrewMember::find_by_name(&self.crew_members, &receiver_name).is_none() {
            return Err(PermitError::Unauthorized("HANDOVER_RECEIVER_NOT_INDUCTED"));
        }
        let signature = Signature::accept(request)?;

        // The entry keeps the requested calendar date but stamps the actual
        // time of transfer, so same-day handovers stay ordered.
        let date = DateTime::from_chrono(date.and_time(Utc::now().time()).and_utc());
        self.handover_logs.push(HandoverLog {
            _id: ObjectId::new(),
            date,
            receiver_name,
            signature,
        });
        Ok(())
    }

    pub fn close(&mut self, request: PermitClosureRequest) -> Result<(), PermitError> {
        if self.status == PermitStatus::Closed {
            return Err(PermitError::InvalidState("PERMIT_ALREADY_CLOSED"));
        }

        let receiver_name = request.receiver_name.trim().to_string();
        let authorised = self
            .current_receiver()
            .map(|current| current.eq_ignore_ascii_case(&receiver_name))
            .unwrap_or(false);
        if !authorised {
            return Err(PermitError::Unauthorized("CLOSURE_RECEIVER_NOT_AUTHORISED"));
        }

        if !(request.excavation_safe
            && request.as_built_returned
            && request.outstanding_acknowledged)
        {
            return Err(PermitError::Validation("PRE_CLOSURE_CHECKS_INCOMPLETE"));
        }

        let signature = request
            .signature
            .ok_or(PermitError::Validation("CLOSURE_SIGNATURE_REQUIRED"))?;
        let signature = Signature::accept(signature)?;

        self.status = PermitStatus::Closed;
        self.closure_date = Some(DateTime::now());
        self.closure_receiver_name = Some(receiver_name);
        self.closure_signature = Some(signature);
        self.closure_excavation_safe = Some(request.excavation_safe);
        self.closure_as_built_returned = Some(request.as_built_returned);
        self.closure_outstanding_acknowledged = Some(request.outstanding_acknowledged);
        self.closure_outstanding_details = request.outstanding_details;
        Ok(())
    }

    pub fn add_note(&mut self, request: PermitNoteRequest) -> Result<ObjectId, PermitError> {
        self.ensure_open()?;

        if request.text.trim().is_empty() || request.author.trim().is_empty() {
            return Err(PermitError::Validation("NOTE_TEXT_AND_AUTHOR_REQUIRED"));
        }

        let note_id = ObjectId::new();
        self.notes.push(PermitNote {
            _id: note_id,
            text: request.text,
            author: request.author,
            role: String::from("Contributor"),
            date: DateTime::now(),
        });
        Ok(note_id)
    }

    pub fn remove_note(&mut self, note_id: &ObjectId) -> Result<(), PermitError> {
        self.ensure_open()?;

        let count = self.notes.len();
        self.notes.retain(|note| note._id != *note_id);
        if self.notes.len() == count {
            return Err(PermitError::NotFound("NOTE_NOT_FOUND"));
        }
        Ok(())
    }

    pub fn add_photo(&mut self, request: PermitPhotoRequest) -> Result<ObjectId, PermitError> {
        self.ensure_open()?;

        if self.photos.len() >= PHOTO_LIMIT {
            return Err(PermitError::Validation("PHOTO_LIMIT_REACHED"));
        }

        let photo_id = ObjectId::new();
        self.photos.push(PermitPhoto {
            _id: photo_id,
            url: request.url,
            caption: request.caption,
            uploaded_by: request.uploaded_by,
            date: DateTime::now(),
        });
        Ok(photo_id)
    }

    pub fn remove_photo(&mut self, photo_id: &ObjectId) -> Result<(), PermitError> {
        self.ensure_open()?;

        let count = self.photos.len();
        self.photos.retain(|photo| photo._id != *photo_id);
        if self.photos.len() == count {
            return Err(PermitError::NotFound("PHOTO_NOT_FOUND"));
        }
        Ok(())
    }

    pub async fn next_permit_number() -> Result<String, PermitError> {
        let db: Database = get_db();
        let collection: Collection<Permit> = db.collection::<Permit>("permits");

        let count = collection
            .count_documents(None, None)
            .await
            .map_err(|_| PermitError::Database("COUNTING_FAILED"))?;

        Ok(format!(
            "EB-PT-{}-{:04}",
            Utc::now().format("%Y"),
            count + 1
        ))
    }

    pub async fn save(&mut self) -> Result<ObjectId, PermitError> {
        let db: Database = get_db();
        let collection: Collection<Permit> = db.collection::<Permit>("permits");

        let _id = ObjectId::new();
        self._id = Some(_id);

        collection
            .insert_one(&*self, None)
            .await
            .map_err(|_| PermitError::Database("INSERTING_FAILED"))
            .map(|_| _id)
    }

    // Every mutation re-serializes the whole permit; the last writer wins at
    // record granularity.
    pub async fn update(&self) -> Result<ObjectId, PermitError> {
        let db: Database = get_db();
        let collection: Collection<Permit> = db.collection::<Permit>("permits");

        let _id = self._id.ok_or(PermitError::NotFound("PERMIT_NOT_FOUND"))?;
        let document =
            to_bson::<Permit>(self).map_err(|_| PermitError::Database("SERIALIZING_FAILED"))?;

        collection
            .update_one(doc! { "_id": _id }, doc! { "$set": document }, None)
            .await
            .map_err(|_| PermitError::Database("UPDATE_FAILED"))
            .map(|_| _id)
    }

    pub async fn find_many(query: &PermitQuery) -> Result<Vec<PermitSummaryResponse>, PermitError> {
        let db: Database = get_db();
        let collection: Collection<Permit> = db.collection::<Permit>("permits");

        let mut pipeline: Vec<mongodb::bson::Document> = Vec::new();
        let mut permits: Vec<PermitSummaryResponse> = Vec::new();

        if let Some(status) = &query.status {
            let status = to_bson::<PermitStatus>(status)
                .map_err(|_| PermitError::Database("SERIALIZING_FAILED"))?;
            pipeline.push(doc! {
                "$match": { "status": status }
            });
        }
        if let Some(limit) = query.limit {
            let limit = to_bson::<usize>(&limit)
                .map_err(|_| PermitError::Database("SERIALIZING_FAILED"))?;
            pipeline.push(doc! {
                "$limit": limit
            });
        }

        pipeline.push(doc! {
            "$project": {
                "_id": { "$toString": "$_id" },
                "permit_number": "$permit_number",
                "itwocx_number": "$itwocx_number",
                "status": "$status",
                "excavation_type": "$excavation_type",
                "location": "$location",
                "created_at": "$created_at",
            }
        });

        if let Ok(mut cursor) = collection.aggregate(pipeline, None).await {
            while let Some(Ok(document)) = cursor.next().await {
                if let Ok(permit) = from_document::<PermitSummaryResponse>(document) {
                    permits.push(permit);
                }
            }
            Ok(permits)
        } else {
            Err(PermitError::Database("PERMITS_LOOKUP_FAILED"))
        }
    }

    pub async fn find_by_id(_id: &ObjectId) -> Result<Option<Permit>, PermitError> {
        let db: Database = get_db();
        let collection: Collection<Permit> = db.collection::<Permit>("permits");

        collection
            .find_one(doc! { "_id": _id }, None)
            .await
            .map_err(|_| PermitError::Database("PERMIT_LOOKUP_FAILED"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::signature::SignatureKind;

    fn signature_request(name: &str) -> SignatureRequest {
        SignatureRequest {
            kind: SignatureKind::Type,
            data: name.to_string(),
            name: name.to_string(),
        }
    }

    fn permit_request(excavation_type: ExcavationType) -> PermitRequest {
        PermitRequest {
            itwocx_number: Some(String::from("CX-12345")),
            status: None,
            location: String::from("12 Quay St"),
            scope_of_works: String::from("Trench for new duct bank"),
            excavation_type,
            reveal_model_layer: true,
            sub_layers: false,
            eba_construction_layer: false,
            as_built_layers: false,
            part_a_potholing_method: String::from("Hand digging"),
            part_a_frequency: String::from("Every 2m"),
            part_a_overhead_protection: String::new(),
            part_a_close_approach: None,
            part_b_high_risk: None,
            site_engineer_signature: None,
            issuer_signature: Some(signature_request("I. Ward")),
            receiver_signature: Some(signature_request("R. Lee")),
        }
    }

    fn permit(excavation_type: ExcavationType) -> Permit {
        Permit::new(permit_request(excavation_type), String::from("EB-PT-2024-0001")).unwrap()
    }

    fn register(permit: &mut Permit, name: &str) -> ObjectId {
        permit
            .register_crew_member(CrewMemberRequest {
                name: name.to_string(),
                role: String::from("Crew"),
                signature: signature_request(name),
            })
            .unwrap()
    }

    fn closure_request(name: &str) -> PermitClosureRequest {
        PermitClosureRequest {
            receiver_name: name.to_string(),
            signature: Some(signature_request(name)),
            excavation_safe: true,
            as_built_returned: true,
            outstanding_acknowledged: true,
            outstanding_details: Some(String::from("None")),
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn creation_seeds_checklists_and_inducts_receiver() {
        let permit = permit(ExcavationType::Mechanical);

        assert_eq!(permit.status, PermitStatus::Active);
        assert_eq!(permit.part_a_checklist.len(), 5);
        assert_eq!(permit.part_b_checklist.len(), 6);
        assert_eq!(permit.receiver_checklist.len(), 10);
        assert_eq!(permit.crew_members.len(), 1);
        assert_eq!(permit.crew_members[0].name, "R. Lee");
        assert_eq!(permit.crew_members[0].role, "Permit Receiver");
        assert_eq!(permit.current_receiver(), Some("R. Lee"));
    }

    #[test]
    fn permit_cannot_be_created_closed() {
        let mut request = permit_request(ExcavationType::Hand);
        request.status = Some(PermitStatus::Closed);

        assert_eq!(
            Permit::new(request, String::from("EB-PT-2024-0002")),
            Err(PermitError::Validation("PERMIT_CANNOT_BE_CREATED_CLOSED"))
        );
    }

    #[test]
    fn activate_promotes_draft() {
        let mut request = permit_request(ExcavationType::Mechanical);
        request.status = Some(PermitStatus::Draft);
        let mut permit = Permit::new(request, String::from("EB-PT-2024-0003")).unwrap();

        assert_eq!(permit.status, PermitStatus::Draft);
        permit.activate().unwrap();
        assert_eq!(permit.status, PermitStatus::Active);
        // idempotent while the permit stays open
        permit.activate().unwrap();
        assert_eq!(permit.status, PermitStatus::Active);
    }

    #[test]
    fn duplicate_registration_is_rejected_case_insensitively() {
        let mut permit = permit(ExcavationType::Mechanical);
        register(&mut permit, "Jane Doe");

        let result = permit.register_crew_member(CrewMemberRequest {
            name: String::from("JANE DOE"),
            role: String::from("Spotter"),
            signature: signature_request("JANE DOE"),
        });

        assert_eq!(
            result,
            Err(PermitError::Duplicate("CREW_MEMBER_ALREADY_REGISTERED"))
        );
        assert_eq!(permit.crew_members.len(), 2);
    }

    #[test]
    fn registration_requires_a_name() {
        let mut permit = permit(ExcavationType::Mechanical);

        let result = permit.register_crew_member(CrewMemberRequest {
            name: String::from("   "),
            role: String::from("Crew"),
            signature: signature_request("A. Smith"),
        });

        assert_eq!(
            result,
            Err(PermitError::Validation("CREW_MEMBER_NAME_REQUIRED"))
        );
    }

    #[test]
    fn assign_role_replaces_the_previous_holder_for_that_day() {
        let mut permit = permit(ExcavationType::Mechanical);
        let smith = register(&mut permit, "A. Smith");
        let jones = register(&mut permit, "B. Jones");

        permit
            .assign_role(&smith, DailyLogRole::Operator, date(1))
            .unwrap();
        permit
            .assign_role(&jones, DailyLogRole::Operator, date(1))
            .unwrap();

        let operators: Vec<&DailyLog> = permit
            .daily_logs
            .iter()
            .filter(|log| log.role == DailyLogRole::Operator && log.is_on(date(1)))
            .collect();
        assert_eq!(operators.len(), 1);
        assert_eq!(operators[0].name, "B. Jones");

        // another day is a separate cell
        permit
            .assign_role(&smith, DailyLogRole::Operator, date(2))
            .unwrap();
        assert_eq!(
            permit
                .daily_logs
                .iter()
                .filter(|log| log.role == DailyLogRole::Operator)
                .count(),
            2
        );
    }

    #[test]
    fn assign_role_rejects_non_operational_roles() {
        let mut permit = permit(ExcavationType::Mechanical);
        let smith = register(&mut permit, "A. Smith");

        assert_eq!(
            permit.assign_role(&smith, DailyLogRole::Receiver, date(1)),
            Err(PermitError::Validation("ROLE_NOT_ASSIGNABLE"))
        );
        assert_eq!(
            permit.assign_role(&smith, DailyLogRole::Crew, date(1)),
            Err(PermitError::Validation("ROLE_NOT_ASSIGNABLE"))
        );
    }

    #[test]
    fn sign_on_crew_is_idempotent_per_day() {
        let mut permit = permit(ExcavationType::Mechanical);
        let smith = register(&mut permit, "A. Smith");

        permit.sign_on_crew(&smith, date(1)).unwrap();
        permit.sign_on_crew(&smith, date(1)).unwrap();

        assert_eq!(permit.daily_logs.len(), 1);

        permit.sign_on_crew(&smith, date(2)).unwrap();
        assert_eq!(permit.daily_logs.len(), 2);
    }

    #[test]
    fn sign_on_crew_unknown_member_fails() {
        let mut permit = permit(ExcavationType::Mechanical);

        assert_eq!(
            permit.sign_on_crew(&ObjectId::new(), date(1)),
            Err(PermitError::NotFound("CREW_MEMBER_NOT_FOUND"))
        );
    }

    #[test]
    fn sign_on_receiver_follows_the_custody_chain() {
        let mut permit = permit(ExcavationType::Mechanical);
        register(&mut permit, "M. Patel");
        permit
            .record_handover(
                String::from("M. Patel"),
                date(1),
                signature_request("M. Patel"),
            )
            .unwrap();

        permit.sign_on_receiver(date(2)).unwrap();
        // second call on the same day is a no-op
        permit.sign_on_receiver(date(2)).unwrap();

        let receiver_logs: Vec<&DailyLog> = permit
            .daily_logs
            .iter()
            .filter(|log| log.role == DailyLogRole::Receiver)
            .collect();
        assert_eq!(receiver_logs.len(), 1);
        assert_eq!(receiver_logs[0].name, "M. Patel");
    }

    #[test]
    fn sign_on_receiver_without_a_signature_is_a_noop() {
        let mut request = permit_request(ExcavationType::Mechanical);
        request.receiver_signature = None;
        let mut permit = Permit::new(request, String::from("EB-PT-2024-0004")).unwrap();

        permit.sign_on_receiver(date(1)).unwrap();
        assert!(permit.daily_logs.is_empty());
    }

    #[test]
    fn clear_role_removes_the_day_entries() {
        let mut permit = permit(ExcavationType::Mechanical);
        let smith = register(&mut permit, "A. Smith");
        permit
            .assign_role(&smith, DailyLogRole::Spotter, date(1))
            .unwrap();
        permit
            .assign_role(&smith, DailyLogRole::Spotter, date(2))
            .unwrap();

        permit.clear_role(DailyLogRole::Spotter, date(1)).unwrap();

        assert_eq!(permit.daily_logs.len(), 1);
        assert!(permit.daily_logs[0].is_on(date(2)));
    }

    #[test]
    fn handover_requires_an_inducted_receiver() {
        let mut permit = permit(ExcavationType::Mechanical);
        let before = permit.clone();

        let result = permit.record_handover(
            String::from("B. Jones"),
            date(1),
            signature_request("B. Jones"),
        );

        assert_eq!(
            result,
            Err(PermitError::Unauthorized("HANDOVER_RECEIVER_NOT_INDUCTED"))
        );
        assert_eq!(permit, before);
    }

    #[test]
    fn custody_follows_the_latest_handover() {
        let mut permit = permit(ExcavationType::Mechanical);
        register(&mut permit, "M. Patel");
        register(&mut permit, "J. Chen");

        permit
            .record_handover(
                String::from("M. Patel"),
                date(1),
                signature_request("M. Patel"),
            )
            .unwrap();
        assert_eq!(permit.current_receiver(), Some("M. Patel"));

        permit
            .record_handover(String::from("J. Chen"), date(2), signature_request("J. Chen"))
            .unwrap();
        assert_eq!(permit.current_receiver(), Some("J. Chen"));

        // the original receiver lost closure authority at the first handover
        let result = permit.close(closure_request("R. Lee"));
        assert_eq!(
            result,
            Err(PermitError::Unauthorized("CLOSURE_RECEIVER_NOT_AUTHORISED"))
        );
        assert_eq!(permit.status, PermitStatus::Active);
    }

    #[test]
    fn closure_accepts_the_current_receiver_case_insensitively() {
        let mut permit = permit(ExcavationType::Mechanical);
        register(&mut permit, "M. Patel");
        permit
            .record_handover(
                String::from("M. Patel"),
                date(1),
                signature_request("M. Patel"),
            )
            .unwrap();

        permit.close(closure_request("m. patel")).unwrap();

        assert_eq!(permit.status, PermitStatus::Closed);
        assert_eq!(permit.closure_receiver_name.as_deref(), Some("m. patel"));
        assert!(permit.closure_date.is_some());
        assert!(permit.closure_signature.is_some());
        assert_eq!(permit.closure_excavation_safe, Some(true));
        assert_eq!(permit.closure_as_built_returned, Some(true));
        assert_eq!(permit.closure_outstanding_acknowledged, Some(true));
    }

    #[test]
    fn closure_requires_all_pre_closure_checks() {
        let mut permit = permit(ExcavationType::Mechanical);
        let mut request = closure_request("R. Lee");
        request.as_built_returned = false;
        let before = permit.clone();

        assert_eq!(
            permit.close(request),
            Err(PermitError::Validation("PRE_CLOSURE_CHECKS_INCOMPLETE"))
        );
        assert_eq!(permit, before);
    }

    #[test]
    fn closure_requires_a_signature() {
        let mut permit = permit(ExcavationType::Mechanical);
        let mut request = closure_request("R. Lee");
        request.signature = None;

        assert_eq!(
            permit.close(request),
            Err(PermitError::Validation("CLOSURE_SIGNATURE_REQUIRED"))
        );
        assert_eq!(permit.status, PermitStatus::Active);
    }

    #[test]
    fn closure_refuses_a_permit_with_no_receiver() {
        let mut request = permit_request(ExcavationType::Mechanical);
        request.receiver_signature = None;
        let mut permit = Permit::new(request, String::from("EB-PT-2024-0005")).unwrap();

        assert_eq!(
            permit.close(closure_request("R. Lee")),
            Err(PermitError::Unauthorized("CLOSURE_RECEIVER_NOT_AUTHORISED"))
        );
    }

    #[test]
    fn closed_permit_rejects_every_mutation() {
        let mut permit = permit(ExcavationType::Mechanical);
        let smith = register(&mut permit, "A. Smith");
        permit.close(closure_request("R. Lee")).unwrap();
        let before = permit.clone();

        let closed = PermitError::InvalidState("PERMIT_ALREADY_CLOSED");
        assert_eq!(
            permit.set_checklist_answer(ChecklistKind::PartB, "1", Some(ChecklistAnswer::Yes), None),
            Err(closed)
        );
        assert_eq!(
            permit.set_risk_answer(RiskQuestion::ServicesMarked, Some(ChecklistAnswer::Yes), None),
            Err(closed)
        );
        assert_eq!(
            permit.register_crew_member(CrewMemberRequest {
                name: String::from("B. Jones"),
                role: String::from("Crew"),
                signature: signature_request("B. Jones"),
            }),
            Err(closed)
        );
        assert_eq!(permit.sign_on_crew(&smith, date(3)), Err(closed));
        assert_eq!(
            permit.assign_role(&smith, DailyLogRole::Operator, date(3)),
            Err(closed)
        );
        assert_eq!(permit.sign_on_receiver(date(3)), Err(closed));
        assert_eq!(permit.clear_role(DailyLogRole::Operator, date(3)), Err(closed));
        assert_eq!(
            permit.record_handover(
                String::from("A. Smith"),
                date(3),
                signature_request("A. Smith")
            ),
            Err(closed)
        );
        assert_eq!(
            permit.sign_slot(SignatureSlot::Issuer, signature_request("I. Ward")),
            Err(closed)
        );
        assert_eq!(permit.activate(), Err(closed));
        assert_eq!(
            permit.add_note(PermitNoteRequest {
                text: String::from("late note"),
                author: String::from("A. Smith"),
            }),
            Err(closed)
        );
        assert_eq!(
            permit.add_photo(PermitPhotoRequest {
                url: String::from("data:image/png;base64,AAAA"),
                caption: String::from("final state"),
                uploaded_by: String::from("A. Smith"),
            }),
            Err(closed)
        );
        assert_eq!(permit.close(closure_request("R. Lee")), Err(closed));
        assert_eq!(permit, before);
    }

    #[test]
    fn streamlined_permits_treat_mechanical_sections_as_inert() {
        let mut permit = permit(ExcavationType::Hydro);
        let before = permit.part_b_checklist.clone();

        permit
            .set_checklist_answer(ChecklistKind::PartB, "1", Some(ChecklistAnswer::Yes), None)
            .unwrap();
        permit
            .set_checklist_answer(ChecklistKind::Receiver, "1", Some(ChecklistAnswer::Yes), None)
            .unwrap();
        permit
            .approve_mechanical(signature_request("S. Engineer"))
            .unwrap();
        permit
            .set_high_risk(PartBHighRisk {
                power_11kv: true,
                gas_high_pressure: false,
                main_fibre: false,
            })
            .unwrap();

        assert_eq!(permit.part_b_checklist, before);
        assert!(permit
            .receiver_checklist
            .iter()
            .all(|item| item.answer.is_none()));
        assert!(permit.approver_signature.is_none());
        assert_eq!(permit.part_b_high_risk, PartBHighRisk::default());
        assert!(!permit.mechanical_approval_outstanding());

        // closure never waits on the approver for hydro or hand digs
        permit.close(closure_request("R. Lee")).unwrap();
        assert_eq!(permit.status, PermitStatus::Closed);
    }

    #[test]
    fn part_a_stays_editable_on_streamlined_permits() {
        let mut permit = permit(ExcavationType::Hand);

        permit
            .set_checklist_answer(
                ChecklistKind::PartA,
                "1a",
                Some(ChecklistAnswer::Yes),
                Some(String::from("REVEAL layer reviewed")),
            )
            .unwrap();

        let item = permit
            .part_a_checklist
            .iter()
            .find(|item| item.id == "1a")
            .unwrap();
        assert_eq!(item.answer, Some(ChecklistAnswer::Yes));
        assert_eq!(item.comment.as_deref(), Some("REVEAL layer reviewed"));
    }

    #[test]
    fn mechanical_approval_is_advisory_and_resignable() {
        let mut permit = permit(ExcavationType::Mechanical);
        assert!(permit.mechanical_approval_outstanding());

        permit
            .approve_mechanical(signature_request("S. Engineer"))
            .unwrap();
        assert!(!permit.mechanical_approval_outstanding());

        // the slot is replaced wholesale on re-approval
        permit
            .approve_mechanical(signature_request("T. Brown"))
            .unwrap();
        assert_eq!(
            permit.approver_signature.as_ref().map(|s| s.name.as_str()),
            Some("T. Brown")
        );

        // never a hard gate: closure succeeds with the approval outstanding
        let mut unapproved = self::permit(ExcavationType::Mechanical);
        assert!(unapproved.mechanical_approval_outstanding());
        unapproved.close(closure_request("R. Lee")).unwrap();
    }

    #[test]
    fn notes_and_photos_are_validated_and_removable() {
        let mut permit = permit(ExcavationType::Mechanical);

        assert_eq!(
            permit.add_note(PermitNoteRequest {
                text: String::from("  "),
                author: String::from("A. Smith"),
            }),
            Err(PermitError::Validation("NOTE_TEXT_AND_AUTHOR_REQUIRED"))
        );

        let note_id = permit
            .add_note(PermitNoteRequest {
                text: String::from("Service strike near pit 4 avoided"),
                author: String::from("A. Smith"),
            })
            .unwrap();
        permit.remove_note(&note_id).unwrap();
        assert!(permit.notes.is_empty());
        assert_eq!(
            permit.remove_note(&note_id),
            Err(PermitError::NotFound("NOTE_NOT_FOUND"))
        );
    }

    #[test]
    fn photo_collection_is_capped() {
        let mut permit = permit(ExcavationType::Mechanical);

        for index in 0..PHOTO_LIMIT {
            permit
                .add_photo(PermitPhotoRequest {
                    url: String::from("data:image/png;base64,AAAA"),
                    caption: format!("photo {index}"),
                    uploaded_by: String::from("A. Smith"),
                })
                .unwrap();
        }

        assert_eq!(
            permit.add_photo(PermitPhotoRequest {
                url: String::from("data:image/png;base64,AAAA"),
                caption: String::from("one too many"),
                uploaded_by: String::from("A. Smith"),
            }),
            Err(PermitError::Validation("PHOTO_LIMIT_REACHED"))
        );
        assert_eq!(permit.photos.len(), PHOTO_LIMIT);
    }
}
