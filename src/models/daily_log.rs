use chrono::{NaiveDate, NaiveTime};
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::signature::Signature;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DailyLogRole {
    Receiver,
    Operator,
    Spotter,
    Foreman,
    Crew,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DailyLog {
    pub _id: ObjectId,
    pub date: DateTime,
    pub name: String,
    pub role: DailyLogRole,
    pub signature: Signature,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CrewSignOnRequest {
    pub member_id: ObjectId,
    pub date: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RoleAssignRequest {
    pub member_id: ObjectId,
    pub role: DailyLogRole,
    pub date: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReceiverSignOnRequest {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct DailyLogClearQuery {
    pub role: DailyLogRole,
    pub date: String,
}

impl DailyLogRole {
    // Receiver entries come from the custody chain and crew entries from the
    // registry; only the three operational roles are assignable directly.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            DailyLogRole::Operator | DailyLogRole::Spotter | DailyLogRole::Foreman
        )
    }
}

impl DailyLog {
    // Ledger entries are stamped at the start of the working day.
    pub fn sign_on_time(date: NaiveDate) -> DateTime {
        let morning = NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default();
        DateTime::from_chrono(date.and_time(morning).and_utc())
    }

    pub fn is_on(&self, date: NaiveDate) -> bool {
        self.date.to_chrono().date_naive() == date
    }
}
