use serde::{Deserialize, Serialize};

use crate::error::PermitError;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum ChecklistAnswer {
    #[serde(rename = "yes")]
    Yes,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "n/a")]
    NotApplicable,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistKind {
    PartA,
    PartB,
    Receiver,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ChecklistItem {
    pub id: String,
    pub question: String,
    pub answer: Option<ChecklistAnswer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChecklistAnswerRequest {
    pub item_id: String,
    pub answer: Option<ChecklistAnswer>,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CloseApproach {
    pub overhead_electricity_dist: String,
    pub overhead_rail_dist: String,
    pub overhead_other_dist: String,
    pub underground_electricity_dist: String,
    pub underground_fibre_dist: String,
    pub underground_gas_dist: String,
    pub underground_water_dist: String,
    pub permits_obtained: Option<ChecklistAnswer>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PartBHighRisk {
    pub power_11kv: bool,
    pub gas_high_pressure: bool,
    pub main_fibre: bool,
}

impl ChecklistItem {
    // The id sets below are fixed for the life of a permit; answering is the
    // only mutation a checklist supports.
    pub fn set_answer(
        items: &mut [ChecklistItem],
        item_id: &str,
        answer: Option<ChecklistAnswer>,
        comment: Option<String>,
    ) -> Result<(), PermitError> {
        let item = items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(PermitError::NotFound("CHECKLIST_ITEM_NOT_FOUND"))?;

        item.answer = answer;
        if let Some(comment) = comment {
            item.comment = Some(comment);
        }
        Ok(())
    }

    fn item(id: &str, question: &str) -> ChecklistItem {
        ChecklistItem {
            id: id.to_string(),
            question: question.to_string(),
            answer: None,
            comment: None,
        }
    }

    pub fn initial_part_a() -> Vec<ChecklistItem> {
        vec![
            Self::item("1a", "Have I obtained all the EBA service plans with applicable REVEAL layer turned on?"),
            Self::item("1b", "Have I physically inspected the site for any above ground indicators of services?"),
            Self::item("2", "Have I positively identified all services from all surrounding buildings? It includes open manholes, check existing boxes for water meters, and verify inconsistencies."),
            Self::item("3", "Have I evaluated if it is possible to de-energise services before work commences?"),
            Self::item("8", "Have all the EBA service plans and BeforeUDig drawings for the site been reviewed for inconsistencies?"),
        ]
    }

    pub fn initial_part_b() -> Vec<ChecklistItem> {
        vec![
            Self::item("1", "Have all services been exposed and identified by a competent person?"),
            Self::item("2", "Have I physically inspected the site for any above ground indicators of services?"),
            Self::item("3", "Has all potholing by the chosen method been completed?"),
            Self::item("4", "If high risk services (>11kV, Gas, Main Fibre, Water >300mm) are present, is there a clear plan/risk assessment?"),
            Self::item("5", "If any of the following services are within the scope, has the correct Network Utility provider verified the services identified within the works designation?"),
            Self::item("6", "Has compliance with Watercare \"Works Over Approval\" form been verified?"),
        ]
    }

    pub fn initial_receiver() -> Vec<ChecklistItem> {
        let mut items = vec![
            Self::item("1", "Have all services been exposed and identified by a competent person?"),
            Self::item("2", "Do I understand the specific work methodology / site plan / drawings and specifications?"),
            Self::item("3", "Do I have a copy of the Permits required in question 8 on page 3?"),
            Self::item("4", "Have I got all of the underground service plans on site, reviewed and understand them?"),
            Self::item("5", "Have I physically inspected the site for any above ground indicators of services?"),
            Self::item("6", "Have all underground services been marked on site including location and depth? Also included to identify all services from all surrounding buildings and check any inconsistencies in the be4udig and GIS drawings referred to existing services on site"),
            Self::item("7", "Where marks could be removed, have I made a provision to maintain information of location and depth once work commences?"),
            Self::item("8", "Has all potholing by the chosen method been completed? (refer to items 4 and 6 on page 4)."),
            Self::item("9", "Have the operators, spotters and stand overs been briefed by myself of service location, depths and minimum approach or exclusion distances?"),
            Self::item("10", "What system of communication has been agreed between the operator and stand over/spotter?"),
        ];
        if let Some(last) = items.last_mut() {
            last.comment = Some(String::from("Describe system..."));
        }
        items
    }
}
