use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::signature::{Signature, SignatureRequest};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CrewMember {
    pub _id: ObjectId,
    pub name: String,
    pub role: String,
    pub signature: Signature,
    pub date_inducted: DateTime,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CrewMemberRequest {
    pub name: String,
    pub role: String,
    pub signature: SignatureRequest,
}

impl CrewMember {
    // Names are the natural key of the registry; matching is case-insensitive.
    pub fn find_by_name<'a>(crew: &'a [CrewMember], name: &str) -> Option<&'a CrewMember> {
        crew.iter()
            .find(|member| member.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::signature::SignatureKind;

    fn member(name: &str) -> CrewMember {
        CrewMember {
            _id: ObjectId::new(),
            name: name.to_string(),
            role: String::from("Crew"),
            signature: Signature {
                kind: SignatureKind::Type,
                data: name.to_string(),
                name: name.to_string(),
                date: DateTime::now(),
            },
            date_inducted: DateTime::now(),
        }
    }

    #[test]
    fn find_by_name_ignores_case() {
        let crew = vec![member("Jane Doe"), member("M. Patel")];

        assert!(CrewMember::find_by_name(&crew, "jane doe").is_some());
        assert!(CrewMember::find_by_name(&crew, "M. PATEL").is_some());
        assert!(CrewMember::find_by_name(&crew, "B. Jones").is_none());
    }
}
