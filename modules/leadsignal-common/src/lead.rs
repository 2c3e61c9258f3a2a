use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{LeadSignalError, Result};
use crate::types::FetchResult;

/// Canonical lead fields. Input keys are resolved against [`LeadField::aliases`]
/// in order; the first non-empty candidate wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadField {
    CompanyName,
    IndustryType,
    PhoneNumber,
    AddressLine1,
    AddressLine2,
    Postcode,
    County,
    LeadStatement,
    ProofUrl,
    OldAddress,
}

impl LeadField {
    pub const ALL: [LeadField; 10] = [
        LeadField::CompanyName,
        LeadField::IndustryType,
        LeadField::PhoneNumber,
        LeadField::AddressLine1,
        LeadField::AddressLine2,
        LeadField::Postcode,
        LeadField::County,
        LeadField::LeadStatement,
        LeadField::ProofUrl,
        LeadField::OldAddress,
    ];

    /// Candidate input keys, most specific first. Covers snake_case API
    /// payloads, camelCase frontend payloads, and spreadsheet column headers.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            LeadField::CompanyName => &["company_name", "companyName", "Company Name", "company"],
            LeadField::IndustryType => &[
                "industry_type",
                "industryType",
                "Industry Type",
                "industry",
                "Industry",
            ],
            LeadField::PhoneNumber => &[
                "phone_number",
                "phoneNumber",
                "Phone Number",
                "phone",
                "Phone",
            ],
            LeadField::AddressLine1 => &[
                "address_line_1",
                "addressLine1",
                "Address Line 1",
                "address1",
                "address",
            ],
            LeadField::AddressLine2 => &[
                "address_line_2",
                "addressLine2",
                "Address Line 2",
                "address2",
            ],
            LeadField::Postcode => &["postcode", "postCode", "Postcode", "post_code", "zip"],
            LeadField::County => &["county", "County"],
            LeadField::LeadStatement => &[
                "lead_statement",
                "leadStatement",
                "Lead Statement",
                "statement",
            ],
            LeadField::ProofUrl => &["proof_url", "proofUrl", "Proof URL", "proof"],
            LeadField::OldAddress => &["old_address", "oldAddress", "Old Address"],
        }
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.aliases()[0])
    }
}

const FETCH_RESULT_ALIASES: [&str; 3] = ["fetch_results", "fetchResults", "fetchResult"];

/// A business contact record under evaluation. Built once per request from
/// loosely-keyed input and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Lead {
    pub company_name: Option<String>,
    pub industry_type: Option<String>,
    pub phone_number: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub postcode: Option<String>,
    pub county: Option<String>,
    pub lead_statement: Option<String>,
    pub proof_url: Option<String>,
    pub old_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_results: Option<FetchResult>,
}

impl Lead {
    /// Build a lead from an arbitrary JSON value. Only a non-object is an error;
    /// missing fields are simply absent.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::try_from(map),
            other => Err(LeadSignalError::Input(format!(
                "lead must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn get(&self, field: LeadField) -> Option<&str> {
        let value = match field {
            LeadField::CompanyName => &self.company_name,
            LeadField::IndustryType => &self.industry_type,
            LeadField::PhoneNumber => &self.phone_number,
            LeadField::AddressLine1 => &self.address_line_1,
            LeadField::AddressLine2 => &self.address_line_2,
            LeadField::Postcode => &self.postcode,
            LeadField::County => &self.county,
            LeadField::LeadStatement => &self.lead_statement,
            LeadField::ProofUrl => &self.proof_url,
            LeadField::OldAddress => &self.old_address,
        };
        value.as_deref()
    }

    /// Publish time of the attached proof post, if any.
    pub fn posted_at(&self) -> Option<&str> {
        self.fetch_results
            .as_ref()
            .and_then(|f| f.raw_data.posted_at_iso.as_deref())
    }

    /// Short label for logs. Never includes contact details.
    pub fn label(&self) -> &str {
        self.company_name.as_deref().unwrap_or("<unnamed lead>")
    }
}

impl TryFrom<Map<String, Value>> for Lead {
    type Error = LeadSignalError;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        let field = |f: LeadField| resolve_field(&map, f);

        Ok(Lead {
            company_name: field(LeadField::CompanyName),
            industry_type: field(LeadField::IndustryType),
            phone_number: field(LeadField::PhoneNumber),
            address_line_1: field(LeadField::AddressLine1),
            address_line_2: field(LeadField::AddressLine2),
            postcode: field(LeadField::Postcode),
            county: field(LeadField::County),
            lead_statement: field(LeadField::LeadStatement),
            proof_url: field(LeadField::ProofUrl),
            old_address: field(LeadField::OldAddress),
            fetch_results: resolve_fetch_results(&map),
        })
    }
}

fn resolve_field(map: &Map<String, Value>, field: LeadField) -> Option<String> {
    field
        .aliases()
        .iter()
        .find_map(|key| map.get(*key).and_then(scalar_to_string))
}

/// Spreadsheet exports hand us numbers (phone, postcode) and booleans
/// (old-address flag) as often as strings.
fn scalar_to_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn resolve_fetch_results(map: &Map<String, Value>) -> Option<FetchResult> {
    let (key, raw) = FETCH_RESULT_ALIASES
        .iter()
        .find_map(|k| map.get(*k).filter(|v| !v.is_null()).map(|v| (*k, v)))?;

    match serde_json::from_value::<FetchResult>(raw.clone()) {
        Ok(fetch) => Some(fetch),
        Err(e) => {
            warn!(key, error = %e, "Ignoring malformed fetch results on lead");
            None
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_spreadsheet_headers() {
        let lead = Lead::from_value(json!({
            "Company Name": "Acme Bakery",
            "Industry Type": "Food",
            "Phone Number": 1234567890u64,
            "Postcode": "AB1 2CD",
            "Old Address": true
        }))
        .unwrap();

        assert_eq!(lead.company_name.as_deref(), Some("Acme Bakery"));
        assert_eq!(lead.phone_number.as_deref(), Some("1234567890"));
        assert_eq!(lead.old_address.as_deref(), Some("true"));
        assert_eq!(lead.get(LeadField::Postcode), Some("AB1 2CD"));
        assert!(lead.county.is_none());
    }

    #[test]
    fn earlier_alias_wins_and_blank_values_fall_through() {
        let lead = Lead::from_value(json!({
            "company_name": "   ",
            "companyName": "Second Choice",
            "company": "Third Choice"
        }))
        .unwrap();
        assert_eq!(lead.company_name.as_deref(), Some("Second Choice"));
    }

    #[test]
    fn nested_objects_are_not_field_values() {
        let lead = Lead::from_value(json!({"county": {"name": "Kent"}})).unwrap();
        assert!(lead.county.is_none());
    }

    #[test]
    fn non_object_is_input_error() {
        let err = Lead::from_value(json!(["not", "a", "lead"])).unwrap_err();
        assert!(matches!(err, LeadSignalError::Input(_)));
    }

    #[test]
    fn fetch_results_attach_under_any_alias() {
        let lead = Lead::from_value(json!({
            "companyName": "Acme",
            "fetchResults": {"raw_data": {"posted_at_iso": "2024-03-01T09:00:00Z"}}
        }))
        .unwrap();
        assert_eq!(lead.posted_at(), Some("2024-03-01T09:00:00Z"));
    }

    #[test]
    fn malformed_fetch_results_are_dropped() {
        let lead = Lead::from_value(json!({
            "company_name": "Acme",
            "fetch_results": {"raw_data": "not an object"}
        }))
        .unwrap();
        assert!(lead.fetch_results.is_none());
        assert_eq!(lead.label(), "Acme");
    }

    #[test]
    fn deserializes_through_alias_table() {
        let lead: Lead = serde_json::from_str(r#"{"leadStatement": "New cafe opening"}"#).unwrap();
        assert_eq!(lead.lead_statement.as_deref(), Some("New cafe opening"));
    }

    #[test]
    fn every_field_has_aliases() {
        for field in LeadField::ALL {
            assert!(!field.aliases().is_empty(), "{field:?} has no aliases");
        }
        assert_eq!(LeadField::ProofUrl.to_string(), "proof_url");
    }
}
