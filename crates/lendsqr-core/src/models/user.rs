use serde::{Deserialize, Deserializer, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// Account status of a customer record.
///
/// Stored records keep whatever casing the data source used; this is the
/// typed view used when comparing or offering transitions. Values outside
/// the three canonical statuses are kept as `Unknown` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserStatus {
    Active,
    Inactive,
    Blacklisted,
    Unknown(String),
}

impl UserStatus {
    /// The three statuses a record can be moved into, in display order.
    pub const CANONICAL: [UserStatus; 3] =
        [UserStatus::Active, UserStatus::Inactive, UserStatus::Blacklisted];

    /// Parse a stored status string. Case-insensitive, ignores surrounding whitespace.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "active" => UserStatus::Active,
            "inactive" => UserStatus::Inactive,
            "blacklisted" => UserStatus::Blacklisted,
            _ => UserStatus::Unknown(trimmed.to_string()),
        }
    }

    /// Title-cased value written back to storage on a status change.
    pub fn as_str(&self) -> &str {
        match self {
            UserStatus::Active => "Active",
            UserStatus::Inactive => "Inactive",
            UserStatus::Blacklisted => "Blacklisted",
            UserStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, UserStatus::Unknown(_))
    }

    /// Label for the row action menu entry that moves a record into this status.
    pub fn action_label(&self) -> &str {
        match self {
            UserStatus::Active => "Activate",
            other => other.as_str(),
        }
    }

    /// Label for the detail view button that moves a record into this status.
    pub fn button_label(&self) -> String {
        format!("{} User", self.as_str())
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An explicit `null` reads as the field's default, the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts either a JSON string or a JSON number for record ids.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) => s,
        Some(RawId::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(default)]
pub struct Profile {
    #[serde(deserialize_with = "nullable")]
    pub avatar: String,
    #[serde(deserialize_with = "nullable")]
    pub full_name: String,
    #[serde(deserialize_with = "nullable")]
    pub bvn: String,
    #[serde(deserialize_with = "nullable")]
    pub gender: String,
    #[serde(deserialize_with = "nullable")]
    pub marital_status: String,
    #[serde(deserialize_with = "nullable")]
    pub children: String,
    #[serde(deserialize_with = "nullable")]
    pub residence: String,
    #[serde(deserialize_with = "nullable")]
    pub tier: u8,
    #[serde(deserialize_with = "nullable")]
    pub account_balance: String,
    #[serde(deserialize_with = "nullable")]
    pub account_number: u64,
    #[serde(deserialize_with = "nullable")]
    pub bank_name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(default)]
pub struct Education {
    #[serde(deserialize_with = "nullable")]
    pub level: String,
    #[serde(deserialize_with = "nullable")]
    pub status: String,
    #[serde(deserialize_with = "nullable")]
    pub sector: String,
    #[serde(deserialize_with = "nullable")]
    pub duration: String,
    #[serde(deserialize_with = "nullable")]
    pub office_email: String,
    #[serde(deserialize_with = "nullable")]
    pub monthly_income: [f64; 2],
    #[serde(deserialize_with = "nullable")]
    pub loan_repayment: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(default)]
pub struct Socials {
    #[serde(deserialize_with = "nullable")]
    pub twitter: String,
    #[serde(deserialize_with = "nullable")]
    pub facebook: String,
    #[serde(deserialize_with = "nullable")]
    pub instagram: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(default)]
pub struct Guarantor {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub phone: String,
    #[serde(deserialize_with = "nullable")]
    pub email: String,
    #[serde(deserialize_with = "nullable")]
    pub relationship: String,
}

/// A customer record as served by the mock data resource and cached under `users`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UserRecord {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub organization: String,
    #[serde(default, deserialize_with = "nullable")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: String,
    #[serde(default, deserialize_with = "nullable")]
    pub date_joined: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub profile: Profile,
    #[serde(default, deserialize_with = "nullable")]
    pub education: Education,
    #[serde(default, deserialize_with = "nullable")]
    pub socials: Socials,
    #[serde(default, deserialize_with = "nullable")]
    pub guarantor: Vec<Guarantor>,
    #[serde(rename = "hasLoan", default, deserialize_with = "nullable")]
    pub has_loan: bool,
    #[serde(rename = "hasSavings", default, deserialize_with = "nullable")]
    pub has_savings: bool,
}

impl UserRecord {
    pub fn status(&self) -> UserStatus {
        UserStatus::parse(&self.status)
    }

    /// A blank id cannot be navigated to or mutated.
    pub fn has_valid_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Name shown in headers: the profile name, falling back to the username.
    pub fn display_name(&self) -> &str {
        if self.profile.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.profile.full_name
        }
    }

    pub fn with_status(&self, status: &UserStatus) -> Self {
        Self {
            status: status.as_str().to_string(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!(UserStatus::parse("active"), UserStatus::Active);
        assert_eq!(UserStatus::parse("INACTIVE"), UserStatus::Inactive);
        assert_eq!(UserStatus::parse(" Blacklisted "), UserStatus::Blacklisted);
    }

    #[test]
    fn test_status_parse_unknown_keeps_value() {
        let status = UserStatus::parse("Pending");
        assert_eq!(status, UserStatus::Unknown("Pending".to_string()));
        assert!(!status.is_canonical());
        assert_eq!(status.as_str(), "Pending");
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(UserStatus::Active.action_label(), "Activate");
        assert_eq!(UserStatus::Blacklisted.action_label(), "Blacklisted");
        assert_eq!(UserStatus::Inactive.button_label(), "Inactive User");
    }

    #[test]
    fn test_record_status_preserves_stored_case() {
        let json = r#"{"id": "1", "status": "active"}"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.status, "active");
        assert_eq!(user.status(), UserStatus::Active);

        let round = serde_json::to_value(&user).unwrap();
        assert_eq!(round["status"], "active");
    }

    #[test]
    fn test_numeric_id_is_normalized() {
        let user: UserRecord = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(user.id, "42");
        assert!(user.has_valid_id());
    }

    #[test]
    fn test_missing_id_is_invalid() {
        let user: UserRecord = serde_json::from_str(r#"{"username": "ghost"}"#).unwrap();
        assert_eq!(user.id, "");
        assert!(!user.has_valid_id());
    }

    #[test]
    fn test_camel_case_flags() {
        let json = r#"{"id": "3", "hasLoan": true, "hasSavings": false}"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert!(user.has_loan);
        assert!(!user.has_savings);

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["hasLoan"], true);
        assert!(value.get("has_loan").is_none());
    }

    #[test]
    fn test_nested_records_parse() {
        let json = r#"{
            "id": "5",
            "profile": {"full_name": "Grace Effiom", "tier": 2, "account_balance": "₦200,000"},
            "education": {"level": "B.Sc", "monthly_income": [200000, 400000]},
            "guarantor": [{"name": "Debby Ogana", "relationship": "Sister"}]
        }"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.display_name(), "Grace Effiom");
        assert_eq!(user.profile.tier, 2);
        assert_eq!(user.education.monthly_income, [200000.0, 400000.0]);
        assert_eq!(user.guarantor[0].name, "Debby Ogana");
    }

    #[test]
    fn test_null_fields_read_as_defaults() {
        let json = r#"{
            "id": "2",
            "phone": null,
            "status": null,
            "hasLoan": null,
            "profile": {"full_name": null, "tier": null},
            "education": null,
            "socials": {"twitter": null},
            "guarantor": [{"name": "Ade", "phone": null}]
        }"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "2");
        assert_eq!(user.phone, "");
        assert_eq!(user.status(), UserStatus::Unknown(String::new()));
        assert!(!user.has_loan);
        assert_eq!(user.profile.tier, 0);
        assert_eq!(user.education, Education::default());
        assert_eq!(user.guarantor[0].name, "Ade");
        assert_eq!(user.guarantor[0].phone, "");
    }

    #[test]
    fn test_with_status_title_cases() {
        let user = UserRecord {
            id: "1".to_string(),
            status: "active".to_string(),
            ..Default::default()
        };
        let updated = user.with_status(&UserStatus::Blacklisted);
        assert_eq!(updated.status, "Blacklisted");
        assert_eq!(updated.id, "1");
    }
}
