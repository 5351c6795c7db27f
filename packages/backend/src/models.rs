//! # Records exchanged with the backend
//!
//! Rows arrive from the backend as JSON objects ([`Row`]) and are decoded into the
//! typed records below by the query builder. Field names match the persisted
//! column names so that serde needs no renames.
//!
//! | Struct | Table | Notes |
//! |--------|-------|-------|
//! | [`Profile`] | `profiles` | One-to-one with an [`Identity`]. `role` is free text; only `"admin"` is privileged. |
//! | [`Family`] | `families` | Read-only mirror in the views. |
//! | [`Member`] | `members` | Belongs to a family through `family_id`. |
//!
//! [`Identity`] and [`Session`] come from the auth side of the backend and are
//! never stored in a table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single row as returned by the backend.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Collections this application reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Profiles,
    Families,
    Members,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Families => "families",
            Table::Members => "members",
        }
    }

    pub fn parse(name: &str) -> Option<Table> {
        match name {
            "profiles" => Some(Table::Profiles),
            "families" => Some(Table::Families),
            "members" => Some(Table::Members),
            _ => None,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user as known to the auth provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Proof of authentication. Opaque apart from the identity it carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(rename = "user")]
    pub identity: Identity,
}

/// Email/password pair for sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Sign-up form contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpDetails {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Application profile attached to an identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Profile {
    /// Display name, falling back to the email and then the id.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// A registered family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub id: i64,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub parish: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub jummuiya: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A member of a family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub family_id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub baptism_date: Option<NaiveDate>,
    #[serde(default)]
    pub marriage_date: Option<NaiveDate>,
    #[serde(default)]
    pub spouse: Option<String>,
}

impl Member {
    /// First, middle and last name joined by single spaces. Missing or blank
    /// parts are skipped.
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Kind of row change reported by the change feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn parse(name: &str) -> Option<ChangeKind> {
        match name.to_ascii_uppercase().as_str() {
            "INSERT" => Some(ChangeKind::Insert),
            "UPDATE" => Some(ChangeKind::Update),
            "DELETE" => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

/// A change notification. Subscribers treat every kind as "refetch".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Change {
    pub table: Table,
    pub kind: ChangeKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn member(first: Option<&str>, middle: Option<&str>, last: Option<&str>) -> Member {
        Member {
            id: 1,
            family_id: 7,
            first_name: first.map(String::from),
            middle_name: middle.map(String::from),
            last_name: last.map(String::from),
            relation: None,
            date_of_birth: None,
            baptism_date: None,
            marriage_date: None,
            spouse: None,
        }
    }

    #[test]
    fn full_name_skips_missing_parts() {
        assert_eq!(member(Some("Jane"), None, Some("Doe")).full_name(), "Jane Doe");
        assert_eq!(
            member(Some("John"), Some("Paul"), Some("Okello")).full_name(),
            "John Paul Okello"
        );
        assert_eq!(member(None, Some("  "), Some(" Doe ")).full_name(), "Doe");
        assert_eq!(member(None, None, None).full_name(), "");
    }

    #[test]
    fn member_decodes_from_row_with_nulls() {
        let row = json!({
            "id": 3,
            "family_id": 7,
            "first_name": "Jane",
            "middle_name": null,
            "last_name": "Doe",
            "relation": "Daughter",
            "date_of_birth": "1999-12-31",
            "baptism_date": null,
        });
        let member: Member = serde_json::from_value(row).unwrap();
        assert_eq!(member.date_of_birth, NaiveDate::from_ymd_opt(1999, 12, 31));
        assert!(member.marriage_date.is_none());
        assert!(member.spouse.is_none());
    }

    #[test]
    fn session_reads_user_field() {
        let session: Session = serde_json::from_value(json!({
            "access_token": "tok",
            "user": { "id": "u-1", "email": "a@b.org" }
        }))
        .unwrap();
        assert_eq!(session.identity.id, "u-1");
    }

    #[test]
    fn profile_display_name_falls_back() {
        let profile = Profile {
            id: "u-1".to_string(),
            email: Some("a@b.org".to_string()),
            full_name: None,
            role: None,
        };
        assert_eq!(profile.display_name(), "a@b.org");
    }
}
