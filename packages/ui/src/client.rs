//! Backend client shared by every screen.
//!
//! - **`rest` feature**: [`backend::RestBackend`] configured from `PARISHBOOK_URL` and
//!   `PARISHBOOK_ANON_KEY`, read at build time when set and from the environment
//!   (or `.env`) otherwise.
//! - **default**: [`backend::MemoryBackend`] seeded with a demo parish, for offline
//!   use and local development.

#[cfg(feature = "rest")]
pub type Client = backend::RestBackend;

#[cfg(not(feature = "rest"))]
pub type Client = backend::MemoryBackend;

#[cfg(feature = "rest")]
pub fn make_client() -> Client {
    use backend::BackendConfig;

    let config = match (option_env!("PARISHBOOK_URL"), option_env!("PARISHBOOK_ANON_KEY")) {
        (Some(url), Some(key)) => Ok(BackendConfig::new(url, key)),
        _ => BackendConfig::from_env(),
    };
    let config = config.unwrap_or_else(|e| {
        tracing::error!("backend not configured: {}", e);
        BackendConfig::new("http://localhost:54321", "")
    });
    tracing::info!(url = %config.url, "using hosted backend");
    backend::RestBackend::new(config)
}

#[cfg(not(feature = "rest"))]
pub fn make_client() -> Client {
    use backend::Table;
    use serde_json::json;

    let client = backend::MemoryBackend::new();
    let admin = client.add_account("demo-admin", "admin@parish.local", "password");
    client.seed(
        Table::Profiles,
        [json!({
            "id": admin.id,
            "email": admin.email,
            "full_name": "Parish Admin",
            "role": "admin",
        })],
    );
    client.seed(
        Table::Families,
        [
            json!({"id": 1, "family_name": "Okello", "parish": "St. Joseph", "province": "Nairobi", "jummuiya": "St. Monica", "created_at": "2024-01-14T09:00:00Z"}),
            json!({"id": 2, "family_name": "Mwangi", "parish": "Holy Family", "province": "Kiambu", "jummuiya": "St. Anne", "created_at": "2024-02-03T10:30:00Z"}),
            json!({"id": 3, "family_name": "Achieng", "parish": "St. Joseph", "province": "Kisumu", "created_at": "2024-03-21T16:45:00Z"}),
        ],
    );
    client.seed(
        Table::Members,
        [
            json!({"id": 1, "family_id": 1, "first_name": "Peter", "last_name": "Okello", "relation": "Father", "date_of_birth": "1975-04-02", "baptism_date": "1975-06-01", "marriage_date": "2001-08-18", "spouse": "Grace Okello"}),
            json!({"id": 2, "family_id": 1, "first_name": "Grace", "middle_name": "Akinyi", "last_name": "Okello", "relation": "Mother", "date_of_birth": "1978-11-23", "marriage_date": "2001-08-18", "spouse": "Peter Okello"}),
            json!({"id": 3, "family_id": 1, "first_name": "Brian", "last_name": "Okello", "relation": "Son", "date_of_birth": "2005-01-09", "baptism_date": "2005-03-13"}),
            json!({"id": 4, "family_id": 2, "first_name": "Jane", "last_name": "Mwangi", "relation": "Mother", "date_of_birth": "1982-07-30"}),
        ],
    );
    client
}
