use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{MedicationStatus, Substance};
use crate::models::{Client, Identity, Medication};

use super::{from_json, parse_uuid, to_json};

pub fn insert_client(conn: &Connection, client: &Client) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clients (id, first_name, last_name, middle_initial, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            client.id.to_string(),
            client.identity.first_name,
            client.identity.last_name,
            client.identity.middle_initial,
            client.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_client(conn: &Connection, id: &Uuid) -> Result<Option<Client>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, middle_initial, created_at
         FROM clients WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], client_row);

    match result {
        Ok(row) => Ok(Some(client_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Exact name lookup: case-insensitive first/last equality, with middle
/// initial equality only when the query supplies one.
pub fn find_clients_by_name(
    conn: &Connection,
    query: &Identity,
    limit: usize,
) -> Result<Vec<Client>, DatabaseError> {
    let rows = match &query.middle_initial {
        Some(middle) => {
            let mut stmt = conn.prepare(
                "SELECT id, first_name, last_name, middle_initial, created_at
                 FROM clients
                 WHERE LOWER(first_name) = LOWER(?1)
                   AND LOWER(last_name) = LOWER(?2)
                   AND LOWER(COALESCE(middle_initial, '')) = LOWER(?3)
                 LIMIT ?4",
            )?;
            let mapped = stmt.query_map(
                params![query.first_name, query.last_name, middle, limit as i64],
                client_row,
            )?;
            mapped.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, first_name, last_name, middle_initial, created_at
                 FROM clients
                 WHERE LOWER(first_name) = LOWER(?1)
                   AND LOWER(last_name) = LOWER(?2)
                 LIMIT ?3",
            )?;
            let mapped = stmt.query_map(
                params![query.first_name, query.last_name, limit as i64],
                client_row,
            )?;
            mapped.collect::<Result<Vec<_>, _>>()?
        }
    };

    rows.into_iter().map(client_from_row).collect()
}

/// The full candidate pool for fuzzy matching.
pub fn list_clients(conn: &Connection) -> Result<Vec<Client>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, middle_initial, created_at
         FROM clients ORDER BY LOWER(last_name), LOWER(first_name)",
    )?;

    let rows = stmt.query_map([], client_row)?;

    let mut clients = Vec::new();
    for row in rows {
        clients.push(client_from_row(row?)?);
    }
    Ok(clients)
}

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (id, client_id, name, detected_as, require_confirmation,
         status, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            med.id.to_string(),
            med.client_id.to_string(),
            med.name,
            to_json("detected_as", &med.detected_as)?,
            med.require_confirmation as i32,
            med.status.as_str(),
            med.start_date,
            med.end_date,
        ],
    )?;
    Ok(())
}

pub fn get_client_medications(
    conn: &Connection,
    client_id: &Uuid,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, name, detected_as, require_confirmation, status,
         start_date, end_date
         FROM medications WHERE client_id = ?1",
    )?;

    let rows = stmt.query_map(params![client_id.to_string()], medication_row)?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medication_from_row(row?)?);
    }
    Ok(meds)
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

struct ClientRow {
    id: String,
    first_name: String,
    last_name: String,
    middle_initial: Option<String>,
    created_at: NaiveDateTime,
}

fn client_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClientRow> {
    Ok(ClientRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        middle_initial: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn client_from_row(row: ClientRow) -> Result<Client, DatabaseError> {
    Ok(Client {
        id: parse_uuid("clients.id", &row.id)?,
        identity: Identity {
            first_name: row.first_name,
            last_name: row.last_name,
            middle_initial: row.middle_initial,
        },
        created_at: row.created_at,
    })
}

struct MedicationRow {
    id: String,
    client_id: String,
    name: String,
    detected_as: String,
    require_confirmation: i32,
    status: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

fn medication_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MedicationRow> {
    Ok(MedicationRow {
        id: row.get(0)?,
        client_id: row.get(1)?,
        name: row.get(2)?,
        detected_as: row.get(3)?,
        require_confirmation: row.get(4)?,
        status: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
    })
}

fn medication_from_row(row: MedicationRow) -> Result<Medication, DatabaseError> {
    Ok(Medication {
        id: parse_uuid("medications.id", &row.id)?,
        client_id: parse_uuid("medications.client_id", &row.client_id)?,
        name: row.name,
        detected_as: from_json::<Vec<Substance>>("detected_as", &row.detected_as)?,
        require_confirmation: row.require_confirmation != 0,
        status: MedicationStatus::from_str(&row.status)?,
        start_date: row.start_date,
        end_date: row.end_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn client(first: &str, last: &str, middle: Option<&str>) -> Client {
        Client {
            id: Uuid::new_v4(),
            identity: Identity::new(first, last, middle),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn insert_and_get_client() {
        let conn = open_memory_database().unwrap();
        let c = client("John", "Doe", Some("Q"));
        insert_client(&conn, &c).unwrap();

        let loaded = get_client(&conn, &c.id).unwrap().unwrap();
        assert_eq!(loaded.id, c.id);
        assert_eq!(loaded.identity, c.identity);
    }

    #[test]
    fn get_missing_client_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_client(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let conn = open_memory_database().unwrap();
        insert_client(&conn, &client("John", "Doe", None)).unwrap();

        let query = Identity::new("JOHN", "doe", None);
        let found = find_clients_by_name(&conn, &query, 5).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn find_by_name_filters_on_middle_initial_when_supplied() {
        let conn = open_memory_database().unwrap();
        insert_client(&conn, &client("John", "Doe", Some("Q"))).unwrap();
        insert_client(&conn, &client("John", "Doe", Some("R"))).unwrap();
        insert_client(&conn, &client("John", "Doe", None)).unwrap();

        let without_middle = Identity::new("John", "Doe", None);
        assert_eq!(find_clients_by_name(&conn, &without_middle, 5).unwrap().len(), 3);

        let with_middle = Identity::new("John", "Doe", Some("q"));
        let found = find_clients_by_name(&conn, &with_middle, 5).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].identity.middle_initial.as_deref(), Some("Q"));
    }

    #[test]
    fn find_by_name_respects_limit() {
        let conn = open_memory_database().unwrap();
        for _ in 0..8 {
            insert_client(&conn, &client("John", "Doe", None)).unwrap();
        }

        let query = Identity::new("John", "Doe", None);
        assert_eq!(find_clients_by_name(&conn, &query, 5).unwrap().len(), 5);
    }

    #[test]
    fn medications_round_trip() {
        let conn = open_memory_database().unwrap();
        let c = client("Jane", "Smith", None);
        insert_client(&conn, &c).unwrap();

        let med = Medication {
            id: Uuid::new_v4(),
            client_id: c.id,
            name: "Oxycodone".into(),
            detected_as: vec![Substance::Oxycodone, Substance::Opiates],
            require_confirmation: true,
            status: MedicationStatus::Active,
            start_date: Some("2026-01-01".parse().unwrap()),
            end_date: None,
        };
        insert_medication(&conn, &med).unwrap();

        let meds = get_client_medications(&conn, &c.id).unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].detected_as, vec![Substance::Oxycodone, Substance::Opiates]);
        assert!(meds[0].require_confirmation);
        assert_eq!(meds[0].status, MedicationStatus::Active);
        assert_eq!(meds[0].start_date, Some("2026-01-01".parse().unwrap()));
    }
}
