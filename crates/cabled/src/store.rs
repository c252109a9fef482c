//! Cable design store.
//!
//! SQLite-backed persistence for named designs, used by the reference input
//! mode and the /design/list and /design/:id routes.
//! Location: /var/lib/cabled/cable_designs.db unless configured otherwise.

use anyhow::{anyhow, Context, Result};
use cable_common::{
    ConductorClass, ConductorMaterial, DesignFields, DesignId, DesignLookup, InsulationMaterial,
    LookupError, Standard,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Page size when the caller gives none
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Hard cap on page size
pub const MAX_LIST_LIMIT: usize = 100;

const SELECT_COLUMNS: &str = "id, name, standard, voltage, conductor_material, conductor_class, \
     csa, insulation_material, insulation_thickness, created_at, updated_at";

/// A stored design as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignRecord {
    pub id: DesignId,
    pub name: String,
    #[serde(flatten)]
    pub fields: DesignFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Design store backed by SQLite
#[derive(Clone)]
pub struct DesignStore {
    conn: Arc<Mutex<Connection>>,
}

impl DesignStore {
    /// Open or create the store at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {:?}", path))?;
        Self::with_connection(conn)
    }

    /// Throwaway store for tests and one-shot CLI runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("design store connection lock poisoned"))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS cable_designs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                standard TEXT,
                voltage TEXT,
                conductor_material TEXT,
                conductor_class TEXT,
                csa REAL,
                insulation_material TEXT,
                insulation_thickness REAL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cable_designs_name ON cable_designs(name)",
            [],
        )?;

        Ok(())
    }

    /// Insert a design and return its id
    pub fn create(&self, name: &str, fields: &DesignFields) -> Result<DesignId> {
        let conn = self.lock()?;
        insert_design(&conn, name, fields)
    }

    pub fn get(&self, id: DesignId) -> Result<Option<DesignRecord>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM cable_designs WHERE id = ?", SELECT_COLUMNS);
        let record = conn
            .query_row(&sql, params![id], row_to_record)
            .optional()
            .with_context(|| format!("Failed to read design {}", id))?;
        Ok(record)
    }

    /// Page through designs in id order. `limit` is clamped to 1..=100;
    /// a `skip` past the end yields an empty page.
    pub fn list(&self, skip: usize, limit: usize) -> Result<Vec<DesignRecord>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        // SQLite offsets are signed 64-bit
        let offset = i64::try_from(skip).unwrap_or(i64::MAX);
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM cable_designs ORDER BY id LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64, offset], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cable_designs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Insert the sample designs if the table is empty. Returns how many
    /// were inserted (zero when the store already had data).
    pub fn seed_samples(&self) -> Result<usize> {
        let mut conn = self.lock()?;
        let existing: i64 =
            conn.query_row("SELECT COUNT(*) FROM cable_designs", [], |row| row.get(0))?;
        if existing > 0 {
            info!("Store already has {} designs, skipping seed", existing);
            return Ok(0);
        }

        let samples = sample_designs();
        let tx = conn.transaction()?;
        for (name, fields) in &samples {
            insert_design(&tx, name, fields)?;
        }
        tx.commit().context("Failed to commit sample designs")?;

        info!("Seeded {} sample cable designs", samples.len());
        Ok(samples.len())
    }
}

impl DesignLookup for DesignStore {
    fn lookup_design(&self, id: DesignId) -> Result<DesignFields, LookupError> {
        match self.get(id) {
            Ok(Some(record)) => Ok(record.fields),
            Ok(None) => Err(LookupError::NotFound(id)),
            Err(e) => Err(LookupError::Backend(format!("{:#}", e))),
        }
    }
}

fn insert_design(conn: &Connection, name: &str, fields: &DesignFields) -> Result<DesignId> {
    let now = Utc::now();
    conn.execute(
        r#"
        INSERT INTO cable_designs (
            name, standard, voltage, conductor_material, conductor_class,
            csa, insulation_material, insulation_thickness, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        "#,
        params![
            name,
            fields.standard.as_ref().map(|v| v.code()),
            fields.voltage,
            fields.conductor_material.as_ref().map(|v| v.code()),
            fields.conductor_class.as_ref().map(|v| v.code()),
            fields.csa,
            fields.insulation_material.as_ref().map(|v| v.code()),
            fields.insulation_thickness,
            now,
        ],
    )
    .with_context(|| format!("Failed to insert design {:?}", name))?;
    Ok(conn.last_insert_rowid())
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<DesignRecord> {
    Ok(DesignRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        fields: DesignFields {
            standard: row.get::<_, Option<String>>(2)?.map(Standard::from),
            voltage: row.get(3)?,
            conductor_material: row.get::<_, Option<String>>(4)?.map(ConductorMaterial::from),
            conductor_class: row.get::<_, Option<String>>(5)?.map(ConductorClass::from),
            csa: row.get(6)?,
            insulation_material: row.get::<_, Option<String>>(7)?.map(InsulationMaterial::from),
            insulation_thickness: row.get(8)?,
        },
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Reference designs covering a compliant cable, a borderline one, a clear
/// failure, aluminium and flexible conductors, and an incomplete record.
pub fn sample_designs() -> Vec<(&'static str, DesignFields)> {
    let lv = |material: &str, class: &str, csa: f64, insulation: &str, thickness: f64| {
        DesignFields {
            standard: Some(Standard::Iec60502_1),
            voltage: Some("0.6/1 kV".to_string()),
            conductor_material: Some(ConductorMaterial::from(material)),
            conductor_class: Some(ConductorClass::from(class)),
            csa: Some(csa),
            insulation_material: Some(InsulationMaterial::from(insulation)),
            insulation_thickness: Some(thickness),
        }
    };

    vec![
        (
            "Standard LV Power Cable - 10mm²",
            lv("Cu", "Class 2", 10.0, "PVC", 1.0),
        ),
        (
            "LV Power Cable - 16mm² (Borderline)",
            lv("Cu", "Class 2", 16.0, "PVC", 0.9),
        ),
        (
            "Non-Compliant Cable - Thin Insulation",
            lv("Cu", "Class 2", 10.0, "PVC", 0.5),
        ),
        (
            "Aluminum Conductor Cable",
            lv("Al", "Class 1", 25.0, "XLPE", 1.2),
        ),
        (
            "Flexible Cable - Class 5",
            lv("Cu", "Class 5", 4.0, "PVC", 0.8),
        ),
        (
            "Incomplete Specification",
            DesignFields {
                conductor_material: Some(ConductorMaterial::Copper),
                csa: Some(10.0),
                insulation_material: Some(InsulationMaterial::Pvc),
                insulation_thickness: Some(1.0),
                ..Default::default()
            },
        ),
    ]
}
