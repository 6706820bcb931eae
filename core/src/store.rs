//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Generated instances and solutions are stored as JSON payloads keyed by
//! UUIDs; the schema lives in migrations/.

use crate::{
    error::{GenError, GenResult},
    exec_params::ExecParams,
    sampler::ReactorRequestSampler,
    solver::Solution,
};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

/// One stored instance and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRecord {
    pub inst_id:  Uuid,
    pub param_id: Uuid,
    /// Master seed of the run that generated it.
    pub seed:     u64,
    /// RNG stream index within that run.
    pub stream:   u64,
    pub params:   ExecParams,
}

pub struct InstanceStore {
    conn: Connection,
}

impl InstanceStore {
    /// Open (or create) the instance database at `path`.
    pub fn open(path: &str) -> GenResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GenResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GenResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_instances.sql"))?;
        Ok(())
    }

    // ── Points ─────────────────────────────────────────────────

    pub fn record_point(&self, param_id: &Uuid, sampler: &ReactorRequestSampler) -> GenResult<()> {
        self.conn.execute(
            "INSERT INTO point (param_id, sampler, created_at) VALUES (?1, ?2, ?3)",
            params![
                param_id.to_string(),
                serde_json::to_string(sampler)?,
                now(),
            ],
        )?;
        Ok(())
    }

    pub fn read_point(&self, param_id: &Uuid) -> GenResult<Option<ReactorRequestSampler>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT sampler FROM point WHERE param_id = ?1",
                params![param_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    // ── Instances ──────────────────────────────────────────────

    pub fn record_instance(&self, record: &InstanceRecord) -> GenResult<()> {
        self.conn.execute(
            "INSERT INTO instance (inst_id, param_id, seed, stream, n_arcs, params, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.inst_id.to_string(),
                record.param_id.to_string(),
                record.seed as i64,
                record.stream as i64,
                record.params.arc_count() as i64,
                serde_json::to_string(&record.params)?,
                now(),
            ],
        )?;
        Ok(())
    }

    pub fn read_instance(&self, inst_id: &Uuid) -> GenResult<InstanceRecord> {
        let row = self
            .conn
            .query_row(
                "SELECT param_id, seed, stream, params FROM instance WHERE inst_id = ?1",
                params![inst_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        let (param_id, seed, stream, json) =
            row.ok_or_else(|| GenError::InstanceNotFound(inst_id.to_string()))?;
        Ok(InstanceRecord {
            inst_id:  *inst_id,
            param_id: parse_uuid(&param_id)?,
            seed:     seed as u64,
            stream:   stream as u64,
            params:   serde_json::from_str(&json)?,
        })
    }

    /// All instance ids, in insertion order.
    pub fn instance_ids(&self) -> GenResult<Vec<Uuid>> {
        let mut stmt = self
            .conn
            .prepare("SELECT inst_id FROM instance ORDER BY rowid ASC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        ids.iter().map(String::as_str).map(parse_uuid).collect()
    }

    pub fn instance_count(&self) -> GenResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM instance", [], |row| row.get(0))?;
        Ok(n)
    }

    // ── Solutions ──────────────────────────────────────────────

    pub fn record_solution(
        &self,
        soln_id: &Uuid,
        inst_id: &Uuid,
        solver: &str,
        solution: &Solution,
    ) -> GenResult<()> {
        self.conn.execute(
            "INSERT INTO solution (soln_id, inst_id, solver, time, objective, version, flows, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                soln_id.to_string(),
                inst_id.to_string(),
                solver,
                solution.time,
                solution.objective,
                &solution.version,
                serde_json::to_string(&solution.flows)?,
                now(),
            ],
        )?;
        Ok(())
    }

    /// `(solver kind, solution)` pairs recorded for an instance.
    pub fn solutions_for(&self, inst_id: &Uuid) -> GenResult<Vec<(String, Solution)>> {
        let mut stmt = self.conn.prepare(
            "SELECT solver, time, objective, version, flows FROM solution
             WHERE inst_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![inst_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(solver, time, objective, version, flows)| -> GenResult<(String, Solution)> {
                Ok((
                    solver,
                    Solution {
                        time,
                        objective,
                        version,
                        flows: serde_json::from_str(&flows)?,
                    },
                ))
            })
            .collect()
    }
}

fn parse_uuid(s: &str) -> GenResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| GenError::Other(anyhow::anyhow!("bad uuid '{s}': {e}")))
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
