//! Persisted record of which store version is in control.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// The version recorded by the last activation, if any.
    pub async fn active_version(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                match conn.query_row("SELECT active_version FROM registration WHERE id = 1", [], |row| row.get(0)) {
                    Ok(version) => Ok(Some(version)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Record `version` as the one in control.
    pub async fn set_active_version(&self, version: &str) -> Result<(), Error> {
        let v = version.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                record_active(conn, &v)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Put `version` in control and delete every other store.
    ///
    /// Both happen in one transaction: if the version cannot be recorded, no
    /// store is deleted and the previous record stands. Returns the deleted
    /// versions in order.
    pub async fn activate_store(&self, version: &str) -> Result<Vec<String>, Error> {
        let v = version.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let stale = {
                    let mut stmt = tx.prepare("SELECT version FROM stores WHERE version <> ?1 ORDER BY version")?;
                    let rows = stmt
                        .query_map(params![v], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                };
                tx.execute("DELETE FROM stores WHERE version <> ?1", params![v])?;
                record_active(&tx, &v)?;
                tx.commit()?;
                Ok(stale)
            })
            .await
            .map_err(Error::from)
    }
}

fn record_active(conn: &rusqlite::Connection, version: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO registration (id, active_version, activated_at) VALUES (1, ?1, ?2)
         ON CONFLICT(id) DO UPDATE SET
            active_version = excluded.active_version,
            activated_at = excluded.activated_at",
        params![version, chrono::Utc::now().to_rfc3339()],
    )
}
