//! The `SQLite3` database driver.
use std::panic::Location;

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::rusqlite::{params, OptionalExtension};
use r2d2_sqlite::SqliteConnectionManager;

use super::{Database, Error};
use crate::core::announce::{Announce, Endpoint, Event};
use crate::core::auth::Key;
use crate::core::torrent::{PeerBehavior, SwarmSummary, TransferSnapshot};
use crate::shared::bit_torrent::info_hash::InfoHash;

pub struct Sqlite {
    pool: Pool<SqliteConnectionManager>,
}

impl Sqlite {
    /// It instantiates a new `SQLite3` database driver.
    ///
    /// `db_path` accepts a file path or an SQLite URI (for example
    /// `file:ephemeral?mode=memory&cache=shared`).
    ///
    /// # Errors
    ///
    /// Will return `Error` if `db_path` is not able to create an `SQLite`
    /// connection pool.
    pub fn new(db_path: &str) -> Result<Sqlite, Error> {
        // Cascading deletes only work with foreign keys enforced, which in
        // SQLite is a per-connection pragma.
        let cm = SqliteConnectionManager::file(db_path).with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::new(cm)?;
        Ok(Sqlite { pool })
    }

    fn clamped(cutoff: u64) -> i64 {
        i64::try_from(cutoff).unwrap_or(i64::MAX)
    }
}

#[async_trait]
impl Database for Sqlite {
    /// Refer to [`databases::Database::create_database_tables`](crate::core::databases::Database::create_database_tables).
    fn create_database_tables(&self) -> Result<(), Error> {
        let conn = self.pool.get()?;

        // The trigger keeps `last_announce` bumped on every row mutation.
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS infohashes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                info_hash BLOB NOT NULL UNIQUE,
                downloaded INTEGER DEFAULT 0 NOT NULL,
                name TEXT NOT NULL,
                file BLOB,
                length INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_info_hash ON infohashes (info_hash);

            CREATE TABLE IF NOT EXISTS peers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                announce_key TEXT NOT NULL UNIQUE,
                snatched INTEGER DEFAULT 0 NOT NULL,
                downloaded INTEGER DEFAULT 0 NOT NULL,
                uploaded INTEGER DEFAULT 0 NOT NULL,
                created_time INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            );

            CREATE INDEX IF NOT EXISTS idx_announce_key ON peers (announce_key);

            CREATE TABLE IF NOT EXISTS announces (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                peers_id INTEGER NOT NULL REFERENCES peers (id) ON DELETE CASCADE,
                info_hash_id INTEGER NOT NULL REFERENCES infohashes (id) ON DELETE CASCADE,
                ip_port BLOB NOT NULL,
                amount_left INTEGER NOT NULL,
                downloaded INTEGER NOT NULL,
                uploaded INTEGER NOT NULL,
                event INTEGER NOT NULL,
                last_announce INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                UNIQUE (peers_id, info_hash_id)
            );

            CREATE TRIGGER IF NOT EXISTS set_last_announce
            AFTER UPDATE OF ip_port, amount_left, uploaded, downloaded, event ON announces
            FOR EACH ROW
            BEGIN
                UPDATE announces SET last_announce = strftime('%s', 'now') WHERE id = NEW.id;
            END;
            ",
        )?;

        Ok(())
    }

    /// Refer to [`databases::Database::drop_database_tables`](crate::core::databases::Database::drop_database_tables).
    fn drop_database_tables(&self) -> Result<(), Error> {
        let conn = self.pool.get()?;

        conn.execute_batch(
            "
            DROP TABLE IF EXISTS announces;
            DROP TABLE IF EXISTS peers;
            DROP TABLE IF EXISTS infohashes;
            ",
        )?;

        Ok(())
    }

    /// Refer to [`databases::Database::insert_announce_key`](crate::core::databases::Database::insert_announce_key).
    async fn insert_announce_key(&self, key: &Key) -> Result<(), Error> {
        let conn = self.pool.get()?;

        let insert = conn.execute("INSERT INTO peers (announce_key) VALUES (?1)", [key.as_str()])?;

        if insert == 0 {
            Err(Error::InsertFailed {
                location: Location::caller(),
            })
        } else {
            Ok(())
        }
    }

    /// Refer to [`databases::Database::announce_key_exists`](crate::core::databases::Database::announce_key_exists).
    async fn announce_key_exists(&self, key: &Key) -> Result<bool, Error> {
        let conn = self.pool.get()?;

        let exists = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM peers WHERE announce_key = ?1)",
            [key.as_str()],
            |row| row.get::<_, bool>(0),
        )?;

        Ok(exists)
    }

    /// Refer to [`databases::Database::prune_announce_keys`](crate::core::databases::Database::prune_announce_keys).
    async fn prune_announce_keys(&self, cutoff: u64) -> Result<Vec<Key>, Error> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "
            DELETE FROM peers WHERE id IN (
                SELECT
                    peers.id
                FROM
                    peers
                    LEFT JOIN announces ON peers.id = announces.peers_id
                GROUP BY
                    peers.id
                HAVING (MAX(announces.last_announce) IS NULL
                    OR MAX(announces.last_announce) < ?1)
                AND peers.created_time < ?1
            )
            RETURNING announce_key
            ",
        )?;

        let keys_iter = stmt.query_map([Self::clamped(cutoff)], |row| row.get::<_, String>(0))?;

        let keys: Vec<Key> = keys_iter
            .filter_map(std::result::Result::ok)
            .filter_map(|raw_key| raw_key.parse().ok())
            .collect();

        Ok(keys)
    }

    /// Refer to [`databases::Database::add_info_hash`](crate::core::databases::Database::add_info_hash).
    async fn add_info_hash(&self, info_hash: &InfoHash, name: &str) -> Result<(), Error> {
        let conn = self.pool.get()?;

        let insert = conn.execute(
            "INSERT INTO infohashes (info_hash, name) VALUES (?1, ?2)",
            params![info_hash.bytes().to_vec(), name],
        )?;

        if insert == 0 {
            Err(Error::InsertFailed {
                location: Location::caller(),
            })
        } else {
            Ok(())
        }
    }

    /// Refer to [`databases::Database::add_info_hash_if_missing`](crate::core::databases::Database::add_info_hash_if_missing).
    async fn add_info_hash_if_missing(&self, info_hash: &InfoHash, name: &str) -> Result<(), Error> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO infohashes (info_hash, name) VALUES (?1, ?2) ON CONFLICT (info_hash) DO NOTHING",
            params![info_hash.bytes().to_vec(), name],
        )?;

        Ok(())
    }

    /// Refer to [`databases::Database::is_info_hash_allowed`](crate::core::databases::Database::is_info_hash_allowed).
    async fn is_info_hash_allowed(&self, info_hash: &InfoHash) -> Result<bool, Error> {
        let conn = self.pool.get()?;

        let exists = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM infohashes WHERE info_hash = ?1)",
            [info_hash.bytes().to_vec()],
            |row| row.get::<_, bool>(0),
        )?;

        Ok(exists)
    }

    /// Refer to [`databases::Database::remove_info_hash`](crate::core::databases::Database::remove_info_hash).
    async fn remove_info_hash(&self, info_hash: &InfoHash) -> Result<(), Error> {
        let conn = self.pool.get()?;

        let deleted = conn.execute("DELETE FROM infohashes WHERE info_hash = ?1", [info_hash.bytes().to_vec()])?;

        if deleted == 1 {
            // should only remove a single record.
            Ok(())
        } else {
            Err(Error::DeleteFailed {
                location: Location::caller(),
                error_code: deleted,
            })
        }
    }

    /// Refer to [`databases::Database::insert_torrent_file`](crate::core::databases::Database::insert_torrent_file).
    async fn insert_torrent_file(&self, info_hash: &InfoHash, name: &str, file: &[u8], length: i64) -> Result<(), Error> {
        let conn = self.pool.get()?;

        let insert = conn.execute(
            "INSERT INTO infohashes (info_hash, name, file, length) VALUES (?1, ?2, ?3, ?4)",
            params![info_hash.bytes().to_vec(), name, file, length],
        )?;

        if insert == 0 {
            Err(Error::InsertFailed {
                location: Location::caller(),
            })
        } else {
            Ok(())
        }
    }

    /// Refer to [`databases::Database::get_torrent_file`](crate::core::databases::Database::get_torrent_file).
    async fn get_torrent_file(&self, info_hash: &InfoHash) -> Result<Option<Vec<u8>>, Error> {
        let conn = self.pool.get()?;

        let file = conn
            .query_row(
                "SELECT file FROM infohashes WHERE info_hash = ?1 AND file IS NOT NULL",
                [info_hash.bytes().to_vec()],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;

        Ok(file)
    }

    /// Refer to [`databases::Database::last_reported_transfer`](crate::core::databases::Database::last_reported_transfer).
    async fn last_reported_transfer(&self, key: &Key, info_hash: &InfoHash) -> Result<Option<(i64, i64)>, Error> {
        let conn = self.pool.get()?;

        let transfer = conn
            .query_row(
                "
                SELECT
                    announces.uploaded,
                    announces.downloaded
                FROM
                    announces
                    JOIN peers ON announces.peers_id = peers.id
                    JOIN infohashes ON announces.info_hash_id = infohashes.id
                WHERE
                    peers.announce_key = ?1
                    AND infohashes.info_hash = ?2
                    AND announces.event <> ?3
                ORDER BY
                    announces.last_announce DESC
                LIMIT 1
                ",
                params![key.as_str(), info_hash.bytes().to_vec(), Event::Stopped.column_value()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        Ok(transfer)
    }

    /// Refer to [`databases::Database::add_peer_totals`](crate::core::databases::Database::add_peer_totals).
    async fn add_peer_totals(&self, key: &Key, snatched: i64, uploaded: i64, downloaded: i64) -> Result<(), Error> {
        let conn = self.pool.get()?;

        let updated = conn.execute(
            "
            UPDATE peers
            SET snatched = snatched + ?2,
                uploaded = uploaded + ?3,
                downloaded = downloaded + ?4
            WHERE announce_key = ?1
            ",
            params![key.as_str(), snatched, uploaded, downloaded],
        )?;

        if updated == 0 {
            Err(Error::UpdateFailed {
                location: Location::caller(),
            })
        } else {
            Ok(())
        }
    }

    /// Refer to [`databases::Database::increment_snatches`](crate::core::databases::Database::increment_snatches).
    async fn increment_snatches(&self, info_hash: &InfoHash) -> Result<(), Error> {
        let conn = self.pool.get()?;

        let updated = conn.execute(
            "UPDATE infohashes SET downloaded = downloaded + 1 WHERE info_hash = ?1",
            [info_hash.bytes().to_vec()],
        )?;

        if updated == 0 {
            Err(Error::UpdateFailed {
                location: Location::caller(),
            })
        } else {
            Ok(())
        }
    }

    /// Refer to [`databases::Database::upsert_announce`](crate::core::databases::Database::upsert_announce).
    async fn upsert_announce(&self, announce: &Announce) -> Result<(), Error> {
        let conn = self.pool.get()?;

        let upserted = conn.execute(
            "
            INSERT INTO announces (peers_id, info_hash_id, ip_port, amount_left, uploaded, downloaded, event)
            SELECT peers.id, infohashes.id, ?3, ?4, ?5, ?6, ?7
            FROM peers JOIN infohashes
            WHERE peers.announce_key = ?1 AND infohashes.info_hash = ?2
            ON CONFLICT (peers_id, info_hash_id)
            DO UPDATE SET
                ip_port = excluded.ip_port,
                amount_left = excluded.amount_left,
                uploaded = excluded.uploaded,
                downloaded = excluded.downloaded,
                event = excluded.event
            ",
            params![
                announce.key.as_str(),
                announce.info_hash.bytes().to_vec(),
                announce.endpoint.to_bytes().to_vec(),
                announce.amount_left,
                announce.uploaded,
                announce.downloaded,
                announce.event.column_value(),
            ],
        )?;

        if upserted == 0 {
            // The key or the info-hash row is gone.
            Err(Error::InsertFailed {
                location: Location::caller(),
            })
        } else {
            Ok(())
        }
    }

    /// Refer to [`databases::Database::find_candidates`](crate::core::databases::Database::find_candidates).
    async fn find_candidates(&self, info_hash: &InfoHash, exclude: &Key, active_since: u64) -> Result<Vec<Endpoint>, Error> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "
            SELECT
                announces.ip_port
            FROM
                announces
                JOIN peers ON announces.peers_id = peers.id
                JOIN infohashes ON announces.info_hash_id = infohashes.id
            WHERE
                infohashes.info_hash = ?1
                AND peers.announce_key <> ?2
                AND announces.last_announce >= ?3
                AND announces.event <> ?4
            ",
        )?;

        let endpoint_iter = stmt.query_map(
            params![
                info_hash.bytes().to_vec(),
                exclude.as_str(),
                Self::clamped(active_since),
                Event::Stopped.column_value(),
            ],
            |row| row.get::<_, Vec<u8>>(0),
        )?;

        let endpoints: Vec<Endpoint> = endpoint_iter
            .filter_map(std::result::Result::ok)
            .filter_map(|raw| <[u8; 6]>::try_from(raw.as_slice()).ok())
            .map(Endpoint::from_bytes)
            .collect();

        Ok(endpoints)
    }

    /// Refer to [`databases::Database::count_recent_announces`](crate::core::databases::Database::count_recent_announces).
    async fn count_recent_announces(&self, key: &Key, active_since: u64) -> Result<u64, Error> {
        let conn = self.pool.get()?;

        let count = conn.query_row(
            "
            SELECT
                COUNT(*)
            FROM
                announces
                JOIN peers ON announces.peers_id = peers.id
            WHERE
                peers.announce_key = ?1
                AND announces.last_announce >= ?2
                AND announces.event <> ?3
            ",
            params![key.as_str(), Self::clamped(active_since), Event::Stopped.column_value()],
            |row| row.get::<_, i64>(0),
        )?;

        Ok(count.unsigned_abs())
    }

    /// Refer to [`databases::Database::count_recent_seeds`](crate::core::databases::Database::count_recent_seeds).
    async fn count_recent_seeds(&self, key: &Key, active_since: u64) -> Result<u64, Error> {
        let conn = self.pool.get()?;

        let count = conn.query_row(
            "
            SELECT
                COUNT(*)
            FROM
                announces
                JOIN peers ON announces.peers_id = peers.id
            WHERE
                peers.announce_key = ?1
                AND announces.amount_left = 0
                AND announces.last_announce >= ?2
                AND announces.event <> ?3
            ",
            params![key.as_str(), Self::clamped(active_since), Event::Stopped.column_value()],
            |row| row.get::<_, i64>(0),
        )?;

        Ok(count.unsigned_abs())
    }

    /// Refer to [`databases::Database::recent_transfers`](crate::core::databases::Database::recent_transfers).
    async fn recent_transfers(&self, key: &Key, active_since: u64) -> Result<Vec<TransferSnapshot>, Error> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "
            SELECT
                announces.amount_left,
                announces.uploaded,
                announces.downloaded
            FROM
                announces
                JOIN peers ON announces.peers_id = peers.id
            WHERE
                peers.announce_key = ?1
                AND announces.last_announce >= ?2
                AND announces.event <> ?3
            ",
        )?;

        let snapshot_iter = stmt.query_map(
            params![key.as_str(), Self::clamped(active_since), Event::Stopped.column_value()],
            |row| {
                Ok(TransferSnapshot {
                    amount_left: row.get(0)?,
                    uploaded: row.get(1)?,
                    downloaded: row.get(2)?,
                })
            },
        )?;

        let snapshots: Vec<TransferSnapshot> = snapshot_iter.filter_map(std::result::Result::ok).collect();

        Ok(snapshots)
    }

    /// Refer to [`databases::Database::swarm_seed_counts`](crate::core::databases::Database::swarm_seed_counts).
    async fn swarm_seed_counts(&self, active_since: u64) -> Result<Vec<u64>, Error> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "
            SELECT
                COUNT(*) AS seed_count
            FROM
                announces
            WHERE
                announces.amount_left = 0
                AND announces.last_announce >= ?1
                AND announces.event <> ?2
            GROUP BY
                announces.peers_id
            ",
        )?;

        let count_iter = stmt.query_map(params![Self::clamped(active_since), Event::Stopped.column_value()], |row| {
            row.get::<_, i64>(0)
        })?;

        let counts: Vec<u64> = count_iter.filter_map(std::result::Result::ok).map(i64::unsigned_abs).collect();

        Ok(counts)
    }

    /// Refer to [`databases::Database::peer_behavior`](crate::core::databases::Database::peer_behavior).
    async fn peer_behavior(&self, key: &Key) -> Result<Option<PeerBehavior>, Error> {
        let conn = self.pool.get()?;

        let behavior = conn
            .query_row(
                "SELECT snatched, uploaded, downloaded FROM peers WHERE announce_key = ?1",
                [key.as_str()],
                |row| {
                    Ok(PeerBehavior {
                        snatched: row.get(0)?,
                        uploaded: row.get(1)?,
                        downloaded: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(behavior)
    }

    /// Refer to [`databases::Database::scrape_torrent`](crate::core::databases::Database::scrape_torrent).
    async fn scrape_torrent(&self, info_hash: &InfoHash, active_since: u64) -> Result<Option<SwarmSummary>, Error> {
        let conn = self.pool.get()?;

        let summary = conn
            .query_row(
                &format!("{SCRAPE_QUERY} WHERE infohashes.info_hash = ?3 GROUP BY infohashes.id"),
                params![
                    Self::clamped(active_since),
                    Event::Stopped.column_value(),
                    info_hash.bytes().to_vec()
                ],
                row_to_swarm_summary,
            )
            .optional()?;

        Ok(summary)
    }

    /// Refer to [`databases::Database::scrape_all_torrents`](crate::core::databases::Database::scrape_all_torrents).
    async fn scrape_all_torrents(&self, active_since: u64) -> Result<Vec<SwarmSummary>, Error> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!("{SCRAPE_QUERY} GROUP BY infohashes.id ORDER BY infohashes.name"))?;

        let summary_iter = stmt.query_map(
            params![Self::clamped(active_since), Event::Stopped.column_value()],
            row_to_swarm_summary,
        )?;

        let summaries: Vec<SwarmSummary> = summary_iter.filter_map(std::result::Result::ok).collect();

        Ok(summaries)
    }
}

// The recency and event filters live in the join so unregistered or idle
// torrents still produce a row with zeroed counters.
const SCRAPE_QUERY: &str = "
    SELECT
        infohashes.info_hash,
        infohashes.name,
        infohashes.downloaded,
        COUNT(*) FILTER (WHERE announces.amount_left = 0) AS complete,
        COUNT(*) FILTER (WHERE announces.amount_left > 0) AS incomplete
    FROM
        infohashes
        LEFT JOIN announces ON announces.info_hash_id = infohashes.id
            AND announces.last_announce >= ?1
            AND announces.event <> ?2
";

fn row_to_swarm_summary(row: &r2d2_sqlite::rusqlite::Row<'_>) -> Result<SwarmSummary, r2d2_sqlite::rusqlite::Error> {
    let raw_info_hash: Vec<u8> = row.get(0)?;

    let mut bytes = [0u8; 20];
    if raw_info_hash.len() == 20 {
        bytes.copy_from_slice(&raw_info_hash);
    }

    Ok(SwarmSummary {
        info_hash: InfoHash(bytes),
        name: row.get(1)?,
        downloaded: row.get(2)?,
        complete: row.get(3)?,
        incomplete: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::Sqlite;
    use crate::core::announce::{Announce, Endpoint, Event};
    use crate::core::auth::Key;
    use crate::core::databases::error::Error;
    use crate::core::databases::Database;
    use crate::shared::bit_torrent::info_hash::InfoHash;

    fn ephemeral_database() -> Sqlite {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let instance = COUNTER.fetch_add(1, Ordering::SeqCst);

        let database = Sqlite::new(&format!("file:sqlite-driver-test-{instance}?mode=memory&cache=shared")).unwrap();
        database.create_database_tables().unwrap();
        database
    }

    fn sample_key() -> Key {
        Key::from_str("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap()
    }

    fn another_key() -> Key {
        Key::from_str("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbb").unwrap()
    }

    fn sample_info_hash() -> InfoHash {
        InfoHash(*b"aaaaaaaaaaaaaaaaaaaa")
    }

    fn sample_announce(key: &Key, info_hash: &InfoHash) -> Announce {
        Announce {
            key: key.clone(),
            info_hash: *info_hash,
            endpoint: Endpoint::new(Ipv4Addr::new(192, 0, 2, 1), 6881),
            numwant: 50,
            amount_left: 0,
            downloaded: 0,
            uploaded: 0,
            event: Event::Started,
        }
    }

    async fn registered(database: &Sqlite, key: &Key, info_hash: &InfoHash) {
        database.insert_announce_key(key).await.unwrap();
        database.add_info_hash(info_hash, "test torrent").await.unwrap();
    }

    #[tokio::test]
    async fn it_should_create_the_schema_idempotently() {
        let database = ephemeral_database();

        assert!(database.create_database_tables().is_ok());
    }

    #[tokio::test]
    async fn it_should_store_and_find_announce_keys() {
        let database = ephemeral_database();

        database.insert_announce_key(&sample_key()).await.unwrap();

        assert!(database.announce_key_exists(&sample_key()).await.unwrap());
        assert!(!database.announce_key_exists(&another_key()).await.unwrap());
    }

    #[tokio::test]
    async fn it_should_reject_a_duplicate_announce_key() {
        let database = ephemeral_database();

        database.insert_announce_key(&sample_key()).await.unwrap();

        let result = database.insert_announce_key(&sample_key()).await;

        assert!(matches!(result, Err(Error::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn it_should_reject_a_duplicate_info_hash() {
        let database = ephemeral_database();

        database.add_info_hash(&sample_info_hash(), "first").await.unwrap();

        let result = database.add_info_hash(&sample_info_hash(), "second").await;

        assert!(matches!(result, Err(Error::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn adding_an_info_hash_if_missing_should_tolerate_an_existing_row() {
        let database = ephemeral_database();

        database.add_info_hash_if_missing(&sample_info_hash(), "client added").await.unwrap();
        database.add_info_hash_if_missing(&sample_info_hash(), "client added").await.unwrap();

        assert!(database.is_info_hash_allowed(&sample_info_hash()).await.unwrap());
    }

    mod for_the_announces_table {
        use super::{another_key, ephemeral_database, registered, sample_announce, sample_info_hash, sample_key};
        use crate::core::announce::Event;
        use crate::core::databases::Database;

        #[tokio::test]
        async fn a_reannounce_should_update_the_single_row_for_the_pair() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            let mut announce = sample_announce(&sample_key(), &sample_info_hash());
            announce.uploaded = 10;
            announce.downloaded = 20;
            database.upsert_announce(&announce).await.unwrap();

            announce.uploaded = 100;
            announce.downloaded = 200;
            database.upsert_announce(&announce).await.unwrap();

            let conn = database.pool.get().unwrap();
            let rows: i64 = conn.query_row("SELECT COUNT(*) FROM announces", [], |row| row.get(0)).unwrap();
            assert_eq!(rows, 1);

            let transfer = database
                .last_reported_transfer(&sample_key(), &sample_info_hash())
                .await
                .unwrap();
            assert_eq!(transfer, Some((100, 200)));
        }

        #[tokio::test]
        async fn it_should_fail_when_the_announce_key_is_not_registered() {
            let database = ephemeral_database();
            database.add_info_hash(&sample_info_hash(), "test torrent").await.unwrap();

            let result = database.upsert_announce(&sample_announce(&another_key(), &sample_info_hash())).await;

            assert!(result.is_err());
        }

        #[tokio::test]
        async fn the_update_trigger_should_bump_last_announce() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            let announce = sample_announce(&sample_key(), &sample_info_hash());
            database.upsert_announce(&announce).await.unwrap();

            // Backdate the row, then mutate it through the upsert.
            let conn = database.pool.get().unwrap();
            conn.execute("UPDATE announces SET last_announce = 1", []).unwrap();
            drop(conn);

            database.upsert_announce(&announce).await.unwrap();

            let conn = database.pool.get().unwrap();
            let last_announce: i64 = conn
                .query_row("SELECT last_announce FROM announces", [], |row| row.get(0))
                .unwrap();

            assert!(last_announce > 1, "the trigger should have refreshed last_announce");
        }

        #[tokio::test]
        async fn a_stopped_row_should_be_invisible_to_the_last_reported_transfer() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            let mut announce = sample_announce(&sample_key(), &sample_info_hash());
            announce.uploaded = 10;
            announce.event = Event::Stopped;
            database.upsert_announce(&announce).await.unwrap();

            let transfer = database
                .last_reported_transfer(&sample_key(), &sample_info_hash())
                .await
                .unwrap();

            assert_eq!(transfer, None);
        }

        #[tokio::test]
        async fn deleting_an_info_hash_should_cascade_to_its_announces() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            database
                .upsert_announce(&sample_announce(&sample_key(), &sample_info_hash()))
                .await
                .unwrap();

            database.remove_info_hash(&sample_info_hash()).await.unwrap();

            let conn = database.pool.get().unwrap();
            let rows: i64 = conn.query_row("SELECT COUNT(*) FROM announces", [], |row| row.get(0)).unwrap();

            assert_eq!(rows, 0);
        }
    }

    mod for_peer_selection {
        use std::net::Ipv4Addr;
        use std::str::FromStr;

        use super::{ephemeral_database, registered, sample_announce, sample_info_hash, sample_key};
        use crate::core::announce::{Endpoint, Event};
        use crate::core::auth::Key;
        use crate::core::databases::Database;

        #[tokio::test]
        async fn it_should_return_the_compact_endpoints_of_other_recent_peers() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            let mut announce = sample_announce(&sample_key(), &sample_info_hash());
            announce.endpoint = Endpoint::new(Ipv4Addr::new(192, 0, 2, 1), 6881);
            database.upsert_announce(&announce).await.unwrap();

            let other = Key::from_str("cccccccccccccccccccccccccccccc").unwrap();
            let candidates = database.find_candidates(&sample_info_hash(), &other, 0).await.unwrap();

            assert_eq!(candidates, vec![Endpoint::new(Ipv4Addr::new(192, 0, 2, 1), 6881)]);
        }

        #[tokio::test]
        async fn it_should_exclude_the_announcing_peer_itself() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            database
                .upsert_announce(&sample_announce(&sample_key(), &sample_info_hash()))
                .await
                .unwrap();

            let candidates = database.find_candidates(&sample_info_hash(), &sample_key(), 0).await.unwrap();

            assert!(candidates.is_empty());
        }

        #[tokio::test]
        async fn it_should_exclude_stopped_peers() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            let mut announce = sample_announce(&sample_key(), &sample_info_hash());
            announce.event = Event::Stopped;
            database.upsert_announce(&announce).await.unwrap();

            let other = Key::from_str("cccccccccccccccccccccccccccccc").unwrap();
            let candidates = database.find_candidates(&sample_info_hash(), &other, 0).await.unwrap();

            assert!(candidates.is_empty());
        }

        #[tokio::test]
        async fn it_should_exclude_stale_peers() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            database
                .upsert_announce(&sample_announce(&sample_key(), &sample_info_hash()))
                .await
                .unwrap();

            let other = Key::from_str("cccccccccccccccccccccccccccccc").unwrap();
            let far_future_cutoff = u64::MAX;
            let candidates = database
                .find_candidates(&sample_info_hash(), &other, far_future_cutoff)
                .await
                .unwrap();

            assert!(candidates.is_empty());
        }
    }

    mod for_behavior_scoring {
        use super::{another_key, ephemeral_database, registered, sample_announce, sample_info_hash, sample_key};
        use crate::core::databases::Database;
        use crate::core::torrent::PeerBehavior;
        use crate::shared::bit_torrent::info_hash::InfoHash;

        #[tokio::test]
        async fn it_should_count_recent_announces_and_seeds_per_key() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            let seeding = InfoHash(*b"bbbbbbbbbbbbbbbbbbbb");
            database.add_info_hash(&seeding, "seeded torrent").await.unwrap();

            let mut leeching_announce = sample_announce(&sample_key(), &sample_info_hash());
            leeching_announce.amount_left = 100;
            database.upsert_announce(&leeching_announce).await.unwrap();

            let seeding_announce = sample_announce(&sample_key(), &seeding);
            database.upsert_announce(&seeding_announce).await.unwrap();

            assert_eq!(database.count_recent_announces(&sample_key(), 0).await.unwrap(), 2);
            assert_eq!(database.count_recent_seeds(&sample_key(), 0).await.unwrap(), 1);
        }

        #[tokio::test]
        async fn it_should_snapshot_the_transfers_per_torrent() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            let mut announce = sample_announce(&sample_key(), &sample_info_hash());
            announce.amount_left = 0;
            announce.uploaded = 500;
            announce.downloaded = 100;
            database.upsert_announce(&announce).await.unwrap();

            let snapshots = database.recent_transfers(&sample_key(), 0).await.unwrap();

            assert_eq!(snapshots.len(), 1);
            assert_eq!(snapshots[0].uploaded, 500);
            assert_eq!(snapshots[0].downloaded, 100);
        }

        #[tokio::test]
        async fn it_should_group_swarm_seed_counts_per_peer() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;
            database.insert_announce_key(&another_key()).await.unwrap();

            let seeding = InfoHash(*b"bbbbbbbbbbbbbbbbbbbb");
            database.add_info_hash(&seeding, "seeded torrent").await.unwrap();

            database
                .upsert_announce(&sample_announce(&sample_key(), &sample_info_hash()))
                .await
                .unwrap();
            database
                .upsert_announce(&sample_announce(&sample_key(), &seeding))
                .await
                .unwrap();
            database
                .upsert_announce(&sample_announce(&another_key(), &seeding))
                .await
                .unwrap();

            let mut counts = database.swarm_seed_counts(0).await.unwrap();
            counts.sort_unstable();

            assert_eq!(counts, vec![1, 2]);
        }

        #[tokio::test]
        async fn peer_totals_should_accumulate_monotonically() {
            let database = ephemeral_database();
            database.insert_announce_key(&sample_key()).await.unwrap();

            database.add_peer_totals(&sample_key(), 1, 100, 50).await.unwrap();
            database.add_peer_totals(&sample_key(), 0, 200, 0).await.unwrap();

            let behavior = database.peer_behavior(&sample_key()).await.unwrap();

            assert_eq!(
                behavior,
                Some(PeerBehavior {
                    snatched: 1,
                    uploaded: 300,
                    downloaded: 50,
                })
            );
        }
    }

    mod for_the_scrape_aggregation {
        use super::{ephemeral_database, registered, sample_announce, sample_info_hash, sample_key};
        use crate::core::announce::Event;
        use crate::core::databases::Database;

        #[tokio::test]
        async fn it_should_aggregate_seeders_leechers_and_snatches() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            let mut announce = sample_announce(&sample_key(), &sample_info_hash());
            announce.amount_left = 0;
            database.upsert_announce(&announce).await.unwrap();
            database.increment_snatches(&sample_info_hash()).await.unwrap();

            let summary = database.scrape_torrent(&sample_info_hash(), 0).await.unwrap().unwrap();

            assert_eq!(summary.name, "test torrent");
            assert_eq!(summary.complete, 1);
            assert_eq!(summary.incomplete, 0);
            assert_eq!(summary.downloaded, 1);
        }

        #[tokio::test]
        async fn it_should_not_count_stopped_peers() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            let mut announce = sample_announce(&sample_key(), &sample_info_hash());
            announce.event = Event::Stopped;
            database.upsert_announce(&announce).await.unwrap();

            let summary = database.scrape_torrent(&sample_info_hash(), 0).await.unwrap().unwrap();

            assert_eq!(summary.complete, 0);
            assert_eq!(summary.incomplete, 0);
        }

        #[tokio::test]
        async fn it_should_return_nothing_for_an_unregistered_info_hash() {
            let database = ephemeral_database();

            let summary = database.scrape_torrent(&sample_info_hash(), 0).await.unwrap();

            assert!(summary.is_none());
        }

        #[tokio::test]
        async fn an_idle_torrent_should_aggregate_to_zeroed_counters() {
            let database = ephemeral_database();
            database.add_info_hash(&sample_info_hash(), "idle torrent").await.unwrap();

            let summaries = database.scrape_all_torrents(0).await.unwrap();

            assert_eq!(summaries.len(), 1);
            assert_eq!(summaries[0].complete, 0);
            assert_eq!(summaries[0].incomplete, 0);
        }
    }

    mod for_the_prune_job {
        use super::{another_key, ephemeral_database, registered, sample_announce, sample_info_hash, sample_key};
        use crate::core::databases::Database;

        #[tokio::test]
        async fn it_should_remove_idle_keys_older_than_the_cutoff() {
            let database = ephemeral_database();
            database.insert_announce_key(&sample_key()).await.unwrap();

            // Backdate the issuance.
            let conn = database.pool.get().unwrap();
            conn.execute("UPDATE peers SET created_time = 1", []).unwrap();
            drop(conn);

            let pruned = database.prune_announce_keys(100).await.unwrap();

            assert_eq!(pruned, vec![sample_key()]);
            assert!(!database.announce_key_exists(&sample_key()).await.unwrap());
        }

        #[tokio::test]
        async fn it_should_keep_recently_created_keys() {
            let database = ephemeral_database();
            database.insert_announce_key(&sample_key()).await.unwrap();

            let pruned = database.prune_announce_keys(100).await.unwrap();

            assert!(pruned.is_empty());
            assert!(database.announce_key_exists(&sample_key()).await.unwrap());
        }

        #[tokio::test]
        async fn it_should_keep_old_keys_with_a_recent_announce() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;

            database
                .upsert_announce(&sample_announce(&sample_key(), &sample_info_hash()))
                .await
                .unwrap();

            let conn = database.pool.get().unwrap();
            conn.execute("UPDATE peers SET created_time = 1", []).unwrap();
            drop(conn);

            let pruned = database.prune_announce_keys(100).await.unwrap();

            assert!(pruned.is_empty());
        }

        #[tokio::test]
        async fn pruning_a_key_should_cascade_to_its_announces() {
            let database = ephemeral_database();
            registered(&database, &sample_key(), &sample_info_hash()).await;
            database.insert_announce_key(&another_key()).await.unwrap();

            database
                .upsert_announce(&sample_announce(&sample_key(), &sample_info_hash()))
                .await
                .unwrap();

            // Make the key and its announce older than the cutoff.
            let conn = database.pool.get().unwrap();
            conn.execute("UPDATE peers SET created_time = 1 WHERE announce_key = ?1", [sample_key().as_str()])
                .unwrap();
            conn.execute("UPDATE announces SET last_announce = 1", []).unwrap();
            drop(conn);

            let pruned = database.prune_announce_keys(100).await.unwrap();

            assert_eq!(pruned, vec![sample_key()]);

            let conn = database.pool.get().unwrap();
            let rows: i64 = conn.query_row("SELECT COUNT(*) FROM announces", [], |row| row.get(0)).unwrap();
            assert_eq!(rows, 0);
        }
    }
}
