use crate::error::{PoolError, Result};
use crate::models::{extract_ip, PoolSummary, ProxyRecord, RegionFlag};
use crate::rotation::RotationStrategy;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

macro_rules! select_proxy {
    ($tail:literal) => {
        concat!(
            "SELECT id, url, ip, consuming_time, count, weight, retry, available, can_bypass_gfw, ",
            "created_at, updated_at, deleted_at ",
            "FROM proxy_urls ",
            $tail
        )
    };
}

/// Durable proxy pool store.
///
/// Every operation runs under one store-wide lock shared by all clones, so
/// operations on different URLs serialize against each other too. Updates
/// against an unknown URL succeed and report zero affected rows.
#[derive(Clone)]
pub struct ProxyStore {
    pool: SqlitePool,
    lock: Arc<Mutex<()>>,
}

impl ProxyStore {
    /// Construct once per process and clone; separately constructed stores
    /// do not serialize against each other.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Register a newly discovered proxy URL
    ///
    /// The record starts unavailable and must be validated before selection.
    pub async fn register(&self, url: &str) -> Result<i64> {
        let _guard = self.lock.lock().await;

        let ip = extract_ip(url);
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO proxy_urls (
                created_at, updated_at, url, ip,
                consuming_time, count, weight, retry, available, can_bypass_gfw
            )
            VALUES (?, ?, ?, ?, 0, 0, 1, 0, 0, 0)
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(url)
        .bind(&ip)
        .execute(&self.pool)
        .await
        .map_err(|e| PoolError::from_insert(e, url))
        .inspect_err(|e| {
            if matches!(e, PoolError::DuplicateProxy { .. }) {
                warn!(url = %url, "Proxy already registered");
            }
        })?;

        let id = result.last_insert_rowid();
        info!(id = id, url = %url, ip = %ip, "Registered proxy");
        Ok(id)
    }

    /// Get a live record by URL
    pub async fn get_by_url(&self, url: &str) -> Result<Option<ProxyRecord>> {
        let _guard = self.lock.lock().await;

        let record = sqlx::query_as::<_, ProxyRecord>(select_proxy!(
            "WHERE url = ? AND deleted_at IS NULL"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get every available record in storage order
    pub async fn list_available(&self) -> Result<Vec<ProxyRecord>> {
        let _guard = self.lock.lock().await;

        let records = sqlx::query_as::<_, ProxyRecord>(select_proxy!(
            "WHERE available = ? AND deleted_at IS NULL ORDER BY id"
        ))
        .bind(true)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Get every record regardless of availability
    pub async fn list_all(&self) -> Result<Vec<ProxyRecord>> {
        let _guard = self.lock.lock().await;

        let records = sqlx::query_as::<_, ProxyRecord>(select_proxy!(
            "WHERE deleted_at IS NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Mark a probed proxy usable, resetting its retry tally
    pub async fn mark_available(&self, url: &str, can_bypass_gfw: bool) -> Result<u64> {
        let _guard = self.lock.lock().await;

        let result = sqlx::query(
            r#"
            UPDATE proxy_urls
            SET retry = 0,
                available = ?,
                can_bypass_gfw = ?,
                updated_at = ?
            WHERE url = ? AND deleted_at IS NULL
            "#,
        )
        .bind(true)
        .bind(can_bypass_gfw)
        .bind(Utc::now())
        .bind(url)
        .execute(&self.pool)
        .await?;

        debug!(url = %url, can_bypass_gfw, rows = result.rows_affected(), "Marked proxy available");
        Ok(result.rows_affected())
    }

    /// Exclude a proxy from selection, keeping the rest of its state
    pub async fn mark_unavailable(&self, url: &str) -> Result<u64> {
        let _guard = self.lock.lock().await;

        let result = sqlx::query(
            "UPDATE proxy_urls SET available = ?, updated_at = ? WHERE url = ? AND deleted_at IS NULL",
        )
        .bind(false)
        .bind(Utc::now())
        .bind(url)
        .execute(&self.pool)
        .await?;

        debug!(url = %url, rows = result.rows_affected(), "Marked proxy unavailable");
        Ok(result.rows_affected())
    }

    /// Record a measured cost for a proxy. A measurement implies liveness,
    /// so the proxy also becomes available.
    pub async fn set_consuming_time(&self, url: &str, consuming_time: i64) -> Result<u64> {
        let _guard = self.lock.lock().await;

        let result = sqlx::query(
            r#"
            UPDATE proxy_urls
            SET consuming_time = ?,
                available = ?,
                updated_at = ?
            WHERE url = ? AND deleted_at IS NULL
            "#,
        )
        .bind(consuming_time)
        .bind(true)
        .bind(Utc::now())
        .bind(url)
        .execute(&self.pool)
        .await?;

        debug!(url = %url, consuming_time, rows = result.rows_affected(), "Updated proxy consuming time");
        Ok(result.rows_affected())
    }

    /// Add one to the retry tally
    pub async fn increment_retry(&self, url: &str) -> Result<u64> {
        self.adjust_retry(url, 1).await
    }

    /// Subtract one from the retry tally (no floor)
    pub async fn decrement_retry(&self, url: &str) -> Result<u64> {
        self.adjust_retry(url, -1).await
    }

    async fn adjust_retry(&self, url: &str, delta: i64) -> Result<u64> {
        let _guard = self.lock.lock().await;

        let result = sqlx::query(
            "UPDATE proxy_urls SET retry = retry + ?, updated_at = ? WHERE url = ? AND deleted_at IS NULL",
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(url)
        .execute(&self.pool)
        .await?;

        debug!(url = %url, delta, rows = result.rows_affected(), "Adjusted proxy retry");
        Ok(result.rows_affected())
    }

    /// Pick one eligible proxy URL uniformly at random
    pub async fn select_random(&self, region: RegionFlag) -> Result<String> {
        let _guard = self.lock.lock().await;

        let url = match region.bypass_requirement() {
            Some(bypass) => {
                sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT url FROM proxy_urls
                    WHERE available = ? AND can_bypass_gfw = ? AND deleted_at IS NULL
                    ORDER BY RANDOM()
                    LIMIT 1
                    "#,
                )
                .bind(true)
                .bind(bypass)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT url FROM proxy_urls
                    WHERE available = ? AND deleted_at IS NULL
                    ORDER BY RANDOM()
                    LIMIT 1
                    "#,
                )
                .bind(true)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        let url = url.ok_or(PoolError::NoProxiesAvailable)?;
        debug!(url = %url, region = %region, "Selected random proxy");
        Ok(url)
    }

    /// Pick the available proxy with the smallest consuming time
    pub async fn select_least_recently_timed(&self) -> Result<String> {
        let _guard = self.lock.lock().await;

        let url = sqlx::query_scalar::<_, String>(
            r#"
            SELECT url FROM proxy_urls
            WHERE available = ? AND deleted_at IS NULL
            ORDER BY consuming_time ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(true)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(PoolError::NoProxiesAvailable)?;

        debug!(url = %url, "Selected least timed proxy");
        Ok(url)
    }

    /// Pick a proxy URL with the given strategy. Region only narrows random selection.
    pub async fn select(&self, strategy: RotationStrategy, region: RegionFlag) -> Result<String> {
        match strategy {
            RotationStrategy::Random => self.select_random(region).await,
            RotationStrategy::LeastTime => self.select_least_recently_timed().await,
        }
    }

    /// Count live, available and bypass-capable available records
    pub async fn summary(&self) -> Result<PoolSummary> {
        let _guard = self.lock.lock().await;

        let summary = sqlx::query_as::<_, PoolSummary>(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(CASE WHEN available THEN 1 ELSE 0 END), 0) AS available,
                   COALESCE(SUM(CASE WHEN available AND can_bypass_gfw THEN 1 ELSE 0 END), 0) AS bypass
            FROM proxy_urls
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}
