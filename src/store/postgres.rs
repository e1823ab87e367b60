use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use sqlx::postgres::PgPoolOptions;
use sqlx::{types::Json, Executor, Pool, Postgres, Row};
use uuid::Uuid;

use super::{DriverStats, Store};
use crate::entities::{DriverPresence, Status, Trip, TripStatusChange};
use crate::error::{
    driver_not_found_error, invalid_status_error, trip_not_available_error, trip_not_found_error,
    Error,
};

type Database = Postgres;

/// Postgres-backed store, teacher of record for deployments. Entities live as
/// JSONB documents next to an indexable status column; the conditional trip
/// writes are single UPDATE statements so the row-level check and write are
/// one atomic operation.
#[derive(Debug)]
pub struct PgStore {
    pool: Pool<Database>,
}

impl PgStore {
    #[tracing::instrument(skip(db_uri))]
    pub async fn new(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        // TODO: move table setup to migrations
        pool.execute("CREATE TABLE IF NOT EXISTS riders (id UUID PRIMARY KEY)")
            .await?;
        pool.execute("CREATE TABLE IF NOT EXISTS trips (id UUID PRIMARY KEY, status VARCHAR NOT NULL, data JSONB NOT NULL)")
            .await?;
        pool.execute("CREATE TABLE IF NOT EXISTS trip_status_history (trip_id UUID NOT NULL, status VARCHAR NOT NULL, recorded_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)")
            .await?;
        pool.execute("CREATE TABLE IF NOT EXISTS driver_presence (driver_id UUID PRIMARY KEY, status VARCHAR NOT NULL, data JSONB NOT NULL)")
            .await?;
        pool.execute("CREATE TABLE IF NOT EXISTS driver_stats (driver_id UUID PRIMARY KEY, completed_trips BIGINT NOT NULL, available_balance DOUBLE PRECISION NOT NULL)")
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_rider(&self, id: Uuid) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query("INSERT INTO riders (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
                .bind(id),
        )
        .await?;

        Ok(())
    }

    async fn rider_exists(&self, id: Uuid) -> Result<bool, Error> {
        let mut conn = self.pool.acquire().await?;

        let row = conn
            .fetch_optional(sqlx::query("SELECT 1 FROM riders WHERE id = $1").bind(id))
            .await?;

        Ok(row.is_some())
    }

    async fn insert_trip(&self, trip: &Trip) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query("INSERT INTO trips (id, status, data) VALUES ($1, $2, $3)")
                .bind(trip.id)
                .bind(trip.status.name())
                .bind(Json(trip)),
        )
        .await?;

        Ok(())
    }

    async fn find_trip(&self, id: Uuid) -> Result<Trip, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM trips WHERE id = $1").bind(id))
            .await?;

        let result = maybe_result.ok_or_else(trip_not_found_error)?;
        let Json(trip) = result.try_get("data")?;

        Ok(trip)
    }

    async fn assign_driver_if_unclaimed(&self, trip: &Trip) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        // the status and unclaimed checks ride in the WHERE clause, making
        // the accept write a single compare-and-swap statement
        let result = conn
            .execute(
                sqlx::query(
                    "UPDATE trips SET status = $2, data = $3 WHERE id = $1 AND status = 'requested' AND data->>'driver_id' IS NULL",
                )
                .bind(trip.id)
                .bind(trip.status.name())
                .bind(Json(trip)),
            )
            .await?;

        if result.rows_affected() == 0 {
            // distinguish a lost race from a missing trip
            self.find_trip(trip.id).await?;
            return Err(trip_not_available_error());
        }

        Ok(())
    }

    async fn update_trip_checked(&self, expected: Status, trip: &Trip) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(
                sqlx::query(
                    "UPDATE trips SET status = $3, data = $4 WHERE id = $1 AND status = $2",
                )
                .bind(trip.id)
                .bind(expected.name())
                .bind(trip.status.name())
                .bind(Json(trip)),
            )
            .await?;

        if result.rows_affected() == 0 {
            let current = self.find_trip(trip.id).await?;
            return Err(invalid_status_error(format!(
                "trip moved to {} concurrently",
                current.status.name()
            )));
        }

        Ok(())
    }

    async fn requested_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Trip>, Error> {
        let mut conn = self.pool.acquire().await?;

        let mut rows = conn.fetch(sqlx::query("SELECT data FROM trips WHERE status = 'requested'"));
        let mut trips = vec![];

        while let Some(row) = rows.try_next().await? {
            let Json::<Trip>(trip) = row.try_get("data")?;

            if trip.requested_at < cutoff {
                trips.push(trip);
            }
        }

        Ok(trips)
    }

    async fn append_history(&self, row: &TripStatusChange) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO trip_status_history (trip_id, status, recorded_at, data) VALUES ($1, $2, $3, $4)",
            )
            .bind(row.trip_id)
            .bind(row.status.name())
            .bind(row.recorded_at)
            .bind(Json(row)),
        )
        .await?;

        Ok(())
    }

    async fn history_for_trip(&self, trip_id: Uuid) -> Result<Vec<TripStatusChange>, Error> {
        let mut conn = self.pool.acquire().await?;

        let results = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM trip_status_history WHERE trip_id = $1 ORDER BY recorded_at ASC",
                )
                .bind(trip_id),
            )
            .await?;

        let mut rows = vec![];

        for result in results.iter() {
            let Json(row) = result.try_get("data")?;
            rows.push(row);
        }

        Ok(rows)
    }

    async fn upsert_presence(&self, presence: &DriverPresence) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO driver_presence (driver_id, status, data) VALUES ($1, $2, $3) ON CONFLICT (driver_id) DO UPDATE SET status = $2, data = $3",
            )
            .bind(presence.id)
            .bind(presence.availability.name())
            .bind(Json(presence)),
        )
        .await?;

        Ok(())
    }

    async fn find_presence(&self, driver_id: Uuid) -> Result<DriverPresence, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(
                sqlx::query("SELECT data FROM driver_presence WHERE driver_id = $1")
                    .bind(driver_id),
            )
            .await?;

        let result = maybe_result.ok_or_else(driver_not_found_error)?;
        let Json(presence) = result.try_get("data")?;

        Ok(presence)
    }

    async fn list_presence(&self) -> Result<Vec<DriverPresence>, Error> {
        let mut conn = self.pool.acquire().await?;

        let results = conn
            .fetch_all(sqlx::query("SELECT data FROM driver_presence"))
            .await?;

        let mut records = vec![];

        for result in results.iter() {
            let Json(presence) = result.try_get("data")?;
            records.push(presence);
        }

        Ok(records)
    }

    async fn record_completion(&self, driver_id: Uuid, earnings: f64) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        // counter arithmetic happens in the statement, not read-modify-write
        // at the application layer
        conn.execute(
            sqlx::query(
                "INSERT INTO driver_stats (driver_id, completed_trips, available_balance) VALUES ($1, 1, $2) ON CONFLICT (driver_id) DO UPDATE SET completed_trips = driver_stats.completed_trips + 1, available_balance = driver_stats.available_balance + $2",
            )
            .bind(driver_id)
            .bind(earnings),
        )
        .await?;

        Ok(())
    }

    async fn driver_stats(&self, driver_id: Uuid) -> Result<DriverStats, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(
                sqlx::query(
                    "SELECT completed_trips, available_balance FROM driver_stats WHERE driver_id = $1",
                )
                .bind(driver_id),
            )
            .await?;

        match maybe_result {
            Some(row) => Ok(DriverStats {
                completed_trips: row.try_get("completed_trips")?,
                available_balance: row.try_get("available_balance")?,
            }),
            None => Ok(DriverStats::default()),
        }
    }
}
