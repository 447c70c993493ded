use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use mishwar_domain::repository::{PageRequest, TripFilter, TripPage, TripRepository, TripStoreError};
use mishwar_domain::trip::{DriverRef, Trip, TripDraft, TripPatch};

const TRIP_COLUMNS: &str = "id, driver_id, driver_name, from_city, to_city, date, time, \
    car_model, car_color, price, phone_number, notes, total_seats, available_seats, \
    booked_users, created_at, updated_at";

pub struct PgTripRepository {
    pool: PgPool,
}

impl PgTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    driver_id: String,
    driver_name: Option<String>,
    from_city: String,
    to_city: String,
    date: String,
    time: String,
    car_model: String,
    car_color: String,
    price: f64,
    phone_number: String,
    notes: Option<String>,
    total_seats: i32,
    available_seats: i32,
    booked_users: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Trip {
            id: row.id,
            driver_id: row.driver_id,
            driver_name: row.driver_name,
            from_city: row.from_city,
            to_city: row.to_city,
            date: row.date,
            time: row.time,
            car_model: row.car_model,
            car_color: row.car_color,
            price: row.price,
            phone_number: row.phone_number,
            notes: row.notes,
            total_seats: row.total_seats,
            available_seats: row.available_seats,
            booked_users: row.booked_users,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn list_trips(
        &self,
        filter: &TripFilter,
        page: PageRequest,
    ) -> Result<TripPage, TripStoreError> {
        // Resolve the cursor to its sort position. The lookup spans the
        // whole table, filters aside.
        let anchor: Option<(DateTime<Utc>, Uuid)> = match page.cursor {
            Some(cursor) => {
                let row: Option<(DateTime<Utc>, Uuid)> =
                    sqlx::query_as("SELECT created_at, id FROM trips WHERE id = $1")
                        .bind(cursor)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(TripStoreError::backend)?;
                Some(row.ok_or(TripStoreError::InvalidCursor)?)
            }
            None => None,
        };

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {TRIP_COLUMNS} FROM trips WHERE 1 = 1"));
        if let Some(from_city) = &filter.from_city {
            query.push(" AND from_city = ").push_bind(from_city);
        }
        if let Some(to_city) = &filter.to_city {
            query.push(" AND to_city = ").push_bind(to_city);
        }
        if let Some(driver_id) = &filter.driver_id {
            query.push(" AND driver_id = ").push_bind(driver_id);
        }
        if let Some((created_at, id)) = anchor {
            query
                .push(" AND (created_at, id) < (")
                .push_bind(created_at)
                .push(", ")
                .push_bind(id)
                .push(")");
        }
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit);

        let rows: Vec<TripRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(TripStoreError::backend)?;

        let trips: Vec<Trip> = rows.into_iter().map(Trip::from).collect();
        let next_cursor = if trips.len() as i64 == page.limit {
            trips.last().map(|t| t.id)
        } else {
            None
        };
        Ok(TripPage { trips, next_cursor })
    }

    async fn create_trip(
        &self,
        draft: TripDraft,
        driver: &DriverRef,
    ) -> Result<Trip, TripStoreError> {
        let trip = Trip::new(draft, driver);
        sqlx::query(
            "INSERT INTO trips (id, driver_id, driver_name, from_city, to_city, date, time, \
             car_model, car_color, price, phone_number, notes, total_seats, available_seats, \
             booked_users, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(trip.id)
        .bind(&trip.driver_id)
        .bind(&trip.driver_name)
        .bind(&trip.from_city)
        .bind(&trip.to_city)
        .bind(&trip.date)
        .bind(&trip.time)
        .bind(&trip.car_model)
        .bind(&trip.car_color)
        .bind(trip.price)
        .bind(&trip.phone_number)
        .bind(&trip.notes)
        .bind(trip.total_seats)
        .bind(trip.available_seats)
        .bind(&trip.booked_users)
        .bind(trip.created_at)
        .bind(trip.updated_at)
        .execute(&self.pool)
        .await
        .map_err(TripStoreError::backend)?;
        Ok(trip)
    }

    async fn update_trip(
        &self,
        id: Uuid,
        patch: &TripPatch,
        driver_id: &str,
    ) -> Result<Trip, TripStoreError> {
        // Read-modify-write under a row lock so concurrent updates see a
        // consistent seat ledger.
        let mut tx = self.pool.begin().await.map_err(TripStoreError::backend)?;

        let select = format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = $1 FOR UPDATE");
        let row: Option<TripRow> = sqlx::query_as(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(TripStoreError::backend)?;
        let current: Trip = row.ok_or(TripStoreError::NotFound)?.into();
        if current.driver_id != driver_id {
            return Err(TripStoreError::NotOwner);
        }

        let updated = current.apply_patch(patch)?;
        sqlx::query(
            "UPDATE trips SET from_city = $1, to_city = $2, date = $3, time = $4, \
             car_model = $5, car_color = $6, price = $7, phone_number = $8, notes = $9, \
             total_seats = $10, available_seats = $11, updated_at = $12 WHERE id = $13",
        )
        .bind(&updated.from_city)
        .bind(&updated.to_city)
        .bind(&updated.date)
        .bind(&updated.time)
        .bind(&updated.car_model)
        .bind(&updated.car_color)
        .bind(updated.price)
        .bind(&updated.phone_number)
        .bind(&updated.notes)
        .bind(updated.total_seats)
        .bind(updated.available_seats)
        .bind(updated.updated_at)
        .bind(updated.id)
        .execute(&mut *tx)
        .await
        .map_err(TripStoreError::backend)?;

        tx.commit().await.map_err(TripStoreError::backend)?;
        Ok(updated)
    }

    async fn delete_trip(&self, id: Uuid, driver_id: &str) -> Result<(), TripStoreError> {
        let owner: Option<(String,)> = sqlx::query_as("SELECT driver_id FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(TripStoreError::backend)?;
        let (owner,) = owner.ok_or(TripStoreError::NotFound)?;
        if owner != driver_id {
            return Err(TripStoreError::NotOwner);
        }

        sqlx::query("DELETE FROM trips WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(TripStoreError::backend)?;
        Ok(())
    }
}
