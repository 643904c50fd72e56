use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::{QueueSnapshot, QueueStore, Roster, StoreError};
use crate::models::{
    Employee, QueueMeta, QueueMetaRow, Ticket, TicketRow, TicketStatus, VersionedMeta,
};
use crate::queue::Transition;

const TICKET_COLUMNS: &str = "id, queue_number, status, created_at, date, employee_id, name";
const META_COLUMNS: &str = "queue_number, last_reset_date, version";
const EMPLOYEE_COLUMNS: &str = "emp_id, name, gender, department, mobile";

/// PostgreSQL-backed store.
///
/// Compare-and-swap writes run inside a transaction: the meta row is updated
/// with `WHERE version = $n` and tickets with `WHERE status = $from`; any
/// statement touching the wrong number of rows rolls the whole unit back.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// PostgreSQL unique violation (23505), e.g. a second serving ticket.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

async fn fetch_meta(conn: &mut PgConnection) -> Result<Option<VersionedMeta>, StoreError> {
    let query = format!("SELECT {META_COLUMNS} FROM queue_meta WHERE id = 1");
    let row = sqlx::query_as::<_, QueueMetaRow>(&query)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(VersionedMeta::from))
}

/// Write the singleton meta row, guarded by its version.
async fn write_meta(
    conn: &mut PgConnection,
    expected_version: i64,
    meta: &QueueMeta,
) -> Result<(), StoreError> {
    let result = if expected_version == 0 {
        sqlx::query(
            "INSERT INTO queue_meta (id, queue_number, last_reset_date, version) \
             VALUES (1, $1, $2, 1) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&meta.queue_number)
        .bind(meta.last_reset_date)
        .execute(&mut *conn)
        .await?
    } else {
        sqlx::query(
            "UPDATE queue_meta \
             SET queue_number = $1, last_reset_date = $2, version = version + 1 \
             WHERE id = 1 AND version = $3",
        )
        .bind(&meta.queue_number)
        .bind(meta.last_reset_date)
        .bind(expected_version)
        .execute(&mut *conn)
        .await?
    };

    if result.rows_affected() != 1 {
        return Err(StoreError::Conflict { ticket_id: None });
    }
    Ok(())
}

#[async_trait]
impl QueueStore for PgStore {
    async fn load_meta(&self) -> Result<Option<VersionedMeta>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        fetch_meta(&mut conn).await
    }

    async fn snapshot(&self) -> Result<QueueSnapshot, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let meta = fetch_meta(&mut tx).await?;

        let query = format!(
            "SELECT {TICKET_COLUMNS} FROM queue_tickets ORDER BY created_at ASC, seq ASC"
        );
        let rows = sqlx::query_as::<_, TicketRow>(&query)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        let tickets = rows
            .into_iter()
            .map(Ticket::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Corrupt)?;

        Ok(QueueSnapshot { meta, tickets })
    }

    async fn commit_registration(
        &self,
        expected_version: i64,
        meta: &QueueMeta,
        ticket: &Ticket,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Meta first: its row lock orders concurrent registrations and resets.
        write_meta(&mut tx, expected_version, meta).await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT status FROM queue_tickets WHERE id = $1 FOR UPDATE")
                .bind(&ticket.id)
                .fetch_optional(&mut *tx)
                .await?;

        if let Some(status) = existing {
            let status: TicketStatus =
                status.parse().map_err(StoreError::Corrupt)?;
            if status.is_active() {
                return Err(StoreError::Duplicate(ticket.id.clone()));
            }
            sqlx::query("DELETE FROM queue_tickets WHERE id = $1")
                .bind(&ticket.id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "INSERT INTO queue_tickets \
             (id, queue_number, status, created_at, date, employee_id, name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&ticket.id)
        .bind(&ticket.queue_number)
        .bind(ticket.status.as_str())
        .bind(ticket.created_at)
        .bind(ticket.date)
        .bind(&ticket.employee_id)
        .bind(&ticket.name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn apply_transitions(&self, transitions: &[Transition]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for transition in transitions {
            let conflict = || StoreError::Conflict {
                ticket_id: Some(transition.ticket_id.clone()),
            };
            if !transition.from.can_become(transition.to) {
                return Err(conflict());
            }

            let result = sqlx::query(
                "UPDATE queue_tickets SET status = $1 WHERE id = $2 AND status = $3",
            )
            .bind(transition.to.as_str())
            .bind(&transition.ticket_id)
            .bind(transition.from.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    conflict()
                } else {
                    StoreError::Database(e)
                }
            })?;

            if result.rows_affected() != 1 {
                return Err(conflict());
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn reset(&self, expected_version: i64, meta: &QueueMeta) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        write_meta(&mut tx, expected_version, meta).await?;
        let cleared = sqlx::query("DELETE FROM queue_tickets")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(cleared)
    }
}

#[async_trait]
impl Roster for PgStore {
    async fn find(&self, employee_id: &str) -> Result<Option<Employee>, StoreError> {
        let query = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE emp_id = $1");
        let employee = sqlx::query_as::<_, Employee>(&query)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn add(&self, employee: &Employee) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO employees (emp_id, name, gender, department, mobile) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (emp_id) DO UPDATE SET \
                name = EXCLUDED.name, \
                gender = EXCLUDED.gender, \
                department = EXCLUDED.department, \
                mobile = EXCLUDED.mobile",
        )
        .bind(&employee.emp_id)
        .bind(&employee.name)
        .bind(&employee.gender)
        .bind(&employee.department)
        .bind(&employee.mobile)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
