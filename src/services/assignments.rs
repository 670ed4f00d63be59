use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::{
    models::assignment::{AssignDinnerRequest, Assignment, AssignmentRow, AssignmentSummary},
    services::metrics::{ASSIGNMENTS_DELETED_COUNTER, ASSIGNMENTS_WRITTEN_COUNTER},
};

const SELECT_ASSIGNMENT: &str = "SELECT a.id, a.date, a.dinner_id,
        d.name AS dinner_name, d.recipe AS dinner_recipe, d.ingredients AS dinner_ingredients
     FROM dinner_assignments a
     LEFT JOIN dinners d ON d.id = a.dinner_id";

pub enum AssignOutcome {
    Created(Assignment),
    Reassigned(Assignment),
    DinnerNotFound,
}

pub struct AssignmentService;

impl AssignmentService {
    /// The assignment for a day. Several rows may share a date; the one with
    /// the lowest id wins.
    pub async fn find_by_date(pool: &SqlitePool, date: &str) -> anyhow::Result<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "{SELECT_ASSIGNMENT} WHERE a.date = ? ORDER BY a.id LIMIT 1"
        ))
        .bind(date)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(Assignment::from))
    }

    /// All assignments whose date falls in `month` ("YYYY-MM"). A malformed
    /// month matches nothing.
    pub async fn list_for_month(pool: &SqlitePool, month: &str) -> anyhow::Result<Vec<Assignment>> {
        if !is_month(month) {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            "{SELECT_ASSIGNMENT} WHERE a.date LIKE ? ORDER BY a.date, a.id"
        ))
        .bind(format!("{month}-%"))
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    pub async fn list_all(pool: &SqlitePool) -> anyhow::Result<Vec<AssignmentSummary>> {
        let rows = sqlx::query_as::<_, AssignmentSummary>(
            "SELECT a.id, a.date, a.dinner_id, d.name AS dinner_name
             FROM dinner_assignments a
             LEFT JOIN dinners d ON d.id = a.dinner_id
             ORDER BY a.id",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Point `req.date` at `req.dinner_id`. Reuses the day's first assignment
    /// when there is one, so a write never adds a second row for a date.
    ///
    /// Every statement before the final read is a write. SQLite takes the write
    /// lock on the first one, so concurrent callers queue on the busy timeout
    /// instead of failing an upgrade from a stale read snapshot. A missing
    /// dinner surfaces as a foreign key violation.
    pub async fn assign(pool: &SqlitePool, req: &AssignDinnerRequest) -> anyhow::Result<AssignOutcome> {
        let mut tx = pool.begin().await?;

        let reassigned = sqlx::query_scalar::<_, i64>(
            "UPDATE dinner_assignments SET dinner_id = ?
             WHERE id = (SELECT id FROM dinner_assignments WHERE date = ? ORDER BY id LIMIT 1)
             RETURNING id",
        )
        .bind(req.dinner_id)
        .bind(req.date)
        .fetch_optional(&mut *tx)
        .await;

        let (id, created) = match reassigned {
            Ok(Some(id)) => (id, false),
            Ok(None) => {
                let inserted = sqlx::query_scalar::<_, i64>(
                    "INSERT INTO dinner_assignments (date, dinner_id) VALUES (?, ?) RETURNING id",
                )
                .bind(req.date)
                .bind(req.dinner_id)
                .fetch_one(&mut *tx)
                .await;
                match inserted {
                    Ok(id) => (id, true),
                    Err(e) if is_missing_dinner(&e) => return Ok(AssignOutcome::DinnerNotFound),
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) if is_missing_dinner(&e) => return Ok(AssignOutcome::DinnerNotFound),
            Err(e) => return Err(e.into()),
        };

        let row = sqlx::query_as::<_, AssignmentRow>(&format!("{SELECT_ASSIGNMENT} WHERE a.id = ?"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        ASSIGNMENTS_WRITTEN_COUNTER.inc();

        let assignment = Assignment::from(row);
        Ok(if created {
            AssignOutcome::Created(assignment)
        } else {
            AssignOutcome::Reassigned(assignment)
        })
    }

    /// Remove every assignment on `date`. Returns the number deleted.
    pub async fn delete_by_date(pool: &SqlitePool, date: &str) -> anyhow::Result<u64> {
        let mut tx = pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM dinner_assignments WHERE date = ?")
            .bind(date)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        ASSIGNMENTS_DELETED_COUNTER.inc_by(deleted);
        Ok(deleted)
    }

    /// Remove all assignments. Returns the number deleted.
    pub async fn clear(pool: &SqlitePool) -> anyhow::Result<u64> {
        let mut tx = pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM dinner_assignments")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        ASSIGNMENTS_DELETED_COUNTER.inc_by(deleted);
        Ok(deleted)
    }
}

fn is_missing_dinner(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn is_month(month: &str) -> bool {
    month.len() == 7 && NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::dinner::CreateDinnerRequest;
    use crate::services::dinners::DinnerService;

    async fn test_pool() -> SqlitePool {
        let pool = db::create_memory_pool().await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn dinner(pool: &SqlitePool, name: &str) -> i64 {
        let req = CreateDinnerRequest {
            name: Some(name.into()),
            ingredients: vec!["a".into(), "b".into()],
            recipe: None,
        };
        DinnerService::create(pool, &req).await.unwrap().id
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn assign(pool: &SqlitePool, date: &str, dinner_id: i64) -> AssignOutcome {
        let req = AssignDinnerRequest { date: day(date), dinner_id };
        AssignmentService::assign(pool, &req).await.unwrap()
    }

    #[test]
    fn month_format() {
        assert!(is_month("2024-06"));
        assert!(!is_month("2024-6"));
        assert!(!is_month("2024-13"));
        assert!(!is_month("2024-06-01"));
        assert!(!is_month("%"));
    }

    #[tokio::test]
    async fn assign_creates_then_reassigns() {
        let pool = test_pool().await;
        let tacos = dinner(&pool, "Tacos").await;
        let curry = dinner(&pool, "Curry").await;

        let first = match assign(&pool, "2024-06-01", tacos).await {
            AssignOutcome::Created(a) => a,
            _ => panic!("expected a new assignment"),
        };
        assert_eq!(first.dinner.as_ref().map(|d| d.name.as_str()), Some("Tacos"));
        assert_eq!(first.dinner.as_ref().unwrap().ingredients, vec!["a", "b"]);

        let second = match assign(&pool, "2024-06-01", curry).await {
            AssignOutcome::Reassigned(a) => a,
            _ => panic!("expected a reassignment"),
        };
        assert_eq!(second.id, first.id);
        assert_eq!(second.dinner_id, curry);
        assert_eq!(AssignmentService::list_all(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn assign_unknown_dinner() {
        let pool = test_pool().await;
        assert!(matches!(assign(&pool, "2024-06-01", 99).await, AssignOutcome::DinnerNotFound));
        assert!(AssignmentService::list_all(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reassign_to_unknown_dinner_keeps_the_day() {
        let pool = test_pool().await;
        let tacos = dinner(&pool, "Tacos").await;
        assign(&pool, "2024-06-01", tacos).await;

        assert!(matches!(assign(&pool, "2024-06-01", 99).await, AssignOutcome::DinnerNotFound));
        let kept = AssignmentService::find_by_date(&pool, "2024-06-01").await.unwrap().unwrap();
        assert_eq!(kept.dinner_id, tacos);
    }

    #[tokio::test]
    async fn find_by_date_returns_first_match() {
        let pool = test_pool().await;
        let tacos = dinner(&pool, "Tacos").await;
        let curry = dinner(&pool, "Curry").await;
        // Duplicate dates can only come from outside the API.
        for id in [tacos, curry] {
            sqlx::query("INSERT INTO dinner_assignments (date, dinner_id) VALUES ('2024-06-03', ?)")
                .bind(id)
                .execute(&pool)
                .await
                .unwrap();
        }

        let found = AssignmentService::find_by_date(&pool, "2024-06-03").await.unwrap().unwrap();
        assert_eq!(found.dinner_id, tacos);
        assert!(AssignmentService::find_by_date(&pool, "2024-06-04").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_for_month_filters_by_prefix() {
        let pool = test_pool().await;
        let tacos = dinner(&pool, "Tacos").await;
        for date in ["2024-06-30", "2024-06-01", "2024-07-01", "2023-06-15"] {
            assign(&pool, date, tacos).await;
        }

        let june = AssignmentService::list_for_month(&pool, "2024-06").await.unwrap();
        let dates: Vec<_> = june.iter().map(|a| a.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-06-01", "2024-06-30"]);

        assert!(AssignmentService::list_for_month(&pool, "%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_by_date_and_clear_report_counts() {
        let pool = test_pool().await;
        let tacos = dinner(&pool, "Tacos").await;
        for date in ["2024-06-01", "2024-06-02", "2024-06-03"] {
            assign(&pool, date, tacos).await;
        }

        assert_eq!(AssignmentService::delete_by_date(&pool, "2024-06-02").await.unwrap(), 1);
        assert_eq!(AssignmentService::delete_by_date(&pool, "2024-06-02").await.unwrap(), 0);
        assert_eq!(AssignmentService::clear(&pool).await.unwrap(), 2);
        assert!(AssignmentService::list_all(&pool).await.unwrap().is_empty());
    }
}
