use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::AppError;
use crate::models::{Course, CourseChanges, NewCourse};

const COURSE_COLUMNS: &str = "id, name, description, credits";

/// Owns the `courses` table.
///
/// Every write is a single statement, so the unique index on `name` is
/// checked as part of the write itself and a violation leaves the row as it
/// was.
#[derive(Clone)]
pub struct CourseStore {
    db: SqlitePool,
}

impl CourseStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses ORDER BY id"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(courses)
    }

    pub async fn get(&self, id: i64) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, new: NewCourse) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (name, description, credits) VALUES (?1, ?2, ?3) RETURNING {COURSE_COLUMNS}"
        ))
        .bind(new.name)
        .bind(new.description)
        .bind(new.credits)
        .fetch_one(&self.db)
        .await?;

        debug!("created course {} ({})", course.id, course.name);
        Ok(course)
    }

    pub async fn update(&self, id: i64, changes: CourseChanges) -> Result<Course, AppError> {
        if changes.is_empty() {
            return self.get(id).await;
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE courses SET ");
        let mut set = query.separated(", ");
        if let Some(name) = changes.name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(description) = changes.description {
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(credits) = changes.credits {
            set.push("credits = ").push_bind_unseparated(credits);
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(COURSE_COLUMNS);

        let course = query
            .build_query_as::<Course>()
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        debug!("updated course {}", course.id);
        Ok(course)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();

        if result == 0 {
            return Err(AppError::NotFound);
        }

        debug!("deleted course {}", id);
        Ok(())
    }
}
