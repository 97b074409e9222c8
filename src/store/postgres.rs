use axum::async_trait;
use sqlx::PgPool;

use crate::err::Error;
use crate::models::{ActivityLogEntry, ActivityLogRow, Role, Subject, User, UserRow, Video};
use crate::store::Store;

const USER_COLUMNS: &str = r#"SELECT "id",
    COALESCE("username", '') AS "username",
    COALESCE("fullName", '') AS "fullName",
    COALESCE("role", '') AS "role",
    COALESCE("password", '') AS "password",
    COALESCE("isActive", true) AS "isActive",
    "seatIndex"
    FROM users"#;

const SUBJECT_COLUMNS: &str = r#"SELECT "id",
    COALESCE("name", '') AS "name",
    COALESCE("code", '') AS "code",
    COALESCE("teacher", '') AS "teacher"
    FROM subjects"#;

const VIDEO_COLUMNS: &str = r#"SELECT "id",
    COALESCE("title", '') AS "title",
    COALESCE("url", '') AS "url",
    COALESCE("subject", '') AS "subject",
    COALESCE("week", 1::int2) AS "week",
    COALESCE("uploadedBy", '') AS "uploadedBy"
    FROM videos"#;

#[derive(Debug, Clone)]
pub struct PgStore {
    pg: PgPool,
}

impl PgStore {
    pub fn new(pg: PgPool) -> Self {
        Self { pg }
    }

    async fn find_user(&self, column: &str, value: &str) -> Result<Option<User>, Error> {
        let sql = format!(r#"{} WHERE "{}" = $1 LIMIT 1"#, USER_COLUMNS, column);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pg)
            .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn users(&self) -> Result<Vec<User>, Error> {
        let sql = format!(r#"{} ORDER BY "seatIndex" NULLS LAST, "username""#, USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pg)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, Error> {
        self.find_user("id", id).await
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.find_user("username", username).await
    }

    async fn insert_user(&self, user: &User) -> Result<(), Error> {
        let res = sqlx::query(
            r#"INSERT INTO users ("id", "username", "fullName", "role", "password", "isActive", "seatIndex")
            VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(&user.password)
        .bind(user.is_active)
        .bind(user.seat_index)
        .execute(&self.pg)
        .await?;

        if res.rows_affected() < 1 {
            return Err(Error::InternalError {
                kind: "DatabaseError",
                message: "Could not save user to database!".to_string(),
            });
        }
        Ok(())
    }

    async fn update_user_role(&self, id: &str, role: Role) -> Result<bool, Error> {
        let res = sqlx::query(r#"UPDATE users SET "role" = $1 WHERE "id" = $2"#)
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pg)
            .await?;
        Ok(res.rows_affected() >= 1)
    }

    async fn update_user_status(&self, id: &str, is_active: bool) -> Result<bool, Error> {
        let res = sqlx::query(r#"UPDATE users SET "isActive" = $1 WHERE "id" = $2"#)
            .bind(is_active)
            .bind(id)
            .execute(&self.pg)
            .await?;
        Ok(res.rows_affected() >= 1)
    }

    async fn subjects(&self) -> Result<Vec<Subject>, Error> {
        let sql = format!(r#"{} ORDER BY "name""#, SUBJECT_COLUMNS);
        Ok(sqlx::query_as::<_, Subject>(&sql)
            .fetch_all(&self.pg)
            .await?)
    }

    async fn insert_subject(&self, subject: &Subject) -> Result<(), Error> {
        sqlx::query(r#"INSERT INTO subjects ("id", "name", "code", "teacher") VALUES ($1, $2, $3, $4)"#)
            .bind(&subject.id)
            .bind(&subject.name)
            .bind(&subject.code)
            .bind(&subject.teacher)
            .execute(&self.pg)
            .await?;
        Ok(())
    }

    async fn videos(&self) -> Result<Vec<Video>, Error> {
        let sql = format!(r#"{} ORDER BY "week", "title""#, VIDEO_COLUMNS);
        Ok(sqlx::query_as::<_, Video>(&sql).fetch_all(&self.pg).await?)
    }

    async fn insert_video(&self, video: &Video) -> Result<(), Error> {
        let res = sqlx::query(
            r#"INSERT INTO videos ("id", "title", "url", "subject", "week", "uploadedBy")
            VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(&video.id)
        .bind(&video.title)
        .bind(&video.url)
        .bind(&video.subject)
        .bind(video.week)
        .bind(&video.uploaded_by)
        .execute(&self.pg)
        .await?;

        if res.rows_affected() < 1 {
            return Err(Error::InternalError {
                kind: "DatabaseError",
                message: "Could not save video to database!".to_string(),
            });
        }
        Ok(())
    }

    async fn delete_video(&self, id: &str) -> Result<bool, Error> {
        let res = sqlx::query(r#"DELETE FROM videos WHERE "id" = $1"#)
            .bind(id)
            .execute(&self.pg)
            .await?;
        Ok(res.rows_affected() >= 1)
    }

    async fn activity_log(&self) -> Result<Vec<ActivityLogEntry>, Error> {
        let rows = sqlx::query_as::<_, ActivityLogRow>(
            r#"SELECT "id",
                COALESCE("userId", '') AS "userId",
                COALESCE("action", '') AS "action",
                COALESCE("timestamp", '') AS "timestamp"
            FROM activity_logs ORDER BY "timestamp" DESC"#,
        )
        .fetch_all(&self.pg)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id.clone();
                ActivityLogEntry::try_from(row)
                    .map_err(|err| log::warn!("Skipping activity log `{}`: {:?}", id, err))
                    .ok()
            })
            .collect())
    }

    async fn append_activity(&self, entry: &ActivityLogEntry) -> Result<(), Error> {
        sqlx::query(r#"INSERT INTO activity_logs ("id", "userId", "action", "timestamp") VALUES ($1, $2, $3, $4)"#)
            .bind(&entry.id)
            .bind(&entry.user_id)
            .bind(&entry.action)
            .bind(entry.stored_timestamp())
            .execute(&self.pg)
            .await?;
        Ok(())
    }
}
