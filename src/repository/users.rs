//! Users repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{
        AccountStatus, RegisterUser, User, UserQuery, UserRole, UserSort, UserSummary,
    },
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email (primary authentication method)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Check if university ID already exists
    pub async fn university_id_exists(&self, university_id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE university_id = $1)")
                .bind(university_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Insert a new pending user
    pub async fn create(&self, req: &RegisterUser, password_hash: &str) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, email, university_id, password_hash, university_card)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&req.full_name)
        .bind(&req.email)
        .bind(req.university_id)
        .bind(password_hash)
        .bind(&req.university_card)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Search users with pagination, optionally filtered by account status
    pub async fn search(
        &self,
        query: &UserQuery,
        status: Option<AccountStatus>,
    ) -> AppResult<(Vec<UserSummary>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(status) = status {
            params.push(status.as_str().to_string());
            conditions.push(format!("u.status = ${}", params.len()));
        }

        if let Some(ref q) = query.query {
            if !q.is_empty() {
                params.push(format!("%{}%", q));
                conditions.push(format!(
                    "(u.full_name ILIKE ${n} OR u.email ILIKE ${n})",
                    n = params.len()
                ));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM users u {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let order_clause = query.sort.unwrap_or(UserSort::Newest).order_clause();

        let select_query = format!(
            r#"
            SELECT u.id, u.full_name, u.email, u.university_id, u.university_card,
                   u.status, u.role, u.created_at,
                   (SELECT COUNT(*) FROM borrow_records br
                    WHERE br.user_id = u.id AND br.status = 'BORROWED') as borrowed_count
            FROM users u
            {}
            ORDER BY {}
            LIMIT {} OFFSET {}
            "#,
            where_clause, order_clause, per_page, offset
        );

        let mut select_builder = sqlx::query_as::<_, UserSummary>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let users = select_builder.fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    /// Update account status (approval workflow)
    pub async fn update_status(&self, id: Uuid, status: AccountStatus) -> AppResult<User> {
        sqlx::query_as::<_, User>("UPDATE users SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Update user role
    pub async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        sqlx::query_as::<_, User>("UPDATE users SET role = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Delete a user together with their borrow history.
    /// Refused while the user still holds borrowed copies unless `force`.
    pub async fn delete(&self, id: Uuid, force: bool) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let outstanding: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_records WHERE user_id = $1 AND status = 'BORROWED'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if outstanding > 0 && !force {
            return Err(AppError::Conflict(format!(
                "User still holds {} borrowed book(s)",
                outstanding
            )));
        }

        // Forced delete discards outstanding records, so their copies
        // return to stock first to keep the copy-count invariant.
        sqlx::query(
            r#"
            UPDATE books SET available_copies = available_copies + sub.cnt
            FROM (
                SELECT book_id, COUNT(*) AS cnt
                FROM borrow_records
                WHERE user_id = $1 AND status = 'BORROWED'
                GROUP BY book_id
            ) sub
            WHERE books.id = sub.book_id
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM borrow_records WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Refresh the last activity date (called on login)
    pub async fn touch_last_activity(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_activity_date = CURRENT_DATE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Count all users
    pub async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Most recent pending account requests (dashboard)
    pub async fn recent_pending(&self, limit: i64) -> AppResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.full_name, u.email, u.university_id, u.university_card,
                   u.status, u.role, u.created_at,
                   (SELECT COUNT(*) FROM borrow_records br
                    WHERE br.user_id = u.id AND br.status = 'BORROWED') as borrowed_count
            FROM users u
            WHERE u.status = 'PENDING'
            ORDER BY u.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
