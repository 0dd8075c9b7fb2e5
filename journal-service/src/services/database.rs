//! PostgreSQL access for journal-service.

use crate::authz::{
    Account, FamilyId, Identity, IdentityError, IdentityResolver, OwnershipError,
    OwnershipResolver, ResourceKind, ResourceReference,
};
use crate::models::{
    Board, BoardCategory, BoardTitle, BoardWithAuthor, BoxCategory, Comment, CommentWithAuthor,
    CreateBoard, CreateComment, CreateDrawing, CreateKid, Drawing, DrawingBox, Kid, UpdateBoard,
    UpdateDrawing, UpdateKid, User,
};
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{info, instrument};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

/// Filters for board listings.
#[derive(Debug, Clone, Default)]
pub struct BoardListFilter {
    pub category: Option<BoardCategory>,
    pub keyword: Option<String>,
}

fn db_error(context: &str, e: sqlx::Error) -> AppError {
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

impl Database {
    #[instrument(skip(database_url), fields(service = "journal-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| db_error("Failed to connect", e))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Health check failed", e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accounts and ownership
    // -------------------------------------------------------------------------

    pub async fn find_user_by_identity(
        &self,
        email: &str,
        provider: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, provider, nickname, family_id, created_at
            FROM users
            WHERE email = $1 AND provider = $2
            "#,
        )
        .bind(email)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await
    }

    /// Family owning a resource, following drawing -> box -> kid -> family.
    pub async fn find_owner_family(
        &self,
        resource: ResourceReference,
    ) -> Result<Option<i64>, sqlx::Error> {
        let sql = match resource.kind {
            ResourceKind::Kid => "SELECT family_id FROM kids WHERE kid_id = $1",
            ResourceKind::DrawingBox => {
                r#"
                SELECT k.family_id
                FROM drawing_boxes b
                JOIN kids k ON k.kid_id = b.kid_id
                WHERE b.drawing_box_id = $1
                "#
            }
            ResourceKind::Drawing => {
                r#"
                SELECT k.family_id
                FROM drawings d
                JOIN drawing_boxes b ON b.drawing_box_id = d.drawing_box_id
                JOIN kids k ON k.kid_id = b.kid_id
                WHERE d.drawing_id = $1
                "#
            }
        };

        sqlx::query_scalar::<_, i64>(sql)
            .bind(resource.id)
            .fetch_optional(&self.pool)
            .await
    }

    // -------------------------------------------------------------------------
    // Kid Operations
    // -------------------------------------------------------------------------

    /// Registers a kid together with its default drawing boxes.
    #[instrument(skip(self, input), fields(family_id = input.family_id))]
    pub async fn create_kid(&self, input: &CreateKid) -> Result<(Kid, Vec<DrawingBox>), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let kid = sqlx::query_as::<_, Kid>(
            r#"
            INSERT INTO kids (family_id, kid_name, kid_birth, kid_profile_image)
            VALUES ($1, $2, $3, $4)
            RETURNING kid_id, family_id, kid_name, kid_birth, kid_profile_image, created_at
            "#,
        )
        .bind(input.family_id)
        .bind(&input.kid_name)
        .bind(input.kid_birth)
        .bind(&input.kid_profile_image)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("Family not found"))
            }
            _ => db_error("Failed to create kid", e),
        })?;

        let mut boxes = Vec::with_capacity(2);
        for (name, category) in BoxCategory::defaults() {
            let drawing_box = sqlx::query_as::<_, DrawingBox>(
                r#"
                INSERT INTO drawing_boxes (kid_id, drawing_box_name, drawing_box_category)
                VALUES ($1, $2, $3)
                RETURNING drawing_box_id, kid_id, drawing_box_name, drawing_box_category, created_at
                "#,
            )
            .bind(kid.kid_id)
            .bind(name)
            .bind(category.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to create default drawing box", e))?;
            boxes.push(drawing_box);
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit kid creation", e))?;

        info!(kid_id = kid.kid_id, "Kid registered with default drawing boxes");

        Ok((kid, boxes))
    }

    pub async fn find_kid(&self, kid_id: i64) -> Result<Option<Kid>, AppError> {
        sqlx::query_as::<_, Kid>(
            r#"
            SELECT kid_id, family_id, kid_name, kid_birth, kid_profile_image, created_at
            FROM kids
            WHERE kid_id = $1
            "#,
        )
        .bind(kid_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get kid", e))
    }

    pub async fn update_kid(&self, kid_id: i64, input: &UpdateKid) -> Result<Option<Kid>, AppError> {
        sqlx::query_as::<_, Kid>(
            r#"
            UPDATE kids
            SET kid_name = $2,
                kid_birth = $3,
                kid_profile_image = COALESCE($4, kid_profile_image)
            WHERE kid_id = $1
            RETURNING kid_id, family_id, kid_name, kid_birth, kid_profile_image, created_at
            "#,
        )
        .bind(kid_id)
        .bind(&input.kid_name)
        .bind(input.kid_birth)
        .bind(&input.kid_profile_image)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update kid", e))
    }

    pub async fn delete_kid(&self, kid_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM kids WHERE kid_id = $1")
            .bind(kid_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete kid", e))?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Drawing Box Operations
    // -------------------------------------------------------------------------

    pub async fn list_drawing_boxes(&self, kid_id: i64) -> Result<Vec<DrawingBox>, AppError> {
        sqlx::query_as::<_, DrawingBox>(
            r#"
            SELECT drawing_box_id, kid_id, drawing_box_name, drawing_box_category, created_at
            FROM drawing_boxes
            WHERE kid_id = $1
            ORDER BY drawing_box_id
            "#,
        )
        .bind(kid_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list drawing boxes", e))
    }

    pub async fn create_drawing_box(
        &self,
        kid_id: i64,
        name: &str,
        category: BoxCategory,
    ) -> Result<DrawingBox, AppError> {
        sqlx::query_as::<_, DrawingBox>(
            r#"
            INSERT INTO drawing_boxes (kid_id, drawing_box_name, drawing_box_category)
            VALUES ($1, $2, $3)
            RETURNING drawing_box_id, kid_id, drawing_box_name, drawing_box_category, created_at
            "#,
        )
        .bind(kid_id)
        .bind(name)
        .bind(category.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create drawing box", e))
    }

    pub async fn find_drawing_box(&self, drawing_box_id: i64) -> Result<Option<DrawingBox>, AppError> {
        sqlx::query_as::<_, DrawingBox>(
            r#"
            SELECT drawing_box_id, kid_id, drawing_box_name, drawing_box_category, created_at
            FROM drawing_boxes
            WHERE drawing_box_id = $1
            "#,
        )
        .bind(drawing_box_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get drawing box", e))
    }

    pub async fn rename_drawing_box(
        &self,
        drawing_box_id: i64,
        name: &str,
    ) -> Result<Option<DrawingBox>, AppError> {
        sqlx::query_as::<_, DrawingBox>(
            r#"
            UPDATE drawing_boxes
            SET drawing_box_name = $2
            WHERE drawing_box_id = $1
            RETURNING drawing_box_id, kid_id, drawing_box_name, drawing_box_category, created_at
            "#,
        )
        .bind(drawing_box_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to rename drawing box", e))
    }

    /// Deletes a custom box. Default boxes and unknown categories never match.
    pub async fn delete_custom_drawing_box(&self, drawing_box_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM drawing_boxes WHERE drawing_box_id = $1 AND drawing_box_category = $2",
        )
        .bind(drawing_box_id)
        .bind(BoxCategory::Custom.as_str())
        .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete drawing box", e))?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Drawing Operations
    // -------------------------------------------------------------------------

    pub async fn list_drawings(&self, drawing_box_id: i64) -> Result<Vec<Drawing>, AppError> {
        sqlx::query_as::<_, Drawing>(
            r#"
            SELECT drawing_id, drawing_box_id, drawing_title, drawing_diary, drawing_image_path,
                   created_at, updated_at
            FROM drawings
            WHERE drawing_box_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(drawing_box_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list drawings", e))
    }

    #[instrument(skip(self, input), fields(drawing_box_id = input.drawing_box_id))]
    pub async fn create_drawing(&self, input: &CreateDrawing) -> Result<Drawing, AppError> {
        let drawing = sqlx::query_as::<_, Drawing>(
            r#"
            INSERT INTO drawings (drawing_box_id, drawing_title, drawing_diary, drawing_image_path)
            VALUES ($1, $2, $3, $4)
            RETURNING drawing_id, drawing_box_id, drawing_title, drawing_diary, drawing_image_path,
                      created_at, updated_at
            "#,
        )
        .bind(input.drawing_box_id)
        .bind(&input.drawing_title)
        .bind(&input.drawing_diary)
        .bind(&input.drawing_image_path)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create drawing", e))?;

        info!(drawing_id = drawing.drawing_id, "Drawing created");
        Ok(drawing)
    }

    pub async fn find_drawing(&self, drawing_id: i64) -> Result<Option<Drawing>, AppError> {
        sqlx::query_as::<_, Drawing>(
            r#"
            SELECT drawing_id, drawing_box_id, drawing_title, drawing_diary, drawing_image_path,
                   created_at, updated_at
            FROM drawings
            WHERE drawing_id = $1
            "#,
        )
        .bind(drawing_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get drawing", e))
    }

    pub async fn update_drawing(
        &self,
        drawing_id: i64,
        input: &UpdateDrawing,
    ) -> Result<Option<Drawing>, AppError> {
        sqlx::query_as::<_, Drawing>(
            r#"
            UPDATE drawings
            SET drawing_title = $2, drawing_diary = $3, updated_at = NOW()
            WHERE drawing_id = $1
            RETURNING drawing_id, drawing_box_id, drawing_title, drawing_diary, drawing_image_path,
                      created_at, updated_at
            "#,
        )
        .bind(drawing_id)
        .bind(&input.drawing_title)
        .bind(&input.drawing_diary)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update drawing", e))
    }

    pub async fn move_drawing(
        &self,
        drawing_id: i64,
        drawing_box_id: i64,
    ) -> Result<Option<Drawing>, AppError> {
        sqlx::query_as::<_, Drawing>(
            r#"
            UPDATE drawings
            SET drawing_box_id = $2, updated_at = NOW()
            WHERE drawing_id = $1
            RETURNING drawing_id, drawing_box_id, drawing_title, drawing_diary, drawing_image_path,
                      created_at, updated_at
            "#,
        )
        .bind(drawing_id)
        .bind(drawing_box_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to move drawing", e))
    }

    pub async fn delete_drawing(&self, drawing_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM drawings WHERE drawing_id = $1")
            .bind(drawing_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete drawing", e))?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Board Operations
    // -------------------------------------------------------------------------

    pub async fn list_board_titles(
        &self,
        filter: &BoardListFilter,
        page: i64,
        size: i64,
    ) -> Result<Vec<BoardTitle>, AppError> {
        let offset = page
            .checked_mul(size)
            .filter(|offset| *offset >= 0)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Page out of range")))?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT b.board_id, b.board_title, b.board_category, b.board_view,
                   u.nickname AS writer_nickname,
                   COUNT(c.comment_id) AS comment_count,
                   b.created_at
            FROM boards b
            JOIN users u ON u.user_id = b.user_id
            LEFT JOIN comments c ON c.board_id = b.board_id
            WHERE TRUE
            "#,
        );

        if let Some(category) = filter.category {
            query
                .push(" AND b.board_category = ")
                .push_bind(category.as_str());
        }
        if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
            query
                .push(" AND b.board_title ILIKE ")
                .push_bind(format!("%{}%", escape_like(keyword.trim())));
        }

        query
            .push(" GROUP BY b.board_id, u.nickname ORDER BY b.created_at DESC, b.board_id DESC LIMIT ")
            .push_bind(size)
            .push(" OFFSET ")
            .push_bind(offset);

        query
            .build_query_as::<BoardTitle>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list boards", e))
    }

    /// Loads a board and counts the view.
    pub async fn view_board(&self, board_id: i64) -> Result<Option<BoardWithAuthor>, AppError> {
        sqlx::query_as::<_, BoardWithAuthor>(
            r#"
            WITH viewed AS (
                UPDATE boards SET board_view = board_view + 1
                WHERE board_id = $1
                RETURNING *
            )
            SELECT v.board_id, v.user_id, v.board_title, v.board_content, v.board_category,
                   v.board_image, v.board_view, v.created_at, v.updated_at,
                   u.nickname AS writer_nickname
            FROM viewed v
            JOIN users u ON u.user_id = v.user_id
            "#,
        )
        .bind(board_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get board", e))
    }

    pub async fn find_board(&self, board_id: i64) -> Result<Option<Board>, AppError> {
        sqlx::query_as::<_, Board>(
            r#"
            SELECT board_id, user_id, board_title, board_content, board_category, board_image,
                   board_view, created_at, updated_at
            FROM boards
            WHERE board_id = $1
            "#,
        )
        .bind(board_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get board", e))
    }

    #[instrument(skip(self, input), fields(user_id = input.user_id))]
    pub async fn create_board(&self, input: &CreateBoard) -> Result<Board, AppError> {
        sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (user_id, board_title, board_content, board_category, board_image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING board_id, user_id, board_title, board_content, board_category, board_image,
                      board_view, created_at, updated_at
            "#,
        )
        .bind(input.user_id)
        .bind(&input.board_title)
        .bind(&input.board_content)
        .bind(input.board_category.as_str())
        .bind(&input.board_image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create board", e))
    }

    pub async fn update_board(
        &self,
        board_id: i64,
        input: &UpdateBoard,
    ) -> Result<Option<Board>, AppError> {
        sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards
            SET board_title = $2, board_content = $3, board_category = $4, updated_at = NOW()
            WHERE board_id = $1
            RETURNING board_id, user_id, board_title, board_content, board_category, board_image,
                      board_view, created_at, updated_at
            "#,
        )
        .bind(board_id)
        .bind(&input.board_title)
        .bind(&input.board_content)
        .bind(input.board_category.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update board", e))
    }

    pub async fn delete_board(&self, board_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM boards WHERE board_id = $1")
            .bind(board_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete board", e))?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Comment Operations
    // -------------------------------------------------------------------------

    pub async fn list_comments(&self, board_id: i64) -> Result<Vec<CommentWithAuthor>, AppError> {
        sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.comment_id, c.user_id, u.nickname AS writer_nickname, c.comment_content,
                   c.created_at
            FROM comments c
            JOIN users u ON u.user_id = c.user_id
            WHERE c.board_id = $1
            ORDER BY c.created_at, c.comment_id
            "#,
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list comments", e))
    }

    pub async fn create_comment(&self, input: &CreateComment) -> Result<Comment, AppError> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (board_id, user_id, comment_content)
            VALUES ($1, $2, $3)
            RETURNING comment_id, board_id, user_id, comment_content, created_at, updated_at
            "#,
        )
        .bind(input.board_id)
        .bind(input.user_id)
        .bind(&input.comment_content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("Board not found"))
            }
            _ => db_error("Failed to create comment", e),
        })
    }

    pub async fn find_comment(&self, comment_id: i64) -> Result<Option<Comment>, AppError> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT comment_id, board_id, user_id, comment_content, created_at, updated_at
            FROM comments
            WHERE comment_id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get comment", e))
    }

    pub async fn update_comment(
        &self,
        comment_id: i64,
        content: &str,
    ) -> Result<Option<Comment>, AppError> {
        sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET comment_content = $2, updated_at = NOW()
            WHERE comment_id = $1
            RETURNING comment_id, board_id, user_id, comment_content, created_at, updated_at
            "#,
        )
        .bind(comment_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update comment", e))
    }

    pub async fn delete_comment(&self, comment_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE comment_id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete comment", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl IdentityResolver for Database {
    async fn resolve_account(&self, identity: &Identity) -> Result<Account, IdentityError> {
        self.find_user_by_identity(&identity.email, &identity.provider)
            .await
            .map_err(|e| IdentityError::Unavailable(e.into()))?
            .map(Account::from)
            .ok_or(IdentityError::NotFound)
    }
}

#[async_trait]
impl OwnershipResolver for Database {
    async fn resolve_owner_family(
        &self,
        resource: ResourceReference,
    ) -> Result<FamilyId, OwnershipError> {
        self.find_owner_family(resource)
            .await
            .map_err(|e| OwnershipError::Unavailable(e.into()))?
            .map(FamilyId)
            .ok_or(OwnershipError::NotFound(resource))
    }
}

/// Escapes LIKE wildcards so keywords match literally.
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
