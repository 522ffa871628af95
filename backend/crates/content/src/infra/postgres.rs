//! PostgreSQL Repository Implementation
//!
//! Category names are always joined, never copied onto posts. A paginated
//! listing runs its count and page inside one REPEATABLE READ transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entity::{Author, Category, CategoryRef, Post, PostWithRelations};
use crate::domain::query::{CategoryFilter, PostPage, PostQuery};
use crate::domain::repository::{AuthorRepository, CategoryRepository, PostRepository};
use crate::domain::value_object::name_order::cmp_names;
use crate::domain::value_object::{AuthorId, CategoryId, PostId, Visibility};
use crate::error::{ContentError, ContentResult};

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.excerpt, p.image, p.author, p.author_id, \
     p.visibility, p.slug, p.date, p.created_at, p.updated_at";

/// PostgreSQL-backed content repository
#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Query helpers
// ============================================================================

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    qb.push(" WHERE TRUE");

    if let Some(visibility) = query.visibility.as_visibility() {
        qb.push(" AND p.visibility = ").push_bind(visibility.as_str());
    }

    match &query.category {
        CategoryFilter::Any => {}
        CategoryFilter::Category(id) => {
            qb.push(" AND EXISTS (SELECT 1 FROM post_categories pc WHERE pc.post_id = p.id AND pc.category_id = ")
                .push_bind(id.into_uuid())
                .push(")");
        }
        CategoryFilter::AnyOf(ids) => {
            let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
            qb.push(" AND EXISTS (SELECT 1 FROM post_categories pc WHERE pc.post_id = p.id AND pc.category_id = ANY(")
                .push_bind(ids)
                .push("))");
        }
        CategoryFilter::Uncategorized => {
            qb.push(" AND NOT EXISTS (SELECT 1 FROM post_categories pc WHERE pc.post_id = p.id)");
        }
    }

    if let Some(term) = &query.search {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR p.excerpt ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    if !query.exclude.is_empty() {
        let ids: Vec<Uuid> = query.exclude.iter().map(|id| id.into_uuid()).collect();
        qb.push(" AND p.id <> ALL(").push_bind(ids).push(")");
    }
}

/// Escape LIKE wildcards so the term matches literally
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Foreign-key violations on writes name the missing parent
fn map_write_error(err: sqlx::Error) -> ContentError {
    let constraint = match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            db.constraint().map(str::to_owned)
        }
        _ => None,
    };
    match constraint.as_deref() {
        Some(c) if c.contains("author") => ContentError::AuthorNotFound,
        Some(c) if c.contains("category") => ContentError::CategoryNotFound,
        Some(c) if c.contains("post") => ContentError::PostNotFound,
        _ => ContentError::Database(err),
    }
}

/// Attach categories and author data to a batch of rows
async fn load_relations(
    conn: &mut PgConnection,
    rows: Vec<PostRow>,
) -> ContentResult<Vec<PostWithRelations>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let category_rows = sqlx::query_as::<_, PostCategoryRow>(
        r#"
        SELECT pc.post_id, c.id, c.name
        FROM post_categories pc
        JOIN categories c ON c.id = pc.category_id
        WHERE pc.post_id = ANY($1)
        "#,
    )
    .bind(&post_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut categories: HashMap<Uuid, Vec<CategoryRef>> = HashMap::new();
    for row in category_rows {
        categories.entry(row.post_id).or_default().push(CategoryRef {
            id: CategoryId::from_uuid(row.id),
            name: row.name,
        });
    }
    for refs in categories.values_mut() {
        refs.sort_by(|a, b| cmp_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
    }

    let mut author_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let authors: HashMap<Uuid, Author> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        sqlx::query_as::<_, AuthorRow>(
            r#"
            SELECT id, name, role, description, profile_picture_url, email, created_at, updated_at
            FROM authors
            WHERE id = ANY($1)
            "#,
        )
        .bind(&author_ids)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|row| (row.id, row.into_author()))
        .collect()
    };

    rows.into_iter()
        .map(|row| {
            let categories = categories.remove(&row.id).unwrap_or_default();
            let author_data = row.author_id.and_then(|id| authors.get(&id)).cloned();
            Ok(PostWithRelations {
                post: row.into_post()?,
                categories,
                author_data,
            })
        })
        .collect()
}

async fn insert_associations(
    conn: &mut PgConnection,
    post: &Post,
    category_ids: &[CategoryId],
) -> ContentResult<()> {
    if category_ids.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = category_ids.iter().map(|id| id.into_uuid()).collect();

    sqlx::query(
        r#"
        INSERT INTO post_categories (post_id, category_id, visibility, created_at)
        SELECT $1, category_id, $3, now()
        FROM UNNEST($2::uuid[]) AS t(category_id)
        ON CONFLICT (post_id, category_id) DO NOTHING
        "#,
    )
    .bind(post.id.as_uuid())
    .bind(&ids)
    .bind(post.visibility.as_str())
    .execute(&mut *conn)
    .await
    .map_err(map_write_error)?;

    Ok(())
}

// ============================================================================
// Post Repository Implementation
// ============================================================================

impl PostRepository for PgContentRepository {
    async fn query_posts(&self, query: &PostQuery) -> ContentResult<PostPage> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts p"));
        push_filters(&mut select, query);
        select
            .push(" ORDER BY p.created_at ")
            .push(query.sort.as_sql())
            .push(", p.id ")
            .push(query.sort.as_sql());
        if let Some(window) = query.window {
            select
                .push(" LIMIT ")
                .push_bind(i64::from(window.limit))
                .push(" OFFSET ")
                .push_bind(i64::from(window.offset));
        }
        let rows: Vec<PostRow> = select.build_query_as().fetch_all(&mut *tx).await?;

        let posts = load_relations(&mut tx, rows).await?;
        tx.commit().await?;

        Ok(PostPage::new(
            posts,
            u64::try_from(total).unwrap_or_default(),
            query.window,
        ))
    }

    async fn find_post(&self, id: &PostId) -> ContentResult<Option<PostWithRelations>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(load_relations(&mut conn, vec![row]).await?.pop())
    }

    async fn find_public_post_by_slug(
        &self,
        slug: &str,
    ) -> ContentResult<Option<PostWithRelations>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p \
             WHERE p.slug = $1 AND p.visibility = 'PUBLIC' \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT 1"
        ))
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(load_relations(&mut conn, vec![row]).await?.pop())
    }

    async fn create_post(&self, post: &Post, category_ids: &[CategoryId]) -> ContentResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO posts (
                id, title, content, excerpt, image, author, author_id,
                visibility, slug, date, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(post.id.as_uuid())
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.image)
        .bind(&post.author)
        .bind(post.author_id.map(|id| id.into_uuid()))
        .bind(post.visibility.as_str())
        .bind(&post.slug)
        .bind(post.date)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        insert_associations(&mut tx, post, category_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_post(
        &self,
        post: &Post,
        category_ids: Option<&[CategoryId]>,
    ) -> ContentResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE posts SET
                title = $2,
                content = $3,
                excerpt = $4,
                image = $5,
                author = $6,
                author_id = $7,
                visibility = $8,
                slug = $9,
                date = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(post.id.as_uuid())
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.image)
        .bind(&post.author)
        .bind(post.author_id.map(|id| id.into_uuid()))
        .bind(post.visibility.as_str())
        .bind(&post.slug)
        .bind(post.date)
        .bind(post.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(ContentError::PostNotFound);
        }

        match category_ids {
            Some(ids) => {
                sqlx::query("DELETE FROM post_categories WHERE post_id = $1")
                    .bind(post.id.as_uuid())
                    .execute(&mut *tx)
                    .await?;
                insert_associations(&mut tx, post, ids).await?;
            }
            None => {
                sqlx::query("UPDATE post_categories SET visibility = $2 WHERE post_id = $1")
                    .bind(post.id.as_uuid())
                    .bind(post.visibility.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_post(&self, id: &PostId) -> ContentResult<()> {
        // Associations go with the post (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ContentError::PostNotFound);
        }
        Ok(())
    }
}

// ============================================================================
// Category Repository Implementation
// ============================================================================

impl CategoryRepository for PgContentRepository {
    async fn list_categories(&self) -> ContentResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, created_at FROM categories",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut categories: Vec<Category> =
            rows.into_iter().map(CategoryRow::into_category).collect();
        categories.sort_by(|a, b| cmp_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn find_category(&self, id: &CategoryId) -> ContentResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, created_at FROM categories WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CategoryRow::into_category))
    }

    async fn create_category(&self, category: &Category) -> ContentResult<()> {
        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(category.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn rename_category(&self, id: &CategoryId, name: &str) -> ContentResult<Category> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
        )
        .bind(id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CategoryRow::into_category)
            .ok_or(ContentError::CategoryNotFound)
    }

    async fn delete_category(&self, id: &CategoryId) -> ContentResult<()> {
        // Associations go with the category (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ContentError::CategoryNotFound);
        }
        Ok(())
    }
}

// ============================================================================
// Author Repository Implementation
// ============================================================================

impl AuthorRepository for PgContentRepository {
    async fn list_authors(&self) -> ContentResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, AuthorRow>(
            r#"
            SELECT id, name, role, description, profile_picture_url, email, created_at, updated_at
            FROM authors
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut authors: Vec<Author> = rows.into_iter().map(AuthorRow::into_author).collect();
        authors.sort_by(|a, b| cmp_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(authors)
    }

    async fn find_author(&self, id: &AuthorId) -> ContentResult<Option<Author>> {
        let row = sqlx::query_as::<_, AuthorRow>(
            r#"
            SELECT id, name, role, description, profile_picture_url, email, created_at, updated_at
            FROM authors
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AuthorRow::into_author))
    }

    async fn create_author(&self, author: &Author) -> ContentResult<()> {
        sqlx::query(
            r#"
            INSERT INTO authors (
                id, name, role, description, profile_picture_url, email, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(author.id.as_uuid())
        .bind(&author.name)
        .bind(&author.role)
        .bind(&author.description)
        .bind(&author.profile_picture_url)
        .bind(&author.email)
        .bind(author.created_at)
        .bind(author.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_author(&self, author: &Author) -> ContentResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE authors SET
                name = $2,
                role = $3,
                description = $4,
                profile_picture_url = $5,
                email = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(author.id.as_uuid())
        .bind(&author.name)
        .bind(&author.role)
        .bind(&author.description)
        .bind(&author.profile_picture_url)
        .bind(&author.email)
        .bind(author.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ContentError::AuthorNotFound);
        }

        let renamed = sqlx::query(
            "UPDATE posts SET author = $2 WHERE author_id = $1 AND author IS DISTINCT FROM $2",
        )
        .bind(author.id.as_uuid())
        .bind(&author.name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if renamed.rows_affected() > 0 {
            tracing::debug!(
                author_id = %author.id,
                posts = renamed.rows_affected(),
                "Author name copied to posts"
            );
        }
        Ok(())
    }

    async fn delete_author(&self, id: &AuthorId) -> ContentResult<()> {
        // posts.author_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ContentError::AuthorNotFound);
        }
        Ok(())
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: String,
    excerpt: String,
    image: Option<String>,
    author: Option<String>,
    author_id: Option<Uuid>,
    visibility: String,
    slug: Option<String>,
    date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self) -> ContentResult<Post> {
        let visibility: Visibility = self.visibility.parse().map_err(|_| {
            ContentError::Internal(format!(
                "Post {} has unknown visibility {:?}",
                self.id, self.visibility
            ))
        })?;

        Ok(Post {
            id: PostId::from_uuid(self.id),
            title: self.title,
            content: self.content,
            excerpt: self.excerpt,
            image: self.image,
            author: self.author,
            author_id: self.author_id.map(AuthorId::from_uuid),
            visibility,
            slug: self.slug,
            date: self.date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PostCategoryRow {
    post_id: Uuid,
    id: Uuid,
    name: String,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: CategoryId::from_uuid(self.id),
            name: self.name,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuthorRow {
    id: Uuid,
    name: String,
    role: Option<String>,
    description: Option<String>,
    profile_picture_url: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AuthorRow {
    fn into_author(self) -> Author {
        Author {
            id: AuthorId::from_uuid(self.id),
            name: self.name,
            role: self.role,
            description: self.description,
            profile_picture_url: self.profile_picture_url,
            email: self.email,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{SortOrder, VisibilityFilter};

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
        assert_eq!(escape_like("custodia"), "custodia");
    }

    #[test]
    fn test_filters_sql() {
        let query = PostQuery::new(VisibilityFilter::Public)
            .category(CategoryFilter::Uncategorized)
            .search(Some("despido"))
            .excluding([PostId::new()])
            .sorted(SortOrder::Asc);

        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_filters(&mut qb, &query);
        let sql = qb.sql();

        assert!(sql.contains("p.visibility = $1"));
        assert!(sql.contains("NOT EXISTS"));
        assert!(sql.contains("p.title ILIKE $2"));
        assert!(sql.contains("p.excerpt ILIKE $3"));
        assert!(sql.contains("p.id <> ALL($4)"));
    }

    #[test]
    fn test_all_visibility_has_no_filter() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_filters(&mut qb, &PostQuery::new(VisibilityFilter::All));
        assert!(!qb.sql().contains("visibility"));
    }
}
