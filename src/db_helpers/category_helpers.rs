use sqlx::{Sqlite, SqlitePool};

use crate::{data_formats::CreateCategoryRequest, errors::RequestError, models::Category};

pub async fn list_categories_in_db(pool: &SqlitePool) -> Result<Vec<Category>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, Category>("SELECT id, name FROM categories ORDER BY id")
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn category_exists_in_db(pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result.is_some())
}

pub async fn create_category_in_db(
    pool: &SqlitePool,
    CreateCategoryRequest { name }: CreateCategoryRequest,
) -> Result<Category, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, Category>(
        r#"
        INSERT INTO categories (name)
        VALUES (?)
        RETURNING id, name
        "#,
    )
    .bind(name)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result)
}

/// Deleting a category also deletes every ad filed under it. Returns the
/// image paths of those ads.
pub async fn delete_category_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Vec<String>, RequestError> {
    let mut tx = pool.begin().await?;
    let images = sqlx::query_scalar::<Sqlite, String>(
        "SELECT image FROM ads WHERE category_id = ? AND image IS NOT NULL",
    )
    .bind(id)
    .fetch_all(&mut tx)
    .await?;
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Category not found"));
    }
    tx.commit().await?;
    Ok(images)
}
