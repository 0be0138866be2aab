use sqlx::{Sqlite, SqlitePool};

use crate::{data_formats::RegisterRequest, errors::RequestError, models::User};

use super::get_user_by_id;

// ----------------- User Queries -----------------

/// Inserts the user with an already-hashed password and links their
/// locations, creating any location names not seen before.
pub async fn insert_user(
    pool: &SqlitePool,
    RegisterRequest {
        username,
        password,
        first_name,
        last_name,
        locations,
    }: RegisterRequest,
) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let user = sqlx::query_as::<Sqlite, User>(
        r#"
        INSERT INTO users (username, password, first_name, last_name)
        VALUES (?, ?, ?, ?)
        RETURNING id, username, password, first_name, last_name, created_at
        "#,
    )
    .bind(username)
    .bind(password)
    .bind(first_name)
    .bind(last_name)
    .fetch_one(&mut tx)
    .await?;

    for location in locations {
        let location = location.trim();
        if location.is_empty() {
            continue;
        }
        let location_id = sqlx::query_scalar::<Sqlite, i64>(
            r#"
            INSERT INTO locations (name)
            VALUES (?1)
            ON CONFLICT (name) DO UPDATE SET name = ?1
            RETURNING id
            "#,
        )
        .bind(location)
        .fetch_one(&mut tx)
        .await?;

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_locations (user_id, location_id)
            VALUES (?, ?)
            "#,
        )
        .bind(user.id)
        .bind(location_id)
        .execute(&mut tx)
        .await?;
    }

    tx.commit().await?;
    Ok(user)
}

pub async fn get_user_locations_in_db(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<String>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_scalar::<Sqlite, String>(
        r#"
        SELECT locations.name
        FROM   user_locations
            JOIN locations
              ON locations.id = user_locations.location_id
        WHERE  user_locations.user_id = ?
        ORDER  BY locations.name
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn get_user_with_locations_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<(User, Vec<String>), RequestError> {
    let user = match get_user_by_id(pool, id).await? {
        Some(user) => user,
        None => return Err(RequestError::NotFound("User not found")),
    };
    let locations = get_user_locations_in_db(pool, id).await?;
    Ok((user, locations))
}

/// Everything the user authored or liked is removed with them. Returns the
/// image paths of the removed ads.
pub async fn delete_user_in_db(pool: &SqlitePool, id: i64) -> Result<Vec<String>, RequestError> {
    let mut tx = pool.begin().await?;
    let images = sqlx::query_scalar::<Sqlite, String>(
        "SELECT image FROM ads WHERE author_id = ? AND image IS NOT NULL",
    )
    .bind(id)
    .fetch_all(&mut tx)
    .await?;
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User not found"));
    }
    tx.commit().await?;
    Ok(images)
}

// ----------------- Token Queries -----------------

/// Returns the user's existing login token, storing `new_key` if they have none.
pub async fn get_or_create_token_in_db(
    pool: &SqlitePool,
    user_id: i64,
    new_key: &str,
) -> Result<String, RequestError> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO auth_tokens (key, user_id)
        VALUES (?, ?)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(new_key)
    .bind(user_id)
    .execute(&mut tx)
    .await?;
    let key = sqlx::query_scalar::<Sqlite, String>("SELECT key FROM auth_tokens WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(key)
}

pub async fn get_user_id_by_token_in_db(
    pool: &SqlitePool,
    key: &str,
) -> Result<Option<i64>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_scalar::<Sqlite, i64>("SELECT user_id FROM auth_tokens WHERE key = ?")
        .bind(key)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn delete_token_for_user_in_db(pool: &SqlitePool, user_id: i64) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(())
}
