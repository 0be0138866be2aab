use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Like};

const LIKE_QUERY: &str = r#"
        SELECT likes.id        AS "id",
               likes.user_id   AS "user_id",
               users.username  AS "username",
               likes.ad_id     AS "ad_id",
               likes.created   AS "created"
        FROM   likes
            JOIN users
              ON users.id = likes.user_id
"#;

/// Records that `user_id` likes `ad_id`. A second like for the same pair is
/// rejected with [`RequestError::Conflict`].
pub async fn add_like_in_db(
    pool: &SqlitePool,
    user_id: i64,
    ad_id: i64,
) -> Result<Like, RequestError> {
    let mut tx = pool.begin().await?;

    let ad = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM ads WHERE id = ?")
        .bind(ad_id)
        .fetch_optional(&mut tx)
        .await?;
    if ad.is_none() {
        return Err(RequestError::NotFound("Ad not found"));
    }

    let like_id = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        INSERT INTO likes (user_id, ad_id)
        VALUES (?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(ad_id)
    .fetch_one(&mut tx)
    .await
    .map_err(|e| {
        let e = RequestError::from(e);
        if e.is_unique_violation() {
            RequestError::Conflict("You have already liked this ad")
        } else {
            e
        }
    })?;

    let sql = format!("{LIKE_QUERY} WHERE likes.id = ?");
    let result = sqlx::query_as::<Sqlite, Like>(&sql)
        .bind(like_id)
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;

    Ok(result)
}

pub async fn get_likes_for_ad_in_db(
    pool: &SqlitePool,
    ad_id: i64,
) -> Result<Vec<Like>, RequestError> {
    let mut tx = pool.begin().await?;
    let sql = format!("{LIKE_QUERY} WHERE likes.ad_id = ? ORDER BY likes.id");
    let result = sqlx::query_as::<Sqlite, Like>(&sql)
        .bind(ad_id)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}
