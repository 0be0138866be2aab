use sqlx::{Sqlite, SqlitePool};

use crate::{data_formats::CommentRequest, errors::RequestError, models::Comment};

const COMMENT_QUERY: &str = r#"
        SELECT comments.id         AS "id",
               comments.text       AS "text",
               comments.author_id  AS "author_id",
               users.username      AS "author_username",
               comments.ad_id      AS "ad_id",
               comments.created    AS "created"
        FROM   comments
            LEFT JOIN users
                   ON users.id = comments.author_id
"#;

/// Creates a comment owned by `author_id` on the ad named in the request.
pub async fn add_comment_to_ad_in_db(
    pool: &SqlitePool,
    author_id: i64,
    CommentRequest { ad, text }: CommentRequest,
) -> Result<Comment, RequestError> {
    let mut tx = pool.begin().await?;

    let ad_id = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM ads WHERE id = ?")
        .bind(ad)
        .fetch_optional(&mut tx)
        .await?;
    let ad_id = match ad_id {
        Some(id) => id,
        None => return Err(RequestError::NotFound("Ad not found")),
    };

    let comment_id = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        INSERT INTO comments (text, author_id, ad_id)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(text)
    .bind(author_id)
    .bind(ad_id)
    .fetch_one(&mut tx)
    .await?;

    let sql = format!("{COMMENT_QUERY} WHERE comments.id = ?");
    let result = sqlx::query_as::<Sqlite, Comment>(&sql)
        .bind(comment_id)
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;

    Ok(result)
}

pub async fn get_comments_for_ad_in_db(
    pool: &SqlitePool,
    ad_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let mut tx = pool.begin().await?;
    let sql = format!("{COMMENT_QUERY} WHERE comments.ad_id = ? ORDER BY comments.id");
    let result = sqlx::query_as::<Sqlite, Comment>(&sql)
        .bind(ad_id)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}
