use sqlx::{Sqlite, SqlitePool};

use crate::data_formats::{AdFilter, CreateAdRequest, UpdateAdRequest};
use crate::errors::RequestError;
use crate::models::{Ad, AdDetail};

use super::{
    category_exists_in_db, get_comments_for_ad_in_db, get_likes_for_ad_in_db, like_pattern,
    QueryBuilder, SqlParam,
};

const AD_QUERY: &str = r#"
            SELECT ads.id               AS "id",
                   ads.name             AS "name",
                   ads.author_id        AS "author_id",
                   users.username       AS "author_username",
                   users.first_name     AS "author_first_name",
                   ads.price            AS "price",
                   ads.description      AS "description",
                   ads.is_published     AS "is_published",
                   ads.category_id      AS "category_id",
                   categories.name      AS "category_name",
                   ads.image            AS "image"
            FROM   ads
                LEFT JOIN users
                       ON users.id = ads.author_id
                LEFT JOIN categories
                       ON categories.id = ads.category_id
"#;

const LOCATION_MATCH: (&str, &str) = (
    r#"EXISTS (SELECT 1
                    FROM   user_locations
                        JOIN locations
                          ON locations.id = user_locations.location_id
                    WHERE  user_locations.user_id = ads.author_id
                        AND "#,
    ")",
);

impl AdFilter {
    /// The `WHERE` clause for this filter and its bind values, in order.
    /// Empty when no field is constrained.
    pub fn where_clause(&self) -> (String, Vec<SqlParam>) {
        let like = |value: &Option<String>| {
            value
                .as_deref()
                .map(|needle| SqlParam::Text(like_pattern(needle)))
        };
        QueryBuilder::new("WHERE ", " AND ")
            .add_param(r"ads.name LIKE ? ESCAPE '\'", like(&self.name))
            .add_param("ads.price >= ?", self.price_to.map(SqlParam::Int))
            .add_param("ads.price <= ?", self.price_from.map(SqlParam::Int))
            .add_param(r"categories.name LIKE ? ESCAPE '\'", like(&self.cat))
            .add_any(
                r"locations.name LIKE ? ESCAPE '\'",
                LOCATION_MATCH,
                self.locations
                    .iter()
                    .map(|location| SqlParam::Text(like_pattern(location)))
                    .collect(),
            )
            .build()
    }
}

pub async fn list_ads_in_db(pool: &SqlitePool, filter: &AdFilter) -> Result<Vec<Ad>, RequestError> {
    let mut tx = pool.begin().await?;
    let (where_clause, params) = filter.where_clause();
    let sql = format!("{AD_QUERY} {where_clause} ORDER BY ads.id");

    let mut query = sqlx::query_as::<Sqlite, Ad>(&sql);
    for param in params {
        query = match param {
            SqlParam::Text(value) => query.bind(value),
            SqlParam::Int(value) => query.bind(value),
            SqlParam::Null => query.bind(Option::<String>::None),
        };
    }
    let result = query.fetch_all(&mut tx).await?;

    tx.commit().await?;
    Ok(result)
}

pub async fn list_liked_ads_in_db(pool: &SqlitePool, user_id: i64) -> Result<Vec<Ad>, RequestError> {
    let mut tx = pool.begin().await?;
    let sql = format!(
        "{AD_QUERY} WHERE EXISTS (SELECT 1 FROM likes WHERE likes.ad_id = ads.id AND likes.user_id = ?) ORDER BY ads.id"
    );
    let result = sqlx::query_as::<Sqlite, Ad>(&sql)
        .bind(user_id)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn get_ad_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<Option<Ad>, RequestError> {
    let mut tx = pool.begin().await?;
    let sql = format!("{AD_QUERY} WHERE ads.id = ?");
    let result = sqlx::query_as::<Sqlite, Ad>(&sql)
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

async fn get_ad_or_not_found(pool: &SqlitePool, id: i64) -> Result<Ad, RequestError> {
    match get_ad_by_id_in_db(pool, id).await? {
        Some(ad) => Ok(ad),
        None => Err(RequestError::NotFound("Ad not found")),
    }
}

/// Fetches an ad the caller is about to modify, enforcing authorship.
async fn get_owned_ad(pool: &SqlitePool, user_id: i64, id: i64) -> Result<Ad, RequestError> {
    let ad = get_ad_or_not_found(pool, id).await?;
    if ad.author_id != Some(user_id) {
        return Err(RequestError::Forbidden);
    }
    Ok(ad)
}

/// Fails with 404 or 403 unless `user_id` authored the ad.
pub async fn ensure_ad_owner_in_db(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
) -> Result<(), RequestError> {
    get_owned_ad(pool, user_id, id).await.map(|_| ())
}

pub async fn get_ad_detail_in_db(pool: &SqlitePool, id: i64) -> Result<AdDetail, RequestError> {
    let ad = get_ad_or_not_found(pool, id).await?;
    let comments = get_comments_for_ad_in_db(pool, ad.id).await?;
    let likes = get_likes_for_ad_in_db(pool, ad.id).await?;
    Ok(AdDetail {
        ad,
        comments,
        likes,
    })
}

pub async fn create_ad_in_db(
    pool: &SqlitePool,
    author_id: i64,
    CreateAdRequest {
        name,
        price,
        description,
        category,
        is_published,
    }: CreateAdRequest,
) -> Result<AdDetail, RequestError> {
    if let Some(category_id) = category {
        if !category_exists_in_db(pool, category_id).await? {
            return Err(RequestError::Validation(format!(
                "category {} does not exist",
                category_id
            )));
        }
    }

    let mut tx = pool.begin().await?;
    let ad_id = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        INSERT INTO ads (name, author_id, price, description, is_published, category_id)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(author_id)
    .bind(price)
    .bind(description)
    .bind(is_published)
    .bind(category)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;

    tracing::info!(ad_id, author_id, "ad created");
    get_ad_detail_in_db(pool, ad_id).await
}

pub async fn update_ad_in_db(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    UpdateAdRequest {
        name,
        price,
        description,
        is_published,
        category,
    }: UpdateAdRequest,
) -> Result<AdDetail, RequestError> {
    get_owned_ad(pool, user_id, id).await?;
    if let Some(Some(category_id)) = category {
        if !category_exists_in_db(pool, category_id).await? {
            return Err(RequestError::Validation(format!(
                "category {} does not exist",
                category_id
            )));
        }
    }

    let (set_clause, params) = QueryBuilder::new("SET ", ", ")
        .add_param("name = ?", name.map(SqlParam::Text))
        .add_param("price = ?", price.map(SqlParam::Int))
        .add_param("description = ?", description.map(nullable(SqlParam::Text)))
        .add_param(
            "is_published = ?",
            is_published.map(|published| SqlParam::Int(published.into())),
        )
        .add_param("category_id = ?", category.map(nullable(SqlParam::Int)))
        .build();

    if !set_clause.is_empty() {
        let mut tx = pool.begin().await?;
        let sql = format!("UPDATE ads {set_clause} WHERE id = ?");
        let mut query = sqlx::query(&sql);
        for param in params {
            query = match param {
                SqlParam::Text(value) => query.bind(value),
                SqlParam::Int(value) => query.bind(value),
                SqlParam::Null => query.bind(Option::<String>::None),
            };
        }
        query.bind(id).execute(&mut tx).await?;
        tx.commit().await?;
    }

    get_ad_detail_in_db(pool, id).await
}

/// Maps an explicit `null` in an update body to `SqlParam::Null`.
fn nullable<T>(param: fn(T) -> SqlParam) -> impl Fn(Option<T>) -> SqlParam {
    move |value| value.map_or(SqlParam::Null, param)
}

/// Removes the ad; its comments and likes go with it through `ON DELETE CASCADE`.
/// Returns the stored image path so the caller can drop the file.
pub async fn delete_ad_in_db(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
) -> Result<Option<String>, RequestError> {
    let ad = get_owned_ad(pool, user_id, id).await?;
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM ads WHERE id = ?")
        .bind(id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    tracing::info!(ad_id = id, "ad deleted");
    Ok(ad.image)
}

/// Points the ad at a new image and returns the updated ad together with the
/// path it replaced.
pub async fn set_ad_image_in_db(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    image: &str,
) -> Result<(Ad, Option<String>), RequestError> {
    let previous = get_owned_ad(pool, user_id, id).await?.image;
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE ads SET image = ? WHERE id = ?")
        .bind(image)
        .bind(id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    let ad = get_ad_or_not_found(pool, id).await?;
    Ok((ad, previous))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_where_clause() {
        let (clause, params) = AdFilter::default().where_clause();
        assert!(clause.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn price_bounds_keep_their_observed_direction() {
        let filter = AdFilter {
            price_to: Some(200),
            price_from: Some(900),
            ..Default::default()
        };
        let (clause, params) = filter.where_clause();
        assert_eq!(clause, "WHERE ads.price >= ? AND ads.price <= ?");
        assert_eq!(params, vec![SqlParam::Int(200), SqlParam::Int(900)]);
    }

    #[test]
    fn text_filters_use_escaped_like_patterns() {
        let filter = AdFilter {
            name: Some("bike".into()),
            cat: Some("sport_".into()),
            ..Default::default()
        };
        let (clause, params) = filter.where_clause();
        assert!(clause.starts_with(r"WHERE ads.name LIKE ? ESCAPE '\' AND categories.name LIKE ?"));
        assert_eq!(
            params,
            vec![
                SqlParam::Text("%bike%".into()),
                SqlParam::Text(r"%sport\_%".into())
            ]
        );
    }

    #[test]
    fn explicit_null_becomes_a_null_bind() {
        let clear = nullable(SqlParam::Text);
        assert_eq!(clear(None), SqlParam::Null);
        assert_eq!(clear(Some("lamp".into())), SqlParam::Text("lamp".into()));
    }

    #[test]
    fn locations_are_or_ed_inside_one_clause() {
        let filter = AdFilter {
            name: Some("car".into()),
            locations: vec!["Moscow".into(), "Kazan".into()],
            ..Default::default()
        };
        let (clause, params) = filter.where_clause();
        assert_eq!(clause.matches("EXISTS").count(), 1);
        assert_eq!(clause.matches(" OR ").count(), 1);
        assert!(clause.contains("user_locations.user_id = ads.author_id"));
        assert_eq!(params.len(), 3);
        assert_eq!(params[2], SqlParam::Text("%Kazan%".into()));
    }
}
