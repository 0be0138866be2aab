use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// An ad row joined with its author's username and category name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Ad {
    pub id: i64,
    pub name: String,
    pub author_id: Option<i64>,
    pub author_username: Option<String>,
    pub author_first_name: Option<String>,
    pub price: i64,
    pub description: Option<String>,
    pub is_published: bool,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub author_id: Option<i64>,
    pub author_username: Option<String>,
    pub ad_id: Option<i64>,
    pub created: Option<NaiveDate>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub ad_id: i64,
    pub created: NaiveDateTime,
}

/// Ad fields plus everything attached to it.
#[derive(Debug, Clone)]
pub struct AdDetail {
    pub ad: Ad,
    pub comments: Vec<Comment>,
    pub likes: Vec<Like>,
}
