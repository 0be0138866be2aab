use serde::{Deserialize, Serialize};

use crate::models::{Ad, AdDetail, Category, Comment, Like, User};

// ----------------- User Response -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub locations: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct StatusResponse {
    pub status: String,
}

impl UserResponse {
    pub fn new(
        User {
            id,
            username,
            first_name,
            last_name,
            ..
        }: User,
        locations: Vec<String>,
    ) -> Self {
        UserResponse {
            id,
            username,
            first_name,
            last_name,
            locations,
        }
    }
}

// ----------------- Category Response -----------------
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

impl From<Category> for CategoryResponse {
    fn from(Category { id, name }: Category) -> Self {
        CategoryResponse { id, name }
    }
}

// ----------------- Ad Response -----------------

/// The compact form used by listings.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AdListResponse {
    pub id: i64,
    pub name: String,
    pub author: Option<String>,
    pub price: i64,
    pub image: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AdDetailResponse {
    pub id: i64,
    pub image: Option<String>,
    pub name: String,
    pub author: Option<String>,
    pub price: i64,
    pub description: Option<String>,
    pub is_published: bool,
    pub category: Option<String>,
    pub comments: Vec<CommentResponse>,
    pub likes_count: usize,
    pub likes: Vec<LikeResponse>,
}

/// Flat ad representation returned after an image upload.
#[derive(Deserialize, Serialize, Debug)]
pub struct AdImageResponse {
    pub id: i64,
    pub name: String,
    pub author_id: Option<i64>,
    pub author: Option<String>,
    pub price: i64,
    pub description: Option<String>,
    pub is_published: bool,
    pub category_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CommentResponse {
    pub id: i64,
    pub author: Option<String>,
    pub ad: Option<i64>,
    pub text: String,
    pub created: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LikeResponse {
    pub user: String,
    pub ad: i64,
    pub created: String,
}

pub fn image_url(image: Option<String>) -> Option<String> {
    image.map(|path| format!("/media/{}", path))
}

impl From<Ad> for AdListResponse {
    fn from(
        Ad {
            id,
            name,
            author_username,
            price,
            image,
            ..
        }: Ad,
    ) -> Self {
        AdListResponse {
            id,
            name,
            author: author_username,
            price,
            image: image_url(image),
        }
    }
}

impl From<Ad> for AdImageResponse {
    fn from(
        Ad {
            id,
            name,
            author_id,
            author_first_name,
            price,
            description,
            is_published,
            category_id,
            image,
            ..
        }: Ad,
    ) -> Self {
        AdImageResponse {
            id,
            name,
            author_id,
            author: author_first_name,
            price,
            description,
            is_published,
            category_id,
            image: image_url(image),
        }
    }
}

impl From<AdDetail> for AdDetailResponse {
    fn from(
        AdDetail {
            ad,
            comments,
            likes,
        }: AdDetail,
    ) -> Self {
        let likes: Vec<LikeResponse> = likes.into_iter().map(LikeResponse::from).collect();
        AdDetailResponse {
            id: ad.id,
            image: image_url(ad.image),
            name: ad.name,
            author: ad.author_username,
            price: ad.price,
            description: ad.description,
            is_published: ad.is_published,
            category: ad.category_name,
            comments: comments.into_iter().map(CommentResponse::from).collect(),
            likes_count: likes.len(),
            likes,
        }
    }
}

impl From<Comment> for CommentResponse {
    fn from(
        Comment {
            id,
            text,
            author_username,
            ad_id,
            created,
            ..
        }: Comment,
    ) -> Self {
        CommentResponse {
            id,
            author: author_username,
            ad: ad_id,
            text,
            created: created.map(|date| date.to_string()),
        }
    }
}

impl From<Like> for LikeResponse {
    fn from(
        Like {
            username,
            ad_id,
            created,
            ..
        }: Like,
    ) -> Self {
        LikeResponse {
            user: username,
            ad: ad_id,
            created: created.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}
