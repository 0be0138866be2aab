use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[serde(default)]
    pub locations: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh: String,
}

// ----------------- Category Request -----------------
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

// ----------------- Ad Request -----------------
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct CreateAdRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 0))]
    pub price: i64,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Deserialize, Serialize, Debug, Default, Validate)]
#[serde(default)]
pub struct UpdateAdRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    /// `Some(None)` when the body sends `null`, which clears the column.
    #[serde(deserialize_with = "double_option")]
    #[validate(length(max = 1000))]
    pub description: Option<Option<String>>,
    pub is_published: Option<bool>,
    #[serde(deserialize_with = "double_option")]
    pub category: Option<Option<i64>>,
}

/// Keeps an explicit `null` apart from an absent field.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateAdRequest {
    /// A full update must name every required field; a partial one may omit any.
    pub fn check_complete(&self) -> Result<(), String> {
        let mut missing = vec![];
        if self.name.is_none() {
            missing.push("name");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("missing required fields: {}", missing.join(", ")))
        }
    }
}

// ----------------- Relation Request -----------------
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct LikeRequest {
    pub ad: i64,
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct CommentRequest {
    pub ad: i64,
    #[validate(length(min = 1, max = 300))]
    pub text: String,
}
