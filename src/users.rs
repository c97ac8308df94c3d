use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;

use crate::{
    entities::user,
    error::{AppError, AppResult},
};

const MAX_USERNAME_LEN: usize = 64;

pub async fn create(db: &DatabaseConnection, username: &str) -> AppResult<user::Model> {
    let username = username.trim();
    validate_username(username)?;

    if find(db, username).await?.is_some() {
        return Err(AppError::Conflict(format!("username '{username}' is taken")));
    }

    let model = user::ActiveModel { username: Set(username.to_string()), ..Default::default() }
        .insert(db)
        .await?;

    info!(user_id = model.id, username = %model.username, "created user");
    Ok(model)
}

pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> AppResult<user::Model> {
    find(db, username.trim())
        .await?
        .ok_or_else(|| AppError::not_found(format!("user '{}' not found", username.trim())))
}

async fn find(db: &DatabaseConnection, username: &str) -> AppResult<Option<user::Model>> {
    let user =
        user::Entity::find().filter(user::Column::Username.eq(username)).one(db).await?;
    Ok(user)
}

fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::bad_request("username is required"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(AppError::bad_request(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')) {
        return Err(AppError::bad_request(
            "username may only contain letters, digits, '_', '-' and '.'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.l-i_ce9").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("quote'").is_err());
        assert!(validate_username(&"x".repeat(65)).is_err());
    }
}
