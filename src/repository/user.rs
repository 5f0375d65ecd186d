use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    models::{NewUser, User, UserCredentials},
    schema::users,
};

use super::RepoError;

pub async fn find_by_username(
    conn: &mut AsyncPgConnection,
    username: &str,
) -> Result<Option<UserCredentials>, RepoError> {
    Ok(users::table
        .filter(users::username.eq(username))
        .select(UserCredentials::as_select())
        .first(conn)
        .await
        .optional()?)
}

pub async fn get_by_id(conn: &mut AsyncPgConnection, id: i32) -> Result<Option<User>, RepoError> {
    Ok(users::table
        .find(id)
        .select(User::as_select())
        .first(conn)
        .await
        .optional()?)
}

/// A taken username surfaces as [`RepoError::Constraint`].
pub async fn create(conn: &mut AsyncPgConnection, user: NewUser<'_>) -> Result<User, RepoError> {
    let user = diesel::insert_into(users::table)
        .values(&user)
        .returning(User::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!("Registered user {} ({})", user.username, user.id);

    Ok(user)
}
