pub mod password;
pub mod session;

pub use session::{Session, SessionKeys};

use crate::models::{User, UserCredentials};

#[derive(thiserror::Error, Debug)]
pub enum LoginError {
    /// Same outcome for an unknown user and a wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Stored password hash is unusable")]
    Hash(#[from] argon2::password_hash::Error),
}

pub fn check_credentials(
    found: Option<UserCredentials>,
    password: &str,
) -> Result<User, LoginError> {
    let Some(credentials) = found else {
        return Err(LoginError::InvalidCredentials);
    };

    match password::verify_password(password, &credentials.password)? {
        true => Ok(credentials.into_user()),
        false => Err(LoginError::InvalidCredentials),
    }
}
