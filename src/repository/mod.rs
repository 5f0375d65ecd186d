//! Data access for the catalog.
//!
//! Every operation borrows a connection from the caller for the duration of a
//! single statement. Lookups report absent rows as `Ok(None)`, failures are
//! returned as a [`RepoError`] and left for the route layer to present.

use std::fmt;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::deadpool::PoolError;

pub mod comic;
pub mod note;
pub mod rating;
pub mod user;

#[cfg(test)]
pub(crate) mod test_db;

/// Which integrity constraint a statement violated.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Check => "check",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("Could not get a connection from the pool")]
    Connection(#[from] PoolError),
    #[error("Constraint violation: {kind}: {message}")]
    Constraint {
        kind: ConstraintKind,
        message: String,
    },
    #[error("Row not found")]
    NotFound,
    #[error("Database error")]
    Query(#[source] DieselError),
}

impl RepoError {
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            RepoError::Constraint {
                kind: ConstraintKind::ForeignKey,
                ..
            }
        )
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            RepoError::Constraint {
                kind: ConstraintKind::Unique,
                ..
            }
        )
    }
}

impl From<DieselError> for RepoError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => RepoError::NotFound,
            DieselError::DatabaseError(kind, info) => {
                let kind = match kind {
                    DatabaseErrorKind::UniqueViolation => ConstraintKind::Unique,
                    DatabaseErrorKind::ForeignKeyViolation => ConstraintKind::ForeignKey,
                    DatabaseErrorKind::NotNullViolation => ConstraintKind::NotNull,
                    DatabaseErrorKind::CheckViolation => ConstraintKind::Check,
                    _ => return RepoError::Query(DieselError::DatabaseError(kind, info)),
                };

                RepoError::Constraint {
                    kind,
                    message: match info.constraint_name() {
                        Some(name) => format!("{} ({name})", info.message()),
                        None => info.message().to_string(),
                    },
                }
            }
            e => RepoError::Query(e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn not_found_is_its_own_kind() {
        assert!(matches!(
            RepoError::from(DieselError::NotFound),
            RepoError::NotFound
        ));
    }

    #[test]
    fn constraint_violations_are_classified() {
        let err = RepoError::from(DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new(String::from("insert or update violates foreign key")),
        ));
        assert!(err.is_foreign_key_violation());
        assert!(!err.is_unique_violation());

        let err = RepoError::from(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("duplicate key value")),
        ));
        expect_test::expect!["Constraint violation: unique: duplicate key value"]
            .assert_eq(&err.to_string());
        assert!(!err.is_foreign_key_violation());
        assert!(err.is_unique_violation());
    }

    #[test]
    fn classification_ignores_the_message_text() {
        let err = RepoError::from(DieselError::DatabaseError(
            DatabaseErrorKind::CheckViolation,
            Box::new(String::from("foreign key lookalike")),
        ));
        assert!(matches!(
            err,
            RepoError::Constraint {
                kind: ConstraintKind::Check,
                ..
            }
        ));
        assert!(!err.is_foreign_key_violation());
    }

    #[test]
    fn other_database_errors_are_query_errors() {
        let err = RepoError::from(DieselError::DatabaseError(
            DatabaseErrorKind::SerializationFailure,
            Box::new(String::from("could not serialize access")),
        ));
        assert!(matches!(err, RepoError::Query(_)));
    }
}
