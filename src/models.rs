use std::{fmt, str::FromStr};

use diesel::{
    backend::Backend,
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, ToSql},
    sql_types::Text,
};

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
}

/// The authenticated principal. Never carries the password hash.
#[derive(Queryable, Selectable, Clone, PartialEq, Eq, Debug)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserCredentials {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl UserCredentials {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Unknown comic status '{0}'")]
pub struct UnknownStatus(pub String);

#[derive(AsExpression, FromSqlRow, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[diesel(sql_type = Text)]
pub enum ComicStatus {
    InStock,
    LoanedOut,
}

impl ComicStatus {
    pub fn all() -> &'static [Self] {
        &[Self::InStock, Self::LoanedOut]
    }

    /// Value stored in the database and submitted by forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComicStatus::InStock => "In Stock",
            ComicStatus::LoanedOut => "Loaned Out",
        }
    }
}

impl fmt::Display for ComicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComicStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl<DB> ToSql<Text, DB> for ComicStatus
where
    DB: Backend,
    str: ToSql<Text, DB>,
{
    fn to_sql<'b>(&'b self, out: &mut serialize::Output<'b, '_, DB>) -> serialize::Result {
        <str as ToSql<Text, DB>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Pg> for ComicStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(value.parse()?)
    }
}

#[derive(Queryable, Selectable, Clone, PartialEq, Debug)]
#[diesel(table_name = crate::schema::comics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comic {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub artist: String,
    pub publisher: String,
    pub volume: Option<i32>,
    pub year_published: Option<i32>,
    pub genre: String,
    pub short_description: String,
    pub cover_image: String,
    pub status: ComicStatus,
}

#[derive(Insertable, Clone, PartialEq, Debug)]
#[diesel(table_name = crate::schema::comics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewComic {
    pub title: String,
    pub author: String,
    pub artist: String,
    pub publisher: String,
    pub volume: Option<i32>,
    pub year_published: Option<i32>,
    pub genre: String,
    pub short_description: String,
    pub cover_image: String,
    pub status: ComicStatus,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Rating {
    pub comic_id: i32,
    pub rating: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRating {
    pub user_id: i32,
    pub comic_id: i32,
    pub rating: i32,
}

/// A rating row together with the title of the rated comic.
#[derive(Debug)]
pub struct TitledRating {
    pub rating: Rating,
    pub comic_title: String,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::notes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Note {
    pub comic_id: i32,
    pub note: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::notes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewNote<'a> {
    pub user_id: i32,
    pub comic_id: i32,
    pub note: &'a str,
}

#[derive(Debug)]
pub struct NoteWithComic {
    pub note: Note,
    pub comic: Comic,
}
