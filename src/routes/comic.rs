use axum::{extract::Path, response::Redirect, Form};
use axum_extra::extract::WithRejection;
use maud::html;

use crate::{auth::Session, models::User, repository, State};

use super::{
    app_page,
    components::{cover_url, status_badge},
    Page, RouteError,
};

const COMIC_NOT_FOUND: &str = "Comic not found";

pub(crate) async fn comic_detail(
    state: State,
    session: Session,
    Path(id): Path<i32>,
) -> Result<maud::Markup, RouteError> {
    let mut conn = state.connection().await?;

    let comic = repository::comic::get_by_id(&mut conn, id)
        .await?
        .ok_or(RouteError::NotFound(COMIC_NOT_FOUND))?;

    let average = repository::rating::average_for(&mut conn, id).await?;

    let note = match session.user() {
        Some(user) => {
            repository::note::get_one_for_user_and_comic(&mut conn, user.id, id).await?
        }
        None => None,
    };

    Ok(app_page(
        Page::Catalog,
        session.user(),
        html! {
            .container {
                .row {
                    ."col-md-4".text-center."mb-3" {
                        img .img-fluid style="max-height: 28rem" src=(cover_url(&comic)) alt="cover art";
                    }
                    ."col-md-8" {
                        h2 { (comic.title) }
                        p .fs-4 { (comic.author) }
                        (status_badge(comic.status))
                        p ."mt-3" { (comic.short_description) }
                        hr;
                        dl .row {
                            dt ."col-sm-3" { "Artist" }
                            dd ."col-sm-9" { (comic.artist) }
                            dt ."col-sm-3" { "Publisher" }
                            dd ."col-sm-9" { (comic.publisher) }
                            @if let Some(volume) = comic.volume {
                                dt ."col-sm-3" { "Volume" }
                                dd ."col-sm-9" { (volume) }
                            }
                            @if let Some(year) = comic.year_published {
                                dt ."col-sm-3" { "Year published" }
                                dd ."col-sm-9" { (year) }
                            }
                            dt ."col-sm-3" { "Genre" }
                            dd ."col-sm-9" { (comic.genre) }
                            dt ."col-sm-3" { "Average rating" }
                            dd ."col-sm-9" {
                                @match average {
                                    Some(average) => { (format!("{average:.2}")) " / 5" },
                                    None => { "Not rated yet" },
                                }
                            }
                        }
                        @if session.user().is_some() {
                            hr;
                            form .row."g-2"."mb-3" method="POST" action=(format!("/add_rating/{id}")) {
                                .col-auto {
                                    select .form-select name="rating" aria-label="Rating" {
                                        @for value in 1..=5 {
                                            option value=(value) { (value) }
                                        }
                                    }
                                }
                                .col-auto {
                                    button .btn.btn-primary type="submit" { i .bi.bi-star.me-1 {} "Rate" }
                                }
                            }
                            @if let Some(note) = note {
                                .card."mb-3" {
                                    .card-header { "Your note" }
                                    .card-body { p .card-text { (note.note) } }
                                }
                            }
                            form method="POST" action=(format!("/add_note/{id}")) {
                                .form-floating."mb-2" {
                                    textarea .form-control #note name="note" placeholder="Note"
                                        style="height: 100px" {}
                                    label for="note" { "Add a note" }
                                }
                                button .btn.btn-secondary type="submit" { "Save note" }
                            }
                        }
                    }
                }
            }
        },
    ))
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct RatingForm {
    rating: i32,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct NoteForm {
    note: String,
}

fn missing_comic(e: repository::RepoError) -> RouteError {
    match e.is_foreign_key_violation() {
        true => RouteError::NotFound(COMIC_NOT_FOUND),
        false => e.into(),
    }
}

pub(crate) async fn add_rating(
    state: State,
    user: User,
    Path(id): Path<i32>,
    WithRejection(Form(form), _): WithRejection<Form<RatingForm>, RouteError>,
) -> Result<Redirect, RouteError> {
    let mut conn = state.connection().await?;

    repository::rating::create(&mut conn, user.id, id, form.rating)
        .await
        .map_err(missing_comic)?;

    Ok(Redirect::to(&format!("/comic/{id}")))
}

pub(crate) async fn add_note(
    state: State,
    user: User,
    Path(id): Path<i32>,
    WithRejection(Form(form), _): WithRejection<Form<NoteForm>, RouteError>,
) -> Result<Redirect, RouteError> {
    let mut conn = state.connection().await?;

    repository::note::create(&mut conn, user.id, id, &form.note)
        .await
        .map_err(missing_comic)?;

    Ok(Redirect::to(&format!("/comic/{id}")))
}
