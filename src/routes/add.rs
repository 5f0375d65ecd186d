use axum::{
    extract::Multipart,
    response::{IntoResponse, Redirect, Response},
};
use maud::html;

use crate::{
    forms::{prepare_submission, ComicForm, ComicSubmission, CoverUpload, FieldError},
    models::{Comic, User},
    repository, AppState, State,
};

use super::{app_page, components::comic_form, Page, RouteError};

fn add_page(user: &User, form: &ComicForm, errors: &[FieldError]) -> maud::Markup {
    app_page(
        Page::AddComic,
        Some(user),
        html! {
            .container.text-center {
                h2 { "Add a comic or manga" }
            }
            (comic_form(form, errors))
        },
    )
}

pub(crate) async fn add_comic(user: User) -> maud::Markup {
    add_page(&user, &ComicForm::default(), &[])
}

async fn read_submission(
    mut multipart: Multipart,
) -> Result<(ComicForm, Option<CoverUpload>), RouteError> {
    let mut form = ComicForm::default();
    let mut cover = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "cover_image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            cover = Some(CoverUpload {
                file_name,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field.text().await?;
            if !form.set(&name, value) {
                tracing::debug!("Ignoring unknown field '{name}'");
            }
        }
    }

    Ok((form, cover))
}

/// Writes the cover then inserts the row. A cover written for a row that could
/// not be inserted is removed again, unless it replaced an existing file.
async fn store_comic(state: &AppState, submission: &ComicSubmission) -> Result<Comic, RouteError> {
    let cover_dir = &state.config.uploads.dir;
    tokio::fs::create_dir_all(cover_dir)
        .await
        .map_err(RouteError::CoverSave)?;

    // An existing cover with the same name is replaced
    let cover_path = cover_dir.join(&submission.comic.cover_image);
    let replaced = tokio::fs::try_exists(&cover_path)
        .await
        .map_err(RouteError::CoverSave)?;
    tokio::fs::write(&cover_path, &submission.cover)
        .await
        .map_err(RouteError::CoverSave)?;

    let created = match state.connection().await {
        Ok(mut conn) => repository::comic::create(&mut conn, &submission.comic).await,
        Err(e) => Err(e),
    };

    match created {
        Ok(comic) => Ok(comic),
        Err(e) => {
            if !replaced {
                if let Err(remove) = tokio::fs::remove_file(&cover_path).await {
                    tracing::warn!("Could not remove orphan cover {cover_path:?}: {remove}");
                }
            }
            Err(e.into())
        }
    }
}

pub(crate) async fn do_add_comic(
    state: State,
    user: User,
    multipart: Multipart,
) -> Result<Response, RouteError> {
    let (form, cover) = read_submission(multipart).await?;

    let submission = match prepare_submission(&form, cover) {
        Ok(submission) => submission,
        Err(errors) => {
            tracing::debug!("Rejected comic submission: {errors:?}");
            return Ok(add_page(&user, &form, &errors).into_response());
        }
    };

    let comic = store_comic(&state, &submission).await?;

    tracing::info!("{} added comic {}", user.username, comic.id);

    Ok(Redirect::to("/index").into_response())
}
