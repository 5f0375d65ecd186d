use maud::html;

use crate::{models::User, repository, State};

use super::{app_page, raw_app_page, Page, RouteError};

pub(crate) async fn profile(user: User) -> maud::Markup {
    raw_app_page(
        None,
        Some(&user),
        html! {
            .container-sm style="max-width: 32rem" {
                h2 .text-center."mb-3" { (format!("Profile for {}", user.username)) }
                dl .row {
                    dt ."col-sm-4" { "Username" }
                    dd ."col-sm-8" { (user.username) }
                    dt ."col-sm-4" { "Email" }
                    dd ."col-sm-8" { (user.email) }
                }
                a .btn.btn-outline-primary href="/user_notes" { "My notes and ratings" }
            }
        },
    )
}

pub(crate) async fn user_notes(state: State, user: User) -> Result<maud::Markup, RouteError> {
    let mut conn = state.connection().await?;
    let notes = repository::note::all_for_user(&mut conn, user.id).await?;
    let ratings = repository::rating::all_for_user(&mut conn, user.id).await?;

    Ok(app_page(
        Page::Notes,
        Some(&user),
        html! {
            .container {
                h2 { "Notes" }
                @if notes.is_empty() {
                    p .text-body-secondary { "You have not written any note yet." }
                }
                .list-group."mb-4" {
                    @for entry in &notes {
                        a .list-group-item.list-group-item-action
                            href=(format!("/comic/{}", entry.note.comic_id)) {
                            h6 ."mb-1" { (entry.comic.title) }
                            p ."mb-0" { (entry.note.note) }
                        }
                    }
                }
                h2 { "Ratings" }
                @if ratings.is_empty() {
                    p .text-body-secondary { "You have not rated any comic yet." }
                }
                ul .list-group {
                    @for entry in &ratings {
                        li .list-group-item.d-flex.justify-content-between {
                            a .link-body-emphasis href=(format!("/comic/{}", entry.rating.comic_id)) {
                                (entry.comic_title)
                            }
                            span .badge.text-bg-primary { (entry.rating.rating) " / 5" }
                        }
                    }
                }
            }
        },
    ))
}
