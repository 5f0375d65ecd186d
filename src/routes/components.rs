use maud::{html, Markup};

use crate::{
    forms::{ComicForm, FieldError, ALLOWED_EXTENSIONS},
    models::{Comic, ComicStatus},
    repository::comic::SortOrder,
};

pub fn cover_url(comic: &Comic) -> String {
    format!("/covers/{}", comic.cover_image)
}

pub fn status_badge(status: ComicStatus) -> Markup {
    let class = match status {
        ComicStatus::InStock => "text-bg-success",
        ComicStatus::LoanedOut => "text-bg-warning",
    };

    html! {
        span .badge.(class) { (status) }
    }
}

pub fn error_alerts<T: std::fmt::Display>(errors: &[T]) -> Markup {
    html! {
        @for error in errors {
            .alert.alert-danger role="alert" { (error) }
        }
    }
}

pub fn comic_cards(comics: &[Comic]) -> Markup {
    html! {
        .container {
            @if comics.is_empty() {
                p .text-center.text-body-secondary { "No comics match." }
            }
            .row.row-cols-auto.justify-content-center.justify-content-md-start {
                @for comic in comics {
                    ."col"."mb-2" {
                        .card."h-100" style="width: 9.6rem;" {
                            img src=(cover_url(comic)) .card-img-top alt="comic cover"
                                style="height: 14.4rem; width: 9.6rem;";
                            .card-body {
                                h6 .card-title {
                                    a .nav-link.fs-5 href=(format!("/comic/{}", comic.id)) {
                                        (comic.title)
                                    }
                                }
                                p .card-text {
                                    (comic.author)
                                    @if let Some(volume) = comic.volume {
                                        br;
                                        (format!("Vol. {volume}"))
                                    }
                                }
                            }
                            .card-footer.d-flex.justify-content-evenly {
                                (status_badge(comic.status))
                                @if let Some(year) = comic.year_published {
                                    span .text-body-secondary { (year) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub struct CatalogFilters<'a> {
    pub search: &'a str,
    pub sort: SortOrder,
    pub status: &'a str,
}

pub fn catalog_filters(filters: &CatalogFilters) -> Markup {
    let sorts = [
        (SortOrder::Title, "Title"),
        (SortOrder::Author, "Author"),
        (SortOrder::Year, "Newest first"),
    ];

    html! {
        form .container.row."g-2"."mb-3" method="GET" action="/index" {
            ."col-md-6" {
                input .form-control type="search" name="search" placeholder="Title, author or genre"
                    value=(filters.search);
            }
            ."col-md-2" {
                select .form-select name="sort" aria-label="Sort by" {
                    @for (sort, name) in sorts {
                        option value=(sort.param()) selected[sort == filters.sort] { (name) }
                    }
                }
            }
            ."col-md-3" {
                select .form-select name="status" aria-label="Status" {
                    option value="" selected[filters.status.is_empty()] { "Any status" }
                    @for status in ComicStatus::all() {
                        option value=(status.as_str()) selected[status.as_str() == filters.status] {
                            (status)
                        }
                    }
                }
            }
            ."col-md-1" {
                button .btn.btn-primary type="submit" { i .bi.bi-search {} }
            }
        }
    }
}

fn text_input(id: &str, label: &str, value: &str) -> Markup {
    html! {
        .form-floating."mb-2" {
            input .form-control required #(id) name=(id) type="text" placeholder=(label) value=(value);
            label for=(id) { (label) }
        }
    }
}

fn number_input(id: &str, label: &str, value: &str) -> Markup {
    html! {
        .form-floating."mb-2" {
            input .form-control #(id) name=(id) type="number" placeholder=(label) value=(value);
            label for=(id) { (label) }
        }
    }
}

pub fn comic_form(form: &ComicForm, errors: &[FieldError]) -> Markup {
    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");

    html! {
        (error_alerts(errors))
        form .container-sm.align-items-center method="POST" enctype="multipart/form-data" .mt-2 {
            (text_input("title", "Title", &form.title))
            (text_input("author", "Author", &form.author))
            (text_input("artist", "Artist", &form.artist))
            (text_input("publisher", "Publisher", &form.publisher))
            .row."g-2" {
                .col { (number_input("volume", "Volume", &form.volume)) }
                .col { (number_input("year_published", "Year published", &form.year_published)) }
            }
            (text_input("genre", "Genre", &form.genre))
            .form-floating."mb-2" {
                textarea .form-control required placeholder="Short description" #shortDescription
                    name="short_description" style="height: 150px" {
                    (form.short_description)
                }
                label for="shortDescription" { "Short description" }
            }
            ."mb-2" {
                label for="coverImage" .form-label { "Cover" }
                input .form-control required accept=(accept) type="file" name="cover_image" #coverImage;
            }
            .form-floating."mb-2" {
                select .form-select #status name="status" required {
                    @for status in ComicStatus::all() {
                        option value=(status.as_str()) selected[status.as_str() == form.status] {
                            (status)
                        }
                    }
                }
                label for="status" { "Status" }
            }
            input type="submit" .btn.btn-primary value="Add comic";
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn alerts_are_escaped() {
        let markup = error_alerts(&["<script>"]).into_string();
        assert!(markup.contains("&lt;script&gt;"));
        assert!(!markup.contains("<script>"));
    }

    #[test]
    fn form_keeps_submitted_values() {
        let mut form = ComicForm::default();
        form.set("title", "Gunnm".into());
        form.set("status", "Loaned Out".into());

        let markup = comic_form(&form, &[]).into_string();
        assert!(markup.contains(r#"value="Gunnm""#));
        assert!(markup.contains(r#"<option value="Loaned Out" selected>"#));
        assert!(markup.contains(r#"accept=".png,.jpg,.jpeg,.gif""#));
    }
}
