//! Submitted forms and their validation.

use std::fmt;

use validator::{Validate, ValidationErrors};

use crate::models::{ComicStatus, NewComic};

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

const REQUIRED: &str = "This field is required.";

/// A problem with one submitted field, shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub label: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in field {}: {}", self.label, self.message)
    }
}

/// Turns validator output into messages ordered as the fields appear in
/// `labels`, which maps field names to their labels.
pub fn field_errors(
    errors: &ValidationErrors,
    labels: &[(&'static str, &'static str)],
) -> Vec<FieldError> {
    let mut found = Vec::new();

    for (field, errors) in errors.field_errors() {
        let field: &str = field.as_ref();
        let (position, label) = labels
            .iter()
            .enumerate()
            .find(|(_, (name, _))| *name == field)
            .map(|(i, (_, label))| (i, *label))
            .unwrap_or((labels.len(), "Form"));

        for error in errors {
            let message = error
                .message
                .as_deref()
                .unwrap_or(REQUIRED)
                .to_string();
            found.push((position, FieldError { label, message }));
        }
    }

    found.sort_by_key(|(position, _)| *position);
    found.into_iter().map(|(_, error)| error).collect()
}

const COMIC_FIELDS: &[(&str, &str)] = &[
    ("title", "Title"),
    ("author", "Author"),
    ("artist", "Artist"),
    ("publisher", "Publisher"),
    ("volume", "Volume"),
    ("year_published", "Year published"),
    ("genre", "Genre"),
    ("short_description", "Short description"),
    ("cover_image", "Cover"),
    ("status", "Status"),
];

fn label_of(field: &str) -> &'static str {
    COMIC_FIELDS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, label)| *label)
        .unwrap_or("Form")
}

/// Raw text fields of the add comic form. Values are kept as submitted so the
/// form can be shown again after a failed validation.
#[derive(Validate, Default, Debug, Clone)]
pub struct ComicForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub title: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub author: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub artist: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub publisher: String,
    pub volume: String,
    pub year_published: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub genre: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub short_description: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub status: String,
}

impl ComicForm {
    /// Stores a submitted text field. Returns false for unknown names.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "title" => &mut self.title,
            "author" => &mut self.author,
            "artist" => &mut self.artist,
            "publisher" => &mut self.publisher,
            "volume" => &mut self.volume,
            "year_published" => &mut self.year_published,
            "genre" => &mut self.genre,
            "short_description" => &mut self.short_description,
            "status" => &mut self.status,
            _ => return false,
        };

        *slot = value.trim().to_string();
        true
    }
}

#[derive(Debug, Clone)]
pub struct CoverUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A submission that passed every check and can be stored.
#[derive(Debug)]
pub struct ComicSubmission {
    pub comic: NewComic,
    pub cover: Vec<u8>,
}

fn optional_int(field: &str, raw: &str) -> Result<Option<i32>, FieldError> {
    if raw.is_empty() {
        return Ok(None);
    }

    raw.parse().map(Some).map_err(|_| FieldError {
        label: label_of(field),
        message: "Not a valid integer value.".into(),
    })
}

/// Keeps ASCII letters, digits, `.`, `_` and `-`. Separators and whitespace
/// become `_`, leading and trailing dots or underscores are dropped.
pub fn secure_filename(name: &str) -> String {
    let name = name.replace(['/', '\\'], " ");
    let joined = name.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

pub fn allowed_file(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

fn sniffed_image(bytes: &[u8]) -> bool {
    matches!(
        image::guess_format(bytes),
        Ok(image::ImageFormat::Png | image::ImageFormat::Jpeg | image::ImageFormat::Gif)
    )
}

fn cover_error() -> FieldError {
    FieldError {
        label: label_of("cover_image"),
        message: format!(
            "A cover image is required ({}).",
            ALLOWED_EXTENSIONS.join(", ")
        ),
    }
}

/// Validates the fields first, then the cover. Nothing is written before this
/// succeeds.
pub fn prepare_submission(
    form: &ComicForm,
    cover: Option<CoverUpload>,
) -> Result<ComicSubmission, Vec<FieldError>> {
    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(e) => field_errors(&e, COMIC_FIELDS),
    };

    let volume = optional_int("volume", &form.volume).map_err(|e| errors.push(e));
    let year_published =
        optional_int("year_published", &form.year_published).map_err(|e| errors.push(e));

    let status = match form.status.is_empty() {
        true => None,
        false => match form.status.parse::<ComicStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                errors.push(FieldError {
                    label: label_of("status"),
                    message: "Not a valid choice.".into(),
                });
                None
            }
        },
    };

    let cover = cover.filter(|c| !c.file_name.is_empty());
    if cover.is_none() {
        errors.push(FieldError {
            label: label_of("cover_image"),
            message: REQUIRED.into(),
        });
    }

    errors.sort_by_key(|e| {
        COMIC_FIELDS
            .iter()
            .position(|(_, label)| *label == e.label)
            .unwrap_or(COMIC_FIELDS.len())
    });

    let (Ok(volume), Ok(year_published), Some(status), Some(cover), true) =
        (volume, year_published, status, cover, errors.is_empty())
    else {
        return Err(errors);
    };

    let file_name = secure_filename(&cover.file_name);
    if !allowed_file(&cover.file_name) || !allowed_file(&file_name) || !sniffed_image(&cover.bytes)
    {
        return Err(vec![cover_error()]);
    }

    Ok(ComicSubmission {
        comic: NewComic {
            title: form.title.clone(),
            author: form.author.clone(),
            artist: form.artist.clone(),
            publisher: form.publisher.clone(),
            volume,
            year_published,
            genre: form.genre.clone(),
            short_description: form.short_description.clone(),
            cover_image: file_name,
            status,
        },
        cover: cover.bytes,
    })
}

#[cfg(test)]
mod test {
    use expect_test::expect;

    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn filled() -> ComicForm {
        let mut form = ComicForm::default();
        for (name, value) in [
            ("title", "Akira"),
            ("author", "Katsuhiro Otomo"),
            ("artist", "Katsuhiro Otomo"),
            ("publisher", "Kodansha"),
            ("volume", "1"),
            ("year_published", " 1984 "),
            ("genre", "Cyberpunk"),
            ("short_description", "Neo-Tokyo, 2019."),
            ("status", "In Stock"),
        ] {
            assert!(form.set(name, value.into()));
        }
        form
    }

    fn cover(name: &str) -> Option<CoverUpload> {
        Some(CoverUpload {
            file_name: name.into(),
            bytes: PNG_MAGIC.to_vec(),
        })
    }

    fn messages(errors: &[FieldError]) -> String {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn complete_submission() {
        let submission = prepare_submission(&filled(), cover("akira vol 1.PNG")).unwrap();
        assert_eq!(submission.comic.cover_image, "akira_vol_1.PNG");
        assert_eq!(submission.comic.volume, Some(1));
        assert_eq!(submission.comic.year_published, Some(1984));
        assert_eq!(submission.comic.status, ComicStatus::InStock);
        assert_eq!(submission.cover, PNG_MAGIC);
    }

    #[test]
    fn optional_numbers_may_be_blank() {
        let mut form = filled();
        form.set("volume", "".into());
        form.set("year_published", "  ".into());

        let submission = prepare_submission(&form, cover("akira.png")).unwrap();
        assert_eq!(submission.comic.volume, None);
        assert_eq!(submission.comic.year_published, None);
    }

    #[test]
    fn every_problem_is_reported_in_form_order() {
        let mut form = ComicForm::default();
        form.set("volume", "first".into());
        form.set("status", "Lost".into());

        let errors = prepare_submission(&form, None).unwrap_err();
        expect![[r#"
            Error in field Title: This field is required.
            Error in field Author: This field is required.
            Error in field Artist: This field is required.
            Error in field Publisher: This field is required.
            Error in field Volume: Not a valid integer value.
            Error in field Genre: This field is required.
            Error in field Short description: This field is required.
            Error in field Cover: This field is required.
            Error in field Status: Not a valid choice."#]]
        .assert_eq(&messages(&errors));
    }

    #[test]
    fn executable_cover_is_rejected() {
        let errors = prepare_submission(&filled(), cover("x.exe")).unwrap_err();
        expect!["Error in field Cover: A cover image is required (png, jpg, jpeg, gif)."]
            .assert_eq(&messages(&errors));
    }

    #[test]
    fn cover_content_must_be_an_image() {
        let upload = Some(CoverUpload {
            file_name: "cover.gif".into(),
            bytes: b"MZ\x90\x00 definitely not a gif".to_vec(),
        });
        assert!(prepare_submission(&filled(), upload).is_err());
    }

    #[test]
    fn extension_lost_by_sanitizing_is_rejected() {
        // Only the non ASCII stem and the dot remain, leaving no extension
        assert_eq!(secure_filename("обложка.png"), "png");
        assert!(prepare_submission(&filled(), cover("обложка.png")).is_err());
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("My Cover (1).jpg"), "My_Cover_1.jpg");
        assert_eq!(secure_filename(".hidden.png"), "hidden.png");
        assert_eq!(secure_filename("C:\\covers\\a.gif"), "C_covers_a.gif");
    }

    #[test]
    fn allowed_extensions() {
        assert!(allowed_file("a.png"));
        assert!(allowed_file("a.JPEG"));
        assert!(allowed_file("a.tar.gif"));
        assert!(!allowed_file("png"));
        assert!(!allowed_file("a.exe"));
        assert!(!allowed_file("a.png.exe"));
    }
}
