//! Figure-name extraction, alias normalization, and placeholder fallback.
//!
//! [`images_for_story`] is total: every story/category pair resolves to an
//! [`ImageSet`] with a portrait — a category-colored placeholder SVG when no
//! stored image matches.

use anyhow::Result;
use base64::Engine;
use rusqlite::Connection;

use crate::content::Category;
use crate::images::store;
use crate::images::types::{ImageLink, ImageSet, ImageType};
use crate::story::types::Story;

/// Short-name aliases mapped to canonical figure names.
const FIGURE_ALIASES: &[(&str, &str)] = &[
    ("Gutenberg", "Johannes Gutenberg"),
    ("Berners-Lee", "Tim Berners-Lee"),
    ("Einstein", "Albert Einstein"),
    ("Newton", "Isaac Newton"),
    ("Curie", "Marie Curie"),
    ("Da Vinci", "Leonardo da Vinci"),
    ("Van Gogh", "Vincent van Gogh"),
    ("Picasso", "Pablo Picasso"),
    ("Pele", "Pel\u{e9}"),
    ("Ali", "Muhammad Ali"),
    ("Mozart", "Wolfgang Amadeus Mozart"),
    ("Beethoven", "Ludwig van Beethoven"),
    ("Gagarin", "Yuri Gagarin"),
    ("Armstrong", "Neil Armstrong"),
];

/// Figure name for a story: the explicit field, else the headline text
/// before the first colon, else the whole headline.
pub fn extract_figure_name(story: &Story) -> Option<String> {
    if let Some(figure) = &story.figure {
        if !figure.is_empty() {
            return Some(figure.clone());
        }
    }

    let headline = story.headline.trim();
    if headline.is_empty() {
        return None;
    }
    match headline.find(':') {
        Some(idx) if idx > 0 => Some(headline[..idx].trim().to_string()),
        _ => Some(headline.to_string()),
    }
}

/// Map a short alias ("Einstein") to its canonical name ("Albert Einstein").
///
/// Idempotent: canonical names map to themselves, unknown names pass through
/// unchanged apart from trimming.
pub fn normalize_figure(name: &str) -> String {
    let trimmed = name.trim();
    FIGURE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == trimmed)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Resolve the image set for a story: stored figure images, else the
/// category placeholder. Never returns an absent result.
pub fn images_for_story(conn: &Connection, story: &Story, category: Category) -> Result<ImageSet> {
    let Some(raw_name) = extract_figure_name(story) else {
        return Ok(placeholder_set(None, category));
    };

    let figure = normalize_figure(&raw_name);
    let records = store::images_for_figure(conn, &figure)?;

    let Some(portrait) = records
        .iter()
        .find(|r| r.image_type == ImageType::Portrait)
    else {
        return Ok(placeholder_set(Some(figure), category));
    };

    let gallery = records
        .iter()
        .filter(|r| r.image_type == ImageType::Gallery)
        .map(ImageLink::from)
        .collect();

    Ok(ImageSet {
        figure: Some(figure),
        portrait: ImageLink::from(portrait),
        gallery,
        placeholder: false,
    })
}

fn placeholder_set(figure: Option<String>, category: Category) -> ImageSet {
    ImageSet {
        figure,
        portrait: ImageLink {
            url: placeholder_data_url(category),
            source: None,
            licensing: None,
            permalink: None,
        },
        gallery: Vec::new(),
        placeholder: true,
    }
}

/// Fill color for a category's placeholder card.
fn category_color(category: Category) -> &'static str {
    match category {
        Category::Technology => "#42c3f7",
        Category::Science => "#1a73a8",
        Category::Art => "#f393f3",
        Category::Nature => "#42c383",
        Category::Sports => "#4caf50",
        Category::Music => "#f573a0",
        Category::Space => "#343a40",
        Category::Innovation => "#ff9800",
        Category::Health => "#e05353",
        Category::Education => "#7e57c2",
    }
}

/// A 300x400 SVG card with the category name, as a base64 data URL.
pub fn placeholder_data_url(category: Category) -> String {
    let svg = format!(
        r##"<svg width="300" height="400" xmlns="http://www.w3.org/2000/svg"><rect width="300" height="400" fill="{}"/><text x="150" y="200" font-family="Arial" font-size="16" fill="#fff" text-anchor="middle">{}</text></svg>"##,
        category_color(category),
        category.as_str(),
    );
    format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(svg)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Epoch, Language};
    use crate::db;
    use crate::images::types::ImageRecord;

    fn story(figure: Option<&str>, headline: &str) -> Story {
        let now = chrono::Utc::now().to_rfc3339();
        Story {
            id: uuid::Uuid::now_v7().to_string(),
            category: Category::Science,
            epoch: Epoch::Modern,
            language: Language::En,
            headline: headline.into(),
            summary: "s".into(),
            full_text: "f".into(),
            source: "test".into(),
            figure: figure.map(String::from),
            published_at: now.clone(),
            created_at: now,
            last_used: None,
            use_count: 0,
            has_audio: false,
        }
    }

    #[test]
    fn explicit_figure_field_wins() {
        let s = story(Some("Marie Curie"), "Radium: a new era");
        assert_eq!(extract_figure_name(&s).as_deref(), Some("Marie Curie"));
    }

    #[test]
    fn headline_before_colon_is_fallback() {
        let s = story(None, "Albert Einstein: relativity reshapes physics");
        assert_eq!(extract_figure_name(&s).as_deref(), Some("Albert Einstein"));
    }

    #[test]
    fn headline_without_colon_is_used_whole() {
        let s = story(None, "A bright day for science");
        assert_eq!(
            extract_figure_name(&s).as_deref(),
            Some("A bright day for science")
        );
    }

    #[test]
    fn empty_story_yields_no_name() {
        let s = story(None, "");
        assert!(extract_figure_name(&s).is_none());
    }

    #[test]
    fn normalize_maps_aliases() {
        assert_eq!(normalize_figure("Einstein"), "Albert Einstein");
        assert_eq!(normalize_figure("  Curie  "), "Marie Curie");
        assert_eq!(normalize_figure("Van Gogh"), "Vincent van Gogh");
    }

    #[test]
    fn normalize_is_idempotent() {
        for (alias, canonical) in FIGURE_ALIASES {
            assert_eq!(normalize_figure(canonical), *canonical);
            assert_eq!(
                normalize_figure(&normalize_figure(alias)),
                normalize_figure(alias)
            );
        }
        // Unknown names pass through and stay fixed
        assert_eq!(normalize_figure("Hypatia"), "Hypatia");
        assert_eq!(normalize_figure(&normalize_figure("Hypatia")), "Hypatia");
    }

    #[test]
    fn resolves_stored_images() {
        let conn = db::open_memory_database().unwrap();
        store::insert_image(
            &conn,
            &ImageRecord {
                id: String::new(),
                figure: "Einstein".into(),
                category: Category::Science,
                epoch: Epoch::Modern,
                image_type: ImageType::Portrait,
                url: "https://img.example/einstein.jpg".into(),
                source: Some("Wikimedia Commons".into()),
                licensing: None,
                permalink: None,
                created_at: String::new(),
            },
        )
        .unwrap();

        let s = story(Some("Einstein"), "Albert Einstein: relativity");
        let set = images_for_story(&conn, &s, Category::Science).unwrap();
        assert!(!set.placeholder);
        assert_eq!(set.figure.as_deref(), Some("Albert Einstein"));
        assert_eq!(set.portrait.url, "https://img.example/einstein.jpg");
        assert!(set.gallery.is_empty());
    }

    #[test]
    fn unknown_figure_gets_placeholder() {
        let conn = db::open_memory_database().unwrap();
        let s = story(Some("Hypatia"), "Hypatia: mathematics in Alexandria");
        let set = images_for_story(&conn, &s, Category::Science).unwrap();
        assert!(set.placeholder);
        assert!(set.portrait.url.starts_with("data:image/svg+xml;base64,"));
        assert!(set.gallery.is_empty());
    }

    #[test]
    fn figureless_story_gets_placeholder() {
        let conn = db::open_memory_database().unwrap();
        let s = story(None, "");
        let set = images_for_story(&conn, &s, Category::Nature).unwrap();
        assert!(set.placeholder);
        assert!(set.figure.is_none());
    }

    #[test]
    fn placeholder_embeds_category_name() {
        let url = placeholder_data_url(Category::Music);
        let b64 = url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let svg = base64::engine::general_purpose::STANDARD.decode(b64).unwrap();
        let svg = String::from_utf8(svg).unwrap();
        assert!(svg.contains(">Music<"));
        assert!(svg.contains("#f573a0"));
    }
}
