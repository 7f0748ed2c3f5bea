//! Image metadata persistence and JSON import.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::images::resolve::normalize_figure;
use crate::images::types::{ImageRecord, ImageType};

/// Upsert one image record, normalizing the figure name first.
pub fn insert_image(conn: &Connection, record: &ImageRecord) -> Result<()> {
    let id = if record.id.is_empty() {
        uuid::Uuid::now_v7().to_string()
    } else {
        record.id.clone()
    };
    let created_at = if record.created_at.is_empty() {
        chrono::Utc::now().to_rfc3339()
    } else {
        record.created_at.clone()
    };

    conn.execute(
        "INSERT OR REPLACE INTO figure_images \
         (id, figure, category, epoch, image_type, url, source, licensing, permalink, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            normalize_figure(&record.figure),
            record.category.as_str(),
            record.epoch.as_str(),
            record.image_type.as_str(),
            record.url,
            record.source,
            record.licensing,
            record.permalink,
            created_at,
        ],
    )?;
    Ok(())
}

/// All image records for a normalized figure name, portraits first.
pub fn images_for_figure(conn: &Connection, figure: &str) -> Result<Vec<ImageRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, figure, category, epoch, image_type, url, source, licensing, permalink, created_at \
         FROM figure_images WHERE figure = ?1 \
         ORDER BY (image_type != 'portrait'), created_at",
    )?;
    let records = stmt
        .query_map(params![figure], |row| {
            let category: String = row.get(2)?;
            let epoch: String = row.get(3)?;
            let image_type: String = row.get(4)?;
            Ok(ImageRecord {
                id: row.get(0)?,
                figure: row.get(1)?,
                category: category.parse().map_err(conversion_err(2))?,
                epoch: epoch.parse().map_err(conversion_err(3))?,
                image_type: image_type.parse().map_err(conversion_err(4))?,
                url: row.get(5)?,
                source: row.get(6)?,
                licensing: row.get(7)?,
                permalink: row.get(8)?,
                created_at: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

fn conversion_err(idx: usize) -> impl Fn(String) -> rusqlite::Error {
    move |e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    }
}

/// Import image records from a JSON array. Returns how many were stored.
pub fn import_images_json(conn: &Connection, json: &str) -> Result<usize> {
    let records: Vec<ImageRecord> =
        serde_json::from_str(json).context("failed to parse image JSON")?;
    for record in &records {
        insert_image(conn, record)?;
    }
    Ok(records.len())
}

/// Image store statistics.
#[derive(Debug, serde::Serialize)]
pub struct ImageStats {
    pub total_images: usize,
    pub figures: usize,
    pub portraits: usize,
    pub galleries: usize,
}

pub fn image_stats(conn: &Connection) -> Result<ImageStats> {
    let total_images: i64 =
        conn.query_row("SELECT COUNT(*) FROM figure_images", [], |row| row.get(0))?;
    let figures: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT figure) FROM figure_images",
        [],
        |row| row.get(0),
    )?;
    let portraits: i64 = conn.query_row(
        "SELECT COUNT(*) FROM figure_images WHERE image_type = 'portrait'",
        [],
        |row| row.get(0),
    )?;
    Ok(ImageStats {
        total_images: total_images as usize,
        figures: figures as usize,
        portraits: portraits as usize,
        galleries: (total_images - portraits) as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Category, Epoch};
    use crate::db;

    fn record(figure: &str, image_type: ImageType) -> ImageRecord {
        ImageRecord {
            id: String::new(),
            figure: figure.into(),
            category: Category::Science,
            epoch: Epoch::Modern,
            image_type,
            url: format!("https://img.example/{figure}.jpg"),
            source: Some("Wikimedia Commons".into()),
            licensing: Some("Public Domain".into()),
            permalink: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn insert_normalizes_figure_name() {
        let conn = db::open_memory_database().unwrap();
        insert_image(&conn, &record("Einstein", ImageType::Portrait)).unwrap();

        // Lookup under the canonical name succeeds
        let found = images_for_figure(&conn, "Albert Einstein").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].figure, "Albert Einstein");
    }

    #[test]
    fn portraits_sort_before_gallery() {
        let conn = db::open_memory_database().unwrap();
        insert_image(&conn, &record("Marie Curie", ImageType::Gallery)).unwrap();
        let mut portrait = record("Marie Curie", ImageType::Portrait);
        portrait.url = "https://img.example/curie-portrait.jpg".into();
        insert_image(&conn, &portrait).unwrap();

        let found = images_for_figure(&conn, "Marie Curie").unwrap();
        assert_eq!(found[0].image_type, ImageType::Portrait);
    }

    #[test]
    fn import_json_counts_records() {
        let conn = db::open_memory_database().unwrap();
        let json = r#"[
            {"figure": "Archimedes", "category": "Science", "epoch": "Ancient",
             "imageType": "portrait", "url": "https://img.example/archimedes.jpg",
             "source": "Wikimedia Commons", "licensing": "Public Domain"},
            {"figure": "Archimedes", "category": "Science", "epoch": "Ancient",
             "imageType": "gallery", "url": "https://img.example/archimedes-2.jpg"}
        ]"#;
        let imported = import_images_json(&conn, json).unwrap();
        assert_eq!(imported, 2);

        let stats = image_stats(&conn).unwrap();
        assert_eq!(stats.total_images, 2);
        assert_eq!(stats.figures, 1);
        assert_eq!(stats.portraits, 1);
        assert_eq!(stats.galleries, 1);
    }

    #[test]
    fn import_rejects_bad_json() {
        let conn = db::open_memory_database().unwrap();
        assert!(import_images_json(&conn, "not json").is_err());
    }
}
