//! Image metadata types.

use serde::{Deserialize, Serialize};

use crate::content::{Category, Epoch};

/// Portrait or gallery classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Portrait,
    Gallery,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Gallery => "gallery",
        }
    }
}

impl std::str::FromStr for ImageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "portrait" => Ok(Self::Portrait),
            "gallery" => Ok(Self::Gallery),
            _ => Err(format!("unknown image type: {s}")),
        }
    }
}

/// A stored image metadata row (no binary data, only references).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(default)]
    pub id: String,
    pub figure: String,
    pub category: Category,
    pub epoch: Epoch,
    #[serde(rename = "imageType")]
    pub image_type: ImageType,
    pub url: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub licensing: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// One resolvable image reference in an [`ImageSet`].
#[derive(Debug, Clone, Serialize)]
pub struct ImageLink {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licensing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
}

/// The images resolved for one story. Always has a portrait — a category
/// placeholder when no figure-specific image exists.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure: Option<String>,
    pub portrait: ImageLink,
    pub gallery: Vec<ImageLink>,
    /// True when the portrait is a category placeholder, not a real image.
    pub placeholder: bool,
}

impl From<&ImageRecord> for ImageLink {
    fn from(record: &ImageRecord) -> Self {
        Self {
            url: record.url.clone(),
            source: record.source.clone(),
            licensing: record.licensing.clone(),
            permalink: record.permalink.clone(),
        }
    }
}
