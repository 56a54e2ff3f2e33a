//! Image listing with filtering, sorting and pagination

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::index::StoredImage;
use crate::search::error::SearchError;
use crate::search::images::{categorize, dimensions};

/// Default page size
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: usize = 100;

/// Sort order for image listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSort {
    /// Most recently written first
    #[default]
    Newest,
    Oldest,
    /// Largest record first
    SizeDesc,
    SizeAsc,
    /// Alt text, case-insensitive
    Alpha,
}

impl FromStr for ImageSort {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(ImageSort::Newest),
            "oldest" => Ok(ImageSort::Oldest),
            "size_desc" => Ok(ImageSort::SizeDesc),
            "size_asc" => Ok(ImageSort::SizeAsc),
            "alpha" => Ok(ImageSort::Alpha),
            other => Err(SearchError::InvalidParameters(format!(
                "Unknown sort key '{}', expected newest, oldest, size_desc, size_asc or alpha",
                other
            ))),
        }
    }
}

/// Parameters of an image listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageQuery {
    /// 1-based page number
    pub page: usize,

    /// Page size, 1 to [`MAX_PAGE_SIZE`]
    pub limit: usize,

    /// Keep images whose alt text contains this, case-insensitively
    pub search: Option<String>,

    /// Keep images of this category; `all` keeps everything
    pub category: Option<String>,

    pub sort: ImageSort,
}

impl Default for ImageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            category: None,
            sort: ImageSort::Newest,
        }
    }
}

impl ImageQuery {
    /// Check page and limit bounds
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.page == 0 {
            return Err(SearchError::InvalidParameters(
                "page must be at least 1".to_string(),
            ));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Err(SearchError::InvalidParameters(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }
}

/// One image as listed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub url: String,
    pub alt: String,
    pub title: String,
    pub page_url: String,
    pub dimensions: String,
    pub category: String,
    pub indexed_at: f64,

    /// Byte size of the image record
    pub size: usize,
}

impl From<&StoredImage> for GalleryImage {
    fn from(stored: &StoredImage) -> Self {
        let image = &stored.image;
        Self {
            url: image.src.clone(),
            alt: image.alt.clone(),
            title: image.title.clone(),
            page_url: stored.page_url.clone(),
            dimensions: dimensions(&image.width, &image.height),
            category: categorize(&image.alt).to_string(),
            indexed_at: stored.indexed_at,
            size: image.src.len()
                + image.alt.len()
                + image.title.len()
                + image.width.len()
                + image.height.len(),
        }
    }
}

/// A page of listed images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePage {
    pub collection_name: String,
    pub images: Vec<GalleryImage>,

    /// Number of images matching the filters, across all pages
    pub count: usize,
}

/// Filter, sort and page `images`
pub fn list_images(
    collection: &str,
    images: &[StoredImage],
    query: &ImageQuery,
) -> Result<ImagePage, SearchError> {
    query.validate()?;

    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase);
    let category = query
        .category
        .as_deref()
        .filter(|category| !category.is_empty() && *category != "all");

    let mut listed: Vec<GalleryImage> = images
        .iter()
        .map(GalleryImage::from)
        .filter(|image| {
            search
                .as_ref()
                .is_none_or(|term| image.alt.to_lowercase().contains(term.as_str()))
        })
        .filter(|image| category.is_none_or(|category| image.category == category))
        .collect();

    // Stable sorts keep write order among equal keys
    match query.sort {
        ImageSort::Newest => listed.sort_by(|a, b| b.indexed_at.total_cmp(&a.indexed_at)),
        ImageSort::Oldest => listed.sort_by(|a, b| a.indexed_at.total_cmp(&b.indexed_at)),
        ImageSort::SizeDesc => listed.sort_by(|a, b| b.size.cmp(&a.size)),
        ImageSort::SizeAsc => listed.sort_by_key(|image| image.size),
        ImageSort::Alpha => listed.sort_by_cached_key(|image| image.alt.to_lowercase()),
    }

    let count = listed.len();
    let images = listed
        .into_iter()
        .skip(query.page.saturating_sub(1).saturating_mul(query.limit))
        .take(query.limit)
        .collect();

    Ok(ImagePage {
        collection_name: collection.to_string(),
        images,
        count,
    })
}

/// Distinct categories present in `images`, sorted
pub fn categories(images: &[StoredImage]) -> Vec<String> {
    images
        .iter()
        .map(|stored| categorize(&stored.image.alt))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
