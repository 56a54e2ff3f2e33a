//! Image-path answers: a text summary plus an HTML preview grid

use std::fmt::Write as _;

use crate::index::StoredImage;

/// Keywords used to describe and categorize images by their alt text
pub const IMAGE_CATEGORIES: [&str; 8] = [
    "logo",
    "banner",
    "product",
    "icon",
    "photo",
    "thumbnail",
    "chart",
    "graph",
];

/// Category of images whose alt text matches no keyword
pub const OTHER_CATEGORY: &str = "other";

/// Number of images shown in the preview grid
pub const PREVIEW_LIMIT: usize = 6;

/// First category keyword found in `alt`, else [`OTHER_CATEGORY`]
pub fn categorize(alt: &str) -> &'static str {
    let alt = alt.to_lowercase();
    IMAGE_CATEGORIES
        .iter()
        .find(|keyword| alt.contains(*keyword))
        .copied()
        .unwrap_or(OTHER_CATEGORY)
}

/// `{width}x{height}`, with `unknown` standing in for a missing side
pub fn dimensions(width: &str, height: &str) -> String {
    let side = |value: &str| {
        if value.trim().is_empty() {
            "unknown".to_string()
        } else {
            value.trim().to_string()
        }
    };
    format!("{}x{}", side(width), side(height))
}

/// Counts of category keywords over all alt texts, in order of first appearance
///
/// One image counts once for every keyword its alt text contains.
pub fn keyword_breakdown(images: &[StoredImage]) -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for image in images {
        let alt = image.image.alt.to_lowercase();
        for keyword in IMAGE_CATEGORIES {
            if !alt.contains(keyword) {
                continue;
            }
            match counts.iter_mut().find(|(k, _)| *k == keyword) {
                Some((_, count)) => *count += 1,
                None => counts.push((keyword, 1)),
            }
        }
    }
    counts
}

/// Message for a collection with no images
pub fn no_images_message(collection: &str) -> String {
    format!("I couldn't find any images in the collection '{}'.", collection)
}

/// Full image-path answer for a non-empty image list
pub fn image_answer(collection: &str, images: &[StoredImage], base_url: &str) -> String {
    if images.is_empty() {
        return no_images_message(collection);
    }

    let mut answer = format!(
        "I found {} images in the collection '{}'.",
        images.len(),
        collection
    );

    let breakdown = keyword_breakdown(images);
    if !breakdown.is_empty() {
        let parts: Vec<String> = breakdown
            .iter()
            .map(|(keyword, count)| format!("{} {}s", count, keyword))
            .collect();
        let _ = write!(answer, " These include {}.", parts.join(", "));
    }

    answer.push_str("\n\n");
    answer.push_str(&preview_html(collection, images, base_url));
    let _ = write!(
        answer,
        "\n\nYou can view all images at {}/images/{} or download them directly from the preview above.",
        base_url, collection
    );
    answer
}

/// HTML grid with the first [`PREVIEW_LIMIT`] images
pub fn preview_html(collection: &str, images: &[StoredImage], base_url: &str) -> String {
    let mut html = String::new();
    let _ = writeln!(html, r#"<div style="margin-top: 20px; margin-bottom: 20px;">"#);
    let _ = writeln!(
        html,
        r#"<h3 style="margin-bottom: 10px;">Images from {} ({} found)</h3>"#,
        escape_html(collection),
        images.len()
    );
    let _ = writeln!(
        html,
        r#"<div style="display: grid; grid-template-columns: repeat(3, 1fr); gap: 10px;">"#
    );

    for stored in images.iter().take(PREVIEW_LIMIT) {
        let src = escape_html(&stored.image.src);
        let alt = if stored.image.alt.is_empty() {
            "Image".to_string()
        } else {
            escape_html(&stored.image.alt)
        };
        let page_url = escape_html(&stored.page_url);
        let size = dimensions(&stored.image.width, &stored.image.height);

        let _ = writeln!(
            html,
            r#"<div style="border: 1px solid #ddd; border-radius: 8px; overflow: hidden;">"#
        );
        let _ = writeln!(
            html,
            r#"<div style="height: 120px; overflow: hidden; background-color: #f0f0f0;"><img src="{src}" alt="{alt}" style="width: 100%; height: 100%; object-fit: cover;"></div>"#
        );
        let _ = writeln!(html, r#"<div style="padding: 8px; font-size: 12px;">"#);
        let _ = writeln!(
            html,
            r#"<p style="margin: 0; font-weight: bold; overflow: hidden; text-overflow: ellipsis;">{alt}</p>"#
        );
        let _ = writeln!(
            html,
            r#"<p style="margin: 0; color: #777; font-size: 10px;">{size}</p>"#
        );
        let _ = writeln!(
            html,
            r#"<div style="display: flex; justify-content: space-between; margin-top: 5px;"><a href="{src}" target="_blank">Download</a> <a href="{page_url}" target="_blank">Source</a></div>"#
        );
        let _ = writeln!(html, "</div>\n</div>");
    }
    let _ = writeln!(html, "</div>");

    if images.len() > PREVIEW_LIMIT {
        let _ = writeln!(
            html,
            r#"<div style="margin-top: 10px; text-align: center;"><a href="{}/images/{}" target="_blank">View all {} images</a></div>"#,
            base_url,
            escape_html(collection),
            images.len()
        );
    }
    html.push_str("</div>");
    html
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
