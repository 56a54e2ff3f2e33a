//! # Query routing for RAG
//!
//! Everything that happens between a user question and the answer text.
//!
//! - [`QueryClassifier`] decides whether a question asks for images or text.
//! - The text path searches the text store, builds a grounding context and
//!   hands it to a [`TextGenerator`].
//! - The image path lists the collection's images and renders a summary with
//!   an HTML preview.
//! - [`gallery`] filters, sorts and pages stored images for listing.
//!
//! [`QueryRouter`] ties these together.

pub mod classifier;
pub mod context;
mod error;
pub mod gallery;
pub mod generation;
pub mod images;
mod router;

pub use classifier::{KeywordClassifier, QueryClassifier, QueryKind};
pub use context::{build_context, build_prompt};
pub use error::SearchError;
pub use gallery::{GalleryImage, ImagePage, ImageQuery, ImageSort};
pub use generation::{RigGenerator, TextGenerator};
pub use router::{QueryAnswer, QueryRouter};
