//! Stock-photo stage

use async_trait::async_trait;
use std::sync::Arc;

use super::{RawCandidate, RetrievalStrategy};
use crate::backends::{StockPhoto, StockPhotoSearch};
use crate::error::Result;
use crate::extract::host_of;
use crate::types::{Candidate, CandidateOrigin, RetrievalStage, SearchIntent};

/// Keyword search against the stock-photo provider; only runs when a
/// credential is configured.
pub struct StockPhotoStrategy {
    backend: Arc<dyn StockPhotoSearch>,
}

impl StockPhotoStrategy {
    pub fn new(backend: Arc<dyn StockPhotoSearch>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl RetrievalStrategy for StockPhotoStrategy {
    fn stage(&self) -> RetrievalStage {
        RetrievalStage::StockPhoto
    }

    fn is_enabled(&self) -> bool {
        self.backend.is_available()
    }

    async fn retrieve(
        &self,
        intent: &SearchIntent,
        _count: usize,
        limit: usize,
    ) -> Result<Vec<RawCandidate>> {
        let photos = self.backend.search_photos(&intent.query, limit).await?;
        tracing::debug!(
            backend = self.backend.name(),
            photos = photos.len(),
            "Stock photo search returned"
        );
        Ok(photos.into_iter().map(RawCandidate::StockPhoto).collect())
    }
}

/// Photos need both a full-size and a preview URL
pub(super) fn normalize(photo: StockPhoto) -> Option<Candidate> {
    let uri = photo.image_url.filter(|u| !u.trim().is_empty())?;
    let preview_url = photo.preview_url.filter(|u| !u.trim().is_empty())?;
    let source = host_of(&uri).unwrap_or_default();

    Some(Candidate {
        title: photo
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Photo {}", photo.id)),
        match_reason: photo
            .photographer
            .map(|name| format!("Stock photo by {}", name)),
        uri,
        source,
        preview_url,
        origin: CandidateOrigin::StockPhoto,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(image: Option<&str>, preview: Option<&str>) -> StockPhoto {
        StockPhoto {
            id: "p1".to_string(),
            image_url: image.map(String::from),
            preview_url: preview.map(String::from),
            description: None,
            photographer: Some("Ada".to_string()),
        }
    }

    #[test]
    fn test_normalize_requires_both_urls() {
        assert!(normalize(photo(None, Some("https://images.unsplash.com/p1?w=400"))).is_none());
        assert!(normalize(photo(Some("https://images.unsplash.com/p1"), None)).is_none());
        assert!(normalize(photo(Some(" "), Some("https://images.unsplash.com/p1"))).is_none());
    }

    #[test]
    fn test_normalize() {
        let candidate = normalize(photo(
            Some("https://images.unsplash.com/p1?w=1080"),
            Some("https://images.unsplash.com/p1?w=400"),
        ))
        .unwrap();

        assert_eq!(candidate.uri, "https://images.unsplash.com/p1?w=1080");
        assert_eq!(candidate.source, "images.unsplash.com");
        assert_eq!(candidate.title, "Photo p1");
        assert_eq!(candidate.match_reason.as_deref(), Some("Stock photo by Ada"));
        assert_eq!(candidate.origin, CandidateOrigin::StockPhoto);
    }
}
