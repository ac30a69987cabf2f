//! Fixed sample data served while the backend is unreachable.

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::entities::{
    DataSource, ImageId, ImagePage, ImageRecord, ListQuery, SearchResults, UserProfile,
    sort_records,
};

struct Sample {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
    day: u32,
    size: u64,
}

const SAMPLES: &[Sample] = &[
    Sample {
        id: "sample-1",
        title: "Mountain Lake",
        description: "Still water under granite peaks",
        tags: &["nature", "mountains", "water"],
        day: 1,
        size: 2_457_600,
    },
    Sample {
        id: "sample-2",
        title: "City Lights",
        description: "Downtown skyline after dusk",
        tags: &["city", "night"],
        day: 3,
        size: 1_843_200,
    },
    Sample {
        id: "sample-3",
        title: "Forest Path",
        description: "Morning fog between the pines",
        tags: &["nature", "forest"],
        day: 5,
        size: 3_145_728,
    },
    Sample {
        id: "sample-4",
        title: "Desert Dunes",
        description: "Wind-carved ridges at sunset",
        tags: &["desert", "sunset"],
        day: 8,
        size: 1_048_576,
    },
    Sample {
        id: "sample-5",
        title: "Ocean Waves",
        description: "Breakers on a rocky shore",
        tags: &["ocean", "water"],
        day: 13,
        size: 2_097_152,
    },
    Sample {
        id: "sample-6",
        title: "Autumn Leaves",
        description: "Maple canopy in October",
        tags: &["nature", "autumn"],
        day: 21,
        size: 1_572_864,
    },
];

fn sample_date(day: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).single()
}

fn to_record(sample: &Sample) -> ImageRecord {
    let url = format!("https://picsum.photos/seed/{}/800/600", sample.id);
    let thumbnail = format!("https://picsum.photos/seed/{}/300/200", sample.id);
    ImageRecord {
        id: ImageId::new(sample.id),
        url,
        thumbnail: Some(thumbnail),
        title: sample.title.to_string(),
        description: sample.description.to_string(),
        tags: sample.tags.iter().map(|t| (*t).to_string()).collect(),
        upload_date: sample_date(sample.day),
        size: sample.size,
        filename: format!("{}.jpg", sample.id),
        likes: Some(0),
        views: Some(0),
    }
}

/// All sample records in declaration order.
#[must_use]
pub fn sample_records() -> Vec<ImageRecord> {
    SAMPLES.iter().map(to_record).collect()
}

/// One page of the sample set, honoring the query's sort and pagination.
#[must_use]
pub fn sample_page(query: ListQuery) -> ImagePage {
    let mut records = sample_records();
    sort_records(&mut records, query.sort, query.order);

    let limit = query.limit.max(1) as usize;
    let page = query.page.max(1);
    let total = records.len();
    let total_pages = total.div_ceil(limit);
    let start = (page as usize - 1).saturating_mul(limit);

    let images = records.into_iter().skip(start).take(limit).collect();

    ImagePage {
        images,
        total: total as u64,
        page,
        total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        has_more: (page as usize) < total_pages,
        source: DataSource::Fallback,
    }
}

/// Sample records matching `query`, case-insensitively.
#[must_use]
pub fn sample_search(query: &str, page: u32, limit: u32) -> SearchResults {
    let needle = query.trim().to_lowercase();
    let matching: Vec<ImageRecord> = sample_records()
        .into_iter()
        .filter(|record| record.matches(&needle))
        .collect();

    let limit = limit.max(1) as usize;
    let start = (page.max(1) as usize - 1).saturating_mul(limit);

    SearchResults {
        total: matching.len() as u64,
        images: matching.into_iter().skip(start).take(limit).collect(),
        query: query.to_string(),
        source: DataSource::Fallback,
    }
}

/// Placeholder profile.
#[must_use]
pub fn sample_user() -> UserProfile {
    UserProfile {
        id: "demo".to_string(),
        username: "Demo User".to_string(),
        email: Some("demo@example.com".to_string()),
        avatar: None,
        bio: Some("Offline demo profile".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{SortKey, SortOrder};

    #[test]
    fn test_sample_page_is_deterministic_and_paginated() {
        let query = ListQuery::page(1).with_limit(4);
        let first = sample_page(query);
        assert_eq!(first, sample_page(query));
        assert_eq!(first.images.len(), 4);
        assert_eq!(first.total, 6);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_more);
        assert_eq!(first.source, DataSource::Fallback);

        let second = sample_page(ListQuery::page(2).with_limit(4));
        assert_eq!(second.images.len(), 2);
        assert!(!second.has_more);
    }

    #[test]
    fn test_default_order_is_newest_first() {
        let page = sample_page(ListQuery::default());
        assert_eq!(page.images[0].title, "Autumn Leaves");
    }

    #[test]
    fn test_sample_page_sorts_by_size() {
        let page = sample_page(ListQuery::page(1).sorted_by(SortKey::Size, SortOrder::Asc));
        let sizes: Vec<u64> = page.images.iter().map(|r| r.size).collect();
        assert!(sizes.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_sample_search_filters() {
        let results = sample_search("WATER", 1, 20);
        assert_eq!(results.total, 2);
        assert_eq!(results.query, "WATER");
    }
}
