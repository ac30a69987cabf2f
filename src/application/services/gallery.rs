//! Paginated, sortable, filterable gallery state.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::entities::{
    DataSource, ImageId, ImagePage, ImageRecord, ListQuery, SortKey, SortOrder, sort_records,
};
use crate::domain::errors::HttpError;
use crate::domain::ports::ImageApiPort;

/// What the gallery should currently display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// A fetch is outstanding and nothing is visible yet.
    Loading,
    /// Nothing matches.
    Empty,
    /// Records are visible.
    Ready,
}

/// Backing list of records plus the filtered view derived from it.
///
/// Owned by a single task. Long fetches can be split into
/// [`GalleryView::begin_load`], a request built from
/// [`GalleryView::query_for`], and [`GalleryView::finish_load`].
pub struct GalleryView {
    api: Arc<dyn ImageApiPort>,
    images: Vec<ImageRecord>,
    visible: Vec<usize>,
    filter: String,
    sort: SortKey,
    order: SortOrder,
    page: u32,
    page_size: u32,
    total: u64,
    has_more: bool,
    loading: bool,
    source: DataSource,
}

impl GalleryView {
    /// Creates an empty gallery sorted newest first.
    #[must_use]
    pub fn new(api: Arc<dyn ImageApiPort>, page_size: u32) -> Self {
        Self {
            api,
            images: Vec::new(),
            visible: Vec::new(),
            filter: String::new(),
            sort: SortKey::default(),
            order: SortOrder::default(),
            page: 0,
            page_size: page_size.max(1),
            total: 0,
            has_more: false,
            loading: false,
            source: DataSource::Live,
        }
    }

    /// Query for `page` with the active sort.
    #[must_use]
    pub const fn query_for(&self, page: u32) -> ListQuery {
        ListQuery::page(page)
            .with_limit(self.page_size)
            .sorted_by(self.sort, self.order)
    }

    /// Marks a fetch as outstanding. Returns false if one already is.
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            debug!("Gallery fetch already in flight");
            return false;
        }
        self.loading = true;
        true
    }

    /// Applies the result of a fetch started with [`Self::begin_load`].
    ///
    /// Page 1 replaces the backing list; later pages append to it.
    ///
    /// # Errors
    /// Returns the fetch error, leaving the records untouched.
    pub fn finish_load(
        &mut self,
        page: u32,
        result: Result<ImagePage, HttpError>,
    ) -> Result<(), HttpError> {
        self.loading = false;
        let fetched = result?;

        if page <= 1 {
            self.images = fetched.images;
        } else {
            for record in fetched.images {
                if !self.images.iter().any(|r| r.id == record.id) {
                    self.images.push(record);
                }
            }
        }

        self.page = page.max(1);
        self.total = fetched.total;
        self.has_more = fetched.has_more;
        self.source = fetched.source;
        if self.source.is_degraded() {
            info!("Gallery is showing sample data");
        }

        self.apply_sort();
        Ok(())
    }

    /// Fetches `page` through the API.
    ///
    /// Returns `Ok(false)` without fetching when a fetch is already in flight.
    ///
    /// # Errors
    /// Returns the fetch error.
    pub async fn load_images(&mut self, page: u32) -> Result<bool, HttpError> {
        if !self.begin_load() {
            return Ok(false);
        }
        let result = self.api.list_images(self.query_for(page)).await;
        self.finish_load(page, result)?;
        Ok(true)
    }

    /// Fetches the page after the last one loaded, if there is one.
    ///
    /// # Errors
    /// Returns the fetch error.
    pub async fn load_more(&mut self) -> Result<bool, HttpError> {
        if !self.has_more {
            return Ok(false);
        }
        self.load_images(self.page + 1).await
    }

    /// Whether scrolling to `position` of the visible list should fetch more.
    #[must_use]
    pub fn should_load_more(&self, position: usize, threshold: usize) -> bool {
        self.has_more && !self.loading && position + threshold >= self.visible.len()
    }

    /// Changes the sort and re-sorts the backing list.
    pub fn sort_images(&mut self, sort: SortKey, order: SortOrder) {
        self.sort = sort;
        self.order = order;
        self.apply_sort();
    }

    /// Shows only records matching `query`, case-insensitively.
    pub fn filter_images(&mut self, query: &str) {
        self.filter = query.trim().to_lowercase();
        self.refilter();
    }

    /// Deletes through the API, then drops the record locally.
    ///
    /// # Errors
    /// Returns the API error; the record stays in place.
    pub async fn delete_image(&mut self, id: &ImageId) -> Result<(), HttpError> {
        self.api.delete_image(id).await?;
        self.remove_local(id);
        Ok(())
    }

    /// Drops a record already deleted on the backend.
    pub fn remove_local(&mut self, id: &ImageId) -> bool {
        let before = self.images.len();
        self.images.retain(|r| &r.id != id);
        let removed = self.images.len() != before;
        if removed {
            self.total = self.total.saturating_sub(1);
            self.refilter();
        }
        removed
    }

    /// Prepends a freshly uploaded record without reloading.
    pub fn on_image_uploaded(&mut self, record: ImageRecord) {
        self.images.retain(|r| r.id != record.id);
        self.images.insert(0, record);
        self.total += 1;
        self.refilter();
    }

    /// Current display state.
    #[must_use]
    pub fn view_state(&self) -> ViewState {
        if !self.visible.is_empty() {
            ViewState::Ready
        } else if self.loading {
            ViewState::Loading
        } else {
            ViewState::Empty
        }
    }

    /// Records passing the filter, in sort order.
    pub fn visible(&self) -> impl Iterator<Item = &ImageRecord> {
        self.visible.iter().map(|&i| &self.images[i])
    }

    /// Visible record at `position`.
    #[must_use]
    pub fn visible_at(&self, position: usize) -> Option<&ImageRecord> {
        self.visible.get(position).map(|&i| &self.images[i])
    }

    /// Number of visible records.
    #[must_use]
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Every loaded record, in sort order.
    #[must_use]
    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    /// Active filter, lowercased.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Active sort key.
    #[must_use]
    pub const fn sort(&self) -> SortKey {
        self.sort
    }

    /// Active sort order.
    #[must_use]
    pub const fn order(&self) -> SortOrder {
        self.order
    }

    /// Last page loaded.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Total records reported by the backend.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Whether a further page exists.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a fetch is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Provenance of the last page loaded.
    #[must_use]
    pub const fn source(&self) -> DataSource {
        self.source
    }

    fn apply_sort(&mut self) {
        sort_records(&mut self.images, self.sort, self.order);
        self.refilter();
    }

    fn refilter(&mut self) {
        self.visible = self
            .images
            .iter()
            .enumerate()
            .filter(|(_, r)| r.matches(&self.filter))
            .map(|(i, _)| i)
            .collect();
    }
}
