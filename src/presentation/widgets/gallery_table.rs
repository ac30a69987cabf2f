//! Table of gallery records.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};

use crate::application::services::{GalleryView, ViewState};
use crate::presentation::format::{format_date, format_size, format_tags, truncate_to_width};
use crate::presentation::theme::Theme;

const TITLE_MIN_WIDTH: u16 = 20;
const TAGS_WIDTH: u16 = 24;
const SIZE_WIDTH: u16 = 10;
const DATE_WIDTH: u16 = 16;

/// Renders the visible records of a [`GalleryView`].
pub struct GalleryTable<'a> {
    view: &'a GalleryView,
    theme: &'a Theme,
}

impl<'a> GalleryTable<'a> {
    /// Creates the widget.
    #[must_use]
    pub const fn new(view: &'a GalleryView, theme: &'a Theme) -> Self {
        Self { view, theme }
    }

    fn title(&self) -> String {
        let counts = format!(
            " Gallery ({}/{}) by {} {} ",
            self.view.visible_len(),
            self.view.total(),
            self.view.sort(),
            self.view.order(),
        );
        if self.view.filter().is_empty() {
            counts
        } else {
            format!("{counts}filter: {} ", self.view.filter())
        }
    }

    fn placeholder(&self, state: ViewState) -> &'static str {
        match state {
            ViewState::Loading => "Loading images…",
            ViewState::Empty if !self.view.filter().is_empty() => "No images match the filter",
            _ => "No images yet",
        }
    }
}

impl StatefulWidget for GalleryTable<'_> {
    type State = TableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.dimmed_style)
            .title(Line::styled(self.title(), self.theme.header_style()));

        let view_state = self.view.view_state();
        if view_state != ViewState::Ready {
            let inner = block.inner(area);
            block.render(area, buf);
            Paragraph::new(self.placeholder(view_state))
                .style(self.theme.dimmed_style)
                .alignment(Alignment::Center)
                .render(inner, buf);
            return;
        }

        let title_width = area
            .width
            .saturating_sub(TAGS_WIDTH + SIZE_WIDTH + DATE_WIDTH + 8)
            .max(TITLE_MIN_WIDTH);

        let rows = self.view.visible().map(|record| {
            Row::new(vec![
                Cell::from(truncate_to_width(&record.title, usize::from(title_width))),
                Cell::from(truncate_to_width(
                    &format_tags(&record.tags),
                    usize::from(TAGS_WIDTH),
                ))
                .style(self.theme.dimmed_style),
                Cell::from(Line::from(format_size(record.size)).alignment(Alignment::Right)),
                Cell::from(format_date(record.upload_date)),
            ])
            .style(self.theme.base_style)
        });

        let header = Row::new(vec!["Title", "Tags", "Size", "Uploaded"])
            .style(self.theme.header_style());

        let table = Table::new(
            rows,
            [
                Constraint::Min(TITLE_MIN_WIDTH),
                Constraint::Length(TAGS_WIDTH),
                Constraint::Length(SIZE_WIDTH),
                Constraint::Length(DATE_WIDTH),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(self.theme.selection_style)
        .highlight_symbol("▶ ");

        StatefulWidget::render(table, area, buf, state);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::entities::{DataSource, ImageId, ImagePage, ImageRecord};
    use crate::domain::ports::mocks::MockImageApiPort;

    fn record(id: &str, title: &str) -> ImageRecord {
        ImageRecord {
            id: ImageId::new(id),
            url: format!("https://img.example.com/{id}.jpg"),
            thumbnail: None,
            title: title.to_string(),
            description: String::new(),
            tags: vec!["sea".to_string()],
            upload_date: None,
            size: 2048,
            filename: format!("{id}.jpg"),
            likes: None,
            views: None,
        }
    }

    fn render_text(view: &GalleryView) -> String {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 90, 8);
        let mut buf = Buffer::empty(area);
        let mut state = TableState::default();
        GalleryTable::new(view, &theme).render(area, &mut buf, &mut state);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_empty_gallery_placeholder() {
        let view = GalleryView::new(Arc::new(MockImageApiPort::new()), 20);
        assert!(render_text(&view).contains("No images yet"));
    }

    #[test]
    fn test_rows_show_titles() {
        let mut view = GalleryView::new(Arc::new(MockImageApiPort::new()), 20);
        let page = ImagePage {
            images: vec![record("1", "Harbor at dusk"), record("2", "Snowfield")],
            total: 2,
            page: 1,
            total_pages: 1,
            has_more: false,
            source: DataSource::Live,
        };
        assert!(view.begin_load());
        view.finish_load(1, Ok(page)).unwrap();

        let text = render_text(&view);
        assert!(text.contains("Harbor at dusk"));
        assert!(text.contains("Snowfield"));
        assert!(text.contains("2.0 KiB"));
    }
}
