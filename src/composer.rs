//! Report composition: asset prefetch, page planning and rendering.
//!
//! [`plan_report`] is the pure part.  It walks the stages of a report (header, fields, gallery,
//! footer) and produces a [`ReportPlan`] from the request, the pixel sizes of the assets that
//! could be loaded, and a [`TextMeasure`].  [`ReportComposer`] wraps it with I/O: it fetches and
//! decodes the assets, then hands everything to the `genpdf` backend in [`crate::elements`].
//!
//! Asset failures never abort a report.  They are logged and the element is left out.

use std::fmt;

use chrono::{Local, NaiveDateTime};
use image::{DynamicImage, GenericImageView};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::builder::DocumentBuilder;
use crate::config::ReportConfig;
use crate::elements::{self, PlannedReport};
use crate::error::{FetchError, RenderError};
use crate::fetch::{AssetFetcher, HttpFetcher};
use crate::layout::text::wrap_text;
use crate::layout::{
    draw_field, draw_field_paged, layout_gallery, AssetRef, Cursor, DrawOp, FieldStyle, FontSpec,
    GalleryStyle, PageGeometry, PagePlan, Rect, ReportPlan, TextMeasure,
};
use crate::model::ReportRequest;
use crate::qr::{self, QrOptions};

/// Format of the footer timestamp (pt-BR short date and time).
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Header typography and spacing.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderStyle {
    /// Organisation line printed above the report title.
    pub heading: String,
    pub heading_font: FontSpec,
    pub title_font: FontSpec,
    /// Gap between heading and title, in heading lines.
    pub heading_gap_lines: f64,
    pub logo_width: f64,
    pub qr_size: f64,
    pub qr_caption: String,
    pub qr_caption_font: FontSpec,
    pub qr_caption_gap: f64,
    /// Vertical extent reserved below the QR code for its caption.
    pub qr_caption_extent: f64,
    /// Horizontal clearance between the centred titles and the logo/QR.
    pub side_clearance: f64,
    /// Gap between the lowest header element and the separator.
    pub separator_gap: f64,
    /// Minimum distance from the header top to the separator.
    pub min_header_height: f64,
    /// Gap between the separator and the first field.
    pub content_gap: f64,
    /// Minimum distance from the header top to the first field.
    pub min_content_offset: f64,
}

impl Default for HeaderStyle {
    fn default() -> Self {
        Self {
            heading: "PMDF/DPTS - COMISSÃO PCS".to_owned(),
            heading_font: FontSpec::bold(16),
            title_font: FontSpec::regular(12),
            heading_gap_lines: 0.3,
            logo_width: 70.0,
            qr_size: 100.0,
            qr_caption: "Acesse o relatório".to_owned(),
            qr_caption_font: FontSpec::regular(8),
            qr_caption_gap: 4.0,
            qr_caption_extent: 20.0,
            side_clearance: 8.0,
            separator_gap: 8.0,
            min_header_height: 60.0,
            content_gap: 20.0,
            min_content_offset: 160.0,
        }
    }
}

/// Footer typography.
#[derive(Clone, Debug, PartialEq)]
pub struct FooterStyle {
    pub prefix: String,
    pub font: FontSpec,
    /// Gap between the footer rule and the timestamp.
    pub gap: f64,
}

impl Default for FooterStyle {
    fn default() -> Self {
        Self {
            prefix: "Gerado em:".to_owned(),
            font: FontSpec::regular(8),
            gap: 4.0,
        }
    }
}

/// Complete set of layout parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportLayout {
    pub geometry: PageGeometry,
    pub header: HeaderStyle,
    pub field: FieldStyle,
    pub gallery: GalleryStyle,
    pub footer: FooterStyle,
}

/// Pixel sizes of the assets that were loaded; `None` marks an absent or failed asset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetDimensions {
    pub logo: Option<(u32, u32)>,
    pub qr: Option<(u32, u32)>,
    /// One entry per image attachment, in attachment order.
    pub gallery: Vec<Option<(u32, u32)>>,
}

/// Decoded assets of one report.
#[derive(Clone, Default)]
pub struct ReportAssets {
    pub logo: Option<DynamicImage>,
    pub qr: Option<DynamicImage>,
    pub gallery: Vec<Option<DynamicImage>>,
}

impl ReportAssets {
    pub fn get(&self, asset: AssetRef) -> Option<&DynamicImage> {
        match asset {
            AssetRef::Logo => self.logo.as_ref(),
            AssetRef::Qr => self.qr.as_ref(),
            AssetRef::Gallery(index) => self.gallery.get(index).and_then(Option::as_ref),
        }
    }

    pub fn dimensions(&self) -> AssetDimensions {
        AssetDimensions {
            logo: self.logo.as_ref().map(GenericImageView::dimensions),
            qr: self.qr.as_ref().map(GenericImageView::dimensions),
            gallery: self
                .gallery
                .iter()
                .map(|image| image.as_ref().map(GenericImageView::dimensions))
                .collect(),
        }
    }
}

impl fmt::Debug for ReportAssets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportAssets")
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

/// Progress of a report through its sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    HeaderDrawn,
    FieldsDrawn,
    GalleryDrawn,
    FooterDrawn,
    Finalized,
}

/// Plans every page of a report.
///
/// `timestamp` is printed verbatim in the footer of every page.
pub fn plan_report(
    request: &ReportRequest,
    assets: &AssetDimensions,
    layout: &ReportLayout,
    measure: &dyn TextMeasure,
    timestamp: &str,
) -> ReportPlan {
    let mut planner = Planner::new(layout, measure);

    let content_start = planner.header(request, assets);
    planner.fields(request, content_start);
    planner.gallery(&assets.gallery);
    planner.footer(timestamp);
    planner.finish()
}

struct Planner<'a> {
    layout: &'a ReportLayout,
    measure: &'a dyn TextMeasure,
    stage: Stage,
    pages: Vec<PagePlan>,
}

impl<'a> Planner<'a> {
    fn new(layout: &'a ReportLayout, measure: &'a dyn TextMeasure) -> Self {
        Self {
            layout,
            measure,
            stage: Stage::Init,
            pages: vec![PagePlan::default()],
        }
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "{:?} cannot follow {:?}", next, self.stage);
        debug!("Report stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    fn current_page(&mut self) -> &mut PagePlan {
        if self.pages.is_empty() {
            self.pages.push(PagePlan::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Draws logo, titles, QR code and separator; returns where the body starts.
    fn header(&mut self, request: &ReportRequest, assets: &AssetDimensions) -> Cursor {
        let layout = self.layout;
        let geometry = layout.geometry;
        let style = &layout.header;
        let top = geometry.content_top;
        let mut header_bottom = top;
        let mut ops = Vec::new();
        let mut side_reserve: f64 = 0.0;

        if let Some((width, height)) = assets.logo.filter(|(w, h)| *w > 0 && *h > 0) {
            let logo_height = style.logo_width * f64::from(height) / f64::from(width);
            ops.push(DrawOp::Image {
                asset: AssetRef::Logo,
                rect: Rect::new(geometry.content_left, top, style.logo_width, logo_height),
            });
            header_bottom = header_bottom.max(top + logo_height);
            side_reserve = side_reserve.max(style.logo_width + style.side_clearance);
        }

        let qr_drawn = request.report_url.is_some() && assets.qr.is_some();
        if qr_drawn {
            side_reserve = side_reserve.max(style.qr_size + style.side_clearance);
        }

        let title_width =
            (geometry.content_width - 2.0 * side_reserve).max(geometry.content_width / 3.0);
        let mut y =
            self.centred_lines(&mut ops, &style.heading, style.heading_font, top, title_width);
        y += style.heading_gap_lines * self.measure.line_height(style.heading_font);
        y = self.centred_lines(&mut ops, &request.title, style.title_font, y, title_width);
        header_bottom = header_bottom.max(y);

        if qr_drawn {
            let qr_x = geometry.content_right - style.qr_size;
            ops.push(DrawOp::Image {
                asset: AssetRef::Qr,
                rect: Rect::new(qr_x, top, style.qr_size, style.qr_size),
            });
            let caption_width = self
                .measure
                .text_width(&style.qr_caption, style.qr_caption_font);
            ops.push(DrawOp::Text {
                x: qr_x + (style.qr_size - caption_width) / 2.0,
                y: top + style.qr_size + style.qr_caption_gap,
                text: style.qr_caption.clone(),
                font: style.qr_caption_font,
            });
            header_bottom = header_bottom.max(top + style.qr_size + style.qr_caption_extent);
        }

        let separator_y =
            (header_bottom + style.separator_gap).max(top + style.min_header_height);
        ops.push(DrawOp::Line {
            from: (geometry.content_left, separator_y),
            to: (geometry.content_right, separator_y),
        });

        let content_start =
            (separator_y + style.content_gap).max(top + style.min_content_offset);

        self.current_page().extend(ops);
        self.advance(Stage::HeaderDrawn);
        Cursor::at(content_start)
    }

    /// Emits `text` wrapped to `width` and centred on the content box; returns the bottom.
    fn centred_lines(
        &self,
        ops: &mut Vec<DrawOp>,
        text: &str,
        font: FontSpec,
        top: f64,
        width: f64,
    ) -> f64 {
        let geometry = &self.layout.geometry;
        let line_height = self.measure.line_height(font);
        let centre = geometry.content_left + geometry.content_width / 2.0;
        let mut y = top;

        for line in wrap_text(text, width, font, self.measure) {
            if !line.is_empty() {
                let line_width = self.measure.text_width(&line, font);
                ops.push(DrawOp::Text {
                    x: centre - line_width / 2.0,
                    y,
                    text: line,
                    font,
                });
            }
            y += line_height;
        }
        y
    }

    fn fields(&mut self, request: &ReportRequest, start: Cursor) {
        let (layout, measure) = (self.layout, self.measure);
        let geometry = layout.geometry;
        let style = &layout.field;
        let mut cursor = start;

        let page_height = geometry.content_bottom - geometry.content_top;

        for field in &request.record {
            let value = field.value.to_string();
            let row = draw_field(
                cursor,
                &field.label,
                Some(value.as_str()),
                geometry.content_left,
                style.label_width,
                style,
                &geometry,
                measure,
            );

            let row_bottom = row.next.y() - style.padding;
            let at_page_top = cursor.y() <= geometry.content_top;
            if row_bottom > geometry.content_bottom
                && !at_page_top
                && row_bottom - cursor.y() <= page_height
            {
                debug!("Field {:?} does not fit; continuing on a new page", field.label);
                self.pages.push(PagePlan::default());
                cursor = Cursor::page_top(&geometry);
            }

            let placed = draw_field_paged(
                cursor,
                &field.label,
                Some(value.as_str()),
                geometry.content_left,
                style.label_width,
                style,
                &geometry,
                measure,
            );
            if placed.pages.len() > 1 {
                debug!(
                    "Field {:?} continues over {} pages",
                    field.label,
                    placed.pages.len()
                );
            }
            for (index, ops) in placed.pages.into_iter().enumerate() {
                if index > 0 {
                    self.pages.push(PagePlan::default());
                }
                self.current_page().extend(ops);
            }
            cursor = placed.next;
        }

        self.advance(Stage::FieldsDrawn);
    }

    fn gallery(&mut self, images: &[Option<(u32, u32)>]) {
        if images.is_empty() {
            return;
        }
        let layout = self.layout;
        let pages = layout_gallery(images, &layout.geometry, &layout.gallery, self.measure);
        self.pages.extend(pages);
        self.advance(Stage::GalleryDrawn);
    }

    fn footer(&mut self, timestamp: &str) {
        let layout = self.layout;
        let geometry = layout.geometry;
        let style = &layout.footer;
        let text = format!("{} {}", style.prefix, timestamp);
        let text_width = self.measure.text_width(&text, style.font);

        for page in &mut self.pages {
            page.push(DrawOp::Line {
                from: (geometry.content_left, geometry.footer_rule_y),
                to: (geometry.content_right, geometry.footer_rule_y),
            });
            page.push(DrawOp::Text {
                x: geometry.content_right - text_width,
                y: geometry.footer_rule_y + style.gap,
                text: text.clone(),
                font: style.font,
            });
        }

        self.advance(Stage::FooterDrawn);
    }

    fn finish(mut self) -> ReportPlan {
        self.advance(Stage::Finalized);
        ReportPlan {
            geometry: self.layout.geometry,
            pages: self.pages,
        }
    }
}

/// Formats the footer timestamp.
pub fn format_timestamp(generated_at: &NaiveDateTime) -> String {
    generated_at.format(TIMESTAMP_FORMAT).to_string()
}

/// Output of a successful composition.
#[derive(Clone, Debug)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Builds report documents, fetching remote assets through `F`.
pub struct ReportComposer<F> {
    fetcher: F,
    logo_url: Option<String>,
    layout: ReportLayout,
    qr_options: QrOptions,
}

impl ReportComposer<HttpFetcher> {
    /// Creates a composer that fetches over HTTP with the configured timeout and logo.
    pub fn from_config(config: &ReportConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(config.fetch_timeout)?;
        Ok(Self::new(fetcher).with_logo_url(config.logo_url.clone()))
    }
}

impl<F: AssetFetcher> ReportComposer<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            logo_url: None,
            layout: ReportLayout::default(),
            qr_options: QrOptions::default(),
        }
    }

    /// Sets the logo URL and returns the updated composer.
    pub fn with_logo_url(mut self, logo_url: impl Into<Option<String>>) -> Self {
        self.logo_url = logo_url.into().filter(|url| !url.trim().is_empty());
        self
    }

    /// Replaces the layout parameters and returns the updated composer.
    pub fn with_layout(mut self, layout: ReportLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Replaces the QR options and returns the updated composer.
    pub fn with_qr_options(mut self, qr_options: QrOptions) -> Self {
        self.qr_options = qr_options;
        self
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    /// Loads the logo, the QR code and every gallery image.
    ///
    /// The three kinds of assets, and the gallery images among themselves, are loaded in
    /// parallel.  Failures are logged and yield `None`.
    pub fn prefetch(&self, request: &ReportRequest) -> ReportAssets
    where
        F: Sync,
    {
        let image_urls = request.image_urls();

        let ((logo, qr), gallery) = rayon::join(
            || {
                rayon::join(
                    || {
                        self.logo_url
                            .as_deref()
                            .and_then(|url| self.load_image(url, "logo"))
                    },
                    || request.report_url.as_deref().and_then(|url| self.encode_qr(url)),
                )
            },
            || {
                image_urls
                    .par_iter()
                    .map(|url| self.load_image(url, "gallery image"))
                    .collect::<Vec<_>>()
            },
        );

        ReportAssets { logo, qr, gallery }
    }

    fn load_image(&self, url: &str, role: &str) -> Option<DynamicImage> {
        let result = self
            .fetcher
            .fetch(url)
            .and_then(|bytes| decode_asset(url, &bytes));
        match result {
            Ok(image) => Some(image),
            Err(err) => {
                warn!("Omitting {} from report: {}", role, err);
                None
            }
        }
    }

    fn encode_qr(&self, url: &str) -> Option<DynamicImage> {
        match qr::encode(url, &self.qr_options) {
            Ok(image) => Some(image),
            Err(err) => {
                warn!("Omitting QR code from report: {}", err);
                None
            }
        }
    }

    /// Plans the report against `measure` without rendering it.
    pub fn plan(
        &self,
        request: &ReportRequest,
        assets: &ReportAssets,
        measure: &dyn TextMeasure,
        timestamp: &str,
    ) -> ReportPlan {
        plan_report(request, &assets.dimensions(), &self.layout, measure, timestamp)
    }

    /// Renders the report with the current local time in the footer.
    pub fn compose(&self, request: &ReportRequest) -> Result<RenderedReport, RenderError> {
        self.compose_at(request, Local::now().naive_local())
    }

    /// Renders the report with a fixed footer timestamp.
    pub fn compose_at(
        &self,
        request: &ReportRequest,
        generated_at: NaiveDateTime,
    ) -> Result<RenderedReport, RenderError> {
        let assets = self.prefetch(request);
        self.render(request, assets, &format_timestamp(&generated_at))
    }

    /// Renders already loaded assets.
    pub fn render(
        &self,
        request: &ReportRequest,
        assets: ReportAssets,
        timestamp: &str,
    ) -> Result<RenderedReport, RenderError> {
        let builder = DocumentBuilder::new().with_title(request.title.clone());
        let pages = builder.page_counter();
        let mut document = builder.build().map_err(RenderError::Font)?;

        document.push(PlannedReport::new(
            request.clone(),
            assets,
            self.layout.clone(),
            timestamp,
        ));

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(RenderError::Pdf)?;

        let page_count = pages.get();
        info!(
            "Rendered report {:?}: {} page(s), {} bytes",
            request.title,
            page_count,
            bytes.len()
        );
        Ok(RenderedReport { bytes, page_count })
    }
}

fn decode_asset(url: &str, bytes: &[u8]) -> Result<DynamicImage, FetchError> {
    image::load_from_memory(bytes)
        .map(elements::flatten_alpha)
        .map_err(|err| FetchError::Decode {
            url: url.to_owned(),
            message: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{format_timestamp, plan_report, AssetDimensions, ReportLayout};
    use crate::layout::{ApproximateMeasure, AssetRef, DrawOp, ReportPlan, TextMeasure};
    use crate::model::ReportRequest;

    fn plan(request: &ReportRequest, assets: &AssetDimensions) -> ReportPlan {
        plan_report(
            request,
            assets,
            &ReportLayout::default(),
            &ApproximateMeasure,
            "01/02/2026, 10:00:00",
        )
    }

    fn first_field_y(plan: &ReportPlan, label: &str) -> f64 {
        plan.pages[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { y, text, .. } if text == label => Some(*y),
                _ => None,
            })
            .expect("field drawn")
    }

    fn separator_y(plan: &ReportPlan) -> f64 {
        plan.pages[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Line { from, .. } => Some(from.1),
                _ => None,
            })
            .expect("separator drawn")
    }

    #[test]
    fn timestamp_uses_brazilian_format() {
        let at = NaiveDate::from_ymd_opt(2026, 3, 7)
            .and_then(|date| date.and_hms_opt(9, 5, 1))
            .expect("valid date");
        assert_eq!(format_timestamp(&at), "07/03/2026, 09:05:01");
    }

    #[test]
    fn body_never_starts_above_minimum_offset() {
        let request = ReportRequest::new("Relatório").with_field("CPR:", "1º CPR");
        let plan = plan(&request, &AssetDimensions::default());

        assert!((separator_y(&plan) - 100.0).abs() < 1e-9);
        assert!((first_field_y(&plan, "CPR:") - 200.0).abs() < 1e-9);
    }

    #[test]
    fn tall_logo_pushes_separator_and_body_down() {
        let request = ReportRequest::new("Relatório").with_field("CPR:", "1º CPR");
        let assets = AssetDimensions {
            logo: Some((100, 300)),
            ..AssetDimensions::default()
        };
        let plan = plan(&request, &assets);

        // logo is 70 wide, 210 tall, starting at the top margin (40)
        assert!((separator_y(&plan) - (40.0 + 210.0 + 8.0)).abs() < 1e-9);
        assert!((first_field_y(&plan, "CPR:") - (40.0 + 210.0 + 8.0 + 20.0)).abs() < 1e-9);
    }

    #[test]
    fn qr_needs_both_url_and_image() {
        let assets = AssetDimensions {
            qr: Some((132, 132)),
            ..AssetDimensions::default()
        };
        let without_url = plan(&ReportRequest::new("t"), &assets);
        assert!(!without_url.draws(AssetRef::Qr));

        let with_url = plan(
            &ReportRequest::new("t").with_report_url(Some("https://x/r.pdf".to_owned())),
            &assets,
        );
        assert!(with_url.draws(AssetRef::Qr));
        assert!(with_url.pages[0].texts().any(|text| text == "Acesse o relatório"));
    }

    #[test]
    fn long_records_continue_on_new_page() {
        let mut request = ReportRequest::new("t");
        for index in 0..40 {
            request = request.with_field(format!("Campo {}:", index), "valor");
        }
        let plan = plan(&request, &AssetDimensions::default());

        assert_eq!(plan.page_count(), 2);
        let geometry = plan.geometry;
        for page in &plan.pages {
            for op in &page.ops {
                if let DrawOp::Text { y, text, .. } = op {
                    if !text.starts_with("Gerado em:") {
                        assert!(*y < geometry.content_bottom, "{text} at {y}");
                    }
                }
            }
        }
    }

    #[test]
    fn footer_on_every_page() {
        let request = ReportRequest::new("t");
        let assets = AssetDimensions {
            gallery: vec![Some((10, 10)); 3],
            ..AssetDimensions::default()
        };
        let plan = plan(&request, &assets);

        assert_eq!(plan.page_count(), 3);
        for page in &plan.pages {
            assert!(page
                .texts()
                .any(|text| text == "Gerado em: 01/02/2026, 10:00:00"));
        }
    }

    #[test]
    fn value_longer_than_a_page_flows_onto_following_pages() {
        let notes = "palavra ".repeat(900);
        let request = ReportRequest::new("t")
            .with_field("CPR:", "1º CPR")
            .with_field("Observações:", notes.trim_end())
            .with_field("Depois:", "fim");
        let plan = plan(&request, &AssetDimensions::default());

        assert!(plan.page_count() > 2, "{} page(s)", plan.page_count());
        let geometry = plan.geometry;
        let line_height = ApproximateMeasure.line_height(ReportLayout::default().field.value_font);
        let mut words = 0;
        for page in &plan.pages {
            for op in &page.ops {
                if let DrawOp::Text { y, text, .. } = op {
                    if text.starts_with("Gerado em:") {
                        continue;
                    }
                    assert!(
                        *y + line_height <= geometry.content_bottom + 1e-9,
                        "{text} at {y}"
                    );
                    words += text.split_whitespace().filter(|word| *word == "palavra").count();
                }
            }
        }
        assert_eq!(words, 900);

        let last = plan.pages.last().expect("pages");
        assert!(last.texts().any(|text| text == "Depois:"));
    }

    #[test]
    fn rules_span_the_content_width_on_every_page() {
        let request = ReportRequest::new("t");
        let assets = AssetDimensions {
            gallery: vec![Some((10, 10)); 3],
            ..AssetDimensions::default()
        };
        let plan = plan(&request, &assets);
        let geometry = plan.geometry;

        for page in &plan.pages {
            let footer_rule = page.ops.iter().find_map(|op| match op {
                DrawOp::Line { from, to } if (from.1 - geometry.footer_rule_y).abs() < 1e-9 => {
                    Some((from.0, to.0, to.1))
                }
                _ => None,
            });
            let (left, right, y) = footer_rule.expect("footer rule drawn");
            assert!((left - geometry.content_left).abs() < 1e-9);
            assert!((right - geometry.content_right).abs() < 1e-9);
            assert!((y - geometry.footer_rule_y).abs() < 1e-9);
        }
    }
}
