//! `genpdf` backend for report plans.
//!
//! [`PlannedReport`] is a single document element that lays the report out against the
//! document's own font metrics the first time it is rendered and then emits one planned page per
//! render call.  Plan coordinates are PDF points from the top-left page corner; they are
//! converted to millimetres here.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

use genpdf::elements::Image;
use genpdf::error::Error;
use genpdf::fonts::FontCache;
use genpdf::style::Style;
use genpdf::{render, Element, Mm, Position, RenderResult, Scale, Size};
use log::{debug, warn};

use crate::composer::{plan_report, ReportAssets, ReportLayout};
use crate::layout::{DrawOp, FontSpec, FontWeight, PagePlan, Rect, ReportPlan, TextMeasure};
use crate::model::ReportRequest;

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Converts PDF points to millimetres.
pub fn pt_to_mm(points: f64) -> Mm {
    mm_from_f64(points * MM_PER_INCH / POINTS_PER_INCH)
}

/// Converts millimetres to PDF points.
pub fn mm_to_pt(value: Mm) -> f64 {
    mm_to_f64(value) * POINTS_PER_INCH / MM_PER_INCH
}

fn position_pt(x: f64, y: f64) -> Position {
    Position::new(pt_to_mm(x), pt_to_mm(y))
}

/// `genpdf` style for a report font.
pub fn style_for(font: FontSpec) -> Style {
    let mut style = Style::new().with_font_size(font.size);
    if font.weight == FontWeight::Bold {
        style.set_bold();
    }
    style
}

/// [`TextMeasure`] backed by the metrics of a document's loaded fonts.
pub struct FontCacheMeasure<'a>(pub &'a FontCache);

impl TextMeasure for FontCacheMeasure<'_> {
    fn text_width(&self, text: &str, font: FontSpec) -> f64 {
        mm_to_pt(style_for(font).str_width(self.0, text))
    }

    fn line_height(&self, font: FontSpec) -> f64 {
        mm_to_pt(style_for(font).line_height(self.0))
    }
}

/// Composites an image with an alpha channel onto white.
///
/// PDF image embedding does not support transparency, so every asset is reduced to RGB.
pub fn flatten_alpha(image: DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return image;
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut flattened = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        let blend = |channel: u8| ((u16::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8;
        flattened.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    DynamicImage::ImageRgb8(flattened)
}

/// Size an image occupies at its natural resolution.
fn estimated_image_size(image: &DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Builds an image element scaled to fill `rect`.
fn image_in_rect(image: &DynamicImage, rect: Rect) -> Result<Image, Error> {
    let natural = estimated_image_size(image, DEFAULT_IMAGE_DPI);
    let natural_width = mm_to_f64(natural.width);
    let natural_height = mm_to_f64(natural.height);
    let target_width = mm_to_f64(pt_to_mm(rect.width));
    let target_height = mm_to_f64(pt_to_mm(rect.height));

    let scale_x = if natural_width > f64::EPSILON {
        target_width / natural_width
    } else {
        1.0
    };
    let scale_y = if natural_height > f64::EPSILON {
        target_height / natural_height
    } else {
        1.0
    };

    Ok(Image::from_dynamic_image(image.clone())?.with_scale(Scale::new(scale_x, scale_y)))
}

/// Document element rendering a complete report, one page per render call.
pub struct PlannedReport {
    request: ReportRequest,
    assets: ReportAssets,
    layout: ReportLayout,
    timestamp: String,
    plan: Option<ReportPlan>,
    next_page: usize,
}

impl PlannedReport {
    pub fn new(
        request: ReportRequest,
        assets: ReportAssets,
        layout: ReportLayout,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            request,
            assets,
            layout,
            timestamp: timestamp.into(),
            plan: None,
            next_page: 0,
        }
    }

    fn draw_page(
        &self,
        page: &PagePlan,
        context: &genpdf::Context,
        area: &render::Area<'_>,
        style: Style,
    ) -> Result<(), Error> {
        for op in &page.ops {
            match op {
                DrawOp::Text { x, y, text, font } => {
                    let printed = area.print_str(
                        &context.font_cache,
                        position_pt(*x, *y),
                        style_for(*font),
                        text,
                    )?;
                    if !printed {
                        warn!("Text {:?} at ({:.1}, {:.1}) did not fit the page", text, x, y);
                    }
                }
                DrawOp::Image { asset, rect } => {
                    let Some(image) = self.assets.get(*asset) else {
                        continue;
                    };
                    let mut element = image_in_rect(image, *rect)?;
                    let mut image_area = area.clone();
                    image_area.add_offset(position_pt(rect.x, rect.y));
                    element.render(context, image_area, style)?;
                }
                DrawOp::Line { from, to } => {
                    area.draw_line(
                        vec![position_pt(from.0, from.1), position_pt(to.0, to.1)],
                        Style::new(),
                    );
                }
            }
        }
        Ok(())
    }
}

impl Element for PlannedReport {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let plan = match self.plan.take() {
            Some(plan) => plan,
            None => plan_report(
                &self.request,
                &self.assets.dimensions(),
                &self.layout,
                &FontCacheMeasure(&context.font_cache),
                &self.timestamp,
            ),
        };

        let mut result = RenderResult::default();
        if let Some(page) = plan.pages.get(self.next_page) {
            debug!("Rendering page {}/{}", self.next_page + 1, plan.page_count());
            self.draw_page(page, context, &area, style)?;
            self.next_page += 1;
            result.size = area.size();
            result.has_more = self.next_page < plan.page_count();
        }

        self.plan = Some(plan);
        Ok(result)
    }
}
