//! Two-per-page image gallery.

use log::debug;

use super::{AssetRef, Cursor, DrawOp, FontSpec, PageGeometry, PagePlan, Rect, TextMeasure};

/// Typography and spacing of the gallery pages.
#[derive(Clone, Debug, PartialEq)]
pub struct GalleryStyle {
    /// Heading drawn on the first gallery page only.
    pub title: String,
    pub title_font: FontSpec,
    /// Space between the heading and the first slot.
    pub title_gap: f64,
    /// Vertical gap between the two slots of a page.
    pub slot_gap: f64,
    pub slot_top_padding: f64,
    pub slot_bottom_padding: f64,
    pub side_padding: f64,
}

impl Default for GalleryStyle {
    fn default() -> Self {
        Self {
            title: "Anexos (imagens):".to_owned(),
            title_font: FontSpec::bold(11),
            title_gap: 10.0,
            slot_gap: 18.0,
            slot_top_padding: 8.0,
            slot_bottom_padding: 8.0,
            side_padding: 0.0,
        }
    }
}

/// Vertical band of a gallery page reserved for one image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slot {
    pub top: f64,
    pub bottom: f64,
}

impl Slot {
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Splits the band `[top, bottom]` into two equal slots separated by `gap`.
pub fn gallery_slots(top: f64, bottom: f64, gap: f64) -> (Slot, Slot) {
    let slot_height = ((bottom - top - gap) / 2.0).max(0.0);
    let first = Slot {
        top,
        bottom: top + slot_height,
    };
    let second_top = first.bottom + gap;
    let second = Slot {
        top: second_top,
        bottom: second_top + slot_height,
    };
    (first, second)
}

/// Largest rectangle with the aspect ratio of a `width` × `height` pixel image that fits in
/// `area`, centred in both directions.  Returns `None` for degenerate images or areas.
pub fn fit_within(width: u32, height: u32, area: Rect) -> Option<Rect> {
    if width == 0 || height == 0 || area.width <= 0.0 || area.height <= 0.0 {
        return None;
    }

    let scale = (area.width / f64::from(width)).min(area.height / f64::from(height));
    let fitted_width = f64::from(width) * scale;
    let fitted_height = f64::from(height) * scale;

    Some(Rect::new(
        area.x + (area.width - fitted_width) / 2.0,
        area.y + (area.height - fitted_height) / 2.0,
        fitted_width,
        fitted_height,
    ))
}

/// Area of `slot` that an image may occupy once padding is removed.
pub fn slot_image_area(slot: Slot, geometry: &PageGeometry, style: &GalleryStyle) -> Rect {
    Rect::new(
        geometry.content_left + style.side_padding,
        slot.top + style.slot_top_padding,
        (geometry.content_width - 2.0 * style.side_padding).max(0.0),
        (slot.height() - style.slot_top_padding - style.slot_bottom_padding).max(0.0),
    )
}

/// Lays out `images` two per page.
///
/// Each entry holds the pixel size of a successfully loaded image, or `None` when the image
/// could not be fetched or decoded; such slots stay blank without affecting pagination.  Image
/// operations refer to [`AssetRef::Gallery`] with the entry's index.
pub fn layout_gallery(
    images: &[Option<(u32, u32)>],
    geometry: &PageGeometry,
    style: &GalleryStyle,
    measure: &dyn TextMeasure,
) -> Vec<PagePlan> {
    let mut pages = Vec::with_capacity((images.len() + 1) / 2);

    for (pair_index, pair) in images.chunks(2).enumerate() {
        let mut page = PagePlan::default();
        let mut cursor = Cursor::page_top(geometry);

        if pair_index == 0 {
            page.push(DrawOp::Text {
                x: geometry.content_left,
                y: cursor.y(),
                text: style.title.clone(),
                font: style.title_font,
            });
            cursor = cursor.advance_by(measure.line_height(style.title_font) + style.title_gap);
        }

        let (first, second) = gallery_slots(cursor.y(), geometry.content_bottom, style.slot_gap);
        debug!(
            "Gallery page {}: slots {:.1}-{:.1} and {:.1}-{:.1}",
            pair_index + 1,
            first.top,
            first.bottom,
            second.top,
            second.bottom
        );

        for (offset, (entry, slot)) in pair.iter().zip([first, second]).enumerate() {
            let index = pair_index * 2 + offset;
            let Some((width, height)) = entry else {
                debug!("Gallery image {} unavailable; leaving slot blank", index);
                continue;
            };
            let area = slot_image_area(slot, geometry, style);
            if let Some(rect) = fit_within(*width, *height, area) {
                page.push(DrawOp::Image {
                    asset: AssetRef::Gallery(index),
                    rect,
                });
            }
        }

        pages.push(page);
    }

    pages
}
