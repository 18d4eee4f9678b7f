//! Backend-independent page layout.
//!
//! Layout code computes *where* things go and records the result as a [`ReportPlan`]: one
//! ordered list of [`DrawOp`]s per page, in PDF points measured from the top-left corner of the
//! page.  Nothing in here touches `genpdf`; text is measured through the [`TextMeasure`] trait so
//! the geometry can be checked without fonts or a renderer.  [`crate::elements`] replays a plan
//! into a real document.

pub mod field;
pub mod gallery;
pub mod geometry;
pub mod text;

pub use field::{draw_field, draw_field_paged, FieldLayout, FieldStyle, PagedFieldLayout};
pub use gallery::{fit_within, gallery_slots, layout_gallery, GalleryStyle, Slot};
pub use geometry::{Cursor, Margins, PageGeometry};
pub use text::wrap_text;

/// Typeface weight used by the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Weight and size (in points) of a run of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontSpec {
    pub weight: FontWeight,
    pub size: u8,
}

impl FontSpec {
    /// Regular weight at `size` points.
    pub const fn regular(size: u8) -> Self {
        Self {
            weight: FontWeight::Regular,
            size,
        }
    }

    /// Bold weight at `size` points.
    pub const fn bold(size: u8) -> Self {
        Self {
            weight: FontWeight::Bold,
            size,
        }
    }
}

/// Text metrics in PDF points.
pub trait TextMeasure {
    /// Advance width of `text` set in `font`.
    fn text_width(&self, text: &str, font: FontSpec) -> f64;

    /// Distance between the tops of two consecutive lines set in `font`.
    fn line_height(&self, font: FontSpec) -> f64;
}

/// Font-independent estimate of Helvetica metrics.
///
/// Every character advances by a fixed fraction of the font size.  The estimate is coarse but
/// deterministic, which makes it the measurer of choice when no font cache is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproximateMeasure;

impl ApproximateMeasure {
    const REGULAR_ADVANCE: f64 = 0.5;
    const BOLD_ADVANCE: f64 = 0.56;
    const LINE_HEIGHT: f64 = 1.16;
}

impl TextMeasure for ApproximateMeasure {
    fn text_width(&self, text: &str, font: FontSpec) -> f64 {
        let advance = match font.weight {
            FontWeight::Regular => Self::REGULAR_ADVANCE,
            FontWeight::Bold => Self::BOLD_ADVANCE,
        };
        text.chars().count() as f64 * advance * f64::from(font.size)
    }

    fn line_height(&self, font: FontSpec) -> f64 {
        Self::LINE_HEIGHT * f64::from(font.size)
    }
}

/// Axis-aligned rectangle in points, origin at the top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether `other` lies entirely inside this rectangle (with a small tolerance).
    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-6;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }
}

/// Binary asset an image operation refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetRef {
    Logo,
    Qr,
    /// Position in the list of image attachments.
    Gallery(usize),
}

/// A single drawing instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// One line of text; `y` is the top of the line box.
    Text {
        x: f64,
        y: f64,
        text: String,
        font: FontSpec,
    },
    /// An image scaled to exactly fill `rect`.
    Image { asset: AssetRef, rect: Rect },
    /// A straight stroke in the default line style.
    Line { from: (f64, f64), to: (f64, f64) },
}

/// Drawing instructions for one page, in paint order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PagePlan {
    pub ops: Vec<DrawOp>,
}

impl PagePlan {
    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn extend<I>(&mut self, ops: I)
    where
        I: IntoIterator<Item = DrawOp>,
    {
        self.ops.extend(ops);
    }

    /// Text of every text operation on the page.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Image operations on the page.
    pub fn images(&self) -> impl Iterator<Item = (AssetRef, Rect)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Image { asset, rect } => Some((*asset, *rect)),
            _ => None,
        })
    }

    /// Number of gallery images drawn on the page.
    pub fn gallery_image_count(&self) -> usize {
        self.images()
            .filter(|(asset, _)| matches!(asset, AssetRef::Gallery(_)))
            .count()
    }
}

/// A fully laid out document.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportPlan {
    pub geometry: PageGeometry,
    pub pages: Vec<PagePlan>,
}

impl ReportPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether any page draws the given asset.
    pub fn draws(&self, asset: AssetRef) -> bool {
        self.pages
            .iter()
            .flat_map(|page| page.images())
            .any(|(drawn, _)| drawn == asset)
    }
}
