//! Page geometry and the vertical layout cursor.

/// A4 portrait width in points.
pub const A4_WIDTH_PT: f64 = 595.28;
/// A4 portrait height in points.
pub const A4_HEIGHT_PT: f64 = 841.89;

/// Distance from the bottom margin up to the footer rule.
pub const FOOTER_RULE_OFFSET: f64 = 20.0;
/// Clearance kept between body content and the footer rule.
pub const FOOTER_CLEARANCE: f64 = 4.0;

/// Page margins in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 40.0,
            left: 50.0,
            right: 50.0,
            bottom: 40.0,
        }
    }
}

/// Content box of a page, derived from its size and margins.
///
/// `content_bottom` is the lowest point body content may reach; the footer band below it is
/// reserved for the rule and the generation timestamp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub content_left: f64,
    pub content_right: f64,
    pub content_top: f64,
    pub content_bottom: f64,
    pub content_width: f64,
    pub footer_rule_y: f64,
}

impl PageGeometry {
    /// Derives the content box.  Returns `None` when the margins leave no room for content.
    pub fn new(page_width: f64, page_height: f64, margins: Margins) -> Option<Self> {
        let geometry = Self::derive(page_width, page_height, margins);
        if geometry.content_right <= geometry.content_left
            || geometry.content_bottom <= geometry.content_top
        {
            return None;
        }
        Some(geometry)
    }

    /// A4 portrait with the report's default margins.
    pub fn a4() -> Self {
        Self::derive(A4_WIDTH_PT, A4_HEIGHT_PT, Margins::default())
    }

    fn derive(page_width: f64, page_height: f64, margins: Margins) -> Self {
        let content_left = margins.left;
        let content_right = page_width - margins.right;
        let footer_rule_y = page_height - margins.bottom - FOOTER_RULE_OFFSET;

        Self {
            page_width,
            page_height,
            content_left,
            content_right,
            content_top: margins.top,
            content_bottom: footer_rule_y - FOOTER_CLEARANCE,
            content_width: content_right - content_left,
            footer_rule_y,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Vertical position on the current page, in points from the page top.
///
/// A cursor only moves down within a page; [`Cursor::page_top`] starts a fresh page.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Cursor(f64);

impl Cursor {
    pub fn at(y: f64) -> Self {
        Self(y)
    }

    /// Cursor at the top of the content box.
    pub fn page_top(geometry: &PageGeometry) -> Self {
        Self(geometry.content_top)
    }

    pub fn y(self) -> f64 {
        self.0
    }

    /// Moves down to `y`; positions above the cursor leave it where it is.
    pub fn advance_to(self, y: f64) -> Self {
        Self(self.0.max(y))
    }

    /// Moves down by `delta` points.
    pub fn advance_by(self, delta: f64) -> Self {
        self.advance_to(self.0 + delta)
    }
}

#[cfg(test)]
mod tests {
    use super::{Cursor, Margins, PageGeometry, A4_HEIGHT_PT, A4_WIDTH_PT};

    #[test]
    fn a4_matches_derived_geometry() {
        let derived = PageGeometry::new(A4_WIDTH_PT, A4_HEIGHT_PT, Margins::default())
            .expect("A4 has room for content");
        assert_eq!(derived, PageGeometry::a4());
        assert!(derived.content_right > derived.content_left);
        assert!(derived.content_bottom > derived.content_top);
        assert!(derived.footer_rule_y > derived.content_bottom);
        assert!((derived.content_width - 495.28).abs() < 1e-9);
    }

    #[test]
    fn rejects_margins_without_content() {
        let margins = Margins {
            left: 300.0,
            right: 300.0,
            ..Margins::default()
        };
        assert!(PageGeometry::new(A4_WIDTH_PT, A4_HEIGHT_PT, margins).is_none());
    }

    #[test]
    fn cursor_never_moves_up() {
        let cursor = Cursor::at(100.0);
        assert_eq!(cursor.advance_to(80.0).y(), 100.0);
        assert_eq!(cursor.advance_to(120.0).y(), 120.0);
        assert_eq!(cursor.advance_by(-5.0).y(), 100.0);
    }
}
