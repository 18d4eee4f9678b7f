//! Document construction helpers.

use std::cell::Cell;
use std::rc::Rc;

use genpdf::error::Error;
use genpdf::style::Style;
use genpdf::{self, PageDecorator, PaperSize, Size};

use crate::fonts;

/// Builder for `genpdf::Document` instances with the report defaults: A4 paper, the report font
/// family, no page margins (layout positions are absolute) and a page counter.
pub struct DocumentBuilder {
    title: Option<String>,
    paper_size: Size,
    pages: Rc<Cell<usize>>,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self {
            title: None,
            paper_size: PaperSize::A4.into(),
            pages: Rc::new(Cell::new(0)),
        }
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Handle to the number of pages started by the built document.
    ///
    /// The value is only meaningful once the document has been rendered.
    pub fn page_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.pages)
    }

    /// Builds a configured `genpdf::Document`.
    pub fn build(self) -> Result<genpdf::Document, Error> {
        let font_family = fonts::default_font_family()?;
        let mut document = genpdf::Document::new(font_family);

        if let Some(title) = self.title {
            document.set_title(title);
        }
        document.set_paper_size(self.paper_size);
        document.set_page_decorator(PageCounter { pages: self.pages });

        Ok(document)
    }
}

struct PageCounter {
    pages: Rc<Cell<usize>>,
}

impl PageDecorator for PageCounter {
    fn decorate_page<'a>(
        &mut self,
        _context: &genpdf::Context,
        area: genpdf::render::Area<'a>,
        _style: Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.pages.set(self.pages.get() + 1);
        Ok(area)
    }
}
