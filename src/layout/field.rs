//! Label/value rows of the record block.

use super::text::wrap_text;
use super::{Cursor, DrawOp, FontSpec, PageGeometry, TextMeasure};
use crate::model::PLACEHOLDER;

/// Typography and spacing of a field row.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldStyle {
    pub label_font: FontSpec,
    pub value_font: FontSpec,
    /// Width of the label column.
    pub label_width: f64,
    /// Gap between the label column and the value.
    pub column_gap: f64,
    /// Minimum advance of a row, whatever its content.
    pub min_line_height: f64,
    /// Extra space added below every row.
    pub padding: f64,
    /// Lower bound for the value column width on very narrow pages.
    pub min_value_width: f64,
}

impl Default for FieldStyle {
    fn default() -> Self {
        Self {
            label_font: FontSpec::bold(10),
            value_font: FontSpec::regular(10),
            label_width: 140.0,
            column_gap: 6.0,
            min_line_height: 18.0,
            padding: 4.0,
            min_value_width: 10.0,
        }
    }
}

/// Result of laying out one field row.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldLayout {
    pub ops: Vec<DrawOp>,
    /// Cursor for the next row.
    pub next: Cursor,
}

/// Result of laying out a field row that may continue over several pages.
#[derive(Clone, Debug, PartialEq)]
pub struct PagedFieldLayout {
    /// Operations per page; the first entry belongs to the page the row starts on.
    pub pages: Vec<Vec<DrawOp>>,
    /// Cursor for the next row, on the last page.
    pub next: Cursor,
}

/// Lays out `label` and `value` at `cursor`.
///
/// The value column runs from the end of the label column to the right content edge and wraps
/// as needed.  The returned cursor is `max(cursor + min_line_height, rendered_bottom) + padding`,
/// so a wrapped value pushes the following rows down while short values keep the fixed rhythm.
#[allow(clippy::too_many_arguments)]
pub fn draw_field(
    cursor: Cursor,
    label: &str,
    value: Option<&str>,
    left_x: f64,
    label_width: f64,
    style: &FieldStyle,
    geometry: &PageGeometry,
    measure: &dyn TextMeasure,
) -> FieldLayout {
    let row = FieldRow::new(label, value, left_x, label_width, style, geometry, measure);
    let layout = row.flow(cursor, None);
    FieldLayout {
        ops: layout.pages.into_iter().flatten().collect(),
        next: layout.next,
    }
}

/// Lays out a field row like [`draw_field`], moving lines that would cross `content_bottom` to
/// the top of a new page.  A line already at the page top is never moved.
#[allow(clippy::too_many_arguments)]
pub fn draw_field_paged(
    cursor: Cursor,
    label: &str,
    value: Option<&str>,
    left_x: f64,
    label_width: f64,
    style: &FieldStyle,
    geometry: &PageGeometry,
    measure: &dyn TextMeasure,
) -> PagedFieldLayout {
    let row = FieldRow::new(label, value, left_x, label_width, style, geometry, measure);
    row.flow(cursor, Some(geometry))
}

struct FieldRow<'a> {
    label_lines: Vec<String>,
    value_lines: Vec<String>,
    left_x: f64,
    value_x: f64,
    style: &'a FieldStyle,
    measure: &'a dyn TextMeasure,
}

/// Where a column's last line ended.
struct ColumnEnd {
    page: usize,
    bottom: f64,
}

impl<'a> FieldRow<'a> {
    fn new(
        label: &str,
        value: Option<&str>,
        left_x: f64,
        label_width: f64,
        style: &'a FieldStyle,
        geometry: &PageGeometry,
        measure: &'a dyn TextMeasure,
    ) -> Self {
        let value = value
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(PLACEHOLDER);
        let value_x = left_x + label_width + style.column_gap;
        let value_width = (geometry.content_right - value_x).max(style.min_value_width);

        Self {
            label_lines: wrap_text(label, label_width, style.label_font, measure),
            value_lines: wrap_text(value, value_width, style.value_font, measure),
            left_x,
            value_x,
            style,
            measure,
        }
    }

    /// Emits both columns from `cursor`; with `breaks`, lines past its `content_bottom` move on.
    fn flow(&self, cursor: Cursor, breaks: Option<&PageGeometry>) -> PagedFieldLayout {
        let mut pages = vec![Vec::new()];
        let label = push_lines(
            &mut pages,
            &self.label_lines,
            self.left_x,
            cursor.y(),
            self.style.label_font,
            self.measure,
            breaks,
        );
        let value = push_lines(
            &mut pages,
            &self.value_lines,
            self.value_x,
            cursor.y(),
            self.style.value_font,
            self.measure,
            breaks,
        );

        let last_page = label.page.max(value.page);
        let row_top = match breaks {
            Some(geometry) if last_page > 0 => geometry.content_top,
            _ => cursor.y(),
        };
        let bottom = [label, value]
            .iter()
            .filter(|end| end.page == last_page)
            .map(|end| end.bottom)
            .fold(row_top, f64::max);

        let next = Cursor::at(row_top)
            .advance_by(self.style.min_line_height)
            .advance_to(bottom)
            .advance_by(self.style.padding);

        PagedFieldLayout { pages, next }
    }
}

/// Emits one text op per line and returns the page and bottom of the last line.
fn push_lines(
    pages: &mut Vec<Vec<DrawOp>>,
    lines: &[String],
    x: f64,
    top: f64,
    font: FontSpec,
    measure: &dyn TextMeasure,
    breaks: Option<&PageGeometry>,
) -> ColumnEnd {
    let line_height = measure.line_height(font);
    let mut page = 0;
    let mut y = top;

    for text in lines {
        if let Some(geometry) = breaks {
            if y + line_height > geometry.content_bottom && y > geometry.content_top {
                page += 1;
                y = geometry.content_top;
                if pages.len() <= page {
                    pages.push(Vec::new());
                }
            }
        }
        if !text.is_empty() {
            pages[page].push(DrawOp::Text {
                x,
                y,
                text: text.clone(),
                font,
            });
        }
        y += line_height;
    }

    ColumnEnd { page, bottom: y }
}

#[cfg(test)]
mod tests {
    use super::{draw_field, draw_field_paged, FieldStyle};
    use crate::layout::{ApproximateMeasure, Cursor, DrawOp, PageGeometry, TextMeasure};

    fn field(cursor: Cursor, label: &str, value: Option<&str>) -> super::FieldLayout {
        let style = FieldStyle::default();
        draw_field(
            cursor,
            label,
            value,
            50.0,
            style.label_width,
            &style,
            &PageGeometry::a4(),
            &ApproximateMeasure,
        )
    }

    #[test]
    fn short_value_uses_fixed_line_height() {
        let layout = field(Cursor::at(200.0), "CPR:", Some("1º CPR"));
        assert!((layout.next.y() - (200.0 + 18.0 + 4.0)).abs() < 1e-9);
    }

    #[test]
    fn missing_value_renders_placeholder() {
        let layout = field(Cursor::at(200.0), "Endereço:", None);
        let texts: Vec<_> = layout
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Endereço:", "-"]);
    }

    #[test]
    fn value_starts_after_label_column() {
        let layout = field(Cursor::at(200.0), "CPR:", Some("1º CPR"));
        let value_x = layout.ops.iter().find_map(|op| match op {
            DrawOp::Text { x, text, .. } if text == "1º CPR" => Some(*x),
            _ => None,
        });
        assert_eq!(value_x, Some(50.0 + 140.0 + 6.0));
    }

    #[test]
    fn wrapped_value_pushes_cursor_further() {
        let long = "Rua das Acácias, quadra 204, conjunto B, lote 17, próximo ao posto de \
                    combustível da via principal, Brasília - DF";
        let layout = field(Cursor::at(200.0), "Endereço:", Some(long));
        assert!(layout.next.y() > 200.0 + 18.0 + 4.0);

        let value_lines = layout
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { x, .. } if *x > 50.0))
            .count();
        assert!(value_lines > 1);
    }

    #[test]
    fn value_lines_stay_inside_content_box() {
        let geometry = PageGeometry::a4();
        let long = "palavra ".repeat(60);
        let layout = field(Cursor::at(200.0), "Observações:", Some(&long));
        let measure = ApproximateMeasure;
        for op in &layout.ops {
            if let DrawOp::Text { x, text, font, .. } = op {
                assert!(x + measure.text_width(text, *font) <= geometry.content_right + 1e-9);
            }
        }
    }

    #[test]
    fn cursor_is_monotonic_over_many_fields() {
        let values = [
            Some("1º CPR"),
            None,
            Some("x"),
            Some(
                "um valor bem mais longo que ocupa várias linhas na coluna de valores do \
                 relatório gerado",
            ),
            Some(""),
        ];
        let mut cursor = Cursor::at(200.0);
        for value in values {
            let next = field(cursor, "Campo:", value).next;
            assert!(next.y() >= cursor.y() + 18.0);
            cursor = next;
        }
    }

    fn paged(cursor: Cursor, value: &str) -> super::PagedFieldLayout {
        let style = FieldStyle::default();
        draw_field_paged(
            cursor,
            "Observações:",
            Some(value),
            50.0,
            style.label_width,
            &style,
            &PageGeometry::a4(),
            &ApproximateMeasure,
        )
    }

    #[test]
    fn paged_row_matches_plain_row_when_it_fits() {
        let style = FieldStyle::default();
        let plain = draw_field(
            Cursor::at(200.0),
            "Observações:",
            Some("curta"),
            50.0,
            style.label_width,
            &style,
            &PageGeometry::a4(),
            &ApproximateMeasure,
        );
        let paged = paged(Cursor::at(200.0), "curta");

        assert_eq!(paged.pages, vec![plain.ops]);
        assert_eq!(paged.next, plain.next);
    }

    #[test]
    fn value_longer_than_a_page_continues_at_page_top() {
        let geometry = PageGeometry::a4();
        let measure = ApproximateMeasure;
        let long = "palavra ".repeat(900);
        let layout = paged(Cursor::at(600.0), &long);

        assert!(layout.pages.len() > 2);
        let mut words = 0;
        for (index, ops) in layout.pages.iter().enumerate() {
            let mut tops = Vec::new();
            for op in ops {
                if let DrawOp::Text { y, text, font, .. } = op {
                    assert!(y + measure.line_height(*font) <= geometry.content_bottom + 1e-9);
                    tops.push(*y);
                    if text != "Observações:" {
                        words += text.split_whitespace().count();
                    }
                }
            }
            if index > 0 {
                let first = tops.iter().copied().fold(f64::INFINITY, f64::min);
                assert!((first - geometry.content_top).abs() < 1e-9);
            }
        }
        assert_eq!(words, 900);

        assert!(layout.next.y() > geometry.content_top);
        assert!(layout.next.y() <= geometry.content_bottom + 18.0 + 4.0);
    }
}
