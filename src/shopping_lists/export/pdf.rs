use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use super::{to_ascii, Line};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const FOOTER_Y: f32 = 12.0;
/// Vertical space available for rows on one page.
const USABLE_HEIGHT: f32 = PAGE_HEIGHT - 2.0 * MARGIN - 10.0;

/// Characters that fit on one row of the 170 mm text column, sized for the
/// widest common Helvetica glyphs.
const TITLE_CHARS: usize = 40;
const ITEM_CHARS: usize = 68;

impl Line {
    /// Height of one printed row of this line.
    fn row_height(&self) -> f32 {
        match self {
            Line::Title(_) => 14.0,
            Line::Meta(_) => 7.0,
            Line::Heading(_) => 12.0,
            Line::Item { .. } => 7.0,
        }
    }

    /// The printed rows, long titles and item labels wrapped.
    fn rows(&self) -> Vec<String> {
        match self {
            Line::Title(t) => wrap(&to_ascii(t), TITLE_CHARS),
            Line::Meta(m) | Line::Heading(m) => vec![to_ascii(m)],
            Line::Item { label, .. } => wrap(&to_ascii(label), ITEM_CHARS),
        }
    }

    fn height(&self) -> f32 {
        self.row_height() * self.rows().len() as f32
    }
}

/// Greedy word wrap; words longer than a row are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while word.len() > width {
            if !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            let (head, tail) = word.split_at(width);
            rows.push(head.to_string());
            word = tail;
        }
        if word.is_empty() {
            continue;
        }
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            rows.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

/// Splits rows into pages. A heading never ends a page: if its first item
/// would not fit, the heading moves to the next page with it.
pub fn paginate(lines: &[Line]) -> Vec<Vec<Line>> {
    let mut pages: Vec<Vec<Line>> = vec![Vec::new()];
    let mut used = 0.0;

    for (idx, line) in lines.iter().enumerate() {
        let mut needed = line.height();
        if let (Line::Heading(_), Some(next)) = (line, lines.get(idx + 1)) {
            needed += next.height();
        }
        let current_empty = pages.last().map_or(true, Vec::is_empty);
        if used + needed > USABLE_HEIGHT && !current_empty {
            pages.push(Vec::new());
            used = 0.0;
        }
        used += line.height();
        if let Some(page) = pages.last_mut() {
            page.push(line.clone());
        }
    }
    pages
}

fn pdf_error<E: std::fmt::Debug>(e: E) -> anyhow::Error {
    anyhow::anyhow!("pdf rendering failed: {e:?}")
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Draws `line` with its first row just below `top`.
fn draw_line(layer: &PdfLayerReference, fonts: &Fonts, line: &Line, top: f32) {
    let (size, x, font) = match line {
        Line::Title(_) => (20.0, MARGIN, &fonts.bold),
        Line::Meta(_) => (10.0, MARGIN, &fonts.regular),
        Line::Heading(_) => (13.0, MARGIN, &fonts.bold),
        Line::Item { .. } => (11.0, MARGIN + 10.0, &fonts.regular),
    };
    let step = line.row_height();
    if let Line::Item { checked, .. } = line {
        let mark = if *checked { "[x]" } else { "[ ]" };
        layer.use_text(mark, 11.0, Mm(MARGIN + 2.0), Mm(top - step), &fonts.regular);
    }
    for (n, row) in line.rows().into_iter().enumerate() {
        layer.use_text(row, size, Mm(x), Mm(top - step * (n + 1) as f32), font);
    }
}

/// A4 document with a `Page n of m` footer on every page.
pub fn render(title: &str, lines: &[Line]) -> anyhow::Result<Vec<u8>> {
    let pages = paginate(lines);
    let total = pages.len();
    let title = to_ascii(title);

    let (doc, first_page, first_layer) =
        PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?,
    };

    let mut targets = vec![(first_page, first_layer)];
    for n in 1..total {
        targets.push(doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Layer {}", n + 1)));
    }

    for (n, (rows, (page, layer))) in pages.iter().zip(targets).enumerate() {
        let layer = doc.get_page(page).get_layer(layer);
        let mut y = PAGE_HEIGHT - MARGIN;
        for line in rows {
            draw_line(&layer, &fonts, line, y);
            y -= line.height();
        }
        layer.use_text(
            format!("Page {} of {}", n + 1, total),
            9.0,
            Mm(PAGE_WIDTH / 2.0 - 10.0),
            Mm(FOOTER_Y),
            &fonts.regular,
        );
    }

    doc.save_to_bytes().map_err(pdf_error)
}

#[cfg(test)]
mod tests {
    use super::super::{document_lines, tests::sample_list};
    use super::*;

    fn items(n: usize) -> Vec<Line> {
        (0..n)
            .map(|i| Line::Item {
                label: format!("item {i}"),
                checked: false,
            })
            .collect()
    }

    #[test]
    fn short_lists_fit_on_one_page() {
        let pages = paginate(&document_lines(&sample_list()));
        assert_eq!(pages.len(), 1);
        assert!(paginate(&[]).len() == 1);
    }

    #[test]
    fn long_lists_spill_over_without_losing_rows() {
        let mut lines = vec![Line::Title("Big".into()), Line::Heading("Other".into())];
        lines.extend(items(200));
        let pages = paginate(&lines);
        assert!(pages.len() > 1);
        assert_eq!(pages.iter().map(Vec::len).sum::<usize>(), lines.len());
        for page in &pages {
            let height: f32 = page.iter().map(Line::height).sum();
            assert!(height <= USABLE_HEIGHT);
        }
    }

    #[test]
    fn headings_are_never_left_at_the_bottom() {
        let mut lines = vec![Line::Title("Big".into())];
        for section in 0..20 {
            lines.push(Line::Heading(format!("Section {section}")));
            lines.extend(items(5));
        }
        for page in paginate(&lines) {
            assert!(!matches!(page.last(), Some(Line::Heading(_))));
        }
    }

    #[test]
    fn long_labels_wrap_within_the_column() {
        let name = "Extra virgin cold pressed olive oil from Andalusia ".repeat(2);
        let label = format!("{} - 2 kg", name.trim_end());
        let line = Line::Item {
            label: label.clone(),
            checked: false,
        };
        let rows = line.rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() <= ITEM_CHARS));
        assert_eq!(rows.join(" "), label);
        assert_eq!(line.height(), 14.0);
    }

    #[test]
    fn unbroken_words_are_split() {
        let rows = wrap(&"x".repeat(150), ITEM_CHARS);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), ITEM_CHARS);
        assert_eq!(rows.concat().len(), 150);
        assert_eq!(wrap("", ITEM_CHARS), vec![String::new()]);
    }

    #[test]
    fn wrapped_items_are_paginated_by_their_full_height() {
        let mut lines = vec![Line::Title("Big".into())];
        lines.extend((0..60).map(|i| Line::Item {
            label: format!("{i} {}", "long ingredient name ".repeat(5)),
            checked: false,
        }));
        for page in paginate(&lines) {
            let height: f32 = page.iter().map(Line::height).sum();
            assert!(height <= USABLE_HEIGHT);
        }
    }

    #[test]
    fn renders_a_pdf_document() {
        let list = sample_list();
        let bytes = render(&list.name, &document_lines(&list)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_many_pages() {
        let mut lines = vec![Line::Title("Big".into())];
        lines.extend(items(120));
        let bytes = render("Big", &lines).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
