//! Printable renderings of a saved shopping list.

use time::Duration;

use super::aggregate::{group_by_category, ShoppingListItem};
use super::dto::ShoppingListView;

pub mod pdf;
pub mod text;

/// One row of the printable document; both renderers walk the same rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Title(String),
    Meta(String),
    Heading(String),
    Item { label: String, checked: bool },
}

pub fn format_quantity(quantity: f64) -> String {
    let s = format!("{quantity:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// `Potatoes - 1.5 kg`, or just the name when nothing else is known.
pub fn item_label(item: &ShoppingListItem) -> String {
    let amount = match (item.quantity, item.unit.as_deref()) {
        (Some(q), Some(u)) => Some(format!("{} {u}", format_quantity(q))),
        (Some(q), None) => Some(format_quantity(q)),
        (None, Some(u)) => Some(u.to_string()),
        (None, None) => None,
    };
    match amount {
        Some(amount) => format!("{} - {amount}", item.name),
        None => item.name.clone(),
    }
}

pub fn document_lines(list: &ShoppingListView) -> Vec<Line> {
    let mut lines = vec![Line::Title(list.name.clone())];
    if let Some(monday) = list.week_start_date {
        lines.push(Line::Meta(format!(
            "Week: {} to {}",
            monday,
            monday + Duration::days(6)
        )));
    }
    let checked = list.items.iter().filter(|i| i.is_checked).count();
    lines.push(Line::Meta(format!(
        "{} items, {} checked",
        list.items.len(),
        checked
    )));

    for group in group_by_category(&list.items) {
        lines.push(Line::Heading(group.label));
        lines.extend(group.items.iter().map(|item| Line::Item {
            label: item_label(item),
            checked: item.is_checked,
        }));
    }
    lines
}

/// Replaces characters the built-in PDF fonts cannot show.
pub fn to_ascii(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        let mapped: &str = match c {
            'ą' | 'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => "a",
            'Ą' | 'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => "A",
            'ć' | 'č' | 'ç' => "c",
            'Ć' | 'Č' | 'Ç' => "C",
            'ę' | 'é' | 'è' | 'ê' | 'ë' | 'ě' => "e",
            'Ę' | 'É' | 'È' | 'Ê' | 'Ë' | 'Ě' => "E",
            'í' | 'ì' | 'î' | 'ï' => "i",
            'Í' | 'Ì' | 'Î' | 'Ï' => "I",
            'ł' => "l",
            'Ł' => "L",
            'ń' | 'ñ' | 'ň' => "n",
            'Ń' | 'Ñ' | 'Ň' => "N",
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' => "o",
            'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' | 'Ø' => "O",
            'ś' | 'š' => "s",
            'Ś' | 'Š' => "S",
            'ú' | 'ù' | 'û' | 'ü' | 'ů' => "u",
            'Ú' | 'Ù' | 'Û' | 'Ü' | 'Ů' => "U",
            'ý' | 'ÿ' => "y",
            'Ý' => "Y",
            'ź' | 'ż' | 'ž' => "z",
            'Ź' | 'Ż' | 'Ž' => "Z",
            'ß' => "ss",
            'æ' => "ae",
            'Æ' => "AE",
            '–' | '—' => "-",
            '‘' | '’' => "'",
            '“' | '„' | '”' => "\"",
            '…' => "...",
            '½' => "1/2",
            '¼' => "1/4",
            '¾' => "3/4",
            '°' => " deg",
            c if c.is_whitespace() => " ",
            c if c.is_ascii() && !c.is_ascii_control() => {
                out.push(c);
                continue;
            }
            _ => "?",
        };
        out.push_str(mapped);
    }
    out
}

/// `shopping-list-<slug>.<ext>` built from the list name.
pub fn file_name(list_name: &str, extension: &str) -> String {
    let mut slug = String::new();
    for c in to_ascii(list_name).to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        format!("shopping-list.{extension}")
    } else {
        format!("shopping-list-{slug}.{extension}")
    }
}
