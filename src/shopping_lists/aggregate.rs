use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::categories::{categorize, Category};

/// One ingredient occurrence feeding the aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientLine {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

/// A shopping list entry, both in previews and in saved lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub is_checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: Category,
    pub label: String,
    pub items: Vec<ShoppingListItem>,
}

/// Trimmed, inner whitespace collapsed, lowercased.
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalize_unit(unit: Option<&str>) -> Option<String> {
    unit.map(normalize).filter(|u| !u.is_empty())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Default)]
struct Group {
    display_name: Option<String>,
    quantities: Vec<f64>,
}

/// Merges lines sharing a normalized `(name, unit)`.
///
/// The result does not depend on input order: quantities are summed in
/// ascending order, the display name is the lexicographically smallest
/// spelling seen, units are shown normalized, and items come out sorted by
/// category and then by normalized name.
/// A group whose lines carry no quantity gets `None`.
pub fn aggregate<I>(lines: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = IngredientLine>,
{
    let mut groups: BTreeMap<(String, Option<String>), Group> = BTreeMap::new();

    for line in lines {
        let name = line.name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            continue;
        }
        let key = (normalize(&name), normalize_unit(line.unit.as_deref()));

        let group = groups.entry(key).or_default();
        if group.display_name.as_ref().map_or(true, |n| name < *n) {
            group.display_name = Some(name);
        }
        if let Some(q) = line.quantity.filter(|q| q.is_finite()) {
            group.quantities.push(q);
        }
    }

    let mut items: Vec<(Category, String, ShoppingListItem)> = groups
        .into_iter()
        .map(|((norm_name, unit), mut group)| {
            let quantity = if group.quantities.is_empty() {
                None
            } else {
                group.quantities.sort_by(f64::total_cmp);
                Some(round2(group.quantities.iter().sum()))
            };
            let category = categorize(&norm_name);
            let item = ShoppingListItem {
                name: group.display_name.unwrap_or_else(|| norm_name.clone()),
                quantity,
                unit,
                category,
                is_checked: false,
            };
            (category, norm_name, item)
        })
        .collect();

    // BTreeMap order already breaks ties on the unit.
    items.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    items.into_iter().map(|(_, _, item)| item).collect()
}

/// Non-empty categories in display order, items keeping their relative order.
pub fn group_by_category(items: &[ShoppingListItem]) -> Vec<CategoryGroup> {
    Category::all()
        .filter_map(|category| {
            let members: Vec<_> = items
                .iter()
                .filter(|i| i.category == category)
                .cloned()
                .collect();
            (!members.is_empty()).then(|| CategoryGroup {
                category,
                label: category.label().to_string(),
                items: members,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, quantity: Option<f64>, unit: Option<&str>) -> IngredientLine {
        IngredientLine {
            name: name.into(),
            quantity,
            unit: unit.map(str::to_string),
        }
    }

    #[test]
    fn merges_by_normalized_name_and_unit() {
        let items = aggregate(vec![
            line("Potatoes", Some(500.0), Some("g")),
            line("  potatoes ", Some(250.0), Some(" G")),
            line("potatoes", Some(2.0), Some("kg")),
        ]);
        assert_eq!(items.len(), 2);
        let grams = items.iter().find(|i| i.unit.as_deref() == Some("g")).unwrap();
        assert_eq!(grams.quantity, Some(750.0));
        assert_eq!(grams.name, "Potatoes");
        assert_eq!(grams.category, Category::Vegetables);
    }

    #[test]
    fn units_are_shown_lowercase() {
        let items = aggregate(vec![
            line("flour", Some(100.0), Some("G")),
            line("flour", Some(50.0), Some("g")),
            line("milk", Some(1.0), Some(" Fl  Oz ")),
        ]);
        let flour = items.iter().find(|i| i.name == "flour").unwrap();
        assert_eq!(flour.unit.as_deref(), Some("g"));
        assert_eq!(flour.quantity, Some(150.0));
        let milk = items.iter().find(|i| i.name == "milk").unwrap();
        assert_eq!(milk.unit.as_deref(), Some("fl oz"));
    }

    #[test]
    fn empty_unit_counts_as_no_unit() {
        let items = aggregate(vec![
            line("eggs", Some(2.0), Some("  ")),
            line("eggs", Some(3.0), None),
        ]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, Some(5.0));
        assert_eq!(items[0].unit, None);
    }

    #[test]
    fn quantities_stay_null_when_none_are_given() {
        let items = aggregate(vec![line("salt", None, None), line("Salt", None, None)]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, None);

        let mixed = aggregate(vec![line("salt", None, None), line("salt", Some(1.5), None)]);
        assert_eq!(mixed[0].quantity, Some(1.5));
    }

    #[test]
    fn sums_are_rounded_to_two_decimals() {
        let items = aggregate(vec![
            line("milk", Some(0.1), Some("l")),
            line("milk", Some(0.2), Some("l")),
        ]);
        assert_eq!(items[0].quantity, Some(0.3));
    }

    #[test]
    fn result_ignores_input_order() {
        let lines = vec![
            line("Onion", Some(1.0), None),
            line("carrot", Some(0.333), Some("kg")),
            line("onion", Some(2.0), None),
            line("Carrot", Some(0.667), Some("kg")),
            line("bread", None, None),
            line("zzz mystery", Some(1.0), None),
        ];
        let mut reversed = lines.clone();
        reversed.reverse();
        let mut rotated = lines.clone();
        rotated.rotate_left(2);

        let expected = aggregate(lines);
        assert_eq!(aggregate(reversed), expected);
        assert_eq!(aggregate(rotated), expected);
        assert_eq!(expected[0].name, "Carrot");
        assert_eq!(expected.last().unwrap().category, Category::Other);
    }

    #[test]
    fn groups_follow_category_order() {
        let items = aggregate(vec![
            line("water", None, None),
            line("tomato", None, None),
            line("chicken breast", None, None),
        ]);
        let groups = group_by_category(&items);
        let cats: Vec<_> = groups.iter().map(|g| g.category).collect();
        assert_eq!(cats, [Category::Vegetables, Category::MeatFish, Category::Beverages]);
        assert_eq!(groups[1].label, "Meat & fish");
    }

    #[test]
    fn blank_names_are_dropped() {
        assert!(aggregate(vec![line("   ", Some(1.0), None)]).is_empty());
    }
}
