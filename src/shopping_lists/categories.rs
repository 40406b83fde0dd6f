use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

/// Fixed grouping used for display and export, in display order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Vegetables,
    Fruits,
    MeatFish,
    DairyEggs,
    BakeryGrains,
    SpicesHerbs,
    Pantry,
    Frozen,
    Beverages,
    #[default]
    Other,
}

impl Category {
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Vegetables => "Vegetables",
            Category::Fruits => "Fruits",
            Category::MeatFish => "Meat & fish",
            Category::DairyEggs => "Dairy & eggs",
            Category::BakeryGrains => "Bakery & grains",
            Category::SpicesHerbs => "Spices & herbs",
            Category::Pantry => "Pantry",
            Category::Frozen => "Frozen",
            Category::Beverages => "Beverages",
            Category::Other => "Other",
        }
    }
}

const KEYWORDS: &[(&str, Category)] = &[
    // vegetables
    ("tomato", Category::Vegetables),
    ("potato", Category::Vegetables),
    ("sweet potato", Category::Vegetables),
    ("onion", Category::Vegetables),
    ("garlic", Category::Vegetables),
    ("carrot", Category::Vegetables),
    ("cucumber", Category::Vegetables),
    ("lettuce", Category::Vegetables),
    ("spinach", Category::Vegetables),
    ("broccoli", Category::Vegetables),
    ("cauliflower", Category::Vegetables),
    ("cabbage", Category::Vegetables),
    ("zucchini", Category::Vegetables),
    ("eggplant", Category::Vegetables),
    ("bell pepper", Category::Vegetables),
    ("red pepper", Category::Vegetables),
    ("green pepper", Category::Vegetables),
    ("celery", Category::Vegetables),
    ("leek", Category::Vegetables),
    ("mushroom", Category::Vegetables),
    ("pumpkin", Category::Vegetables),
    ("butternut squash", Category::Vegetables),
    ("beetroot", Category::Vegetables),
    ("radish", Category::Vegetables),
    ("kale", Category::Vegetables),
    ("peas", Category::Vegetables),
    ("corn", Category::Vegetables),
    ("asparagus", Category::Vegetables),
    ("green beans", Category::Vegetables),
    ("shallot", Category::Vegetables),
    // fruits
    ("apple", Category::Fruits),
    ("banana", Category::Fruits),
    ("orange", Category::Fruits),
    ("lemon", Category::Fruits),
    ("lime", Category::Fruits),
    ("strawberry", Category::Fruits),
    ("blueberry", Category::Fruits),
    ("raspberry", Category::Fruits),
    ("grape", Category::Fruits),
    ("pear", Category::Fruits),
    ("peach", Category::Fruits),
    ("plum", Category::Fruits),
    ("cherry", Category::Fruits),
    ("mango", Category::Fruits),
    ("pineapple", Category::Fruits),
    ("avocado", Category::Fruits),
    ("kiwi", Category::Fruits),
    ("melon", Category::Fruits),
    // meat & fish
    ("chicken", Category::MeatFish),
    ("beef", Category::MeatFish),
    ("pork", Category::MeatFish),
    ("turkey", Category::MeatFish),
    ("ham", Category::MeatFish),
    ("bacon", Category::MeatFish),
    ("sausage", Category::MeatFish),
    ("lamb", Category::MeatFish),
    ("veal", Category::MeatFish),
    ("minced meat", Category::MeatFish),
    ("salmon", Category::MeatFish),
    ("tuna", Category::MeatFish),
    ("cod", Category::MeatFish),
    ("shrimp", Category::MeatFish),
    ("prawn", Category::MeatFish),
    ("fish", Category::MeatFish),
    ("duck", Category::MeatFish),
    // dairy & eggs
    ("milk", Category::DairyEggs),
    ("cheese", Category::DairyEggs),
    ("butter", Category::DairyEggs),
    ("cream", Category::DairyEggs),
    ("sour cream", Category::DairyEggs),
    ("yogurt", Category::DairyEggs),
    ("yoghurt", Category::DairyEggs),
    ("egg", Category::DairyEggs),
    ("mozzarella", Category::DairyEggs),
    ("parmesan", Category::DairyEggs),
    ("feta", Category::DairyEggs),
    ("kefir", Category::DairyEggs),
    // bakery & grains
    ("bread", Category::BakeryGrains),
    ("baguette", Category::BakeryGrains),
    ("bun", Category::BakeryGrains),
    ("tortilla", Category::BakeryGrains),
    ("flour", Category::BakeryGrains),
    ("pasta", Category::BakeryGrains),
    ("spaghetti", Category::BakeryGrains),
    ("noodle", Category::BakeryGrains),
    ("rice", Category::BakeryGrains),
    ("oats", Category::BakeryGrains),
    ("rolled oats", Category::BakeryGrains),
    ("couscous", Category::BakeryGrains),
    ("quinoa", Category::BakeryGrains),
    ("buckwheat", Category::BakeryGrains),
    ("breadcrumbs", Category::BakeryGrains),
    // spices & herbs
    ("salt", Category::SpicesHerbs),
    ("pepper", Category::SpicesHerbs),
    ("black pepper", Category::SpicesHerbs),
    ("paprika", Category::SpicesHerbs),
    ("cumin", Category::SpicesHerbs),
    ("cinnamon", Category::SpicesHerbs),
    ("oregano", Category::SpicesHerbs),
    ("basil", Category::SpicesHerbs),
    ("thyme", Category::SpicesHerbs),
    ("rosemary", Category::SpicesHerbs),
    ("parsley", Category::SpicesHerbs),
    ("dill", Category::SpicesHerbs),
    ("bay leaf", Category::SpicesHerbs),
    ("bay leaves", Category::SpicesHerbs),
    ("nutmeg", Category::SpicesHerbs),
    ("chili", Category::SpicesHerbs),
    ("curry", Category::SpicesHerbs),
    ("turmeric", Category::SpicesHerbs),
    ("ginger", Category::SpicesHerbs),
    ("vanilla", Category::SpicesHerbs),
    ("coriander", Category::SpicesHerbs),
    ("marjoram", Category::SpicesHerbs),
    // pantry
    ("oil", Category::Pantry),
    ("olive oil", Category::Pantry),
    ("vinegar", Category::Pantry),
    ("sugar", Category::Pantry),
    ("honey", Category::Pantry),
    ("sauce", Category::Pantry),
    ("tomato sauce", Category::Pantry),
    ("tomato paste", Category::Pantry),
    ("passata", Category::Pantry),
    ("ketchup", Category::Pantry),
    ("mustard", Category::Pantry),
    ("mayonnaise", Category::Pantry),
    ("stock", Category::Pantry),
    ("chicken stock", Category::Pantry),
    ("chicken broth", Category::Pantry),
    ("broth", Category::Pantry),
    ("canned", Category::Pantry),
    ("chickpeas", Category::Pantry),
    ("lentils", Category::Pantry),
    ("beans", Category::Pantry),
    ("almonds", Category::Pantry),
    ("walnuts", Category::Pantry),
    ("nuts", Category::Pantry),
    ("peanut butter", Category::Pantry),
    ("coconut milk", Category::Pantry),
    ("jam", Category::Pantry),
    ("chocolate", Category::Pantry),
    ("cocoa", Category::Pantry),
    ("baking powder", Category::Pantry),
    ("baking soda", Category::Pantry),
    ("yeast", Category::Pantry),
    // frozen
    ("frozen", Category::Frozen),
    ("ice cream", Category::Frozen),
    // beverages
    ("water", Category::Beverages),
    ("juice", Category::Beverages),
    ("coffee", Category::Beverages),
    ("tea", Category::Beverages),
    ("wine", Category::Beverages),
    ("beer", Category::Beverages),
];

/// `word` is `keyword` or one of its plural forms.
fn matches_word(word: &str, keyword: &str) -> bool {
    match word.strip_prefix(keyword) {
        Some("") | Some("s") | Some("es") => true,
        _ => keyword
            .strip_suffix('y')
            .and_then(|stem| word.strip_prefix(stem))
            .is_some_and(|rest| rest == "ies"),
    }
}

/// Keyword words must line up with consecutive words of the name. Leading
/// words match exactly; the last one may also be plural.
fn matches_words(name_words: &[&str], keyword: &str) -> bool {
    let kw: Vec<&str> = keyword.split(' ').collect();
    let Some((last, leading)) = kw.split_last() else {
        return false;
    };
    if kw.len() > name_words.len() {
        return false;
    }
    name_words.windows(kw.len()).any(|w| {
        w.iter().zip(leading).all(|(n, k)| n == k) && matches_word(w[leading.len()], last)
    })
}

/// Category of the longest keyword found in `normalized_name`, ties going to
/// the earlier category; `Other` when none match.
pub fn categorize(normalized_name: &str) -> Category {
    let words: Vec<&str> = normalized_name.split_whitespace().collect();
    KEYWORDS
        .iter()
        .filter(|(kw, _)| matches_words(&words, kw))
        .max_by_key(|(kw, c)| (kw.len(), Reverse(*c)))
        .map(|(_, c)| *c)
        .unwrap_or_default()
}
