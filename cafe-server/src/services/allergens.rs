//! Allergen derivation from ingredient ids

/// Category and the ingredient ids that identify it, in match priority order
const ALLERGEN_KEYWORDS: &[(&str, &[&str])] = &[
    ("gluten", &["wheat", "barley", "rye"]),
    ("lactose", &["milk", "cheese", "butter"]),
    ("nuts", &["almond", "walnut", "hazelnut"]),
    ("soy", &["soy", "soybean", "tofu"]),
    ("shellfish", &["shrimp", "crab", "lobster"]),
    ("eggs", &["egg", "albumin"]),
    ("fish", &["salmon", "tuna", "cod"]),
    ("peanuts", &["peanut", "groundnut"]),
    ("sesame", &["sesame", "tahini"]),
    ("mustard", &["mustard", "mustard seed"]),
    ("caffeine", &["espresso", "coffee"]),
];

/// First category listing this exact id (case-sensitive)
fn categorize(ingredient_id: &str) -> Option<&'static str> {
    ALLERGEN_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.contains(&ingredient_id))
        .map(|(category, _)| *category)
}

/// One entry per matching ingredient, in ingredient order. Repeats are kept.
pub fn derive_allergens<'a>(ingredient_ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    ingredient_ids
        .into_iter()
        .filter_map(categorize)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_order_kept() {
        assert_eq!(
            derive_allergens(["butter", "espresso", "peanut"]),
            vec!["lactose", "caffeine", "peanuts"]
        );
        assert_eq!(derive_allergens(["mustard seed"]), vec!["mustard"]);
    }

    #[test]
    fn test_duplicates_kept_and_unknowns_skipped() {
        assert_eq!(
            derive_allergens(["milk", "sugar", "milk"]),
            vec!["lactose", "lactose"]
        );
    }

    #[test]
    fn test_only_whole_ids_match() {
        assert!(derive_allergens(["almond_milk", "eggplant", "espresso_beans"]).is_empty());
        assert!(derive_allergens(["peanut_butter"]).is_empty());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert!(derive_allergens(["Milk"]).is_empty());
    }
}
