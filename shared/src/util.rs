/// Derive a resource id from its display name.
///
/// Lower-cases the name and replaces spaces with underscores:
/// `"Whole Milk"` becomes `"whole_milk"`.
pub fn slug_from_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_name() {
        assert_eq!(slug_from_name("Whole Milk"), "whole_milk");
        assert_eq!(slug_from_name("espresso"), "espresso");
        assert_eq!(slug_from_name("  Iced Caramel Latte "), "iced_caramel_latte");
    }
}
