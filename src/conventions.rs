use once_cell::sync::Lazy;
use regex::Regex;

/// Translates property names between casing styles.
///
/// A convention pairs a splitting pattern, whose matches are the semantic
/// word parts of a property name, with a transform that reassembles parts
/// into this convention's casing. Conventions are consulted by the mapping
/// engine when a profile declares them and no explicit member rule covers a
/// source property.
pub trait NamingConvention {
    /// Pattern whose non-empty matches are the word parts of a property name.
    fn splitting_expression(&self) -> &Regex;

    /// Reassemble previously split word parts into this convention's casing.
    fn transform_property_name(&self, parts: &[&str]) -> String;
}

static CAMEL_CASE_PARTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]*|[A-Z][a-z0-9]*").expect("camelCase part pattern"));

static PASCAL_CASE_PARTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][a-z0-9]*|^[a-z][a-z0-9]*").expect("PascalCase part pattern"));

/// camelCase property names: `firstName`, `addressLine1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCaseNamingConvention;

/// PascalCase property names: `FirstName`, `AddressLine1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PascalCaseNamingConvention;

impl NamingConvention for CamelCaseNamingConvention {
    fn splitting_expression(&self) -> &Regex {
        &CAMEL_CASE_PARTS
    }

    fn transform_property_name(&self, parts: &[&str]) -> String {
        let mut result = String::new();
        for (index, part) in parts.iter().enumerate() {
            if index == 0 {
                result.push_str(&lowercase_first(part));
            } else {
                result.push_str(&capitalize_first(part));
            }
        }
        result
    }
}

impl NamingConvention for PascalCaseNamingConvention {
    fn splitting_expression(&self) -> &Regex {
        &PASCAL_CASE_PARTS
    }

    fn transform_property_name(&self, parts: &[&str]) -> String {
        let mut result = String::new();
        for part in parts {
            result.push_str(&capitalize_first(part));
        }
        result
    }
}

/// Split a property name into word parts, dropping empty fragments.
pub(crate) fn split_property_name<'a>(
    convention: &dyn NamingConvention,
    property_name: &'a str,
) -> Vec<&'a str> {
    convention
        .splitting_expression()
        .find_iter(property_name)
        .map(|part| part.as_str())
        .filter(|part| !part.is_empty())
        .collect()
}

fn capitalize_first(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn lowercase_first(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_splitting() {
        let parts = split_property_name(&PascalCaseNamingConvention, "FirstName");
        assert_eq!(parts, vec!["First", "Name"]);
    }

    #[test]
    fn test_camel_splitting() {
        let parts = split_property_name(&CamelCaseNamingConvention, "firstName");
        assert_eq!(parts, vec!["first", "Name"]);
    }

    #[test]
    fn test_splitting_keeps_digits_with_their_word() {
        let parts = split_property_name(&CamelCaseNamingConvention, "addressLine1");
        assert_eq!(parts, vec!["address", "Line1"]);
    }

    #[test]
    fn test_pascal_to_camel_round_trip() {
        let parts = split_property_name(&PascalCaseNamingConvention, "FirstName");
        let transformed = CamelCaseNamingConvention.transform_property_name(&parts);
        assert_eq!(transformed, "firstName");
    }

    #[test]
    fn test_camel_to_pascal_round_trip() {
        let parts = split_property_name(&CamelCaseNamingConvention, "firstName");
        let transformed = PascalCaseNamingConvention.transform_property_name(&parts);
        assert_eq!(transformed, "FirstName");
    }

    #[test]
    fn test_single_word_names() {
        let parts = split_property_name(&CamelCaseNamingConvention, "name");
        assert_eq!(parts, vec!["name"]);
        assert_eq!(
            PascalCaseNamingConvention.transform_property_name(&parts),
            "Name"
        );
    }

    #[test]
    fn test_unsplittable_name_yields_no_parts() {
        let parts = split_property_name(&CamelCaseNamingConvention, "_");
        assert!(parts.is_empty());
    }
}
