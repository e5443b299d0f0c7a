//! Identifier casing for generated code.
//!
//! Environment and event names are free text. These helpers split them into
//! ASCII words and rebuild them in the casing a backend needs. Every helper
//! returns a non-empty result that starts with a letter or underscore.

/// Split free text into lowercase ASCII words.
///
/// Non-alphanumeric characters separate words, and so does a lowercase to
/// uppercase transition (`userCreated` becomes `user`, `created`).
fn words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for c in text.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        previous_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
    }
}

fn ensure_leading_letter(name: String, fallback: &str, separator: &str) -> String {
    match name.chars().next() {
        None => fallback.to_string(),
        Some(first) if first.is_ascii_digit() => format!("{fallback}{separator}{name}"),
        Some(_) => name,
    }
}

/// `Order Service` → `order_service`.
///
/// # Examples
/// ```
/// # use sextant::codegen::naming::to_snake_case;
/// assert_eq!(to_snake_case("Order Service"), "order_service");
/// assert_eq!(to_snake_case("userCreated"), "user_created");
/// assert_eq!(to_snake_case("2fa"), "service_2fa");
/// ```
pub fn to_snake_case(text: &str) -> String {
    ensure_leading_letter(words(text).join("_"), "service", "_")
}

/// `order-service` → `order-service`, `Order Service` → `order-service`.
pub fn to_kebab_case(text: &str) -> String {
    ensure_leading_letter(words(text).join("-"), "service", "-")
}

/// `order service` → `OrderService`.
///
/// # Examples
/// ```
/// # use sextant::codegen::naming::to_pascal_case;
/// assert_eq!(to_pascal_case("order service"), "OrderService");
/// assert_eq!(to_pascal_case("API gateway"), "ApiGateway");
/// assert_eq!(to_pascal_case("!!"), "Service");
/// ```
pub fn to_pascal_case(text: &str) -> String {
    let name: String = words(text).iter().map(|word| capitalize(word)).collect();
    ensure_leading_letter(name, "Service", "")
}

/// Make every name in `names` unique by suffixing repeats with `_2`, `_3`, ...
///
/// Distinct events such as `user-created` and `user_created` collapse to the
/// same identifier; this keeps the generated members distinct.
pub fn disambiguate(names: impl IntoIterator<Item = String>) -> Vec<String> {
    disambiguate_reserved(&[], names)
}

/// Like [`disambiguate`], but `reserved` names are treated as already taken.
///
/// Backends reserve the stems of the files they emit themselves.
pub fn disambiguate_reserved(
    reserved: &[&str],
    names: impl IntoIterator<Item = String>,
) -> Vec<String> {
    let mut seen: std::collections::HashSet<String> =
        reserved.iter().map(|name| name.to_string()).collect();
    names
        .into_iter()
        .map(|name| {
            let mut candidate = name.clone();
            let mut n = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{name}_{n}");
                n += 1;
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words() {
        assert_eq!(words("Order Service"), ["order", "service"]);
        assert_eq!(words("userCreated"), ["user", "created"]);
        assert_eq!(words("HTTP gateway"), ["http", "gateway"]);
        assert_eq!(words("v2Api"), ["v2", "api"]);
        assert!(words("  --  ").is_empty());
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("Billing"), "billing");
        assert_eq!(to_snake_case("order-placed"), "order_placed");
        assert_eq!(to_snake_case(""), "service");
        assert_eq!(to_snake_case("3ds check"), "service_3ds_check");
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(to_kebab_case("Order Service"), "order-service");
        assert_eq!(to_kebab_case("émoji"), "moji");
        assert_eq!(to_kebab_case("???"), "service");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("billing"), "Billing");
        assert_eq!(to_pascal_case("order_placed"), "OrderPlaced");
        assert_eq!(to_pascal_case("42"), "Service42");
    }

    #[test]
    fn test_disambiguate() {
        let names = ["user_created", "user_created", "other", "user_created"]
            .into_iter()
            .map(String::from);

        assert_eq!(
            disambiguate(names),
            ["user_created", "user_created_2", "other", "user_created_3"]
        );
    }

    #[test]
    fn test_disambiguate_reserved() {
        let names = ["index", "billing", "index"].into_iter().map(String::from);

        assert_eq!(
            disambiguate_reserved(&["index"], names),
            ["index_2", "billing", "index_3"]
        );
    }
}
