//! Identifier case conversion: column names to serialized names, table names to type names.

/// Convert a single identifier from snake_case to camelCase with a lowercase first letter.
/// e.g. "user_id" -> "userId", "CreatedAt" -> "createdAt"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' || c == '-' || c == ' ' {
            capitalize_next = !out.is_empty();
        } else if out.is_empty() {
            out.extend(c.to_lowercase());
            capitalize_next = false;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a single identifier to PascalCase.
/// e.g. "order_items" -> "OrderItems"
pub fn to_pascal_case(s: &str) -> String {
    let camel = to_camel_case(s);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => camel,
    }
}

/// Convert a single identifier from camelCase or PascalCase to snake_case.
/// e.g. "userId" -> "user_id", "User" -> "user"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c == '-' || c == ' ' {
            out.push('_');
            prev_lower = false;
        } else if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv",
    "try", "typeof", "unsized", "virtual", "yield",
];

/// Field identifier for a column: snake_case, raw-escaped when it collides with a keyword.
pub fn field_ident(column: &str) -> String {
    let snake = to_snake_case(column);
    if matches!(snake.as_str(), "self" | "super" | "crate") {
        format!("{}_", snake)
    } else if RUST_KEYWORDS.contains(&snake.as_str()) {
        format!("r#{}", snake)
    } else {
        snake
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_lowers_first_letter() {
        assert_eq!(to_camel_case("user_id"), "userId");
        assert_eq!(to_camel_case("created_at"), "createdAt");
        assert_eq!(to_camel_case("UserID"), "userID");
        assert_eq!(to_camel_case("id"), "id");
        assert_eq!(to_camel_case("_role"), "role");
    }

    #[test]
    fn pascal_case_for_type_names() {
        assert_eq!(to_pascal_case("order_items"), "OrderItems");
        assert_eq!(to_pascal_case("users"), "Users");
    }

    #[test]
    fn snake_case_from_field_names() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("userId"), "user_id");
        assert_eq!(to_snake_case("OrderItems"), "order_items");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn keyword_columns_are_escaped() {
        assert_eq!(field_ident("type"), "r#type");
        assert_eq!(field_ident("name"), "name");
        assert_eq!(field_ident("self"), "self_");
    }
}
