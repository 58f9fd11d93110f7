//! Name derivations shared by resolvers and projections.

/// Convert a Pascal/camel case name to CONSTANT_CASE.
///
/// Word boundaries are a lower-to-upper transition, a digit-to-letter
/// transition, the last capital of an acronym followed by a lowercase letter,
/// and any space, hyphen or underscore.
pub fn constant_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' || c == '-' || c == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if i > 0 && c.is_uppercase() && !out.is_empty() && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }

        out.extend(c.to_uppercase());
    }

    out.trim_end_matches('_').to_string()
}

/// Convert an upper-case abbreviation or free text to PascalCase
/// (`PAY` -> `Pay`, `siege social` -> `SiegeSocial`).
pub fn pascal_case(text: &str) -> String {
    text.split(|c: char| c == ' ' || c == '_' || c == '-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut word_out: String = first.to_uppercase().collect();
                    let rest = chars.as_str();
                    if rest.chars().all(|c| !c.is_lowercase()) {
                        word_out.push_str(&rest.to_lowercase());
                    } else {
                        word_out.push_str(rest);
                    }
                    word_out
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Normalise a role for use in a persisted name: spaces become
/// underscores and the result is upper-cased.
pub fn role_suffix(role: &str) -> String {
    role.trim().replace(' ', "_").to_uppercase()
}

/// Persisted name of a declared field.
pub fn field_column(trigram: Option<&str>, name: &str) -> String {
    match trigram {
        Some(trigram) => format!("{}_{}", trigram.to_uppercase(), constant_case(name)),
        None => constant_case(name),
    }
}

/// Wrap a persisted name with an alias prefix and suffix.
pub fn affix_column(column: &str, prefix: Option<&str>, suffix: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(prefix) = prefix {
        out.push_str(&constant_case(prefix));
        out.push('_');
    }
    out.push_str(column);
    if let Some(suffix) = suffix {
        out.push('_');
        out.push_str(&constant_case(suffix));
    }
    out
}
