//! Redaction of sensitive payment data before it reaches logs or `Debug` output.
//!
//! Every helper is total: any input, including empty or malformed strings,
//! produces a masked value and never echoes the secret back.

/// Keeps the last four characters and replaces the rest with `*`.
///
/// Inputs shorter than four characters are fully hidden.
pub fn mask_card_number(card_number: &str) -> String {
    let chars: Vec<char> = card_number.chars().collect();
    if chars.len() < 4 {
        return "****".to_string();
    }
    let visible = chars.len() - 4;
    let mut masked = "*".repeat(visible);
    masked.extend(&chars[visible..]);
    masked
}

pub fn mask_cvv(_cvv: &str) -> String {
    "***".to_string()
}

/// Keeps the first character of the local part and the domain.
///
/// The domain is the text between the first and second `@`; anything after a
/// second `@` is dropped.
pub fn mask_email(email: &str) -> String {
    let mut parts = email.split('@');
    let local = parts.next().unwrap_or_default();
    let Some(domain) = parts.next() else {
        return "****@****.com".to_string();
    };
    match local.chars().next() {
        Some(first) => format!("{first}***@{domain}"),
        None => format!("***@{domain}"),
    }
}
