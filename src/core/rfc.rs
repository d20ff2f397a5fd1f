//! RFC (Registro Federal de Contribuyentes) format helpers.
//!
//! Format-only checks, no padrón lookup: 3 letters (personas morales) or
//! 4 letters (personas físicas), a 6-digit date, and a 3-character
//! homoclave. `Ñ` and `&` are valid in the letter block.

/// Normalize an RFC for comparison: trim and uppercase.
pub fn normalize_rfc(rfc: &str) -> String {
    rfc.trim().to_uppercase()
}

/// Check whether `s` has the shape of an RFC (12 or 13 characters).
pub fn is_rfc(s: &str) -> bool {
    let s = s.trim();
    let chars: Vec<char> = s.chars().collect();

    let letters = match chars.len() {
        12 => 3,
        13 => 4,
        _ => return false,
    };

    if !chars[..letters]
        .iter()
        .all(|c| c.is_ascii_uppercase() || *c == 'Ñ' || *c == '&')
    {
        return false;
    }

    if !chars[letters..letters + 6].iter().all(|c| c.is_ascii_digit()) {
        return false;
    }

    // Homoclave: alphanumeric, uppercase.
    chars[letters + 6..]
        .iter()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moral_rfc_valid() {
        assert!(is_rfc("AAA010101AAA"));
        assert!(is_rfc("S&A010101AB1"));
    }

    #[test]
    fn fisica_rfc_valid() {
        assert!(is_rfc("GODE561231GR8"));
        assert!(is_rfc("MAÑA800101XX1"));
    }

    #[test]
    fn wrong_lengths_rejected() {
        assert!(!is_rfc("AAA010101AA"));
        assert!(!is_rfc("GODE561231GR89"));
        assert!(!is_rfc(""));
    }

    #[test]
    fn bad_date_block_rejected() {
        assert!(!is_rfc("AAAX10101AAA"));
    }

    #[test]
    fn lowercase_rejected_but_normalizable() {
        assert!(!is_rfc("aaa010101aaa"));
        assert!(is_rfc(&normalize_rfc(" aaa010101aaa ")));
    }
}
