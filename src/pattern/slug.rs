/// Normalizes a value into a URL slug.
pub fn urlize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut dash = false;
    for c in value.chars() {
        if c.is_alphanumeric() || matches!(c, '_' | '.' | '~') {
            if dash && !out.is_empty() {
                out.push('-');
            }
            dash = false;
            out.extend(c.to_lowercase());
        } else {
            dash = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::urlize;

    #[test]
    fn slugs() {
        assert_eq!(urlize("Hello World"), "hello-world");
        assert_eq!(urlize("  --Rust & Co.--  "), "rust-co.");
        assert_eq!(urlize("42"), "42");
        assert_eq!(urlize("Crème brûlée"), "crème-brûlée");
        assert_eq!(urlize("a--b"), "a-b");
        assert_eq!(urlize(""), "");
    }
}
