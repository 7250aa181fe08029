//! Declarative attribute token lists
//!
//! Values are whitespace-separated, case-insensitive and order-irrelevant.
//! Parsing keeps the first occurrence of each token so hooks run in
//! attribute order.

/// Lower-cased unique tokens in first-seen order
pub fn parse(value: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in value.split_whitespace() {
        let token = token.to_lowercase();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Every name in `wanted` appears as a whole token of `value`
pub fn contains_all(value: &str, wanted: &[String]) -> bool {
    let tokens = parse(value);
    wanted.iter().all(|name| tokens.contains(name))
}

/// `value` with every token in `names` removed, re-joined by single spaces
pub fn remove_tokens(value: &str, names: &[String]) -> String {
    value
        .split_whitespace()
        .filter(|token| !names.contains(&token.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}
