/// Maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 80;

/// Derive a URL slug from a title.
///
/// Lowercases ASCII, turns every run of non-alphanumeric characters into a
/// single hyphen, trims hyphens from both ends and truncates to
/// [`MAX_SLUG_LEN`] without leaving a trailing hyphen. Non-ASCII letters are
/// treated as separators, so the result only contains `[a-z0-9-]`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len().min(MAX_SLUG_LEN));
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    slug
}
