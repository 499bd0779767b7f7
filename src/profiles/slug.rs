use std::collections::HashSet;

/// Used when a name has nothing left after [`slugify`].
pub const FALLBACK_SLUG: &str = "profile";

/// Lowercases `name`, keeps `[a-z0-9]`, and joins the remaining words with
/// single hyphens. Never starts or ends with a hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());

    for c in name.to_lowercase().chars() {
        match c {
            'a'..='z' | '0'..='9' => slug.push(c),
            ' ' | '-' => {
                if !slug.is_empty() && !slug.ends_with('-') {
                    slug.push('-');
                }
            }
            _ => {}
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

pub fn base_slug(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        slug
    }
}

/// Smallest of `base`, `base-1`, `base-2`, ... that is not in `taken`.
pub fn next_free_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_owned();
    }

    let mut n: u64 = 1;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
