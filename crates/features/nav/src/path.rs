use url::Url;

/// Strips trailing slashes; the empty path becomes `/`.
#[must_use]
pub fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// The normalized path an `href` points to, resolved against `base`.
///
/// `None` for hrefs that cannot be resolved or that leave `base`'s origin.
#[must_use]
pub fn link_path(href: &str, base: &Url) -> Option<String> {
    let url = base.join(href.trim()).ok()?;
    (url.origin() == base.origin()).then(|| normalize(url.path()).to_owned())
}

/// Exact match, or `current` lies below `link` on a segment boundary. The root never
/// matches as an ancestor.
#[must_use]
pub fn matches(link: &str, current: &str) -> bool {
    link == current
        || (link != "/"
            && current.strip_prefix(link).is_some_and(|rest| rest.starts_with('/')))
}
