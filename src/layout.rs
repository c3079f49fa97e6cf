/// ChromePolicy
///
/// Decides whether the shared header and footer wrap a page. Purely cosmetic: it
/// runs next to the Access Guard and never influences what the guard decides.
#[derive(Debug, Clone)]
pub struct ChromePolicy {
    suppressed: Vec<String>,
}

impl Default for ChromePolicy {
    fn default() -> Self {
        Self::new(["/login", "/register", "/not-found", "/admin"])
    }
}

impl ChromePolicy {
    pub fn new<I, P>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            suppressed: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Chrome is dropped when the path equals, or starts with, a suppressing prefix.
    /// Compared ASCII case-insensitively, like static route segments.
    pub fn shows_chrome(&self, path: &str) -> bool {
        !self.suppressed.iter().any(|prefix| {
            path.as_bytes()
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
        })
    }
}
