//! Deriving alternate URLs for images that couldn't be loaded.

use url::Url;

/// The CDN used when a game image can't be loaded from its original host.
pub const FALLBACK_CDN: &str = "https://cdn.akamai.steamstatic.com/steam/apps";

/// The path segment which is followed by a game's numeric ID.
const GAME_IMAGES_SEGMENT: &str = "gameimages";

/// Try to find an alternate URL serving the same image as `url`.
///
/// Game images are served from paths like `.../gameimages/{id}/...`, where
/// `{id}` is the game's numeric ID. The same artwork is also available from
/// the public CDN at [`FALLBACK_CDN`]`/{id}/header.jpg`.
///
/// Relative URLs are accepted. Anything without a matching path segment
/// returns `None`.
///
/// # Examples
///
/// ```rust
/// let got = image_resolver::fallback_url("/api/gameimages/440/header");
///
/// assert_eq!(
///     got.as_deref(),
///     Some("https://cdn.akamai.steamstatic.com/steam/apps/440/header.jpg"),
/// );
/// assert_eq!(image_resolver::fallback_url("https://example.com/logo.png"), None);
/// ```
pub fn fallback_url(url: &str) -> Option<String> {
    let parsed = parse_leniently(url)?;
    let mut segments = parsed.path_segments()?;

    while let Some(segment) = segments.next() {
        if segment != GAME_IMAGES_SEGMENT {
            continue;
        }

        match segments.next() {
            Some(id) if is_numeric(id) => {
                return Some(format!("{}/{}/header.jpg", FALLBACK_CDN, id));
            },
            Some(_) => continue,
            None => break,
        }
    }

    None
}

fn parse_leniently(url: &str) -> Option<Url> {
    // relative URLs only need a path, so any base will do
    let base = Url::parse("http://localhost/").ok()?;
    base.join(url).ok()
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}
