//! Resolving image references and inlining them as data URIs.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::constants::FALLBACK_IMAGE_MIME;
use crate::error::ToonError;
use crate::layouts::AssetTemplates;

/// A symbolic image reference from the query string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImageRef {
    /// Full http(s) URL, used as-is
    Absolute(Url),
    /// Numeric shorthand, eg `bg=7`
    Indexed(u32),
    /// Short identifier, eg `img=smile`
    Named(String),
}

impl ImageRef {
    /// Classifies a raw reference. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(url) = Url::parse(raw)
            && matches!(url.scheme(), "http" | "https")
        {
            return Some(Self::Absolute(url));
        }
        match raw.parse::<u32>() {
            Ok(index) => Some(Self::Indexed(index)),
            Err(_) => Some(Self::Named(raw.to_string())),
        }
    }
}

/// Which template an indexed or named reference expands against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssetKind {
    /// Full-canvas background
    Background,
    /// Foreground illustration
    Illustration,
}

/// Turns an [`ImageRef`] into the origin URL, without touching the network.
pub fn locate(
    assets: &AssetTemplates,
    kind: AssetKind,
    reference: &ImageRef,
) -> Result<Url, ToonError> {
    let key = match reference {
        ImageRef::Absolute(url) => return Ok(url.clone()),
        ImageRef::Indexed(index) => index.to_string(),
        ImageRef::Named(name) => name.clone(),
    };
    let template = match kind {
        AssetKind::Background => &assets.background,
        AssetKind::Illustration => {
            if let Some(url) = assets.named.get(&key) {
                return Ok(Url::parse(url)?);
            }
            &assets.illustration
        }
    };
    let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
    Ok(Url::parse(&template.replace("{id}", &encoded))?)
}

/// Fetches origin images through the resizing proxy and encodes them as data URIs.
#[derive(Clone, Debug)]
pub struct ImageInliner {
    client: reqwest::Client,
    proxy: Url,
}

impl ImageInliner {
    /// Builds an inliner whose requests give up after `timeout`.
    pub fn new(proxy: &str, timeout: Duration) -> Result<Self, ToonError> {
        let proxy = Url::parse(proxy)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, proxy })
    }

    /// The proxy URL that fetches `origin`.
    pub fn proxied(&self, origin: &Url) -> Url {
        let mut url = self.proxy.clone();
        url.query_pairs_mut().append_pair("url", origin.as_str());
        url
    }

    /// Fetches `origin` and returns a data URI, or `None` on any failure.
    ///
    /// Failures are logged and swallowed; the caller leaves the image out.
    pub async fn inline(&self, origin: &Url) -> Option<String> {
        match self.fetch(origin).await {
            Ok(data_uri) => Some(data_uri),
            Err(err) => {
                warn!("Dropping image {}: {}", origin, err);
                None
            }
        }
    }

    #[instrument(level = "debug", skip(self, origin), fields(origin = %origin))]
    async fn fetch(&self, origin: &Url) -> Result<String, ToonError> {
        let response = self.client.get(self.proxied(origin)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ToonError::Image(format!("proxy returned {status}")));
        }
        let header_mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string());
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ToonError::Image("proxy returned an empty body".to_string()));
        }
        debug!("Fetched {} bytes", bytes.len());
        Ok(data_uri(&bytes, header_mime.as_deref()))
    }
}

/// Encodes image bytes as a data URI. The MIME type is sniffed from the bytes, then taken
/// from `header_mime` if it names an image, then defaults to PNG.
pub fn data_uri(bytes: &[u8], header_mime: Option<&str>) -> String {
    let mime = match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => header_mime
            .filter(|mime| mime.starts_with("image/"))
            .unwrap_or(FALLBACK_IMAGE_MIME),
    };
    format!(
        "data:{};base64,{}",
        mime,
        general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> AssetTemplates {
        crate::layouts::LayoutTable::bundled()
            .expect("bundled table")
            .assets
    }

    #[test]
    fn classifies_references() {
        assert_eq!(ImageRef::parse("  "), None);
        assert_eq!(ImageRef::parse("12"), Some(ImageRef::Indexed(12)));
        assert_eq!(
            ImageRef::parse("smile"),
            Some(ImageRef::Named("smile".to_string()))
        );
        assert!(matches!(
            ImageRef::parse("https://example.org/a.png"),
            Some(ImageRef::Absolute(_))
        ));
        // not http(s), so treated as a short identifier
        assert!(matches!(
            ImageRef::parse("file:///etc/passwd"),
            Some(ImageRef::Named(_))
        ));
    }

    #[test]
    fn backgrounds_expand_against_the_template() {
        let url = locate(&assets(), AssetKind::Background, &ImageRef::Indexed(7)).expect("url");
        assert_eq!(url.as_str(), "https://igx.kr/v/1H/WEBTOON/7");
    }

    #[test]
    fn named_illustrations_win_over_the_template() {
        let assets = assets();
        let url = locate(&assets, AssetKind::Illustration, &ImageRef::Indexed(1)).expect("url");
        assert_eq!(url.as_str(), assets.named["1"]);
        let url = locate(
            &assets,
            AssetKind::Illustration,
            &ImageRef::Named("hero".to_string()),
        )
        .expect("url");
        assert_eq!(url.as_str(), "https://igx.kr/v/1H/WEBTOON/hero");
    }

    #[test]
    fn absolute_urls_pass_through() {
        let origin = Url::parse("https://cdn.example.org/x.jpg?w=10").expect("url");
        let url = locate(
            &assets(),
            AssetKind::Background,
            &ImageRef::Absolute(origin.clone()),
        )
        .expect("url");
        assert_eq!(url, origin);
    }

    #[test]
    fn proxied_urls_encode_the_origin() {
        let inliner =
            ImageInliner::new("https://wsrv.nl/", Duration::from_secs(1)).expect("inliner");
        let origin = Url::parse("https://igx.kr/v/1H/WEBTOON/3?a=1&b=2").expect("url");
        let proxied = inliner.proxied(&origin);
        assert_eq!(proxied.host_str(), Some("wsrv.nl"));
        let pairs: Vec<(String, String)> = proxied.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![("url".to_string(), origin.as_str().to_string())]
        );
    }

    #[test]
    fn data_uri_sniffs_png() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let uri = data_uri(&png, Some("application/octet-stream"));
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn data_uri_falls_back_to_headers_then_png() {
        let uri = data_uri(b"not an image", Some("image/webp"));
        assert!(uri.starts_with("data:image/webp;base64,"));
        let uri = data_uri(b"not an image", Some("text/html"));
        assert!(uri.starts_with("data:image/png;base64,"));
        assert!(uri.ends_with(&general_purpose::STANDARD.encode(b"not an image")));
    }
}
