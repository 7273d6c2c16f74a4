//! Shared constants for rendering and serving panels
//!

/// Cache-Control value for panel responses; output depends on every query parameter.
pub const PANEL_CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// Content type for composed panels.
pub const SVG_CONTENT_TYPE: &str = "image/svg+xml; charset=utf-8";

/// Image proxy used to fetch origin images that block direct hotlinking.
pub const DEFAULT_PROXY_URL: &str = "https://wsrv.nl/";

/// Per-image fetch timeout, in milliseconds.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 4000;

/// MIME type used when neither the bytes nor the upstream headers identify the image.
pub const FALLBACK_IMAGE_MIME: &str = "image/png";

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

/// Where the first baseline sits below the top of a line box, as a share of the line height.
pub const BASELINE_OFFSET: f64 = 0.8;

/// Horizontal padding added to the widest line before halving into a bubble radius.
pub const BUBBLE_H_PADDING: f64 = 40.0;

/// Vertical padding added to the text block height before halving into a bubble radius.
pub const BUBBLE_V_PADDING: f64 = 30.0;

/// Font stack used for every text element.
pub const FONT_FAMILY: &str = "sans-serif";

/// Glyph weight for code points above [`CJK_THRESHOLD`].
pub const WIDE_GLYPH_WEIGHT: f64 = 1.0;

/// Glyph weight for ASCII digits and spaces.
pub const NARROW_GLYPH_WEIGHT: f64 = 0.6;

/// Glyph weight for everything else.
pub const MEDIUM_GLYPH_WEIGHT: f64 = 0.8;

/// Code points above this are treated as full width.
pub const CJK_THRESHOLD: u32 = 0x2500;

/// Query parameter `bg` when the request leaves it out.
pub const DEFAULT_BG: &str = "1";

#[cfg(test)]
/// Canvas width of the bundled layout table
pub const TEST_CANVAS_WIDTH: f64 = 400.0;

/// Canvas width of the fallback error document.
pub const FALLBACK_CANVAS_WIDTH: f64 = 400.0;

/// Canvas height of the fallback error document.
pub const FALLBACK_CANVAS_HEIGHT: f64 = 500.0;
