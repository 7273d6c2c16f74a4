//! Layout tables and the resolver that picks a layout for a background identifier.
//!
//! The bundled table lives in `data/layouts.json`; a deployment can swap it for its
//! own file at start-up. Tables are validated once on load and never mutated after.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;

use rand::SeedableRng;
use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use serde::Deserialize;

use crate::error::ToonError;

/// Text and image fields a layout can show.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize)]
pub enum Field {
    /// Narration band at the top, query parameter `de`
    #[serde(rename = "de")]
    Caption,
    /// Foreground illustration, query parameter `img`
    #[serde(rename = "img")]
    Illustration,
    /// Speech bubbles, query parameters `text`/`text1` and `text2`
    #[serde(rename = "text")]
    Dialogue,
    /// Sound-effect text, query parameter `ef`
    #[serde(rename = "ef")]
    Effect,
}

impl Field {
    /// Every field, in z-order.
    pub const ALL: [Field; 4] = [
        Field::Illustration,
        Field::Caption,
        Field::Dialogue,
        Field::Effect,
    ];
}

/// Canvas size and backdrop colour.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Canvas {
    /// Width in user units
    pub width: f64,
    /// Height in user units
    pub height: f64,
    /// Fill of the opaque backdrop
    #[serde(default = "default_backdrop")]
    pub backdrop: String,
}

fn default_backdrop() -> String {
    "#eee".to_string()
}

/// Box the illustration is drawn into.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ImageBox {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
    /// Corner radius of the clip path
    #[serde(default = "default_radius")]
    pub radius: f64,
}

fn default_radius() -> f64 {
    10.0
}

/// Caption band across the top of the canvas.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CaptionAnchor {
    /// Baseline of the first caption line
    pub y: f64,
    /// Font size
    pub font_size: f64,
    /// Fill of the band behind the caption
    #[serde(default = "default_caption_fill")]
    pub fill: String,
    /// Text colour
    #[serde(default = "default_caption_color")]
    pub color: String,
    /// Band height for a single line; grows by one line height per extra line
    #[serde(default = "default_band_height")]
    pub band_height: f64,
}

fn default_caption_fill() -> String {
    "rgba(0,0,0,0.7)".to_string()
}

fn default_caption_color() -> String {
    "white".to_string()
}

fn default_band_height() -> f64 {
    50.0
}

/// Centre point and font size of a speech bubble.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DialogueAnchor {
    /// Bubble centre x
    pub x: f64,
    /// Bubble centre y
    pub y: f64,
    /// Font size
    pub font_size: f64,
}

/// Anchor and styling of the effect text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EffectAnchor {
    /// Anchor x, also the rotation pivot
    pub x: f64,
    /// Anchor y, also the rotation pivot
    pub y: f64,
    /// Font size
    pub font_size: f64,
    /// Rotation in degrees about the anchor
    #[serde(default)]
    pub rotate: f64,
    /// Fill colour
    #[serde(default = "default_effect_fill")]
    pub fill: String,
    /// Outline width
    #[serde(default = "default_effect_stroke")]
    pub stroke_width: f64,
}

fn default_effect_fill() -> String {
    "#ff0".to_string()
}

fn default_effect_stroke() -> f64 {
    3.0
}

/// Geometry for one background band or identifier.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LayoutConfig {
    /// Fields this layout shows; anything else is dropped before rendering
    pub show: BTreeSet<Field>,
    /// Illustration box
    pub image: ImageBox,
    /// Caption anchor
    pub caption: CaptionAnchor,
    /// One or two speech bubble anchors
    pub dialogue: Vec<DialogueAnchor>,
    /// Effect text anchor
    pub effect: EffectAnchor,
}

fn check(ok: bool, what: &str, name: &str) -> Result<(), ToonError> {
    if ok {
        Ok(())
    } else {
        Err(ToonError::InvalidLayout(format!("{name}: {what}")))
    }
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl LayoutConfig {
    /// Whether `field` is rendered for this layout.
    pub fn shows(&self, field: Field) -> bool {
        self.show.contains(&field)
    }

    /// Checks that all geometry is finite and non-negative and sizes are positive.
    pub fn validate(&self, name: &str) -> Result<(), ToonError> {
        let image = &self.image;
        check(
            non_negative(image.x) && non_negative(image.y),
            "image position must be non-negative",
            name,
        )?;
        check(
            positive(image.width) && positive(image.height),
            "image size must be positive",
            name,
        )?;
        check(non_negative(image.radius), "image radius must be non-negative", name)?;
        check(
            non_negative(self.caption.y) && positive(self.caption.font_size),
            "caption anchor is invalid",
            name,
        )?;
        check(
            non_negative(self.caption.band_height),
            "caption band height must be non-negative",
            name,
        )?;
        check(
            self.dialogue.len() <= 2,
            "at most two dialogue anchors are supported",
            name,
        )?;
        for anchor in &self.dialogue {
            check(
                non_negative(anchor.x) && non_negative(anchor.y) && positive(anchor.font_size),
                "dialogue anchor is invalid",
                name,
            )?;
        }
        let effect = &self.effect;
        check(
            non_negative(effect.x) && non_negative(effect.y) && positive(effect.font_size),
            "effect anchor is invalid",
            name,
        )?;
        check(
            effect.rotate.is_finite() && non_negative(effect.stroke_width),
            "effect styling is invalid",
            name,
        )
    }
}

/// A contiguous range of background identifiers sharing one layout.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Band {
    /// Band name, eg `1-3`
    pub name: String,
    /// Lowest identifier, inclusive
    pub min: i64,
    /// Highest identifier, inclusive
    pub max: i64,
    /// Layout shared by the band
    pub layout: LayoutConfig,
}

/// Where background and illustration images come from.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AssetTemplates {
    /// URL template for numeric backgrounds, `{id}` is replaced
    pub background: String,
    /// URL template for illustration identifiers, `{id}` is replaced
    pub illustration: String,
    /// Named illustrations that map straight to a URL
    #[serde(default)]
    pub named: BTreeMap<String, String>,
}

/// The full, versioned layout configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LayoutTable {
    /// Format version of the table
    pub version: u32,
    /// Canvas size shared by every layout
    pub canvas: Canvas,
    /// Image locations
    pub assets: AssetTemplates,
    /// Name of the band used when nothing else matches
    pub default: String,
    /// Numeric bands
    pub bands: Vec<Band>,
    /// Exact per-identifier layouts, consulted before the bands
    #[serde(default)]
    pub overrides: BTreeMap<String, LayoutConfig>,
}

impl LayoutTable {
    /// Parses and validates the table bundled with the binary.
    pub fn bundled() -> Result<Self, ToonError> {
        let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/layouts.json"));
        Self::from_json(raw)
    }

    /// Reads a table from disk.
    pub fn from_path(path: &Path) -> Result<Self, ToonError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parses and validates a table from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, ToonError> {
        let mut table: LayoutTable = serde_json::from_str(raw)?;
        table.validate()?;
        // ranges are checked from the lowest upper bound up
        table.bands.sort_by_key(|band| band.max);
        Ok(table)
    }

    fn validate(&self) -> Result<(), ToonError> {
        check(
            positive(self.canvas.width) && positive(self.canvas.height),
            "canvas size must be positive",
            "canvas",
        )?;
        for band in &self.bands {
            check(band.min <= band.max, "band min exceeds max", &band.name)?;
            band.layout.validate(&band.name)?;
        }
        for (key, layout) in &self.overrides {
            layout.validate(key)?;
        }
        check(
            self.bands.iter().any(|band| band.name == self.default),
            "default does not name a band",
            &self.default,
        )
    }

    /// The layout used for unknown identifiers.
    pub fn default_layout(&self) -> Result<&LayoutConfig, ToonError> {
        self.bands
            .iter()
            .find(|band| band.name == self.default)
            .map(|band| &band.layout)
            .ok_or_else(|| ToonError::InvalidLayout(format!("missing default {}", self.default)))
    }

    /// Curated lookup: exact override, then the first band containing the number,
    /// then the default.
    pub fn lookup(&self, bg: &str) -> Result<&LayoutConfig, ToonError> {
        let key = bg.trim();
        if let Some(layout) = self.overrides.get(key) {
            return Ok(layout);
        }
        if let Ok(number) = key.parse::<i64>()
            && let Some(band) = self
                .bands
                .iter()
                .find(|band| number >= band.min && number <= band.max)
        {
            return Ok(&band.layout);
        }
        self.default_layout()
    }
}

/// How background identifiers turn into layouts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum LayoutMode {
    /// Table lookup; reproducible and hand-tuned
    #[default]
    Curated,
    /// Generated from a PRNG seeded by the identifier; reproducible, uncurated
    Seeded,
    /// Generated from a fresh seed on every request
    Shuffle,
}

/// Resolves a layout for each request.
#[derive(Clone, Debug)]
pub struct LayoutResolver {
    table: LayoutTable,
    mode: LayoutMode,
}

impl LayoutResolver {
    /// Wraps a validated table.
    pub fn new(table: LayoutTable, mode: LayoutMode) -> Self {
        Self { table, mode }
    }

    /// The table in use.
    pub fn table(&self) -> &LayoutTable {
        &self.table
    }

    /// The resolution mode.
    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    /// Picks the layout for a background identifier. Unknown identifiers get the
    /// default layout in curated mode.
    pub fn resolve(&self, bg: &str) -> Result<Cow<'_, LayoutConfig>, ToonError> {
        match self.mode {
            LayoutMode::Curated => self.table.lookup(bg).map(Cow::Borrowed),
            LayoutMode::Seeded => {
                let mut rng = StdRng::seed_from_u64(seed_for(bg));
                procedural_layout(&self.table.canvas, &mut rng).map(Cow::Owned)
            }
            LayoutMode::Shuffle => {
                let mut rng = StdRng::seed_from_u64(rand::random::<u64>());
                procedural_layout(&self.table.canvas, &mut rng).map(Cow::Owned)
            }
        }
    }
}

/// Stable within one build of the binary, which is all seeded mode promises.
fn seed_for(bg: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    bg.trim().hash(&mut hasher);
    hasher.finish()
}

/// Attempts at placing the effect text away from the bubbles before settling.
const PLACEMENT_ATTEMPTS: usize = 16;

/// Minimum distance between the effect anchor and any bubble centre.
const MIN_ANCHOR_GAP: f64 = 120.0;

fn pick(rng: &mut StdRng, low: f64, high: f64) -> Result<f64, ToonError> {
    if high <= low {
        return Ok(low);
    }
    let range = Uniform::new(low, high)
        .map_err(|err| ToonError::InvalidLayout(format!("bad range {low}..{high}: {err}")))?;
    Ok(range.sample(rng))
}

fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

/// Generates a layout that stays inside the canvas and keeps the effect text clear of
/// the bubbles.
pub fn procedural_layout(canvas: &Canvas, rng: &mut StdRng) -> Result<LayoutConfig, ToonError> {
    let (width, height) = (canvas.width, canvas.height);
    let band_height = default_band_height().min(height / 4.0);

    let image_width = pick(rng, width * 0.4, width * 0.9)?.round();
    let image_height = pick(rng, height * 0.3, height * 0.6)?.round();
    let image_x = pick(rng, 0.0, width - image_width)?.round();
    let image_y = pick(rng, band_height, (height - image_height).max(band_height))?.round();

    let caption_size = pick(rng, 13.0, 17.0)?.round();
    let caption = CaptionAnchor {
        y: (band_height / 2.0 + caption_size / 3.0).round(),
        font_size: caption_size,
        fill: default_caption_fill(),
        color: default_caption_color(),
        band_height,
    };

    // bubbles alternate sides of the canvas, lower half first
    let margin = width * 0.2;
    let first = DialogueAnchor {
        x: pick(rng, margin, width / 2.0)?.round(),
        y: pick(rng, height * 0.65, height * 0.85)?.round(),
        font_size: pick(rng, 16.0, 20.0)?.round(),
    };
    let second = DialogueAnchor {
        x: pick(rng, width / 2.0, width - margin)?.round(),
        y: pick(rng, height * 0.35, height * 0.55)?.round(),
        font_size: first.font_size,
    };

    let effect_size = pick(rng, 36.0, 56.0)?.round();
    let mut effect_x = width / 2.0;
    let mut effect_y = height / 2.0;
    for _ in 0..PLACEMENT_ATTEMPTS {
        effect_x = pick(rng, effect_size * 2.0, width - effect_size * 2.0)?.round();
        effect_y = pick(rng, band_height + effect_size, height - effect_size)?.round();
        let clear = [&first, &second]
            .iter()
            .all(|anchor| distance(effect_x, effect_y, anchor.x, anchor.y) >= MIN_ANCHOR_GAP);
        if clear {
            break;
        }
    }
    let effect = EffectAnchor {
        x: effect_x,
        y: effect_y,
        font_size: effect_size,
        rotate: pick(rng, -15.0, 15.0)?.round(),
        fill: default_effect_fill(),
        stroke_width: default_effect_stroke(),
    };

    let layout = LayoutConfig {
        show: Field::ALL.into_iter().collect(),
        image: ImageBox {
            x: image_x,
            y: image_y,
            width: image_width,
            height: image_height,
            radius: default_radius(),
        },
        caption,
        dialogue: vec![first, second],
        effect,
    };
    layout.validate("procedural")?;
    Ok(layout)
}
