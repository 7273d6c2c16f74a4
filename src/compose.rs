//! Assembles the panel SVG.

use std::fmt::Write;

use crate::bubble::bubble_geometry;
use crate::constants::{FALLBACK_CANVAS_HEIGHT, FALLBACK_CANVAS_WIDTH, FONT_FAMILY, LINE_HEIGHT};
use crate::error::ToonError;
use crate::layouts::{Canvas, Field, LayoutConfig};
use crate::text::{TextBlock, escape_markup};

/// Everything one request needs to render, built fresh per request.
#[derive(Clone, Debug)]
pub struct RenderContext<'a> {
    /// Canvas size and backdrop
    pub canvas: &'a Canvas,
    /// Resolved layout
    pub layout: &'a LayoutConfig,
    /// Inlined background, if the fetch succeeded
    pub background: Option<String>,
    /// Inlined illustration, if requested, visible and fetched
    pub illustration: Option<String>,
    /// Caption lines
    pub caption: TextBlock,
    /// Dialogue blocks, matched to the layout's anchors in order
    pub dialogue: [TextBlock; 2],
    /// Effect text lines
    pub effect: TextBlock,
}

/// Formats a coordinate with at most one decimal, dropping `.0`.
fn num(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

/// Renders the panel in fixed z-order, leaving out anything with no content.
pub fn compose(ctx: &RenderContext<'_>) -> Result<String, ToonError> {
    let canvas = ctx.canvas;
    let layout = ctx.layout;
    layout.validate("request")?;
    let (width, height) = (num(canvas.width), num(canvas.height));

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg width="{width}" height="{height}" viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">"#
    )
    .map_err(fmt_error)?;

    let image = &layout.image;
    let illustration = ctx
        .illustration
        .as_deref()
        .filter(|_| layout.shows(Field::Illustration));
    if illustration.is_some() {
        writeln!(
            svg,
            r#"  <defs><clipPath id="illustration-clip"><rect x="{}" y="{}" width="{}" height="{}" rx="{}" /></clipPath></defs>"#,
            num(image.x),
            num(image.y),
            num(image.width),
            num(image.height),
            num(image.radius)
        )
        .map_err(fmt_error)?;
    }

    writeln!(
        svg,
        r#"  <rect width="100%" height="100%" fill="{}" />"#,
        escape_markup(&canvas.backdrop)
    )
    .map_err(fmt_error)?;

    if let Some(background) = ctx.background.as_deref() {
        writeln!(
            svg,
            r#"  <image class="background" href="{}" x="0" y="0" width="{width}" height="{height}" preserveAspectRatio="xMidYMid slice" />"#,
            escape_markup(background)
        )
        .map_err(fmt_error)?;
    }

    if let Some(illustration) = illustration {
        writeln!(
            svg,
            r#"  <image class="illustration" href="{}" x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid slice" clip-path="url(#illustration-clip)" />"#,
            escape_markup(illustration),
            num(image.x),
            num(image.y),
            num(image.width),
            num(image.height)
        )
        .map_err(fmt_error)?;
    }

    write_caption(&mut svg, ctx)?;
    write_dialogue(&mut svg, ctx)?;
    write_effect(&mut svg, ctx)?;

    svg.push_str("</svg>\n");
    Ok(svg)
}

fn fmt_error(err: std::fmt::Error) -> ToonError {
    ToonError::InternalServerError(err.to_string())
}

fn write_tspans(svg: &mut String, x: f64, lines: &[String], baselines: &[f64]) -> Result<(), ToonError> {
    for (line, y) in lines.iter().zip(baselines) {
        write!(
            svg,
            r#"<tspan x="{}" y="{}">{}</tspan>"#,
            num(x),
            num(*y),
            escape_markup(line)
        )
        .map_err(fmt_error)?;
    }
    Ok(())
}

fn write_caption(svg: &mut String, ctx: &RenderContext<'_>) -> Result<(), ToonError> {
    let caption = &ctx.layout.caption;
    if ctx.caption.is_empty() || !ctx.layout.shows(Field::Caption) {
        return Ok(());
    }
    let line_height = caption.font_size * LINE_HEIGHT;
    let extra_lines = ctx.caption.len().saturating_sub(1) as f64;
    let band_height = caption.band_height + extra_lines * line_height;
    let baselines: Vec<f64> = (0..ctx.caption.len())
        .map(|idx| caption.y + idx as f64 * line_height)
        .collect();

    writeln!(
        svg,
        r#"  <rect class="caption-band" x="0" y="0" width="{}" height="{}" fill="{}" />"#,
        num(ctx.canvas.width),
        num(band_height),
        escape_markup(&caption.fill)
    )
    .map_err(fmt_error)?;
    write!(
        svg,
        r#"  <text class="caption" text-anchor="middle" font-family="{FONT_FAMILY}" font-weight="bold" font-size="{}" fill="{}">"#,
        num(caption.font_size),
        escape_markup(&caption.color)
    )
    .map_err(fmt_error)?;
    write_tspans(svg, ctx.canvas.width / 2.0, ctx.caption.lines(), &baselines)?;
    svg.push_str("</text>\n");
    Ok(())
}

fn write_dialogue(svg: &mut String, ctx: &RenderContext<'_>) -> Result<(), ToonError> {
    if !ctx.layout.shows(Field::Dialogue) {
        return Ok(());
    }
    for (block, anchor) in ctx.dialogue.iter().zip(&ctx.layout.dialogue) {
        let Some(bubble) = bubble_geometry(block, anchor, ctx.canvas.width) else {
            continue;
        };
        writeln!(
            svg,
            r##"  <ellipse class="bubble" cx="{}" cy="{}" rx="{}" ry="{}" fill="white" stroke="#333" stroke-width="3" />"##,
            num(bubble.cx),
            num(bubble.cy),
            num(bubble.rx),
            num(bubble.ry)
        )
        .map_err(fmt_error)?;
        write!(
            svg,
            r#"  <text class="dialogue" text-anchor="middle" font-family="{FONT_FAMILY}" font-weight="bold" font-size="{}" fill="black">"#,
            num(anchor.font_size)
        )
        .map_err(fmt_error)?;
        write_tspans(svg, bubble.cx, block.lines(), &bubble.baselines)?;
        svg.push_str("</text>\n");
    }
    Ok(())
}

fn write_effect(svg: &mut String, ctx: &RenderContext<'_>) -> Result<(), ToonError> {
    let effect = &ctx.layout.effect;
    if ctx.effect.is_empty() || !ctx.layout.shows(Field::Effect) {
        return Ok(());
    }
    let line_height = effect.font_size * LINE_HEIGHT;
    let baselines: Vec<f64> = (0..ctx.effect.len())
        .map(|idx| effect.y + idx as f64 * line_height)
        .collect();
    let (x, y) = (num(effect.x), num(effect.y));
    write!(
        svg,
        r##"  <text class="effect" text-anchor="middle" font-family="{FONT_FAMILY}" font-weight="900" font-size="{}" fill="{}" stroke="#000" stroke-width="{}" stroke-linejoin="round" paint-order="stroke" transform="rotate({}, {x}, {y})">"##,
        num(effect.font_size),
        escape_markup(&effect.fill),
        num(effect.stroke_width),
        num(effect.rotate)
    )
    .map_err(fmt_error)?;
    write_tspans(svg, effect.x, ctx.effect.lines(), &baselines)?;
    svg.push_str("</text>\n");
    Ok(())
}

/// Minimal panel carrying an error message, served when composition fails.
pub fn fallback_document(message: &str) -> String {
    let (width, height) = (num(FALLBACK_CANVAS_WIDTH), num(FALLBACK_CANVAS_HEIGHT));
    format!(
        r##"<svg width="{width}" height="{height}" viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">
  <rect width="100%" height="100%" fill="#eee" />
  <text class="error" x="50%" y="50%" text-anchor="middle" font-family="{FONT_FAMILY}" font-size="14" fill="#b00">{}</text>
</svg>
"##,
        escape_markup(message)
    )
}
