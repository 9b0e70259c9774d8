//! Compositor de cartas
//!
//! Toma la imagen cruda del generador y produce el PNG final:
//!
//! 1. Redimensiona la base a 1024x1792 si hace falta.
//! 2. Construye la lista ordenada de capas `(overlay, BlendMode)`:
//!    - holo (arcoíris diagonal + grano) con `Overlay`, solo si la carta es holo
//!    - texto (bandas degradadas + fecha + nombre) con `Normal`, siempre la última
//! 3. Aplica las capas en orden sobre la base y codifica a PNG.
//!
//! El texto va siempre encima del holo, así que nunca queda mezclado con él.
//! Los overlays son SVG rasterizados con resvg.

use chrono::{Datelike, NaiveDate};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use resvg::tiny_skia;
use resvg::usvg;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::car::CarUsage;

pub const CARD_WIDTH: u32 = 1024;
pub const CARD_HEIGHT: u32 = 1792;

/// Alto de la banda degradada superior (fecha)
pub const TOP_BAND_HEIGHT: u32 = 300;
/// Alto de la banda degradada inferior (nombre del coche)
pub const BOTTOM_BAND_HEIGHT: u32 = 400;

const FONT_FAMILY: &str =
    "'Noto Sans CJK JP', 'Noto Sans JP', 'Hiragino Sans', 'IPAexGothic', sans-serif";

/// Errores del compositor
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Failed to decode base image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode card: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Invalid overlay SVG: {0}")]
    Svg(#[from] usvg::Error),

    #[error("Failed to allocate {width}x{height} overlay")]
    Allocation { width: u32, height: u32 },
}

/// Modo de mezcla de una capa
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Source-over
    Normal,
    /// Multiply bajo 0.5 del fondo, screen por encima
    Overlay,
}

/// Capa RGBA (alfa no premultiplicado) con su modo de mezcla
#[derive(Debug, Clone)]
pub struct Layer {
    pub image: RgbaImage,
    pub blend: BlendMode,
}

/// Textos que se pintan sobre la carta
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardText {
    pub date_line: String,
    pub name_line: String,
    pub usage_line: String,
}

impl CardText {
    /// `name` es el nombre visible del coche ("<maker> <model>")
    pub fn new(date: NaiveDate, name: &str, usage: Option<CarUsage>) -> Self {
        Self {
            date_line: format!("{}がつ {}にち", date.month(), date.day()),
            name_line: name.to_string(),
            usage_line: usage
                .map(|u| format!("({})", u.display_name()))
                .unwrap_or_default(),
        }
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// SVG del overlay de texto: bandas degradadas blancas + fecha + nombre + uso
pub fn text_overlay_svg(text: &CardText) -> String {
    let width = CARD_WIDTH;
    let height = CARD_HEIGHT;
    let bottom_band_y = height - BOTTOM_BAND_HEIGHT;

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">
  <defs>
    <linearGradient id="gradTop" x1="0%" y1="0%" x2="0%" y2="100%">
      <stop offset="0%" stop-color="rgb(255,255,255)" stop-opacity="0.9"/>
      <stop offset="100%" stop-color="rgb(255,255,255)" stop-opacity="0"/>
    </linearGradient>
    <linearGradient id="gradBottom" x1="0%" y1="0%" x2="0%" y2="100%">
      <stop offset="0%" stop-color="rgb(255,255,255)" stop-opacity="0"/>
      <stop offset="100%" stop-color="rgb(255,255,255)" stop-opacity="0.9"/>
    </linearGradient>
  </defs>
  <rect x="0" y="0" width="{width}" height="{top_band}" fill="url(#gradTop)"/>
  <text x="50%" y="180" font-family="{font}" font-weight="bold" font-size="140" fill="#333" text-anchor="middle">{date_line}</text>
  <rect x="0" y="{bottom_band_y}" width="{width}" height="{bottom_band}" fill="url(#gradBottom)"/>
  <text x="50%" y="{name_y}" font-family="{font}" font-weight="bold" font-size="80" fill="#333" text-anchor="middle">{name_line}</text>
  <text x="50%" y="{usage_y}" font-family="{font}" font-size="60" fill="#555" text-anchor="middle">{usage_line}</text>
</svg>"##,
        top_band = TOP_BAND_HEIGHT,
        bottom_band = BOTTOM_BAND_HEIGHT,
        font = escape_xml(FONT_FAMILY),
        name_y = height - 180,
        usage_y = height - 80,
        date_line = escape_xml(&text.date_line),
        name_line = escape_xml(&text.name_line),
        usage_line = escape_xml(&text.usage_line),
    )
}

/// SVG del efecto holo: arcoíris diagonal de seis paradas al 30% + grano
pub fn holo_overlay_svg() -> String {
    let width = CARD_WIDTH;
    let height = CARD_HEIGHT;

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">
  <defs>
    <linearGradient id="rainbow" x1="0%" y1="0%" x2="100%" y2="100%">
      <stop offset="0%" stop-color="#ff0000" stop-opacity="0.3"/>
      <stop offset="20%" stop-color="#ffff00" stop-opacity="0.3"/>
      <stop offset="40%" stop-color="#00ff00" stop-opacity="0.3"/>
      <stop offset="60%" stop-color="#00ffff" stop-opacity="0.3"/>
      <stop offset="80%" stop-color="#0000ff" stop-opacity="0.3"/>
      <stop offset="100%" stop-color="#ff00ff" stop-opacity="0.3"/>
    </linearGradient>
    <filter id="noise" x="0" y="0" width="100%" height="100%">
      <feTurbulence type="fractalNoise" baseFrequency="0.6" numOctaves="3" stitchTiles="stitch"/>
      <feColorMatrix type="saturate" values="0"/>
      <feComponentTransfer>
        <feFuncA type="linear" slope="0.3"/>
      </feComponentTransfer>
    </filter>
  </defs>
  <rect x="0" y="0" width="{width}" height="{height}" fill="url(#rainbow)"/>
  <rect x="0" y="0" width="{width}" height="{height}" filter="url(#noise)"/>
</svg>"##
    )
}

/// Mezcla de un canal según el modo (valores en [0, 1])
fn blend_channel(mode: BlendMode, backdrop: f32, source: f32) -> f32 {
    match mode {
        BlendMode::Normal => source,
        BlendMode::Overlay => {
            if backdrop <= 0.5 {
                2.0 * backdrop * source
            } else {
                1.0 - 2.0 * (1.0 - backdrop) * (1.0 - source)
            }
        }
    }
}

/// Aplicar las capas en orden sobre la base (mismas dimensiones)
pub fn composite_layers(base: &mut RgbaImage, layers: &[Layer]) {
    for layer in layers {
        debug_assert_eq!(layer.image.dimensions(), base.dimensions());

        for (dst, src) in base.pixels_mut().zip(layer.image.pixels()) {
            let src_alpha = src[3] as f32 / 255.0;
            if src_alpha == 0.0 {
                continue;
            }
            let dst_alpha = dst[3] as f32 / 255.0;
            let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);

            for c in 0..3 {
                let cs = src[c] as f32 / 255.0;
                let cb = dst[c] as f32 / 255.0;
                let mixed = (1.0 - dst_alpha) * cs + dst_alpha * blend_channel(layer.blend, cb, cs);
                let premultiplied = src_alpha * mixed + (1.0 - src_alpha) * dst_alpha * cb;
                let value = premultiplied / out_alpha;
                dst[c] = (value * 255.0).round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Compositor con la base de fuentes ya cargada
pub struct CardCompositor {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl CardCompositor {
    /// Cargar las fuentes del sistema y, opcionalmente, las de un directorio extra
    pub fn new(font_dir: Option<&Path>) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        if let Some(dir) = font_dir {
            fontdb.load_fonts_dir(dir);
        }
        info!("🔤 {} fuentes cargadas para el compositor", fontdb.len());

        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    /// Rasterizar un SVG del tamaño de la carta a RGBA no premultiplicado
    fn render_svg(&self, svg: &str) -> Result<RgbaImage, CompositorError> {
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };

        let tree = usvg::Tree::from_str(svg, &options)?;
        let mut pixmap = tiny_skia::Pixmap::new(CARD_WIDTH, CARD_HEIGHT).ok_or(
            CompositorError::Allocation {
                width: CARD_WIDTH,
                height: CARD_HEIGHT,
            },
        )?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let mut raw = Vec::with_capacity((CARD_WIDTH * CARD_HEIGHT * 4) as usize);
        for pixel in pixmap.pixels() {
            let color = pixel.demultiply();
            raw.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }

        RgbaImage::from_raw(CARD_WIDTH, CARD_HEIGHT, raw).ok_or(CompositorError::Allocation {
            width: CARD_WIDTH,
            height: CARD_HEIGHT,
        })
    }

    /// Capas a aplicar, en orden. El texto siempre va la última y en `Normal`.
    pub fn build_layers(&self, text: &CardText, is_holo: bool) -> Result<Vec<Layer>, CompositorError> {
        let mut layers = Vec::with_capacity(2);
        if is_holo {
            layers.push(Layer {
                image: self.render_svg(&holo_overlay_svg())?,
                blend: BlendMode::Overlay,
            });
        }
        layers.push(Layer {
            image: self.render_svg(&text_overlay_svg(text))?,
            blend: BlendMode::Normal,
        });
        Ok(layers)
    }

    /// Componer la carta final y devolverla como PNG
    pub fn composite_card(
        &self,
        raw_image: &[u8],
        date: NaiveDate,
        name: &str,
        usage: Option<CarUsage>,
        is_holo: bool,
    ) -> Result<Vec<u8>, CompositorError> {
        let decoded = image::load_from_memory(raw_image).map_err(CompositorError::Decode)?;

        let mut base = if decoded.width() == CARD_WIDTH && decoded.height() == CARD_HEIGHT {
            decoded.to_rgba8()
        } else {
            debug!(
                "📐 Redimensionando base {}x{} -> {}x{}",
                decoded.width(),
                decoded.height(),
                CARD_WIDTH,
                CARD_HEIGHT
            );
            decoded
                .resize_exact(CARD_WIDTH, CARD_HEIGHT, FilterType::Lanczos3)
                .to_rgba8()
        };

        let text = CardText::new(date, name, usage);
        let layers = self.build_layers(&text, is_holo)?;
        composite_layers(&mut base, &layers);

        let mut output = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(base)
            .write_to(&mut output, ImageFormat::Png)
            .map_err(CompositorError::Encode)?;

        debug!("🖼️ Carta {} compuesta (holo={})", date, is_holo);
        Ok(output.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BASE_COLOR: Rgba<u8> = Rgba([40, 80, 120, 255]);

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn solid_png(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, color);
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn compositor() -> CardCompositor {
        CardCompositor::new(None)
    }

    #[test]
    fn test_card_text_lines() {
        let text = CardText::new(date("2025-03-10"), "Hino Ranger", Some(CarUsage::FireEngine));
        assert_eq!(text.date_line, "3がつ 10にち");
        assert_eq!(text.name_line, "Hino Ranger");
        assert_eq!(text.usage_line, "(fire engine)");

        let plain = CardText::new(date("2025-12-01"), "Honda Fit", None);
        assert_eq!(plain.date_line, "12がつ 1にち");
        assert_eq!(plain.usage_line, "");
    }

    #[test]
    fn test_text_svg_escapes_content() {
        let text = CardText::new(date("2025-03-10"), "A&B <Model>", None);
        let svg = text_overlay_svg(&text);
        assert!(svg.contains("A&amp;B &lt;Model&gt;"));
        assert!(!svg.contains("<Model>"));
    }

    #[test]
    fn test_holo_svg_has_six_stops_at_30_percent() {
        let svg = holo_overlay_svg();
        assert_eq!(svg.matches("stop-opacity=\"0.3\"").count(), 6);
        assert!(svg.contains("fractalNoise"));
        assert!(svg.contains(r#"x1="0%" y1="0%" x2="100%" y2="100%""#));
    }

    #[test]
    fn test_overlay_blend_formula() {
        assert!((blend_channel(BlendMode::Overlay, 0.25, 1.0) - 0.5).abs() < 1e-6);
        assert!((blend_channel(BlendMode::Overlay, 0.75, 0.0) - 0.5).abs() < 1e-6);
        assert!((blend_channel(BlendMode::Overlay, 0.5, 0.5) - 0.5).abs() < 1e-6);
        assert_eq!(blend_channel(BlendMode::Normal, 0.2, 0.7), 0.7);
    }

    #[test]
    fn test_opaque_normal_layer_is_not_affected_by_overlay_below() {
        let mut base = RgbaImage::from_pixel(4, 4, BASE_COLOR);

        let overlay = Layer {
            image: RgbaImage::from_pixel(4, 4, Rgba([255, 0, 255, 200])),
            blend: BlendMode::Overlay,
        };
        let mut text = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        text.put_pixel(1, 1, Rgba([51, 51, 51, 255]));
        let text = Layer {
            image: text,
            blend: BlendMode::Normal,
        };

        composite_layers(&mut base, &[overlay, text]);

        assert_eq!(*base.get_pixel(1, 1), Rgba([51, 51, 51, 255]));
        assert_ne!(*base.get_pixel(0, 0), BASE_COLOR);
    }

    #[test]
    fn test_transparent_layer_leaves_base_untouched() {
        let mut base = RgbaImage::from_pixel(2, 2, BASE_COLOR);
        let layer = Layer {
            image: RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 0])),
            blend: BlendMode::Overlay,
        };
        composite_layers(&mut base, &[layer]);
        assert!(base.pixels().all(|p| *p == BASE_COLOR));
    }

    #[test]
    fn test_layers_are_ordered_holo_then_text() {
        let compositor = compositor();
        let text = CardText::new(date("2025-03-10"), "Lexus LS", None);

        let plain = compositor.build_layers(&text, false).unwrap();
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].blend, BlendMode::Normal);

        let holo = compositor.build_layers(&text, true).unwrap();
        let modes: Vec<BlendMode> = holo.iter().map(|l| l.blend).collect();
        assert_eq!(modes, vec![BlendMode::Overlay, BlendMode::Normal]);
    }

    #[test]
    fn test_small_input_is_resized_to_card_size() {
        let compositor = compositor();
        let png = compositor
            .composite_card(&solid_png(1, 1, BASE_COLOR), date("2025-03-10"), "Honda Fit", None, false)
            .unwrap();

        let out = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!((out.width(), out.height()), (CARD_WIDTH, CARD_HEIGHT));
    }

    #[test]
    fn test_holo_and_plain_cards_differ_but_share_size_and_bands() {
        let compositor = compositor();
        let raw = solid_png(CARD_WIDTH, CARD_HEIGHT, BASE_COLOR);
        let d = date("2025-03-10");

        let plain = compositor
            .composite_card(&raw, d, "Toyota Century", None, false)
            .unwrap();
        let holo = compositor
            .composite_card(&raw, d, "Toyota Century", None, true)
            .unwrap();
        assert_ne!(plain, holo);

        let plain = image::load_from_memory(&plain).unwrap().to_rgba8();
        let holo = image::load_from_memory(&holo).unwrap().to_rgba8();
        assert_eq!(plain.dimensions(), (CARD_WIDTH, CARD_HEIGHT));
        assert_eq!(holo.dimensions(), (CARD_WIDTH, CARD_HEIGHT));

        // Mitad de la carta: fuera de las bandas, sin holo queda la base intacta
        let middle = CARD_HEIGHT / 2;
        assert_eq!(*plain.get_pixel(0, middle), BASE_COLOR);
        assert_ne!(*holo.get_pixel(0, middle), BASE_COLOR);

        // Borde superior y borde inferior: banda blanca al 90% encima de todo
        for card in [&plain, &holo] {
            assert!(card.get_pixel(0, 2)[0] > 200);
            assert!(card.get_pixel(0, CARD_HEIGHT - 2)[0] > 200);
        }
    }

    #[test]
    fn test_undecodable_input_is_an_error() {
        let result = compositor().composite_card(b"not an image", date("2025-03-10"), "A B", None, false);
        assert!(matches!(result, Err(CompositorError::Decode(_))));
    }
}
