use std::num::NonZeroUsize;
use std::sync::Arc;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style, Weight};
use lru::LruCache;
use parking_lot::Mutex;

const MEASURE_CACHE_CAPACITY: usize = 4096;

/// A font request for one measurement: size in points plus the style axes
/// the renderers actually use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub mono: bool,
}

impl FontSpec {
    pub fn plain(size: f32) -> Self {
        Self {
            size,
            bold: false,
            italic: false,
            mono: false,
        }
    }

    pub fn bold(size: f32) -> Self {
        Self {
            bold: true,
            ..Self::plain(size)
        }
    }

    pub fn mono(size: f32) -> Self {
        Self {
            mono: true,
            ..Self::plain(size)
        }
    }
}

/// Width/height-of-string queries used by both renderers for layout.
/// Takes `&self` so implementations stay shareable across concurrent
/// compose calls.
pub trait TextMeasure {
    fn measure(&self, text: &str, font: &FontSpec, max_width: Option<f32>) -> (f32, f32);
}

#[derive(Hash, PartialEq, Eq, Clone)]
struct MeasureKey {
    text: String,
    size_bits: u32,
    bold: bool,
    italic: bool,
    mono: bool,
    max_width_bits: Option<u32>,
}

/// Real glyph metrics backed by a cosmic-text [`FontSystem`]. The font
/// system and the memoization cache sit behind mutexes so one instance can
/// serve concurrent callers; cloning shares both.
#[derive(Clone)]
pub struct CosmicTextMeasure {
    font_system: Arc<Mutex<FontSystem>>,
    cache: Arc<Mutex<LruCache<MeasureKey, (f32, f32)>>>,
}

impl CosmicTextMeasure {
    pub fn new() -> Self {
        Self {
            font_system: Arc::new(Mutex::new(FontSystem::new())),
            cache: Arc::new(Mutex::new(LruCache::new(
                NonZeroUsize::new(MEASURE_CACHE_CAPACITY).expect("nonzero cache capacity"),
            ))),
        }
    }
}

impl Default for CosmicTextMeasure {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for CosmicTextMeasure {
    fn measure(&self, text: &str, font: &FontSpec, max_width: Option<f32>) -> (f32, f32) {
        let key = MeasureKey {
            text: text.to_string(),
            size_bits: font.size.to_bits(),
            bold: font.bold,
            italic: font.italic,
            mono: font.mono,
            max_width_bits: max_width.map(f32::to_bits),
        };

        if let Some(cached) = self.cache.lock().get(&key) {
            return *cached;
        }

        let line_height = font.size * 1.2;
        let mut font_system = self.font_system.lock();
        let mut buffer = Buffer::new(
            &mut font_system,
            Metrics {
                font_size: font.size,
                line_height,
            },
        );

        buffer.set_size(&mut font_system, max_width, None);

        let attrs = Attrs::new()
            .family(if font.mono {
                Family::Monospace
            } else {
                Family::SansSerif
            })
            .weight(if font.bold { Weight::BOLD } else { Weight::NORMAL })
            .style(if font.italic {
                Style::Italic
            } else {
                Style::Normal
            });

        buffer.set_text(&mut font_system, text, &attrs, Shaping::Advanced, None);

        let mut total_width: f32 = 0.0;
        let mut total_height: f32 = 0.0;
        for run in buffer.layout_runs() {
            total_width = total_width.max(run.line_w);
            total_height += run.line_height;
        }
        drop(font_system);

        let measured = (total_width, total_height);
        self.cache.lock().put(key, measured);
        measured
    }
}

/// Deterministic font-free metrics: every glyph advances 0.6 em. Useful in
/// environments without system fonts and for layout tests that must not
/// depend on installed typefaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTextMeasure;

impl TextMeasure for ApproxTextMeasure {
    fn measure(&self, text: &str, font: &FontSpec, max_width: Option<f32>) -> (f32, f32) {
        let advance = font.size * 0.6;
        let line_height = font.size * 1.2;
        if text.is_empty() {
            return (0.0, 0.0);
        }

        let natural = text.chars().count() as f32 * advance;
        match max_width {
            Some(limit) if natural > limit && limit > advance => {
                let per_line = (limit / advance).floor().max(1.0);
                let lines = (text.chars().count() as f32 / per_line).ceil();
                (per_line * advance, lines * line_height)
            }
            _ => (natural, line_height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApproxTextMeasure, FontSpec, TextMeasure};

    #[test]
    fn approx_width_scales_with_length_and_size() {
        let m = ApproxTextMeasure;
        let (short, _) = m.measure("ab", &FontSpec::plain(10.0), None);
        let (long, _) = m.measure("abcd", &FontSpec::plain(10.0), None);
        assert!((long - short * 2.0).abs() < f32::EPSILON);

        let (big, _) = m.measure("ab", &FontSpec::plain(20.0), None);
        assert!((big - short * 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn approx_wraps_against_max_width() {
        let m = ApproxTextMeasure;
        let font = FontSpec::plain(10.0);
        let (w, h) = m.measure("aaaaaaaaaa", &font, Some(30.0));
        assert!(w <= 30.0);
        assert!(h > font.size * 1.2);
    }
}
