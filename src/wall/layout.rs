//! Card geometry and placement on the wall.
//!
//! All coordinates are in wall pixels on a fixed 1920x1080 screen.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use rand::Rng;

pub const SCREEN_WIDTH: f64 = 1920.0;
pub const SCREEN_HEIGHT: f64 = 1080.0;

/// Cards are A3 landscape.
pub const CARD_ASPECT: f64 = 420.0 / 297.0;

/// Share of the viewport width a card takes.
pub const CARD_WIDTH_RATIO: f64 = 0.6;

/// Rotation range of scattered copies, in degrees either side of zero.
pub const MAX_TILT_DEG: f64 = 5.0;

/// Extra height below the lowest card.
pub const ROW_BOTTOM_MARGIN: f64 = 200.0;

/// Padding above the highest card.
pub const ROW_TOP_PADDING: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardSize {
    pub width: f64,
    pub height: f64,
}

impl CardSize {
    pub fn for_viewport(viewport_width: f64) -> Self {
        let width = viewport_width * CARD_WIDTH_RATIO;
        Self {
            width,
            height: width / CARD_ASPECT,
        }
    }

    /// Raster size of a rendered card, at least 1x1.
    pub fn pixels(&self) -> (u32, u32) {
        (
            (self.width.round() as u32).max(1),
            (self.height.round() as u32).max(1),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub rotation_deg: f64,
}

/// Straight and centred on the screen.
pub fn centered(card: CardSize) -> Placement {
    Placement {
        x: (SCREEN_WIDTH - card.width) / 2.0,
        y: (SCREEN_HEIGHT - card.height) / 2.0,
        rotation_deg: 0.0,
    }
}

/// Anywhere the card still fits on screen, with a slight tilt.
pub fn scattered<R: Rng + ?Sized>(card: CardSize, rng: &mut R) -> Placement {
    let max_x = (SCREEN_WIDTH - card.width).max(0.0);
    let max_y = (SCREEN_HEIGHT - card.height).max(0.0);
    Placement {
        x: rng.gen::<f64>() * max_x,
        y: rng.gen::<f64>() * max_y,
        rotation_deg: (rng.gen::<f64>() - 0.5) * 2.0 * MAX_TILT_DEG,
    }
}

/// Size of the container holding every card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBounds {
    pub min_height: f64,
    pub padding_top: f64,
}

/// Recomputes the container so no card is clipped. `None` for an empty wall.
pub fn row_bounds<I>(tops: I, card_height: f64) -> Option<RowBounds>
where
    I: IntoIterator<Item = f64>,
{
    let mut tops = tops.into_iter().peekable();
    tops.peek()?;

    let (min_top, max_bottom) = tops.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), top| {
        (lo.min(top), hi.max(top + card_height))
    });

    let padding_top = if min_top < 0.0 {
        min_top.abs() + ROW_TOP_PADDING
    } else {
        ROW_TOP_PADDING
    };

    Some(RowBounds {
        min_height: max_bottom - min_top.min(0.0) + ROW_BOTTOM_MARGIN,
        padding_top,
    })
}

/// Fits `source` inside a `width` x `height` card keeping its aspect ratio,
/// centred on a transparent background.
///
/// `smooth` picks a filtering resize (used for the pristine original) over a
/// nearest-neighbour one (used before degradation).
pub fn fit_to_card(source: &RgbaImage, width: u32, height: u32, smooth: bool) -> RgbaImage {
    let (src_w, src_h) = source.dimensions();
    let mut card = RgbaImage::new(width, height);
    if src_w == 0 || src_h == 0 {
        return card;
    }

    let source_aspect = src_w as f64 / src_h as f64;
    let card_aspect = width as f64 / height as f64;
    let (display_w, display_h) = if source_aspect > card_aspect {
        (width as f64, width as f64 / source_aspect)
    } else {
        (height as f64 * source_aspect, height as f64)
    };
    let display_w = (display_w.round() as u32).clamp(1, width);
    let display_h = (display_h.round() as u32).clamp(1, height);

    let filter = if smooth {
        FilterType::CatmullRom
    } else {
        FilterType::Nearest
    };
    let scaled = imageops::resize(source, display_w, display_h, filter);

    let offset_x = (width - display_w) / 2;
    let offset_y = (height - display_h) / 2;
    imageops::replace(&mut card, &scaled, offset_x as i64, offset_y as i64);
    card
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn card_size_follows_viewport() {
        let card = CardSize::for_viewport(1920.0);
        assert!((card.width - 1152.0).abs() < 1e-9);
        assert!((card.height - 1152.0 * 297.0 / 420.0).abs() < 1e-9);
        assert_eq!(card.pixels(), (1152, 815));
    }

    #[test]
    fn centered_placement_is_straight() {
        let card = CardSize::for_viewport(1920.0);
        let p = centered(card);
        assert!((p.x - 384.0).abs() < 1e-9);
        assert!((p.y + card.height / 2.0 - 540.0).abs() < 1e-9);
        assert_eq!(p.rotation_deg, 0.0);
    }

    #[test]
    fn scattered_placement_stays_on_screen() {
        let card = CardSize::for_viewport(1920.0);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let p = scattered(card, &mut rng);
            assert!(p.x >= 0.0 && p.x <= SCREEN_WIDTH - card.width);
            assert!(p.y >= 0.0 && p.y <= SCREEN_HEIGHT - card.height);
            assert!(p.rotation_deg >= -MAX_TILT_DEG && p.rotation_deg < MAX_TILT_DEG);
        }
    }

    #[test]
    fn row_bounds_cover_every_card() {
        assert_eq!(row_bounds(std::iter::empty(), 100.0), None);

        let bounds = row_bounds([10.0, 300.0, 120.0], 100.0).unwrap();
        assert_eq!(bounds.min_height, 400.0 + ROW_BOTTOM_MARGIN);
        assert_eq!(bounds.padding_top, ROW_TOP_PADDING);
    }

    #[test]
    fn row_bounds_pad_cards_above_the_top_edge() {
        let bounds = row_bounds([-40.0, 60.0], 100.0).unwrap();
        assert_eq!(bounds.min_height, 160.0 + 40.0 + ROW_BOTTOM_MARGIN);
        assert_eq!(bounds.padding_top, 40.0 + ROW_TOP_PADDING);
    }

    #[test]
    fn wide_sources_are_letterboxed() {
        let source = RgbaImage::from_pixel(400, 100, Rgba([10, 20, 30, 255]));
        let card = fit_to_card(&source, 200, 100, false);

        assert_eq!(card.dimensions(), (200, 100));
        // 200x50 image band centred vertically.
        assert_eq!(card.get_pixel(100, 10)[3], 0);
        assert_eq!(*card.get_pixel(100, 50), Rgba([10, 20, 30, 255]));
        assert_eq!(card.get_pixel(100, 90)[3], 0);
    }

    #[test]
    fn tall_sources_are_pillarboxed() {
        let source = RgbaImage::from_pixel(50, 100, Rgba([200, 0, 0, 255]));
        let card = fit_to_card(&source, 200, 100, true);

        assert_eq!(card.get_pixel(10, 50)[3], 0);
        assert_eq!(card.get_pixel(100, 50)[3], 255);
        assert_eq!(card.get_pixel(190, 50)[3], 0);
    }
}
