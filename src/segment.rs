use crate::document::{Document, Page, join_blocks};
use crate::error::ConfigError;

// 150 x 70 pt measured on a 612 x 792 pt letter page.
pub const DEFAULT_TITLE_ZONE_WIDTH: f64 = 0.25;
pub const DEFAULT_TITLE_ZONE_HEIGHT: f64 = 0.09;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleZone {
    width_fraction: f64,
    height_fraction: f64,
}

impl TitleZone {
    pub fn new(width_fraction: f64, height_fraction: f64) -> Result<Self, ConfigError> {
        validate_fraction("width", width_fraction)?;
        validate_fraction("height", height_fraction)?;
        Ok(Self {
            width_fraction,
            height_fraction,
        })
    }

    pub fn text_of(&self, page: &Page) -> String {
        let max_x = page.width * self.width_fraction;
        let max_y = page.height * self.height_fraction;
        join_blocks(
            page.blocks
                .iter()
                .filter(|block| block.x_min < max_x && block.y_min < max_y),
        )
    }
}

impl Default for TitleZone {
    fn default() -> Self {
        Self {
            width_fraction: DEFAULT_TITLE_ZONE_WIDTH,
            height_fraction: DEFAULT_TITLE_ZONE_HEIGHT,
        }
    }
}

fn validate_fraction(axis: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTitleZone { axis, value })
    }
}

/// A candidate form region handed to the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Region<'p> {
    pub page_index: usize,
    pub title_zone: String,
    pub full_text: &'p str,
}

pub trait Segmenter: Sync {
    fn regions<'p>(&self, page: &'p Page) -> Vec<Region<'p>>;
}

/// Treats every page as the start of its own region and reads the title from
/// the top-left zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageSegmenter {
    pub zone: TitleZone,
}

impl PageSegmenter {
    pub fn new(zone: TitleZone) -> Self {
        Self { zone }
    }

    pub fn title_zones<'d>(&'d self, document: &'d Document) -> impl Iterator<Item = String> + 'd {
        document
            .readable_pages()
            .map(move |page| self.zone.text_of(page))
    }
}

impl Segmenter for PageSegmenter {
    fn regions<'p>(&self, page: &'p Page) -> Vec<Region<'p>> {
        vec![Region {
            page_index: page.index,
            title_zone: self.zone.text_of(page),
            full_text: page.text(),
        }]
    }
}
