use crate::error::PageReadError;

/// A positioned run of text. Coordinates are in points with the origin at the
/// top-left corner of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            text: text.into(),
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    fn line_tolerance(&self) -> f64 {
        ((self.y_max - self.y_min).abs() / 2.0).max(1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub blocks: Vec<TextBlock>,
    text: String,
}

impl Page {
    pub fn new(index: usize, width: f64, height: f64, blocks: Vec<TextBlock>) -> Self {
        let text = join_blocks(blocks.iter());
        Self {
            index,
            width,
            height,
            blocks,
            text,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

pub type PageSlot = Result<Page, PageReadError>;

#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub pages: Vec<PageSlot>,
}

impl Document {
    pub fn new(name: impl Into<String>, pages: Vec<PageSlot>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn readable_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter_map(|slot| slot.as_ref().ok())
    }
}

/// Joins blocks in the order given, starting a new line whenever a block's top
/// edge moves past the previous block's line.
pub fn join_blocks<'a>(blocks: impl Iterator<Item = &'a TextBlock>) -> String {
    let mut output = String::new();
    let mut previous: Option<&TextBlock> = None;

    for block in blocks {
        let text = block.text.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(last) = previous {
            if (block.y_min - last.y_min).abs() > last.line_tolerance() {
                output.push('\n');
            } else {
                output.push(' ');
            }
        }
        output.push_str(text);
        previous = Some(block);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_text_breaks_lines_on_vertical_moves() {
        let page = Page::new(
            0,
            612.0,
            792.0,
            vec![
                TextBlock::new("SCHEDULE", 36.0, 35.0, 80.0, 45.0),
                TextBlock::new("1", 82.0, 35.2, 86.0, 45.0),
                TextBlock::new("(Form", 36.0, 47.0, 60.0, 57.0),
                TextBlock::new("1040)", 62.0, 47.0, 86.0, 57.0),
            ],
        );

        assert_eq!(page.text(), "SCHEDULE 1\n(Form 1040)");
    }

    #[test]
    fn readable_pages_skip_unreadable_slots() {
        let document = Document::new(
            "return.pdf",
            vec![
                Ok(Page::new(0, 612.0, 792.0, Vec::new())),
                Err(PageReadError {
                    document: "return.pdf".to_string(),
                    page_number: 2,
                    reason: "invalid page geometry".to_string(),
                }),
            ],
        );

        assert_eq!(document.page_count(), 2);
        assert_eq!(document.readable_pages().count(), 1);
    }
}
