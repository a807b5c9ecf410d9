//! Highlight overlays for a rendered invoice PDF.
//!
//! Rectangles come from the server already resolved to a page and a box in
//! percent of the page, so this module only groups and colours them.

pub mod preview;

use crate::invoice::{Attribute, Position};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

pub use preview::{PdfPreview, PdfSource, PreviewError, PreviewSlot};

pub const HIGHLIGHT_OPACITY: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Mapped,
    Pending,
}

impl HighlightColor {
    pub fn for_mapped(mapped: bool) -> Self {
        if mapped {
            HighlightColor::Mapped
        } else {
            HighlightColor::Pending
        }
    }

    pub fn css(&self) -> &'static str {
        match self {
            HighlightColor::Mapped => "green",
            HighlightColor::Pending => "#f9c555",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub attribute_name: String,
    pub page_index: u32,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub is_attribute_mapped: bool,
}

impl Highlight {
    pub fn new(attribute_name: &str, position: &Position, mapped: bool) -> Self {
        Self {
            attribute_name: attribute_name.to_string(),
            page_index: position.page_index,
            left: position.left,
            top: position.top,
            width: position.width,
            height: position.height,
            is_attribute_mapped: mapped,
        }
    }

    pub fn color(&self) -> HighlightColor {
        HighlightColor::for_mapped(self.is_attribute_mapped)
    }
}

/// Flatten every position in the tree, parents before children
pub fn extract_highlights(attributes: &[Attribute]) -> Vec<Highlight> {
    let mut out = Vec::new();
    collect(attributes, &mut out);
    out
}

fn collect(attributes: &[Attribute], out: &mut Vec<Highlight>) {
    for attr in attributes {
        out.extend(
            attr.position
                .iter()
                .map(|pos| Highlight::new(&attr.attribute_name, pos, attr.is_attribute_mapped)),
        );
        collect(&attr.children, out);
    }
}

/// Highlights grouped by page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightLayer {
    pages: BTreeMap<u32, Vec<Highlight>>,
}

impl HighlightLayer {
    pub fn from_highlights(highlights: impl IntoIterator<Item = Highlight>) -> Self {
        let mut pages: BTreeMap<u32, Vec<Highlight>> = BTreeMap::new();
        for highlight in highlights {
            pages.entry(highlight.page_index).or_default().push(highlight);
        }
        Self { pages }
    }

    /// Build from a page-indexed map; the map key wins over any page index on the boxes
    pub fn from_pages(pages: BTreeMap<u32, Vec<Highlight>>) -> Self {
        let pages = pages
            .into_iter()
            .map(|(page, boxes)| {
                let boxes = boxes
                    .into_iter()
                    .map(|mut h| {
                        h.page_index = page;
                        h
                    })
                    .collect();
                (page, boxes)
            })
            .collect();
        Self { pages }
    }

    pub fn from_attributes(attributes: &[Attribute]) -> Self {
        Self::from_highlights(extract_highlights(attributes))
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    pub fn boxes_for_page(&self, page: u32) -> &[Highlight] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// SVG overlay for one page, in a 0..100 coordinate space stretched over the page
    pub fn render_svg(&self, page: u32) -> String {
        let mut svg = String::from(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 100 100\" preserveAspectRatio=\"none\">\n",
        );
        for highlight in self.boxes_for_page(page) {
            let _ = writeln!(
                svg,
                "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" fill-opacity=\"{}\"><title>{}</title></rect>",
                highlight.left,
                highlight.top,
                highlight.width,
                highlight.height,
                highlight.color().css(),
                HIGHLIGHT_OPACITY,
                escape_xml(&highlight.attribute_name),
            );
        }
        svg.push_str("</svg>\n");
        svg
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
