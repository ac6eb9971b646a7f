//! Wiki-link graph extraction and radial layout.
//!
//! # Responsibility
//! - Resolve `[[Title]]` references between notes into directed links.
//! - Place notes on a circle for the graph view and hit-test taps.
//!
//! # Invariants
//! - Title resolution is case-insensitive exact match; the first note in the
//!   given order wins when titles collide.
//! - Unresolved references are dropped; duplicates and self-links are kept.

use crate::markdown::WIKI_LINK_RE;
use crate::model::note::{Note, NoteId};
use std::collections::HashMap;
use std::f64::consts::PI;

/// Taps closer than this to a node center select it.
pub const HIT_RADIUS: f64 = 15.0;

const CENTER_X_RATIO: f64 = 0.35;
const CENTER_Y_RATIO: f64 = 0.5;
const RADIUS_RATIO: f64 = 0.3;

/// Directed reference from one note's content to another note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteLink {
    pub source: NoteId,
    pub target: NoteId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NoteId,
    pub title: String,
    pub position: Point,
}

/// Nodes with positions plus the links between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<NoteLink>,
}

impl NoteGraph {
    /// Ids of notes that link to `id`, one entry per link.
    pub fn backlinks(&self, id: NoteId) -> Vec<NoteId> {
        self.links
            .iter()
            .filter(|link| link.target == id)
            .map(|link| link.source)
            .collect()
    }

    /// Ids of notes that `id` links to, one entry per link.
    pub fn outgoing(&self, id: NoteId) -> Vec<NoteId> {
        self.links
            .iter()
            .filter(|link| link.source == id)
            .map(|link| link.target)
            .collect()
    }

    /// Returns the node under `point`, if any.
    pub fn node_at(&self, point: Point) -> Option<&GraphNode> {
        hit_test(&self.nodes, point)
    }
}

/// Returns every `[[...]]` title in `content`, in order.
pub fn wiki_link_titles(content: &str) -> Vec<&str> {
    WIKI_LINK_RE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Resolves wiki links across `notes`.
pub fn extract_links(notes: &[Note]) -> Vec<NoteLink> {
    let mut by_title: HashMap<String, NoteId> = HashMap::with_capacity(notes.len());
    for note in notes {
        by_title.entry(note.title.to_lowercase()).or_insert(note.id);
    }

    let mut links = Vec::new();
    for source in notes {
        for title in wiki_link_titles(&source.content) {
            if let Some(target) = by_title.get(&title.to_lowercase()) {
                links.push(NoteLink {
                    source: source.id,
                    target: *target,
                });
            }
        }
    }
    links
}

/// Places `count` nodes evenly on a circle inside a `width` x `height` canvas.
pub fn radial_layout(count: usize, width: f64, height: f64) -> Vec<Point> {
    let center = Point::new(width * CENTER_X_RATIO, height * CENTER_Y_RATIO);
    let radius = width.min(height) * RADIUS_RATIO;
    let divisor = count.max(1) as f64;

    (0..count)
        .map(|index| {
            let angle = 2.0 * PI * index as f64 / divisor;
            Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

/// Returns the first node within [`HIT_RADIUS`] of `point`.
pub fn hit_test(nodes: &[GraphNode], point: Point) -> Option<&GraphNode> {
    nodes
        .iter()
        .find(|node| node.position.distance_to(point) < HIT_RADIUS)
}

/// Builds the graph view model for `notes` on a `width` x `height` canvas.
pub fn build_graph(notes: &[Note], width: f64, height: f64) -> NoteGraph {
    let positions = radial_layout(notes.len(), width, height);
    let nodes = notes
        .iter()
        .zip(positions)
        .map(|(note, position)| GraphNode {
            id: note.id,
            title: note.title.clone(),
            position,
        })
        .collect();

    NoteGraph {
        nodes,
        links: extract_links(notes),
    }
}

#[cfg(test)]
mod tests {
    use super::{radial_layout, wiki_link_titles, Point};

    #[test]
    fn wiki_link_titles_are_non_greedy() {
        assert_eq!(wiki_link_titles("[[A]] and [[B]]"), vec!["A", "B"]);
        assert!(wiki_link_titles("[[open").is_empty());
    }

    #[test]
    fn radial_layout_starts_at_three_o_clock() {
        let points = radial_layout(4, 1000.0, 800.0);
        assert_eq!(points.len(), 4);
        let first = points[0];
        assert!((first.x - (350.0 + 240.0)).abs() < 1e-9);
        assert!((first.y - 400.0).abs() < 1e-9);

        let third = points[2];
        assert!(third.distance_to(Point::new(350.0 - 240.0, 400.0)) < 1e-9);
    }

    #[test]
    fn radial_layout_handles_empty_input() {
        assert!(radial_layout(0, 100.0, 100.0).is_empty());
    }
}
