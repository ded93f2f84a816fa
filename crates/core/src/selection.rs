//! Multi-select over image ids with shift-range extension, plus the tag
//! union/intersection queries used by the bulk tag editor.

use std::collections::BTreeSet;

use crate::error::CoreError;
use crate::types::{Image, ImageId};

/// How much of the selection a tag covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Every selected image carries the tag.
    All,
    /// Only some selected images carry it.
    Some,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ImageId>,
    /// Anchor for shift-range extension.
    last_selected: Option<ImageId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn last_selected(&self) -> Option<&str> {
        self.last_selected.as_deref()
    }

    /// Selected ids in the order they appear in `visible`.
    pub fn ordered_ids(&self, visible: &[Image]) -> Vec<ImageId> {
        visible
            .iter()
            .filter(|image| self.ids.contains(&image.id))
            .map(|image| image.id.clone())
            .collect()
    }

    /// Handle a click on `id` in the currently visible list.
    ///
    /// Without `extend` the id is toggled. With `extend` every id between
    /// the anchor and `id` (inclusive, either direction) is added to the
    /// selection; with no usable anchor this degrades to a toggle. In both
    /// cases `id` becomes the new anchor.
    pub fn click(&mut self, id: &str, extend: bool, visible: &[Image]) -> Result<(), CoreError> {
        let clicked = index_in(visible, id).ok_or_else(|| CoreError::NotFound {
            entity: "image",
            id: id.to_string(),
        })?;

        let anchor = self
            .last_selected
            .as_deref()
            .and_then(|anchor| index_in(visible, anchor));

        match (extend, anchor) {
            (true, Some(anchor)) => {
                let (start, end) = if anchor <= clicked {
                    (anchor, clicked)
                } else {
                    (clicked, anchor)
                };
                self.ids
                    .extend(visible[start..=end].iter().map(|image| image.id.clone()));
            }
            _ => {
                if !self.ids.remove(id) {
                    self.ids.insert(id.to_string());
                }
            }
        }

        self.last_selected = Some(id.to_string());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.last_selected = None;
    }

    /// Drop ids that no longer exist in `images`.
    ///
    /// Returns how many were removed.
    pub fn retain_present(&mut self, images: &[Image]) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| index_in(images, id).is_some());
        if let Some(anchor) = &self.last_selected {
            if index_in(images, anchor).is_none() {
                self.last_selected = None;
            }
        }
        before - self.ids.len()
    }

    /// Tags carried by at least one selected image.
    pub fn union_tags(&self, images: &[Image]) -> BTreeSet<String> {
        self.selected(images)
            .flat_map(|image| image.tags.iter().cloned())
            .collect()
    }

    /// Tags carried by every selected image. Empty for an empty selection.
    pub fn intersection_tags(&self, images: &[Image]) -> BTreeSet<String> {
        let mut selected = self.selected(images);
        let Some(first) = selected.next() else {
            return BTreeSet::new();
        };
        selected.fold(first.tags.clone(), |acc, image| {
            acc.intersection(&image.tags).cloned().collect()
        })
    }

    /// Every tag in the selection with whether it applies to all or some.
    pub fn tag_coverage(&self, images: &[Image]) -> Vec<(String, Coverage)> {
        let all = self.intersection_tags(images);
        self.union_tags(images)
            .into_iter()
            .map(|tag| {
                let coverage = if all.contains(&tag) {
                    Coverage::All
                } else {
                    Coverage::Some
                };
                (tag, coverage)
            })
            .collect()
    }

    fn selected<'a>(&'a self, images: &'a [Image]) -> impl Iterator<Item = &'a Image> + 'a {
        images.iter().filter(move |image| self.ids.contains(&image.id))
    }
}

fn index_in(images: &[Image], id: &str) -> Option<usize> {
    images.iter().position(|image| image.id == id)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn image(id: &str, tags: &[&str]) -> Image {
        Image::new(id, "", 1.0, tags.iter().map(|t| t.to_string())).unwrap()
    }

    fn visible() -> Vec<Image> {
        ["A", "B", "C", "D", "E"]
            .iter()
            .map(|id| image(id, &[]))
            .collect()
    }

    fn selected(selection: &Selection, images: &[Image]) -> Vec<String> {
        selection.ordered_ids(images)
    }

    // -- click ----------------------------------------------------------------

    #[test]
    fn plain_click_toggles() {
        let images = visible();
        let mut selection = Selection::new();
        selection.click("B", false, &images).unwrap();
        assert!(selection.contains("B"));
        selection.click("B", false, &images).unwrap();
        assert!(!selection.contains("B"));
        assert_eq!(selection.last_selected(), Some("B"));
    }

    #[test]
    fn shift_click_extends_forward_then_backward() {
        let images = visible();
        let mut selection = Selection::new();
        selection.click("B", false, &images).unwrap();
        selection.click("E", true, &images).unwrap();
        assert_eq!(selected(&selection, &images), ["B", "C", "D", "E"]);

        // Anchor is now E; extending to A unions the whole list.
        selection.click("A", true, &images).unwrap();
        assert_eq!(selected(&selection, &images), ["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn shift_click_unions_rather_than_replaces() {
        let images = visible();
        let mut selection = Selection::new();
        selection.click("A", false, &images).unwrap();
        selection.click("D", false, &images).unwrap();
        selection.click("E", true, &images).unwrap();
        assert_eq!(selected(&selection, &images), ["A", "D", "E"]);
    }

    #[test]
    fn shift_click_without_anchor_toggles() {
        let images = visible();
        let mut selection = Selection::new();
        selection.click("C", true, &images).unwrap();
        assert_eq!(selected(&selection, &images), ["C"]);
    }

    #[test]
    fn click_on_unknown_id_rejected() {
        let images = visible();
        let mut selection = Selection::new();
        let result = selection.click("Z", false, &images);
        assert_matches!(result, Err(CoreError::NotFound { .. }));
        assert!(selection.is_empty());
    }

    #[test]
    fn range_uses_current_indices() {
        let mut images = visible();
        let mut selection = Selection::new();
        selection.click("B", false, &images).unwrap();
        // A new page landed and the list grew before the shift-click.
        images.push(image("F", &[]));
        selection.click("F", true, &images).unwrap();
        assert_eq!(selected(&selection, &images), ["B", "C", "D", "E", "F"]);
    }

    // -- retain_present / clear -----------------------------------------------

    #[test]
    fn retain_present_drops_stale_ids_and_anchor() {
        let images = visible();
        let mut selection = Selection::new();
        selection.click("A", false, &images).unwrap();
        selection.click("E", false, &images).unwrap();

        let remaining = vec![image("A", &[])];
        assert_eq!(selection.retain_present(&remaining), 1);
        assert_eq!(selected(&selection, &remaining), ["A"]);
        assert_eq!(selection.last_selected(), None);
    }

    #[test]
    fn clear_resets_anchor() {
        let images = visible();
        let mut selection = Selection::new();
        selection.click("A", false, &images).unwrap();
        selection.clear();
        assert!(selection.is_empty());
        assert_eq!(selection.last_selected(), None);
    }

    // -- tag queries ----------------------------------------------------------

    #[test]
    fn union_and_intersection() {
        let images = vec![
            image("A", &["sea", "sun"]),
            image("B", &["sea"]),
            image("C", &["snow"]),
        ];
        let mut selection = Selection::new();
        selection.click("A", false, &images).unwrap();
        selection.click("B", false, &images).unwrap();

        let union: Vec<String> = selection.union_tags(&images).into_iter().collect();
        let both: Vec<String> = selection.intersection_tags(&images).into_iter().collect();
        assert_eq!(union, ["sea", "sun"]);
        assert_eq!(both, ["sea"]);
        assert_eq!(
            selection.tag_coverage(&images),
            vec![
                ("sea".to_string(), Coverage::All),
                ("sun".to_string(), Coverage::Some)
            ]
        );
    }

    #[test]
    fn empty_selection_has_no_tags() {
        let images = vec![image("A", &["sea"])];
        let selection = Selection::new();
        assert!(selection.union_tags(&images).is_empty());
        assert!(selection.intersection_tags(&images).is_empty());
    }
}
