//! Image Catalog Store.
//!
//! Holds the ordered images of the current search session together with
//! the screen mode. The order is the server's and is never changed
//! locally: it drives next/previous traversal and range selection.
//!
//! The store does not deduplicate on [`Catalog::append`]; the pagination
//! controller is responsible for only handing it distinct pages.

use crate::types::{Image, ViewMode};

/// Direction of a bulk tag edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagEdit {
    Add,
    Remove,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    images: Vec<Image>,
    mode: ViewMode,
    /// Bumped on every mutation so observers can cheaply detect change.
    revision: u64,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection.
    pub fn replace(&mut self, images: Vec<Image>) {
        self.images = images;
        self.revision += 1;
    }

    /// Concatenate a page, preserving arrival order.
    pub fn append(&mut self, images: impl IntoIterator<Item = Image>) {
        self.images.extend(images);
        self.revision += 1;
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn read(&self) -> &[Image] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: &str) -> Option<&Image> {
        self.images.iter().find(|image| image.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.images.iter().position(|image| image.id == id)
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        if self.mode != mode {
            self.mode = mode;
            self.revision += 1;
        }
    }

    /// Apply a server-confirmed tag edit in place.
    ///
    /// Returns how many images actually changed.
    pub fn patch_tags(&mut self, ids: &[String], tags: &[String], edit: TagEdit) -> usize {
        let mut changed = 0;
        for image in self.images.iter_mut().filter(|image| ids.contains(&image.id)) {
            let before = image.tags.len();
            match edit {
                TagEdit::Add => image.tags.extend(tags.iter().cloned()),
                TagEdit::Remove => image.tags.retain(|tag| !tags.contains(tag)),
            }
            if image.tags.len() != before {
                changed += 1;
            }
        }
        if changed > 0 {
            self.revision += 1;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str) -> Image {
        Image::new(id, "", 1.5, Vec::new()).unwrap()
    }

    fn ids(catalog: &Catalog) -> Vec<&str> {
        catalog.read().iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn append_preserves_arrival_order() {
        let mut catalog = Catalog::new();
        catalog.append(vec![image("a"), image("b")]);
        catalog.append(vec![image("c")]);
        assert_eq!(ids(&catalog), ["a", "b", "c"]);
    }

    #[test]
    fn append_does_not_deduplicate() {
        let mut catalog = Catalog::new();
        catalog.append(vec![image("a")]);
        catalog.append(vec![image("a")]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn replace_discards_previous_images() {
        let mut catalog = Catalog::new();
        catalog.append(vec![image("a"), image("b")]);
        catalog.replace(vec![image("z")]);
        assert_eq!(ids(&catalog), ["z"]);
    }

    #[test]
    fn mutations_bump_revision() {
        let mut catalog = Catalog::new();
        let start = catalog.revision();
        catalog.append(vec![image("a")]);
        catalog.clear();
        assert_eq!(catalog.revision(), start + 2);
    }

    #[test]
    fn setting_same_mode_is_not_a_change() {
        let mut catalog = Catalog::new();
        let start = catalog.revision();
        catalog.set_mode(ViewMode::Browse);
        assert_eq!(catalog.revision(), start);
        catalog.set_mode(ViewMode::Tagging);
        assert_eq!(catalog.mode(), ViewMode::Tagging);
        assert_eq!(catalog.revision(), start + 1);
    }

    #[test]
    fn patch_tags_adds_and_removes() {
        let mut catalog = Catalog::new();
        catalog.append(vec![image("a"), image("b"), image("c")]);

        let targets = vec!["a".to_string(), "c".to_string()];
        let changed = catalog.patch_tags(&targets, &["sea".to_string()], TagEdit::Add);
        assert_eq!(changed, 2);
        assert!(catalog.get("a").unwrap().tags.contains("sea"));
        assert!(catalog.get("b").unwrap().tags.is_empty());

        let changed = catalog.patch_tags(&targets, &["sea".to_string()], TagEdit::Remove);
        assert_eq!(changed, 2);
        assert!(catalog.get("c").unwrap().tags.is_empty());
    }

    #[test]
    fn patch_tags_ignores_unknown_ids() {
        let mut catalog = Catalog::new();
        catalog.append(vec![image("a")]);
        let start = catalog.revision();
        let changed = catalog.patch_tags(&["nope".to_string()], &["x".to_string()], TagEdit::Add);
        assert_eq!(changed, 0);
        assert_eq!(catalog.revision(), start);
    }
}
