//! Lightbox navigation state machine.
//!
//! States are `Closed` and `Open(id)`. The open id is always a member of
//! the visible list handed to each transition. Transitions never perform
//! I/O themselves; they describe the side effects (neighbour prefetch,
//! page-advance request, scroll-into-view) in a [`Transition`] for the
//! session to carry out.

use crate::error::CoreError;
use crate::types::{Image, ImageId, Quality};

/// Distance from the end of the loaded list at which traversal asks the
/// controller for the next page.
pub const DEFAULT_PREFETCH_THRESHOLD: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LightboxState {
    #[default]
    Closed,
    Open(ImageId),
}

/// Side effects requested by a lightbox transition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    /// Whether the open image changed.
    pub moved: bool,
    /// The controller should fetch the next page.
    pub request_page: bool,
    /// Neighbour ids whose bytes should be fetched ahead of time.
    pub prefetch: Vec<ImageId>,
    /// Id whose grid element should be scrolled into view.
    pub scroll_into_view: Option<ImageId>,
}

#[derive(Debug, Clone)]
pub struct Lightbox {
    state: LightboxState,
    quality: Quality,
    threshold: usize,
}

impl Default for Lightbox {
    fn default() -> Self {
        Self::new(DEFAULT_PREFETCH_THRESHOLD)
    }
}

impl Lightbox {
    pub fn new(threshold: usize) -> Self {
        Self {
            state: LightboxState::Closed,
            quality: Quality::Medium,
            threshold,
        }
    }

    pub fn state(&self) -> &LightboxState {
        &self.state
    }

    pub fn current(&self) -> Option<&str> {
        match &self.state {
            LightboxState::Open(id) => Some(id),
            LightboxState::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, LightboxState::Open(_))
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Show `id` full-screen. Re-opening on another id is allowed.
    pub fn open(&mut self, id: &str, visible: &[Image]) -> Result<Transition, CoreError> {
        let index = index_in(visible, id).ok_or_else(|| CoreError::NotFound {
            entity: "image",
            id: id.to_string(),
        })?;
        let moved = self.current() != Some(id);
        self.state = LightboxState::Open(id.to_string());
        Ok(Transition {
            moved,
            request_page: false,
            prefetch: neighbours(visible, index),
            scroll_into_view: None,
        })
    }

    /// Move to the following image.
    ///
    /// Near the end of the loaded list with more pages available, a page
    /// advance is requested alongside the move; at the very end the move
    /// itself is a no-op until that page lands.
    pub fn next(&mut self, visible: &[Image], has_more: bool) -> Result<Transition, CoreError> {
        let index = self.open_index(visible)?;
        let near_end = index + self.threshold >= visible.len();
        let request_page = has_more && near_end;

        if index + 1 >= visible.len() {
            return Ok(Transition {
                request_page,
                ..Transition::default()
            });
        }
        Ok(Transition {
            request_page,
            ..self.move_to(visible, index + 1)
        })
    }

    /// Move to the preceding image; a no-op on the first one.
    pub fn previous(&mut self, visible: &[Image]) -> Result<Transition, CoreError> {
        let index = self.open_index(visible)?;
        if index == 0 {
            return Ok(Transition::default());
        }
        Ok(self.move_to(visible, index - 1))
    }

    /// Close the lightbox, asking for the closed id to be scrolled into view.
    pub fn close(&mut self) -> Transition {
        match std::mem::take(&mut self.state) {
            LightboxState::Open(id) => Transition {
                moved: true,
                scroll_into_view: Some(id),
                ..Transition::default()
            },
            LightboxState::Closed => Transition::default(),
        }
    }

    /// Switch between `medium` and `original`. Only valid while open; the
    /// current image and its neighbours are prefetched at the new tier.
    pub fn toggle_quality(&mut self, visible: &[Image]) -> Result<Transition, CoreError> {
        let index = self.open_index(visible)?;
        self.quality = self.quality.toggled();
        let mut prefetch = vec![visible[index].id.clone()];
        prefetch.extend(neighbours(visible, index));
        Ok(Transition {
            prefetch,
            ..Transition::default()
        })
    }

    /// Close if the open id has dropped out of `visible` (e.g. the search
    /// term changed). Returns whether the lightbox was closed.
    pub fn reconcile(&mut self, visible: &[Image]) -> bool {
        let stale = self
            .current()
            .is_some_and(|id| index_in(visible, id).is_none());
        if stale {
            self.state = LightboxState::Closed;
        }
        stale
    }

    fn open_index(&self, visible: &[Image]) -> Result<usize, CoreError> {
        let id = self.current().ok_or_else(|| {
            CoreError::InvalidTransition("lightbox is closed".to_string())
        })?;
        index_in(visible, id).ok_or_else(|| CoreError::NotFound {
            entity: "image",
            id: id.to_string(),
        })
    }

    fn move_to(&mut self, visible: &[Image], index: usize) -> Transition {
        self.state = LightboxState::Open(visible[index].id.clone());
        Transition {
            moved: true,
            request_page: false,
            prefetch: neighbours(visible, index),
            scroll_into_view: None,
        }
    }
}

/// Previous and next ids around `index`, when present.
fn neighbours(visible: &[Image], index: usize) -> Vec<ImageId> {
    let mut ids = Vec::with_capacity(2);
    if index > 0 {
        ids.push(visible[index - 1].id.clone());
    }
    if let Some(next) = visible.get(index + 1) {
        ids.push(next.id.clone());
    }
    ids
}

fn index_in(images: &[Image], id: &str) -> Option<usize> {
    images.iter().position(|image| image.id == id)
}
