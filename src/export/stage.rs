//! Capture targets.
//!
//! A [`Stage`] holds mounted [`View`]s, each a rendered document plus the
//! editor chrome shown around it on screen: screen-only controls, a drop
//! shadow and a transition. Export capture must see none of that chrome, so
//! it runs inside a [`CaptureGuard`], which strips it and puts it back when
//! the guard is dropped, on success and failure alike.

use serde::Serialize;

use crate::layout::{Rect, RenderedDocument};
use crate::overlay::{OverlayHandle, OverlaySlot};

/// An on-screen control drawn over the document (e.g. an edit button).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    pub id: String,
    pub label: String,
    pub rect: Rect,
    /// Hidden during export capture.
    pub screen_only: bool,
    pub hidden: bool,
}

impl Control {
    pub fn screen_only(id: impl Into<String>, label: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            rect,
            screen_only: true,
            hidden: false,
        }
    }
}

/// Presentation styling of a view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewStyle {
    /// Drop shadow color, painted along the right and bottom edges.
    pub box_shadow: Option<String>,
    /// Active transition, if any.
    pub animation: Option<String>,
}

/// Everything the capture guard may touch, for before/after comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub style: ViewStyle,
    pub controls: Vec<(String, bool)>,
}

/// A mounted document.
#[derive(Debug)]
pub struct View {
    pub id: String,
    pub document: RenderedDocument,
    pub style: ViewStyle,
    pub controls: Vec<Control>,
    overlay: OverlaySlot,
}

impl View {
    /// Mount `document`; its overlay scene, if any, gets a fresh handle.
    pub fn new(id: impl Into<String>, document: RenderedDocument) -> Self {
        let mut view = Self {
            id: id.into(),
            document,
            style: ViewStyle::default(),
            controls: Vec::new(),
            overlay: OverlaySlot::new(),
        };
        view.reload_overlay();
        view
    }

    /// Editor chrome as the live preview shows it.
    pub fn with_editor_chrome(mut self) -> Self {
        self.style.box_shadow = Some("rgba(15, 23, 42, 0.25)".to_string());
        self.style.animation = Some("fade-in 150ms ease-out".to_string());
        self.controls.push(Control::screen_only(
            "edit-template",
            "Edit",
            Rect::new(self.document.width - 96.0, 8.0, 80.0, 28.0),
        ));
        self
    }

    /// Swap in a re-rendered document (settings changed). The previous
    /// overlay is disposed before the new one is built.
    pub fn set_document(&mut self, document: RenderedDocument) {
        self.document = document;
        self.reload_overlay();
    }

    fn reload_overlay(&mut self) {
        let next = self.document.overlay.clone().map(OverlayHandle::from_scene);
        self.overlay.replace(next);
    }

    pub fn overlay(&self) -> Option<&OverlayHandle> {
        self.overlay.get()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            style: self.style.clone(),
            controls: self.controls.iter().map(|c| (c.id.clone(), c.hidden)).collect(),
        }
    }

    pub fn visible_controls(&self) -> impl Iterator<Item = &Control> {
        self.controls.iter().filter(|c| !c.hidden)
    }
}

/// Mounted views, addressed by id.
#[derive(Debug, Default)]
pub struct Stage {
    views: Vec<View>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a view, replacing any view with the same id.
    pub fn mount(&mut self, view: View) {
        self.views.retain(|v| v.id != view.id);
        self.views.push(view);
    }

    /// Unmount a view; dropping it disposes its overlay.
    pub fn unmount(&mut self, id: &str) -> Option<View> {
        let index = self.views.iter().position(|v| v.id == id)?;
        Some(self.views.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut View> {
        self.views.iter_mut().find(|v| v.id == id)
    }
}

/// Scoped capture styling: screen-only controls hidden, shadow and
/// animation stripped. Restored on drop.
pub struct CaptureGuard<'a> {
    view: &'a mut View,
    saved_style: ViewStyle,
    saved_hidden: Vec<bool>,
}

impl<'a> CaptureGuard<'a> {
    pub fn new(view: &'a mut View) -> Self {
        let saved_style = view.style.clone();
        let saved_hidden = view.controls.iter().map(|c| c.hidden).collect();

        view.style.box_shadow = None;
        view.style.animation = None;
        for control in view.controls.iter_mut().filter(|c| c.screen_only) {
            control.hidden = true;
        }

        Self {
            view,
            saved_style,
            saved_hidden,
        }
    }

    pub fn view(&self) -> &View {
        self.view
    }
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.view.style = std::mem::take(&mut self.saved_style);
        for (control, hidden) in self.view.controls.iter_mut().zip(&self.saved_hidden) {
            control.hidden = *hidden;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InvoiceDocument;
    use crate::layout::render;
    use crate::settings::TemplateSettings;

    fn view() -> View {
        let doc = render(&InvoiceDocument::sample(), &TemplateSettings::default());
        View::new("preview", doc).with_editor_chrome()
    }

    #[test]
    fn guard_strips_and_restores() {
        let mut view = view();
        let before = view.snapshot();
        {
            let guard = CaptureGuard::new(&mut view);
            assert_eq!(guard.view().style, ViewStyle::default());
            assert_eq!(guard.view().visible_controls().count(), 0);
        }
        assert_eq!(view.snapshot(), before);
    }

    #[test]
    fn guard_restores_on_panic_unwind() {
        let mut view = view();
        let before = view.snapshot();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = CaptureGuard::new(&mut view);
            panic!("capture blew up");
        }));
        assert!(result.is_err());
        assert_eq!(view.snapshot(), before);
    }

    #[test]
    fn guard_keeps_non_screen_only_controls() {
        let mut view = view();
        view.controls.push(Control {
            screen_only: false,
            ..Control::screen_only("stamp", "Stamp", Rect::new(0.0, 0.0, 10.0, 10.0))
        });
        let guard = CaptureGuard::new(&mut view);
        let visible: Vec<&str> = guard.view().visible_controls().map(|c| c.id.as_str()).collect();
        assert_eq!(visible, vec!["stamp"]);
    }

    #[test]
    fn stage_mount_replaces_same_id() {
        let mut stage = Stage::new();
        stage.mount(view());
        stage.mount(view());
        assert!(stage.get("preview").is_some());
        assert!(stage.unmount("preview").is_some());
        assert!(stage.get("preview").is_none());
    }

    #[test]
    fn settings_change_disposes_previous_overlay() {
        let mut settings = TemplateSettings::default();
        settings.freeform_canvas = Some(r#"{"objects":[]}"#.to_string());
        let doc = render(&InvoiceDocument::sample(), &settings);
        let mut view = View::new("preview", doc.clone());
        let layer = view.overlay().unwrap().layer_ref();

        view.set_document(doc);
        assert!(layer.upgrade().is_none());
        assert!(view.overlay().is_some());
    }

    #[test]
    fn unmount_disposes_overlay() {
        let mut settings = TemplateSettings::default();
        settings.freeform_canvas = Some(r#"{"objects":[]}"#.to_string());
        let doc = render(&InvoiceDocument::sample(), &settings);
        let mut stage = Stage::new();
        stage.mount(View::new("preview", doc));
        let layer = stage.get("preview").unwrap().overlay().unwrap().layer_ref();
        drop(stage.unmount("preview"));
        assert!(layer.upgrade().is_none());
    }
}
