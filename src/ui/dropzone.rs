/// Drop-zone adapter
///
/// Turns native drag events into an idle/active indicator and hands the
/// first dropped image file to a callback. Invalid drops are a silent no-op.
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One dropped file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    /// MIME type, empty when unknown
    pub mime: String,
    pub path: PathBuf,
}

impl DroppedItem {
    /// A dropped file, with its MIME type derived from the extension
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime = ImageFormat::from_path(&path)
            .map(|format| format.to_mime_type().to_owned())
            .unwrap_or_default();
        Self { mime, path }
    }

    fn image_path(&self) -> Option<&Path> {
        self.mime.starts_with("image").then_some(self.path.as_path())
    }
}

/// Drag state of the stage
///
/// The window reports one event per file, so items of a single gesture
/// arrive as separate drops, each announced by a hover. A gesture starts
/// with the first hover, or with a drop no hover announced; only the first
/// image of a gesture is delivered.
#[derive(Debug, Clone, Default)]
pub struct DropZone {
    active: bool,
    delivered: bool,
    /// Hovered files of the current gesture not dropped yet
    pending: usize,
}

impl DropZone {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Something is being dragged over the window
    pub fn drag_over(&mut self) {
        if !self.active {
            self.delivered = false;
            self.pending = 0;
        }
        self.active = true;
        self.pending += 1;
    }

    /// The drag left the window without dropping
    pub fn drag_leave(&mut self) {
        self.active = false;
        self.delivered = false;
        self.pending = 0;
    }

    /// Items were dropped. Calls `on_file` with the first image file, if any.
    ///
    /// Returns whether the callback was invoked.
    pub fn drop<F>(&mut self, items: &[DroppedItem], on_file: F) -> bool
    where
        F: FnOnce(PathBuf),
    {
        self.active = false;
        match self.pending.checked_sub(1) {
            Some(left) => self.pending = left,
            None => self.delivered = false,
        }
        if self.delivered {
            debug!(count = items.len(), "gesture already delivered an image, ignoring drop");
            return false;
        }

        match items.iter().find_map(DroppedItem::image_path) {
            Some(path) => {
                self.delivered = true;
                on_file(path.to_path_buf());
                true
            }
            None => {
                debug!(count = items.len(), "drop contained no image file");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(DroppedItem::file("mock.png").mime, "image/png");
        assert_eq!(DroppedItem::file("mock.jpeg").mime, "image/jpeg");
        assert_eq!(DroppedItem::file("notes.txt").mime, "");
    }

    #[test]
    fn test_drag_over_and_leave() {
        let mut zone = DropZone::default();
        assert!(!zone.is_active());
        zone.drag_over();
        assert!(zone.is_active());
        zone.drag_leave();
        assert!(!zone.is_active());
    }

    #[test]
    fn test_non_image_drop_is_noop() {
        let mut zone = DropZone::default();
        zone.drag_over();
        let mut received = None;
        let called = zone.drop(&[DroppedItem::file("notes.txt")], |p| received = Some(p));
        assert!(!called);
        assert!(received.is_none());
        assert!(!zone.is_active());
    }

    #[test]
    fn test_first_image_wins() {
        let mut zone = DropZone::default();
        zone.drag_over();
        let items = [
            DroppedItem::file("readme.md"),
            DroppedItem::file("first.png"),
            DroppedItem::file("second.jpg"),
        ];
        let mut received = None;
        assert!(zone.drop(&items, |p| received = Some(p)));
        assert_eq!(received, Some(PathBuf::from("first.png")));
    }

    #[test]
    fn test_one_image_per_gesture() {
        let mut zone = DropZone::default();
        zone.drag_over();
        zone.drag_over();
        assert!(zone.drop(&[DroppedItem::file("a.png")], |_| {}));
        assert!(!zone.drop(&[DroppedItem::file("b.png")], |_| {}));

        // A new gesture starts with a fresh hover
        zone.drag_over();
        assert!(zone.drop(&[DroppedItem::file("c.png")], |_| {}));
    }

    #[test]
    fn test_drops_without_hover_each_deliver() {
        let mut zone = DropZone::default();
        let mut received = Vec::new();
        assert!(zone.drop(&[DroppedItem::file("a.png")], |p| received.push(p)));
        assert!(zone.drop(&[DroppedItem::file("b.png")], |p| received.push(p)));
        assert_eq!(received, [PathBuf::from("a.png"), PathBuf::from("b.png")]);
        assert!(!zone.is_active());
    }

    #[test]
    fn test_unannounced_drop_after_gesture_delivers() {
        let mut zone = DropZone::default();
        zone.drag_over();
        assert!(zone.drop(&[DroppedItem::file("a.png")], |_| {}));
        assert!(zone.drop(&[DroppedItem::file("b.png")], |_| {}));
    }
}
