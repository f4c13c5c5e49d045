//! Copy/paste slot shared between patterns.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::PPoint;

/// A single slot holding a copied point list.
///
/// Cloning the handle shares the slot. Every pattern operation that copies or
/// pastes takes the clipboard explicitly; [`Clipboard::process_wide`] returns
/// the slot shared by every plugin instance in the process.
///
/// # Examples
///
/// ```
/// use curvegate::{Clipboard, Pattern};
///
/// let clipboard = Clipboard::new();
/// let mut source = Pattern::new(0);
/// source.load_triangle();
/// source.copy(&clipboard);
///
/// let mut target = Pattern::new(1);
/// target.paste(&clipboard);
/// assert_eq!(target.points().len(), source.points().len());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Arc<Mutex<Option<Vec<PPoint>>>>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The clipboard shared across the whole process.
    pub fn process_wide() -> Clipboard {
        static GLOBAL: OnceLock<Clipboard> = OnceLock::new();
        GLOBAL.get_or_init(Clipboard::new).clone()
    }

    pub fn store(&self, points: &[PPoint]) {
        *self.slot.lock() = Some(points.to_vec());
    }

    /// Copy of the stored points, if anything was copied.
    pub fn contents(&self) -> Option<Vec<PPoint>> {
        self.slot.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::PointType;

    #[test]
    fn test_clones_share_slot() {
        let a = Clipboard::new();
        let b = a.clone();
        assert!(b.is_empty());
        a.store(&[PPoint::new(0.5, 0.5, 0.0, PointType::Curve)]);
        assert_eq!(b.contents().map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_process_wide_is_shared() {
        let a = Clipboard::process_wide();
        let b = Clipboard::process_wide();
        assert!(Arc::ptr_eq(&a.slot, &b.slot));
    }
}
