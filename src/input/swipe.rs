//! Swipe gestures from mouse drags
//!
//! A gesture starts when the left button goes down and ends when it is
//! released; the dominant axis of the movement picks the direction.

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::game::Direction;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SwipeTracker {
    start: Option<(u16, u16)>,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a mouse event; returns a direction when a swipe completes
    pub fn handle_mouse_event(&mut self, event: MouseEvent) -> Option<Direction> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.start = Some((event.column, event.row));
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let (x0, y0) = self.start.take()?;
                let dx = i32::from(event.column) - i32::from(x0);
                let dy = i32::from(event.row) - i32::from(y0);
                Direction::from_swipe(dx, dy)
            }
            _ => None,
        }
    }

    /// Forget a gesture in progress
    pub fn cancel(&mut self) {
        self.start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn swipe(from: (u16, u16), to: (u16, u16)) -> Option<Direction> {
        let mut tracker = SwipeTracker::new();
        let down = mouse(MouseEventKind::Down(MouseButton::Left), from.0, from.1);
        assert_eq!(tracker.handle_mouse_event(down), None);
        tracker.handle_mouse_event(mouse(MouseEventKind::Up(MouseButton::Left), to.0, to.1))
    }

    #[test]
    fn test_horizontal_swipes() {
        assert_eq!(swipe((10, 10), (20, 12)), Some(Direction::Right));
        assert_eq!(swipe((20, 10), (5, 8)), Some(Direction::Left));
    }

    #[test]
    fn test_vertical_swipes() {
        assert_eq!(swipe((10, 2), (11, 9)), Some(Direction::Down));
        assert_eq!(swipe((10, 9), (9, 2)), Some(Direction::Up));
    }

    #[test]
    fn test_click_is_not_a_swipe() {
        assert_eq!(swipe((4, 4), (4, 4)), None);
    }

    #[test]
    fn test_release_without_press() {
        let mut tracker = SwipeTracker::new();
        let up = mouse(MouseEventKind::Up(MouseButton::Left), 3, 3);
        assert_eq!(tracker.handle_mouse_event(up), None);
    }

    #[test]
    fn test_cancelled_gesture() {
        let mut tracker = SwipeTracker::new();
        tracker.handle_mouse_event(mouse(MouseEventKind::Down(MouseButton::Left), 0, 0));
        tracker.cancel();
        let up = mouse(MouseEventKind::Up(MouseButton::Left), 9, 0);
        assert_eq!(tracker.handle_mouse_event(up), None);
    }
}
