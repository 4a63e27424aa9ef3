//! Pointer and multi-touch input
//!
//! Raw events are turned into taps. A mouse click is a press released within
//! [`CLICK_MAX_HOLD_MS`]; a touch taps on finger-down, and repeated downs of
//! the same finger inside the cooldown window are dropped.

use std::collections::HashMap;

use glam::Vec2;

/// Longest press still counted as a click
pub const CLICK_MAX_HOLD_MS: u64 = 1000;
/// Per-finger duplicate suppression window
pub const TOUCH_COOLDOWN_MS: u64 = 50;

/// Raw platform event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    MouseDown { pos: Vec2, time_ms: u64 },
    MouseUp { pos: Vec2, time_ms: u64 },
    /// Touch position is normalized to [0, 1] on both axes
    TouchDown { id: u64, norm: Vec2, time_ms: u64 },
    TouchMotion { id: u64, norm: Vec2 },
    TouchUp { id: u64 },
    Escape,
    Quit,
}

/// What the level acts on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    Tap(Vec2),
    Quit,
}

#[derive(Debug, Clone)]
pub struct PointerInput {
    screen: Vec2,
    mouse_down_at: Option<u64>,
    active_touches: HashMap<u64, Vec2>,
    last_touch_down: HashMap<u64, u64>,
    cooldown_ms: u64,
}

impl PointerInput {
    pub fn new(screen: Vec2) -> Self {
        Self {
            screen,
            mouse_down_at: None,
            active_touches: HashMap::new(),
            last_touch_down: HashMap::new(),
            cooldown_ms: TOUCH_COOLDOWN_MS,
        }
    }

    /// Forget all held buttons, touches and cooldowns
    pub fn reset(&mut self) {
        self.mouse_down_at = None;
        self.active_touches.clear();
        self.last_touch_down.clear();
    }

    pub fn touch_count(&self) -> usize {
        self.active_touches.len()
    }

    pub fn translate(&mut self, event: &InputEvent) -> Option<PointerAction> {
        match *event {
            InputEvent::Quit | InputEvent::Escape => Some(PointerAction::Quit),
            InputEvent::MouseDown { time_ms, .. } => {
                self.mouse_down_at = Some(time_ms);
                None
            }
            InputEvent::MouseUp { pos, time_ms } => {
                let pressed_at = self.mouse_down_at.take()?;
                if time_ms.saturating_sub(pressed_at) <= CLICK_MAX_HOLD_MS {
                    Some(PointerAction::Tap(pos))
                } else {
                    None
                }
            }
            InputEvent::TouchDown { id, norm, time_ms } => {
                if let Some(&last) = self.last_touch_down.get(&id) {
                    if time_ms.saturating_sub(last) < self.cooldown_ms {
                        log::debug!("Touch {} suppressed by cooldown", id);
                        return None;
                    }
                }
                let pos = norm * self.screen;
                self.last_touch_down.insert(id, time_ms);
                self.active_touches.insert(id, pos);
                Some(PointerAction::Tap(pos))
            }
            InputEvent::TouchMotion { id, norm } => {
                if let Some(pos) = self.active_touches.get_mut(&id) {
                    *pos = norm * self.screen;
                }
                None
            }
            InputEvent::TouchUp { id } => {
                self.active_touches.remove(&id);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> PointerInput {
        PointerInput::new(Vec2::new(1000.0, 500.0))
    }

    #[test]
    fn test_click_needs_short_press() {
        let mut input = input();
        let pos = Vec2::new(10.0, 20.0);
        assert_eq!(input.translate(&InputEvent::MouseDown { pos, time_ms: 0 }), None);
        assert_eq!(
            input.translate(&InputEvent::MouseUp { pos, time_ms: 300 }),
            Some(PointerAction::Tap(pos))
        );

        input.translate(&InputEvent::MouseDown { pos, time_ms: 1000 });
        assert_eq!(input.translate(&InputEvent::MouseUp { pos, time_ms: 2500 }), None);
        // Release without a press
        assert_eq!(input.translate(&InputEvent::MouseUp { pos, time_ms: 2600 }), None);
    }

    #[test]
    fn test_touch_scaled_and_deduplicated() {
        let mut input = input();
        let down = InputEvent::TouchDown {
            id: 1,
            norm: Vec2::new(0.5, 0.5),
            time_ms: 100,
        };
        assert_eq!(input.translate(&down), Some(PointerAction::Tap(Vec2::new(500.0, 250.0))));
        assert_eq!(
            input.translate(&InputEvent::TouchDown {
                id: 1,
                norm: Vec2::new(0.5, 0.5),
                time_ms: 120,
            }),
            None
        );
        // Another finger is independent
        assert!(input
            .translate(&InputEvent::TouchDown {
                id: 2,
                norm: Vec2::ZERO,
                time_ms: 120,
            })
            .is_some());
        assert_eq!(input.touch_count(), 2);

        input.translate(&InputEvent::TouchUp { id: 1 });
        assert_eq!(input.touch_count(), 1);
        assert!(input
            .translate(&InputEvent::TouchDown {
                id: 1,
                norm: Vec2::ONE,
                time_ms: 150,
            })
            .is_some());
    }

    #[test]
    fn test_quit_events() {
        let mut input = input();
        assert_eq!(input.translate(&InputEvent::Escape), Some(PointerAction::Quit));
        assert_eq!(input.translate(&InputEvent::Quit), Some(PointerAction::Quit));
    }
}
