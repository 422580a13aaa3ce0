use crate::state::session::Action;

/// Clickable regions of the last frame. Rebuilt on every render; a click is
/// resolved against the regions in registration order, first match wins.
#[derive(Debug, Default)]
pub struct HitTestIndex {
    items: Vec<HitTarget>,
}

#[derive(Debug, Clone)]
pub struct HitTarget {
    pub action: Action,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl HitTestIndex {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn reset(&mut self) {
        self.items.clear();
    }

    pub fn add(&mut self, target: HitTarget) {
        self.items.push(target);
    }

    pub fn hit_target(&self, x: i32, y: i32) -> Option<&HitTarget> {
        self.items.iter().find(|item| {
            x >= item.x
                && y >= item.y
                && x < item.x + item.w as i32
                && y < item.y + item.h as i32
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::{Action, View};

    fn target(action: Action, x: i32, y: i32, w: u32, h: u32) -> HitTarget {
        HitTarget { action, x, y, w, h }
    }

    #[test]
    fn hits_respect_bounds() {
        let mut index = HitTestIndex::new();
        index.add(target(Action::SwitchView(View::Saved), 10, 10, 20, 10));
        assert!(index.hit_target(9, 10).is_none());
        assert!(index.hit_target(10, 10).is_some());
        assert!(index.hit_target(29, 19).is_some());
        assert!(index.hit_target(30, 19).is_none());
        assert!(index.hit_target(15, 20).is_none());
    }

    #[test]
    fn first_registered_wins_and_reset_clears() {
        let mut index = HitTestIndex::new();
        index.add(target(Action::Save("a".into()), 0, 0, 50, 50));
        index.add(target(Action::Delete("b".into()), 0, 0, 50, 50));
        let hit = index.hit_target(5, 5).unwrap();
        assert_eq!(hit.action, Action::Save("a".into()));
        index.reset();
        assert!(index.hit_target(5, 5).is_none());
    }
}
