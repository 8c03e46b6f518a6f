//! Presentation and sound collaborators
//!
//! The simulation never touches rendering or audio directly. It talks to the
//! embedding application through these traits, passing opaque view handles.

use glam::Vec2;

use crate::tuning::KindId;

/// Opaque reference to a presented piece, issued by [`PieceViews::spawn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewHandle(pub u32);

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Piece joined a chain
    Selected,
    /// Wildcard blast caught extra pieces
    Exploded,
    /// Skill meter full
    SkillCharged,
    /// Skill armed, waiting for a target
    SkillActivated,
    /// Piece turned into a wildcard
    SkillUsed,
    /// Manual drop
    Drop,
    GameOver,
}

/// Fire-and-forget sound triggers
pub trait SoundSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Piece visuals plus the chain line drawn through selected pieces
pub trait PieceViews {
    /// Create a view, or `None` when the view pool is exhausted
    fn spawn(&mut self, kind: KindId, position: Vec2, radius: f32) -> Option<ViewHandle>;
    fn play_selected(&mut self, view: ViewHandle, with_sound: bool);
    /// Delete animation. With `with_sound` the view also plays the delete sound.
    fn play_deleted(&mut self, view: ViewHandle, with_sound: bool);
    fn set_selected(&mut self, view: ViewHandle, selected: bool);
    fn set_highlight(&mut self, view: ViewHandle, highlighted: bool);
    fn set_deleting(&mut self, view: ViewHandle);
    fn update_transform(&mut self, view: ViewHandle, position: Vec2, rotation: f32);
    /// Return the view to its pool
    fn delete(&mut self, view: ViewHandle);
    /// Redraw the chain line through these views (empty hides it)
    fn update_chain_line(&mut self, chain: &[ViewHandle]);
    /// Freeze the current line and fade it out over `duration` seconds
    fn fix_chain_line(&mut self, duration: f32);
}

/// No audio
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl SoundSink for Silent {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Headless views: hands out sequential handles and ignores everything else
#[derive(Debug, Default)]
pub struct NullViews {
    next: u32,
}

impl PieceViews for NullViews {
    fn spawn(&mut self, _kind: KindId, _position: Vec2, _radius: f32) -> Option<ViewHandle> {
        let handle = ViewHandle(self.next);
        self.next += 1;
        Some(handle)
    }
    fn play_selected(&mut self, _view: ViewHandle, _with_sound: bool) {}
    fn play_deleted(&mut self, _view: ViewHandle, _with_sound: bool) {}
    fn set_selected(&mut self, _view: ViewHandle, _selected: bool) {}
    fn set_highlight(&mut self, _view: ViewHandle, _highlighted: bool) {}
    fn set_deleting(&mut self, _view: ViewHandle) {}
    fn update_transform(&mut self, _view: ViewHandle, _position: Vec2, _rotation: f32) {}
    fn delete(&mut self, _view: ViewHandle) {}
    fn update_chain_line(&mut self, _chain: &[ViewHandle]) {}
    fn fix_chain_line(&mut self, _duration: f32) {}
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording fakes shared by the simulation tests

    use std::collections::{HashMap, HashSet};

    use super::*;

    #[derive(Debug, Default)]
    pub struct RecordingViews {
        next: u32,
        /// Fail spawns once this many views exist
        pub limit: Option<usize>,
        pub live: HashMap<ViewHandle, KindId>,
        pub highlighted: HashSet<ViewHandle>,
        pub selected: HashSet<ViewHandle>,
        pub deleting: HashSet<ViewHandle>,
        /// (view, with_sound) per delete animation
        pub deleted_animations: Vec<(ViewHandle, bool)>,
        pub chain_line: Vec<ViewHandle>,
        pub fixed_lines: Vec<f32>,
    }

    impl RecordingViews {
        /// Views whose pool runs dry after `limit` live pieces
        pub fn with_limit(limit: usize) -> Self {
            Self {
                limit: Some(limit),
                ..Self::default()
            }
        }
    }

    impl PieceViews for RecordingViews {
        fn spawn(&mut self, kind: KindId, _position: Vec2, _radius: f32) -> Option<ViewHandle> {
            if self.limit.is_some_and(|limit| self.live.len() >= limit) {
                return None;
            }
            let handle = ViewHandle(self.next);
            self.next += 1;
            self.live.insert(handle, kind);
            Some(handle)
        }
        fn play_selected(&mut self, _view: ViewHandle, _with_sound: bool) {}
        fn play_deleted(&mut self, view: ViewHandle, with_sound: bool) {
            self.deleted_animations.push((view, with_sound));
        }
        fn set_selected(&mut self, view: ViewHandle, selected: bool) {
            if selected {
                self.selected.insert(view);
            } else {
                self.selected.remove(&view);
            }
        }
        fn set_highlight(&mut self, view: ViewHandle, highlighted: bool) {
            if highlighted {
                self.highlighted.insert(view);
            } else {
                self.highlighted.remove(&view);
            }
        }
        fn set_deleting(&mut self, view: ViewHandle) {
            self.deleting.insert(view);
        }
        fn update_transform(&mut self, _view: ViewHandle, _position: Vec2, _rotation: f32) {}
        fn delete(&mut self, view: ViewHandle) {
            self.live.remove(&view);
        }
        fn update_chain_line(&mut self, chain: &[ViewHandle]) {
            self.chain_line = chain.to_vec();
        }
        fn fix_chain_line(&mut self, duration: f32) {
            self.fixed_lines.push(duration);
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingSound {
        pub played: Vec<SoundEffect>,
    }

    impl SoundSink for RecordingSound {
        fn play(&mut self, effect: SoundEffect) {
            self.played.push(effect);
        }
    }
}
