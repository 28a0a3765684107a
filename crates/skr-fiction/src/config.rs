//! Configuration for a play session.

/// Options applied when a session is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Scene to start in. Overrides `starting_scene` in the story's `config:` block.
    pub starting_scene: Option<String>,
}

impl SessionConfig {
    /// Start in the given scene. Blank ids are ignored.
    pub fn with_starting_scene(mut self, scene: impl Into<String>) -> Self {
        let scene = scene.into().trim().to_string();
        self.starting_scene = (!scene.is_empty()).then_some(scene);
        self
    }
}
