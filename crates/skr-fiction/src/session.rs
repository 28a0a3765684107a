//! Interactive play over a built script.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use skr_core::{Action, Choice, CoreError, Node, NodeKind, Script, SourceRange};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};

/// Index of a beat in the session arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeatId(usize);

impl BeatId {
    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A playable beat: a declared one, or an inline one made from an option body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Declared id, or `<beat>::inline-<choice>` for inline beats.
    pub id: String,
    /// Guard of the beat, or of the option an inline beat came from.
    pub when: Option<String>,
    /// What the beat does.
    pub actions: Vec<Action>,
    /// Options offered at the end of the beat.
    pub choices: Vec<Choice>,
    /// Where the beat (or option) was written.
    pub range: SourceRange,
    /// `true` for beats made from an option body.
    pub inline: bool,
}

impl Beat {
    fn declared(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            when: node.when.clone(),
            actions: node.actions.clone(),
            choices: node.choices.clone(),
            range: node.range,
            inline: false,
        }
    }

    fn from_option(id: String, choice: &Choice) -> Self {
        Self {
            id,
            when: choice.when.clone(),
            actions: choice.actions.clone(),
            choices: choice.choices.clone(),
            range: choice.range,
            inline: true,
        }
    }

    /// Returns `true` if an `end` action is present.
    pub fn has_end_action(&self) -> bool {
        self.actions.iter().any(Action::is_end)
    }

    /// Returns `true` if no options are offered.
    pub fn has_no_choices(&self) -> bool {
        self.choices.is_empty()
    }

    /// Ids of the options, in declaration order.
    fn choice_ids(&self) -> Vec<String> {
        self.choices
            .iter()
            .enumerate()
            .map(|(i, choice)| match choice.explicit_target() {
                Some(target) => target.to_string(),
                None => format!("{}::choice-{i}", self.id),
            })
            .collect()
    }
}

/// An option as offered to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionChoice {
    /// Id to pass to [`Session::choose`].
    pub id: String,
    /// Label shown to the player.
    pub label: String,
    /// Guard of the option, for display.
    pub when: Option<String>,
}

/// A play-through of a script.
///
/// Holds only the beat arena, the id index, the current beat and the ended
/// flag. Cloning a session snapshots it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    beats: Vec<Beat>,
    index: HashMap<String, BeatId>,
    current: BeatId,
    ended: bool,
}

impl Session {
    /// Start a session with the default configuration.
    pub fn new(script: &Script) -> SessionResult<Self> {
        Self::with_config(script, &SessionConfig::default())
    }

    /// Start a session.
    pub fn with_config(script: &Script, config: &SessionConfig) -> SessionResult<Self> {
        script.check_structure().map_err(|err| match err {
            CoreError::Malformed(reason) => SessionError::InvalidRuntime(reason),
            other => SessionError::InvalidRuntime(other.to_string()),
        })?;

        let story = script.story().ok_or(SessionError::MissingStory)?;
        let scenes: Vec<&Node> = story.children_of(NodeKind::Scene).collect();
        if scenes.is_empty() {
            return Err(SessionError::NoScenes);
        }

        let mut beats = Vec::new();
        let mut index = HashMap::new();
        index_beats(&script.nodes, &mut beats, &mut index);

        let wanted = config
            .starting_scene
            .clone()
            .or_else(|| configured_starting_scene(story));
        let scene = match wanted {
            Some(id) => scenes
                .iter()
                .find(|scene| scene.id == id)
                .ok_or(SessionError::StartingSceneNotFound(id))?,
            None => &scenes[0],
        };

        let first = scene
            .children_of(NodeKind::Beat)
            .next()
            .ok_or_else(|| SessionError::SceneHasNoBeats(scene.id.clone()))?;
        // the declared node itself, even if a later beat reuses its id
        let current = beats
            .iter()
            .position(|beat| beat.id == first.id && beat.range == first.range)
            .map(BeatId)
            .ok_or_else(|| {
                SessionError::InvalidRuntime(format!("beat \"{}\" is not indexed", first.id))
            })?;

        log::debug!(
            "session started in scene \"{}\" at beat \"{}\" ({} beats indexed)",
            scene.id,
            first.id,
            index.len()
        );
        let mut session = Self {
            beats,
            index,
            current,
            ended: false,
        };
        session.refresh_ended();
        Ok(session)
    }

    /// The beat being played.
    pub fn current_beat(&self) -> &Beat {
        &self.beats[self.current.0]
    }

    /// Id of the beat being played.
    pub fn current_beat_id(&self) -> &str {
        &self.current_beat().id
    }

    /// Guard of the current beat.
    pub fn current_when(&self) -> Option<&str> {
        self.current_beat().when.as_deref()
    }

    /// Returns `true` if the current beat has an `end` action.
    pub fn has_end_action(&self) -> bool {
        self.current_beat().has_end_action()
    }

    /// Returns `true` if the current beat offers no options.
    pub fn has_no_choices(&self) -> bool {
        self.current_beat().has_no_choices()
    }

    /// Returns `true` once the story has ended.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// The current beat's actions, one line each, blank lines dropped.
    pub fn text(&self) -> String {
        self.current_beat()
            .actions
            .iter()
            .map(ToString::to_string)
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Options of the current beat. Empty once ended.
    pub fn choices(&self) -> Vec<SessionChoice> {
        if self.ended {
            return Vec::new();
        }
        let beat = self.current_beat();
        beat.choice_ids()
            .into_iter()
            .zip(&beat.choices)
            .map(|(id, choice)| SessionChoice {
                id,
                label: choice.label.clone(),
                when: choice.when.clone(),
            })
            .collect()
    }

    /// Follow the option with the given id.
    pub fn choose(&mut self, id: &str) -> SessionResult<()> {
        if self.ended {
            return Err(SessionError::AlreadyEnded);
        }

        let beat = self.current_beat();
        let beat_id = beat.id.clone();
        let ids = beat.choice_ids();
        // Several options can share an id; the last one listed is taken.
        let Some(position) = ids.iter().rposition(|candidate| candidate == id) else {
            let mut available: Vec<String> = Vec::with_capacity(ids.len());
            for candidate in ids {
                if !available.contains(&candidate) {
                    available.push(candidate);
                }
            }
            return Err(SessionError::UnknownChoice {
                choice: id.to_string(),
                beat: beat_id,
                available,
            });
        };
        let choice = beat.choices[position].clone();

        let next = match choice.explicit_target() {
            Some(target) => {
                self.index
                    .get(target)
                    .copied()
                    .ok_or_else(|| SessionError::UnknownTarget {
                        label: choice.label.clone(),
                        beat: beat_id.clone(),
                        target: target.to_string(),
                    })?
            }
            None if choice.has_inline_body() => {
                let inline_id = format!("{beat_id}::inline-{}", ids[position]);
                self.insert_inline(Beat::from_option(inline_id, &choice))
            }
            None => {
                return Err(SessionError::MissingTarget {
                    label: choice.label,
                    beat: beat_id,
                });
            }
        };

        log::debug!(
            "choice \"{id}\": \"{beat_id}\" -> \"{}\"",
            self.beats[next.0].id
        );
        self.current = next;
        self.refresh_ended();
        Ok(())
    }

    /// Serialize the session, inline beats included.
    pub fn to_json(&self) -> SessionResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| SessionError::InvalidRuntime(err.to_string()))
    }

    /// Restore a session saved with [`Session::to_json`].
    pub fn from_json(json: &str) -> SessionResult<Self> {
        let session: Self =
            serde_json::from_str(json).map_err(|err| SessionError::InvalidRuntime(err.to_string()))?;
        let len = session.beats.len();
        if session.current.0 >= len {
            return Err(SessionError::InvalidRuntime(format!(
                "current beat {} is outside the {len} known beats",
                session.current.0
            )));
        }
        if let Some((id, _)) = session.index.iter().find(|(_, beat)| beat.0 >= len) {
            return Err(SessionError::InvalidRuntime(format!(
                "beat \"{id}\" points outside the {len} known beats"
            )));
        }
        Ok(session)
    }

    /// Reuse an inline beat with the same id, or add a new one.
    ///
    /// Inline beats live in the arena only; they never enter the id index.
    fn insert_inline(&mut self, beat: Beat) -> BeatId {
        if let Some(existing) = self
            .beats
            .iter()
            .position(|known| known.inline && known.id == beat.id)
        {
            self.beats[existing] = beat;
            return BeatId(existing);
        }
        self.beats.push(beat);
        BeatId(self.beats.len() - 1)
    }

    fn refresh_ended(&mut self) {
        let beat = self.current_beat();
        let ended = beat.has_end_action() || beat.has_no_choices();
        if ended {
            log::debug!("story ended at beat \"{}\"", beat.id);
        }
        self.ended = ended;
    }
}

/// Add every beat in the tree to the arena. A later beat with an id already
/// seen replaces it in the index.
fn index_beats(nodes: &[Node], beats: &mut Vec<Beat>, index: &mut HashMap<String, BeatId>) {
    for node in nodes {
        if node.kind == NodeKind::Beat {
            let id = BeatId(beats.len());
            beats.push(Beat::declared(node));
            if index.insert(node.id.clone(), id).is_some() {
                log::warn!(
                    "beat \"{}\" is declared more than once; the last declaration wins",
                    node.id
                );
            }
        }
        index_beats(&node.children, beats, index);
    }
}

/// `starting_scene = <id>` from the story's config blocks. First match wins.
fn configured_starting_scene(story: &Node) -> Option<String> {
    story
        .children_of(NodeKind::Config)
        .flat_map(|config| config.body.lines())
        .find_map(starting_scene_line)
}

fn starting_scene_line(line: &str) -> Option<String> {
    let rest = line.trim().strip_prefix("starting_scene")?;
    let value = rest.trim_start().strip_prefix('=')?.trim();
    let value = unquote(value, '"').or_else(|| unquote(value, '\'')).unwrap_or(value);
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn unquote(value: &str, quote: char) -> Option<&str> {
    value.strip_prefix(quote)?.strip_suffix(quote)
}
