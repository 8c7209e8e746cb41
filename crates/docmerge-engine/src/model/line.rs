use std::borrow::Cow;
use std::ops::Range;

use super::entity::{Entity, Payload};
use super::ids::{EntityId, LineId};
use super::state::LexerState;

/// One line of a document together with the entities parsed from it.
#[derive(Debug, Clone)]
pub struct Line {
    id: LineId,
    text: String,
    entities: Vec<Entity>,
    pub(crate) state_at_start: LexerState,
    pub(crate) state_at_end: LexerState,
}

impl Line {
    pub fn new(id: LineId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            entities: Vec::new(),
            state_at_start: LexerState::None,
            state_at_end: LexerState::None,
        }
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    /// Text as of the last rebuild. Pending entity edits are not included,
    /// see [`Line::render`].
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn state_at_start(&self) -> LexerState {
        self.state_at_start
    }

    pub fn state_at_end(&self) -> LexerState {
        self.state_at_end
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Adds an entity. An entity overlapping an existing one is a parser bug;
    /// it is logged and dropped.
    pub fn add(&mut self, entity: Entity) -> bool {
        if let Some(existing) = self.entities.iter().find(|e| e.overlaps(&entity.range)) {
            log::error!(
                "entity {} at {:?} overlaps entity {} at {:?} on line {}",
                entity.id,
                entity.range,
                existing.id,
                existing.range,
                self.id
            );
            return false;
        }
        self.entities.push(entity);
        true
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(index))
    }

    pub fn find(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.find(id).is_some()
    }

    /// Changes the payload of entity `id`. Returns true if the payload changed.
    ///
    /// The line text is not touched until [`Line::flush`].
    pub fn modify(&mut self, id: EntityId, change: impl FnOnce(&mut Payload)) -> bool {
        match self.entities.iter_mut().find(|e| e.id == id) {
            Some(entity) => entity.modify(change),
            None => false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.entities.iter().any(Entity::is_dirty)
    }

    /// Current text including pending entity edits.
    pub fn render(&self) -> Cow<'_, str> {
        if !self.is_dirty() {
            return Cow::Borrowed(&self.text);
        }
        let (text, _) = self.layout();
        Cow::Owned(text)
    }

    /// Writes pending entity edits into the text and recomputes every range.
    pub fn flush(&mut self) {
        if !self.is_dirty() {
            return;
        }
        let (text, ranges) = self.layout();
        self.text = text;
        for (entity, range) in self.entities.iter_mut().zip(ranges) {
            entity.range = range;
            entity.clear_dirty();
        }
    }

    /// Rebuilds the text in one pass over entities ordered by position.
    /// Returned ranges follow the insertion order of `entities`.
    fn layout(&self) -> (String, Vec<Range<usize>>) {
        let mut order: Vec<usize> = (0..self.entities.len()).collect();
        order.sort_by_key(|&i| self.entities[i].range.start);

        let mut out = String::with_capacity(self.text.len() + 16);
        let mut ranges = vec![0..0; self.entities.len()];
        let mut copied_to = 0;
        for i in order {
            let entity = &self.entities[i];
            out.push_str(&self.text[copied_to..entity.range.start]);
            let start = out.len();
            if entity.is_dirty() {
                out.push_str(&entity.to_markdown());
            } else {
                out.push_str(&self.text[entity.range.clone()]);
            }
            ranges[i] = start..out.len();
            copied_to = entity.range.end;
        }
        out.push_str(&self.text[copied_to..]);
        (out, ranges)
    }

    /// Drops parse results ahead of a re-parse. Pending edits are flushed first.
    pub(crate) fn reset(&mut self) {
        self.flush();
        self.entities.clear();
        self.state_at_start = LexerState::None;
        self.state_at_end = LexerState::None;
    }
}
