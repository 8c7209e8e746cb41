/// Identifier of an entity, unique within one document.
pub type EntityId = u64;

/// Identifier of a line, unique within one document and stable across edits.
pub type LineId = u64;

/// Hands out identifiers for lines and entities of a single document.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

/// Identity of a metadata node: the line holding its opening comment plus
/// the comment entity itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetadataId {
    pub line: LineId,
    pub comment: EntityId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_non_zero() {
        let mut ids = IdGenerator::new();
        let first = ids.next_id();
        let second = ids.next_id();
        assert_ne!(first, 0);
        assert_ne!(first, second);
    }
}
