use models::Entity;

/// Ordered in-memory collection with a monotonically increasing id counter.
///
/// Records keep insertion order. Ids start at 1 and are never reused, even
/// after the record holding the highest id is removed.
#[derive(Debug, Clone)]
pub struct EntityStore<E> {
    records: Vec<E>,
    next_id: u64,
}

impl<E: Entity> Default for EntityStore<E> {
    fn default() -> Self { Self::new() }
}

impl<E: Entity> EntityStore<E> {
    pub fn new() -> Self {
        Self { records: Vec::new(), next_id: 1 }
    }

    /// Id the next inserted record should carry.
    pub fn next_id(&self) -> u64 { self.next_id }

    /// Append a record built with [`next_id`](Self::next_id) and advance the counter.
    pub fn insert(&mut self, record: E) {
        self.next_id = self.next_id.max(record.id() + 1);
        self.records.push(record);
    }

    pub fn get(&self, id: u64) -> Option<&E> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn position(&self, id: u64) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    /// Overwrite the record at `index` (obtained from [`position`](Self::position)).
    pub fn replace(&mut self, index: usize, record: E) {
        self.records[index] = record;
    }

    pub fn remove(&mut self, id: u64) -> Option<E> {
        let index = self.position(id)?;
        Some(self.records.remove(index))
    }

    pub fn records(&self) -> &[E] { &self.records }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}
