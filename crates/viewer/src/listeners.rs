/// Token returned when a resize listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Window resize listeners registered by mounted viewers.
///
/// The host forwards every resize to each registered id.
#[derive(Debug, Default)]
pub struct ResizeListeners {
    next: u64,
    active: Vec<ListenerId>,
}

impl ResizeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.active.push(id);
        id
    }

    /// Deregister `id`. Returns false if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.active.len();
        self.active.retain(|&l| l != id);
        self.active.len() != before
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.active.contains(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ListenerId> + '_ {
        self.active.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
