use crate::core::wall::WallSide;
use crate::error::{Error, Result};
use std::fmt;

/// Handle to a live simulation entity, as seen by registry observers.
///
/// Consumers match on the variant instead of inspecting types at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimObject {
    /// Index into the molecule's atom list.
    Atom { index: usize, name: String },
    Wall { side: WallSide },
    /// Index into the molecule's spring list.
    Spring {
        index: usize,
        name: String,
        special: bool,
    },
}

impl SimObject {
    pub fn name(&self) -> &str {
        match self {
            SimObject::Atom { name, .. } | SimObject::Spring { name, .. } => name,
            SimObject::Wall { side } => side.name(),
        }
    }

    pub fn kind(&self) -> SimObjectKind {
        match self {
            SimObject::Atom { .. } => SimObjectKind::Atom,
            SimObject::Wall { .. } => SimObjectKind::Wall,
            SimObject::Spring { .. } => SimObjectKind::Spring,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimObjectKind {
    Atom,
    Wall,
    Spring,
}

/// Change notification delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimListEvent {
    Added(SimObject),
    Removed(SimObject),
}

impl SimListEvent {
    pub fn object(&self) -> &SimObject {
        match self {
            SimListEvent::Added(o) | SimListEvent::Removed(o) => o,
        }
    }
}

/// Identifier returned by [`SimList::add_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&SimListEvent)>;

/// Ordered registry of live entities with synchronous add/remove notifications.
///
/// Observers run inline, in registration order, before `add`/`remove` returns.
/// An observer only sees the event; it cannot reach back into the list while it is
/// being notified.
#[derive(Default)]
pub struct SimList {
    objects: Vec<SimObject>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
}

impl fmt::Debug for SimList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimList")
            .field("objects", &self.objects)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl SimList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `obj`. Adding an entity that is already present is a caller error.
    pub fn add(&mut self, obj: SimObject) -> Result<()> {
        if self.find(&obj).is_some() {
            return Err(Error::DuplicateEntity(obj.name().to_string()));
        }
        self.objects.push(obj.clone());
        self.notify(&SimListEvent::Added(obj));
        Ok(())
    }

    pub fn remove(&mut self, obj: &SimObject) -> Result<()> {
        let idx = self
            .find(obj)
            .ok_or_else(|| Error::UnknownEntity(obj.name().to_string()))?;
        let removed = self.objects.remove(idx);
        self.notify(&SimListEvent::Removed(removed));
        Ok(())
    }

    /// Remove everything, last-added first, notifying for each entity.
    pub fn clear(&mut self) {
        while let Some(obj) = self.objects.pop() {
            self.notify(&SimListEvent::Removed(obj));
        }
    }

    /// Position of `obj` in registration order.
    pub fn find(&self, obj: &SimObject) -> Option<usize> {
        self.objects.iter().position(|o| o == obj)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&SimObject> {
        self.objects.iter().find(|o| o.name() == name)
    }

    pub fn contains(&self, obj: &SimObject) -> bool {
        self.find(obj).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimObject> {
        self.objects.iter()
    }

    pub fn add_observer<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&SimListEvent) + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    fn notify(&mut self, event: &SimListEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }
}
