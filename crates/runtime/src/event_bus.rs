use foundation::ids::Generation;

/// One entry in a session trace: what happened, under which selection
/// generation.
///
/// `kind` is a dotted tag such as `"delivery.discarded"`; `message` is free
/// text for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub generation: Generation,
    pub kind: &'static str,
    pub message: String,
}

/// Append-only trace of session events.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, generation: Generation, kind: &'static str, message: impl Into<String>) {
        self.events.push(Event {
            generation,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Events recorded under `generation`, oldest first.
    pub fn for_generation(&self, generation: Generation) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().filter(move |e| e.generation == generation)
    }

    /// Most recent event of `kind`.
    pub fn last(&self, kind: &str) -> Option<&Event> {
        self.events.iter().rev().find(|e| e.kind == kind)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
