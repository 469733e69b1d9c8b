//! One dashboard session: selection, fetchers, map renderer and analysis
//! panels wired together.
//!
//! Every fetch runs as its own tokio task tagged with the selection's data
//! generation and reports back over a channel. A new selection aborts the
//! tasks of the previous one, and anything that still arrives for an older
//! generation is dropped before it can touch the map or the panels.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use analysis::{
    run_panel, AnalysisPanels, Conversation, Origin, PanelData, PanelError, PanelJob, PanelKind,
    Produced,
};
use foundation::geo::GeoPoint;
use foundation::ids::Generation;
use foundation::time::Millis;
use layers::canvas::DisplayList;
use layers::info_card::InfoCard;
use layers::{EngineFactory, MapRenderer, RenderInputs, RendererStatus, ViewMode};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use runtime::event_bus::{Event, EventBus};
use selection::{
    LayerKey, Selection, SelectionChange, SelectionError, SelectionListener, SelectionStore, Tab,
};
use serde::Serialize;
use sources::{CoordinateSeries, DataClient, MigrationFetch, SpeciesResolution, TextRelay};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long [`Session::settle`] waits for a delivery before checking for
/// tasks that ended without reporting.
const SETTLE_POLL: Duration = Duration::from_millis(25);

#[derive(Debug)]
enum Payload {
    Migration(MigrationFetch),
    Shipping(CoordinateSeries),
    Panel(PanelJob, Produced<PanelData>),
}

impl Payload {
    fn label(&self) -> String {
        match self {
            Payload::Migration(fetch) => format!("migration {}", fetch.species),
            Payload::Shipping(_) => "shipping".to_string(),
            Payload::Panel(job, _) => format!("panel {}", job.kind),
        }
    }
}

#[derive(Debug)]
struct Delivery {
    ticket: u64,
    generation: Generation,
    payload: Payload,
}

#[derive(Debug, Clone)]
enum TaskKind {
    Migration,
    Shipping,
    Panel(PanelJob),
}

struct InFlight {
    ticket: u64,
    generation: Generation,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub selection: Selection,
    pub tab: Tab,
    pub data_generation: u64,
    pub resolution: Option<SpeciesResolution>,
    pub migration: CoordinateSeries,
    pub shipping: CoordinateSeries,
    pub renderer: RendererStatus,
    pub panels: AnalysisPanels,
    pub in_flight: usize,
}

pub struct Session {
    client: DataClient,
    relay: Arc<dyn TextRelay>,
    store: SelectionStore,
    renderer: MapRenderer,
    panels: AnalysisPanels,
    conversation: Conversation,
    events: EventBus,
    inputs: RenderInputs,
    resolution: Option<SpeciesResolution>,
    tx: mpsc::UnboundedSender<Delivery>,
    rx: mpsc::UnboundedReceiver<Delivery>,
    in_flight: Vec<InFlight>,
    next_ticket: u64,
    clock: tokio::time::Instant,
    rng: StdRng,
}

impl Session {
    pub fn new(
        client: DataClient,
        relay: Arc<dyn TextRelay>,
        factory: Box<dyn EngineFactory>,
        mode: ViewMode,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            relay,
            store: SelectionStore::default(),
            renderer: MapRenderer::new(factory, mode, Millis(0)),
            panels: AnalysisPanels::new(),
            conversation: Conversation::new(),
            events: EventBus::new(),
            inputs: RenderInputs::default(),
            resolution: None,
            tx,
            rx,
            in_flight: Vec::new(),
            next_ticket: 0,
            clock: tokio::time::Instant::now(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixes the seeds behind randomized panel defaults.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn selection(&self) -> &Selection {
        self.store.current()
    }

    pub fn data_generation(&self) -> Generation {
        self.store.data_generation()
    }

    pub fn inputs(&self) -> &RenderInputs {
        &self.inputs
    }

    pub fn resolution(&self) -> Option<&SpeciesResolution> {
        self.resolution.as_ref()
    }

    pub fn panels(&self) -> &AnalysisPanels {
        &self.panels
    }

    pub fn renderer(&self) -> &MapRenderer {
        &self.renderer
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn event_count(&self, kind: &str) -> usize {
        self.events.count(kind)
    }

    pub fn trace(&self) -> &EventBus {
        &self.events
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn subscribe(&mut self, listener: SelectionListener) {
        self.store.subscribe(listener);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            selection: self.store.current().clone(),
            tab: self.store.tab(),
            data_generation: self.store.data_generation().get(),
            resolution: self.resolution.clone(),
            migration: self.inputs.migration.clone(),
            shipping: self.inputs.shipping.clone(),
            renderer: self.renderer.status(),
            panels: self.panels.clone(),
            in_flight: self.in_flight.len(),
        }
    }

    pub fn select_species(
        &mut self,
        id: &str,
        name: &str,
    ) -> Result<SelectionChange, SelectionError> {
        let change = self.store.select_species(id, name)?;
        Ok(self.after_change(change))
    }

    pub fn select_year(&mut self, year: &str) -> SelectionChange {
        let change = self.store.select_year(year);
        self.after_change(change)
    }

    pub fn select_month(&mut self, month: &str) -> Result<SelectionChange, SelectionError> {
        let change = self.store.select_month(month)?;
        Ok(self.after_change(change))
    }

    pub fn toggle_layer(&mut self, key: LayerKey) -> SelectionChange {
        let change = self.store.toggle_layer(key);
        self.after_change(change)
    }

    pub fn select_tab(&mut self, tab: Tab) -> SelectionChange {
        let change = self.store.select_tab(tab);
        self.after_change(change)
    }

    fn after_change(&mut self, change: SelectionChange) -> SelectionChange {
        if change.requires_refetch() {
            self.refresh();
        } else if change.changed {
            self.resync();
        }
        change
    }

    /// Re-issues every fetch for the current selection, aborting whatever is
    /// still running for an earlier one.
    pub fn refresh(&mut self) -> Generation {
        self.abort_in_flight();
        let generation = self.store.data_generation();
        let key = self.store.current().data_key();
        info!(%generation, species = %key.species_name, year = ?key.year, month = ?key.month, "refreshing");
        self.events.emit(generation, "refresh", key.species_name.clone());

        let client = self.client.clone();
        let (name, year, month) = (key.species_name.clone(), key.year.clone(), key.month.clone());
        self.spawn(generation, TaskKind::Migration, async move {
            Payload::Migration(
                client
                    .migration(&name, year.as_deref(), month.as_deref())
                    .await,
            )
        });

        let client = self.client.clone();
        let (year, month) = (key.year.clone(), key.month.clone());
        self.spawn(generation, TaskKind::Shipping, async move {
            Payload::Shipping(client.shipping(year.as_deref(), month.as_deref()).await)
        });

        for job in self.panels.begin(key) {
            self.spawn_panel(generation, job);
        }
        generation
    }

    /// Reloads one analysis panel. `false` when nothing was started.
    pub fn retry_panel(&mut self, kind: PanelKind) -> bool {
        match self.panels.retry(kind) {
            Some(job) => {
                let generation = self.store.data_generation();
                self.events.emit(generation, "panel.retry", kind.title());
                self.spawn_panel(generation, job);
                true
            }
            None => false,
        }
    }

    fn spawn_panel(&mut self, generation: Generation, job: PanelJob) {
        let relay = Arc::clone(&self.relay);
        let seed = self.rng.next_u64();
        let task_job = job.clone();
        self.spawn(generation, TaskKind::Panel(job), async move {
            let mut rng = StdRng::seed_from_u64(seed);
            let produced = run_panel(task_job.kind, relay.as_ref(), &task_job.key, &mut rng).await;
            Payload::Panel(task_job, produced)
        });
    }

    fn spawn<F>(&mut self, generation: Generation, kind: TaskKind, work: F)
    where
        F: Future<Output = Payload> + Send + 'static,
    {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let payload = work.await;
            let _ = tx.send(Delivery {
                ticket,
                generation,
                payload,
            });
        });
        self.in_flight.push(InFlight {
            ticket,
            generation,
            kind,
            handle,
        });
    }

    fn abort_in_flight(&mut self) {
        for task in self.in_flight.drain(..) {
            task.handle.abort();
            debug!(ticket = task.ticket, generation = %task.generation, "task aborted");
            self.events
                .emit(task.generation, "task.aborted", task_label(&task.kind));
        }
    }

    /// Applies every delivery already waiting. Returns how many were accepted.
    pub fn pump(&mut self) -> usize {
        let mut accepted = 0;
        while let Ok(delivery) = self.rx.try_recv() {
            if self.apply(delivery) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Waits until every task of the current selection has reported.
    pub async fn settle(&mut self) {
        while !self.in_flight.is_empty() {
            if let Ok(Some(delivery)) = tokio::time::timeout(SETTLE_POLL, self.rx.recv()).await {
                self.apply(delivery);
            }
            self.reap();
        }
        self.pump();
        let now = self.now();
        self.renderer.poll(now);
    }

    fn apply(&mut self, delivery: Delivery) -> bool {
        let Delivery {
            ticket,
            generation,
            payload,
        } = delivery;
        self.in_flight.retain(|task| task.ticket != ticket);

        let current = self.store.data_generation();
        if generation != current {
            debug!(%generation, %current, "discarding stale delivery");
            self.events
                .emit(generation, "delivery.discarded", payload.label());
            return false;
        }

        match payload {
            Payload::Migration(fetch) => {
                if let SpeciesResolution::Substituted { requested } = &fetch.resolution {
                    warn!(requested = %requested, substitute = fetch.species, "species substituted");
                    self.events.emit(
                        generation,
                        "species.substituted",
                        format!("{requested} -> {}", fetch.species),
                    );
                }
                self.events.emit(
                    generation,
                    "migration.delivered",
                    format!("{} points", fetch.series.len()),
                );
                self.resolution = Some(fetch.resolution);
                self.inputs.migration = fetch.series;
                self.resync();
                true
            }
            Payload::Shipping(series) => {
                self.events.emit(
                    generation,
                    "shipping.delivered",
                    format!("{} points", series.len()),
                );
                self.inputs.shipping = series;
                self.resync();
                true
            }
            Payload::Panel(job, produced) => {
                let accepted = self.panels.deliver(&job, Ok(produced));
                let kind = if accepted {
                    "panel.delivered"
                } else {
                    "delivery.discarded"
                };
                self.events.emit(generation, kind, job.kind.title());
                accepted
            }
        }
    }

    /// Settles tasks that finished without sending anything (they panicked).
    fn reap(&mut self) {
        let finished: Vec<u64> = self
            .in_flight
            .iter()
            .filter(|task| task.handle.is_finished())
            .map(|task| task.ticket)
            .collect();
        if finished.is_empty() {
            return;
        }
        self.pump();
        let (dead, alive): (Vec<InFlight>, Vec<InFlight>) = std::mem::take(&mut self.in_flight)
            .into_iter()
            .partition(|task| finished.contains(&task.ticket));
        self.in_flight = alive;

        for task in dead {
            warn!(ticket = task.ticket, task = %task_label(&task.kind), "task ended without a result");
            self.events
                .emit(task.generation, "task.lost", task_label(&task.kind));
            match task.kind {
                TaskKind::Migration => {
                    self.inputs.migration = CoordinateSeries::no_data();
                    self.resync();
                }
                TaskKind::Shipping => {
                    self.inputs.shipping = CoordinateSeries::no_data();
                    self.resync();
                }
                TaskKind::Panel(job) => {
                    let error = PanelError::new(job.kind, "analysis task stopped before reporting");
                    self.panels.deliver(&job, Err(error));
                }
            }
        }
    }

    fn resync(&mut self) {
        if let Err(e) = self
            .renderer
            .sync(self.store.current(), self.inputs.clone())
        {
            warn!(error = %e, "map sync failed");
        }
    }

    /// Milliseconds since the session started, on the tokio clock.
    pub fn now(&self) -> Millis {
        Millis(self.clock.elapsed().as_millis() as u64)
    }

    pub fn poll(&mut self) -> RendererStatus {
        let now = self.now();
        self.renderer.poll(now)
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        let now = self.now();
        self.renderer.toggle_view_mode(now)
    }

    pub fn tick_frames(&mut self, frames: usize) -> usize {
        (0..frames)
            .take_while(|_| self.renderer.tick_frame().is_some())
            .count()
    }

    pub fn click(&mut self, at: GeoPoint) -> Option<InfoCard> {
        self.renderer.click(at).cloned()
    }

    pub fn display_list(&self) -> Option<DisplayList> {
        self.renderer.display_list()
    }

    /// Sends a chat message to the assistant and waits for its reply.
    pub async fn ask(&mut self, input: &str) -> Option<Origin> {
        let mut rng = StdRng::seed_from_u64(self.rng.next_u64());
        self.conversation
            .send(self.relay.as_ref(), input, &mut rng)
            .await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for task in &self.in_flight {
            task.handle.abort();
        }
    }
}

fn task_label(kind: &TaskKind) -> String {
    match kind {
        TaskKind::Migration => "migration".to_string(),
        TaskKind::Shipping => "shipping".to_string(),
        TaskKind::Panel(job) => format!("panel {}", job.kind),
    }
}
