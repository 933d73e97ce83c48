use crate::core::engine::{Engine, FetchCommand, Loaded, MapEvent, UserEvent};
use crate::core::loader::CascadingLoader;
use crate::domain::ports::{Backend, DetailPanel, MapSurface};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{Id, JoinError, JoinSet};

/// Runs the engine's fetches concurrently and feeds results back in
/// completion order.
pub struct Navigator<B: Backend + 'static, M: MapSurface, P: DetailPanel> {
    engine: Engine<M, P>,
    loader: Arc<CascadingLoader<B>>,
    tasks: JoinSet<Loaded>,
    /// Tasks that hold the shared loading flag; submits do not.
    loading: HashSet<Id>,
}

impl<B: Backend + 'static, M: MapSurface, P: DetailPanel> Navigator<B, M, P> {
    pub fn new(engine: Engine<M, P>, loader: CascadingLoader<B>) -> Self {
        Self {
            engine,
            loader: Arc::new(loader),
            tasks: JoinSet::new(),
            loading: HashSet::new(),
        }
    }

    pub fn start(&mut self) {
        tracing::info!("🚀 Starting navigator");
        let commands = self.engine.start();
        self.spawn_all(commands);
    }

    pub fn dispatch(&mut self, event: UserEvent) {
        let commands = self.engine.handle(event);
        self.spawn_all(commands);
    }

    pub fn on_map_event(&mut self, event: MapEvent) {
        let commands = self.engine.on_map_event(event);
        self.spawn_all(commands);
    }

    fn spawn_all(&mut self, commands: Vec<FetchCommand>) {
        for command in commands {
            self.spawn(command);
        }
    }

    fn spawn(&mut self, command: FetchCommand) {
        let loader = Arc::clone(&self.loader);
        tracing::debug!("Spawning {:?}", command);
        match command {
            FetchCommand::Regions => {
                let handle = self
                    .tasks
                    .spawn(async move { Loaded::Regions(loader.load_regions().await) });
                self.loading.insert(handle.id());
            }
            FetchCommand::Districts { ctx, region } => {
                let handle = self.tasks.spawn(async move {
                    let result = loader.load_districts(region).await;
                    Loaded::Districts { ctx, region, result }
                });
                self.loading.insert(handle.id());
            }
            FetchCommand::Neighborhoods { ctx, district } => {
                let handle = self.tasks.spawn(async move {
                    let result = loader.load_neighborhood_batch(district).await;
                    Loaded::Neighborhoods { ctx, district, result }
                });
                self.loading.insert(handle.id());
            }
            FetchCommand::SubmitPrice { id, record } => {
                self.tasks.spawn(async move {
                    let result = loader.submit_price(id, &record).await;
                    Loaded::Submitted { id, result }
                });
            }
        }
    }

    fn complete(&mut self, joined: Result<(Id, Loaded), JoinError>) {
        match joined {
            Ok((id, loaded)) => {
                self.loading.remove(&id);
                self.engine.apply(loaded);
            }
            Err(e) => {
                tracing::error!("💥 Task {} failed: {}", e.id(), e);
                if self.loading.remove(&e.id()) {
                    self.engine.fetch_aborted();
                }
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Apply the next finished fetch. Returns false when nothing is pending.
    pub async fn next_completion(&mut self) -> bool {
        match self.tasks.join_next_with_id().await {
            Some(joined) => {
                self.complete(joined);
                true
            }
            None => false,
        }
    }

    /// Wait until every pending fetch has been applied.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    /// Interleave user events with fetch completions until the sender closes.
    pub async fn run(&mut self, mut events: mpsc::Receiver<UserEvent>) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => break,
                },
                Some(joined) = self.tasks.join_next_with_id(), if !self.tasks.is_empty() => {
                    self.complete(joined);
                }
            }
        }
        self.settle().await;
        tracing::info!("🏁 Event stream closed in state {}", self.engine.state());
    }

    pub fn engine(&self) -> &Engine<M, P> {
        &self.engine
    }
}
