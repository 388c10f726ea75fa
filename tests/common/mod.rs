#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Semaphore, broadcast, mpsc};

use stagevisor::{Event, EventKind, Link, LinkError, Stage, Subscribe, Task};

/// Link that records every transfer and returns at once.
#[derive(Default)]
pub struct RecordingLink {
    seen: Mutex<Vec<(Stage, String)>>,
}

impl RecordingLink {
    pub fn transfers(&self) -> Vec<(Stage, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Link for RecordingLink {
    async fn transfer(&self, stage: Stage, task: &Task) -> Result<(), LinkError> {
        self.seen.lock().unwrap().push((stage, task.id().to_string()));
        Ok(())
    }

    async fn mount(&self, _stage: Stage, _task: &Task) -> Result<(), LinkError> {
        Ok(())
    }
}

/// Link whose transfers block until the test hands out a permit.
///
/// Every transfer reports its task id on `entered` before blocking.
pub struct GateLink {
    gate: Semaphore,
    entered: mpsc::UnboundedSender<String>,
}

impl GateLink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let link = Arc::new(Self {
            gate: Semaphore::new(0),
            entered: tx,
        });
        (link, rx)
    }

    /// Lets `n` blocked or future transfers through.
    pub fn open(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl Link for GateLink {
    async fn transfer(&self, _stage: Stage, task: &Task) -> Result<(), LinkError> {
        let _ = self.entered.send(task.id().to_string());
        let permit = self.gate.acquire().await.expect("gate never closed");
        permit.forget();
        Ok(())
    }

    async fn mount(&self, _stage: Stage, _task: &Task) -> Result<(), LinkError> {
        Ok(())
    }
}

/// Everything currently buffered in `rx`.
pub fn buffered(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

/// Task ids of buffered events of `kind`.
pub fn ids_of(events: &[Event], kind: EventKind) -> Vec<String> {
    events
        .iter()
        .filter(|e| e.kind == kind)
        .filter_map(|e| e.task.as_deref().map(str::to_string))
        .collect()
}

/// Waits for the next event of `kind`.
pub async fn next_of(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
    loop {
        let ev = rx.recv().await.expect("bus open");
        if ev.kind == kind {
            return ev;
        }
    }
}

/// Subscriber that keeps every event it is handed.
#[derive(Default)]
pub struct Collect {
    seen: Mutex<Vec<Event>>,
}

impl Collect {
    pub fn kinds(&self) -> Vec<EventKind> {
        self.seen.lock().unwrap().iter().map(|e| e.kind).collect()
    }
}

#[async_trait]
impl Subscribe for Collect {
    async fn on_event(&self, event: &Event) {
        self.seen.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "collect"
    }
}
