use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    config::Config,
    core::{
        actor::StageWorker, pipeline::Pipeline, registry::StageRegistry, router::Router,
        withdraw::WithdrawSignal,
    },
    events::Bus,
    routing::{LinkRef, RouteTable, SimulatedLink},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Pipeline`].
///
/// Defaults: no subscribers, [`SimulatedLink`], [`RouteTable::standard`].
pub struct PipelineBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    link: LinkRef,
    routes: RouteTable,
}

impl PipelineBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            link: Arc::new(SimulatedLink),
            routes: RouteTable::standard(),
        }
    }

    /// Sets event subscribers (logging, metrics, ...).
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the transport used to forward packets.
    pub fn with_link(mut self, link: LinkRef) -> Self {
        self.link = link;
        self
    }

    /// Replaces the fan-out topology.
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Builds the pipeline and spawns one worker per stage.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Arc<Pipeline> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let registry = Arc::new(StageRegistry::new());
        let withdraw = WithdrawSignal::new();
        let runtime_token = CancellationToken::new();

        debug!(
            link = self.link.name(),
            routes = self.routes.len(),
            "building pipeline"
        );
        let router = Arc::new(Router::new(
            registry.clone(),
            self.routes,
            self.link,
            bus.clone(),
        ));

        let mut workers = JoinSet::new();
        for queue in registry.iter() {
            let worker = StageWorker::new(
                queue.clone(),
                router.clone(),
                withdraw.subscribe(),
                bus.clone(),
                self.cfg.withdraw_idle_clamped(),
            );
            workers.spawn(worker.run(runtime_token.child_token()));
        }

        Arc::new(Pipeline::new_internal(
            self.cfg,
            bus,
            subs,
            registry,
            withdraw,
            workers,
            runtime_token,
        ))
    }
}
