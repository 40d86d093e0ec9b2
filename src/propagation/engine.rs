//! Breadth-first propagation.
//!
//! One top-level call is one *generation*. Nodes that fired in the
//! previous generation settle and the reported source fires at level 0;
//! each later level collects everything the previous level touched (any
//! node state change, changed counters, explicit activations), orders the
//! candidates by registration and evaluates them against the live state.
//!
//! Within a generation a node fires at most once, arms at most once and
//! disarms at most once. Every level after the first needs at least one
//! change in the level before it, so a pass always ends whatever the
//! shape of the graph.

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashSet;

use crate::conditions::{ConditionEvaluator, Readiness, Snapshot};
use crate::core::{ActivationState, Counters, LinkConfig, NodeId};
use crate::effects::ActionDispatcher;
use crate::registry::Registry;

use super::result::{Cause, PropagationResult};

/// What a queued task re-evaluates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskSource {
    /// A node changed state (any transition); its dependents are re-evaluated.
    Node(NodeId),
    /// A counter changed; nodes reading it are re-evaluated.
    Counter(String),
    /// An effect asked `target` to fire, bypassing its conditions.
    Activation { target: NodeId, requested_by: NodeId },
}

/// A queued unit of work. Consumed once its level is evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropagationTask {
    pub source: TaskSource,
    /// Level the change happened on.
    pub depth: usize,
}

impl PropagationTask {
    pub fn new(source: TaskSource, depth: usize) -> Self {
        Self { source, depth }
    }

    /// Candidates this task contributes: `(node, cause, forced)`.
    fn candidates(&self, registry: &Registry) -> Vec<(NodeId, Cause, bool)> {
        match &self.source {
            TaskSource::Node(node) => registry
                .dependents_of(*node)
                .iter()
                .map(|&d| (d, Cause::Dependency(*node), false))
                .collect(),
            TaskSource::Counter(key) => registry
                .counter_dependents(key)
                .iter()
                .map(|&d| (d, Cause::Counter(key.clone()), false))
                .collect(),
            TaskSource::Activation { target, requested_by } => {
                vec![(*target, Cause::Effect(*requested_by), true)]
            }
        }
    }
}

/// Where a pass starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    /// A collaborator reports that a node changed; the node fires.
    Node { id: NodeId, cause: Cause },
    /// A collaborator sets a counter.
    Counter { key: String, value: i64 },
}

/// Mutable state a pass works on.
pub struct PassContext<'a> {
    pub registry: &'a mut Registry,
    pub counters: &'a mut Counters,
    pub dispatcher: &'a mut ActionDispatcher,
}

#[derive(Debug)]
struct Candidate {
    id: NodeId,
    cause: Cause,
    forced: bool,
}

/// Propagation engine.
///
/// Holds the configuration and the generation counter; everything else
/// is borrowed per pass.
#[derive(Clone, Debug, Default)]
pub struct PropagationEngine {
    config: LinkConfig,
    generation: u64,
}

impl PropagationEngine {
    /// Create an engine.
    pub fn new(config: LinkConfig) -> Self {
        Self { config, generation: 0 }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Generation of the most recent pass (0 before the first).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Continue counting from a restored generation.
    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Run one complete pass.
    pub fn run(&mut self, ctx: PassContext<'_>, origin: Origin) -> PropagationResult {
        self.generation += 1;
        let generation = self.generation;

        let settled = if self.config.settle_between_generations {
            ctx.dispatcher.settle(ctx.registry)
        } else {
            Vec::new()
        };
        if !settled.is_empty() {
            tracing::debug!(generation, settled = settled.len(), "settled previous generation");
        }

        let mut pass = Pass {
            registry: ctx.registry,
            counters: ctx.counters,
            dispatcher: ctx.dispatcher,
            config: &self.config,
            generation,
            visited: FxHashSet::default(),
            shifted: FxHashSet::default(),
            queue: VecDeque::new(),
            result: PropagationResult::new(generation),
        };

        // Settled nodes come first in the result; their dependents are
        // evaluated on level 1 with the source's.
        for change in settled {
            pass.queue
                .push_back(PropagationTask::new(TaskSource::Node(change.node), 0));
            pass.result.push(change);
        }

        match origin {
            Origin::Node { id, cause } => {
                if !pass.fire(id, cause, 0) {
                    tracing::debug!(node = %id, generation, "reported node did not fire");
                }
            }
            Origin::Counter { key, value } => {
                if ActionDispatcher::write_counter(pass.counters, &key, value) {
                    pass.queue.push_back(PropagationTask::new(TaskSource::Counter(key), 0));
                }
            }
        }

        pass.drain();

        let result = pass.result;
        tracing::debug!(
            generation,
            changes = result.len(),
            evaluations = result.evaluations,
            truncated = result.truncated,
            "propagation complete"
        );
        result
    }
}

/// State of one pass in progress.
struct Pass<'a> {
    registry: &'a mut Registry,
    counters: &'a mut Counters,
    dispatcher: &'a mut ActionDispatcher,
    config: &'a LinkConfig,
    generation: u64,
    visited: FxHashSet<(NodeId, u64)>,
    /// Arm and disarm transitions already made this pass.
    shifted: FxHashSet<(NodeId, ActivationState)>,
    queue: VecDeque<PropagationTask>,
    result: PropagationResult,
}

impl Pass<'_> {
    /// Process levels until nothing is queued.
    fn drain(&mut self) {
        // Every task in the queue belongs to the same level: a level's
        // tasks are all taken before any of its candidates fire.
        while let Some(depth) = self.queue.front().map(|t| t.depth) {
            let tasks: Vec<PropagationTask> = self.queue.drain(..).collect();
            let level = depth + 1;

            let candidates = self.collect(&tasks);
            if candidates.is_empty() {
                continue;
            }

            if self.config.max_depth.is_some_and(|max| level > max) {
                tracing::warn!(
                    generation = self.generation,
                    level,
                    pending = candidates.len(),
                    "propagation depth limit reached"
                );
                self.result.truncated = true;
                break;
            }

            for candidate in candidates.into_values() {
                self.evaluate(candidate, level);
            }
        }
    }

    /// Merge the candidates of a level, keyed by registration order.
    fn collect(&self, tasks: &[PropagationTask]) -> BTreeMap<u64, Candidate> {
        let mut candidates: BTreeMap<u64, Candidate> = BTreeMap::new();

        for task in tasks {
            for (id, cause, forced) in task.candidates(&*self.registry) {
                // Stale references from unregistered nodes drop out here.
                let Some(seq) = self.registry.registration_order(id) else {
                    continue;
                };
                candidates
                    .entry(seq)
                    .and_modify(|c| c.forced |= forced)
                    .or_insert(Candidate { id, cause, forced });
            }
        }

        candidates
    }

    fn evaluate(&mut self, candidate: Candidate, level: usize) {
        let Candidate { id, cause, forced } = candidate;

        if self.visited.contains(&(id, self.generation)) {
            return;
        }

        let readiness = {
            let Ok(node) = self.registry.get(id) else {
                return;
            };
            if !node.can_fire() {
                return;
            }

            if forced {
                Readiness::Ready
            } else {
                let snapshot = Snapshot::new(&*self.registry, &*self.counters);
                if self.config.arm_on_partial {
                    ConditionEvaluator::readiness(&node.conditions, &snapshot)
                } else if ConditionEvaluator::all_hold(&node.conditions, &snapshot) {
                    Readiness::Ready
                } else {
                    Readiness::Unmet
                }
            }
        };

        self.result.evaluations += 1;
        tracing::trace!(node = %id, level, ?readiness, "evaluated");

        match readiness {
            Readiness::Ready => {
                self.fire(id, cause, level);
            }
            Readiness::Partial { .. } => self.shift(id, ActivationState::Armed, cause, level),
            Readiness::Unmet => self.shift(id, ActivationState::Dormant, cause, level),
        }
    }

    /// Arm or disarm a node and queue its dependents.
    ///
    /// Each direction is taken at most once per node per pass, so nodes
    /// whose conditions read each other's `Armed` state cannot flip forever.
    fn shift(&mut self, id: NodeId, to: ActivationState, cause: Cause, depth: usize) {
        if self.shifted.contains(&(id, to)) {
            return;
        }

        let change = match to {
            ActivationState::Armed => self.dispatcher.arm(self.registry, id, cause),
            _ => self.dispatcher.disarm(self.registry, id, cause),
        };
        let Some(change) = change else {
            return;
        };

        self.shifted.insert((id, to));
        self.queue
            .push_back(PropagationTask::new(TaskSource::Node(id), depth));
        self.result.push(change);
    }

    /// Fire a node and queue everything it touched. Returns `true` if it fired.
    fn fire(&mut self, id: NodeId, cause: Cause, depth: usize) -> bool {
        if self.visited.contains(&(id, self.generation)) {
            return false;
        }

        let Some(outcome) =
            self.dispatcher
                .fire(self.registry, self.counters, id, self.generation, cause)
        else {
            return false;
        };
        self.visited.insert((id, self.generation));

        for change in &outcome.changes {
            self.queue
                .push_back(PropagationTask::new(TaskSource::Node(change.node), depth));
        }
        for key in outcome.changed_counters {
            self.queue
                .push_back(PropagationTask::new(TaskSource::Counter(key), depth));
        }
        for target in outcome.activations {
            self.queue.push_back(PropagationTask::new(
                TaskSource::Activation { target, requested_by: id },
                depth,
            ));
        }

        self.result.changes.extend(outcome.changes);
        true
    }
}
