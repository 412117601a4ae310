//! Workflow graph: stages, fixed edges and conditional edges
//!
//! A [`WorkflowGraph`] is a builder. Register a handler per [`Stage`], wire
//! edges, pick the entry stage, then [`compile`](WorkflowGraph::compile) it
//! into a [`CompiledWorkflow`] that can be invoked any number of times.
//!
//! Execution is strictly sequential: one stage runs to completion, then its
//! outgoing edge is resolved against the updated state.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::retry::RetryController;
use super::stage::{Route, Stage};
use super::state::{StageTransition, WorkflowState};
use crate::{Error, Result};

/// A processing step over the workflow state
#[async_trait]
pub trait StageHandler: Send + Sync {
    /// Run the stage, updating the state in place
    async fn run(&self, state: &mut WorkflowState) -> Result<()>;
}

/// Computes the destination of a conditional edge from the current state
pub trait Router: Send + Sync {
    /// Pick the next route; may update the state
    fn route(&self, state: &mut WorkflowState) -> Route;

    /// Every route this router can return
    fn targets(&self) -> Vec<Route>;
}

/// Outgoing edge of a stage
#[derive(Clone)]
pub enum Edge {
    /// Always go to the same place
    Fixed(Route),
    /// Destination decided at runtime
    Conditional(Arc<dyn Router>),
}

impl Edge {
    fn targets(&self) -> Vec<Route> {
        match self {
            Edge::Fixed(route) => vec![*route],
            Edge::Conditional(router) => router.targets(),
        }
    }

    fn resolve(&self, state: &mut WorkflowState) -> Route {
        match self {
            Edge::Fixed(route) => *route,
            Edge::Conditional(router) => router.route(state),
        }
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Fixed(route) => write!(f, "Fixed({})", route),
            Edge::Conditional(router) => {
                let targets: Vec<String> = router.targets().iter().map(|r| r.to_string()).collect();
                write!(f, "Conditional({})", targets.join(" | "))
            }
        }
    }
}

/// The handlers for the four standard stages
#[derive(Clone)]
pub struct StageHandlers {
    pub coder: Arc<dyn StageHandler>,
    pub test_generator: Arc<dyn StageHandler>,
    pub tester: Arc<dyn StageHandler>,
    pub doc: Arc<dyn StageHandler>,
}

/// Builder for a workflow graph
#[derive(Default)]
pub struct WorkflowGraph {
    nodes: HashMap<Stage, Arc<dyn StageHandler>>,
    edges: HashMap<Stage, Vec<Edge>>,
    entry: Option<Stage>,
}

impl WorkflowGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for a stage, replacing any previous one
    pub fn add_stage(&mut self, stage: Stage, handler: Arc<dyn StageHandler>) -> &mut Self {
        self.nodes.insert(stage, handler);
        self
    }

    /// Add a fixed edge between two stages
    pub fn add_edge(&mut self, from: Stage, to: Stage) -> &mut Self {
        self.edges
            .entry(from)
            .or_default()
            .push(Edge::Fixed(Route::To(to)));
        self
    }

    /// Make `from` a terminal stage
    pub fn add_end_edge(&mut self, from: Stage) -> &mut Self {
        self.edges.entry(from).or_default().push(Edge::Fixed(Route::End));
        self
    }

    /// Add a conditional edge whose destination is computed by `router`
    pub fn add_conditional_edge(&mut self, from: Stage, router: Arc<dyn Router>) -> &mut Self {
        self.edges
            .entry(from)
            .or_default()
            .push(Edge::Conditional(router));
        self
    }

    /// Set the stage the workflow starts in
    pub fn set_entry(&mut self, stage: Stage) -> &mut Self {
        self.entry = Some(stage);
        self
    }

    /// Wire the standard coder → test generator → tester loop
    ///
    /// Testing routes through `controller`, Documenting ends the run and
    /// Coding is the entry stage.
    pub fn standard(handlers: StageHandlers, controller: RetryController) -> Result<CompiledWorkflow> {
        let mut graph = Self::new();
        graph
            .add_stage(Stage::Coding, handlers.coder)
            .add_stage(Stage::TestGenerating, handlers.test_generator)
            .add_stage(Stage::Testing, handlers.tester)
            .add_stage(Stage::Documenting, handlers.doc)
            .set_entry(Stage::Coding)
            .add_edge(Stage::Coding, Stage::TestGenerating)
            .add_edge(Stage::TestGenerating, Stage::Testing)
            .add_conditional_edge(Stage::Testing, Arc::new(controller))
            .add_end_edge(Stage::Documenting);
        graph.compile()
    }

    /// Validate the wiring and produce an executable workflow
    pub fn compile(self) -> Result<CompiledWorkflow> {
        let entry = self
            .entry
            .ok_or_else(|| Error::Graph("No entry stage set".to_string()))?;

        if !self.nodes.contains_key(&entry) {
            return Err(Error::Graph(format!(
                "Entry stage {} has no registered handler",
                entry
            )));
        }

        let mut edges = HashMap::with_capacity(self.edges.len());
        for (from, mut outgoing) in self.edges {
            if !self.nodes.contains_key(&from) {
                return Err(Error::Graph(format!(
                    "Edge starts at unregistered stage {}",
                    from
                )));
            }
            if outgoing.len() > 1 {
                return Err(Error::Graph(format!(
                    "Stage {} has {} outgoing edges; expected exactly one",
                    from,
                    outgoing.len()
                )));
            }
            let Some(edge) = outgoing.pop() else {
                continue;
            };
            for target in edge.targets() {
                if let Route::To(stage) = target {
                    if !self.nodes.contains_key(&stage) {
                        return Err(Error::Graph(format!(
                            "Edge {} -> {} targets an unregistered stage",
                            from, stage
                        )));
                    }
                }
            }
            edges.insert(from, edge);
        }

        for stage in self.nodes.keys() {
            if !edges.contains_key(stage) {
                return Err(Error::Graph(format!(
                    "Stage {} has no outgoing edge",
                    stage
                )));
            }
        }

        Ok(CompiledWorkflow {
            nodes: self.nodes,
            edges,
            entry,
        })
    }
}

/// A validated, executable workflow graph
pub struct CompiledWorkflow {
    nodes: HashMap<Stage, Arc<dyn StageHandler>>,
    edges: HashMap<Stage, Edge>,
    entry: Stage,
}

impl fmt::Debug for CompiledWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledWorkflow")
            .field("entry", &self.entry)
            .field("edges", &self.edges)
            .finish()
    }
}

impl CompiledWorkflow {
    /// The stage every run starts in
    pub fn entry(&self) -> Stage {
        self.entry
    }

    /// Outgoing edges in nominal stage order, for display
    pub fn edges(&self) -> Vec<(Stage, &Edge)> {
        Stage::all()
            .iter()
            .filter_map(|stage| self.edges.get(stage).map(|edge| (*stage, edge)))
            .collect()
    }

    /// Run the workflow from the entry stage until a route ends it
    pub async fn invoke(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let mut current = self.entry;

        loop {
            let handler = self
                .nodes
                .get(&current)
                .ok_or_else(|| Error::Graph(format!("No handler for stage {}", current)))?;

            tracing::info!(stage = %current, retries = state.retries, "Entering stage");
            handler.run(&mut state).await?;

            let edge = self
                .edges
                .get(&current)
                .ok_or_else(|| Error::Graph(format!("No outgoing edge for stage {}", current)))?;
            let next = edge.resolve(&mut state);

            tracing::debug!(from = %current, to = %next, "Transition");
            state.history.push(StageTransition {
                from: current,
                to: next,
                retries: state.retries,
            });

            match next {
                Route::To(stage) => current = stage,
                Route::End => break,
            }
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts runs and optionally sets `tests_passed`
    struct Probe {
        runs: AtomicUsize,
        verdict: Option<Box<dyn Fn(usize) -> Option<bool> + Send + Sync>>,
        label: &'static str,
    }

    impl Probe {
        fn new(label: &'static str) -> Arc<Self> {
            Arc::new(Self {
                runs: AtomicUsize::new(0),
                verdict: None,
                label,
            })
        }

        fn tester(verdict: impl Fn(usize) -> Option<bool> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                runs: AtomicUsize::new(0),
                verdict: Some(Box::new(verdict)),
                label: "TesterAgent",
            })
        }

        fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StageHandler for Probe {
        async fn run(&self, state: &mut WorkflowState) -> Result<()> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(ref verdict) = self.verdict {
                state.tests_passed = verdict(run);
            }
            state.log(format!("{}: run {}", self.label, run));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl StageHandler for Failing {
        async fn run(&self, _state: &mut WorkflowState) -> Result<()> {
            Err(Error::Agent("backend unavailable".to_string()))
        }
    }

    fn handlers(tester: Arc<Probe>) -> (StageHandlers, Arc<Probe>, Arc<Probe>) {
        let coder = Probe::new("CoderAgent");
        let doc = Probe::new("DocAgent");
        let handlers = StageHandlers {
            coder: coder.clone(),
            test_generator: Probe::new("TestGeneratorAgent"),
            tester,
            doc: doc.clone(),
        };
        (handlers, coder, doc)
    }

    #[tokio::test]
    async fn test_first_pass_success() {
        let tester = Probe::tester(|_| Some(true));
        let (handlers, coder, doc) = handlers(tester.clone());
        let workflow = WorkflowGraph::standard(handlers, RetryController::default()).unwrap();

        let state = workflow.invoke(WorkflowState::new("p", "f")).await.unwrap();

        assert_eq!(
            state.visited(),
            vec![Stage::Coding, Stage::TestGenerating, Stage::Testing, Stage::Documenting]
        );
        assert_eq!(coder.runs(), 1);
        assert_eq!(doc.runs(), 1);
        assert_eq!(state.retries, 0);
        assert!(state.succeeded());
        assert_eq!(state.history.last().unwrap().to, Route::End);
    }

    #[tokio::test]
    async fn test_success_after_two_failures() {
        let tester = Probe::tester(|run| Some(run >= 3));
        let (handlers, coder, doc) = handlers(tester.clone());
        let workflow = WorkflowGraph::standard(handlers, RetryController::default()).unwrap();

        let state = workflow.invoke(WorkflowState::new("p", "f")).await.unwrap();

        assert_eq!(coder.runs(), 3);
        assert_eq!(tester.runs(), 3);
        assert_eq!(doc.runs(), 1);
        assert_eq!(state.retries, 2);
        assert!(!state.output.contains("Max retries"));
    }

    #[tokio::test]
    async fn test_retry_exhaustion_is_bounded() {
        let tester = Probe::tester(|_| Some(false));
        let (handlers, coder, doc) = handlers(tester.clone());
        let workflow = WorkflowGraph::standard(handlers, RetryController::new(5)).unwrap();

        let state = workflow.invoke(WorkflowState::new("p", "f")).await.unwrap();

        assert_eq!(coder.runs(), 6);
        assert_eq!(tester.runs(), 6);
        assert_eq!(doc.runs(), 0);
        assert_eq!(state.retries, 5);
        assert!(state.output.ends_with(" | Max retries (5) reached."));
        assert_eq!(
            state.history.last().unwrap(),
            &StageTransition {
                from: Stage::Testing,
                to: Route::End,
                retries: 5
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_results_exhaust_retries() {
        let tester = Probe::tester(|_| None);
        let (handlers, coder, _doc) = handlers(tester);
        let workflow = WorkflowGraph::standard(handlers, RetryController::new(1)).unwrap();

        let state = workflow.invoke(WorkflowState::new("p", "f")).await.unwrap();
        assert_eq!(coder.runs(), 2);
        assert!(state.output.contains("Max retries (1) reached."));
    }

    #[tokio::test]
    async fn test_compiled_workflow_is_reusable() {
        let tester = Probe::tester(|_| Some(true));
        let (handlers, coder, _doc) = handlers(tester);
        let workflow = WorkflowGraph::standard(handlers, RetryController::default()).unwrap();

        let first = workflow.invoke(WorkflowState::new("a", "f")).await.unwrap();
        let second = workflow.invoke(WorkflowState::new("b", "g")).await.unwrap();
        assert_eq!(first.history.len(), 4);
        assert_eq!(second.history.len(), 4);
        assert_eq!(second.problem, "b");
        assert_eq!(coder.runs(), 2);
    }

    #[tokio::test]
    async fn test_stage_error_propagates() {
        let mut graph = WorkflowGraph::new();
        graph
            .add_stage(Stage::Coding, Arc::new(Failing))
            .add_end_edge(Stage::Coding)
            .set_entry(Stage::Coding);
        let workflow = graph.compile().unwrap();

        let err = workflow.invoke(WorkflowState::new("p", "f")).await.unwrap_err();
        assert!(matches!(err, Error::Agent(_)));
    }

    #[test]
    fn test_compile_requires_entry() {
        let mut graph = WorkflowGraph::new();
        graph
            .add_stage(Stage::Coding, Probe::new("c"))
            .add_end_edge(Stage::Coding);
        assert!(matches!(graph.compile(), Err(Error::Graph(_))));
    }

    #[test]
    fn test_compile_rejects_unregistered_target() {
        let mut graph = WorkflowGraph::new();
        graph
            .add_stage(Stage::Coding, Probe::new("c"))
            .add_edge(Stage::Coding, Stage::TestGenerating)
            .set_entry(Stage::Coding);
        let err = graph.compile().unwrap_err();
        assert!(err.to_string().contains("unregistered"));
    }

    #[test]
    fn test_compile_rejects_dangling_stage() {
        let mut graph = WorkflowGraph::new();
        graph
            .add_stage(Stage::Coding, Probe::new("c"))
            .add_stage(Stage::Documenting, Probe::new("d"))
            .add_edge(Stage::Coding, Stage::Documenting)
            .set_entry(Stage::Coding);
        let err = graph.compile().unwrap_err();
        assert!(err.to_string().contains("no outgoing edge"));
    }

    #[test]
    fn test_compile_rejects_two_edges_from_one_stage() {
        let mut graph = WorkflowGraph::new();
        graph
            .add_stage(Stage::Coding, Probe::new("c"))
            .add_stage(Stage::Testing, Probe::new("t"))
            .add_edge(Stage::Coding, Stage::Testing)
            .add_end_edge(Stage::Coding)
            .add_end_edge(Stage::Testing)
            .set_entry(Stage::Coding);
        let err = graph.compile().unwrap_err();
        assert!(err.to_string().contains("expected exactly one"));
    }

    #[test]
    fn test_standard_edges() {
        let (handlers, _, _) = handlers(Probe::tester(|_| None));
        let workflow = WorkflowGraph::standard(handlers, RetryController::default()).unwrap();
        assert_eq!(workflow.entry(), Stage::Coding);

        let edges = workflow.edges();
        assert_eq!(edges.len(), 4);
        assert!(matches!(edges[0], (Stage::Coding, Edge::Fixed(Route::To(Stage::TestGenerating)))));
        assert!(matches!(edges[2], (Stage::Testing, Edge::Conditional(_))));
        assert!(matches!(edges[3], (Stage::Documenting, Edge::Fixed(Route::End))));
    }
}
