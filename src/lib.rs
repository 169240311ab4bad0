//! # VisionForge-RS: Node-graph vision pipeline compiler
//!
//! A dataflow graph of vision-processing nodes, connected by typed ports,
//! compiled into source text for one of several target languages (an
//! OpenCV-style pipeline). The graph layer enforces link invariants; the
//! codegen layer resolves values pull-based with per-pass memoization and
//! renders through a pluggable language backend.
//!
//! ## Architecture
//!
//! - **Graph**: arena-stored nodes, typed attributes, links with
//!   connection rules and a local recursion check
//! - **Codegen**: per-pass context, session cache, deferred-value
//!   placeholders, two-phase emission (IR first, text once)
//! - **Backends**: Java (`OpenCvPipeline` subclass) and Python
//!   (`runPipeline` function); new targets implement one trait
//! - **Registry**: startup-populated node-type table with a background
//!   scan and an explicit completion signal
//!
//! ## Example
//!
//! ```
//! use visionforge_rs::codegen::{CodeGenManager, JavaLanguage};
//! use visionforge_rs::graph::Graph;
//! use visionforge_rs::nodes::{self, InputSourceNode, PipelineOutputNode, VisionNode};
//!
//! let mut graph = Graph::new();
//! let input = graph.add_node(VisionNode::InputSource(InputSourceNode::default()));
//! let output = graph.add_node(VisionNode::PipelineOutput(PipelineOutputNode::default()));
//! graph
//!     .connect(
//!         nodes::input_source::output_attr(input),
//!         nodes::pipeline_output::input_attr(output),
//!     )
//!     .unwrap();
//!
//! let source = CodeGenManager::build(&graph, "MyPipeline", &JavaLanguage, false).unwrap();
//! assert!(source.contains("public Mat processFrame(Mat input)"));
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod graph;
pub mod nodes;

// Re-export commonly used types
pub use codegen::{CodeGenManager, GenError, JavaLanguage, Language, PythonLanguage};
pub use config::AppConfig;
pub use error::{ForgeError, Result};
pub use graph::{Graph, NodeRegistry, ProjectFile, RegistryLoader};
pub use nodes::VisionNode;
