//! Pass orchestration.
//!
//! A pass compiles one graph into source text for one backend: validate
//! the pipeline-output anchor, start generation at the input source (the
//! recursive pull triggers the whole reachable subgraph), generate the
//! queued ending nodes, resolve all placeholders, and render once. Both
//! error kinds unwind the pass immediately with no partial output.

use crate::codegen::context::{CodeGen, Stage};
use crate::codegen::error::GenError;
use crate::codegen::languages::Language;
use crate::graph::graph::Graph;
use crate::nodes::pipeline_output;
use tracing::{debug, warn};

pub struct CodeGenManager;

impl CodeGenManager {
    /// Compile `graph` into source text. `previz` selects the instrumented
    /// pass variant that wires intermediate values to the live display.
    pub fn build(
        graph: &Graph,
        class_name: &str,
        language: &dyn Language,
        previz: bool,
    ) -> Result<String, GenError> {
        debug!(
            class_name,
            language = language.name(),
            previz,
            nodes = graph.node_count(),
            "starting generation pass"
        );

        let output = graph
            .pipeline_output()
            .ok_or(GenError::MissingPipelineOutput)?;
        let input = graph.input_source().ok_or(GenError::MissingInputSource)?;

        let output_input_attr = pipeline_output::input_attr(output);
        if graph.linked_output(output_input_attr).is_none() {
            return Err(GenError::attribute(
                output_input_attr,
                "the pipeline output must have an attached attribute",
            ));
        }

        let mut cg = CodeGen::new(class_name, language, previz);

        let result = Self::run_pass(graph, &mut cg, input);
        if let Err(err) = result {
            cg.stage = Stage::EndedError;
            warn!(%err, "generation pass failed");
            return Err(err);
        }

        let unit = cg.finish()?;
        let text = language.render_unit(&unit)?;
        debug!(bytes = text.len(), "generation pass finished");

        Ok(format!("{}\n", text.trim_end()))
    }

    fn run_pass(graph: &Graph, cg: &mut CodeGen, input: crate::graph::id::NodeId) -> Result<(), GenError> {
        cg.stage = Stage::InitialGen;
        cg.gen_code_if_necessary(graph, input)?;

        cg.stage = Stage::EndGen;
        while let Some(node) = cg.take_ending_node() {
            cg.gen_code_if_necessary(graph, node)?;
        }

        cg.stage = Stage::EndedSuccess;
        Ok(())
    }
}
