//! Benchmarks for full generation passes
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use visionforge_rs::codegen::{CodeGenManager, ColorSpace, JavaLanguage, PythonLanguage};
use visionforge_rs::graph::Graph;
use visionforge_rs::nodes::{
    self, CannyEdgeNode, CvtColorNode, FilterContoursByAreaNode, FindContoursNode,
    InputSourceNode, PipelineOutputNode, ThresholdNode, VisionNode,
};

fn bench_graph() -> Graph {
    let mut graph = Graph::new();
    let input = graph.add_node(VisionNode::InputSource(InputSourceNode::default()));
    let output = graph.add_node(VisionNode::PipelineOutput(PipelineOutputNode::default()));
    let cvt = graph.add_node(VisionNode::CvtColor(CvtColorNode {
        target: ColorSpace::Gray,
    }));
    let canny = graph.add_node(VisionNode::CannyEdge(CannyEdgeNode::default()));
    let threshold = graph.add_node(VisionNode::Threshold(ThresholdNode::default()));
    let find = graph.add_node(VisionNode::FindContours(FindContoursNode::default()));
    let filter = graph.add_node(VisionNode::FilterContoursByArea(
        FilterContoursByAreaNode::default(),
    ));

    graph
        .connect(
            nodes::input_source::output_attr(input),
            nodes::cvt_color::input_attr(cvt),
        )
        .unwrap();
    graph
        .connect(
            nodes::cvt_color::output_attr(cvt),
            nodes::canny_edge::input_attr(canny),
        )
        .unwrap();
    graph
        .connect(
            nodes::input_source::output_attr(input),
            nodes::threshold::input_attr(threshold),
        )
        .unwrap();
    graph
        .connect(
            nodes::threshold::output_attr(threshold),
            nodes::find_contours::input_attr(find),
        )
        .unwrap();
    graph
        .connect(
            nodes::find_contours::output_attr(find),
            nodes::filter_contours::input_attr(filter),
        )
        .unwrap();
    graph
        .connect(
            nodes::canny_edge::output_attr(canny),
            nodes::pipeline_output::input_attr(output),
        )
        .unwrap();

    graph
}

fn bench_generation_pass(c: &mut Criterion) {
    let graph = bench_graph();

    c.bench_function("generation_pass_java", |b| {
        b.iter(|| {
            CodeGenManager::build(black_box(&graph), "BenchPipeline", &JavaLanguage, false)
                .unwrap()
        })
    });

    c.bench_function("generation_pass_python", |b| {
        b.iter(|| {
            CodeGenManager::build(black_box(&graph), "BenchPipeline", &PythonLanguage, false)
                .unwrap()
        })
    });

    c.bench_function("generation_pass_previz", |b| {
        b.iter(|| {
            CodeGenManager::build(black_box(&graph), "BenchPipeline", &JavaLanguage, true)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_generation_pass);
criterion_main!(benches);
