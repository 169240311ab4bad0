//! Property tests: generation is a pure function of the graph.

mod common;

use common::GraphBuilder;
use proptest::prelude::*;
use visionforge_rs::codegen::{
    CodeGenManager, ColorSpace, JavaLanguage, PythonLanguage, Range, ScalarRange,
};
use visionforge_rs::nodes::{self, FilterContoursByAreaNode, FindContoursNode, ThresholdNode, VisionNode};

fn threshold_pipeline(range: ScalarRange, min_area: i32, max_area: i32) -> GraphBuilder {
    let mut b = GraphBuilder::new();
    let threshold = b.add(VisionNode::Threshold(ThresholdNode {
        color_space: ColorSpace::Hsv,
        range,
    }));
    let find = b.add(VisionNode::FindContours(FindContoursNode::default()));
    let filter = b.add(VisionNode::FilterContoursByArea(FilterContoursByAreaNode {
        min_area,
        max_area,
    }));

    b.connect(
        nodes::input_source::output_attr(b.input),
        nodes::threshold::input_attr(threshold),
    );
    b.connect(
        nodes::threshold::output_attr(threshold),
        nodes::find_contours::input_attr(find),
    );
    b.connect(
        nodes::find_contours::output_attr(find),
        nodes::filter_contours::input_attr(filter),
    );
    b.connect(
        nodes::threshold::output_attr(threshold),
        nodes::pipeline_output::input_attr(b.output),
    );
    b
}

fn range_strategy() -> impl Strategy<Value = ScalarRange> {
    let channel = (0.0f64..255.0, 0.0f64..255.0)
        .prop_map(|(a, b)| Range::new(a.min(b), a.max(b)));
    (channel.clone(), channel.clone(), channel.clone(), channel)
        .prop_map(|(a, b, c, d)| ScalarRange { a, b, c, d })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_passes_are_deterministic(
        range in range_strategy(),
        min_area in 0i32..500,
        max_area in 0i32..500,
    ) {
        let b = threshold_pipeline(range, min_area, max_area);

        let java_1 = CodeGenManager::build(&b.graph, "Pipe", &JavaLanguage, false).unwrap();
        let java_2 = CodeGenManager::build(&b.graph, "Pipe", &JavaLanguage, false).unwrap();
        prop_assert_eq!(&java_1, &java_2);

        let py_1 = CodeGenManager::build(&b.graph, "Pipe", &PythonLanguage, false).unwrap();
        let py_2 = CodeGenManager::build(&b.graph, "Pipe", &PythonLanguage, false).unwrap();
        prop_assert_eq!(&py_1, &py_2);
    }

    #[test]
    fn prop_configured_bounds_reach_the_output(
        min_area in 0i32..500,
        max_area in 0i32..500,
    ) {
        let b = threshold_pipeline(
            ScalarRange {
                a: Range::new(0.0, 255.0),
                b: Range::new(0.0, 255.0),
                c: Range::new(0.0, 255.0),
                d: Range::new(0.0, 255.0),
            },
            min_area,
            max_area,
        );
        let source = CodeGenManager::build(&b.graph, "Pipe", &JavaLanguage, false).unwrap();
        let min_needle = format!("minArea = {};", min_area);
        let max_needle = format!("maxArea = {};", max_area);
        prop_assert!(source.contains(&min_needle));
        prop_assert!(source.contains(&max_needle));
    }

    #[test]
    fn prop_round_trip_preserves_generated_source(range in range_strategy()) {
        let b = threshold_pipeline(range, 0, 100);
        let before = CodeGenManager::build(&b.graph, "Pipe", &JavaLanguage, false).unwrap();

        let restored = visionforge_rs::graph::ProjectFile::from_graph(&b.graph).into_graph();
        let after = CodeGenManager::build(&restored, "Pipe", &JavaLanguage, false).unwrap();
        prop_assert_eq!(before, after);
    }
}
