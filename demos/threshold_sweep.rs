//! Example showing how agreement changes with the IoU threshold.

use anno_compare::{
    evaluate_at_thresholds, frames::sweep_frame, generate_threshold_range, AnnotationLog,
    BoundingBox, CompareOptions, MatchPolicy, Picture, Region,
};

fn create_log(id: &str, url: &str, boxes: &[(&str, BoundingBox)]) -> AnnotationLog {
    AnnotationLog {
        id: id.to_string(),
        is_invalid: false,
        pictures: vec![Picture {
            id: Some(1.into()),
            url: Some(url.to_string()),
            is_invalid: false,
        }],
        regions: boxes
            .iter()
            .map(|(tag, bbox)| Region {
                tag: Some(tag.to_string()),
                bbox: Some(*bbox),
                attributes: vec![],
                additional_annotation: None,
            })
            .collect(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== IoU Threshold Sweep Example ===\n");

    // Two annotators drawing the same parts with varying precision
    let logs1 = vec![
        create_log(
            "1",
            "u/jacket.jpg",
            &[
                ("collar", BoundingBox::new(100.0, 40.0, 120.0, 50.0)),
                ("sleeve1", BoundingBox::new(20.0, 100.0, 60.0, 200.0)),
                ("sleeve2", BoundingBox::new(260.0, 100.0, 60.0, 200.0)),
            ],
        ),
        create_log(
            "2",
            "u/skirt.jpg",
            &[("hem", BoundingBox::new(50.0, 300.0, 200.0, 40.0))],
        ),
    ];
    let logs2 = vec![
        create_log(
            "7",
            "u/jacket.jpg",
            &[
                ("collar", BoundingBox::new(105.0, 42.0, 115.0, 48.0)),
                ("sleeve", BoundingBox::new(30.0, 120.0, 55.0, 170.0)),
                ("sleeve", BoundingBox::new(250.0, 90.0, 80.0, 230.0)),
            ],
        ),
        create_log(
            "8",
            "u/skirt.jpg",
            &[("hem", BoundingBox::new(60.0, 310.0, 200.0, 40.0))],
        ),
    ];

    // Example 1: Generate threshold range
    println!("1. Generating Threshold Range");
    let thresholds = generate_threshold_range(0.1, 0.9, 9)?;
    println!("   {:?}", thresholds);
    println!();

    // Example 2: Greedy sweep
    println!("2. Greedy Matching");
    let greedy = evaluate_at_thresholds(&logs1, &logs2, &CompareOptions::default(), &thresholds)?;
    println!("{}", sweep_frame(&greedy)?);
    println!();

    // Example 3: One-to-one sweep
    println!("3. One-to-One Matching");
    let options = CompareOptions::default().with_policy(MatchPolicy::OneToOne);
    let one_to_one = evaluate_at_thresholds(&logs1, &logs2, &options, &thresholds)?;
    println!("{}", sweep_frame(&one_to_one)?);
    println!();

    // Example 4: Strictest threshold that keeps every box matched
    println!("4. Strictest Full-Agreement Threshold");
    let strictest = one_to_one
        .iter()
        .filter(|(_, stats)| stats.unmatched_annotator1 == 0 && stats.unmatched_annotator2 == 0)
        .map(|(threshold, _)| *threshold)
        .last();
    match strictest {
        Some(threshold) => println!("   Every box matched up to IoU {:.2}", threshold),
        None => println!("   No threshold matches every box"),
    }
    println!();

    println!("=== Example Complete ===");

    Ok(())
}
