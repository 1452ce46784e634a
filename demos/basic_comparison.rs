//! Basic comparison example demonstrating core functionality.

use anno_compare::{
    evaluator::compare_logs, load_from_str, metrics::iou::calculate_iou, table::build_table,
    table::TableView, AggregateStats, BoundingBox, CompareOptions,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Annotation Comparison Example ===\n");

    // Example 1: IoU Calculation
    println!("1. IoU Calculation");
    let bbox1 = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
    let bbox2 = BoundingBox::new(30.0, 30.0, 50.0, 50.0);
    let iou = calculate_iou(&bbox1, &bbox2);
    println!("   IoU between overlapping boxes: {:.4}", iou);
    println!();

    // Example 2: Load both annotators' results
    println!("2. Loading Result Files");
    let annotator1_json = r#"[
        {
            "id": "101",
            "pictureList": [{"id": 1, "url": "https://images.example/shirt.jpg"}],
            "labels": "[{\"tag\": {\"name\": \"collar1\"}, \"points\": [{\"x\": 100, \"y\": 40}, {\"x\": 220, \"y\": 90}], \"dimensionList\": [{\"name\": \"shape\", \"dimensionValueList\": [{\"name\": \"round\"}]}]}, {\"tag\": {\"name\": \"pocket\"}, \"points\": [{\"x\": 130, \"y\": 150}, {\"x\": 170, \"y\": 200}], \"dimensionList\": [{\"name\": \"color\", \"dimensionValueList\": [{\"name\": \"navy\"}]}]}]"
        }
    ]"#;
    let annotator2_json = r#"[
        {
            "id": "202",
            "pictureList": [{"id": 1, "url": "https://images.example/shirt.jpg"}],
            "labels": "[{\"tag\": {\"name\": \"collar2\"}, \"points\": [{\"x\": 104, \"y\": 38}, {\"x\": 218, \"y\": 95}], \"dimensionList\": [{\"name\": \"shape\", \"dimensionValueList\": [{\"name\": \"v-neck\"}]}]}, {\"tag\": {\"name\": \"button\"}, \"points\": [{\"x\": 128, \"y\": 152}, {\"x\": 172, \"y\": 198}]}, {\"tag\": {\"name\": \"hem\"}, \"points\": [{\"x\": 60, \"y\": 400}, {\"x\": 300, \"y\": 430}]}]"
        }
    ]"#;

    let logs1 = load_from_str(annotator1_json)?;
    let logs2 = load_from_str(annotator2_json)?;
    println!("   Annotator 1: {} boxes", logs1[0].box_count());
    println!("   Annotator 2: {} boxes", logs2[0].box_count());
    println!();

    // Example 3: Compare one image
    println!("3. Comparing One Image");
    let options = CompareOptions::default();
    let comparison = compare_logs(&logs1[0], &logs2[0], &options)?;
    println!("{}", comparison.stats.summary_string());
    for confused in &comparison.reconciliation.confused {
        println!(
            "   Confused: {} ({}) vs {} ({})",
            confused.box_id1, confused.tag1, confused.box_id2, confused.tag2
        );
    }
    println!();

    // Example 4: Comparison table
    println!("4. Comparison Table");
    for row in build_table(&comparison, &TableView::All) {
        println!(
            "   {:<8} {:<10} {:<24} {:<10} {:<10}{}",
            row.group.map(|g| g.to_string()).unwrap_or_default(),
            row.tag,
            row.dimension,
            row.annotator1,
            row.annotator2,
            if row.differs { "  *" } else { "" }
        );
    }
    println!();

    // Example 5: Aggregate
    println!("5. Aggregate Statistics");
    let mut stats = AggregateStats::new();
    stats.absorb(&comparison.stats);
    stats.finish();
    print!("{}", stats.summary_string());
    println!();

    println!("=== Example Complete ===");

    Ok(())
}
