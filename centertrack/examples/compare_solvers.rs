use centertrack::cost::GATED_COST;
use centertrack::{GreedySolver, HungarianSolver};
use ndarray::{array, Array2};

fn main() {
    println!("Comparing greedy and Hungarian assignment...");

    // Two tracks, two detections: the cheapest pair blocks the second match
    // for greedy, Hungarian trades it for two feasible matches
    let cost_matrix = array![
        [1.2, 1.3],       // Detection 0 costs
        [1.5, GATED_COST] // Detection 1 costs
    ];

    let greedy = GreedySolver::solve(cost_matrix.view());
    let optimal = HungarianSolver::solve(cost_matrix.view());

    for (name, result) in [("greedy", &greedy), ("hungarian", &optimal)] {
        println!("\n{name}:");
        println!("  Matches: {:?}", result.matches);
        println!("  Unmatched detections: {:?}", result.unmatched_detections);
        println!("  Unmatched tracks: {:?}", result.unmatched_tracks);
        println!("  Total cost: {}", result.total_cost);
    }

    println!("\nSolving a larger gated matrix (100x100)...");
    let large_matrix = Array2::from_shape_fn((100, 100), |(i, j)| {
        let d = (i as f32 - j as f32).abs() * 0.7;
        if d > 3.0 {
            GATED_COST
        } else {
            d
        }
    });

    let start = std::time::Instant::now();
    let greedy = GreedySolver::solve(large_matrix.view());
    let greedy_time = start.elapsed();

    let start = std::time::Instant::now();
    let optimal = HungarianSolver::solve(large_matrix.view());
    let optimal_time = start.elapsed();

    for (name, result, elapsed) in [("greedy", greedy, greedy_time), ("hungarian", optimal, optimal_time)] {
        println!(
            "  {name}: {} matches, total cost {:.1}, solved in {:?}",
            result.matches.len(),
            result.total_cost,
            elapsed
        );
    }
}
