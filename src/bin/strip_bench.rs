use ribbon::algorithms::chaining::{ChainingIterator, SilhouetteChaining};
use ribbon::predicates::{FalseUP1D, TrueUP1D};
use ribbon::shaders::advanced::{SmoothingShader, SpatialNoiseParams, SpatialNoiseShader};
use ribbon::shaders::basic::{ConstantColorShader, IncreasingThicknessShader, SamplingShader};
use ribbon::{ChainingSession, Nature, Rgb, StrokeShader, ViewMap};
use std::time::Instant;

// Rows of zigzag silhouette lines, each row one chain.
fn build_zigzag_map(edges_target: usize) -> ViewMap {
    let mut vm = ViewMap::new();
    let w = 200usize;
    let rows = edges_target.div_ceil(w).max(1);
    let mut ecount = 0usize;
    'outer: for j in 0..rows {
        let y0 = j as f64 * 20.0;
        let mut prev = vm.add_vertex(0.0, y0);
        for i in 1..=w {
            let y = y0 + if i % 2 == 0 { 0.0 } else { 6.0 };
            let v = vm.add_vertex(i as f64 * 4.0, y);
            vm.add_edge(prev, v, Nature::SILHOUETTE);
            prev = v;
            ecount += 1;
            if ecount >= edges_target {
                break 'outer;
            }
        }
    }
    vm
}

fn pipeline() -> Vec<Box<dyn StrokeShader>> {
    vec![
        Box::new(SamplingShader { sampling: 2.0 }),
        Box::new(SpatialNoiseShader::new(SpatialNoiseParams { amount: 1.5, scale: 0.2, ..Default::default() })),
        Box::new(SmoothingShader::default()),
        Box::new(IncreasingThicknessShader { min: 1.0, max: 6.0 }),
        Box::new(ConstantColorShader { color: Rgb::new(0.1, 0.1, 0.1), alpha: 1.0 }),
    ]
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    let mut edges = 2000usize;
    let mut runs = 20usize;
    let mut assert_ms: Option<f64> = None;
    for a in &args[1..] {
        if let Some(val) = a.strip_prefix("--edges=") {
            if let Ok(v) = val.parse() { edges = v; }
        } else if let Some(val) = a.strip_prefix("--runs=") {
            if let Ok(v) = val.parse() { runs = v; }
        } else if let Some(val) = a.strip_prefix("--assert-ms=") {
            if let Ok(v) = val.parse() { assert_ms = Some(v); }
        }
    }

    let vm = build_zigzag_map(edges);
    let mut times_ms: Vec<f64> = Vec::with_capacity(runs);
    let mut strips = 0usize;
    let mut rep_vertices = 0usize;
    for _ in 0..runs {
        let t0 = Instant::now();
        let mut session = ChainingSession::new(&vm);
        if let Err(e) = session.select(&mut TrueUP1D) {
            eprintln!("select failed: {}", e);
            std::process::exit(1);
        }
        let mut it = ChainingIterator::new(SilhouetteChaining, true, true);
        if let Err(e) = session.chain(&mut it, &mut FalseUP1D) {
            eprintln!("chain failed: {}", e);
            std::process::exit(1);
        }
        let mut shaders = pipeline();
        if let Err(e) = session.create(&mut TrueUP1D, &mut shaders) {
            eprintln!("create failed: {}", e);
            std::process::exit(1);
        }
        let reps: Vec<_> = session.strokes().iter().map(|s| s.to_rep()).collect();
        times_ms.push(t0.elapsed().as_secs_f64() * 1000.0);
        strips = reps.iter().map(|r| r.strips().len()).sum();
        rep_vertices = reps.iter().flat_map(|r| r.strips()).map(|s| s.len()).sum();
    }
    times_ms.sort_by(|a, b| a.total_cmp(b));
    let med = percentile(&times_ms, 0.5);
    let p90 = percentile(&times_ms, 0.9);
    println!(
        "edges={} runs={} strips={} rep_vertices={} median_ms={:.3} p90_ms={:.3}",
        edges, runs, strips, rep_vertices, med, p90
    );
    if let Some(th) = assert_ms {
        if med > th {
            eprintln!("FAIL: median {:.3} ms > threshold {:.3} ms", med, th);
            std::process::exit(1);
        }
    }
}
