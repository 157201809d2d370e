use std::time::Instant;
use rand::{ Rng, SeedableRng, rngs::StdRng, seq::SliceRandom };
use qconst::{
    dag::{ CircuitDag, QubitId },
    gate::{ Gate, Polarity },
    pass::{ ConstantStateOptimization, PassError },
    phase::Phase,
    sim,
};

fn timeit<F, T>(mut f: F) -> (T, f64)
where F: FnMut() -> T
{
    let t0 = Instant::now();
    let out: T = f();
    (out, (Instant::now() - t0).as_secs_f64())
}

fn random_gate<R: Rng>(rng: &mut R, n: usize)
    -> anyhow::Result<(Gate, Vec<QubitId>)>
{
    let mut wires: Vec<QubitId> = (0..n).collect();
    wires.shuffle(rng);
    let pick = |k: usize| wires[..k].to_vec();
    let op =
        match rng.gen_range(0..12) {
            0 => (Gate::H, pick(1)),
            1 => (Gate::X, pick(1)),
            2 => (Gate::Z, pick(1)),
            3 => (Gate::T, pick(1)),
            4 => (Gate::ZRot(Phase::new(rng.gen_range(0..8), 8)), pick(1)),
            5 | 6 => (Gate::cx(), pick(2)),
            7 => {
                let p = Polarity::from_int(rng.gen_range(0..4), 2)?;
                (Gate::controlled(Gate::X, 2, p)?, pick(3))
            },
            8 => (Gate::cz(), pick(2)),
            9 | 10 => (Gate::Swap, pick(2)),
            _ => (Gate::Reset, pick(1)),
        };
    Ok(op)
}

fn main() -> anyhow::Result<()> {
    const N: usize = 8;
    const DEPTH: usize = 200;
    const TRIALS: usize = 25;

    let mut rng = StdRng::seed_from_u64(10546);
    let mut total = 0.0;
    for trial in 0..TRIALS {
        let mut dag = CircuitDag::new(N);
        for _ in 0..DEPTH {
            let (gate, wires) = random_gate(&mut rng, N)?;
            dag.apply(gate, &wires)?;
        }
        let original = dag.clone();

        let mut pass = ConstantStateOptimization::new();
        let (res, t) = timeit(|| pass.run(&mut dag));
        total += t;
        match res {
            Ok(report) => {
                println!(
                    "trial {:2}: {} -> {} op(s), depth {} -> {}; {}",
                    trial,
                    original.count_nodes(), dag.count_nodes(),
                    original.depth(), dag.depth(),
                    report,
                );
            },
            Err(err @ PassError::OpenControlsOnMinus(_)) => {
                println!("trial {:2}: stopped early: {}", trial, err);
            },
            Err(err) => { return Err(err.into()); },
        }
        // resets have no unitary, so only check circuits without them
        if !original.nodes().any(|(_, node)| node.gate().is_reset()) {
            anyhow::ensure!(
                sim::equivalent(&original, &dag)?,
                "trial {}: optimized circuit differs from the original",
                trial,
            );
        }
    }
    println!("total pass time: {:.3e}s", total);

    let mut counts: Vec<(String, usize)> = {
        let mut dag = CircuitDag::new(N);
        for _ in 0..DEPTH {
            let (gate, wires) = random_gate(&mut rng, N)?;
            dag.apply(gate, &wires)?;
        }
        let _ = ConstantStateOptimization::new().run(&mut dag);
        dag.count_ops().into_iter().collect()
    };
    counts.sort();
    println!("op counts after one more run:");
    for (name, count) in counts {
        println!("  {:>6}: {}", name, count);
    }
    Ok(())
}
