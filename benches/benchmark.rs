use bucket_tree::{
    inference::optimize,
    ordering::{greedy_var_order, Heuristic},
    tables::Table,
};
use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// The couplers of a `rows` by `columns` grid of binary spins.
fn grid_tables(rows: usize, columns: usize) -> Vec<Table<f64>> {
    let coupler = |x: usize, y: usize| {
        Table::new([(x, 2), (y, 2)], array![1., -1., -1., 1.]).unwrap()
    };

    let mut tables = Vec::new();
    for i in 0..rows {
        for j in 0..columns {
            let x = i * columns + j;
            if j + 1 < columns {
                tables.push(coupler(x, x + 1));
            }
            if i + 1 < rows {
                tables.push(coupler(x, x + columns));
            }
        }
    }

    tables
}

fn bench_greedy_var_order(c: &mut Criterion) {
    let tables = grid_tables(8, 8);

    c.bench_function("greedy_var_order_grid_8x8", |b| {
        b.iter(|| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
            greedy_var_order(&tables, 16., &[], Heuristic::WeightedMinFill, 0., &mut rng).unwrap()
        })
    });
}

fn bench_optimize(c: &mut Criterion) {
    let tables = grid_tables(8, 8);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
    let order = greedy_var_order(&tables, 16., &[], Heuristic::MinFill, 0., &mut rng).unwrap();

    c.bench_function("optimize_grid_8x8", |b| {
        b.iter(|| optimize(&tables, &order, 16., 1, &[], 0).unwrap())
    });
}

criterion_group!(benches, bench_greedy_var_order, bench_optimize);
criterion_main!(benches);
