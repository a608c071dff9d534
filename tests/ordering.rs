#[cfg(test)]
mod tests {
    use bucket_tree::{
        decompositions::TreeDecomp,
        error::Error,
        graphs::AdjacencyGraph,
        ordering::{greedy_var_order, Heuristic},
        tables::Table,
    };
    use itertools::Itertools;
    use ndarray::prelude::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use test_log::test;

    /// A pairwise table over two binary variables.
    fn coupler(x: usize, y: usize) -> Table<f64> {
        Table::new([(x, 2), (y, 2)], array![1., -1., -1., 1.]).unwrap()
    }

    /// The couplers of a `rows` by `columns` grid.
    fn grid(rows: usize, columns: usize) -> Vec<Table<f64>> {
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

    /// Assert an order is a set of distinct in-range variables.
    fn assert_valid(order: &[usize], num_vars: usize) {
        assert!(order.iter().all(|&x| x < num_vars));
        assert_eq!(order.iter().unique().count(), order.len());
    }

    #[test]
    fn test_chain_is_fully_ordered() {
        let tables = (0..4).map(|x| coupler(x, x + 1)).collect_vec();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let order =
            greedy_var_order(&tables, 10., &[], Heuristic::MinDegree, 0., &mut rng).unwrap();

        assert_eq!(order.len(), 5);
        assert_valid(&order, 5);
    }

    #[test]
    fn test_order_is_deterministic() {
        let tables = grid(3, 3);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let first =
            greedy_var_order(&tables, 10., &[], Heuristic::MinFill, 1.5, &mut rng).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let second =
            greedy_var_order(&tables, 10., &[], Heuristic::MinFill, 1.5, &mut rng).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_order_honors_complexity_bound() {
        let tables = grid(3, 3);
        let max_complexity = 3.;

        for heuristic in [
            Heuristic::MinDegree,
            Heuristic::WeightedMinDegree,
            Heuristic::MinFill,
            Heuristic::WeightedMinFill,
        ] {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
            let order =
                greedy_var_order(&tables, max_complexity, &[], heuristic, 0., &mut rng).unwrap();
            assert_valid(&order, 9);

            // The decomposition along the returned order stays feasible.
            let edges = tables
                .iter()
                .flat_map(|table| table.vars().iter().copied().tuple_combinations::<(_, _)>());
            let graph = AdjacencyGraph::new(edges, 9);
            let decomp = TreeDecomp::new(&graph, &order, &[2; 9]).unwrap();
            assert!(decomp.complexity() <= max_complexity);
        }
    }

    #[test]
    fn test_negative_rank_clamps_immediately() {
        let tables = (0..4).map(|x| coupler(x, x + 1)).collect_vec();
        let clamp_ranks = [0, -1, 0, -1, 0];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let order =
            greedy_var_order(&tables, 10., &clamp_ranks, Heuristic::MinDegree, 0., &mut rng)
                .unwrap();

        assert!(!order.contains(&1));
        assert!(!order.contains(&3));
        assert_eq!(order.iter().sorted().collect_vec(), vec![&0, &2, &4]);
    }

    #[test]
    fn test_excessive_clique_forces_clamps() {
        // A 4-clique of binary variables: eliminating costs 4, so variables
        // are clamped until a 2-clique remains.
        let vars = 0..4;
        let tables = vars
            .clone()
            .tuple_combinations()
            .map(|(x, y)| coupler(x, y))
            .collect_vec();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let order =
            greedy_var_order(&tables, 2., &[], Heuristic::MinDegree, 0., &mut rng).unwrap();

        assert_eq!(order.len(), 2);
        assert_valid(&order, 4);
    }

    #[test]
    fn test_clamp_rank_length_mismatch() {
        let tables = vec![coupler(0, 1)];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let order = greedy_var_order(&tables, 10., &[0], Heuristic::MinDegree, 0., &mut rng);

        assert!(matches!(order, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_invalid_selection_scale() {
        let tables = vec![coupler(0, 1)];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        for selection_scale in [-1., f64::NAN, f64::INFINITY] {
            let order = greedy_var_order(
                &tables,
                10.,
                &[],
                Heuristic::MinDegree,
                selection_scale,
                &mut rng,
            );
            assert!(matches!(order, Err(Error::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_non_finite_complexity_bound() {
        let tables = vec![coupler(0, 1)];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let order = greedy_var_order(
            &tables,
            f64::INFINITY,
            &[],
            Heuristic::MinDegree,
            0.,
            &mut rng,
        );

        assert!(matches!(order, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_selection_scale_enlarges_pool() {
        let tables = grid(3, 3);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);

        let order =
            greedy_var_order(&tables, 10., &[], Heuristic::WeightedMinFill, 4., &mut rng).unwrap();

        assert_eq!(order.len(), 9);
        assert_valid(&order, 9);
    }

    #[test]
    fn test_isolated_variables_are_ordered() {
        // A variable mentioned by a unary table only has no neighbors.
        let tables = vec![
            coupler(0, 1),
            Table::new([(2, 3)], array![0., 1., 2.]).unwrap(),
        ];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let order =
            greedy_var_order(&tables, 10., &[], Heuristic::MinDegree, 0., &mut rng).unwrap();

        assert_eq!(order.len(), 3);
        assert_valid(&order, 3);
    }
}
