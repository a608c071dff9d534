#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use bucket_tree::{
        error::Error,
        semirings::{
            log_sum_exp, CountMin, CountedValue, Dummy, LogSumProduct, Marginalizer, MinSum,
            Semiring, Solution,
        },
    };
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_min_sum_combine() {
        let ops = MinSum::new();

        assert_relative_eq!(ops.combine(&1.5, &2.), 3.5);
        assert_relative_eq!(ops.combine_identity(), 0.);
    }

    #[test]
    fn test_min_sum_marginalizer() {
        let ops = MinSum::new();
        let mut marginalizer = ops.marginalizer().unwrap();

        assert_relative_eq!(marginalizer.marginalize(0, &[3., 1., 2.]), 1.);
    }

    #[test]
    fn test_min_sum_solvable_marginalizer() {
        let mut ops = MinSum::new();
        ops.set_max_solutions(2);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        // One eliminated variable over an empty separator.
        let mut marginalizer = ops.solvable_marginalizer(&[], &[], 0, 2).unwrap();
        assert_relative_eq!(marginalizer.marginalize(0, &[3., 1.]), 1.);

        let mut solution = ops.init_solution(&[2]).unwrap();
        solution.seed(&1.);
        marginalizer.solve(&mut solution, &mut rng).unwrap();

        let items = solution.items();
        assert_eq!(items.len(), 2);
        assert_relative_eq!(items[0].value(), 1.);
        assert_eq!(items[0].assignment(), &[1]);
        assert_relative_eq!(items[1].value(), 3.);
        assert_eq!(items[1].assignment(), &[0]);
    }

    #[test]
    fn test_min_sum_ties_break_lexicographically() {
        let mut ops = MinSum::new();
        ops.set_max_solutions(2);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let mut marginalizer = ops.solvable_marginalizer(&[], &[], 0, 3).unwrap();
        marginalizer.marginalize(0, &[2., 2., 2.]);

        let mut solution = ops.init_solution(&[3]).unwrap();
        marginalizer.solve(&mut solution, &mut rng).unwrap();

        let items = solution.items();
        assert_eq!(items[0].assignment(), &[0]);
        assert_eq!(items[1].assignment(), &[1]);
    }

    #[test]
    fn test_log_sum_exp() {
        assert_relative_eq!(log_sum_exp(&[0., 0.]), 2_f64.ln());
        assert_relative_eq!(log_sum_exp(&[1000., 1000.]), 1000. + 2_f64.ln());
        assert_eq!(log_sum_exp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]), f64::NEG_INFINITY);
    }

    #[test]
    fn test_log_sum_product_marginalizer() {
        let ops = LogSumProduct::new();
        let mut marginalizer = ops.marginalizer().unwrap();

        assert_relative_eq!(marginalizer.marginalize(0, &[0., 3_f64.ln()]), 4_f64.ln());
    }

    #[test]
    fn test_log_sum_product_sampling() {
        let ops = LogSumProduct::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let mut marginalizer = ops.solvable_marginalizer(&[], &[], 0, 2).unwrap();
        // Masses 1 and 3: the second choice carries three quarters.
        assert_relative_eq!(marginalizer.marginalize(0, &[0., 3_f64.ln()]), 4_f64.ln());

        let samples = 20_000;
        let mut hits = 0;
        for _ in 0..samples {
            let mut state = ops.init_solution(&[2]).unwrap();
            marginalizer.solve(&mut state, &mut rng).unwrap();
            hits += state.assignment()[0];
        }

        let frequency = hits as f64 / samples as f64;
        assert!((frequency - 0.75).abs() < 0.02, "got {frequency}");
    }

    #[test]
    fn test_count_min_combine() {
        let ops = CountMin::new(1e-9).unwrap();

        let combined = ops.combine(
            &CountedValue { value: 1., count: 2 },
            &CountedValue { value: 2., count: 3 },
        );
        assert_relative_eq!(combined.value, 3.);
        assert_eq!(combined.count, 6);

        let identity = ops.combine_identity();
        assert_relative_eq!(identity.value, 0.);
        assert_eq!(identity.count, 1);
    }

    #[test]
    fn test_count_min_marginalizer() {
        let ops = CountMin::new(0.5).unwrap();
        let mut marginalizer = ops.marginalizer().unwrap();

        let reduced = marginalizer.marginalize(
            0,
            &[
                CountedValue { value: 1., count: 1 },
                CountedValue { value: 1.3, count: 2 },
                CountedValue { value: 2., count: 4 },
            ],
        );
        assert_relative_eq!(reduced.value, 1.);
        assert_eq!(reduced.count, 3);
    }

    #[test]
    fn test_count_min_invalid_tolerance() {
        assert!(matches!(CountMin::new(-1.), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            CountMin::new(f64::NAN),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_count_min_cannot_solve() {
        let ops = CountMin::new(1e-9).unwrap();

        assert!(matches!(
            ops.solvable_marginalizer(&[], &[], 0, 2),
            Err(Error::OperationUnavailable(_))
        ));
        assert!(matches!(
            ops.init_solution(&[2]),
            Err(Error::OperationUnavailable(_))
        ));
    }

    #[test]
    fn test_dummy_is_unavailable() {
        let ops = Dummy::new();

        assert!(matches!(
            ops.marginalizer(),
            Err(Error::OperationUnavailable(_))
        ));
        assert!(matches!(
            ops.solvable_marginalizer(&[], &[], 0, 2),
            Err(Error::OperationUnavailable(_))
        ));
        assert!(matches!(
            ops.init_solution(&[2]),
            Err(Error::OperationUnavailable(_))
        ));
    }

    #[test]
    #[should_panic(expected = "Operation unavailable")]
    fn test_dummy_combine_panics() {
        Dummy::new().combine(&0., &0.);
    }
}
