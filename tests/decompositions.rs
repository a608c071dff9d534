#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use bucket_tree::{decompositions::TreeDecomp, error::Error, graphs::AdjacencyGraph};

    #[test]
    fn test_new_chain() {
        let graph = AdjacencyGraph::new([(0, 1), (1, 2)], 3);
        let decomp = TreeDecomp::new(&graph, &[0, 1, 2], &[2, 2, 2]).unwrap();

        let nodes = decomp.nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].node_var(), 0);
        assert_eq!(nodes[0].sep_vars(), &[1]);
        assert_eq!(nodes[0].node_scope(), vec![0, 1]);
        assert_eq!(nodes[0].parent(), Some(1));
        assert_eq!(nodes[1].node_var(), 1);
        assert_eq!(nodes[1].sep_vars(), &[2]);
        assert_eq!(nodes[1].parent(), Some(2));
        assert_eq!(nodes[1].children(), &[0]);
        assert_eq!(nodes[2].node_var(), 2);
        assert!(nodes[2].sep_vars().is_empty());
        assert_eq!(nodes[2].parent(), None);
        assert_eq!(nodes[2].children(), &[1]);

        assert_eq!(decomp.roots(), &[2]);
        assert!(decomp.clamped_vars().is_empty());
        assert_relative_eq!(decomp.complexity(), 2.);
    }

    #[test]
    fn test_complexity_is_max_over_nodes() {
        // A star with mixed domain sizes, center eliminated last.
        let graph = AdjacencyGraph::new([(0, 1), (0, 2)], 3);
        let decomp = TreeDecomp::new(&graph, &[1, 2, 0], &[2, 3, 4]).unwrap();

        // Node scopes are {0, 1}, {0, 2} and {0}.
        assert_relative_eq!(decomp.complexity(), 8_f64.log2());
    }

    #[test]
    fn test_elimination_fills_cliques() {
        // Eliminating the center of a star connects its leaves.
        let graph = AdjacencyGraph::new([(0, 1), (0, 2)], 3);
        let decomp = TreeDecomp::new(&graph, &[0, 1, 2], &[2, 2, 2]).unwrap();

        let nodes = decomp.nodes();
        assert_eq!(nodes[0].sep_vars(), &[1, 2]);
        assert_eq!(nodes[1].sep_vars(), &[2]);
        assert_relative_eq!(decomp.complexity(), 3.);
    }

    #[test]
    fn test_clamped_vars() {
        let graph = AdjacencyGraph::new([(0, 1)], 2);
        let decomp = TreeDecomp::new(&graph, &[0], &[2, 2]).unwrap();

        let nodes = decomp.nodes();
        assert_eq!(nodes.len(), 1);
        // The clamped neighbor is hosted, not part of the scope.
        assert!(nodes[0].sep_vars().is_empty());
        assert_eq!(nodes[0].clamped_vars(), &[1]);
        assert_eq!(decomp.clamped_vars(), &[1]);
        assert_eq!(decomp.position(0), Some(0));
        assert_eq!(decomp.position(1), None);
        assert_relative_eq!(decomp.complexity(), 1.);
    }

    #[test]
    fn test_clamped_host_is_root_most() {
        // Variable 3 is clamped and adjacent to the whole chain; its host is
        // the last eliminated neighbor.
        let graph = AdjacencyGraph::new([(0, 1), (1, 2), (0, 3), (1, 3), (2, 3)], 4);
        let decomp = TreeDecomp::new(&graph, &[0, 1, 2], &[2, 2, 2, 2]).unwrap();

        let nodes = decomp.nodes();
        assert!(nodes[0].clamped_vars().is_empty());
        assert!(nodes[1].clamped_vars().is_empty());
        assert_eq!(nodes[2].clamped_vars(), &[3]);
    }

    #[test]
    fn test_forest() {
        let graph = AdjacencyGraph::new([(0, 1), (2, 3)], 4);
        let decomp = TreeDecomp::new(&graph, &[0, 1, 2, 3], &[2, 2, 2, 2]).unwrap();

        assert_eq!(decomp.roots(), &[1, 3]);
    }

    #[test]
    fn test_traversals() {
        let graph = AdjacencyGraph::new([(0, 2), (1, 2)], 3);
        let decomp = TreeDecomp::new(&graph, &[0, 1, 2], &[2, 2, 2]).unwrap();

        let pre_order = decomp.pre_order(2);
        assert_eq!(pre_order, vec![2, 0, 1]);

        // Children always precede their parent bottom-up.
        let post_order = decomp.post_order(2);
        for (t, &node) in post_order.iter().enumerate() {
            for &child in decomp.nodes()[node].children() {
                assert!(post_order[..t].contains(&child));
            }
        }
    }

    #[test]
    fn test_new_duplicate_order() {
        let graph = AdjacencyGraph::new([(0, 1)], 2);
        let decomp = TreeDecomp::new(&graph, &[0, 0], &[2, 2]);

        assert!(matches!(decomp, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_new_out_of_range_order() {
        let graph = AdjacencyGraph::new([(0, 1)], 2);
        let decomp = TreeDecomp::new(&graph, &[0, 5], &[2, 2]);

        assert!(matches!(decomp, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_new_empty_domain() {
        let graph = AdjacencyGraph::new([(0, 1)], 2);
        let decomp = TreeDecomp::new(&graph, &[0, 1], &[2, 0]);

        assert!(matches!(decomp, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_new_empty_order() {
        let graph = AdjacencyGraph::new([(0, 1)], 2);
        let decomp = TreeDecomp::new(&graph, &[], &[2, 2]).unwrap();

        assert!(decomp.nodes().is_empty());
        assert!(decomp.roots().is_empty());
        assert_eq!(decomp.clamped_vars(), &[0, 1]);
        assert_relative_eq!(decomp.complexity(), 0.);
    }
}
