#[cfg(test)]
mod tests {
    use bucket_tree::graphs::AdjacencyGraph;

    #[test]
    fn test_new() {
        let graph = AdjacencyGraph::new([(0, 1), (1, 2), (0, 2)], 0);

        assert_eq!(graph.num_vertices(), 3);
        assert_eq!(graph.degree(0), 2);
        assert_eq!(graph.neighbors(0), &[1, 2]);
        assert_eq!(graph.neighbors(1), &[0, 2]);
        assert_eq!(graph.neighbors(2), &[0, 1]);
    }

    #[test]
    fn test_new_collapses_duplicates() {
        let graph = AdjacencyGraph::new([(0, 1), (1, 0), (0, 1)], 0);

        assert_eq!(graph.degree(0), 1);
        assert_eq!(graph.neighbors(0), &[1]);
    }

    #[test]
    fn test_new_ignores_self_loops() {
        let graph = AdjacencyGraph::new([(0, 0), (0, 1)], 0);

        assert_eq!(graph.neighbors(0), &[1]);
        assert_eq!(graph.neighbors(1), &[0]);
    }

    #[test]
    fn test_new_min_vertices() {
        let graph = AdjacencyGraph::new([(0, 1)], 5);

        assert_eq!(graph.num_vertices(), 5);
        assert_eq!(graph.degree(4), 0);
        assert!(graph.neighbors(4).is_empty());
    }

    #[test]
    fn test_new_empty() {
        let graph = AdjacencyGraph::new([], 0);

        assert_eq!(graph.num_vertices(), 0);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_neighbors_out_of_bounds() {
        let graph = AdjacencyGraph::new([(0, 1)], 0);

        graph.neighbors(2);
    }
}
