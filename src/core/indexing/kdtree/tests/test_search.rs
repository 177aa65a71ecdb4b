// src/core/indexing/kdtree/tests/test_search.rs

#[cfg(test)]
mod search_tests {
    use std::io::Cursor;

    use approx::assert_relative_eq;

    use crate::core::indexing::kdtree::builder::build_kdtree;
    use crate::core::indexing::kdtree::codec::{read_model, DecodeLimits};
    use crate::core::indexing::kdtree::error::KdTreeError;
    use crate::core::indexing::kdtree::search::{
        brute_force_nearest, euclidean_distance, find_nearest,
    };
    use crate::core::indexing::kdtree::stats::SplitRule;
    use crate::core::indexing::kdtree::tests::{line_table, random_table, table};
    use crate::core::indexing::kdtree::{KdTree, NodeId};
    use crate::core::table::{CsvTable, DataTable};

    /// Rows 0..=3: (0,0), (5,100), (4.9,0), (6,100). Row 1 splits on x with
    /// row 2 on its left and row 3 on its right.
    fn trap() -> (CsvTable, KdTree) {
        let t = table(&[&[0.0, 0.0], &[5.0, 100.0], &[4.9, 0.0], &[6.0, 100.0]]);
        let model = "0,0,0,1\n1,0,1,1\n2,-1,0,0\n3,-1,0,0\n";
        let tree = read_model(Cursor::new(model), DecodeLimits::for_table(&t)).unwrap();
        (t, tree)
    }

    /// Ids visited by a bound-0 descent starting at `start`.
    fn greedy_path(tree: &KdTree, t: &CsvTable, query: &[f64], start: NodeId) -> Vec<NodeId> {
        let mut path = vec![start];
        let mut current = start;
        loop {
            let node = tree.node(current);
            let Some(axis) = node.split_axis else { break };
            let value = t.get(node.representative, axis);
            let next = if value < query[axis] {
                node.right
            } else if value > query[axis] {
                node.left
            } else {
                None
            };
            match next {
                Some(id) => {
                    path.push(id);
                    current = id;
                }
                None => break,
            }
        }
        path
    }

    #[test]
    fn test_line_fixture_query() {
        let t = line_table();
        let tree = build_kdtree(&t, SplitRule::MaxStdDev, 0.1).unwrap();

        let hit = find_nearest(&tree, &t, &[3.2]).unwrap();
        assert_eq!(hit.index, 3);
        assert_relative_eq!(hit.distance, 0.2, epsilon = 1e-12);

        let exact = find_nearest(&tree, &t, &[0.0]).unwrap();
        assert_eq!(exact.index, 0);
        assert_eq!(exact.distance, 0.0);
    }

    #[test]
    fn test_single_point_tree() {
        let t = table(&[&[1.0, 2.0]]);
        let tree = build_kdtree(&t, SplitRule::MaxStdDev, 0.1).unwrap();
        let hit = find_nearest(&tree, &t, &[4.0, 6.0]).unwrap();
        assert_eq!(hit.index, 0);
        assert_relative_eq!(hit.distance, 5.0);
    }

    #[test]
    fn test_bound_controls_dual_descent() {
        let (t, mut tree) = trap();

        // 0.5 from row 1's hyperplane: a 0.1 bound commits to the right side
        tree.set_bound(0.1).unwrap();
        let narrow = find_nearest(&tree, &t, &[5.5, 0.0]).unwrap();
        assert_eq!(narrow.index, 0);
        assert_relative_eq!(narrow.distance, 5.5);

        tree.set_bound(1.0).unwrap();
        let wide = find_nearest(&tree, &t, &[5.5, 0.0]).unwrap();
        assert_eq!(wide.index, 2);
        assert_relative_eq!(wide.distance, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_coordinate_stops_outside_bound() {
        let (t, mut tree) = trap();

        tree.set_bound(0.0).unwrap();
        let stopped = find_nearest(&tree, &t, &[5.0, 1.0]).unwrap();
        assert_eq!(stopped.index, 0);

        tree.set_bound(0.05).unwrap();
        let explored = find_nearest(&tree, &t, &[5.0, 1.0]).unwrap();
        assert_eq!(explored.index, 2);
    }

    #[test]
    fn test_root_explores_both_children_at_zero_bound() {
        let t = line_table();
        let tree = build_kdtree(&t, SplitRule::MaxStdDev, 0.0).unwrap();
        // Query sits right of the root; its nearest point is in the right subtree
        let right = find_nearest(&tree, &t, &[3.9]).unwrap();
        assert_eq!(right.index, 4);
        // and left of the root; nearest lies in the left subtree
        let left = find_nearest(&tree, &t, &[0.6]).unwrap();
        assert_eq!(left.index, 1);
    }

    #[test]
    fn test_infinite_bound_matches_brute_force() {
        for (seed, dim) in [(31_u64, 1_usize), (32, 2), (33, 3), (34, 6)] {
            let t = random_table(seed, 300, dim, 50.0);
            let queries = random_table(seed + 100, 100, dim, 60.0);
            for rule in [SplitRule::MaxStdDev, SplitRule::MinAbsSkew, SplitRule::MinAbsKurtosis] {
                let tree = build_kdtree(&t, rule, f64::INFINITY).unwrap();
                for q in 0..queries.size() {
                    let query = queries.row(q);
                    let hit = find_nearest(&tree, &t, query).unwrap();
                    let expected = brute_force_nearest(&t, query).unwrap();
                    assert_eq!(hit, expected, "seed {seed}, rule {rule:?}, query {q}");
                }
            }
        }
    }

    #[test]
    fn test_zero_bound_result_is_self_consistent() {
        let t = random_table(41, 400, 3, 10.0);
        let queries = random_table(42, 80, 3, 10.0);
        let tree = build_kdtree(&t, SplitRule::MaxStdDev, 0.0).unwrap();
        let root = tree.root();

        for q in 0..queries.size() {
            let query = queries.row(q);
            let hit = find_nearest(&tree, &t, query).unwrap();
            assert_eq!(hit.distance, euclidean_distance(query, t.row(hit.index)));

            let mut reachable = vec![root.representative];
            for child in [root.left, root.right].into_iter().flatten() {
                reachable.extend(
                    greedy_path(&tree, &t, query, child)
                        .into_iter()
                        .map(|id| tree.node(id).representative),
                );
            }
            assert!(
                reachable.contains(&hit.index),
                "query {q} returned unreachable row {}",
                hit.index
            );

            let best_on_paths = reachable
                .iter()
                .map(|&row| euclidean_distance(query, t.row(row)))
                .fold(f64::INFINITY, f64::min);
            assert_eq!(hit.distance, best_on_paths);
        }
    }

    #[test]
    fn test_bounded_search_is_never_better_than_brute_force() {
        let t = random_table(51, 500, 2, 1.0);
        let queries = random_table(52, 100, 2, 1.0);
        for bound in [0.0, 0.01, 0.1, 0.5] {
            let tree = build_kdtree(&t, SplitRule::MaxStdDev, bound).unwrap();
            for q in 0..queries.size() {
                let hit = find_nearest(&tree, &t, queries.row(q)).unwrap();
                let exact = brute_force_nearest(&t, queries.row(q)).unwrap();
                assert!(hit.distance >= exact.distance);
            }
        }
    }

    #[test]
    fn test_tall_tree_search_without_recursion() {
        let rows = vec![vec![1.0]; 2000];
        let t = CsvTable::from_rows(rows).unwrap();
        let tree = build_kdtree(&t, SplitRule::MaxStdDev, f64::INFINITY).unwrap();
        let hit = find_nearest(&tree, &t, &[1.5]).unwrap();
        assert_eq!(hit.index, 0);
        assert_relative_eq!(hit.distance, 0.5);
    }

    #[test]
    fn test_query_validation() {
        let t = line_table();
        let tree = build_kdtree(&t, SplitRule::MaxStdDev, 0.1).unwrap();

        assert!(matches!(
            find_nearest(&tree, &t, &[1.0, 2.0]),
            Err(KdTreeError::DimensionMismatch {
                expected: 1,
                found: 2
            })
        ));
        assert!(matches!(
            find_nearest(&tree, &t, &[f64::NAN]),
            Err(KdTreeError::NonFiniteQuery { axis: 0, .. })
        ));

        // A tree searched against a table missing some of its rows
        let short = table(&[&[0.0], &[1.0]]);
        assert!(matches!(
            find_nearest(&tree, &short, &[0.5]),
            Err(KdTreeError::IndexOutOfBounds { index: 2, size: 2 })
        ));
    }

    #[test]
    fn test_axis_out_of_bounds_in_unchecked_model() {
        let t = table(&[&[0.0], &[1.0]]);
        // The root's axis is never compared against the query
        let tree =
            read_model(Cursor::new("0,3,0,1\n1,-1,0,0\n"), DecodeLimits::unbounded()).unwrap();
        assert!(find_nearest(&tree, &t, &[0.5]).is_ok());

        let deeper =
            read_model(Cursor::new("0,0,0,1\n1,3,0,0\n"), DecodeLimits::unbounded()).unwrap();
        assert!(matches!(
            find_nearest(&deeper, &t, &[0.5]),
            Err(KdTreeError::AxisOutOfBounds {
                axis: 3,
                dimension: 1
            })
        ));
    }

    #[test]
    fn test_brute_force_tie_keeps_lowest_row() {
        let t = table(&[&[0.0], &[2.0], &[2.0]]);
        let hit = brute_force_nearest(&t, &[1.0]).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.distance, 1.0);
    }
}
