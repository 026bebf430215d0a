// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A deterministic implementation of Kahn's algorithm for topological sorting.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// An error indicating that a cycle was detected in the graph.
///
/// Carries the indices of the nodes that could not be ordered, i.e. every
/// node participating in (or downstream of) a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    /// Indices of the unresolvable nodes, in ascending order.
    pub nodes: Vec<usize>,
}

/// Performs a deterministic topological sort over nodes `0..node_count`.
///
/// The graph is defined by directed `(parent, child)` edges between node
/// indices. Among nodes whose dependencies are all satisfied, the smallest
/// index is emitted first, so identical inputs always produce identical
/// orders and independent nodes keep their declaration order.
///
/// # Arguments
///
/// * `node_count`: The number of nodes; indices outside `0..node_count` in
///   `edges` are ignored.
/// * `edges`: Directed dependency edges, `(parent, child)` meaning `parent`
///   must be emitted before `child`.
///
/// # Returns
///
/// * `Ok(Vec<usize>)`: Node indices in a valid, deterministic topological order.
/// * `Err(CycleError)`: If the graph contains one or more cycles.
pub fn topological_sort_stable(
    node_count: usize,
    edges: &[(usize, usize)],
) -> Result<Vec<usize>, CycleError> {
    if node_count == 0 {
        return Ok(Vec::new());
    }

    // 1. Build adjacency list and in-degree counts from edges.
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut in_degree: Vec<usize> = vec![0; node_count];
    for &(parent, child) in edges {
        if parent >= node_count || child >= node_count {
            continue;
        }
        adjacency[parent].push(child);
        in_degree[child] += 1;
    }

    // 2. Seed the ready heap with all root nodes (in-degree of 0). A min-heap
    //    keyed on the node index makes tie-breaking deterministic.
    let mut ready: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
    for (node, &degree) in in_degree.iter().enumerate() {
        if degree == 0 {
            ready.push(Reverse(node));
        }
    }

    // 3. Drain the heap, releasing children as their last dependency resolves.
    let mut sorted = Vec::with_capacity(node_count);
    while let Some(Reverse(node)) = ready.pop() {
        sorted.push(node);
        for &child in &adjacency[node] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                ready.push(Reverse(child));
            }
        }
    }

    // 4. Any node left with a positive in-degree sits on a cycle.
    if sorted.len() != node_count {
        let nodes = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree > 0)
            .map(|(node, _)| node)
            .collect();
        Err(CycleError { nodes })
    } else {
        Ok(sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_sorts_to_empty() {
        assert_eq!(topological_sort_stable(0, &[]), Ok(Vec::new()));
    }

    #[test]
    fn independent_nodes_keep_index_order() {
        let order = topological_sort_stable(4, &[]).expect("no cycle");
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn chain_is_ordered() {
        let order = topological_sort_stable(3, &[(2, 1), (1, 0)]).expect("no cycle");
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn diamond_breaks_ties_by_index() {
        // 0 -> {1, 2} -> 3, with 1 and 2 independent of each other.
        let order =
            topological_sort_stable(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]).expect("no cycle");
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn rebuild_is_deterministic() {
        let edges = [(0, 3), (1, 3), (2, 4), (3, 4)];
        let first = topological_sort_stable(5, &edges).expect("no cycle");
        let second = topological_sort_stable(5, &edges).expect("no cycle");
        assert_eq!(first, second);
    }

    #[test]
    fn two_node_cycle_is_reported() {
        let err = topological_sort_stable(2, &[(0, 1), (1, 0)]).unwrap_err();
        assert_eq!(err.nodes, vec![0, 1]);
    }

    #[test]
    fn cycle_report_excludes_orderable_prefix() {
        // 0 is orderable; 1 and 2 form the cycle.
        let err = topological_sort_stable(3, &[(0, 1), (1, 2), (2, 1)]).unwrap_err();
        assert_eq!(err.nodes, vec![1, 2]);
    }
}
