// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, HashSet};

use super::queue::{MinQueue, Score};
use crate::{earth_distance, AStarError, Edge, Graph, NodeId, Path};

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    at: NodeId,
    cost: f64,
    score: f64,
}

/// Queue order: lowest score first, ties broken by the lowest [NodeId].
fn queue_key(item: &QueueItem) -> (Score, NodeId) {
    (Score(item.score), item.at)
}

fn reconstruct_path(g: &Graph, came_from: &HashMap<NodeId, NodeId>, mut last: NodeId, cost: f64) -> Path {
    let mut ids = vec![last];

    while let Some(&nd) = came_from.get(&last) {
        ids.push(nd);
        last = nd;
    }

    ids.reverse();
    Path {
        nodes: ids.into_iter().filter_map(|id| g.get_node(id)).collect(),
        cost,
    }
}

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find the shortest route between two nodes in the provided graph.
///
/// The great-circle distance to the goal is used as the heuristic. As it never exceeds
/// the weight of any path, the first time the goal is taken off the queue its route
/// is the shortest one.
///
/// Returns an empty [Path] if there is no route between the two nodes.
/// Among multiple equally short routes, the returned one is chosen deterministically.
///
/// `step_limit` limits how many nodes may be expanded during the search
/// before returning [AStarError::StepLimitExceeded]. Concluding that no route exists requires
/// expanding all nodes accessible from the start. The recommended value is
/// [DEFAULT_STEP_LIMIT](crate::DEFAULT_STEP_LIMIT).
pub fn find_route(
    g: &Graph,
    from_id: NodeId,
    to_id: NodeId,
    step_limit: usize,
) -> Result<Path, AStarError> {
    let mut queue = MinQueue::new(queue_key);
    let mut came_from: HashMap<NodeId, NodeId> = HashMap::default();
    let mut known_costs: HashMap<NodeId, f64> = HashMap::default();
    let mut closed: HashSet<NodeId> = HashSet::default();
    let mut steps: usize = 0;

    let to_node = g
        .get_node(to_id)
        .ok_or(AStarError::InvalidReference(to_id))?;

    {
        let from_node = g
            .get_node(from_id)
            .ok_or(AStarError::InvalidReference(from_id))?;

        queue.push(QueueItem {
            at: from_id,
            cost: 0.0,
            score: earth_distance(from_node.coordinate(), to_node.coordinate()),
        });
        known_costs.insert(from_id, 0.0);
    }

    while let Some(item) = queue.pop() {
        if item.at == to_id {
            let path = reconstruct_path(g, &came_from, to_id, item.cost);
            log::debug!(
                "route from {} to {} found after {} steps: {} nodes, {:.1} m",
                from_id,
                to_id,
                steps,
                path.nodes.len(),
                path.cost,
            );
            return Ok(path);
        }

        // The queue may hold multiple items for the same node;
        // only the first (cheapest) one is expanded.
        if !closed.insert(item.at) {
            continue;
        }

        steps += 1;
        if steps > step_limit {
            log::debug!("route from {} to {}: step limit exceeded", from_id, to_id);
            return Err(AStarError::StepLimitExceeded);
        }
        if steps % 100 == 0 {
            log::trace!(
                "step {}: expanding {}, {} items queued",
                steps,
                item.at,
                queue.len(),
            );
        }

        for &Edge {
            to: neighbor_id,
            weight,
        } in g.get_edges(item.at)
        {
            if closed.contains(&neighbor_id) {
                continue;
            }

            if let Some(neighbor) = g.get_node(neighbor_id) {
                // Check if this is the cheapest way to the neighbor
                let neighbor_cost = item.cost + weight;
                if neighbor_cost
                    >= known_costs
                        .get(&neighbor_id)
                        .copied()
                        .unwrap_or(f64::INFINITY)
                {
                    continue;
                }

                // Push the new item into the queue
                came_from.insert(neighbor_id, item.at);
                known_costs.insert(neighbor_id, neighbor_cost);
                queue.push(QueueItem {
                    at: neighbor_id,
                    cost: neighbor_cost,
                    score: neighbor_cost
                        + earth_distance(neighbor.coordinate(), to_node.coordinate()),
                });
            }
        }
    }

    log::debug!(
        "no route from {} to {} after {} steps",
        from_id,
        to_id,
        steps
    );
    Ok(Path::default())
}
