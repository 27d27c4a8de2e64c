use crate::config::RenderSettings;
use crate::render::{LayoutKind, RenderRequest};
use crate::types::NodeId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::f64::consts::PI;
use tracing::debug;

/// Node position in the unit square
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Compute one position per node of `request`, in the same order
pub fn compute_positions(request: &RenderRequest, settings: &RenderSettings) -> Vec<Position> {
    let positions = match request.layout {
        LayoutKind::Hierarchical => hierarchical(request, settings),
        LayoutKind::ForceDirected => force_directed(request, settings),
        LayoutKind::Circular => circular(request.nodes.len()),
        LayoutKind::Random => random(request.nodes.len(), settings.seed),
    };

    debug!("Computed {} layout for {} nodes", request.layout, positions.len());
    positions
}

/// Ranks by generation, top to bottom; nodes within a rank ordered by id
fn hierarchical(request: &RenderRequest, settings: &RenderSettings) -> Vec<Position> {
    let mut ranks: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (slot, node) in request.nodes.iter().enumerate() {
        ranks.entry(node.generation).or_default().push(slot);
    }

    let mut raw = vec![Position { x: 0.0, y: 0.0 }; request.nodes.len()];
    for (rank, slots) in ranks.values().enumerate() {
        let width = (slots.len() as f64 - 1.0) * settings.node_separation;
        for (column, &slot) in slots.iter().enumerate() {
            raw[slot] = Position {
                x: column as f64 * settings.node_separation - width / 2.0,
                y: rank as f64 * settings.rank_separation,
            };
        }
    }

    normalize(raw)
}

fn circular(count: usize) -> Vec<Position> {
    if count == 1 {
        return vec![Position { x: 0.5, y: 0.5 }];
    }

    (0..count)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / count as f64;
            Position {
                x: 0.5 + 0.5 * angle.cos(),
                y: 0.5 + 0.5 * angle.sin(),
            }
        })
        .collect()
}

fn random(count: usize, seed: u64) -> Vec<Position> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| Position {
            x: rng.random::<f64>(),
            y: rng.random::<f64>(),
        })
        .collect()
}

/// Fruchterman-Reingold spring layout over the undirected lineage graph
fn force_directed(request: &RenderRequest, settings: &RenderSettings) -> Vec<Position> {
    let count = request.nodes.len();
    if count <= 1 {
        return circular(count);
    }

    let springs = spring_pairs(request);

    let mut positions = random(count, settings.seed);
    let k = (1.0 / count as f64).sqrt();
    let mut temperature = 0.1;
    let cooling = temperature / (settings.spring_iterations as f64 + 1.0);

    for _ in 0..settings.spring_iterations {
        let mut displacement = vec![(0.0_f64, 0.0_f64); count];

        for i in 0..count {
            for j in 0..count {
                if i == j {
                    continue;
                }
                let dx = positions[i].x - positions[j].x;
                let dy = positions[i].y - positions[j].y;
                let distance = (dx * dx + dy * dy).sqrt().max(0.01);

                let force = k * k / (distance * distance);
                displacement[i].0 += dx * force;
                displacement[i].1 += dy * force;
            }
        }

        for &(a, b) in &springs {
            let dx = positions[a].x - positions[b].x;
            let dy = positions[a].y - positions[b].y;
            let distance = (dx * dx + dy * dy).sqrt().max(0.01);

            let pull = distance / k;
            displacement[a].0 -= dx * pull;
            displacement[a].1 -= dy * pull;
            displacement[b].0 += dx * pull;
            displacement[b].1 += dy * pull;
        }

        for (position, (dx, dy)) in positions.iter_mut().zip(displacement) {
            let length = (dx * dx + dy * dy).sqrt().max(0.01);
            position.x += dx * temperature / length;
            position.y += dy * temperature / length;
        }

        temperature -= cooling;
    }

    normalize(positions)
}

/// Undirected node-slot pairs joined by at least one edge, each listed once
fn spring_pairs(request: &RenderRequest) -> BTreeSet<(usize, usize)> {
    let slot_of: HashMap<NodeId, usize> = request
        .nodes
        .iter()
        .enumerate()
        .map(|(slot, node)| (node.id, slot))
        .collect();

    request
        .edges
        .iter()
        .filter_map(|edge| {
            let a = *slot_of.get(&edge.parent)?;
            let b = *slot_of.get(&edge.child)?;
            (a != b).then(|| (a.min(b), a.max(b)))
        })
        .collect()
}

/// Rescale each axis into [0, 1]; a degenerate axis is centred
fn normalize(mut positions: Vec<Position>) -> Vec<Position> {
    if positions.is_empty() {
        return positions;
    }

    let (min_x, max_x) = bounds(positions.iter().map(|p| p.x));
    let (min_y, max_y) = bounds(positions.iter().map(|p| p.y));

    for position in &mut positions {
        position.x = scale(position.x, min_x, max_x);
        position.y = scale(position.y, min_y, max_y);
    }
    positions
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
        (min.min(value), max.max(value))
    })
}

fn scale(value: f64, min: f64, max: f64) -> f64 {
    if max - min > f64::EPSILON {
        (value - min) / (max - min)
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::LineageTracker;
    use crate::types::{EdgeKind, EdgeView, Individual};

    fn create_request(layout: LayoutKind) -> RenderRequest {
        // Two generations: 0, 1 -> 2, 3
        let mut tracker = LineageTracker::new();
        tracker.add_individual(Individual::new(1.0), &[], None, Some(0)).unwrap();
        tracker.add_individual(Individual::new(2.0), &[], None, Some(0)).unwrap();
        tracker.add_individual(Individual::new(3.0), &[0, 1], None, Some(1)).unwrap();
        tracker.add_individual(Individual::new(4.0), &[1], None, Some(1)).unwrap();
        tracker.render_request(None, layout).unwrap()
    }

    fn in_unit_square(positions: &[Position]) -> bool {
        positions
            .iter()
            .all(|p| (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y))
    }

    #[test]
    fn test_hierarchical_ranks_by_generation() {
        let request = create_request(LayoutKind::Hierarchical);
        let positions = compute_positions(&request, &RenderSettings::default());

        assert_eq!(positions.len(), 4);
        assert_eq!(positions[0].y, 0.0);
        assert_eq!(positions[1].y, 0.0);
        assert_eq!(positions[2].y, 1.0);
        assert!(positions[0].x < positions[1].x);
        assert!(positions[2].x < positions[3].x);
    }

    #[test]
    fn test_circular_layout() {
        let request = create_request(LayoutKind::Circular);
        let positions = compute_positions(&request, &RenderSettings::default());

        assert!(in_unit_square(&positions));
        assert!((positions[0].x - 1.0).abs() < 1e-9);
        assert!((positions[0].y - 0.5).abs() < 1e-9);
        assert!((positions[2].x - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_random_layout_is_seeded() {
        let request = create_request(LayoutKind::Random);
        let settings = RenderSettings::default();

        let first = compute_positions(&request, &settings);
        let second = compute_positions(&request, &settings);
        assert_eq!(first, second);
        assert!(in_unit_square(&first));
    }

    #[test]
    fn test_force_directed_layout() {
        let request = create_request(LayoutKind::ForceDirected);
        let settings = RenderSettings::default();
        let positions = compute_positions(&request, &settings);

        assert_eq!(positions.len(), 4);
        assert!(in_unit_square(&positions));
        assert!(positions.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        assert_eq!(positions, compute_positions(&request, &settings));
    }

    #[test]
    fn test_spring_pairs_are_undirected_and_unique() {
        let mut request = create_request(LayoutKind::ForceDirected);
        request.edges.push(EdgeView {
            parent: 0,
            child: 2,
            kind: EdgeKind::Mutation,
        });
        request.edges.push(EdgeView {
            parent: 1,
            child: 99,
            kind: EdgeKind::Generic,
        });

        let pairs: Vec<_> = spring_pairs(&request).into_iter().collect();
        assert_eq!(pairs, vec![(0, 2), (1, 2), (1, 3)]);
    }

    #[test]
    fn test_force_directed_handles_larger_populations() {
        let mut tracker = LineageTracker::new();
        tracker.add_individual(Individual::new(0.0), &[], None, Some(0)).unwrap();
        for id in 1..400 {
            let parents = [id - 1, id / 2];
            tracker
                .add_individual(Individual::new(id as f64), &parents, None, None)
                .unwrap();
        }
        let request = tracker.render_request(None, LayoutKind::ForceDirected).unwrap();
        let positions = compute_positions(&request, &RenderSettings::default());

        assert_eq!(positions.len(), 400);
        assert!(in_unit_square(&positions));
    }

    #[test]
    fn test_single_node_is_centred() {
        let mut tracker = LineageTracker::new();
        tracker.add_individual(Individual::new(1.0), &[], None, None).unwrap();

        for layout in [LayoutKind::Hierarchical, LayoutKind::Circular, LayoutKind::ForceDirected] {
            let request = tracker.render_request(None, layout).unwrap();
            let positions = compute_positions(&request, &RenderSettings::default());
            assert_eq!(positions, vec![Position { x: 0.5, y: 0.5 }]);
        }
    }
}
