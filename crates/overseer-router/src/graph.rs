//! Owned directed graph: stages are dense indices with a name lookup,
//! edges live in per-node adjacency lists.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use overseer_core::errors::{OverseerResult, RouterError};
use overseer_core::models::TransitionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub to: StageId,
    pub weight: f64,
    pub kind: TransitionKind,
}

#[derive(Debug, Clone, Default)]
pub struct StageGraph {
    names: Vec<String>,
    index: HashMap<String, StageId>,
    adjacency: Vec<Vec<Edge>>,
}

impl StageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&mut self, name: &str) -> OverseerResult<StageId> {
        if self.index.contains_key(name) {
            return Err(RouterError::DuplicateStage { name: name.to_string() }.into());
        }
        let id = StageId(self.names.len());
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        self.adjacency.push(Vec::new());
        Ok(id)
    }

    pub fn stage_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn id(&self, name: &str) -> Option<StageId> {
        self.index.get(name).copied()
    }

    pub fn require(&self, name: &str) -> OverseerResult<StageId> {
        self.id(name)
            .ok_or_else(|| RouterError::UnknownStage { name: name.to_string() }.into())
    }

    pub fn name(&self, id: StageId) -> &str {
        &self.names[id.0]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Insert or re-weight the edge `from -> to`. Weights must be finite
    /// and positive.
    pub fn add_edge(
        &mut self,
        from: &str,
        to: &str,
        weight: f64,
        kind: TransitionKind,
    ) -> OverseerResult<()> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(RouterError::InvalidWeight {
                from: from.to_string(),
                to: to.to_string(),
                weight,
            }
            .into());
        }
        let from_id = self.require(from)?;
        let to_id = self.require(to)?;
        let edges = &mut self.adjacency[from_id.0];
        match edges.iter_mut().find(|e| e.to == to_id) {
            Some(existing) => {
                existing.weight = weight;
                existing.kind = kind;
            }
            None => edges.push(Edge {
                to: to_id,
                weight,
                kind,
            }),
        }
        Ok(())
    }

    pub fn edge(&self, from: StageId, to: StageId) -> Option<&Edge> {
        self.adjacency.get(from.0)?.iter().find(|e| e.to == to)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.id(from), self.id(to)) {
            (Some(f), Some(t)) => self.edge(f, t).is_some(),
            _ => false,
        }
    }

    pub fn edges_from(&self, id: StageId) -> &[Edge] {
        self.adjacency.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dijkstra over edge weights. Returns the stage sequence including
    /// both endpoints and the total weight, or `None` if unreachable.
    pub fn shortest_path(&self, from: StageId, to: StageId) -> Option<(Vec<StageId>, f64)> {
        let n = self.names.len();
        if from.0 >= n || to.0 >= n {
            return None;
        }
        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<StageId>> = vec![None; n];
        let mut heap = BinaryHeap::new();

        dist[from.0] = 0.0;
        heap.push(Frontier { cost: 0.0, node: from });

        while let Some(Frontier { cost, node }) = heap.pop() {
            if node == to {
                break;
            }
            if cost > dist[node.0] {
                continue;
            }
            for edge in &self.adjacency[node.0] {
                let next = cost + edge.weight;
                if next < dist[edge.to.0] {
                    dist[edge.to.0] = next;
                    prev[edge.to.0] = Some(node);
                    heap.push(Frontier { cost: next, node: edge.to });
                }
            }
        }

        if !dist[to.0].is_finite() {
            return None;
        }
        let mut path = vec![to];
        let mut cursor = to;
        while let Some(p) = prev[cursor.0] {
            path.push(p);
            cursor = p;
        }
        path.reverse();
        Some((path, dist[to.0]))
    }
}

/// Min-heap entry; ties broken by lower stage index for determinism.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    node: StageId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}
