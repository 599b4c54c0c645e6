use serde::Deserialize;


/// Upper-inclusive class edges for each per-feature metric.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BinEdges {
    pub signed: Vec<f64>,
    pub absolute: Vec<f64>,
    pub percentage: Vec<f64>,
}

impl Default for BinEdges {
    fn default() -> Self {
        BinEdges {
            signed: vec![-4.0, -3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            absolute: vec![0.5, 1.0, 1.5, 2.5, 3.0, 4.0],
            percentage: vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0],
        }
    }
}

/// Index of the first edge that is `>= value`; values above every edge get
/// `edges.len()`.
pub fn classify(value: f64, edges: &[f64]) -> usize {
    edges
        .iter()
        .position(|edge| value <= *edge)
        .unwrap_or(edges.len())
}
