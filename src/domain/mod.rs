// Domain layer - Canonical dashboard model and its editing rules
pub mod dashboard;
pub mod editing;
pub mod yaml_node;
