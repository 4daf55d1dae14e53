use ahash::RandomState;

pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V, RandomState>;
pub(crate) type HashSet<T> = std::collections::HashSet<T, RandomState>;

pub mod arena;
pub use arena::{Arena, NodeHandle, RouteHandle};
pub mod cost;
pub use cost::{Cost, CostEvaluator};
pub mod engine;
pub use engine::{Engine, Node, NodeId, RouteId};
pub mod neighbourhood;
pub use neighbourhood::{compute_neighbours, proximity};
pub mod operators;
pub mod params;
pub use params::{NeighbourhoodParams, SearchParams};
mod reconcile;
pub mod registry;
pub use registry::{Owner, OwnershipRegistry};
pub mod route;
pub use route::Route;
pub mod search;
pub use search::{LocalSearch, SearchStats};
pub mod segment;
mod slab;
mod transfer;
