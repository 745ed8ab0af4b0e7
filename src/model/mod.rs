//! # Gene Relation Graph Model
//!
//! Clean DTOs that define the attributed gene graph.
//! These types cross every boundary: parsers ↔ graph ↔ metrics ↔ scoring.
//!
//! Design rule: this module is pure data — no I/O, no statistics, no
//! graph bookkeeping. Anything that computes lives in `metrics`/`score`.

pub mod node;
pub mod edge;
pub mod value;

pub use node::{Node, FeatureMap, TARGET_NAME};
pub use edge::{Edge, EdgeKey};
pub use value::Value;
