pub mod functions;
pub mod lint;
pub mod matching;
pub mod output;
pub mod tree;
pub mod types;
pub mod walk;

pub use functions::{AggregateOp, Function, FunctionSignature, lookup_function};
pub use lint::{Diagnostic, check_expr};
pub use matching::{VectorMatchCardinality, VectorMatching, resolve_vector_matching};
pub use tree::{Node, NodeKind, RawNode, Tree};
pub use types::{ValueType, resolve_type};
pub use walk::{contains_at_least_one_child, retrieve_all_recursive_nodes, walk_through};
