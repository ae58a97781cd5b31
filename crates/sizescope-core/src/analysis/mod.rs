/// Analysis modules: alternate views computed from a finished tree.
pub mod details;
pub mod file_types;

pub use details::{node_details, Access, NodeDetails};
pub use file_types::{
    categorise_extension, categorize, category_nodes, CategoryRule, CategoryRules, CategoryStats,
    FileCategory,
};
