#![doc = "treelink: publish a local folder to a remote asset store and render the tree as linked markdown."]

//! The pipeline is directory-scan → validate → batch-upload → render: a
//! security-bounded traversal of a local folder into a tree, every regular
//! file uploaded in size- and concurrency-bounded batches with deterministic
//! collision renaming, and a deterministic markdown rendering of the tree
//! with upload results inlined as links.
//!
//! The upload transport and the document-insertion transport are external
//! collaborators behind the traits in [`contract`]; [`client`] provides the
//! HTTP implementations used by the CLI.

pub mod cancel;
pub mod cli;
pub mod client;
pub mod config;
pub mod contract;
pub mod disambiguate;
pub mod load_config;
pub mod publish;
pub mod render;
pub mod scan;
pub mod tree;
pub mod upload;
pub mod validate;

pub use cancel::CancelFlag;
pub use config::Limits;
pub use publish::{PublishReport, PublishStatus, Publisher};
pub use tree::{FailureLog, NodeKind, ScanResult, TreeNode};
pub use validate::{PathValidator, ValidationError};
