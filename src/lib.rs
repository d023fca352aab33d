//! modelgen: generate typed model and query code from a live database schema.

pub mod association;
pub mod case;
pub mod config;
pub mod connection;
pub mod emit;
pub mod error;
pub mod introspect;
pub mod model;
pub mod pipeline;
pub mod tag;
pub mod type_map;
pub mod universe;

pub use association::{AssociationPlan, Bucket, RelationField};
pub use config::{resolve, ConfigLayer, GenerationConfig, Overlay};
pub use connection::{open, Connection};
pub use emit::{ModelEmitter, RustEmitter};
pub use error::{ConfigError, ConnectionError, EmitError, GenError, IntrospectionError};
pub use introspect::{ColumnMeta, SchemaSnapshot, SchemaSource};
pub use model::ResolvedTableModel;
pub use pipeline::{generate, run, RunReport};
pub use tag::TagPolicy;
