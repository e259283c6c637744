//! form-core: motor declarativo de dependencias entre campos.
//!
//! Convierte una descripción estática de campos (dependencias, visibilidad
//! condicional, tipos condicionales, opciones calculadas y watchers) en un
//! estado de UI consistente mientras el usuario edita.
//!
//! - `descriptor`/`prop`/`rule`: la declaración (plantillas inmutables).
//! - `graph`: validación del grafo y orden topológico.
//! - `resolver`: propiedades efectivas por pasada (`ResolvedField`).
//! - `watcher`: propagación de cambios hasta punto fijo.
pub mod config;
pub mod constants;
pub mod descriptor;
pub mod errors;
pub mod graph;
pub mod hashing;
pub mod label;
pub mod prop;
pub mod resolver;
pub mod rule;
pub mod value;
pub mod watcher;

pub use config::EngineConfig;
pub use descriptor::{FieldDescriptor, InputKind, PlatformTag, SelectOption, Visibility, WatchContext};
pub use errors::{ConfigurationError, WatchError};
pub use graph::FieldGraph;
pub use label::{IdentityLookup, LabelLookup, MapLookup};
pub use prop::Prop;
pub use resolver::{resolve, Resolution, ResolvedField};
pub use rule::{Discriminated, Rule, RuleKind, Shape, ValidatorBuilder};
pub use value::{DepValues, FormState};
pub use watcher::{Propagation, PropagationWarning, WatcherEngine};
