//! form-wizard: composición de varios steps en un wizard.
//!
//! Por step: filtro de políticas -> grafo -> resolución -> schema. El wizard
//! concatena los schemas, calcula los valores iniciales desde la entidad y
//! maneja la navegación y el submit con un log de eventos.
pub mod errors;
pub mod event;
pub mod options;
pub mod status;
pub mod step;
pub mod wizard;

pub use errors::WizardError;
pub use event::{EventLog, WizardEvent, WizardEventKind};
pub use options::{merge_json, WizardOptions};
pub use status::{StepStatus, WizardStatus};
pub use step::{Step, StepContext, StepFactory};
pub use wizard::{ChangeReport, SubmitOutcome, Wizard, WizardBuilder};
