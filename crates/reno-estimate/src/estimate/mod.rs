pub mod domain;
pub mod input;
mod model;
pub mod pricing;
pub mod sheet;
mod templates;

pub use domain::{
    format_won, pyung_to_m2, Category, QuantityUnit, Task, TaskId, TaskUpdate, UploadedImage,
    PYUNG_TO_M2,
};
pub use input::{RawTaskEdit, TaskField};
pub use model::{Estimate, EstimateSummary, EstimateView, TaskLineView, NEW_TASK_NAME};
pub use pricing::{labor_role, PriceTable, RecommendationSet};
pub use sheet::{import_tasks, EstimateSheet, SheetError, SheetRow};
pub use templates::{ConstructionTemplate, DEFAULT_SEED_AREA};
