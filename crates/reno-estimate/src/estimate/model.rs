use serde::Serialize;

use super::domain::{
    format_won, pyung_to_m2, Category, Task, TaskId, TaskUpdate, UploadedImage,
};
use super::pricing::{PriceTable, RecommendationSet};
use super::templates::ConstructionTemplate;

/// Name given to rows added from the editor.
pub const NEW_TASK_NAME: &str = "새로운 공정";

/// The working set of one editing session.
///
/// The total is never stored; [`Estimate::total`] folds over the current tasks
/// on every call so it always reflects the latest inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    template: ConstructionTemplate,
    base_area: Option<f64>,
    tasks: Vec<Task>,
    images: Vec<UploadedImage>,
    memo: String,
}

impl Estimate {
    /// Starts an estimate from the template's seed tasks.
    pub fn new(template: ConstructionTemplate) -> Self {
        Self {
            template,
            base_area: None,
            tasks: template.seed_tasks(),
            images: Vec::new(),
            memo: String::new(),
        }
    }

    /// Starts an estimate with no tasks.
    pub fn empty(template: ConstructionTemplate) -> Self {
        Self {
            tasks: Vec::new(),
            ..Self::new(template)
        }
    }

    pub(crate) fn from_parts(
        template: ConstructionTemplate,
        base_area: Option<f64>,
        tasks: Vec<Task>,
        images: Vec<UploadedImage>,
        memo: String,
    ) -> Self {
        Self {
            template,
            base_area: base_area.filter(|area| area.is_finite()),
            tasks,
            images,
            memo,
        }
    }

    pub fn template(&self) -> ConstructionTemplate {
        self.template
    }

    pub fn base_area(&self) -> Option<f64> {
        self.base_area
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn images(&self) -> &[UploadedImage] {
        &self.images
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    /// Non-finite values clear the base area rather than poisoning later syncs.
    pub fn set_base_area(&mut self, base_area: Option<f64>) {
        self.base_area = base_area.filter(|area| area.is_finite());
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) {
        self.memo = memo.into();
    }

    /// Appends an included row priced at zero whose quantity follows the base area.
    pub fn add_task(&mut self, category: Category) -> &Task {
        let task = Task {
            id: TaskId::generate(),
            included: true,
            category,
            name: NEW_TASK_NAME.to_string(),
            description: String::new(),
            unit_price: 0.0,
            quantity: self.base_area.unwrap_or(0.0),
        };
        self.tasks.push(task);
        &self.tasks[self.tasks.len() - 1]
    }

    /// Appends fully specified rows, e.g. from an imported task sheet. A row
    /// whose id is already present gets a fresh one.
    pub fn extend_tasks(&mut self, tasks: impl IntoIterator<Item = Task>) {
        for mut task in tasks {
            if self.task(&task.id).is_some() {
                task.id = TaskId::generate();
            }
            self.tasks.push(task);
        }
    }

    /// Replaces one field on the matching task. Returns `false` when no task
    /// has that id. Values are stored as given, including negatives.
    pub fn update_task(&mut self, id: &TaskId, update: TaskUpdate) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| &task.id == id) else {
            return false;
        };

        match update {
            TaskUpdate::Included(included) => task.included = included,
            TaskUpdate::Category(category) => task.category = category,
            TaskUpdate::Name(name) => task.name = name,
            TaskUpdate::Description(description) => task.description = description,
            TaskUpdate::UnitPrice(unit_price) => task.unit_price = finite_or_zero(unit_price),
            TaskUpdate::Quantity(quantity) => task.quantity = finite_or_zero(quantity),
        }
        true
    }

    pub fn delete_task(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|task| &task.id == id)?;
        Some(self.tasks.remove(index))
    }

    /// Overwrites every task quantity, lump-sum rows included, with the base
    /// area. Returns the number of rows touched, or `None` when no base area
    /// has been entered.
    pub fn sync_area_to_base(&mut self) -> Option<usize> {
        let base_area = self.base_area?;
        for task in &mut self.tasks {
            task.quantity = base_area;
        }
        Some(self.tasks.len())
    }

    pub fn total(&self) -> f64 {
        self.tasks.iter().map(Task::included_total).sum()
    }

    /// Overwrites unit prices for tasks whose category the table prices.
    /// Returns the number of rows repriced.
    pub fn apply_price_table(&mut self, table: &PriceTable) -> usize {
        let mut repriced = 0;
        for task in &mut self.tasks {
            if let Some(price) = table.price_for(task.category) {
                task.unit_price = price;
                repriced += 1;
            }
        }
        repriced
    }

    /// Includes every task in a recommended category. Already-included tasks
    /// stay included; nothing is excluded. Returns the number of rows switched on.
    pub fn apply_recommendations(&mut self, recommendations: &RecommendationSet) -> usize {
        let mut switched = 0;
        for task in &mut self.tasks {
            if recommendations.contains(task.category) && !task.included {
                task.included = true;
                switched += 1;
            }
        }
        switched
    }

    pub fn attach_image(&mut self, image: UploadedImage) {
        self.images.push(image);
    }

    pub fn detach_image(&mut self, path: &str) -> Option<UploadedImage> {
        let index = self.images.iter().position(|image| image.path == path)?;
        Some(self.images.remove(index))
    }

    pub fn has_image(&self, path: &str) -> bool {
        self.images.iter().any(|image| image.path == path)
    }

    pub fn summary(&self) -> EstimateSummary {
        let total = self.total();
        EstimateSummary {
            task_count: self.tasks.len(),
            included_count: self.tasks.iter().filter(|task| task.included).count(),
            image_count: self.images.len(),
            total,
            total_display: format_won(total),
        }
    }

    pub fn view(&self) -> EstimateView {
        EstimateView {
            template: self.template,
            template_label: self.template.label(),
            base_area: self.base_area,
            base_area_m2: pyung_to_m2(self.base_area.unwrap_or(0.0)),
            tasks: self
                .tasks
                .iter()
                .map(|task| TaskLineView {
                    task: task.clone(),
                    unit_label: task.category.unit().label(),
                    line_total: task.line_total(),
                })
                .collect(),
            images: self.images.clone(),
            memo: self.memo.clone(),
            summary: self.summary(),
        }
    }
}

impl Default for Estimate {
    fn default() -> Self {
        Self::new(ConstructionTemplate::default())
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateSummary {
    pub task_count: usize,
    pub included_count: usize,
    pub image_count: usize,
    pub total: f64,
    pub total_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskLineView {
    #[serde(flatten)]
    pub task: Task,
    pub unit_label: &'static str,
    pub line_total: f64,
}

/// Serializable snapshot of an estimate for editors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateView {
    pub template: ConstructionTemplate,
    pub template_label: &'static str,
    pub base_area: Option<f64>,
    pub base_area_m2: f64,
    pub tasks: Vec<TaskLineView>,
    pub images: Vec<UploadedImage>,
    pub memo: String,
    pub summary: EstimateSummary,
}
