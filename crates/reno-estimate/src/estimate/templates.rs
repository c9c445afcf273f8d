use serde::{Deserialize, Serialize};

use super::domain::{Category, QuantityUnit, Task, TaskId};

/// Quantity given to area-priced seed tasks before a base area is entered.
pub const DEFAULT_SEED_AREA: f64 = 32.0;

/// Construction-type templates. Each is a static allow-list of categories that
/// decides which seed tasks a fresh estimate starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionTemplate {
    #[default]
    Interior,
    Restoration,
    PermitWork,
}

impl ConstructionTemplate {
    pub const fn ordered() -> [Self; 3] {
        [Self::Interior, Self::Restoration, Self::PermitWork]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Interior => "인테리어",
            Self::Restoration => "원상복구",
            Self::PermitWork => "인허가 공사",
        }
    }

    pub fn categories(self) -> &'static [Category] {
        match self {
            Self::Interior => &[
                Category::Design,
                Category::Demolition,
                Category::Flooring,
                Category::Wall,
                Category::Ceiling,
                Category::ElectricalTelecom,
                Category::Plumbing,
                Category::Furniture,
                Category::Other,
            ],
            Self::Restoration => &[
                Category::Demolition,
                Category::Flooring,
                Category::Wall,
                Category::Ceiling,
                Category::ElectricalTelecom,
                Category::Other,
            ],
            Self::PermitWork => &[
                Category::Design,
                Category::Facade,
                Category::ElectricalTelecom,
                Category::Plumbing,
                Category::FireSafety,
                Category::Other,
            ],
        }
    }

    pub fn allows(self, category: Category) -> bool {
        self.categories().contains(&category)
    }

    /// Seed tasks for this template, in catalog order.
    pub fn seed_tasks(self) -> Vec<Task> {
        SEED_CATALOG
            .iter()
            .filter(|seed| self.allows(seed.category))
            .map(SeedTask::to_task)
            .collect()
    }
}

struct SeedTask {
    key: &'static str,
    category: Category,
    name: &'static str,
    description: &'static str,
    unit_price: f64,
}

impl SeedTask {
    fn to_task(&self) -> Task {
        let quantity = match self.category.unit() {
            QuantityUnit::Area => DEFAULT_SEED_AREA,
            QuantityUnit::LumpSum => 1.0,
        };

        Task {
            id: TaskId(self.key.to_string()),
            included: true,
            category: self.category,
            name: self.name.to_string(),
            description: self.description.to_string(),
            unit_price: self.unit_price,
            quantity,
        }
    }
}

const SEED_CATALOG: &[SeedTask] = &[
    SeedTask {
        key: "seed-design",
        category: Category::Design,
        name: "실측 및 설계",
        description: "현장 실측, 평면/입면 도면",
        unit_price: 30000.0,
    },
    SeedTask {
        key: "seed-demolition",
        category: Category::Demolition,
        name: "기본 철거 및 폐기물",
        description: "문틀, 마루, 욕실 등 전체 철거",
        unit_price: 150000.0,
    },
    SeedTask {
        key: "seed-facade",
        category: Category::Facade,
        name: "전면 파사드 및 사인",
        description: "외장 마감 및 간판 교체",
        unit_price: 120000.0,
    },
    SeedTask {
        key: "seed-flooring",
        category: Category::Flooring,
        name: "강마루 (전체)",
        description: "구정마루 그랜드 텍스쳐",
        unit_price: 110000.0,
    },
    SeedTask {
        key: "seed-wall-paper",
        category: Category::Wall,
        name: "실크 벽지 (전체)",
        description: "LG 베스띠 / 신한 스케치",
        unit_price: 65000.0,
    },
    SeedTask {
        key: "seed-wall-molding",
        category: Category::Wall,
        name: "몰딩/걸레받이/문선",
        description: "예림 도어/몰딩 기준",
        unit_price: 80000.0,
    },
    SeedTask {
        key: "seed-ceiling",
        category: Category::Ceiling,
        name: "천장 경량철골 및 텍스",
        description: "석고보드 2겹 + 도장 마감",
        unit_price: 70000.0,
    },
    SeedTask {
        key: "seed-electrical",
        category: Category::ElectricalTelecom,
        name: "LED 조명 및 스위치",
        description: "르그랑 스위치/콘센트",
        unit_price: 45000.0,
    },
    SeedTask {
        key: "seed-plumbing",
        category: Category::Plumbing,
        name: "급배수 배관 교체",
        description: "욕실/주방 배관 포함",
        unit_price: 60000.0,
    },
    SeedTask {
        key: "seed-fire-safety",
        category: Category::FireSafety,
        name: "스프링클러 및 감지기 이설",
        description: "소방 완비 증명 포함",
        unit_price: 40000.0,
    },
    SeedTask {
        key: "seed-furniture",
        category: Category::Furniture,
        name: "공용 욕실 리모델링",
        description: "아메리칸 스탠다드 도기",
        unit_price: 3500000.0,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_respect_template_allow_list() {
        for template in ConstructionTemplate::ordered() {
            let tasks = template.seed_tasks();
            assert!(!tasks.is_empty(), "{} has seeds", template.label());
            assert!(tasks.iter().all(|task| template.allows(task.category)));
        }

        let restoration = ConstructionTemplate::Restoration.seed_tasks();
        assert!(restoration
            .iter()
            .all(|task| task.category != Category::FireSafety));
        let permit = ConstructionTemplate::PermitWork.seed_tasks();
        assert!(permit.iter().any(|task| task.category == Category::FireSafety));
    }

    #[test]
    fn lump_sum_seeds_start_at_one_unit() {
        let tasks = ConstructionTemplate::Interior.seed_tasks();
        let furniture = tasks
            .iter()
            .find(|task| task.category == Category::Furniture)
            .expect("furniture seed");
        assert_eq!(furniture.quantity, 1.0);
        let flooring = tasks
            .iter()
            .find(|task| task.category == Category::Flooring)
            .expect("flooring seed");
        assert_eq!(flooring.quantity, DEFAULT_SEED_AREA);
    }

    #[test]
    fn seed_ids_are_unique() {
        let tasks = ConstructionTemplate::Interior.seed_tasks();
        let mut ids: Vec<_> = tasks.iter().map(|task| task.id.0.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), tasks.len());
    }
}
