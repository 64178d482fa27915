//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Every table carries the shared lifecycle columns (`active`, `deleted_at`,
//! `created_at`, `updated_at`).

pub mod activity_type;
pub mod brand;
pub mod budget;
pub mod budget_labor_line;
pub mod budget_part_line;
pub mod category;
pub mod client;
pub mod equipment_type;
pub mod inventory;
pub mod labor_type;
pub mod locker;
pub mod part;
pub mod repuesto;
pub mod service_order;
pub mod technician;

// Re-export specific types to avoid conflicts
pub use activity_type::{Entity as ActivityType, Model as ActivityTypeModel};
pub use brand::{Entity as Brand, Model as BrandModel};
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use budget_labor_line::{Entity as BudgetLaborLine, Model as BudgetLaborLineModel};
pub use budget_part_line::{Entity as BudgetPartLine, Model as BudgetPartLineModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use client::{Entity as Client, Model as ClientModel};
pub use equipment_type::{Entity as EquipmentType, Model as EquipmentTypeModel};
pub use inventory::{Column as InventoryColumn, Entity as Inventory, Model as InventoryModel};
pub use labor_type::{Entity as LaborType, Model as LaborTypeModel};
pub use locker::{Column as LockerColumn, Entity as Locker, Model as LockerModel, OccupancyState};
pub use part::{Entity as Part, Model as PartModel};
pub use repuesto::{Entity as Repuesto, Model as RepuestoModel};
pub use service_order::{
    Column as ServiceOrderColumn, Entity as ServiceOrder, Model as ServiceOrderModel, OrderStatus,
};
pub use technician::{Entity as Technician, Model as TechnicianModel};
