pub mod draw_schedules;
pub mod draw_types;
pub mod number_limits;
pub mod number_sales;
pub mod ticket_items;
pub mod tickets;
pub mod zones;

pub use draw_schedules as draw_schedule_entity;
pub use draw_types as draw_type_entity;
pub use number_limits as number_limit_entity;
pub use number_sales as number_sale_entity;
pub use ticket_items as ticket_item_entity;
pub use tickets as ticket_entity;
pub use zones as zone_entity;
