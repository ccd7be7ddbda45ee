pub mod company;
pub mod employees;
pub mod payroll;
pub mod prices;
pub mod setup;
pub mod ui;
