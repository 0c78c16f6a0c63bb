pub mod dashboards;
pub mod enums;
pub mod shared;
pub mod system;
pub mod usecases;
