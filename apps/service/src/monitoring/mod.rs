/// Monitoring engine module - everything that happens to a check each cycle
///
/// This module is responsible for:
/// - Validating raw check records
/// - Probing HTTP/HTTPS targets under a timeout
/// - Deriving up/down state and alert-worthiness
/// - Running the per-check pipeline and scheduling probe cycles
pub mod checker;
pub mod evaluator;
pub mod executor;
pub mod scheduler;
pub mod types;
pub mod validation;


pub use executor::MonitoringExecutor;
pub use scheduler::MonitoringScheduler;
