//! Application services for the scheduler subsystem.

mod tick;


pub use tick::{Scheduler, SchedulerError, SchedulerResult, TickReport};
