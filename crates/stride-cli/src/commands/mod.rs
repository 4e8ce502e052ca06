//! Command implementations for the CLI.

mod activity;
mod alert;
mod devices;
mod health;
mod report;
mod reset;
mod simulate;

pub use activity::cmd_activity;
pub use alert::cmd_alert;
pub use devices::cmd_devices;
pub use health::cmd_health;
pub use report::cmd_report;
pub use reset::cmd_reset;
pub use simulate::{SimulateArgs, cmd_simulate};
