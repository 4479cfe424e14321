pub mod probe;
pub mod sysinfo_probe;
pub mod process_directory;
pub mod process_controller;
pub mod sample_buffer;
pub mod sampler;
pub mod session;

#[cfg(test)]
pub mod fake_probe;

pub use probe::ProcessProbe;
pub use sysinfo_probe::SysinfoProbe;
pub use process_directory::ProcessDirectory;
pub use process_controller::{KillError, ProcessController};
pub use session::{OpenError, SamplerConfig, SamplerSession, SessionEvent};
