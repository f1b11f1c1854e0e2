//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter       | Implements | Connects to                       |
//! |---------------|------------|-----------------------------------|
//! | `config_file` | ConfigPort | JSON file on disk                 |
//! | `hardware`    | RelayPort  | active-low relay board (GPIO/sim) |
//! | `log_sink`    | EventSink  | `log` facade                      |
//! | `time`        | -          | `std::time` clock and delay       |

pub mod config_file;
pub mod hardware;
pub mod log_sink;
pub mod time;
