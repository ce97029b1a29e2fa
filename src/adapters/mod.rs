//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements                              | Connects to            |
//! |------------|-----------------------------------------|------------------------|
//! | `hardware` | Clock, ButtonPort, UltrasoundPort,      | Per-id device records  |
//! |            | DisplayPort                             |                        |
//! | `log_sink` | EventSink                               | `log` facade           |
//! | `time`     | Clock                                   | SysTick counter        |

pub mod hardware;
pub mod log_sink;
pub mod time;
