pub mod signals;
pub mod worker;

pub use signals::{send_signal, ControlEvent, Signal};
pub use worker::{exec, run_loop, start, start_ctx, Worker};
