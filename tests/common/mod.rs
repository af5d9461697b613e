#![allow(dead_code)]

pub use relayvisor_test_utils::builders;
pub use relayvisor_test_utils::fake_process;
pub use relayvisor_test_utils::stub;
pub use relayvisor_test_utils::{init_tracing, with_timeout};
