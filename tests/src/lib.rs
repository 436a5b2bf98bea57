//! Integration test framework for macsched
#![allow(missing_docs)]
//!
//! Drives the configuration pool and the logical-channel managers together,
//! the way a cell scheduler does.
//!
//! # Components
//!
//! - [`test_fixtures`] - Cell and UE configuration builders
//! - [`test_utils`] - Logging setup, timeouts and shared assertions
//!
//! # Test Categories
//!
//! 1. **DL Scenarios** - Buffer status, MAC CEs, TB building, GBR tracking
//! 2. **UL Scenarios** - BSR decoding, SR handling, grants
//! 3. **Multi-Cell Tests** - Concurrent cells sharing one configuration pool

pub mod test_fixtures;

pub use test_fixtures::{
    drb_lcg, gbr_channel, gbr_channel_downgraded, gbr_lcg, scheduler_config, TestCellConfig,
    TestUeConfig, DRB1, GBR_DRB,
};
pub use test_utils::{
    assert_pending_bytes_consistent, init_test_logging, with_timeout, TestResult,
    DEFAULT_TEST_TIMEOUT,
};
