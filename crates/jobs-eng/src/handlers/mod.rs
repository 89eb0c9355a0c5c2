//! HTTP request handlers for the jobs-eng API.
//!
//! This module re-exports handlers from focused submodules organized by domain.

pub mod deploy_status;
pub mod socket;
pub mod stats;
pub mod usage;

pub use deploy_status::{
    MISSING_LAST_TIME, get_deploy_status_feed, get_deploy_status_view, put_deploy_status,
};
pub use socket::deploy_status_socket;
pub use stats::health_check;
pub use usage::{get_usage_detail, put_build_sh, put_swagger_py};
