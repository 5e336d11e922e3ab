//! Package extraction pipeline: R interpreter agents, tarball fetching,
//! DESCRIPTION/NAMESPACE parsing and the worker pool that ties them to the
//! matcher crate.

pub mod agent;
pub mod fetch;
pub mod package;
pub mod pool;
pub mod sink;

pub use agent::{Agent, AgentConfig, AgentError, AgentStats};
pub use package::{PackageParser, PackageReport, ParseError};
pub use pool::{run_pool, PackageProcessor, PoolError, PoolSummary};
pub use sink::{ReportSink, SinkError};
