//! # filekeeper - File Lifecycle Manager
//!
//! Moves uploaded files through blob write, metadata commit, cached lookup
//! and timed expiration while keeping object storage, the metadata table
//! and the cache consistent with each other.
//!
//! ## Architecture Layers
//!
//! - **Domain**: file records, value objects and their state machine
//! - **Application**: ports, use cases, cache policy and the expiration sweeper
//! - **Infrastructure**: Postgres, filesystem, S3 and in-process adapters
//!
//! ## Example Usage
//!
//! ```no_run
//! use filekeeper::{application::builder::ApplicationBuilder, Config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let app = ApplicationBuilder::new(Config::from_env())
//!     .with_database()
//!     .await?
//!     .with_infrastructure()
//!     .await?
//!     .build()?;
//!
//! let run = app.sweeper.sweep_once().await;
//! println!("{:?}", run);
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{dto, errors, ports, use_cases};
pub use config::Config;
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects};
