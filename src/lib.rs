//! pixshare: client for an image-sharing service.
//!
//! Every API call runs through one authenticated pipeline that attaches the
//! stored access token and, when the server answers `401`, performs a single
//! refresh shared by all concurrent callers before replaying their requests.
//!
//! # Quick Start
//!
//! ```no_run
//! use pixshare::prelude::*;
//!
//! # async fn example() -> pixshare::error::Result<()> {
//! let session = Session::open(&ClientConfig::from_env()?)?;
//! session
//!     .auth()
//!     .login(&LoginCredentials::username_or_email("alice", "secret"))
//!     .await?;
//! let page = session.images().list(1, 10).await?;
//! println!("{} images", page.total);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod prelude;
pub mod session;

#[cfg(feature = "cli")]
pub mod cli;
